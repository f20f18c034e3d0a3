use chrono::{Duration, TimeZone, Utc};
use jobwatch_adapters::{parse_career_page, parse_simplify_page, CompanySource};

fn fixture(relative: &str) -> String {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures");
    std::fs::read_to_string(root.join(relative)).expect("fixture")
}

#[test]
fn simplify_fixture_drops_stale_hits() {
    let value: serde_json::Value =
        serde_json::from_str(&fixture("simplify/multi_search_page.json")).expect("json");
    let fetched_at = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).single().expect("time");

    let page = parse_simplify_page(&value, "simplify:us", fetched_at, fetched_at - Duration::days(14));

    assert_eq!(page.found, 3);
    assert_eq!(page.hit_count, 3);
    let urls: Vec<&str> = page.records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://simplify.jobs/p/a1b2c3/software-engineer-new-grad",
            "https://simplify.jobs/p/d4e5f6/backend-engineer-i",
        ]
    );
    assert_eq!(page.records[0].company, "Northwind");
    assert_eq!(page.records[0].location, "New York, NY");
    assert!(page.records[0].posted_at.is_some());
}

#[test]
fn career_page_fixture_yields_unique_http_links() {
    let source = CompanySource {
        company: "Acme".into(),
        url: "https://acme.test/careers".into(),
        region: "Remote".into(),
        link_selector: None,
    };
    let fetched_at = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).single().expect("time");

    let records = parse_career_page(
        &fixture("career-pages/acme.html"),
        &source.url,
        &source,
        "company:acme",
        fetched_at,
    )
    .expect("parse");

    let found: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.identifier.as_str(), r.title.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("https://acme.test/jobs/123-software-engineer", "Software Engineer"),
            ("https://boards.example.net/acme/job/456", "Data Analyst"),
        ]
    );
    assert!(records.iter().all(|r| r.location == "Remote"));
}
