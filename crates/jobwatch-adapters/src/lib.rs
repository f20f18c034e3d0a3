//! Source adapter contracts, source-list registries and the bundled adapters.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jobwatch_core::{dedupe_by_identifier, slugify, JobRecord};
use jobwatch_storage::{FetchError, HttpFetcher};
use reqwest::Url;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const CRATE_NAME: &str = "jobwatch-adapters";

pub const SIMPLIFY_SEARCH_URL: &str = "https://xv95tgzrem61cja4p.a1.typesense.net/multi_search";
pub const SIMPLIFY_PER_PAGE: usize = 21;
const SIMPLIFY_MAX_PAGES: usize = 50;
const SIMPLIFY_MAX_AGE_DAYS: i64 = 14;

pub const DEFAULT_LINK_SELECTOR: &str = r#"a[href*="job"]"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterContext {
    pub cycle_id: Uuid,
    pub fetched_at: DateTime<Utc>,
}

impl AdapterContext {
    pub fn new(cycle_id: Uuid, fetched_at: DateTime<Utc>) -> Self {
        Self {
            cycle_id,
            fetched_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Fetches postings from one external source and normalizes them into [`JobRecord`]s.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source_id(&self) -> &str;

    async fn fetch(&self, ctx: &AdapterContext) -> Result<Vec<JobRecord>, AdapterError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardRegistry {
    #[serde(default)]
    pub boards: Vec<BoardSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardSource {
    pub board: String,
    pub url: String,
    pub location: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompanySource {
    #[serde(alias = "Company")]
    pub company: String,
    #[serde(alias = "URL")]
    pub url: String,
    #[serde(alias = "Location", alias = "location", alias = "Region")]
    pub region: String,
    #[serde(default)]
    pub link_selector: Option<String>,
}

pub fn load_board_registry(path: impl AsRef<Path>) -> Result<BoardRegistry> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if text.trim().is_empty() {
        warn!(path = %path.display(), "board list is empty");
        return Ok(BoardRegistry { boards: Vec::new() });
    }
    let registry: BoardRegistry =
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    info!(
        path = %path.display(),
        boards = ?registry.boards.iter().map(|b| format!("{} - {}", b.board, b.location)).collect::<Vec<_>>(),
        "loaded board list"
    );
    Ok(registry)
}

pub fn load_company_registry(path: impl AsRef<Path>) -> Result<Vec<CompanySource>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut companies = Vec::new();
    for (index, row) in reader.deserialize::<CompanySource>().enumerate() {
        let company = row.with_context(|| format!("parsing {} row {}", path.display(), index + 2))?;
        companies.push(company);
    }
    if companies.is_empty() {
        warn!(path = %path.display(), "company list is empty");
    } else {
        info!(
            path = %path.display(),
            companies = ?companies.iter().map(|c| c.company.as_str()).collect::<Vec<_>>(),
            "loaded company list"
        );
    }
    Ok(companies)
}

/// Builds one adapter per enabled board. Unknown board kinds are skipped with a warning; a
/// known board that cannot be configured is an error.
pub fn board_adapters(
    registry: &BoardRegistry,
    http: Arc<HttpFetcher>,
    default_api_key: Option<&str>,
) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();
    for board in registry.boards.iter().filter(|b| b.enabled) {
        if board.board.eq_ignore_ascii_case("simplify") {
            let Some(api_key) = board.api_key.as_deref().or(default_api_key) else {
                bail!(
                    "board {} - {} needs a search api key (api_key or JOBWATCH_SIMPLIFY_API_KEY)",
                    board.board,
                    board.location
                );
            };
            let adapter = SimplifyAdapter::new(board, api_key, http.clone())
                .with_context(|| format!("configuring board {} - {}", board.board, board.location))?;
            adapters.push(Box::new(adapter));
        } else {
            warn!(board = %board.board, location = %board.location, "no adapter registered for board; skipping");
        }
    }
    Ok(adapters)
}

pub fn company_adapters(
    companies: &[CompanySource],
    http: Arc<HttpFetcher>,
) -> Vec<Box<dyn SourceAdapter>> {
    companies
        .iter()
        .map(|company| {
            Box::new(CareerPageAdapter::new(company.clone(), http.clone())) as Box<dyn SourceAdapter>
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifyQuery {
    pub query: String,
    pub filter_field: &'static str,
    pub filter_value: String,
    pub experience: String,
    pub most_recent: bool,
}

impl SimplifyQuery {
    /// Reads search parameters from a simplify.jobs listing URL. A country filter takes
    /// precedence over a state filter.
    pub fn from_board_url(url: &str) -> Result<Self, AdapterError> {
        let parsed = Url::parse(url)
            .map_err(|e| AdapterError::Message(format!("invalid board url {url}: {e}")))?;
        let param = |name: &str| {
            parsed
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty())
        };

        let (filter_field, filter_value) = match (param("country"), param("state")) {
            (Some(country), _) => ("countries", country),
            (None, Some(state)) => ("locations", state),
            (None, None) => ("countries", String::new()),
        };

        Ok(Self {
            query: param("query").unwrap_or_else(|| "Software Engineer".to_string()),
            filter_field,
            filter_value,
            experience: param("experience").unwrap_or_else(|| "Entry Level/New Grad".to_string()),
            most_recent: param("mostRecent")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),
        })
    }

    pub fn payload(&self, page: usize) -> JsonValue {
        json!({
            "searches": [{
                "collection": "jobs",
                "facet_by": "countries,degrees,experience_level,functions,locations",
                "filter_by": format!(
                    "{}:=[`{}`] && experience_level:=[`{}`]",
                    self.filter_field, self.filter_value, self.experience
                ),
                "highlight_full_fields": "title,company_name,functions,locations",
                "max_facet_values": 50,
                "page": page,
                "per_page": SIMPLIFY_PER_PAGE,
                "q": self.query,
                "query_by": "title,company_name,functions,locations",
                "sort_by": if self.most_recent { "updated_date:desc" } else { "_text_match:desc" },
            }]
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimplifyPage {
    pub records: Vec<JobRecord>,
    pub hit_count: usize,
    pub found: usize,
}

pub fn simplify_posting_url(id: &str, title: &str) -> String {
    format!(
        "https://simplify.jobs/p/{}/{}",
        id,
        title.replace(' ', "-").to_lowercase()
    )
}

/// Parses one `multi_search` response page. Postings last updated before `cutoff` are dropped.
pub fn parse_simplify_page(
    value: &JsonValue,
    source_id: &str,
    fetched_at: DateTime<Utc>,
    cutoff: DateTime<Utc>,
) -> SimplifyPage {
    let Some(result) = value.get("results").and_then(|r| r.get(0)) else {
        return SimplifyPage::default();
    };
    let Some(hits) = result.get("hits").and_then(|h| h.as_array()) else {
        warn!(source_id, "no hits in search response");
        return SimplifyPage::default();
    };
    let found = result.get("found").and_then(|f| f.as_u64()).unwrap_or(0) as usize;

    let mut records = Vec::with_capacity(hits.len());
    for hit in hits {
        let Some(doc) = hit.get("document") else {
            continue;
        };
        let updated = doc.get("updated_date").and_then(|d| d.as_i64());
        if let Some(ts) = updated {
            if ts < cutoff.timestamp() {
                debug!(source_id, title = ?doc.get("title"), "skipping stale posting");
                continue;
            }
        }

        let id = doc.get("id").and_then(|v| v.as_str()).unwrap_or("unknown-id");
        let title = doc
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Title");
        let company = doc
            .get("company_name")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Company");
        let location = doc
            .get("locations")
            .and_then(|v| v.get(0))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Location");

        let url = simplify_posting_url(id, title);
        records.push(
            JobRecord::from_url(source_id, title, company, location, url, fetched_at)
                .with_posted_at(updated.and_then(|ts| DateTime::from_timestamp(ts, 0))),
        );
    }

    SimplifyPage {
        records,
        hit_count: hits.len(),
        found,
    }
}

/// Board adapter for simplify.jobs, served through its public search API.
pub struct SimplifyAdapter {
    source_id: String,
    query: SimplifyQuery,
    api_url: String,
    api_key: String,
    http: Arc<HttpFetcher>,
}

impl SimplifyAdapter {
    pub fn new(board: &BoardSource, api_key: &str, http: Arc<HttpFetcher>) -> Result<Self, AdapterError> {
        Ok(Self {
            source_id: format!("{}:{}", slugify(&board.board), slugify(&board.location)),
            query: SimplifyQuery::from_board_url(&board.url)?,
            api_url: board
                .api_url
                .clone()
                .unwrap_or_else(|| SIMPLIFY_SEARCH_URL.to_string()),
            api_key: api_key.to_string(),
            http,
        })
    }
}

#[async_trait]
impl SourceAdapter for SimplifyAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn fetch(&self, ctx: &AdapterContext) -> Result<Vec<JobRecord>, AdapterError> {
        let cutoff = ctx.fetched_at - Duration::days(SIMPLIFY_MAX_AGE_DAYS);
        let mut records: Vec<JobRecord> = Vec::new();
        let mut seen = HashSet::new();

        for page in 1..=SIMPLIFY_MAX_PAGES {
            let resp = match self
                .http
                .post_json(
                    &self.api_url,
                    &[("x-typesense-api-key", self.api_key.as_str())],
                    &self.query.payload(page),
                )
                .await
            {
                Ok(resp) => resp,
                Err(err) if page > 1 => {
                    warn!(source_id = %self.source_id, page, error = %err, "stopping pagination early");
                    break;
                }
                Err(err) => return Err(err.into()),
            };
            let value: JsonValue = resp.json()?;
            let parsed = parse_simplify_page(&value, &self.source_id, ctx.fetched_at, cutoff);

            for record in parsed.records {
                if seen.insert(record.identifier.clone()) {
                    records.push(record);
                }
            }
            debug!(
                source_id = %self.source_id,
                page,
                unique = records.len(),
                found = parsed.found,
                "parsed search page"
            );

            if parsed.hit_count < SIMPLIFY_PER_PAGE || records.len() >= parsed.found {
                break;
            }
        }

        info!(
            source_id = %self.source_id,
            filter = %self.query.filter_value,
            records = records.len(),
            "board scrape complete"
        );
        Ok(records)
    }
}

fn text_or_none(value: &str) -> Option<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Extracts job links from a company careers page.
pub fn parse_career_page(
    html: &str,
    page_url: &str,
    source: &CompanySource,
    source_id: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<JobRecord>, AdapterError> {
    let selector_text = source
        .link_selector
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_LINK_SELECTOR);
    let selector = Selector::parse(selector_text)
        .map_err(|e| AdapterError::Message(format!("invalid selector {selector_text:?}: {e}")))?;
    let base = Url::parse(page_url)
        .map_err(|e| AdapterError::Message(format!("invalid page url {page_url}: {e}")))?;

    let document = Html::parse_document(html);
    let records = document
        .select(&selector)
        .filter_map(|node| {
            let href = node.value().attr("href")?;
            let resolved = base.join(href.trim()).ok()?;
            if !matches!(resolved.scheme(), "http" | "https") {
                return None;
            }
            let title = text_or_none(&node.text().collect::<String>())
                .or_else(|| node.value().attr("title").and_then(text_or_none))?;
            Some(JobRecord::from_url(
                source_id,
                title,
                source.company.clone(),
                source.region.clone(),
                resolved.to_string(),
                fetched_at,
            ))
        })
        .collect();

    Ok(dedupe_by_identifier(records))
}

/// Company adapter that lists job links on a careers page.
pub struct CareerPageAdapter {
    source: CompanySource,
    source_id: String,
    http: Arc<HttpFetcher>,
}

impl CareerPageAdapter {
    pub fn new(source: CompanySource, http: Arc<HttpFetcher>) -> Self {
        Self {
            source_id: format!("company:{}", slugify(&source.company)),
            source,
            http,
        }
    }
}

#[async_trait]
impl SourceAdapter for CareerPageAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn fetch(&self, ctx: &AdapterContext) -> Result<Vec<JobRecord>, AdapterError> {
        let resp = self.http.get(&self.source.url).await?;
        let records = parse_career_page(
            &resp.text(),
            &resp.final_url,
            &self.source,
            &self.source_id,
            ctx.fetched_at,
        )?;
        info!(company = %self.source.company, records = records.len(), "career page scrape complete");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jobwatch_storage::HttpClientConfig;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).single().unwrap()
    }

    fn http() -> Arc<HttpFetcher> {
        Arc::new(
            HttpFetcher::new(HttpClientConfig {
                request_spacing: None,
                ..Default::default()
            })
            .expect("fetcher"),
        )
    }

    fn acme(selector: Option<&str>) -> CompanySource {
        CompanySource {
            company: "Acme".into(),
            url: "https://careers.acme.test/jobs".into(),
            region: "Toronto".into(),
            link_selector: selector.map(str::to_string),
        }
    }

    fn hit(id: &str, title: &str, updated: i64) -> JsonValue {
        json!({
            "document": {
                "id": id,
                "title": title,
                "company_name": "Acme",
                "locations": ["Toronto, ON"],
                "updated_date": updated
            }
        })
    }

    #[test]
    fn board_registry_parses_yaml() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("boards.yaml");
        std::fs::write(
            &path,
            r#"
boards:
  - board: Simplify
    url: "https://simplify.jobs/jobs?query=Software%20Engineer&country=Canada"
    location: Canada
  - board: Simplify
    url: "https://simplify.jobs/jobs?state=Remote%20in%20USA"
    location: Remote US
    enabled: false
"#,
        )
        .expect("write");
        let registry = load_board_registry(&path).expect("registry");
        assert_eq!(registry.boards.len(), 2);
        assert!(registry.boards[0].enabled);
        assert!(!registry.boards[1].enabled);
    }

    #[test]
    fn company_registry_accepts_original_headers_and_selector_column() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("companies.csv");
        std::fs::write(
            &path,
            "Company,URL,Location,link_selector\n\
             Acme, https://careers.acme.test/jobs ,Toronto,\n\
             Globex,https://globex.test/careers,Remote,a.posting\n",
        )
        .expect("write");
        let companies = load_company_registry(&path).expect("companies");
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].url, "https://careers.acme.test/jobs");
        assert_eq!(companies[0].link_selector, None);
        assert_eq!(companies[1].link_selector.as_deref(), Some("a.posting"));
    }

    #[test]
    fn missing_company_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        assert!(load_company_registry(dir.path().join("nope.csv")).is_err());
    }

    #[test]
    fn simplify_query_prefers_country_then_state() {
        let q = SimplifyQuery::from_board_url(
            "https://simplify.jobs/jobs?query=Software%20Engineer&state=Canada&country=Canada&experience=Entry%20Level%2FNew%20Grad&mostRecent=true",
        )
        .expect("query");
        assert_eq!(q.filter_field, "countries");
        assert_eq!(q.filter_value, "Canada");
        assert_eq!(q.experience, "Entry Level/New Grad");
        assert!(q.most_recent);

        let q = SimplifyQuery::from_board_url("https://simplify.jobs/jobs?state=Remote%20in%20USA&mostRecent=false")
            .expect("query");
        assert_eq!(q.filter_field, "locations");
        assert_eq!(q.filter_value, "Remote in USA");
        assert_eq!(q.query, "Software Engineer");
        assert!(!q.most_recent);

        let payload = q.payload(2);
        assert_eq!(payload["searches"][0]["page"], 2);
        assert_eq!(payload["searches"][0]["sort_by"], "_text_match:desc");
        assert_eq!(
            payload["searches"][0]["filter_by"],
            "locations:=[`Remote in USA`] && experience_level:=[`Entry Level/New Grad`]"
        );
    }

    #[test]
    fn simplify_page_skips_stale_postings_and_builds_urls() {
        let fresh = now().timestamp() - 3600;
        let stale = now().timestamp() - 20 * 24 * 3600;
        let value = json!({
            "results": [{
                "found": 3,
                "hits": [
                    hit("abc", "Software Engineer I", fresh),
                    hit("old", "Software Engineer II", stale),
                    {"document": {"id": "nodate", "title": "New Grad SWE"}}
                ]
            }]
        });
        let page = parse_simplify_page(&value, "simplify:canada", now(), now() - Duration::days(14));
        assert_eq!(page.hit_count, 3);
        assert_eq!(page.found, 3);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].url, "https://simplify.jobs/p/abc/software-engineer-i");
        assert_eq!(page.records[0].identifier, page.records[0].url);
        assert_eq!(page.records[0].location, "Toronto, ON");
        assert_eq!(page.records[0].posted_at.map(|t| t.timestamp()), Some(fresh));
        assert_eq!(page.records[1].company, "Unknown Company");
        assert_eq!(page.records[1].location, "Unknown Location");
    }

    #[tokio::test]
    async fn simplify_adapter_stops_on_short_page() {
        let server = MockServer::start().await;
        let body = json!({
            "results": [{
                "found": 2,
                "hits": [hit("a", "SWE", now().timestamp()), hit("b", "SDE", now().timestamp())]
            }]
        });
        Mock::given(method("POST"))
            .and(path("/multi_search"))
            .and(query_param("x-typesense-api-key", "search-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let board = BoardSource {
            board: "Simplify".into(),
            url: "https://simplify.jobs/jobs?country=Canada".into(),
            location: "Canada".into(),
            enabled: true,
            api_url: Some(format!("{}/multi_search", server.uri())),
            api_key: None,
        };
        let adapter = SimplifyAdapter::new(&board, "search-key", http()).expect("adapter");
        assert_eq!(adapter.source_id(), "simplify:canada");

        let records = adapter
            .fetch(&AdapterContext::new(Uuid::new_v4(), now()))
            .await
            .expect("fetch");
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["SWE", "SDE"]);
    }

    #[test]
    fn board_adapters_skip_unknown_boards_and_require_api_key() {
        let mut registry = BoardRegistry {
            boards: vec![BoardSource {
                board: "LinkedIn".into(),
                url: "https://www.linkedin.com/jobs/search/".into(),
                location: "US".into(),
                enabled: true,
                api_url: None,
                api_key: None,
            }],
        };
        assert!(board_adapters(&registry, http(), None).expect("adapters").is_empty());

        registry.boards.push(BoardSource {
            board: "Simplify".into(),
            url: "https://simplify.jobs/jobs?country=Canada".into(),
            location: "Canada".into(),
            enabled: true,
            api_url: None,
            api_key: None,
        });
        assert!(board_adapters(&registry, http(), None).is_err());
        assert_eq!(board_adapters(&registry, http(), Some("k")).expect("adapters").len(), 1);
    }

    #[test]
    fn career_page_links_resolve_and_dedupe() {
        let html = r#"
            <html><body>
              <a href="/jobs/101">  Software   Engineer </a>
              <a href="https://careers.acme.test/jobs/102#apply">Data Engineer</a>
              <a href="/jobs/101/">Software Engineer (duplicate)</a>
              <a href="mailto:jobs@acme.test">Email jobs</a>
              <a href="/jobs/103" title="Platform Engineer"><img src="x.png"></a>
              <a href="/about">About</a>
            </body></html>
        "#;
        let records = parse_career_page(
            html,
            "https://careers.acme.test/jobs",
            &acme(None),
            "company:acme",
            now(),
        )
        .expect("parse");

        let summary: Vec<_> = records
            .iter()
            .map(|r| (r.identifier.as_str(), r.title.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("https://careers.acme.test/jobs/101", "Software Engineer"),
                ("https://careers.acme.test/jobs/102", "Data Engineer"),
                ("https://careers.acme.test/jobs/103", "Platform Engineer"),
            ]
        );
        assert!(records.iter().all(|r| r.company == "Acme" && r.location == "Toronto"));
    }

    #[test]
    fn career_page_honours_custom_selector() {
        let html = r#"<a class="posting" href="/p/1">Backend Developer</a><a href="/jobs/2">Other</a>"#;
        let records = parse_career_page(
            html,
            "https://careers.acme.test/",
            &acme(Some("a.posting")),
            "company:acme",
            now(),
        )
        .expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "https://careers.acme.test/p/1");
    }

    #[test]
    fn invalid_selector_is_an_adapter_error() {
        let err = parse_career_page("<a></a>", "https://x.test/", &acme(Some("a[")), "c", now())
            .expect_err("bad selector");
        assert!(matches!(err, AdapterError::Message(_)));
    }

    #[tokio::test]
    async fn career_page_adapter_surfaces_http_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/careers"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut source = acme(None);
        source.url = format!("{}/careers", server.uri());
        let adapter = CareerPageAdapter::new(source, http());
        let err = adapter
            .fetch(&AdapterContext::new(Uuid::new_v4(), now()))
            .await
            .expect_err("404");
        assert!(matches!(err, AdapterError::Fetch(FetchError::HttpStatus { status: 404, .. })));
    }
}
