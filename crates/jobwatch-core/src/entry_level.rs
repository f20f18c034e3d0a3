use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::JobRecord;

const POSITIVE_KEYWORDS: &[&str] = &["junior", "associate", "intern"];
const POSITIVE_PHRASES: &[&str] = &[
    "entry level",
    "entry-level",
    "new grad",
    "recent graduate",
    "early career",
    "internship experience",
    "student",
    "beginner",
];
const NEGATIVE_KEYWORDS: &[&str] = &[
    "senior", "head", "sr", "staff", "lead", "manager", "principal", "expert", "vp", "director",
    "chief", "phd",
];

static INTERN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bintern\b").unwrap());
static POSITIVE_RE: LazyLock<Regex> = LazyLock::new(|| word_alternation(POSITIVE_KEYWORDS));
static NEGATIVE_RE: LazyLock<Regex> = LazyLock::new(|| word_alternation(NEGATIVE_KEYWORDS));
static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)-(\d*\+?)\s*years?").unwrap());
static PLUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\+\s*years?|at least (\d+)\s*years?").unwrap());
static STANDALONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*years?").unwrap());
static ZERO_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0-\d*\+?\s*years?").unwrap());

fn word_alternation(words: &[&str]) -> Regex {
    Regex::new(&format!(r"\b(?:{})\b", words.join("|"))).unwrap()
}

/// Lowercased plain text with markup stripped, entities decoded and whitespace collapsed.
fn clean_text(text: &str) -> String {
    let fragment = Html::parse_fragment(text);
    let joined = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn has_positive_indicator(text: &str) -> bool {
    POSITIVE_RE.is_match(text) || POSITIVE_PHRASES.iter().any(|p| text.contains(p))
}

/// Smallest years-of-experience figure mentioned in `text`, or 0 when none is.
pub fn extract_min_years(text: &str) -> u32 {
    let text = text.to_lowercase();
    let mut years: Vec<u32> = Vec::new();

    for caps in RANGE_RE.captures_iter(&text) {
        if let Some(start) = caps.get(1).and_then(|m| m.as_str().parse().ok()) {
            years.push(start);
        }
    }
    for caps in PLUS_RE.captures_iter(&text) {
        let value = caps.get(1).or_else(|| caps.get(2));
        if let Some(n) = value.and_then(|m| m.as_str().parse().ok()) {
            years.push(n);
        }
    }
    for caps in STANDALONE_RE.captures_iter(&text) {
        if let Some(n) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
            if !years.contains(&n) {
                years.push(n);
            }
        }
    }

    years.into_iter().min().unwrap_or(0)
}

/// Heuristic entry-level check over title, description and qualifications.
///
/// Intern titles win outright, seniority keywords in the title reject, explicit junior or
/// new-grad wording accepts, and otherwise a stated minimum above one year of experience
/// rejects. Postings that say nothing about seniority are kept.
pub fn is_entry_level(record: &JobRecord) -> bool {
    let title = clean_text(&record.title);
    let description = record.description.as_deref().map(clean_text).unwrap_or_default();
    let qualifications = record
        .qualifications
        .as_deref()
        .map(clean_text)
        .unwrap_or_default();

    if INTERN_RE.is_match(&title) {
        return true;
    }
    if NEGATIVE_RE.is_match(&title) {
        return false;
    }
    if has_positive_indicator(&title) || has_positive_indicator(&description) {
        return true;
    }

    let combined = format!("{qualifications} {description}");
    let combined = combined.trim();
    if combined.is_empty() || ZERO_START_RE.is_match(combined) {
        return true;
    }
    extract_min_years(combined) <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job(title: &str, description: &str, qualifications: &str) -> JobRecord {
        JobRecord::from_url("test", title, "Test", "Remote", "https://x.test/1", Utc::now())
            .with_description(description)
            .with_qualifications(qualifications)
    }

    #[test]
    fn intern_title_is_always_entry_level() {
        assert!(is_entry_level(&job("Software Engineer Intern", "", "5+ years")));
        assert!(is_entry_level(&job("Senior Intern Program", "", "")));
    }

    #[test]
    fn seniority_keywords_in_title_reject() {
        for title in [
            "Senior Software Engineer",
            "Sr. Backend Developer",
            "Staff Engineer",
            "Engineering Manager",
        ] {
            assert!(!is_entry_level(&job(title, "Looking for a developer.", "")), "{title}");
        }
    }

    #[test]
    fn junior_wording_accepts() {
        assert!(is_entry_level(&job(
            "Junior Software Engineer",
            "Looking for a junior developer.",
            "5+ years of experience"
        )));
        assert!(is_entry_level(&job(
            "Software Engineer",
            "This is an <b>entry-level</b> position.",
            ""
        )));
    }

    #[test]
    fn experience_requirements_decide_the_rest() {
        let accepted = [
            "Bachelors of Science in Computer Science with 0-3+ years of relevant experience",
            "Bachelors of Science in Computer Science with 1-3+ years of relevant experience",
            "1 year of experience with Python.",
            "Bachelor's degree in Computer Science.",
        ];
        for qual in accepted {
            assert!(is_entry_level(&job("Software Engineer", "", qual)), "{qual}");
        }

        let rejected = [
            "Applicants will have 5+ years experience in industry as a Software Engineer",
            "7+ years of hands-on experience as a Server Engineer with Java",
            "2-3 years of experience software development",
            "At least 4 years of professional experience",
            "Expert developer with 10 years of experience.",
        ];
        for qual in rejected {
            assert!(!is_entry_level(&job("Software Engineer", "", qual)), "{qual}");
        }
    }

    #[test]
    fn markup_and_entities_are_decoded_before_matching() {
        assert!(!is_entry_level(&job(
            "Software Engineer",
            "<p>Build&nbsp;services</p>",
            "<li>3&#43; years of experience</li>"
        )));
        assert!(is_entry_level(&job(
            "Software Engineer",
            "<div>Join us as an <em>entry&nbsp;level</em> engineer &amp; grow.</div>",
            "5+ years"
        )));
    }

    #[test]
    fn min_years_takes_smallest_mention() {
        assert_eq!(extract_min_years("2-3 years of experience"), 2);
        assert_eq!(extract_min_years("5+ years, ideally 8 years"), 5);
        assert_eq!(extract_min_years("at least 3 years"), 3);
        assert_eq!(extract_min_years("no experience required"), 0);
    }
}
