//! Regex-based NER backend.
//!
//! Pattern matching for the seven classic categories. No external models or
//! runtime dependencies, so it is the default when no recogniser server is
//! configured. Precision is good on well-formed prose; recall on persons
//! without a title or a second capitalised name is limited.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{EntityCategory, NerBackend, NerError, NerResult};

pub struct RegexNerBackend;

impl RegexNerBackend {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous extraction used by the async trait method.
    pub fn extract(&self, text: &str) -> NerResult {
        let mut result = NerResult::new();

        extract_organizations(text, &mut result);
        extract_locations(text, &mut result);
        extract_persons(text, &mut result);
        extract_pattern(text, &DATE_PATTERNS, EntityCategory::Date, &mut result);
        extract_pattern(text, &TIME_PATTERNS, EntityCategory::Time, &mut result);
        extract_pattern(text, &MONEY_PATTERNS, EntityCategory::Money, &mut result);
        extract_pattern(text, &PERCENT_PATTERNS, EntityCategory::Percent, &mut result);

        result
    }
}

impl Default for RegexNerBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NerBackend for RegexNerBackend {
    fn backend_id(&self) -> &str {
        "regex"
    }

    async fn recognise(&self, text: &str) -> Result<NerResult, NerError> {
        Ok(self.extract(text))
    }
}

// ============================================================================
// Organizations
// ============================================================================

static KNOWN_ORGANIZATIONS: LazyLock<Regex> = LazyLock::new(|| {
    let names = [
        "NASA", "FBI", "CIA", "NATO", "UNESCO", "UNICEF", "WHO", "IMF", "OPEC", "BBC", "CNN",
        "NPR", "IBM", "Google", "Microsoft", "Apple", "Amazon", "YouTube", "Netflix", "Tesla",
        "United Nations", "European Union", "World Bank", "Red Cross", "Supreme Court",
        "White House", "Congress", "Senate", "Pentagon",
    ];
    let alternation = names
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b({})\b", alternation)).expect("organization list should compile")
});

static ORGANIZATION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b((?:[A-Z][A-Za-z&]+\s+){1,4}(?:Inc\.?|Corp\.?|Corporation|Company|Co\.|Ltd\.?|LLC|Group|Bank|University|Institute|College|Foundation|Association|Agency|Department|Ministry|Council|Committee|Society|Laboratories|Labs))(?:\W|$)",
    )
    .expect("organization suffix pattern should compile")
});

static ORGANIZATION_OF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b((?:University|Department|Ministry|Bank|Institute|Museum)\s+of\s+(?:the\s+)?[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)\b",
    )
    .expect("organization-of pattern should compile")
});

// ============================================================================
// Locations
// ============================================================================

static KNOWN_LOCATIONS: LazyLock<Regex> = LazyLock::new(|| {
    let names = [
        // Countries
        "United States", "Canada", "Mexico", "Brazil", "Argentina", "United Kingdom", "England",
        "Scotland", "Ireland", "France", "Germany", "Spain", "Portugal", "Italy", "Netherlands",
        "Belgium", "Switzerland", "Austria", "Poland", "Sweden", "Norway", "Denmark", "Finland",
        "Russia", "Ukraine", "Turkey", "Greece", "Egypt", "Nigeria", "Kenya", "South Africa",
        "India", "Pakistan", "China", "Japan", "Korea", "Vietnam", "Thailand", "Indonesia",
        "Australia", "New Zealand", "Israel", "Iran", "Iraq",
        // Cities
        "New York", "Los Angeles", "Chicago", "Houston", "San Francisco", "Seattle", "Boston",
        "Washington", "London", "Paris", "Berlin", "Madrid", "Rome", "Amsterdam", "Moscow",
        "Tokyo", "Beijing", "Shanghai", "Mumbai", "Delhi", "Sydney", "Toronto", "Cairo",
        // US states not already listed as cities
        "California", "Texas", "Florida", "Ohio", "Michigan", "Georgia", "Virginia", "Oregon",
        "Arizona", "Colorado", "Alaska", "Hawaii", "Massachusetts", "Pennsylvania",
        // Regions
        "Europe", "Asia", "Africa", "North America", "South America", "Antarctica",
        "Middle East",
    ];
    let alternation = names
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b({})\b", alternation)).expect("location list should compile")
});

// ============================================================================
// Persons
// ============================================================================

static TITLED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:Mr\.|Mrs\.|Ms\.|Dr\.|Prof\.|Sir|Dame|President|Senator|Governor|Mayor|Judge|General|Captain|Professor)\s+((?:[A-Z][a-z]+\s+)?(?:[A-Z]\.\s+)?[A-Z][a-z]+(?:-[A-Z][a-z]+)?)",
    )
    .expect("titled name pattern should compile")
});

// Runs of two or more capitalised words, optionally with a middle initial.
static CAPITALIZED_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b[A-Z][a-z]+(?:-[A-Z][a-z]+)?(?:\s+(?:[A-Z]\.\s+)?[A-Z][a-z]+(?:-[A-Z][a-z]+)?)+",
    )
    .expect("capitalized run pattern should compile")
});

// Capitalised words that are never part of a person's name.
static NAME_STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "The", "This", "That", "These", "Those", "A", "An", "In", "On", "At", "For", "From",
        "With", "By", "And", "But", "Or", "If", "When", "While", "After", "Before", "Our",
        "Their", "His", "Her", "We", "They", "It", "Today", "Yesterday", "Tomorrow", "Monday",
        "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday", "January",
        "February", "March", "April", "May", "June", "July", "August", "September", "October",
        "November", "December", "Dear", "Hello", "Welcome", "Thanks", "Mr", "Mrs", "Ms", "Dr",
        "Prof", "Sir", "Dame", "President", "Senator", "Governor", "Mayor", "Judge", "General",
        "Captain", "Professor",
    ]
    .into_iter()
    .collect()
});

// ============================================================================
// Numeric and temporal expressions
// ============================================================================

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December|Jan\\.?|Feb\\.?|Mar\\.?|Apr\\.?|Jun\\.?|Jul\\.?|Aug\\.?|Sept?\\.?|Oct\\.?|Nov\\.?|Dec\\.?";

static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // January 5, 2024 / Jan. 5 2024 / January 5th
        Regex::new(&format!(
            r"\b((?:{m})\s+\d{{1,2}}(?:st|nd|rd|th)?(?:,?\s+\d{{4}})?)\b",
            m = MONTHS
        ))
        .expect("month-day date pattern should compile"),
        // 5 January 2024
        Regex::new(&format!(r"\b(\d{{1,2}}\s+(?:{m})\s+\d{{4}})\b", m = MONTHS))
            .expect("day-month date pattern should compile"),
        // January 2024
        Regex::new(&format!(r"\b((?:{m})\s+\d{{4}})\b", m = MONTHS))
            .expect("month-year date pattern should compile"),
        // 2024-01-05
        Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("iso date pattern should compile"),
        // 01/05/2024
        Regex::new(r"\b(\d{1,2}/\d{1,2}/\d{2,4})\b").expect("slash date pattern should compile"),
    ]
});

static TIME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b((?:[01]?\d|2[0-3]):[0-5]\d(?::[0-5]\d)?(?:\s?[ap]\.?m\.?)?)(?:\W|$)")
            .expect("clock time pattern should compile"),
        Regex::new(r"(?i)(?:^|[^:\d])(\d{1,2}\s?(?:am|pm|a\.m\.|p\.m\.))(?:\W|$)")
            .expect("hour time pattern should compile"),
    ]
});

static MONEY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"([$€£¥]\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:thousand|million|billion|trillion))?)")
            .expect("currency symbol pattern should compile"),
        Regex::new(
            r"(?i)\b(\d[\d,]*(?:\.\d+)?\s?(?:thousand\s|million\s|billion\s)?(?:dollars|euros|pounds|yen|cents))\b",
        )
        .expect("currency word pattern should compile"),
    ]
});

static PERCENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"(?i)(\d+(?:\.\d+)?\s?(?:%|percent\b|per cent\b))")
        .expect("percent pattern should compile")]
});

// ============================================================================
// Extraction helpers
// ============================================================================

fn insert(result: &mut NerResult, category: EntityCategory, value: &str) {
    result
        .entry(category.as_str().to_string())
        .or_default()
        .insert(value.trim().to_string());
}

fn extract_pattern(
    text: &str,
    patterns: &[Regex],
    category: EntityCategory,
    result: &mut NerResult,
) {
    for pattern in patterns {
        for cap in pattern.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                insert(result, category, m.as_str());
            }
        }
    }
}

fn extract_organizations(text: &str, result: &mut NerResult) {
    for m in KNOWN_ORGANIZATIONS.find_iter(text) {
        insert(result, EntityCategory::Organization, m.as_str());
    }
    for pattern in [&*ORGANIZATION_SUFFIX, &*ORGANIZATION_OF] {
        for cap in pattern.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                let name = strip_leading_stopword(m.as_str());
                if name.split_whitespace().count() >= 2 {
                    insert(result, EntityCategory::Organization, name);
                }
            }
        }
    }
}

fn extract_locations(text: &str, result: &mut NerResult) {
    for m in KNOWN_LOCATIONS.find_iter(text) {
        insert(result, EntityCategory::Location, m.as_str());
    }
}

fn extract_persons(text: &str, result: &mut NerResult) {
    let claimed: HashSet<String> = [EntityCategory::Organization, EntityCategory::Location]
        .iter()
        .filter_map(|c| result.get(c.as_str()))
        .flatten()
        .cloned()
        .collect();

    for cap in TITLED_NAME.captures_iter(text) {
        if let Some(m) = cap.get(1) {
            insert(result, EntityCategory::Person, m.as_str());
        }
    }

    for m in CAPITALIZED_RUN.find_iter(text) {
        if let Some(name) = name_from_run(m.as_str()) {
            if !overlaps_claimed(&name, &claimed) {
                insert(result, EntityCategory::Person, &name);
            }
        }
    }
}

fn strip_leading_stopword(name: &str) -> &str {
    let trimmed = name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) if NAME_STOPWORDS.contains(first) => rest.trim_start(),
        _ => trimmed,
    }
}

/// Drop leading stopwords from a capitalised run; keep it if 2-4 name words remain.
fn name_from_run(run: &str) -> Option<String> {
    let words: Vec<&str> = run
        .split_whitespace()
        .skip_while(|w| NAME_STOPWORDS.contains(w.trim_end_matches('.')))
        .collect();

    if words.len() < 2 || words.len() > 4 {
        return None;
    }
    if words
        .iter()
        .any(|w| NAME_STOPWORDS.contains(w.trim_end_matches('.')))
    {
        return None;
    }
    Some(words.join(" "))
}

fn overlaps_claimed(name: &str, claimed: &HashSet<String>) -> bool {
    claimed
        .iter()
        .any(|c| c.contains(name) || name.contains(c.as_str()))
}
