//! Content signal extraction
//!
//! Turns raw page HTML into [`ExtractedSignals`]:
//! - company name from `<title>` / first `<h1>` / `og:site_name`
//! - navigation labels from `<nav>` and menu-like lists
//! - `<h1>`-`<h3>` headlines
//! - service-like sentences and an "about us" window
//! - service phrases, industry terms, business model, target market
//! - location tokens from a UK gazetteer and postcode outward codes
//!
//! Extraction is a pure function of the input text. Malformed or empty HTML
//! yields empty collections, never an error.

use crate::normalize::{clean_text, dedup_normalized, normalize_keyword, push_unique, word_count};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Maximum number of industry terms kept per page
pub const MAX_INDUSTRY_TERMS: usize = 20;

/// Maximum number of service-description sentences kept per page
pub const MAX_SERVICE_DESCRIPTIONS: usize = 20;

const MIN_DESCRIPTION_LEN: usize = 20;
const MAX_DESCRIPTION_LEN: usize = 200;

/// Ratio one audience's indicator count must reach over the other's
const BUSINESS_MODEL_RATIO: f64 = 1.5;

/// Tags whose text is never visible page content
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Containers whose blocks are menu labels rather than page copy
const NAVIGATION_TAGS: &[&str] = &["nav", "header"];

const SERVICE_VERBS: &[&str] = &["we ", "our ", "offer", "provide"];

const ABOUT_MARKERS: &[&str] = &["about us", "who we are", "our company", "our story"];

const INDUSTRY_SUFFIXES: &[&str] = &["ing", "tion", "ment", "ance", "ence", "ology", "ics"];

/// Words that carry a noun suffix but say nothing about an industry
const GENERIC_TERMS: &[&str] = &[
    "nothing", "something", "anything", "everything", "morning", "evening", "during", "including",
    "following", "according", "regarding", "getting", "looking", "working", "helping", "making",
    "providing", "offering", "bringing", "information", "question", "questions", "mention",
    "attention", "experience", "difference", "excellence", "confidence", "assistance",
    "statistics", "cookies", "settings", "navigation", "subscription", "notification",
    "javascript", "loading", "trading", "booking", "contacting", "reading",
];

const B2B_INDICATORS: &[&str] = &[
    "b2b", "enterprise", "enterprises", "corporate", "businesses", "companies", "organisations",
    "organizations", "wholesale", "commercial clients", "smes", "procurement", "stakeholders",
];

const B2C_INDICATORS: &[&str] = &[
    "b2c", "individuals", "families", "homeowners", "consumers", "personal", "residential",
    "your home", "your family", "private clients", "tenants", "patients",
];

const MARKETPLACE_INDICATORS: &[&str] = &[
    "marketplace", "buyers and sellers", "list your", "sellers", "become a vendor",
];

/// Audience phrases reported as target markets
const TARGET_MARKETS: &[&str] = &[
    "small businesses", "startups", "enterprises", "families", "homeowners", "landlords",
    "tenants", "individuals", "professionals", "students", "retailers", "property investors",
    "first time buyers", "charities", "schools",
];

/// UK cities, regions and nations recognised as location indicators
const GAZETTEER: &[&str] = &[
    "London", "Manchester", "Birmingham", "Leeds", "Glasgow", "Liverpool", "Bristol",
    "Sheffield", "Edinburgh", "Cardiff", "Belfast", "Leicester", "Nottingham", "Newcastle",
    "Brighton", "Southampton", "Portsmouth", "Oxford", "Cambridge", "York", "Bath", "Reading",
    "Coventry", "Derby", "Plymouth", "Aberdeen", "Dundee", "Swansea", "Norwich", "Exeter",
    "Milton Keynes", "Kent", "Surrey", "Essex", "Sussex", "Yorkshire", "Lancashire", "Devon",
    "Cornwall", "Hampshire", "Berkshire", "Hertfordshire", "Cheshire", "Midlands", "Scotland",
    "Wales", "Northern Ireland",
];

static SERVICE_PHRASE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:we offer|we provide|we specialise in|we specialize in|specialising in|specializing in)\s+([a-z][a-z0-9 ,&'\-]{2,80}?)(?:[.;:!?()]|\bfor\b|\bto\b|\bwith\b|$)",
    )
    .unwrap()
});

static WORD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+").unwrap());

static GAZETTEER_REGEX: Lazy<Regex> = Lazy::new(|| {
    let alternation = GAZETTEER
        .iter()
        .map(|place| regex::escape(place))
        .collect::<Vec<String>>()
        .join("|");
    Regex::new(&format!(r"\b({})\b", alternation)).unwrap()
});

/// Full UK postcode; the first group is the outward code
static POSTCODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z]{1,2}[0-9][0-9A-Z]?)\s?[0-9][A-Z]{2}\b").unwrap()
});

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static HEADLINE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1, h2, h3").unwrap());
static SITE_NAME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:site_name"]"#).unwrap());
static NAV_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        r#"nav a, nav li, [role="navigation"] a, header a, .menu a, .nav a, .navbar a, .navigation a, ul.menu li"#,
    )
    .unwrap()
});
static BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p, li, h1, h2, h3, h4, h5, h6, td, dd, blockquote, figcaption").unwrap()
});

/// How the business sells, inferred from audience vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BusinessModel {
    B2B,
    B2C,
    #[default]
    B2B2C,
    #[serde(rename = "marketplace")]
    Marketplace,
}

impl fmt::Display for BusinessModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusinessModel::B2B => write!(f, "B2B"),
            BusinessModel::B2C => write!(f, "B2C"),
            BusinessModel::B2B2C => write!(f, "B2B2C"),
            BusinessModel::Marketplace => write!(f, "marketplace"),
        }
    }
}

/// Structured signals pulled out of a single page.
///
/// All collections are unique and kept in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSignals {
    pub company_name: String,
    pub navigation_items: Vec<String>,
    pub headlines: Vec<String>,
    /// Sentences of 20-200 chars that read like an offer ("we provide ...")
    pub service_descriptions: Vec<String>,
    pub about_text: String,
    /// Lowercased service phrases
    pub services: Vec<String>,
    pub industry_terms: Vec<String>,
    pub business_model: BusinessModel,
    pub target_market: Vec<String>,
    pub location_indicators: Vec<String>,
    /// Lowercased visible text, used for keyword frequency scoring
    #[serde(skip)]
    pub body_text: String,
}

impl ExtractedSignals {
    /// True when nothing at all was extracted
    pub fn is_empty(&self) -> bool {
        self.company_name.is_empty()
            && self.navigation_items.is_empty()
            && self.headlines.is_empty()
            && self.service_descriptions.is_empty()
            && self.about_text.is_empty()
            && self.services.is_empty()
            && self.industry_terms.is_empty()
            && self.target_market.is_empty()
            && self.location_indicators.is_empty()
    }
}

/// Extract all content signals from raw HTML.
pub fn extract_signals(html: &str) -> ExtractedSignals {
    let document = Html::parse_document(html);

    let visible = visible_text(&document);
    let body_text = visible.to_lowercase();
    let blocks = text_blocks(&document);
    let sentences: Vec<String> = blocks.iter().flat_map(|b| split_sentences(b)).collect();

    let navigation_items = extract_navigation(&document);
    let headlines = collect_text(&document, &HEADLINE_SELECTOR);
    let service_descriptions = extract_service_descriptions(&sentences);
    let about_text = extract_about_text(&sentences);
    let services = extract_services(&navigation_items, &blocks);
    let industry_terms = extract_industry_terms(&body_text);
    let business_model = classify_business_model(&body_text);
    let target_market = extract_target_market(&body_text);
    let location_indicators = extract_locations(&visible);
    let company_name = extract_company_name(&document);

    let signals = ExtractedSignals {
        company_name,
        navigation_items,
        headlines,
        service_descriptions,
        about_text,
        services,
        industry_terms,
        business_model,
        target_market,
        location_indicators,
        body_text,
    };

    debug!(
        "Extracted signals: name={:?}, {} nav items, {} headlines, {} services, {} locations, model={}",
        signals.company_name,
        signals.navigation_items.len(),
        signals.headlines.len(),
        signals.services.len(),
        signals.location_indicators.len(),
        signals.business_model
    );

    signals
}

/// All text nodes outside script/style, space-joined, whitespace collapsed.
fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.tree.nodes() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
                Node::Element(element) => HIDDEN_TAGS.contains(&element.name()),
                _ => false,
            });
            if !hidden {
                out.push_str(text);
                out.push(' ');
            }
        }
    }
    clean_text(&out)
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

fn collect_text(document: &Html, selector: &Selector) -> Vec<String> {
    let mut out = Vec::new();
    for element in document.select(selector) {
        push_unique(&mut out, &element_text(element));
    }
    out
}

/// Block-level element texts in document order, skipping navigation menus.
fn text_blocks(document: &Html) -> Vec<String> {
    document
        .select(&BLOCK_SELECTOR)
        .filter(|element| !in_navigation(*element))
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}

fn in_navigation(element: ElementRef<'_>) -> bool {
    element.ancestors().any(|ancestor| match ancestor.value() {
        Node::Element(el) => {
            NAVIGATION_TAGS.contains(&el.name()) || el.attr("role") == Some("navigation")
        }
        _ => false,
    })
}

/// Split on sentence-ending punctuation followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |next| next.is_whitespace()) {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

fn extract_company_name(document: &Html) -> String {
    let from_title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty());
    let from_h1 = || {
        document
            .select(&H1_SELECTOR)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
    };
    let from_site_name = || {
        document
            .select(&SITE_NAME_SELECTOR)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(clean_text)
            .filter(|t| !t.is_empty())
    };

    from_title
        .or_else(from_h1)
        .or_else(from_site_name)
        .map(|raw| first_title_segment(&raw))
        .unwrap_or_default()
}

/// "Harbour Plumbing | Emergency Plumbers in Bristol" -> "Harbour Plumbing"
fn first_title_segment(title: &str) -> String {
    const SEPARATORS: &[&str] = &[" - ", " – ", " — ", " :: "];

    title
        .split('|')
        .map(|part| {
            let cut = SEPARATORS
                .iter()
                .filter_map(|sep| part.find(sep))
                .min()
                .unwrap_or(part.len());
            &part[..cut]
        })
        .map(str::trim)
        .find(|segment| !segment.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn extract_navigation(document: &Html) -> Vec<String> {
    let mut items = Vec::new();
    for element in document.select(&NAV_SELECTOR) {
        let text = element_text(element);
        let len = text.chars().count();
        if (2..=40).contains(&len) && word_count(&text) <= 5 {
            push_unique(&mut items, &text);
        }
    }
    items
}

fn extract_service_descriptions(sentences: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for sentence in sentences {
        let len = sentence.chars().count();
        if !(MIN_DESCRIPTION_LEN..=MAX_DESCRIPTION_LEN).contains(&len) {
            continue;
        }
        let lower = format!("{} ", sentence.to_lowercase());
        if SERVICE_VERBS.iter().any(|verb| lower.contains(verb)) {
            push_unique(&mut out, sentence);
        }
        if out.len() >= MAX_SERVICE_DESCRIPTIONS {
            break;
        }
    }
    out
}

/// The marker sentence (when it says more than the heading) plus the next
/// three sentences.
fn extract_about_text(sentences: &[String]) -> String {
    let Some(index) = sentences.iter().position(|s| {
        let lower = s.to_lowercase();
        ABOUT_MARKERS.iter().any(|marker| lower.contains(marker))
    }) else {
        return String::new();
    };

    let mut window = Vec::new();
    if sentences[index].chars().count() > MIN_DESCRIPTION_LEN {
        window.push(sentences[index].as_str());
    }
    window.extend(sentences.iter().skip(index + 1).take(3).map(String::as_str));

    let about = window.join(" ");
    about.chars().take(500).collect()
}

fn extract_services(navigation_items: &[String], blocks: &[String]) -> Vec<String> {
    let mut candidates = Vec::new();

    for item in navigation_items {
        let lower = normalize_keyword(item);
        if !(lower.contains("service") || lower.starts_with("our ")) {
            continue;
        }
        let stripped = lower.trim_start_matches("our ").trim();
        if matches!(stripped, "services" | "service" | "") {
            continue;
        }
        candidates.push(stripped.to_string());
    }

    for block in blocks {
        for caps in SERVICE_PHRASE_REGEX.captures_iter(block) {
            if let Some(phrase) = caps.get(1) {
                candidates.extend(split_service_phrase(phrase.as_str()));
            }
        }
    }

    dedup_normalized(candidates)
}

/// "family law, conveyancing and wills" -> ["family law", "conveyancing", "wills"]
fn split_service_phrase(phrase: &str) -> Vec<String> {
    let lower = phrase.to_lowercase();
    lower
        .split([',', '&'])
        .flat_map(|part| part.split(" and "))
        .map(|part| {
            let part = part.trim();
            let part = part
                .strip_prefix("a ")
                .or_else(|| part.strip_prefix("an "))
                .or_else(|| part.strip_prefix("the "))
                .unwrap_or(part);
            normalize_keyword(part)
        })
        .filter(|part| {
            let len = part.chars().count();
            (3..=50).contains(&len) && word_count(part) <= 5
        })
        .collect()
}

fn extract_industry_terms(body_text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in WORD_REGEX.find_iter(body_text).map(|m| m.as_str()) {
        let len = word.len();
        if !(6..=20).contains(&len) {
            continue;
        }
        if !INDUSTRY_SUFFIXES.iter().any(|suffix| word.ends_with(suffix)) {
            continue;
        }
        if GENERIC_TERMS.contains(&word) || terms.iter().any(|t| t == word) {
            continue;
        }
        terms.push(word.to_string());
        if terms.len() >= MAX_INDUSTRY_TERMS {
            break;
        }
    }
    terms
}

fn count_indicators(body_text: &str, indicators: &[&str]) -> usize {
    indicators
        .iter()
        .map(|indicator| count_phrase(body_text, indicator))
        .sum()
}

/// Word-bounded occurrences of a lowercase phrase in lowercase text.
pub(crate) fn count_phrase(text: &str, phrase: &str) -> usize {
    if phrase.is_empty() {
        return 0;
    }
    text.match_indices(phrase)
        .filter(|(start, _)| {
            let before_ok = text[..*start]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            let end = start + phrase.len();
            let after_ok = text[end..].chars().next().map_or(true, |c| !c.is_alphanumeric());
            before_ok && after_ok
        })
        .count()
}

fn classify_business_model(body_text: &str) -> BusinessModel {
    let marketplace_hits = MARKETPLACE_INDICATORS
        .iter()
        .filter(|indicator| count_phrase(body_text, indicator) > 0)
        .count();
    if marketplace_hits >= 2 {
        return BusinessModel::Marketplace;
    }

    let b2b = count_indicators(body_text, B2B_INDICATORS) as f64;
    let b2c = count_indicators(body_text, B2C_INDICATORS) as f64;

    if b2b > 0.0 && b2b >= b2c * BUSINESS_MODEL_RATIO {
        BusinessModel::B2B
    } else if b2c > 0.0 && b2c >= b2b * BUSINESS_MODEL_RATIO {
        BusinessModel::B2C
    } else {
        BusinessModel::B2B2C
    }
}

fn extract_target_market(body_text: &str) -> Vec<String> {
    TARGET_MARKETS
        .iter()
        .filter(|market| count_phrase(body_text, market) > 0)
        .map(|market| market.to_string())
        .collect()
}

/// Gazetteer names are matched case-sensitively so ordinary words
/// ("reading", "bath") are not mistaken for places.
fn extract_locations(visible: &str) -> Vec<String> {
    let mut locations = Vec::new();

    for caps in GAZETTEER_REGEX.captures_iter(visible) {
        push_unique(&mut locations, &caps[1]);
    }

    for caps in POSTCODE_REGEX.captures_iter(visible) {
        push_unique(&mut locations, &caps[1]);
    }

    locations
}
