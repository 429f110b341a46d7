//! Business activity classifier
//!
//! Scores candidate categories against extracted signals. Each category has
//! three term lists: content keywords (counted), navigation terms (presence)
//! and headline terms (presence). The table is a fixed seed set merged with
//! whatever the taxonomy store knows, so newly discovered categories become
//! classifiable on the next run.

use crate::config::ClassifierConfig;
use crate::content_signals::{count_phrase, ExtractedSignals};
use crate::normalize::normalize_keyword;
use crate::taxonomy::{KeywordCategory, TaxonomyStore};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Seed patterns: (category, content keywords, navigation terms, headline terms)
const SEED_PATTERNS: &[(&str, &[&str], &[&str], &[&str])] = &[
    (
        "Legal Services",
        &[
            "solicitor", "solicitors", "lawyer", "lawyers", "legal advice", "law firm", "divorce",
            "family law", "conveyancing", "litigation",
        ],
        &["family law", "commercial law", "conveyancing", "legal services", "litigation", "wills"],
        &["solicitors", "legal", "law firm", "lawyers"],
    ),
    (
        "Accounting & Finance",
        &[
            "accountant", "accountants", "accounting", "bookkeeping", "tax return", "payroll", "vat",
            "audit", "self assessment",
        ],
        &["accounting", "tax", "bookkeeping", "payroll", "audit"],
        &["accountants", "accounting", "tax advisers"],
    ),
    (
        "Home Services",
        &["plumber", "plumbing", "boiler", "heating", "electrician", "electrical", "leak", "radiator"],
        &["plumbing", "heating", "boiler", "electrical"],
        &["plumbing", "plumber", "heating", "electrician"],
    ),
    (
        "Healthcare",
        &["dentist", "dental", "clinic", "patients", "physiotherapy", "doctor", "gp"],
        &["dental", "physiotherapy", "appointments", "patients"],
        &["dental", "clinic", "healthcare", "physiotherapy"],
    ),
    (
        "Hospitality",
        &["restaurant", "menu", "dining", "hotel", "rooms", "cuisine", "chef", "breakfast"],
        &["menu", "rooms", "book a table", "dining", "reservations"],
        &["restaurant", "hotel", "dining"],
    ),
    (
        "Technology",
        &["software", "web design", "website", "it support", "cloud", "developers", "app"],
        &["web design", "development", "it support", "software", "hosting"],
        &["software", "web design", "it support"],
    ),
    (
        "Marketing Services",
        &["marketing", "seo", "social media", "ppc", "advertising", "branding", "digital marketing"],
        &["seo", "ppc", "social media", "marketing", "branding"],
        &["marketing", "seo", "agency"],
    ),
    (
        "Real Estate",
        &["property", "properties", "estate agent", "lettings", "landlord", "tenants", "for sale"],
        &["lettings", "landlords", "valuation", "property search"],
        &["estate agents", "property", "lettings"],
    ),
    (
        "Automotive",
        &["car", "cars", "mot", "garage", "tyres", "vehicle", "used cars"],
        &["mot", "servicing", "used cars", "tyres"],
        &["garage", "car", "mot"],
    ),
    (
        "Beauty & Wellness",
        &["salon", "hair", "beauty", "nails", "spa", "massage", "gym", "facial"],
        &["hair", "beauty", "nails", "spa", "membership"],
        &["salon", "beauty", "spa", "gym"],
    ),
    (
        "Construction",
        &["builder", "builders", "construction", "extension", "renovation", "architect", "loft conversion"],
        &["extensions", "renovations", "loft conversions", "new builds", "architecture"],
        &["builders", "construction", "architects"],
    ),
];

/// One scored category with the evidence behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessActivity {
    /// Category name
    pub activity: String,
    pub confidence: f64,
    pub evidence: Vec<String>,
    /// Terms that matched, in match order
    pub keywords: Vec<String>,
}

/// Term lists for one candidate category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPattern {
    pub category: String,
    pub keywords: Vec<String>,
    pub navigation_terms: Vec<String>,
    pub headline_terms: Vec<String>,
}

impl CategoryPattern {
    fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            keywords: Vec::new(),
            navigation_terms: Vec::new(),
            headline_terms: Vec::new(),
        }
    }
}

fn add_term(list: &mut Vec<String>, term: &str) {
    let term = normalize_keyword(term);
    if !term.is_empty() && !list.contains(&term) {
        list.push(term);
    }
}

pub struct BusinessActivityClassifier {
    patterns: Vec<CategoryPattern>,
    config: ClassifierConfig,
}

impl BusinessActivityClassifier {
    /// Classifier over the seed table only
    pub fn with_seed_patterns(config: &ClassifierConfig) -> Self {
        let patterns = SEED_PATTERNS
            .iter()
            .map(|(category, keywords, nav, headlines)| {
                let mut pattern = CategoryPattern::new(category);
                keywords.iter().for_each(|k| add_term(&mut pattern.keywords, k));
                nav.iter().for_each(|t| add_term(&mut pattern.navigation_terms, t));
                headlines.iter().for_each(|t| add_term(&mut pattern.headline_terms, t));
                pattern
            })
            .collect();
        Self {
            patterns,
            config: config.clone(),
        }
    }

    /// Seed table merged with the store's categories.
    ///
    /// Subcategory names become navigation and headline terms; primary
    /// keywords become content keywords. Categories unknown to the seed table
    /// are appended after it.
    pub fn from_store(store: &TaxonomyStore, config: &ClassifierConfig) -> Self {
        let mut classifier = Self::with_seed_patterns(config);

        for entry in store.snapshot() {
            let index = match classifier
                .patterns
                .iter()
                .position(|p| p.category == entry.category)
            {
                Some(index) => index,
                None => {
                    classifier.patterns.push(CategoryPattern::new(&entry.category));
                    classifier.patterns.len() - 1
                }
            };
            let pattern = &mut classifier.patterns[index];

            if !entry.subcategory.eq_ignore_ascii_case("general") {
                add_term(&mut pattern.navigation_terms, &entry.subcategory);
                add_term(&mut pattern.headline_terms, &entry.subcategory);
            }
            for keyword in entry.keywords.get(KeywordCategory::Primary) {
                add_term(&mut pattern.keywords, keyword);
            }
        }

        debug!("Classifier built with {} category patterns", classifier.patterns.len());
        classifier
    }

    /// Rank categories for the given signals, best first.
    pub fn classify(&self, signals: &ExtractedSignals) -> Vec<BusinessActivity> {
        let nav: Vec<String> = signals.navigation_items.iter().map(|n| n.to_lowercase()).collect();
        let headlines: Vec<String> = signals.headlines.iter().map(|h| h.to_lowercase()).collect();

        let mut activities: Vec<BusinessActivity> = self
            .patterns
            .iter()
            .filter_map(|pattern| self.score_pattern(pattern, &signals.body_text, &nav, &headlines))
            .collect();

        // Stable: equal confidences keep table order
        activities.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        activities.truncate(self.config.max_activities);

        for activity in &activities {
            debug!("Activity {} scored {:.2}", activity.activity, activity.confidence);
        }
        activities
    }

    fn score_pattern(
        &self,
        pattern: &CategoryPattern,
        body_text: &str,
        nav: &[String],
        headlines: &[String],
    ) -> Option<BusinessActivity> {
        let mut score = 0.0;
        let mut evidence = Vec::new();
        let mut matched = Vec::new();

        for keyword in &pattern.keywords {
            let count = count_phrase(body_text, keyword);
            if count > 0 {
                score += self.config.keyword_weight * count as f64;
                evidence.push(format!("content mentions '{}' {} time(s)", keyword, count));
                add_term(&mut matched, keyword);
            }
        }

        for term in &pattern.navigation_terms {
            if nav.iter().any(|item| count_phrase(item, term) > 0) {
                score += self.config.navigation_weight;
                evidence.push(format!("navigation links to '{}'", term));
                add_term(&mut matched, term);
            }
        }

        for term in &pattern.headline_terms {
            if headlines.iter().any(|h| count_phrase(h, term) > 0) {
                score += self.config.headline_weight;
                evidence.push(format!("headline mentions '{}'", term));
                add_term(&mut matched, term);
            }
        }

        if score <= 0.0 {
            return None;
        }

        Some(BusinessActivity {
            activity: pattern.category.clone(),
            confidence: (score / self.config.normalization_divisor).clamp(0.0, 1.0),
            evidence,
            keywords: matched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{EntrySource, TaxonomyEntry, DEFAULT_BUCKET_CAP};

    fn signals(nav: &[&str], headlines: &[&str], body: &str) -> ExtractedSignals {
        ExtractedSignals {
            navigation_items: nav.iter().map(|s| s.to_string()).collect(),
            headlines: headlines.iter().map(|s| s.to_string()).collect(),
            body_text: body.to_lowercase(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_signals_yield_no_activities() {
        let classifier = BusinessActivityClassifier::with_seed_patterns(&ClassifierConfig::default());
        assert!(classifier.classify(&ExtractedSignals::default()).is_empty());
    }

    #[test]
    fn test_navigation_outweighs_keyword_frequency() {
        let classifier = BusinessActivityClassifier::with_seed_patterns(&ClassifierConfig::default());
        // One nav hit (10) beats three keyword hits (6)
        let s = signals(&["Plumbing"], &[], "marketing marketing marketing");
        let activities = classifier.classify(&s);
        assert_eq!(activities[0].activity, "Home Services");
        assert!(activities[0].evidence.iter().any(|e| e.contains("navigation")));
    }

    #[test]
    fn test_keyword_occurrences_are_additive() {
        let classifier = BusinessActivityClassifier::with_seed_patterns(&ClassifierConfig::default());
        let s = signals(&[], &[], "divorce divorce divorce");
        let activities = classifier.classify(&s);
        assert_eq!(activities.len(), 1);
        assert!((activities[0].confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_capped_and_top_three_kept() {
        let classifier = BusinessActivityClassifier::with_seed_patterns(&ClassifierConfig::default());
        let s = signals(
            &["Family Law", "Commercial Law", "SEO", "Menu", "MOT"],
            &["Solicitors"],
            "solicitors divorce marketing restaurant garage",
        );
        let activities = classifier.classify(&s);
        assert_eq!(activities.len(), 3);
        assert_eq!(activities[0].activity, "Legal Services");
        assert_eq!(activities[0].confidence, 1.0);
        for pair in activities.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn test_ties_keep_table_order() {
        let classifier = BusinessActivityClassifier::with_seed_patterns(&ClassifierConfig::default());
        let s = signals(&[], &[], "marketing solicitor");
        let activities = classifier.classify(&s);
        assert_eq!(activities[0].activity, "Legal Services");
        assert_eq!(activities[1].activity, "Marketing Services");
    }

    #[test]
    fn test_store_categories_become_patterns() {
        let store = TaxonomyStore::new(DEFAULT_BUCKET_CAP);
        let mut entry = TaxonomyEntry::new("Pet Care", "Dog Grooming", EntrySource::ContentAnalysis, 0.5);
        entry.keywords.insert(KeywordCategory::Primary, "dog grooming", 15);
        store.insert_if_absent(entry);

        let classifier = BusinessActivityClassifier::from_store(&store, &ClassifierConfig::default());
        let s = signals(&["Dog Grooming"], &[], "professional dog grooming");
        let activities = classifier.classify(&s);
        assert_eq!(activities[0].activity, "Pet Care");
        assert!((activities[0].confidence - 0.6).abs() < 1e-9);
        assert!(activities[0].keywords.contains(&"dog grooming".to_string()));
    }
}
