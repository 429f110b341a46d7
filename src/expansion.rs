//! Taxonomy expansion
//!
//! After resolution the confirmed type is looked up in the store. Unknown
//! categories and subcategories get a synthesized entry built from the page's
//! signals; known entries have novel signal keywords merged into their
//! secondary bucket. The store is only ever added to.

use crate::classifier::BusinessActivity;
use crate::config::TaxonomyConfig;
use crate::content_signals::{BusinessModel, ExtractedSignals};
use crate::normalize::{dedup_normalized, normalize_keyword, word_count};
use crate::taxonomy::{
    lock_entry, CategoryProfile, EntrySource, KeywordCategory, TaxonomyBucket, TaxonomyEntry,
    TaxonomyStore,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Services used as seeds when synthesizing a new entry
const MAX_SEED_SERVICES: usize = 5;

/// Minimum keyword length admitted when enhancing an existing entry
const MIN_CANDIDATE_LEN: usize = 3;

const DEFAULT_URL_PATTERNS: &[&str] = &["/services/{slug}", "/{slug}"];

/// Outcome of one expansion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionResult {
    pub is_new_type: bool,
    pub is_new_subcategory: bool,
    /// Keywords the signals offered beyond the entry's buckets, for reporting.
    /// At most `max_merge_per_expansion` of them are merged.
    pub added_keywords: Vec<String>,
    /// Entry state after the call
    pub enhanced_entry: TaxonomyEntry,
}

pub struct TaxonomyExpansionManager {
    store: Arc<TaxonomyStore>,
    max_merge: usize,
    max_reported: usize,
}

impl TaxonomyExpansionManager {
    pub fn new(store: Arc<TaxonomyStore>, config: &TaxonomyConfig) -> Self {
        Self {
            store,
            max_merge: config.max_merge_per_expansion,
            max_reported: config.max_reported_additions,
        }
    }

    /// Create or enhance the entry for `(category, subcategory)`.
    pub fn expand(
        &self,
        category: &str,
        subcategory: &str,
        signals: &ExtractedSignals,
        activities: &[BusinessActivity],
        source: EntrySource,
    ) -> ExpansionResult {
        if let Some(handle) = self.store.handle(category, subcategory) {
            return self.enhance_existing(&handle, category, signals, activities);
        }

        let profile = self.store.category_profile(category);
        let entry = self.synthesize_entry(category, subcategory, signals, activities, profile, source);

        let outcome = self.store.insert_if_absent(entry);
        let handle = outcome.handle;
        if !outcome.inserted {
            debug!("{} / {} was created concurrently, enhancing instead", category, subcategory);
            return self.enhance_existing(&handle, category, signals, activities);
        }
        let category_created = outcome.category_created;

        let enhanced_entry = lock_entry(&handle).clone();
        let added_keywords: Vec<String> = enhanced_entry
            .keywords
            .iter()
            .flat_map(|(_, keywords)| keywords.iter().cloned())
            .take(self.max_reported)
            .collect();

        info!(
            "Created {} taxonomy entry {} / {} with {} keywords (confidence {:.2})",
            if category_created { "category" } else { "subcategory" },
            category,
            subcategory,
            enhanced_entry.keywords.len(),
            enhanced_entry.confidence
        );

        ExpansionResult {
            is_new_type: category_created,
            is_new_subcategory: !category_created,
            added_keywords,
            enhanced_entry,
        }
    }

    fn enhance_existing(
        &self,
        handle: &Arc<Mutex<TaxonomyEntry>>,
        category: &str,
        signals: &ExtractedSignals,
        activities: &[BusinessActivity],
    ) -> ExpansionResult {
        let cap = self.store.bucket_cap();
        // Held for the whole merge so writers to this entry are serialized
        let mut entry = lock_entry(handle);

        let candidates: Vec<String> = dedup_normalized(
            activity_keywords(activities, category)
                .iter()
                .chain(&signals.services)
                .chain(&signals.industry_terms),
        )
        .into_iter()
        .filter(|k| k.chars().count() >= MIN_CANDIDATE_LEN && !entry.keywords.contains(k))
        .collect();

        let mut merged = 0;
        for candidate in &candidates {
            if merged >= self.max_merge {
                break;
            }
            if entry.keywords.insert(KeywordCategory::Secondary, candidate, cap) {
                merged += 1;
            }
        }

        let added_keywords: Vec<String> = candidates.into_iter().take(self.max_reported).collect();
        debug!(
            "Enhanced {} / {}: {} candidate(s), {} merged",
            entry.category,
            entry.subcategory,
            added_keywords.len(),
            merged
        );

        ExpansionResult {
            is_new_type: false,
            is_new_subcategory: false,
            added_keywords,
            enhanced_entry: entry.clone(),
        }
    }

    fn synthesize_entry(
        &self,
        category: &str,
        subcategory: &str,
        signals: &ExtractedSignals,
        activities: &[BusinessActivity],
        profile: Option<CategoryProfile>,
        source: EntrySource,
    ) -> TaxonomyEntry {
        let cap = self.store.bucket_cap();
        let seeds = seed_services(category, subcategory, signals);
        let top_confidence = activities.first().map_or(0.0, |a| a.confidence);

        let mut entry = TaxonomyEntry::new(category, subcategory, source, creation_confidence(top_confidence, signals));
        let bucket = &mut entry.keywords;

        for keyword in activity_keywords(activities, category).iter().chain(&seeds) {
            bucket.insert(KeywordCategory::Primary, keyword, cap);
        }
        fill_synthesized_buckets(bucket, &seeds, signals, cap);

        match profile {
            Some(profile) => {
                entry.schema_hints = profile.schema_hints;
                entry.url_patterns = profile.url_patterns;
            }
            None => {
                entry.schema_hints = default_schema_hints(signals);
                entry.url_patterns = DEFAULT_URL_PATTERNS.iter().map(|p| p.to_string()).collect();
            }
        }
        entry
    }
}

/// Confidence for a synthesized entry, from how much evidence the page gave
pub fn creation_confidence(top_activity_confidence: f64, signals: &ExtractedSignals) -> f64 {
    let mut confidence = 0.0;
    if top_activity_confidence > 0.8 {
        confidence += 0.4;
    }
    if signals.services.len() >= 3 {
        confidence += 0.3;
    }
    if signals.navigation_items.len() >= 4 {
        confidence += 0.2;
    }
    if signals.service_descriptions.len() >= 3 {
        confidence += 0.1;
    }
    f64::min(confidence, 1.0)
}

/// Matched keywords of the activity for `category`, else of the top activity
fn activity_keywords<'a>(activities: &'a [BusinessActivity], category: &str) -> &'a [String] {
    activities
        .iter()
        .find(|a| a.activity == category)
        .or_else(|| activities.first())
        .map(|a| a.keywords.as_slice())
        .unwrap_or_default()
}

fn seed_services(category: &str, subcategory: &str, signals: &ExtractedSignals) -> Vec<String> {
    let seeds = dedup_normalized(signals.services.iter().take(MAX_SEED_SERVICES));
    if !seeds.is_empty() {
        return seeds;
    }
    let name = if subcategory.eq_ignore_ascii_case("general") { category } else { subcategory };
    vec![normalize_keyword(name)]
}

fn fill_synthesized_buckets(bucket: &mut TaxonomyBucket, seeds: &[String], signals: &ExtractedSignals, cap: usize) {
    use KeywordCategory::*;

    let (business_mods, consumer_mods) = match signals.business_model {
        BusinessModel::B2B => (true, false),
        BusinessModel::B2C => (false, true),
        BusinessModel::B2B2C | BusinessModel::Marketplace => (true, true),
    };
    let locations: Vec<String> = signals.location_indicators.iter().map(|l| normalize_keyword(l)).collect();

    for s in seeds {
        if !s.ends_with("services") {
            bucket.insert(Secondary, &format!("{} services", s), cap);
        }
        bucket.insert(Secondary, &format!("professional {}", s), cap);
        if business_mods {
            bucket.insert(Secondary, &format!("{} for businesses", s), cap);
        }
        if consumer_mods {
            bucket.insert(Secondary, &format!("affordable {}", s), cap);
        }

        if word_count(s) >= 3 {
            bucket.insert(LongTail, s, cap);
        }
        for market in &signals.target_market {
            bucket.insert(LongTail, &format!("{} for {}", s, market), cap);
        }

        for template in ["{} cost", "{} price", "{} quote", "hire {}", "book {}"] {
            bucket.insert(Commercial, &template.replace("{}", s), cap);
        }
        for template in ["what is {}", "how to choose {}", "{} guide", "{} tips"] {
            bucket.insert(Informational, &template.replace("{}", s), cap);
        }

        bucket.insert(Local, &format!("{} near me", s), cap);
        bucket.insert(Local, &format!("local {}", s), cap);
        for location in &locations {
            bucket.insert(Local, &format!("{} in {}", s, location), cap);
        }

        for modifier in ["urgent", "emergency", "same day"] {
            bucket.insert(Urgency, &format!("{} {}", modifier, s), cap);
        }
    }
}

fn default_schema_hints(signals: &ExtractedSignals) -> Vec<String> {
    let mut hints = vec!["Organization".to_string()];
    if !signals.location_indicators.is_empty() {
        hints.push("LocalBusiness".to_string());
    }
    if signals.business_model == BusinessModel::B2B {
        hints.push("ProfessionalService".to_string());
    }
    hints
}
