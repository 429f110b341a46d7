//! Keyword generation
//!
//! Turns a taxonomy entry plus business context into the final
//! seven-category keyword set. Literal taxonomy keywords come first, then
//! template combinations of the business's services, then content hints.
//! Every keyword is tagged with intent, difficulty, relevance and volume tier.
//!
//! Categories are filled in fixed order with one shared dedup set, so a
//! keyword never appears twice in the whole set.

pub mod templates;

use crate::config::KeywordsConfig;
use crate::normalize::{dedup_normalized, normalize_keyword, strip_business_suffixes, word_count};
use crate::taxonomy::{KeywordCategory, TaxonomyEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use templates::{templates_for, TemplateContext};
use tracing::debug;

/// Service phrases expanded through templates
const MAX_TEMPLATE_SEEDS: usize = 5;

/// Taxonomy primaries used as seeds when the page lists no services
const MAX_PRIMARY_SEEDS: usize = 3;

pub const GENERATION_METHOD_TAXONOMY: &str = "taxonomy_template";
pub const GENERATION_METHOD_FALLBACK: &str = "fallback_content_based";

const CONTENT_HINT_RELEVANCE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchIntent {
    Commercial,
    Informational,
    Navigational,
    Transactional,
}

impl fmt::Display for SearchIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchIntent::Commercial => write!(f, "commercial"),
            SearchIntent::Informational => write!(f, "informational"),
            SearchIntent::Navigational => write!(f, "navigational"),
            SearchIntent::Transactional => write!(f, "transactional"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Low,
    Medium,
    High,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Low => write!(f, "low"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::High => write!(f, "high"),
        }
    }
}

/// Search volume tier; shares the low/medium/high scale with difficulty
pub type VolumeTier = Difficulty;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordWithMetadata {
    pub keyword: String,
    pub category: KeywordCategory,
    pub intent: SearchIntent,
    pub difficulty: Difficulty,
    pub business_relevance: f64,
    pub search_volume_tier: VolumeTier,
    /// False for literal taxonomy keywords and content phrases
    pub generated: bool,
    pub template: Option<String>,
}

impl KeywordWithMetadata {
    fn new(keyword: String, category: KeywordCategory, relevance: f64, template: Option<&str>) -> Self {
        let (difficulty, search_volume_tier) = estimate_difficulty(&keyword, category);
        Self {
            intent: intent_for(&keyword, category),
            keyword,
            category,
            difficulty,
            business_relevance: relevance.clamp(0.0, 1.0),
            search_volume_tier,
            generated: template.is_some(),
            template: template.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedKeywordSet {
    pub primary: Vec<KeywordWithMetadata>,
    pub secondary: Vec<KeywordWithMetadata>,
    pub long_tail: Vec<KeywordWithMetadata>,
    pub commercial: Vec<KeywordWithMetadata>,
    pub informational: Vec<KeywordWithMetadata>,
    pub local: Vec<KeywordWithMetadata>,
    pub urgency: Vec<KeywordWithMetadata>,
    pub total_generated: usize,
    pub industry_specific: bool,
    pub generation_method: String,
}

impl GeneratedKeywordSet {
    pub fn get(&self, category: KeywordCategory) -> &[KeywordWithMetadata] {
        match category {
            KeywordCategory::Primary => &self.primary,
            KeywordCategory::Secondary => &self.secondary,
            KeywordCategory::LongTail => &self.long_tail,
            KeywordCategory::Commercial => &self.commercial,
            KeywordCategory::Informational => &self.informational,
            KeywordCategory::Local => &self.local,
            KeywordCategory::Urgency => &self.urgency,
        }
    }

    fn get_mut(&mut self, category: KeywordCategory) -> &mut Vec<KeywordWithMetadata> {
        match category {
            KeywordCategory::Primary => &mut self.primary,
            KeywordCategory::Secondary => &mut self.secondary,
            KeywordCategory::LongTail => &mut self.long_tail,
            KeywordCategory::Commercial => &mut self.commercial,
            KeywordCategory::Informational => &mut self.informational,
            KeywordCategory::Local => &mut self.local,
            KeywordCategory::Urgency => &mut self.urgency,
        }
    }

    /// All keywords in category order
    pub fn iter(&self) -> impl Iterator<Item = &KeywordWithMetadata> + '_ {
        KeywordCategory::ALL.into_iter().flat_map(move |c| self.get(c).iter())
    }

    /// Number of non-empty categories
    pub fn categories_covered(&self) -> usize {
        KeywordCategory::ALL.into_iter().filter(|c| !self.get(*c).is_empty()).count()
    }

    pub fn contains(&self, keyword: &str) -> bool {
        let normalized = normalize_keyword(keyword);
        self.iter().any(|k| k.keyword == normalized)
    }
}

/// Facts about the business that feed template expansion
#[derive(Debug, Clone, Default)]
pub struct BusinessContext {
    pub name: String,
    pub services: Vec<String>,
    pub is_local_business: bool,
    pub locations: Vec<String>,
    pub target_market: Vec<String>,
}

/// Per-run accumulator enforcing global dedup and the per-category cap
struct SetBuilder {
    set: GeneratedKeywordSet,
    seen: HashSet<String>,
    cap: usize,
}

impl SetBuilder {
    fn new(cap: usize) -> Self {
        Self {
            set: GeneratedKeywordSet::default(),
            seen: HashSet::new(),
            cap,
        }
    }

    fn push(&mut self, keyword: &str, category: KeywordCategory, relevance: f64, template: Option<&str>) -> bool {
        let keyword = normalize_keyword(keyword);
        if keyword.is_empty() || self.set.get(category).len() >= self.cap || self.seen.contains(&keyword) {
            return false;
        }
        self.seen.insert(keyword.clone());
        self.set
            .get_mut(category)
            .push(KeywordWithMetadata::new(keyword, category, relevance, template));
        true
    }

    fn finish(mut self, industry_specific: bool, method: &str) -> GeneratedKeywordSet {
        self.set.total_generated = self.set.iter().count();
        self.set.industry_specific = industry_specific;
        self.set.generation_method = method.to_string();
        self.set
    }
}

pub struct KeywordGenerationEngine {
    config: KeywordsConfig,
}

impl KeywordGenerationEngine {
    pub fn new(config: &KeywordsConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Generate the keyword set. With no taxonomy entry the name-based
    /// fallback set is produced instead.
    pub fn generate(
        &self,
        entry: Option<&TaxonomyEntry>,
        context: &BusinessContext,
        content_hints: &[String],
    ) -> GeneratedKeywordSet {
        let Some(entry) = entry else {
            return self.generate_fallback(context, content_hints);
        };

        let mut builder = SetBuilder::new(self.config.max_per_category);
        let seeds = template_seeds(entry, context);
        let template_ctx = TemplateContext {
            business_name: strip_business_suffixes(&context.name),
            locations: context.locations.iter().map(|l| normalize_keyword(l)).collect(),
            target_market: context.target_market.clone(),
        };
        let hints = self.hints(content_hints);

        for category in KeywordCategory::ALL {
            if category == KeywordCategory::Local && !context.is_local_business {
                continue;
            }

            for keyword in entry.keywords.get(category) {
                builder.push(keyword, category, literal_relevance(category), None);
            }

            for template in templates_for(category) {
                for seed in &seeds {
                    for keyword in template.render(seed, &template_ctx) {
                        builder.push(&keyword, category, template.relevance, Some(template.name));
                    }
                }
            }

            if category == KeywordCategory::Secondary {
                for hint in hints.iter().filter(|h| word_count(h) < 3) {
                    builder.push(hint, category, CONTENT_HINT_RELEVANCE, None);
                }
            }
            if category == KeywordCategory::LongTail {
                for hint in hints.iter().filter(|h| word_count(h) >= 3) {
                    builder.push(hint, category, CONTENT_HINT_RELEVANCE, None);
                }
            }
        }

        let set = builder.finish(true, GENERATION_METHOD_TAXONOMY);
        debug!(
            "Generated {} keywords across {} categories for {} / {}",
            set.total_generated,
            set.categories_covered(),
            entry.category,
            entry.subcategory
        );
        set
    }

    /// Name plus content based keywords for businesses the taxonomy has no entry for
    pub fn generate_fallback(&self, context: &BusinessContext, content_hints: &[String]) -> GeneratedKeywordSet {
        let mut builder = SetBuilder::new(self.config.max_per_category);

        let name = normalize_keyword(&context.name);
        builder.push(&name, KeywordCategory::Primary, 0.8, None);

        let core = strip_business_suffixes(&context.name);
        if !core.is_empty() {
            builder.push(&core, KeywordCategory::Primary, 0.7, None);
            if !core.ends_with("services") {
                builder.push(&format!("{} services", core), KeywordCategory::Secondary, 0.7, None);
            }
        }

        for hint in self.hints(content_hints) {
            let category = if word_count(&hint) >= 3 {
                KeywordCategory::LongTail
            } else {
                KeywordCategory::Secondary
            };
            builder.push(&hint, category, CONTENT_HINT_RELEVANCE, None);
        }

        let set = builder.finish(false, GENERATION_METHOD_FALLBACK);
        debug!("Generated {} fallback keywords for {}", set.total_generated, context.name);
        set
    }

    fn hints(&self, content_hints: &[String]) -> Vec<String> {
        dedup_normalized(content_hints)
            .into_iter()
            .take(self.config.max_content_hints)
            .collect()
    }
}

fn template_seeds(entry: &TaxonomyEntry, context: &BusinessContext) -> Vec<String> {
    let services = dedup_normalized(context.services.iter().take(MAX_TEMPLATE_SEEDS));
    if !services.is_empty() {
        return services;
    }
    entry
        .keywords
        .get(KeywordCategory::Primary)
        .iter()
        .take(MAX_PRIMARY_SEEDS)
        .cloned()
        .collect()
}

/// Relevance of literal taxonomy keywords by bucket
fn literal_relevance(category: KeywordCategory) -> f64 {
    match category {
        KeywordCategory::Primary => 0.9,
        KeywordCategory::Secondary => 0.8,
        _ => 0.7,
    }
}

fn intent_for(keyword: &str, category: KeywordCategory) -> SearchIntent {
    match category {
        KeywordCategory::Primary | KeywordCategory::Local => SearchIntent::Navigational,
        KeywordCategory::Informational => SearchIntent::Informational,
        KeywordCategory::Urgency => SearchIntent::Transactional,
        KeywordCategory::Commercial => {
            if templates::ACTION_VERBS.iter().any(|verb| keyword.starts_with(&format!("{} ", verb))) {
                SearchIntent::Transactional
            } else {
                SearchIntent::Commercial
            }
        }
        KeywordCategory::Secondary => SearchIntent::Commercial,
        KeywordCategory::LongTail => {
            if ["how ", "what ", "why ", "when ", "which "].iter().any(|q| keyword.starts_with(q)) {
                SearchIntent::Informational
            } else {
                SearchIntent::Commercial
            }
        }
    }
}

/// (difficulty, volume tier) heuristic from phrase length and category
fn estimate_difficulty(keyword: &str, category: KeywordCategory) -> (Difficulty, VolumeTier) {
    let words = word_count(keyword);
    let (difficulty, mut volume) = if category == KeywordCategory::Primary && words <= 2 {
        (Difficulty::High, Difficulty::High)
    } else if words >= 4 {
        (Difficulty::Low, Difficulty::Low)
    } else {
        (Difficulty::Medium, Difficulty::Medium)
    };
    if category == KeywordCategory::Local && keyword.contains("near me") {
        volume = Difficulty::High;
    }
    (difficulty, volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{EntrySource, TaxonomyStore, DEFAULT_BUCKET_CAP};

    fn plumbing_entry() -> TaxonomyEntry {
        TaxonomyStore::load_default(DEFAULT_BUCKET_CAP)
            .unwrap()
            .get("Home Services", "Plumbing & Heating")
            .unwrap()
    }

    fn context(local: bool) -> BusinessContext {
        BusinessContext {
            name: "Harbour Plumbing Ltd".into(),
            services: vec!["boiler repair".into(), "bathroom fitting".into()],
            is_local_business: local,
            locations: vec!["Bristol".into()],
            target_market: vec!["homeowners".into()],
        }
    }

    fn engine() -> KeywordGenerationEngine {
        KeywordGenerationEngine::new(&KeywordsConfig::default())
    }

    #[test]
    fn test_generates_all_categories_for_local_business() {
        let entry = plumbing_entry();
        let set = engine().generate(Some(&entry), &context(true), &[]);
        assert_eq!(set.categories_covered(), 7);
        assert!(set.industry_specific);
        assert_eq!(set.generation_method, GENERATION_METHOD_TAXONOMY);
        assert_eq!(set.total_generated, set.iter().count());
        assert!(set.contains("boiler repair in bristol"));
        assert!(set.contains("emergency boiler repair"));
    }

    #[test]
    fn test_local_skipped_for_non_local_business() {
        let entry = plumbing_entry();
        let set = engine().generate(Some(&entry), &context(false), &[]);
        assert!(set.local.is_empty());
        assert!(!set.iter().any(|k| k.category == KeywordCategory::Local));
    }

    #[test]
    fn test_no_duplicates_across_categories() {
        let entry = plumbing_entry();
        let hints = vec!["Boiler Repair".to_string(), "boiler repair".to_string(), "plumber".to_string()];
        let set = engine().generate(Some(&entry), &context(true), &hints);
        let mut seen = HashSet::new();
        for k in set.iter() {
            assert!(seen.insert(k.keyword.to_lowercase()), "duplicate {}", k.keyword);
        }
    }

    #[test]
    fn test_per_category_cap() {
        let entry = plumbing_entry();
        let engine = KeywordGenerationEngine::new(&KeywordsConfig {
            max_per_category: 4,
            max_content_hints: 10,
        });
        let set = engine.generate(Some(&entry), &context(true), &[]);
        for category in KeywordCategory::ALL {
            assert!(set.get(category).len() <= 4);
        }
    }

    #[test]
    fn test_metadata_heuristics() {
        let entry = plumbing_entry();
        let set = engine().generate(Some(&entry), &context(true), &[]);

        let literal = &set.primary[0];
        assert!(!literal.generated);
        assert_eq!(literal.business_relevance, 0.9);
        assert_eq!(literal.intent, SearchIntent::Navigational);

        let near_me = set.local.iter().find(|k| k.keyword.ends_with("near me")).unwrap();
        assert_eq!(near_me.search_volume_tier, Difficulty::High);

        let hire = set.commercial.iter().find(|k| k.keyword.starts_with("hire ")).unwrap();
        assert_eq!(hire.intent, SearchIntent::Transactional);
        assert_eq!(hire.template.as_deref(), Some("action"));

        for k in set.iter().filter(|k| word_count(&k.keyword) >= 4) {
            assert_eq!(k.difficulty, Difficulty::Low);
        }
    }

    #[test]
    fn test_estimate_difficulty() {
        assert_eq!(estimate_difficulty("plumber bristol", KeywordCategory::Primary), (Difficulty::High, Difficulty::High));
        assert_eq!(
            estimate_difficulty("how to bleed a radiator", KeywordCategory::LongTail),
            (Difficulty::Low, Difficulty::Low)
        );
        assert_eq!(
            estimate_difficulty("plumber near me", KeywordCategory::Local),
            (Difficulty::Medium, Difficulty::High)
        );
    }

    #[test]
    fn test_fallback_when_no_entry() {
        let hints: Vec<String> = (0..15).map(|i| format!("hint{}", i)).collect();
        let ctx = BusinessContext {
            name: "Zephyr Widgets Ltd".into(),
            ..Default::default()
        };
        let set = engine().generate(None, &ctx, &hints);
        assert!(!set.industry_specific);
        assert_eq!(set.generation_method, GENERATION_METHOD_FALLBACK);
        assert!(set.contains("zephyr widgets ltd"));
        assert!(set.contains("zephyr widgets services"));
        assert!(set.contains("hint9"));
        assert!(!set.contains("hint10"));
        assert!(set.local.is_empty());
    }

    #[test]
    fn test_primary_seeds_used_without_services() {
        let mut entry = TaxonomyEntry::new("Pet Care", "Dog Grooming", EntrySource::ContentAnalysis, 0.5);
        entry.keywords.insert(KeywordCategory::Primary, "dog grooming", 15);
        let set = engine().generate(Some(&entry), &BusinessContext::default(), &[]);
        assert!(set.contains("dog grooming prices"));
        assert!(set.contains("what is dog grooming"));
    }
}
