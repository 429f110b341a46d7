//! Keyword taxonomy store
//!
//! Holds the `{category -> {subcategory -> keyword buckets}}` vocabulary the
//! classifier and keyword engine work from. It supports:
//! - The JSON dataset shipped with the tool (embedded at compile time)
//! - A replacement dataset loaded from disk
//! - Saving the grown taxonomy back to JSON so discovered types persist
//!
//! The store is shared across analyses. Entries are append-only: keywords are
//! merged into existing buckets and never removed. Each entry sits behind its
//! own mutex so concurrent expansions of the same `(category, subcategory)`
//! are serialized while other entries stay writable.

use crate::config::TaxonomyConfig;
use crate::normalize::normalize_keyword;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Taxonomy dataset shipped with the tool
pub const DEFAULT_TAXONOMY: &str = include_str!("../config/taxonomy.json");

/// Default soft maximum of keywords per bucket
pub const DEFAULT_BUCKET_CAP: usize = 15;

/// Allowed range for the per-bucket cap
pub const BUCKET_CAP_RANGE: std::ops::RangeInclusive<usize> = 10..=20;

#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("Failed to read or write taxonomy dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse taxonomy dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid taxonomy entry '{category} / {subcategory}': {reason}")]
    InvalidEntry {
        category: String,
        subcategory: String,
        reason: String,
    },
}

/// The seven keyword buckets, also used to tag generated keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeywordCategory {
    Primary,
    Secondary,
    LongTail,
    Commercial,
    Informational,
    Local,
    Urgency,
}

impl KeywordCategory {
    pub const ALL: [KeywordCategory; 7] = [
        KeywordCategory::Primary,
        KeywordCategory::Secondary,
        KeywordCategory::LongTail,
        KeywordCategory::Commercial,
        KeywordCategory::Informational,
        KeywordCategory::Local,
        KeywordCategory::Urgency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordCategory::Primary => "primary",
            KeywordCategory::Secondary => "secondary",
            KeywordCategory::LongTail => "long-tail",
            KeywordCategory::Commercial => "commercial",
            KeywordCategory::Informational => "informational",
            KeywordCategory::Local => "local",
            KeywordCategory::Urgency => "urgency",
        }
    }
}

impl fmt::Display for KeywordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Seven disjoint keyword sets for one business subcategory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyBucket {
    #[serde(default)]
    pub primary: Vec<String>,
    #[serde(default)]
    pub secondary: Vec<String>,
    #[serde(default)]
    pub long_tail: Vec<String>,
    #[serde(default)]
    pub commercial: Vec<String>,
    #[serde(default)]
    pub informational: Vec<String>,
    #[serde(default)]
    pub local: Vec<String>,
    #[serde(default)]
    pub urgency: Vec<String>,
}

impl TaxonomyBucket {
    pub fn get(&self, kind: KeywordCategory) -> &[String] {
        match kind {
            KeywordCategory::Primary => &self.primary,
            KeywordCategory::Secondary => &self.secondary,
            KeywordCategory::LongTail => &self.long_tail,
            KeywordCategory::Commercial => &self.commercial,
            KeywordCategory::Informational => &self.informational,
            KeywordCategory::Local => &self.local,
            KeywordCategory::Urgency => &self.urgency,
        }
    }

    fn get_mut(&mut self, kind: KeywordCategory) -> &mut Vec<String> {
        match kind {
            KeywordCategory::Primary => &mut self.primary,
            KeywordCategory::Secondary => &mut self.secondary,
            KeywordCategory::LongTail => &mut self.long_tail,
            KeywordCategory::Commercial => &mut self.commercial,
            KeywordCategory::Informational => &mut self.informational,
            KeywordCategory::Local => &mut self.local,
            KeywordCategory::Urgency => &mut self.urgency,
        }
    }

    /// Which bucket (if any) already holds this keyword
    pub fn category_of(&self, keyword: &str) -> Option<KeywordCategory> {
        let normalized = normalize_keyword(keyword);
        KeywordCategory::ALL
            .into_iter()
            .find(|kind| self.get(*kind).iter().any(|k| *k == normalized))
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.category_of(keyword).is_some()
    }

    /// Add a keyword to one bucket.
    ///
    /// Returns false when the keyword is empty, already present in any bucket,
    /// or the target bucket has reached `cap`.
    pub fn insert(&mut self, kind: KeywordCategory, keyword: &str, cap: usize) -> bool {
        let normalized = normalize_keyword(keyword);
        if normalized.is_empty() || self.contains(&normalized) {
            return false;
        }
        let bucket = self.get_mut(kind);
        if bucket.len() >= cap {
            return false;
        }
        bucket.push(normalized);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (KeywordCategory, &[String])> + '_ {
        KeywordCategory::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    pub fn len(&self) -> usize {
        self.iter().map(|(_, keywords)| keywords.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop keywords past `cap` from the end of each bucket; returns how many went
    fn truncate_to(&mut self, cap: usize) -> usize {
        KeywordCategory::ALL
            .into_iter()
            .map(|kind| {
                let bucket = self.get_mut(kind);
                let over = bucket.len().saturating_sub(cap);
                bucket.truncate(cap);
                over
            })
            .sum()
    }

    /// Normalize every keyword in place and check the buckets are disjoint
    fn normalize_and_check(&mut self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for kind in KeywordCategory::ALL {
            for keyword in self.get_mut(kind).iter_mut() {
                *keyword = normalize_keyword(keyword);
                if keyword.is_empty() {
                    return Err(format!("empty keyword in {} bucket", kind));
                }
                if !seen.insert(keyword.clone()) {
                    return Err(format!("keyword '{}' appears in more than one bucket", keyword));
                }
            }
        }
        Ok(())
    }
}

/// Where a taxonomy entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    /// Curated dataset shipped with the tool
    #[default]
    Dataset,
    ContentAnalysis,
    Registry,
    UserInput,
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntrySource::Dataset => write!(f, "dataset"),
            EntrySource::ContentAnalysis => write!(f, "content_analysis"),
            EntrySource::Registry => write!(f, "registry"),
            EntrySource::UserInput => write!(f, "user_input"),
        }
    }
}

/// One `(category, subcategory)` entry with its buckets and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyEntry {
    pub category: String,
    pub subcategory: String,
    pub keywords: TaxonomyBucket,
    pub uk_terms: Vec<String>,
    pub url_patterns: Vec<String>,
    pub schema_hints: Vec<String>,
    pub confidence: f64,
    pub source: EntrySource,
    pub created_at: DateTime<Utc>,
}

impl TaxonomyEntry {
    pub fn new(category: &str, subcategory: &str, source: EntrySource, confidence: f64) -> Self {
        Self {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            keywords: TaxonomyBucket::default(),
            uk_terms: Vec::new(),
            url_patterns: Vec::new(),
            schema_hints: Vec::new(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
            created_at: Utc::now(),
        }
    }

    /// True for entries discovered at runtime rather than shipped
    pub fn is_dynamic(&self) -> bool {
        self.source != EntrySource::Dataset
    }
}

/// Conventions shared by all subcategories of a category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProfile {
    #[serde(default)]
    pub schema_hints: Vec<String>,
    #[serde(default)]
    pub url_patterns: Vec<String>,
}

/// On-disk dataset format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaxonomyDataset {
    version: String,
    updated: String,
    #[serde(default)]
    description: String,
    categories: BTreeMap<String, CategoryRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryRecord {
    #[serde(flatten)]
    profile: CategoryProfile,
    #[serde(default)]
    subcategories: BTreeMap<String, SubcategoryRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubcategoryRecord {
    keywords: TaxonomyBucket,
    #[serde(default)]
    uk_terms: Vec<String>,
    #[serde(default = "default_dataset_confidence")]
    confidence: f64,
    #[serde(default)]
    source: EntrySource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

fn default_dataset_confidence() -> f64 {
    1.0
}

type TaxonomyKey = (String, String);

/// Result of [`TaxonomyStore::insert_if_absent`]
#[derive(Debug)]
pub struct InsertOutcome {
    /// Handle stored under the key, whoever inserted it
    pub handle: Arc<Mutex<TaxonomyEntry>>,
    /// Whether the offered entry is the one now stored
    pub inserted: bool,
    /// Whether this insert also introduced the category
    pub category_created: bool,
}

/// Statistics about the store contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonomyStats {
    pub version: String,
    pub categories: usize,
    pub entries: usize,
    pub keywords: usize,
    pub dynamic_entries: usize,
}

/// Process-wide taxonomy store
#[derive(Debug)]
pub struct TaxonomyStore {
    version: String,
    description: String,
    bucket_cap: usize,
    categories: RwLock<BTreeMap<String, CategoryProfile>>,
    entries: RwLock<BTreeMap<TaxonomyKey, Arc<Mutex<TaxonomyEntry>>>>,
}

impl TaxonomyStore {
    /// Create an empty store
    pub fn new(bucket_cap: usize) -> Self {
        Self {
            version: "1.0.0".to_string(),
            description: "Keyword taxonomy".to_string(),
            bucket_cap,
            categories: RwLock::new(BTreeMap::new()),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load the dataset embedded in the binary
    pub fn load_default(bucket_cap: usize) -> Result<Self, TaxonomyError> {
        Self::from_json_str(DEFAULT_TAXONOMY, bucket_cap)
    }

    /// Load the persisted taxonomy if it exists, else the configured
    /// dataset, else the embedded one
    pub fn load_configured(config: &TaxonomyConfig) -> Result<Self, TaxonomyError> {
        if let Some(path) = config.persist_path.as_deref().filter(|p| p.exists()) {
            return Self::load_from_path(path, config.bucket_cap);
        }
        match config.dataset_path.as_deref() {
            Some(path) => Self::load_from_path(path, config.bucket_cap),
            None => Self::load_default(config.bucket_cap),
        }
    }

    /// Load a dataset from a JSON file
    pub fn load_from_path(path: &Path, bucket_cap: usize) -> Result<Self, TaxonomyError> {
        info!("Loading taxonomy dataset from: {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content, bucket_cap)
    }

    pub fn from_json_str(json: &str, bucket_cap: usize) -> Result<Self, TaxonomyError> {
        let dataset: TaxonomyDataset = serde_json::from_str(json)?;

        let mut categories = BTreeMap::new();
        let mut entries = BTreeMap::new();

        for (category, record) in dataset.categories {
            for (subcategory, sub) in record.subcategories {
                let invalid = |reason: String| TaxonomyError::InvalidEntry {
                    category: category.clone(),
                    subcategory: subcategory.clone(),
                    reason,
                };

                if category.trim().is_empty() || subcategory.trim().is_empty() {
                    return Err(invalid("category and subcategory must be non-empty".to_string()));
                }
                if !(0.0..=1.0).contains(&sub.confidence) {
                    return Err(invalid(format!("confidence {} outside [0, 1]", sub.confidence)));
                }

                let mut keywords = sub.keywords;
                keywords.normalize_and_check().map_err(invalid)?;
                let dropped = keywords.truncate_to(bucket_cap);
                if dropped > 0 {
                    warn!(
                        "Taxonomy entry {} / {} exceeds the bucket cap of {}; dropped {} keyword(s)",
                        category, subcategory, bucket_cap, dropped
                    );
                }

                let entry = TaxonomyEntry {
                    category: category.clone(),
                    subcategory: subcategory.clone(),
                    keywords,
                    uk_terms: sub.uk_terms,
                    url_patterns: record.profile.url_patterns.clone(),
                    schema_hints: record.profile.schema_hints.clone(),
                    confidence: sub.confidence,
                    source: sub.source,
                    created_at: sub.created_at.unwrap_or_else(Utc::now),
                };
                entries.insert((category.clone(), subcategory), Arc::new(Mutex::new(entry)));
            }
            categories.insert(category, record.profile);
        }

        info!(
            "Loaded taxonomy: {} categories, {} entries (version {}, updated {})",
            categories.len(),
            entries.len(),
            dataset.version,
            dataset.updated
        );

        Ok(Self {
            version: dataset.version,
            description: dataset.description,
            bucket_cap,
            categories: RwLock::new(categories),
            entries: RwLock::new(entries),
        })
    }

    /// Write the current taxonomy, including discovered entries, as JSON
    pub fn save_to_path(&self, path: &Path) -> Result<(), TaxonomyError> {
        let mut categories: BTreeMap<String, CategoryRecord> = self
            .read_categories()
            .iter()
            .map(|(name, profile)| {
                (
                    name.clone(),
                    CategoryRecord {
                        profile: profile.clone(),
                        subcategories: BTreeMap::new(),
                    },
                )
            })
            .collect();

        for entry in self.snapshot() {
            let record = categories
                .entry(entry.category.clone())
                .or_insert_with(|| CategoryRecord {
                    profile: CategoryProfile {
                        schema_hints: entry.schema_hints.clone(),
                        url_patterns: entry.url_patterns.clone(),
                    },
                    subcategories: BTreeMap::new(),
                });
            let created_at = entry.is_dynamic().then_some(entry.created_at);
            record.subcategories.insert(
                entry.subcategory.clone(),
                SubcategoryRecord {
                    keywords: entry.keywords,
                    uk_terms: entry.uk_terms,
                    confidence: entry.confidence,
                    source: entry.source,
                    created_at,
                },
            );
        }

        let dataset = TaxonomyDataset {
            version: self.version.clone(),
            updated: Utc::now().format("%Y-%m-%d").to_string(),
            description: self.description.clone(),
            categories,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(&dataset)?)?;

        debug!("Saved taxonomy with {} categories to {:?}", dataset.categories.len(), path);
        Ok(())
    }

    pub fn bucket_cap(&self) -> usize {
        self.bucket_cap
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.read_categories().contains_key(category)
    }

    pub fn category_profile(&self, category: &str) -> Option<CategoryProfile> {
        self.read_categories().get(category).cloned()
    }

    /// Register a category profile unless one already exists
    pub fn register_category(&self, category: &str, profile: CategoryProfile) -> bool {
        let mut categories = self.write_categories();
        if categories.contains_key(category) {
            return false;
        }
        categories.insert(category.to_string(), profile);
        true
    }

    pub fn categories(&self) -> Vec<String> {
        self.read_categories().keys().cloned().collect()
    }

    pub fn subcategories(&self, category: &str) -> Vec<String> {
        self.read_entries()
            .keys()
            .filter(|(cat, _)| cat == category)
            .map(|(_, sub)| sub.clone())
            .collect()
    }

    /// Snapshot of one entry
    pub fn get(&self, category: &str, subcategory: &str) -> Option<TaxonomyEntry> {
        self.handle(category, subcategory)
            .map(|handle| lock_entry(&handle).clone())
    }

    /// Shared handle to one entry; lock it to mutate
    pub fn handle(&self, category: &str, subcategory: &str) -> Option<Arc<Mutex<TaxonomyEntry>>> {
        self.read_entries()
            .get(&(category.to_string(), subcategory.to_string()))
            .cloned()
    }

    /// Insert a new entry unless the key is already taken.
    ///
    /// When another writer got there first, the existing handle is returned
    /// and `entry` is dropped. `category_created` is true for exactly one
    /// insert per category, even when several subcategories of an unseen
    /// category race in at once.
    pub fn insert_if_absent(&self, entry: TaxonomyEntry) -> InsertOutcome {
        let key = (entry.category.clone(), entry.subcategory.clone());
        let profile = CategoryProfile {
            schema_hints: entry.schema_hints.clone(),
            url_patterns: entry.url_patterns.clone(),
        };

        let (handle, inserted) = {
            let mut entries = self.write_entries();
            if let Some(existing) = entries.get(&key) {
                (Arc::clone(existing), false)
            } else {
                let handle = Arc::new(Mutex::new(entry));
                entries.insert(key.clone(), Arc::clone(&handle));
                (handle, true)
            }
        };

        let category_created = inserted && self.register_category(&key.0, profile);
        if inserted {
            info!("Added taxonomy entry: {} / {}", key.0, key.1);
        }
        InsertOutcome {
            handle,
            inserted,
            category_created,
        }
    }

    /// Clone of every entry, ordered by (category, subcategory)
    pub fn snapshot(&self) -> Vec<TaxonomyEntry> {
        let handles: Vec<Arc<Mutex<TaxonomyEntry>>> = self.read_entries().values().cloned().collect();
        handles.iter().map(|handle| lock_entry(handle).clone()).collect()
    }

    pub fn stats(&self) -> TaxonomyStats {
        let entries = self.snapshot();
        TaxonomyStats {
            version: self.version.clone(),
            categories: self.read_categories().len(),
            entries: entries.len(),
            keywords: entries.iter().map(|e| e.keywords.len()).sum(),
            dynamic_entries: entries.iter().filter(|e| e.is_dynamic()).count(),
        }
    }

    // Writers only ever append, so data behind a poisoned lock is still
    // consistent and is used as-is.
    fn read_entries(&self) -> RwLockReadGuard<'_, BTreeMap<TaxonomyKey, Arc<Mutex<TaxonomyEntry>>>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, BTreeMap<TaxonomyKey, Arc<Mutex<TaxonomyEntry>>>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_categories(&self) -> RwLockReadGuard<'_, BTreeMap<String, CategoryProfile>> {
        self.categories.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_categories(&self) -> RwLockWriteGuard<'_, BTreeMap<String, CategoryProfile>> {
        self.categories.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Lock a single entry for reading or merging
pub fn lock_entry(handle: &Mutex<TaxonomyEntry>) -> MutexGuard<'_, TaxonomyEntry> {
    handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_dataset_loads_and_validates() {
        let store = TaxonomyStore::load_default(DEFAULT_BUCKET_CAP).unwrap();
        assert!(store.has_category("Legal Services"));
        assert!(store.get("Legal Services", "Family Law").is_some());
        assert!(!store.has_category("Business Services"));

        let stats = store.stats();
        assert!(stats.categories >= 10);
        assert_eq!(stats.dynamic_entries, 0);
    }

    #[test]
    fn test_dataset_entries_within_bounds() {
        let store = TaxonomyStore::load_default(DEFAULT_BUCKET_CAP).unwrap();
        for entry in store.snapshot() {
            assert!((0.0..=1.0).contains(&entry.confidence));
            for (_, keywords) in entry.keywords.iter() {
                assert!(keywords.len() <= DEFAULT_BUCKET_CAP, "{} over cap", entry.subcategory);
            }
        }
    }

    #[test]
    fn test_bucket_insert_respects_cap_and_disjointness() {
        let mut bucket = TaxonomyBucket::default();
        assert!(bucket.insert(KeywordCategory::Primary, "Plumber", 2));
        assert!(!bucket.insert(KeywordCategory::Secondary, "  plumber ", 2), "dup across buckets");
        assert!(bucket.insert(KeywordCategory::Primary, "heating engineer", 2));
        assert!(!bucket.insert(KeywordCategory::Primary, "boiler repair", 2), "cap reached");
        assert!(!bucket.insert(KeywordCategory::Primary, "   ", 2));

        assert_eq!(bucket.primary, vec!["plumber", "heating engineer"]);
        assert_eq!(bucket.category_of("PLUMBER"), Some(KeywordCategory::Primary));
        assert_eq!(bucket.len(), 2);
    }

    #[test]
    fn test_overlapping_buckets_rejected() {
        let json = r#"{
            "version": "1", "updated": "2026-01-01",
            "categories": {
                "Trades": {
                    "subcategories": {
                        "Plumbing": {
                            "keywords": { "primary": ["plumber"], "local": ["Plumber"] }
                        }
                    }
                }
            }
        }"#;
        let err = TaxonomyStore::from_json_str(json, DEFAULT_BUCKET_CAP).unwrap_err();
        assert!(matches!(err, TaxonomyError::InvalidEntry { .. }));
    }

    #[test]
    fn test_insert_if_absent_keeps_first_writer() {
        let store = TaxonomyStore::new(DEFAULT_BUCKET_CAP);
        let mut first = TaxonomyEntry::new("Trades", "Plumbing", EntrySource::ContentAnalysis, 0.5);
        first.keywords.insert(KeywordCategory::Primary, "plumber", 15);
        let second = TaxonomyEntry::new("Trades", "Plumbing", EntrySource::ContentAnalysis, 0.9);

        let outcome = store.insert_if_absent(first);
        assert!(outcome.inserted);
        assert!(outcome.category_created);
        let outcome = store.insert_if_absent(second);
        assert!(!outcome.inserted);
        assert!(!outcome.category_created);
        assert_eq!(lock_entry(&outcome.handle).confidence, 0.5);
        assert!(store.has_category("Trades"));
        assert_eq!(store.subcategories("Trades"), vec!["Plumbing"]);

        let sibling = TaxonomyEntry::new("Trades", "Roofing", EntrySource::ContentAnalysis, 0.5);
        let outcome = store.insert_if_absent(sibling);
        assert!(outcome.inserted);
        assert!(!outcome.category_created);
    }

    #[test]
    fn test_save_and_reload_preserves_dynamic_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("taxonomy.json");

        let store = TaxonomyStore::load_default(DEFAULT_BUCKET_CAP).unwrap();
        let mut entry = TaxonomyEntry::new("Pet Care", "Dog Grooming", EntrySource::ContentAnalysis, 0.6);
        entry.keywords.insert(KeywordCategory::Primary, "dog grooming", 15);
        entry.schema_hints.push("LocalBusiness".to_string());
        store.insert_if_absent(entry);
        store.save_to_path(&path).unwrap();

        let reloaded = TaxonomyStore::load_from_path(&path, DEFAULT_BUCKET_CAP).unwrap();
        let entry = reloaded.get("Pet Care", "Dog Grooming").unwrap();
        assert_eq!(entry.source, EntrySource::ContentAnalysis);
        assert_eq!(entry.keywords.primary, vec!["dog grooming"]);
        assert_eq!(entry.schema_hints, vec!["LocalBusiness"]);
        assert_eq!(reloaded.stats().entries, store.stats().entries);
        assert_eq!(reloaded.stats().dynamic_entries, 1);
        assert_eq!(entry.created_at, store.get("Pet Care", "Dog Grooming").unwrap().created_at);
    }

    #[test]
    fn test_oversized_dataset_buckets_are_truncated_to_cap() {
        let primary: Vec<String> = (0..25).map(|i| format!("\"plumber {}\"", i)).collect();
        let json = format!(
            r#"{{
                "version": "1", "updated": "2026-01-01",
                "categories": {{
                    "Trades": {{
                        "subcategories": {{
                            "Plumbing": {{ "keywords": {{ "primary": [{}], "local": ["plumber near me"] }} }}
                        }}
                    }}
                }}
            }}"#,
            primary.join(", ")
        );

        let store = TaxonomyStore::from_json_str(&json, 10).unwrap();
        let entry = store.get("Trades", "Plumbing").unwrap();
        assert_eq!(entry.keywords.primary.len(), 10);
        assert_eq!(entry.keywords.primary[0], "plumber 0");
        assert_eq!(entry.keywords.primary[9], "plumber 9");
        assert_eq!(entry.keywords.local, vec!["plumber near me"]);
    }

    #[test]
    fn test_keyword_category_serializes_kebab_case() {
        let json = serde_json::to_string(&KeywordCategory::LongTail).unwrap();
        assert_eq!(json, "\"long-tail\"");
        assert_eq!(KeywordCategory::LongTail.to_string(), "long-tail");
    }
}
