use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use sitetaxon::registry::{RegistryData, RegistryLookup};
use sitetaxon::taxonomy::{TaxonomyStore, DEFAULT_BUCKET_CAP};

pub fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn load_fixture(relative: &str) -> String {
    std::fs::read_to_string(fixture_path(relative))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", relative))
}

pub fn load_json_fixture<T: DeserializeOwned>(relative: &str) -> T {
    let content = load_fixture(relative);
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse JSON fixture {}: {}", relative, e))
}

/// Family law firm in Manchester: nav links to Family Law and Commercial Law
pub fn family_law_html() -> String {
    load_fixture("html/family_law_firm.html")
}

/// Emergency plumber in Bristol with a postcode and service nav links
pub fn plumbing_html() -> String {
    load_fixture("html/plumbing_company.html")
}

/// Software studio with no location signals
pub fn software_html() -> String {
    load_fixture("html/software_studio.html")
}

pub fn registry_record(name: &str) -> RegistryData {
    load_json_fixture(&format!("registry/{}.json", name))
}

/// Fresh store loaded from the shipped dataset
pub fn default_store() -> Arc<TaxonomyStore> {
    Arc::new(TaxonomyStore::load_default(DEFAULT_BUCKET_CAP).expect("shipped taxonomy loads"))
}

/// Registry that answers every lookup with the same record
pub struct StaticRegistry(pub Option<RegistryData>);

#[async_trait]
impl RegistryLookup for StaticRegistry {
    async fn lookup(&self, _company_name: &str) -> anyhow::Result<Option<RegistryData>> {
        Ok(self.0.clone())
    }
}

/// Registry that always fails
pub struct BrokenRegistry;

#[async_trait]
impl RegistryLookup for BrokenRegistry {
    async fn lookup(&self, _company_name: &str) -> anyhow::Result<Option<RegistryData>> {
        Err(anyhow::anyhow!("registry unavailable"))
    }
}
