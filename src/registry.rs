//! Company registry collaborator
//!
//! The resolver can consult an external company registry (Companies House or
//! a compatible proxy) for SIC classification codes. The lookup is the only
//! suspension point in the pipeline: it runs under a timeout and any failure
//! is treated as "no registry data".

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Registry record for a company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryData {
    #[serde(default)]
    pub sic_codes: Vec<String>,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub company_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Anything that can look a company up by name
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    /// `Ok(None)` when the registry has no record for the name
    async fn lookup(&self, company_name: &str) -> Result<Option<RegistryData>>;
}

/// Run a lookup under `timeout`. Errors and timeouts become `None`; there are no retries.
pub async fn lookup_with_timeout(
    registry: &dyn RegistryLookup,
    company_name: &str,
    timeout: Duration,
) -> Option<RegistryData> {
    match tokio::time::timeout(timeout, registry.lookup(company_name)).await {
        Ok(Ok(Some(data))) => {
            debug!("Registry returned {} SIC code(s) for {}", data.sic_codes.len(), company_name);
            Some(data)
        }
        Ok(Ok(None)) => {
            debug!("Registry has no record for {}", company_name);
            None
        }
        Ok(Err(e)) => {
            warn!("Registry lookup failed for {}: {}", company_name, e);
            None
        }
        Err(_) => {
            warn!("Registry lookup timed out after {:?} for {}", timeout, company_name);
            None
        }
    }
}

/// HTTP registry client: `GET {base_url}/search?q=<name>` returning [`RegistryData`] JSON
pub struct HttpRegistryClient {
    client: Client,
    base_url: String,
}

impl HttpRegistryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sitetaxon/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RegistryLookup for HttpRegistryClient {
    async fn lookup(&self, company_name: &str) -> Result<Option<RegistryData>> {
        let url = format!("{}/search", self.base_url);
        debug!("Querying registry: {} q={}", url, company_name);

        let response = self
            .client
            .get(&url)
            .query(&[("q", company_name)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow!("Registry returned status {}", response.status()));
        }

        let data: RegistryData = response.json().await?;
        Ok(Some(data))
    }
}

/// Category a SIC code maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SicMapping {
    pub code: &'static str,
    pub category: &'static str,
    pub subcategory: &'static str,
    /// The code only identifies the category; page content may pick a
    /// more specific subcategory
    pub refinable: bool,
}

/// UK SIC 2007 codes the taxonomy knows about
const SIC_TABLE: &[SicMapping] = &[
    sic("69101", "Legal Services", "General Practice", true),
    sic("69102", "Legal Services", "General Practice", true),
    sic("69109", "Legal Services", "General Practice", true),
    sic("69201", "Accounting & Finance", "Chartered Accountants", true),
    sic("69202", "Accounting & Finance", "Bookkeeping", false),
    sic("69203", "Accounting & Finance", "Tax Advisory", false),
    sic("43210", "Home Services", "Electrical", false),
    sic("43220", "Home Services", "Plumbing & Heating", false),
    sic("43390", "Home Services", "General Trades", true),
    sic("86210", "Healthcare", "Private Clinic", true),
    sic("86230", "Healthcare", "Dental", false),
    sic("86900", "Healthcare", "Private Clinic", true),
    sic("55100", "Hospitality", "Hotel", false),
    sic("56101", "Hospitality", "Restaurant", false),
    sic("56102", "Hospitality", "Restaurant", false),
    sic("62011", "Technology", "Software Development", false),
    sic("62012", "Technology", "Software Development", false),
    sic("62020", "Technology", "IT Support", true),
    sic("62090", "Technology", "IT Support", true),
    sic("70210", "Marketing Services", "Digital Marketing", true),
    sic("73110", "Marketing Services", "Digital Marketing", true),
    sic("68310", "Real Estate", "Estate Agency", true),
    sic("68320", "Real Estate", "Lettings", false),
    sic("45112", "Automotive", "Car Sales", false),
    sic("45200", "Automotive", "Car Repair", false),
    sic("93130", "Beauty & Wellness", "Fitness", false),
    sic("96020", "Beauty & Wellness", "Hair Salon", true),
    sic("41202", "Construction", "Builders", false),
    sic("71111", "Construction", "Architecture", false),
];

const fn sic(
    code: &'static str,
    category: &'static str,
    subcategory: &'static str,
    refinable: bool,
) -> SicMapping {
    SicMapping {
        code,
        category,
        subcategory,
        refinable,
    }
}

/// Map one SIC code. Accepts "69102" as well as "69102 - Solicitors".
pub fn map_sic_code(raw: &str) -> Option<SicMapping> {
    let code: String = raw.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    SIC_TABLE.iter().find(|m| m.code == code).copied()
}

/// First mappable code in registry order
pub fn map_sic_codes(codes: &[String]) -> Option<SicMapping> {
    codes.iter().find_map(|code| map_sic_code(code))
}
