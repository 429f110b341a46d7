//! Business type resolution
//!
//! Picks exactly one confirmed `(category, subcategory)` per analysis. The
//! chain is registry codes, then strong content evidence, then moderate
//! content evidence, then the configured fallback. The last step always
//! matches, so resolution cannot fail.

use crate::classifier::BusinessActivity;
use crate::config::ResolverConfig;
use crate::content_signals::ExtractedSignals;
use crate::registry::{map_sic_codes, RegistryData};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Discrete confidence attached to a confirmed type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "high"),
            ConfidenceLevel::Medium => write!(f, "medium"),
            ConfidenceLevel::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Registry,
    ContentAnalysis,
    Hybrid,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionSource::Registry => write!(f, "registry"),
            ResolutionSource::ContentAnalysis => write!(f, "content_analysis"),
            ResolutionSource::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// The one business type an analysis settles on.
///
/// Each variant carries only what its source can actually produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ConfirmedBusinessType {
    /// Registry SIC code mapped directly to a taxonomy entry
    #[serde(rename_all = "camelCase")]
    Registry {
        category: String,
        subcategory: String,
        confidence: ConfidenceLevel,
        sic_code: String,
        registered_name: String,
    },
    /// Inferred from page content alone
    #[serde(rename_all = "camelCase")]
    ContentAnalysis {
        category: String,
        subcategory: String,
        confidence: ConfidenceLevel,
        /// Top activity confidence, 0.0 for the fallback
        activity_confidence: f64,
        evidence: Vec<String>,
    },
    /// Registry gave the category; content picked the subcategory
    #[serde(rename_all = "camelCase")]
    Hybrid {
        category: String,
        subcategory: String,
        confidence: ConfidenceLevel,
        sic_code: String,
        registered_name: String,
        evidence: Vec<String>,
    },
}

impl ConfirmedBusinessType {
    pub fn category(&self) -> &str {
        match self {
            Self::Registry { category, .. }
            | Self::ContentAnalysis { category, .. }
            | Self::Hybrid { category, .. } => category,
        }
    }

    pub fn subcategory(&self) -> &str {
        match self {
            Self::Registry { subcategory, .. }
            | Self::ContentAnalysis { subcategory, .. }
            | Self::Hybrid { subcategory, .. } => subcategory,
        }
    }

    pub fn confidence(&self) -> ConfidenceLevel {
        match self {
            Self::Registry { confidence, .. }
            | Self::ContentAnalysis { confidence, .. }
            | Self::Hybrid { confidence, .. } => *confidence,
        }
    }

    pub fn source(&self) -> ResolutionSource {
        match self {
            Self::Registry { .. } => ResolutionSource::Registry,
            Self::ContentAnalysis { .. } => ResolutionSource::ContentAnalysis,
            Self::Hybrid { .. } => ResolutionSource::Hybrid,
        }
    }
}

impl fmt::Display for ConfirmedBusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} ({} confidence, {})",
            self.category(),
            self.subcategory(),
            self.confidence(),
            self.source()
        )
    }
}

/// Subcategory rules per category: (substrings, subcategory), first match
/// wins, followed by the default subcategory.
const SUBCATEGORY_RULES: &[(&str, &[(&[&str], &str)], &str)] = &[
    (
        "Legal Services",
        &[
            (&["family", "divorce", "child custody"], "Family Law"),
            (&["commercial", "business", "corporate", "employment"], "Commercial Law"),
            (&["conveyancing", "property", "remortgage"], "Conveyancing"),
        ],
        "General Practice",
    ),
    (
        "Accounting & Finance",
        &[
            (&["tax", "self assessment", "vat"], "Tax Advisory"),
            (&["bookkeeping", "payroll", "xero"], "Bookkeeping"),
        ],
        "Chartered Accountants",
    ),
    (
        "Home Services",
        &[
            (&["plumb", "boiler", "heating", "radiator"], "Plumbing & Heating"),
            (&["electric", "rewiring", "fuse"], "Electrical"),
        ],
        "General Trades",
    ),
    (
        "Healthcare",
        &[
            (&["dental", "dentist", "teeth", "orthodont"], "Dental"),
            (&["physio", "sports injury", "rehabilitation"], "Physiotherapy"),
        ],
        "Private Clinic",
    ),
    ("Hospitality", &[(&["hotel", "rooms", "accommodation", "bed and breakfast"], "Hotel")], "Restaurant"),
    (
        "Technology",
        &[
            (&["web design", "website", "wordpress", "ecommerce"], "Web Design"),
            (&["it support", "helpdesk", "managed it", "network"], "IT Support"),
        ],
        "Software Development",
    ),
    ("Marketing Services", &[(&["seo", "search engine", "link building"], "SEO Agency")], "Digital Marketing"),
    ("Real Estate", &[(&["letting", "landlord", "tenant", "rent"], "Lettings")], "Estate Agency"),
    ("Automotive", &[(&["used car", "car sales", "finance deals", "showroom"], "Car Sales")], "Car Repair"),
    (
        "Beauty & Wellness",
        &[
            (&["hair", "barber", "colour"], "Hair Salon"),
            (&["gym", "fitness", "personal training", "classes"], "Fitness"),
        ],
        "Beauty Salon",
    ),
    ("Construction", &[(&["architect", "planning permission", "design"], "Architecture")], "Builders"),
];

/// Default subcategory for categories without a rule table
const GENERIC_SUBCATEGORY: &str = "General";

/// Pick a subcategory for `category` from services, navigation and headlines.
pub fn choose_subcategory(category: &str, signals: &ExtractedSignals) -> String {
    let Some((_, rules, default)) = SUBCATEGORY_RULES.iter().find(|(c, _, _)| *c == category) else {
        return GENERIC_SUBCATEGORY.to_string();
    };

    let haystack: Vec<String> = signals
        .services
        .iter()
        .chain(&signals.navigation_items)
        .chain(&signals.headlines)
        .map(|s| s.to_lowercase())
        .collect();

    rules
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| haystack.iter().any(|h| h.contains(n))))
        .map(|(_, sub)| sub.to_string())
        .unwrap_or_else(|| default.to_string())
}

fn subcategory_has_rule_match(category: &str, signals: &ExtractedSignals) -> bool {
    SUBCATEGORY_RULES
        .iter()
        .find(|(c, _, _)| *c == category)
        .is_some_and(|(_, _, default)| choose_subcategory(category, signals) != *default)
}

pub struct BusinessTypeResolver {
    config: ResolverConfig,
}

impl BusinessTypeResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Resolve exactly one business type. Never fails.
    pub fn resolve(
        &self,
        signals: &ExtractedSignals,
        activities: &[BusinessActivity],
        registry: Option<&RegistryData>,
    ) -> ConfirmedBusinessType {
        if let Some(data) = registry {
            if let Some(mapping) = map_sic_codes(&data.sic_codes) {
                // A category-level code can be narrowed by what the site says it does
                if mapping.refinable && subcategory_has_rule_match(mapping.category, signals) {
                    let subcategory = choose_subcategory(mapping.category, signals);
                    info!(
                        "Resolved {} / {} from SIC {} refined by content",
                        mapping.category, subcategory, mapping.code
                    );
                    return ConfirmedBusinessType::Hybrid {
                        category: mapping.category.to_string(),
                        subcategory,
                        confidence: ConfidenceLevel::High,
                        sic_code: mapping.code.to_string(),
                        registered_name: data.company_name.clone(),
                        evidence: activity_evidence(activities, mapping.category),
                    };
                }

                info!("Resolved {} / {} from SIC {}", mapping.category, mapping.subcategory, mapping.code);
                return ConfirmedBusinessType::Registry {
                    category: mapping.category.to_string(),
                    subcategory: mapping.subcategory.to_string(),
                    confidence: ConfidenceLevel::High,
                    sic_code: mapping.code.to_string(),
                    registered_name: data.company_name.clone(),
                };
            }
            debug!("No registry SIC code maps to a known category: {:?}", data.sic_codes);
        }

        if let Some(top) = activities.first() {
            let level = if top.confidence >= self.config.high_confidence {
                Some(ConfidenceLevel::High)
            } else if top.confidence >= self.config.medium_confidence {
                Some(ConfidenceLevel::Medium)
            } else {
                None
            };

            if let Some(confidence) = level {
                let subcategory = choose_subcategory(&top.activity, signals);
                info!(
                    "Resolved {} / {} from content ({} confidence, score {:.2})",
                    top.activity, subcategory, confidence, top.confidence
                );
                return ConfirmedBusinessType::ContentAnalysis {
                    category: top.activity.clone(),
                    subcategory,
                    confidence,
                    activity_confidence: top.confidence,
                    evidence: top.evidence.clone(),
                };
            }
        }

        info!(
            "No confident classification, falling back to {} / {}",
            self.config.fallback_category, self.config.fallback_subcategory
        );
        ConfirmedBusinessType::ContentAnalysis {
            category: self.config.fallback_category.clone(),
            subcategory: self.config.fallback_subcategory.clone(),
            confidence: ConfidenceLevel::Low,
            activity_confidence: activities.first().map_or(0.0, |a| a.confidence),
            evidence: Vec::new(),
        }
    }
}

fn activity_evidence(activities: &[BusinessActivity], category: &str) -> Vec<String> {
    activities
        .iter()
        .find(|a| a.activity == category)
        .map(|a| a.evidence.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(name: &str, confidence: f64) -> BusinessActivity {
        BusinessActivity {
            activity: name.to_string(),
            confidence,
            evidence: vec![format!("test evidence for {}", name)],
            keywords: Vec::new(),
        }
    }

    fn signals_with_services(services: &[&str]) -> ExtractedSignals {
        ExtractedSignals {
            services: services.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn resolver() -> BusinessTypeResolver {
        BusinessTypeResolver::new(&ResolverConfig::default())
    }

    #[test]
    fn test_high_confidence_content_picks_subcategory() {
        let signals = signals_with_services(&["divorce and separation"]);
        let resolved = resolver().resolve(&signals, &[activity("Legal Services", 0.9)], None);
        assert_eq!(resolved.category(), "Legal Services");
        assert_eq!(resolved.subcategory(), "Family Law");
        assert_eq!(resolved.confidence(), ConfidenceLevel::High);
        assert_eq!(resolved.source(), ResolutionSource::ContentAnalysis);
    }

    #[test]
    fn test_medium_confidence_band() {
        let signals = signals_with_services(&["corporate contracts"]);
        let resolved = resolver().resolve(&signals, &[activity("Legal Services", 0.5)], None);
        assert_eq!(resolved.confidence(), ConfidenceLevel::Medium);
        assert_eq!(resolved.subcategory(), "Commercial Law");
    }

    #[test]
    fn test_default_subcategory_when_no_rule_matches() {
        let resolved = resolver().resolve(&ExtractedSignals::default(), &[activity("Legal Services", 0.8)], None);
        assert_eq!(resolved.subcategory(), "General Practice");
    }

    #[test]
    fn test_fallback_for_weak_or_missing_evidence() {
        for activities in [vec![], vec![activity("Technology", 0.2)]] {
            let resolved = resolver().resolve(&ExtractedSignals::default(), &activities, None);
            assert_eq!(resolved.category(), "Business Services");
            assert_eq!(resolved.subcategory(), "General");
            assert_eq!(resolved.confidence(), ConfidenceLevel::Low);
            assert_eq!(resolved.source(), ResolutionSource::ContentAnalysis);
        }
    }

    #[test]
    fn test_registry_wins_over_content() {
        let registry = RegistryData {
            sic_codes: vec!["86230".to_string()],
            company_name: "Smile Dental Ltd".to_string(),
            ..Default::default()
        };
        let resolved = resolver().resolve(
            &ExtractedSignals::default(),
            &[activity("Legal Services", 1.0)],
            Some(&registry),
        );
        assert_eq!(resolved.category(), "Healthcare");
        assert_eq!(resolved.subcategory(), "Dental");
        assert_eq!(resolved.source(), ResolutionSource::Registry);
        assert_eq!(resolved.confidence(), ConfidenceLevel::High);
    }

    #[test]
    fn test_registry_category_refined_by_content() {
        let registry = RegistryData {
            sic_codes: vec!["69102".to_string()],
            company_name: "Smith Solicitors LLP".to_string(),
            ..Default::default()
        };
        let signals = signals_with_services(&["family mediation"]);
        let resolved = resolver().resolve(&signals, &[], Some(&registry));
        assert_eq!(resolved.source(), ResolutionSource::Hybrid);
        assert_eq!(resolved.subcategory(), "Family Law");
    }

    #[test]
    fn test_unmapped_registry_codes_fall_through() {
        let registry = RegistryData {
            sic_codes: vec!["99999".to_string()],
            ..Default::default()
        };
        let resolved = resolver().resolve(&ExtractedSignals::default(), &[activity("Technology", 0.75)], Some(&registry));
        assert_eq!(resolved.source(), ResolutionSource::ContentAnalysis);
        assert_eq!(resolved.category(), "Technology");
        assert_eq!(resolved.subcategory(), "Software Development");
    }

    #[test]
    fn test_unknown_category_gets_generic_subcategory() {
        let resolved = resolver().resolve(&ExtractedSignals::default(), &[activity("Pet Care", 0.9)], None);
        assert_eq!(resolved.subcategory(), "General");
    }

    #[test]
    fn test_serializes_with_source_tag() {
        let resolved = resolver().resolve(&ExtractedSignals::default(), &[], None);
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["source"], "content_analysis");
        assert_eq!(json["confidence"], "low");
        assert_eq!(json["category"], "Business Services");
    }
}
