//! Analysis orchestration
//!
//! Runs one page through the whole pipeline:
//! extract -> registry lookup (optional) -> classify -> resolve -> expand -> generate,
//! then derives the summary scores, recommendations and coverage gaps.
//!
//! Uncertainty is reported through the confidence and quality fields. The
//! only error is [`AnalysisError::Invariant`], raised when a stage hands back
//! something that should be impossible.

use crate::classifier::{BusinessActivity, BusinessActivityClassifier};
use crate::config::{AppConfig, ScoringConfig};
use crate::content_signals::{count_phrase, extract_signals, ExtractedSignals};
use crate::expansion::{ExpansionResult, TaxonomyExpansionManager};
use crate::keywords::{BusinessContext, GeneratedKeywordSet, KeywordGenerationEngine};
use crate::normalize::name_from_domain;
use crate::registry::{lookup_with_timeout, RegistryData, RegistryLookup};
use crate::resolver::{BusinessTypeResolver, ConfidenceLevel, ConfirmedBusinessType, ResolutionSource};
use crate::taxonomy::{EntrySource, KeywordCategory, TaxonomyStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

pub const ANALYSIS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Phrases that mark a business as serving a local area
const LOCAL_PHRASES: &[&str] = &["near you", "local area", "visit us", "areas we cover", "local business"];

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Pipeline invariant violated: {0}")]
    Invariant(String),
}

/// One page to analyze
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub domain: String,
    pub html: String,
    /// Inferred from the page when `None`
    pub is_local_business: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl fmt::Display for KeywordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordQuality::Excellent => write!(f, "excellent"),
            KeywordQuality::Good => write!(f, "good"),
            KeywordQuality::Fair => write!(f, "fair"),
            KeywordQuality::Poor => write!(f, "poor"),
        }
    }
}

/// What the pipeline concluded about the business
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelligentAnalysis {
    pub business_name: String,
    pub is_local_business: bool,
    pub signals: ExtractedSignals,
    pub activities: Vec<BusinessActivity>,
    pub confirmed_type: ConfirmedBusinessType,
    pub registry_data: Option<RegistryData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub business_confidence: ConfidenceLevel,
    /// Weighted sum behind `business_confidence`
    pub business_confidence_score: f64,
    pub keyword_quality: KeywordQuality,
    pub recommended_actions: Vec<String>,
    pub coverage_gaps: Vec<String>,
}

/// 0-1 scores describing how much the analysis had to work with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub content_richness: f64,
    pub classification_certainty: f64,
    pub keyword_coverage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub domain: String,
    pub processed_at: DateTime<Utc>,
    pub analysis_version: String,
    pub processing_time_ms: u64,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveBusinessAnalysis {
    pub intelligent_analysis: IntelligentAnalysis,
    /// `None` when the type was only the low-confidence fallback
    pub expansion: Option<ExpansionResult>,
    pub keywords: GeneratedKeywordSet,
    pub summary: AnalysisSummary,
    pub metadata: AnalysisMetadata,
}

pub struct BusinessAnalyzer {
    store: Arc<TaxonomyStore>,
    config: AppConfig,
    registry: Option<Arc<dyn RegistryLookup>>,
}

impl BusinessAnalyzer {
    pub fn new(store: Arc<TaxonomyStore>, config: &AppConfig) -> Self {
        Self {
            store,
            config: config.clone(),
            registry: None,
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn RegistryLookup>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> Result<ComprehensiveBusinessAnalysis, AnalysisError> {
        let started = Instant::now();
        info!("Analyzing {}", request.domain);

        let signals = extract_signals(&request.html);
        debug!(
            "Extracted {} nav items, {} headlines, {} services, {} locations",
            signals.navigation_items.len(),
            signals.headlines.len(),
            signals.services.len(),
            signals.location_indicators.len()
        );

        let business_name = if signals.company_name.is_empty() {
            name_from_domain(&request.domain)
        } else {
            signals.company_name.clone()
        };
        let is_local_business = request
            .is_local_business
            .unwrap_or_else(|| infer_local_business(&signals));

        let registry_data = match &self.registry {
            Some(registry) if !business_name.is_empty() => {
                lookup_with_timeout(registry.as_ref(), &business_name, self.config.registry_timeout()).await
            }
            _ => None,
        };

        let classifier = BusinessActivityClassifier::from_store(&self.store, &self.config.classifier);
        let activities = classifier.classify(&signals);

        let resolver = BusinessTypeResolver::new(&self.config.resolver);
        let confirmed_type = resolver.resolve(&signals, &activities, registry_data.as_ref());

        let expansion = if confirmed_type.confidence() == ConfidenceLevel::Low {
            debug!("Skipping taxonomy expansion for low-confidence type {}", confirmed_type);
            None
        } else {
            let manager = TaxonomyExpansionManager::new(Arc::clone(&self.store), &self.config.taxonomy);
            let source = match confirmed_type.source() {
                ResolutionSource::Registry | ResolutionSource::Hybrid => EntrySource::Registry,
                ResolutionSource::ContentAnalysis => EntrySource::ContentAnalysis,
            };
            Some(manager.expand(
                confirmed_type.category(),
                confirmed_type.subcategory(),
                &signals,
                &activities,
                source,
            ))
        };

        let entry = self.store.get(confirmed_type.category(), confirmed_type.subcategory());
        let context = BusinessContext {
            name: business_name.clone(),
            services: signals.services.clone(),
            is_local_business,
            locations: signals.location_indicators.clone(),
            target_market: signals.target_market.clone(),
        };
        let hints = content_hints(&signals, &activities);
        let keywords = KeywordGenerationEngine::new(&self.config.keywords).generate(entry.as_ref(), &context, &hints);

        verify_invariants(&confirmed_type, &activities, expansion.as_ref(), &keywords)?;

        let is_new_type = expansion.as_ref().is_some_and(|e| e.is_new_type);
        let business_confidence_score = business_confidence_score(&confirmed_type, &activities, is_new_type, &signals);
        let summary = AnalysisSummary {
            business_confidence: business_confidence_level(business_confidence_score, &self.config.scoring),
            business_confidence_score,
            keyword_quality: keyword_quality(&keywords, &self.config.scoring),
            recommended_actions: recommended_actions(&confirmed_type, expansion.as_ref(), &signals, &keywords, is_local_business),
            coverage_gaps: coverage_gaps(&signals, &keywords, is_local_business),
        };

        let data_quality = DataQuality {
            content_richness: content_richness(&signals),
            classification_certainty: classification_certainty(&confirmed_type),
            keyword_coverage: keyword_coverage(&keywords, is_local_business),
        };

        info!(
            "{}: {} | {} keywords ({} quality)",
            request.domain, confirmed_type, keywords.total_generated, summary.keyword_quality
        );

        Ok(ComprehensiveBusinessAnalysis {
            intelligent_analysis: IntelligentAnalysis {
                business_name,
                is_local_business,
                signals,
                activities,
                confirmed_type,
                registry_data,
            },
            expansion,
            keywords,
            summary,
            metadata: AnalysisMetadata {
                domain: request.domain,
                processed_at: Utc::now(),
                analysis_version: ANALYSIS_VERSION.to_string(),
                processing_time_ms: started.elapsed().as_millis() as u64,
                data_quality,
            },
        })
    }
}

/// Local when the page names a place or talks about serving an area
pub fn infer_local_business(signals: &ExtractedSignals) -> bool {
    !signals.location_indicators.is_empty()
        || LOCAL_PHRASES.iter().any(|p| count_phrase(&signals.body_text, p) > 0)
}

fn content_hints(signals: &ExtractedSignals, activities: &[BusinessActivity]) -> Vec<String> {
    activities
        .first()
        .map(|a| a.keywords.clone())
        .unwrap_or_default()
        .into_iter()
        .chain(signals.industry_terms.iter().cloned())
        .collect()
}

fn verify_invariants(
    confirmed: &ConfirmedBusinessType,
    activities: &[BusinessActivity],
    expansion: Option<&ExpansionResult>,
    keywords: &GeneratedKeywordSet,
) -> Result<(), AnalysisError> {
    if confirmed.category().trim().is_empty() || confirmed.subcategory().trim().is_empty() {
        return Err(AnalysisError::Invariant(format!("resolver returned an empty type: {}", confirmed)));
    }

    for activity in activities {
        if !(0.0..=1.0).contains(&activity.confidence) {
            return Err(AnalysisError::Invariant(format!(
                "activity {} has confidence {}",
                activity.activity, activity.confidence
            )));
        }
    }

    if let Some(expansion) = expansion {
        let confidence = expansion.enhanced_entry.confidence;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(AnalysisError::Invariant(format!("taxonomy entry has confidence {}", confidence)));
        }
    }

    let mut seen = HashSet::new();
    for keyword in keywords.iter() {
        if !seen.insert(keyword.keyword.trim().to_lowercase()) {
            return Err(AnalysisError::Invariant(format!("duplicate keyword '{}'", keyword.keyword)));
        }
    }
    Ok(())
}

/// Weighted evidence score in [0, 1]
pub fn business_confidence_score(
    confirmed: &ConfirmedBusinessType,
    activities: &[BusinessActivity],
    is_new_type: bool,
    signals: &ExtractedSignals,
) -> f64 {
    let resolver_part = match confirmed.confidence() {
        ConfidenceLevel::High => 0.4,
        ConfidenceLevel::Medium => 0.25,
        ConfidenceLevel::Low => 0.1,
    };
    let activity_part = activities.first().map_or(0.0, |a| a.confidence) * 0.3;
    let established_part = if is_new_type { 0.0 } else { 0.2 };
    let services_part = if signals.services.len() >= 3 { 0.1 } else { 0.0 };

    f64::min(resolver_part + activity_part + established_part + services_part, 1.0)
}

pub fn business_confidence_level(score: f64, scoring: &ScoringConfig) -> ConfidenceLevel {
    if score >= scoring.business_high {
        ConfidenceLevel::High
    } else if score >= scoring.business_medium {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

pub fn keyword_quality(keywords: &GeneratedKeywordSet, scoring: &ScoringConfig) -> KeywordQuality {
    let total = keywords.total_generated;
    let covered = keywords.categories_covered();
    if total >= scoring.excellent_total && covered >= scoring.excellent_categories {
        KeywordQuality::Excellent
    } else if total >= scoring.good_total && covered >= scoring.good_categories {
        KeywordQuality::Good
    } else if total >= scoring.fair_total && covered >= scoring.fair_categories {
        KeywordQuality::Fair
    } else {
        KeywordQuality::Poor
    }
}

/// Services no generated keyword mentions
fn uncovered_services<'a>(signals: &'a ExtractedSignals, keywords: &GeneratedKeywordSet) -> Vec<&'a str> {
    signals
        .services
        .iter()
        .filter(|service| !keywords.iter().any(|k| k.keyword.contains(service.as_str())))
        .map(String::as_str)
        .collect()
}

fn recommended_actions(
    confirmed: &ConfirmedBusinessType,
    expansion: Option<&ExpansionResult>,
    signals: &ExtractedSignals,
    keywords: &GeneratedKeywordSet,
    is_local_business: bool,
) -> Vec<String> {
    let mut actions = Vec::new();

    if let Some(expansion) = expansion {
        if expansion.is_new_type {
            actions.push(format!(
                "New business type '{}' was added to the taxonomy; review its generated keywords",
                confirmed.category()
            ));
        } else if expansion.is_new_subcategory {
            actions.push(format!(
                "New subcategory '{}' was added under '{}'; review its generated keywords",
                confirmed.subcategory(),
                confirmed.category()
            ));
        }
    }

    if confirmed.confidence() == ConfidenceLevel::Low {
        actions.push(
            "Business type is unclear; add service pages and descriptive navigation labels".to_string(),
        );
    }

    if !signals.location_indicators.is_empty() && keywords.local.is_empty() {
        let hint = if is_local_business { "" } else { " (business is not marked as local)" };
        actions.push(format!("Location signals found but no local keywords were generated{}", hint));
    }

    if keywords.urgency.is_empty() {
        actions.push("No urgency keywords; add emergency or same-day offers if the business provides them".to_string());
    }

    if signals.services.is_empty() {
        actions.push("No services detected; list services explicitly on the homepage".to_string());
    } else {
        let uncovered = uncovered_services(signals, keywords);
        if !uncovered.is_empty() {
            actions.push(format!("Create content targeting: {}", uncovered.join(", ")));
        }
    }

    actions
}

fn coverage_gaps(signals: &ExtractedSignals, keywords: &GeneratedKeywordSet, is_local_business: bool) -> Vec<String> {
    let mut gaps: Vec<String> = KeywordCategory::ALL
        .into_iter()
        .filter(|c| *c != KeywordCategory::Local || is_local_business)
        .filter(|c| keywords.get(*c).is_empty())
        .map(|c| format!("No {} keywords", c))
        .collect();

    if is_local_business && signals.location_indicators.is_empty() {
        gaps.push("No location signals detected".to_string());
    }

    gaps.extend(
        uncovered_services(signals, keywords)
            .into_iter()
            .map(|s| format!("Service '{}' is not covered by any keyword", s)),
    );
    gaps
}

fn content_richness(signals: &ExtractedSignals) -> f64 {
    let present = [
        !signals.company_name.is_empty(),
        !signals.navigation_items.is_empty(),
        !signals.headlines.is_empty(),
        !signals.service_descriptions.is_empty(),
        !signals.about_text.is_empty(),
        !signals.services.is_empty(),
        !signals.location_indicators.is_empty(),
    ];
    present.iter().filter(|p| **p).count() as f64 / present.len() as f64
}

fn classification_certainty(confirmed: &ConfirmedBusinessType) -> f64 {
    match confirmed {
        ConfirmedBusinessType::Registry { .. } | ConfirmedBusinessType::Hybrid { .. } => 1.0,
        ConfirmedBusinessType::ContentAnalysis { activity_confidence, .. } => activity_confidence.clamp(0.0, 1.0),
    }
}

fn keyword_coverage(keywords: &GeneratedKeywordSet, is_local_business: bool) -> f64 {
    let expected = if is_local_business { 7.0 } else { 6.0 };
    f64::min(keywords.categories_covered() as f64 / expected, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeywordsConfig;

    fn fallback_type() -> ConfirmedBusinessType {
        ConfirmedBusinessType::ContentAnalysis {
            category: "Business Services".into(),
            subcategory: "General".into(),
            confidence: ConfidenceLevel::Low,
            activity_confidence: 0.0,
            evidence: vec![],
        }
    }

    #[test]
    fn test_business_confidence_score_weights() {
        let signals = ExtractedSignals {
            services: vec!["a".into(), "b".into(), "c".into()],
            ..Default::default()
        };
        let activities = vec![BusinessActivity {
            activity: "Legal Services".into(),
            confidence: 1.0,
            evidence: vec![],
            keywords: vec![],
        }];
        let high = ConfirmedBusinessType::ContentAnalysis {
            category: "Legal Services".into(),
            subcategory: "Family Law".into(),
            confidence: ConfidenceLevel::High,
            activity_confidence: 1.0,
            evidence: vec![],
        };
        assert!((business_confidence_score(&high, &activities, false, &signals) - 1.0).abs() < 1e-9);
        assert!((business_confidence_score(&high, &activities, true, &signals) - 0.8).abs() < 1e-9);
        let fallback = business_confidence_score(&fallback_type(), &[], false, &ExtractedSignals::default());
        assert!((fallback - 0.3).abs() < 1e-9);
        assert_eq!(business_confidence_level(fallback, &ScoringConfig::default()), ConfidenceLevel::Low);
    }

    #[test]
    fn test_keyword_quality_tiers() {
        let scoring = ScoringConfig::default();
        let engine = KeywordGenerationEngine::new(&KeywordsConfig::default());
        let named = engine.generate_fallback(
            &BusinessContext {
                name: "Acme".into(),
                ..Default::default()
            },
            &[],
        );
        assert_eq!(keyword_quality(&named, &scoring), KeywordQuality::Poor);

        let sample = named.primary[0].clone();
        let mut set = GeneratedKeywordSet {
            primary: vec![sample.clone()],
            secondary: vec![sample.clone()],
            long_tail: vec![sample.clone()],
            commercial: vec![sample.clone()],
            informational: vec![sample.clone()],
            local: vec![sample.clone()],
            urgency: vec![sample],
            ..Default::default()
        };
        for (total, expected) in [
            (90, KeywordQuality::Excellent),
            (55, KeywordQuality::Good),
            (30, KeywordQuality::Fair),
            (10, KeywordQuality::Poor),
        ] {
            set.total_generated = total;
            assert_eq!(keyword_quality(&set, &scoring), expected, "total {}", total);
        }

        set.total_generated = 90;
        set.urgency.clear();
        set.local.clear();
        set.informational.clear();
        assert_eq!(keyword_quality(&set, &scoring), KeywordQuality::Fair);
    }

    #[test]
    fn test_infer_local_business() {
        let mut signals = ExtractedSignals::default();
        assert!(!infer_local_business(&signals));
        signals.body_text = "we cover the local area".into();
        assert!(infer_local_business(&signals));
        signals.body_text.clear();
        signals.location_indicators = vec!["Leeds".into()];
        assert!(infer_local_business(&signals));
    }

    #[test]
    fn test_coverage_gaps_skip_local_when_not_local() {
        let set = GeneratedKeywordSet::default();
        let gaps = coverage_gaps(&ExtractedSignals::default(), &set, false);
        assert_eq!(gaps.len(), 6);
        assert!(!gaps.iter().any(|g| g.contains("local")));

        let gaps = coverage_gaps(&ExtractedSignals::default(), &set, true);
        assert!(gaps.contains(&"No local keywords".to_string()));
        assert!(gaps.contains(&"No location signals detected".to_string()));
    }

    #[test]
    fn test_verify_rejects_duplicate_keywords() {
        let engine = KeywordGenerationEngine::new(&KeywordsConfig::default());
        let mut set = engine.generate_fallback(
            &BusinessContext {
                name: "Acme".into(),
                ..Default::default()
            },
            &[],
        );
        let duplicate = set.primary[0].clone();
        set.secondary.push(duplicate);
        let result = verify_invariants(&fallback_type(), &[], None, &set);
        assert!(matches!(result, Err(AnalysisError::Invariant(_))));
    }
}
