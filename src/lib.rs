//! Business classification and SEO keyword generation.
//!
//! Given a domain and the HTML of its pages, sitetaxon extracts content
//! signals, scores candidate business activities, resolves a confirmed
//! business type (optionally backed by a company registry), grows the keyword
//! taxonomy when it meets something new, and generates a categorized keyword
//! set for the business.

pub mod analysis;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod content_signals;
pub mod expansion;
pub mod export;
pub mod keywords;
pub mod logger;
pub mod normalize;
pub mod registry;
pub mod resolver;
pub mod taxonomy;

pub use analysis::{AnalysisRequest, BusinessAnalyzer, ComprehensiveBusinessAnalysis};
pub use config::AppConfig;
pub use taxonomy::TaxonomyStore;
