mod common;

use common::fixtures::{default_store, plumbing_html};
use sitetaxon::analysis::{AnalysisRequest, BusinessAnalyzer, ComprehensiveBusinessAnalysis};
use sitetaxon::config::AppConfig;
use sitetaxon::export::{export_json, export_keywords_csv, export_markdown, render_markdown};
use tempfile::TempDir;

async fn plumbing_analysis() -> ComprehensiveBusinessAnalysis {
    BusinessAnalyzer::new(default_store(), &AppConfig::default())
        .analyze(AnalysisRequest {
            domain: "harbourplumbing.co.uk".to_string(),
            html: plumbing_html(),
            is_local_business: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_export_json_uses_camel_case_fields() {
    let analysis = plumbing_analysis().await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("analysis.json");

    export_json(&analysis, path.to_str().unwrap()).unwrap();

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let confirmed = &value["intelligentAnalysis"]["confirmedType"];
    assert_eq!(confirmed["category"], "Home Services");
    assert_eq!(confirmed["subcategory"], "Plumbing & Heating");
    assert_eq!(confirmed["source"], "content_analysis");
    assert_eq!(value["metadata"]["domain"], "harbourplumbing.co.uk");
    assert!(value["keywords"]["longTail"].is_array());
    assert!(value["summary"]["keywordQuality"].is_string());
}

#[tokio::test]
async fn test_export_csv_has_one_row_per_keyword() {
    let analysis = plumbing_analysis().await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keywords.csv");

    export_keywords_csv(&analysis.keywords, path.to_str().unwrap()).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.get(0), Some("keyword"));
    assert_eq!(headers.get(1), Some("category"));

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), analysis.keywords.total_generated);
    assert!(rows.iter().any(|r| r.get(0) == Some("plumber") && r.get(1) == Some("primary")));
}

#[tokio::test]
async fn test_markdown_report_sections() {
    let analysis = plumbing_analysis().await;
    let report = render_markdown(&analysis);

    assert!(report.starts_with("# Business Keyword Analysis"));
    assert!(report.contains("**Domain:** harbourplumbing.co.uk"));
    assert!(report.contains("- **Category:** Home Services"));
    assert!(report.contains("### primary"));
    assert!(report.contains("## Data Quality"));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.md");
    export_markdown(&analysis, path.to_str().unwrap()).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), report);
}
