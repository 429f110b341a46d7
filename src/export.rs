use crate::analysis::ComprehensiveBusinessAnalysis;
use crate::keywords::GeneratedKeywordSet;
use crate::taxonomy::KeywordCategory;
use anyhow::Result;
use csv::Writer;
use std::fs::File;
use std::io::Write;
use tracing::{debug, info};

/// Keywords listed per category in Markdown reports
const MARKDOWN_KEYWORDS_PER_CATEGORY: usize = 10;

pub fn export_json(analysis: &ComprehensiveBusinessAnalysis, output_path: &str) -> Result<()> {
    debug!("Exporting analysis of {} to JSON: {}", analysis.metadata.domain, output_path);

    let json_string = serde_json::to_string_pretty(analysis)?;
    let mut file = File::create(output_path)?;
    file.write_all(json_string.as_bytes())?;

    info!("Successfully exported analysis to JSON: {}", output_path);
    Ok(())
}

pub fn export_keywords_csv(keywords: &GeneratedKeywordSet, output_path: &str) -> Result<()> {
    debug!("Exporting {} keywords to CSV: {}", keywords.total_generated, output_path);

    let file = File::create(output_path)?;
    write_keywords_csv(keywords, file)?;

    info!("Successfully exported {} keywords to CSV: {}", keywords.total_generated, output_path);
    Ok(())
}

/// Write the keyword set as CSV to any writer (a file, or stdout)
pub fn write_keywords_csv<W: Write>(keywords: &GeneratedKeywordSet, writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    wtr.write_record([
        "keyword",
        "category",
        "intent",
        "difficulty",
        "business_relevance",
        "search_volume_tier",
        "generated",
        "template",
    ])?;

    for keyword in keywords.iter() {
        wtr.write_record(&[
            keyword.keyword.clone(),
            keyword.category.to_string(),
            keyword.intent.to_string(),
            keyword.difficulty.to_string(),
            format!("{:.2}", keyword.business_relevance),
            keyword.search_volume_tier.to_string(),
            keyword.generated.to_string(),
            keyword.template.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_markdown(analysis: &ComprehensiveBusinessAnalysis, output_path: &str) -> Result<()> {
    debug!("Exporting analysis of {} to Markdown: {}", analysis.metadata.domain, output_path);
    std::fs::write(output_path, render_markdown(analysis))?;
    info!("Successfully exported analysis to Markdown: {}", output_path);
    Ok(())
}

pub fn render_markdown(analysis: &ComprehensiveBusinessAnalysis) -> String {
    let intelligent = &analysis.intelligent_analysis;
    let confirmed = &intelligent.confirmed_type;
    let summary = &analysis.summary;
    let quality = &analysis.metadata.data_quality;

    let mut content = String::new();

    content.push_str("# Business Keyword Analysis\n\n");
    content.push_str(&format!("**Domain:** {}\n", analysis.metadata.domain));
    content.push_str(&format!("**Business:** {}\n\n", escape_markdown(&intelligent.business_name)));
    content.push_str(&format!(
        "*Generated on: {}*\n\n",
        analysis.metadata.processed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    content.push_str("## Business Type\n\n");
    content.push_str(&format!("- **Category:** {}\n", escape_markdown(confirmed.category())));
    content.push_str(&format!("- **Subcategory:** {}\n", escape_markdown(confirmed.subcategory())));
    content.push_str(&format!("- **Resolution:** {} ({} confidence)\n", confirmed.source(), confirmed.confidence()));
    content.push_str(&format!(
        "- **Business confidence:** {} ({:.2})\n",
        summary.business_confidence, summary.business_confidence_score
    ));
    content.push_str(&format!("- **Local business:** {}\n\n", if intelligent.is_local_business { "yes" } else { "no" }));

    if !intelligent.activities.is_empty() {
        content.push_str("### Detected Activities\n\n");
        content.push_str("| Activity | Confidence | Evidence |\n|---|---|---|\n");
        for activity in &intelligent.activities {
            let evidence: Vec<String> = activity.evidence.iter().take(3).map(|e| escape_markdown(e)).collect();
            content.push_str(&format!(
                "| {} | {:.2} | {} |\n",
                escape_markdown(&activity.activity),
                activity.confidence,
                evidence.join("; ")
            ));
        }
        content.push('\n');
    }

    if let Some(expansion) = &analysis.expansion {
        if !expansion.added_keywords.is_empty() {
            content.push_str("### Taxonomy Additions\n\n");
            for keyword in &expansion.added_keywords {
                content.push_str(&format!("- {}\n", escape_markdown(keyword)));
            }
            content.push('\n');
        }
    }

    let keywords = &analysis.keywords;
    content.push_str(&format!(
        "## Keywords ({} total, {} quality)\n\n",
        keywords.total_generated, summary.keyword_quality
    ));
    for category in KeywordCategory::ALL {
        let bucket = keywords.get(category);
        if bucket.is_empty() {
            continue;
        }
        content.push_str(&format!("### {} ({})\n\n", category, bucket.len()));
        content.push_str("| Keyword | Intent | Difficulty | Volume | Relevance |\n|---|---|---|---|---|\n");
        for keyword in bucket.iter().take(MARKDOWN_KEYWORDS_PER_CATEGORY) {
            content.push_str(&format!(
                "| {} | {} | {} | {} | {:.2} |\n",
                escape_markdown(&keyword.keyword),
                keyword.intent,
                keyword.difficulty,
                keyword.search_volume_tier,
                keyword.business_relevance
            ));
        }
        content.push('\n');
    }

    if !summary.recommended_actions.is_empty() {
        content.push_str("## Recommended Actions\n\n");
        for (i, action) in summary.recommended_actions.iter().enumerate() {
            content.push_str(&format!("{}. {}\n", i + 1, escape_markdown(action)));
        }
        content.push('\n');
    }

    if !summary.coverage_gaps.is_empty() {
        content.push_str("## Coverage Gaps\n\n");
        for gap in &summary.coverage_gaps {
            content.push_str(&format!("- {}\n", escape_markdown(gap)));
        }
        content.push('\n');
    }

    content.push_str("## Data Quality\n\n");
    content.push_str(&format!("- **Content richness:** {:.2}\n", quality.content_richness));
    content.push_str(&format!("- **Classification certainty:** {:.2}\n", quality.classification_certainty));
    content.push_str(&format!("- **Keyword coverage:** {:.2}\n", quality.keyword_coverage));

    content
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|").replace('*', "\\*").replace('_', "\\_")
}

pub fn print_analysis_summary(analysis: &ComprehensiveBusinessAnalysis) {
    let intelligent = &analysis.intelligent_analysis;
    let keywords = &analysis.keywords;

    println!("\n=== Analysis Summary ===");
    println!("Domain: {}", analysis.metadata.domain);
    println!("Business: {}", intelligent.business_name);
    println!("Business type: {}", intelligent.confirmed_type);
    println!(
        "Business confidence: {} ({:.2})",
        analysis.summary.business_confidence, analysis.summary.business_confidence_score
    );

    if let Some(expansion) = &analysis.expansion {
        if expansion.is_new_type {
            println!("New business type added to taxonomy");
        } else if expansion.is_new_subcategory {
            println!("New subcategory added to taxonomy");
        }
        if !expansion.added_keywords.is_empty() {
            println!("Taxonomy keywords added: {}", expansion.added_keywords.len());
        }
    }

    println!(
        "Keywords generated: {} ({} quality, {})",
        keywords.total_generated, analysis.summary.keyword_quality, keywords.generation_method
    );
    for category in KeywordCategory::ALL {
        let count = keywords.get(category).len();
        if count > 0 {
            println!("  {}: {}", category, count);
        }
    }

    if !analysis.summary.recommended_actions.is_empty() {
        println!("Recommended actions:");
        for action in &analysis.summary.recommended_actions {
            println!("  - {}", action);
        }
    }
    println!("Processed in {} ms", analysis.metadata.processing_time_ms);
    println!("========================\n");
}
