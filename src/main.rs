use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use sitetaxon::analysis::{AnalysisRequest, BusinessAnalyzer, ComprehensiveBusinessAnalysis};
use sitetaxon::cli::{AnalyzeArgs, Cli, Commands, OutputFormat, TaxonomyCommands};
use sitetaxon::config::{self, AppConfig};
use sitetaxon::export;
use sitetaxon::logger::{self, VerbosityLevel};
use sitetaxon::registry::HttpRegistryClient;
use sitetaxon::taxonomy::{lock_entry, TaxonomyEntry, TaxonomyStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(VerbosityLevel::from_verbose_count(cli.verbose));

    // Handle --init flag first (before any other processing)
    if cli.init {
        match AppConfig::create_default_config() {
            Ok(path) => {
                println!("✅ Created default configuration file at: {}", path.display());
                println!("   Edit this file to customize thresholds, then run sitetaxon again.");
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("❌ Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        }
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let app_config = load_config(cli.config.as_deref());

    match command {
        Commands::Analyze(args) => run_analyze(args, app_config).await,
        Commands::Taxonomy { action } => run_taxonomy(action, &app_config),
    }
}

fn load_config(path: Option<&Path>) -> AppConfig {
    let loaded = match path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    };

    match loaded {
        Ok(cfg) => cfg,
        Err(config::ConfigError::FileNotFound(path)) => match AppConfig::prompt_create_config() {
            Ok(Some(created_path)) => {
                println!("✅ Created default configuration file at: {}", created_path.display());
                AppConfig::default()
            }
            Ok(None) => {
                eprintln!("⚠️  Configuration file not found at: {}", path.display());
                eprintln!("   Using built-in defaults. Run with --init to create a configuration file.");
                AppConfig::default()
            }
            Err(e) => {
                eprintln!("❌ Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_store(app_config: &AppConfig) -> Result<TaxonomyStore> {
    TaxonomyStore::load_configured(&app_config.taxonomy).context("Failed to load keyword taxonomy")
}

fn read_html(source: &str) -> Result<String> {
    if source == "-" {
        let mut html = String::new();
        io::stdin().read_to_string(&mut html).context("Failed to read HTML from stdin")?;
        Ok(html)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read HTML file '{}'", source))
    }
}

async fn run_analyze(args: AnalyzeArgs, app_config: AppConfig) -> Result<()> {
    if let Err(e) = args.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let html = read_html(&args.html)?;
    let store = Arc::new(load_store(&app_config)?);

    let mut analyzer = BusinessAnalyzer::new(Arc::clone(&store), &app_config);
    if args.registry || app_config.registry.enabled {
        info!("Registry lookups enabled against {}", app_config.registry.base_url);
        let client = HttpRegistryClient::new(&app_config.registry.base_url, app_config.registry_timeout());
        analyzer = analyzer.with_registry(Arc::new(client));
    }

    let request = AnalysisRequest {
        domain: args.domain.trim().to_string(),
        html,
        is_local_business: args.local_override(),
    };
    let analysis = analyzer.analyze(request).await?;

    if !args.no_persist {
        persist_taxonomy(&store, &analysis, &app_config);
    }

    write_output(&analysis, &args)
}

/// Save the grown taxonomy when the run added anything to it
fn persist_taxonomy(store: &TaxonomyStore, analysis: &ComprehensiveBusinessAnalysis, app_config: &AppConfig) {
    let Some(path) = app_config.taxonomy.persist_path.as_deref() else {
        return;
    };
    let changed = analysis
        .expansion
        .as_ref()
        .is_some_and(|e| e.is_new_type || e.is_new_subcategory || !e.added_keywords.is_empty());
    if !changed {
        return;
    }

    match store.save_to_path(path) {
        Ok(()) => info!("Saved taxonomy additions to {}", path.display()),
        Err(e) => warn!("Failed to save taxonomy to {}: {}", path.display(), e),
    }
}

fn write_output(analysis: &ComprehensiveBusinessAnalysis, args: &AnalyzeArgs) -> Result<()> {
    let output_path = args.output.as_ref().map(|p| p.to_string_lossy().into_owned());

    match (args.format, output_path.as_deref()) {
        (OutputFormat::Summary, None) => export::print_analysis_summary(analysis),
        (OutputFormat::Summary, Some(path)) | (OutputFormat::Json, Some(path)) => {
            export::export_json(analysis, path)?;
            export::print_analysis_summary(analysis);
            println!("Results written to: {}", path);
        }
        (OutputFormat::Json, None) => println!("{}", serde_json::to_string_pretty(analysis)?),
        (OutputFormat::Csv, Some(path)) => {
            export::export_keywords_csv(&analysis.keywords, path)?;
            export::print_analysis_summary(analysis);
            println!("Keywords written to: {}", path);
        }
        (OutputFormat::Csv, None) => export::write_keywords_csv(&analysis.keywords, io::stdout().lock())?,
        (OutputFormat::Markdown, Some(path)) => {
            export::export_markdown(analysis, path)?;
            export::print_analysis_summary(analysis);
            println!("Report written to: {}", path);
        }
        (OutputFormat::Markdown, None) => print!("{}", export::render_markdown(analysis)),
    }
    Ok(())
}

fn run_taxonomy(action: TaxonomyCommands, app_config: &AppConfig) -> Result<()> {
    let store = load_store(app_config)?;

    match action {
        TaxonomyCommands::List => {
            for category in store.categories() {
                println!("{}", category);
                for subcategory in store.subcategories(&category) {
                    println!("  - {}", subcategory);
                }
            }
        }
        TaxonomyCommands::Show { category, subcategory } => {
            if !store.has_category(&category) {
                eprintln!("❌ Unknown category '{}'. Use 'sitetaxon taxonomy list' to see categories.", category);
                std::process::exit(1);
            }
            let subcategories = match subcategory {
                Some(sub) => vec![sub],
                None => store.subcategories(&category),
            };
            for sub in subcategories {
                let Some(handle) = store.handle(&category, &sub) else {
                    eprintln!("❌ Unknown subcategory '{}' in '{}'", sub, category);
                    std::process::exit(1);
                };
                print_entry(&lock_entry(&handle));
            }
        }
        TaxonomyCommands::Stats => {
            let stats = store.stats();
            println!("\n=== Taxonomy Statistics ===");
            println!("Version: {}", stats.version);
            println!("Categories: {}", stats.categories);
            println!("Subcategories: {}", stats.entries);
            println!("Keywords: {}", stats.keywords);
            println!("Discovered entries: {}", stats.dynamic_entries);
            println!("Bucket cap: {}", store.bucket_cap());
            println!("===========================\n");
        }
    }
    Ok(())
}

fn print_entry(entry: &TaxonomyEntry) {
    println!("\n{} / {} (source: {}, confidence: {:.2})", entry.category, entry.subcategory, entry.source, entry.confidence);
    for (kind, keywords) in entry.keywords.iter() {
        if !keywords.is_empty() {
            println!("  {}: {}", kind, keywords.join(", "));
        }
    }
    if !entry.uk_terms.is_empty() {
        println!("  uk terms: {}", entry.uk_terms.join(", "));
    }
}
