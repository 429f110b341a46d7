use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sitetaxon")]
#[command(about = "Infer what a business does from its website and generate an SEO keyword taxonomy")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Create default configuration file at ./config/sitetaxon.toml
    #[arg(long, global = true)]
    pub init: bool,

    /// Configuration file (defaults to ./config/sitetaxon.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose logging (use -v for INFO, -vv for DEBUG)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a business from its page HTML and generate keywords
    Analyze(AnalyzeArgs),
    /// Inspect the keyword taxonomy
    Taxonomy {
        #[command(subcommand)]
        action: TaxonomyCommands,
    },
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Domain the page belongs to
    #[arg(short, long)]
    pub domain: String,

    /// HTML file to analyze, or '-' to read from stdin
    #[arg(long, value_name = "FILE")]
    pub html: String,

    /// Look the company up in the registry configured under [registry]
    #[arg(long)]
    pub registry: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Summary)]
    pub format: OutputFormat,

    /// Write output to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Treat the business as local (overrides detection)
    #[arg(long, conflicts_with = "not_local")]
    pub local: bool,

    /// Treat the business as not local (overrides detection)
    #[arg(long)]
    pub not_local: bool,

    /// Do not save taxonomy additions to the configured persist_path
    #[arg(long)]
    pub no_persist: bool,
}

impl AnalyzeArgs {
    pub fn local_override(&self) -> Option<bool> {
        if self.local {
            Some(true)
        } else if self.not_local {
            Some(false)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let domain = self.domain.trim();
        if domain.is_empty() {
            return Err("Domain cannot be empty".to_string());
        }
        if domain.contains(char::is_whitespace) {
            return Err(format!("Invalid domain '{}': contains whitespace", domain));
        }
        if self.html.trim().is_empty() {
            return Err("--html requires a file path or '-'".to_string());
        }
        Ok(())
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary
    Summary,
    /// Full analysis as JSON
    Json,
    /// Keyword set as CSV
    Csv,
    /// Markdown report
    Markdown,
}

#[derive(Subcommand, Debug)]
pub enum TaxonomyCommands {
    /// List categories and their subcategories
    List,
    /// Show the keyword buckets of a category or one subcategory
    Show {
        category: String,
        subcategory: Option<String>,
    },
    /// Show taxonomy statistics
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::parse_from([
            "sitetaxon", "analyze", "--domain", "harbour-plumbing.co.uk", "--html", "page.html", "-f", "csv", "--local",
        ]);
        match cli.command {
            Some(Commands::Analyze(args)) => {
                assert_eq!(args.format, OutputFormat::Csv);
                assert_eq!(args.local_override(), Some(true));
                assert!(args.validate().is_ok());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_local_flags_conflict() {
        let result = Cli::try_parse_from([
            "sitetaxon", "analyze", "--domain", "a.com", "--html", "-", "--local", "--not-local",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_domain() {
        let cli = Cli::parse_from(["sitetaxon", "analyze", "--domain", "not a domain", "--html", "-"]);
        if let Some(Commands::Analyze(args)) = cli.command {
            assert!(args.validate().is_err());
            assert_eq!(args.local_override(), None);
        }
    }

    #[test]
    fn test_parse_taxonomy_show() {
        let cli = Cli::parse_from(["sitetaxon", "-vv", "taxonomy", "show", "Legal Services", "Family Law"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Taxonomy {
                action: TaxonomyCommands::Show { category, subcategory },
            }) => {
                assert_eq!(category, "Legal Services");
                assert_eq!(subcategory.as_deref(), Some("Family Law"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
