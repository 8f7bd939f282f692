//! uniscan CLI
//!
//! Local execution entry point for scans and reference-data checks.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use uniscan::{
    config::{load_all, load_config},
    error::{AppError, Result, ScraperError},
    models::{ScrapedPage, ValidationResult},
    pipeline,
    services::{
        ErrorMetrics, LlmProvider, NameValidator, OpenAiCompatibleProvider,
        ReferenceConfigRegistry, classify_message,
    },
};

/// uniscan - University Structure Scanner
#[derive(Parser, Debug)]
#[command(
    name = "uniscan",
    version,
    about = "Extracts and validates campus, faculty and course names from university websites"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Path to the reference institution data (JSON)
    #[arg(short, long, default_value = "data/institutions.json")]
    reference: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the academic hierarchy of one institution
    Scan {
        /// Institution website URL
        #[arg(long)]
        url: String,

        /// JSON file with an array of scraped pages
        #[arg(long, conflicts_with = "fetch", required_unless_present = "fetch")]
        pages: Option<PathBuf>,

        /// Fetch these page URLs instead of reading a pages file
        #[arg(long, num_args = 1..)]
        fetch: Vec<String>,

        /// Write results here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the language model pass
        #[arg(long)]
        no_llm: bool,
    },

    /// Show which reference institution a URL or domain resolves to
    Resolve {
        url: String,
    },

    /// Validate a single candidate name
    Check {
        kind: NameKind,

        name: String,

        /// Website the name was found on, enables reference matching
        #[arg(long)]
        url: Option<String>,
    },

    /// Classify a fetch failure message
    Classify {
        message: String,

        #[arg(long, default_value = "")]
        url: String,
    },

    /// Validate configuration and reference data
    Validate,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum NameKind {
    Faculty,
    Campus,
    Course,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Resolves when Ctrl-C is pressed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn print_validation(result: &ValidationResult) {
    println!("valid:      {}", result.is_valid);
    println!("confidence: {:.2}", result.confidence);
    if let Some(corrected) = &result.corrected_value {
        println!("canonical:  {corrected}");
    }
    if let Some(reason) = &result.reason {
        println!("reason:     {reason}");
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Scan {
            url,
            pages,
            fetch,
            output,
            no_llm,
        } => {
            let (config, registry) = load_all(&cli.config, &cli.reference)?;
            let registry = Arc::new(registry);

            let pages: Vec<ScrapedPage> = match pages {
                Some(path) => {
                    let content = fs::read_to_string(&path)?;
                    let pages: Vec<ScrapedPage> = serde_json::from_str(&content)?;
                    log::info!("Loaded {} pages from {}", pages.len(), path.display());
                    pages
                }
                None => {
                    let metrics = Arc::new(ErrorMetrics::new());
                    let (outcome, _) = pipeline::fetch_pages(&config, &fetch, metrics).await?;
                    if outcome.pages.is_empty() {
                        return Err(AppError::config("No page could be fetched"));
                    }
                    outcome.pages
                }
            };

            let provider: Option<Arc<dyn LlmProvider>> = if no_llm {
                None
            } else {
                OpenAiCompatibleProvider::from_config(&config.llm)?
                    .map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
            };

            let outcome =
                pipeline::run_scan_until(&config, registry, &pages, &url, provider, interrupted())
                    .await;

            let json = serde_json::to_string_pretty(&outcome.results)?;
            match output {
                Some(path) => {
                    fs::write(&path, json)?;
                    log::info!("Results saved to {}", path.display());
                }
                None => println!("{json}"),
            }
        }

        Command::Resolve { url } => {
            let registry = ReferenceConfigRegistry::load(&cli.reference)?;
            match registry.resolve(&url) {
                Some(config) => {
                    println!("{} ({})", config.name, config.short_name);
                    println!("faculties: {}", config.faculties.len());
                    println!("campuses:  {}", config.campuses.len());
                }
                None => println!("No reference data for {url}"),
            }
        }

        Command::Check { kind, name, url } => {
            let config = load_config(&cli.config)?;
            let registry = match ReferenceConfigRegistry::load(&cli.reference) {
                Ok(registry) => registry,
                Err(e) => {
                    log::warn!("Reference data unavailable ({e}), checking generically");
                    ReferenceConfigRegistry::new(Vec::new())
                }
            };
            let validator = NameValidator::new(Arc::new(registry), config.validation);

            let result = match kind {
                NameKind::Faculty => validator.validate_faculty(&name, url.as_deref()),
                NameKind::Campus => validator.validate_campus(&name, url.as_deref()),
                NameKind::Course => validator.validate_course(&name),
            };
            print_validation(&result);
        }

        Command::Classify { message, url } => {
            let error = ScraperError::new(classify_message(&message), message, url);
            println!("{}", error.kind);
            println!("retryable: {}", error.is_retryable());
            if !error.url.is_empty() {
                println!("url: {}", error.url);
            }
        }

        Command::Validate => {
            pipeline::run_validate(&cli.config, &cli.reference)?;
            log::info!("All validations passed!");
        }
    }

    Ok(())
}
