//! Command-line interface for the parser.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::{validate_chunk_size, ParserConfig};
use crate::error::{ListenerError, Result};
use crate::events::ExtractionEvent;
use crate::object::Value;
use crate::parser::CommerceMlParser;
use crate::rules::Variant;

/// CommerceML Parser - Stream 1C exchange files as JSON events.
#[derive(Parser)]
#[command(name = "commerceml-parser")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a file and print one JSON object per extracted event.
    Parse {
        /// CommerceML file (import.xml, offers.xml, orders.xml)
        file: PathBuf,

        /// Document type (import, offers, orders)
        #[arg(short, long, default_value_t = Variant::Import)]
        variant: Variant,

        /// Bytes read per chunk (default: $COMMERCEML_CHUNK_SIZE or 65536)
        #[arg(short, long)]
        chunk_size: Option<usize>,

        /// Only print events of this rule (repeatable; default: all rules)
        #[arg(short, long = "rule")]
        rules: Vec<String>,

        /// Suppress event output, print only the summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the rule table of a document type.
    Rules {
        /// Document type (import, offers, orders)
        #[arg(short, long, default_value_t = Variant::Import)]
        variant: Variant,
    },
}

/// Run the CLI.
///
/// # Errors
/// Returns the first configuration, I/O, markup or output error.
pub async fn run() -> Result<()> {
    run_with(Cli::parse()).await
}

/// Run an already parsed command line.
///
/// # Errors
/// See [`run`].
pub async fn run_with(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Parse {
            file,
            variant,
            chunk_size,
            rules,
            quiet,
        } => parse_command(&file, variant, chunk_size, &rules, quiet).await,
        Commands::Rules { variant } => {
            rules_command(variant);
            Ok(())
        }
    }
}

async fn parse_command(
    file: &Path,
    variant: Variant,
    chunk_size: Option<usize>,
    rules: &[String],
    quiet: bool,
) -> Result<()> {
    let mut config = ParserConfig::from_env()?;
    if let Some(chunk_size) = chunk_size {
        validate_chunk_size(chunk_size)?;
        config = config.with_chunk_size(chunk_size);
    }

    let mut parser = CommerceMlParser::for_variant(variant).with_config(config);

    let selected: Vec<String> = if rules.is_empty() {
        parser.rules().keys().map(str::to_string).collect()
    } else {
        rules.to_vec()
    };

    if !quiet {
        // One handle for all rules; a listener is done once its line is flushed.
        let stdout = Arc::new(Mutex::new(tokio::io::stdout()));
        for rule in selected {
            let key = rule.clone();
            let stdout = Arc::clone(&stdout);
            parser.on(&rule, move |payload: Value| {
                let line = serde_json::to_string(&ExtractionEvent::new(key.clone(), payload));
                let stdout = Arc::clone(&stdout);
                async move {
                    let mut line = line?;
                    line.push('\n');
                    let mut out = stdout.lock().await;
                    out.write_all(line.as_bytes()).await?;
                    out.flush().await?;
                    Ok::<(), ListenerError>(())
                }
            })?;
        }
    } else {
        // Registration still validates the requested keys.
        for rule in &selected {
            parser.on(rule, |_: Value| async { Ok::<(), ListenerError>(()) })?;
        }
    }

    let summary = parser.parse_file(file).await?;

    eprintln!(
        "{} {} ({} document)",
        style("Parsed").green().bold(),
        file.display(),
        style(variant).cyan()
    );
    eprintln!("  Chunks: {}", summary.chunks);
    eprintln!("  Bytes: {}", summary.bytes);
    eprintln!("  Events: {}", style(summary.events).bold());
    if summary.delivered != summary.events {
        eprintln!("  Printed: {}", summary.delivered);
    }

    Ok(())
}

fn rules_command(variant: Variant) {
    println!(
        "{} {}",
        style("Rules for").bold(),
        style(variant).cyan()
    );
    println!();
    print!("{}", variant.rules());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["commerceml-parser", "parse", "import.xml"]);
        match cli.command {
            Commands::Parse {
                file,
                variant,
                chunk_size,
                rules,
                quiet,
            } => {
                assert_eq!(file, PathBuf::from("import.xml"));
                assert_eq!(variant, Variant::Import);
                assert!(chunk_size.is_none());
                assert!(rules.is_empty());
                assert!(!quiet);
            }
            Commands::Rules { .. } => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_cli_parse_with_options() {
        let cli = Cli::parse_from([
            "commerceml-parser",
            "parse",
            "offers.xml",
            "--variant",
            "offers",
            "--chunk-size",
            "1024",
            "--rule",
            "offer",
            "--rule",
            "warehouse",
        ]);
        match cli.command {
            Commands::Parse {
                variant,
                chunk_size,
                rules,
                ..
            } => {
                assert_eq!(variant, Variant::Offers);
                assert_eq!(chunk_size, Some(1024));
                assert_eq!(rules, vec!["offer", "warehouse"]);
            }
            Commands::Rules { .. } => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_cli_rules_command() {
        let cli = Cli::parse_from(["commerceml-parser", "rules", "-v", "orders"]);
        assert!(matches!(
            cli.command,
            Commands::Rules {
                variant: Variant::Orders
            }
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_variant() {
        let result = Cli::try_parse_from(["commerceml-parser", "rules", "--variant", "prices"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unknown_rule_fails_before_reading() {
        let cli = Cli::parse_from([
            "commerceml-parser",
            "parse",
            "does-not-exist.xml",
            "--variant",
            "orders",
            "--rule",
            "product",
        ]);
        let err = run_with(cli).await.unwrap_err();
        assert!(matches!(err, crate::error::ParserError::UnknownRule { .. }));
    }
}
