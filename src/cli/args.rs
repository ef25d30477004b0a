//! CLI argument definitions and parsing structures

use clap::Parser;
use std::path::PathBuf;

/// isqforge - LLM-assisted product listing wizard
#[derive(Parser)]
#[command(name = "isqforge")]
#[command(about = "Terminal wizard that drafts product profiles and ISQ sets with an LLM and exports them to a spreadsheet")]
#[command(long_about = r#"
isqforge walks a seller through drafting a product listing: collect an
inquiry, generate a structured product profile, extract ISQs (item-specific
questions) from the inquiry and its reference URLs, and export everything
to an .xlsx workbook.

EXAMPLES:
  # Run the wizard against the configured provider
  isqforge

  # Explore the screens without any network calls
  isqforge --dry-run

  # Pick a model and export directory for this session
  isqforge --model gemini-2.0-flash --output-dir ./exports

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  The config file is isqforge.toml, searched upward from CWD, then in the
  user configuration directory. Use --config for an explicit path.

  The API key is read from the environment variable named by
  [llm.gemini] api_key_env (default: GEMINI_API_KEY).

SCREENS:
  Inquiry -> Profile -> ISQs <-> Comparison
  Export is available from the ISQs screen once both result sets exist.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Model to use for LLM provider calls
    #[arg(long)]
    pub model: Option<String>,

    /// Directory exported workbooks are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Use canned results instead of contacting the provider
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
