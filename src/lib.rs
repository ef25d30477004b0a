//! isqforge - terminal wizard for LLM-drafted product listings
//!
//! isqforge walks a seller through four screens: collect an inquiry,
//! generate a structured product profile with a generative-AI service,
//! extract ISQ records (one configuration question plus ordered key and
//! buyer questions) from the inquiry and its reference URLs, and export
//! both result sets to an `.xlsx` workbook. A comparison view shows the
//! profile beside the extracted questions.
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Interactive wizard against the configured provider
//! isqforge
//!
//! # No network, canned results - useful for a first look
//! isqforge --dry-run
//!
//! # Override the model and export directory for one session
//! isqforge --model gemini-2.0-flash --output-dir ./exports
//! ```
//!
//! Configuration is discovered with precedence CLI > file > defaults; the
//! file is `isqforge.toml`, searched upward from the current directory,
//! then in the user configuration directory.
//!
//! # Library usage
//!
//! The workflow controller is usable without the terminal UI: construct a
//! [`WizardController`] with any [`InquiryAi`] and [`SheetExporter`]
//! implementation and feed it [`Command`]s.

pub mod cli;
pub mod tui;

pub use isqforge_config::Config;
pub use isqforge_llm::{LlmBackend, LlmInvocation, LlmResult};
pub use isqforge_utils::error::{ConfigError, ExportError, IsqForgeError, LlmError};
pub use isqforge_wizard::{
    Command, DryRunAi, InquiryAi, InquiryInput, Isq, IsqBundle, LlmInquiryAi, ProductProfile,
    SheetExporter, Stage, WizardController, WorkflowState,
};
