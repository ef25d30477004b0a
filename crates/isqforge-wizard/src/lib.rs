//! Workflow core for the isqforge wizard
//!
//! This crate owns the multi-stage workflow: the stage state machine, the
//! accumulated cross-stage data, and the controller that mediates every
//! call into the AI client and the workbook exporter. Rendering layers sit
//! on top of immutable state snapshots and feed commands back in; they
//! never talk to the collaborators directly.

mod ai;
mod controller;
mod state;
mod types;

pub use ai::{DryRunAi, InquiryAi, LlmInquiryAi};
pub use controller::{SheetExporter, WizardController};
pub use state::{
    Command, ComparisonCommand, InputCommand, IsqsCommand, ProfileCommand, Stage, WorkflowState,
};
pub use types::{InquiryInput, Isq, IsqBundle, ProductProfile};
