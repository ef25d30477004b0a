//! Wizard stages, workflow state, and per-stage commands.

use crate::types::{InquiryInput, IsqBundle, ProductProfile};

/// The four sequential screens of the wizard.
///
/// `Input → Profile → Isqs ⇄ Comparison`; there is no terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Inquiry collection form
    Input,
    /// Generated product profile, pending the extraction step
    Profile,
    /// Extracted ISQ groups, pending export or comparison
    Isqs,
    /// Side-by-side comparison view, returns to `Isqs`
    Comparison,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Profile => write!(f, "profile"),
            Self::Isqs => write!(f, "isqs"),
            Self::Comparison => write!(f, "comparison"),
        }
    }
}

/// Snapshot of the whole workflow.
///
/// Mutated only by the controller's named operations and published as an
/// immutable snapshot after every transition; all state dies with the
/// process.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    /// Screen currently shown
    pub stage: Stage,
    /// Inquiry recorded on submit; immutable once set
    pub input: Option<InquiryInput>,
    /// First AI result set
    pub profile: Option<ProductProfile>,
    /// Second AI result set
    pub isqs: Option<IsqBundle>,
    /// True while an AI call is outstanding; gates new submissions
    pub loading: bool,
    /// Latest failure message; cleared at the start of every attempt
    pub error: Option<String>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            stage: Stage::Input,
            input: None,
            profile: None,
            isqs: None,
            loading: false,
            error: None,
        }
    }
}

/// Commands available on the input screen
#[derive(Debug, Clone)]
pub enum InputCommand {
    /// Submit the inquiry and request profile generation
    Submit(InquiryInput),
}

/// Commands available on the profile screen
#[derive(Debug, Clone)]
pub enum ProfileCommand {
    /// Request ISQ extraction from the recorded inquiry and its URLs
    ExtractIsqs,
}

/// Commands available on the ISQ screen
#[derive(Debug, Clone)]
pub enum IsqsCommand {
    /// Write both result sets to a workbook
    Export,
    /// Open the comparison view
    Compare,
}

/// Commands available on the comparison screen
#[derive(Debug, Clone)]
pub enum ComparisonCommand {
    /// Return to the ISQ screen
    Back,
}

/// The full command surface of the wizard.
///
/// Each screen is handed only its own command type; this wrapper is what
/// travels over the channel into the controller.
#[derive(Debug, Clone)]
pub enum Command {
    Input(InputCommand),
    Profile(ProfileCommand),
    Isqs(IsqsCommand),
    Comparison(ComparisonCommand),
}
