//! The workflow controller: single source of truth for navigation and
//! cross-stage data, and the only component permitted to call the AI
//! client or the exporter.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::ai::InquiryAi;
use crate::state::{
    Command, ComparisonCommand, InputCommand, IsqsCommand, ProfileCommand, Stage, WorkflowState,
};
use crate::types::{InquiryInput, IsqBundle, ProductProfile};
use isqforge_utils::error::ExportError;

/// Writes the two result sets to a workbook file.
///
/// Failures are NOT caught by the controller; they surface to its caller.
pub trait SheetExporter: Send + Sync {
    /// Write a workbook and return the path it landed at.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` on any workbook or filesystem failure.
    fn export(&self, profile: &ProductProfile, isqs: &IsqBundle) -> Result<PathBuf, ExportError>;
}

/// Mediates all stage transitions and all calls into the collaborators.
///
/// State is mutated only inside [`dispatch`](Self::dispatch); every
/// mutation publishes an immutable snapshot through a watch channel so a
/// rendering layer can observe `loading` flips while a call is
/// outstanding.
pub struct WizardController {
    state: WorkflowState,
    ai: Arc<dyn InquiryAi>,
    exporter: Arc<dyn SheetExporter>,
    changes: watch::Sender<WorkflowState>,
}

impl WizardController {
    /// Create a controller at the initial stage.
    pub fn new(ai: Arc<dyn InquiryAi>, exporter: Arc<dyn SheetExporter>) -> Self {
        let state = WorkflowState::default();
        let (changes, _) = watch::channel(state.clone());
        Self {
            state,
            ai,
            exporter,
            changes,
        }
    }

    /// Subscribe to state snapshots. The receiver always holds the latest
    /// published state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.changes.subscribe()
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Execute one command.
    ///
    /// AI failures are absorbed into the state's error slot and yield
    /// `Ok(None)`. A successful export yields `Ok(Some(path))`.
    ///
    /// # Errors
    ///
    /// Only the exporter can fail this call; its errors pass through
    /// uncaught, leaving the workflow state untouched.
    pub async fn dispatch(&mut self, command: Command) -> Result<Option<PathBuf>, ExportError> {
        match command {
            Command::Input(InputCommand::Submit(input)) => {
                self.submit_inquiry(input).await;
                Ok(None)
            }
            Command::Profile(ProfileCommand::ExtractIsqs) => {
                self.extract_isqs().await;
                Ok(None)
            }
            Command::Isqs(IsqsCommand::Export) => self.export(),
            Command::Isqs(IsqsCommand::Compare) => {
                self.update(|s| s.stage = Stage::Comparison);
                Ok(None)
            }
            Command::Comparison(ComparisonCommand::Back) => {
                self.update(|s| s.stage = Stage::Isqs);
                Ok(None)
            }
        }
    }

    /// Record the inquiry and request profile generation.
    ///
    /// Accepted only on the input screen and only while no call is in
    /// flight. On success the wizard advances to the profile screen.
    async fn submit_inquiry(&mut self, input: InquiryInput) {
        if self.state.loading || self.state.stage != Stage::Input {
            debug!(stage = %self.state.stage, loading = self.state.loading, "ignoring submit");
            return;
        }

        self.update(|s| {
            s.input = Some(input.clone());
            s.loading = true;
            s.error = None;
        });

        let result = self.ai.generate_profile(&input).await;
        match result {
            Ok(profile) => self.update(|s| {
                s.profile = Some(profile);
                s.stage = Stage::Profile;
                s.loading = false;
            }),
            Err(err) => {
                warn!(error = %err, "profile generation failed");
                self.update(|s| {
                    s.error = Some(format!("Error: {err}"));
                    s.loading = false;
                });
            }
        }
    }

    /// Request ISQ extraction from the recorded inquiry and its URLs.
    ///
    /// A no-op unless both the inquiry and the profile are present. On
    /// success the wizard advances to the ISQ screen.
    async fn extract_isqs(&mut self) {
        if self.state.loading {
            debug!("ignoring extraction request while loading");
            return;
        }
        let (Some(input), Some(_)) = (self.state.input.clone(), self.state.profile.as_ref())
        else {
            debug!("ignoring extraction request without inquiry and profile");
            return;
        };

        self.update(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = self.ai.extract_isqs(&input, &input.urls).await;
        match result {
            Ok(bundle) => self.update(|s| {
                s.isqs = Some(bundle);
                s.stage = Stage::Isqs;
                s.loading = false;
            }),
            Err(err) => {
                warn!(error = %err, "ISQ extraction failed");
                self.update(|s| {
                    s.error = Some(format!("Error extracting ISQs: {err}"));
                    s.loading = false;
                });
            }
        }
    }

    /// Write both result sets to a workbook.
    ///
    /// A silent no-op until both result sets exist. Never touches stage,
    /// loading, or the error slot; exporter failures propagate to the
    /// caller.
    fn export(&self) -> Result<Option<PathBuf>, ExportError> {
        let (Some(profile), Some(isqs)) = (&self.state.profile, &self.state.isqs) else {
            return Ok(None);
        };
        let path = self.exporter.export(profile, isqs)?;
        debug!(path = %path.display(), "workbook written");
        Ok(Some(path))
    }

    fn update(&mut self, mutate: impl FnOnce(&mut WorkflowState)) {
        mutate(&mut self.state);
        self.changes.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Isq;
    use async_trait::async_trait;
    use isqforge_utils::error::LlmError;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedAi {
        profiles: Mutex<VecDeque<Result<ProductProfile, LlmError>>>,
        bundles: Mutex<VecDeque<Result<IsqBundle, LlmError>>>,
    }

    impl ScriptedAi {
        fn new(
            profiles: Vec<Result<ProductProfile, LlmError>>,
            bundles: Vec<Result<IsqBundle, LlmError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                profiles: Mutex::new(profiles.into()),
                bundles: Mutex::new(bundles.into()),
            })
        }
    }

    #[async_trait]
    impl InquiryAi for ScriptedAi {
        async fn generate_profile(
            &self,
            _input: &InquiryInput,
        ) -> Result<ProductProfile, LlmError> {
            self.profiles
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Transport("no scripted profile".to_string())))
        }

        async fn extract_isqs(
            &self,
            _input: &InquiryInput,
            _urls: &[String],
        ) -> Result<IsqBundle, LlmError> {
            self.bundles
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Transport("no scripted bundle".to_string())))
        }
    }

    struct CountingExporter {
        calls: AtomicUsize,
    }

    impl CountingExporter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl SheetExporter for CountingExporter {
        fn export(
            &self,
            _profile: &ProductProfile,
            _isqs: &IsqBundle,
        ) -> Result<PathBuf, ExportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PathBuf::from("/tmp/out.xlsx"))
        }
    }

    fn profile(summary: &str) -> ProductProfile {
        ProductProfile {
            summary: summary.to_string(),
            details: Default::default(),
        }
    }

    fn bundle() -> IsqBundle {
        let isq = |name: &str| {
            let mut record = Isq::default();
            record
                .fields
                .insert("name".to_string(), serde_json::json!(name));
            record
        };
        IsqBundle {
            config: isq("Packaging"),
            keys: vec![isq("k1"), isq("k2")],
            buyers: vec![isq("b1")],
        }
    }

    fn inquiry() -> InquiryInput {
        InquiryInput::new()
            .with_field("product", "Ball valve")
            .with_url("http://a")
    }

    #[tokio::test]
    async fn test_first_successful_submit_advances() {
        let ai = ScriptedAi::new(vec![Ok(profile("X"))], vec![]);
        let mut controller = WizardController::new(ai, CountingExporter::new());

        controller
            .dispatch(Command::Input(InputCommand::Submit(inquiry())))
            .await
            .unwrap();

        let state = controller.state();
        assert_eq!(state.stage, Stage::Profile);
        assert_eq!(state.profile.as_ref().unwrap().summary, "X");
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_submit_ignored_off_input_screen() {
        let ai = ScriptedAi::new(vec![Ok(profile("first")), Ok(profile("second"))], vec![]);
        let mut controller = WizardController::new(ai, CountingExporter::new());

        controller
            .dispatch(Command::Input(InputCommand::Submit(inquiry())))
            .await
            .unwrap();
        assert_eq!(controller.state().stage, Stage::Profile);

        // A stray submit after the wizard moved on must not re-run the call
        controller
            .dispatch(Command::Input(InputCommand::Submit(inquiry())))
            .await
            .unwrap();
        assert_eq!(controller.state().profile.as_ref().unwrap().summary, "first");
    }

    #[tokio::test]
    async fn test_failed_submit_records_error_and_input() {
        let ai = ScriptedAi::new(
            vec![Err(LlmError::Transport("boom".to_string()))],
            vec![],
        );
        let mut controller = WizardController::new(ai, CountingExporter::new());

        controller
            .dispatch(Command::Input(InputCommand::Submit(inquiry())))
            .await
            .unwrap();

        let state = controller.state();
        assert_eq!(state.stage, Stage::Input);
        assert!(!state.loading);
        let message = state.error.as_deref().unwrap();
        assert!(message.starts_with("Error: "));
        assert!(message.contains("boom"));
        assert!(state.input.is_some());
        assert!(state.profile.is_none());
    }

    #[tokio::test]
    async fn test_retry_after_failure_clears_error() {
        let ai = ScriptedAi::new(
            vec![
                Err(LlmError::Transport("boom".to_string())),
                Ok(profile("X")),
            ],
            vec![],
        );
        let mut controller = WizardController::new(ai, CountingExporter::new());

        controller
            .dispatch(Command::Input(InputCommand::Submit(inquiry())))
            .await
            .unwrap();
        assert!(controller.state().error.is_some());

        controller
            .dispatch(Command::Input(InputCommand::Submit(inquiry())))
            .await
            .unwrap();
        assert!(controller.state().error.is_none());
        assert_eq!(controller.state().stage, Stage::Profile);
    }

    #[tokio::test]
    async fn test_extraction_requires_profile() {
        let ai = ScriptedAi::new(vec![], vec![Ok(bundle())]);
        let mut controller = WizardController::new(ai, CountingExporter::new());

        controller
            .dispatch(Command::Profile(ProfileCommand::ExtractIsqs))
            .await
            .unwrap();

        let state = controller.state();
        assert_eq!(state.stage, Stage::Input);
        assert!(state.isqs.is_none());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_extraction_stays_on_profile() {
        let ai = ScriptedAi::new(
            vec![Ok(profile("X"))],
            vec![Err(LlmError::Timeout { seconds: 5 })],
        );
        let mut controller = WizardController::new(ai, CountingExporter::new());

        controller
            .dispatch(Command::Input(InputCommand::Submit(inquiry())))
            .await
            .unwrap();
        controller
            .dispatch(Command::Profile(ProfileCommand::ExtractIsqs))
            .await
            .unwrap();

        let state = controller.state();
        assert_eq!(state.stage, Stage::Profile);
        assert!(!state.loading);
        assert!(state.isqs.is_none());
        let message = state.error.as_deref().unwrap();
        assert!(message.starts_with("Error extracting ISQs: "));
    }

    #[tokio::test]
    async fn test_export_before_bundle_is_silent_noop() {
        let ai = ScriptedAi::new(vec![Ok(profile("X"))], vec![]);
        let exporter = CountingExporter::new();
        let mut controller = WizardController::new(ai, exporter.clone());

        controller
            .dispatch(Command::Input(InputCommand::Submit(inquiry())))
            .await
            .unwrap();
        let before = controller.state().clone();

        let outcome = controller
            .dispatch(Command::Isqs(IsqsCommand::Export))
            .await
            .unwrap();

        assert!(outcome.is_none());
        assert_eq!(exporter.calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.state(), &before);
    }

    #[tokio::test]
    async fn test_export_with_both_result_sets() {
        let ai = ScriptedAi::new(vec![Ok(profile("X"))], vec![Ok(bundle())]);
        let exporter = CountingExporter::new();
        let mut controller = WizardController::new(ai, exporter.clone());

        controller
            .dispatch(Command::Input(InputCommand::Submit(inquiry())))
            .await
            .unwrap();
        controller
            .dispatch(Command::Profile(ProfileCommand::ExtractIsqs))
            .await
            .unwrap();

        let before = controller.state().clone();
        let outcome = controller
            .dispatch(Command::Isqs(IsqsCommand::Export))
            .await
            .unwrap();

        assert_eq!(outcome, Some(PathBuf::from("/tmp/out.xlsx")));
        assert_eq!(exporter.calls.load(Ordering::SeqCst), 1);
        // Export never changes stage, loading, or error
        assert_eq!(controller.state(), &before);
    }

    #[tokio::test]
    async fn test_compare_then_back_is_round_trip() {
        let ai = ScriptedAi::new(vec![Ok(profile("X"))], vec![Ok(bundle())]);
        let mut controller = WizardController::new(ai, CountingExporter::new());

        controller
            .dispatch(Command::Input(InputCommand::Submit(inquiry())))
            .await
            .unwrap();
        controller
            .dispatch(Command::Profile(ProfileCommand::ExtractIsqs))
            .await
            .unwrap();

        let before = controller.state().clone();
        assert_eq!(before.stage, Stage::Isqs);

        controller
            .dispatch(Command::Isqs(IsqsCommand::Compare))
            .await
            .unwrap();
        assert_eq!(controller.state().stage, Stage::Comparison);

        controller
            .dispatch(Command::Comparison(ComparisonCommand::Back))
            .await
            .unwrap();
        assert_eq!(controller.state(), &before);
    }

    #[tokio::test]
    async fn test_snapshots_published_to_subscribers() {
        let ai = ScriptedAi::new(vec![Ok(profile("X"))], vec![]);
        let mut controller = WizardController::new(ai, CountingExporter::new());
        let receiver = controller.subscribe();

        controller
            .dispatch(Command::Input(InputCommand::Submit(inquiry())))
            .await
            .unwrap();

        let snapshot = receiver.borrow().clone();
        assert_eq!(snapshot.stage, Stage::Profile);
        assert_eq!(snapshot, *controller.state());
    }
}
