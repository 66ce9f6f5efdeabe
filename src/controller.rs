use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::client::{PredictionService, SubmitError};
use crate::form::SurveyForm;
use crate::models::{PredictionResult, SubmissionOutcome};
use crate::page::{Document, DomError};
use crate::render;

/// Enabled state of the submit control, shared with anything that needs to
/// observe it mid-request.
#[derive(Debug, Clone)]
pub struct SubmitButton(Arc<AtomicBool>);

impl Default for SubmitButton {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl SubmitButton {
    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Disable the control for one exchange. Returns `None` when an exchange
    /// already holds it.
    fn engage(&self) -> Option<SubmitGuard> {
        self.0
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| SubmitGuard {
                button: self.clone(),
            })
    }
}

/// Re-enables the control on every exit path, including unwinding.
struct SubmitGuard {
    button: SubmitButton,
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.button.0.store(true, Ordering::SeqCst);
    }
}

/// Blocking, user-facing notification.
pub trait Notifier {
    fn alert(&self, message: &str);
}

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }
}

pub struct SubmissionController<S, N> {
    service: S,
    notifier: N,
    document: Document,
    button: SubmitButton,
}

impl<S: PredictionService, N: Notifier> SubmissionController<S, N> {
    pub fn new(service: S, notifier: N, document: Document) -> Self {
        Self {
            service,
            notifier,
            document,
            button: SubmitButton::default(),
        }
    }

    #[cfg(test)]
    pub fn with_button(mut self, button: SubmitButton) -> Self {
        self.button = button;
        self
    }

    #[cfg(test)]
    pub fn button(&self) -> &SubmitButton {
        &self.button
    }

    #[cfg(test)]
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    #[cfg(test)]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Handle one submit action. Request failures are logged and shown to
    /// the user; a broken page is returned as an error.
    pub async fn submit(&mut self, form: &SurveyForm) -> Result<SubmissionOutcome, DomError> {
        let Some(_guard) = self.button.engage() else {
            debug!(student_id = %form.student_id, "submit ignored while a request is in flight");
            return Ok(SubmissionOutcome::Failed("submission already in progress".to_string()));
        };

        match self.exchange(form).await {
            Ok(result) => {
                render::render(&mut self.document, &result)?;
                info!(
                    student_id = %form.student_id,
                    stress = result.stress_score,
                    depression = result.depression_score,
                    "prediction rendered"
                );
                Ok(SubmissionOutcome::Rendered(result))
            }
            Err(err) => {
                error!(student_id = %form.student_id, error = %err, "submission failed");
                let message = format!("Error processing request: {err}");
                self.notifier.alert(&message);
                Ok(SubmissionOutcome::Failed(message))
            }
        }
    }

    async fn exchange(&self, form: &SurveyForm) -> Result<PredictionResult, SubmitError> {
        let input = form.assemble().await?;
        self.service.predict(input).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::client::decode_result;
    use crate::models::SurveyInput;
    use crate::page::{self, skeleton};

    enum Reply {
        Prediction(PredictionResult),
        Status(u16),
        Malformed,
    }

    struct FakeService {
        reply: Reply,
        button: SubmitButton,
        enabled_during_call: AtomicBool,
        calls: AtomicUsize,
        last_input: Mutex<Option<SurveyInput>>,
    }

    impl FakeService {
        fn new(reply: Reply, button: &SubmitButton) -> Self {
            Self {
                reply,
                button: button.clone(),
                enabled_during_call: AtomicBool::new(true),
                calls: AtomicUsize::new(0),
                last_input: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl PredictionService for FakeService {
        async fn predict(&self, input: SurveyInput) -> Result<PredictionResult, SubmitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.enabled_during_call
                .store(self.button.is_enabled(), Ordering::SeqCst);
            *self.last_input.lock().unwrap() = Some(input);

            match &self.reply {
                Reply::Prediction(result) => Ok(result.clone()),
                Reply::Status(code) => Err(SubmitError::Request {
                    status: StatusCode::from_u16(*code).unwrap(),
                }),
                Reply::Malformed => decode_result(b"{\"stress_score\":"),
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn alert(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn prediction(stress: f64, depression: f64) -> PredictionResult {
        PredictionResult {
            stress_score: stress,
            depression_score: depression,
            stress_level: "High".to_string(),
            depression_level: "Normal".to_string(),
            alert_counselor: true,
            alert_proctor: true,
            recommendations: Some(vec!["Sleep more".to_string()]),
            text_sentiment: None,
        }
    }

    fn form() -> SurveyForm {
        SurveyForm {
            student_id: "21BCE0001".to_string(),
            text: "so many deadlines".to_string(),
            image: None,
            study_time: "12".to_string(),
            social_media: String::new(),
            sleep_hours: "abc".to_string(),
            deadlines: "3".to_string(),
        }
    }

    fn controller(reply: Reply) -> SubmissionController<FakeService, RecordingNotifier> {
        let button = SubmitButton::default();
        let service = FakeService::new(reply, &button);
        let document = Document::mount(skeleton()).unwrap();
        SubmissionController::new(service, RecordingNotifier::default(), document)
            .with_button(button)
    }

    #[tokio::test]
    async fn success_renders_and_reenables() {
        let mut controller = controller(Reply::Prediction(prediction(0.7, 0.1)));

        let outcome = controller.submit(&form()).await.unwrap();

        assert!(matches!(outcome, SubmissionOutcome::Rendered(_)));
        assert!(controller.button().is_enabled());
        assert!(!controller.service.enabled_during_call.load(Ordering::SeqCst));
        assert!(!controller.document().element(page::RESULT).unwrap().hidden);
        assert_eq!(controller.document().emergency_alerts().len(), 1);
        assert!(controller.notifier().messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn payload_carries_parsed_behavior() {
        let mut controller = controller(Reply::Prediction(prediction(0.2, 0.2)));
        controller.submit(&form()).await.unwrap();

        let input = controller.service.last_input.lock().unwrap().clone().unwrap();
        assert_eq!(input.student_id, "21BCE0001");
        assert_eq!(input.text, "so many deadlines");
        assert_eq!(input.behavior.as_array(), [12, 0, 0, 3]);
    }

    #[tokio::test]
    async fn server_error_notifies_without_touching_panel() {
        let mut controller = controller(Reply::Status(500));

        let outcome = controller.submit(&form()).await.unwrap();

        match outcome {
            SubmissionOutcome::Failed(message) => {
                assert_eq!(message, "Error processing request: HTTP error! status: 500")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(controller.button().is_enabled());
        let panel = controller.document().element(page::RESULT).unwrap();
        assert!(panel.hidden);
        assert!(panel.children.is_empty());
        assert_eq!(controller.notifier().messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let mut controller = controller(Reply::Malformed);

        let outcome = controller.submit(&form()).await.unwrap();

        assert!(matches!(outcome, SubmissionOutcome::Failed(_)));
        assert!(controller.button().is_enabled());
        let messages = controller.notifier().messages.lock().unwrap();
        assert!(messages[0].starts_with("Error processing request: invalid prediction response"));
    }

    #[tokio::test]
    async fn unreadable_image_fails_before_request() {
        let mut controller = controller(Reply::Prediction(prediction(0.2, 0.2)));
        let form = SurveyForm {
            image: Some("/no/such/face.png".into()),
            ..form()
        };

        let outcome = controller.submit(&form).await.unwrap();

        assert!(matches!(outcome, SubmissionOutcome::Failed(_)));
        assert_eq!(controller.service.calls.load(Ordering::SeqCst), 0);
        assert!(controller.button().is_enabled());
    }

    #[tokio::test]
    async fn disabled_button_blocks_resubmission() {
        let mut controller = controller(Reply::Prediction(prediction(0.2, 0.2)));
        let held = controller.button().engage();
        assert!(held.is_some());

        let outcome = controller.submit(&form()).await.unwrap();

        assert!(matches!(outcome, SubmissionOutcome::Failed(_)));
        assert_eq!(controller.service.calls.load(Ordering::SeqCst), 0);
        assert!(!controller.button().is_enabled());
        drop(held);
        assert!(controller.button().is_enabled());
    }

    #[test]
    fn guard_reenables_on_drop() {
        let button = SubmitButton::default();
        {
            let _guard = button.engage().unwrap();
            assert!(!button.is_enabled());
            assert!(button.engage().is_none());
        }
        assert!(button.is_enabled());
    }
}
