use crossterm::event::{KeyCode, KeyEvent};
use std::time::{Duration, Instant};
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::api::{ApiClient, ApiStatus};
use crate::error::ClientError;
use crate::form::{FieldValue, FormState};
use crate::model::{InputData, ModelConfig, PredictionResult};
use crate::view::{self, ResultView, Screen, ViewInput};

/// How long an error banner stays up
pub const ERROR_DISPLAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

/// Error banner; each one carries its own clock
#[derive(Debug, Clone)]
pub struct Banner {
    pub message: String,
    pub shown_at: Instant,
}

impl Banner {
    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= ERROR_DISPLAY
    }
}

/// A prediction request running on its own task
struct InFlight {
    config: ModelConfig,
    input: InputData,
    rx: oneshot::Receiver<Result<PredictionResult, ClientError>>,
}

pub struct App {
    pub popup: Popup,
    client: ApiClient,

    // Header
    pub api_status: ApiStatus,

    // Loaded schema (replaced wholesale on reload) and the form built from it
    pub model: Option<ModelConfig>,
    pub form: FormState,
    pub focus: usize,  // == form.len() when the submit button has focus

    // Submission
    pub submitting: bool,
    in_flight: Option<InFlight>,
    pub result: Option<ResultView>,

    pub banner: Option<Banner>,
}

impl App {
    pub fn new(client: ApiClient) -> Self {
        Self {
            popup: Popup::None,
            client,
            api_status: ApiStatus::Checking,
            model: None,
            form: FormState::default(),
            focus: 0,
            submitting: false,
            in_flight: None,
            result: None,
            banner: None,
        }
    }

    /// Status check, then config load, then form build. Used on startup and reload.
    pub async fn initialize(&mut self) {
        if let Err(e) = self.load().await {
            self.model = None;
            self.form = FormState::default();
            self.focus = 0;
            self.result = None;
            self.show_error(ClientError::initialization(e).to_string());
        }
    }

    async fn load(&mut self) -> Result<(), ClientError> {
        self.api_status = ApiStatus::Checking;
        match self.client.check_status().await {
            Ok(info) => self.api_status = ApiStatus::Connected(info),
            Err(e) => {
                self.api_status = ApiStatus::Disconnected;
                return Err(e);
            }
        }

        let config = self.client.fetch_config().await?;
        self.apply_config(config)
    }

    /// Install a new schema, rebuilding the form from scratch
    pub fn apply_config(&mut self, config: ModelConfig) -> Result<(), ClientError> {
        let form = FormState::build(&config)?;
        tracing::info!("Rendering form for {} ({} fields)", config.model.name, form.len());
        self.model = Some(config);
        self.form = form;
        self.focus = 0;
        self.result = None;
        Ok(())
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.banner = Some(Banner { message, shown_at: Instant::now() });
    }

    pub fn view(&self) -> Screen {
        view::render(&ViewInput {
            status: &self.api_status,
            model: self.model.as_ref(),
            form: &self.form,
            focus: self.focus,
            submitting: self.submitting,
            result: self.result.as_ref(),
            error: self.banner.as_ref().map(|b| b.message.as_str()),
        })
    }

    /// True when keystrokes go into a number input
    pub fn editing_text(&self) -> bool {
        matches!(self.form.value(self.focus), Some(FieldValue::Number(_)))
    }

    fn option_count(&self, index: usize) -> usize {
        self.model
            .as_ref()
            .and_then(|m| m.features.get(index))
            .and_then(|f| f.options.as_ref())
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if self.popup == Popup::Help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q')) {
                self.popup = Popup::None;
            }
            return;
        }

        let focusable = if self.model.is_some() { self.form.len() + 1 } else { 0 };

        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                if focusable > 0 {
                    self.focus = (self.focus + 1) % focusable;
                }
            }
            KeyCode::BackTab | KeyCode::Up => {
                if focusable > 0 {
                    self.focus = self.focus.checked_sub(1).unwrap_or(focusable - 1);
                }
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Right | KeyCode::Char(' ') if !self.editing_text() => {
                let count = self.option_count(self.focus);
                self.form.select_next(self.focus, count);
            }
            KeyCode::Left if !self.editing_text() => {
                let count = self.option_count(self.focus);
                self.form.select_prev(self.focus, count);
            }
            KeyCode::Backspace => self.form.pop_char(self.focus),
            KeyCode::Char(c) if self.editing_text() => self.form.push_char(self.focus, c),
            KeyCode::Char('R') => {
                tracing::info!("Reloading model configuration");
                self.initialize().await;
            }
            KeyCode::Char('?') => self.popup = Popup::Help,
            _ => {}
        }
    }

    /// Start a prediction for the current form values
    pub fn submit(&mut self) {
        if self.submitting {
            tracing::debug!("Submission already in flight, ignoring");
            return;
        }

        self.result = None;
        self.banner = None;

        let Some(config) = self.model.clone() else {
            self.show_error("Model configuration not loaded");
            return;
        };

        let input = match self.form.collect(&config) {
            Ok(input) => input,
            Err(e) => {
                self.show_error(ClientError::from(e).to_string());
                return;
            }
        };

        self.submitting = true;

        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        let payload = input.clone();
        tokio::spawn(async move {
            let outcome = client.predict(&payload).await;
            let _ = tx.send(outcome);
        });

        self.in_flight = Some(InFlight { config, input, rx });
    }

    /// Pick up a finished prediction, if any
    fn poll_submission(&mut self) {
        let outcome = match self.in_flight.as_mut().map(|f| f.rx.try_recv()) {
            None | Some(Err(TryRecvError::Empty)) => return,
            Some(Ok(outcome)) => outcome,
            Some(Err(TryRecvError::Closed)) => {
                Err(ClientError::prediction("Prediction task ended unexpectedly"))
            }
        };

        if let Some(flight) = self.in_flight.take() {
            self.finish_submission(&flight.config, &flight.input, outcome);
        }
    }

    fn finish_submission(
        &mut self,
        config: &ModelConfig,
        input: &InputData,
        outcome: Result<PredictionResult, ClientError>,
    ) {
        // Re-enable the submit button no matter how the request ended
        self.submitting = false;

        match outcome {
            Ok(result) => self.result = Some(ResultView::new(&result, input, config)),
            Err(e) => self.show_error(e.to_string()),
        }
    }

    pub fn expire_banner(&mut self, now: Instant) {
        if self.banner.as_ref().is_some_and(|b| b.expired(now)) {
            self.banner = None;
        }
    }

    pub fn tick(&mut self) {
        self.poll_submission();
        self.expire_banner(Instant::now());
    }
}
