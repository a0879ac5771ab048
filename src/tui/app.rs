//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Synchronous prediction on each form submission

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::{dataset::load_dataset, export::write_csv, model::load_model};
use crate::application::{CohortAnalytics, PredictionService};
use crate::config::AppConfig;
use crate::domain::{FeatureVector, PatientRecord};

use super::ui::{
    analytics::AnalyticsState,
    dashboard::{
        render_dashboard, DashboardState, DashboardView, ModelStatus, StatusMessage, Tab,
    },
    inference::InferenceState,
    patient::{render_patient_form, PatientFormState},
    render_disclaimer,
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    PatientForm,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,

    prediction_service: PredictionService,
    analytics: CohortAnalytics,
    export_path: PathBuf,

    /// Record behind the current prediction
    record: PatientRecord,

    dashboard_state: DashboardState,
    patient_form_state: PatientFormState,
    inference_state: InferenceState,
    analytics_state: AnalyticsState,
}

impl App {
    /// Load the model and dataset named by `config` and build the app.
    ///
    /// # Errors
    /// Returns error if the model or dataset cannot be loaded; the app does
    /// not start without both.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let model = load_model(&config.model_path, config.require_manifest).with_context(|| {
            format!(
                "Failed to load model from {:?}. Set CARDIOLENS_MODEL_PATH to a model artifact.",
                config.model_path
            )
        })?;

        let dataset = load_dataset(&config.dataset_path).with_context(|| {
            format!(
                "Failed to load dataset from {:?}. Set CARDIOLENS_DATASET_PATH to a CSV file.",
                config.dataset_path
            )
        })?;

        let prediction_service = PredictionService::new(Arc::new(model));
        let analytics = CohortAnalytics::new(Arc::new(dataset));

        Ok(Self::with_dependencies(
            prediction_service,
            analytics,
            config.export_path.clone(),
        ))
    }

    /// Create application with injected services (Composition Root pattern).
    ///
    /// Computes the prediction for the default record immediately.
    #[must_use]
    pub fn with_dependencies(
        prediction_service: PredictionService,
        analytics: CohortAnalytics,
        export_path: PathBuf,
    ) -> Self {
        let record = PatientRecord::default();
        let inference_state = Self::evaluate(&prediction_service, &record);
        let analytics_state = Self::cohort_views(&analytics, &record);

        Self {
            screen: Screen::Dashboard,
            should_quit: false,
            prediction_service,
            analytics,
            export_path,
            record,
            dashboard_state: DashboardState::default(),
            patient_form_state: PatientFormState::default(),
            inference_state,
            analytics_state,
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[must_use]
    pub fn record(&self) -> &PatientRecord {
        &self.record
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore the terminal even if the loop failed.
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                match self.screen {
                    Screen::Dashboard => {
                        let features = FeatureVector::encode(&self.record);
                        let model = self.prediction_service.model();
                        let view = DashboardView {
                            state: &self.dashboard_state,
                            model: ModelStatus {
                                kind: model.kind(),
                                probabilistic: model.supports_probabilities(),
                            },
                            inference: &self.inference_state,
                            features: &features,
                            analytics_state: &self.analytics_state,
                            analytics: &self.analytics,
                        };
                        render_dashboard(f, chunks[0], &view);
                    }
                    Screen::PatientForm => {
                        render_patient_form(f, chunks[0], &self.patient_form_state);
                    }
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Dispatch one key press to the active screen.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::PatientForm => self.handle_patient_form_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Right | KeyCode::Tab => {
                self.dashboard_state.tab = self.dashboard_state.tab.next();
            }
            KeyCode::Left | KeyCode::BackTab => {
                self.dashboard_state.tab = self.dashboard_state.tab.prev();
            }
            KeyCode::Char(c @ '1'..='3') => {
                if let Some(tab) = Tab::from_digit(c) {
                    self.dashboard_state.tab = tab;
                }
            }
            KeyCode::Char('e' | 'E' | 'n' | 'N') => {
                self.patient_form_state = PatientFormState::from_record(&self.record);
                self.screen = Screen::PatientForm;
            }
            KeyCode::Char('x' | 'X') => self.export(),
            KeyCode::Char('q' | 'Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_patient_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.screen = Screen::Dashboard;
            }
            KeyCode::Enter => self.submit_patient_form(),
            _ => {
                let form = &mut self.patient_form_state;
                match key {
                    KeyCode::Up | KeyCode::BackTab => form.prev_field(),
                    KeyCode::Down | KeyCode::Tab => form.next_field(),
                    KeyCode::Left => form.cycle_choice(false),
                    KeyCode::Right => form.cycle_choice(true),
                    KeyCode::Char('s' | 'S') => form.load_sample_data(),
                    KeyCode::Char('r' | 'R') => form.reset(),
                    KeyCode::Char(c) => form.input_char(c),
                    KeyCode::Backspace => form.delete_char(),
                    KeyCode::Delete => form.clear_field(),
                    _ => {}
                }
            }
        }
    }

    fn submit_patient_form(&mut self) {
        match self.patient_form_state.to_patient_record() {
            Ok(record) => {
                self.record = record;
                self.recompute();
                self.dashboard_state.status = None;
                self.screen = Screen::Dashboard;
            }
            Err(e) => {
                self.patient_form_state.error_message = Some(e);
            }
        }
    }

    /// Predict for the current record and refresh the cohort views.
    fn recompute(&mut self) {
        self.inference_state = Self::evaluate(&self.prediction_service, &self.record);
        self.analytics_state = Self::cohort_views(&self.analytics, &self.record);
    }

    fn evaluate(service: &PredictionService, record: &PatientRecord) -> InferenceState {
        match service.predict(record) {
            Ok(prediction) => InferenceState::Complete { prediction },
            Err(e) => {
                tracing::error!("Prediction failed: {}", e);
                InferenceState::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    fn cohort_views(analytics: &CohortAnalytics, record: &PatientRecord) -> AnalyticsState {
        AnalyticsState {
            distribution: analytics.age_distribution(record),
            comparisons: analytics.compare(record),
        }
    }

    fn export(&mut self) {
        let features = FeatureVector::encode(&self.record);
        let result = self
            .inference_state
            .prediction()
            .map(|prediction| &prediction.result);

        self.dashboard_state.status = Some(match write_csv(&self.export_path, &features, result) {
            Ok(()) => StatusMessage::Info(format!("Exported to {}", self.export_path.display())),
            Err(e) => {
                tracing::error!("Export to {:?} failed: {}", self.export_path, e);
                StatusMessage::Error(format!("Export failed: {e}"))
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::model::{Estimator, ModelArtifact};
    use crate::domain::{Dataset, RiskLabel, FEATURE_NAMES};
    use std::path::Path;
    use tempfile::tempdir;

    fn analytics() -> CohortAnalytics {
        let dataset = Dataset::new(
            vec!["age".into(), "chol".into()],
            vec![vec![Some(45.0), Some(210.0)], vec![Some(63.0), Some(233.0)]],
        )
        .expect("dataset");
        CohortAnalytics::new(Arc::new(dataset))
    }

    fn app_with_export(export_path: PathBuf) -> App {
        let model = load_model(Path::new("models/heart_model.json"), false).expect("model");
        App::with_dependencies(
            PredictionService::new(Arc::new(model)),
            analytics(),
            export_path,
        )
    }

    fn press(app: &mut App, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    #[test]
    fn test_startup_predicts_default_record() {
        let app = app_with_export(PathBuf::from("unused.csv"));
        let prediction = app.inference_state.prediction().expect("prediction");
        assert_eq!(prediction.result.label, RiskLabel::Low);
        assert!(app.analytics_state.distribution.is_some());
    }

    #[test]
    fn test_sample_submission_updates_prediction() {
        let mut app = app_with_export(PathBuf::from("unused.csv"));

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.screen(), Screen::PatientForm);
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen(), Screen::Dashboard);
        assert_eq!(*app.record(), PatientRecord::sample());
        let prediction = app.inference_state.prediction().expect("prediction");
        assert_eq!(prediction.result.label, RiskLabel::High);
    }

    #[test]
    fn test_cancel_keeps_previous_record() {
        let mut app = app_with_export(PathBuf::from("unused.csv"));

        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.screen(), Screen::Dashboard);
        assert_eq!(*app.record(), PatientRecord::default());
    }

    #[test]
    fn test_out_of_range_submission_stays_on_form() {
        let mut app = app_with_export(PathBuf::from("unused.csv"));

        press(&mut app, KeyCode::Char('e'));
        // Age is the first field: 50 -> 501
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen(), Screen::PatientForm);
        assert_eq!(
            app.patient_form_state.error_message.as_deref(),
            Some("Age: Value must be between 20 and 100")
        );
        assert_eq!(*app.record(), PatientRecord::default());
    }

    #[test]
    fn test_tab_navigation_wraps() {
        let mut app = app_with_export(PathBuf::from("unused.csv"));

        press(&mut app, KeyCode::Left);
        assert_eq!(app.dashboard_state.tab, Tab::DatasetInfo);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.dashboard_state.tab, Tab::PatientData);
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.dashboard_state.tab, Tab::Trends);
    }

    #[test]
    fn test_export_writes_prediction_column() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("prediction.csv");
        let mut app = app_with_export(path.clone());

        press(&mut app, KeyCode::Char('x'));

        let written = std::fs::read_to_string(&path).expect("exported file");
        let header = written.lines().next().expect("header");
        assert!(header.ends_with(",prediction"));
        assert!(matches!(
            app.dashboard_state.status,
            Some(StatusMessage::Info(_))
        ));
    }

    #[test]
    fn test_schema_mismatch_shows_error() {
        let mut names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        names.truncate(16);
        let artifact = ModelArtifact {
            format_version: 1,
            estimator: Estimator::LogisticRegression,
            coefficients: vec![0.0; names.len()],
            feature_names: names,
            intercept: 0.0,
            threshold: 0.5,
        };
        let service = PredictionService::new(Arc::new(artifact.into_handle().expect("handle")));
        let app = App::with_dependencies(service, analytics(), PathBuf::from("unused.csv"));

        match &app.inference_state {
            InferenceState::Error { message } => assert!(message.contains("17")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with_export(PathBuf::from("unused.csv"));
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit());

        let mut app = app_with_export(PathBuf::from("unused.csv"));
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit());
    }
}
