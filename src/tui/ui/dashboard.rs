//! Dashboard view: Prediction metrics and tabbed patient/cohort views.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Frame,
};

use crate::application::CohortAnalytics;
use crate::domain::FeatureVector;
use crate::tui::styles::MedicalTheme;

use super::analytics::{render_dataset_info, render_trends, AnalyticsState};
use super::inference::{render_inference, InferenceState};
use super::key_hints;

/// Dashboard tabs, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    PatientData,
    Trends,
    DatasetInfo,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::PatientData, Tab::Trends, Tab::DatasetInfo];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Tab::PatientData => "Patient Data",
            Tab::Trends => "Trends",
            Tab::DatasetInfo => "Dataset Info",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Tab::PatientData => 0,
            Tab::Trends => 1,
            Tab::DatasetInfo => 2,
        }
    }

    /// Tab for a 1-based digit key.
    #[must_use]
    pub fn from_digit(c: char) -> Option<Self> {
        let n = c.to_digit(10)? as usize;
        Self::ALL.get(n.checked_sub(1)?).copied()
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Feedback line shown under the tabs (export results).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

/// Dashboard state for rendering.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub tab: Tab,
    pub status: Option<StatusMessage>,
}

/// Model metadata shown in the Model Status panel.
#[derive(Debug, Clone, Copy)]
pub struct ModelStatus<'a> {
    pub kind: &'a str,
    pub probabilistic: bool,
}

/// Everything the dashboard reads, borrowed from the app for one frame.
pub struct DashboardView<'a> {
    pub state: &'a DashboardState,
    pub model: ModelStatus<'a>,
    pub inference: &'a InferenceState,
    pub features: &'a FeatureVector,
    pub analytics_state: &'a AnalyticsState,
    pub analytics: &'a CohortAnalytics,
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(5), // Metrics row
            Constraint::Length(3), // Tabs
            Constraint::Min(0),    // Tab content
            Constraint::Length(2), // Footer
        ])
        .split(area);

    render_header(f, chunks[0]);
    render_metrics(f, chunks[1], view);
    render_tabs(f, chunks[2], view.state.tab);

    match view.state.tab {
        Tab::PatientData => render_patient_data(f, chunks[3], view.features),
        Tab::Trends => render_trends(f, chunks[3], view.analytics_state),
        Tab::DatasetInfo => render_dataset_info(f, chunks[3], view.analytics),
    }

    render_footer(f, chunks[4], view.state.status.as_ref());
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Cardiolens", MedicalTheme::title()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled("Heart Disease Risk Prediction", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_metrics(f: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    render_model_status(f, chunks[0], view.model);
    render_inference(f, chunks[1], view.inference);
}

fn render_model_status(f: &mut Frame, area: Rect, model: ModelStatus<'_>) {
    let capability = if model.probabilistic {
        "with probabilities"
    } else {
        "label only"
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("OK ", MedicalTheme::success()),
            Span::styled("Active", MedicalTheme::text()),
        ]),
        Line::from(Span::styled(model.kind.to_string(), MedicalTheme::text_secondary())),
        Line::from(Span::styled(capability, MedicalTheme::text_muted())),
    ];

    let panel = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .title(Span::styled(" Model Status ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(panel, area);
}

fn render_tabs(f: &mut Frame, area: Rect, tab: Tab) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!(" {} {} ", i + 1, t.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(tab.index())
        .style(MedicalTheme::text_secondary())
        .highlight_style(MedicalTheme::selected())
        .divider(Span::styled("│", MedicalTheme::text_muted()))
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(MedicalTheme::border()),
        );

    f.render_widget(tabs, area);
}

fn render_patient_data(f: &mut Frame, area: Rect, features: &FeatureVector) {
    let block = Block::default()
        .title(Span::styled(" Encoded Input ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let named: Vec<(&str, f64)> = features.named().collect();
    let (left, right) = named.split_at(named.len().div_ceil(2));

    for (chunk, part) in columns.iter().zip([left, right]) {
        let rows: Vec<Row> = part
            .iter()
            .map(|(name, value)| {
                Row::new(vec![
                    Cell::from(*name).style(MedicalTheme::text_secondary()),
                    Cell::from(value.to_string()).style(MedicalTheme::text()),
                ])
            })
            .collect();

        let table = Table::new(rows, [Constraint::Length(12), Constraint::Min(6)])
            .header(Row::new(vec!["Feature", "Value"]).style(MedicalTheme::selected()));
        f.render_widget(table, *chunk);
    }
}

fn render_footer(f: &mut Frame, area: Rect, status: Option<&StatusMessage>) {
    let mut lines = vec![key_hints(&[
        ("←→/1-3", "Tabs"),
        ("E", "Edit Patient"),
        ("X", "Export CSV"),
        ("Q", "Quit"),
    ])];

    match status {
        Some(StatusMessage::Info(msg)) => {
            lines.push(Line::from(Span::styled(msg.clone(), MedicalTheme::success())));
        }
        Some(StatusMessage::Error(msg)) => {
            lines.push(Line::from(Span::styled(
                format!("! {msg}"),
                MedicalTheme::danger(),
            )));
        }
        None => {}
    }

    f.render_widget(Paragraph::new(lines), area);
}
