//! Prediction panels for the dashboard's metrics row.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{Prediction, RiskLabel};
use crate::tui::styles::MedicalTheme;

/// Outcome of the most recent prediction.
#[derive(Debug, Clone)]
pub enum InferenceState {
    Complete { prediction: Prediction },
    /// Invocation failed; no partial result is shown
    Error { message: String },
}

impl InferenceState {
    #[must_use]
    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            Self::Complete { prediction } => Some(prediction),
            _ => None,
        }
    }
}

/// Render the risk level and assessment panels, or the error panel.
pub fn render_inference(f: &mut Frame, area: Rect, state: &InferenceState) {
    match state {
        InferenceState::Complete { prediction } => render_result(f, area, prediction),
        InferenceState::Error { message } => render_error(f, area, message),
    }
}

fn render_result(f: &mut Frame, area: Rect, prediction: &Prediction) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let label = prediction.result.label;
    let risk_style = MedicalTheme::risk_label(label);

    let risk = Paragraph::new(vec![
        Line::from(Span::styled(
            label.to_string(),
            risk_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(label.delta(), MedicalTheme::text_secondary())),
        Line::from(Span::styled(computed_at_label(prediction), MedicalTheme::text_muted())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .title(Span::styled(" Risk Level ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(risk, chunks[0]);

    render_assessment(f, chunks[1], label, prediction.result.confidence);
}

fn computed_at_label(prediction: &Prediction) -> String {
    prediction.computed_at.format("at %H:%M:%S UTC").to_string()
}

fn render_assessment(f: &mut Frame, area: Rect, label: RiskLabel, confidence: Option<f64>) {
    let block = Block::default()
        .title(Span::styled(" Assessment ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::risk_label(label));

    match confidence {
        Some(c) => {
            let gauge = Gauge::default()
                .block(block)
                .gauge_style(MedicalTheme::risk_label(label))
                .ratio(c.clamp(0.0, 1.0))
                .label(format!("{} ({:.1}% confidence)", label.description(), c * 100.0));
            f.render_widget(gauge, area);
        }
        None => {
            let text = Paragraph::new(vec![
                Line::from(Span::styled(
                    label.description(),
                    MedicalTheme::risk_label(label).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "confidence unavailable",
                    MedicalTheme::text_muted(),
                )),
            ])
            .alignment(Alignment::Center)
            .block(block);
            f.render_widget(text, area);
        }
    }
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(Span::styled(
            "! Prediction failed",
            MedicalTheme::danger().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureVector, PatientRecord, PredictionResult};
    use chrono::TimeZone;

    #[test]
    fn test_result_shows_computation_time() {
        let mut prediction = Prediction::new(
            FeatureVector::encode(&PatientRecord::default()),
            PredictionResult::with_probability(RiskLabel::Low, 0.08),
        );
        prediction.computed_at = chrono::Utc
            .with_ymd_and_hms(2024, 3, 1, 14, 5, 9)
            .single()
            .expect("valid timestamp");

        assert_eq!(computed_at_label(&prediction), "at 14:05:09 UTC");
    }
}
