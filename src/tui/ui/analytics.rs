//! Cohort views: Trends and Dataset Info tabs.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::application::{AgeDistribution, CohortAnalytics, Comparison};
use crate::tui::styles::MedicalTheme;

/// Cohort views for the current patient, refreshed with each prediction.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsState {
    pub distribution: Option<AgeDistribution>,
    pub comparisons: Vec<Comparison>,
}

/// Render the Trends tab: age histogram beside percentile comparisons.
pub fn render_trends(f: &mut Frame, area: Rect, state: &AnalyticsState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_age_histogram(f, chunks[0], state.distribution.as_ref());
    render_comparisons(f, chunks[1], &state.comparisons);
}

fn histogram_block(title: String) -> Block<'static> {
    Block::default()
        .title(Span::styled(title, MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border())
}

fn render_age_histogram(f: &mut Frame, area: Rect, distribution: Option<&AgeDistribution>) {
    let Some(dist) = distribution else {
        let empty = Paragraph::new(Span::styled(
            "No age data in the dataset",
            MedicalTheme::text_muted(),
        ))
        .alignment(Alignment::Center)
        .block(histogram_block(" Age Distribution ".to_string()));
        f.render_widget(empty, area);
        return;
    };

    let bars: Vec<Bar> = dist
        .histogram
        .bins
        .iter()
        .enumerate()
        .map(|(i, bin)| {
            Bar::default()
                .value(bin.count as u64)
                .label(Line::from(format!("{:.0}", bin.lower)))
                .style(MedicalTheme::histogram_bar(dist.patient_bin == Some(i)))
        })
        .collect();

    // Fit every bin in the inner width, one column of gap per bar.
    let n = dist.histogram.bins.len().max(1) as u16;
    let inner_width = area.width.saturating_sub(2);
    let bar_width = (inner_width / n).saturating_sub(1).max(1);

    let title = match dist.patient_bin {
        Some(_) => format!(" Age Distribution (patient {} highlighted) ", dist.patient_age),
        None => format!(" Age Distribution (patient {} outside cohort) ", dist.patient_age),
    };

    let chart = BarChart::default()
        .block(histogram_block(title))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .max(dist.histogram.max_count() as u64);

    f.render_widget(chart, area);
}

fn render_comparisons(f: &mut Frame, area: Rect, comparisons: &[Comparison]) {
    let header = Row::new(vec!["Attribute", "Patient", "Cohort avg", "Percentile"])
        .style(MedicalTheme::selected());

    let rows: Vec<Row> = comparisons
        .iter()
        .map(|c| {
            Row::new(vec![
                Cell::from(c.label),
                Cell::from(format!("{}", c.patient_value)),
                Cell::from(format!("{:.1}", c.cohort_mean)),
                Cell::from(format!("{:.0}%", c.percentile))
                    .style(MedicalTheme::percentile(c.percentile)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(34),
            Constraint::Percentage(20),
            Constraint::Percentage(23),
            Constraint::Percentage(23),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(Span::styled(" Patient vs Cohort ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(table, area);
}

/// Render the Dataset Info tab: shape and the first rows.
pub fn render_dataset_info(f: &mut Frame, area: Rect, analytics: &CohortAnalytics) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let (n_rows, n_cols) = analytics.dataset().shape();
    let shape = Paragraph::new(Line::from(vec![
        Span::styled("Shape: ", MedicalTheme::text_secondary()),
        Span::styled(format!("{n_rows} rows × {n_cols} columns"), MedicalTheme::text()),
    ]))
    .block(
        Block::default()
            .title(Span::styled(" Dataset ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(shape, chunks[0]);

    let (columns, head) = analytics.preview();
    let header = Row::new(columns.iter().map(|c| Cell::from(c.as_str())))
        .style(MedicalTheme::selected());

    let rows: Vec<Row> = head
        .iter()
        .map(|row| {
            Row::new(row.iter().map(|value| {
                Cell::from(value.map_or_else(|| "?".to_string(), |v| v.to_string()))
            }))
        })
        .collect();

    let widths = vec![Constraint::Min(4); columns.len()];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(Span::styled(" First Rows ", MedicalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        );

    f.render_widget(table, chunks[1]);
}
