//! Patient data input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{
    ChestPain, NumericRange, PatientRecord, RestingEcg, Sex, StSlope, Thalassemia, YesNo,
    AGE_RANGE, CHOL_RANGE, MAX_CA, OLDPEAK_RANGE, THALACH_RANGE, TRESTBPS_RANGE,
};
use crate::tui::styles::MedicalTheme;

use super::key_hints;

/// How a field is edited.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    /// Typed number, checked against its range on submit.
    Numeric { value: String, range: NumericRange },
    /// One of a fixed set of coded options, cycled with ←/→.
    Choice {
        options: Vec<(u8, &'static str)>,
        selected: usize,
    },
}

/// Form field definition
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub input: FieldInput,
}

impl FormField {
    fn numeric(label: &'static str, hint: &'static str, range: NumericRange) -> Self {
        Self {
            label,
            hint,
            input: FieldInput::Numeric {
                value: String::new(),
                range,
            },
        }
    }

    fn choice(label: &'static str, hint: &'static str, options: Vec<(u8, &'static str)>) -> Self {
        Self {
            label,
            hint,
            input: FieldInput::Choice {
                options,
                selected: 0,
            },
        }
    }

    /// Text shown in the field box.
    #[must_use]
    pub fn display(&self) -> String {
        match &self.input {
            FieldInput::Numeric { value, .. } => value.clone(),
            FieldInput::Choice { options, selected } => options
                .get(*selected)
                .map(|(code, label)| format!("◀ {label} ({code}) ▶"))
                .unwrap_or_default(),
        }
    }

    fn set_numeric(&mut self, v: f64) {
        if let FieldInput::Numeric { value, .. } = &mut self.input {
            *value = v.to_string();
        }
    }

    fn set_code(&mut self, code: u8) {
        if let FieldInput::Choice { options, selected } = &mut self.input {
            if let Some(i) = options.iter().position(|(c, _)| *c == code) {
                *selected = i;
            }
        }
    }

    fn number(&self) -> Result<f64, String> {
        let FieldInput::Numeric { value, range } = &self.input else {
            return Err(format!("{}: Not a numeric field", self.label));
        };

        let parsed: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("{}: Invalid number", self.label))?;

        if !parsed.is_finite() || !range.contains(parsed) {
            return Err(format!(
                "{}: Value must be between {} and {}",
                self.label, range.min, range.max
            ));
        }

        if let Some(step) = range.step.filter(|_| !range.on_step(parsed)) {
            return Err(format!("{}: Value must be a multiple of {step}", self.label));
        }

        Ok(parsed)
    }

    fn code(&self) -> Result<u8, String> {
        match &self.input {
            FieldInput::Choice { options, selected } => options
                .get(*selected)
                .map(|(code, _)| *code)
                .ok_or_else(|| format!("{}: No option selected", self.label)),
            FieldInput::Numeric { .. } => Err(format!("{}: Not a choice field", self.label)),
        }
    }
}

fn options_of<T>(all: &[T], label: fn(T) -> &'static str) -> Vec<(u8, &'static str)>
where
    T: Copy + Into<u8>,
{
    all.iter().map(|v| ((*v).into(), label(*v))).collect()
}

// Field order; `to_patient_record` and `load_record` index by these.
const AGE: usize = 0;
const SEX: usize = 1;
const CP: usize = 2;
const TRESTBPS: usize = 3;
const CHOL: usize = 4;
const FBS: usize = 5;
const RESTECG: usize = 6;
const THALACH: usize = 7;
const EXANG: usize = 8;
const OLDPEAK: usize = 9;
const SLOPE: usize = 10;
const CA: usize = 11;
const THAL: usize = 12;

const VESSEL_LABELS: [&str; 4] = ["none", "one", "two", "three"];

/// Patient form state
#[derive(Debug, Clone, PartialEq)]
pub struct PatientFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        Self::from_record(&PatientRecord::default())
    }
}

impl PatientFormState {
    /// Build the form pre-filled with `record`.
    #[must_use]
    pub fn from_record(record: &PatientRecord) -> Self {
        let vessels = (0..=MAX_CA)
            .map(|n| (n, VESSEL_LABELS[usize::from(n)]))
            .collect();

        let mut state = Self {
            fields: vec![
                FormField::numeric("Age", "years (20-100)", AGE_RANGE),
                FormField::choice("Sex", "←/→", options_of(Sex::ALL, Sex::label)),
                FormField::choice(
                    "Chest Pain Type",
                    "←/→",
                    options_of(ChestPain::ALL, ChestPain::label),
                ),
                FormField::numeric("Resting BP", "mm Hg (90-200)", TRESTBPS_RANGE),
                FormField::numeric("Cholesterol", "mg/dl (50-700)", CHOL_RANGE),
                FormField::choice(
                    "Fasting Blood Sugar > 120",
                    "←/→",
                    options_of(YesNo::ALL, YesNo::label),
                ),
                FormField::choice(
                    "Resting ECG",
                    "←/→",
                    options_of(RestingEcg::ALL, RestingEcg::label),
                ),
                FormField::numeric("Max Heart Rate", "bpm (50-250)", THALACH_RANGE),
                FormField::choice(
                    "Exercise Angina",
                    "←/→",
                    options_of(YesNo::ALL, YesNo::label),
                ),
                FormField::numeric("ST Depression", "oldpeak (0-10, step 0.1)", OLDPEAK_RANGE),
                FormField::choice("ST Slope", "←/→", options_of(StSlope::ALL, StSlope::label)),
                FormField::choice("Major Vessels", "←/→", vessels),
                FormField::choice(
                    "Thalassemia",
                    "←/→",
                    options_of(Thalassemia::ALL, Thalassemia::label),
                ),
            ],
            selected_field: 0,
            error_message: None,
        };
        state.load_record(record);
        state
    }

    /// Overwrite every field with the values of `record`.
    pub fn load_record(&mut self, record: &PatientRecord) {
        self.fields[AGE].set_numeric(record.age);
        self.fields[SEX].set_code(record.sex.code());
        self.fields[CP].set_code(record.cp.code());
        self.fields[TRESTBPS].set_numeric(record.trestbps);
        self.fields[CHOL].set_numeric(record.chol);
        self.fields[FBS].set_code(record.fbs.code());
        self.fields[RESTECG].set_code(record.restecg.code());
        self.fields[THALACH].set_numeric(record.thalach);
        self.fields[EXANG].set_code(record.exang.code());
        self.fields[OLDPEAK].set_numeric(record.oldpeak);
        self.fields[SLOPE].set_code(record.slope.code());
        self.fields[CA].set_code(record.ca);
        self.fields[THAL].set_code(record.thal.code());
        self.error_message = None;
    }

    /// Load the sample high-risk patient.
    pub fn load_sample_data(&mut self) {
        self.load_record(&PatientRecord::sample());
    }

    /// Restore the form defaults.
    pub fn reset(&mut self) {
        self.load_record(&PatientRecord::default());
        self.selected_field = 0;
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Step the selected choice field forward or back, wrapping around.
    pub fn cycle_choice(&mut self, forward: bool) {
        if let FieldInput::Choice { options, selected } =
            &mut self.fields[self.selected_field].input
        {
            let n = options.len();
            *selected = if forward {
                (*selected + 1) % n
            } else {
                (*selected + n - 1) % n
            };
            self.error_message = None;
        }
    }

    /// Add a character to the current numeric field
    pub fn input_char(&mut self, c: char) {
        if let FieldInput::Numeric { value, .. } = &mut self.fields[self.selected_field].input {
            if c.is_ascii_digit() || c == '.' {
                value.push(c);
                self.error_message = None;
            }
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        if let FieldInput::Numeric { value, .. } = &mut self.fields[self.selected_field].input {
            value.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        if let FieldInput::Numeric { value, .. } = &mut self.fields[self.selected_field].input {
            value.clear();
        }
    }

    /// Validate and convert to a `PatientRecord`.
    ///
    /// # Errors
    /// Returns a message naming the first invalid field.
    pub fn to_patient_record(&self) -> Result<PatientRecord, String> {
        let f = &self.fields;
        let coded = |i: usize| f[i].code();
        let err = |e: crate::domain::UnknownCode| e.to_string();

        Ok(PatientRecord {
            age: f[AGE].number()?,
            sex: Sex::try_from(coded(SEX)?).map_err(err)?,
            cp: ChestPain::try_from(coded(CP)?).map_err(err)?,
            trestbps: f[TRESTBPS].number()?,
            chol: f[CHOL].number()?,
            fbs: YesNo::try_from(coded(FBS)?).map_err(err)?,
            restecg: RestingEcg::try_from(coded(RESTECG)?).map_err(err)?,
            thalach: f[THALACH].number()?,
            exang: YesNo::try_from(coded(EXANG)?).map_err(err)?,
            oldpeak: f[OLDPEAK].number()?,
            slope: StSlope::try_from(coded(SLOPE)?).map_err(err)?,
            ca: coded(CA)?,
            thal: Thalassemia::try_from(coded(THAL)?).map_err(err)?,
        })
    }
}

/// Render the patient data input form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Patient Data Entry", MedicalTheme::title()),
        Span::styled(" │ Clinical Attributes", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = (state.fields.len() + 1) / 2;

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let shown = field.display();
        let mut spans = vec![Span::raw(" ")];
        if shown.is_empty() {
            spans.push(Span::styled(field.hint, MedicalTheme::text_muted()));
        } else {
            spans.push(Span::styled(shown, MedicalTheme::text()));
        }
        if is_selected && matches!(field.input, FieldInput::Numeric { .. }) {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        key_hints(&[
            ("↑↓", "Navigate"),
            ("←→", "Change"),
            ("Enter", "Predict"),
            ("S", "Sample"),
            ("R", "Reset"),
            ("Esc", "Cancel"),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_value(state: &mut PatientFormState, index: usize, text: &str) {
        state.selected_field = index;
        state.clear_field();
        for c in text.chars() {
            state.input_char(c);
        }
    }

    #[test]
    fn test_default_form_yields_default_record() {
        let state = PatientFormState::default();
        assert_eq!(state.fields.len(), 13);
        assert_eq!(
            state.to_patient_record().expect("valid"),
            PatientRecord::default()
        );
    }

    #[test]
    fn test_sample_round_trips_through_form() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        assert_eq!(
            state.to_patient_record().expect("valid"),
            PatientRecord::sample()
        );

        state.reset();
        assert_eq!(
            state.to_patient_record().expect("valid"),
            PatientRecord::default()
        );
    }

    #[test]
    fn test_age_bounds_are_enforced() {
        let mut state = PatientFormState::default();

        set_value(&mut state, AGE, "19");
        assert_eq!(
            state.to_patient_record().expect_err("too young"),
            "Age: Value must be between 20 and 100"
        );

        set_value(&mut state, AGE, "101");
        assert!(state.to_patient_record().is_err());

        set_value(&mut state, AGE, "20");
        assert_eq!(state.to_patient_record().expect("ok").age, 20.0);

        set_value(&mut state, AGE, "100");
        assert_eq!(state.to_patient_record().expect("ok").age, 100.0);
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let mut state = PatientFormState::default();
        set_value(&mut state, CHOL, "2..5");
        assert_eq!(
            state.to_patient_record().expect_err("invalid"),
            "Cholesterol: Invalid number"
        );
    }

    #[test]
    fn test_st_depression_uses_tenths() {
        let mut state = PatientFormState::default();

        set_value(&mut state, OLDPEAK, "2.35");
        assert_eq!(
            state.to_patient_record().expect_err("off step"),
            "ST Depression: Value must be a multiple of 0.1"
        );

        set_value(&mut state, OLDPEAK, "2.3");
        assert_eq!(state.to_patient_record().expect("ok").oldpeak, 2.3);

        set_value(&mut state, OLDPEAK, "0.0");
        assert_eq!(state.to_patient_record().expect("ok").oldpeak, 0.0);
    }

    #[test]
    fn test_choice_fields_cycle_and_wrap() {
        let mut state = PatientFormState::default();
        state.selected_field = CP;

        state.cycle_choice(true);
        assert_eq!(
            state.to_patient_record().expect("ok").cp,
            ChestPain::AtypicalAngina
        );

        state.cycle_choice(false);
        state.cycle_choice(false);
        assert_eq!(
            state.to_patient_record().expect("ok").cp,
            ChestPain::Asymptomatic
        );
    }

    #[test]
    fn test_letters_are_ignored_in_numeric_fields() {
        let mut state = PatientFormState::default();
        set_value(&mut state, AGE, "6a3");
        assert_eq!(state.to_patient_record().expect("ok").age, 63.0);
    }

    #[test]
    fn test_cycling_a_numeric_field_does_nothing() {
        let mut state = PatientFormState::default();
        state.selected_field = AGE;
        let before = state.clone();
        state.cycle_choice(true);
        assert_eq!(state, before);
    }
}
