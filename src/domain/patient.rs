//! Patient record types for heart-disease risk prediction.
//!
//! Based on the UCI Cleveland heart-disease attributes.

use serde::{Deserialize, Serialize};

/// Inclusive bounds and form default for a numeric clinical field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    /// Input granularity, if the field is not free-form.
    pub step: Option<f64>,
}

impl NumericRange {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Whether `value` is a whole number of steps from zero.
    #[must_use]
    pub fn on_step(&self, value: f64) -> bool {
        self.step.map_or(true, |step| {
            let steps = value / step;
            (steps - steps.round()).abs() < 1e-6
        })
    }
}

/// Age in years.
pub const AGE_RANGE: NumericRange = NumericRange {
    min: 20.0,
    max: 100.0,
    default: 50.0,
    step: None,
};
/// Resting blood pressure in mm Hg.
pub const TRESTBPS_RANGE: NumericRange = NumericRange {
    min: 90.0,
    max: 200.0,
    default: 120.0,
    step: None,
};
/// Serum cholesterol in mg/dl.
pub const CHOL_RANGE: NumericRange = NumericRange {
    min: 50.0,
    max: 700.0,
    default: 240.0,
    step: None,
};
/// Maximum heart rate achieved.
pub const THALACH_RANGE: NumericRange = NumericRange {
    min: 50.0,
    max: 250.0,
    default: 150.0,
    step: None,
};
/// ST depression induced by exercise relative to rest.
pub const OLDPEAK_RANGE: NumericRange = NumericRange {
    min: 0.0,
    max: 10.0,
    default: 1.0,
    step: Some(0.1),
};

/// Highest number of major vessels colored by fluoroscopy.
pub const MAX_CA: u8 = 3;

/// Error returned when a raw integer code has no matching category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: unknown code {code}")]
pub struct UnknownCode {
    pub field: &'static str,
    pub code: u8,
}

/// Declares a coded categorical field: typed variants, their raw codes and
/// display labels, plus the conversions to and from the raw code.
macro_rules! coded_field {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident = $code:literal => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every category, in form display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Raw integer code used by the dataset and the classifier.
            #[must_use]
            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            /// Human-readable label shown in the form.
            #[must_use]
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = UnknownCode;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(UnknownCode { field: $field, code }),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.code()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

coded_field! {
    /// Biological sex (sex).
    Sex, "sex" {
        Female = 0 => "Female",
        Male = 1 => "Male",
    }
}

coded_field! {
    /// Yes/no answer for binary clinical questions (fbs, exang).
    YesNo, "yes/no" {
        No = 0 => "No",
        Yes = 1 => "Yes",
    }
}

coded_field! {
    /// Chest pain type (cp). Baseline: typical angina.
    ChestPain, "cp" {
        TypicalAngina = 1 => "Typical Angina",
        AtypicalAngina = 2 => "Atypical Angina",
        NonAnginal = 3 => "Non-anginal",
        Asymptomatic = 4 => "Asymptomatic",
    }
}

coded_field! {
    /// Resting electrocardiographic result (restecg). Baseline: normal.
    RestingEcg, "restecg" {
        Normal = 0 => "Normal",
        StTAbnormality = 1 => "ST-T Abnormality",
        LvHypertrophy = 2 => "LV Hypertrophy",
    }
}

coded_field! {
    /// Slope of the peak exercise ST segment (slope).
    StSlope, "slope" {
        Upsloping = 1 => "Upsloping",
        Flat = 2 => "Flat",
        Downsloping = 3 => "Downsloping",
    }
}

coded_field! {
    /// Thalassemia category (thal). Baseline: normal.
    Thalassemia, "thal" {
        Normal = 3 => "Normal",
        FixedDefect = 6 => "Fixed Defect",
        ReversibleDefect = 7 => "Reversible Defect",
    }
}

/// Raw clinical attributes for one patient, as collected by the form.
///
/// Built fresh for every submission and never persisted. Numeric ranges are
/// enforced by the input layer; see [`PatientRecord::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years
    pub age: f64,
    pub sex: Sex,
    /// Chest pain type
    pub cp: ChestPain,
    /// Resting blood pressure (mm Hg)
    pub trestbps: f64,
    /// Serum cholesterol (mg/dl)
    pub chol: f64,
    /// Fasting blood sugar > 120 mg/dl
    pub fbs: YesNo,
    /// Resting ECG result
    pub restecg: RestingEcg,
    /// Maximum heart rate achieved
    pub thalach: f64,
    /// Exercise induced angina
    pub exang: YesNo,
    /// ST depression induced by exercise
    pub oldpeak: f64,
    pub slope: StSlope,
    /// Major vessels colored by fluoroscopy (0-3)
    pub ca: u8,
    pub thal: Thalassemia,
}

impl Default for PatientRecord {
    /// The form's initial values.
    fn default() -> Self {
        Self {
            age: AGE_RANGE.default,
            sex: Sex::Female,
            cp: ChestPain::TypicalAngina,
            trestbps: TRESTBPS_RANGE.default,
            chol: CHOL_RANGE.default,
            fbs: YesNo::No,
            restecg: RestingEcg::Normal,
            thalach: THALACH_RANGE.default,
            exang: YesNo::No,
            oldpeak: OLDPEAK_RANGE.default,
            slope: StSlope::Upsloping,
            ca: 0,
            thal: Thalassemia::Normal,
        }
    }
}

impl PatientRecord {
    /// A typical high-risk presentation, used as the form's sample data.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            age: 63.0,
            sex: Sex::Male,
            cp: ChestPain::Asymptomatic,
            trestbps: 145.0,
            chol: 233.0,
            fbs: YesNo::Yes,
            restecg: RestingEcg::LvHypertrophy,
            thalach: 150.0,
            exang: YesNo::No,
            oldpeak: 2.3,
            slope: StSlope::Downsloping,
            ca: 0,
            thal: Thalassemia::FixedDefect,
        }
    }

    /// Validate that all numeric fields are within their declared ranges.
    ///
    /// # Errors
    /// Returns every violation found, one message per field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let checks = [
            ("Age", self.age, AGE_RANGE),
            ("Resting BP", self.trestbps, TRESTBPS_RANGE),
            ("Cholesterol", self.chol, CHOL_RANGE),
            ("Max heart rate", self.thalach, THALACH_RANGE),
            ("ST depression", self.oldpeak, OLDPEAK_RANGE),
        ];

        let mut errors: Vec<String> = checks
            .iter()
            .filter(|(_, value, range)| !range.contains(*value))
            .map(|(label, value, range)| {
                format!("{label} {value} out of range [{}, {}]", range.min, range.max)
            })
            .collect();

        if self.ca > MAX_CA {
            errors.push(format!("Major vessels {} out of range [0, {MAX_CA}]", self.ca));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_is_valid() {
        assert!(PatientRecord::default().validate().is_ok());
        assert!(PatientRecord::sample().validate().is_ok());
    }

    #[test]
    fn test_age_boundaries() {
        for age in [20.0, 100.0] {
            let record = PatientRecord { age, ..PatientRecord::default() };
            assert!(record.validate().is_ok(), "age {age} should be accepted");
        }
        for age in [19.0, 101.0] {
            let record = PatientRecord { age, ..PatientRecord::default() };
            assert!(record.validate().is_err(), "age {age} should be rejected");
        }
    }

    #[test]
    fn test_validation_reports_every_field() {
        let record = PatientRecord {
            trestbps: 80.0,
            oldpeak: 12.0,
            ca: 4,
            ..PatientRecord::default()
        };
        let errors = record.validate().expect_err("should be invalid");
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("Resting BP"));
    }

    #[test]
    fn test_codes_roundtrip_through_u8() {
        for cp in ChestPain::ALL {
            assert_eq!(ChestPain::try_from(cp.code()), Ok(*cp));
        }
        for thal in Thalassemia::ALL {
            assert_eq!(Thalassemia::try_from(u8::from(*thal)), Ok(*thal));
        }
        assert_eq!(
            Thalassemia::try_from(5),
            Err(UnknownCode { field: "thal", code: 5 })
        );
        assert!(RestingEcg::try_from(3).is_err());
    }

    #[test]
    fn test_serde_uses_raw_codes() {
        let json = serde_json::to_value(PatientRecord::sample()).expect("serialize");
        assert_eq!(json["cp"], 4);
        assert_eq!(json["thal"], 6);
        assert_eq!(json["sex"], 1);

        let mut bad = json.clone();
        bad["restecg"] = serde_json::json!(9);
        assert!(serde_json::from_value::<PatientRecord>(bad).is_err());
    }
}
