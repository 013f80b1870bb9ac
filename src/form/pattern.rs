use serde::{Deserialize, Serialize};

use super::{ErrorBanner, Form, NumberField};
use super::{ANTECEDENT, ANTECEDENT_MAX, CONSEQUENT, CONSEQUENT_MAX, LIFT, MINCONF, MINSUP};

/// Request body of `POST /find-patterns-submit`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternQuery {
    pub antecedent: u32,
    pub antecedent_max: u32,
    pub consequent: u32,
    pub consequent_max: u32,
    pub minsup: f64,
    pub minconf: f64,
    pub lift: f64,
    pub ids: Vec<String>,
}

pub fn default_pattern_fields() -> Vec<NumberField> {
    vec![
        NumberField::new(ANTECEDENT, "Минимальная длина антецедента", 1.0, 10.0).with_value("1"),
        NumberField::new(ANTECEDENT_MAX, "Максимальная длина антецедента", 1.0, 10.0)
            .with_value("3"),
        NumberField::new(CONSEQUENT, "Минимальная длина консеквента", 1.0, 10.0).with_value("1"),
        NumberField::new(CONSEQUENT_MAX, "Максимальная длина консеквента", 1.0, 10.0)
            .with_value("3"),
        NumberField::new(MINSUP, "Минимальная поддержка", 0.0, 1.0).with_value("0.1"),
        NumberField::new(MINCONF, "Минимальная достоверность", 0.0, 1.0).with_value("0.5"),
        NumberField::new(LIFT, "Минимальный лифт", 0.0, 100.0).with_value("1"),
    ]
}

#[derive(Clone, Debug)]
pub struct PatternForm {
    pub form: Form,
}

impl PatternForm {
    pub fn new(fields: Vec<NumberField>) -> Self {
        let mut form = Form::new();
        for field in fields {
            form.add_number(field);
        }
        Self { form }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_pattern_fields())
    }

    /// Four integer bounds, then the three float thresholds.
    pub fn validate(&mut self, banner: &mut ErrorBanner) {
        self.form.validate_number_field(ANTECEDENT, false, banner);
        self.form.validate_number_field(ANTECEDENT_MAX, false, banner);
        self.form.validate_number_field(CONSEQUENT, false, banner);
        self.form.validate_number_field(CONSEQUENT_MAX, false, banner);
        self.form.validate_number_field(MINSUP, true, banner);
        self.form.validate_number_field(MINCONF, true, banner);
        self.form.validate_number_field(LIFT, true, banner);
    }

    pub fn parsed(&self, id: &str) -> Option<f64> {
        self.form.number(id).and_then(NumberField::parsed)
    }

    pub fn query(&self, ids: &[String]) -> Result<PatternQuery, String> {
        let count = |id: &str| -> Result<u32, String> {
            self.parsed(id)
                .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= f64::from(u32::MAX))
                .map(|v| v as u32)
                .ok_or_else(|| format!("field {id} does not hold a non-negative integer"))
        };
        let threshold = |id: &str| -> Result<f64, String> {
            self.parsed(id)
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("field {id} does not hold a number"))
        };
        Ok(PatternQuery {
            antecedent: count(ANTECEDENT)?,
            antecedent_max: count(ANTECEDENT_MAX)?,
            consequent: count(CONSEQUENT)?,
            consequent_max: count(CONSEQUENT_MAX)?,
            minsup: threshold(MINSUP)?,
            minconf: threshold(MINCONF)?,
            lift: threshold(LIFT)?,
            ids: ids.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_uses_backend_field_names() {
        let form = PatternForm::with_defaults();
        let query = form.query(&["4".to_string(), "9".to_string()]).unwrap();
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["antecedent"], 1);
        assert_eq!(json["antecedent_max"], 3);
        assert_eq!(json["minsup"], 0.1);
        assert_eq!(json["ids"], serde_json::json!(["4", "9"]));
    }

    #[test]
    fn float_thresholds_accept_fractions_and_counts_do_not() {
        let mut banner = ErrorBanner::default();
        let mut form = PatternForm::with_defaults();
        form.form.set_value(MINSUP, "0.05");
        form.form.set_value(ANTECEDENT, "1.5");
        form.validate(&mut banner);
        assert!(form.form.is_marked(ANTECEDENT));
        assert!(!form.form.is_marked(MINSUP));
        assert!(form.query(&[]).is_err());
    }
}
