//! Form state and inline validation.
//!
//! Validators write into a single shared [`ErrorBanner`]: every call
//! overwrites whatever the previous call left there, so the banner always
//! describes the last field that was checked. Field-level failures are
//! tracked as error markers on the [`Form`] and are what submission checks.

pub mod dates;
pub mod pattern;
pub mod sample;

use std::collections::HashSet;

use time::Date;

use crate::utils;

pub const START_DATE: &str = "startDate";
pub const END_DATE: &str = "endDate";
pub const MIN_PARTICIPANTS: &str = "minParticipants";
pub const MIN_STARS: &str = "minStars";
pub const NUM_REPOS: &str = "numRepos";
pub const ANTECEDENT: &str = "antecedent";
pub const ANTECEDENT_MAX: &str = "antecedent_max";
pub const CONSEQUENT: &str = "consequent";
pub const CONSEQUENT_MAX: &str = "consequent_max";
pub const MINSUP: &str = "minsup";
pub const MINCONF: &str = "minconf";
pub const LIFT: &str = "lift";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorBanner {
    text: String,
    visible: bool,
}

impl ErrorBanner {
    pub fn set(&mut self, message: impl Into<String>) {
        self.text = message.into();
        self.visible = true;
    }

    /// Re-shows the last message without touching it.
    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn message(&self) -> Option<&str> {
        if self.visible {
            Some(self.text.as_str())
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NumberField {
    pub id: String,
    pub label: String,
    pub value: String,
    pub min: f64,
    pub max: f64,
}

impl NumberField {
    pub fn new(id: &str, label: &str, min: f64, max: f64) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            value: String::new(),
            min,
            max,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn parsed(&self) -> Option<f64> {
        utils::parse_number(&self.value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DateField {
    pub id: String,
    pub value: String,
    pub max: Option<Date>,
}

impl DateField {
    pub fn new(id: &str, value: impl Into<String>, max: Option<Date>) -> Self {
        Self {
            id: id.to_string(),
            value: value.into(),
            max,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Form {
    numbers: Vec<NumberField>,
    dates: Vec<DateField>,
    marked: HashSet<String>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_number(&mut self, field: NumberField) {
        self.numbers.retain(|f| f.id != field.id);
        self.numbers.push(field);
    }

    pub fn add_date(&mut self, field: DateField) {
        self.dates.retain(|f| f.id != field.id);
        self.dates.push(field);
    }

    pub fn number(&self, id: &str) -> Option<&NumberField> {
        self.numbers.iter().find(|f| f.id == id)
    }

    pub fn number_mut(&mut self, id: &str) -> Option<&mut NumberField> {
        self.numbers.iter_mut().find(|f| f.id == id)
    }

    pub fn numbers(&self) -> &[NumberField] {
        &self.numbers
    }

    pub fn date(&self, id: &str) -> Option<&DateField> {
        self.dates.iter().find(|f| f.id == id)
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        self.number(id)
            .map(|f| f.value.as_str())
            .or_else(|| self.date(id).map(|f| f.value.as_str()))
    }

    /// Replaces the raw value of a number or date field. Returns `false` for
    /// unknown ids.
    pub fn set_value(&mut self, id: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        if let Some(field) = self.numbers.iter_mut().find(|f| f.id == id) {
            field.value = value;
            return true;
        }
        if let Some(field) = self.dates.iter_mut().find(|f| f.id == id) {
            field.value = value;
            return true;
        }
        false
    }

    pub fn mark(&mut self, id: &str) {
        self.marked.insert(id.to_string());
    }

    pub fn clear_mark(&mut self, id: &str) {
        self.marked.remove(id);
    }

    pub fn is_marked(&self, id: &str) -> bool {
        self.marked.contains(id)
    }

    pub fn has_errors(&self) -> bool {
        !self.marked.is_empty()
    }

    pub fn marked_ids(&self) -> Vec<String> {
        let mut out: Vec<String> = self.marked.iter().cloned().collect();
        out.sort();
        out
    }

    /// Checks the start/end date pair. On an ordering violation the field
    /// named by `changed_id` gets the marker, not a fixed one.
    pub fn validate_date_range(&mut self, changed_id: &str, banner: &mut ErrorBanner) -> bool {
        let (start, end) = match (self.date(START_DATE), self.date(END_DATE)) {
            (Some(start), Some(end)) => (start.clone(), end.clone()),
            _ => {
                tracing::error!("date fields {START_DATE}/{END_DATE} not found");
                return false;
            }
        };
        self.clear_mark(START_DATE);
        self.clear_mark(END_DATE);

        let Some(start_date) = dates::parse_iso_date(&start.value) else {
            self.mark(START_DATE);
            banner.set("Начальная дата некорректна");
            return false;
        };
        let Some(end_date) = dates::parse_iso_date(&end.value) else {
            self.mark(END_DATE);
            banner.set("Конечная дата некорректна");
            return false;
        };

        if start.max.is_some_and(|max| start_date > max) {
            self.mark(START_DATE);
            banner.set("Начальная дата не может быть позже текущей даты");
            return false;
        }
        if end.max.is_some_and(|max| end_date > max) {
            self.mark(END_DATE);
            banner.set("Конечная дата не может быть позже текущей даты");
            return false;
        }

        if start_date > end_date {
            self.mark(changed_id);
            banner.set("Начальная дата не может быть позже конечной даты");
            return false;
        }

        banner.hide();
        true
    }

    pub fn validate_number_field(
        &mut self,
        id: &str,
        allow_float: bool,
        banner: &mut ErrorBanner,
    ) -> bool {
        let Some(field) = self.number(id).cloned() else {
            tracing::error!("label for {id} not found");
            return false;
        };

        let raw = field.value.trim();
        let label = field.label.as_str();
        let problem = if raw.is_empty() {
            Some(format!("{label} не может быть пустым"))
        } else {
            match utils::parse_number(raw) {
                None => Some(format!(
                    "{label} должно быть числом. Текущее значение: {raw}"
                )),
                Some(v) if v < field.min || v > field.max => Some(format!(
                    "{label} должно быть в промежутке от {} до {}. Текущее значение: {}",
                    utils::format_number(field.min),
                    utils::format_number(field.max),
                    utils::format_number(v)
                )),
                Some(v) if !allow_float && v.fract() != 0.0 => Some(format!(
                    "{label} должно быть целым числом. Текущее значение: {}",
                    utils::format_number(v)
                )),
                Some(_) => None,
            }
        };

        match problem {
            Some(message) => {
                self.mark(id);
                banner.set(message);
                false
            }
            None => {
                self.clear_mark(id);
                banner.hide();
                true
            }
        }
    }
}
