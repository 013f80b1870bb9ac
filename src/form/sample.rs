use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use time::Date;

use super::dates;
use super::{DateField, ErrorBanner, Form, NumberField};
use super::{END_DATE, MIN_PARTICIPANTS, MIN_STARS, NUM_REPOS, START_DATE};

/// How a numeric transaction item is bucketed by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivisionType {
    #[serde(rename = "dec", alias = "deciles")]
    Deciles,
    #[serde(rename = "qua", alias = "quartiles")]
    Quartiles,
}

impl DivisionType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "dec" | "deciles" | "децили" => Some(Self::Deciles),
            "qua" | "quartiles" | "квартили" => Some(Self::Quartiles),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Deciles => "dec",
            Self::Quartiles => "qua",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Deciles => "Децили",
            Self::Quartiles => "Квартили",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Deciles => Self::Quartiles,
            Self::Quartiles => Self::Deciles,
        }
    }
}

/// One row of the transaction-item table on the creation page. Categorical
/// items have no division.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionItem {
    pub label: String,
    #[serde(default)]
    pub division: Option<DivisionType>,
    #[serde(default)]
    pub checked: bool,
}

impl TransactionItem {
    pub fn numeric(label: &str, division: DivisionType) -> Self {
        Self {
            label: label.to_string(),
            division: Some(division),
            checked: false,
        }
    }

    pub fn categorical(label: &str) -> Self {
        Self {
            label: label.to_string(),
            division: None,
            checked: false,
        }
    }

    pub fn toggle_division(&mut self) {
        if let Some(division) = self.division {
            self.division = Some(division.toggled());
        }
    }
}

pub fn default_items() -> Vec<TransactionItem> {
    let mut items: Vec<TransactionItem> = [
        "pushes",
        "avg_push_size",
        "pull_requests",
        "merged_pull_requests_ratio",
        "issues",
        "closed_issues_ratio",
        "watches",
        "forks",
        "new_members",
    ]
    .iter()
    .map(|label| TransactionItem::numeric(label, DivisionType::Quartiles))
    .collect();
    items.extend(
        ["language", "license_name", "is_deleted_or_private"]
            .iter()
            .map(|label| TransactionItem::categorical(label)),
    );
    items
}

/// Checked items keyed by label, in table order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemSelections(Vec<(String, Option<DivisionType>)>);

impl ItemSelections {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<Option<DivisionType>> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, d)| *d)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(l, _)| l.as_str())
    }
}

impl Serialize for ItemSelections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, division) in self.0.iter() {
            map.serialize_entry(label, &division.map(DivisionType::tag))?;
        }
        map.end()
    }
}

/// Request body of `POST /load-data-submit`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub start_date: String,
    pub end_date: String,
    pub min_participants: u64,
    pub min_stars: u64,
    pub num_repos: u64,
    pub is_new_repos: bool,
    pub items: ItemSelections,
    pub note: String,
}

pub fn default_sample_fields() -> Vec<NumberField> {
    vec![
        NumberField::new(
            MIN_PARTICIPANTS,
            "Минимальное количество участников",
            0.0,
            1000.0,
        )
        .with_value("2"),
        NumberField::new(MIN_STARS, "Минимальное количество звёзд", 0.0, 100000.0)
            .with_value("10"),
        NumberField::new(NUM_REPOS, "Количество репозиториев", 1.0, 10000.0).with_value("1000"),
    ]
}

#[derive(Clone, Debug)]
pub struct SampleForm {
    pub form: Form,
    pub is_new_repos: bool,
    pub note: String,
    items: Vec<TransactionItem>,
}

impl SampleForm {
    /// Date window defaults to the last three months with `today` as the
    /// latest selectable date.
    pub fn new(today: Date, fields: Vec<NumberField>, items: Vec<TransactionItem>) -> Self {
        let (start, end) = dates::default_date_range(today);
        let mut form = Form::new();
        form.add_date(DateField::new(
            START_DATE,
            dates::format_iso_date(start),
            Some(today),
        ));
        form.add_date(DateField::new(
            END_DATE,
            dates::format_iso_date(end),
            Some(today),
        ));
        for field in fields {
            form.add_number(field);
        }
        Self {
            form,
            is_new_repos: false,
            note: String::new(),
            items,
        }
    }

    pub fn with_defaults(today: Date) -> Self {
        Self::new(today, default_sample_fields(), default_items())
    }

    pub fn items(&self) -> &[TransactionItem] {
        &self.items
    }

    /// Checks or unchecks an item row. Returns `false` for unknown labels.
    pub fn set_item_checked(&mut self, label: &str, checked: bool) -> bool {
        match self.items.iter_mut().find(|i| i.label == label) {
            Some(item) => {
                item.checked = checked;
                true
            }
            None => false,
        }
    }

    pub fn toggle_division(&mut self, label: &str) -> bool {
        match self.items.iter_mut().find(|i| i.label == label) {
            Some(item) => {
                item.toggle_division();
                true
            }
            None => false,
        }
    }

    pub fn set_division(&mut self, label: &str, division: DivisionType) -> bool {
        match self.items.iter_mut().find(|i| i.label == label) {
            Some(item) if item.division.is_some() => {
                item.division = Some(division);
                true
            }
            _ => false,
        }
    }

    pub fn selections(&self) -> ItemSelections {
        ItemSelections(
            self.items
                .iter()
                .filter(|i| i.checked)
                .map(|i| (i.label.clone(), i.division))
                .collect(),
        )
    }

    /// Runs every field validator in page order: both date checks, then the
    /// three integer fields.
    pub fn validate(&mut self, banner: &mut ErrorBanner) {
        self.form.validate_date_range(START_DATE, banner);
        self.form.validate_date_range(END_DATE, banner);
        self.form.validate_number_field(MIN_PARTICIPANTS, false, banner);
        self.form.validate_number_field(MIN_STARS, false, banner);
        self.form.validate_number_field(NUM_REPOS, false, banner);
    }

    /// Builds the request body from the current field values. Expects the
    /// fields to have passed validation.
    pub fn state(&self) -> Result<FormState, String> {
        let integer = |id: &str| -> Result<u64, String> {
            self.form
                .number(id)
                .and_then(NumberField::parsed)
                .filter(|v| *v >= 0.0 && v.fract() == 0.0)
                .map(|v| v as u64)
                .ok_or_else(|| format!("field {id} does not hold a non-negative integer"))
        };
        Ok(FormState {
            start_date: self.form.value(START_DATE).unwrap_or_default().trim().to_string(),
            end_date: self.form.value(END_DATE).unwrap_or_default().trim().to_string(),
            min_participants: integer(MIN_PARTICIPANTS)?,
            min_stars: integer(MIN_STARS)?,
            num_repos: integer(NUM_REPOS)?,
            is_new_repos: self.is_new_repos,
            items: self.selections(),
            note: self.note.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn new_form_defaults_to_three_month_window() {
        let form = SampleForm::with_defaults(date!(2026 - 10 - 19));
        assert_eq!(form.form.value(START_DATE), Some("2026-07-19"));
        assert_eq!(form.form.value(END_DATE), Some("2026-10-19"));
        assert_eq!(
            form.form.date(END_DATE).and_then(|f| f.max),
            Some(date!(2026 - 10 - 19))
        );
    }

    #[test]
    fn division_toggle_skips_categorical_items() {
        let mut form = SampleForm::with_defaults(date!(2026 - 10 - 19));
        assert!(form.toggle_division("forks"));
        assert!(form.toggle_division("language"));
        let forks = form.items().iter().find(|i| i.label == "forks").unwrap();
        let language = form.items().iter().find(|i| i.label == "language").unwrap();
        assert_eq!(forks.division, Some(DivisionType::Deciles));
        assert_eq!(language.division, None);
    }

    #[test]
    fn state_serializes_page_field_names() {
        let mut form = SampleForm::with_defaults(date!(2026 - 10 - 19));
        form.set_item_checked("forks", true);
        form.set_item_checked("pushes", true);
        form.set_item_checked("language", true);
        form.set_division("pushes", DivisionType::Deciles);
        form.note = "weekly".to_string();

        let json = serde_json::to_value(form.state().unwrap()).unwrap();
        assert_eq!(json["startDate"], "2026-07-19");
        assert_eq!(json["minParticipants"], 2);
        assert_eq!(json["numRepos"], 1000);
        assert_eq!(json["isNewRepos"], false);
        assert_eq!(json["items"]["pushes"], "dec");
        assert_eq!(json["items"]["forks"], "qua");
        assert!(json["items"]["language"].is_null());
        assert_eq!(json["note"], "weekly");
    }

    #[test]
    fn selections_follow_table_order() {
        let mut form = SampleForm::with_defaults(date!(2026 - 10 - 19));
        form.set_item_checked("forks", true);
        form.set_item_checked("pushes", true);
        let selections = form.selections();
        let labels: Vec<&str> = selections.labels().collect();
        assert_eq!(labels, vec!["pushes", "forks"]);
        assert_eq!(selections.get("forks"), Some(Some(DivisionType::Quartiles)));
        assert!(!form.set_item_checked("stargazers", true));
    }
}
