use crate::client::PatternsResponse;
use crate::table::{ResultTable, PATTERN_HEADERS};
use crate::utils;

pub const ICON_EXPANDED: &str = "▼";
pub const ICON_COLLAPSED: &str = "⯈";
pub const TEXT_EXPANDED: &str = "Скрыть таблицу квартилей и децилей";
pub const TEXT_COLLAPSED: &str = "Показать таблицу квартилей и децилей";

/// The two filter inputs above the patterns table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterSlot {
    Antecedent,
    Consequent,
}

impl FilterSlot {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "antecedent" | "antecedents" | "a" | "0" => Some(Self::Antecedent),
            "consequent" | "consequents" | "c" | "1" => Some(Self::Consequent),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Antecedent => 0,
            Self::Consequent => 1,
        }
    }
}

/// Result area of the pattern search page.
#[derive(Clone, Debug)]
pub struct PatternsView {
    filters: [String; 2],
    patterns: ResultTable,
    quartiles: ResultTable,
    deciles: ResultTable,
    title: Option<String>,
    results_visible: bool,
    quantiles_visible: bool,
    quantiles_expanded: bool,
}

impl Default for PatternsView {
    fn default() -> Self {
        Self {
            filters: [String::new(), String::new()],
            patterns: ResultTable::with_header(&PATTERN_HEADERS),
            quartiles: ResultTable::new(),
            deciles: ResultTable::new(),
            title: None,
            results_visible: false,
            quantiles_visible: false,
            quantiles_expanded: false,
        }
    }
}

pub fn result_title(count: usize) -> String {
    format!("Найдено {count} {}:", utils::pattern_word_ending(count))
}

impl PatternsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hides filter inputs, tables, title and the export/toggle buttons.
    /// Table contents stay as they are.
    pub fn hide_results(&mut self) {
        self.results_visible = false;
        self.quantiles_visible = false;
    }

    pub fn show_response(&mut self, response: PatternsResponse) {
        self.results_visible = true;

        self.patterns.clear_body();
        if let Some(patterns) = response.patterns.as_ref() {
            self.title = Some(result_title(patterns.len()));
            self.patterns.render_patterns(patterns);
        }

        // Missing or empty quantile arrays leave the previous table as it was.
        if let Some(rows) = response.quartiles.as_ref().filter(|r| !r.is_empty()) {
            self.quartiles.render(rows);
        }
        if let Some(rows) = response.deciles.as_ref().filter(|r| !r.is_empty()) {
            self.deciles.render(rows);
        }

        self.quantiles_visible = true;
        self.apply_filters();
    }

    pub fn filter(&self, slot: FilterSlot) -> &str {
        &self.filters[slot.index()]
    }

    /// Updates one filter input and recomputes visibility. Returns the
    /// number of visible pattern rows.
    pub fn set_filter(&mut self, slot: FilterSlot, text: &str) -> usize {
        self.filters[slot.index()] = text.to_string();
        self.apply_filters()
    }

    pub fn apply_filters(&mut self) -> usize {
        let filters = [self.filters[0].as_str(), self.filters[1].as_str()];
        self.patterns.apply_filters(&filters)
    }

    /// Resolves a patterns column by backend field name, header text or
    /// index.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let lowered = name.trim().to_lowercase();
        let by_field = match lowered.as_str() {
            "antecedent" | "antecedents" => Some(0),
            "consequent" | "consequents" => Some(1),
            "support" => Some(2),
            "confidence" => Some(3),
            "lift" => Some(4),
            _ => None,
        };
        by_field.or_else(|| self.patterns.column_index(name))
    }

    pub fn sort(&mut self, col: usize, ascending: bool) -> bool {
        self.patterns.sort_by_column(col, ascending)
    }

    /// Flips the quantile tables between shown and hidden.
    pub fn toggle_quantiles(&mut self) -> bool {
        self.quantiles_expanded = !self.quantiles_expanded;
        self.quantiles_expanded
    }

    pub fn toggle_icon(&self) -> &'static str {
        if self.quantiles_expanded {
            ICON_EXPANDED
        } else {
            ICON_COLLAPSED
        }
    }

    pub fn toggle_text(&self) -> &'static str {
        if self.quantiles_expanded {
            TEXT_EXPANDED
        } else {
            TEXT_COLLAPSED
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn patterns(&self) -> &ResultTable {
        &self.patterns
    }

    pub fn quartiles(&self) -> &ResultTable {
        &self.quartiles
    }

    pub fn deciles(&self) -> &ResultTable {
        &self.deciles
    }

    pub fn is_results_visible(&self) -> bool {
        self.results_visible
    }

    pub fn is_quantiles_visible(&self) -> bool {
        self.quantiles_visible
    }

    pub fn is_quantiles_expanded(&self) -> bool {
        self.quantiles_expanded
    }
}
