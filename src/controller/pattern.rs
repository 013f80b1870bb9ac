use crate::client::Backend;
use crate::form::pattern::PatternForm;
use crate::form::{ANTECEDENT, ANTECEDENT_MAX, CONSEQUENT, CONSEQUENT_MAX};

use super::{Page, SubmitOutcome, LOADING_TEXT};

pub const MIN_ABOVE_MAX: &str = "Минимальное значение не может быть больше максимального";
pub const NO_DATASETS: &str = "Выберите минимум один набор данных";

/// Drives the pattern search page.
#[derive(Clone, Debug)]
pub struct PatternController {
    pub form: PatternForm,
}

impl PatternController {
    pub fn new(form: PatternForm) -> Self {
        Self { form }
    }

    /// Checks one min/max pair. On violation the min field is marked.
    fn check_bounds(&mut self, page: &mut Page, min_id: &str, max_id: &str) -> bool {
        let min = self.form.parsed(min_id).unwrap_or(0.0);
        let max = self.form.parsed(max_id).unwrap_or(0.0);
        if min > max {
            page.banner.set(MIN_ABOVE_MAX);
            self.form.form.mark(min_id);
            return false;
        }
        self.form.form.clear_mark(min_id);
        true
    }

    pub async fn submit(&mut self, page: &mut Page, backend: &impl Backend) -> SubmitOutcome {
        page.banner.hide();
        page.patterns.hide_results();

        self.form.validate(&mut page.banner);
        if self.form.form.has_errors() {
            tracing::debug!(fields = ?self.form.form.marked_ids(), "pattern form invalid");
            page.banner.show();
            return SubmitOutcome::Invalid;
        }

        if !self.check_bounds(page, ANTECEDENT, ANTECEDENT_MAX) {
            return SubmitOutcome::Invalid;
        }
        if !self.check_bounds(page, CONSEQUENT, CONSEQUENT_MAX) {
            return SubmitOutcome::Invalid;
        }

        if page.selection.is_empty() {
            page.banner.set(NO_DATASETS);
            return SubmitOutcome::Invalid;
        }

        let query = match self.form.query(page.selection.ids()) {
            Ok(query) => query,
            Err(e) => {
                tracing::error!(error = %e, "could not build pattern query");
                page.banner.show();
                return SubmitOutcome::Invalid;
            }
        };

        page.loading.show(LOADING_TEXT);
        let outcome = match backend.find_patterns_submit(&query).await {
            Ok(response) => {
                page.banner.hide();
                page.patterns.show_response(response);
                SubmitOutcome::Completed
            }
            Err(e) => {
                tracing::error!(error = %e, "pattern search failed");
                page.banner.set(e.banner_message());
                SubmitOutcome::Rejected(e.banner_message().to_string())
            }
        };
        page.loading.hide();
        outcome
    }
}
