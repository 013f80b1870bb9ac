use crate::client::Backend;
use crate::form::sample::SampleForm;

use super::{Page, SubmitOutcome, LOADING_TEXT, SAVED_TEXT};

pub const MIN_ITEMS: usize = 3;
pub const TOO_FEW_ITEMS: &str = "Выберите минимум 3 элемента транзакции";

/// Drives the sample creation page.
#[derive(Clone, Debug)]
pub struct SampleController {
    pub form: SampleForm,
}

impl SampleController {
    pub fn new(form: SampleForm) -> Self {
        Self { form }
    }

    pub async fn submit(&mut self, page: &mut Page, backend: &impl Backend) -> SubmitOutcome {
        page.banner.hide();
        self.form.validate(&mut page.banner);
        if self.form.form.has_errors() {
            tracing::debug!(fields = ?self.form.form.marked_ids(), "sample form invalid");
            page.banner.show();
            return SubmitOutcome::Invalid;
        }

        if self.form.selections().len() < MIN_ITEMS {
            page.banner.set(TOO_FEW_ITEMS);
            return SubmitOutcome::Invalid;
        }

        let state = match self.form.state() {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %e, "could not build sample request");
                page.banner.show();
                return SubmitOutcome::Invalid;
            }
        };

        page.loading.show(LOADING_TEXT);
        let outcome = match backend.load_data_submit(&state).await {
            Ok(()) => {
                page.banner.hide();
                page.notification.show(SAVED_TEXT);
                SubmitOutcome::Completed
            }
            Err(e) => {
                tracing::error!(error = %e, "sample creation failed");
                page.banner.set(e.banner_message());
                SubmitOutcome::Rejected(e.banner_message().to_string())
            }
        };
        page.loading.hide();
        outcome
    }
}
