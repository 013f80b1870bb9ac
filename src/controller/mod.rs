//! Session state of the two pages and the submission flows that drive it.
//!
//! A [`Page`] owns every piece of UI state a handler may touch. Handlers get
//! it by `&mut` together with a [`Backend`] instead of looking anything up.

pub mod pattern;
pub mod sample;
pub mod view;

#[cfg(test)]
pub(crate) mod fake;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::client::Backend;
use crate::form::ErrorBanner;
use crate::selection::SelectedRows;

pub use pattern::PatternController;
pub use sample::SampleController;
pub use view::{FilterSlot, PatternsView};

pub const LOADING_TEXT: &str = "Загрузка...";
pub const SAVED_TEXT: &str = "Данные успешно сохранены";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blocked before any request; the banner says why.
    Invalid,
    /// The backend or transport failed; carries the banner text.
    Rejected(String),
    Completed,
}

/// Spinner shown while a request is outstanding.
#[derive(Debug)]
pub struct LoadingIndicator {
    draw: bool,
    bar: Option<ProgressBar>,
    visible: bool,
}

impl LoadingIndicator {
    /// Draws an animated spinner on stderr.
    pub fn terminal() -> Self {
        Self {
            draw: true,
            bar: None,
            visible: false,
        }
    }

    /// Tracks visibility only.
    pub fn hidden() -> Self {
        Self {
            draw: false,
            bar: None,
            visible: false,
        }
    }

    pub fn show(&mut self, message: &str) {
        self.visible = true;
        if !self.draw || self.bar.is_some() {
            return;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        let style = ProgressStyle::with_template(":: {spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        self.bar = Some(pb);
    }

    pub fn hide(&mut self) {
        self.visible = false;
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Success slot of the sample creation page. Never hidden once shown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Notification {
    text: String,
    visible: bool,
}

impl Notification {
    pub fn show(&mut self, text: &str) {
        self.text = text.to_string();
        self.visible = true;
    }

    pub fn message(&self) -> Option<&str> {
        if self.visible {
            Some(self.text.as_str())
        } else {
            None
        }
    }
}

/// Saved samples listed on the search page, keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleList {
    ids: Vec<String>,
}

impl SampleList {
    pub fn new(ids: impl IntoIterator<Item = String>) -> Self {
        let mut list = Self::default();
        for id in ids {
            list.insert(&id);
        }
        list
    }

    pub fn insert(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push(id.to_string());
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        match self.ids.iter().position(|v| v == id) {
            Some(index) => {
                self.ids.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|v| v == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

#[derive(Debug)]
pub struct Page {
    pub banner: ErrorBanner,
    pub loading: LoadingIndicator,
    pub notification: Notification,
    pub selection: SelectedRows,
    pub samples: SampleList,
    pub patterns: PatternsView,
}

impl Page {
    pub fn new(loading: LoadingIndicator) -> Self {
        Self {
            banner: ErrorBanner::default(),
            loading,
            notification: Notification::default(),
            selection: SelectedRows::new(),
            samples: SampleList::default(),
            patterns: PatternsView::new(),
        }
    }

    /// Checkbox handler of the samples table.
    pub fn toggle_selection(&mut self, id: &str, checked: bool) {
        self.selection.toggle(id, checked);
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(LoadingIndicator::hidden())
    }
}

/// Delete button handler. A successful response removes the sample's row;
/// failures go to the log only and leave the banner alone.
pub async fn delete_sample(page: &mut Page, backend: &impl Backend, id: &str) -> bool {
    match backend.delete_sample(id).await {
        Ok(response) if response.success => {
            page.samples.remove(id);
            true
        }
        Ok(response) => {
            tracing::error!(id, error = ?response.error, "sample deletion failed");
            false
        }
        Err(e) => {
            tracing::error!(id, error = %e, "sample deletion failed");
            false
        }
    }
}
