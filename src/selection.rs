/// Dataset ids the user has checked on the search page.
///
/// Semantically a set; iteration follows insertion order so the ids go out
/// in the order they were picked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectedRows {
    ids: Vec<String>,
}

impl SelectedRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &str, checked: bool) {
        if checked {
            if !self.contains(id) {
                self.ids.push(id.to_string());
            }
        } else if let Some(index) = self.ids.iter().position(|v| v == id) {
            self.ids.remove(index);
        }
        tracing::debug!(selected = ?self.ids, "selection changed");
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|v| v == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
