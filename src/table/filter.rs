/// One column slot's filter expression.
///
/// A leading `~` negates the expression. The rest is split on `&` and every
/// part has to occur in the cell text (case-insensitive). An empty
/// expression matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnFilter {
    negate: bool,
    terms: Vec<String>,
}

impl ColumnFilter {
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        let (negate, rest) = match lowered.strip_prefix('~') {
            Some(rest) => (true, rest.to_string()),
            None => (false, lowered),
        };
        Self {
            negate,
            terms: rest.split('&').map(|s| s.to_string()).collect(),
        }
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    /// `true` when a cell with this text keeps its row visible.
    pub fn matches(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        let hit = self.terms.iter().all(|term| lowered.contains(term.as_str()));
        hit != self.negate
    }
}

pub fn validate_filter(filter: &str, text: &str) -> bool {
    ColumnFilter::parse(filter).matches(text)
}
