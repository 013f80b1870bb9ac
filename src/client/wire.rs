use serde::Deserialize;

use crate::table::{PatternRow, Row};

/// Body of a non-2xx response. The backend mostly uses `Error`; a few
/// handlers answer with a lowercase `error` instead.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "Error", default)]
    pub error_upper: Option<String>,
    #[serde(rename = "error", default)]
    pub error_lower: Option<String>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<&str> {
        self.error_upper
            .as_deref()
            .or(self.error_lower.as_deref())
    }
}

/// Success body of `POST /find-patterns-submit`. Each part is optional;
/// a missing part leaves the matching view untouched.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PatternsResponse {
    #[serde(default)]
    pub patterns: Option<Vec<PatternRow>>,
    #[serde(default)]
    pub quartiles: Option<Vec<Row>>,
    #[serde(default)]
    pub deciles: Option<Vec<Row>>,
}

/// Body of `DELETE /delete-sample/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_prefers_capitalized_key() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"Error": "Нет данных", "error": "other"}"#).unwrap();
        assert_eq!(body.message(), Some("Нет данных"));

        let body: ErrorBody = serde_json::from_str(r#"{"error": "Ошибка сервера"}"#).unwrap();
        assert_eq!(body.message(), Some("Ошибка сервера"));

        let body: ErrorBody = serde_json::from_str(r#"{"detail": 1}"#).unwrap();
        assert_eq!(body.message(), None);
    }

    #[test]
    fn patterns_response_parts_are_optional() {
        let response: PatternsResponse = serde_json::from_str(
            r#"{"patterns": [{"antecedents": "(forks_q4)", "consequents": "(watches_q4)",
                 "support": 0.2, "confidence": 0.9, "lift": 1.4}]}"#,
        )
        .unwrap();
        assert_eq!(response.patterns.as_ref().map(Vec::len), Some(1));
        assert!(response.quartiles.is_none());
        assert!(response.deciles.is_none());
    }

    #[test]
    fn quantile_rows_keep_key_order() {
        let response: PatternsResponse = serde_json::from_str(
            r#"{"quartiles": [{"name": "forks", "Q1": 1, "Q2": 3, "Q3": 8}]}"#,
        )
        .unwrap();
        let rows = response.quartiles.unwrap();
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "Q1", "Q2", "Q3"]);
    }
}
