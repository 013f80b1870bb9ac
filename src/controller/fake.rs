use std::sync::Mutex;

use reqwest::StatusCode;

use crate::client::{Backend, ClientError, DeleteResponse, PatternsResponse};
use crate::form::pattern::PatternQuery;
use crate::form::sample::FormState;

/// In-memory backend recording every call it receives.
#[derive(Debug)]
pub(crate) struct FakeBackend {
    calls: Mutex<Vec<String>>,
    states: Mutex<Vec<FormState>>,
    queries: Mutex<Vec<PatternQuery>>,
    patterns: PatternsResponse,
    delete: DeleteResponse,
    failure: Option<Option<String>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            states: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            patterns: PatternsResponse::default(),
            delete: DeleteResponse {
                success: true,
                error: None,
            },
            failure: None,
        }
    }
}

impl FakeBackend {
    pub(crate) fn with_patterns(mut self, patterns: PatternsResponse) -> Self {
        self.patterns = patterns;
        self
    }

    pub(crate) fn with_delete(mut self, delete: DeleteResponse) -> Self {
        self.delete = delete;
        self
    }

    /// Every submission answers 400 with this `Error` text (or none).
    pub(crate) fn failing(mut self, message: Option<&str>) -> Self {
        self.failure = Some(message.map(str::to_string));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn states(&self) -> Vec<FormState> {
        self.states.lock().unwrap().clone()
    }

    pub(crate) fn queries(&self) -> Vec<PatternQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn fail(&self) -> Result<(), ClientError> {
        match self.failure.as_ref() {
            Some(message) => Err(ClientError::Server {
                status: StatusCode::BAD_REQUEST,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Backend for FakeBackend {
    async fn load_data_submit(&self, state: &FormState) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push("load-data-submit".to_string());
        self.states.lock().unwrap().push(state.clone());
        self.fail()
    }

    async fn find_patterns_submit(
        &self,
        query: &PatternQuery,
    ) -> Result<PatternsResponse, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push("find-patterns-submit".to_string());
        self.queries.lock().unwrap().push(query.clone());
        self.fail()?;
        Ok(self.patterns.clone())
    }

    async fn delete_sample(&self, id: &str) -> Result<DeleteResponse, ClientError> {
        self.calls.lock().unwrap().push(format!("delete {id}"));
        Ok(self.delete.clone())
    }
}
