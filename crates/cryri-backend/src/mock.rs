use crate::backend::{JobRequest, SubmitBackend, SubmitReceipt};
use crate::BackendError;
use std::sync::Mutex;

/// Records submissions in memory. Used by tests that need to observe the
/// exact request a pipeline produced.
#[derive(Default)]
pub struct MockBackend {
    submitted: Mutex<Vec<JobRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests submitted so far, in order.
    pub fn submitted(&self) -> Vec<JobRequest> {
        self.submitted
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl SubmitBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn submit(&self, request: &JobRequest) -> Result<SubmitReceipt, BackendError> {
        let mut submitted = self
            .submitted
            .lock()
            .map_err(|e| BackendError::SubmitFailed(format!("mutex poisoned: {e}")))?;
        submitted.push(request.clone());
        Ok(SubmitReceipt {
            backend: self.name().to_owned(),
            submitted_at: chrono::Utc::now().to_rfc3339(),
            location: None,
        })
    }
}
