use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    InProgress,
    Completed,
    Failed,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::InProgress => write!(f, "IN_PROGRESS"),
            RequestStatus::Completed => write!(f, "COMPLETED"),
            RequestStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// One timed pipeline stage, recorded for `get_query_plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub stage: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// The caller identity attached to every inbound operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryContext {
    pub username: String,
    pub request_id: Uuid,
}

impl QueryContext {
    pub fn new(username: impl Into<String>) -> Self {
        QueryContext {
            username: username.into(),
            request_id: Uuid::new_v4(),
        }
    }
}

/// Lifecycle record for a submitted query.
///
/// `status` only ever moves `InProgress -> Completed | Failed`; `end_time`
/// is set exactly when the status leaves `InProgress`; `spill_path` is
/// present exactly while the request is completed and not expired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMeta {
    pub id: Uuid,
    pub status: RequestStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub query: String,
    pub username: String,
    pub error: Option<String>,
    pub expired: bool,
    pub spill_path: Option<PathBuf>,
    pub plan_steps: Vec<PlanStep>,
}

impl RequestMeta {
    pub fn new(id: Uuid, query: impl Into<String>, username: impl Into<String>) -> Self {
        RequestMeta {
            id,
            status: RequestStatus::InProgress,
            start_time: Utc::now(),
            end_time: None,
            model: None,
            endpoint: None,
            query: query.into(),
            username: username.into(),
            error: None,
            expired: false,
            spill_path: None,
            plan_steps: Vec::new(),
        }
    }

    pub fn complete(&mut self, spill_path: PathBuf, plan_steps: Vec<PlanStep>) {
        self.status = RequestStatus::Completed;
        self.end_time = Some(Utc::now());
        self.spill_path = Some(spill_path);
        self.plan_steps = plan_steps;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = RequestStatus::Failed;
        self.end_time = Some(Utc::now());
        self.error = Some(error.into());
        self.spill_path = None;
    }

    pub fn expire(&mut self, message: impl Into<String>) {
        self.expired = true;
        self.error = Some(message.into());
        self.spill_path = None;
    }

    pub fn result_available(&self) -> bool {
        self.status == RequestStatus::Completed && !self.expired
    }
}
