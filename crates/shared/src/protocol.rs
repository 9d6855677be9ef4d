use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const CLASSIFY_ROUTE: &str = "/classify";
pub const CLASSIFY_FILE_ROUTE: &str = "/classify_file";
pub const HEALTH_ROUTE: &str = "/health";

/// Multipart field carrying the uploaded CSV.
pub const BULK_FILE_FIELD: &str = "file";
/// Column every uploaded CSV must contain.
pub const TEXT_COLUMN: &str = "text";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    pub assigned_team: String,
}

/// One row of a bulk response: the uploaded CSV columns in header order,
/// followed by the prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    #[serde(flatten)]
    pub columns: IndexMap<String, String>,
    pub category: String,
    pub assigned_team: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
