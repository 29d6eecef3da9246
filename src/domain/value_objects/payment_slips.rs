use serde::{Deserialize, Serialize};

/// Evidence payload ceiling, fixed by policy rather than config.
pub const MAX_SLIP_BYTES: usize = 2 * 1024 * 1024;

pub const ALLOWED_SLIP_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitSlipModel {
    pub evidence_base64: String,
    pub mime_type: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifySlipModel {
    pub approve: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupSummaryModel {
    pub success: bool,
    pub deleted: usize,
    pub checked: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoCancelSummaryModel {
    pub success: bool,
    pub cancelled: usize,
    pub checked: usize,
}
