//! Request/response shapes for embed-URL generation.
//!
//! This surface predates the mobile endpoints and speaks snake_case.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::EmbedRequest;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateEmbedUrlRequest {
    #[validate(length(min = 1, message = "Workbook id is required"))]
    pub workbook_id: String,
    pub merchant_id: Option<String>,
    pub embed_path: Option<String>,
    pub teams: Option<Vec<String>>,
    pub applet_id: Option<String>,
    pub applet_name: Option<String>,
    pub page_id: Option<String>,
    pub variables: Option<serde_json::Map<String, serde_json::Value>>,
}

impl From<GenerateEmbedUrlRequest> for EmbedRequest {
    fn from(req: GenerateEmbedUrlRequest) -> Self {
        EmbedRequest {
            workbook_id: req.workbook_id,
            merchant_id: req.merchant_id,
            embed_path: req.embed_path,
            teams: req.teams,
            applet_id: req.applet_id,
            applet_name: req.applet_name,
            page_id: req.page_id,
            variables: req.variables,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateEmbedUrlResponse {
    pub success: bool,
    pub url: String,
    pub jwt: String,
    pub expires_at: i64,
}
