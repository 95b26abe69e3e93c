//! Request/response bodies for the validation service API.
//!
//! Claim lists arrive as raw JSON values and are normalized by
//! [`crate::model::normalize_claims`] — the wire types here deliberately do
//! not try to model the backend's field-name drift themselves.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{MetricRow, RefinedEntry};

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
}

// ─── Upload ───────────────────────────────────────────────────────────────────

/// An optional rules file attached to an upload.
///
/// `content` is the raw file text — the backend parses it as JSON itself.
/// Only the claims file is base64-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFile {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub tenant_id: String,
    /// Base64-encoded claims CSV.
    pub claims_file: String,
    pub technical_rules_file: Option<RuleFile>,
    pub medical_rules_file: Option<RuleFile>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub processed: u64,
}

// ─── Validate / results / metrics ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ValidateResponse {
    #[serde(default)]
    pub processed: Option<u64>,
    #[serde(default)]
    pub claims: Vec<Value>,
    #[serde(default)]
    pub metrics: Vec<MetricRow>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultsResponse {
    #[serde(default)]
    pub claims: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetricsResponse {
    #[serde(default)]
    pub metrics: Vec<MetricRow>,
}

// ─── Settings ─────────────────────────────────────────────────────────────────

/// Tenant config as stored by the backend — a string key/value table, so the
/// threshold may arrive as either a number or a numeric string.
#[derive(Debug, Default, Deserialize)]
pub struct TenantConfig {
    #[serde(default)]
    pub paid_amount_approval_threshold: Option<Value>,
    /// JSON-encoded `CapEntry` array, kept as opaque text by the backend.
    #[serde(default)]
    pub paid_amount_caps: Option<String>,
}

impl TenantConfig {
    /// Threshold as a number, tolerating the string form.
    pub fn threshold(&self) -> Option<f64> {
        match self.paid_amount_approval_threshold.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsResponse {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub config: TenantConfig,
}

#[derive(Debug, Serialize)]
pub struct SaveSettingsRequest {
    pub paid_amount_approval_threshold: f64,
    /// JSON-encoded `CapEntry` array.
    pub paid_amount_caps: String,
}

// ─── Reports / maintenance ────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RefinedResponse {
    #[serde(default)]
    pub refined: Vec<RefinedEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearTenantResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub deleted: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upload_request_null_rule_files() {
        let req = UploadRequest {
            tenant_id: "default".into(),
            claims_file: "Y2xhaW1z".into(),
            technical_rules_file: None,
            medical_rules_file: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert!(v["technical_rules_file"].is_null());
        assert!(v["medical_rules_file"].is_null());
    }

    #[test]
    fn test_threshold_accepts_string_and_number() {
        let cfg: TenantConfig =
            serde_json::from_value(json!({"paid_amount_approval_threshold": "250.5"})).unwrap();
        assert_eq!(cfg.threshold(), Some(250.5));

        let cfg: TenantConfig =
            serde_json::from_value(json!({"paid_amount_approval_threshold": 100})).unwrap();
        assert_eq!(cfg.threshold(), Some(100.0));

        let cfg: TenantConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(cfg.threshold(), None);
    }

    #[test]
    fn test_validate_response_missing_fields() {
        let resp: ValidateResponse = serde_json::from_value(json!({"claims": []})).unwrap();
        assert_eq!(resp.processed, None);
        assert!(resp.metrics.is_empty());
    }
}
