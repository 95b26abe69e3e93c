//! Domain types shared by every page of the console.
//!
//! The backend is tolerant about field names (snake_case and camelCase
//! coexist in older tenants) and about metric row shape (objects or
//! positional arrays).  All of that tolerance lives here, in one place:
//! `normalize_claim` and `MetricRow`'s deserializer.  Everything downstream
//! of this module sees fully-normalized values and never falls back again.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ─── Claim ────────────────────────────────────────────────────────────────────

/// One billing record with its validation outcome.
///
/// Produced by [`normalize_claim`]; never mutated afterwards.  The whole list
/// is replaced wholesale on every fetch so results and metrics always come
/// from the same backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: String,
    /// `"Validated"` or `"Not validated"`.
    pub status: String,
    /// `"No error"`, `"Medical error"`, `"Technical error"`, or `"Both"`.
    pub error_type: String,
    /// Newline-separated bullet lines; may be empty.
    pub error_explanation: String,
    /// `;`-separated recommended actions; may be empty.
    pub recommended_action: String,
}

impl Claim {
    /// A claim counts as failed when its error type is anything other than
    /// "no error" (case-insensitive).
    pub fn has_error(&self) -> bool {
        !self.error_type.trim().eq_ignore_ascii_case("no error")
    }

    /// Success iff the status is exactly `"Validated"`.
    pub fn is_validated(&self) -> bool {
        self.status == "Validated"
    }
}

/// Field-fallback precedence, applied in order (first non-empty wins):
///
/// | field                | accepted keys                                       |
/// |----------------------|-----------------------------------------------------|
/// | `claim_id`           | `claim_id`, `claimId`, `id`                         |
/// | `error_type`         | `error_type`, `errorType` (default `"No error"`)    |
/// | `error_explanation`  | `error_explanation`, `errorExplanation`, `explanation` |
/// | `recommended_action` | `recommended_action`, `recommendedAction`           |
/// | `status`             | `status`; when absent, derived from the error type  |
///
/// A missing status becomes `"Validated"` when the error type is "no error"
/// (case-insensitive), `"Not validated"` otherwise.
pub fn normalize_claim(raw: &Value) -> Claim {
    let claim_id = first_str(raw, &["claim_id", "claimId", "id"]);
    let error_type = {
        let t = first_str(raw, &["error_type", "errorType"]);
        if t.is_empty() {
            "No error".to_string()
        } else {
            t
        }
    };
    let error_explanation = first_str(raw, &["error_explanation", "errorExplanation", "explanation"]);
    let recommended_action = first_str(raw, &["recommended_action", "recommendedAction"]);

    let status = {
        let s = first_str(raw, &["status"]);
        if !s.is_empty() {
            s
        } else if error_type.trim().eq_ignore_ascii_case("no error") {
            "Validated".to_string()
        } else {
            "Not validated".to_string()
        }
    };

    Claim {
        claim_id,
        status,
        error_type,
        error_explanation,
        recommended_action,
    }
}

/// Normalize a whole backend claim list.
pub fn normalize_claims(raws: &[Value]) -> Vec<Claim> {
    raws.iter().map(normalize_claim).collect()
}

fn first_str(raw: &Value, keys: &[&str]) -> String {
    for key in keys {
        if let Some(v) = raw.get(key) {
            match v {
                Value::String(s) if !s.is_empty() => return s.clone(),
                Value::Number(n) => return n.to_string(),
                _ => {}
            }
        }
    }
    String::new()
}

// ─── MetricRow ────────────────────────────────────────────────────────────────

/// One aggregate row per error category, used for chart rendering.
///
/// The backend emits these either as objects (`{category, count, amount}`,
/// with `total_paid` as a legacy alias for `amount`) or as positional arrays
/// (`[category, count, amount]`).  Malformed fields default to zero rather
/// than failing the whole response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub category: String,
    pub count: u64,
    pub amount: f64,
}

impl<'de> Deserialize<'de> for MetricRow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(match raw {
            Value::Array(items) => MetricRow {
                category: items.first().map(string_of).unwrap_or_default(),
                count: items.get(1).map(u64_of).unwrap_or(0),
                amount: items.get(2).map(f64_of).unwrap_or(0.0),
            },
            Value::Object(ref map) => MetricRow {
                category: map.get("category").map(string_of).unwrap_or_default(),
                count: map.get("count").map(u64_of).unwrap_or(0),
                amount: map
                    .get("amount")
                    .or_else(|| map.get("total_paid"))
                    .map(f64_of)
                    .unwrap_or(0.0),
            },
            _ => MetricRow {
                category: String::new(),
                count: 0,
                amount: 0.0,
            },
        })
    }
}

fn string_of(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn f64_of(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn u64_of(v: &Value) -> u64 {
    f64_of(v).max(0.0) as u64
}

// ─── CapEntry ─────────────────────────────────────────────────────────────────

/// One per-service paid-amount cap from tenant settings.
///
/// Caps live in an ordered list keyed by position.  Duplicate service codes
/// are permitted — the backend stores the serialized array as opaque text and
/// assigns it no identity beyond position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapEntry {
    pub service: String,
    pub cap: f64,
}

// ─── RefinedEntry ─────────────────────────────────────────────────────────────

/// PII-free adjudication record persisted by the backend after validation;
/// shown on the Reports page.
#[derive(Debug, Clone, Deserialize)]
pub struct RefinedEntry {
    #[serde(default)]
    pub claim_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error_type: String,
    #[serde(default)]
    pub error_explanation: String,
    #[serde(default)]
    pub recommended_action: String,
    #[serde(default)]
    pub processed_at: String,
}

// ─── Tests ────────────────────────────────────────────────────────────────────
