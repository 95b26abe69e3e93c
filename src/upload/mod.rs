// SPDX-License-Identifier: MIT
//! The upload → validate → render pipeline.
//!
//! Sequence (each step awaited before the next):
//! 1. reset indicators, read both optional rule files as text
//! 2. base64-encode the claims file
//! 3. POST one JSON body to `/upload` as a chunked stream, emitting a
//!    progress snapshot (percent, MB transferred, speed) per chunk
//! 4. on 2xx, POST `/validate/:tenant`; a non-OK response surfaces its body
//!    text, or "Validation failed" when the body is empty
//! 5. normalize + hand the validate response to the shell, then refetch the
//!    canonical `/results` and `/metrics`
//!
//! Any failure at any step emits one `Failed` event; the shell flips all
//! three indicators to the failed state, shows the message, and arms the
//! 10-second auto-hide.  No retries.

pub mod progress;

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::api::types::{RuleFile, UploadRequest};
use crate::api::{ApiClient, ApiError};
use crate::encode;
use crate::model::{normalize_claims, Claim, MetricRow};
use crate::render::Tone;
use crate::state::normalize_tenant;
use self::progress::{FileSlot, SpeedGauge, TransferSnapshot};

// ─── Inputs / outputs ─────────────────────────────────────────────────────────

/// What the user selected on the upload form.
#[derive(Debug, Clone, Default)]
pub struct UploadSpec {
    /// Raw tenant input; trimmed and defaulted to `"default"` when blank.
    pub tenant: String,
    pub claims_path: Option<PathBuf>,
    pub technical_path: Option<PathBuf>,
    pub medical_path: Option<PathBuf>,
}

/// Informative summary of a validation run.  The failure count never drives
/// control flow — it only picks the summary text and tone.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub processed: u64,
    pub failed: usize,
    pub tone: Tone,
    pub summary: String,
}

/// Classify the normalized claim list: any claim whose error type is not
/// "no error" (case-insensitive) counts as failed.
pub fn classify(processed: u64, claims: &[Claim]) -> ValidationOutcome {
    let failed = claims.iter().filter(|c| c.has_error()).count();
    if failed > 0 {
        ValidationOutcome {
            processed,
            failed,
            tone: Tone::Error,
            summary: format!("{failed} failed checks"),
        }
    } else {
        ValidationOutcome {
            processed,
            failed: 0,
            tone: Tone::Success,
            summary: format!("{processed} processed, no errors found"),
        }
    }
}

/// Progress and completion events consumed by the TUI shell and the CLI.
#[derive(Debug)]
pub enum UploadEvent {
    /// Indicators reset to 0%, prior state cleared.
    Started,
    /// An optional rule file was read successfully.
    RuleRead(FileSlot),
    /// Byte progress on the streamed claims upload.
    Progress(TransferSnapshot),
    /// Upload accepted by the backend.
    Uploaded,
    /// Validation finished; data is replaced wholesale from this response.
    Validated {
        outcome: ValidationOutcome,
        claims: Vec<Claim>,
        metrics: Vec<MetricRow>,
    },
    /// Canonical results/metrics refetched from their dedicated endpoints.
    Refreshed {
        claims: Vec<Claim>,
        metrics: Vec<MetricRow>,
    },
    /// Any step failed; `message` is the single user-facing error.
    Failed { message: String },
}

// ─── Flow ─────────────────────────────────────────────────────────────────────

/// Read the selected files and build the upload body.
///
/// Rule files are read fully before this returns, so the claims upload never
/// starts ahead of them.  Exposed separately so the request construction is
/// testable without a backend.
pub async fn prepare_request(spec: &UploadSpec) -> Result<UploadRequest, ApiError> {
    let claims_path = spec.claims_path.as_deref().ok_or(ApiError::MissingClaimsFile)?;
    let tenant_id = normalize_tenant(&spec.tenant);

    let technical_rules_file = match spec.technical_path.as_deref() {
        Some(path) => Some(read_rule_file(path).await?),
        None => None,
    };
    let medical_rules_file = match spec.medical_path.as_deref() {
        Some(path) => Some(read_rule_file(path).await?),
        None => None,
    };

    let claims_file = encode::read_base64(claims_path).await?;

    Ok(UploadRequest {
        tenant_id,
        claims_file,
        technical_rules_file,
        medical_rules_file,
    })
}

async fn read_rule_file(path: &Path) -> Result<RuleFile, ApiError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = encode::read_text(path).await?;
    Ok(RuleFile { filename, content })
}

/// Run the whole pipeline, emitting events along the way.
///
/// Returns the validation outcome on success.  On failure the single
/// user-facing message has already been emitted as `UploadEvent::Failed`.
pub async fn run(
    api: &ApiClient,
    spec: UploadSpec,
    events: UnboundedSender<UploadEvent>,
) -> Result<ValidationOutcome, ApiError> {
    match run_inner(api, &spec, &events).await {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            warn!(tenant = %spec.tenant, "upload flow failed: {err}");
            let _ = events.send(UploadEvent::Failed {
                message: err.user_message("Upload failed"),
            });
            Err(err)
        }
    }
}

async fn run_inner(
    api: &ApiClient,
    spec: &UploadSpec,
    events: &UnboundedSender<UploadEvent>,
) -> Result<ValidationOutcome, ApiError> {
    let _ = events.send(UploadEvent::Started);

    let request = prepare_request(spec).await?;
    if request.technical_rules_file.is_some() {
        let _ = events.send(UploadEvent::RuleRead(FileSlot::TechnicalRules));
    }
    if request.medical_rules_file.is_some() {
        let _ = events.send(UploadEvent::RuleRead(FileSlot::MedicalRules));
    }
    let tenant = request.tenant_id.clone();

    let progress_tx = events.clone();
    let mut gauge = SpeedGauge::default();
    let mut last_event = Instant::now();
    let response = api
        .upload(&request, move |transferred, total| {
            let now = Instant::now();
            let bytes_per_sec = gauge.record(transferred, now.duration_since(last_event));
            last_event = now;
            let _ = progress_tx.send(UploadEvent::Progress(TransferSnapshot {
                transferred,
                total,
                bytes_per_sec,
            }));
        })
        .await?;
    let _ = events.send(UploadEvent::Uploaded);
    info!(tenant = %tenant, processed = response.processed, "upload accepted");

    // Validation is only requested once the upload response is confirmed 2xx.
    let validated = api.validate(&tenant).await.map_err(|err| match err {
        ApiError::Status { status, body } if body.trim().is_empty() => ApiError::Status {
            status,
            body: "Validation failed".to_string(),
        },
        other => other,
    })?;

    let claims = normalize_claims(&validated.claims);
    let processed = validated.processed.unwrap_or(claims.len() as u64);
    let outcome = classify(processed, &claims);
    let _ = events.send(UploadEvent::Validated {
        outcome: outcome.clone(),
        claims,
        metrics: validated.metrics,
    });

    // Canonical copy from the dedicated endpoints, then the shell switches
    // the visible page to Results.
    let results = api.results(&tenant).await?;
    let metrics = api.metrics(&tenant).await?;
    let _ = events.send(UploadEvent::Refreshed {
        claims: normalize_claims(&results.claims),
        metrics: metrics.metrics,
    });

    Ok(outcome)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claim_with_error(error_type: &str) -> Claim {
        crate::model::normalize_claim(&json!({"claim_id": "C1", "error_type": error_type}))
    }

    #[test]
    fn test_classify_clean_run() {
        let claims = vec![claim_with_error("No error")];
        let outcome = classify(1, &claims);
        assert_eq!(outcome.summary, "1 processed, no errors found");
        assert_eq!(outcome.tone, Tone::Success);
        assert_eq!(outcome.failed, 0);
    }

    #[test]
    fn test_classify_failures() {
        let claims = vec![claim_with_error("Medical error"), claim_with_error("no error")];
        let outcome = classify(2, &claims);
        assert_eq!(outcome.summary, "1 failed checks");
        assert_eq!(outcome.tone, Tone::Error);
        assert_eq!(outcome.failed, 1);
    }

    #[test]
    fn test_classify_case_insensitive_no_error() {
        let claims = vec![claim_with_error("NO ERROR"), claim_with_error("No Error")];
        let outcome = classify(2, &claims);
        assert_eq!(outcome.tone, Tone::Success);
    }

    #[tokio::test]
    async fn test_prepare_request_defaults_tenant_and_null_rules() {
        let dir = tempfile::TempDir::new().unwrap();
        let claims = dir.path().join("claims.csv");
        std::fs::write(&claims, b"claim_id,paid_amount_aed\nC1,10\n").unwrap();

        let spec = UploadSpec {
            tenant: "   ".into(),
            claims_path: Some(claims),
            ..UploadSpec::default()
        };
        let request = prepare_request(&spec).await.unwrap();
        assert_eq!(request.tenant_id, "default");
        assert!(request.technical_rules_file.is_none());
        assert!(request.medical_rules_file.is_none());
        assert!(!request.claims_file.is_empty());
    }

    #[tokio::test]
    async fn test_prepare_request_reads_rule_files_as_text() {
        let dir = tempfile::TempDir::new().unwrap();
        let claims = dir.path().join("claims.csv");
        let tech = dir.path().join("technical.json");
        std::fs::write(&claims, b"claim_id\nC1\n").unwrap();
        std::fs::write(&tech, b"[{\"rule_id\":\"T1\"}]").unwrap();

        let spec = UploadSpec {
            tenant: "acme".into(),
            claims_path: Some(claims),
            technical_path: Some(tech),
            medical_path: None,
        };
        let request = prepare_request(&spec).await.unwrap();
        let rule = request.technical_rules_file.unwrap();
        assert_eq!(rule.filename, "technical.json");
        assert_eq!(rule.content, "[{\"rule_id\":\"T1\"}]");
    }

    #[tokio::test]
    async fn test_missing_claims_file_fails_before_any_read() {
        let spec = UploadSpec::default();
        let err = prepare_request(&spec).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingClaimsFile));
    }

    #[tokio::test]
    async fn test_run_emits_failed_event_on_missing_claims() {
        let api = ApiClient::new("http://127.0.0.1:9", std::time::Duration::from_secs(1)).unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let err = run(&api, UploadSpec::default(), tx).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingClaimsFile));

        assert!(matches!(rx.try_recv(), Ok(UploadEvent::Started)));
        assert!(matches!(rx.try_recv(), Ok(UploadEvent::Failed { .. })));
    }
}
