//! Tenant settings: approval threshold + per-service paid-amount caps.
//!
//! The backend stores tenant config as a string key/value table; the caps
//! list crosses the wire as a JSON-encoded string inside it.  A caps value
//! that fails to parse is treated as an empty list — the settings form always
//! comes up usable, never errors on load because of a bad stored blob.

use tracing::{debug, warn};

use crate::api::types::SaveSettingsRequest;
use crate::api::{ApiClient, ApiError};
use crate::model::CapEntry;

/// Shown as the caps table's only row when the list is empty.
pub const EMPTY_CAPS_MESSAGE: &str = "No caps configured";

// ─── Caps editor ──────────────────────────────────────────────────────────────

/// Ordered, position-keyed cap list.
///
/// Duplicate service codes are permitted: the backend treats the serialized
/// array as opaque text, so entries have no identity beyond their position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapsEditor {
    entries: Vec<CapEntry>,
}

impl CapsEditor {
    /// Parse the JSON-string caps blob from tenant config.  Parse failures
    /// are swallowed and yield an empty list.
    pub fn from_config_text(text: Option<&str>) -> Self {
        let entries = match text {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<CapEntry>>(raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("unparseable caps config, starting empty: {e}");
                    Vec::new()
                }
            },
        };
        Self { entries }
    }

    /// Append a cap.  Always appends — duplicates are not merged.
    pub fn add(&mut self, service: &str, cap: f64) {
        self.entries.push(CapEntry {
            service: service.trim().to_string(),
            cap,
        });
    }

    /// Remove by position.  Out-of-range indices are a no-op.
    pub fn remove(&mut self, index: usize) -> Option<CapEntry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    pub fn entries(&self) -> &[CapEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Serialize back to the JSON text the settings payload carries.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "[]".to_string())
    }
}

// ─── Load / save ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct LoadedSettings {
    pub threshold: Option<f64>,
    pub caps: CapsEditor,
}

/// Fetch tenant settings and parse the caps blob.
pub async fn load(api: &ApiClient, tenant: &str) -> Result<LoadedSettings, ApiError> {
    let resp = api.settings(tenant).await?;
    let caps = CapsEditor::from_config_text(resp.config.paid_amount_caps.as_deref());
    debug!(tenant, caps = caps.len(), "settings loaded");
    Ok(LoadedSettings {
        threshold: resp.config.threshold(),
        caps,
    })
}

/// Serialize the in-memory caps list and POST threshold + caps text.
pub async fn save(
    api: &ApiClient,
    tenant: &str,
    threshold: f64,
    caps: &CapsEditor,
) -> Result<(), ApiError> {
    api.save_settings(
        tenant,
        &SaveSettingsRequest {
            paid_amount_approval_threshold: threshold,
            paid_amount_caps: caps.to_json(),
        },
    )
    .await?;
    debug!(tenant, "settings saved");
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
