//! Explicit application state.
//!
//! The console keeps one `AppState` owned by the shell (no globals).  Claims
//! and metrics are only ever replaced together, wholesale, from one backend
//! response — the results table and the charts can never show data from two
//! different tenants at once.  Login is the defined reset point.

use std::time::{Duration, Instant};

use crate::model::{Claim, MetricRow};
use crate::settings::CapsEditor;
use crate::upload::progress::Indicators;
use crate::upload::ValidationOutcome;

/// How long failed/finished upload indicators stay visible.
pub const INDICATOR_HIDE_DELAY: Duration = Duration::from_secs(10);

/// Trim a tenant id, falling back to `"default"` when blank.
pub fn normalize_tenant(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "default".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    /// Current tenant id.  Empty right after login; overwritten by every
    /// upload/settings action.
    pub tenant: String,
    /// Full normalized claim list — the source for filtering, never the
    /// rendered rows.
    pub claims: Vec<Claim>,
    pub metrics: Vec<MetricRow>,
    /// Settings form state.
    pub threshold: f64,
    pub caps: CapsEditor,
    /// Per-file upload indicators.
    pub indicators: Indicators,
    /// Last validation outcome; its tone tints the summary panel border.
    pub outcome: Option<ValidationOutcome>,
    /// When set, indicators hide once this deadline passes.  A second upload
    /// overwrites the deadline — there is exactly one timer.
    pub hide_indicators_at: Option<Instant>,
}

impl AppState {
    /// Reset point at login: tenant cleared, data cleared, indicators hidden.
    pub fn reset(&mut self) {
        *self = AppState::default();
    }

    /// Replace claims and metrics together from one backend response.
    pub fn replace_data(&mut self, claims: Vec<Claim>, metrics: Vec<MetricRow>) {
        self.claims = claims;
        self.metrics = metrics;
    }

    /// Record a finished (or failed) upload and arm the auto-hide deadline.
    pub fn arm_indicator_hide(&mut self, now: Instant) {
        self.hide_indicators_at = Some(now + INDICATOR_HIDE_DELAY);
    }

    /// Called from the UI tick: clears indicators once the deadline passes.
    pub fn tick_indicator_hide(&mut self, now: Instant) {
        if let Some(deadline) = self.hide_indicators_at {
            if now >= deadline {
                self.hide_indicators_at = None;
                self.indicators.hide();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tenant() {
        assert_eq!(normalize_tenant(""), "default");
        assert_eq!(normalize_tenant("   "), "default");
        assert_eq!(normalize_tenant(" acme "), "acme");
        assert_eq!(normalize_tenant("default"), "default");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = AppState {
            tenant: "acme".into(),
            threshold: 250.0,
            ..AppState::default()
        };
        state.caps.add("99213", 150.0);
        state.replace_data(
            vec![Claim {
                claim_id: "C1".into(),
                status: "Validated".into(),
                error_type: "No error".into(),
                error_explanation: String::new(),
                recommended_action: String::new(),
            }],
            vec![],
        );

        state.reset();
        assert_eq!(state.tenant, "");
        assert!(state.claims.is_empty());
        assert!(state.caps.is_empty());
        assert_eq!(state.threshold, 0.0);
    }

    #[test]
    fn test_indicator_hide_deadline() {
        let mut state = AppState::default();
        let now = Instant::now();
        state.arm_indicator_hide(now);

        state.tick_indicator_hide(now + Duration::from_secs(5));
        assert!(state.hide_indicators_at.is_some());

        state.tick_indicator_hide(now + INDICATOR_HIDE_DELAY);
        assert!(state.hide_indicators_at.is_none());
    }

    #[test]
    fn test_second_upload_overwrites_deadline() {
        let mut state = AppState::default();
        let now = Instant::now();
        state.arm_indicator_hide(now);
        let later = now + Duration::from_secs(8);
        state.arm_indicator_hide(later);

        // First deadline passing must not hide the second upload's indicators.
        state.tick_indicator_hide(now + INDICATOR_HIDE_DELAY);
        assert!(state.hide_indicators_at.is_some());
    }
}
