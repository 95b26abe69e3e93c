// SPDX-License-Identifier: MIT
//! Upload progress: per-file indicators, transfer snapshots, speed gauge.

use std::time::Duration;

// ─── Indicators ───────────────────────────────────────────────────────────────

/// The three upload slots, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSlot {
    Claims,
    TechnicalRules,
    MedicalRules,
}

impl FileSlot {
    pub fn label(self) -> &'static str {
        match self {
            FileSlot::Claims => "Claims",
            FileSlot::TechnicalRules => "Technical rules",
            FileSlot::MedicalRules => "Medical rules",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorState {
    #[default]
    Pending,
    /// Percent complete, 0–100.
    Active(u8),
    Done,
    Failed,
}

/// Visual state of the three per-file progress indicators.
#[derive(Debug, Clone, Default)]
pub struct Indicators {
    pub visible: bool,
    pub claims: IndicatorState,
    pub technical: IndicatorState,
    pub medical: IndicatorState,
}

impl Indicators {
    /// Start of a new upload: everything back to 0%, prior success/error
    /// state cleared, indicators shown.
    pub fn reset(&mut self) {
        *self = Indicators {
            visible: true,
            claims: IndicatorState::Active(0),
            technical: IndicatorState::Active(0),
            medical: IndicatorState::Active(0),
        };
    }

    pub fn set(&mut self, slot: FileSlot, state: IndicatorState) {
        match slot {
            FileSlot::Claims => self.claims = state,
            FileSlot::TechnicalRules => self.technical = state,
            FileSlot::MedicalRules => self.medical = state,
        }
    }

    /// Any failure marks all three as failed.
    pub fn fail_all(&mut self) {
        self.visible = true;
        self.claims = IndicatorState::Failed;
        self.technical = IndicatorState::Failed;
        self.medical = IndicatorState::Failed;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

// ─── Transfer snapshot ────────────────────────────────────────────────────────

/// One progress event for the claims upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSnapshot {
    pub transferred: u64,
    pub total: u64,
    /// Instantaneous rate in bytes/second.
    pub bytes_per_sec: f64,
}

impl TransferSnapshot {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.transferred as f64 / self.total as f64) * 100.0).round() as u8
    }

    /// `"1.3 / 2.6 MB"`
    pub fn size_label(&self) -> String {
        format!(
            "{:.1} / {:.1} MB",
            self.transferred as f64 / 1e6,
            self.total as f64 / 1e6
        )
    }

    /// `"640.0 KB/s"` below 10^6 bytes/s, `"1.2 MB/s"` at or above.
    pub fn speed_label(&self) -> String {
        format_speed(self.bytes_per_sec)
    }
}

pub fn format_speed(bytes_per_sec: f64) -> String {
    if bytes_per_sec >= 1e6 {
        format!("{:.1} MB/s", bytes_per_sec / 1e6)
    } else {
        format!("{:.1} KB/s", bytes_per_sec / 1e3)
    }
}

// ─── Speed gauge ──────────────────────────────────────────────────────────────

/// Instantaneous transfer speed: bytes since the last progress event divided
/// by the elapsed seconds between them.
#[derive(Debug, Default)]
pub struct SpeedGauge {
    last_bytes: u64,
}

impl SpeedGauge {
    pub fn record(&mut self, transferred: u64, since_last: Duration) -> f64 {
        let delta = transferred.saturating_sub(self.last_bytes);
        self.last_bytes = transferred;
        let secs = since_last.as_secs_f64();
        if secs > 0.0 {
            delta as f64 / secs
        } else {
            0.0
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
