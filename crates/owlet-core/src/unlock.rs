//! Stage lock derivation and the next-unit latch.
//!
//! Lock decisions are fail-closed: absence of data never grants access. A
//! stage button unlocks only when the document explicitly records a
//! completed play.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::progress::{ProgressDocument, UnitStatusMap};
use crate::time::TimeSample;

/// Per-stage "locked for click" flags for one unit's button layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageLockState {
    locks: HashMap<String, bool>,
}

impl StageLockState {
    /// Whether a stage button is locked. Stages outside the computed layout
    /// answer locked.
    pub fn is_locked(&self, stage: &str) -> bool {
        self.locks.get(stage).copied().unwrap_or(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.locks.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Derive lock flags for every stage in a unit's button layout.
///
/// A missing or empty status map locks the whole layout; otherwise a stage
/// is unlocked exactly when its flag records a completed play.
pub fn resolve_stage_locks(status: Option<&UnitStatusMap>, layout: &[&str]) -> StageLockState {
    let mut locks = HashMap::with_capacity(layout.len());
    match status {
        Some(map) if !map.is_empty() => {
            for &stage in layout {
                let locked = match map.played(stage) {
                    Some(played) => !played,
                    None => true,
                };
                locks.insert(stage.to_string(), locked);
            }
        }
        _ => {
            for &stage in layout {
                locks.insert(stage.to_string(), true);
            }
        }
    }
    StageLockState { locks }
}

/// Malformed `next_unit_date` field.
#[derive(Debug, Error)]
#[error("unparsable unlock date '{raw}'")]
pub struct DateParseError {
    raw: String,
}

/// Parse the unlock date: a plain `YYYY-MM-DD`, or an RFC 3339 timestamp
/// truncated to its date.
pub fn parse_unlock_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(at.date_naive());
    }
    Err(DateParseError {
        raw: raw.to_string(),
    })
}

/// One evaluation pass: lock flags plus the latched next-unit decision.
#[derive(Debug, Clone, Serialize)]
pub struct UnlockReport {
    pub locks: StageLockState,
    pub next_unit_open: bool,
}

/// Evaluates lock state against a loaded document.
///
/// Scoped to one document snapshot: the next-unit latch is write-once-true,
/// so a pass that cannot re-confirm the date (or cannot parse it) never
/// revokes an unlock already granted. Create a fresh resolver whenever the
/// store snapshot is replaced.
#[derive(Debug, Default)]
pub struct UnlockResolver {
    next_unit_open: bool,
}

impl UnlockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the next unit has been latched open.
    pub fn next_unit_open(&self) -> bool {
        self.next_unit_open
    }

    /// Evaluate one unit's layout against the document and the
    /// authoritative time.
    pub fn evaluate(
        &mut self,
        doc: &ProgressDocument,
        unit_key: &str,
        layout: &[&str],
        now: &TimeSample,
    ) -> UnlockReport {
        let locks = resolve_stage_locks(doc.unit_status(unit_key).as_ref(), layout);

        if !self.next_unit_open {
            if let Some(raw) = doc.next_unit_date() {
                match parse_unlock_date(raw) {
                    // Strictly later only: the unlock day itself stays closed.
                    Ok(date) if now.date() > date => self.next_unit_open = true,
                    Ok(_) => {}
                    Err(err) => {
                        tracing::debug!(error = %err, "skipping next-unit comparison");
                    }
                }
            }
        }

        UnlockReport {
            locks,
            next_unit_open: self.next_unit_open,
        }
    }
}
