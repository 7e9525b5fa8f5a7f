//! report.rs — result of one evaluation cycle
//!
//! Built fresh on every evaluation; nothing here is persisted or averaged
//! across cycles.

use anchor_types::MAX_ANCHORS;
use serde::Serialize;

use crate::trilateration::{Point2, TrilaterationError};
use crate::zone::Zone;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorStatus {
    pub anchor_id: u8,
    pub active: bool,
    /// Only reported for active anchors
    pub filtered_rssi: Option<f64>,
    pub distance_m: Option<f64>,
    pub packet_count: u32,
    pub last_sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    /// Fewer than three anchors active; trilateration not attempted
    WaitingForAnchors { missing: usize },
    /// Trilateration refused the inputs; no position this cycle
    Failed { distances_m: [f64; MAX_ANCHORS], error: TrilaterationError },
    Located { distances_m: [f64; MAX_ANCHORS], position: Point2, zone: Zone },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub at_ms: u64,
    /// Raw arrivals, accepted or not
    pub frames_received: u64,
    pub anchors: Vec<AnchorStatus>,
    pub outcome: EvaluationOutcome,
}

impl EvaluationReport {
    pub fn position(&self) -> Option<Point2> {
        match self.outcome {
            EvaluationOutcome::Located { position, .. } => Some(position),
            _ => None,
        }
    }

    pub fn zone(&self) -> Option<Zone> {
        match self.outcome {
            EvaluationOutcome::Located { zone, .. } => Some(zone),
            _ => None,
        }
    }

    pub fn active_anchors(&self) -> usize {
        self.anchors.iter().filter(|a| a.active).count()
    }
}
