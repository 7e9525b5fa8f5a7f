//! engine.rs — the receiver's single owned context
//!
//! Two entry points, both taking `&mut self`:
//!   1. `ingest`: one call per frame delivered by the transport
//!   2. `poll`: one call per main-loop tick (staleness sweep, and every
//!      evaluation period the distance → trilateration → zone chain)
//!
//! The engine is not shared. Callers that receive frames on another task must
//! hand them over to the loop that owns the engine (see `trilat-receiver`), so
//! anchor state is only ever read and written from one place.

use anchor_types::MAX_ANCHORS;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::{ConfigError, PositioningConfig};
use crate::distance::PathLossModel;
use crate::report::{AnchorStatus, EvaluationOutcome, EvaluationReport};
use crate::signal::{provider_from_config, BoxedProvider, SignalStrengthProvider};
use crate::tracker::{AnchorState, AnchorTimeout, AnchorTracker};
use crate::trilateration::Trilaterator;
use crate::validator::{FrameRejected, PacketValidator};
use crate::zone::ZoneClassifier;

/// One datagram as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivedFrame {
    /// Sender identity (MAC, socket address, ...) for logs only
    pub sender: String,
    pub payload: Vec<u8>,
    /// Signal strength of this reception, when the link exposes it
    pub reported_rssi: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Accepted { anchor_id: u8, rssi: i32, state: AnchorState },
    Rejected(FrameRejected),
    /// Valid frame but the signal provider had no reading for it
    NoSignal { anchor_id: u8 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollOutcome {
    pub timed_out: Vec<AnchorTimeout>,
    pub report: Option<EvaluationReport>,
}

pub struct PositioningEngine<S = BoxedProvider> {
    validator: PacketValidator,
    signal: S,
    tracker: AnchorTracker,
    model: PathLossModel,
    solver: Trilaterator,
    zones: ZoneClassifier,
    evaluation_period_ms: u64,
    last_evaluation_ms: u64,
}

impl PositioningEngine<BoxedProvider> {
    /// Validate `cfg` and build an engine with the configured signal source.
    pub fn from_config(cfg: &PositioningConfig) -> Result<Self, ConfigError> {
        Self::with_signal(cfg, provider_from_config(&cfg.signal))
    }
}

impl<S: SignalStrengthProvider> PositioningEngine<S> {
    /// Validate `cfg` and build with an explicit signal provider (tests inject
    /// deterministic ones).
    pub fn with_signal(cfg: &PositioningConfig, signal: S) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let solver = Trilaterator::new(cfg.anchor_positions()?, &cfg.trilateration);

        Ok(Self {
            validator: PacketValidator::new(MAX_ANCHORS),
            signal,
            tracker: AnchorTracker::new(MAX_ANCHORS, &cfg.filter, cfg.timing.staleness_ms),
            model: PathLossModel::new(&cfg.path_loss),
            solver,
            zones: ZoneClassifier::new(&cfg.zones),
            evaluation_period_ms: cfg.timing.evaluation_period_ms,
            last_evaluation_ms: 0,
        })
    }

    pub fn frames_received(&self) -> u64 {
        self.validator.frames_received()
    }

    pub fn anchor(&self, anchor_id: u8) -> Option<&AnchorState> {
        self.tracker.get(anchor_id)
    }

    pub fn anchors(&self) -> &[AnchorState] {
        self.tracker.states()
    }

    // ── Notification path ─────────────────────────────────────────────────────

    pub fn ingest(&mut self, frame: &ReceivedFrame, now_ms: u64) -> IngestOutcome {
        let reading = match self.validator.validate(&frame.payload) {
            Ok(r) => r,
            Err(e) => {
                trace!("Dropped frame from {}: {e}", frame.sender);
                return IngestOutcome::Rejected(e);
            }
        };

        let Some(rssi) = self.signal.measure(frame.reported_rssi) else {
            debug!("No signal strength for anchor {} frame from {}", reading.anchor_id, frame.sender);
            return IngestOutcome::NoSignal { anchor_id: reading.anchor_id };
        };

        match self.tracker.record(&reading, rssi, now_ms) {
            Some(state) => IngestOutcome::Accepted { anchor_id: reading.anchor_id, rssi, state: *state },
            // validator already bounded the id
            None => IngestOutcome::Rejected(FrameRejected::UnknownAnchor {
                anchor_id: reading.anchor_id,
                anchor_count: MAX_ANCHORS,
            }),
        }
    }

    // ── Periodic path ─────────────────────────────────────────────────────────

    pub fn poll(&mut self, now_ms: u64) -> PollOutcome {
        let timed_out = self.tracker.sweep(now_ms);

        let report = if now_ms.saturating_sub(self.last_evaluation_ms) >= self.evaluation_period_ms {
            self.last_evaluation_ms = now_ms;
            Some(self.evaluate(now_ms))
        } else {
            None
        };

        PollOutcome { timed_out, report }
    }

    /// Distance per active anchor, then trilateration and zone when all three
    /// anchors are active.
    pub fn evaluate(&self, now_ms: u64) -> EvaluationReport {
        let states = self.tracker.states();

        let anchors: Vec<AnchorStatus> = states
            .iter()
            .enumerate()
            .map(|(idx, s)| AnchorStatus {
                anchor_id: idx as u8 + 1,
                active: s.active,
                filtered_rssi: s.active.then_some(s.filtered_rssi),
                distance_m: s.active.then(|| self.model.distance(s.filtered_rssi)),
                packet_count: s.packet_count,
                last_sequence: s.last_sequence,
            })
            .collect();

        let active = self.tracker.active_count();
        let outcome = if active < MAX_ANCHORS {
            EvaluationOutcome::WaitingForAnchors { missing: MAX_ANCHORS - active }
        } else {
            let distances_m = [
                self.model.distance(states[0].filtered_rssi),
                self.model.distance(states[1].filtered_rssi),
                self.model.distance(states[2].filtered_rssi),
            ];
            match self.solver.solve(distances_m) {
                Ok(position) => {
                    let zone = self.zones.classify(position);
                    info!("Position ({:.2}, {:.2}) m, zone {zone}", position.x, position.y);
                    EvaluationOutcome::Located { distances_m, position, zone }
                }
                Err(error) => {
                    info!("Position calculation failed: {error}");
                    EvaluationOutcome::Failed { distances_m, error }
                }
            }
        };

        EvaluationReport {
            at_ms: now_ms,
            frames_received: self.validator.frames_received(),
            anchors,
            outcome,
        }
    }
}
