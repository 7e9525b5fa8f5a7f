//! # positioning
//!
//! Receiver-side positioning pipeline for three fixed radio anchors:
//!
//! ```text
//! frame bytes → PacketValidator → SignalStrengthProvider → AnchorTracker
//!            ─ poll tick ─→ PathLossModel (per anchor) → Trilaterator → ZoneClassifier
//! ```
//!
//! [`PositioningEngine`] owns all of it. The crate logs through `tracing` and
//! never installs a subscriber.

pub mod config;
pub mod distance;
pub mod engine;
pub mod report;
pub mod signal;
pub mod tracker;
pub mod trilateration;
pub mod validator;
pub mod zone;

pub use config::{ConfigError, PositioningConfig, SignalSource};
pub use distance::PathLossModel;
pub use engine::{IngestOutcome, PollOutcome, PositioningEngine, ReceivedFrame};
pub use report::{AnchorStatus, EvaluationOutcome, EvaluationReport};
pub use signal::{DirectMeasurement, DirectOrRandomWalk, RandomWalk, SignalStrengthProvider};
pub use tracker::{AnchorState, AnchorTimeout, AnchorTracker};
pub use trilateration::{Point2, Trilaterator, TrilaterationError};
pub use validator::{FrameRejected, PacketValidator};
pub use zone::{Zone, ZoneClassifier};
