//! config.rs — tunable parameters of the positioning pipeline
//!
//! Every constant of the receiver is configuration: anchor layout, timing,
//! filter, path-loss calibration, trilateration gates, zone thresholds and the
//! signal source. Each section falls back to the deployment defaults, so an
//! empty TOML document is a valid configuration.

use anchor_types::MAX_ANCHORS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trilateration::{Point2, Trilaterator, TrilaterationError};

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("expected exactly {expected} anchor positions, found {found}")]
    AnchorCount { expected: usize, found: usize },
    #[error("anchor layout is unusable: {0}")]
    Geometry(#[from] TrilaterationError),
    #[error("`{name}` must be greater than zero")]
    ZeroPeriod { name: &'static str },
    #[error("smoothing factor alpha must be in (0, 1], got {0}")]
    Alpha(f64),
    #[error("path-loss exponent must be positive, got {0}")]
    PathLossExponent(f64),
    #[error("distance bounds must satisfy 0 < min < max, got [{min}, {max}]")]
    DistanceBounds { min: f64, max: f64 },
    #[error("random walk needs floor < reset < ceiling and a positive step, got {floor}/{reset}/{ceiling} step {step}")]
    RandomWalk { floor: i32, reset: i32, ceiling: i32, step: i32 },
}

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PositioningConfig {
    pub anchors: AnchorLayout,
    pub timing: TimingConfig,
    pub filter: FilterConfig,
    pub path_loss: PathLossConfig,
    pub trilateration: TrilaterationConfig,
    pub zones: ZoneConfig,
    pub signal: SignalConfig,
}

/// Fixed anchor coordinates in meters; entry `i` belongs to anchor id `i + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorLayout {
    pub positions: Vec<[f64; 2]>,
}

impl Default for AnchorLayout {
    /// Equilateral triangle with 1 m sides, A1 on top.
    fn default() -> Self {
        Self {
            positions: vec![[0.0, 0.433], [-0.5, -0.433], [0.5, -0.433]],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Silence after which an active anchor is swept to inactive
    pub staleness_ms: u64,
    /// Period of the distance + trilateration + zone evaluation
    pub evaluation_period_ms: u64,
    /// Period of the main poll (staleness sweep)
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            staleness_ms: 5000,
            evaluation_period_ms: 2000,
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// EMA weight of the newest sample
    pub alpha: f64,
    /// Readings after (re)activation that overwrite instead of blend
    pub warmup_packets: u32,
    /// Clear filter history when an anchor times out
    pub reset_on_timeout: bool,
    /// Filtered value of an anchor that has never been heard
    pub initial_rssi_dbm: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            warmup_packets: 10,
            reset_on_timeout: false,
            initial_rssi_dbm: -100.0,
        }
    }
}

/// Log-distance path-loss calibration. Measure `rssi_at_1m` on site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathLossConfig {
    pub rssi_at_1m: f64,
    /// 2.7–3.5 indoors
    pub exponent: f64,
    /// Stronger than this saturates to `near_distance_m`
    pub near_clamp_dbm: f64,
    /// Weaker than this saturates to `far_distance_m`
    pub far_clamp_dbm: f64,
    pub near_distance_m: f64,
    pub far_distance_m: f64,
}

impl Default for PathLossConfig {
    fn default() -> Self {
        Self {
            rssi_at_1m: -55.0,
            exponent: 3.0,
            near_clamp_dbm: -40.0,
            far_clamp_dbm: -95.0,
            near_distance_m: 0.1,
            far_distance_m: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrilaterationConfig {
    pub min_distance_m: f64,
    pub max_distance_m: f64,
    /// |det| at or below this is treated as colinear anchors
    pub degeneracy_epsilon: f64,
}

impl Default for TrilaterationConfig {
    fn default() -> Self {
        Self {
            min_distance_m: 0.1,
            max_distance_m: 20.0,
            degeneracy_epsilon: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub top_y: f64,
    pub left_x: f64,
    pub right_x: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self { top_y: 0.2, left_x: -0.3, right_x: 0.3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    /// Transport-reported RSSI only
    Direct,
    /// Simulated RSSI only
    RandomWalk,
    /// Transport RSSI when plausible, simulated otherwise
    #[default]
    DirectWithFallback,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub source: SignalSource,
    pub walk: RandomWalkConfig,
    /// Fixed seed for the random walk; entropy when absent
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalkConfig {
    /// Starting value and snap-back target
    pub reset_dbm: i32,
    pub floor_dbm: i32,
    pub ceiling_dbm: i32,
    /// Steps are drawn from `[-max_step, max_step)`
    pub max_step: i32,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self { reset_dbm: -65, floor_dbm: -85, ceiling_dbm: -50, max_step: 3 }
    }
}

// ── Loading & validation ──────────────────────────────────────────────────────

impl PositioningConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: PositioningConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.positions.len()
    }

    pub fn anchor_positions(&self) -> Result<[Point2; MAX_ANCHORS], ConfigError> {
        let found = self.anchors.positions.len();
        if found != MAX_ANCHORS {
            return Err(ConfigError::AnchorCount { expected: MAX_ANCHORS, found });
        }
        let p = &self.anchors.positions;
        Ok([
            Point2::new(p[0][0], p[0][1]),
            Point2::new(p[1][0], p[1][1]),
            Point2::new(p[2][0], p[2][1]),
        ])
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positions = self.anchor_positions()?;
        Trilaterator::new(positions, &self.trilateration).check_geometry()?;

        for (name, value) in [
            ("timing.staleness_ms", self.timing.staleness_ms),
            ("timing.evaluation_period_ms", self.timing.evaluation_period_ms),
            ("timing.poll_interval_ms", self.timing.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroPeriod { name });
            }
        }

        let alpha = self.filter.alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::Alpha(alpha));
        }

        let n = self.path_loss.exponent;
        if !(n > 0.0 && n.is_finite()) {
            return Err(ConfigError::PathLossExponent(n));
        }

        let (min, max) = (self.trilateration.min_distance_m, self.trilateration.max_distance_m);
        if !(min > 0.0 && min < max) {
            return Err(ConfigError::DistanceBounds { min, max });
        }

        let w = self.signal.walk;
        if !(w.floor_dbm < w.reset_dbm && w.reset_dbm < w.ceiling_dbm && w.max_step > 0) {
            return Err(ConfigError::RandomWalk {
                floor: w.floor_dbm,
                reset: w.reset_dbm,
                ceiling: w.ceiling_dbm,
                step: w.max_step,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let cfg = PositioningConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.anchor_count(), 3);
        assert_eq!(cfg.timing.staleness_ms, 5000);
        assert_eq!(cfg.timing.evaluation_period_ms, 2000);
        assert_eq!(cfg.filter.warmup_packets, 10);
        assert_eq!(cfg.path_loss.rssi_at_1m, -55.0);
        assert_eq!(cfg.signal.source, SignalSource::DirectWithFallback);
    }

    #[test]
    fn test_partial_sections_override() {
        let raw = r#"
            [path_loss]
            rssi_at_1m = -60.0
            exponent = 2.7

            [signal]
            source = "random_walk"
            seed = 7
        "#;
        let cfg = PositioningConfig::from_toml_str(raw).unwrap();
        assert_eq!(cfg.path_loss.rssi_at_1m, -60.0);
        assert_eq!(cfg.path_loss.exponent, 2.7);
        assert_eq!(cfg.path_loss.far_clamp_dbm, -95.0);
        assert_eq!(cfg.signal.source, SignalSource::RandomWalk);
        assert_eq!(cfg.signal.seed, Some(7));
    }

    #[test]
    fn test_rejects_colinear_layout() {
        let raw = r#"
            [anchors]
            positions = [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]
        "#;
        let err = PositioningConfig::from_toml_str(raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Geometry(TrilaterationError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_anchor_count() {
        let raw = r#"
            [anchors]
            positions = [[0.0, 0.0], [1.0, 0.0]]
        "#;
        let err = PositioningConfig::from_toml_str(raw).unwrap_err();
        assert!(matches!(err, ConfigError::AnchorCount { expected: 3, found: 2 }));
    }

    #[test]
    fn test_rejects_bad_alpha() {
        let mut cfg = PositioningConfig::default();
        cfg.filter.alpha = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Alpha(_))));
        cfg.filter.alpha = 1.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::Alpha(_))));
        cfg.filter.alpha = 1.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_periods_and_bad_bounds() {
        let mut cfg = PositioningConfig::default();
        cfg.timing.evaluation_period_ms = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ZeroPeriod { name: "timing.evaluation_period_ms" })
        ));

        let mut cfg = PositioningConfig::default();
        cfg.trilateration.min_distance_m = 30.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::DistanceBounds { .. })));

        let mut cfg = PositioningConfig::default();
        cfg.signal.walk.reset_dbm = -40;
        assert!(matches!(cfg.validate(), Err(ConfigError::RandomWalk { .. })));
    }

    #[test]
    fn test_unknown_signal_source_is_parse_error() {
        let raw = r#"
            [signal]
            source = "guess"
        "#;
        assert!(matches!(
            PositioningConfig::from_toml_str(raw),
            Err(ConfigError::Parse(_))
        ));
    }
}
