//! distance.rs — RSSI → distance (log-distance path loss)
//!
//! `d = 10 ^ ((RSSI_1m - rssi) / (10 · n))`, saturating at both ends: readings
//! stronger than the near clamp are "too close to be meaningful", readings
//! weaker than the far clamp sit on the noise floor.

use crate::config::PathLossConfig;

#[derive(Debug, Clone)]
pub struct PathLossModel {
    cfg: PathLossConfig,
}

impl Default for PathLossModel {
    fn default() -> Self {
        Self::new(&PathLossConfig::default())
    }
}

impl PathLossModel {
    pub fn new(cfg: &PathLossConfig) -> Self {
        Self { cfg: cfg.clone() }
    }

    /// Estimated distance in meters for a filtered RSSI in dBm.
    pub fn distance(&self, rssi: f64) -> f64 {
        if rssi > self.cfg.near_clamp_dbm {
            return self.cfg.near_distance_m;
        }
        if rssi < self.cfg.far_clamp_dbm {
            return self.cfg.far_distance_m;
        }
        10f64.powf((self.cfg.rssi_at_1m - rssi) / (10.0 * self.cfg.exponent))
    }

    /// Inverse of [`distance`](Self::distance) inside the unclamped band.
    /// Handy for calibration: what the receiver should read at `distance_m`.
    pub fn expected_rssi(&self, distance_m: f64) -> f64 {
        self.cfg.rssi_at_1m - 10.0 * self.cfg.exponent * distance_m.log10()
    }
}
