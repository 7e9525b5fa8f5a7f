//! zone.rs — coarse region of a solved position
//!
//! Checks run in order (Top, Left, Right, Center) with exclusive thresholds.
//! There is no hysteresis, so a point sitting on a boundary may alternate
//! labels between evaluations.

use std::fmt;

use serde::Serialize;

use crate::config::ZoneConfig;
use crate::trilateration::Point2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Top,
    Left,
    Right,
    Center,
}

impl Zone {
    pub fn description(&self) -> &'static str {
        match self {
            Zone::Top => "Near Anchor 1 (Top)",
            Zone::Left => "Near Anchor 2 (Left)",
            Zone::Right => "Near Anchor 3 (Right)",
            Zone::Center => "Center area",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Zone::Top => "Top",
            Zone::Left => "Left",
            Zone::Right => "Right",
            Zone::Center => "Center",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    top_y: f64,
    left_x: f64,
    right_x: f64,
}

impl Default for ZoneClassifier {
    fn default() -> Self {
        Self::new(&ZoneConfig::default())
    }
}

impl ZoneClassifier {
    pub fn new(cfg: &ZoneConfig) -> Self {
        Self { top_y: cfg.top_y, left_x: cfg.left_x, right_x: cfg.right_x }
    }

    pub fn classify(&self, p: Point2) -> Zone {
        if p.y > self.top_y {
            Zone::Top
        } else if p.x < self.left_x {
            Zone::Left
        } else if p.x > self.right_x {
            Zone::Right
        } else {
            Zone::Center
        }
    }
}
