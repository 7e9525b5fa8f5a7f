//! trilateration.rs — closed-form 3-circle solver
//!
//! Subtracting the first anchor's circle equation from the second and third
//! removes the quadratic terms and leaves a 2×2 linear system:
//!
//! ```text
//!   A·x + B·y = C        A = 2(x2-x1)   B = 2(y2-y1)   C = d1²-d2²-x1²+x2²-y1²+y2²
//!   D·x + E·y = F        D = 2(x3-x1)   E = 2(y3-y1)   F = d1²-d3²-x1²+x3²-y1²+y3²
//! ```
//!
//! solved by Cramer's rule with `det = A·E - B·D`. `det` depends on the anchor
//! layout only, so the geometry gate is checked before the distances.

use anchor_types::MAX_ANCHORS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TrilaterationConfig;

// ── Types ─────────────────────────────────────────────────────────────────────

/// 2D point in the anchor frame (meters)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self { Self { x, y } }

    pub fn dist(&self, other: &Point2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TrilaterationError {
    #[error("distance to anchor {anchor_id} out of range: {distance_m:.2} m not in [{min_m}, {max_m}]")]
    DistanceOutOfRange { anchor_id: u8, distance_m: f64, min_m: f64, max_m: f64 },
    #[error("anchors colinear / degenerate geometry (|det| = {det:.2e})")]
    DegenerateGeometry { det: f64 },
}

// ── Solver ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Trilaterator {
    anchors: [Point2; MAX_ANCHORS],
    min_distance_m: f64,
    max_distance_m: f64,
    epsilon: f64,
}

impl Trilaterator {
    pub fn new(anchors: [Point2; MAX_ANCHORS], cfg: &TrilaterationConfig) -> Self {
        Self {
            anchors,
            min_distance_m: cfg.min_distance_m,
            max_distance_m: cfg.max_distance_m,
            epsilon: cfg.degeneracy_epsilon,
        }
    }

    pub fn anchors(&self) -> &[Point2; MAX_ANCHORS] {
        &self.anchors
    }

    /// `A·E - B·D` of the linearised system
    pub fn determinant(&self) -> f64 {
        let [p1, p2, p3] = self.anchors;
        let a = 2.0 * (p2.x - p1.x);
        let b = 2.0 * (p2.y - p1.y);
        let d = 2.0 * (p3.x - p1.x);
        let e = 2.0 * (p3.y - p1.y);
        a * e - b * d
    }

    /// Fails when the layout is (close to) a line.
    pub fn check_geometry(&self) -> Result<(), TrilaterationError> {
        let det = self.determinant();
        if !(det.abs() > self.epsilon) {
            return Err(TrilaterationError::DegenerateGeometry { det });
        }
        Ok(())
    }

    /// Position whose distances to anchors 1, 2, 3 are `distances[0..3]`.
    pub fn solve(&self, distances: [f64; MAX_ANCHORS]) -> Result<Point2, TrilaterationError> {
        self.check_geometry()?;

        for (idx, &d) in distances.iter().enumerate() {
            if !(self.min_distance_m..=self.max_distance_m).contains(&d) {
                return Err(TrilaterationError::DistanceOutOfRange {
                    anchor_id: idx as u8 + 1,
                    distance_m: d,
                    min_m: self.min_distance_m,
                    max_m: self.max_distance_m,
                });
            }
        }

        let [p1, p2, p3] = self.anchors;
        let [d1, d2, d3] = distances;

        let a = 2.0 * (p2.x - p1.x);
        let b = 2.0 * (p2.y - p1.y);
        let c = d1 * d1 - d2 * d2 - p1.x * p1.x + p2.x * p2.x - p1.y * p1.y + p2.y * p2.y;

        let d = 2.0 * (p3.x - p1.x);
        let e = 2.0 * (p3.y - p1.y);
        let f = d1 * d1 - d3 * d3 - p1.x * p1.x + p3.x * p3.x - p1.y * p1.y + p3.y * p3.y;

        let det = a * e - b * d;

        Ok(Point2 {
            x: (c * e - f * b) / det,
            y: (a * f - c * d) / det,
        })
    }
}
