//! Console rendering of evaluation reports.

use std::fmt::Write;

use positioning::{EvaluationOutcome, EvaluationReport};

const MAP: &str = concat!(
    "       A1\n",
    "      / \\\n",
    "     /   \\\n",
    "    /  X  \\\n",
    "   /       \\\n",
    "  A2-------A3",
);

/// Multi-line status block for one evaluation.
pub fn render(report: &EvaluationReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &EvaluationReport) -> std::fmt::Result {
    writeln!(out, "=== SYSTEM STATUS ===")?;
    writeln!(out, "Total packets received: {}", report.frames_received)?;
    writeln!(out, "Anchor Status:")?;

    for a in &report.anchors {
        match (a.filtered_rssi, a.distance_m) {
            (Some(rssi), Some(dist)) => writeln!(
                out,
                "  Anchor {}: RSSI={rssi:.1} dBm, Dist≈{dist:.1} m, Pkts={}",
                a.anchor_id, a.packet_count
            )?,
            _ => writeln!(out, "  Anchor {}: INACTIVE", a.anchor_id)?,
        }
    }

    match &report.outcome {
        EvaluationOutcome::WaitingForAnchors { missing } => {
            writeln!(out)?;
            writeln!(out, "Waiting for {missing} more anchor(s)")?;
        }
        EvaluationOutcome::Failed { distances_m, error } => {
            writeln!(out)?;
            writeln!(out, "=== POSITION CALCULATION ===")?;
            write_distances(out, distances_m)?;
            writeln!(out, "Position calculation failed: {error}")?;
        }
        EvaluationOutcome::Located { distances_m, position, zone } => {
            writeln!(out)?;
            writeln!(out, "=== POSITION CALCULATION ===")?;
            write_distances(out, distances_m)?;
            writeln!(out, "Estimated position: X={:.2}m, Y={:.2}m", position.x, position.y)?;
            writeln!(out)?;
            writeln!(out, "Map (top-down view):")?;
            writeln!(out, "{MAP}")?;
            writeln!(out, "  X ≈ ({:.1}, {:.1})", position.x, position.y)?;
            writeln!(out, "Zone: {}", zone.description())?;
        }
    }

    write!(out, "==============================")
}

fn write_distances(out: &mut String, d: &[f64; 3]) -> std::fmt::Result {
    writeln!(out, "Estimated distances: A1={:.1}m, A2={:.1}m, A3={:.1}m", d[0], d[1], d[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use positioning::{AnchorStatus, Point2, TrilaterationError, Zone};

    fn status(anchor_id: u8, active: bool) -> AnchorStatus {
        AnchorStatus {
            anchor_id,
            active,
            filtered_rssi: active.then_some(-55.0),
            distance_m: active.then_some(1.0),
            packet_count: 20,
            last_sequence: 19,
        }
    }

    #[test]
    fn test_waiting_block() {
        let report = EvaluationReport {
            at_ms: 2000,
            frames_received: 42,
            anchors: vec![status(1, true), status(2, false), status(3, false)],
            outcome: EvaluationOutcome::WaitingForAnchors { missing: 2 },
        };
        let text = render(&report);
        assert!(text.contains("Total packets received: 42"));
        assert!(text.contains("Anchor 1: RSSI=-55.0 dBm, Dist≈1.0 m, Pkts=20"));
        assert!(text.contains("Anchor 2: INACTIVE"));
        assert!(text.contains("Waiting for 2 more anchor(s)"));
        assert!(!text.contains("POSITION CALCULATION"));
    }

    #[test]
    fn test_located_block() {
        let report = EvaluationReport {
            at_ms: 4000,
            frames_received: 60,
            anchors: vec![status(1, true), status(2, true), status(3, true)],
            outcome: EvaluationOutcome::Located {
                distances_m: [0.6, 0.6, 0.6],
                position: Point2::new(0.01, -0.14),
                zone: Zone::Center,
            },
        };
        let text = render(&report);
        assert!(text.contains("Estimated distances: A1=0.6m, A2=0.6m, A3=0.6m"));
        assert!(text.contains("Estimated position: X=0.01m, Y=-0.14m"));
        assert!(text.contains("A2-------A3"));
        assert!(text.contains("Zone: Center area"));
    }

    #[test]
    fn test_failed_block() {
        let report = EvaluationReport {
            at_ms: 6000,
            frames_received: 90,
            anchors: vec![status(1, true), status(2, true), status(3, true)],
            outcome: EvaluationOutcome::Failed {
                distances_m: [0.6, 50.0, 0.6],
                error: TrilaterationError::DistanceOutOfRange {
                    anchor_id: 2,
                    distance_m: 50.0,
                    min_m: 0.1,
                    max_m: 20.0,
                },
            },
        };
        let text = render(&report);
        assert!(text.contains("Position calculation failed: distance to anchor 2 out of range"));
        assert!(!text.contains("Zone:"));
    }
}
