// src/sim/mod.rs — State evaluator boundary + demo rib/heat-source scene

use crate::core::state::Position;
use crate::infra::config::SceneConfig;
use crate::protocol::{Metrics, ViolationItem, ViolationKind};

/// What one evaluation pass produces: metrics, violations, and the
/// natural-language summaries the digest forwards to the oracle.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub metrics: Metrics,
    pub violations: Vec<ViolationItem>,
    pub geometry_summary: String,
    pub thermal_summary: String,
}

impl Evaluation {
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Boundary to the physics/engineering simulation. Pure and cheap to call
/// repeatedly; no state persists across calls.
pub trait Evaluate: Send + Sync {
    fn evaluate(&self, pos: &Position, iteration: u32) -> Evaluation;

    /// Scalar penalty surface the bounded solver minimizes. Piecewise with
    /// regime boundaries at the clash and thermal limits, so not smooth.
    fn penalty(&self, pos: &Position) -> f64;
}

/// Toy scene: a battery between a fixed structural rib and a heat source.
/// Temperatures follow an inverse-square falloff from the source.
pub struct RibHeatScene {
    cfg: SceneConfig,
}

impl RibHeatScene {
    pub fn new(cfg: SceneConfig) -> Self {
        Self { cfg }
    }

    pub fn start_position(&self) -> Position {
        Position::new(self.cfg.start[0], self.cfg.start[1], self.cfg.start[2])
    }

    fn dist_to_rib(&self, pos: &Position) -> f64 {
        (pos.x - self.cfg.rib_x).abs()
    }

    fn max_temp(&self, pos: &Position) -> f64 {
        let d_sq = (pos.x - self.cfg.heat_x).powi(2) + (pos.z - self.cfg.heat_z).powi(2);
        20.0 + 800.0 / (d_sq + 10.0)
    }
}

impl Evaluate for RibHeatScene {
    fn evaluate(&self, pos: &Position, iteration: u32) -> Evaluation {
        let dist = self.dist_to_rib(pos);
        let temp = self.max_temp(pos);
        let mut violations = Vec::new();

        if dist < self.cfg.safe_dist {
            violations.push(ViolationItem {
                id: format!("VIO_GEO_{iteration}"),
                kind: ViolationKind::GeometryClash,
                description: format!(
                    "Gap to Rib {:.2}mm < {}mm",
                    dist, self.cfg.safe_dist
                ),
                involved_components: vec!["Battery".into(), "Rib".into()],
                severity: 1.0,
            });
        }

        if temp > self.cfg.temp_limit {
            violations.push(ViolationItem {
                id: format!("VIO_THERM_{iteration}"),
                kind: ViolationKind::ThermalOverheat,
                description: format!("Temp {:.1}C > {}C", temp, self.cfg.temp_limit),
                involved_components: vec!["Battery".into(), "HeatSrc".into()],
                severity: (temp - self.cfg.temp_limit) / self.cfg.temp_limit,
            });
        }

        Evaluation {
            metrics: Metrics {
                max_temp: temp,
                min_dist: dist,
                extra: Default::default(),
            },
            violations,
            geometry_summary: format!(
                "Battery at ({:.2}, {:.2}, {:.2}). Rib (Fixed Wall) at X={}. \
                 HeatSource at ({}, {}).",
                pos.x, pos.y, pos.z, self.cfg.rib_x, self.cfg.heat_x, self.cfg.heat_z
            ),
            thermal_summary: format!("Max Temp {temp:.1}C."),
        }
    }

    fn penalty(&self, pos: &Position) -> f64 {
        let mut cost = 0.0;

        // Clash: hard quadratic wall inside the keep-out, plus a linear
        // margin band just outside it to keep solutions off the boundary.
        let d = self.dist_to_rib(pos);
        if d < self.cfg.safe_dist {
            cost += 1000.0 * (self.cfg.safe_dist - d).powi(2);
        } else if d < self.cfg.safe_dist + 1.0 {
            cost += 10.0 * (1.0 - (d - self.cfg.safe_dist));
        }

        // Thermal: steep above the limit, mild preference for cooler spots
        // below it.
        let t = self.max_temp(pos);
        if t > self.cfg.temp_limit {
            cost += 50.0 * (t - self.cfg.temp_limit);
        } else {
            cost += 0.05 * t;
        }

        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ViolationKind;

    fn scene() -> RibHeatScene {
        RibHeatScene::new(SceneConfig::default())
    }

    #[test]
    fn test_clash_violation_at_two_mm_gap() {
        // Battery at x=8 sits 2mm from the rib at x=10.
        let eval = scene().evaluate(&Position::new(8.0, 0.0, 18.0), 1);
        let clashes: Vec<_> = eval
            .violations
            .iter()
            .filter(|v| v.kind == ViolationKind::GeometryClash)
            .collect();
        assert_eq!(clashes.len(), 1);
        assert!((clashes[0].severity - 1.0).abs() < f64::EPSILON);
        assert!((eval.metrics.min_dist - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_feasible_position() {
        let eval = scene().evaluate(&Position::new(5.0, 0.0, 18.0), 1);
        assert!(eval.is_feasible());
        assert!(eval.metrics.max_temp < 50.0);
        assert!(eval.metrics.min_dist >= 3.0);
    }

    #[test]
    fn test_thermal_violation_near_heat_source() {
        // Close to the source at (0, 20) the inverse-square model overheats.
        let eval = scene().evaluate(&Position::new(1.0, 0.0, 20.0), 3);
        let thermals: Vec<_> = eval
            .violations
            .iter()
            .filter(|v| v.kind == ViolationKind::ThermalOverheat)
            .collect();
        assert_eq!(thermals.len(), 1);
        assert!(thermals[0].severity > 0.0);
    }

    #[test]
    fn test_penalty_wall_dominates_inside_keepout() {
        let s = scene();
        let inside = s.penalty(&Position::new(9.0, 0.0, 18.0)); // 1mm gap
        let outside = s.penalty(&Position::new(5.0, 0.0, 18.0)); // 5mm gap
        assert!(inside > 100.0 * outside.max(1.0));
    }

    #[test]
    fn test_penalty_margin_band_decreases_outward() {
        let s = scene();
        // Both in the 3..4mm margin band; further out is cheaper.
        let near = s.penalty(&Position::new(6.9, 0.0, 18.0));
        let far = s.penalty(&Position::new(6.2, 0.0, 18.0));
        assert!(near > far);
    }

    #[test]
    fn test_summaries_name_components() {
        let eval = scene().evaluate(&Position::new(8.0, 0.0, 18.0), 1);
        assert!(eval.geometry_summary.contains("Battery"));
        assert!(eval.geometry_summary.contains("Rib"));
        assert!(eval.thermal_summary.contains("Max Temp"));
    }
}
