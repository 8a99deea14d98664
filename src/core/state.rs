// src/core/state.rs — Run state: the only long-lived mutable entity

use serde::{Deserialize, Serialize};

use crate::protocol::Axis;

/// Component position in scene coordinates (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    /// Probe copy with one axis replaced. Cost functions evaluate these so
    /// the live configuration is never touched during a solve.
    pub fn with(&self, axis: Axis, value: f64) -> Self {
        let mut p = *self;
        p.set(axis, value);
        p
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Success,
    Failed(String),
    Timeout,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "SUCCESS"),
            RunStatus::Failed(reason) => write!(f, "FAILED: {reason}"),
            RunStatus::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

/// Mutable state owned exclusively by the loop controller, updated once per
/// iteration.
#[derive(Debug, Clone)]
pub struct RunState {
    pub position: Position,
    pub iteration: u32,
    pub history: Vec<String>,
    pub last_solver_cost: f64,
    pub last_reasoning: String,
}

impl RunState {
    pub fn new(start: Position) -> Self {
        Self {
            position: start,
            iteration: 0,
            history: Vec::new(),
            last_solver_cost: 0.0,
            last_reasoning: String::new(),
        }
    }

    pub fn push_history(&mut self, line: impl Into<String>) {
        self.history.push(line.into());
    }

    /// The most recent `window` history lines, oldest first.
    pub fn recent_history(&self, window: usize) -> Vec<String> {
        let skip = self.history.len().saturating_sub(window);
        self.history[skip..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_axis_access() {
        let mut p = Position::new(1.0, 2.0, 3.0);
        assert_eq!(p.get(Axis::X), 1.0);
        assert_eq!(p.get(Axis::Z), 3.0);
        p.set(Axis::Y, 9.0);
        assert_eq!(p.y, 9.0);
    }

    #[test]
    fn test_position_with_leaves_original_untouched() {
        let p = Position::new(1.0, 2.0, 3.0);
        let probe = p.with(Axis::X, -4.0);
        assert_eq!(probe.x, -4.0);
        assert_eq!(p.x, 1.0);
        assert_eq!(probe.y, p.y);
    }

    #[test]
    fn test_recent_history_window() {
        let mut s = RunState::new(Position::new(0.0, 0.0, 0.0));
        for i in 1..=5 {
            s.push_history(format!("Iter {i}"));
        }
        let recent = s.recent_history(3);
        assert_eq!(recent, vec!["Iter 3", "Iter 4", "Iter 5"]);
    }

    #[test]
    fn test_recent_history_shorter_than_window() {
        let mut s = RunState::new(Position::new(0.0, 0.0, 0.0));
        s.push_history("only one");
        assert_eq!(s.recent_history(3), vec!["only one"]);
        assert!(RunState::new(Position::new(0.0, 0.0, 0.0))
            .recent_history(3)
            .is_empty());
    }

    #[test]
    fn test_run_status_display() {
        assert_eq!(RunStatus::Success.to_string(), "SUCCESS");
        assert_eq!(RunStatus::Timeout.to_string(), "TIMEOUT");
        assert_eq!(
            RunStatus::Failed("oracle down".into()).to_string(),
            "FAILED: oracle down"
        );
    }
}
