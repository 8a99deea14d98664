// src/core/digest.rs — Build the oracle-facing state digest

use crate::core::state::RunState;
use crate::protocol::StateDigest;
use crate::sim::Evaluation;

/// Assemble a digest from the current run state and the latest evaluation.
/// History is truncated to the most recent `window` lines; older entries are
/// dropped, not summarized. Pure transformation, no error conditions.
pub fn build_digest(state: &RunState, eval: &Evaluation, window: usize) -> StateDigest {
    StateDigest {
        iteration: state.iteration,
        metrics: eval.metrics.clone(),
        violations: eval.violations.clone(),
        geometry_summary: eval.geometry_summary.clone(),
        thermal_summary: eval.thermal_summary.clone(),
        history_trace: state.recent_history(window),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Position;
    use crate::infra::config::SceneConfig;
    use crate::sim::{Evaluate, RibHeatScene};

    fn state_with_history(lines: u32) -> RunState {
        let mut state = RunState::new(Position::new(8.0, 0.0, 18.0));
        state.iteration = lines + 1;
        for i in 1..=lines {
            state.push_history(format!("Iter {i}: MOVE X range [-5, 0]."));
        }
        state
    }

    fn eval_at(state: &RunState) -> Evaluation {
        RibHeatScene::new(SceneConfig::default()).evaluate(&state.position, state.iteration)
    }

    #[test]
    fn test_history_truncated_to_window() {
        let state = state_with_history(5);
        let digest = build_digest(&state, &eval_at(&state), 3);
        assert_eq!(digest.history_trace.len(), 3);
        // Most recent entries survive, oldest first
        assert!(digest.history_trace[0].starts_with("Iter 3"));
        assert!(digest.history_trace[2].starts_with("Iter 5"));
    }

    #[test]
    fn test_short_history_passes_through() {
        let state = state_with_history(2);
        let digest = build_digest(&state, &eval_at(&state), 3);
        assert_eq!(digest.history_trace.len(), 2);
    }

    #[test]
    fn test_digest_mirrors_evaluation() {
        let state = state_with_history(0);
        let eval = eval_at(&state);
        let digest = build_digest(&state, &eval, 3);
        assert_eq!(digest.iteration, state.iteration);
        assert_eq!(digest.metrics, eval.metrics);
        assert_eq!(digest.violations.len(), eval.violations.len());
        assert_eq!(digest.geometry_summary, eval.geometry_summary);
    }

    #[test]
    fn test_digest_carries_summaries_only() {
        // The digest must expose derived summaries, never raw coordinates as
        // structured fields beyond the metric set.
        let state = state_with_history(0);
        let digest = build_digest(&state, &eval_at(&state), 3);
        let json = serde_json::to_string(&digest).unwrap();
        assert!(!json.contains("\"position\""));
        assert!(json.contains("geometry_summary"));
    }
}
