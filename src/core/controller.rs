// src/core/controller.rs — Closed-loop iteration controller
//
// Each pass is a strict chain: evaluate → converged? → digest → query
// oracle → validate → solve → apply → record. No iteration starts before
// the previous one's side effects are complete.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::digest::build_digest;
use crate::core::state::{Position, RunState, RunStatus};
use crate::infra::config::RunConfig;
use crate::infra::errors::ApsisError;
use crate::oracle::Oracle;
use crate::protocol::validate::parse_search_spec;
use crate::protocol::{OpKind, SearchSpec};
use crate::recorder::{MetricsRow, RunRecorder};
use crate::report::ReportRenderer;
use crate::sim::Evaluate;
use crate::solver::{minimize_scalar, SolverOptions};

/// Loop-level knobs, passed in at construction so the controller stays
/// testable with deterministic fixtures.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub max_iterations: u32,
    pub history_window: usize,
    /// When true, an oracle plan outside contract ends the run as FAILED
    /// instead of skipping the iteration's parameter change.
    pub strict_schema: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            history_window: 3,
            strict_schema: false,
        }
    }
}

impl From<&RunConfig> for LoopConfig {
    fn from(cfg: &RunConfig) -> Self {
        Self {
            max_iterations: cfg.max_iterations,
            history_window: cfg.history_window,
            strict_schema: cfg.strict_schema,
        }
    }
}

/// What a finished run hands back to the caller.
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub iterations: u32,
    pub run_dir: std::path::PathBuf,
    pub artifact: std::path::PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Evaluating,
    Querying,
    Validating,
    Solving,
    Applying,
}

pub struct LoopController {
    oracle: Arc<dyn Oracle>,
    evaluator: Arc<dyn Evaluate>,
    recorder: Box<dyn RunRecorder>,
    renderer: Box<dyn ReportRenderer>,
    config: LoopConfig,
    solver_opts: SolverOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl LoopController {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        evaluator: Arc<dyn Evaluate>,
        recorder: Box<dyn RunRecorder>,
        renderer: Box<dyn ReportRenderer>,
        config: LoopConfig,
    ) -> Self {
        Self {
            oracle,
            evaluator,
            recorder,
            renderer,
            config,
            solver_opts: SolverOptions::default(),
            cancel: None,
        }
    }

    pub fn with_solver_options(mut self, opts: SolverOptions) -> Self {
        self.solver_opts = opts;
        self
    }

    /// External shutdown flag, honored at iteration boundaries only so a
    /// mid-solve cancellation can never leave the configuration perturbed.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|f| f.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Drive the full loop from `start` to a terminal state.
    pub async fn run(&mut self, start: Position) -> Result<RunOutcome, ApsisError> {
        let mut state = RunState::new(start);
        let mut status: Option<RunStatus> = None;

        for i in 1..=self.config.max_iterations {
            if self.cancelled() {
                tracing::info!(iteration = i, "Cancellation requested; stopping run");
                status = Some(RunStatus::Failed("cancelled".into()));
                break;
            }
            state.iteration = i;

            tracing::debug!(iteration = i, phase = ?Phase::Evaluating);
            let eval = self.evaluator.evaluate(&state.position, i);
            let is_safe = eval.is_feasible();

            self.recorder.append_metrics(&MetricsRow {
                iteration: i,
                position: state.position,
                max_temp: eval.metrics.max_temp,
                min_dist_rib: eval.metrics.min_dist,
                is_safe,
                solver_cost: state.last_solver_cost,
                reasoning_len: state.last_reasoning.len(),
            })?;

            if is_safe {
                tracing::info!(iteration = i, "Design converged: zero violations");
                status = Some(RunStatus::Success);
                break;
            }

            tracing::debug!(iteration = i, phase = ?Phase::Querying, oracle = self.oracle.id());
            let digest = build_digest(&state, &eval, self.config.history_window);
            tracing::trace!(prompt = %digest.to_markdown(), "Digest sent to oracle");
            let raw = match self.oracle.propose(&digest).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::error!(iteration = i, error = %e, "Oracle exchange failed");
                    status = Some(RunStatus::Failed(e.to_string()));
                    break;
                }
            };

            tracing::debug!(iteration = i, phase = ?Phase::Validating);
            let spec = match parse_search_spec(&raw) {
                Ok(spec) => spec,
                Err(e) if e.is_recoverable() && !self.config.strict_schema => {
                    tracing::warn!(
                        iteration = i,
                        error = %e,
                        "Oracle plan rejected; no parameter change this iteration"
                    );
                    // Rejected replies still go to disk for post-hoc diagnosis.
                    self.recorder.append_rejected(i, &digest, &raw, &e)?;
                    state.push_history(format!("Iter {i}: oracle plan rejected ({e})."));
                    continue;
                }
                Err(e) => {
                    self.recorder.append_rejected(i, &digest, &raw, &e)?;
                    status = Some(RunStatus::Failed(e.to_string()));
                    break;
                }
            };

            state.last_reasoning = spec.reasoning_summary.clone();
            self.recorder.append_exchange(i, &digest, &spec)?;

            tracing::debug!(iteration = i, phase = ?Phase::Solving, plan = %spec.plan_id);
            self.execute_first_action(&mut state, &spec);
        }

        let status = status.unwrap_or(RunStatus::Timeout);
        if status == RunStatus::Timeout {
            tracing::warn!(
                max_iterations = self.config.max_iterations,
                "Iteration ceiling reached without convergence"
            );
        }

        self.recorder.finalize(&status, state.iteration)?;
        let run_dir = self.recorder.run_dir().to_path_buf();
        let artifact = self.renderer.render(&run_dir)?;

        tracing::info!(status = %status, iterations = state.iteration, dir = %run_dir.display(), "Run finished");
        Ok(RunOutcome {
            status,
            iterations: state.iteration,
            run_dir,
            artifact,
        })
    }

    /// Only the first action in a plan drives a parameter change; any others
    /// are already persisted with the exchange for traceability.
    fn execute_first_action(&mut self, state: &mut RunState, spec: &SearchSpec) {
        let i = state.iteration;
        let action = &spec.actions[0];
        if spec.actions.len() > 1 {
            tracing::debug!(
                skipped = spec.actions.len() - 1,
                "Plan carries extra actions; only the first executes"
            );
        }

        match (action.op_id, action.search_axis) {
            (OpKind::Move, Some(axis)) => {
                let current = state.position.get(axis);
                let lo = current + action.bounds[0];
                let hi = current + action.bounds[1];

                // Cost closures probe a copy of the position, so the live
                // configuration is untouched until the result is applied.
                let baseline = state.position;
                let ev = &*self.evaluator;
                let result = minimize_scalar(
                    |v| ev.penalty(&baseline.with(axis, v)),
                    lo,
                    hi,
                    &self.solver_opts,
                );

                match result {
                    Ok(sol) => {
                        tracing::debug!(iteration = i, phase = ?Phase::Applying, x = sol.x, cost = sol.cost);
                        let delta = sol.x - current;
                        state.position.set(axis, sol.x);
                        state.last_solver_cost = sol.cost;
                        state.push_history(format!(
                            "Iter {i}: MOVE {axis} range [{:.1}, {:.1}]. Solver delta {delta:.2}. Result: {}",
                            action.bounds[0],
                            action.bounds[1],
                            if delta.abs() > 1e-9 { "Moved" } else { "Stuck" },
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(iteration = i, error = %e, "Solver gave no improvement");
                        state.push_history(format!(
                            "Iter {i}: MOVE {axis} failed to converge. No change."
                        ));
                    }
                }
            }
            _ => {
                // Non-MOVE operations are accepted into history but not
                // executed against the configuration.
                state.push_history(format!(
                    "Iter {i}: {} on {} executed symbolically.",
                    action.op_id, action.target_component,
                ));
            }
        }
    }
}
