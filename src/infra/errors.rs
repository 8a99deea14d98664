// src/infra/errors.rs — Error types for Apsis

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApsisError {
    // Protocol errors (recoverable at the run level)
    #[error("Schema violation at '{field}': {message}")]
    SchemaViolation { field: String, message: String },

    #[error("Oracle payload is not parseable as JSON: {0}")]
    MalformedPayload(String),

    // Oracle errors (fatal to the run)
    #[error("Oracle unreachable: {0}")]
    OracleUnavailable(String),

    #[error("Oracle returned failure status {code}: {message}")]
    OracleError { code: u16, message: String },

    // Solver errors (recoverable: no parameter change this iteration)
    #[error("Bounded search did not converge within {evals} evaluations (interval width {width})")]
    SolverFailure { evals: u32, width: f64 },

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApsisError {
    /// Recoverable errors skip the iteration's parameter change; the loop
    /// itself keeps going. Everything else terminates the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ApsisError::SchemaViolation { .. }
                | ApsisError::MalformedPayload(_)
                | ApsisError::SolverFailure { .. }
        )
    }
}
