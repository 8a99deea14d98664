// src/recorder/mod.rs — Durable, append-only run records

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use uuid::Uuid;

use crate::core::state::{Position, RunStatus};
use crate::infra::errors::ApsisError;
use crate::protocol::{SearchSpec, StateDigest};

/// One row of the per-iteration metrics trace.
#[derive(Debug, Clone)]
pub struct MetricsRow {
    pub iteration: u32,
    pub position: Position,
    pub max_temp: f64,
    pub min_dist_rib: f64,
    pub is_safe: bool,
    pub solver_cost: f64,
    pub reasoning_len: usize,
}

/// Append-only persistence boundary. Writes must be durable before the
/// report renderer reads them at run end; the filesystem implementation
/// writes synchronously, which is that barrier.
pub trait RunRecorder: Send {
    fn append_metrics(&mut self, row: &MetricsRow) -> Result<(), ApsisError>;

    fn append_exchange(
        &mut self,
        iteration: u32,
        digest: &StateDigest,
        spec: &SearchSpec,
    ) -> Result<(), ApsisError>;

    /// Out-of-contract oracle replies are still part of the run record:
    /// the digest and the raw payload go to disk with the rejection reason
    /// so the exchange can be diagnosed after the fact.
    fn append_rejected(
        &mut self,
        iteration: u32,
        digest: &StateDigest,
        raw: &str,
        error: &ApsisError,
    ) -> Result<(), ApsisError>;

    fn finalize(&mut self, status: &RunStatus, total_iterations: u32) -> Result<(), ApsisError>;

    fn run_dir(&self) -> &Path;
}

pub const TRACE_FILE: &str = "evolution_trace.csv";
pub const EXCHANGES_DIR: &str = "exchanges";
pub const SUMMARY_FILE: &str = "report.md";

const TRACE_HEADER: &str =
    "iteration,pos_x,pos_y,pos_z,max_temp,min_dist_rib,is_safe,solver_cost,ai_reasoning_len\n";

/// Filesystem recorder: one timestamped directory per run holding the CSV
/// trace, the full digest/plan pair per iteration, and a final summary.
pub struct FsRecorder {
    run_id: Uuid,
    run_dir: PathBuf,
}

impl FsRecorder {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, ApsisError> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let run_dir = base_dir.as_ref().join(format!("run_{stamp}"));
        fs::create_dir_all(run_dir.join(EXCHANGES_DIR))?;
        fs::write(run_dir.join(TRACE_FILE), TRACE_HEADER)?;
        Ok(Self {
            run_id: Uuid::new_v4(),
            run_dir,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    fn append_line(&self, line: &str) -> Result<(), ApsisError> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(self.run_dir.join(TRACE_FILE))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl RunRecorder for FsRecorder {
    fn append_metrics(&mut self, row: &MetricsRow) -> Result<(), ApsisError> {
        self.append_line(&format!(
            "{},{:.4},{:.4},{:.4},{:.2},{:.2},{},{:.4},{}\n",
            row.iteration,
            row.position.x,
            row.position.y,
            row.position.z,
            row.max_temp,
            row.min_dist_rib,
            row.is_safe,
            row.solver_cost,
            row.reasoning_len,
        ))
    }

    fn append_exchange(
        &mut self,
        iteration: u32,
        digest: &StateDigest,
        spec: &SearchSpec,
    ) -> Result<(), ApsisError> {
        let dir = self.run_dir.join(EXCHANGES_DIR);
        fs::write(
            dir.join(format!("iter_{iteration:02}_req.json")),
            serde_json::to_string_pretty(digest).map_err(|e| anyhow::anyhow!(e))?,
        )?;
        fs::write(
            dir.join(format!("iter_{iteration:02}_resp.json")),
            serde_json::to_string_pretty(spec).map_err(|e| anyhow::anyhow!(e))?,
        )?;
        Ok(())
    }

    fn append_rejected(
        &mut self,
        iteration: u32,
        digest: &StateDigest,
        raw: &str,
        error: &ApsisError,
    ) -> Result<(), ApsisError> {
        let dir = self.run_dir.join(EXCHANGES_DIR);
        fs::write(
            dir.join(format!("iter_{iteration:02}_req.json")),
            serde_json::to_string_pretty(digest).map_err(|e| anyhow::anyhow!(e))?,
        )?;
        // Same resp slot as a valid plan so every oracle round has a pair.
        let record = serde_json::json!({
            "rejected": error.to_string(),
            "raw": raw,
        });
        fs::write(
            dir.join(format!("iter_{iteration:02}_resp.json")),
            serde_json::to_string_pretty(&record).map_err(|e| anyhow::anyhow!(e))?,
        )?;
        Ok(())
    }

    fn finalize(&mut self, status: &RunStatus, total_iterations: u32) -> Result<(), ApsisError> {
        let summary = format!(
            "# Optimization Report\n\
             - **Run**: {}\n\
             - **Date**: {}\n\
             - **Status**: {}\n\
             - **Total Iterations**: {}\n\
             - **Log Path**: `{}`\n",
            self.run_id,
            Local::now().to_rfc3339(),
            status,
            total_iterations,
            self.run_dir.display(),
        );
        fs::write(self.run_dir.join(SUMMARY_FILE), summary)?;
        Ok(())
    }

    fn run_dir(&self) -> &Path {
        &self.run_dir
    }
}
