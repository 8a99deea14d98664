// src/report/mod.rs — Render a recorded run into a readable dashboard

use std::fs;
use std::path::{Path, PathBuf};

use crate::infra::errors::ApsisError;
use crate::recorder::TRACE_FILE;

pub const DASHBOARD_FILE: &str = "dashboard.md";

/// Reads only what the recorder persisted; rendering the same data twice
/// must produce the same artifact.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, run_dir: &Path) -> Result<PathBuf, ApsisError>;
}

#[derive(Debug, Clone)]
struct TraceRow {
    iteration: u32,
    pos_x: f64,
    pos_z: f64,
    max_temp: f64,
    min_dist: f64,
    is_safe: bool,
    solver_cost: f64,
}

fn parse_trace(content: &str) -> Result<Vec<TraceRow>, ApsisError> {
    let mut rows = Vec::new();
    for (lineno, line) in content.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 9 {
            return Err(anyhow::anyhow!(
                "trace line {}: expected 9 fields, got {}",
                lineno + 1,
                fields.len()
            )
            .into());
        }
        let num = |i: usize| -> Result<f64, ApsisError> {
            fields[i]
                .parse()
                .map_err(|e| anyhow::anyhow!("trace line {}: {e}", lineno + 1).into())
        };
        rows.push(TraceRow {
            iteration: fields[0]
                .parse()
                .map_err(|e| anyhow::anyhow!("trace line {}: {e}", lineno + 1))?,
            pos_x: num(1)?,
            pos_z: num(3)?,
            max_temp: num(4)?,
            min_dist: num(5)?,
            is_safe: fields[6] == "true",
            solver_cost: num(7)?,
        });
    }
    Ok(rows)
}

/// Markdown dashboard: trajectory table plus convergence summaries for
/// temperature, rib clearance, and solver cost.
pub struct MarkdownReport;

impl ReportRenderer for MarkdownReport {
    fn render(&self, run_dir: &Path) -> Result<PathBuf, ApsisError> {
        let trace_path = run_dir.join(TRACE_FILE);
        let content = fs::read_to_string(&trace_path)?;
        let rows = parse_trace(&content)?;

        let mut md = String::from("# Design Evolution Dashboard\n\n");

        if rows.is_empty() {
            md.push_str("No iterations recorded.\n");
        } else {
            let first = &rows[0];
            let last = &rows[rows.len() - 1];

            md.push_str("## Trajectory (X-Z plane)\n\n");
            md.push_str("| Iter | X (mm) | Z (mm) | Temp (C) | Gap (mm) | Safe | Cost |\n");
            md.push_str("|-----:|-------:|-------:|---------:|---------:|:----:|-----:|\n");
            for r in &rows {
                md.push_str(&format!(
                    "| {} | {:.2} | {:.2} | {:.1} | {:.2} | {} | {:.2} |\n",
                    r.iteration,
                    r.pos_x,
                    r.pos_z,
                    r.max_temp,
                    r.min_dist,
                    if r.is_safe { "yes" } else { "no" },
                    r.solver_cost,
                ));
            }

            md.push_str("\n## Thermal convergence\n\n");
            md.push_str(&format!(
                "Max temperature went {:.1}C -> {:.1}C over {} iteration(s).\n",
                first.max_temp,
                last.max_temp,
                rows.len()
            ));

            md.push_str("\n## Rib clearance\n\n");
            md.push_str(&format!(
                "Gap to rib went {:.2}mm -> {:.2}mm.\n",
                first.min_dist, last.min_dist
            ));

            md.push_str("\n## Solver cost\n\n");
            md.push_str(&format!(
                "Final micro-solver cost: {:.4}.\n",
                last.solver_cost
            ));

            md.push_str(&format!(
                "\nFinal state: {}.\n",
                if last.is_safe {
                    "feasible"
                } else {
                    "infeasible"
                }
            ));
        }

        let out = run_dir.join(DASHBOARD_FILE);
        fs::write(&out, md)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "\
iteration,pos_x,pos_y,pos_z,max_temp,min_dist_rib,is_safe,solver_cost,ai_reasoning_len
1,8.0000,0.0000,18.0000,30.30,2.00,false,0.0000,0
2,6.0000,0.0000,18.0000,36.00,4.00,true,1.8000,61
";

    fn write_trace(dir: &Path, content: &str) {
        fs::write(dir.join(TRACE_FILE), content).unwrap();
    }

    #[test]
    fn test_parse_trace_rows() {
        let rows = parse_trace(TRACE).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].iteration, 1);
        assert!(!rows[0].is_safe);
        assert!(rows[1].is_safe);
        assert!((rows[1].pos_x - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rejects_short_rows() {
        let bad = "iteration,pos_x\n1,2.0\n";
        assert!(parse_trace(bad).is_err());
    }

    #[test]
    fn test_render_dashboard_content() {
        let tmp = tempfile::tempdir().unwrap();
        write_trace(tmp.path(), TRACE);

        let artifact = MarkdownReport.render(tmp.path()).unwrap();
        let md = fs::read_to_string(&artifact).unwrap();
        assert!(md.contains("## Trajectory"));
        assert!(md.contains("| 2 | 6.00 |"));
        assert!(md.contains("30.3C -> 36.0C"));
        assert!(md.contains("Final state: feasible."));
    }

    #[test]
    fn test_render_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        write_trace(tmp.path(), TRACE);

        let first = MarkdownReport.render(tmp.path()).unwrap();
        let a = fs::read_to_string(&first).unwrap();
        let second = MarkdownReport.render(tmp.path()).unwrap();
        let b = fs::read_to_string(&second).unwrap();
        assert_eq!(first, second);
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_empty_run() {
        let tmp = tempfile::tempdir().unwrap();
        write_trace(
            tmp.path(),
            "iteration,pos_x,pos_y,pos_z,max_temp,min_dist_rib,is_safe,solver_cost,ai_reasoning_len\n",
        );
        let artifact = MarkdownReport.render(tmp.path()).unwrap();
        let md = fs::read_to_string(artifact).unwrap();
        assert!(md.contains("No iterations recorded."));
    }

    #[test]
    fn test_render_missing_trace_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            MarkdownReport.render(tmp.path()),
            Err(ApsisError::Io(_))
        ));
    }
}
