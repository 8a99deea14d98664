// src/main.rs — Apsis entry point

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use apsis::cli::{Cli, Commands};
use apsis::core::{LoopConfig, LoopController};
use apsis::infra::config::Config;
use apsis::infra::logger;
use apsis::oracle::http::HttpOracle;
use apsis::recorder::{FsRecorder, RunRecorder};
use apsis::report::{MarkdownReport, ReportRenderer};
use apsis::sim::RibHeatScene;
use apsis::solver::SolverOptions;

#[tokio::main]
async fn main() {
    // Respects RUST_LOG
    logger::init_logging("info");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(ref path) = cli.config {
        Config::load_from(Path::new(path))?
    } else {
        Config::load()?
    };

    match cli.command {
        Commands::Run { iterations, strict } => run_loop(config, iterations, strict).await,
        Commands::Report { run_dir } => {
            let artifact = MarkdownReport.render(Path::new(&run_dir))?;
            println!("Dashboard written to {}", artifact.display());
            Ok(())
        }
    }
}

async fn run_loop(
    config: Config,
    iterations: Option<u32>,
    strict: bool,
) -> anyhow::Result<()> {
    let mut loop_cfg = LoopConfig::from(&config.run);
    if let Some(n) = iterations {
        loop_cfg.max_iterations = n;
    }
    loop_cfg.strict_schema = loop_cfg.strict_schema || strict;

    let oracle = Arc::new(HttpOracle::new(
        config.oracle.endpoint.clone(),
        Duration::from_secs(config.oracle.timeout_secs),
    )?);
    let scene = Arc::new(RibHeatScene::new(config.scene.clone()));
    let start = scene.start_position();
    let recorder = Box::new(FsRecorder::new(&config.run.log_dir)?);
    tracing::info!(
        run = %recorder.run_id(),
        dir = %recorder.run_dir().display(),
        "Recording to"
    );

    // Ctrl-C stops the run at the next iteration boundary.
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_signal.store(true, Ordering::Relaxed);
        }
    });

    let mut controller = LoopController::new(
        oracle,
        scene,
        recorder,
        Box::new(MarkdownReport),
        loop_cfg,
    )
    .with_solver_options(SolverOptions::from(&config.solver))
    .with_cancel_flag(cancel);

    let outcome = controller.run(start).await?;
    println!(
        "{} after {} iteration(s). Records: {}",
        outcome.status,
        outcome.iterations,
        outcome.run_dir.display()
    );
    println!("Dashboard: {}", outcome.artifact.display());
    Ok(())
}
