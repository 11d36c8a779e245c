//! Groundhog command line
//!
//! Launches (or attaches to) Chrome, loads the model client once, and runs a
//! single task to completion. Ctrl-C stops the run at the next step boundary.

use anyhow::Context;
use clap::Parser;
use groundhog::agent::DEFAULT_MAX_STEPS;
use groundhog::dom::DEFAULT_MAX_ELEMENTS;
use groundhog::{
    Agent, AgentConfig, BrowserSession, ConnectionOptions, LaunchOptions, ModelConfig, ModelHandle, PageDriver,
    StopSignal, TaskOutcome, VisionModelClient,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "groundhog")]
#[command(version)]
#[command(about = "Vision-language browser agent", long_about = None)]
struct Cli {
    /// What the agent should accomplish
    #[arg(long)]
    goal: String,

    /// Start page; a scheme is added when missing
    #[arg(long)]
    url: String,

    /// Step budget
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    steps: u32,

    /// Run Chrome without a window
    #[arg(long)]
    headless: bool,

    /// Close the browser without waiting for Enter
    #[arg(long)]
    auto_close: bool,

    /// Listing length cap, sentinel included
    #[arg(long, default_value_t = DEFAULT_MAX_ELEMENTS)]
    max_elements: usize,

    /// Base directory for per-step debug traces
    #[arg(long, value_name = "DIR", default_value = "debug_traces")]
    trace_dir: PathBuf,

    /// Do not write debug traces
    #[arg(long)]
    no_trace: bool,

    /// Where to save the screenshot taken on success
    #[arg(long, value_name = "PATH", default_value = "groundhog_proof.png")]
    proof: PathBuf,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// WebSocket endpoint of an already running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Served model name (overrides GROUNDHOG_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible base URL (overrides GROUNDHOG_MODEL_URL)
    #[arg(long, value_name = "URL")]
    model_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut model_config = ModelConfig::from_env()?;
    if let Some(model) = &cli.model {
        model_config = model_config.model(model);
    }
    if let Some(url) = &cli.model_url {
        model_config = model_config.base_url(url);
    }

    let stop = StopSignal::new();
    let worker_stop = stop.clone();
    let mut job = tokio::task::spawn_blocking(move || run(cli, model_config, worker_stop));

    let succeeded = tokio::select! {
        joined = &mut job => joined?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Stopping after the current step...");
            stop.stop();
            job.await?
        }
    }?;

    Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn run(cli: Cli, model_config: ModelConfig, stop: StopSignal) -> anyhow::Result<bool> {
    let model = ModelHandle::new(VisionModelClient::new(model_config)?);
    let mut session = open_browser(&cli)?;

    let mut config = AgentConfig::new().max_steps(cli.steps).max_elements(cli.max_elements);
    if !cli.no_trace {
        config = config.trace_dir(&cli.trace_dir);
    }

    println!("Goal: {}", cli.goal);
    let started = Instant::now();
    let outcome = Agent::new(&mut session, &model, config)
        .with_stop_signal(stop)
        .run_task(&cli.goal, &cli.url);
    let elapsed = started.elapsed().as_secs_f64();

    let succeeded = match &outcome {
        Ok(TaskOutcome::Succeeded { result, steps }) => {
            println!("SUCCESS in {} steps ({:.1}s)", steps, elapsed);
            if let Some(result) = result {
                println!("Result: {}", result);
            }
            save_proof(&session, &cli.proof)?;
            println!("Final URL: {}", session.current_url()?);
            true
        }
        Ok(TaskOutcome::Failed { reason, steps }) => {
            println!("FAILED after {} steps ({:.1}s): {}", steps, elapsed, reason);
            false
        }
        Err(e) => {
            println!("ERROR after {:.1}s: {}", elapsed, e);
            false
        }
    };

    if !cli.headless && !cli.auto_close {
        println!("Press Enter to close the browser...");
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
    }

    session.close()?;
    outcome?;
    Ok(succeeded)
}

fn open_browser(cli: &Cli) -> anyhow::Result<BrowserSession> {
    if let Some(ws) = &cli.ws_endpoint {
        return Ok(BrowserSession::connect(ConnectionOptions::new(ws))?);
    }

    let mut options = LaunchOptions::new().headless(cli.headless);
    if let Some(path) = &cli.chrome_path {
        options = options.chrome_path(path);
    }
    if let Some(dir) = &cli.user_data_dir {
        options = options.user_data_dir(dir);
    }
    Ok(BrowserSession::launch(options)?)
}

fn save_proof(session: &BrowserSession, path: &Path) -> anyhow::Result<()> {
    let png = session.screenshot_png()?;
    std::fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Proof screenshot: {}", path.display());
    Ok(())
}
