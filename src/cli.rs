use crate::model::{RawParams, RunConfig, ENGINE_ARTIFACT};
use crate::orchestrator::{self, ViewConfig};
use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "circuit-dash",
    version,
    about = "Dashboard for an external circuit simulation engine"
)]
pub struct Cli {
    /// Path to the simulation engine executable
    #[arg(long, default_value = "./be-sim")]
    pub engine: PathBuf,

    /// Extra argument passed to the engine before it reads stdin (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Working directory the engine runs in
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// CSV artifact to ingest [default: <workdir>/resultats/simulations/circuit_output.csv]
    #[arg(long)]
    pub artifact: Option<PathBuf>,

    /// Run once and print the JSON report (no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Run once and print a text summary (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Append logs to this file; the TUI otherwise logs nowhere
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Start a simulation as soon as the TUI opens
    #[arg(long)]
    pub run_on_launch: bool,

    /// JSON object of raw parameters; flags below override its fields
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Circuit type: A, B, C or D
    #[arg(long)]
    pub circuit: Option<String>,

    /// Source: Sinusoidal, Step, Triangle or Square
    #[arg(long)]
    pub source: Option<String>,

    /// Method: Euler, Euler2, Heun or RK4
    #[arg(long)]
    pub method: Option<String>,

    /// R / R1 in ohms
    #[arg(long, allow_hyphen_values = true)]
    pub resistance: Option<String>,

    /// R2 in ohms (circuit B)
    #[arg(long, allow_hyphen_values = true)]
    pub r2: Option<String>,

    /// C in farads
    #[arg(long, allow_hyphen_values = true)]
    pub capacitance: Option<String>,

    /// L in henries (circuits C and D)
    #[arg(long, allow_hyphen_values = true)]
    pub inductance: Option<String>,

    /// Integration step h in seconds
    #[arg(long, allow_hyphen_values = true)]
    pub step: Option<String>,

    /// Simulated duration in seconds
    #[arg(long, allow_hyphen_values = true)]
    pub t_max: Option<String>,

    /// Source amplitude in volts
    #[arg(long, allow_hyphen_values = true)]
    pub amplitude: Option<String>,

    /// Source frequency in hertz
    #[arg(long, allow_hyphen_values = true)]
    pub frequency: Option<String>,

    /// Square-wave duty cycle
    #[arg(long, allow_hyphen_values = true)]
    pub duty: Option<String>,

    /// Source DC offset in volts
    #[arg(long, allow_hyphen_values = true)]
    pub offset: Option<String>,
}

impl Cli {
    pub fn is_headless(&self) -> bool {
        self.json || self.text || !cfg!(feature = "tui")
    }
}

/// Install the tracing subscriber. Headless modes log to stderr; the TUI owns
/// the terminal and logs only when `--log-file` is given.
pub fn init_logging(args: &Cli) -> Result<()> {
    let filter = |fallback: &str| {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };
    if let Some(path) = args.log_file.as_deref() {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter("info"))
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else if args.is_headless() {
        tracing_subscriber::fmt()
            .with_env_filter(filter("warn"))
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

pub async fn run(args: Cli, view_cfg: ViewConfig) -> Result<()> {
    if !args.is_headless() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args, view_cfg).await;
        }
    }
    run_headless(args, view_cfg).await
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> RunConfig {
    RunConfig {
        engine: args.engine.clone(),
        engine_args: args.engine_args.clone(),
        workdir: args.workdir.clone(),
        artifact: args
            .artifact
            .clone()
            .unwrap_or_else(|| args.workdir.join(ENGINE_ARTIFACT)),
    }
}

/// Raw parameters from `--params` with per-field flags layered on top.
pub fn build_raw_params(args: &Cli) -> Result<RawParams> {
    let mut raw = match args.params.as_deref() {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read parameters from {}", path.display()))?;
            serde_json::from_str::<RawParams>(&text)
                .with_context(|| format!("failed to parse parameters in {}", path.display()))?
        }
        None => RawParams::default(),
    };

    let overrides: [(&Option<String>, &mut Option<Value>); 13] = [
        (&args.circuit, &mut raw.circuit_type),
        (&args.source, &mut raw.source_type),
        (&args.method, &mut raw.method),
        (&args.resistance, &mut raw.r),
        (&args.r2, &mut raw.r2),
        (&args.capacitance, &mut raw.c),
        (&args.inductance, &mut raw.l),
        (&args.step, &mut raw.h),
        (&args.t_max, &mut raw.t_max),
        (&args.amplitude, &mut raw.amplitude),
        (&args.frequency, &mut raw.frequency),
        (&args.duty, &mut raw.duty_cycle),
        (&args.offset, &mut raw.offset),
    ];
    for (flag, slot) in overrides {
        if let Some(v) = flag {
            *slot = Some(Value::String(v.clone()));
        }
    }
    Ok(raw)
}

/// One run without the TUI: JSON report or text summary on stdout,
/// progress on stderr.
async fn run_headless(args: Cli, view_cfg: ViewConfig) -> Result<()> {
    let cfg = build_config(&args);
    let raw = build_raw_params(&args)?;
    let (out_tx, out_handle) = spawn_output_writer();

    let _ = out_tx.send(OutputLine::Stderr(format!(
        "Running {} in {}",
        cfg.engine.display(),
        cfg.workdir.display()
    )));
    let completed = tokio::task::spawn_blocking(move || orchestrator::run_pipeline(&cfg, &raw))
        .await
        .context("simulation worker failed")?;
    let views = orchestrator::build_views(&view_cfg, &completed, view_cfg.now());

    if args.json {
        let report = orchestrator::build_report(&completed, &views);
        let out = serde_json::to_string_pretty(&report)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        for line in crate::text_summary::build_text_summary(&views).lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn artifact_defaults_under_workdir() {
        let args = Cli::parse_from(["circuit-dash", "--workdir", "/tmp/sim"]);
        let cfg = build_config(&args);
        assert_eq!(
            cfg.artifact,
            PathBuf::from("/tmp/sim/resultats/simulations/circuit_output.csv")
        );
        assert_eq!(cfg.engine, PathBuf::from("./be-sim"));
    }

    #[test]
    fn engine_args_accept_leading_hyphens() {
        let args = Cli::parse_from([
            "circuit-dash",
            "--engine",
            "/bin/sh",
            "--engine-arg",
            "-x",
            "--engine-arg",
            "run.sh",
        ]);
        assert_eq!(build_config(&args).engine_args, vec!["-x", "run.sh"]);
    }

    #[test]
    fn flags_become_string_values() {
        let args = Cli::parse_from([
            "circuit-dash",
            "--circuit",
            "C",
            "--step",
            "2e-4",
            "--offset",
            "-1.5",
        ]);
        let raw = build_raw_params(&args).unwrap();
        assert_eq!(raw.circuit_type, Some(json!("C")));
        assert_eq!(raw.h, Some(json!("2e-4")));
        assert_eq!(raw.offset, Some(json!("-1.5")));
        assert!(raw.r.is_none());
    }

    #[test]
    fn flags_override_params_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{"r": 470, "method": "Heun"}"#).unwrap();
        let args = Cli::parse_from([
            "circuit-dash",
            "--params",
            path.to_str().unwrap(),
            "--method",
            "Euler",
        ]);
        let raw = build_raw_params(&args).unwrap();
        assert_eq!(raw.r, Some(json!(470)));
        assert_eq!(raw.method, Some(json!("Euler")));
    }

    #[test]
    fn unreadable_params_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, "not json").unwrap();
        let args = Cli::parse_from(["circuit-dash", "--params", path.to_str().unwrap()]);
        let err = build_raw_params(&args).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse parameters"));
    }

    #[test]
    fn json_and_text_conflict() {
        assert!(Cli::try_parse_from(["circuit-dash", "--json", "--text"]).is_err());
    }
}
