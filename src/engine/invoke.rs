//! One-shot launch of the external simulation engine.

use crate::model::{ExitState, InvocationOutcome, ProtocolSequence, RunConfig};
use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("Binary not found: {0}")]
    BinaryNotFound(String),
    #[error("Failed to launch engine: {0}")]
    Launch(#[source] std::io::Error),
    #[error("Engine stdin was not captured")]
    StdinUnavailable,
    #[error("Failed to collect engine output: {0}")]
    Wait(#[source] std::io::Error),
}

/// Run the engine to completion, feeding it `sequence` on stdin.
///
/// Blocks with no timeout. Failures are folded into the outcome's warnings;
/// a missing binary or a failed launch yields an outcome with
/// `ExitState::NotLaunched`.
pub fn invoke(cfg: &RunConfig, sequence: &ProtocolSequence) -> InvocationOutcome {
    match run_engine(cfg, sequence) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(engine = %cfg.engine.display(), error = %e, "engine not run");
            InvocationOutcome::not_launched(e.to_string())
        }
    }
}

fn run_engine(
    cfg: &RunConfig,
    sequence: &ProtocolSequence,
) -> Result<InvocationOutcome, InvokeError> {
    if !cfg.engine.is_file() {
        return Err(InvokeError::BinaryNotFound(cfg.engine.display().to_string()));
    }
    // Relative program paths combined with current_dir resolve differently per platform.
    let engine = cfg.engine.canonicalize().map_err(InvokeError::Launch)?;

    tracing::debug!(
        engine = %engine.display(),
        workdir = %cfg.workdir.display(),
        artifact = %cfg.artifact.display(),
        tokens = ?sequence.values(),
        "launching engine"
    );

    let mut child = Command::new(&engine)
        .args(&cfg.engine_args)
        .current_dir(&cfg.workdir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(InvokeError::Launch)?;

    // Write from a separate thread so a chatty engine cannot fill its stdout
    // pipe while we are still blocked on stdin. Dropping stdin signals EOF.
    let mut stdin = child.stdin.take().ok_or(InvokeError::StdinUnavailable)?;
    let input = sequence.to_stdin();
    let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

    let output = child.wait_with_output().map_err(InvokeError::Wait)?;

    match writer.join() {
        Ok(Ok(())) => {}
        // The engine may exit before reading everything; its exit code tells the story.
        Ok(Err(e)) => tracing::debug!(error = %e, "engine closed stdin early"),
        Err(_) => tracing::debug!("stdin writer thread panicked"),
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    tracing::trace!(%stdout, "engine stdout");

    let mut warnings = Vec::new();
    let status = match output.status.code() {
        Some(0) => ExitState::Exited(0),
        Some(code) => {
            warnings.push(format!("Engine exited with code {code}"));
            ExitState::Exited(code)
        }
        None => {
            warnings.push("Engine terminated by signal".to_string());
            ExitState::Signaled
        }
    };

    if !warnings.is_empty() {
        tracing::warn!(status = ?status, stderr = %stderr.trim(), "engine failed");
    }

    Ok(InvocationOutcome {
        status,
        stdout,
        stderr,
        warnings,
    })
}
