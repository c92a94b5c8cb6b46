//! Run lifecycle controller.
//!
//! Owns the Idle/Running state machine and emits events for presentation layers.

use super::post_process::{self, CompletedRun, ViewConfig};
use crate::engine::{EngineRun, SimEngine};
use crate::model::{
    InfoEvent, InvocationOutcome, RawParams, RunConfig, SimEvent, SimulationResult,
};
use crate::protocol;
use crate::validate::{self, Validated};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers to control simulation runs.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Run(Box<RawParams>),
    Quit,
}

/// Internal handle for the in-flight run. Its presence means Running.
struct RunCtx {
    validated: Validated,
    handle: Option<tokio::task::JoinHandle<EngineRun>>,
}

/// Validate, encode, invoke and ingest on the calling thread.
pub(crate) fn run_pipeline(cfg: &RunConfig, raw: &RawParams) -> CompletedRun {
    let validated = validate::validate(raw);
    let run = SimEngine::new(cfg.clone()).run(&validated.request);
    CompletedRun { validated, run }
}

/// Validation is cheap and stays on the runtime; the engine call blocks.
fn start_run(cfg: &RunConfig, raw: &RawParams) -> RunCtx {
    let validated = validate::validate(raw);
    let request = validated.request.clone();
    let engine = SimEngine::new(cfg.clone());
    let handle = tokio::task::spawn_blocking(move || engine.run(&request));
    RunCtx {
        validated,
        handle: Some(handle),
    }
}

fn worker_failed(validated: &Validated, err: tokio::task::JoinError) -> EngineRun {
    tracing::error!(error = %err, "simulation worker failed");
    EngineRun {
        sequence: protocol::encode(&validated.request),
        outcome: InvocationOutcome::not_launched(format!("Simulation worker failed: {err}")),
        result: SimulationResult::empty(),
    }
}

/// Serve run requests one at a time and emit events back to presentation layers.
///
/// A `Run` while Running is rejected. `Quit` (or a closed command channel)
/// waits for the in-flight run, since a launched engine cannot be cancelled.
pub(crate) async fn run_controller(
    cfg: &RunConfig,
    view_cfg: &ViewConfig,
    event_tx: UnboundedSender<SimEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut run_ctx: Option<RunCtx> = None;
    let mut quit_pending = false;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if !quit_pending => {
                match cmd {
                    Some(UiCommand::Run(raw)) => {
                        if run_ctx.is_some() {
                            tracing::info!("run requested while running");
                            let _ = event_tx.send(SimEvent::Info(InfoEvent::TriggerIgnored));
                        } else {
                            run_ctx = Some(start_run(cfg, &raw));
                            let _ = event_tx.send(SimEvent::RunStarted);
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        if run_ctx.is_none() {
                            break;
                        }
                        quit_pending = true;
                        let _ = event_tx.send(SimEvent::Info(InfoEvent::Message(
                            "Waiting for the running simulation to finish…".into(),
                        )));
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(ctx) = &mut run_ctx {
                    if let Some(h) = ctx.handle.as_mut() {
                        return Some(h.await);
                    }
                }
                futures::future::pending().await
            } => {
                if let (Some(join_res), Some(ctx)) = (maybe_done, run_ctx.take()) {
                    let run = match join_res {
                        Ok(run) => run,
                        Err(e) => worker_failed(&ctx.validated, e),
                    };
                    let completed = CompletedRun {
                        validated: ctx.validated,
                        run,
                    };
                    let views = post_process::build_views(view_cfg, &completed, view_cfg.now());
                    let _ = event_tx.send(SimEvent::RunCompleted {
                        views: Box::new(views),
                    });
                    if quit_pending {
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
