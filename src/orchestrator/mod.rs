//! Application-level orchestration utilities.
//!
//! This module owns run lifecycle control (Idle/Running, single-flight) and
//! post-run processing into redraw instructions. UI/CLI layers call into this
//! module to keep responsibilities separated.

mod controller;
mod post_process;

pub(crate) use controller::{run_controller, run_pipeline, UiCommand};
pub(crate) use post_process::{build_report, build_views, initial_views, ViewConfig};
