//! Rendering of a `SimulationRequest` into the engine's prompt sequence.
//!
//! The engine reads its parameters interactively and decides by itself how
//! many values come next, so token count and order must match its prompts
//! exactly. The layout is expressed as a decision table: `layout` maps
//! (circuit, source) to the ordered slot groups, and `render` turns one slot
//! into text. Adding a circuit or waveform variant forces a new table row.

use crate::model::{CircuitType, ProtocolSequence, Segment, SimulationRequest, SourceType};

/// Answer to the engine's "use built-in defaults? (y/N)" prompt.
const USE_EXPLICIT_PARAMS: &str = "n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    UseExplicit,
    Circuit,
    StepCount,
    Horizon,
    SourceCode,
    Amplitude,
    Frequency,
    DutyCycle,
    Offset,
    /// The step source's start time; always sent as zero.
    StartTimeZero,
    MethodCode,
    R,
    R2,
    C,
    L,
}

const PREAMBLE: &[Slot] = &[Slot::UseExplicit, Slot::Circuit];
const SIMULATION: &[Slot] = &[Slot::StepCount, Slot::Horizon];
const SOURCE_SELECT: &[Slot] = &[Slot::SourceCode];
const METHOD: &[Slot] = &[Slot::MethodCode];

fn source_params(source: SourceType) -> &'static [Slot] {
    match source {
        SourceType::Sinusoidal | SourceType::Triangle => {
            &[Slot::Amplitude, Slot::Frequency, Slot::Offset]
        }
        SourceType::Step => &[Slot::Amplitude, Slot::StartTimeZero],
        SourceType::Square => &[
            Slot::Amplitude,
            Slot::Frequency,
            Slot::DutyCycle,
            Slot::Offset,
        ],
    }
}

fn circuit_params(circuit: CircuitType) -> &'static [Slot] {
    match circuit {
        CircuitType::A => &[Slot::R, Slot::C],
        // The engine prompts "R1" for B; the request's R fills it.
        CircuitType::B => &[Slot::R, Slot::R2, Slot::C],
        CircuitType::C | CircuitType::D => &[Slot::R, Slot::C, Slot::L],
    }
}

/// Ordered slot groups for one (circuit, source) combination.
pub fn layout(circuit: CircuitType, source: SourceType) -> [(Segment, &'static [Slot]); 6] {
    [
        (Segment::Preamble, PREAMBLE),
        (Segment::Simulation, SIMULATION),
        (Segment::SourceSelect, SOURCE_SELECT),
        (Segment::SourceParams, source_params(source)),
        (Segment::Method, METHOD),
        (Segment::CircuitParams, circuit_params(circuit)),
    ]
}

/// `floor(t_max / h)`; both are positive after validation.
pub fn step_count(t_max: f64, h: f64) -> u64 {
    (t_max / h).floor() as u64
}

fn render(slot: Slot, req: &SimulationRequest) -> String {
    match slot {
        Slot::UseExplicit => USE_EXPLICIT_PARAMS.to_string(),
        Slot::Circuit => req.circuit_type.label().to_string(),
        Slot::StepCount => step_count(req.t_max, req.h).to_string(),
        Slot::Horizon => req.t_max.to_string(),
        Slot::SourceCode => req.source_type.code().to_string(),
        Slot::Amplitude => req.amplitude.to_string(),
        Slot::Frequency => req.frequency.to_string(),
        Slot::DutyCycle => req.duty_cycle.to_string(),
        Slot::Offset => req.offset.to_string(),
        Slot::StartTimeZero => "0".to_string(),
        Slot::MethodCode => req.method.code().to_string(),
        Slot::R => req.r.to_string(),
        Slot::R2 => req.r2.to_string(),
        Slot::C => req.c.to_string(),
        Slot::L => req.l.to_string(),
    }
}

pub fn encode(req: &SimulationRequest) -> ProtocolSequence {
    let mut seq = ProtocolSequence::default();
    for (segment, slots) in layout(req.circuit_type, req.source_type) {
        for &slot in slots {
            seq.push(segment, render(slot, req));
        }
    }
    seq
}
