use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the engine lives and where it leaves its output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub engine: PathBuf,
    #[serde(default)]
    pub engine_args: Vec<String>,
    pub workdir: PathBuf,
    /// Fixed-path artifact the engine overwrites on every run. Only one run may
    /// touch it at a time; the controller guarantees that.
    pub artifact: PathBuf,
}

/// Relative location the engine writes its CSV to, inside its working directory.
pub const ENGINE_ARTIFACT: &str = "resultats/simulations/circuit_output.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitType {
    A,
    B,
    C,
    D,
}

impl CircuitType {
    pub const ALL: [CircuitType; 4] = [
        CircuitType::A,
        CircuitType::B,
        CircuitType::C,
        CircuitType::D,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CircuitType::A => "A",
            CircuitType::B => "B",
            CircuitType::C => "C",
            CircuitType::D => "D",
        }
    }

    /// Human-readable topology name for UI layers.
    pub fn describe(self) -> &'static str {
        match self {
            CircuitType::A => "RC low-pass",
            CircuitType::B => "RC + diode",
            CircuitType::C => "series RLC",
            CircuitType::D => "parallel RLC",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    Sinusoidal,
    Step,
    Triangle,
    Square,
}

impl SourceType {
    pub const ALL: [SourceType; 4] = [
        SourceType::Sinusoidal,
        SourceType::Step,
        SourceType::Triangle,
        SourceType::Square,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SourceType::Sinusoidal => "Sinusoidal",
            SourceType::Step => "Step",
            SourceType::Triangle => "Triangle",
            SourceType::Square => "Square",
        }
    }

    /// Waveform selector understood by the engine.
    pub fn code(self) -> u8 {
        match self {
            SourceType::Sinusoidal => 1,
            SourceType::Step => 2,
            SourceType::Triangle => 3,
            SourceType::Square => 4,
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.label() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Euler,
    Euler2,
    Heun,
    #[serde(rename = "RK4")]
    Rk4,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Euler, Method::Euler2, Method::Heun, Method::Rk4];

    pub fn label(self) -> &'static str {
        match self {
            Method::Euler => "Euler",
            Method::Euler2 => "Euler2",
            Method::Heun => "Heun",
            Method::Rk4 => "RK4",
        }
    }

    /// Integration scheme selector understood by the engine. Note the engine
    /// numbers RK4 before Heun.
    pub fn code(self) -> u8 {
        match self {
            Method::Euler => 1,
            Method::Euler2 => 2,
            Method::Rk4 => 3,
            Method::Heun => 4,
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.label() == s)
    }
}

/// One fully-defaulted simulation run. Built only by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub circuit_type: CircuitType,
    pub source_type: SourceType,
    pub method: Method,
    pub r: f64,
    pub r2: f64,
    pub c: f64,
    pub l: f64,
    pub h: f64,
    pub t_max: f64,
    pub amplitude: f64,
    pub frequency: f64,
    pub duty_cycle: f64,
    pub offset: f64,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            circuit_type: CircuitType::A,
            source_type: SourceType::Sinusoidal,
            method: Method::Rk4,
            r: 1000.0,
            r2: 1000.0,
            c: 1e-6,
            l: 1e-3,
            h: 1e-4,
            t_max: 0.05,
            amplitude: 5.0,
            frequency: 50.0,
            duty_cycle: 0.5,
            offset: 0.0,
        }
    }
}

/// Loosely-typed parameter set as it arrives from a form, a CLI or a JSON file.
/// Every field may be missing or hold anything; the validator sorts it out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawParams {
    pub circuit_type: Option<serde_json::Value>,
    pub source_type: Option<serde_json::Value>,
    pub method: Option<serde_json::Value>,
    pub r: Option<serde_json::Value>,
    pub r2: Option<serde_json::Value>,
    pub c: Option<serde_json::Value>,
    pub l: Option<serde_json::Value>,
    pub h: Option<serde_json::Value>,
    pub t_max: Option<serde_json::Value>,
    pub amplitude: Option<serde_json::Value>,
    pub frequency: Option<serde_json::Value>,
    pub duty_cycle: Option<serde_json::Value>,
    pub offset: Option<serde_json::Value>,
}

/// Position-group of a protocol token, used for logging and for checking the
/// layout of an encoded sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    Preamble,
    Simulation,
    SourceSelect,
    SourceParams,
    Method,
    CircuitParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub segment: Segment,
    pub value: String,
}

/// Ordered tokens fed to the engine's prompts, one per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolSequence {
    pub tokens: Vec<Token>,
}

impl ProtocolSequence {
    pub fn push(&mut self, segment: Segment, value: String) {
        self.tokens.push(Token { segment, value });
    }

    pub fn values(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.value.as_str()).collect()
    }

    /// Token values belonging to one segment, in order.
    #[cfg(test)]
    pub fn segment(&self, segment: Segment) -> Vec<&str> {
        self.tokens
            .iter()
            .filter(|t| t.segment == segment)
            .map(|t| t.value.as_str())
            .collect()
    }

    /// Newline-delimited payload for the engine's stdin (trailing newline included).
    pub fn to_stdin(&self) -> String {
        let mut out = String::new();
        for t in &self.tokens {
            out.push_str(&t.value);
            out.push('\n');
        }
        out
    }
}

/// Canonical result table: three parallel columns in simulation step order.
/// An empty table means "no data" and is never an error by itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    #[serde(rename = "Time")]
    pub time: Vec<f64>,
    #[serde(rename = "InputVoltage")]
    pub input_voltage: Vec<f64>,
    #[serde(rename = "OutputVoltage")]
    pub output_voltage: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "Time")]
    pub time: f64,
    #[serde(rename = "InputVoltage")]
    pub input_voltage: f64,
    #[serde(rename = "OutputVoltage")]
    pub output_voltage: f64,
}

impl SimulationResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn push_row(&mut self, row: ResultRow) {
        self.time.push(row.time);
        self.input_voltage.push(row.input_voltage);
        self.output_voltage.push(row.output_voltage);
    }

    pub fn rows(&self) -> impl Iterator<Item = ResultRow> + '_ {
        self.time
            .iter()
            .zip(&self.input_voltage)
            .zip(&self.output_voltage)
            .map(|((&time, &input_voltage), &output_voltage)| ResultRow {
                time,
                input_voltage,
                output_voltage,
            })
    }

    pub fn head(&self, n: usize) -> Vec<ResultRow> {
        self.rows().take(n).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitState {
    /// The engine was never started (missing binary or spawn failure).
    NotLaunched,
    Exited(i32),
    Signaled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationOutcome {
    pub status: ExitState,
    pub stdout: String,
    pub stderr: String,
    /// Accumulated along the whole pipeline; never blocks result delivery.
    pub warnings: Vec<String>,
}

impl InvocationOutcome {
    pub fn not_launched(warning: String) -> Self {
        Self {
            status: ExitState::NotLaunched,
            stdout: String::new(),
            stderr: String::new(),
            warnings: vec![warning],
        }
    }

    pub fn launched(&self) -> bool {
        !matches!(self.status, ExitState::NotLaunched)
    }

    pub fn success(&self) -> bool {
        matches!(self.status, ExitState::Exited(0))
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            ExitState::Exited(code) => Some(code),
            _ => None,
        }
    }
}

/// Orchestrator state: at most one run in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub last: f64,
}

/// One plot's worth of data plus its labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(f64, f64)>,
    pub stats: Option<SeriesStats>,
}

/// Everything a presentation layer needs to redraw after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunViews {
    pub output_series: LineSeries,
    pub input_series: LineSeries,
    pub preview: Vec<ResultRow>,
    pub row_count: usize,
    pub status: String,
    /// Step size actually used after validation, echoed back to the form.
    pub effective_h: f64,
    pub warnings: Vec<String>,
}

/// Machine-readable record of one run, printed by `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub request: SimulationRequest,
    pub defaulted_fields: Vec<String>,
    /// Exactly what the engine read on stdin, one prompt answer per entry.
    pub tokens: Vec<String>,
    pub status: String,
    pub effective_h: f64,
    pub exit_code: Option<i32>,
    pub warnings: Vec<String>,
    pub result: SimulationResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SimEvent {
    RunStarted,
    Info(InfoEvent),
    RunCompleted {
        // Boxed to keep the event small; views carry full series.
        views: Box<RunViews>,
    },
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    TriggerIgnored,
}

impl InfoEvent {
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::TriggerIgnored => {
                "Simulation already running; trigger ignored".to_string()
            }
        }
    }
}
