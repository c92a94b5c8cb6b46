//! Total coercion of raw parameters into a `SimulationRequest`.
//!
//! Nothing in here fails: every missing, malformed or out-of-range value is
//! replaced by the default from `SimulationRequest::default()` and the
//! fallback is recorded next to the value.

use crate::model::{CircuitType, Method, RawParams, SimulationRequest, SourceType};
use serde_json::Value;

/// A validated value and whether it came from the default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checked<T> {
    pub value: T,
    pub used_default: bool,
}

impl<T> Checked<T> {
    fn given(value: T) -> Self {
        Self {
            value,
            used_default: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            used_default: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub request: SimulationRequest,
    /// Names of the fields that fell back to their default.
    pub defaulted: Vec<&'static str>,
}

/// Finite f64 out of a JSON number or a numeric string.
pub fn coerce_number(raw: Option<&Value>) -> Option<f64> {
    let v = match raw? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    v.is_finite().then_some(v)
}

pub fn number_or(raw: Option<&Value>, default: f64) -> Checked<f64> {
    match coerce_number(raw) {
        Some(v) => Checked::given(v),
        None => Checked::fallback(default),
    }
}

/// Like `number_or`, but values `<= 0` also take the default.
pub fn positive_or(raw: Option<&Value>, default: f64) -> Checked<f64> {
    match coerce_number(raw) {
        Some(v) if v > 0.0 => Checked::given(v),
        _ => Checked::fallback(default),
    }
}

pub fn label_or<T: Copy>(
    raw: Option<&Value>,
    default: T,
    parse: fn(&str) -> Option<T>,
) -> Checked<T> {
    match raw {
        Some(Value::String(s)) => match parse(s.trim()) {
            Some(v) => Checked::given(v),
            None => Checked::fallback(default),
        },
        _ => Checked::fallback(default),
    }
}

struct Tracker {
    defaulted: Vec<&'static str>,
}

impl Tracker {
    fn take<T>(&mut self, name: &'static str, checked: Checked<T>) -> T {
        if checked.used_default {
            self.defaulted.push(name);
        }
        checked.value
    }
}

pub fn validate(raw: &RawParams) -> Validated {
    let d = SimulationRequest::default();
    let mut t = Tracker {
        defaulted: Vec::new(),
    };

    let request = SimulationRequest {
        circuit_type: t.take(
            "circuit_type",
            label_or(raw.circuit_type.as_ref(), d.circuit_type, CircuitType::from_label),
        ),
        source_type: t.take(
            "source_type",
            label_or(raw.source_type.as_ref(), d.source_type, SourceType::from_label),
        ),
        method: t.take(
            "method",
            label_or(raw.method.as_ref(), d.method, Method::from_label),
        ),
        r: t.take("r", number_or(raw.r.as_ref(), d.r)),
        r2: t.take("r2", number_or(raw.r2.as_ref(), d.r2)),
        c: t.take("c", number_or(raw.c.as_ref(), d.c)),
        l: t.take("l", number_or(raw.l.as_ref(), d.l)),
        h: t.take("h", positive_or(raw.h.as_ref(), d.h)),
        t_max: t.take("t_max", positive_or(raw.t_max.as_ref(), d.t_max)),
        amplitude: t.take("amplitude", number_or(raw.amplitude.as_ref(), d.amplitude)),
        frequency: t.take("frequency", number_or(raw.frequency.as_ref(), d.frequency)),
        duty_cycle: t.take("duty_cycle", number_or(raw.duty_cycle.as_ref(), d.duty_cycle)),
        offset: t.take("offset", number_or(raw.offset.as_ref(), d.offset)),
    };

    if !t.defaulted.is_empty() {
        tracing::debug!(fields = ?t.defaulted, "parameter defaults applied");
    }

    Validated {
        request,
        defaulted: t.defaulted,
    }
}
