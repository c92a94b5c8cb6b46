use crate::model::{CircuitType, Method, RawParams, SimulationRequest, SourceType};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    Circuit,
    R,
    R2,
    C,
    L,
    H,
    TMax,
    Method,
    Source,
    Amplitude,
    Frequency,
    Duty,
    Offset,
}

impl FieldKey {
    /// Display order, top to bottom.
    pub const ORDER: [FieldKey; 13] = [
        FieldKey::Circuit,
        FieldKey::R,
        FieldKey::R2,
        FieldKey::C,
        FieldKey::L,
        FieldKey::H,
        FieldKey::TMax,
        FieldKey::Method,
        FieldKey::Source,
        FieldKey::Amplitude,
        FieldKey::Frequency,
        FieldKey::Duty,
        FieldKey::Offset,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FieldKey::Circuit => "Circuit",
            FieldKey::R => "R / R1 (Ω)",
            FieldKey::R2 => "R2 (Ω)",
            FieldKey::C => "C (F)",
            FieldKey::L => "L (H)",
            FieldKey::H => "Step h (s)",
            FieldKey::TMax => "t_max (s)",
            FieldKey::Method => "Method",
            FieldKey::Source => "Source",
            FieldKey::Amplitude => "Amplitude (V)",
            FieldKey::Frequency => "Frequency (Hz)",
            FieldKey::Duty => "Duty cycle",
            FieldKey::Offset => "Offset (V)",
        }
    }

    fn index(self) -> usize {
        Self::ORDER.iter().position(|k| *k == self).unwrap_or(0)
    }

    /// Labels to cycle through for enumerated fields; `None` for numeric ones.
    pub fn choices(self) -> Option<Vec<&'static str>> {
        match self {
            FieldKey::Circuit => Some(CircuitType::ALL.iter().map(|c| c.label()).collect()),
            FieldKey::Method => Some(Method::ALL.iter().map(|m| m.label()).collect()),
            FieldKey::Source => Some(SourceType::ALL.iter().map(|s| s.label()).collect()),
            _ => None,
        }
    }
}

/// Whether a field is read by the engine for this circuit/source selection.
pub fn is_relevant(key: FieldKey, circuit: Option<CircuitType>, source: Option<SourceType>) -> bool {
    match key {
        FieldKey::R2 => circuit.map_or(true, |c| c == CircuitType::B),
        FieldKey::L => circuit.map_or(true, |c| matches!(c, CircuitType::C | CircuitType::D)),
        FieldKey::Duty => source.map_or(true, |s| s == SourceType::Square),
        FieldKey::Frequency | FieldKey::Offset => {
            source.map_or(true, |s| s != SourceType::Step)
        }
        _ => true,
    }
}

/// Short text for a numeric field; tiny and huge magnitudes use exponent notation.
pub fn number_text(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(1e-3..1e6).contains(&a) {
        format!("{v:e}")
    } else {
        v.to_string()
    }
}

/// Editable text of every parameter. Values stay free text until a run is
/// triggered; the validator decides what they mean.
#[derive(Debug, Clone)]
pub struct ParamForm {
    values: [String; 13],
    pub selected: usize,
}

impl Default for ParamForm {
    fn default() -> Self {
        let d = SimulationRequest::default();
        Self {
            values: [
                d.circuit_type.label().to_string(),
                number_text(d.r),
                number_text(d.r2),
                number_text(d.c),
                number_text(d.l),
                number_text(d.h),
                number_text(d.t_max),
                d.method.label().to_string(),
                d.source_type.label().to_string(),
                number_text(d.amplitude),
                number_text(d.frequency),
                number_text(d.duty_cycle),
                number_text(d.offset),
            ],
            selected: 0,
        }
    }
}

fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ParamForm {
    /// Defaults overlaid with whatever the raw parameters provide.
    pub fn from_raw(raw: &RawParams) -> Self {
        let mut form = Self::default();
        let given = [
            (FieldKey::Circuit, &raw.circuit_type),
            (FieldKey::R, &raw.r),
            (FieldKey::R2, &raw.r2),
            (FieldKey::C, &raw.c),
            (FieldKey::L, &raw.l),
            (FieldKey::H, &raw.h),
            (FieldKey::TMax, &raw.t_max),
            (FieldKey::Method, &raw.method),
            (FieldKey::Source, &raw.source_type),
            (FieldKey::Amplitude, &raw.amplitude),
            (FieldKey::Frequency, &raw.frequency),
            (FieldKey::Duty, &raw.duty_cycle),
            (FieldKey::Offset, &raw.offset),
        ];
        for (key, value) in given {
            if let Some(text) = value.as_ref().and_then(value_text) {
                form.set(key, text);
            }
        }
        form
    }

    pub fn value(&self, key: FieldKey) -> &str {
        &self.values[key.index()]
    }

    pub fn set(&mut self, key: FieldKey, text: String) {
        self.values[key.index()] = text;
    }

    pub fn selected_key(&self) -> FieldKey {
        FieldKey::ORDER[self.selected % FieldKey::ORDER.len()]
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % FieldKey::ORDER.len();
    }

    pub fn select_prev(&mut self) {
        let n = FieldKey::ORDER.len();
        self.selected = (self.selected + n - 1) % n;
    }

    /// Step an enumerated field to its next or previous label.
    /// Returns false for numeric fields.
    pub fn cycle(&mut self, forward: bool) -> bool {
        let key = self.selected_key();
        let Some(choices) = key.choices() else {
            return false;
        };
        let n = choices.len();
        let next = match choices.iter().position(|c| *c == self.value(key).trim()) {
            Some(i) if forward => (i + 1) % n,
            Some(i) => (i + n - 1) % n,
            None => 0,
        };
        self.set(key, choices[next].to_string());
        true
    }

    /// Append a character to the selected numeric field.
    pub fn type_char(&mut self, ch: char) -> bool {
        let key = self.selected_key();
        if key.choices().is_some() {
            return false;
        }
        if !(ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E')) {
            return false;
        }
        self.values[key.index()].push(ch);
        true
    }

    pub fn backspace(&mut self) {
        let key = self.selected_key();
        if key.choices().is_none() {
            self.values[key.index()].pop();
        }
    }

    /// Show the step size the last run actually used.
    pub fn set_h(&mut self, h: f64) {
        self.set(FieldKey::H, number_text(h));
    }

    pub fn circuit(&self) -> Option<CircuitType> {
        CircuitType::from_label(self.value(FieldKey::Circuit).trim())
    }

    pub fn source(&self) -> Option<SourceType> {
        SourceType::from_label(self.value(FieldKey::Source).trim())
    }

    /// Snapshot of the form as raw parameters. Blank fields are left unset.
    pub fn to_raw(&self) -> RawParams {
        let get = |key: FieldKey| {
            let text = self.value(key).trim();
            (!text.is_empty()).then(|| Value::String(text.to_string()))
        };
        RawParams {
            circuit_type: get(FieldKey::Circuit),
            source_type: get(FieldKey::Source),
            method: get(FieldKey::Method),
            r: get(FieldKey::R),
            r2: get(FieldKey::R2),
            c: get(FieldKey::C),
            l: get(FieldKey::L),
            h: get(FieldKey::H),
            t_max: get(FieldKey::TMax),
            amplitude: get(FieldKey::Amplitude),
            frequency: get(FieldKey::Frequency),
            duty_cycle: get(FieldKey::Duty),
            offset: get(FieldKey::Offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use serde_json::json;

    #[test]
    fn default_form_validates_to_default_request() {
        let v = validate(&ParamForm::default().to_raw());
        assert_eq!(v.request, SimulationRequest::default());
        assert!(v.defaulted.is_empty(), "{:?}", v.defaulted);
    }

    #[test]
    fn number_text_uses_exponent_for_small_values() {
        assert_eq!(number_text(1e-6), "1e-6");
        assert_eq!(number_text(1e-4), "1e-4");
        assert_eq!(number_text(0.05), "0.05");
        assert_eq!(number_text(1000.0), "1000");
        assert_eq!(number_text(0.0), "0");
    }

    #[test]
    fn cycling_wraps_around() {
        let mut form = ParamForm::default();
        assert_eq!(form.selected_key(), FieldKey::Circuit);
        assert!(form.cycle(false));
        assert_eq!(form.value(FieldKey::Circuit), "D");
        assert!(form.cycle(true));
        assert_eq!(form.value(FieldKey::Circuit), "A");
        form.select_next();
        assert!(!form.cycle(true));
    }

    #[test]
    fn typing_edits_numeric_fields_only() {
        let mut form = ParamForm::default();
        assert!(!form.type_char('5'));
        form.select_next();
        form.backspace();
        form.backspace();
        assert!(form.type_char('2'));
        assert!(!form.type_char('x'));
        assert_eq!(form.value(FieldKey::R), "102");
    }

    #[test]
    fn selection_wraps() {
        let mut form = ParamForm::default();
        form.select_prev();
        assert_eq!(form.selected_key(), FieldKey::Offset);
        form.select_next();
        assert_eq!(form.selected_key(), FieldKey::Circuit);
    }

    #[test]
    fn blank_fields_are_omitted() {
        let mut form = ParamForm::default();
        form.set(FieldKey::H, "  ".into());
        let raw = form.to_raw();
        assert!(raw.h.is_none());
        assert_eq!(raw.r, Some(json!("1000")));
    }

    #[test]
    fn raw_params_prefill_the_form() {
        let raw = RawParams {
            r: Some(json!(470)),
            method: Some(json!("Heun")),
            h: Some(json!(null)),
            ..Default::default()
        };
        let form = ParamForm::from_raw(&raw);
        assert_eq!(form.value(FieldKey::R), "470");
        assert_eq!(form.value(FieldKey::Method), "Heun");
        assert_eq!(form.value(FieldKey::H), "1e-4");
    }

    #[test]
    fn relevance_follows_selection() {
        assert!(!is_relevant(FieldKey::R2, Some(CircuitType::A), None));
        assert!(is_relevant(FieldKey::L, Some(CircuitType::D), None));
        assert!(!is_relevant(FieldKey::Duty, None, Some(SourceType::Sinusoidal)));
        assert!(!is_relevant(FieldKey::Frequency, None, Some(SourceType::Step)));
        assert!(is_relevant(FieldKey::R2, None, None));
    }
}
