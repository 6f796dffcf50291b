//! Per-field output pipeline.
//!
//! Every decoded value runs through a fixed option order: reference
//! substitution first (and terminal), then the hex cast, zero fills, and the
//! space pads. The zero fills only apply once the value has a textual form,
//! which in practice means after the hex cast; the space pads stringify
//! whatever they are given.

use crate::settings::{Cast, FieldSpec, OutputSpec};

use super::fields::{FieldKind, Value};
use super::style::{Style, Styler};

/// Render one decoded field: emphasized label, styled value, styled
/// separator. Repeated fields render their units space-separated inside a
/// single value fragment.
pub fn format_field(
    spec: &FieldSpec,
    kind: FieldKind,
    values: &[Value],
    styler: &Styler,
) -> String {
    let mut message = String::new();
    if let Some(name) = &spec.name {
        message.push_str(&styler.paint(&format!(" {name}"), Style::Bold));
    }

    let text = values
        .iter()
        .map(|value| render_value(spec, kind, value))
        .collect::<Vec<_>>()
        .join(" ");
    message.push_str(&styler.paint(&format!(" {text}"), Style::Light));
    message.push_str(&styler.paint(" |", Style::Normal));
    message
}

fn render_value(spec: &FieldSpec, kind: FieldKind, value: &Value) -> String {
    if let (Some(reference), Some(key)) = (&spec.reference, value.reference_key()) {
        if let Some(replacement) = reference.get(&key) {
            return replacement.clone();
        }
    }

    let Some(output) = &spec.output else {
        return value.to_string();
    };
    apply_output(output, kind, value)
}

enum Stage<'a> {
    Raw(&'a Value),
    Text(String),
}

impl Stage<'_> {
    fn into_text(self) -> String {
        match self {
            Stage::Raw(value) => value.to_string(),
            Stage::Text(text) => text,
        }
    }
}

fn apply_output(output: &OutputSpec, kind: FieldKind, value: &Value) -> String {
    let mut stage = match output.cast {
        Some(Cast::Hex) => Stage::Text(value.to_hex()),
        None => Stage::Raw(value),
    };

    if let Some(width) = output.zero_fill {
        if let Stage::Text(text) = stage {
            stage = Stage::Text(zero_fill(&text, width as usize));
        }
    }
    if output.auto_zero_fill {
        // Two hex digits per byte plus the two-character "0x" prefix.
        let width = kind.width() * 2 + 2;
        if let Stage::Text(text) = stage {
            stage = Stage::Text(zero_fill(&text, width));
        }
    }
    if let Some(width) = output.fill {
        let text = stage.into_text();
        stage = Stage::Text(format!("{text:<width$}", width = width as usize));
    }
    if let Some(width) = output.fill_left {
        let text = stage.into_text();
        stage = Stage::Text(format!("{text:>width$}", width = width as usize));
    }
    stage.into_text()
}

/// Left-pad with zeros to the given width, keeping a leading sign in place.
fn zero_fill(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    format!("{sign}{}{digits}", "0".repeat(width - len))
}
