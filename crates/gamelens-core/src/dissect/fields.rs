//! Field type table and primitive decoding.
//!
//! A record's field list is first combined into a [`FieldPlan`] in a single
//! pass: unknown type names abort the whole action before any byte is
//! consumed. The plan carries two byte counts that are deliberately kept
//! apart:
//!
//! - `declared` — the action's byte budget as the schema accounts for it:
//!   the per-field `size` value plus one unit width per field. This is what
//!   gets consumed from the working buffer.
//! - `needed` — what decoding the plan actually requires: `repeat * width`
//!   for numeric fields, `size` for `chars`.
//!
//! The two match for well-formed schemas; when they diverge the decode fails
//! with a plan mismatch instead of reading past the record boundary.

use crate::settings::FieldSpec;

use super::error::{DissectError, Traced};

/// Canonical field types, keyed by case-insensitive name in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Char,
    SignedChar,
    UnsignedChar,
    Bool,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    HalfPrecision,
    Float,
    Chars,
}

impl FieldKind {
    pub fn parse(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "char" => FieldKind::Char,
            "signed char" => FieldKind::SignedChar,
            "unsigned char" => FieldKind::UnsignedChar,
            "bool" => FieldKind::Bool,
            "short" => FieldKind::Short,
            "unsigned short" => FieldKind::UnsignedShort,
            "int" => FieldKind::Int,
            "unsigned int" => FieldKind::UnsignedInt,
            "long" => FieldKind::Long,
            "unsigned long" => FieldKind::UnsignedLong,
            "half precision" => FieldKind::HalfPrecision,
            "float" => FieldKind::Float,
            "chars" => FieldKind::Chars,
            _ => return None,
        };
        Some(kind)
    }

    /// Width in bytes of one unit of this type. `Chars` has no intrinsic
    /// width; its length comes from the field's `size` value.
    pub fn width(self) -> usize {
        match self {
            FieldKind::Char
            | FieldKind::SignedChar
            | FieldKind::UnsignedChar
            | FieldKind::Bool => 1,
            FieldKind::Short | FieldKind::UnsignedShort | FieldKind::HalfPrecision => 2,
            FieldKind::Int | FieldKind::UnsignedInt | FieldKind::Float => 4,
            FieldKind::Long | FieldKind::UnsignedLong => 8,
            FieldKind::Chars => 0,
        }
    }
}

/// One decoded value; integers keep their signedness for display and
/// reference lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Signed(i64),
    Unsigned(u64),
    Bool(bool),
    Float(f64),
    Bytes(Vec<u8>),
}

impl Value {
    /// Lowercase hex rendering for the `hex` output cast. Floats have no hex
    /// form and pass through unchanged.
    pub fn to_hex(&self) -> String {
        match self {
            Value::Signed(v) if *v < 0 => format!("-0x{:x}", (*v as i128).unsigned_abs()),
            Value::Signed(v) => format!("0x{v:x}"),
            Value::Unsigned(v) => format!("0x{v:x}"),
            Value::Bool(v) => format!("0x{:x}", *v as u8),
            Value::Float(_) => self.to_string(),
            Value::Bytes(bytes) => bytes.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }

    /// Key used against a field's reference table. Only integer-valued
    /// decodes can match.
    pub fn reference_key(&self) -> Option<i64> {
        match self {
            Value::Signed(v) => Some(*v),
            Value::Unsigned(v) => i64::try_from(*v).ok(),
            Value::Bool(v) => Some(*v as i64),
            Value::Float(_) | Value::Bytes(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Signed(v) => write!(f, "{v}"),
            Value::Unsigned(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bytes(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
        }
    }
}

/// One field of the combined plan.
#[derive(Debug)]
pub struct PlanEntry<'a> {
    pub spec: &'a FieldSpec,
    pub kind: FieldKind,
    repeat: usize,
    needed: usize,
}

/// Combined decode plan for an ordered field list.
#[derive(Debug)]
pub struct FieldPlan<'a> {
    pub entries: Vec<PlanEntry<'a>>,
    pub declared: usize,
    needed: usize,
}

/// Combine an ordered field list into one plan, resolving every type name
/// and summing the byte budget in a single pass. A missing type on any field
/// aborts the whole action.
pub fn plan_fields(specs: &[FieldSpec]) -> Result<FieldPlan<'_>, Traced> {
    let mut entries = Vec::with_capacity(specs.len());
    let mut declared = 0;
    let mut needed = 0;

    for spec in specs {
        let kind = FieldKind::parse(&spec.type_name).ok_or_else(|| {
            Traced::new(
                DissectError::UnknownFieldType(spec.type_name.clone()),
                "plan_fields()",
            )
        })?;
        let size = spec.size.unwrap_or(0) as usize;
        declared += size + kind.width();

        let (repeat, entry_needed) = match kind {
            FieldKind::Chars => (1, size.max(1)),
            _ if size > 1 => (size, size * kind.width()),
            _ => (1, kind.width()),
        };
        needed += entry_needed;
        entries.push(PlanEntry {
            spec,
            kind,
            repeat,
            needed: entry_needed,
        });
    }

    Ok(FieldPlan {
        entries,
        declared,
        needed,
    })
}

/// Decode every field of the plan against the record's data slice. The
/// slice length is the declared budget; it must match what the plan needs
/// exactly, otherwise the record boundary is unreliable.
pub fn decode_fields<'a>(plan: &'a FieldPlan<'a>, data: &[u8]) -> Result<Vec<Vec<Value>>, Traced> {
    if plan.needed != data.len() {
        return Err(Traced::new(
            DissectError::PlanMismatch {
                needed: plan.needed,
                declared: data.len(),
            },
            "decode_fields()",
        ));
    }

    let mut cursor = data;
    let mut decoded = Vec::with_capacity(plan.entries.len());
    for entry in &plan.entries {
        let (chunk, rest) = cursor.split_at(entry.needed);
        cursor = rest;
        decoded.push(decode_entry(entry, chunk));
    }
    Ok(decoded)
}

fn decode_entry(entry: &PlanEntry<'_>, data: &[u8]) -> Vec<Value> {
    if entry.kind == FieldKind::Chars {
        return vec![Value::Bytes(data.to_vec())];
    }
    let width = entry.kind.width();
    data.chunks_exact(width)
        .take(entry.repeat)
        .map(|unit| decode_unit(entry.kind, unit))
        .collect()
}

fn decode_unit(kind: FieldKind, unit: &[u8]) -> Value {
    match kind {
        FieldKind::Char => Value::Bytes(unit.to_vec()),
        FieldKind::SignedChar => Value::Signed(unit[0] as i8 as i64),
        FieldKind::UnsignedChar => Value::Unsigned(unit[0] as u64),
        FieldKind::Bool => Value::Bool(unit[0] != 0),
        FieldKind::Short => Value::Signed(i16::from_le_bytes([unit[0], unit[1]]) as i64),
        FieldKind::UnsignedShort => Value::Unsigned(u16::from_le_bytes([unit[0], unit[1]]) as u64),
        FieldKind::Int => {
            Value::Signed(i32::from_le_bytes([unit[0], unit[1], unit[2], unit[3]]) as i64)
        }
        FieldKind::UnsignedInt => {
            Value::Unsigned(u32::from_le_bytes([unit[0], unit[1], unit[2], unit[3]]) as u64)
        }
        FieldKind::Long => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(unit);
            Value::Signed(i64::from_le_bytes(bytes))
        }
        FieldKind::UnsignedLong => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(unit);
            Value::Unsigned(u64::from_le_bytes(bytes))
        }
        FieldKind::HalfPrecision => {
            Value::Float(half_to_f32(u16::from_le_bytes([unit[0], unit[1]])) as f64)
        }
        FieldKind::Float => {
            Value::Float(f32::from_le_bytes([unit[0], unit[1], unit[2], unit[3]]) as f64)
        }
        FieldKind::Chars => unreachable!("chars handled before unit decoding"),
    }
}

/// IEEE 754 binary16 to binary32 conversion; subnormals and the infinities
/// are decoded, NaN payloads are collapsed.
fn half_to_f32(bits: u16) -> f32 {
    let sign = if bits & 0x8000 != 0 { -1.0f32 } else { 1.0f32 };
    let exponent = (bits >> 10) & 0x1f;
    let fraction = bits & 0x3ff;
    let magnitude = match (exponent, fraction) {
        (0, 0) => 0.0,
        (0, _) => fraction as f32 * 2f32.powi(-24),
        (0x1f, 0) => f32::INFINITY,
        (0x1f, _) => f32::NAN,
        _ => (1.0 + fraction as f32 / 1024.0) * 2f32.powi(exponent as i32 - 15),
    };
    sign * magnitude
}
