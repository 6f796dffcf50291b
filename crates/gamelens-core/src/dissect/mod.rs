//! Schema-driven payload dissection.
//!
//! The dissector demultiplexes a captured payload into schema-described
//! records: it resolves the role's schema subtree, reads the leading 2-byte
//! record ID, decodes and formats the matching action's fields, consumes the
//! record's bytes, and loops until the working buffer is empty. An ID the
//! schema does not know halts the payload with a plain two-line note and
//! leaves the remainder unconsumed. Every failure is caught at the single
//! entry point and rendered as a four-line diagnostic block; nothing escapes
//! to the capture collaborator.
//!
//! The loop walks an explicit cursor rather than recursing, and refuses to
//! decode more than [`MAX_RECORDS_PER_PAYLOAD`] records from one payload.

pub mod error;
pub mod fields;
pub mod format;
pub mod style;

use crate::settings::{ActionSpec, GameSchema, RoleSchema};

use error::{TraceExt, Traced};
use fields::{decode_fields, plan_fields};
use format::format_field;
use style::{Style, Styler};

pub use error::{DissectError, Trail};
pub use style::Role;

/// Upper bound on records decoded from a single payload.
pub const MAX_RECORDS_PER_PAYLOAD: usize = 4096;

/// Dissects one payload at a time against a loaded game schema.
///
/// The schema is read-only; one `Dissector` can serve any number of
/// payloads, in any order of roles.
#[derive(Debug, Clone, Copy)]
pub struct Dissector<'a> {
    schema: Option<&'a GameSchema>,
    color: bool,
}

impl<'a> Dissector<'a> {
    pub fn new(schema: Option<&'a GameSchema>) -> Self {
        Self {
            schema,
            color: true,
        }
    }

    /// Enable or disable ANSI styling on every produced line.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Single entry point: dissect one payload and return the rendered
    /// output lines. Failures never propagate; they become the four-line
    /// diagnostic block at the end of the output.
    pub fn dissect(&self, payload: &[u8], role: Role) -> Vec<String> {
        let mut lines = Vec::new();
        if let Err(traced) = self.parse_records(payload, role, &mut lines) {
            self.push_error_block(&traced, payload, role, &mut lines);
        }
        lines
    }

    fn parse_records(
        &self,
        payload: &[u8],
        role: Role,
        lines: &mut Vec<String>,
    ) -> Result<(), Traced> {
        let schema = self.resolve_schema(role).frame("parse_records()")?;
        let default_display = schema.display_message.unwrap_or(true);
        let styler = Styler::new(role, self.color);

        let mut cursor = payload;
        let mut records = 0;
        while !cursor.is_empty() {
            records += 1;
            if records > MAX_RECORDS_PER_PAYLOAD {
                return Err(Traced::new(
                    DissectError::TooManyRecords {
                        max: MAX_RECORDS_PER_PAYLOAD,
                    },
                    "parse_records()",
                ));
            }

            let id = read_record_id(&mut cursor).frame("parse_records()")?;
            let Some(action) = schema.actions.get(&id) else {
                if default_display {
                    lines.push(format!(
                        "{} | ID {} | {}",
                        role.tag(),
                        fmt_hex_i16(id),
                        hex_string(cursor)
                    ));
                    lines.push(format!("     |-> {}", hex_string(payload)));
                }
                return Ok(());
            };

            let message = self
                .run_action(action, &mut cursor, role, &styler)
                .frame("parse_records()")?;
            if display_allowed(default_display, action.display_message) {
                lines.push(message);
            }
        }
        Ok(())
    }

    fn resolve_schema(&self, role: Role) -> Result<&'a RoleSchema, Traced> {
        let schema = self
            .schema
            .filter(|schema| !schema.is_empty())
            .ok_or_else(|| Traced::new(DissectError::MissingSchema, "resolve_schema()"))?;
        schema
            .role(role)
            .ok_or_else(|| Traced::new(DissectError::MissingRoleSchema(role), "resolve_schema()"))
    }

    fn run_action(
        &self,
        action: &ActionSpec,
        cursor: &mut &[u8],
        role: Role,
        styler: &Styler,
    ) -> Result<String, Traced> {
        let title = action.title.as_deref().unwrap_or_default();
        let mut message = styler.paint(&format!("{} {title}", role.arrow()), Style::Title);
        message.push_str(&styler.paint(" |", Style::Normal));

        if action.structs.is_empty() {
            return Ok(message);
        }

        let plan = plan_fields(&action.structs).frame("run_action()")?;
        if cursor.len() < plan.declared {
            return Err(Traced::new(
                DissectError::TooShort {
                    needed: plan.declared,
                    actual: cursor.len(),
                },
                "run_action()",
            ));
        }
        let (data, rest) = cursor.split_at(plan.declared);
        *cursor = rest;

        let decoded = decode_fields(&plan, data).frame("run_action()")?;
        for (entry, values) in plan.entries.iter().zip(&decoded) {
            message.push_str(&format_field(entry.spec, entry.kind, values, styler));
        }
        Ok(message)
    }

    fn push_error_block(
        &self,
        traced: &Traced,
        payload: &[u8],
        role: Role,
        lines: &mut Vec<String>,
    ) {
        let styler = Styler::new(role, self.color);
        lines.push(styler.paint_error(&format!("Error {}: {}", role.tag(), traced.error)));
        lines.push(styler.paint_error(&format!("Location: {}", traced.trail.render("Dissector"))));
        lines.push(styler.paint_error(&hex_string(payload)));
        lines.push(String::new());
    }
}

fn read_record_id(cursor: &mut &[u8]) -> Result<i16, Traced> {
    match cursor.split_first_chunk::<2>() {
        Some((id, rest)) => {
            *cursor = rest;
            Ok(i16::from_le_bytes(*id))
        }
        None => Err(Traced::new(
            DissectError::TooShort {
                needed: 2,
                actual: cursor.len(),
            },
            "read_record_id()",
        )),
    }
}

fn display_allowed(default_display: bool, action_display: Option<bool>) -> bool {
    action_display.unwrap_or(default_display)
}

fn fmt_hex_i16(id: i16) -> String {
    if id < 0 {
        format!("-0x{:x}", (id as i32).unsigned_abs())
    } else {
        format!("0x{id:x}")
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
