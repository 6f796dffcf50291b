//! Dissection failures and the breadcrumb trail attached to them.
//!
//! Every failure inside one dissection is a `DissectError` wrapped in a
//! [`Traced`] carrier. Each call boundary the failure crosses prepends its
//! own frame name, so the top-level handler can print a left-to-right
//! outer-to-inner location line without any formatting logic at the raise
//! sites.

use thiserror::Error;

use super::style::Role;

#[derive(Debug, Error, PartialEq)]
pub enum DissectError {
    #[error("The game schema is missing or empty.")]
    MissingSchema,
    #[error("The game schema has no {0} section.")]
    MissingRoleSchema(Role),
    #[error("The struct type ({0}) is not defined in the map of structs.")]
    UnknownFieldType(String),
    #[error("record data too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("field plan needs {needed} bytes but the record declares {declared}")]
    PlanMismatch { needed: usize, declared: usize },
    #[error("record loop exceeded {max} records in one payload")]
    TooManyRecords { max: usize },
}

/// Ordered breadcrumb of call locations, outermost first.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Trail(Vec<&'static str>);

impl Trail {
    /// Prepend an outer frame ahead of the frames collected so far.
    pub fn push_outer(&mut self, frame: &'static str) {
        self.0.insert(0, frame);
    }

    /// Join the frames under the given root, outermost to innermost.
    pub fn render(&self, root: &str) -> String {
        let mut out = root.to_string();
        for frame in &self.0 {
            out.push_str(" -> ");
            out.push_str(frame);
        }
        out
    }
}

/// A dissection failure together with the trail of frames it crossed.
#[derive(Debug, PartialEq)]
pub struct Traced {
    pub error: DissectError,
    pub trail: Trail,
}

impl Traced {
    pub fn new(error: DissectError, frame: &'static str) -> Self {
        let mut trail = Trail::default();
        trail.push_outer(frame);
        Self { error, trail }
    }
}

impl From<DissectError> for Traced {
    fn from(error: DissectError) -> Self {
        Self {
            error,
            trail: Trail::default(),
        }
    }
}

/// Adds an outer frame to the trail of a failing result.
pub(crate) trait TraceExt<T> {
    fn frame(self, name: &'static str) -> Result<T, Traced>;
}

impl<T> TraceExt<T> for Result<T, Traced> {
    fn frame(self, name: &'static str) -> Result<T, Traced> {
        self.map_err(|mut traced| {
            traced.trail.push_outer(name);
            traced
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DissectError, TraceExt, Traced, Trail};

    #[test]
    fn trail_renders_outer_to_inner() {
        let mut trail = Trail::default();
        trail.push_outer("bed()");
        trail.push_outer("bedroom()");
        trail.push_outer("house()");
        assert_eq!(
            trail.render("Dissector"),
            "Dissector -> house() -> bedroom() -> bed()"
        );
    }

    #[test]
    fn empty_trail_renders_root_only() {
        assert_eq!(Trail::default().render("Dissector"), "Dissector");
    }

    #[test]
    fn frame_prepends_at_each_boundary() {
        let inner: Result<(), Traced> = Err(Traced::new(
            DissectError::UnknownFieldType("X".to_string()),
            "plan_fields()",
        ));
        let outer = inner.frame("run_action()").frame("parse_records()");
        let traced = outer.unwrap_err();
        assert_eq!(
            traced.trail.render("Dissector"),
            "Dissector -> parse_records() -> run_action() -> plan_fields()"
        );
    }

    #[test]
    fn unknown_type_message_matches_wire_format() {
        let error = DissectError::UnknownFieldType("X".to_string());
        assert_eq!(
            error.to_string(),
            "The struct type (X) is not defined in the map of structs."
        );
    }
}
