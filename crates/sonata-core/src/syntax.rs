//! Schema-based syntax validation

use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::events::{codes, EventLog};
use crate::schema::SchemaResolver;
use jsonschema::Validator;
use serde_json::Value;
use tracing::debug;

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxViolation {
    /// JSON pointer into the descriptor, `/` for the document root
    pub location: String,
    pub message: String,
}

impl std::fmt::Display for SyntaxViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Collect every violation of `schema` in `value`
pub fn check(schema: &Validator, value: &Value) -> Vec<SyntaxViolation> {
    schema
        .iter_errors(value)
        .map(|e| {
            let path = e.instance_path().to_string();
            SyntaxViolation {
                location: if path.is_empty() { "/".to_string() } else { path },
                message: e.to_string(),
            }
        })
        .collect()
}

/// Result of validating one descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxOutcome {
    Valid,
    /// Number of violations found
    Invalid(usize),
    /// The schema could not be obtained
    SchemaUnavailable,
}

impl SyntaxOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Validates descriptors against the schema for their kind
pub struct SyntaxValidator<'a> {
    resolver: &'a SchemaResolver,
}

impl<'a> SyntaxValidator<'a> {
    pub fn new(resolver: &'a SchemaResolver) -> Self {
        Self { resolver }
    }

    /// Validate a classified descriptor, logging one `evt_syntax` event per
    /// violation. A schema that cannot be resolved is logged as
    /// `evt_schema_unavailable` and reported as
    /// [`SyntaxOutcome::SchemaUnavailable`]; the descriptor was not checked,
    /// so callers still run the deeper layers.
    pub async fn validate(&self, descriptor: &Descriptor, log: &mut EventLog) -> Result<SyntaxOutcome> {
        let kind = descriptor.kind();
        let object_id = descriptor.object_id();

        let schema = match self.resolver.resolve(kind).await {
            Ok(schema) => schema,
            Err(e) if e.is_schema_unavailable() => {
                log.log(&object_id, codes::EVT_SCHEMA_UNAVAILABLE, kind, e.to_string())?;
                return Ok(SyntaxOutcome::SchemaUnavailable);
            }
            Err(e) => return Err(e),
        };

        let violations = check(&schema, &descriptor.raw().content);
        debug!(
            "Syntax check of {} {}: {} violation(s)",
            kind,
            object_id,
            violations.len()
        );

        if violations.is_empty() {
            return Ok(SyntaxOutcome::Valid);
        }

        for violation in &violations {
            log.log(&object_id, codes::EVT_SYNTAX, kind, violation.to_string())?;
        }

        Ok(SyntaxOutcome::Invalid(violations.len()))
    }
}
