//! Validation report

use serde::Serialize;
use sonata_core::{DescriptorKind, Event, EventLog};

use crate::topology::{PathTrace, TopologyGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationResult {
    Valid,
    Invalid,
}

/// Outcome of one validation run
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Canonical id of the validated object, or its path
    pub object_id: String,
    pub kind: DescriptorKind,
    pub result: ValidationResult,
    pub error_count: usize,
    pub warning_count: usize,
    pub errors: Vec<Event>,
    pub warnings: Vec<Event>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub traces: Vec<PathTrace>,

    /// Service or function graph built by the topology layer
    #[serde(skip)]
    pub topology: Option<TopologyGraph>,
}

impl ValidationReport {
    pub(crate) fn from_log(
        object_id: impl Into<String>,
        kind: DescriptorKind,
        log: &EventLog,
        traces: Vec<PathTrace>,
        topology: Option<TopologyGraph>,
    ) -> Self {
        let errors: Vec<Event> = log.errors().into_iter().cloned().collect();
        let warnings: Vec<Event> = log.warnings().into_iter().cloned().collect();
        Self {
            object_id: object_id.into(),
            kind,
            result: if errors.is_empty() {
                ValidationResult::Valid
            } else {
                ValidationResult::Invalid
            },
            error_count: errors.len(),
            warning_count: warnings.len(),
            errors,
            warnings,
            traces,
            topology,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.result == ValidationResult::Valid
    }

    /// Process exit code: 0 without errors, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.is_valid() {
            0
        } else {
            1
        }
    }

    /// Events carrying `code`, errors first
    pub fn events_with_code(&self, code: &str) -> Vec<&Event> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(|e| e.event_code == code)
            .collect()
    }
}
