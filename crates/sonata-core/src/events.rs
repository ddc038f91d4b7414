//! Validation event log
//!
//! Every finding of a validation run is recorded as an [`Event`] in an
//! [`EventLog`]. Events are keyed by `(object_id, event_code, level, scope)`;
//! recording a second event with the same key appends its message to the
//! existing event instead of creating a new one.
//!
//! Event codes and their levels come from an [`EventCatalog`]. The catalog
//! shipped with the crate can be overridden per workspace (`eventcfg.yml`),
//! e.g. to silence a warning by setting its level to `none`.

use crate::config::EmbeddedConfigs;
use crate::descriptor::DescriptorKind;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Event codes raised by the validator
pub mod codes {
    pub const EVT_READ_ERROR: &str = "evt_read_error";
    pub const EVT_PARSE_ERROR: &str = "evt_parse_error";
    pub const EVT_MISSING_ID: &str = "evt_missing_id";
    pub const EVT_CLASSIFY: &str = "evt_classify";
    pub const EVT_SCHEMA_UNAVAILABLE: &str = "evt_schema_unavailable";
    pub const EVT_SYNTAX: &str = "evt_syntax";
    pub const EVT_DUPLICATE_ID: &str = "evt_duplicate_id";
    pub const EVT_CPOINT_DUPLICATE: &str = "evt_cpoint_duplicate";
    pub const EVT_LINK_ENDPOINTS: &str = "evt_link_endpoints";
    pub const EVT_LINK_TYPE_UNKNOWN: &str = "evt_link_type_unknown";
    pub const EVT_UNIT_DUPLICATE: &str = "evt_unit_duplicate";
    pub const EVT_PKG_FILE_MISSING: &str = "evt_pkg_file_missing";
    pub const EVT_PKG_FILE_UNREADABLE: &str = "evt_pkg_file_unreadable";
    pub const EVT_PKG_HASH_MISMATCH: &str = "evt_pkg_hash_mismatch";
    pub const EVT_PKG_ENTRY_SERVICE: &str = "evt_pkg_entry_service";
    pub const EVT_VNF_ID_DUPLICATE: &str = "evt_vnf_id_duplicate";
    pub const EVT_VNF_UNAVAILABLE: &str = "evt_vnf_unavailable";
    pub const EVT_VNF_REF_MISMATCH: &str = "evt_vnf_ref_mismatch";
    pub const EVT_LINK_ENDPOINT_UNDEFINED: &str = "evt_link_endpoint_undefined";
    pub const EVT_FG_REFERENCE_UNDEFINED: &str = "evt_fg_reference_undefined";
    pub const EVT_FP_DUPLICATE_POSITION: &str = "evt_fp_duplicate_position";
    pub const EVT_FP_BREAK: &str = "evt_fp_break";
    pub const EVT_FP_CPOINT_UNDEFINED: &str = "evt_fp_cpoint_undefined";
    pub const EVT_FP_CYCLE: &str = "evt_fp_cycle";
    pub const EVT_CPOINT_UNDECLARED: &str = "evt_cpoint_undeclared";
    pub const EVT_CPOINT_UNUSED: &str = "evt_cpoint_unused";

    /// Every code the validator can raise
    pub const ALL: &[&str] = &[
        EVT_READ_ERROR,
        EVT_PARSE_ERROR,
        EVT_MISSING_ID,
        EVT_CLASSIFY,
        EVT_SCHEMA_UNAVAILABLE,
        EVT_SYNTAX,
        EVT_DUPLICATE_ID,
        EVT_CPOINT_DUPLICATE,
        EVT_LINK_ENDPOINTS,
        EVT_LINK_TYPE_UNKNOWN,
        EVT_UNIT_DUPLICATE,
        EVT_PKG_FILE_MISSING,
        EVT_PKG_FILE_UNREADABLE,
        EVT_PKG_HASH_MISMATCH,
        EVT_PKG_ENTRY_SERVICE,
        EVT_VNF_ID_DUPLICATE,
        EVT_VNF_UNAVAILABLE,
        EVT_VNF_REF_MISMATCH,
        EVT_LINK_ENDPOINT_UNDEFINED,
        EVT_FG_REFERENCE_UNDEFINED,
        EVT_FP_DUPLICATE_POSITION,
        EVT_FP_BREAK,
        EVT_FP_CPOINT_UNDEFINED,
        EVT_FP_CYCLE,
        EVT_CPOINT_UNDECLARED,
        EVT_CPOINT_UNUSED,
    ];
}

/// Severity of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Error,
    Warning,
    /// Recorded but not counted
    None,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub level: EventLevel,

    /// Canonical id of the object the event is about, or its file path
    pub object_id: String,

    pub event_code: String,

    /// Kind of object the event belongs to
    pub scope: DescriptorKind,

    pub messages: Vec<String>,
}

impl Event {
    fn same_key(&self, other: &Event) -> bool {
        self.object_id == other.object_id
            && self.event_code == other.event_code
            && self.level == other.level
            && self.scope == other.scope
    }
}

#[derive(Debug, Deserialize)]
struct EventsFile {
    events: BTreeMap<String, EventLevel>,
}

/// Table of known event codes and their levels
#[derive(Debug, Clone)]
pub struct EventCatalog {
    levels: BTreeMap<String, EventLevel>,
}

impl EventCatalog {
    /// Load the catalog compiled into the crate
    pub fn embedded() -> Result<Self> {
        let file = EmbeddedConfigs::get("events.yaml")
            .ok_or_else(|| Error::invalid_config("Embedded event catalog not found"))?;
        let content = std::str::from_utf8(&file.data)
            .map_err(|_| Error::invalid_config("Invalid UTF-8 in embedded event catalog"))?;
        Self::from_yaml(content)
    }

    /// Parse a catalog from YAML (`events: {code: level}`)
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: EventsFile = serde_yaml_ng::from_str(content)?;
        Ok(Self {
            levels: file.events,
        })
    }

    /// Change the level of known codes. Unknown codes are rejected.
    pub fn apply_overrides(&mut self, overrides: BTreeMap<String, EventLevel>) -> Result<()> {
        for (code, level) in overrides {
            match self.levels.get_mut(&code) {
                Some(current) => *current = level,
                None => return Err(Error::unknown_event_code(code)),
            }
        }
        Ok(())
    }

    /// Apply overrides from an `eventcfg.yml` file if it exists
    pub fn load_overrides(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        debug!("Loading event level overrides from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let file: EventsFile = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {:?}: {}", path, e)))?;
        self.apply_overrides(file.events)
    }

    /// Level configured for `code`
    pub fn level(&self, code: &str) -> Result<EventLevel> {
        self.levels
            .get(code)
            .copied()
            .ok_or_else(|| Error::unknown_event_code(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.levels.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(|c| c.as_str())
    }
}

/// Position in an event log, used to ask whether a step produced errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Ordered, normalized collection of events for one validation run
#[derive(Debug, Clone)]
pub struct EventLog {
    catalog: Arc<EventCatalog>,
    events: Vec<Event>,
    errors_logged: usize,
}

impl EventLog {
    pub fn new(catalog: Arc<EventCatalog>) -> Self {
        Self {
            catalog,
            events: Vec::new(),
            errors_logged: 0,
        }
    }

    /// Record an event, merging it into an existing one with the same key.
    ///
    /// Fails with [`Error::UnknownEventCode`] if `code` is not in the catalog.
    pub fn log(
        &mut self,
        object_id: impl Into<String>,
        code: &str,
        scope: DescriptorKind,
        message: impl Into<String>,
    ) -> Result<EventLevel> {
        let level = self.catalog.level(code)?;
        let event = Event {
            level,
            object_id: object_id.into(),
            event_code: code.to_string(),
            scope,
            messages: vec![message.into()],
        };

        debug!(
            "[{:?}] {} {}: {}",
            event.level, event.event_code, event.object_id, event.messages[0]
        );

        if level == EventLevel::Error {
            self.errors_logged += 1;
        }

        match self.events.iter_mut().find(|e| e.same_key(&event)) {
            Some(existing) => existing.messages.extend(event.messages),
            None => self.events.push(event),
        }

        Ok(level)
    }

    /// All events in the order their key was first seen
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn errors(&self) -> Vec<&Event> {
        self.with_level(EventLevel::Error)
    }

    pub fn warnings(&self) -> Vec<&Event> {
        self.with_level(EventLevel::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().len()
    }

    /// Events carrying `code`
    pub fn with_code(&self, code: &str) -> Vec<&Event> {
        self.events.iter().filter(|e| e.event_code == code).collect()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.errors_logged)
    }

    /// Number of error-level events recorded since `checkpoint`, counted
    /// before normalization
    pub fn errors_since(&self, checkpoint: Checkpoint) -> usize {
        self.errors_logged - checkpoint.0
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    fn with_level(&self, level: EventLevel) -> Vec<&Event> {
        self.events.iter().filter(|e| e.level == level).collect()
    }
}
