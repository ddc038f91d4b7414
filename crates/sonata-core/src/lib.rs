//! # sonata-core
//!
//! Core library for the SONATA descriptor validator providing:
//! - Descriptor reading and canonical identification
//! - Schema resolution (local master, bundled, remote master) with caching
//! - Schema-based syntax validation
//! - The validation event log and its configurable event catalog
//! - Workspace configuration

pub mod config;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod schema;
pub mod syntax;
pub mod types;
pub mod utils;

pub use config::{Workspace, WorkspaceConfig};
pub use descriptor::{
    read_descriptor, read_descriptor_async, Descriptor, DescriptorId, DescriptorKind,
    RawDescriptor,
};
pub use error::{Error, Result};
pub use events::{codes, Event, EventCatalog, EventLevel, EventLog};
pub use schema::{classify, SchemaResolver, SchemaSources};
pub use syntax::{SyntaxOutcome, SyntaxValidator};
pub use utils::get_home_dir;
