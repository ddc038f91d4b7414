//! Common test utilities for sonata-validate
//!
//! This module provides shared test infrastructure including:
//! - Descriptor builders producing YAML fixtures
//! - Package builders writing package directories and archives
//! - Scenario fixtures laid out in temporary directories
//! - Assertion helpers over validation reports

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
