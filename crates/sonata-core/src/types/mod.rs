//! Type definitions for SONATA package, service, and function descriptors

mod common_types;
mod function_types;
mod package_types;
mod service_types;

pub use common_types::*;
pub use function_types::*;
pub use package_types::*;
pub use service_types::*;
