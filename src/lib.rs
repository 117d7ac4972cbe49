pub mod config;
pub mod logging;
pub mod package;
pub mod schema;

// Re-exports: flat `ctipkg::X` paths used by the CLI and tests
pub use package::cache;
pub use package::error::{PackageError, Result};
pub use package::fsutil;
pub use package::manager::{PackageManager, BUNDLE_NAME, DEPENDENCY_DIR_NAME};
pub use package::manifest;
pub use package::manifest::{parse_dependency, Index, IndexLock, Package};
pub use package::resolve::{DirectoryResolver, Resolver};
