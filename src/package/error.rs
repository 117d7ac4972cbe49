//! Error types for the package manager.
//!
//! Variants follow the pipeline that produces them: fetching, post-install
//! processing, packing, validation and filesystem replacement. Every
//! variant carries the path, spec or dependency name it failed on.

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum PackageError {
    /// Reading a file failed.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing a file failed.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A JSON document could not be decoded or encoded.
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The resolver failed; nothing was recorded.
    #[error("failed to download dependencies [{specs}]: {source}")]
    Download {
        specs: String,
        source: Box<PackageError>,
    },

    /// A single dependency could not be fetched.
    #[error("cannot fetch {spec}: {message}")]
    Fetch { spec: String, message: String },

    /// No published version satisfies the requested constraint.
    #[error("no version of {name} matches '{requirement}'")]
    NoMatchingVersion { name: String, requirement: String },

    /// A step failed while processing one dependency.
    #[error("dependency {name}: {source}")]
    Dependency {
        name: String,
        source: Box<PackageError>,
    },

    /// A transitive dependency has no lock entry.
    #[error("{name} is not present in the lock")]
    NotLocked { name: String },

    /// Two source names would share one installed identifier.
    #[error("installed identifier {app_code} is bound to {existing}, cannot bind {source_name}")]
    LockConflict {
        app_code: String,
        existing: String,
        source_name: String,
    },

    /// Rewriting a dependency link failed.
    #[error("failed to link {} -> {}: {source}", .link.display(), .target.display())]
    Link {
        link: PathBuf,
        target: PathBuf,
        source: std::io::Error,
    },

    /// A filesystem replace primitive failed.
    #[error("{action} {} -> {}: {source}", .src.display(), .dst.display())]
    Fs {
        action: &'static str,
        src: PathBuf,
        dst: PathBuf,
        source: std::io::Error,
    },

    /// An instance refers to a type missing from the registry.
    #[error("type {0} not found")]
    TypeNotFound(String),

    /// Bundling an asset file failed.
    #[error("failed to bundle asset {path}: {source}")]
    Asset {
        path: String,
        source: std::io::Error,
    },

    /// An asset path is absolute or escapes the package directory.
    #[error("asset path {0} must stay inside the package")]
    UnsafeAssetPath(String),

    /// An asset path names an entry the bundle writes itself.
    #[error("asset path {0} collides with the bundle's own {1}")]
    ReservedAssetPath(String, String),

    /// The archive writer failed.
    #[error("bundle archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The schema collaborator failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl PackageError {
    /// Attach the name of the dependency being processed.
    pub fn for_dependency(name: impl Into<String>, err: PackageError) -> Self {
        PackageError::Dependency {
            name: name.into(),
            source: Box::new(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, PackageError>;
