use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{PackageManager, BUNDLE_NAME};
use crate::package::error::{PackageError, Result};
use crate::package::manifest::INDEX_FILE_NAME;
use crate::package::read_file;
use crate::schema::{parent_cti, METADATA_CACHE_FILE};

impl PackageManager {
    /// Build `bundle.zip`: every asset referenced by an instance, the
    /// manifest (listing `.cache.json` as serialized metadata) and the
    /// metadata cache itself.
    ///
    /// The archive is written to `bundle.zip.part` and renamed on success;
    /// a failure leaves any previous bundle in place.
    pub fn pack(&self) -> Result<PathBuf> {
        let parsed = self.parser.parse_package(&self.index_path())?;
        parsed.dump_cache()?;

        let bundle_path = self.base_dir.join(BUNDLE_NAME);
        let part_path = self.base_dir.join(format!("{}.part", BUNDLE_NAME));
        let write_err = |source| PackageError::Write {
            path: part_path.clone(),
            source,
        };

        let file = File::create(&part_path).map_err(write_err)?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut index = self.package.index.clone();
        index.put_serialized(METADATA_CACHE_FILE);
        let mut reserved: Vec<&str> = vec![INDEX_FILE_NAME];
        reserved.extend(index.serialized.iter().map(String::as_str));

        let mut assets: BTreeSet<String> = BTreeSet::new();
        for instance in parsed.registry.instances.values() {
            let ty = parent_cti(&instance.cti)
                .and_then(|parent| parsed.registry.types.get(parent))
                .ok_or_else(|| PackageError::TypeNotFound(instance.cti.clone()))?;

            for (key, annotation) in &ty.annotations {
                if annotation.asset.is_none() {
                    continue;
                }
                let asset_path = key
                    .get_value(&instance.values)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                // An unset asset field ends the scan for this instance.
                if asset_path.is_empty() {
                    break;
                }
                let rel = package_relative(asset_path)?;
                if let Some(entry) = reserved.iter().find(|entry| rel == normalized(entry)) {
                    return Err(PackageError::ReservedAssetPath(
                        asset_path.to_string(),
                        entry.to_string(),
                    ));
                }
                if !assets.insert(asset_path.to_string()) {
                    continue;
                }

                let asset_err = |source| PackageError::Asset {
                    path: asset_path.to_string(),
                    source,
                };
                let bytes = std::fs::read(parsed.base_dir.join(rel)).map_err(asset_err)?;
                zip.start_file(asset_path, options)?;
                zip.write_all(&bytes).map_err(asset_err)?;
                debug!(asset = asset_path, cti = %instance.cti, "bundled asset");
            }
        }

        let index_bytes = index.to_bytes().map_err(|source| PackageError::Json {
            path: self.index_path(),
            source,
        })?;
        zip.start_file(INDEX_FILE_NAME, options)?;
        zip.write_all(&index_bytes).map_err(write_err)?;

        for metadata in &index.serialized {
            let bytes = read_file(&parsed.base_dir.join(package_relative(metadata)?))?;
            zip.start_file(metadata.as_str(), options)?;
            zip.write_all(&bytes).map_err(write_err)?;
        }

        zip.finish()?
            .flush()
            .map_err(write_err)?;
        std::fs::rename(&part_path, &bundle_path).map_err(|source| PackageError::Write {
            path: bundle_path.clone(),
            source,
        })?;

        info!("Packed {} ({} assets)", bundle_path.display(), assets.len());
        Ok(bundle_path)
    }
}

/// Check that an archive path stays inside the package directory.
fn package_relative(path: &str) -> Result<PathBuf> {
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(PackageError::UnsafeAssetPath(path.to_string()));
    }
    Ok(normalized(path))
}

/// `path` without `.` components.
fn normalized(path: &str) -> PathBuf {
    Path::new(path)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_relative() {
        assert!(package_relative("assets/icon.png").is_ok());
        assert!(package_relative("./icon.png").is_ok());
        assert!(package_relative("../secret").is_err());
        assert!(package_relative("assets/../../x").is_err());
        assert!(package_relative("/etc/passwd").is_err());
        assert_eq!(package_relative("./a/./b.png").unwrap(), PathBuf::from("a/b.png"));
    }
}
