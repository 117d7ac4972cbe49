use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use super::Package;
use crate::package::error::{PackageError, Result};

/// Language code, taken from the dictionary file's stem (`en.json` → `en`).
pub type LangCode = String;

/// One dictionary: message key → translation.
pub type Entry = BTreeMap<String, String>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dictionaries {
    pub dictionaries: BTreeMap<LangCode, Entry>,
}

impl Package {
    /// Load every dictionary the manifest lists.
    pub fn dictionaries(&self) -> Result<Dictionaries> {
        let mut out = Dictionaries::default();
        for dict in &self.index.dictionaries {
            let path = self.base_dir.join(dict);
            let file = std::fs::File::open(&path).map_err(|source| PackageError::Read {
                path: path.clone(),
                source,
            })?;
            let entry = decode_dictionary(file, &path)?;
            let lang = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            out.dictionaries.insert(lang, entry);
        }
        Ok(out)
    }
}

fn decode_dictionary(input: impl Read, path: &Path) -> Result<Entry> {
    serde_json::from_reader(std::io::BufReader::new(input)).map_err(|source| PackageError::Json {
        path: path.to_path_buf(),
        source,
    })
}
