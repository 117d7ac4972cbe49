use std::fmt;

// ─── Dependency Specs ──────────────────────────────────────────────

/// Split a dependency spec into `(name, version)`.
///
/// Accepts `name` and `name@version`. Parsing is permissive: anything
/// without an `@` (or with nothing after it) has an empty version, and
/// malformed input never fails.
pub fn parse_dependency(spec: &str) -> (&str, &str) {
    let spec = spec.trim();
    match spec.split_once('@') {
        Some((name, version)) => (name.trim(), version.trim()),
        None => (spec, ""),
    }
}

/// The name part of a dependency spec.
pub fn dependency_name(spec: &str) -> &str {
    parse_dependency(spec).0
}

/// Owned form of a parsed dependency spec.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencySpec {
    pub name: String,
    pub version: String,
}

impl DependencySpec {
    pub fn parse(spec: &str) -> Self {
        let (name, version) = parse_dependency(spec);
        Self {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}@{}", self.name, self.version)
        }
    }
}
