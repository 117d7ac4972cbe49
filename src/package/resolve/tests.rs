use std::path::{Path, PathBuf};

use super::*;
use crate::package::cache::entry_path;
use crate::package::error::PackageError;
use crate::package::fsutil::LocalFs;
use crate::package::manifest::{IndexLock, PackageLock, SourceInfo};

fn publish(registry: &Path, name: &str, version: &str, app_code: &str, depends: &[&str]) -> PathBuf {
    let dir = registry.join(name).join(version);
    std::fs::create_dir_all(&dir).unwrap();
    let index = serde_json::json!({
        "app_code": app_code,
        "entities": [],
        "depends": depends,
    });
    std::fs::write(dir.join("index.json"), index.to_string()).unwrap();
    std::fs::write(dir.join("readme.txt"), format!("{}@{}", name, version)).unwrap();
    dir
}

struct Fixture {
    _tmp: tempfile::TempDir,
    registry: PathBuf,
    deps: PathBuf,
    cache: PathBuf,
}

fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let registry = tmp.path().join("registry");
    let deps = tmp.path().join("pkg/.dep");
    let cache = tmp.path().join("cache");
    Fixture {
        registry,
        deps,
        cache,
        _tmp: tmp,
    }
}

fn download(f: &Fixture, lock: &IndexLock, depends: &[&str], replace: bool) -> Result<Resolution> {
    let depends: Vec<String> = depends.iter().map(|s| s.to_string()).collect();
    let ctx = InstallContext {
        dependencies_dir: &f.deps,
        package_cache_dir: &f.cache,
        lock,
        fs: &LocalFs,
    };
    DirectoryResolver::new(&f.registry).download(&ctx, &depends, replace)
}

// ─── Version Selection ─────────────────────────────────────────────

fn versions(vs: &[&str]) -> Vec<String> {
    vs.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_select_exact_directory() {
    let vs = versions(&["1.0.0", "main", "2.0.0"]);
    assert_eq!(select_version("x", &vs, "main").unwrap(), "main");
    assert_eq!(select_version("x", &vs, "1.0.0").unwrap(), "1.0.0");
}

#[test]
fn test_select_highest_matching() {
    let vs = versions(&["1.0.0", "1.4.2", "v1.10.0", "2.0.0"]);
    assert_eq!(select_version("x", &vs, "^1.2").unwrap(), "v1.10.0");
    assert_eq!(select_version("x", &vs, "v2").unwrap(), "2.0.0");
    assert_eq!(select_version("x", &vs, "<1.1").unwrap(), "1.0.0");
}

#[test]
fn test_select_empty_requirement_takes_highest() {
    let vs = versions(&["0.9.0", "1.2.0", "1.10.0"]);
    assert_eq!(select_version("x", &vs, "").unwrap(), "1.10.0");

    let non_semver = versions(&["alpha", "beta"]);
    assert_eq!(select_version("x", &non_semver, "").unwrap(), "beta");
}

#[test]
fn test_select_no_match() {
    let vs = versions(&["1.0.0"]);
    let err = select_version("x", &vs, "^2").unwrap_err();
    assert!(matches!(err, PackageError::NoMatchingVersion { .. }));
    assert!(select_version("x", &[], "").is_err());
}

// ─── Download ──────────────────────────────────────────────────────

#[test]
fn test_download_places_transitive_dependencies() {
    let f = fixture();
    publish(&f.registry, "base", "1.0.0", "v.base", &[]);
    publish(&f.registry, "app", "1.0.0", "v.app", &["base@^1"]);

    let res = download(&f, &IndexLock::default(), &["app@1.0.0"], false).unwrap();

    assert_eq!(res.installed_names(), vec!["app", "base"]);
    assert!(res.replaced.is_empty());
    assert!(f.deps.join("v.app/index.json").is_file());
    assert!(f.deps.join("v.base/index.json").is_file());
    assert!(entry_path(&f.cache, "app", "1.0.0").join("index.json").is_file());

    let app = &res.installed[0];
    assert_eq!(app.lock.app_code, "v.app");
    assert_eq!(app.lock.depends, vec!["base@^1"]);
    assert_eq!(app.info.version, "1.0.0");
    assert!(app.info.integrity.starts_with("blake3:"));
}

#[test]
fn test_download_keeps_locked_version_without_replace() {
    let f = fixture();
    publish(&f.registry, "lib", "1.0.0", "v.lib", &[]);
    publish(&f.registry, "lib", "1.1.0", "v.lib", &[]);

    let mut lock = IndexLock::default();
    lock.record(
        "lib",
        PackageLock {
            app_code: "v.lib".into(),
            depends: vec![],
        },
        SourceInfo {
            source: "registry".into(),
            version: "1.0.0".into(),
            integrity: String::new(),
        },
    )
    .unwrap();

    let kept = download(&f, &lock, &["lib"], false).unwrap();
    assert_eq!(kept.installed[0].info.version, "1.0.0");
    assert!(kept.replaced.is_empty());

    let bumped = download(&f, &lock, &["lib"], true).unwrap();
    assert_eq!(bumped.installed[0].info.version, "1.1.0");
    assert!(bumped.replaced.contains("lib"));
    assert_eq!(
        std::fs::read_to_string(f.deps.join("v.lib/readme.txt")).unwrap(),
        "lib@1.1.0"
    );
}

#[test]
fn test_download_visits_each_name_once() {
    let f = fixture();
    publish(&f.registry, "shared", "1.0.0", "v.shared", &[]);
    publish(&f.registry, "a", "1.0.0", "v.a", &["shared"]);
    publish(&f.registry, "b", "1.0.0", "v.b", &["shared", "a"]);

    let res = download(&f, &IndexLock::default(), &["a", "b"], false).unwrap();
    assert_eq!(res.installed_names(), vec!["a", "b", "shared"]);
}

#[test]
fn test_download_unknown_package() {
    let f = fixture();
    std::fs::create_dir_all(&f.registry).unwrap();
    let err = download(&f, &IndexLock::default(), &["ghost@1.0.0"], false).unwrap_err();
    assert!(matches!(err, PackageError::Fetch { .. }), "{}", err);
    assert!(!f.deps.join("ghost").exists());
}

#[test]
fn test_download_missing_app_code_uses_escaped_name() {
    let f = fixture();
    publish(&f.registry, "org/tool", "0.1.0", "", &[]);
    let res = download(&f, &IndexLock::default(), &["org/tool"], false).unwrap();
    assert_eq!(res.installed[0].lock.app_code, "org%2Ftool");
    assert!(f.deps.join("org%2Ftool/index.json").is_file());
}

#[test]
fn test_download_rejects_reserved_identifiers() {
    for app_code in ["..", ".", ".staging", ".hidden"] {
        let f = fixture();
        publish(&f.registry, "evil", "1.0.0", app_code, &[]);
        std::fs::create_dir_all(f.deps.join("keep")).unwrap();

        let err = download(&f, &IndexLock::default(), &["evil"], false).unwrap_err();
        assert!(
            matches!(&err, PackageError::Dependency { source, .. } if matches!(**source, PackageError::Fetch { .. })),
            "{}: {}",
            app_code,
            err
        );
        assert!(f.deps.join("keep").is_dir(), "{}", app_code);
        assert!(!f.deps.join(".staging").exists(), "{}", app_code);
    }
}

#[test]
fn test_download_identifier_taken_in_same_resolution() {
    let f = fixture();
    publish(&f.registry, "one", "1.0.0", "v.same", &[]);
    publish(&f.registry, "two", "1.0.0", "v.same", &[]);

    let err = download(&f, &IndexLock::default(), &["one", "two"], false).unwrap_err();
    assert!(err.to_string().contains("v.same"), "{}", err);
    assert_eq!(
        std::fs::read_to_string(f.deps.join("v.same/readme.txt")).unwrap(),
        "one@1.0.0"
    );
}

#[test]
fn test_download_identifier_owned_by_locked_package() {
    let f = fixture();
    publish(&f.registry, "one", "1.0.0", "v.same", &[]);
    publish(&f.registry, "two", "1.0.0", "v.same", &[]);

    let res = download(&f, &IndexLock::default(), &["one"], false).unwrap();
    let mut lock = IndexLock::default();
    let one = &res.installed[0];
    lock.record(&one.source_name, one.lock.clone(), one.info.clone())
        .unwrap();

    let err = download(&f, &lock, &["two"], false).unwrap_err();
    assert!(
        matches!(&err, PackageError::Dependency { source, .. } if matches!(**source, PackageError::LockConflict { .. })),
        "{}",
        err
    );
    assert_eq!(
        std::fs::read_to_string(f.deps.join("v.same/readme.txt")).unwrap(),
        "one@1.0.0"
    );
}
