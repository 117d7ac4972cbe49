use std::collections::HashMap;
use std::path::PathBuf;

use super::*;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_settings_from_variables() {
    let s = Settings::from_lookup(lookup(&[
        (CACHE_DIR_ENV, "/tmp/ctipkg-cache"),
        (REGISTRY_ENV, "/srv/registry"),
    ]));
    assert_eq!(s.cache_dir, Some(PathBuf::from("/tmp/ctipkg-cache")));
    assert_eq!(s.registry, Some(PathBuf::from("/srv/registry")));
}

#[test]
fn test_settings_empty_values_are_unset() {
    let s = Settings::from_lookup(lookup(&[(CACHE_DIR_ENV, ""), (REGISTRY_ENV, "")]));
    assert_eq!(s.cache_dir, default_cache_dir());
    assert_eq!(s.registry, None);
}

#[test]
fn test_settings_flag_overrides() {
    let s = Settings::from_lookup(lookup(&[(REGISTRY_ENV, "/env")]))
        .with_registry(Some(PathBuf::from("/flag")))
        .with_cache_dir(None);
    assert_eq!(s.registry, Some(PathBuf::from("/flag")));

    let kept = Settings::from_lookup(lookup(&[(REGISTRY_ENV, "/env")])).with_registry(None);
    assert_eq!(kept.registry, Some(PathBuf::from("/env")));
}
