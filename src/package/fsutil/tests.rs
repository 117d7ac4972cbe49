use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::*;

/// Relative path → file bytes for every regular file under `root`.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, std::fs::read(e.path()).unwrap())
        })
        .collect()
}

fn make_tree(root: &Path) {
    std::fs::create_dir_all(root.join("nested/deeper")).unwrap();
    std::fs::write(root.join("index.json"), b"{\"app_code\":\"a.p\"}").unwrap();
    std::fs::write(root.join("nested/a.txt"), b"alpha").unwrap();
    std::fs::write(root.join("nested/deeper/b.bin"), [0u8, 1, 2, 255]).unwrap();
}

#[test]
fn test_replace_with_copy_fresh_destination() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("out/dst");
    make_tree(&src);
    let before = snapshot(&src);

    replace_with_copy(&src, &dst).unwrap();

    assert_eq!(snapshot(&dst), before);
    assert_eq!(snapshot(&src), before, "source must be untouched");
}

#[test]
fn test_replace_with_copy_discards_old_destination() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    make_tree(&src);
    std::fs::create_dir_all(dst.join("stale")).unwrap();
    std::fs::write(dst.join("stale/old.txt"), b"old").unwrap();
    std::fs::write(dst.join("index.json"), b"old index").unwrap();

    replace_with_copy(&src, &dst).unwrap();

    assert!(!dst.join("stale").exists());
    assert_eq!(snapshot(&dst), snapshot(&src));
}

#[test]
fn test_replace_with_copy_is_independent() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    make_tree(&src);
    replace_with_copy(&src, &dst).unwrap();

    std::fs::write(dst.join("nested/a.txt"), b"changed").unwrap();
    assert_eq!(std::fs::read(src.join("nested/a.txt")).unwrap(), b"alpha");
}

#[test]
fn test_replace_with_copy_missing_source() {
    let tmp = tempfile::tempdir().unwrap();
    let err = replace_with_copy(&tmp.path().join("nope"), &tmp.path().join("dst")).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("nope"), "error should name the source: {}", msg);
    assert!(msg.contains("dst"), "error should name the destination: {}", msg);
}

#[test]
fn test_replace_with_move() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("a/b/dst");
    make_tree(&src);
    let before = snapshot(&src);

    replace_with_move(&src, &dst).unwrap();

    assert!(!src.exists());
    assert_eq!(snapshot(&dst), before);
}

#[test]
fn test_replace_with_move_over_existing() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    make_tree(&src);
    std::fs::create_dir_all(dst.join("junk")).unwrap();
    std::fs::write(dst.join("junk/x"), b"x").unwrap();
    let before = snapshot(&src);

    replace_with_move(&src, &dst).unwrap();

    assert!(!src.exists());
    assert!(!dst.join("junk").exists());
    assert_eq!(snapshot(&dst), before);
}

#[test]
fn test_local_fs_delegates() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    make_tree(&src);
    let ops: &dyn TreeOps = &LocalFs;

    ops.replace_with_copy(&src, &tmp.path().join("copy")).unwrap();
    ops.replace_with_move(&tmp.path().join("copy"), &tmp.path().join("moved"))
        .unwrap();
    assert_eq!(snapshot(&tmp.path().join("moved")), snapshot(&src));
}

#[cfg(unix)]
#[test]
fn test_link_dir_replaces_directory_with_symlink() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("shared");
    make_tree(&target);
    let link = tmp.path().join("pkg/.dep/shared");
    std::fs::create_dir_all(&link).unwrap();
    std::fs::write(link.join("private.txt"), b"private copy").unwrap();

    link_dir(&target, &link).unwrap();

    let meta = std::fs::symlink_metadata(&link).unwrap();
    assert!(meta.file_type().is_symlink());
    assert_eq!(std::fs::read_link(&link).unwrap(), target);
    assert_eq!(std::fs::read(link.join("nested/a.txt")).unwrap(), b"alpha");

    // Rewriting an existing link is idempotent.
    link_dir(&target, &link).unwrap();
    assert_eq!(std::fs::read_link(&link).unwrap(), target);
}

#[cfg(unix)]
#[test]
fn test_replace_with_copy_keeps_symlinks() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    make_tree(&src);
    std::os::unix::fs::symlink("nested/a.txt", src.join("alias")).unwrap();
    let dst = tmp.path().join("dst");

    replace_with_copy(&src, &dst).unwrap();

    assert_eq!(
        std::fs::read_link(dst.join("alias")).unwrap(),
        PathBuf::from("nested/a.txt")
    );
}
