// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use filetime::FileTime;

fn write_with_mtime(path: &Path, contents: &str, mtime: i64) {
    fs::write(path, contents).unwrap();
    filetime::set_file_mtime(path, FileTime::from_unix_time(mtime, 0)).unwrap();
}

fn mtime_of(path: &Path) -> i64 {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap()).unix_seconds()
}

#[test]
fn copy_preserves_contents_and_mtime() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("run1.fits");
    let dst = dir.path().join("copy.fits");
    write_with_mtime(&src, "SIMPLE = T", 1_500_000_000);

    copy_file(&src, &dst).unwrap();

    assert_eq!(fs::read_to_string(&dst).unwrap(), "SIMPLE = T");
    assert_eq!(mtime_of(&dst), 1_500_000_000);
    assert!(src.exists());
}

#[test]
fn copy_skips_newer_destination() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.txt");
    let dst = dir.path().join("b.txt");
    write_with_mtime(&src, "old", 1_000);
    write_with_mtime(&dst, "newer", 2_000);

    copy_file(&src, &dst).unwrap();

    assert_eq!(fs::read_to_string(&dst).unwrap(), "newer");
}

#[test]
fn move_removes_source() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.png");
    let dst = dir.path().join("b.png");
    write_with_mtime(&src, "png", 1_234_567);

    move_file(&src, &dst).unwrap();

    assert!(!src.exists());
    assert_eq!(fs::read_to_string(&dst).unwrap(), "png");
    assert_eq!(mtime_of(&dst), 1_234_567);
}

#[test]
fn move_missing_source_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = move_file(&dir.path().join("nope"), &dir.path().join("dest")).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
}

#[test]
fn bundle_unpacks_next_to_original() {
    let dir = tempfile::tempdir().unwrap();
    let tree = dir.path().join("solve.mep");
    fs::create_dir_all(tree.join("funklets")).unwrap();
    fs::write(tree.join("table.dat"), "table").unwrap();
    fs::write(tree.join("funklets").join("f0"), "funklet").unwrap();
    let bundle = dir.path().join("solve.mep.tgz");

    bundle_dir(&tree, &bundle).unwrap();
    remove_path(&tree).unwrap();
    assert!(!tree.exists());
    unpack_bundle(&bundle, dir.path()).unwrap();

    assert_eq!(fs::read_to_string(tree.join("table.dat")).unwrap(), "table");
    assert_eq!(fs::read_to_string(tree.join("funklets").join("f0")).unwrap(), "funklet");
}

#[test]
fn unpack_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("bad.tgz");
    fs::write(&bundle, "not gzip").unwrap();
    assert!(unpack_bundle(&bundle, dir.path()).is_err());
}

#[test]
fn remove_path_handles_files_trees_and_missing() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("f");
    let tree = dir.path().join("t");
    fs::write(&file, "x").unwrap();
    fs::create_dir_all(tree.join("sub")).unwrap();
    fs::write(tree.join("sub").join("g"), "y").unwrap();

    remove_path(&file).unwrap();
    remove_path(&tree).unwrap();
    remove_path(&dir.path().join("missing")).unwrap();

    assert!(!file.exists());
    assert!(!tree.exists());
}

#[test]
fn same_file_detects_identity() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, "x").unwrap();
    fs::write(&b, "x").unwrap();

    assert!(same_file(&a, &a));
    assert!(same_file(&a, &dir.path().join(".").join("a")));
    assert!(!same_file(&a, &b));
    assert!(!same_file(&a, &dir.path().join("missing")));
}
