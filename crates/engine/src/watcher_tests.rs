// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use filetime::{set_file_mtime, FileTime};
use proptest::prelude::*;

fn touch(path: &Path, secs: i64) {
    if !path.exists() {
        std::fs::write(path, b"data").unwrap();
    }
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

fn patterns(list: &[&str]) -> PatternList {
    PatternList::compile(list.iter().copied()).unwrap()
}

#[test]
fn file_update_fires_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run1.fits");
    touch(&path, 1_000);
    let mut watcher = WatchedFile::new(&path, false, Some(1_000.0));

    assert!(!watcher.is_updated().unwrap());
    touch(&path, 1_010);
    assert!(watcher.is_updated().unwrap());
    assert!(!watcher.is_updated().unwrap());
    assert_eq!(watcher.mtime(), 1_010.0);
}

#[test]
fn changes_within_slack_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.png");
    touch(&path, 1_000);
    let mut watcher = WatchedFile::new(&path, false, Some(999.95));
    assert!(!watcher.is_updated().unwrap());

    let mut strict = WatchedFile::new(&path, false, Some(999.95)).slack(0.0);
    assert!(strict.is_updated().unwrap());
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut watcher = WatchedFile::new(dir.path().join("gone.fits"), false, None);
    assert_eq!(watcher.mtime(), 0.0);
    assert!(watcher.is_updated().is_err());
    assert!(watcher.new_files().is_err());
}

#[test]
fn successful_poll_clears_disappeared() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.fits");
    touch(&path, 1_000);
    let mut watcher = WatchedFile::new(&path, false, Some(1_000.0));
    watcher.disappeared = true;
    watcher.is_updated().unwrap();
    assert!(!watcher.disappeared);
}

proptest! {
    #[test]
    fn watermark_never_decreases(mtimes in proptest::collection::vec(1_000i64..2_000, 1..12)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.fits");
        touch(&path, 500);
        let mut watcher = WatchedFile::new(&path, false, Some(500.0));
        let mut last = watcher.mtime();
        for secs in mtimes {
            touch(&path, secs);
            watcher.is_updated().unwrap();
            prop_assert!(watcher.mtime() >= last);
            last = watcher.mtime();
            // a second poll without modification never fires
            prop_assert!(!watcher.is_updated().unwrap());
        }
    }
}

#[test]
fn dir_reports_new_children_once() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("old.fits"), 1_000);
    let baseline = mtime_secs(dir.path()).unwrap() + 1.0;
    let mut watcher = WatchedDir::new(dir.path(), baseline, PatternList::default(), PatternList::default(), false);
    assert!(watcher.new_files().unwrap().is_empty());

    std::fs::write(dir.path().join("new.fits"), b"x").unwrap();

    assert_eq!(watcher.new_files().unwrap(), vec![dir.path().join("new.fits")]);
    assert!(watcher.new_files().unwrap().is_empty());
}

#[test]
fn dir_filters_ignored_names_unless_watched() {
    let dir = tempfile::tempdir().unwrap();
    let baseline = mtime_secs(dir.path()).unwrap() + 1.0;
    let mut watcher =
        WatchedDir::new(dir.path(), baseline, patterns(&[".tdl.conf"]), patterns(&[".*", "*.py*"]), false);

    for name in [".hidden", "script.py", ".tdl.conf", "image.png"] {
        std::fs::write(dir.path().join(name), b"x").unwrap();
    }
    let mut found: Vec<String> = watcher.new_files().unwrap().iter().map(|p| basename(p)).collect();
    found.sort();

    assert_eq!(found, vec![".tdl.conf".to_string(), "image.png".to_string()]);
}

#[test]
fn dir_back_scans_children_created_after_baseline() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("early.fits"), b"x").unwrap();

    let mut watcher = WatchedDir::new(dir.path(), 0.0, PatternList::default(), PatternList::default(), false);

    assert_eq!(watcher.new_files().unwrap(), vec![dir.path().join("early.fits")]);
    assert!(watcher.new_files().unwrap().is_empty());
}

#[test]
fn dir_in_the_future_skips_back_scan() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("early.fits"), b"x").unwrap();
    let baseline = mtime_secs(dir.path()).unwrap() + 100.0;

    let mut watcher = WatchedDir::new(dir.path(), baseline, PatternList::default(), PatternList::default(), false);

    assert!(watcher.new_files().unwrap().is_empty());
}

#[test]
fn unreadable_dir_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let mut watcher = WatchedDir::new(&missing, 0.0, PatternList::default(), PatternList::default(), false);
    assert!(watcher.fileset().is_none());
    assert!(watcher.new_files().is_err());
}

#[test]
fn removed_dir_errors() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    std::fs::create_dir(&sub).unwrap();
    let mut watcher = WatchedDir::new(&sub, 0.0, PatternList::default(), PatternList::default(), false);
    std::fs::remove_dir(&sub).unwrap();
    assert!(watcher.new_files().is_err());
}

fn mep_subdir(root: &Path) -> PathBuf {
    let sub = root.join("solve.mep");
    std::fs::create_dir(&sub).unwrap();
    touch(&sub.join("table.dat"), 1_000);
    touch(&sub.join("other"), 1_000);
    set_file_mtime(&sub, FileTime::from_unix_time(1_000, 0)).unwrap();
    sub
}

#[test]
fn subdir_reports_itself_when_canary_changes() {
    let dir = tempfile::tempdir().unwrap();
    let sub = mep_subdir(dir.path());
    let mut watcher = WatchedSubdir::new(&sub, 1_000.0, patterns(&["table.dat"]), false);
    assert_eq!(watcher.canaries().collect::<Vec<_>>(), vec![sub.join("table.dat").as_path()]);
    assert!(watcher.new_files(1_500.0).unwrap().is_empty());

    touch(&sub.join("table.dat"), 2_000);

    assert_eq!(watcher.new_files(2_500.0).unwrap(), vec![sub.clone()]);
    assert!(watcher.new_files(2_600.0).unwrap().is_empty());
}

#[test]
fn subdir_ignores_non_canary_updates() {
    let dir = tempfile::tempdir().unwrap();
    let sub = mep_subdir(dir.path());
    let mut watcher = WatchedSubdir::new(&sub, 1_000.0, patterns(&["table.dat"]), false);

    touch(&sub.join("other"), 2_000);
    set_file_mtime(&sub, FileTime::from_unix_time(1_000, 0)).unwrap();

    assert!(watcher.new_files(2_500.0).unwrap().is_empty());
}

#[test]
fn subdir_listing_change_registers_new_canaries() {
    let dir = tempfile::tempdir().unwrap();
    let sub = mep_subdir(dir.path());
    let mut watcher = WatchedSubdir::new(&sub, 1_000.0, patterns(&["table.dat", "funklets"]), false);

    std::fs::write(sub.join("funklets"), b"f").unwrap();

    assert_eq!(watcher.new_files(5_000_000_000.0).unwrap(), vec![sub.clone()]);
    assert_eq!(watcher.canaries().count(), 2);
    assert!(watcher.new_files(5_000_000_000.0).unwrap().is_empty());
}

#[test]
fn vanished_canary_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let sub = mep_subdir(dir.path());
    let mut watcher = WatchedSubdir::new(&sub, 1_000.0, patterns(&["table.dat"]), false);

    std::fs::remove_file(sub.join("table.dat")).unwrap();
    // removal alone changes the listing but adds nothing new
    set_file_mtime(&sub, FileTime::from_unix_time(1_000, 0)).unwrap();

    assert!(watcher.new_files(1_500.0).unwrap().is_empty());
    assert_eq!(watcher.canaries().count(), 0);
}

#[test]
fn watcher_enum_delegates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.fits");
    touch(&path, 1_000);
    let mut watcher = Watcher::File(WatchedFile::new(&path, true, Some(0.0)));

    assert!(watcher.is_quiet());
    assert_eq!(watcher.path(), path.as_path());
    assert_eq!(watcher.new_files(0.0).unwrap(), vec![path.clone()]);
    watcher.file_mut().survive_deletion = true;
    assert!(watcher.file().survive_deletion);
}
