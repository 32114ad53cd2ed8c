// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let list = IgnoreList::new(dir.path().join(IGNORELIST_FILE));
    assert!(list.load().unwrap().is_empty());
}

#[test]
fn last_decision_per_path_wins() {
    let dir = tempfile::tempdir().unwrap();
    let list = IgnoreList::new(dir.path().join(IGNORELIST_FILE));
    list.append(100, Policy::Ignore, Path::new("/data/a.fits")).unwrap();
    list.append(200, Policy::Banish, Path::new("/data/with space.fits")).unwrap();
    list.append(300, Policy::Banish, Path::new("/data/a.fits")).unwrap();

    let records = list.load().unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[Path::new("/data/a.fits")], IgnoreRecord { timestamp: 300, policy: Policy::Banish });
    assert_eq!(records[Path::new("/data/with space.fits")].timestamp, 200);
    let text = std::fs::read_to_string(list.path()).unwrap();
    assert_eq!(text.lines().next(), Some("100 ignore /data/a.fits"));
}

#[test]
fn malformed_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(IGNORELIST_FILE);
    std::fs::write(&path, "garbage\n12 shred /x\n\n42 ignore /ok\n7 banish\n").unwrap();

    let records = IgnoreList::new(&path).load().unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[Path::new("/ok")].timestamp, 42);
}
