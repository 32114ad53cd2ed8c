// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::render::Renderer;
use filetime::FileTime;
use purr_core::RecordingProgress;
use std::fs;
use tempfile::TempDir;
use yare::parameterized;

const TS: i64 = 1_700_000_000;

struct Fixture {
    _dir: TempDir,
    work: PathBuf,
    logdir: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let work = dir.path().join("work");
    let logdir = dir.path().join("log");
    fs::create_dir_all(&work).unwrap();
    fs::create_dir_all(&logdir).unwrap();
    Fixture { work: canonize_path(&work), logdir: canonize_path(&logdir), _dir: dir }
}

impl Fixture {
    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.work.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn saved_entry(&self, names: &[&str]) -> LogEntry {
        let dps = names.iter().map(|n| DataProduct::new(self.file(n, n))).collect();
        let mut entry = LogEntry::new(TS, "Run 1", "first look", dps);
        let report = entry.save_in(&self.logdir, None).unwrap();
        assert!(report.is_clean(), "{report:?}");
        entry
    }
}

fn set_old_mtime(path: &Path) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(1_000_000, 0)).unwrap();
}

#[parameterized(
    entry = { "entry-20240101-120000", Some(false) },
    ignore = { "ignore-20240101-120000", Some(true) },
    short_date = { "entry-2024011-120000", None },
    suffix = { "entry-20240101-120000.bak", None },
    other = { "fullindex.html", None },
)]
fn dir_name_cases(name: &str, expected: Option<bool>) {
    assert_eq!(parse_dir_name(name), expected);
}

#[test]
fn dir_name_follows_timestamp_and_flag() {
    let name = entry_dir_name(false, TS);
    assert_eq!(parse_dir_name(&name), Some(false));
    assert_eq!(entry_dir_name(true, TS).replacen("ignore", "entry", 1), name);
}

#[test]
fn save_archives_products_and_writes_index() {
    let fx = fixture();
    let entry = fx.saved_entry(&["run1.fits"]);

    let dir = fx.logdir.join(entry_dir_name(false, TS));
    assert_eq!(entry.pathname(), Some(dir.as_path()));
    assert_eq!(fs::read(dir.join("run1.fits")).unwrap(), b"run1.fits");
    assert!(dir.join(INDEX_FILE).is_file());
    assert!(entry.dps()[0].is_archived());
    assert!(!entry.is_updated());
}

#[test]
fn save_without_directory_fails() {
    let mut entry = LogEntry::new(TS, "t", "", vec![]);
    assert!(matches!(entry.save(None), Err(EntryError::NoPathname)));
}

#[test]
fn unchanged_entry_save_touches_nothing() {
    let fx = fixture();
    let mut entry = fx.saved_entry(&["run1.fits"]);
    let index = entry.index_file().unwrap();
    set_old_mtime(&index);

    let report = entry.save(None).unwrap();

    assert!(report.archived.is_empty());
    assert_eq!(mtime_secs(&index).unwrap(), 1_000_000.0);
}

#[test]
fn refresh_rewrites_index() {
    let fx = fixture();
    let mut entry = fx.saved_entry(&["run1.fits"]);
    let index = entry.index_file().unwrap();
    set_old_mtime(&index);

    entry.save(Some(2_000_000.0)).unwrap();

    assert!(mtime_secs(&index).unwrap() > 1_000_000.0);
}

#[test]
fn load_reads_back_what_save_wrote() {
    let fx = fixture();
    let src = fx.file("a.png", "png");
    let junk = fx.file("junk.fits", "junk");
    let dps = vec![
        DataProduct::new(&src).comment("the \"best\" <one>").quiet(true),
        DataProduct::new(&junk).with_policy(Policy::Banish),
    ];
    let mut entry = LogEntry::new(TS, "Run <1>", "para one\nwrapped\n\nLOG: a\nb", dps);
    entry.save_in(&fx.logdir, None).unwrap();

    let loaded = LogEntry::load(entry.pathname().unwrap(), EntryEnv::default()).unwrap();

    assert_eq!(loaded.timestamp(), TS);
    assert_eq!(loaded.title(), "Run <1>");
    assert_eq!(loaded.comment(), "para one wrapped\nLOG: a<BR>b");
    assert!(!loaded.is_updated());
    assert!(!loaded.is_ignore());
    assert_eq!(loaded.dps().len(), 2);
    let png = &loaded.dps()[0];
    assert!(png.is_archived());
    assert_eq!(png.filename, "a.png");
    assert_eq!(png.sourcepath, src);
    assert_eq!(png.comment, "the \"best\" <one>");
    assert!(png.quiet);
    assert_eq!(png.render.as_deref(), Some("link"));
    assert!((png.timestamp.unwrap() - entry.dps()[0].timestamp.unwrap()).abs() < 1e-3);
    let banished = &loaded.dps()[1];
    assert!(!banished.is_archived());
    assert_eq!(banished.policy(), Policy::Banish);
    assert_eq!(banished.sourcepath, junk);
}

#[test]
fn load_drops_products_whose_file_vanished() {
    let fx = fixture();
    let entry = fx.saved_entry(&["a.png", "b.png"]);
    let dir = entry.pathname().unwrap();
    fs::remove_file(dir.join("a.png")).unwrap();

    let loaded = LogEntry::load(dir, EntryEnv::default()).unwrap();

    assert_eq!(loaded.dps().len(), 1);
    assert_eq!(loaded.dps()[0].filename, "b.png");
}

#[test]
fn load_without_title_is_marked_malformed() {
    let fx = fixture();
    let dir = fx.logdir.join("entry-20240101-120000");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(INDEX_FILE), "<HTML><BODY></BODY></HTML>").unwrap();

    let loaded = LogEntry::load(&dir, EntryEnv::default()).unwrap();

    assert_eq!(loaded.title(), MALFORMED_TITLE);
    assert!(loaded.dps().is_empty());
}

#[test]
fn load_rejects_other_directories() {
    let fx = fixture();
    let err = LogEntry::load(&fx.work, EntryEnv::default()).unwrap_err();
    assert!(matches!(err, EntryError::NotAnEntry(_)));

    let missing_index = fx.logdir.join("entry-20240101-120000");
    fs::create_dir_all(&missing_index).unwrap();
    assert!(matches!(LogEntry::load(&missing_index, EntryEnv::default()), Err(EntryError::Io { .. })));
}

#[test]
fn load_rejects_unknown_policy() {
    let fx = fixture();
    let dir = fx.logdir.join("entry-20240101-120000");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(INDEX_FILE),
        r#"<A CLASS="TITLE" TIMESTAMP=1>t</A><A CLASS="DP" SRC="/x" POLICY="shred" COMMENT=""></A>"#,
    )
    .unwrap();
    assert!(matches!(LogEntry::load(&dir, EntryEnv::default()), Err(EntryError::Parse { .. })));
}

#[test]
fn removal_happens_first_and_frees_the_name() {
    let fx = fixture();
    let mut entry = fx.saved_entry(&["x.fits"]);
    let dir = entry.pathname().unwrap().to_path_buf();
    let other = fx.work.join("other");
    fs::create_dir_all(&other).unwrap();
    fs::write(other.join("x.fits"), "new x").unwrap();

    entry.edit_product(0, ProductEdit::new().policy(Policy::Remove)).unwrap();
    let mut dps = entry.dps().to_vec();
    dps.push(DataProduct::new(other.join("x.fits")));
    entry.update(None, None, Some(dps), None);
    let report = entry.save(None).unwrap();

    assert_eq!(report.removed, vec!["x.fits".to_string()]);
    assert_eq!(entry.dps().len(), 1);
    assert_eq!(entry.dps()[0].filename, "x.fits");
    assert_eq!(fs::read_to_string(dir.join("x.fits")).unwrap(), "new x");
}

#[test]
fn missing_source_is_skipped_but_rest_is_saved() {
    let fx = fixture();
    let good = fx.file("good.fits", "g");
    let dps = vec![DataProduct::new(&good), DataProduct::new(fx.work.join("gone.fits"))];
    let mut entry = LogEntry::new(TS, "partial", "", dps);

    let report = entry.save_in(&fx.logdir, None).unwrap();

    assert_eq!(report.skipped, vec![fx.work.join("gone.fits")]);
    assert!(!report.is_clean());
    assert_eq!(entry.dps().len(), 1);
    assert!(entry.pathname().unwrap().join("good.fits").exists());
}

#[test]
fn failed_copy_drops_only_that_product() {
    let fx = fixture();
    let good = fx.file("good.fits", "g");
    let bad = fx.file("bad.fits", "b");
    // longer than any filesystem allows, so the copy itself fails
    let too_long = format!("{}.fits", "x".repeat(300));
    let dps = vec![DataProduct::new(&good), DataProduct::new(&bad).filename(too_long)];
    let mut entry = LogEntry::new(TS, "partial", "", dps);

    let report = entry.save_in(&fx.logdir, None).unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, bad);
    assert!(matches!(report.failed[0].1, ArchiveError::Copy { .. }), "{:?}", report.failed[0].1);
    let dir = entry.pathname().unwrap().to_path_buf();
    assert_eq!(report.archived, vec![dir.join("good.fits")]);
    let names: Vec<&str> = entry.dps().iter().map(|dp| dp.filename.as_str()).collect();
    assert_eq!(names, vec!["good.fits"]);
    assert!(dir.join(INDEX_FILE).exists());
}

#[test]
fn product_names_cannot_escape_the_entry() {
    let fx = fixture();
    let src = fx.file("a.fits", "a");
    let mut entry = LogEntry::new(TS, "escape", "", vec![DataProduct::new(&src).filename("../../escaped.fits")]);

    let report = entry.save_in(&fx.logdir, None).unwrap();

    assert!(report.is_clean(), "{report:?}");
    let dir = entry.pathname().unwrap();
    assert!(dir.join("._.._escaped.fits").exists());
    assert!(!fx.logdir.parent().unwrap().join("escaped.fits").exists());
}

#[test]
fn loaded_entry_is_named_after_its_directory() {
    let fx = fixture();
    let dir = fx.logdir.join("entry-20200101-000000");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("a.fits"), "a").unwrap();
    // no TITLE anchor, so no timestamp either
    fs::write(
        dir.join(INDEX_FILE),
        r#"<A CLASS="DP" FILENAME="a.fits" SRC="/data/a.fits" POLICY="copy" QUIET=0 TIMESTAMP=1 RENDER="link" COMMENT=""></A>"#,
    )
    .unwrap();

    let mut entries = vec![LogEntry::load(&dir, EntryEnv::default()).unwrap()];

    assert_eq!(entries[0].id(), "entry-20200101-000000");
    assert_eq!(entries[0].rel_index_link(), "../entry-20200101-000000/index.html");
    crate::index::write_log_index(&fx.logdir, "log", 0.0, &mut entries, 0.0).unwrap();
    let index = fs::read_to_string(fx.logdir.join(INDEX_FILE)).unwrap();
    assert!(index.contains("entry-20200101-000000/a.fits"), "{index}");
}

#[test]
fn duplicate_names_are_numbered_at_save() {
    let fx = fixture();
    for sub in ["a", "b"] {
        fs::create_dir_all(fx.work.join(sub)).unwrap();
        fs::write(fx.work.join(sub).join("x.fits"), sub).unwrap();
    }
    let dps = vec![
        DataProduct::new(fx.work.join("a").join("x.fits")),
        DataProduct::new(fx.work.join("b").join("x.fits")),
    ];
    let mut entry = LogEntry::new(TS, "dupes", "", dps);

    entry.save_in(&fx.logdir, None).unwrap();

    let dir = entry.pathname().unwrap();
    assert_eq!(fs::read_to_string(dir.join("x.fits")).unwrap(), "a");
    assert_eq!(fs::read_to_string(dir.join("x-1.fits")).unwrap(), "b");
}

#[test]
fn ignore_entries_only_record_decisions() {
    let fx = fixture();
    let dps = vec![
        DataProduct::new(fx.file("a.fits", "a")),
        DataProduct::new(fx.file("b.fits", "b")).with_policy(Policy::Banish),
    ];
    let mut entry = LogEntry::new_ignore(TS, dps);
    assert_eq!(entry.dps()[0].policy(), Policy::Ignore);
    assert_eq!(entry.dps()[1].policy(), Policy::Banish);

    entry.save_in(&fx.logdir, None).unwrap();

    let dir = entry.pathname().unwrap();
    assert_eq!(basename(dir), entry_dir_name(true, TS));
    assert!(!dir.join("a.fits").exists());
    let html = fs::read_to_string(dir.join(INDEX_FILE)).unwrap();
    assert!(html.contains(IGNORE_TITLE));
    assert!(!html.contains("FILENAME="));
    assert!(html.contains(r#"POLICY="banish""#));
}

#[test]
fn edit_product_renames_archived_and_marks_updated() {
    let fx = fixture();
    let mut entry = fx.saved_entry(&["a.png"]);
    let dir = entry.pathname().unwrap().to_path_buf();

    assert!(entry.edit_product(0, ProductEdit::new().rename("b.png").comment("renamed")).unwrap());

    assert!(entry.is_updated());
    assert!(dir.join("b.png").exists());
    assert!(!dir.join("a.png").exists());
    assert!(!entry.edit_product(0, ProductEdit::new().policy(Policy::Keep)).unwrap());
    assert!(matches!(
        entry.edit_product(0, ProductEdit::new().policy(Policy::Move)),
        Err(EntryError::Product(_))
    ));
    assert!(matches!(entry.edit_product(5, ProductEdit::new()), Err(EntryError::NoSuchProduct(5))));
}

#[test]
fn edit_product_on_unsaved_only_changes_metadata() {
    let fx = fixture();
    let mut entry = LogEntry::new(TS, "t", "", vec![DataProduct::new(fx.file("a.png", "a"))]);
    entry.edit_product(0, ProductEdit::new().policy(Policy::Move).rename("b.png")).unwrap();
    assert_eq!(entry.dps()[0].policy(), Policy::Move);
    assert_eq!(entry.dps()[0].filename, "b.png");
    assert!(fx.work.join("a.png").exists());
}

#[test]
fn include_rendering_uses_and_refreshes_cache() {
    let fx = fixture();
    let mut entry = fx.saved_entry(&["a.png"]);
    let cache = entry.pathname().unwrap().join(INCLUDE_CACHE_FILE);

    let first = entry.render_index(Some("entry/"), 0.0);
    assert_eq!(fs::read_to_string(&cache).unwrap(), first);
    assert!(first.contains(r#"HREF="entry/a.png""#), "{first}");

    fs::write(&cache, "cached").unwrap();
    assert_eq!(entry.render_index(Some("entry/"), 0.0), "cached");

    set_old_mtime(&cache);
    let refreshed = entry.render_index(Some("entry/"), 2_000_000.0);
    assert_ne!(refreshed, "cached");
}

#[test]
fn links_are_rendered() {
    let fx = fixture();
    let mut entry = fx.saved_entry(&[]);
    entry.set_links(EntryLinks {
        prev: Some("../entry-20230101-000000/index.html".into()),
        next: None,
        up: Some("../index.html".into()),
    });
    entry.generate_index(0.0).unwrap();
    let html = fs::read_to_string(entry.index_file().unwrap()).unwrap();
    assert!(html.contains(r#"<A HREF="../entry-20230101-000000/index.html">&lt;&lt;Previous</A>"#));
    assert!(html.contains(r#"<A HREF="../index.html">Up</A>"#));
    assert!(!html.contains("Next&gt;&gt;"));
}

struct FreshRenderer;

impl Renderer for FreshRenderer {
    fn name(&self) -> &str {
        "fresh"
    }

    fn stamp(&self) -> f64 {
        4_000_000_000.0
    }

    fn render_row(&self, _dp: &DataProduct, _relpath: &str, _refresh: f64) -> String {
        String::new()
    }
}

#[test]
fn newer_renderer_marks_loaded_entry_updated() {
    let fx = fixture();
    let entry = fx.saved_entry(&["a.png"]);
    let mut renderers = RendererRegistry::new();
    renderers.register(Arc::new(FreshRenderer));
    let env = EntryEnv { renderers: Arc::new(renderers), ..EntryEnv::default() };

    let loaded = LogEntry::load(entry.pathname().unwrap(), env).unwrap();

    assert!(loaded.is_updated());
}

#[test]
fn save_reports_progress() {
    let fx = fixture();
    let progress = Arc::new(RecordingProgress::default());
    let env = EntryEnv { progress: progress.clone(), ..EntryEnv::default() };
    let mut entry =
        LogEntry::new(TS, "t", "", vec![DataProduct::new(fx.file("a.png", "a"))]).with_env(env);

    entry.save_in(&fx.logdir, None).unwrap();

    let messages = progress.messages();
    assert!(messages[0].starts_with("Rendering entry for"), "{messages:?}");
    assert_eq!(messages[1], "archiving a.png");
    assert!(!progress.is_busy());
}

#[test]
fn remove_directory_deletes_everything() {
    let fx = fixture();
    let entry = fx.saved_entry(&["a.png"]);
    let dir = entry.pathname().unwrap().to_path_buf();
    entry.remove_directory().unwrap();
    assert!(!dir.exists());
    assert!(fx.work.join("a.png").exists());
    LogEntry::new(TS, "never saved", "", vec![]).remove_directory().unwrap();
}

#[test]
fn editable_comment_restores_typed_text() {
    let entry = LogEntry::new(TS, "t", "one\n\nLOG: a\nb", vec![]);
    assert_eq!(entry.comment(), "one\nLOG: a<BR>b");
    assert_eq!(entry.editable_comment(), "one\n\nLOG: a\nb");
}
