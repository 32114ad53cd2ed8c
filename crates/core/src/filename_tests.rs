// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[yare::parameterized(
    simple       = { "x.fits",     "x",        ".fits" },
    double       = { "a.tar.gz",   "a.tar",    ".gz" },
    none         = { "Makefile",   "Makefile", "" },
    leading_dot  = { ".bashrc",    ".bashrc",  "" },
    dotted_ext   = { ".tdl.conf",  ".tdl",     ".conf" },
)]
fn splits_extension(name: &str, stem: &str, ext: &str) {
    assert_eq!(split_extension(name), (stem, ext));
}

#[test]
fn unique_name_is_unchanged_when_free() {
    let mut taken = HashSet::new();
    assert_eq!(make_unique_filename(&mut taken, "x.fits"), "x.fits");
    assert!(taken.contains("x.fits"));
}

#[test]
fn duplicate_names_get_numbered_suffixes() {
    let mut taken = HashSet::new();
    assert_eq!(make_unique_filename(&mut taken, "x.fits"), "x.fits");
    assert_eq!(make_unique_filename(&mut taken, "x.fits"), "x-1.fits");
    assert_eq!(make_unique_filename(&mut taken, "x.fits"), "x-2.fits");
}

#[test]
fn suffix_skips_names_already_taken() {
    let mut taken: HashSet<String> = ["x.fits".to_string(), "x-1.fits".to_string()].into();
    assert_eq!(make_unique_filename(&mut taken, "x.fits"), "x-2.fits");
}

#[yare::parameterized(
    clean        = { "run1.fits",        "run1.fits" },
    colon        = { "12:30.png",        "12_30.png" },
    all_illegal  = { r#"a\b:c*d?e"f<g>h|i"#, "a_b_c_d_e_f_g_h_i" },
    leading_dot  = { ".hidden",          "hidden" },
    separators   = { "../../up.fits",    "._.._up.fits" },
    absolute     = { "/etc/passwd",      "_etc_passwd" },
)]
fn sanitizes(name: &str, expected: &str) {
    assert_eq!(sanitize_filename(name), expected);
}

proptest! {
    #[test]
    fn unique_names_never_collide(names in proptest::collection::vec("[ab]{1,2}(\\.fits)?", 1..20)) {
        let mut taken = HashSet::new();
        let out: Vec<String> = names.iter().map(|n| make_unique_filename(&mut taken, n)).collect();
        let distinct: HashSet<&String> = out.iter().collect();
        prop_assert_eq!(distinct.len(), names.len());
    }
}
