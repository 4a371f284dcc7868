// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::mount;
use crate::*;

#[test]
fn test_glob_matcher() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    let deep = m.fs.get_path_matcher("glob:a/**/b")?;
    let shallow = m.fs.get_path_matcher("glob:a/*/b")?;
    let path = m.fs.get_path("a/x/y/b", &[]);
    assert!(deep.matches(&path));
    assert!(!shallow.matches(&path));
    assert!(shallow.matches(&m.fs.get_path("a/x/b", &[])));

    let ext = m.fs.get_path_matcher("GLOB:file.{txt,csv}")?;
    assert!(ext.matches_str("file.csv"));
    assert!(ext.matches_str("file.txt"));
    assert!(!ext.matches_str("file.json"));
    Ok(())
}

#[test]
fn test_regex_matcher_is_anchored() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    let matcher = m.fs.get_path_matcher("regex:/data/[0-9]+\\.csv")?;
    assert!(matcher.matches(&m.fs.get_path("/data/42.csv", &[])));
    assert!(!matcher.matches(&m.fs.get_path("/data/42.csv.bak", &[])));
    assert!(!matcher.matches(&m.fs.get_path("/x/data/42.csv", &[])));
    Ok(())
}

#[test]
fn test_matcher_errors() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    assert!(matches!(
        m.fs.get_path_matcher("*.txt"),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        m.fs.get_path_matcher("wildcard:*.txt"),
        Err(Error::Unsupported(_))
    ));
    match m.fs.get_path_matcher("glob:a[b/c]") {
        Err(Error::Glob(e)) => assert_eq!(e.index(), Some(3)),
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        m.fs.get_path_matcher("regex:(unclosed"),
        Err(Error::Regex(_))
    ));
    Ok(())
}

#[test]
fn test_glob_matcher_uses_separator_of_filesystem() -> Result<()> {
    let m = mount(PathStyle::BlobStore, FsConfig::default())?;
    let matcher = m.fs.get_path_matcher("glob:/bucket/*")?;
    assert!(matcher.matches(&m.fs.get_path("/bucket/obj", &[])));
    assert!(!matcher.matches(&m.fs.get_path("/bucket/obj/", &[])));
    assert!(!matcher.matches(&m.fs.get_path("/bucket/obj/part", &[])));
    Ok(())
}
