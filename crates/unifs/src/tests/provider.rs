// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::{mount, uri};
use crate::*;
use std::io::{Read, Write};

#[test]
fn test_mount_twice_then_remount() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    let again = m
        .provider
        .new_file_system(&uri("mem://bucket/other/path"), &FsConfig::default());
    assert!(matches!(again, Err(Error::AlreadyExists(_))));

    let same = m
        .provider
        .get_or_create_file_system(&uri("mem://bucket"), &FsConfig::default())?;
    assert_eq!(same.id(), m.fs.id());

    let removed = m.provider.remove_file_system(&uri("mem://bucket"));
    assert!(removed.is_some());
    assert!(matches!(
        m.provider.get_file_system(&uri("mem://bucket")),
        Err(Error::FileSystemNotFound(_))
    ));

    let remounted = m
        .provider
        .new_file_system(&uri("mem://bucket"), &FsConfig::default())?;
    assert_ne!(remounted.id(), m.fs.id());
    Ok(())
}

#[test]
fn test_mount_rejects_other_scheme() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    let err = m
        .provider
        .new_file_system(&uri("s3://bucket"), &FsConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    Ok(())
}

#[test]
fn test_get_path_from_uri() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    let path = m.provider.get_path(&uri("mem://bucket/a/b"))?;
    assert_eq!(path.to_string(), "/a/b");
    assert_eq!(path.to_uri()?.as_str(), "mem://bucket/a/b");
    assert_eq!(m.provider.get_path(&uri("mem://bucket"))?.to_string(), "/");
    Ok(())
}

#[test]
fn test_output_stream_default_options() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    let path = m.fs.get_path("/out.txt", &[]);

    let mut out = m.provider.new_output_stream(&path, &[])?;
    out.write_all(b"data")?;
    out.close()?;
    assert_eq!(
        m.backend.last_output_options(),
        Some(option_set(&[
            OpenOption::Write,
            OpenOption::Create,
            OpenOption::TruncateExisting
        ]))
    );
    assert_eq!(m.backend.object("/out.txt").as_deref(), Some(&b"data"[..]));

    let err = m
        .provider
        .new_output_stream(&path, &[OpenOption::Read])
        .err()
        .unwrap();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let _out = m
        .provider
        .new_output_stream(&path, &[OpenOption::Append])?;
    assert_eq!(
        m.backend.last_output_options(),
        Some(option_set(&[OpenOption::Write, OpenOption::Append]))
    );
    Ok(())
}

#[test]
fn test_input_stream_rejects_write_options() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    m.backend.put_object("/in.txt", b"hello");
    let path = m.fs.get_path("/in.txt", &[]);

    for option in [OpenOption::Write, OpenOption::Append] {
        let err = m.provider.new_input_stream(&path, &[option]).err().unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    let mut input = m.provider.new_input_stream(&path, &[])?;
    assert_eq!(m.fs.open_closeables(), 1);
    let mut text = String::new();
    _ = input.read_to_string(&mut text)?;
    assert_eq!(text, "hello");
    input.close()?;
    assert_eq!(m.fs.open_closeables(), 0);
    assert!(input.read(&mut [0u8; 4]).is_err());
    Ok(())
}

#[test]
fn test_read_attributes_uses_cache() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    m.backend.put_object("/dir/file", b"12345");
    let path = m.fs.get_path("/dir/../dir/./file", &[]);

    let attrs = m.provider.read_attributes(&path, AttributeView::Basic)?;
    assert!(attrs.is_regular_file());
    assert_eq!(attrs.size, 5);
    assert_eq!(m.backend.counters().fetches(), 1);

    let again = m
        .provider
        .read_attributes(&m.fs.get_path("/dir/file", &[]), AttributeView::Posix)?;
    assert_eq!(again, attrs);
    assert_eq!(m.backend.counters().fetches(), 1);
    assert!(m.fs.has_cached_attributes(&m.fs.get_path("/dir/file", &[]))?);

    let dir = m
        .provider
        .read_attributes(&m.fs.get_path("/dir", &[]), AttributeView::Basic)?;
    assert!(dir.is_directory());
    Ok(())
}

#[test]
fn test_read_attributes_missing_and_unsupported() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    let missing = m.fs.get_path("/nope", &[]);
    let err = m
        .provider
        .read_attributes(&missing, AttributeView::Basic)
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!m.fs.has_cached_attributes(&missing)?);
    assert_eq!(m.backend.counters().fetches(), 0);

    m.backend.put_object("/f", b"");
    let err = m
        .provider
        .read_attributes(&m.fs.get_path("/f", &[]), AttributeView::Dos)
        .unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));
    Ok(())
}

#[test]
fn test_uncached_filesystem_always_fetches() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::uncached())?;
    m.backend.put_object("/f", b"x");
    let path = m.fs.get_path("/f", &[]);
    _ = m.provider.read_attributes(&path, AttributeView::Basic)?;
    _ = m.provider.read_attributes(&path, AttributeView::Basic)?;
    assert_eq!(m.backend.counters().fetches(), 2);
    Ok(())
}

#[test]
fn test_delete_evicts_only_exact_key() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    m.backend.put_object("/d/f", b"x");
    m.backend.put_object("/d/g", b"y");
    let dir = m.fs.get_path("/d", &[]);
    let file = m.fs.get_path("/d/f", &[]);
    let sibling = m.fs.get_path("/d/g", &[]);
    for p in [&dir, &file, &sibling] {
        _ = m.provider.read_attributes(p, AttributeView::Basic)?;
    }

    m.provider.delete(&file)?;
    assert!(!m.fs.has_cached_attributes(&file)?);
    assert!(m.fs.has_cached_attributes(&dir)?);
    assert!(m.fs.has_cached_attributes(&sibling)?);
    assert!(!m.provider.exists(&file)?);

    m.fs.remove_from_attribute_cache_deep(&dir)?;
    assert!(!m.fs.has_cached_attributes(&dir)?);
    assert!(!m.fs.has_cached_attributes(&sibling)?);

    assert!(m.provider.delete(&file).unwrap_err().is_not_found());
    assert!(!m.provider.delete_if_exists(&file)?);
    Ok(())
}

#[test]
fn test_path_from_different_provider() -> Result<()> {
    let a = mount(PathStyle::Unix, FsConfig::default())?;
    let b = mount(PathStyle::Unix, FsConfig::default())?;
    let foreign = b.fs.get_path("/x", &[]);
    let err = a.provider.exists(&foreign).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(msg) if msg.contains("different provider")));
    assert!(a.provider.new_input_stream(&foreign, &[]).is_err());
    assert!(!a.provider.is_same_file(&a.fs.get_path("/x", &[]), &foreign)?);
    Ok(())
}

#[test]
fn test_directory_stream_pages_and_filters() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    for name in ["a", "b", "c", "d", "e"] {
        m.backend.put_object(&format!("/dir/{name}"), b"");
    }
    m.backend.put_object("/dir/sub/deep", b"");
    let dir = m.fs.get_path("/dir", &[]);

    let names: Vec<String> = m
        .provider
        .new_directory_stream(&dir, Box::new(|p| Ok(p.to_string() != "/dir/c")))?
        .map(|p| p.map(|p| p.to_string()))
        .collect::<Result<_>>()?;
    assert_eq!(names, ["/dir/a", "/dir/b", "/dir/d", "/dir/e", "/dir/sub"]);
    assert_eq!(m.backend.counters().pages(), 3);
    assert_eq!(m.fs.open_closeables(), 0);

    let mut stream = m.provider.new_directory_stream(&dir, Box::new(|_| Ok(true)))?;
    assert_eq!(m.fs.open_closeables(), 1);
    assert!(stream.next().is_some());
    stream.close()?;
    assert!(stream.next().is_none());
    assert_eq!(m.fs.open_closeables(), 0);

    let missing = m.fs.get_path("/nowhere", &[]);
    assert!(
        m.provider
            .new_directory_stream(&missing, Box::new(|_| Ok(true)))
            .err()
            .unwrap()
            .is_not_found()
    );
    Ok(())
}

#[test]
fn test_blob_listing_marks_directories() -> Result<()> {
    let m = mount(PathStyle::BlobStore, FsConfig::default())?;
    m.backend.put_object("/bucket/obj/part-0", b"");
    m.backend.put_object("/bucket/top", b"");
    let listed: Vec<UnixPath> = m
        .provider
        .new_directory_stream(&m.fs.get_path("/bucket/", &[]), Box::new(|_| Ok(true)))?
        .collect::<Result<_>>()?;
    let rendered: Vec<String> = listed.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, ["/bucket/obj/", "/bucket/top"]);
    assert!(listed[0].is_directory());
    assert_eq!(listed[0].blob_name().as_deref(), Some("obj/"));
    Ok(())
}

#[test]
fn test_attribute_view_is_lazy() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    m.backend.put_object("/f", b"abc");
    let path = m.fs.get_path("/f", &[]);

    let view = m
        .provider
        .get_file_attribute_view(&path, AttributeView::Owner)?
        .unwrap();
    assert_eq!(view.name(), "owner");
    assert_eq!(m.backend.counters().fetches(), 0);
    assert_eq!(view.read_attributes()?.size, 3);
    assert_eq!(m.backend.counters().fetches(), 1);

    assert!(
        m.provider
            .get_file_attribute_view(&path, AttributeView::Acl)?
            .is_none()
    );
    Ok(())
}

#[test]
fn test_copy_and_move() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    m.backend.put_object("/src", b"payload");
    m.backend.put_object("/taken", b"old");
    let src = m.fs.get_path("/src", &[]);
    let taken = m.fs.get_path("/taken", &[]);
    let copy = m.fs.get_path("/copy", &[]);

    m.provider.copy(&src, &copy, &[])?;
    assert_eq!(m.backend.object("/copy").as_deref(), Some(&b"payload"[..]));

    let err = m.provider.copy(&src, &taken, &[]).unwrap_err();
    assert!(matches!(err, Error::FileAlreadyExists(_)));
    m.provider
        .copy(&src, &taken, &[CopyOption::ReplaceExisting])?;
    assert_eq!(m.backend.object("/taken").as_deref(), Some(&b"payload"[..]));

    _ = m.provider.read_attributes(&src, AttributeView::Basic)?;
    let moved = m.fs.get_path("/moved", &[]);
    m.provider.move_path(&src, &moved, &[])?;
    assert!(m.backend.object("/src").is_none());
    assert!(!m.fs.has_cached_attributes(&src)?);
    assert!(m.provider.exists(&moved)?);

    let err = m.provider.copy(&src, &copy, &[]).unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[test]
fn test_create_directory() -> Result<()> {
    let m = mount(PathStyle::Unix, FsConfig::default())?;
    let dir = m.fs.get_path("/made", &[]);
    m.provider.create_directory(&dir)?;
    assert!(m.provider.read_attributes(&dir, AttributeView::Basic)?.is_directory());
    assert!(matches!(
        m.provider.create_directory(&dir),
        Err(Error::FileAlreadyExists(_))
    ));
    let orphan = m.fs.get_path("/no/parent", &[]);
    assert!(m.provider.create_directory(&orphan).unwrap_err().is_not_found());
    m.provider.delete(&dir)?;
    assert!(!m.provider.exists(&dir)?);
    Ok(())
}

#[test]
fn test_read_only_filesystem() -> Result<()> {
    let config = FsConfig {
        read_only: true,
        ..FsConfig::default()
    };
    let m = mount(PathStyle::Unix, config)?;
    m.backend.put_object("/f", b"x");
    let path = m.fs.get_path("/f", &[]);
    assert!(m.fs.is_read_only());
    assert!(m.fs.file_stores()[0].is_read_only());
    assert!(matches!(
        m.provider.new_output_stream(&path, &[]),
        Err(Error::ReadOnlyFileSystem(_))
    ));
    assert!(matches!(
        m.provider.delete(&path),
        Err(Error::ReadOnlyFileSystem(_))
    ));
    m.provider.check_access(&path, &[AccessMode::Read])?;
    assert!(matches!(
        m.provider.check_access(&path, &[AccessMode::Write]),
        Err(Error::ReadOnlyFileSystem(_))
    ));
    Ok(())
}

#[test]
fn test_hidden_same_file_and_store() -> Result<()> {
    let config = FsConfig {
        working_directory: Some("/home".to_string()),
        ..FsConfig::default()
    };
    let m = mount(PathStyle::Unix, config)?;
    assert!(m.provider.is_hidden(&m.fs.get_path("/a/.profile", &[]))?);
    assert!(!m.provider.is_hidden(&m.fs.get_path("/a/b", &[]))?);
    assert!(!m.provider.is_hidden(&m.fs.get_path("/a/..", &[]))?);

    let relative = m.fs.get_path("notes", &[]);
    assert_eq!(relative.to_absolute_path()?.to_string(), "/home/notes");
    assert!(
        m.provider
            .is_same_file(&relative, &m.fs.get_path("/home/x/../notes", &[]))?
    );

    let store = m.provider.get_file_store(&relative)?;
    assert_eq!(store.name(), "bucket");
    assert_eq!(store.store_type(), "memory");
    assert!(store.supports_view(AttributeView::Posix));
    assert!(!store.supports_view(AttributeView::Dos));
    Ok(())
}
