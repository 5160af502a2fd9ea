//! End-to-end CA archive scenarios: deep nesting, mixed timestamp
//! modes, and size-class selection across a larger population than the
//! in-module unit tests cover.

use dlca::aead::OsRandom;
use dlca::ca::{self, CaSettings, TimestampKind};
use dlca::{Archive, ArchiveEntry, CompressionKind, DlcaError};

#[test]
fn deeply_nested_directories_roundtrip() {
    let mut archive = Archive::new();
    archive
        .add_file(ArchiveEntry::file("a/b/c/d/e/leaf.txt", b"deep".to_vec()))
        .unwrap();

    let mut buf = Vec::new();
    ca::write(&mut buf, &archive, &CaSettings::default(), &OsRandom).unwrap();
    let decoded = ca::read(&mut &buf[..], None).unwrap();

    for dir in ["a", "a/b", "a/b/c", "a/b/c/d", "a/b/c/d/e"] {
        assert!(decoded.lookup(dir).is_some(), "missing directory {dir}");
    }
    assert_eq!(decoded.lookup("a/b/c/d/e/leaf.txt").unwrap().data, b"deep");
}

#[test]
fn short_timestamp_is_two_second_granular() {
    let mut archive = Archive::new();
    // 2024-01-01T13:45:28Z: an even second, off any day or hour boundary,
    // to exercise the packed date+time bits rather than just the date.
    let ts = 1_704_116_728;
    archive
        .add_file(ArchiveEntry::file("f.txt", b"x".to_vec()).with_timestamp(ts))
        .unwrap();

    let settings = CaSettings {
        timestamp: TimestampKind::Short,
        ..Default::default()
    };
    let mut buf = Vec::new();
    ca::write(&mut buf, &archive, &settings, &OsRandom).unwrap();
    let decoded = ca::read(&mut &buf[..], None).unwrap();
    assert_eq!(decoded.lookup("f.txt").unwrap().timestamp, Some(ts));
}

#[test]
fn short_timestamp_rounds_odd_seconds_down() {
    let mut archive = Archive::new();
    // One second off an even boundary: the 2-second resolution rounds
    // this down to `ts - 1` rather than silently keeping the odd second.
    let ts = 1_704_116_729;
    archive
        .add_file(ArchiveEntry::file("f.txt", b"x".to_vec()).with_timestamp(ts))
        .unwrap();

    let settings = CaSettings {
        timestamp: TimestampKind::Short,
        ..Default::default()
    };
    let mut buf = Vec::new();
    ca::write(&mut buf, &archive, &settings, &OsRandom).unwrap();
    let decoded = ca::read(&mut &buf[..], None).unwrap();
    assert_eq!(decoded.lookup("f.txt").unwrap().timestamp, Some(ts - 1));
}

#[test]
fn many_files_select_a_wider_index_class() {
    // 300 files forces a u16 index class even though each file is tiny.
    let mut archive = Archive::new();
    for i in 0..300 {
        archive
            .add_file(ArchiveEntry::file(format!("file{i:04}.bin"), vec![i as u8]))
            .unwrap();
    }

    let mut buf = Vec::new();
    ca::write(&mut buf, &archive, &CaSettings::default(), &OsRandom).unwrap();
    let decoded = ca::read(&mut &buf[..], None).unwrap();

    assert_eq!(
        decoded.entries().iter().filter(|e| e.kind == dlca::EntryKind::File).count(),
        300
    );
    assert_eq!(decoded.lookup("file0042.bin").unwrap().data, vec![42u8]);
}

#[test]
fn sha256_hash_flag_is_honored_on_compressed_archive() {
    let mut archive = Archive::new();
    archive
        .add_file(ArchiveEntry::file("data.bin", b"repeat me ".repeat(50)))
        .unwrap();

    let settings = CaSettings {
        hash: dlca::HashKind::Sha256,
        compression: CompressionKind::Brotli11,
        ..Default::default()
    };
    let mut buf = Vec::new();
    ca::write(&mut buf, &archive, &settings, &OsRandom).unwrap();
    let decoded = ca::read(&mut &buf[..], None).unwrap();
    assert_eq!(decoded.lookup("data.bin").unwrap().data, b"repeat me ".repeat(50));
}

#[test]
fn truncated_archive_is_rejected_not_panicked() {
    let mut archive = Archive::new();
    archive
        .add_file(ArchiveEntry::file("a.txt", b"hello world".to_vec()))
        .unwrap();

    let mut buf = Vec::new();
    ca::write(&mut buf, &archive, &CaSettings::default(), &OsRandom).unwrap();
    // Truncate into the data region: the declared file length no longer
    // fits in what's left of the payload.
    buf.truncate(buf.len() - 3);

    assert!(matches!(
        ca::read(&mut &buf[..], None),
        Err(DlcaError::InvalidState(_))
    ));
}
