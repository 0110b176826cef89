use std::fs;

use safe_core::convert::{convert, ConversionRequest};
use safe_core::crypto::Password;
use safe_core::{ErrorKind, SafeError};
use tempfile::tempdir;

#[test]
fn test_notes_round_trip_and_wrong_password() {
    let dir = tempdir().expect("tempdir should be created");
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "a\nb\n").expect("write should succeed");
    let password = Password::new("hunter2");

    let safe = convert(&ConversionRequest::encrypt(&notes), &password)
        .expect("encrypt should succeed");
    assert_eq!(safe, dir.path().join("notes.txt.safe"));

    let body = fs::read_to_string(&safe).expect("read should succeed");
    assert_eq!(body.split('\n').count(), 2);
    assert!(!body.split('\n').any(|line| line == "a" || line == "b"));

    let err = convert(
        &ConversionRequest::decrypt(&safe).with_overwrite(true),
        &Password::new("wrong"),
    )
    .expect_err("wrong password must fail");
    assert_eq!(err.kind(), ErrorKind::ConversionFailed);
    assert_eq!(err.root_cause().kind(), ErrorKind::Authentication);
    assert_eq!(fs::read_to_string(&notes).expect("read should succeed"), "a\nb\n");

    fs::remove_file(&notes).expect("remove should succeed");
    let restored = convert(&ConversionRequest::decrypt(&safe), &password)
        .expect("decrypt should succeed");
    assert_eq!(restored, notes);
    assert_eq!(fs::read_to_string(&notes).expect("read should succeed"), "a\nb\n");
}

#[test]
fn test_overwrite_guard_leaves_target_untouched() {
    let dir = tempdir().expect("tempdir should be created");
    let notes = dir.path().join("notes.txt");
    let existing = dir.path().join("notes.txt.safe");
    fs::write(&notes, "fresh content").expect("write should succeed");
    fs::write(&existing, b"previous bytes\x00\xff").expect("write should succeed");

    let err = convert(&ConversionRequest::encrypt(&notes), &Password::new("hunter2"))
        .expect_err("existing target must be refused");

    assert!(matches!(err, SafeError::WouldOverwrite(ref path) if path == &existing));
    assert_eq!(
        fs::read(&existing).expect("read should succeed"),
        b"previous bytes\x00\xff"
    );
}

#[test]
fn test_overwrite_replaces_target() {
    let dir = tempdir().expect("tempdir should be created");
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "one\ntwo\n").expect("write should succeed");
    let password = Password::new("hunter2");

    let safe = convert(&ConversionRequest::encrypt(&notes), &password)
        .expect("encrypt should succeed");
    fs::write(&notes, "a much longer local edit that must be replaced\n")
        .expect("write should succeed");

    convert(&ConversionRequest::decrypt(&safe).with_overwrite(true), &password)
        .expect("decrypt should succeed");

    assert_eq!(fs::read_to_string(&notes).expect("read should succeed"), "one\ntwo\n");
}

#[test]
fn test_decrypt_requires_safe_suffix() {
    let dir = tempdir().expect("tempdir should be created");
    let plain = dir.path().join("notes.txt");
    fs::write(&plain, "a").expect("write should succeed");

    let err = convert(&ConversionRequest::decrypt(&plain), &Password::new("hunter2"))
        .expect_err("plain file must be rejected");

    assert_eq!(err.kind(), ErrorKind::NotASafeFile);
}

#[test]
fn test_missing_source() {
    let dir = tempdir().expect("tempdir should be created");
    let err = convert(
        &ConversionRequest::encrypt(dir.path().join("missing.txt")),
        &Password::new("hunter2"),
    )
    .expect_err("missing file must fail");

    assert_eq!(err.kind(), ErrorKind::FileNotFound);
}

#[test]
fn test_explicit_names() {
    let dir = tempdir().expect("tempdir should be created");
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "x\n").expect("write should succeed");
    let password = Password::new("hunter2");

    let safe = convert(
        &ConversionRequest::encrypt(&notes).with_target("vault"),
        &password,
    )
    .expect("encrypt should succeed");
    assert_eq!(safe, dir.path().join("vault.safe"));

    let err = convert(
        &ConversionRequest::decrypt(&safe).with_target("plain.safe"),
        &password,
    )
    .expect_err("decrypt target ending in .safe must be refused");
    assert_eq!(err.kind(), ErrorKind::InvalidTargetName);

    let plain = convert(
        &ConversionRequest::decrypt(&safe).with_target("plain.txt"),
        &password,
    )
    .expect("decrypt should succeed");
    assert_eq!(plain, dir.path().join("plain.txt"));
    assert_eq!(fs::read_to_string(&plain).expect("read should succeed"), "x\n");
}

#[test]
fn test_corrupted_token_writes_nothing() {
    let dir = tempdir().expect("tempdir should be created");
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "a\nb\nc\n").expect("write should succeed");
    let password = Password::new("hunter2");
    let safe = convert(&ConversionRequest::encrypt(&notes), &password)
        .expect("encrypt should succeed");
    fs::remove_file(&notes).expect("remove should succeed");

    let body = fs::read_to_string(&safe).expect("read should succeed");
    let mut tokens: Vec<&str> = body.split('\n').collect();
    tokens[1] = "garbage";
    fs::write(&safe, tokens.join("\n")).expect("write should succeed");

    let err = convert(&ConversionRequest::decrypt(&safe), &password)
        .expect_err("corrupted token must fail");

    assert_eq!(err.root_cause().kind(), ErrorKind::Authentication);
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .expect("read_dir should succeed")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("notes.txt.safe")]);
}
