#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use safe_core::convert::{convert, ConversionRequest};
use safe_core::crypto::Password;
use safe_core::shell::ShellBridge;
use safe_core::ErrorKind;
use tempfile::{tempdir, TempDir};

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    safe: PathBuf,
}

fn fixture(content: &str) -> Fixture {
    let dir = tempdir().expect("tempdir should be created");
    let root = dir.path().join("transient");
    fs::create_dir(&root).expect("create_dir should succeed");
    let plain = dir.path().join("notes.txt");
    fs::write(&plain, content).expect("write should succeed");
    let safe = convert(&ConversionRequest::encrypt(&plain), &Password::new("hunter2"))
        .expect("encrypt should succeed");
    fs::remove_file(&plain).expect("remove should succeed");
    Fixture {
        _dir: dir,
        root,
        safe,
    }
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .expect("read_dir should succeed")
        .next()
        .is_none()
}

#[test]
fn test_cat_leaves_no_plaintext_and_no_rewrite() {
    let fx = fixture("alpha\nbravo\n");
    let before = fs::read(&fx.safe).expect("read should succeed");

    let outcome = ShellBridge::with_transient_root(&fx.root)
        .run(&Password::new("hunter2"), &fx.safe, "cat", &[])
        .expect("cat should run");

    assert!(outcome.status.success());
    assert!(!outcome.reencrypted);
    assert_eq!(fs::read(&fx.safe).expect("read should succeed"), before);
    assert!(is_empty_dir(&fx.root));
}

#[test]
fn test_grep_with_arguments() {
    let fx = fixture("alpha\nbravo\n");

    let outcome = ShellBridge::with_transient_root(&fx.root)
        .run(
            &Password::new("hunter2"),
            &fx.safe,
            "grep",
            &["-q".to_string(), "bravo".to_string()],
        )
        .expect("grep should run");

    assert!(outcome.status.success());
    assert!(is_empty_dir(&fx.root));
}

#[test]
fn test_failing_command_still_cleans_up() {
    let fx = fixture("alpha\n");

    let outcome = ShellBridge::with_transient_root(&fx.root)
        .run(
            &Password::new("hunter2"),
            &fx.safe,
            "grep",
            &["-q".to_string(), "no-such-line".to_string()],
        )
        .expect("grep should run");

    assert!(!outcome.status.success());
    assert!(!outcome.reencrypted);
    assert!(is_empty_dir(&fx.root));
}

#[test]
fn test_wrong_password_decrypts_nothing() {
    let fx = fixture("alpha\n");

    let err = ShellBridge::with_transient_root(&fx.root)
        .run(&Password::new("wrong"), &fx.safe, "cat", &[])
        .expect_err("wrong password must fail");

    assert_eq!(err.root_cause().kind(), ErrorKind::Authentication);
    assert!(is_empty_dir(&fx.root));
}

#[test]
fn test_unsupported_command() {
    let fx = fixture("alpha\n");

    let err = ShellBridge::with_transient_root(&fx.root)
        .run(&Password::new("hunter2"), &fx.safe, "rm", &[])
        .expect_err("rm must be refused");

    assert_eq!(err.kind(), ErrorKind::UnsupportedCommand);
    assert!(fx.safe.exists());
    assert!(is_empty_dir(&fx.root));
}

#[test]
fn test_edit_is_reencrypted() {
    let fx = fixture("alpha\n");
    let password = Password::new("hunter2");
    let bridge = ShellBridge::with_transient_root(&fx.root);

    let copy = bridge
        .open_transient(&password, &fx.safe)
        .expect("decrypt should succeed");
    assert!(copy.path().starts_with(&fx.root));
    assert_eq!(copy.path().file_name().and_then(|n| n.to_str()), Some("notes.txt"));
    assert_eq!(fs::read_to_string(copy.path()).expect("read should succeed"), "alpha\n");

    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(copy.path()).expect("metadata should succeed").permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    fs::write(copy.path(), "alpha\nedited\n").expect("write should succeed");
    assert!(copy.finish().expect("finish should succeed"));
    assert!(is_empty_dir(&fx.root));

    let plain = convert(&ConversionRequest::decrypt(&fx.safe), &password)
        .expect("decrypt should succeed");
    assert_eq!(fs::read_to_string(plain).expect("read should succeed"), "alpha\nedited\n");
}

#[test]
fn test_dropped_copy_is_erased() {
    let fx = fixture("alpha\n");
    let password = Password::new("hunter2");
    let bridge = ShellBridge::with_transient_root(&fx.root);

    {
        let copy = bridge
            .open_transient(&password, &fx.safe)
            .expect("decrypt should succeed");
        fs::write(copy.path().with_file_name(".notes.txt.swp"), "swap").expect("write should succeed");
    }

    assert!(is_empty_dir(&fx.root));
}
