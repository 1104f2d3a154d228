//! Process-level behaviour of the `sabre` binary: argument handling and exit codes.

use std::path::Path;
use std::process::{Command, Output};

fn sabre(args: &[&str], cache: &Path) -> Output {
  Command::new(env!("CARGO_BIN_EXE_sabre"))
    .args(args)
    .env("SABRE_SOLC_CACHE", cache)
    .env_remove("RUST_LOG")
    .output()
    .expect("run sabre")
}

#[test]
fn help_and_version_exit_zero() {
  let temp = tempfile::tempdir().expect("tempdir");

  let help = sabre(&["--help"], temp.path());
  assert_eq!(help.status.code(), Some(0));
  assert!(String::from_utf8_lossy(&help.stdout).contains("--clientToolName"));

  let version = sabre(&["--version"], temp.path());
  assert_eq!(version.status.code(), Some(0));
  assert!(String::from_utf8_lossy(&version.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn invalid_arguments_exit_255() {
  let temp = tempfile::tempdir().expect("tempdir");

  let missing_file = sabre(&[], temp.path());
  assert_eq!(missing_file.status.code(), Some(255));

  let bad_mode = sabre(&["Token.sol", "--mode", "deep"], temp.path());
  assert_eq!(bad_mode.status.code(), Some(255));
  assert!(String::from_utf8_lossy(&bad_mode.stderr).contains("deep"));
}

#[test]
fn unreadable_input_exits_255() {
  let temp = tempfile::tempdir().expect("tempdir");
  let file = temp.path().join("Nope.sol");

  let output = sabre(&[file.to_str().expect("utf-8 path")], temp.path());
  assert_eq!(output.status.code(), Some(255));
  assert!(String::from_utf8_lossy(&output.stderr).contains("error: failed to read"));
  assert!(output.stdout.is_empty());
}

#[test]
fn missing_pragma_exits_2_without_output() {
  let temp = tempfile::tempdir().expect("tempdir");
  let file = temp.path().join("Token.sol");
  std::fs::write(&file, "contract Token {}\n").expect("write contract");

  let output = sabre(&[file.to_str().expect("utf-8 path")], temp.path());
  assert_eq!(output.status.code(), Some(2));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Token.sol"));
  assert!(output.stdout.is_empty());
}
