use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;
use zos_ccsid::{Charset, convert_bytes};

const HELLO: &[u8] = b"Hello, World!\n";

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_zos-ccsid"))
        .arg("--backend")
        .arg("none")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run zos-ccsid")
}

fn run_cli_with_stdin(args: &[&str], input: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_zos-ccsid"))
        .arg("--backend")
        .arg("none")
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn zos-ccsid");
    child
        .stdin
        .take()
        .expect("child stdin")
        .write_all(input)
        .expect("write child stdin");
    child.wait_with_output().expect("wait for zos-ccsid")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

#[test]
fn missing_arguments_fail() {
    let output = run_cli(&[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: Both input and output files required"));
}

#[test]
fn stdin_without_output_fails() {
    let output = run_cli(&["--stdin"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: Output file required with --stdin"));
}

#[test]
fn info_without_tagging_support_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("data.txt");
    fs::write(&file, HELLO).unwrap();

    let output = run_cli(&["--info", path_str(&file)]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Could not get file tag info for"));
}

#[test]
fn info_on_stdin_reports_untagged() {
    let output = run_cli_with_stdin(&["--info", "--stdin"], b"");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "Source: stdin\n  CCSID: 0\n  Encoding: untagged\n");
}

#[test]
fn untagged_input_is_copied() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output_path = dir.path().join("out.txt");
    fs::write(&input, HELLO).unwrap();

    let output = run_cli(&[path_str(&input), path_str(&output_path)]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "Conversion successful: 14 bytes -> 14 bytes\n");
    assert_eq!(fs::read(&output_path).unwrap(), HELLO);
}

#[test]
fn explicit_source_is_transcoded() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output_path = dir.path().join("out.txt");
    fs::write(&input, HELLO).unwrap();

    let output = run_cli(&[
        "--from",
        "iso8859-1",
        path_str(&input),
        path_str(&output_path),
    ]);

    assert!(output.status.success());
    assert_eq!(
        fs::read(&output_path).unwrap(),
        convert_bytes(HELLO, Charset::Iso8859_1, Charset::Ibm1047)
    );
}

#[test]
fn missing_input_fails_with_message() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("out.txt");

    let output = run_cli(&["/no/such/input", path_str(&output_path)]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: failed to stat /no/such/input"));
}

#[test]
fn stdin_is_converted_to_ebcdic() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("stdin.out");

    let output = run_cli_with_stdin(&["--stdin", path_str(&output_path)], HELLO);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Converted 14 bytes from stdin to "));
    assert_eq!(
        fs::read(&output_path).unwrap(),
        vec![
            0xC8, 0x85, 0x93, 0x93, 0x96, 0x6B, 0x40, 0xE6, 0x96, 0x99, 0x93, 0x84, 0x5A, 0x15
        ]
    );
}

#[test]
fn json_report_is_printed() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output_path = dir.path().join("out.txt");
    fs::write(&input, HELLO).unwrap();

    let output = run_cli(&["--json", path_str(&input), path_str(&output_path)]);

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["success"], true);
    assert_eq!(report["input_kind"], "file");
    assert_eq!(report["encoding_detected"], "untagged");
    assert_eq!(report["bytes_written"], 14);
}
