//! Integration tests for CLI commands.

use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::json;
use tempfile::TempDir;

fn run_cli(args: &[&str]) -> (bool, String, String) {
    run_cli_with_stdin(args, "")
}

fn run_cli_with_stdin(args: &[&str], stdin: &str) -> (bool, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_footprint"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    (output.status.success(), stdout, stderr)
}

fn write_input(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_encode_integer_golden() {
    let (success, stdout, _) = run_cli_with_stdin(&["encode"], "5");
    assert!(success);
    assert_eq!(stdout.trim(), "8003000100000005");
}

#[test]
fn test_encode_is_order_independent() {
    let (_, forward, _) = run_cli_with_stdin(&["encode"], r#"{"a": 1, "b": 2}"#);
    let (_, backward, _) = run_cli_with_stdin(&["encode"], r#"{"b": 2, "a": 1}"#);
    assert_eq!(forward, backward);
}

#[test]
fn test_encode_then_decode_file() {
    let dir = TempDir::new().unwrap();
    let document = json!({
        "name": "hallo Welt",
        "pi": 3.141,
        "big": { "$int": "36893488147419103232" },
        "pair": { "$tuple": [1, null] },
        "keys": { "$map": [[5, 5], [{ "$complex": [3.0, 4.0] }, "l"]] }
    });
    let input = write_input(&dir, "doc.json", &document.to_string());

    let (success, encoded, stderr) = run_cli(&["encode", &input]);
    assert!(success, "{}", stderr);
    let footprint = write_input(&dir, "doc.hex", &encoded);

    let (success, decoded, stderr) = run_cli(&["decode", &footprint, "--strict"]);
    assert!(success, "{}", stderr);
    let decoded: serde_json::Value = serde_json::from_str(&decoded).unwrap();
    assert_eq!(decoded["name"], "hallo Welt");
    assert_eq!(decoded["big"], document["big"]);
    assert_eq!(decoded["pair"], document["pair"]);
}

#[test]
fn test_base64_round_trip() {
    let (success, encoded, _) = run_cli_with_stdin(&["encode", "--base64"], r#""öäüß""#);
    assert!(success);
    let (success, decoded, _) = run_cli_with_stdin(&["decode", "--base64"], &encoded);
    assert!(success);
    assert_eq!(decoded.trim(), r#""öäüß""#);
}

#[test]
fn test_legacy_record_needs_layout() {
    let document = r#"{"$record": "Point", "fields": [["x", 4], ["y", 5]]}"#;
    let (success, encoded, _) = run_cli_with_stdin(&["encode", "--legacy"], document);
    assert!(success);
    assert!(encoded.starts_with("00"));

    let (success, _, stderr) = run_cli_with_stdin(&["decode"], &encoded);
    assert!(!success);
    assert!(stderr.contains("unknown class 'Point'"));

    let (success, decoded, _) =
        run_cli_with_stdin(&["decode", "--record", "Point=x,y"], &encoded);
    assert!(success);
    let decoded: serde_json::Value = serde_json::from_str(&decoded).unwrap();
    assert_eq!(decoded["$record"], "Point");
    assert_eq!(decoded["fields"], json!([["x", 4], ["y", 5]]));
}

#[test]
fn test_legacy_and_version_conflict() {
    let (success, _, _) = run_cli_with_stdin(&["encode", "--legacy", "--version", "3"], "1");
    assert!(!success);
}

#[test]
fn test_decode_rejects_truncated_input() {
    let (success, _, stderr) = run_cli_with_stdin(&["decode"], "800300010000");
    assert!(!success);
    assert!(stderr.contains("malformed footprint"));
}

#[test]
fn test_decode_opaque_extension() {
    // Extension "pkg.T" with state int 1, written by hand.
    let hex = concat!("80", "0c", "05000000", "706b672e54", "03", "00", "01000000", "01");
    let (success, _, stderr) = run_cli_with_stdin(&["decode"], hex);
    assert!(!success);
    assert!(stderr.contains("pkg.T"));

    let (success, stdout, _) = run_cli_with_stdin(&["decode", "--opaque", "pkg.T"], hex);
    assert!(success);
    let decoded: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(decoded, json!({ "$extension": "pkg.T", "state": 1 }));
}

#[test]
fn test_digest_output_shape() {
    let (success, stdout, _) = run_cli_with_stdin(&["digest"], r#"[1, 2, 3]"#);
    assert!(success);
    let digest: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(digest["alg"], "sha-256");
    assert_eq!(digest["b64"].as_str().unwrap().len(), 43);

    let (_, legacy, _) = run_cli_with_stdin(&["digest", "--legacy"], r#"[1, 2, 3]"#);
    assert_ne!(stdout, legacy);
}

#[test]
fn test_version_command() {
    let (success, stdout, _) = run_cli(&["version"]);
    assert!(success);
    assert!(stdout.contains("current 0x80"));
    assert!(stdout.contains("legacy  0x00"));
}

#[test]
fn test_missing_input_file() {
    let (success, _, stderr) = run_cli(&["encode", "/nonexistent/doc.json"]);
    assert!(!success);
    assert!(stderr.contains("failed to read"));
}
