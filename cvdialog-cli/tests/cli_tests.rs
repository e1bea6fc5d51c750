use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn cvdialog_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("cvdialog"))
}

const DIALOG: &str = r#"#include "cvdialog.h"
// Version [1.0]
#ifdef RES_US
#include "main_us.str"
#elif defined RES_GERMAN
#include "main_de.str"
#elif defined RES_JAPAN
#include "main_jp.str"
#else
#error "Unsupported language"
#endif

begin_dialog_definition_ex_(IDD_MAIN, "", 0, 0, 200, 120, IDS_TITLE, "CVDialog", 0, "", 0)
begin_dialog_properties()
end_dialog_properties()
declare_control(Button, IDC_OK)
begin_control_definitions()
    begin_control_ex(Button, "CVButton", IDC_OK, "{}Caption=""OK""", 5, 30, 40, 12, 0, 0)
    end_control_ex()
end_control_definitions()
end_dialog_definition_ex_()
"#;

fn write_dialog(dir: &TempDir) -> String {
    let path = dir.path().join("main.dlg");
    fs::write(&path, DIALOG).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_tokens_command() {
    let dir = TempDir::new().unwrap();
    let input = write_dialog(&dir);

    let output = cvdialog_cmd().args(["tokens", "-i", &input]).output().unwrap();
    assert!(
        output.status.success(),
        "Command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("directive `#include`\nstring \"cvdialog.h\"\n"));
    assert!(stdout.contains("keyword `begin_dialog_definition_ex_`"));
}

#[test]
fn test_view_command() {
    let dir = TempDir::new().unwrap();
    let input = write_dialog(&dir);

    let output = cvdialog_cmd()
        .args(["view", "-i", &input, "--locale", "de"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== Dialog IDD_MAIN ==="));
    assert!(stdout.contains("Locale: de-DE"));
    assert!(stdout.contains("Control 1: IDC_OK (Button)"));
}

#[test]
fn test_view_json() {
    let dir = TempDir::new().unwrap();
    let input = write_dialog(&dir);

    let output = cvdialog_cmd().args(["view", "-i", &input, "--json"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["locale"], "any");
    assert_eq!(value["version"], "1.0");
}

#[test]
fn test_verify_command_reports_errors() {
    let dir = TempDir::new().unwrap();
    let input = write_dialog(&dir);
    let schema = dir.path().join("schema.json");
    fs::write(
        &schema,
        r#"{ "dialog": [{ "label": "id", "required": true }, { "label": "helpId", "required": true }] }"#,
    )
    .unwrap();

    let output = cvdialog_cmd()
        .args(["verify", "-i", &input, "-s", schema.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[Error] dialog: missing required property `helpId`"));
    assert!(stdout.contains("[Warning] dialog: unknown property `width`"));
    assert!(stdout.contains("[Warning] control `IDC_OK`: unknown control type `Button`"));
}

#[test]
fn test_export_command() {
    let dir = TempDir::new().unwrap();
    let input = write_dialog(&dir);
    let output_path = dir.path().join("exported.dlg");

    let output = cvdialog_cmd()
        .args(["export", "-i", &input, "-o", output_path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "Command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let exported = fs::read_to_string(&output_path).unwrap();
    assert!(exported.contains("declare_control(Button, IDC_OK)"));
    assert!(exported.contains("Caption=\"\"OK\"\""));
}

#[test]
fn test_parse_error_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.dlg");
    fs::write(&path, "#include \"cvdialog.h\"\nbegin_dialog_definition_ex_(").unwrap();

    let output = cvdialog_cmd()
        .args(["export", "-i", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: syntax error: expected"));
}
