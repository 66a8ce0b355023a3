use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const ADT_A01: &str = "MSH|^~\\&|ADT1|GOOD HEALTH HOSPITAL|GHH LAB, INC.|GOOD HEALTH HOSPITAL|198808181126|SECURITY|ADT^A01^ADT_A01|MSG00001|P|2.8||
EVN|A01|200708181123||
PID|1||PATID1234^5^M11^ADT1^MR^GOOD HEALTH HOSPITAL~123456789^^^USSSA^SS||EVERYMAN^ADAM^A^III||19610615|M
NK1|1|NUCLEAR^NELDA^W|SPO^SPOUSE||||NK^NEXT OF KIN
PV1|1|I|2000^2012^01||||004777^ATTEND^AARON^A|||SUR||||ADM|A0|
";

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("temporary file should be writable");
    path
}

fn run_hl7(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hl7"))
        .args(args)
        .output()
        .expect("run hl7")
}

#[test]
fn parse_command_outputs_json_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "adt.hl7", ADT_A01);

    let output = run_hl7(&["parse", input.to_str().unwrap(), "--pretty"]);

    assert!(
        output.status.success(),
        "expected parse to succeed; stdout: {}; stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be UTF-8");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("stdout should be JSON");
    assert_eq!(json["MSH"]["MessageType"]["TriggerEvent"], "A01");
    assert_eq!(json["PID"]["PatientName"][0]["FamilyName"], "EVERYMAN");
    assert_eq!(json["NK1"]["NK1.2"]["NK1.2.1"], "NUCLEAR");

    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["MSH", "EVN", "PID", "NK1", "PV1"]);
}

#[test]
fn parse_command_selects_a_path() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "adt.hl7", ADT_A01);

    let output = run_hl7(&[
        "parse",
        input.to_str().unwrap(),
        "--select",
        "PID/PatientIdentifierList[1]/IdNumber",
    ]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "\"123456789\"");
}

#[test]
fn parse_command_rejects_missing_header() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "no-header.hl7", "PID|1||123\nPV1|1|I\n");

    let output = run_hl7(&["parse", input.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Malformed header"), "stderr: {stderr}");
}

#[test]
fn parse_command_reports_missing_file() {
    let output = run_hl7(&["parse", "/path/that/does/not/exist.hl7"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot read"), "stderr: {stderr}");
}
