use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

const NODE: &str = "7f2e1b1c-5f0d-4e1a-9b1f-1234567890ab";

fn run(home: &Path, root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_workflow-files"))
        .args(args)
        .env("HOME", home)
        .env("WORKFLOW_FILES_CONFIG", home.join("missing-config.yaml"))
        .env("N8N_WORKFLOWS_ROOT", root)
        .env_remove("WORKFLOWS_ROOT")
        .env_remove("WORKFLOW_DIR_PREFIX")
        .env_remove("WORKFLOW_FILES_LOG")
        .output()
        .expect("run binary")
}

#[test]
fn help_lists_commands_and_functions() {
    let temp = tempdir().expect("tempdir");
    let output = run(temp.path(), temp.path(), &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("call <function-id> [json-args]"));
    assert!(stdout.contains("workflow_file.patch"));

    let output = run(temp.path(), temp.path(), &["functions"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("expectedEtag"));
    assert!(stdout.contains("ignoreWhitespaceInContext"));
}

#[test]
fn call_writes_and_prints_the_envelope() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("workflows");
    fs::create_dir_all(root.join("workflow_wf_abc12345")).expect("create workflow dir");

    let call_args = format!(
        r#"{{"workflowId":"wf_abc12345","nodeId":"{NODE}","content":"{{}}"}}"#
    );
    let output = run(
        temp.path(),
        &root,
        &["call", "set_files.write", call_args.as_str()],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let envelope: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("parse envelope");
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["data"]["kind"], "set");
    assert_eq!(
        fs::read_to_string(root.join(format!("workflow_wf_abc12345/{NODE}.set.json")))
            .expect("read written file"),
        "{}"
    );
}

#[test]
fn failed_call_exits_non_zero_with_error_code() {
    let temp = tempdir().expect("tempdir");
    let output = run(
        temp.path(),
        &temp.path().join("absent"),
        &["call", "resources.list"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("\"code\": \"NOT_FOUND\""));

    let output = run(temp.path(), temp.path(), &["call", "resources.list", "[1]"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("must be a JSON object"));
}

#[test]
fn config_prints_effective_settings() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("mounted");
    let output = run(temp.path(), &root, &["config"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("workflows_root:"));
    assert!(stdout.contains("mounted"));
    assert!(stdout.contains("directory_prefix: workflow_"));
}
