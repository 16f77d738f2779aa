use std::fs;
use tempfile::tempdir;
use workflow_files::artifacts::{ArtifactError, ErrorKind, WorkflowDirResolver};
use workflow_files::shared::ids::WorkflowId;
use workflow_files::shared::logging::EventLog;

fn workflow_id() -> WorkflowId {
    WorkflowId::parse("wf_abc12345").expect("workflow id")
}

#[test]
fn prefixed_directory_is_found_at_any_depth() {
    let temp = tempdir().expect("tempdir");
    let target = temp.path().join("team/projects/workflow_wf_abc12345");
    fs::create_dir_all(&target).expect("create target");

    let resolver = WorkflowDirResolver::new(temp.path(), "workflow_", 100);
    assert_eq!(resolver.resolve(&workflow_id()).expect("resolve"), target);
}

#[test]
fn bare_directory_is_used_when_no_prefixed_one_exists() {
    let temp = tempdir().expect("tempdir");
    let legacy = temp.path().join("old/wf_abc12345");
    fs::create_dir_all(&legacy).expect("create legacy");

    let resolver = WorkflowDirResolver::new(temp.path(), "workflow_", 100);
    assert_eq!(resolver.resolve(&workflow_id()).expect("resolve"), legacy);
}

#[test]
fn prefixed_directory_wins_over_earlier_legacy_and_logs_ambiguity() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("root");
    let legacy = root.join("a/wf_abc12345");
    let preferred = root.join("b/deeper/workflow_wf_abc12345");
    fs::create_dir_all(&legacy).expect("create legacy");
    fs::create_dir_all(&preferred).expect("create preferred");
    let log_path = temp.path().join("events.log");

    let resolver = WorkflowDirResolver::new(&root, "workflow_", 100)
        .with_log(EventLog::new(Some(log_path.clone())));
    assert_eq!(resolver.resolve(&workflow_id()).expect("resolve"), preferred);

    let log = fs::read_to_string(&log_path).expect("read log");
    assert!(log.contains("\"event\":\"workflow_dir_ambiguous\""));
    assert!(log.contains("\"level\":\"warn\""));
}

#[test]
fn hidden_and_node_modules_directories_are_not_searched() {
    let temp = tempdir().expect("tempdir");
    fs::create_dir_all(temp.path().join(".cache/workflow_wf_abc12345")).expect("hidden");
    fs::create_dir_all(temp.path().join("node_modules/workflow_wf_abc12345"))
        .expect("node_modules");

    let resolver = WorkflowDirResolver::new(temp.path(), "workflow_", 100);
    let err = resolver.resolve(&workflow_id()).expect_err("not found");
    assert!(matches!(err, ArtifactError::WorkflowDirNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn visited_ceiling_stops_the_walk_and_logs_a_warning() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("root");
    fs::create_dir_all(root.join("a/b/workflow_wf_abc12345")).expect("create deep target");
    let log_path = temp.path().join("events.log");

    let resolver = WorkflowDirResolver::new(&root, "workflow_", 2)
        .with_log(EventLog::new(Some(log_path.clone())));
    let err = resolver.resolve(&workflow_id()).expect_err("ceiling reached");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let log = fs::read_to_string(&log_path).expect("read log");
    assert!(log.contains("workflow_dir_scan_limit"));

    let resolver = WorkflowDirResolver::new(&root, "workflow_", 3);
    assert!(resolver.resolve(&workflow_id()).is_ok());
}

#[cfg(unix)]
#[test]
fn symlink_cycles_terminate() {
    use std::os::unix::fs::symlink;

    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("root");
    fs::create_dir_all(root.join("nested")).expect("create nested");
    symlink(&root, root.join("nested/back-to-root")).expect("symlink root");
    symlink(root.join("nested"), root.join("nested/self")).expect("symlink self");

    let resolver = WorkflowDirResolver::new(&root, "workflow_", 10_000);
    let err = resolver.resolve(&workflow_id()).expect_err("not found");
    assert!(matches!(err, ArtifactError::WorkflowDirNotFound { .. }));
}

#[cfg(unix)]
#[test]
fn symlinked_workflow_directories_inside_the_root_are_followed() {
    use std::os::unix::fs::symlink;

    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("root");
    fs::create_dir_all(root.join(".archive/workflow_wf_abc12345")).expect("create target");
    fs::create_dir_all(root.join("projects")).expect("create projects");
    symlink(root.join(".archive"), root.join("projects/linked")).expect("symlink");

    let resolver = WorkflowDirResolver::new(&root, "workflow_", 100);
    assert_eq!(
        resolver.resolve(&workflow_id()).expect("resolve"),
        root.join("projects/linked/workflow_wf_abc12345")
    );
}

#[cfg(unix)]
#[test]
fn symlinks_leaving_the_root_are_not_followed() {
    use std::os::unix::fs::symlink;

    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("root");
    fs::create_dir_all(&root).expect("create root");
    fs::create_dir_all(temp.path().join("outside/workflow_wf_abc12345")).expect("create outside");
    symlink(temp.path().join("outside"), root.join("linked")).expect("symlink");

    let resolver = WorkflowDirResolver::new(&root, "workflow_", 100);
    let err = resolver.resolve(&workflow_id()).expect_err("outside root");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, ArtifactError::WorkflowDirNotFound { .. }));
}
