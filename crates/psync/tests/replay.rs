use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

fn psync_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_psync"))
}

fn replay(dir: &Path, extra: &[&str]) -> Output {
    Command::new(psync_binary())
        .arg("replay")
        .arg("session.toml")
        .arg("--project-root")
        .arg(dir)
        .args(extra)
        .current_dir(dir)
        .output()
        .unwrap()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "Expected exit 0, got {:?}\nstdout: {}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );
}

const SESSION: &str = r#"
[[steps]]
action = "open"
path = "src/draft.html"
text = "<p>draft</p>"
version = 1

[[steps]]
action = "configure"
project = "app.proj"
documents = ["src/draft.html", "src/page.html"]

[[steps]]
action = "change"
path = "src/draft.html"
text = "<p>second</p>"
version = 2

[[steps]]
action = "configure"
project = "app.proj"
documents = ["src/page.html"]
"#;

#[test]
fn replay_prints_final_ownership() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("session.toml"), SESSION).unwrap();

    let output = replay(dir.path(), &[]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "<miscellaneous>");
    assert!(lines[1].contains("draft.html"), "{stdout}");
    assert!(lines[1].ends_with("v2  open"), "{stdout}");
    assert!(lines[2].ends_with("app.proj"), "{stdout}");
    assert!(lines[3].contains("page.html"), "{stdout}");
    assert!(lines[3].ends_with("-  closed"), "{stdout}");
}

#[test]
fn replay_json_report() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("session.toml"), SESSION).unwrap();

    let output = replay(dir.path(), &["--json"]);
    assert_success(&output);

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let projects = report.as_array().unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0]["project"], "<miscellaneous>");

    let draft = &projects[0]["documents"][0];
    assert_eq!(draft["open"], true);
    assert_eq!(draft["version"], 2);
    assert_eq!(draft["kind"], "template");

    let page = &projects[1]["documents"][0];
    assert_eq!(page["open"], false);
    assert!(page["version"].is_null());
}

#[test]
fn replay_quiet_prints_nothing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("session.toml"), SESSION).unwrap();

    let output = replay(dir.path(), &["--quiet"]);
    assert_success(&output);
    assert!(output.stdout.is_empty());
}

#[test]
fn replay_missing_script_exits_one() {
    let dir = tempfile::tempdir().unwrap();

    let output = replay(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read script"));
}

#[test]
fn replay_invalid_script_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("session.toml"),
        "[[steps]]\naction = \"open\"\npath = \"a.html\"\n",
    )
    .unwrap();

    let output = replay(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse script"));
}

#[test]
fn replay_reads_settings_from_project_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("psync.toml"), "version_cache_capacity = 0\n").unwrap();
    std::fs::write(dir.path().join("session.toml"), SESSION).unwrap();

    let output = replay(dir.path(), &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load settings"));
}
