use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Build a workspace directory holding a scenario file and policy files.
fn create_workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    fs::create_dir(root.join("policies")).unwrap();

    fs::write(
        root.join("policies").join("editor.json"),
        r#"{
    "Version": "1.0.0",
    "Statement": [
        {"Effect": "deny", "Resource": "Post:page:list"},
        {"Effect": "deny", "Resource": "Uri:checkout:access",
         "Metadata": {"Redirect": {"Type": "login"}}}
    ],
    "Param": [
        {"Key": "redirect.login.type", "Value": "url"},
        {"Key": "redirect.login.destination", "Value": "/welcome"}
    ]
}"#,
    )
    .unwrap();

    fs::write(
        root.join("scenario.yaml"),
        r#"name: Test site
config:
  merge_preference: deny
roles:
  - slug: editor
    level: 7
  - slug: author
    level: 2
users:
  - id: 1
    roles: [editor]
  - id: 2
    roles: [editor, author]
settings:
  - principal: "default"
    object: "post:article"
    options:
      hidden: true
  - principal: "role:editor"
    object: "post:special"
    options:
      hidden: false
  - principal: "role:author"
    object: "post:special"
    options:
      hidden: true
policies:
  - id: editor-policy
    attach_to: ["role:editor"]
    file: policies/editor.json
"#,
    )
    .unwrap();

    temp_dir
}

fn ward() -> Command {
    Command::cargo_bin("ward").unwrap()
}

#[test]
fn test_lint_accepts_valid_policy() {
    let workspace = create_workspace();

    ward()
        .arg("lint")
        .arg(workspace.path().join("policies").join("editor.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"))
        .stdout(predicate::str::contains("2 statement(s)"));
}

#[test]
fn test_lint_rejects_missing_effect() {
    let workspace = create_workspace();
    let bad = workspace.path().join("policies").join("bad.json");
    fs::write(&bad, r#"{"Statement": [{"Resource": "Post:*"}]}"#).unwrap();

    ward()
        .arg("lint")
        .arg(&bad)
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL"));
}

#[test]
fn test_lint_detects_parent_cycle() {
    let workspace = create_workspace();
    let a = workspace.path().join("policies").join("a.json");
    let b = workspace.path().join("policies").join("b.json");
    fs::write(&a, r#"{"Parent": "b", "Statement": []}"#).unwrap();
    fs::write(&b, r#"{"Parent": "a", "Statement": []}"#).unwrap();

    ward()
        .arg("lint")
        .arg(&a)
        .arg(&b)
        .assert()
        .failure()
        .stdout(predicate::str::contains("cycle"));
}

#[test]
fn test_query_denies_through_role_policy() {
    let workspace = create_workspace();

    ward()
        .arg("query")
        .arg("--scenario")
        .arg(workspace.path().join("scenario.yaml"))
        .arg("--principal")
        .arg("user:1")
        .arg("--object")
        .arg("post:page")
        .arg("--action")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("DENY"));
}

#[test]
fn test_query_allows_unconfigured_visitor() {
    let workspace = create_workspace();

    ward()
        .arg("query")
        .arg("--scenario")
        .arg(workspace.path().join("scenario.yaml"))
        .arg("--principal")
        .arg("visitor")
        .arg("--object")
        .arg("post:page")
        .arg("--action")
        .arg("read")
        .assert()
        .success()
        .stdout(predicate::str::contains("ALLOW"));
}

#[test]
fn test_query_json_output() {
    let workspace = create_workspace();

    let output = ward()
        .arg("query")
        .arg("--scenario")
        .arg(workspace.path().join("scenario.yaml"))
        .arg("--principal")
        .arg("user:1")
        .arg("--object")
        .arg("uri:checkout")
        .arg("--action")
        .arg("access")
        .arg("--format")
        .arg("json")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["denied"], serde_json::Value::Bool(true));
    assert_eq!(parsed["redirect"]["kind"], "login");
}

#[test]
fn test_query_preference_override_flips_sibling_conflict() {
    let workspace = create_workspace();

    // Under the default deny preference the author role's restriction wins.
    ward()
        .arg("query")
        .arg("--scenario")
        .arg(workspace.path().join("scenario.yaml"))
        .arg("--principal")
        .arg("user:2")
        .arg("--object")
        .arg("post:special")
        .arg("--action")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("DENY"));

    ward()
        .arg("query")
        .arg("--scenario")
        .arg(workspace.path().join("scenario.yaml"))
        .arg("--principal")
        .arg("user:2")
        .arg("--object")
        .arg("post:special")
        .arg("--action")
        .arg("list")
        .arg("--preference")
        .arg("allow")
        .assert()
        .success()
        .stdout(predicate::str::contains("ALLOW"));

    ward()
        .arg("query")
        .arg("--scenario")
        .arg(workspace.path().join("scenario.yaml"))
        .arg("--principal")
        .arg("user:2")
        .arg("--object")
        .arg("post:special")
        .arg("--action")
        .arg("list")
        .arg("--preference")
        .arg("sometimes")
        .assert()
        .failure();
}

#[test]
fn test_settings_shows_inherited_default() {
    let workspace = create_workspace();

    ward()
        .arg("settings")
        .arg("--scenario")
        .arg(workspace.path().join("scenario.yaml"))
        .arg("--principal")
        .arg("visitor")
        .arg("--object")
        .arg("post:article")
        .arg("--sources")
        .assert()
        .success()
        .stdout(predicate::str::contains("hidden"))
        .stdout(predicate::str::contains("inherited"));
}

#[test]
fn test_settings_json_output_is_parseable() {
    let workspace = create_workspace();

    let output = ward()
        .arg("settings")
        .arg("--scenario")
        .arg(workspace.path().join("scenario.yaml"))
        .arg("--principal")
        .arg("user:1")
        .arg("--object")
        .arg("post:page")
        .arg("--format")
        .arg("json")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["hidden"], serde_json::Value::Bool(true));
}

#[test]
fn test_unknown_principal_spec_fails() {
    let workspace = create_workspace();

    ward()
        .arg("query")
        .arg("--scenario")
        .arg(workspace.path().join("scenario.yaml"))
        .arg("--principal")
        .arg("gremlin")
        .arg("--object")
        .arg("post:page")
        .arg("--action")
        .arg("read")
        .assert()
        .failure();
}
