//! Integration tests for the dmaic CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const DEFINE_YAML: &str = r#"
- kind: requirement
  text: Checkout completes in under 2 seconds
  category: non_functional
  priority: high
- kind: requirement
  text: Cart survives a page reload
  priority: medium
- kind: requirement
  text: Receipts are emailed within a minute
- kind: quality_target
  need: Fast checkout
  driver: Latency
  characteristic: p95 checkout time (s)
  target: 2.0
  usl: 3.0
- kind: quality_target
  need: Reliable checkout
  driver: Errors
  characteristic: Error rate (%)
  target: 0.5
  usl: 1.0
- kind: constraint
  category: business
  description: No downtime during peak season
  impact: high
"#;

const MEASURE_YAML: &str = r#"
- kind: kpi
  name: Throughput
  target: 100
  current: 95
  unit: orders/min
- kind: kpi
  name: Availability
  target: 99.9
  current: 99.5
  unit: "%"
- kind: kpi
  name: Conversion
  target: 4.0
  current: 3.0
  unit: "%"
"#;

const ANALYZE_YAML: &str = r#"
- kind: risk
  failure_mode: Connection pool exhaustion
  effects: Checkout requests time out
  severity: 9
  occurrence: 6
  detection: 7
- kind: risk
  failure_mode: Cache stampede
  severity: 5
  occurrence: 4
  detection: 3
"#;

/// Helper to get a dmaic command isolated from the user's config
fn dmaic(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dmaic").unwrap();
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".xdg"))
        .env_remove("DMAIC_GATE_POLICY")
        .env_remove("DMAIC_GATE_THRESHOLD")
        .env_remove("DMAIC_SCORING")
        .env_remove("DMAIC_DATABASE")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a workspace in a temp directory
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    dmaic(&tmp).arg("init").assert().success();
    tmp
}

/// Helper to create a project and return its full ID
fn create_project(tmp: &TempDir, name: &str) -> String {
    let output = dmaic(tmp)
        .args(["project", "new", "--name", name, "--format", "id"])
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Helper to write an artifact file and submit it
fn submit(tmp: &TempDir, project: &str, phase: &str, yaml: &str) {
    let path = tmp.path().join(format!("{}.yaml", phase));
    fs::write(&path, yaml).unwrap();
    dmaic(tmp)
        .args(["submit", project, "--phase", phase, "--file"])
        .arg(&path)
        .assert()
        .success();
}

fn first_solution_id(tmp: &TempDir, project: &str) -> String {
    let output = dmaic(tmp)
        .args(["solution", "rank", project, "--format", "id"])
        .output()
        .unwrap();
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    dmaic(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Improve and Control phases"))
        .stdout(predicate::str::contains("advance"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    dmaic(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dmaic"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    dmaic(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dmaic"));
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_creates_workspace() {
    let tmp = TempDir::new().unwrap();
    dmaic(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized DMAIC workspace"));

    assert!(tmp.path().join(".dmaic").is_dir());
    assert!(tmp.path().join(".dmaic/config.yaml").exists());
    assert!(tmp.path().join(".dmaic/dmaic.db").exists());
}

#[test]
fn test_init_twice_warns() {
    let tmp = setup_workspace();
    dmaic(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_workspace_fail() {
    let tmp = TempDir::new().unwrap();
    dmaic(&tmp)
        .args(["project", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a DMAIC workspace"));
}

// ============================================================================
// Project Tests
// ============================================================================

#[test]
fn test_project_new_and_list() {
    let tmp = setup_workspace();
    let id = create_project(&tmp, "Checkout latency");
    assert!(id.starts_with("PRJ-"));

    dmaic(&tmp)
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checkout latency"))
        .stdout(predicate::str::contains("DEFINE"));

    dmaic(&tmp)
        .args(["project", "list", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ID,NAME,PHASE"))
        .stdout(predicate::str::contains(id.as_str()));
}

#[test]
fn test_project_new_rejects_negative_budget() {
    let tmp = setup_workspace();
    dmaic(&tmp)
        .args(["project", "new", "--name", "p", "--budget=-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("budget_limit"));
}

#[test]
fn test_project_lookup_by_name() {
    let tmp = setup_workspace();
    create_project(&tmp, "Checkout latency");
    dmaic(&tmp)
        .args(["gate", "Checkout latency", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"phase\": \"DEFINE\""));
}

#[test]
fn test_unknown_project_fails() {
    let tmp = setup_workspace();
    dmaic(&tmp)
        .args(["status", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no project matches"));
}

// ============================================================================
// Workflow Tests
// ============================================================================

#[test]
fn test_define_gate_and_advance() {
    let tmp = setup_workspace();
    let id = create_project(&tmp, "Checkout latency");

    dmaic(&tmp)
        .args(["gate", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("DEFINE gate (strict): NOT SATISFIED"))
        .stdout(predicate::str::contains("requirements"));

    submit(&tmp, &id, "define", DEFINE_YAML);

    dmaic(&tmp)
        .args(["gate", &id, "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"passed\": true"));

    dmaic(&tmp)
        .args(["advance", &id, "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"phase\": \"MEASURE\""))
        .stdout(predicate::str::contains("\"completion\": 20"));
}

#[test]
fn test_advance_without_artifacts_fails() {
    let tmp = setup_workspace();
    let id = create_project(&tmp, "p");
    dmaic(&tmp)
        .args(["advance", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gate not satisfied"));
}

#[test]
fn test_submit_for_wrong_phase_fails() {
    let tmp = setup_workspace();
    let id = create_project(&tmp, "p");
    let path = tmp.path().join("measure.yaml");
    fs::write(&path, MEASURE_YAML).unwrap();

    dmaic(&tmp)
        .args(["submit", &id, "--phase", "measure", "--file"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("project is in DEFINE"));
}

#[test]
fn test_submit_out_of_range_fails() {
    let tmp = setup_workspace();
    let id = create_project(&tmp, "p");
    let path = tmp.path().join("bad.yaml");
    fs::write(
        &path,
        "- kind: quality_target\n  need: n\n  driver: d\n  characteristic: c\n  target: 3.0\n  usl: 2.0\n",
    )
    .unwrap();

    dmaic(&tmp)
        .args(["submit", &id, "--phase", "define", "--file"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("usl"));
}

#[test]
fn test_submit_negative_severity_is_range_error() {
    let tmp = setup_workspace();
    let id = create_project(&tmp, "p");
    submit(&tmp, &id, "define", DEFINE_YAML);
    dmaic(&tmp).args(["advance", &id]).assert().success();
    submit(&tmp, &id, "measure", MEASURE_YAML);
    dmaic(&tmp).args(["advance", &id]).assert().success();

    let path = tmp.path().join("risks.yaml");
    fs::write(
        &path,
        "- kind: risk\n  failure_mode: Pool exhaustion\n  severity: -1\n  occurrence: 4\n  detection: 3\n",
    )
    .unwrap();

    dmaic(&tmp)
        .args(["submit", &id, "--phase", "analyze", "--file"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("dmaic::invalid_field_range"))
        .stderr(predicate::str::contains("severity"));
}

#[test]
fn test_resubmitting_artifact_id_fails() {
    let tmp = setup_workspace();
    let id = create_project(&tmp, "p");
    let yaml = "- kind: requirement\n  id: REQ-01HZX3V8K2M4N6P8R0T2V4X6Z8\n  text: Cart survives a reload\n";
    submit(&tmp, &id, "define", yaml);

    let path = tmp.path().join("again.yaml");
    fs::write(&path, yaml).unwrap();
    dmaic(&tmp)
        .args(["submit", &id, "--phase", "define", "--file"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("dmaic::duplicate_artifact"));
}

#[test]
fn test_submit_from_stdin() {
    let tmp = setup_workspace();
    let id = create_project(&tmp, "p");
    dmaic(&tmp)
        .args(["submit", &id, "--phase", "define", "--file", "-"])
        .write_stdin(DEFINE_YAML)
        .assert()
        .success()
        .stdout(predicate::str::contains("Accepted"));
}

#[test]
fn test_full_lifecycle() {
    let tmp = setup_workspace();
    let id = create_project(&tmp, "Checkout latency");

    submit(&tmp, &id, "define", DEFINE_YAML);
    dmaic(&tmp).args(["advance", &id]).assert().success();
    submit(&tmp, &id, "measure", MEASURE_YAML);
    dmaic(&tmp).args(["advance", &id]).assert().success();
    submit(&tmp, &id, "analyze", ANALYZE_YAML);
    dmaic(&tmp).args(["advance", &id]).assert().success();

    submit(
        &tmp,
        &id,
        "improve",
        "- kind: solution\n  title: Add read replica\n  impact: 8\n  effort: 4\n  risk: 3\n  cost: 3\n\
         - kind: solution\n  title: Rewrite service\n  impact: 9\n  effort: 9\n  risk: 8\n  cost: 9\n",
    );
    dmaic(&tmp)
        .args(["solution", "rank", &id, "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Add read replica\t6.00"));

    // Nothing approved yet
    dmaic(&tmp).args(["advance", &id]).assert().failure();

    let sol = first_solution_id(&tmp, &id);
    dmaic(&tmp)
        .args(["solution", "set-status", &id, &sol, "approved"])
        .assert()
        .success();
    dmaic(&tmp).args(["advance", &id]).assert().success();

    submit(
        &tmp,
        &id,
        "control",
        "kind: control_checklist\nmonitoring: true\ndocumentation: true\nvalidation: true\ntraining: false\n",
    );
    dmaic(&tmp)
        .args(["gate", &id, "--format", "id"])
        .assert()
        .success()
        .stdout("training\n");
    dmaic(&tmp)
        .args(["advance", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("training"));

    submit(
        &tmp,
        &id,
        "control",
        "kind: control_checklist\nmonitoring: true\ndocumentation: true\nvalidation: true\ntraining: true\n",
    );
    dmaic(&tmp)
        .args(["advance", &id, "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("phase: COMPLETED"))
        .stdout(predicate::str::contains("completion: 100"));

    dmaic(&tmp)
        .args(["advance", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("completed"));

    dmaic(&tmp)
        .args(["status", &id, "--artifacts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("COMPLETED"))
        .stdout(predicate::str::contains("LABEL"))
        .stdout(predicate::str::contains("Connection pool exhaustion"))
        .stdout(predicate::str::contains("RPN 378"));
}

#[test]
fn test_metrics_after_analyze() {
    let tmp = setup_workspace();
    let id = create_project(&tmp, "p");
    submit(&tmp, &id, "define", DEFINE_YAML);
    dmaic(&tmp).args(["advance", &id]).assert().success();
    submit(&tmp, &id, "measure", MEASURE_YAML);
    dmaic(&tmp).args(["advance", &id]).assert().success();
    submit(&tmp, &id, "analyze", ANALYZE_YAML);

    dmaic(&tmp)
        .args(["metrics", &id, "--recompute", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_rpn\": 378"))
        .stdout(predicate::str::contains("\"risk_level\": \"MEDIUM\""));
}

#[test]
fn test_set_status_outside_improve_fails() {
    let tmp = setup_workspace();
    let id = create_project(&tmp, "p");
    dmaic(&tmp)
        .args([
            "solution",
            "set-status",
            &id,
            "SOL-01HZX3V8K2M4N6P8R0T2V4X6Z8",
            "approved",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project is in DEFINE"));
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_weighted_policy_from_workspace_config() {
    let tmp = setup_workspace();
    fs::write(
        tmp.path().join(".dmaic/config.yaml"),
        "gate_policy: weighted\ngate_threshold: 0.6\n",
    )
    .unwrap();
    let id = create_project(&tmp, "p");

    // Requirements and CTQ only: 2 of 3 criteria
    submit(
        &tmp,
        &id,
        "define",
        "- kind: requirement\n  text: Fast\n- kind: quality_target\n  need: n\n  driver: d\n  characteristic: c\n  target: 1.0\n  usl: 2.0\n",
    );
    dmaic(&tmp)
        .args(["gate", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("gate (weighted >= 0.60): PASSED"));
    dmaic(&tmp)
        .args(["advance", &id, "--format", "id"])
        .assert()
        .success()
        .stdout("MEASURE\n");
}

#[test]
fn test_scoring_from_environment() {
    let tmp = setup_workspace();
    let id = create_project(&tmp, "p");
    submit(&tmp, &id, "define", DEFINE_YAML);
    dmaic(&tmp).args(["advance", &id]).assert().success();
    submit(&tmp, &id, "measure", MEASURE_YAML);
    dmaic(&tmp).args(["advance", &id]).assert().success();
    submit(&tmp, &id, "analyze", ANALYZE_YAML);
    dmaic(&tmp).args(["advance", &id]).assert().success();
    submit(
        &tmp,
        &id,
        "improve",
        "kind: solution\ntitle: Add read replica\nimpact: 8\neffort: 4\nrisk: 3\ncost: 3\n",
    );

    dmaic(&tmp)
        .env("DMAIC_SCORING", "normalized_weighted")
        .args(["solution", "rank", &id, "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("72.00"));
}
