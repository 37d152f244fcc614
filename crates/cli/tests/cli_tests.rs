// Integration tests for the `pathgrid` binary: run, test, show, generate, ai doctor.
// Run with: cargo test -p pathgrid-cli --test cli_tests -- --nocapture
//
// Manual smoke test (cannot be automated, requires a real TTY):
//   pathgrid play --problem maze.json --solution bfs.lua
//   Verify: grid draws, r animates visited then path, t lists test cases,
//   e opens the editor and returns, q exits cleanly, terminal state restored.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use httpmock::prelude::*;
use tempfile::TempDir;

const PROBLEM: &str = r#"{
    "grid": [[0, 0, 0], [0, 1, 0], [0, 0, 0]],
    "start": [0, 0],
    "end": [2, 2],
    "statement": "Reach the far corner around the pillar.",
    "boilerplate": "function findPath(grid, startRow, startCol, endRow, endCol, visit)\n  return nil\nend\n",
    "testCases": [
        {
            "input": { "grid": [[0, 0, 0], [0, 1, 0], [0, 0, 0]], "startRow": 0, "startCol": 0, "endRow": 2, "endCol": 2 },
            "output": [[0, 0], [0, 1], [0, 2], [1, 2], [2, 2]]
        },
        {
            "input": { "grid": [[0, 0, 0], [0, 1, 0], [0, 0, 0]], "startRow": 0, "startCol": 0, "endRow": 2, "endCol": 2 },
            "output": [[0, 0], [1, 0], [2, 0], [2, 1], [2, 2]]
        }
    ]
}"#;

/// Goes right along the top row, then down the right column.
const ALONG_TOP: &str = r#"
function findPath(grid, startRow, startCol, endRow, endCol, visit)
  print("searching")
  visit(0, 0)
  visit(0, 1)
  visit(0, 2)
  visit(1, 2)
  return {{0, 0}, {0, 1}, {0, 2}, {1, 2}, {2, 2}}
end
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("problem.json"), PROBLEM).unwrap();
        fs::write(dir.path().join("settings.json"), r#"{ "ai": { "provider": "none" } }"#).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn solution(&self, source: &str) -> PathBuf {
        let path = self.path("solution.lua");
        fs::write(&path, source).unwrap();
        path
    }

    fn settings(&self, json: &str) {
        fs::write(self.path("settings.json"), json).unwrap();
    }

    fn pathgrid(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pathgrid"));
        cmd.current_dir(self.dir.path())
            .env("PATHGRID_CONFIG", self.path("settings.json"))
            .env_remove("OPENAI_API_KEY")
            .env_remove("PATHGRID_OPENAI_KEY")
            .env_remove("PATHGRID_LOCAL_KEY")
            .env_remove("RUST_LOG");
        cmd
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_plain_prints_final_map() {
    let fx = Fixture::new();
    let solution = fx.solution(ALONG_TOP);

    let output = fx
        .pathgrid()
        .args(["run", "--problem", arg(&fx.path("problem.json")), "--solution", arg(&solution), "--plain"])
        .output()
        .expect("pathgrid run");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "S**\n #*\n  E\n");
}

#[test]
fn run_default_shows_output_and_counts() {
    let fx = Fixture::new();
    let solution = fx.solution(ALONG_TOP);

    let output = fx
        .pathgrid()
        .args(["run", "-p", arg(&fx.path("problem.json")), "-s", arg(&solution)])
        .output()
        .expect("pathgrid run");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.starts_with("> searching\n"), "got: {}", out);
    assert!(out.contains("visited: 4 cells"));
    assert!(out.contains("path:    5 cells"));
    assert!(!out.contains("Note:"));
}

#[test]
fn run_flags_disconnected_path() {
    let fx = Fixture::new();
    let solution = fx.solution("function findPath() return {{0, 0}, {0, 1}} end");

    let output = fx
        .pathgrid()
        .args(["run", "-p", arg(&fx.path("problem.json")), "-s", arg(&solution)])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("Note: path does not run from start to end"));
}

#[test]
fn run_no_path_exit_code() {
    let fx = Fixture::new();
    let solution = fx.solution("function findPath() return nil end");

    let output = fx
        .pathgrid()
        .args(["run", "-p", arg(&fx.path("problem.json")), "-s", arg(&solution)])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(21));
    assert_eq!(stdout(&output).trim(), "No path found");
}

#[test]
fn run_compile_error_exit_code() {
    let fx = Fixture::new();
    let solution = fx.solution("function findPath(\n");

    let output = fx
        .pathgrid()
        .args(["run", "-p", arg(&fx.path("problem.json")), "-s", arg(&solution)])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(22));
    assert!(stdout(&output).starts_with("Compilation Error: "), "got: {}", stdout(&output));
}

#[test]
fn run_json_contract() {
    let fx = Fixture::new();
    let solution = fx.solution(ALONG_TOP);

    let output = fx
        .pathgrid()
        .args(["run", "-p", arg(&fx.path("problem.json")), "-s", arg(&solution), "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["result"], "path");
    assert_eq!(json["connected"], true);
    assert_eq!(json["visited"], serde_json::json!([[0, 0], [0, 1], [0, 2], [1, 2]]));
    assert_eq!(json["path"].as_array().unwrap().len(), 5);
    assert_eq!(json["output"], serde_json::json!(["searching"]));
}

#[test]
fn run_json_keeps_output_printed_before_error() {
    let fx = Fixture::new();
    let solution = fx.solution("function findPath()\n  print('frontier 3')\n  error('boom')\nend\n");

    let output = fx
        .pathgrid()
        .args(["run", "-p", arg(&fx.path("problem.json")), "-s", arg(&solution), "--json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(22));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["result"], "error");
    assert_eq!(json["output"], serde_json::json!(["frontier 3"]));
}

// ---------------------------------------------------------------------------
// test
// ---------------------------------------------------------------------------

#[test]
fn test_lists_every_case_in_order() {
    let fx = Fixture::new();
    let solution = fx.solution(ALONG_TOP);

    let output = fx
        .pathgrid()
        .args(["test", "-p", arg(&fx.path("problem.json")), "-s", arg(&solution)])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(20));
    assert_eq!(
        stdout(&output),
        "Test Case 1: ✅ Pass\nTest Case 2: ❌ Fail\n1/2 passed\n"
    );
}

#[test]
fn test_runtime_error_is_reported_per_case() {
    let fx = Fixture::new();
    let solution = fx.solution("function findPath(grid) error('boom') end");

    let output = fx
        .pathgrid()
        .args(["test", "-p", arg(&fx.path("problem.json")), "-s", arg(&solution), "--json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(20));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["passed"], 0);
    assert_eq!(json["total"], 2);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results[0]["case"], 1);
    assert_eq!(results[0]["verdict"], "error");
    assert!(results[0]["error"].as_str().unwrap().contains("boom"));
    assert!(results[0]["actual"].is_null());
}

#[test]
fn test_all_pass_exits_zero() {
    let fx = Fixture::new();
    let solution = fx.solution(ALONG_TOP);
    let mut single: serde_json::Value = serde_json::from_str(PROBLEM).unwrap();
    single["testCases"].as_array_mut().unwrap().truncate(1);
    fs::write(fx.path("one.json"), single.to_string()).unwrap();

    let output = fx
        .pathgrid()
        .args(["test", "-p", arg(&fx.path("one.json")), "-s", arg(&solution)])
        .output()
        .unwrap();

    assert!(output.status.success(), "stdout: {}", stdout(&output));
    assert_eq!(stdout(&output), "Test Case 1: ✅ Pass\n1/1 passed\n");
}

// ---------------------------------------------------------------------------
// show / file errors
// ---------------------------------------------------------------------------

#[test]
fn show_prints_statement_and_grid() {
    let fx = Fixture::new();

    let output = fx.pathgrid().args(["show", "-p", arg(&fx.path("problem.json"))]).output().unwrap();

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.starts_with("Reach the far corner around the pillar.\n\nS  \n # \n  E\n"), "got: {}", out);
    assert!(out.contains("start:      (0, 0)"));
    assert!(out.contains("test cases: 2"));
}

#[test]
fn missing_problem_file_is_io_error() {
    let fx = Fixture::new();

    let output = fx.pathgrid().args(["show", "-p", arg(&fx.path("absent.json"))]).output().unwrap();

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).starts_with("error: cannot read problem"));
}

#[test]
fn ragged_problem_is_parse_error() {
    let fx = Fixture::new();
    fs::write(fx.path("bad.json"), PROBLEM.replacen("[0, 1, 0]", "[0, 1]", 1)).unwrap();

    let output = fx.pathgrid().args(["show", "-p", arg(&fx.path("bad.json"))]).output().unwrap();

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn missing_solution_file_is_io_error() {
    let fx = Fixture::new();

    let output = fx
        .pathgrid()
        .args(["run", "-p", arg(&fx.path("problem.json")), "-s", arg(&fx.path("nope.lua"))])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("cannot read solution"));
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

fn local_settings(server: &MockServer) -> String {
    serde_json::json!({
        "ai": { "provider": "local", "endpoint": server.url("/v1"), "timeout_secs": 5 }
    })
    .to_string()
}

#[test]
fn generate_writes_problem_file() {
    let fx = Fixture::new();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions").header_missing("authorization");
        then.status(200).json_body(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": PROBLEM } }]
        }));
    });
    fx.settings(&local_settings(&server));

    let output = fx.pathgrid().args(["generate", "-o", "fresh.json"]).output().unwrap();

    mock.assert_calls(1);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("3x3 grid, 2 test cases"));
    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(fx.path("fresh.json")).unwrap()).unwrap();
    assert_eq!(saved["statement"], "Reach the far corner around the pillar.");
    assert_eq!(saved["testCases"].as_array().unwrap().len(), 2);
}

#[test]
fn generate_api_failure_exit_code() {
    let fx = Fixture::new();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(503).body("model loading");
    });
    fx.settings(&local_settings(&server));

    let output = fx.pathgrid().arg("generate").output().unwrap();

    assert_eq!(output.status.code(), Some(13));
    assert!(stderr(&output).contains("503"));
    assert!(output.stdout.is_empty());
}

#[test]
fn generate_with_ai_disabled() {
    let fx = Fixture::new();

    let output = fx.pathgrid().arg("generate").output().unwrap();

    assert_eq!(output.status.code(), Some(10));
    assert!(stderr(&output).contains("hint:  set ai.provider"));
}

// ---------------------------------------------------------------------------
// ai doctor
// ---------------------------------------------------------------------------

#[test]
fn ai_doctor_disabled() {
    let fx = Fixture::new();

    let output = fx.pathgrid().args(["ai", "doctor", "--json"]).output().unwrap();

    assert_eq!(output.status.code(), Some(10));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["schema_version"], 1);
    assert_eq!(json["status"], "disabled");
    assert_eq!(json["blocking_reason"], "provider=none");
    assert_eq!(json["model_effective"], "(none)");
}

#[test]
fn ai_doctor_ready_with_env_key() {
    let fx = Fixture::new();
    fx.settings(r#"{ "ai": { "provider": "openai", "model": "gpt-4o-mini" } }"#);

    let output = fx
        .pathgrid()
        .args(["ai", "doctor", "--json"])
        .env("PATHGRID_OPENAI_KEY", "sk-test")
        .output()
        .unwrap();

    assert!(output.status.success(), "stdout: {}", stdout(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ready");
    assert_eq!(json["key"], "present");
    assert_eq!(json["model_effective"], "gpt-4o-mini");
    assert_eq!(json["endpoint"], "https://api.openai.com/v1");
}

#[test]
fn ai_doctor_local_needs_no_key() {
    let fx = Fixture::new();
    fx.settings(r#"{ "ai": { "provider": "local" } }"#);

    let output = fx.pathgrid().args(["ai", "doctor"]).output().unwrap();

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("status:          ready"));
    assert!(out.contains("endpoint:        http://localhost:11434/v1"));
    assert!(out.contains("model_effective: llama3:8b"));
}

// ---------------------------------------------------------------------------
// version
// ---------------------------------------------------------------------------

#[test]
fn long_version_names_engine() {
    let fx = Fixture::new();

    let output = fx.pathgrid().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("pathgrid "));
    assert!(stdout(&output).contains("engine:  pathgrid-engine"));

    let output = fx.pathgrid().arg("version").output();
    // no such subcommand: clap usage error
    assert_eq!(output.unwrap().status.code(), Some(2));
}
