// Pathgrid CLI - pathfinding practice problems in the terminal

mod exit_codes;
mod tui;
mod util;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use pathgrid_config::ai::{self, AIConfigStatus, KeySource, ResolvedAIConfig};
use pathgrid_config::settings::Settings;
use pathgrid_engine::animator::{AnimationTiming, Animator};
use pathgrid_engine::evaluator::LuaEvaluator;
use pathgrid_engine::problem::{ProblemData, ProblemSource};
use pathgrid_engine::render;
use pathgrid_engine::session::{Session, DISCONNECTED_NOTE};
use pathgrid_engine::verify::{ManualRun, TestVerdict, Verifier};
use pathgrid_generator::{FileProblemSource, GenerationError, OpenAiGenerator};

// Re-export exit codes from registry (single source of truth)
use exit_codes::{
    EXIT_SUCCESS, EXIT_ERROR, EXIT_IO, EXIT_PROBLEM_PARSE,
    EXIT_AI_DISABLED, EXIT_AI_MISSING_KEY, EXIT_AI_KEYCHAIN_ERR,
    EXIT_TEST_FAILED, EXIT_NO_PATH, EXIT_SOLUTION_ERROR,
    generation_exit_code,
};

#[derive(Parser)]
#[command(name = "pathgrid")]
#[command(about = "Practice pathfinding: AI-generated grid puzzles, solved in Lua")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session: edit, run and test solutions against generated problems
    #[command(after_help = "\
Examples:
  pathgrid play
  pathgrid play --problem maze.json --solution bfs.lua

Keys: r run, t test, n new problem, e edit, b reset to boilerplate,
      s skip animation, ? help, q quit")]
    Play {
        /// Problem JSON file to play instead of generating one with the AI provider
        #[arg(long, short = 'p')]
        problem: Option<PathBuf>,

        /// Lua solution file (default: editor.solutionFile from settings)
        #[arg(long, short = 's')]
        solution: Option<PathBuf>,
    },

    /// Generate one problem with the configured AI provider and print its JSON
    Generate {
        /// Write the problem to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Run a solution on a problem's puzzle and show the explored cells and path
    #[command(after_help = "\
Exit codes:
  0   the solution returned a path
  21  no path found
  22  compilation or runtime error")]
    Run {
        /// Problem JSON file
        #[arg(long, short = 'p')]
        problem: PathBuf,

        /// Lua solution file
        #[arg(long, short = 's')]
        solution: PathBuf,

        /// Print only the character map
        #[arg(long, conflicts_with = "json")]
        plain: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a solution against every test case of a problem
    #[command(after_help = "\
Exit codes:
  0   every test case passed
  20  at least one test case failed or errored")]
    Test {
        /// Problem JSON file
        #[arg(long, short = 'p')]
        problem: PathBuf,

        /// Lua solution file
        #[arg(long, short = 's')]
        solution: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a problem's statement and grid
    Show {
        /// Problem JSON file
        #[arg(long, short = 'p')]
        problem: PathBuf,
    },

    /// AI provider diagnostics
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[derive(Subcommand)]
enum AiCommands {
    /// Show the resolved AI configuration
    #[command(after_help = "\
Exit codes:
  0   ready
  10  AI disabled (provider=none)
  11  API key missing
  12  keychain error")]
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  pathgrid-engine ", env!("CARGO_PKG_VERSION"),
            "\nlua:     5.4 (vendored)",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  pathgrid-engine ", env!("CARGO_PKG_VERSION"),
            "\nlua:     5.4 (vendored)",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

/// Logs go to stderr. The interactive player owns the terminal, so it stays
/// silent unless RUST_LOG asks otherwise.
fn init_logging(interactive: bool) {
    let default = if interactive { "off" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(matches!(cli.command, Some(Commands::Play { .. })));

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: pathgrid <command> [options]");
            eprintln!("       pathgrid --help for more information");
            Ok(())
        }
        Some(Commands::Play { problem, solution }) => cmd_play(problem, solution),
        Some(Commands::Generate { output }) => cmd_generate(output),
        Some(Commands::Run { problem, solution, plain, json }) => cmd_run(problem, solution, plain, json),
        Some(Commands::Test { problem, solution, json }) => cmd_test(problem, solution, json),
        Some(Commands::Show { problem }) => cmd_show(problem),
        Some(Commands::Ai { command }) => match command {
            AiCommands::Doctor { json } => cmd_ai_doctor(json),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PROBLEM_PARSE, message: msg.into(), hint: None }
    }

    /// Exit with `code` without printing anything; the command already
    /// reported its outcome on stdout.
    pub fn silent(code: u8) -> Self {
        Self { code, message: String::new(), hint: None }
    }

    /// Create error from a generation error with the matching exit code.
    pub fn generation(err: GenerationError) -> Self {
        let code = generation_exit_code(&err);
        let hint = match &err {
            GenerationError::NotConfigured(_) => {
                Some(format!("set ai.provider in {}", Settings::config_path_display()))
            }
            GenerationError::MissingKey(_) => Some(format!(
                "export {} or store the key in the system keychain",
                ai::env_var_name("openai")
            )),
            GenerationError::Network(_) => Some("run `pathgrid ai doctor` to check the endpoint".to_string()),
            GenerationError::Parse(_) | GenerationError::InvalidProblem(_) | GenerationError::EmptyContent => {
                Some("the model answered with an unusable problem; try again".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn timing(settings: &Settings) -> AnimationTiming {
    AnimationTiming {
        visited_tick: std::time::Duration::from_millis(settings.visited_tick_ms),
        path_delay: std::time::Duration::from_millis(settings.path_delay_ms),
        path_tick: std::time::Duration::from_millis(settings.path_tick_ms),
    }
}

fn evaluator(settings: &Settings) -> LuaEvaluator {
    LuaEvaluator::with_instruction_limit(settings.instruction_limit)
}

fn load_problem(path: &Path) -> Result<ProblemData, CliError> {
    FileProblemSource::new(path).get_problem().map_err(|e| match e {
        GenerationError::Io(msg) => CliError::io(format!("cannot read problem: {}", msg)),
        other => CliError::parse(format!("{}: {}", path.display(), other))
            .with_hint("problem files hold one JSON object: grid, start, end, statement, boilerplate, testCases"),
    })
}

fn read_solution(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read solution {}: {}", path.display(), e)))
}

fn problem_source_from_settings(settings: &Settings) -> Result<OpenAiGenerator, CliError> {
    let config = ResolvedAIConfig::from_settings(&settings.ai);
    OpenAiGenerator::from_config(&config).map_err(CliError::generation)
}

// ============================================================================
// play
// ============================================================================

fn cmd_play(problem: Option<PathBuf>, solution: Option<PathBuf>) -> Result<(), CliError> {
    let settings = Settings::load();
    let solution = solution.unwrap_or_else(|| PathBuf::from(&settings.solution_file));

    let source: Box<dyn ProblemSource<Error = GenerationError>> = match problem {
        Some(path) => {
            // fail before taking over the terminal
            load_problem(&path)?;
            Box::new(FileProblemSource::new(path))
        }
        None => Box::new(problem_source_from_settings(&settings)?),
    };

    let session = Session::new(evaluator(&settings), timing(&settings));
    let options = tui::PlayOptions {
        solution_path: solution,
        editor: settings.editor_command.clone(),
    };
    tui::run(session, source, options).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: e,
        hint: None,
    })
}

// ============================================================================
// generate
// ============================================================================

fn cmd_generate(output: Option<PathBuf>) -> Result<(), CliError> {
    let settings = Settings::load();
    let client = problem_source_from_settings(&settings)?;

    let problem = client.get_problem().map_err(CliError::generation)?;
    let json = problem
        .to_json_pretty()
        .map_err(|e| CliError { code: EXIT_ERROR, message: e.to_string(), hint: None })?;

    match output {
        Some(path) => {
            fs::write(&path, format!("{}\n", json))
                .map_err(|e| CliError::io(format!("cannot write {}: {}", path.display(), e)))?;
            eprintln!(
                "wrote {} ({}x{} grid, {} test cases)",
                path.display(),
                problem.grid.rows(),
                problem.grid.cols(),
                problem.test_cases.len()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(problem: PathBuf, solution: PathBuf, plain: bool, json: bool) -> Result<(), CliError> {
    let settings = Settings::load();
    let problem = load_problem(&problem)?;
    let source = read_solution(&solution)?;

    let verifier = Verifier::new(evaluator(&settings));
    let (outcome, output) = verifier.run_manual_with_output(&source, &problem);

    // Reveal the whole playback at once
    let mut animator = Animator::new(timing(&settings));
    let connected = match &outcome {
        ManualRun::Path(trace) => {
            let connected = trace.connects(problem.start, problem.end);
            animator.start(trace.clone(), Instant::now());
            animator.finish();
            Some(connected)
        }
        _ => None,
    };
    let state = animator.state();

    if json {
        let (result, message) = match &outcome {
            ManualRun::Path(_) => ("path", None),
            ManualRun::NoPath => ("no_path", outcome.message()),
            ManualRun::Error(_) => ("error", outcome.message()),
        };
        let json_output = serde_json::json!({
            "result": result,
            "message": message,
            "connected": connected,
            "visited": state.visited,
            "path": state.path,
            "output": output,
        });
        let text = serde_json::to_string_pretty(&json_output)
            .map_err(|e| CliError { code: EXIT_ERROR, message: e.to_string(), hint: None })?;
        println!("{}", text);
    } else {
        if !plain {
            for line in &output {
                println!("> {}", line);
            }
        }
        if let Some(message) = outcome.message() {
            println!("{}", message);
        } else {
            let map = render::render_plain(&problem.grid, problem.start, problem.end, &state.visited, &state.path);
            print!("{}", map);
            if !plain {
                println!();
                println!("visited: {} cells", state.visited.len());
                println!("path:    {} cells", state.path.len());
                println!("legend:  S start  E end  * path  . visited  # wall  K special  ~ weighted");
                if connected == Some(false) {
                    println!("{}", DISCONNECTED_NOTE);
                }
            }
        }
    }

    match outcome {
        ManualRun::Path(_) => Ok(()),
        ManualRun::NoPath => Err(CliError::silent(EXIT_NO_PATH)),
        ManualRun::Error(_) => Err(CliError::silent(EXIT_SOLUTION_ERROR)),
    }
}

// ============================================================================
// test
// ============================================================================

fn cmd_test(problem: PathBuf, solution: PathBuf, json: bool) -> Result<(), CliError> {
    let settings = Settings::load();
    let problem = load_problem(&problem)?;
    let source = read_solution(&solution)?;

    let verifier = Verifier::new(evaluator(&settings));
    let batch = verifier.run_batch(&source, &problem.test_cases);
    let summary = batch.summary();

    if json {
        let results: Vec<serde_json::Value> = batch
            .results
            .iter()
            .map(|r| {
                let (verdict, error) = match &r.verdict {
                    TestVerdict::Pass => ("pass", None),
                    TestVerdict::Fail => ("fail", None),
                    TestVerdict::Error(msg) => ("error", Some(msg.as_str())),
                };
                serde_json::json!({
                    "case": r.index + 1,
                    "verdict": verdict,
                    "error": error,
                    "actual": r.actual,
                    "expected": problem.test_cases[r.index].output,
                })
            })
            .collect();
        let json_output = serde_json::json!({
            "passed": summary.passed,
            "total": summary.total,
            "results": results,
        });
        let text = serde_json::to_string_pretty(&json_output)
            .map_err(|e| CliError { code: EXIT_ERROR, message: e.to_string(), hint: None })?;
        println!("{}", text);
    } else {
        for result in &batch.results {
            println!("{}", result.line());
            if let TestVerdict::Error(msg) = &result.verdict {
                println!("    {}", msg);
            }
        }
        println!("{}", summary);
    }

    if summary.all_passed() {
        Ok(())
    } else {
        Err(CliError::silent(EXIT_TEST_FAILED))
    }
}

// ============================================================================
// show
// ============================================================================

fn cmd_show(problem: PathBuf) -> Result<(), CliError> {
    let problem = load_problem(&problem)?;

    println!("{}", problem.statement);
    println!();
    print!("{}", render::render_plain(&problem.grid, problem.start, problem.end, &[], &[]));
    println!();
    println!("size:       {}x{}", problem.grid.rows(), problem.grid.cols());
    println!("start:      {}", problem.start);
    println!("end:        {}", problem.end);
    println!("test cases: {}", problem.test_cases.len());
    Ok(())
}

// ============================================================================
// ai doctor
// ============================================================================

fn cmd_ai_doctor(json: bool) -> Result<(), CliError> {
    let settings = Settings::load();
    let config = ResolvedAIConfig::from_settings(&settings.ai);

    let enabled = config.provider.is_enabled();
    let model_effective = if enabled { config.model.clone() } else { "(none)".to_string() };

    let (status, blocking_reason) = match config.status {
        AIConfigStatus::Disabled => (AIDoctorStatus::Disabled, Some("provider=none".to_string())),
        AIConfigStatus::Ready => (AIDoctorStatus::Ready, None),
        AIConfigStatus::MissingKey => (AIDoctorStatus::Misconfigured, Some("missing_api_key".to_string())),
        AIConfigStatus::Error => (AIDoctorStatus::KeychainError, config.blocking_reason.clone()),
    };

    let diag = AIDoctorReport {
        enabled,
        provider: config.provider_name().to_string(),
        model_configured: !settings.ai.model.is_empty(),
        model_effective,
        endpoint: enabled.then(|| config.endpoint.clone()),
        temperature: config.temperature,
        key_present: config.api_key.is_some(),
        key_source: config.key_source,
        keychain_available: ai::keychain_available(),
        status,
        blocking_reason,
    };

    if json {
        let json_output = serde_json::json!({
            "schema_version": 1,
            "status": diag.status.as_str(),
            "blocking_reason": diag.blocking_reason,
            "enabled": diag.enabled,
            "provider": diag.provider,
            "model_configured": diag.model_configured,
            "model_effective": diag.model_effective,
            "endpoint": diag.endpoint,
            "temperature": diag.temperature,
            "key": if diag.key_present { "present" } else { "missing" },
            "key_source": diag.key_source.as_str(),
            "keychain": if diag.keychain_available { "ok" } else { "unavailable" },
            "config_path": Settings::config_path_display(),
        });
        let text = serde_json::to_string_pretty(&json_output)
            .map_err(|e| CliError { code: EXIT_ERROR, message: e.to_string(), hint: None })?;
        println!("{}", text);
    } else {
        println!("AI Doctor");
        println!("---------");
        println!("status:          {}", diag.status.as_str());
        if let Some(reason) = &diag.blocking_reason {
            println!("blocking_reason: {}", reason);
        }
        println!("provider:        {}", diag.provider);
        println!("model_configured:{}", diag.model_configured);
        println!("model_effective: {}", diag.model_effective);
        if let Some(endpoint) = &diag.endpoint {
            println!("endpoint:        {}", endpoint);
        }
        println!("temperature:     {}", diag.temperature);
        println!("key:             {}", if diag.key_present { "present" } else { "missing" });
        println!("key_source:      {}", diag.key_source.as_str());
        println!("keychain:        {}", if diag.keychain_available { "ok" } else { "unavailable" });
        println!("config:          {}", Settings::config_path_display());

        // Actionable fix suggestions
        if let Some(reason) = &diag.blocking_reason {
            println!();
            match reason.as_str() {
                "provider=none" => {
                    println!("Problem generation is disabled. To enable:");
                    println!("  Set ai.provider in {}", Settings::config_path_display());
                    println!("  or play a saved problem: pathgrid play --problem FILE");
                }
                "missing_api_key" => {
                    println!("Fix: set {} or store key in keychain", ai::env_var_name(&diag.provider));
                }
                _ => {}
            }
        }
    }

    match diag.status {
        AIDoctorStatus::Ready => Ok(()),
        AIDoctorStatus::Disabled => Err(CliError {
            code: EXIT_AI_DISABLED,
            message: "AI is disabled".to_string(),
            hint: None,
        }),
        AIDoctorStatus::Misconfigured => Err(CliError {
            code: EXIT_AI_MISSING_KEY,
            message: "AI misconfigured: missing_api_key".to_string(),
            hint: None,
        }),
        AIDoctorStatus::KeychainError => {
            let reason = diag.blocking_reason.unwrap_or_else(|| "unknown".to_string());
            Err(CliError {
                code: EXIT_AI_KEYCHAIN_ERR,
                message: format!("keychain error: {}", reason),
                hint: None,
            })
        }
    }
}

struct AIDoctorReport {
    enabled: bool,
    provider: String,
    model_configured: bool,
    model_effective: String,
    endpoint: Option<String>,
    temperature: f32,
    key_present: bool,
    key_source: KeySource,
    keychain_available: bool,
    status: AIDoctorStatus,
    blocking_reason: Option<String>,
}

#[derive(Clone, Copy)]
enum AIDoctorStatus {
    Disabled,
    Misconfigured,
    KeychainError,
    Ready,
}

impl AIDoctorStatus {
    fn as_str(&self) -> &'static str {
        match self {
            AIDoctorStatus::Disabled => "disabled",
            AIDoctorStatus::Misconfigured => "misconfigured",
            AIDoctorStatus::KeychainError => "keychain_error",
            AIDoctorStatus::Ready => "ready",
        }
    }
}
