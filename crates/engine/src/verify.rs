//! Verification engine: manual runs against the displayed puzzle and batch
//! runs against the hidden test cases.

use crate::evaluator::{Evaluator, Execution};
use crate::grid::Position;
use crate::problem::{ProblemData, TestCase};

/// Visited sequence and path from one execution, ready for playback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    pub visited: Vec<Position>,
    pub path: Vec<Position>,
}

impl Trace {
    /// Whether the path begins at `start` and ends at `end`.
    pub fn connects(&self, start: Position, end: Position) -> bool {
        self.path.first() == Some(&start) && self.path.last() == Some(&end)
    }
}

/// Outcome of running the solution on the displayed puzzle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManualRun {
    /// Compilation or execution failed
    Error(String),
    /// The solution returned a falsy value or an empty path
    NoPath,
    Path(Trace),
}

impl ManualRun {
    /// Message for the results pane, if this outcome produces one.
    pub fn message(&self) -> Option<String> {
        match self {
            ManualRun::Error(msg) => Some(format!("Compilation Error: {}", msg)),
            ManualRun::NoPath => Some("No path found".to_string()),
            ManualRun::Path(_) => None,
        }
    }
}

/// Result of one test case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestVerdict {
    Pass,
    Fail,
    Error(String),
}

impl TestVerdict {
    pub fn label(&self) -> &'static str {
        match self {
            TestVerdict::Pass => "✅ Pass",
            TestVerdict::Fail => "❌ Fail",
            TestVerdict::Error(_) => "❌ Error",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, TestVerdict::Pass)
    }
}

/// Verdict and what the solution produced for one test case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestResult {
    /// 0-based position in the test case list
    pub index: usize,
    pub verdict: TestVerdict,
    /// Returned path (`None` for falsy returns and errors)
    pub actual: Option<Vec<Position>>,
    pub output: Vec<String>,
}

impl TestResult {
    /// Display line, e.g. `Test Case 1: ✅ Pass`.
    pub fn line(&self) -> String {
        format!("Test Case {}: {}", self.index + 1, self.verdict.label())
    }
}

/// Passed and total test case counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub total: usize,
}

impl Summary {
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} passed", self.passed, self.total)
    }
}

/// Outcome of a batch run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchRun {
    /// One entry per test case, in order
    pub results: Vec<TestResult>,
    /// Trace of test case 0, if it returned a path
    pub preview: Option<Trace>,
}

impl BatchRun {
    pub fn summary(&self) -> Summary {
        Summary {
            passed: self.results.iter().filter(|r| r.verdict.is_pass()).count(),
            total: self.results.len(),
        }
    }
}

/// Runs solutions through an [`Evaluator`].
pub struct Verifier<E> {
    evaluator: E,
}

impl<E: Evaluator> Verifier<E> {
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Run `source` against the puzzle grid of `problem`.
    pub fn run_manual(&self, source: &str, problem: &ProblemData) -> ManualRun {
        self.run_manual_with_output(source, problem).0
    }

    /// Like [`Verifier::run_manual`], also returning the printed lines.
    pub fn run_manual_with_output(&self, source: &str, problem: &ProblemData) -> (ManualRun, Vec<String>) {
        match self.evaluator.execute(source, &problem.args()) {
            Err(e) => {
                log::debug!("manual run failed: {}", e);
                (ManualRun::Error(e.message().to_string()), e.into_output())
            }
            Ok(Execution { path: None, output, .. }) => (ManualRun::NoPath, output),
            Ok(Execution { path: Some(path), output, .. }) if path.is_empty() => (ManualRun::NoPath, output),
            Ok(Execution { visited, path: Some(path), output }) => {
                (ManualRun::Path(Trace { visited, path }), output)
            }
        }
    }

    /// Run `source` against every test case, each with its own compiled
    /// instance and visited recorder.
    pub fn run_batch(&self, source: &str, test_cases: &[TestCase]) -> BatchRun {
        let mut batch = BatchRun::default();

        for (index, case) in test_cases.iter().enumerate() {
            let result = match self.evaluator.execute(source, &case.args()) {
                Err(e) => TestResult {
                    index,
                    verdict: TestVerdict::Error(e.message().to_string()),
                    actual: None,
                    output: e.into_output(),
                },
                Ok(exec) => {
                    let verdict = if exec.path.as_deref() == Some(case.output.as_slice()) {
                        TestVerdict::Pass
                    } else {
                        TestVerdict::Fail
                    };
                    if index == 0 {
                        if let Some(path) = &exec.path {
                            batch.preview = Some(Trace { visited: exec.visited.clone(), path: path.clone() });
                        }
                    }
                    TestResult { index, verdict, actual: exec.path, output: exec.output }
                }
            };
            log::debug!("{}", result.line());
            batch.results.push(result);
        }

        batch
    }
}
