//! One practice session: the live problem, the code being edited, the last
//! results and the playback over the grid.
//!
//! Every entry point cancels the running playback before doing anything
//! else, so a stale animation can never write into a newer one.

use std::time::Instant;

use crate::animator::{AnimationTiming, Animator};
use crate::evaluator::Evaluator;
use crate::problem::{ProblemData, ProblemSource};
use crate::verify::{ManualRun, Summary, TestVerdict, Verifier};

/// Shown when the returned path does not run from start to end.
pub const DISCONNECTED_NOTE: &str = "Note: path does not run from start to end";

pub struct Session<E> {
    verifier: Verifier<E>,
    problem: Option<ProblemData>,
    animator: Animator,
    source: String,
    messages: Vec<String>,
    output: Vec<String>,
    status: Option<String>,
}

impl<E: Evaluator> Session<E> {
    pub fn new(evaluator: E, timing: AnimationTiming) -> Self {
        Self {
            verifier: Verifier::new(evaluator),
            problem: None,
            animator: Animator::new(timing),
            source: String::new(),
            messages: Vec::new(),
            output: Vec::new(),
            status: None,
        }
    }

    pub fn problem(&self) -> Option<&ProblemData> {
        self.problem.as_ref()
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Result lines: a run message, or one line per test case.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Lines printed by the solution during the last run.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    /// Replace the source with the problem's starter code.
    pub fn reset_source(&mut self) {
        if let Some(problem) = &self.problem {
            self.source = problem.boilerplate.clone();
        }
    }

    /// Install `problem` as the live problem, discarding all prior results.
    pub fn load_problem(&mut self, problem: ProblemData) {
        self.animator.clear();
        self.source = problem.boilerplate.clone();
        self.problem = Some(problem);
        self.messages.clear();
        self.output.clear();
        self.status = None;
    }

    /// Fetch a problem from `source`. On failure the current problem stays.
    pub fn new_problem<S: ProblemSource + ?Sized>(&mut self, source: &S) -> bool {
        self.animator.cancel();
        log::info!("requesting problem from {}", source.describe());
        match source.get_problem() {
            Ok(problem) => {
                self.load_problem(problem);
                true
            }
            Err(e) => {
                log::warn!("problem generation failed: {}", e);
                self.status = Some(format!("Failed to generate problem: {}", e));
                false
            }
        }
    }

    /// Run the current source on the displayed puzzle.
    pub fn run(&mut self, now: Instant) {
        self.animator.clear();
        self.messages.clear();
        self.output.clear();
        self.status = None;

        let Some(problem) = &self.problem else {
            self.messages.push("No problem loaded".to_string());
            return;
        };

        let (outcome, output) = self.verifier.run_manual_with_output(&self.source, problem);
        self.output = output;
        match outcome {
            ManualRun::Path(trace) => {
                if !trace.connects(problem.start, problem.end) {
                    self.status = Some(DISCONNECTED_NOTE.to_string());
                }
                self.animator.start(trace, now);
            }
            other => self.messages.extend(other.message()),
        }
    }

    /// Run the current source against every test case.
    pub fn test(&mut self, now: Instant) -> Option<Summary> {
        self.animator.clear();
        self.messages.clear();
        self.output.clear();
        self.status = None;

        let Some(problem) = &self.problem else {
            self.messages.push("No problem loaded".to_string());
            return None;
        };

        let batch = self.verifier.run_batch(&self.source, &problem.test_cases);
        let summary = batch.summary();
        for result in &batch.results {
            self.messages.push(result.line());
            if let TestVerdict::Error(msg) = &result.verdict {
                log::debug!("test case {} error: {}", result.index + 1, msg);
            }
            self.output.extend(result.output.iter().cloned());
        }
        self.status = Some(summary.to_string());

        if let Some(trace) = batch.preview {
            self.animator.start(trace, now);
        }
        Some(summary)
    }

    /// Advance playback. Returns whether anything visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.animator.advance(now)
    }

    /// Reveal the rest of the running playback.
    pub fn skip_animation(&mut self) {
        self.animator.finish();
    }
}
