//! Problem records exchanged with the problem generator.
//!
//! The JSON field names match the generator's wire contract (`testCases`,
//! `startRow`, ...). Everything is typed from the boundary on: a payload that
//! does not fit these shapes is rejected by [`ProblemData::from_json`] rather
//! than carried around as loose JSON.

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, Position};

/// One complete puzzle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemData {
    pub grid: Grid,
    pub start: Position,
    pub end: Position,
    /// Natural-language goal shown to the player
    pub statement: String,
    /// Starter code placed in the editor
    pub boilerplate: String,
    pub test_cases: Vec<TestCase>,
}

/// Hidden test case: an input puzzle and the single expected path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: TestInput,
    pub output: Vec<Position>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestInput {
    pub grid: Grid,
    pub start_row: i32,
    pub start_col: i32,
    pub end_row: i32,
    pub end_col: i32,
}

/// Arguments handed to the user's `findPath`.
#[derive(Clone, Copy, Debug)]
pub struct PathArgs<'a> {
    pub grid: &'a Grid,
    pub start: Position,
    pub end: Position,
}

/// Error turning text into a [`ProblemData`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Not JSON, or JSON of the wrong shape
    Json(String),
    /// Well-formed but inconsistent: a grid that is ragged, empty or holds
    /// unknown codes, or an endpoint outside its grid
    Invalid(String),
}

impl std::fmt::Display for ProblemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProblemError::Json(msg) => write!(f, "invalid problem JSON: {}", msg),
            ProblemError::Invalid(msg) => write!(f, "invalid problem: {}", msg),
        }
    }
}

impl std::error::Error for ProblemError {}

/// Where new problems come from.
pub trait ProblemSource {
    type Error: std::fmt::Display;

    /// Produce one problem. Each call is a single attempt.
    fn get_problem(&self) -> Result<ProblemData, Self::Error>;

    /// Short human-readable description, e.g. `openai (gpt-3.5-turbo)`.
    fn describe(&self) -> String;
}

impl ProblemData {
    /// Parse and validate a problem from its JSON text.
    ///
    /// A grid that is a list of code rows but not a valid [`Grid`] is
    /// reported as [`ProblemError::Invalid`], not as a JSON error.
    pub fn from_json(text: &str) -> Result<Self, ProblemError> {
        let problem: ProblemData = serde_json::from_str(text).map_err(|e| {
            match serde_json::from_str::<serde_json::Value>(text).ok().and_then(|v| grid_error(&v)) {
                Some(invalid) => invalid,
                None => ProblemError::Json(e.to_string()),
            }
        })?;
        problem.validate()?;
        Ok(problem)
    }

    /// Check that every start/end position lies inside its grid.
    ///
    /// Solvability is not checked.
    pub fn validate(&self) -> Result<(), ProblemError> {
        check_endpoint(&self.grid, self.start, "start")?;
        check_endpoint(&self.grid, self.end, "end")?;
        for (i, case) in self.test_cases.iter().enumerate() {
            check_endpoint(&case.input.grid, case.input.start(), &format!("test case {} start", i + 1))?;
            check_endpoint(&case.input.grid, case.input.end(), &format!("test case {} end", i + 1))?;
        }
        Ok(())
    }

    pub fn args(&self) -> PathArgs<'_> {
        PathArgs { grid: &self.grid, start: self.start, end: self.end }
    }

    pub fn to_json_pretty(&self) -> Result<String, ProblemError> {
        serde_json::to_string_pretty(self).map_err(|e| ProblemError::Json(e.to_string()))
    }
}

impl TestInput {
    pub fn start(&self) -> Position {
        Position::new(self.start_row, self.start_col)
    }

    pub fn end(&self) -> Position {
        Position::new(self.end_row, self.end_col)
    }
}

impl TestCase {
    pub fn args(&self) -> PathArgs<'_> {
        PathArgs { grid: &self.input.grid, start: self.input.start(), end: self.input.end() }
    }
}

/// First grid in a raw problem value that has the right JSON shape but is
/// rejected by [`Grid::from_rows`].
fn grid_error(value: &serde_json::Value) -> Option<ProblemError> {
    let cases = value.get("testCases").and_then(|c| c.as_array());
    let grids = std::iter::once(("grid".to_string(), value.get("grid"))).chain(
        cases
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(i, case)| (format!("test case {} grid", i + 1), case.pointer("/input/grid"))),
    );

    grids.into_iter().find_map(|(what, grid)| {
        let rows: Vec<Vec<u8>> = serde_json::from_value(grid?.clone()).ok()?;
        let err = Grid::from_rows(rows).err()?;
        Some(ProblemError::Invalid(format!("{}: {}", what, err)))
    })
}

fn check_endpoint(grid: &Grid, pos: Position, what: &str) -> Result<(), ProblemError> {
    if grid.contains(pos) {
        Ok(())
    } else {
        Err(ProblemError::Invalid(format!(
            "{} {} is outside the {}x{} grid",
            what,
            pos,
            grid.rows(),
            grid.cols()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "grid": [[0,0,0],[0,1,0],[0,0,0]],
        "start": [0,0],
        "end": [2,2],
        "statement": "Reach the corner.",
        "boilerplate": "function findPath(grid, startRow, startCol, endRow, endCol, visit)\nend",
        "testCases": [
            {
                "input": {"grid": [[0,0],[0,0]], "startRow": 0, "startCol": 0, "endRow": 1, "endCol": 1},
                "output": [[0,0],[0,1],[1,1]]
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let problem = ProblemData::from_json(SAMPLE).unwrap();
        assert_eq!(problem.grid.rows(), 3);
        assert_eq!(problem.start, Position::new(0, 0));
        assert_eq!(problem.end, Position::new(2, 2));
        assert_eq!(problem.test_cases.len(), 1);
        assert_eq!(problem.test_cases[0].input.end(), Position::new(1, 1));
        assert_eq!(problem.test_cases[0].output.len(), 3);
    }

    #[test]
    fn test_round_trip_keeps_wire_names() {
        let problem = ProblemData::from_json(SAMPLE).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&problem.to_json_pretty().unwrap()).unwrap();
        assert!(json["testCases"].is_array());
        assert_eq!(json["testCases"][0]["input"]["startRow"], 0);
        assert_eq!(json["start"], serde_json::json!([0, 0]));
    }

    #[test]
    fn test_endpoint_outside_grid() {
        let text = SAMPLE.replace(r#""end": [2,2]"#, r#""end": [5,2]"#);
        let err = ProblemData::from_json(&text).unwrap_err();
        assert!(matches!(err, ProblemError::Invalid(ref m) if m.contains("end")));
    }

    #[test]
    fn test_test_case_endpoint_outside_grid() {
        let text = SAMPLE.replace(r#""endRow": 1"#, r#""endRow": 9"#);
        let err = ProblemData::from_json(&text).unwrap_err();
        assert!(matches!(err, ProblemError::Invalid(ref m) if m.contains("test case 1 end")));
    }

    #[test]
    fn test_missing_field_is_json_error() {
        let err = ProblemData::from_json(r#"{"grid": [[0]], "start": [0,0]}"#).unwrap_err();
        assert!(matches!(err, ProblemError::Json(_)));
    }

    #[test]
    fn test_ragged_grid_is_invalid() {
        let text = SAMPLE.replace("[[0,0,0],[0,1,0],[0,0,0]]", "[[0,0,0],[0,1],[0,0,0]]");
        let err = ProblemData::from_json(&text).unwrap_err();
        assert_eq!(
            err,
            ProblemError::Invalid("grid: grid is not rectangular: row 1 has 2 cells, expected 3".into())
        );
    }

    #[test]
    fn test_test_case_grid_errors_are_invalid() {
        let text = SAMPLE.replace("[[0,0],[0,0]]", "[[0,0],[0,8]]");
        let err = ProblemData::from_json(&text).unwrap_err();
        assert_eq!(err, ProblemError::Invalid("test case 1 grid: unknown cell code 8 at (1, 1)".into()));
    }

    #[test]
    fn test_grid_wording_in_other_fields_stays_json_error() {
        // Statement mentions grid errors but the payload is missing `testCases`.
        let text = r#"{"grid": [[0]], "start": [0,0], "end": [0,0],
            "statement": "grid is not rectangular", "boilerplate": "unknown cell code"}"#;
        assert!(matches!(ProblemData::from_json(text).unwrap_err(), ProblemError::Json(_)));

        let text = SAMPLE.replace("[[0,0,0],[0,1,0],[0,0,0]]", r#""not rectangular""#);
        assert!(matches!(ProblemData::from_json(&text).unwrap_err(), ProblemError::Json(_)));
    }
}
