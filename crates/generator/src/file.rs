use std::fs;
use std::path::{Path, PathBuf};

use pathgrid_engine::problem::{ProblemData, ProblemSource};

use crate::error::GenerationError;
use crate::parse::parse_problem;

/// Problem source that reads a saved problem JSON file.
///
/// The file is re-read on every call, so edits show up on the next "new
/// problem".
#[derive(Debug, Clone)]
pub struct FileProblemSource {
    path: PathBuf,
}

impl FileProblemSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProblemSource for FileProblemSource {
    type Error = GenerationError;

    fn get_problem(&self) -> Result<ProblemData, GenerationError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| GenerationError::Io(format!("{}: {}", self.path.display(), e)))?;
        parse_problem(&content)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_problem_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("problem.json");
        fs::write(
            &path,
            r#"{"grid": [[0]], "start": [0,0], "end": [0,0], "statement": "tiny",
                "boilerplate": "", "testCases": []}"#,
        )
        .unwrap();

        let source = FileProblemSource::new(&path);
        assert_eq!(source.get_problem().unwrap().statement, "tiny");
        assert_eq!(source.describe(), path.display().to_string());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileProblemSource::new(dir.path().join("absent.json"));
        assert!(matches!(source.get_problem().unwrap_err(), GenerationError::Io(_)));
    }
}
