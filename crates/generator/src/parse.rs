use pathgrid_engine::problem::{ProblemData, ProblemError};

use crate::error::GenerationError;

/// Turn model output (or file content) into a validated problem.
///
/// Accepts bare JSON, or a JSON object wrapped in prose or a markdown code
/// fence; the outermost `{ ... }` is used.
pub fn parse_problem(content: &str) -> Result<ProblemData, GenerationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::EmptyContent);
    }

    match ProblemData::from_json(trimmed) {
        Ok(problem) => Ok(problem),
        Err(ProblemError::Invalid(msg)) => Err(GenerationError::InvalidProblem(msg)),
        Err(ProblemError::Json(first)) => {
            // Try to extract JSON from the response if it's wrapped in markdown
            let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) else {
                return Err(GenerationError::Parse(format!("response is not JSON: {}", first)));
            };
            if end <= start || (start == 0 && end == trimmed.len() - 1) {
                return Err(GenerationError::Parse(first));
            }
            log::debug!("problem JSON wrapped in extra text; extracting bytes {}..={}", start, end);
            ProblemData::from_json(&trimmed[start..=end]).map_err(|e| match e {
                ProblemError::Invalid(msg) => GenerationError::InvalidProblem(msg),
                ProblemError::Json(msg) => GenerationError::Parse(msg),
            })
        }
    }
}
