//! Problem generation.
//!
//! Puzzles come from a language model behind an OpenAI-compatible
//! chat-completions API, or from a JSON file on disk. Both paths end in
//! [`parse_problem`], so a problem is validated the same way no matter where
//! it came from.
//!
//! One request per problem. No retries, no caching.

mod client;
mod error;
mod file;
mod parse;
pub mod prompt;

pub use client::OpenAiGenerator;
pub use error::GenerationError;
pub use file::FileProblemSource;
pub use parse::parse_problem;
pub use pathgrid_engine::problem::ProblemSource;
