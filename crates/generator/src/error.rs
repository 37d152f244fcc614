/// Error type for problem generation.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// Provider disabled in settings
    NotConfigured(String),
    /// Provider needs an API key and none was found
    MissingKey(String),
    /// Request never produced a response
    Network(String),
    /// Provider answered with a non-success status
    Api { status: u16, message: String },
    /// Response had no content to parse
    EmptyContent,
    /// Content is not JSON, or JSON of the wrong shape
    Parse(String),
    /// Well-formed problem that fails validation
    InvalidProblem(String),
    /// Problem file could not be read
    Io(String),
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::NotConfigured(msg) => write!(f, "AI not configured: {}", msg),
            GenerationError::MissingKey(msg) => write!(f, "API key not configured: {}", msg),
            GenerationError::Network(msg) => write!(f, "Network error: {}", msg),
            GenerationError::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            GenerationError::EmptyContent => write!(f, "No content received from the model"),
            GenerationError::Parse(msg) => write!(f, "Failed to parse problem: {}", msg),
            GenerationError::InvalidProblem(msg) => write!(f, "Invalid problem: {}", msg),
            GenerationError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for GenerationError {}
