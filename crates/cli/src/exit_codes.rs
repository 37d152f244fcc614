//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Scripts (and graders wrapping `pathgrid test`) rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                                  |
//! |---------|------------------|----------------------------------------------|
//! | 0       | Universal        | Success                                      |
//! | 1       | Universal        | General error (unspecified)                  |
//! | 2       | Universal        | CLI usage error (bad args)                   |
//! | 3-9     | files            | Problem/solution file codes                  |
//! | 10-19   | ai               | AI provider/keychain/generation codes        |
//! | 20-29   | verify           | Outcomes of `run` and `test`                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use pathgrid_generator::GenerationError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// Reported by clap before any command runs.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Files (3-9)
// =============================================================================

/// Problem or solution file could not be read or written.
pub const EXIT_IO: u8 = 3;

/// Problem file is not valid problem JSON (bad shape, unknown cell code,
/// start/end outside the grid).
pub const EXIT_PROBLEM_PARSE: u8 = 4;

// =============================================================================
// AI (10-19)
// =============================================================================

/// AI disabled (provider=none).
pub const EXIT_AI_DISABLED: u8 = 10;

/// AI provider configured but API key missing.
pub const EXIT_AI_MISSING_KEY: u8 = 11;

/// Keychain error (cannot read credentials).
pub const EXIT_AI_KEYCHAIN_ERR: u8 = 12;

/// Problem generation failed: network, API status, or unusable content.
pub const EXIT_GENERATION_FAILED: u8 = 13;

// =============================================================================
// Verify (20-29)
// =============================================================================

/// `test`: at least one test case failed or errored.
pub const EXIT_TEST_FAILED: u8 = 20;

/// `run`: the solution returned no path.
pub const EXIT_NO_PATH: u8 = 21;

/// `run`: the solution did not compile or raised at runtime.
pub const EXIT_SOLUTION_ERROR: u8 = 22;

/// Map a generation error to its exit code.
pub fn generation_exit_code(err: &GenerationError) -> u8 {
    match err {
        GenerationError::NotConfigured(_) => EXIT_AI_DISABLED,
        GenerationError::MissingKey(_) => EXIT_AI_MISSING_KEY,
        GenerationError::Io(_) => EXIT_IO,
        GenerationError::Network(_)
        | GenerationError::Api { .. }
        | GenerationError::EmptyContent
        | GenerationError::Parse(_)
        | GenerationError::InvalidProblem(_) => EXIT_GENERATION_FAILED,
    }
}
