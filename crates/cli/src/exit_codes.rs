//! CLI Exit Code Registry
//!
//! Single source of truth for `mailrec` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                    |
//! |------|------------------------------------------------------------|
//! | 0    | Success                                                    |
//! | 1    | General error (unspecified)                                |
//! | 2    | Usage error (bad arguments, invalid request parameters)    |
//! | 3    | Configuration error (source not configured, bad settings)  |
//! | 4    | Source unavailable (HTTP failure, missing master file)     |
//! | 5    | Schema or payload error (missing column, malformed data)   |
//! | 6    | Empty result, only with `--fail-on-empty`                  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map it in [`for_error`] if it comes from a pipeline error

use mailrec_pipeline::PipelineError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (I/O on stdout, etc.).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments or request parameters.
pub const EXIT_USAGE: u8 = 2;

/// Missing or invalid configuration.
pub const EXIT_CONFIG: u8 = 3;

/// A source could not be fetched or read. No retry is attempted.
pub const EXIT_SOURCE_UNAVAILABLE: u8 = 4;

/// A source was read but its shape is wrong.
pub const EXIT_SCHEMA: u8 = 5;

/// The computation succeeded but produced nothing (`--fail-on-empty`).
pub const EXIT_EMPTY: u8 = 6;

/// Exit code for a pipeline failure.
pub fn for_error(err: &PipelineError) -> u8 {
    match err {
        PipelineError::Configuration(_) => EXIT_CONFIG,
        PipelineError::SourceUnavailable(_) => EXIT_SOURCE_UNAVAILABLE,
        PipelineError::Schema { .. } | PipelineError::Parse(_) => EXIT_SCHEMA,
        PipelineError::InvalidRequest(_) => EXIT_USAGE,
        PipelineError::Io(_) => EXIT_ERROR,
    }
}
