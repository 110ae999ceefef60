//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                         |
//! |------|-------------------------------------------------|
//! | 0    | Success                                         |
//! | 1    | General error (unspecified)                     |
//! | 2    | Usage error (bad args, missing input file flag) |
//! | 3    | Invalid config (parse or validation)            |
//! | 4    | Schema error (required column or table missing) |
//! | 5    | I/O error (read/write/CSV)                      |
//! | 6    | Unpaid ledger rows remain (`--strict` only)     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `recon_exit_code` or the relevant command

use concilia_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config file does not parse, or fails validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// A required column or table could not be resolved.
pub const EXIT_SCHEMA: u8 = 4;

/// Cannot read an input, write an output, or decode CSV.
pub const EXIT_IO: u8 = 5;

/// Run completed but ledger rows remain unpaid (`--strict`).
pub const EXIT_UNPAID: u8 = 6;

/// Map engine errors to exit codes.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::MissingColumn { .. } | ReconError::MissingTable { .. } => EXIT_SCHEMA,
        ReconError::Csv(_) | ReconError::Io(_) => EXIT_IO,
    }
}
