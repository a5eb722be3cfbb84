//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `plantreg` exit codes.
//! Exit codes are part of the shell contract: build pipelines rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Domain    | Description                                      |
//! |------|-----------|--------------------------------------------------|
//! | 0    | Universal | Success                                          |
//! | 2    | Universal | CLI usage error (bad args)                       |
//! | 60   | registry  | Run configuration unreadable or invalid          |
//! | 61   | registry  | Reference table unreadable or inconsistent       |
//! | 62   | registry  | Source dataset unreadable                        |
//! | 63   | registry  | Registry, dump or SQLite output failed           |
//! | 64   | registry  | `plantreg check` found errors in the tables      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0, 2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Registry (60-69)
// =============================================================================

/// Config file missing, not TOML, or failing validation.
pub const EXIT_INVALID_CONFIG: u8 = 60;

/// Fuel thesaurus, country information or concordance failed to load.
pub const EXIT_RESOURCE: u8 = 61;

/// A national or aggregator dataset failed to load.
pub const EXIT_DATASET: u8 = 62;

/// Writing the registry CSV, the dump or the SQLite copy failed.
pub const EXIT_EXPORT: u8 = 63;

/// Reference tables loaded but `plantreg check` reported errors.
pub const EXIT_CHECK_FAILED: u8 = 64;
