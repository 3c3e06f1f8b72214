//! Utility functions and types for error handling and file path validation.
//!
//! This module provides common utility functions used throughout the program,
//! including custom result types and error handling mechanisms.

use anyhow::anyhow;
use log;
use std::path::Path;

/// Custom result type for error handling throughout the program.
pub type Result<T> = anyhow::Result<T>;

/// Logs the provided error and exits the program.
///
/// # Arguments
///
/// * `err` - The error to log before exiting.
pub fn handle_error_and_exit(err: anyhow::Error) -> ! {
    log::error!("{:#}", err);
    std::process::exit(1);
}

/// Checks if the provided file path exists.
///
/// # Arguments
///
/// * `path` - The file path to check.
///
/// # Returns
///
/// A result indicating success if the path exists, or an error if it does not.
pub fn try_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!("Path/File does not exist: {}", path.display()));
    }
    Ok(())
}

/// Checks that a value is a valid sample proportion, i.e. lies in `[0, 1]`.
///
/// NaN is rejected as well.
pub fn check_proportion(value: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(anyhow!(
            "Proportion must be between 0.0 and 1.0, got: {}",
            value
        ));
    }
    Ok(value)
}

/// Sign of `a - b` as -1, 0 or 1.
pub fn sign_of_difference<T: PartialOrd>(a: T, b: T) -> i8 {
    if a > b {
        1
    } else if a < b {
        -1
    } else {
        0
    }
}
