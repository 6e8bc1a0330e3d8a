//! Helpers for reading configuration values from the environment.
//!
//! Values are looked up through a closure so the same parsing runs against
//! the process environment and against fixed maps in tests.

use crate::error::{CoreError, CoreResult};
use std::path::PathBuf;
use std::str::FromStr;

/// Returns the trimmed value of `key`, or `None` when unset or blank.
pub fn get_env_string<L>(lookup: &L, key: &str) -> Option<String>
where
    L: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Returns `key` as a path, or `None` when unset or blank.
pub fn get_env_path<L>(lookup: &L, key: &str) -> Option<PathBuf>
where
    L: Fn(&str) -> Option<String>,
{
    get_env_string(lookup, key).map(PathBuf::from)
}

/// Parses `key` with `FromStr`. An unparsable value is a configuration error
/// naming the variable.
pub fn get_env_parsed<L, T>(lookup: &L, key: &str) -> CoreResult<Option<T>>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_string(lookup, key)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|e| CoreError::Config(format!("{key}={value}: {e}")))
        })
        .transpose()
}
