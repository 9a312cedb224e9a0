//! `${VAR}` expansion for `quire.toml` values.
//!
//! `${VAR}` must be set and `${VAR:-fallback}` falls back when it is not. Bare
//! `$VAR` is left alone. Site directories additionally expand a leading `~`.

use std::borrow::Cow;
use std::env::VarError;

use crate::ConfigError;

fn lookup(var: &str) -> Result<Option<String>, VarError> {
    std::env::var(var).map(Some)
}

fn home() -> Option<String> {
    std::env::var("HOME").ok()
}

/// Expand `${VAR}` references in `value`, naming `field` on failure.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, lookup)
        .map(Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}}: {}", e.var_name, e.cause),
        })
}

/// Expand a site directory: `${VAR}` references first, then a leading `~`.
pub(crate) fn expand_dir(value: &str, field: &str) -> Result<String, ConfigError> {
    let value = expand_env(value, field)?;
    Ok(shellexpand::tilde_with_context(&value, home).into_owned())
}

/// Expand every glob in a list, naming each by index.
pub(crate) fn expand_globs(patterns: &[String], field: &str) -> Result<Vec<String>, ConfigError> {
    patterns
        .iter()
        .enumerate()
        .map(|(i, pattern)| expand_env(pattern, &format!("{field}[{i}]")))
        .collect()
}
