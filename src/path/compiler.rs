//! Route-pattern compiler.
//!
//! Turns a user-facing pattern such as `/users/:id/files/:name.:ext` into a
//! normalized, matcher-ready pattern (`/users/{id}/files/{name0Dext}/{$}`)
//! plus the [`ParamZone`] descriptors needed to rebind captured values at
//! request time.

use std::fmt;

use crate::config::AppConfig;

use super::{ParamZone, Separator};

/// Error raised while compiling a route pattern.
///
/// Compilation errors are surfaced synchronously to the registration caller
/// and fail that registration atomically; nothing is added to the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A parameter name starts with a digit
    InvalidParamName {
        /// The offending parameter name
        name: String,
    },
    /// A character inside a parameter is neither `[A-Za-z0-9_]` nor a separator
    InvalidParamChar {
        /// The offending character
        ch: char,
    },
    /// A `-`/`.` separator was not immediately followed by a new `:name`
    MissingColonAfterSeparator {
        /// The character found instead of `:`
        found: char,
    },
    /// The pattern does not start with `/` (host-qualified) and host
    /// patterns are disabled in the configuration
    HostNotAllowed,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::InvalidParamName { name } => {
                write!(
                    f,
                    "name of path parameter ':{name}' is invalid: it must not start with a digit"
                )
            }
            CompileError::InvalidParamChar { ch } => {
                write!(
                    f,
                    "invalid character '{ch}' in path parameter: only [A-Za-z0-9_] and the \
                    separators '-' and '.' are allowed"
                )
            }
            CompileError::MissingColonAfterSeparator { found } => {
                write!(
                    f,
                    "path parameter should start with a colon (:), instead '{found}' was found"
                )
            }
            CompileError::HostNotAllowed => {
                write!(f, "path cannot contain a host")
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// A compiled route pattern: the normalized path and its parameter zones,
/// in left-to-right order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPath {
    /// Matcher-ready pattern with `{placeholder}` wildcards and, in precise
    /// mode, a trailing `/{$}` end-of-path marker
    pub pattern: String,
    /// One descriptor per wildcard, used to rebind captured tokens
    pub zones: Vec<ParamZone>,
}

/// Compile a route pattern under the given configuration.
///
/// Applies, in order: the host-prefix check, parameter-zone parsing,
/// case-folding of all non-parameter characters (unless `case_sensitive`),
/// and trailing-slash normalization with the `{$}` end marker (unless
/// `coarse`).
///
/// # Arguments
///
/// * `pattern` - The user-facing route pattern (e.g. `/users/:id`)
/// * `config` - Compilation options
///
/// # Errors
///
/// Returns a [`CompileError`] for malformed parameters or a disallowed host
/// prefix. Errors are returned, never panicked.
pub fn compile(pattern: &str, config: &AppConfig) -> Result<CompiledPath, CompileError> {
    if !config.allow_host && !pattern.starts_with('/') {
        return Err(CompileError::HostNotAllowed);
    }

    let (mut normalized, zones) = parse_params(pattern)?;

    if !config.case_sensitive {
        normalized = fold_non_params(&normalized);
    }
    if !config.coarse {
        normalized = make_precise(&normalized);
    }

    Ok(CompiledPath {
        pattern: normalized,
        zones,
    })
}

/// Parse the `:name` parameters out of a pattern.
///
/// A parameter zone opens at `:` immediately following a `/` and closes at
/// the next `/` (or end of input). Within a zone, `-` and `.` chain further
/// parameters; each chained parameter must again start with `:`. The whole
/// zone is replaced by one `{placeholder}` wildcard named by concatenating
/// the zone's tokens, e.g. `/:one-:two/:three` → `/{one0Htwo}/{three}` with
/// zones `[[one, 0H, two], [three]]`.
fn parse_params(path: &str) -> Result<(String, Vec<ParamZone>), CompileError> {
    let mut parsed = String::with_capacity(path.len());
    let mut zones = Vec::new();

    let mut zone = ParamZone::default();
    let mut current = String::new();
    let mut in_zone = false;
    let mut after_separator = false;
    let mut prev: Option<char> = None;

    for ch in path.chars() {
        if in_zone {
            if ch == '/' {
                if !current.is_empty() {
                    flush_param(&mut zone, &mut current)?;
                }
                if zone.has_params() {
                    flush_zone(&mut parsed, &mut zone, &mut zones);
                } else {
                    zone = ParamZone::default();
                }
                in_zone = false;
                after_separator = false;
                parsed.push('/');
            } else if after_separator {
                if ch == ':' {
                    after_separator = false;
                } else {
                    return Err(CompileError::MissingColonAfterSeparator { found: ch });
                }
            } else if let Some(sep) = Separator::from_char(ch) {
                if !current.is_empty() {
                    flush_param(&mut zone, &mut current)?;
                }
                zone.push_separator(sep);
                after_separator = true;
            } else if ch.is_ascii_alphanumeric() || ch == '_' {
                current.push(ch);
            } else {
                return Err(CompileError::InvalidParamChar { ch });
            }
        } else {
            // A zone opens at ":" right after "/"; the ":" is kept in the
            // buffer and replaced when the zone flushes.
            if ch == ':' && prev == Some('/') {
                in_zone = true;
            }
            parsed.push(ch);
        }
        prev = Some(ch);
    }

    if !current.is_empty() {
        flush_param(&mut zone, &mut current)?;
    }
    if zone.has_params() {
        flush_zone(&mut parsed, &mut zone, &mut zones);
    }

    Ok((parsed, zones))
}

/// Validate the collected parameter name and append it to the zone.
fn flush_param(zone: &mut ParamZone, current: &mut String) -> Result<(), CompileError> {
    if current.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(CompileError::InvalidParamName {
            name: std::mem::take(current),
        });
    }
    zone.push_param(current);
    current.clear();
    Ok(())
}

/// Replace the pending `:` in the buffer with the zone's `{placeholder}` and
/// record the zone.
fn flush_zone(parsed: &mut String, zone: &mut ParamZone, zones: &mut Vec<ParamZone>) {
    if parsed.ends_with(':') {
        parsed.pop();
    }
    parsed.push('{');
    parsed.push_str(&zone.placeholder());
    parsed.push('}');
    zones.push(std::mem::take(zone));
}

/// Lowercase every character outside `{...}` placeholders.
///
/// Placeholder names must survive folding verbatim: the binder matches them
/// against the zone token stream, and parameter names are case-significant.
fn fold_non_params(path: &str) -> String {
    let mut in_param = false;
    let mut output = String::with_capacity(path.len());
    for ch in path.chars() {
        if ch == '{' {
            in_param = true;
        }
        if in_param {
            output.push(ch);
        } else {
            output.extend(ch.to_lowercase());
        }
        if ch == '}' {
            in_param = false;
        }
    }
    output
}

/// Strip one trailing slash and append the end-of-path marker, turning the
/// pattern into an exact match.
fn make_precise(path: &str) -> String {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    format!("{trimmed}/{{$}}")
}
