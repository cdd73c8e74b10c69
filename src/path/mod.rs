//! # Path Module
//!
//! Route pattern compilation and request-time parameter binding.
//!
//! ## Overview
//!
//! The path module is responsible for:
//! - Parsing user-supplied route patterns (`/users/:id`, `/files/:name.:ext`)
//!   into matcher-ready patterns with `{placeholder}` wildcards
//! - Describing compound parameter segments as [`ParamZone`] token streams
//! - Reconstructing individual named parameter values from the single raw
//!   token the matcher captures per wildcard
//!
//! ## Architecture
//!
//! Compilation and binding are the two phases:
//!
//! 1. **Compilation** (registration time): `:name` parameters are collected
//!    into zones, chained parameters joined by `-`/`.` become one compound
//!    zone, and each zone is replaced by a single wildcard placeholder whose
//!    name concatenates the zone's tokens (e.g. `:one-:two` → `{one0Htwo}`).
//!
//! 2. **Binding** (request time): the raw string captured for a placeholder is
//!    split back into per-name values by walking the zone's token stream.
//!
//! Separators are encoded as the sentinels `0H` (hyphen) and `0D` (dot).
//! A sentinel can never collide with a real parameter name because parameter
//! names may not start with a digit.

mod binder;
mod compiler;

pub use binder::bind;
pub use compiler::{compile, CompileError, CompiledPath};

use std::sync::Arc;

use smallvec::SmallVec;

/// Maximum number of bound path parameters before heap allocation.
/// Most routes carry very few parameters, so the common case stays
/// on the stack.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the dispatch hot path.
///
/// Param names use `Arc<str>` instead of `String` because names come from the
/// route table (known at registration time) and `Arc::clone()` is O(1).
/// Values remain `String` as they are per-request data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A separator joining two chained parameters inside one path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `-`, encoded as the sentinel `0H`
    Hyphen,
    /// `.`, encoded as the sentinel `0D`
    Dot,
}

impl Separator {
    /// The separator for a raw pattern/path character, if it is one.
    #[must_use]
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '-' => Some(Separator::Hyphen),
            '.' => Some(Separator::Dot),
            _ => None,
        }
    }

    /// The sentinel spelling used inside wildcard placeholder names.
    ///
    /// Sentinels start with a digit, which no parameter name can, so a
    /// placeholder name like `one0Htwo` decodes unambiguously.
    #[must_use]
    pub fn sentinel(self) -> &'static str {
        match self {
            Separator::Hyphen => "0H",
            Separator::Dot => "0D",
        }
    }
}

/// One token of a compound parameter segment: a named capture or the
/// separator between two captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneToken {
    /// A named parameter (`:name` in the pattern)
    Param(Arc<str>),
    /// A literal `-`/`.` between two parameters
    Separator(Separator),
}

/// An ordered token stream describing one compound path segment.
///
/// Parameter names alternate with separator tokens, e.g. `/:one-:two`
/// produces the stream `[one, 0H, two]`. Zones are created once at
/// registration and are immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamZone {
    tokens: Vec<ZoneToken>,
}

impl ParamZone {
    /// The token stream in pattern order.
    #[must_use]
    pub fn tokens(&self) -> &[ZoneToken] {
        &self.tokens
    }

    /// Whether the zone captured at least one named parameter.
    ///
    /// A zone that collected only separators is dropped by the compiler,
    /// mirroring the grammar: separators are only meaningful between names.
    #[must_use]
    pub fn has_params(&self) -> bool {
        self.tokens
            .iter()
            .any(|t| matches!(t, ZoneToken::Param(_)))
    }

    /// The wildcard placeholder name for this zone: every token concatenated,
    /// separators rendered as their sentinels (`one0Htwo`).
    #[must_use]
    pub fn placeholder(&self) -> String {
        let mut name = String::new();
        for token in &self.tokens {
            match token {
                ZoneToken::Param(p) => name.push_str(p),
                ZoneToken::Separator(sep) => name.push_str(sep.sentinel()),
            }
        }
        name
    }

    pub(crate) fn push_param(&mut self, name: &str) {
        self.tokens.push(ZoneToken::Param(Arc::from(name)));
    }

    pub(crate) fn push_separator(&mut self, sep: Separator) {
        self.tokens.push(ZoneToken::Separator(sep));
    }
}
