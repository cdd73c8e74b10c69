//! # Router Module
//!
//! Route registration state and path matching.
//!
//! ## Overview
//!
//! The router module is responsible for:
//! - Owning the per-route chain sets and parameter-zone descriptors
//!   ([`RouteTable`])
//! - Merging repeated registrations and global middleware into existing and
//!   future routes
//! - Resolving an inbound method + path to a route key and raw wildcard
//!   captures through the [`PathMatcher`] contract
//!
//! ## Architecture
//!
//! The matching table itself is an external collaborator behind the
//! [`PathMatcher`] trait: the engine only requires that installing a
//! normalized pattern later yields, per matched request, one raw captured
//! string per wildcard placeholder. [`RegexMatcher`] is the bundled
//! implementation — one compiled regex per pattern, exact matching for
//! patterns carrying the `{$}` end marker and prefix matching otherwise.
//!
//! The [`RouteTable`] is mutated only during the single-threaded setup phase
//! and is read-only while serving; the registration API takes `&mut self`
//! and the dispatch path `&self`, so the borrow checker enforces the
//! discipline.

mod core;
mod matcher;

pub use core::RouteTable;
pub use matcher::{PathMatcher, RegexMatcher, RouteHit};
