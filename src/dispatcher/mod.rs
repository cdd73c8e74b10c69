//! # Dispatcher Module
//!
//! Per-request execution of handler chains under the Next/Route/Err
//! protocol.
//!
//! ## Overview
//!
//! The dispatcher module is responsible for:
//! - The [`Callback`] contract and the per-invocation [`Next`] signal
//! - Running a route's chain set strictly in registration order
//! - Error escalation toward error-handling callbacks
//! - Panic containment with a configurable fault policy
//! - Flushing staged response writes after every callback
//!
//! ## The signal protocol
//!
//! A callback communicates intent only by mutating its [`Next`] signal and
//! the response, never through a return value:
//!
//! - `next` — continue with the following callback of the current chain
//! - `route` — abandon the rest of the chain and fall through to the next
//!   chain registered for the route
//! - `err` — attach an error to the request, to be consumed by an
//!   error-handling callback further down the chain set
//!
//! A request is in the error state while an error is attached. Plain
//! callbacks are skipped in that state; error-handling callbacks run only in
//! that state and clear the error when they do.

mod core;
#[cfg(test)]
mod tests;

pub use core::{
    Callback, Chain, ChainExecutor, DispatchOutcome, FaultPolicy, Next,
};
