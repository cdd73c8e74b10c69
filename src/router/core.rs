//! Route table: per-route chain sets, parameter zones, and the global
//! middleware merge rules.

use std::collections::HashMap;

use tracing::info;

use crate::dispatcher::Chain;
use crate::path::ParamZone;

/// Registration state for every installed route.
///
/// Owns, per normalized route key, the ordered list of handler chains (the
/// "chain set") and the parameter-zone descriptors compiled from the route's
/// pattern. Mutated only during the setup phase; read-only while serving.
#[derive(Default)]
pub struct RouteTable {
    chains: HashMap<String, Vec<Chain>>,
    zones: HashMap<String, Vec<ParamZone>>,
    /// Global chains to prepend to routes that are first installed after
    /// their registration. Routes already installed got them appended
    /// instead; see [`RouteTable::append_global`].
    globals: Vec<Chain>,
}

impl RouteTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a registration under `key`.
    ///
    /// A new key stores the zones and seeds the chain set with any pending
    /// global chains followed by `chain`; an existing key only appends
    /// `chain` to its chain set (chain sets grow only by appending, and
    /// their order is the fallback order at dispatch time).
    ///
    /// Returns `true` when the key was newly installed, which is the
    /// caller's cue to install the pattern with the matcher exactly once.
    pub fn insert(&mut self, key: &str, zones: Vec<ParamZone>, chain: Chain) -> bool {
        if let Some(chain_set) = self.chains.get_mut(key) {
            chain_set.push(chain);
            info!(
                key = %key,
                chain_count = chain_set.len(),
                "chain appended to existing route"
            );
            return false;
        }

        let mut chain_set = self.globals.clone();
        chain_set.push(chain);
        info!(key = %key, chain_count = chain_set.len(), "route installed");
        self.chains.insert(key.to_string(), chain_set);
        self.zones.insert(key.to_string(), zones);
        true
    }

    /// Attach a global middleware chain.
    ///
    /// The chain is appended as a trailing entry to every chain set existing
    /// at call time, and recorded so every route first installed later gets
    /// it as a leading entry instead. Global middleware therefore runs last
    /// for routes declared before it and first for routes declared after it.
    /// This asymmetry is the documented contract, not an accident.
    pub fn append_global(&mut self, chain: Chain) {
        for chain_set in self.chains.values_mut() {
            chain_set.push(chain.clone());
        }
        self.globals.push(chain);
        info!(
            existing_routes = self.chains.len(),
            pending_globals = self.globals.len(),
            "global middleware attached"
        );
    }

    /// The chain set registered under `key`.
    #[must_use]
    pub fn chain_set(&self, key: &str) -> Option<&[Chain]> {
        self.chains.get(key).map(Vec::as_slice)
    }

    /// The parameter zones compiled for `key`, in placeholder order.
    #[must_use]
    pub fn zones(&self, key: &str) -> Option<&[ParamZone]> {
        self.zones.get(key).map(Vec::as_slice)
    }

    /// Number of installed routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether no route has been installed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
