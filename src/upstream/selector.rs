//! Upstream selection strategies.
//!
//! Two interchangeable strategies behind one surface:
//! - sticky-with-failover: cache the first upstream whose probe succeeds and
//!   keep returning it until `invalidate()`; cost is front-loaded onto the
//!   first request after a failure and amortised across the rest.
//! - round-robin: rotate through the candidates on every dispense and let
//!   the forwarding call discover dead upstreams empirically.
//!
//! The selector holds the only shared mutable state in the proxy: a
//! lock-free slot (sticky) and a cursor (round-robin). Concurrent requests
//! during a re-probe window may issue duplicate probes; that is tolerated,
//! not corrected.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ProxyError;
use crate::upstream::probe::HealthProbe;
use crate::upstream::{base_label, UpstreamSet};

/// Selection strategy, chosen at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Sticky,
    RoundRobin,
}

/// Dispenses one candidate upstream per request.
#[derive(Debug)]
pub struct Selector {
    upstreams: UpstreamSet,
    strategy: Strategy,
    /// Sticky mode: the cached known-good upstream. Empty means unresolved.
    current: ArcSwapOption<Url>,
    /// Round-robin mode: next rotation index.
    cursor: AtomicUsize,
}

impl Selector {
    pub fn new(upstreams: UpstreamSet, strategy: Strategy) -> Self {
        Self {
            upstreams,
            strategy,
            current: ArcSwapOption::empty(),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn upstreams(&self) -> &UpstreamSet {
        &self.upstreams
    }

    /// Return one upstream to try next.
    ///
    /// Sticky: the cached upstream if resolved, otherwise the first
    /// candidate (in list order) whose probe succeeds. Fails with
    /// `ResolutionFailed` naming every candidate when none respond.
    /// Round-robin: the next candidate in cyclic order, no probing.
    pub async fn acquire<P: HealthProbe>(&self, probe: &P) -> Result<Url, ProxyError> {
        match self.strategy {
            Strategy::RoundRobin => {
                let index = self.cursor.fetch_add(1, Ordering::Relaxed);
                Ok(self.upstreams.cyclic(index).clone())
            }
            Strategy::Sticky => {
                if let Some(current) = self.current.load_full() {
                    return Ok((*current).clone());
                }
                self.resolve(probe).await
            }
        }
    }

    /// Drop the cached upstream so the next `acquire` re-probes.
    /// No-op in round-robin mode, where failure is discovered per call.
    pub fn invalidate(&self) {
        if self.strategy == Strategy::Sticky {
            self.current.store(None);
        }
    }

    async fn resolve<P: HealthProbe>(&self, probe: &P) -> Result<Url, ProxyError> {
        for candidate in self.upstreams.iter() {
            if probe.check(candidate).await.is_up() {
                tracing::info!(upstream = %base_label(candidate), "Using upstream base");
                self.current.store(Some(Arc::new(candidate.clone())));
                return Ok(candidate.clone());
            }
        }
        Err(ProxyError::ResolutionFailed {
            tried: self.upstreams.labels(),
        })
    }
}
