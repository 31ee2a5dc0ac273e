use crate::config::TraceConfig;
use crate::hop::{HopResult, ProbeAttempt};
use crate::probe::{NetworkProbe, ProbeRequest};
use crate::resolver::NameLookup;
use crate::session::{Limits, ProbeSession, SessionState, Target};

/// Walks the path to a target one hop limit at a time.
///
/// The prober knows nothing about address families; everything family specific
/// happens inside the [`NetworkProbe`].
pub struct HopProber<P, L> {
    probe: P,
    lookup: L,
    config: TraceConfig,
}

impl<P: NetworkProbe, L: NameLookup> HopProber<P, L> {
    pub fn new(probe: P, lookup: L, config: TraceConfig) -> Self {
        Self {
            probe,
            lookup,
            config,
        }
    }

    /// Starts a session against `target`. Hops are probed lazily as the
    /// returned iterator is advanced.
    pub fn trace(&mut self, target: Target) -> Trace<'_, P, L> {
        let session = ProbeSession::new(target, Limits::from(&self.config));
        Trace {
            prober: self,
            session,
        }
    }

    fn probe_hop(&mut self, target: Target, hop_limit: u8) -> HopResult {
        // every attempt is sent even once the target has answered
        let attempts = (0..self.config.probes_per_hop)
            .map(|_| self.attempt(target, hop_limit))
            .collect();
        let hop = HopResult::from_attempts(hop_limit, attempts);
        let hostname = hop.address.and_then(|addr| self.lookup.reverse(addr));
        hop.with_hostname(hostname)
    }

    fn attempt(&mut self, target: Target, hop_limit: u8) -> ProbeAttempt {
        let request = ProbeRequest {
            target,
            hop_limit,
            payload_size: self.config.payload_size,
            timeout: self.config.timeout(),
        };
        match self.probe.probe(&request) {
            Ok(reply) => ProbeAttempt::new(hop_limit, reply.outcome, reply.elapsed),
            Err(e) => {
                log::warn!("probe to {} at hop {hop_limit} failed: {e}", target.addr());
                ProbeAttempt::no_reply(hop_limit)
            }
        }
    }
}

/// Lazy sequence of hop results for one session.
pub struct Trace<'a, P, L> {
    prober: &'a mut HopProber<P, L>,
    session: ProbeSession,
}

impl<P, L> Trace<'_, P, L> {
    /// Final state once the iterator is exhausted, `Probing` before that.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }
}

impl<P: NetworkProbe, L: NameLookup> Iterator for Trace<'_, P, L> {
    type Item = HopResult;

    fn next(&mut self) -> Option<HopResult> {
        let hop_limit = self.session.current_hop()?;
        let hop = self.prober.probe_hop(self.session.target(), hop_limit);
        self.session.advance(&hop);
        Some(hop)
    }
}
