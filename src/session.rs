use std::net::IpAddr;
use crate::config::TraceConfig;
use crate::hop::HopResult;
use crate::resolver::AddressFamily;

/// The destination of a probing run.
///
/// Family specific handling lives in the probe, never in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target(IpAddr);

impl Target {
    pub fn new(addr: IpAddr) -> Self {
        Self(addr)
    }

    pub fn addr(&self) -> IpAddr {
        self.0
    }

    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.0)
    }
}

impl From<IpAddr> for Target {
    fn from(addr: IpAddr) -> Self {
        Self(addr)
    }
}

/// Where a Probe Session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Next hop to probe and how many fully timed out hops preceded it.
    Probing {
        hop_limit: u8,
        consecutive_timeouts: usize,
    },
    /// The target answered at this hop.
    Success { hop: u8 },
    /// Gave up after too many consecutive timed out hops, the last being `hop`.
    Aborted { hop: u8, consecutive_timeouts: usize },
    /// Ran out of hops without reaching the target.
    Exhausted { max_hops: u8 },
}

impl SessionState {
    pub fn initial() -> Self {
        Self::Probing {
            hop_limit: 1,
            consecutive_timeouts: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Probing { .. })
    }
}

/// Stop conditions for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_hops: u8,
    pub max_consecutive_timeouts: usize,
}

impl From<&TraceConfig> for Limits {
    fn from(config: &TraceConfig) -> Self {
        Self {
            max_hops: config.max_hops,
            max_consecutive_timeouts: config.max_consecutive_timeouts,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&TraceConfig::default())
    }
}

/// Computes the state following `hop`.
///
/// Terminal states are absorbing. A hop reaching the target wins over every
/// other rule, then the consecutive timeout rule, then the hop ceiling.
pub fn next(state: SessionState, hop: &HopResult, limits: Limits) -> SessionState {
    let SessionState::Probing {
        hop_limit,
        consecutive_timeouts,
    } = state
    else {
        return state;
    };
    debug_assert_eq!(hop.hop, hop_limit);

    if hop.reached_target() {
        return SessionState::Success { hop: hop_limit };
    }
    let consecutive_timeouts = if hop.is_timeout() {
        consecutive_timeouts + 1
    } else {
        0
    };
    if consecutive_timeouts >= limits.max_consecutive_timeouts {
        return SessionState::Aborted {
            hop: hop_limit,
            consecutive_timeouts,
        };
    }
    if hop_limit >= limits.max_hops {
        return SessionState::Exhausted {
            max_hops: limits.max_hops,
        };
    }
    SessionState::Probing {
        hop_limit: hop_limit + 1,
        consecutive_timeouts,
    }
}

/// One probing run against a single target.
#[derive(Debug, Clone)]
pub struct ProbeSession {
    target: Target,
    state: SessionState,
    limits: Limits,
}

impl ProbeSession {
    pub fn new(target: Target, limits: Limits) -> Self {
        Self {
            target,
            state: SessionState::initial(),
            limits,
        }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The hop limit to probe next, if the session is still running.
    pub fn current_hop(&self) -> Option<u8> {
        match self.state {
            SessionState::Probing { hop_limit, .. } => Some(hop_limit),
            _ => None,
        }
    }

    pub fn advance(&mut self, hop: &HopResult) -> SessionState {
        let next_state = next(self.state, hop, self.limits);
        log::debug!(
            "session {}: hop {} {:?} -> {:?}",
            self.target.addr(),
            hop.hop,
            self.state,
            next_state
        );
        self.state = next_state;
        next_state
    }
}
