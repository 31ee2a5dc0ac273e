use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// What the network reported back for a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A forwarding node discarded the probe because its hop limit ran out.
    HopLimitExceeded(IpAddr),
    /// The destination itself answered the echo request.
    TargetReached(IpAddr),
    /// A node reported the destination unreachable for this probe.
    Unreachable(IpAddr),
    /// Nothing matching the probe arrived before the deadline.
    NoReply,
}

impl ProbeOutcome {
    /// Whether this outcome counts as a measured hop.
    pub fn is_reply(&self) -> bool {
        matches!(self, Self::HopLimitExceeded(_) | Self::TargetReached(_))
    }
}

/// One probe sent at a given hop limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttempt {
    pub hop_limit: u8,
    pub outcome: ProbeOutcome,
    /// Locally measured round trip, present only for replies.
    pub rtt: Option<Duration>,
}

impl ProbeAttempt {
    pub fn new(hop_limit: u8, outcome: ProbeOutcome, elapsed: Duration) -> Self {
        if outcome.is_reply() {
            Self::replied(hop_limit, outcome, elapsed)
        } else {
            Self {
                hop_limit,
                outcome,
                rtt: None,
            }
        }
    }

    pub fn replied(hop_limit: u8, outcome: ProbeOutcome, rtt: Duration) -> Self {
        Self {
            hop_limit,
            outcome,
            rtt: Some(rtt),
        }
    }

    pub fn no_reply(hop_limit: u8) -> Self {
        Self {
            hop_limit,
            outcome: ProbeOutcome::NoReply,
            rtt: None,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.outcome.is_reply()
    }

    pub fn responder(&self) -> Option<IpAddr> {
        match self.outcome {
            ProbeOutcome::HopLimitExceeded(addr) | ProbeOutcome::TargetReached(addr) => Some(addr),
            ProbeOutcome::Unreachable(_) | ProbeOutcome::NoReply => None,
        }
    }
}

/// All attempts made at one hop limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopResult {
    pub hop: u8,
    pub attempts: Vec<ProbeAttempt>,
    /// Address of the first attempt that got a reply.
    pub address: Option<IpAddr>,
    pub hostname: Option<String>,
}

impl HopResult {
    pub fn from_attempts(hop: u8, attempts: Vec<ProbeAttempt>) -> Self {
        let address = attempts.iter().find_map(ProbeAttempt::responder);
        Self {
            hop,
            attempts,
            address,
            hostname: None,
        }
    }

    pub fn with_hostname(mut self, hostname: Option<String>) -> Self {
        self.hostname = hostname;
        self
    }

    /// True when no attempt at this hop got a reply.
    pub fn is_timeout(&self) -> bool {
        !self.attempts.iter().any(ProbeAttempt::is_reply)
    }

    pub fn reached_target(&self) -> bool {
        self.attempts
            .iter()
            .any(|attempt| matches!(attempt.outcome, ProbeOutcome::TargetReached(_)))
    }
}

impl fmt::Display for HopResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t", self.hop)?;
        for attempt in &self.attempts {
            match attempt.rtt {
                Some(rtt) => write!(f, "{}ms\t", rtt.as_millis())?,
                None => write!(f, "*\t")?,
            }
        }
        if self.is_timeout() {
            return write!(f, "Request timeout.");
        }
        match (&self.hostname, self.address) {
            (Some(name), Some(addr)) => write!(f, "{name} [{addr}]"),
            (None, Some(addr)) => write!(f, "{addr}"),
            _ => Ok(()),
        }
    }
}
