//! In-memory stand-ins for the network used by unit tests.
use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::IpAddr;
use std::time::Duration;
use crate::error::{Result, TraceError};
use crate::hop::ProbeOutcome;
use crate::probe::{NetworkProbe, ProbeReply, ProbeRequest};
use crate::resolver::NameLookup;

/// Plays back a fixed list of outcomes, then reports no reply forever.
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    script: VecDeque<Result<ProbeOutcome>>,
    pub requests: Vec<ProbeRequest>,
    /// Round trip reported for every reply.
    pub rtt: Duration,
}

impl ScriptedProbe {
    pub fn new(script: impl IntoIterator<Item = ProbeOutcome>) -> Self {
        Self {
            script: script.into_iter().map(Ok).collect(),
            ..Self::default()
        }
    }

    /// Scripts every attempt of a hop with the same outcome.
    pub fn hops(hops: impl IntoIterator<Item = ProbeOutcome>) -> Self {
        Self::new(hops.into_iter().flat_map(|outcome| [outcome; 3]))
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn with_rtt(mut self, rtt: Duration) -> Self {
        self.rtt = rtt;
        self
    }

    pub fn push_error(&mut self) {
        self.script.push_back(Err(TraceError::Send(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "sendto",
        ))));
    }

    pub fn max_hop_limit(&self) -> Option<u8> {
        self.requests.iter().map(|request| request.hop_limit).max()
    }
}

impl NetworkProbe for ScriptedProbe {
    fn probe(&mut self, request: &ProbeRequest) -> Result<ProbeReply> {
        self.requests.push(*request);
        let outcome = self.script.pop_front().unwrap_or(Ok(ProbeOutcome::NoReply))?;
        let elapsed = if outcome.is_reply() { self.rtt } else { request.timeout };
        Ok(ProbeReply { outcome, elapsed })
    }
}

/// Answers reverse lookups from a fixed table and counts the queries.
#[derive(Debug, Default)]
pub struct StaticLookup {
    names: HashMap<IpAddr, String>,
    pub queries: Cell<usize>,
}

impl StaticLookup {
    pub fn with(mut self, addr: IpAddr, name: &str) -> Self {
        self.names.insert(addr, name.to_string());
        self
    }
}

impl NameLookup for StaticLookup {
    fn reverse(&self, addr: IpAddr) -> Option<String> {
        self.queries.set(self.queries.get() + 1);
        self.names.get(&addr).cloned()
    }
}
