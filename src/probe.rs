use std::io;
use std::mem::MaybeUninit;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use crate::error::{Result, TraceError};
use crate::hop::ProbeOutcome;
use crate::packet;
use crate::resolver::AddressFamily;
use crate::session::Target;

const RECV_BUFFER_SIZE: usize = 1500;

/// A single echo probe to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRequest {
    pub target: Target,
    pub hop_limit: u8,
    pub payload_size: usize,
    pub timeout: Duration,
}

/// What came back for one probe, timed from just before the send until the
/// reply (or the deadline) was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReply {
    pub outcome: ProbeOutcome,
    pub elapsed: Duration,
}

/// Sends one probe and waits for whatever comes back within the timeout.
pub trait NetworkProbe {
    fn probe(&mut self, request: &ProbeRequest) -> Result<ProbeReply>;
}

/// Echo probes over a raw ICMP or ICMPv6 socket.
#[derive(Debug)]
pub struct IcmpProbe {
    socket: Socket,
    family: AddressFamily,
    identifier: u16,
    sequence: u16,
}

impl IcmpProbe {
    pub fn new(family: AddressFamily) -> Result<Self> {
        let (domain, protocol) = match family {
            AddressFamily::V4 => (Domain::IPV4, Protocol::ICMPV4),
            AddressFamily::V6 => (Domain::IPV6, Protocol::ICMPV6),
        };
        let socket = Socket::new(domain, Type::RAW, Some(protocol)).map_err(TraceError::Socket)?;
        Ok(Self {
            socket,
            family,
            identifier: std::process::id() as u16,
            sequence: 0,
        })
    }

    fn set_hop_limit(&self, hop_limit: u8) -> io::Result<()> {
        match self.family {
            AddressFamily::V4 => self.socket.set_ttl(u32::from(hop_limit)),
            AddressFamily::V6 => self.socket.set_unicast_hops_v6(u32::from(hop_limit)),
        }
    }

    fn classify(&self, buf: &[u8], from: IpAddr) -> Option<ProbeOutcome> {
        match self.family {
            AddressFamily::V4 => packet::classify_v4(buf, from, self.identifier, self.sequence),
            AddressFamily::V6 => packet::classify_v6(buf, from, self.identifier, self.sequence),
        }
    }

    /// Reads until a reply to the current sequence arrives or the deadline passes.
    fn await_reply(&self, deadline: Instant) -> Result<ProbeOutcome> {
        let mut buf = [MaybeUninit::<u8>::uninit(); RECV_BUFFER_SIZE];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(ProbeOutcome::NoReply);
            }
            self.socket
                .set_read_timeout(Some(remaining))
                .map_err(TraceError::Receive)?;
            let (len, from) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    return Ok(ProbeOutcome::NoReply);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TraceError::Receive(e)),
            };
            // SAFETY: recv_from initialised the first `len` bytes of `buf`.
            let bytes = unsafe { std::slice::from_raw_parts(buf.as_ptr().cast::<u8>(), len) };
            let Some(from) = from.as_socket().map(|addr| addr.ip()) else {
                continue;
            };
            match self.classify(bytes, from) {
                Some(outcome) => return Ok(outcome),
                None => log::trace!("ignoring unrelated ICMP message from {from}"),
            }
        }
    }
}

impl NetworkProbe for IcmpProbe {
    fn probe(&mut self, request: &ProbeRequest) -> Result<ProbeReply> {
        let addr = request.target.addr();
        if AddressFamily::of(&addr) != self.family {
            return Err(TraceError::Send(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{addr} is not an {} address", self.family),
            )));
        }
        self.sequence = self.sequence.wrapping_add(1);
        let echo = packet::build_echo_request(self.family, self.identifier, self.sequence, request.payload_size);
        self.set_hop_limit(request.hop_limit).map_err(TraceError::Send)?;

        let dest = SockAddr::from(SocketAddr::new(addr, 0));
        let sent = Instant::now();
        self.socket.send_to(&echo, &dest).map_err(TraceError::Send)?;
        log::debug!(
            "sent echo {}/{} to {addr} with hop limit {}",
            self.identifier,
            self.sequence,
            request.hop_limit
        );
        let outcome = self.await_reply(sent + request.timeout)?;
        let elapsed = sent.elapsed();
        log::debug!("echo {}/{}: {outcome:?} after {elapsed:?}", self.identifier, self.sequence);
        Ok(ProbeReply { outcome, elapsed })
    }
}
