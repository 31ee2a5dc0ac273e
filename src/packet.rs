//! ICMP and ICMPv6 echo request encoding and reply classification.
//!
//! Raw IPv4 sockets hand back the IP header in front of the ICMP message while
//! raw IPv6 sockets do not, so each family has its own classifier.
use std::net::IpAddr;
use pnet_packet::icmp::{IcmpPacket, IcmpTypes};
use pnet_packet::icmpv6::{Icmpv6Packet, Icmpv6Types};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::ipv6::Ipv6Packet;
use pnet_packet::Packet;
use crate::hop::ProbeOutcome;
use crate::resolver::AddressFamily;

/// ICMP header size (type, code, checksum, identifier, sequence).
pub const ICMP_HEADER_SIZE: usize = 8;
const IPV6_HEADER_SIZE: usize = 40;
/// Bytes between the ICMP checksum and a quoted datagram in an error message.
const ERROR_UNUSED_SIZE: usize = 4;

/// Builds an echo request carrying `payload_size` bytes of data.
///
/// The ICMPv6 checksum is left zero; the kernel fills it in on raw ICMPv6 sockets.
pub fn build_echo_request(
    family: AddressFamily,
    identifier: u16,
    sequence: u16,
    payload_size: usize,
) -> Vec<u8> {
    let mut buffer = vec![0u8; ICMP_HEADER_SIZE + payload_size];
    buffer[0] = match family {
        AddressFamily::V4 => IcmpTypes::EchoRequest.0,
        AddressFamily::V6 => Icmpv6Types::EchoRequest.0,
    };
    buffer[4..6].copy_from_slice(&identifier.to_be_bytes());
    buffer[6..8].copy_from_slice(&sequence.to_be_bytes());
    for (i, byte) in buffer[ICMP_HEADER_SIZE..].iter_mut().enumerate() {
        *byte = (i & 0xFF) as u8;
    }
    if family == AddressFamily::V4 {
        let checksum = pnet_packet::util::checksum(&buffer, 1);
        buffer[2..4].copy_from_slice(&checksum.to_be_bytes());
    }
    buffer
}

/// Classifies a datagram read from a raw ICMPv4 socket.
///
/// Returns `None` for anything that is not a reply to the given echo request.
pub fn classify_v4(buf: &[u8], from: IpAddr, identifier: u16, sequence: u16) -> Option<ProbeOutcome> {
    let icmp = IcmpPacket::new(strip_ipv4_header(buf)?)?;
    match icmp.get_icmp_type() {
        IcmpTypes::EchoReply => {
            echo_matches(icmp.payload(), identifier, sequence).then_some(ProbeOutcome::TargetReached(from))
        }
        IcmpTypes::TimeExceeded => quoted_v4_matches(icmp.payload(), identifier, sequence)
            .then_some(ProbeOutcome::HopLimitExceeded(from)),
        IcmpTypes::DestinationUnreachable => quoted_v4_matches(icmp.payload(), identifier, sequence)
            .then_some(ProbeOutcome::Unreachable(from)),
        _ => None,
    }
}

/// Classifies a message read from a raw ICMPv6 socket.
pub fn classify_v6(buf: &[u8], from: IpAddr, identifier: u16, sequence: u16) -> Option<ProbeOutcome> {
    let icmp = Icmpv6Packet::new(buf)?;
    match icmp.get_icmpv6_type() {
        Icmpv6Types::EchoReply => {
            echo_matches(icmp.payload(), identifier, sequence).then_some(ProbeOutcome::TargetReached(from))
        }
        Icmpv6Types::TimeExceeded => quoted_v6_matches(icmp.payload(), identifier, sequence)
            .then_some(ProbeOutcome::HopLimitExceeded(from)),
        Icmpv6Types::DestinationUnreachable => quoted_v6_matches(icmp.payload(), identifier, sequence)
            .then_some(ProbeOutcome::Unreachable(from)),
        _ => None,
    }
}

fn strip_ipv4_header(buf: &[u8]) -> Option<&[u8]> {
    let ip = Ipv4Packet::new(buf)?;
    if ip.get_next_level_protocol() != IpNextHeaderProtocols::Icmp {
        return None;
    }
    buf.get(usize::from(ip.get_header_length()) * 4..)
}

/// `rest` is everything after the ICMP checksum: identifier, sequence, data.
fn echo_matches(rest: &[u8], identifier: u16, sequence: u16) -> bool {
    match rest {
        [id_hi, id_lo, seq_hi, seq_lo, ..] => {
            u16::from_be_bytes([*id_hi, *id_lo]) == identifier
                && u16::from_be_bytes([*seq_hi, *seq_lo]) == sequence
        }
        _ => false,
    }
}

fn quoted_v4_matches(rest: &[u8], identifier: u16, sequence: u16) -> bool {
    let Some(quoted) = rest.get(ERROR_UNUSED_SIZE..).and_then(strip_ipv4_header) else {
        return false;
    };
    IcmpPacket::new(quoted).is_some_and(|icmp| {
        icmp.get_icmp_type() == IcmpTypes::EchoRequest && echo_matches(icmp.payload(), identifier, sequence)
    })
}

fn quoted_v6_matches(rest: &[u8], identifier: u16, sequence: u16) -> bool {
    let Some(original) = rest.get(ERROR_UNUSED_SIZE..) else {
        return false;
    };
    let is_icmpv6 = Ipv6Packet::new(original)
        .is_some_and(|ip| ip.get_next_header() == IpNextHeaderProtocols::Icmpv6);
    if !is_icmpv6 {
        return false;
    }
    original
        .get(IPV6_HEADER_SIZE..)
        .and_then(Icmpv6Packet::new)
        .is_some_and(|icmp| {
            icmp.get_icmpv6_type() == Icmpv6Types::EchoRequest
                && echo_matches(icmp.payload(), identifier, sequence)
        })
}
