//! TCP segment extraction
//!
//! This module provides the `Segment` struct, the unit the decoder consumes:
//! addresses, ports, sequence and acknowledgment numbers and the TCP payload
//! of one captured packet.
//!
//! Frames may be Ethernet frames (pcap on Linux) or raw IP packets (pktmon on
//! Windows); both IPv4 and IPv6 are supported.

use core::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::SystemTime;

const ETHERNET_HEADER_LEN: usize = 14;
const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86DD;
const IPPROTO_TCP: u8 = 6;
const IPV6_HEADER_LEN: usize = 40;
const TCP_MIN_HEADER_LEN: usize = 20;

/// One TCP segment as seen by the capture layer. The payload borrows from the
/// captured frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub src_addr: Option<IpAddr>,
    pub dst_addr: Option<IpAddr>,
    pub src_port: u16,
    pub dst_port: u16,
    pub seq_num: u32,
    pub ack_num: u32,
    pub timestamp: SystemTime,
    pub payload: &'a [u8],
}

impl<'a> Segment<'a> {
    /// Parse a segment from a captured frame.
    /// Handles both Ethernet frames and raw IP packets.
    #[must_use]
    pub fn from_packet(packet: &'a [u8], timestamp: SystemTime) -> Option<Self> {
        // Try parsing as Ethernet frame first (pcap format)
        if let Some(segment) = Self::from_ethernet_frame(packet, timestamp) {
            return Some(segment);
        }

        // Try parsing as raw IP packet (pktmon format)
        Self::from_ip_packet(packet, timestamp)
    }

    /// Parse from Ethernet frame (14-byte Ethernet header + IP packet)
    #[must_use]
    pub fn from_ethernet_frame(packet: &'a [u8], timestamp: SystemTime) -> Option<Self> {
        if packet.len() < ETHERNET_HEADER_LEN {
            return None;
        }

        // Ethernet header: [6 bytes dst MAC][6 bytes src MAC][2 bytes EtherType]
        let ethertype = u16::from_be_bytes([packet[12], packet[13]]);
        let ip_packet = &packet[ETHERNET_HEADER_LEN..];

        match ethertype {
            ETHERTYPE_IPV4 => Self::from_ipv4_packet(ip_packet, timestamp),
            ETHERTYPE_IPV6 => Self::from_ipv6_packet(ip_packet, timestamp),
            _ => None,
        }
    }

    /// Parse from raw IP packet (no Ethernet header)
    #[must_use]
    pub fn from_ip_packet(packet: &'a [u8], timestamp: SystemTime) -> Option<Self> {
        let version = *packet.first()? >> 4;

        match version {
            4 => Self::from_ipv4_packet(packet, timestamp),
            6 => Self::from_ipv6_packet(packet, timestamp),
            _ => None,
        }
    }

    fn from_ipv4_packet(packet: &'a [u8], timestamp: SystemTime) -> Option<Self> {
        if packet.len() < 20 || packet[0] >> 4 != 4 || packet[9] != IPPROTO_TCP {
            return None;
        }

        // IHL is in 32-bit words
        let ihl = usize::from(packet[0] & 0x0F) * 4;
        // Total length excludes any Ethernet padding after the datagram
        let total_len = usize::from(u16::from_be_bytes([packet[2], packet[3]]));
        if ihl < 20 || total_len < ihl || packet.len() < total_len {
            return None;
        }

        let src_addr = Ipv4Addr::new(packet[12], packet[13], packet[14], packet[15]);
        let dst_addr = Ipv4Addr::new(packet[16], packet[17], packet[18], packet[19]);

        Self::from_tcp(
            &packet[ihl..total_len],
            IpAddr::V4(src_addr),
            IpAddr::V4(dst_addr),
            timestamp,
        )
    }

    fn from_ipv6_packet(packet: &'a [u8], timestamp: SystemTime) -> Option<Self> {
        if packet.len() < IPV6_HEADER_LEN || packet[0] >> 4 != 6 {
            return None;
        }

        // Extension headers are not followed
        if packet[6] != IPPROTO_TCP {
            return None;
        }

        let payload_len = usize::from(u16::from_be_bytes([packet[4], packet[5]]));
        let end = IPV6_HEADER_LEN + payload_len;
        if packet.len() < end {
            return None;
        }

        let src_addr = Ipv6Addr::from(<[u8; 16]>::try_from(&packet[8..24]).ok()?);
        let dst_addr = Ipv6Addr::from(<[u8; 16]>::try_from(&packet[24..40]).ok()?);

        Self::from_tcp(
            &packet[IPV6_HEADER_LEN..end],
            IpAddr::V6(src_addr),
            IpAddr::V6(dst_addr),
            timestamp,
        )
    }

    fn from_tcp(
        tcp: &'a [u8],
        src_addr: IpAddr,
        dst_addr: IpAddr,
        timestamp: SystemTime,
    ) -> Option<Self> {
        if tcp.len() < TCP_MIN_HEADER_LEN {
            return None;
        }

        // Data offset is the upper nibble of byte 12, in 32-bit words
        let data_offset = usize::from(tcp[12] >> 4) * 4;
        if data_offset < TCP_MIN_HEADER_LEN || tcp.len() < data_offset {
            return None;
        }

        Some(Self {
            src_addr: Some(src_addr),
            dst_addr: Some(dst_addr),
            src_port: u16::from_be_bytes([tcp[0], tcp[1]]),
            dst_port: u16::from_be_bytes([tcp[2], tcp[3]]),
            seq_num: u32::from_be_bytes([tcp[4], tcp[5], tcp[6], tcp[7]]),
            ack_num: u32::from_be_bytes([tcp[8], tcp[9], tcp[10], tcp[11]]),
            timestamp,
            payload: &tcp[data_offset..],
        })
    }
}
