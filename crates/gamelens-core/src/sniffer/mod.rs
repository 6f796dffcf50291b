//! Per-packet loop tying a packet source to the dissector.
//!
//! The sniffer owns the transport concerns the dissector is shielded from:
//! it extracts TCP segments, keeps only the ones whose endpoints match the
//! configured game server, resolves the role of each payload from the source
//! address, drops empty payloads, and writes the dissected lines to the
//! output stream.

pub mod tcp;

use std::io::Write;

use thiserror::Error;

use crate::dissect::{Dissector, Role};
use crate::settings::Settings;
use crate::source::{PacketSource, SourceError};

use tcp::parse_tcp_segment;

#[derive(Debug, Error)]
pub enum SnifferError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters for one sniffer run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SniffStats {
    /// Frames read from the source.
    pub packets_total: u64,
    /// Payloads that matched the server and were handed to the dissector.
    pub payloads_dissected: u64,
}

pub struct Sniffer {
    settings: Settings,
    color: bool,
}

impl Sniffer {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Drain the source, dissecting every matching payload in capture order.
    ///
    /// Frames that fail to slice are skipped: a capture can legitimately
    /// contain truncated or non-IP frames next to the game traffic.
    pub fn run<S: PacketSource, W: Write>(
        &self,
        source: &mut S,
        out: &mut W,
    ) -> Result<SniffStats, SnifferError> {
        let server = &self.settings.server;
        let dissector = Dissector::new(self.settings.game.as_ref()).with_color(self.color);
        let mut stats = SniffStats::default();

        while let Some(event) = source.next_packet()? {
            stats.packets_total += 1;
            let Ok(Some(segment)) = parse_tcp_segment(event.linktype, &event.data) else {
                continue;
            };

            let from_server = segment.src_ip == server.host && segment.src_port == server.port;
            let to_server = segment.dst_ip == server.host && segment.dst_port == server.port;
            let role = match (from_server, to_server) {
                (true, _) => Role::Host,
                (_, true) => Role::Node,
                _ => continue,
            };
            if segment.payload.is_empty() {
                continue;
            }

            stats.payloads_dissected += 1;
            for line in dissector.dissect(segment.payload, role) {
                writeln!(out, "{line}")?;
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::{SniffStats, Sniffer};
    use crate::settings::Settings;
    use crate::source::{PacketEvent, PacketSource, SourceError};
    use etherparse::PacketBuilder;
    use pcap_parser::Linktype;

    struct VecSource(Vec<PacketEvent>);

    impl PacketSource for VecSource {
        fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
            if self.0.is_empty() {
                Ok(None)
            } else {
                Ok(Some(self.0.remove(0)))
            }
        }
    }

    const SETTINGS: &str = "
Server:
  host: 10.1.1.1
  port: 6900
Game:
  host:
    actions:
      9:
        title: Pong
  node:
    actions:
      9:
        title: Ping
";

    fn settings() -> Settings {
        serde_yaml_ng::from_str(SETTINGS).unwrap()
    }

    fn tcp_frame(src: [u8; 4], src_port: u16, dst: [u8; 4], dst_port: u16, payload: &[u8]) -> PacketEvent {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4(src, dst, 64)
            .tcp(src_port, dst_port, 0, 0);
        let mut data = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut data, payload).unwrap();
        PacketEvent {
            linktype: Linktype::ETHERNET,
            data,
        }
    }

    #[test]
    fn roles_follow_the_server_address() {
        let mut source = VecSource(vec![
            tcp_frame([10, 1, 1, 1], 6900, [10, 1, 1, 2], 49152, &[0x09, 0x00]),
            tcp_frame([10, 1, 1, 2], 49152, [10, 1, 1, 1], 6900, &[0x09, 0x00]),
        ]);
        let sniffer = Sniffer::new(settings()).with_color(false);
        let mut out = Vec::new();
        let stats = sniffer.run(&mut source, &mut out).unwrap();

        assert_eq!(
            stats,
            SniffStats {
                packets_total: 2,
                payloads_dissected: 2
            }
        );
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<-- Pong |\n--> Ping |\n"
        );
    }

    #[test]
    fn unrelated_traffic_is_filtered_out() {
        let mut source = VecSource(vec![
            // Wrong host.
            tcp_frame([10, 9, 9, 9], 6900, [10, 1, 1, 2], 49152, &[0x09, 0x00]),
            // Wrong port.
            tcp_frame([10, 1, 1, 1], 80, [10, 1, 1, 2], 49152, &[0x09, 0x00]),
        ]);
        let sniffer = Sniffer::new(settings()).with_color(false);
        let mut out = Vec::new();
        let stats = sniffer.run(&mut source, &mut out).unwrap();

        assert_eq!(stats.packets_total, 2);
        assert_eq!(stats.payloads_dissected, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn empty_payloads_never_reach_the_dissector() {
        let mut source = VecSource(vec![tcp_frame(
            [10, 1, 1, 1],
            6900,
            [10, 1, 1, 2],
            49152,
            &[],
        )]);
        let sniffer = Sniffer::new(settings()).with_color(false);
        let mut out = Vec::new();
        let stats = sniffer.run(&mut source, &mut out).unwrap();

        assert_eq!(stats.payloads_dissected, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn malformed_frames_are_skipped() {
        let mut source = VecSource(vec![
            PacketEvent {
                linktype: Linktype::ETHERNET,
                data: vec![0x01, 0x02],
            },
            tcp_frame([10, 1, 1, 1], 6900, [10, 1, 1, 2], 49152, &[0x09, 0x00]),
        ]);
        let sniffer = Sniffer::new(settings()).with_color(false);
        let mut out = Vec::new();
        let stats = sniffer.run(&mut source, &mut out).unwrap();

        assert_eq!(stats.packets_total, 2);
        assert_eq!(stats.payloads_dissected, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "<-- Pong |\n");
    }
}
