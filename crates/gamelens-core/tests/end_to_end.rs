//! End-to-end run: legacy PCAP file -> source -> sniffer -> dissected lines.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use etherparse::PacketBuilder;
use gamelens_core::{PacketSource, PcapFileSource, Settings, Sniffer, SourceError};

const SETTINGS: &str = "
Server:
  host: 10.1.1.1
  port: 6900
Game:
  node:
    actions:
      125:
        title: Move
        structs:
          - type: unsigned short
            name: X
          - type: unsigned short
            name: Y
  host:
    actions:
      9:
        title: Tick
";

fn tcp_frame(src: [u8; 4], src_port: u16, dst: [u8; 4], dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
        .ipv4(src, dst, 64)
        .tcp(src_port, dst_port, 0, 0);
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

/// Minimal legacy PCAP container: global header plus one record per frame,
/// linktype Ethernet, microsecond timestamps.
fn legacy_pcap(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend_from_slice(&0i32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&65535u32.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());

    for (index, frame) in frames.iter().enumerate() {
        bytes.extend_from_slice(&(index as u32).to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        bytes.extend_from_slice(frame);
    }
    bytes
}

fn temp_path(name: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("gamelens_{name}_{unique}.pcap"))
}

#[test]
fn pcap_source_reads_every_frame() {
    let frames = vec![
        tcp_frame([10, 1, 1, 2], 49152, [10, 1, 1, 1], 6900, &[0x01]),
        tcp_frame([10, 1, 1, 1], 6900, [10, 1, 1, 2], 49152, &[0x02]),
    ];
    let path = temp_path("frames");
    fs::write(&path, legacy_pcap(&frames)).unwrap();

    let mut source = PcapFileSource::open(&path).unwrap();
    let mut packets = 0;
    while let Some(event) = source.next_packet().unwrap() {
        assert!(!event.data.is_empty());
        packets += 1;
    }
    let _ = fs::remove_file(&path);
    assert_eq!(packets, 2);
}

#[test]
fn pcap_source_rejects_truncated_file() {
    let path = temp_path("truncated");
    fs::write(&path, [0x0a, 0x0d, 0x0d]).unwrap();
    let err = match PcapFileSource::open(&path) {
        Ok(_) => panic!("expected truncated file to be rejected"),
        Err(err) => err,
    };
    let _ = fs::remove_file(&path);
    assert!(matches!(err, SourceError::Io(_)));
}

#[test]
fn capture_dissects_both_directions() {
    let frames = vec![
        // Node asks to move to (100, 200).
        tcp_frame(
            [10, 1, 1, 2],
            49152,
            [10, 1, 1, 1],
            6900,
            &[0x7d, 0x00, 0x64, 0x00, 0xc8, 0x00],
        ),
        // Chatter on another port is ignored.
        tcp_frame([10, 1, 1, 2], 49152, [10, 1, 1, 1], 80, &[0xff, 0xff]),
        // Server tick.
        tcp_frame([10, 1, 1, 1], 6900, [10, 1, 1, 2], 49152, &[0x09, 0x00]),
        // Unknown record from the server.
        tcp_frame([10, 1, 1, 1], 6900, [10, 1, 1, 2], 49152, &[0x0a, 0x00, 0x12, 0x34]),
    ];
    let path = temp_path("session");
    fs::write(&path, legacy_pcap(&frames)).unwrap();

    let settings: Settings = serde_yaml_ng::from_str(SETTINGS).unwrap();
    let mut source = PcapFileSource::open(&path).unwrap();
    let mut out = Vec::new();
    let stats = Sniffer::new(settings)
        .with_color(false)
        .run(&mut source, &mut out)
        .unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(stats.packets_total, 4);
    assert_eq!(stats.payloads_dissected, 3);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "--> Move | X 100 | Y 200 |\n\
         <-- Tick |\n\
         HOST | ID 0xa | 1234\n     |-> 0a001234\n"
    );
}
