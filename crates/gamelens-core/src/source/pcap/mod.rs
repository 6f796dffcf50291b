//! PCAP/PCAPNG file source.
//!
//! Detects the container format from the magic bytes and streams packet
//! records as raw frames. Interface description blocks are tracked so each
//! frame carries the link type it was captured under.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::PcapFileSource;
