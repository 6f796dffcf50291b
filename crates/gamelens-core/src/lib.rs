//! Gamelens core library: schema-driven dissection of captured game traffic.
//!
//! The pipeline is offline-first: packet sources feed the sniffer, which
//! filters TCP segments down to the configured game server and hands each
//! payload plus its role to the dissector. The dissector decodes the payload
//! record by record against the YAML-described schema and renders annotated,
//! ANSI-styled lines. New record types are supported by editing the settings
//! file alone; no per-packet parser code is involved.
//!
//! Invariants:
//! - A record's declared byte budget matches the bytes consumed exactly, or
//!   that payload's dissection fails.
//! - An unrecognized record ID is not a failure: it halts the payload and
//!   leaves the remainder unconsumed.
//! - No failure inside one dissection escapes the dissector's entry point;
//!   each renders a four-line diagnostic block and the next payload is
//!   processed normally.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use gamelens_core::{PcapFileSource, Settings, Sniffer};
//!
//! let settings = Settings::load(Path::new("settings.yml"))?;
//! let mut source = PcapFileSource::open(Path::new("capture.pcapng"))?;
//! let stats = Sniffer::new(settings).run(&mut source, &mut std::io::stdout())?;
//! eprintln!("{} payloads dissected", stats.payloads_dissected);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod dissect;
mod settings;
mod sniffer;
mod source;

pub use dissect::{
    DissectError, Dissector, MAX_RECORDS_PER_PAYLOAD, Role, Trail, style::format_table,
};
pub use settings::{
    ActionSpec, Cast, FieldSpec, GameSchema, OutputSpec, RoleSchema, ServerSettings, Settings,
    SettingsError,
};
pub use sniffer::{
    SniffStats, Sniffer, SnifferError,
    tcp::{TcpError, TcpSegment, parse_tcp_segment},
};
pub use source::{PacketEvent, PacketSource, PcapFileSource, SourceError};
