//! Transports feeding lines into sessions
//!
//! Both run the same cycle per line: [`process_line`](crate::resolver::process_line),
//! flush the session output, and check the shared run flag before the next
//! read. Handlers always run on the transport's own thread of control.
//!
//! Input is read as raw bytes. Invalid UTF-8 is replaced rather than
//! rejected, so a garbled line (telnet negotiation, a stray Latin-1 byte)
//! fails like any other unknown command and the session carries on.

use std::borrow::Cow;

pub mod local;
pub mod server;

pub use local::{run_local, run_session, run_with};
pub use server::LineServer;

/// Decode one raw input line without its `\n` / `\r\n` terminator
pub(crate) fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let end = raw
        .iter()
        .rposition(|byte| !matches!(byte, b'\n' | b'\r'))
        .map_or(0, |idx| idx + 1);
    String::from_utf8_lossy(&raw[..end])
}
