//! The multi-packet framer: splits and joins the record-separator-delimited payload
//! used by the long-polling transport.

use crate::error::Result;
use crate::packet::Packet;

/// The byte that delimits concatenated packets within one polling response body.
///
/// Real Engine.IO servers use `0x1E` (ASCII record separator), which is the default
/// here. Override this constant (or re-export a differently-valued one from your own
/// crate) if the server you're pairing with emits a different delimiter.
pub const RECORD_SEPARATOR: u8 = 0x1E;

/// An ordered, owned sequence of packets produced by one polling response.
pub type Batch = Vec<Packet>;

/// Parse a freshly received, possibly multi-packet response body into a batch.
///
/// An empty body, or a body with no delimiter at all, yields an empty batch rather
/// than an error — the caller decides whether that's a problem.
pub fn parse_batch(mut body: Vec<u8>) -> Result<Batch> {
    if body.last() != Some(&RECORD_SEPARATOR) {
        body.push(RECORD_SEPARATOR);
    }

    let mut batch = Batch::new();
    let mut start = 0;
    for (i, &b) in body.iter().enumerate() {
        if b == RECORD_SEPARATOR {
            if i > start {
                let packet = Packet::parse(body[start..i].to_vec())?;
                batch.push(packet);
            }
            start = i + 1;
        }
    }
    Ok(batch)
}

/// Join a batch of outbound packets into one record-separator-delimited body, the
/// inverse of [`parse_batch`]. The polling POST path in this crate only ever sends one
/// packet at a time; this is kept symmetric with the parse half for transport variants
/// that batch sends.
pub fn join_batch(batch: &[Packet]) -> Vec<u8> {
    let mut body = Vec::new();
    for (i, packet) in batch.iter().enumerate() {
        if i > 0 {
            body.push(RECORD_SEPARATOR);
        }
        body.extend_from_slice(packet.as_bytes());
    }
    body
}
