//! Wire format parsing.
//!
//! Messages arrive as a single buffer of `key|header|message`. The first two
//! delimiters are structural; everything after the second one is the message
//! body and may itself contain delimiter bytes (greedy capture, never
//! re-split). Writers that need `|` inside key or header are out of luck —
//! that is the protocol contract.

/// Field delimiter on the wire.
pub const DELIMITER: u8 = b'|';

/// Receive buffer capacity, shared by all transports.
pub const BUFFER_SIZE: usize = 1024;

/// Maximum bytes read per receive call (one slot reserved, matching the
/// original protocol's terminator byte).
pub const MAX_MESSAGE_SIZE: usize = BUFFER_SIZE - 1;

/// Maximum key length in bytes; longer keys are truncated.
pub const MAX_KEY_LEN: usize = 255;

/// Maximum header length in bytes; longer headers are truncated.
pub const MAX_HEADER_LEN: usize = 1023;

/// A message split into its three wire fields.
///
/// Borrows from the receive buffer, so a `ParsedMessage` is only valid until
/// the buffer is refilled.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedMessage<'a> {
    /// Record key (first segment).
    pub key: &'a [u8],
    /// Custom header value (second segment).
    pub header: &'a [u8],
    /// Message body (remainder after the second delimiter).
    pub message: Option<&'a [u8]>,
}

impl ParsedMessage<'_> {
    /// A message is usable only when all three fields are present and
    /// non-empty. Anything else must be discarded before reaching the sink.
    pub fn is_well_formed(&self) -> bool {
        !self.key.is_empty()
            && !self.header.is_empty()
            && self.message.is_some_and(|m| !m.is_empty())
    }
}

/// Split a raw buffer into key, header, and message.
///
/// Pure and infallible: missing segments are left empty/absent, and the
/// caller decides via [`ParsedMessage::is_well_formed`]. Key and header are
/// capped at [`MAX_KEY_LEN`] / [`MAX_HEADER_LEN`] bytes.
pub fn parse(buf: &[u8]) -> ParsedMessage<'_> {
    let mut parsed = ParsedMessage {
        key: &[],
        header: &[],
        message: None,
    };

    match find_delimiter(buf) {
        Some(i) => {
            parsed.key = clamp(&buf[..i], MAX_KEY_LEN);
            let rest = &buf[i + 1..];
            match find_delimiter(rest) {
                Some(j) => {
                    parsed.header = clamp(&rest[..j], MAX_HEADER_LEN);
                    parsed.message = Some(&rest[j + 1..]);
                }
                None => parsed.header = clamp(rest, MAX_HEADER_LEN),
            }
        }
        None => parsed.key = clamp(buf, MAX_KEY_LEN),
    }

    parsed
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == DELIMITER)
}

fn clamp(field: &[u8], max: usize) -> &[u8] {
    &field[..field.len().min(max)]
}
