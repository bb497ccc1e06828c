//! The Engine.IO / Socket.IO packet codec.
//!
//! A [`Packet`] owns the raw bytes that went over (or will go over) the wire and
//! knows how to parse its own header. `json_start` is an index into the packet's own
//! buffer rather than a raw pointer, so it stays valid for as long as the packet
//! itself lives.

use crate::error::{Error, Result};

/// The low-level Engine.IO packet kind, encoded as the first byte of the wire payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EioKind {
    Open,
    Close,
    Ping,
    Pong,
    Message,
    Upgrade,
    Noop,
    /// Synthetic: the bare `ok` body a polling POST gets back, not a numbered packet.
    OkServer,
    /// Synthetic: no kind has been assigned yet.
    None,
}

impl TryFrom<u8> for EioKind {
    type Error = Error;

    fn try_from(digit: u8) -> Result<Self> {
        match digit {
            0 => Ok(EioKind::Open),
            1 => Ok(EioKind::Close),
            2 => Ok(EioKind::Ping),
            3 => Ok(EioKind::Pong),
            4 => Ok(EioKind::Message),
            5 => Ok(EioKind::Upgrade),
            6 => Ok(EioKind::Noop),
            other => Err(Error::Protocol(format!(
                "unknown engine.io packet kind digit {other}"
            ))),
        }
    }
}

impl EioKind {
    fn to_digit(self) -> Option<u8> {
        match self {
            EioKind::Open => Some(0),
            EioKind::Close => Some(1),
            EioKind::Ping => Some(2),
            EioKind::Pong => Some(3),
            EioKind::Message => Some(4),
            EioKind::Upgrade => Some(5),
            EioKind::Noop => Some(6),
            EioKind::OkServer | EioKind::None => None,
        }
    }
}

/// The Socket.IO packet kind, only meaningful when [`EioKind::Message`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SioKind {
    Connect,
    Disconnect,
    Event,
    Ack,
    ConnectError,
    BinaryEvent,
    BinaryAck,
    None,
}

impl TryFrom<u8> for SioKind {
    type Error = Error;

    fn try_from(digit: u8) -> Result<Self> {
        match digit {
            0 => Ok(SioKind::Connect),
            1 => Ok(SioKind::Disconnect),
            2 => Ok(SioKind::Event),
            3 => Ok(SioKind::Ack),
            4 => Ok(SioKind::ConnectError),
            5 => Ok(SioKind::BinaryEvent),
            6 => Ok(SioKind::BinaryAck),
            other => Err(Error::Protocol(format!(
                "unknown socket.io packet kind digit {other}"
            ))),
        }
    }
}

impl SioKind {
    fn to_digit(self) -> Option<u8> {
        match self {
            SioKind::Connect => Some(0),
            SioKind::Disconnect => Some(1),
            SioKind::Event => Some(2),
            SioKind::Ack => Some(3),
            SioKind::ConnectError => Some(4),
            SioKind::BinaryEvent => Some(5),
            SioKind::BinaryAck => Some(6),
            SioKind::None => None,
        }
    }
}

/// One Engine.IO frame, possibly carrying a Socket.IO payload.
///
/// The packet exclusively owns its buffer; there is no separate "free" step, the
/// packet is simply dropped.
#[derive(Debug, Clone)]
pub struct Packet {
    pub eio_kind: EioKind,
    pub sio_kind: SioKind,
    data: Vec<u8>,
    json_start: Option<usize>,
}

impl Packet {
    /// Parse a freshly received buffer into a packet, populating `eio_kind`, `sio_kind`
    /// and `json_start`.
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Protocol("packet length is less than 1".into()));
        }

        if data.len() == 2 && data[0] == b'o' && data[1] == b'k' {
            return Ok(Packet {
                eio_kind: EioKind::OkServer,
                sio_kind: SioKind::None,
                data,
                json_start: None,
            });
        }

        let eio_digit = data[0].checked_sub(b'0').ok_or_else(|| {
            Error::Protocol(format!("packet indicator byte {:#x} out of range", data[0]))
        })?;
        let eio_kind = EioKind::try_from(eio_digit)?;

        let mut sio_kind = SioKind::None;
        let mut json_start = None;

        if data.len() > 2 {
            match eio_kind {
                EioKind::Open => json_start = Some(1),
                EioKind::Message => {
                    let sio_digit = data[1].checked_sub(b'0').ok_or_else(|| {
                        Error::Protocol(format!(
                            "socket.io indicator byte {:#x} out of range",
                            data[1]
                        ))
                    })?;
                    sio_kind = SioKind::try_from(sio_digit)?;
                    json_start = data[2..]
                        .iter()
                        .position(|&b| b == b'{' || b == b'[')
                        .map(|i| i + 2);
                }
                _ => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("unhandled packet kind {:?} with trailing data", eio_kind);
                }
            }
        }

        Ok(Packet {
            eio_kind,
            sio_kind,
            data,
            json_start,
        })
    }

    /// Build a Socket.IO event message: `42["event",json]` or `42json` if no event name
    /// is given.
    pub fn event(event_name: Option<&str>, json_body: &str) -> Self {
        let data = match event_name {
            Some(name) => format!("42[\"{name}\",{json_body}]").into_bytes(),
            None => format!("42{json_body}").into_bytes(),
        };
        // json_start points past "42" or past the `["name",` prefix; recomputed via parse
        // logic so it stays in sync with the rules above.
        let json_start = data[2..]
            .iter()
            .position(|&b| b == b'{' || b == b'[')
            .map(|i| i + 2);
        Packet {
            eio_kind: EioKind::Message,
            sio_kind: SioKind::Event,
            data,
            json_start,
        }
    }

    /// Build a Socket.IO `Connect` packet: `40` followed by an optional auth JSON body.
    pub fn connect(auth_json: &str) -> Self {
        let data = format!("40{auth_json}").into_bytes();
        let json_start = if auth_json.is_empty() { None } else { Some(2) };
        Packet {
            eio_kind: EioKind::Message,
            sio_kind: SioKind::Connect,
            data,
            json_start,
        }
    }

    /// Build a two-byte control packet (`Ping`, `Pong` or `Close`).
    pub fn control(kind: EioKind) -> Self {
        let digit = kind.to_digit().expect("control packets have a digit form");
        Packet {
            eio_kind: kind,
            sio_kind: SioKind::None,
            data: vec![digit + b'0'],
            json_start: None,
        }
    }

    /// Rewrite the Engine.IO kind in place, updating both the field and `data[0]`.
    pub fn set_eio_kind(&mut self, kind: EioKind) {
        if let Some(digit) = kind.to_digit() {
            if self.data.is_empty() {
                self.data.push(digit + b'0');
            } else {
                self.data[0] = digit + b'0';
            }
        }
        self.eio_kind = kind;
    }

    /// Rewrite the Socket.IO kind in place. Only valid when `eio_kind == Message`;
    /// otherwise this is a no-op that returns an error.
    pub fn set_sio_kind(&mut self, kind: SioKind) -> Result<()> {
        if self.eio_kind != EioKind::Message {
            return Err(Error::InvalidOperation(
                "set_sio_kind requires eio_kind == Message",
            ));
        }
        let digit = kind
            .to_digit()
            .ok_or(Error::InvalidOperation("SioKind::None has no digit form"))?;
        if self.data.len() < 2 {
            return Err(Error::InvalidOperation(
                "packet buffer too short to carry a socket.io kind",
            ));
        }
        self.data[1] = digit + b'0';
        self.sio_kind = kind;
        Ok(())
    }

    /// The raw on-wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The JSON payload, if this packet carries one.
    pub fn json(&self) -> Option<&str> {
        let start = self.json_start?;
        std::str::from_utf8(&self.data[start..]).ok()
    }
}
