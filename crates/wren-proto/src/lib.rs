//! wren-proto: the IRC wire protocol for the Wren daemon.
//!
//! Provides owned message types with value-returning parsers (no
//! output-parameter plumbing), RFC 2812 numeric replies, a parsed
//! mode-delta representation, and the line codec that splits pipelined
//! command buffers into individual messages.

pub mod casemap;
pub mod chan;
pub mod command;
pub mod error;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod mode;
pub mod nick;
pub mod prefix;
pub mod response;

pub use casemap::{irc_eq, irc_to_lower};
pub use chan::ChannelExt;
pub use command::Command;
pub use error::{MessageParseError, ProtocolError};
#[cfg(feature = "tokio")]
pub use line::LineCodec;
pub use message::Message;
pub use mode::{format_modes, ChannelMode, Mode, ModeType, UserMode};
pub use nick::{is_valid_nick, NICK_MAX_LEN};
pub use prefix::Prefix;
pub use response::Response;

/// Maximum length of one IRC line on the wire, terminator included.
pub const MESSAGE_MAX_LEN: usize = 512;
