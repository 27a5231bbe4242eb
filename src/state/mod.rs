//! Shared server state.

mod channel;
mod directory;
mod uid;
mod user;

pub use channel::{Channel, ChannelModes, ListEntry, MemberModes, Topic};
pub use directory::{
    Directory, InviteOutcome, JoinOutcome, KickOutcome, ModeOutcome, PartOutcome, ServerInfo,
    TopicOutcome,
};
pub use uid::{Uid, UidGenerator};
pub use user::User;
