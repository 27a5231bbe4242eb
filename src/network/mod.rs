//! Network module: the Gateway (listener) and per-connection supervisors.

mod connection;
mod gateway;

pub use connection::Connection;
pub use gateway::Gateway;
