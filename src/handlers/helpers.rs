//! Common reply builders shared across handlers.

use wren_proto::{Command, Message, Prefix, Response};

/// A numeric reply carrying the server name as its prefix.
pub fn server_reply(server_name: &str, response: Response, params: Vec<String>) -> Message {
    Message {
        prefix: Some(Prefix::ServerName(server_name.to_string())),
        command: Command::Response(response, params),
    }
}

/// ERR_UNKNOWNCOMMAND (421).
pub fn err_unknowncommand(server_name: &str, nick: &str, command: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_UNKNOWNCOMMAND,
        vec![
            nick.to_string(),
            command.to_string(),
            "Unknown command".to_string(),
        ],
    )
}

/// RPL_AWAY (301) relayed to a sender whose target is away.
pub fn rpl_away(server_name: &str, nick: &str, target: &str, away_text: &str) -> Message {
    server_reply(
        server_name,
        Response::RPL_AWAY,
        vec![
            nick.to_string(),
            target.to_string(),
            away_text.to_string(),
        ],
    )
}
