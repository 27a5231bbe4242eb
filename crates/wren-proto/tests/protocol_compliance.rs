//! Cross-module behavior of the protocol crate: parsing, numerics,
//! mode deltas, and framing working together.

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use wren_proto::mode::{ChannelMode, Mode};
use wren_proto::{
    format_modes, irc_eq, is_valid_nick, ChannelExt, Command, LineCodec, Message, Prefix, Response,
};

#[test]
fn full_registration_exchange_parses() {
    let lines = [
        "NICK alice",
        "USER alice 0 * :Alice A",
        ":irc.wren.local 001 alice :Welcome to the WrenNet IRC Network alice!alice@127.0.0.1",
    ];

    let msgs: Vec<Message> = lines.iter().map(|l| l.parse().unwrap()).collect();
    assert_eq!(msgs[0].command, Command::NICK("alice".into()));
    assert!(matches!(msgs[1].command, Command::USER(_, _, _)));
    assert_eq!(msgs[2].response(), Some(Response::RPL_WELCOME));
    assert_eq!(
        msgs[2].prefix,
        Some(Prefix::ServerName("irc.wren.local".into()))
    );
}

#[test]
fn pipelined_buffer_decodes_to_ordered_lines() {
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::from(
        "PASS hunter2\r\nNICK alice\r\nUSER alice 0 * :Alice A\r\nJOIN #wren",
    );

    let mut lines = Vec::new();
    while let Some(line) = codec.decode(&mut buf).unwrap() {
        lines.push(line);
    }
    // The unterminated tail only surfaces at EOF.
    assert_eq!(lines.len(), 3);
    let tail = codec.decode_eof(&mut buf).unwrap();
    assert_eq!(tail.as_deref(), Some("JOIN #wren"));

    for line in lines {
        line.parse::<Message>().expect("each segment parses");
    }
}

#[test]
fn mode_delta_survives_wire_round_trip() {
    let modes = Mode::<ChannelMode>::as_channel_modes(&["+kl-t", "sesame", "7"]).unwrap();
    let msg = Message::from(Command::ChannelMODE("#wren".into(), modes.clone()));
    let wire = msg.to_string();
    assert_eq!(wire, "MODE #wren +kl-t sesame 7\r\n");

    let reparsed: Message = wire.parse().unwrap();
    match reparsed.command {
        Command::ChannelMODE(channel, parsed) => {
            assert_eq!(channel, "#wren");
            assert_eq!(parsed, modes);
        }
        other => panic!("expected ChannelMODE, got {other:?}"),
    }
}

#[test]
fn format_modes_groups_signs() {
    let modes = vec![
        Mode::Plus(ChannelMode::InviteOnly, None),
        Mode::Plus(ChannelMode::Key, Some("k".into())),
        Mode::Minus(ChannelMode::Moderated, None),
    ];
    assert_eq!(format_modes(&modes), vec!["+ik-m", "k"]);
}

#[test]
fn validation_helpers_agree_with_the_grammar() {
    assert!(is_valid_nick("WiZ-[09]"));
    assert!(!is_valid_nick("toolongnick"));
    assert!("#wren".is_channel_name());
    assert!(!"wren".is_channel_name());
    assert!(irc_eq("WiZ[1]", "wiz{1}"));
}

#[test]
fn error_numerics_render_three_digits() {
    let msg = Message {
        prefix: Some(Prefix::ServerName("irc.wren.local".into())),
        command: Command::Response(
            Response::RPL_WELCOME,
            vec!["alice".into(), "Welcome".into()],
        ),
    };
    assert!(msg.to_string().starts_with(":irc.wren.local 001 alice"));
}
