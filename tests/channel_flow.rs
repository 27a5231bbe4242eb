//! Integration tests for channel flows: JOIN, PRIVMSG, PART fan-out.

mod common;

use common::{TestClient, TestServer};
use wren_proto::Command;

#[tokio::test]
async fn channel_privmsg_reaches_members() {
    let server = TestServer::spawn(17651).await.expect("spawn server");

    let mut alice = TestClient::connect(&server.address(), "alice")
        .await
        .expect("connect alice");
    let mut bob = TestClient::connect(&server.address(), "bob")
        .await
        .expect("connect bob");
    alice.register().await.expect("register alice");
    bob.register().await.expect("register bob");

    alice.join("#test").await.expect("alice join");
    bob.join("#test").await.expect("bob join");

    alice
        .send_raw("PRIVMSG #test :hello from alice")
        .await
        .unwrap();

    let messages = bob
        .recv_until(|m| {
            matches!(&m.command, Command::PRIVMSG(t, x) if t == "#test" && x.contains("hello"))
        })
        .await
        .expect("bob receives PRIVMSG");
    assert_eq!(messages.last().unwrap().source_nickname(), Some("alice"));
}

#[tokio::test]
async fn join_is_broadcast_to_existing_members() {
    let server = TestServer::spawn(17652).await.expect("spawn server");

    let mut alice = TestClient::connect(&server.address(), "alice")
        .await
        .expect("connect");
    let mut bob = TestClient::connect(&server.address(), "bob")
        .await
        .expect("connect");
    alice.register().await.expect("register");
    bob.register().await.expect("register");

    alice.join("#room").await.expect("join");
    bob.join("#room").await.expect("join");

    let messages = alice
        .recv_until(|m| {
            matches!(&m.command, Command::JOIN(c, _) if c == "#room")
                && m.source_nickname() == Some("bob")
        })
        .await
        .expect("join broadcast");
    assert!(!messages.is_empty());
}

#[tokio::test]
async fn part_is_broadcast_and_channel_is_recreated_fresh() {
    let server = TestServer::spawn(17653).await.expect("spawn server");

    let mut alice = TestClient::connect(&server.address(), "alice")
        .await
        .expect("connect");
    let mut bob = TestClient::connect(&server.address(), "bob")
        .await
        .expect("connect");
    alice.register().await.expect("register");
    bob.register().await.expect("register");

    alice.join("#room").await.expect("join");
    bob.join("#room").await.expect("join");

    bob.send_raw("PART #room :off").await.unwrap();
    alice
        .recv_until(|m| {
            matches!(&m.command, Command::PART(c, _) if c == "#room")
                && m.source_nickname() == Some("bob")
        })
        .await
        .expect("part broadcast");

    // Alice leaves too; the empty channel is deleted. Rejoining makes
    // bob the fresh operator.
    alice.send_raw("PART #room").await.unwrap();
    bob.join("#room").await.expect("rejoin");
    bob.send_raw("NAMES #room").await.unwrap();
    let messages = bob.recv_until_code(353).await.expect("names");
    assert!(messages.last().unwrap().to_string().contains("@bob"));
}

#[tokio::test]
async fn abrupt_disconnect_broadcasts_quit_and_frees_nick() {
    let server = TestServer::spawn(17654).await.expect("spawn server");

    let mut alice = TestClient::connect(&server.address(), "alice")
        .await
        .expect("connect");
    let bob = TestClient::connect(&server.address(), "bob").await;
    let mut bob = bob.expect("connect");
    alice.register().await.expect("register");
    bob.register().await.expect("register");

    alice.join("#room").await.expect("join");
    bob.join("#room").await.expect("join");

    // Bob's transport closes without a QUIT.
    drop(bob);

    alice
        .recv_until(|m| {
            matches!(&m.command, Command::QUIT(_)) && m.source_nickname() == Some("bob")
        })
        .await
        .expect("quit broadcast");

    // The nickname is free again.
    let mut bob2 = TestClient::connect(&server.address(), "bob")
        .await
        .expect("reconnect");
    bob2.register().await.expect("re-register with freed nick");
}
