//! Out-of-order delivery: gaps in the authoritative stream and their repair

mod common;

use common::*;
use veles_client::{Client, ClientConfig};
use veles_protocol::{Message, Tick};

#[tokio::test]
async fn gap_is_requested_and_prefix_advances_once_filled() {
    let (mut server, transport) = ScriptedServer::link();
    let (clock, _target) = manual_clock(0);

    let (client, _) = tokio::join!(
        Client::connect_with_clock(TestGame, ClientConfig::new(60), transport, clock),
        server.accept(7),
    );
    let _client = client.unwrap();

    // Ticks [10, 19] arrive before anything in [1, 9].
    server
        .send(&Message::AuthInput {
            head_tick: Tick::new(10),
            auth: vec![input_map(&[(1, 1)]); 10],
            hints: vec![],
        })
        .await;

    // The prefix cannot advance past the gap.
    match server.recv_protocol().await {
        Message::Ack { tick } => assert_eq!(tick, Tick::ZERO),
        other => panic!("expected Ack, got {}", other.kind()),
    }
    match server.recv_protocol().await {
        Message::RequestAuthInput { ticks } => {
            assert_eq!(ticks, (1..=9).map(Tick::new).collect::<Vec<_>>());
        }
        other => panic!("expected RequestAuthInput, got {}", other.kind()),
    }

    // The retransmission fills the gap; the prefix attaches and advances.
    server
        .send(&Message::AuthInput {
            head_tick: Tick::new(1),
            auth: vec![input_map(&[(1, 1)]); 9],
            hints: vec![],
        })
        .await;

    match server.recv_protocol().await {
        Message::Ack { tick } => assert_eq!(tick, Tick::new(9)),
        other => panic!("expected Ack, got {}", other.kind()),
    }
}

#[tokio::test]
async fn filled_gap_lets_sampling_reach_the_newest_auth_tick() {
    let (mut server, transport) = ScriptedServer::link();
    let (clock, _target) = manual_clock(12);

    let (client, _) = tokio::join!(
        Client::connect_with_clock(TestGame, ClientConfig::new(60), transport, clock),
        server.accept(7),
    );
    let client = client.unwrap();

    server
        .send(&Message::AuthInput {
            head_tick: Tick::new(7),
            auth: vec![input_map(&[(1, 1)]); 6],
            hints: vec![],
        })
        .await;
    server
        .send(&Message::AuthInput {
            head_tick: Tick::new(1),
            auth: vec![input_map(&[(1, 1)]); 6],
            hints: vec![],
        })
        .await;
    settle().await;

    // With [1, 12] complete, the whole chain is authoritative.
    let (fresh, world) = client.sample_with_auth();
    assert_eq!(fresh.len(), 12);
    assert_eq!(world[&veles_protocol::PlayerId::new(1)], 12);
}

#[tokio::test]
async fn trailing_hints_attach_after_the_auth_block() {
    let (mut server, transport) = ScriptedServer::link();
    let (clock, _target) = manual_clock(4);

    let (client, _) = tokio::join!(
        Client::connect_with_clock(TestGame, ClientConfig::new(60), transport, clock),
        server.accept(7),
    );
    let client = client.unwrap();

    // Auth covers [1, 2]; the two hint maps speak for ticks 3 and 4.
    server
        .send(&Message::AuthInput {
            head_tick: Tick::new(1),
            auth: vec![input_map(&[(1, 10)]), input_map(&[(1, 10)])],
            hints: vec![input_map(&[(1, 1)]), input_map(&[(1, 2)])],
        })
        .await;
    settle().await;

    let (fresh, world) = client.sample_with_auth();
    assert_eq!(fresh.len(), 2);
    // 10 + 10 authoritative, then hinted 1 and 2.
    assert_eq!(world[&veles_protocol::PlayerId::new(1)], 23);
}
