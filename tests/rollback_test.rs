//! Prediction, rollback and resync behavior end to end

mod common;

use common::*;
use std::sync::atomic::Ordering;
use veles_client::{Client, ClientConfig};
use veles_protocol::{Message, PlayerId, Tick};

#[tokio::test]
async fn authoritative_inputs_roll_back_a_hinted_prediction() {
    let (mut server, transport) = ScriptedServer::link();
    let (clock, _target) = manual_clock(5);

    let (client, _) = tokio::join!(
        Client::connect_with_clock(TestGame, ClientConfig::new(60), transport, clock),
        server.accept(7),
    );
    let client = client.unwrap();

    // Rumor: player 2 will press +1 at tick 5.
    server
        .send(&Message::HintInput {
            tick: Tick::new(5),
            player: PlayerId::new(2),
            input: TestInput(1),
        })
        .await;
    settle().await;

    let (fresh, predicted) = client.sample_with_auth();
    assert!(fresh.is_empty());
    assert_eq!(predicted[&PlayerId::new(2)], 1);

    // The server finalizes tick 5 with the opposite input.
    server
        .send(&Message::AuthInput {
            head_tick: Tick::new(1),
            auth: vec![
                input_map(&[(2, 0)]),
                input_map(&[(2, 0)]),
                input_map(&[(2, 0)]),
                input_map(&[(2, 0)]),
                input_map(&[(2, -1)]),
            ],
            hints: vec![],
        })
        .await;
    settle().await;

    let (fresh, predicted) = client.sample_with_auth();
    assert_eq!(fresh.len(), 5);
    assert_eq!(fresh[4][&PlayerId::new(2)], -1);
    assert_eq!(predicted, fresh[4]);
}

#[tokio::test]
async fn duplicate_auth_input_is_applied_once() {
    let (mut server, transport) = ScriptedServer::link();
    let (clock, _target) = manual_clock(1);

    let (client, _) = tokio::join!(
        Client::connect_with_clock(TestGame, ClientConfig::new(60), transport, clock),
        server.accept(7),
    );
    let client = client.unwrap();

    let message = Message::AuthInput {
        head_tick: Tick::new(1),
        auth: vec![input_map(&[(1, 5)])],
        hints: vec![],
    };
    server.send(&message).await;
    server.send(&message).await;
    settle().await;

    // Both deliveries are acknowledged, the second as a no-op.
    for _ in 0..2 {
        match server.recv_protocol().await {
            Message::Ack { tick } => assert_eq!(tick, Tick::new(1)),
            other => panic!("expected Ack, got {}", other.kind()),
        }
    }

    let (fresh, predicted) = client.sample_with_auth();
    assert_eq!(fresh.len(), 1);
    assert_eq!(predicted[&PlayerId::new(1)], 5);
}

#[tokio::test]
async fn resync_threshold_freezes_the_world_until_inputs_arrive() {
    let (mut server, transport) = ScriptedServer::link();
    let (clock, target) = manual_clock(5);

    let mut config = ClientConfig::new(60);
    config.resync_threshold_ticks = 30;

    let (client, _) = tokio::join!(
        Client::connect_with_clock(TestGame, config, transport, clock),
        server.accept(7),
    );
    let client = client.unwrap();

    server
        .send(&Message::AuthInput {
            head_tick: Tick::new(1),
            auth: vec![input_map(&[(1, 1)]); 5],
            hints: vec![],
        })
        .await;
    settle().await;

    let (fresh, world) = client.sample_with_auth();
    assert_eq!(fresh.len(), 5);
    assert_eq!(world[&PlayerId::new(1)], 5);

    // The clock races far ahead while the server withholds inputs.
    target.store(100, Ordering::SeqCst);
    let (fresh, world) = client.sample_with_auth();
    assert!(fresh.is_empty());
    assert_eq!(world[&PlayerId::new(1)], 5);
}

#[tokio::test]
async fn two_clients_fed_the_same_inputs_agree_exactly() {
    let feed = |tick: i64| input_map(&[(1, tick), (2, -tick)]);

    let mut worlds = Vec::new();
    for player_id in [7u32, 8u32] {
        let (mut server, transport) = ScriptedServer::link();
        let (clock, _target) = manual_clock(20);

        let (client, _) = tokio::join!(
            Client::connect_with_clock(TestGame, ClientConfig::new(60), transport, clock),
            server.accept(player_id),
        );
        let client = client.unwrap();

        server
            .send(&Message::AuthInput {
                head_tick: Tick::new(1),
                auth: (1..=20).map(feed).collect(),
                hints: vec![],
            })
            .await;
        settle().await;

        worlds.push(client.sample_with_auth());
    }

    assert_eq!(worlds[0], worlds[1]);
    assert_eq!(worlds[0].0.len(), 20);
}
