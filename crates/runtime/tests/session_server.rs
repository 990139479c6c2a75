use std::time::Duration;

use runtime::{
    ClientRequest, Connection, Event, RoomEvent, RoomStatus, RuntimeConfig, RuntimeError, Server,
    ServerMessage, SyncEvent, Topic,
};

async fn server() -> Server {
    Server::builder()
        .seed(11)
        .build()
        .await
        .expect("server should start with the bundled roster")
}

async fn next(connection: &mut Connection) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(5), connection.recv())
        .await
        .expect("message within timeout")
        .expect("connection open")
}

fn refused_code(err: RuntimeError) -> String {
    match err {
        RuntimeError::Refused { code, .. } => code,
        other => panic!("expected refusal, got {other:?}"),
    }
}

/// Room lifecycle over in-process connections
///
/// 1. Host creates a room, guest joins, both see `battle-start`
/// 2. One round of moves: `opponent-ready` first, then a single reveal
/// 3. Both report matching digests and the winner
/// 4. Rematch and host leave
#[tokio::test]
async fn room_lifecycle_over_in_process_connections() {
    let server = server().await;
    let handle = server.handle();
    let mut rooms = handle.subscribe(Topic::Room);

    let mut host = handle.connect().await.unwrap();
    let mut guest = handle.connect().await.unwrap();
    assert_ne!(host.id(), guest.id());

    // ================================================================
    // Create and join
    // ================================================================
    let created = host
        .request(ClientRequest::CreateRoom {
            character_id: "knight".into(),
        })
        .await
        .unwrap();
    let code = created.room_code.unwrap();
    assert_eq!(created.is_host, Some(true));

    let joined = guest
        .request(ClientRequest::JoinRoom {
            room_code: code.to_string(),
            character_id: "goblin".into(),
        })
        .await
        .unwrap();
    assert_eq!(joined.is_host, Some(false));
    assert_eq!(joined.host_character.as_deref(), Some("knight"));

    for connection in [&mut host, &mut guest] {
        match next(connection).await {
            ServerMessage::BattleStart {
                room_code,
                host_character,
                guest_character,
            } => {
                assert_eq!(room_code, code);
                assert_eq!(host_character, "knight");
                assert_eq!(guest_character, "goblin");
            }
            other => panic!("expected battle-start, got {other:?}"),
        }
    }

    // ================================================================
    // One round
    // ================================================================
    host.request(ClientRequest::SubmitMove {
        maneuver: "charge".into(),
    })
    .await
    .unwrap();
    assert_eq!(next(&mut guest).await, ServerMessage::OpponentReady);

    guest
        .request(ClientRequest::SubmitMove {
            maneuver: "dodge".into(),
        })
        .await
        .unwrap();
    let revealed = ServerMessage::MovesRevealed {
        round: 1,
        host_move: "charge".into(),
        guest_move: "dodge".into(),
    };
    assert_eq!(next(&mut host).await, ServerMessage::OpponentReady);
    assert_eq!(next(&mut host).await, revealed);
    assert_eq!(next(&mut guest).await, revealed);

    // ================================================================
    // Digests and game over
    // ================================================================
    for connection in [&mut host, &mut guest] {
        connection
            .request(ClientRequest::ReportDigest {
                round: 1,
                digest: "same".into(),
            })
            .await
            .unwrap();
    }

    host.request(ClientRequest::GameOver {
        winner: runtime::Role::Host,
    })
    .await
    .unwrap();

    // ================================================================
    // Rematch, then leave
    // ================================================================
    guest.request(ClientRequest::RequestRematch).await.unwrap();
    assert_eq!(next(&mut host).await, ServerMessage::RematchRequested);
    host.request(ClientRequest::AcceptRematch).await.unwrap();
    assert_eq!(next(&mut host).await, ServerMessage::RematchStart);
    assert_eq!(next(&mut guest).await, ServerMessage::RematchStart);

    host.request(ClientRequest::LeaveRoom).await.unwrap();
    assert_eq!(
        next(&mut guest).await,
        ServerMessage::OpponentDisconnected {
            promoted_to_host: true
        }
    );

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.rooms, 1);
    assert_eq!(stats.connections, 2);
    assert_eq!(stats.participants, 1);

    let mut seen = Vec::new();
    while let Ok(event) = rooms.try_recv() {
        seen.push(event);
    }
    assert!(matches!(seen.first(), Some(Event::Room(RoomEvent::Created { .. }))));
    assert!(seen.iter().any(|event| matches!(
        event,
        Event::Room(RoomEvent::GameOver {
            winner: runtime::Role::Host,
            ..
        })
    )));
    assert!(seen.iter().any(|event| matches!(
        event,
        Event::Room(RoomEvent::SeatLeft {
            promoted_guest: true,
            ..
        })
    )));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn refusals_reach_only_the_requester() {
    let server = server().await;
    let handle = server.handle();
    let mut host = handle.connect().await.unwrap();
    let mut guest = handle.connect().await.unwrap();
    let mut third = handle.connect().await.unwrap();

    let err = guest
        .request(ClientRequest::JoinRoom {
            room_code: "ZZZZZZ".into(),
            character_id: "goblin".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(refused_code(err), "ROOM_NOT_FOUND");

    let code = host
        .request(ClientRequest::CreateRoom {
            character_id: "knight".into(),
        })
        .await
        .unwrap()
        .room_code
        .unwrap();

    let err = host
        .request(ClientRequest::JoinRoom {
            room_code: code.to_string(),
            character_id: "knight".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(refused_code(err), "OWN_ROOM");

    guest
        .request(ClientRequest::JoinRoom {
            room_code: code.to_string(),
            character_id: "goblin".into(),
        })
        .await
        .unwrap();
    let err = third
        .request(ClientRequest::JoinRoom {
            room_code: code.to_string(),
            character_id: "goblin".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(refused_code(err), "ROOM_FULL");

    let err = third
        .request(ClientRequest::ReclaimSeat {
            room_code: code.to_string(),
            token: "nope".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(refused_code(err), "INVALID_TOKEN");

    // Both participants only got battle-start.
    for connection in [&mut host, &mut guest] {
        assert!(matches!(
            next(connection).await,
            ServerMessage::BattleStart { .. }
        ));
    }
    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.participants, 2);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn diverged_digests_raise_sync_mismatch() {
    let server = server().await;
    let handle = server.handle();
    let mut sync = handle.subscribe(Topic::Sync);

    let mut host = handle.connect().await.unwrap();
    let mut guest = handle.connect().await.unwrap();
    let code = host
        .request(ClientRequest::CreateRoom {
            character_id: "knight".into(),
        })
        .await
        .unwrap()
        .room_code
        .unwrap();
    guest
        .request(ClientRequest::JoinRoom {
            room_code: code.to_string(),
            character_id: "goblin".into(),
        })
        .await
        .unwrap();
    next(&mut host).await;
    next(&mut guest).await;

    // Nothing revealed yet, so no round can be reported.
    let err = host
        .request(ClientRequest::ReportDigest {
            round: 1,
            digest: "aa".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(refused_code(err), "INVALID_ROUND");

    host.request(ClientRequest::SubmitMove {
        maneuver: "charge".into(),
    })
    .await
    .unwrap();
    guest
        .request(ClientRequest::SubmitMove {
            maneuver: "dodge".into(),
        })
        .await
        .unwrap();
    assert_eq!(next(&mut guest).await, ServerMessage::OpponentReady);
    assert_eq!(next(&mut host).await, ServerMessage::OpponentReady);
    assert!(matches!(next(&mut host).await, ServerMessage::MovesRevealed { round: 1, .. }));
    assert!(matches!(next(&mut guest).await, ServerMessage::MovesRevealed { round: 1, .. }));

    let err = guest
        .request(ClientRequest::ReportDigest {
            round: 4,
            digest: "bb".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(refused_code(err), "INVALID_ROUND");

    host.request(ClientRequest::ReportDigest {
        round: 1,
        digest: "aa".into(),
    })
    .await
    .unwrap();
    guest
        .request(ClientRequest::ReportDigest {
            round: 1,
            digest: "bb".into(),
        })
        .await
        .unwrap();

    let mismatch = ServerMessage::SyncMismatch {
        round: 1,
        host_digest: "aa".into(),
        guest_digest: "bb".into(),
    };
    assert_eq!(next(&mut host).await, mismatch);
    assert_eq!(next(&mut guest).await, mismatch);
    assert!(matches!(
        sync.recv().await.unwrap(),
        Event::Sync(SyncEvent::Mismatch { round: 1, .. })
    ));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn invite_seat_survives_disconnect_and_is_reclaimed() {
    let server = server().await;
    let handle = server.handle();
    let mut host = handle.connect().await.unwrap();
    let guest = handle.connect().await.unwrap();

    let created = host
        .request(ClientRequest::CreateInviteRoom {
            character_id: "knight".into(),
        })
        .await
        .unwrap();
    let code = created.room_code.unwrap();
    let host_token = created.host_token.unwrap();

    let mut guest = guest;
    guest
        .request(ClientRequest::JoinRoom {
            room_code: code.to_string(),
            character_id: "goblin".into(),
        })
        .await
        .unwrap();
    next(&mut host).await;
    host.request(ClientRequest::SubmitMove {
        maneuver: "charge".into(),
    })
    .await
    .unwrap();

    host.close().await.unwrap();
    loop {
        match next(&mut guest).await {
            ServerMessage::OpponentDisconnected { promoted_to_host } => {
                assert!(!promoted_to_host);
                break;
            }
            ServerMessage::BattleStart { .. } | ServerMessage::OpponentReady => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    let mut returning = handle.connect().await.unwrap();
    let reclaimed = returning
        .request(ClientRequest::ReclaimSeat {
            room_code: code.as_str().to_lowercase(),
            token: host_token,
        })
        .await
        .unwrap();
    assert_eq!(reclaimed.is_host, Some(true));
    assert_eq!(reclaimed.status, Some(RoomStatus::Battle));
    assert_eq!(reclaimed.pending_move.as_deref(), Some("charge"));
    assert_eq!(reclaimed.history, Some(Vec::new()));
    assert_eq!(next(&mut guest).await, ServerMessage::OpponentReconnected);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn idle_rooms_are_swept() {
    let config = RuntimeConfig {
        room_ttl: Duration::ZERO,
        ..RuntimeConfig::default()
    };
    let server = Server::builder().config(config).build().await.unwrap();
    let handle = server.handle();
    let mut host = handle.connect().await.unwrap();

    host.request(ClientRequest::CreateRoom {
        character_id: "goblin".into(),
    })
    .await
    .unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(handle.sweep_now().await.unwrap(), 1);
    assert_eq!(
        next(&mut host).await,
        ServerMessage::RoomClosed {
            reason: "expired".into()
        }
    );
    assert_eq!(handle.stats().await.unwrap().rooms, 0);

    server.shutdown().await.unwrap();
}
