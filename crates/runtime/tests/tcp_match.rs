use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use game_content::CharacterRoster;
use game_core::CharacterOracle;
use runtime::{
    AutoPlayer, ClientRequest, Event, PeerClient, RandomMoveProvider, Role, RuntimeConfig, Server,
    ServerMessage, SyncEvent, Topic,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

async fn serve() -> (Server, SocketAddr, oneshot::Sender<()>) {
    let config = RuntimeConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..RuntimeConfig::default()
    };
    let server = Server::builder().config(config).seed(5).build().await.unwrap();
    let gateway = server.bind_tcp().await.unwrap();
    let addr = gateway.local_addr().unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    tokio::spawn(gateway.serve_with_shutdown(async move {
        let _ = stop_rx.await;
    }));
    (server, addr, stop_tx)
}

fn oracle() -> Arc<dyn CharacterOracle> {
    Arc::new(CharacterRoster::bundled().unwrap())
}

/// Two automated peers play a full match over TCP
///
/// Each peer resolves every round locally and reports its digest; the
/// server never sees a mismatch and both replicas end in the same state.
#[tokio::test]
async fn automated_peers_finish_a_match_in_sync() {
    let (server, addr, stop) = serve().await;
    let mut sync = server.handle().subscribe(Topic::Sync);

    let mut host = AutoPlayer::new(
        PeerClient::connect(addr).await.unwrap(),
        oracle(),
        RandomMoveProvider::from_seed(1),
        "knight",
    )
    .with_max_rounds(200);
    let mut guest = AutoPlayer::new(
        PeerClient::connect(addr).await.unwrap(),
        oracle(),
        RandomMoveProvider::from_seed(2),
        "goblin",
    )
    .with_max_rounds(200);

    let code = host.host().await.unwrap();
    guest.join(&code).await.unwrap();

    let (host_summary, guest_summary) = tokio::time::timeout(
        Duration::from_secs(30),
        async { tokio::join!(host.play_match(), guest.play_match()) },
    )
    .await
    .expect("match finishes");
    let host_summary = host_summary.unwrap();
    let guest_summary = guest_summary.unwrap();

    assert_eq!(host_summary.room_code, code);
    assert_eq!(host_summary.role, Role::Host);
    assert_eq!(guest_summary.role, Role::Guest);
    assert_eq!(host_summary.rounds, guest_summary.rounds);
    assert!(host_summary.rounds >= 1);
    assert_eq!(host_summary.digest, guest_summary.digest);
    assert_eq!(host_summary.my_body_points, guest_summary.opponent_body_points);
    assert_eq!(host_summary.opponent_body_points, guest_summary.my_body_points);
    assert_eq!(host_summary.sync_mismatches, 0);
    assert_eq!(guest_summary.sync_mismatches, 0);
    while let Ok(event) = sync.try_recv() {
        assert!(
            !matches!(event, Event::Sync(SyncEvent::Mismatch { .. })),
            "unexpected {event:?}"
        );
    }

    stop.send(()).unwrap();
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn malformed_lines_get_an_error_and_keep_the_connection() {
    let (server, addr, stop) = serve().await;

    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    write_half
        .write_all(b"{\"type\":\"fly\",\"id\":3}\nnot json\n")
        .await
        .unwrap();
    for expected_id in [Some(3), None] {
        let line = lines.next_line().await.unwrap().unwrap();
        match serde_json::from_str::<ServerMessage>(&line).unwrap() {
            ServerMessage::Response {
                id,
                success,
                code,
                ..
            } => {
                assert_eq!(id, expected_id);
                assert!(!success);
                assert_eq!(code.as_deref(), Some("INVALID_MESSAGE"));
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    write_half
        .write_all(b"{\"type\":\"list-characters\",\"id\":4}\n")
        .await
        .unwrap();
    let line = lines.next_line().await.unwrap().unwrap();
    assert!(line.contains(r#""characters":["knight","goblin"]"#));
    assert!(line.contains(r#""id":4"#));

    stop.send(()).unwrap();
    server.shutdown().await.unwrap();
}

fn assert_invalid_message(line: &str) {
    match serde_json::from_str::<ServerMessage>(line).unwrap() {
        ServerMessage::Response { success, code, .. } => {
            assert!(!success);
            assert_eq!(code.as_deref(), Some("INVALID_MESSAGE"));
        }
        other => panic!("expected response, got {other:?}"),
    }
}

/// Bytes that are not UTF-8 are refused like any other malformed line and
/// the host keeps its room.
#[tokio::test]
async fn invalid_utf8_keeps_the_host_seated() {
    let (server, addr, stop) = serve().await;

    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    write_half
        .write_all(b"{\"type\":\"create-room\",\"characterId\":\"knight\",\"id\":1}\n")
        .await
        .unwrap();
    let created = lines.next_line().await.unwrap().unwrap();
    assert!(created.contains(r#""success":true"#), "{created}");

    write_half.write_all(b"\xff\xfe garbage\n").await.unwrap();
    let refused = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
        .await
        .unwrap()
        .unwrap()
        .expect("connection stays open");
    assert_invalid_message(&refused);

    let stats = server.handle().stats().await.unwrap();
    assert_eq!(stats.rooms, 1);
    assert_eq!(stats.participants, 1);

    stop.send(()).unwrap();
    server.shutdown().await.unwrap();
}

/// A line past the size limit is dropped without ending the connection.
#[tokio::test]
async fn oversized_lines_are_refused_and_skipped() {
    let (server, addr, stop) = serve().await;

    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let mut flood = vec![b'a'; runtime::MAX_LINE_BYTES + 4096];
    flood.push(b'\n');
    write_half.write_all(&flood).await.unwrap();
    let refused = lines.next_line().await.unwrap().unwrap();
    assert_invalid_message(&refused);

    write_half
        .write_all(b"{\"type\":\"list-characters\",\"id\":2}\n")
        .await
        .unwrap();
    let line = lines.next_line().await.unwrap().unwrap();
    assert!(line.contains(r#""id":2"#));
    assert!(line.contains(r#""success":true"#));

    stop.send(()).unwrap();
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn dropped_socket_counts_as_disconnect() {
    let (server, addr, stop) = serve().await;

    let mut host = PeerClient::connect(addr).await.unwrap();
    let code = host
        .request(ClientRequest::CreateRoom {
            character_id: "knight".into(),
        })
        .await
        .unwrap()
        .room_code
        .unwrap();
    let mut guest = PeerClient::connect(addr).await.unwrap();
    guest
        .request(ClientRequest::JoinRoom {
            room_code: code.to_string(),
            character_id: "goblin".into(),
        })
        .await
        .unwrap();
    drop(host);

    let promoted = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match guest.next_event().await.unwrap() {
                ServerMessage::OpponentDisconnected { promoted_to_host } => break promoted_to_host,
                _ => continue,
            }
        }
    })
    .await
    .unwrap();
    assert!(promoted);

    stop.send(()).unwrap();
    server.shutdown().await.unwrap();
}
