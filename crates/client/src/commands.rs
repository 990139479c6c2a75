//! Subcommands of the binary.

use std::sync::Arc;

use anyhow::{Context, Result};
use game_core::CharacterOracle;
use runtime::{
    AutoPlayer, Event, MatchSummary, PeerClient, RandomMoveProvider, RoomCode, RuntimeConfig,
    Server, Topic, load_roster,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

pub const USAGE: &str = "usage: combat-book [serve | demo [HOST_CHAR] [GUEST_CHAR] | host CHAR | join CODE CHAR]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Serve,
    Demo { host: String, guest: String },
    Host { character: String },
    Join { code: RoomCode, character: String },
}

impl Mode {
    pub fn parse(args: &[String]) -> Option<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match args.as_slice() {
            [] | ["serve"] => Some(Self::Serve),
            ["demo", rest @ ..] if rest.len() <= 2 => Some(Self::Demo {
                host: rest.first().unwrap_or(&"knight").to_string(),
                guest: rest.get(1).unwrap_or(&"goblin").to_string(),
            }),
            ["host", character] => Some(Self::Host {
                character: character.to_string(),
            }),
            ["join", code, character] => Some(Self::Join {
                code: RoomCode::parse(code)?,
                character: character.to_string(),
            }),
            _ => None,
        }
    }

    pub fn log_file_name(&self) -> &'static str {
        match self {
            Self::Serve => "server.log",
            Self::Demo { .. } => "demo.log",
            Self::Host { .. } | Self::Join { .. } => "peer.log",
        }
    }
}

pub async fn run(mode: Mode, config: RuntimeConfig) -> Result<()> {
    match mode {
        Mode::Serve => serve(config).await,
        Mode::Demo { host, guest } => demo(config, &host, &guest).await,
        Mode::Host { character } => {
            let mut player = peer(&config, &character).await?;
            let code = player.host().await?;
            info!(room = %code, "share this room code with your opponent");
            report(&player.play_match().await?);
            player.leave().await?;
            Ok(())
        }
        Mode::Join { code, character } => {
            let mut player = peer(&config, &character).await?;
            player.join(&code).await?;
            report(&player.play_match().await?);
            player.leave().await?;
            Ok(())
        }
    }
}

async fn serve(config: RuntimeConfig) -> Result<()> {
    let server = Server::builder().config(config).build().await?;
    let gateway = server.bind_tcp().await?;
    tokio::spawn(log_events(server.handle().subscribe(Topic::Sync)));

    gateway
        .serve_with_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for ctrl-c: {err}");
            }
        })
        .await?;

    let stats = server.handle().stats().await?;
    info!(rooms = stats.rooms, connections = stats.connections, "shutting down");
    server.shutdown().await?;
    Ok(())
}

async fn demo(mut config: RuntimeConfig, host_character: &str, guest_character: &str) -> Result<()> {
    config.bind_addr = "127.0.0.1:0".parse()?;
    let server = Server::builder().config(config.clone()).build().await?;
    let gateway = server.bind_tcp().await?;
    let addr = gateway.local_addr()?;
    tokio::spawn(gateway.serve());
    tokio::spawn(log_events(server.handle().subscribe(Topic::Room)));

    config.bind_addr = addr;
    let mut host = peer(&config, host_character).await?;
    let mut guest = peer(&config, guest_character).await?;

    let code = host.host().await?;
    guest.join(&code).await?;
    let (host_summary, guest_summary) = tokio::join!(host.play_match(), guest.play_match());
    let host_summary = host_summary?;
    let guest_summary = guest_summary?;

    report(&host_summary);
    report(&guest_summary);
    if host_summary.digest != guest_summary.digest {
        warn!("replicas ended in different states");
    }

    server.shutdown().await?;
    Ok(())
}

async fn peer(config: &RuntimeConfig, character: &str) -> Result<AutoPlayer<RandomMoveProvider>> {
    let oracle: Arc<dyn CharacterOracle> = Arc::new(load_roster(config)?);
    if oracle.character(character).is_none() {
        anyhow::bail!("unknown character '{character}', pick one of {:?}", oracle.ids());
    }
    let client = PeerClient::connect(config.bind_addr)
        .await
        .with_context(|| format!("connecting to {}", config.bind_addr))?;
    Ok(AutoPlayer::new(client, oracle, RandomMoveProvider::new(), character))
}

fn report(summary: &MatchSummary) {
    info!(
        room = %summary.room_code,
        role = %summary.role,
        rounds = summary.rounds,
        winner = ?summary.winner,
        my_bp = summary.my_body_points,
        opponent_bp = summary.opponent_body_points,
        digest = %summary.digest,
        "match summary"
    );
}

async fn log_events(mut events: broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(event) => info!(?event, "event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "event log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn modes_parse_from_arguments() {
        assert_eq!(Mode::parse(&args(&[])), Some(Mode::Serve));
        assert_eq!(
            Mode::parse(&args(&["demo"])),
            Some(Mode::Demo {
                host: "knight".into(),
                guest: "goblin".into()
            })
        );
        assert_eq!(
            Mode::parse(&args(&["join", "k7q2zd", "goblin"])),
            Some(Mode::Join {
                code: RoomCode::parse("K7Q2ZD").unwrap(),
                character: "goblin".into()
            })
        );
        assert_eq!(Mode::parse(&args(&["join", "bad", "goblin"])), None);
        assert_eq!(Mode::parse(&args(&["fly"])), None);
    }
}
