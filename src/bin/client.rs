//! Headless client binary.
//!
//! Connects to the relay, waits for a side assignment, then runs the local
//! engine on a fixed tick and publishes deltas as they happen. Without an
//! input layer attached it lets gravity play the board; it mainly exists
//! to exercise a full session end to end.

use std::time::Duration;

use anyhow::Result;
use tracing::info;

use netris::net::{ClientConfig, Session};
use netris::types::TICK_MS;
use netris::wire::PieceState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let seed = std::process::id();
    let session = Session::connect(ClientConfig::from_env(), seed);

    // Local input effects wait for the side assignment.
    let side = loop {
        if let Some(side) = session.side() {
            break side;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    };
    info!(side = side.as_u8(), "playing");

    session.with_state(|s| {
        s.frames.get_mut(side).start();
    });
    session.publish_board().await.ok();
    session.publish_piece().await.ok();

    let mut ticker = tokio::time::interval(Duration::from_millis(TICK_MS as u64));
    loop {
        ticker.tick().await;

        let (before, locked, after, game_over) = session.with_state(|s| {
            let frame = s.frames.get_mut(side);
            let before = frame.piece().map(PieceState::from);
            let locked = frame.tick(TICK_MS);
            let after = frame.piece().map(PieceState::from);
            (before, locked, after, frame.game_over())
        });

        if let Some(summary) = locked {
            if let Some(placed) = summary.placed {
                session.publish_drop(PieceState::from(&placed)).await.ok();
            }
            session.publish_board().await.ok();
            session.publish_piece().await.ok();
            if let Some(attack) = summary.outgoing {
                session.publish_attack(attack).await.ok();
            }
        } else if before != after {
            session.publish_piece().await.ok();
        }

        if game_over {
            info!("game over");
            return Ok(());
        }
    }
}
