//! Diagnostic client: joins a relay server, walks in a square and prints
//! whatever the other clients send in the meantime.

use clap::Parser;
use shared::protocol::{read_relayed, write_action};
use shared::{Action, Direction, Handshake, SQUARE_SIZE};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Probe a Tile Wars relay server")]
struct Args {
    /// Relay server address
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    server: String,
    /// Number of Move actions to send
    #[clap(short, long, default_value = "10")]
    moves: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("Connecting to {}", args.server);
    let stream = TcpStream::connect(&args.server).await?;
    let (mut reader, mut writer) = stream.into_split();

    let handshake = Handshake::read_from(&mut reader).await?;
    println!(
        "Joined as uid {} with {} players connected: {:?}",
        handshake.uid,
        handshake.player_count(),
        handshake.uids
    );

    let listener = tokio::spawn(async move {
        loop {
            match read_relayed(&mut reader).await {
                Ok(relayed) => println!("  from {}: {:?}", relayed.uid, relayed.action),
                Err(e) => {
                    println!("Connection closed: {}", e);
                    break;
                }
            }
        }
    });

    let mut x = 2 * SQUARE_SIZE;
    let mut y = 2 * SQUARE_SIZE;
    for i in 0..args.moves {
        let direction = Direction::from_index((i / 4 % 4) as i32).unwrap_or(Direction::East);
        let (dx, dy) = direction.offset();
        x += dx * SQUARE_SIZE;
        y += dy * SQUARE_SIZE;

        let action = Action::Move {
            x,
            y,
            direction: direction.index(),
            room: 0,
        };
        println!("Sending {:?}", action);
        write_action(&mut writer, &action).await?;

        sleep(Duration::from_millis(250)).await;
    }

    println!("Sending disconnect");
    write_action(&mut writer, &Action::Disconnect).await?;

    // The server never echoes to the sender, so wait briefly for stragglers.
    let _ = timeout(Duration::from_secs(1), listener).await;
    println!("Probe client finished");

    Ok(())
}
