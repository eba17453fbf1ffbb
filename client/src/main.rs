use clap::Parser;
use client::game::Controller;
use client::network::Client;
use client::rendering::HeadlessRenderer;
use log::info;
use shared::{GameConfig, PlayerType, Strategy, World};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Directory holding RoomIndex.txt and the Rooms folder
    #[arg(short = 'w', long, default_value = "Resources")]
    world: PathBuf,

    /// Simulation ticks per second
    #[arg(short = 't', long, default_value_t = shared::FRAME_RATE)]
    tick_rate: u32,

    /// Play alone without connecting to a server
    #[arg(long)]
    offline: bool,

    /// Stop after this many rendered frames
    #[arg(long)]
    frames: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = GameConfig::default().with_tick_rate(args.tick_rate);
    let world = World::load(&args.world, config, Strategy::wait())?;
    info!("Loaded world from {}", args.world.display());

    let mut renderer = HeadlessRenderer::new();
    if let Some(frames) = args.frames {
        renderer = renderer.with_frame_limit(frames);
    }

    let mut client = if args.offline {
        info!("Starting offline game");
        Client::offline(Controller::single_player(world, PlayerType::Dave)?)
    } else {
        info!("Connecting to: {}", args.server);
        Client::connect(&args.server, world).await?
    };

    tokio::select! {
        result = client.run(&mut renderer) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }
    client.disconnect().await;

    Ok(())
}
