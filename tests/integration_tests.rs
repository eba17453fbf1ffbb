//! Integration tests for the relay server, the game client and the shared world
//!
//! These tests run real TCP connections against a live relay and drive whole
//! worlds through the public API only.

use assert_approx_eq::assert_approx_eq;
use client::game::Controller;
use client::input::Key;
use client::network::Client;
use server::network::Server;
use shared::protocol::{read_relayed, write_action};
use shared::{
    Action, Direction, Event, GameConfig, Grid, Handshake, Item, PlayerType, Point, Projectile,
    RelayedAction, SaveDocument, Strategy, Tile, World, HEALTH_MAX,
};
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

async fn start_server(max_clients: usize) -> SocketAddr {
    let server = Server::new("127.0.0.1:0", max_clients).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move { server.run().await });
    addr
}

async fn join(addr: SocketAddr) -> (TcpStream, Handshake) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let handshake = timeout(Duration::from_secs(2), Handshake::read_from(&mut stream))
        .await
        .unwrap()
        .unwrap();
    (stream, handshake)
}

fn config() -> GameConfig {
    GameConfig::new()
        .with_tick_rate(100)
        .with_respawn_delay(Duration::from_millis(50))
        .with_seed(7)
}

fn open_world() -> World {
    let mut world = World::new(config(), Strategy::wait());
    world.add_room("Arena", "open floor", Grid::filled(10, 10, Tile::Floor(None)));
    world
}

/// RELAY SERVER TESTS
mod relay_tests {
    use super::*;

    /// A shot from one client reaches every other client exactly once
    #[tokio::test]
    async fn shoot_is_relayed_to_everyone_else() {
        let addr = start_server(4).await;
        let (mut first, _) = join(addr).await;
        let (mut second, _) = join(addr).await;
        let (mut shooter, handshake) = join(addr).await;
        assert_eq!(handshake.uid, 2);
        assert_eq!(handshake.uids, vec![0, 1, 2]);

        write_action(&mut shooter, &Action::Shoot { theta: 1.57 })
            .await
            .unwrap();

        for peer in [&mut first, &mut second] {
            let relayed = timeout(Duration::from_secs(2), read_relayed(peer))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(relayed.uid, 2);
            match relayed.action {
                Action::Shoot { theta } => assert_approx_eq!(theta, 1.57),
                other => panic!("expected a shot, got {:?}", other),
            }

            // Nothing else follows.
            let mut byte = [0u8; 1];
            assert!(timeout(Duration::from_millis(100), peer.read(&mut byte))
                .await
                .is_err());
        }

        let mut byte = [0u8; 1];
        assert!(timeout(Duration::from_millis(200), shooter.read(&mut byte))
            .await
            .is_err());
    }

    /// Leaving announces the departure with action code 3
    #[tokio::test]
    async fn hangup_is_announced() {
        let addr = start_server(4).await;
        let (leaver, _) = join(addr).await;
        let (mut stayer, _) = join(addr).await;
        drop(leaver);

        let relayed = timeout(Duration::from_secs(2), read_relayed(&mut stayer))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(relayed, RelayedAction::new(0, Action::Disconnect));
    }

    /// A full server closes new connections without a handshake
    #[tokio::test]
    async fn full_server_refuses_connections() {
        let addr = start_server(2).await;
        let (_a, _) = join(addr).await;
        let (_b, _) = join(addr).await;

        let mut refused = TcpStream::connect(addr).await.unwrap();
        let mut buf = Vec::new();
        let _ = timeout(Duration::from_secs(2), refused.read_to_end(&mut buf))
            .await
            .unwrap();
        assert!(buf.is_empty());
    }
}

/// CLIENT / SERVER TESTS
mod client_server_tests {
    use super::*;

    /// Two game clients see each other move through the relay
    #[tokio::test]
    async fn movement_reaches_the_other_client() {
        let addr = start_server(4).await.to_string();
        let mut walker = Client::connect(&addr, open_world()).await.unwrap();
        let mut watcher = Client::connect(&addr, open_world()).await.unwrap();
        assert_eq!(walker.controller().uid(), 0);
        assert_eq!(watcher.controller().uid(), 1);

        let start_x = watcher.controller().world().player(0).unwrap().x;
        walker.controller_mut().input_mut().key_down(Key::Right);

        let mut seen = None;
        for _ in 0..100 {
            walker.step().await.unwrap();
            watcher.step().await.unwrap();
            let x = watcher.controller().world().player(0).unwrap().x;
            if x > start_x {
                seen = Some(x);
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert!(seen.is_some());
        assert_eq!(
            watcher.controller().world().player(0).unwrap().facing,
            Direction::East
        );

        walker.disconnect().await;
        for _ in 0..100 {
            watcher.step().await.unwrap();
            if watcher.controller().world().player(0).is_none() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert!(watcher.controller().world().player(0).is_none());
        watcher.disconnect().await;
    }
}

/// WORLD SCENARIOS
mod world_scenarios {
    use super::*;

    /// A projectile crosses one tile before hitting the player east of it
    #[test]
    fn projectile_travels_then_hits() {
        let mut world = open_world();
        world.spawn_player(0, PlayerType::Dave, 0, 24, 24).unwrap();
        world.spawn_player(1, PlayerType::Pondy, 0, 48, 24).unwrap();
        let shot = Projectile::prototype(4.0, -10).new_instance(0, Point::new(24.0, 24.0), 0.0);
        assert!(world.room_mut(0).unwrap().add_projectile(shot));

        for _ in 0..4 {
            world.tick();
        }
        assert_eq!(world.player(1).unwrap().health, HEALTH_MAX);

        for _ in 0..2 {
            world.tick();
        }
        assert_eq!(world.player(1).unwrap().health, HEALTH_MAX - 10);
        assert!(world.room(0).unwrap().projectiles().is_empty());
    }

    /// A sentry without a combat response keeps guarding after a hit
    #[test]
    fn struck_sentry_keeps_guarding() {
        let mut world = open_world();
        let id = world.spawn_npc(0, 120, 120, Strategy::sentry(100.0)).unwrap();
        world.npc_mut(id).unwrap().modify_health(-5);

        world.tick();
        let npc = world.npc(id).unwrap();
        assert_eq!(npc.active_event(), Some(Event::Default));
        assert_eq!(npc.active_strategy().name(), "sentry");
        assert_eq!(npc.body.health, HEALTH_MAX - 5);
    }

    /// A dead player comes back once, at full health, after the delay
    #[test]
    fn dead_player_respawns_once() {
        let mut world = open_world();
        world.spawn_player(3, PlayerType::Pondy, 0, 72, 48).unwrap();
        world.player_mut(3).unwrap().health = -1;

        let summary = world.tick();
        assert_eq!(summary.deaths, vec![3]);
        assert!(world.player(3).is_none());

        for _ in 0..20 {
            world.tick();
        }
        let player = world.player(3).unwrap();
        assert_eq!(player.health, HEALTH_MAX);
        assert_eq!((player.x, player.y), (72, 48));
        assert!(world.clock().pending().is_empty());
    }

    /// Walking onto a linked door moves the player into the other room
    #[test]
    fn door_crossing() {
        let mut world = World::new(config(), Strategy::wait());
        world
            .add_room_from_text("Office", "Office\n3\n1\n____11\n")
            .unwrap();
        world
            .add_room_from_text("Vault", "Vault\n3\n1\n11____\n")
            .unwrap();
        world.spawn_player(0, PlayerType::Dave, 0, 46, 12).unwrap();

        world.move_player(0, Direction::East);
        assert_eq!(world.locate(0), Some(1));
        assert!(world.room(0).unwrap().player(0).is_none());
    }

    /// Save to a JSON file, then restore into a freshly built world
    #[test]
    fn save_and_restore_through_a_file() {
        let mut world = open_world();
        world.spawn_player(0, PlayerType::Dave, 0, 48, 48).unwrap();
        world.player_mut(0).unwrap().points = 30;
        world
            .room_mut(0)
            .unwrap()
            .grid_mut()
            .set(4, 4, Tile::Floor(Some(Item::Torch)));

        let path = std::env::temp_dir().join(format!("tilewars-save-{}.json", std::process::id()));
        world.snapshot().write_to(&path).unwrap();

        let mut restored = open_world();
        restored.spawn_player(9, PlayerType::Pondy, 0, 24, 24).unwrap();
        let document = SaveDocument::read_from(&path).unwrap();
        restored.restore(&document).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(restored.player(9).is_none());
        let player = restored.player(0).unwrap();
        assert_eq!((player.x, player.y, player.points), (48, 48, 30));
        assert_eq!(
            restored.room(0).unwrap().grid().get(4, 4),
            Some(&Tile::Floor(Some(Item::Torch)))
        );
    }

    /// A world directory with an index and room files loads and plays
    #[test]
    fn load_world_directory_and_play() {
        let dir = std::env::temp_dir().join(format!("tilewars-world-{}", std::process::id()));
        fs::create_dir_all(dir.join(shared::world::ROOMS_DIR)).unwrap();
        fs::write(dir.join(shared::world::ROOM_INDEX_FILE), "Start\n").unwrap();
        fs::write(
            dir.join(shared::world::ROOMS_DIR).join("Start.txt"),
            "Starting room\n10\n10\n".to_string() + &"____________________\n".repeat(10),
        )
        .unwrap();

        let world = World::load(&dir, config(), Strategy::wait()).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        let mut controller = Controller::single_player(world, PlayerType::Dave).unwrap();
        assert_eq!(controller.world().room(0).unwrap().name(), "Start");
        assert_eq!(controller.world().room(0).unwrap().npcs().len(), 1);

        controller.input_mut().key_down(Key::Down);
        let before = controller.local_player().unwrap().y;
        controller.update();
        assert!(controller.local_player().unwrap().y > before);
    }
}
