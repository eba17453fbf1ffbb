use crate::game::{Controller, FixedStep, Step};
use crate::rendering::{Renderer, Scene};
use log::{debug, error, info, warn};
use shared::protocol::{read_relayed, write_action};
use shared::{Action, Handshake, ProtocolError, RelayedAction, TickSummary, World};
use std::time::Instant;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Game client: a controller plus, when networked, its relay connection
///
/// Relayed actions are read on a separate task and queued; the game loop
/// drains the queue at the start of each tick so the world is only ever
/// touched from the loop.
pub struct Client {
    controller: Controller,
    writer: Option<OwnedWriteHalf>,
    inbound: Option<mpsc::UnboundedReceiver<RelayedAction>>,
    reader: Option<JoinHandle<()>>,
    connection_lost: bool,
}

impl Client {
    /// Connects to a relay server and builds the multiplayer world from the
    /// handshake.
    pub async fn connect(
        server_addr: &str,
        world: World,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Connecting to server {}...", server_addr);
        let stream = TcpStream::connect(server_addr).await?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle: {}", e);
        }
        let (mut read_half, writer) = stream.into_split();

        let handshake = Handshake::read_from(&mut read_half).await?;
        info!(
            "Connected! Player ID: {} ({} players)",
            handshake.uid,
            handshake.player_count()
        );

        let controller = Controller::multiplayer(world, &handshake)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let reader = spawn_reader(read_half, tx);

        Ok(Client {
            controller,
            writer: Some(writer),
            inbound: Some(rx),
            reader: Some(reader),
            connection_lost: false,
        })
    }

    /// A client that never talks to a server.
    pub fn offline(controller: Controller) -> Self {
        Client {
            controller,
            writer: None,
            inbound: None,
            reader: None,
            connection_lost: false,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    pub fn is_connected(&self) -> bool {
        self.writer.is_some() && !self.connection_lost
    }

    pub fn connection_lost(&self) -> bool {
        self.connection_lost
    }

    /// One tick: apply queued remote actions, update, send local deltas.
    pub async fn step(&mut self) -> Result<TickSummary, ProtocolError> {
        self.drain_inbound();
        let summary = self.controller.update();
        self.flush_outbound().await?;
        Ok(summary)
    }

    fn drain_inbound(&mut self) {
        let Some(inbound) = self.inbound.as_mut() else {
            return;
        };

        loop {
            match inbound.try_recv() {
                Ok(relayed) => self.controller.apply_remote(relayed),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    warn!("Lost connection to server");
                    self.inbound = None;
                    self.connection_lost = true;
                    break;
                }
            }
        }
    }

    async fn flush_outbound(&mut self) -> Result<(), ProtocolError> {
        let actions = self.controller.take_outbound();
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        for action in &actions {
            match write_action(writer, action).await {
                Ok(()) => {}
                Err(e) if e.is_disconnect() => {
                    warn!("Lost connection to server: {}", e);
                    self.writer = None;
                    self.connection_lost = true;
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Runs the fixed-step loop until the renderer closes or the connection
    /// drops, then says goodbye to the server.
    pub async fn run<R: Renderer>(
        &mut self,
        renderer: &mut R,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let frame = self.controller.world().config().tick_length();
        let mut schedule = FixedStep::new(frame, Instant::now());

        while renderer.is_open() && !self.connection_lost {
            match schedule.poll(Instant::now()) {
                Step::Tick { render } => {
                    let summary = self.step().await?;
                    if !summary.deaths.is_empty() {
                        debug!("Deaths this tick: {:?}", summary.deaths);
                    }
                    if render {
                        renderer.draw(&Scene::capture(&self.controller));
                    }
                }
                Step::Sleep(slack) if slack.is_zero() => tokio::task::yield_now().await,
                Step::Sleep(slack) => sleep(slack).await,
            }
        }

        self.disconnect().await;
        Ok(())
    }

    /// Sends Disconnect if still connected and stops the reader task.
    pub async fn disconnect(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if !self.connection_lost {
                if let Err(e) = write_action(&mut writer, &Action::Disconnect).await {
                    error!("Failed to send disconnect: {}", e);
                }
            }
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.inbound = None;
    }
}

/// Spawns the task that turns the socket into a queue of relayed actions.
/// Dropping the sender on exit is how the loop learns the connection died.
fn spawn_reader(
    read_half: OwnedReadHalf,
    tx: mpsc::UnboundedSender<RelayedAction>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(read_half);
        loop {
            match read_relayed(&mut reader).await {
                Ok(relayed) => {
                    if tx.send(relayed).is_err() {
                        break;
                    }
                }
                Err(e) if e.is_disconnect() => {
                    info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    error!("Protocol error from server: {}", e);
                    break;
                }
            }
        }
    })
}
