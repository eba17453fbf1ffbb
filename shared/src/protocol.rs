//! Relay wire protocol.
//!
//! Every field is a fixed-width big-endian value (4-byte integers, 8-byte
//! doubles) and there is no framing: the action code alone determines how
//! many payload bytes follow. A peer that sends an unknown code cannot be
//! resynchronized, so the connection is dropped.
//!
//! ```text
//! client -> server   i32 code, payload
//! server -> client   i32 sender uid, i32 code, payload
//! handshake          i32 uid, i32 count, count x i32 uid
//! ```

use crate::weapon::WeaponType;
use crate::{EntityId, ProtocolError};
use bincode::Options;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const ACTION_MOVE: i32 = 1;
pub const ACTION_SHOOT: i32 = 2;
pub const ACTION_DISCONNECT: i32 = 3;
pub const ACTION_WEAPON_CHANGE: i32 = 4;
pub const ACTION_HEALTH_UPDATE: i32 = 5;
pub const ACTION_SCORE_UPDATE: i32 = 6;

/// Upper bound on the player count a handshake may announce.
pub const MAX_HANDSHAKE_PLAYERS: i32 = 1024;

#[derive(Serialize, Deserialize)]
struct MovePayload {
    x: i32,
    y: i32,
    direction: i32,
    room: i32,
}

#[derive(Serialize, Deserialize)]
struct ShootPayload {
    theta: f64,
}

#[derive(Serialize, Deserialize)]
struct IntPayload {
    value: i32,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_big_endian()
        .with_fixint_encoding()
}

/// A state change one client announces to the others.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Absolute position; `direction` and `room` are raw wire values.
    Move {
        x: i32,
        y: i32,
        direction: i32,
        room: i32,
    },
    Shoot {
        theta: f64,
    },
    Disconnect,
    WeaponChange(WeaponType),
    HealthUpdate(i32),
    ScoreUpdate(i32),
}

impl Action {
    pub fn code(&self) -> i32 {
        match self {
            Action::Move { .. } => ACTION_MOVE,
            Action::Shoot { .. } => ACTION_SHOOT,
            Action::Disconnect => ACTION_DISCONNECT,
            Action::WeaponChange(_) => ACTION_WEAPON_CHANGE,
            Action::HealthUpdate(_) => ACTION_HEALTH_UPDATE,
            Action::ScoreUpdate(_) => ACTION_SCORE_UPDATE,
        }
    }

    /// Number of payload bytes that follow `code` on the wire.
    pub fn payload_len(code: i32) -> Result<usize, ProtocolError> {
        match code {
            ACTION_MOVE => Ok(16),
            ACTION_SHOOT => Ok(8),
            ACTION_DISCONNECT => Ok(0),
            ACTION_WEAPON_CHANGE | ACTION_HEALTH_UPDATE | ACTION_SCORE_UPDATE => Ok(4),
            _ => Err(ProtocolError::UnknownAction(code)),
        }
    }

    pub fn encode_payload(&self) -> Result<Vec<u8>, ProtocolError> {
        let bytes = match *self {
            Action::Move {
                x,
                y,
                direction,
                room,
            } => codec().serialize(&MovePayload {
                x,
                y,
                direction,
                room,
            })?,
            Action::Shoot { theta } => codec().serialize(&ShootPayload { theta })?,
            Action::Disconnect => Vec::new(),
            Action::WeaponChange(weapon) => codec().serialize(&IntPayload {
                value: weapon.wire_id(),
            })?,
            Action::HealthUpdate(value) | Action::ScoreUpdate(value) => {
                codec().serialize(&IntPayload { value })?
            }
        };
        Ok(bytes)
    }

    pub fn decode_payload(code: i32, payload: &[u8]) -> Result<Action, ProtocolError> {
        let expected = Self::payload_len(code)?;
        if payload.len() != expected {
            return Err(ProtocolError::InvalidPayload {
                code,
                reason: format!("expected {} bytes, got {}", expected, payload.len()),
            });
        }

        let action = match code {
            ACTION_MOVE => {
                let p: MovePayload = codec().deserialize(payload)?;
                Action::Move {
                    x: p.x,
                    y: p.y,
                    direction: p.direction,
                    room: p.room,
                }
            }
            ACTION_SHOOT => {
                let p: ShootPayload = codec().deserialize(payload)?;
                Action::Shoot { theta: p.theta }
            }
            ACTION_DISCONNECT => Action::Disconnect,
            ACTION_WEAPON_CHANGE => {
                let p: IntPayload = codec().deserialize(payload)?;
                let weapon = WeaponType::from_wire_id(p.value)
                    .ok_or(ProtocolError::UnknownWeapon(p.value))?;
                Action::WeaponChange(weapon)
            }
            ACTION_HEALTH_UPDATE => {
                let p: IntPayload = codec().deserialize(payload)?;
                Action::HealthUpdate(p.value)
            }
            _ => {
                let p: IntPayload = codec().deserialize(payload)?;
                Action::ScoreUpdate(p.value)
            }
        };
        Ok(action)
    }

    /// Client-to-server form: code then payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = self.code().to_be_bytes().to_vec();
        bytes.extend(self.encode_payload()?);
        Ok(bytes)
    }
}

/// An action as the server forwards it, tagged with the sender's uid.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayedAction {
    pub uid: EntityId,
    pub action: Action,
}

impl RelayedAction {
    pub fn new(uid: EntityId, action: Action) -> Self {
        Self { uid, action }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = uid_to_wire(self.uid)?.to_be_bytes().to_vec();
        bytes.extend(self.action.to_bytes()?);
        Ok(bytes)
    }
}

/// First message on every connection: the client's own uid and every uid
/// connected at that moment, itself included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub uid: EntityId,
    pub uids: Vec<EntityId>,
}

impl Handshake {
    pub fn player_count(&self) -> usize {
        self.uids.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = Vec::with_capacity(8 + self.uids.len() * 4);
        bytes.extend(uid_to_wire(self.uid)?.to_be_bytes());
        let count = i32::try_from(self.uids.len()).map_err(|_| ProtocolError::InvalidPayload {
            code: 0,
            reason: format!("{} players do not fit a handshake", self.uids.len()),
        })?;
        bytes.extend(count.to_be_bytes());
        for uid in &self.uids {
            bytes.extend(uid_to_wire(*uid)?.to_be_bytes());
        }
        Ok(bytes)
    }

    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, ProtocolError> {
        let uid = uid_from_wire(reader.read_i32().await?)?;
        let count = reader.read_i32().await?;
        if !(0..=MAX_HANDSHAKE_PLAYERS).contains(&count) {
            return Err(ProtocolError::InvalidPayload {
                code: 0,
                reason: format!("handshake announces {} players", count),
            });
        }

        let mut uids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            uids.push(uid_from_wire(reader.read_i32().await?)?);
        }
        Ok(Self { uid, uids })
    }
}

fn uid_to_wire(uid: EntityId) -> Result<i32, ProtocolError> {
    i32::try_from(uid).map_err(|_| ProtocolError::InvalidPayload {
        code: 0,
        reason: format!("uid {} does not fit in 32 signed bits", uid),
    })
}

fn uid_from_wire(uid: i32) -> Result<EntityId, ProtocolError> {
    EntityId::try_from(uid).map_err(|_| ProtocolError::InvalidPayload {
        code: 0,
        reason: format!("negative uid {}", uid),
    })
}

/// Reads one client-to-server action.
pub async fn read_action<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Action, ProtocolError> {
    let code = reader.read_i32().await?;
    let mut payload = vec![0u8; Action::payload_len(code)?];
    reader.read_exact(&mut payload).await?;
    Action::decode_payload(code, &payload)
}

pub async fn write_action<W: AsyncWrite + Unpin>(
    writer: &mut W,
    action: &Action,
) -> Result<(), ProtocolError> {
    writer.write_all(&action.to_bytes()?).await?;
    Ok(())
}

/// Reads one server-to-client relayed action.
pub async fn read_relayed<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<RelayedAction, ProtocolError> {
    let uid = uid_from_wire(reader.read_i32().await?)?;
    let action = read_action(reader).await?;
    Ok(RelayedAction { uid, action })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use tokio_test::io::Builder;

    #[test]
    fn test_shoot_layout() {
        let bytes = Action::Shoot { theta: 1.57 }.to_bytes().unwrap();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[..4], &[0, 0, 0, 2]);
        assert_eq!(&bytes[4..], &1.57f64.to_be_bytes());
    }

    #[test]
    fn test_move_layout() {
        let action = Action::Move {
            x: 48,
            y: -1,
            direction: 3,
            room: 2,
        };
        let bytes = action.to_bytes().unwrap();
        let mut expected = Vec::new();
        for value in [1i32, 48, -1, 3, 2] {
            expected.extend(value.to_be_bytes());
        }
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_relayed_prefixes_sender() {
        let bytes = RelayedAction::new(2, Action::Disconnect).to_bytes().unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 2, 0, 0, 0, 3]);
    }

    #[test]
    fn test_payload_lengths() {
        assert_eq!(Action::payload_len(ACTION_MOVE).unwrap(), 16);
        assert_eq!(Action::payload_len(ACTION_DISCONNECT).unwrap(), 0);
        assert!(matches!(
            Action::payload_len(42),
            Err(ProtocolError::UnknownAction(42))
        ));
    }

    #[test]
    fn test_unknown_weapon_is_rejected() {
        let payload = 9i32.to_be_bytes();
        assert!(matches!(
            Action::decode_payload(ACTION_WEAPON_CHANGE, &payload),
            Err(ProtocolError::UnknownWeapon(9))
        ));
    }

    #[tokio::test]
    async fn test_read_action_from_stream() {
        let mut bytes = Action::WeaponChange(WeaponType::Scatter).to_bytes().unwrap();
        bytes.extend(Action::HealthUpdate(-4).to_bytes().unwrap());
        let mut stream = Builder::new().read(&bytes).build();

        assert_eq!(
            read_action(&mut stream).await.unwrap(),
            Action::WeaponChange(WeaponType::Scatter)
        );
        assert_eq!(read_action(&mut stream).await.unwrap(), Action::HealthUpdate(-4));
    }

    #[tokio::test]
    async fn test_read_relayed_shoot() {
        let bytes = RelayedAction::new(2, Action::Shoot { theta: 1.57 })
            .to_bytes()
            .unwrap();
        let mut stream = Builder::new().read(&bytes).build();

        let relayed = read_relayed(&mut stream).await.unwrap();
        assert_eq!(relayed.uid, 2);
        match relayed.action {
            Action::Shoot { theta } => assert_approx_eq!(theta, 1.57),
            other => panic!("expected shoot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_truncated_payload_is_a_disconnect() {
        let mut stream = Builder::new().read(&[0, 0, 0, 1, 0, 0]).build();
        let err = read_action(&mut stream).await.unwrap_err();
        assert!(err.is_disconnect());
    }

    #[tokio::test]
    async fn test_unknown_code_fails_read() {
        let mut stream = Builder::new().read(&[0, 0, 0, 9]).build();
        assert!(matches!(
            read_action(&mut stream).await,
            Err(ProtocolError::UnknownAction(9))
        ));
    }

    #[tokio::test]
    async fn test_write_action() {
        let expected = Action::ScoreUpdate(30).to_bytes().unwrap();
        let mut stream = Builder::new().write(&expected).build();
        write_action(&mut stream, &Action::ScoreUpdate(30)).await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_layout() {
        let handshake = Handshake {
            uid: 2,
            uids: vec![0, 1, 2],
        };
        let bytes = handshake.to_bytes().unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[..8], &[0, 0, 0, 2, 0, 0, 0, 3]);

        let mut stream = Builder::new().read(&bytes).build();
        let read = Handshake::read_from(&mut stream).await.unwrap();
        assert_eq!(read, handshake);
        assert_eq!(read.player_count(), 3);
    }

    #[tokio::test]
    async fn test_handshake_rejects_absurd_count() {
        let mut bytes = 0i32.to_be_bytes().to_vec();
        bytes.extend((-3i32).to_be_bytes());
        let mut stream = Builder::new().read(&bytes).build();
        assert!(matches!(
            Handshake::read_from(&mut stream).await,
            Err(ProtocolError::InvalidPayload { .. })
        ));
    }
}
