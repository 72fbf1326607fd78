//! Session state shared by the whole room.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Side which initiated a state change of an engine entity.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Originator {
    /// Change made by this client.
    #[display(fmt = "local")]
    Local,

    /// Change made by the server or the remote peer.
    #[display(fmt = "remote")]
    Remote,
}

/// Pause state of a producer or a consumer.
///
/// Both sides pause and resume independently, each one only toggling its own
/// flag. Media flows only when neither side has paused it.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct PauseState {
    /// Paused by this client.
    pub locally_paused: bool,

    /// Paused by the server or the remote peer.
    pub remotely_paused: bool,
}

impl PauseState {
    /// Creates a new [`PauseState`] with the provided flags.
    #[inline]
    pub fn new(locally_paused: bool, remotely_paused: bool) -> Self {
        Self {
            locally_paused,
            remotely_paused,
        }
    }

    /// Marks media as paused by the provided [`Originator`].
    #[inline]
    pub fn pause(&mut self, by: Originator) {
        self.set(by, true);
    }

    /// Clears the pause flag of the provided [`Originator`].
    #[inline]
    pub fn resume(&mut self, by: Originator) {
        self.set(by, false);
    }

    /// Indicates whether media is paused by anyone.
    #[inline]
    pub fn is_paused(self) -> bool {
        self.locally_paused || self.remotely_paused
    }

    /// Indicates whether media is effectively flowing.
    #[inline]
    pub fn is_active(self) -> bool {
        !self.is_paused()
    }

    fn set(&mut self, by: Originator, paused: bool) {
        match by {
            Originator::Local => self.locally_paused = paused,
            Originator::Remote => self.remotely_paused = paused,
        }
    }
}

/// Connection state of a room session.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    /// Waiting for the signalling channel to open or the join to finish.
    #[display(fmt = "connecting")]
    Connecting,

    /// Joined the room.
    #[display(fmt = "connected")]
    Connected,

    /// Session is over.
    #[display(fmt = "closed")]
    Closed,
}

/// Identity and mode of the local participant of a room session.
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of the joined room.
    pub room_id: String,

    /// Unique name of the local peer in the room.
    pub peer_name: String,

    /// Human-readable name of the local peer.
    pub display_name: String,

    /// Connection state of this session.
    pub state: RoomState,

    /// Whether local media should be produced on join.
    pub produce: bool,

    /// Whether remote video is currently suppressed.
    pub audio_only: bool,

    /// Whether the local peer has raised its hand.
    pub raised_hand: bool,

    /// Whether this session is terminated. Once set, never cleared.
    pub closed: bool,
}

impl Session {
    /// Creates a new [`Session`] in [`RoomState::Connecting`] state.
    pub fn new(
        room_id: String,
        peer_name: String,
        display_name: String,
        produce: bool,
    ) -> Self {
        Self {
            room_id,
            peer_name,
            display_name,
            state: RoomState::Connecting,
            produce,
            audio_only: false,
            raised_hand: false,
            closed: false,
        }
    }
}
