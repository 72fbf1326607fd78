//! Client-side signalling and media session controller of a multi-party media
//! room.
//!
//! [`Room`] owns a [`SignallingChannel`] and a [`MediaEngine`], mediates
//! between them and projects everything happening in the room into
//! [`StateUpdate`]s delivered to a [`RoomObserver`].
//!
//! Everything here is single-threaded: the controller expects to be driven
//! inside a [`tokio::task::LocalSet`].
//!
//! [`MediaEngine`]: engine::MediaEngine
//! [`Room`]: room::Room
//! [`RoomObserver`]: observer::RoomObserver
//! [`SignallingChannel`]: signalling::SignallingChannel
//! [`StateUpdate`]: observer::StateUpdate

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

#[macro_use]
pub mod utils;
pub mod conf;
pub mod engine;
pub mod log;
pub mod media;
pub mod observer;
pub mod preferences;
pub mod room;
pub mod signalling;
pub mod state;

#[doc(inline)]
pub use self::{
    conf::Conf,
    room::{Room, RoomError, RoomHandle},
};
