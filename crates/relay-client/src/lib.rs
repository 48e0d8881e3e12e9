//! Client side of an SSE webhook relay: subscribes to a channel on a public
//! relay server and replays each delivered webhook against a local HTTP
//! target.

pub mod channel;
pub mod client;
pub mod error;
pub mod event;
pub mod logger;
pub mod webhook;

pub use client::{Client, Options};
pub use error::Error;
pub use logger::{ConsoleLogger, Logger};
