//! # slirc-client
//!
//! An async IRC client library (RFC 1459/2812 with common real-world
//! extensions). One [`Client`] manages one long-lived connection: it turns
//! application intents (join, message, kick, quit) into wire commands,
//! turns server lines into a stream of typed [`Event`]s, and keeps a
//! consistent roster of joined channels and their occupants.
//!
//! ## Design
//!
//! - **One actor per connection**: a spawned task owns the session state and
//!   serializes user requests and inbound lines, so no two transitions ever
//!   observe intermediate state.
//! - **Sans-IO core**: the dispatch state machine consumes parsed messages
//!   and yields events and replies, with no sockets in sight, so the whole
//!   protocol surface is testable by feeding it lines.
//! - **Fire-and-forget fan-out**: subscribers are unbounded channels; a slow
//!   consumer never back-pressures the actor, and a dropped one is pruned.
//!
//! ## Quick start
//!
//! ```no_run
//! use slirc_client::{Client, ClientConfig, Event, TransportConfig};
//!
//! # async fn run() -> Result<(), slirc_client::ClientError> {
//! let client = Client::spawn(ClientConfig::default());
//! let mut events = client.subscribe().await?;
//!
//! client.connect("irc.libera.chat", 6697, TransportConfig { tls: true, ..Default::default() }).await?;
//! client.logon("", "mybot", "mybot", "My Bot").await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         Event::LoggedIn => client.join("#rust", None).await?,
//!         Event::ChannelMessage { from, channel, text } => {
//!             println!("<{from}:{channel}> {text}");
//!         }
//!         Event::Disconnected => break,
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]

pub mod casemap;
pub mod client;
pub mod codec;
pub mod command;
pub mod ctcp;
pub mod error;
pub mod event;
pub mod ext;
pub mod handler;
pub mod isupport;
pub mod message;
pub mod prefix;
pub mod response;
pub mod roster;
pub mod session;
pub mod transport;

pub use self::client::{Client, ClientConfig};
pub use self::command::Command;
pub use self::error::{ClientError, CodecError, MessageParseError, TransportError};
pub use self::event::{Event, WhoEntry};
pub use self::ext::Extension;
pub use self::handler::EventSink;
pub use self::message::Message;
pub use self::prefix::Prefix;
pub use self::roster::Roster;
pub use self::session::{SessionState, StateSnapshot};
pub use self::transport::{Transport, TransportConfig};
