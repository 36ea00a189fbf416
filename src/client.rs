//! The per-connection client actor and its handle.
//!
//! [`Client`] is a cheap cloneable handle over a mailbox. A spawned task
//! owns the session, the subscriber registry, and the transport, and
//! serializes user requests and inbound lines through one `select!` loop,
//! so no two transitions ever observe intermediate state.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::command::Command;
use crate::error::{ClientError, Result, TransportError};
use crate::event::Event;
use crate::ext::{Extension, ExtensionRegistry};
use crate::handler::{Dispatcher, EventSink};
use crate::session::{Session, SessionState, StateSnapshot};
use crate::transport::{Transport, TransportConfig};

/// Construction-time configuration.
pub struct ClientConfig {
    /// Answer server PINGs automatically.
    pub autoping: bool,
    /// Log every line and surface malformed CTCP frames as events.
    pub debug: bool,
    /// Subscribers registered before the first event can fire.
    pub event_handlers: Vec<EventSink>,
    /// Hooks for messages the built-in dispatcher does not handle.
    pub extensions: Vec<Box<dyn Extension>>,
}

impl Default for ClientConfig {
    fn default() -> ClientConfig {
        ClientConfig {
            autoping: true,
            debug: false,
            event_handlers: Vec::new(),
            extensions: Vec::new(),
        }
    }
}

/// Handle to a running client actor.
#[derive(Clone, Debug)]
pub struct Client {
    tx: mpsc::Sender<Request>,
}

#[allow(clippy::large_enum_variant)]
enum Request {
    Connect {
        server: String,
        port: u16,
        config: TransportConfig,
        reply: oneshot::Sender<Result<()>>,
    },
    ConnectVia {
        transport: Transport,
        server: String,
        port: u16,
        reply: oneshot::Sender<Result<()>>,
    },
    Logon {
        pass: String,
        nick: String,
        user: String,
        realname: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Send {
        command: Command,
        reply: oneshot::Sender<Result<()>>,
    },
    Quit {
        message: Option<String>,
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        reply: oneshot::Sender<Result<()>>,
    },
    AddHandler {
        sink: EventSink,
        reply: oneshot::Sender<()>,
    },
    RemoveHandler {
        sink: EventSink,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<StateSnapshot>,
    },
    Channels {
        reply: oneshot::Sender<Vec<String>>,
    },
    ChannelUsers {
        channel: String,
        reply: oneshot::Sender<Result<Vec<String>>>,
    },
    ChannelTopic {
        channel: String,
        reply: oneshot::Sender<Result<String>>,
    },
    ChannelKind {
        channel: String,
        reply: oneshot::Sender<Result<Option<char>>>,
    },
    ChannelHasUser {
        channel: String,
        nick: String,
        reply: oneshot::Sender<Result<bool>>,
    },
}

impl Client {
    /// Spawn the actor task and return its handle. Requires a running
    /// tokio runtime.
    pub fn spawn(config: ClientConfig) -> Client {
        let (tx, rx) = mpsc::channel(64);
        let state = SessionState {
            autoping: config.autoping,
            debug: config.debug,
            ..SessionState::default()
        };
        let actor = Actor {
            session: Session::new(state, ExtensionRegistry::new(config.extensions)),
            dispatcher: Dispatcher::new(config.event_handlers),
            transport: None,
        };
        tokio::spawn(async move {
            if let Err(err) = actor.run(rx).await {
                error!(%err, "client actor terminated");
            }
        });
        Client { tx }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| ClientError::Stopped)?;
        reply_rx.await.map_err(|_| ClientError::Stopped)
    }

    /// Open a connection. Any existing connection is closed first.
    pub async fn connect(
        &self,
        server: &str,
        port: u16,
        config: TransportConfig,
    ) -> Result<()> {
        self.request(|reply| Request::Connect {
            server: server.to_string(),
            port,
            config,
            reply,
        })
        .await?
    }

    /// Attach an already-established transport (an in-memory pipe, or a
    /// stream connected by other means) instead of dialing out.
    pub async fn connect_via(
        &self,
        transport: Transport,
        server: &str,
        port: u16,
    ) -> Result<()> {
        self.request(|reply| Request::ConnectVia {
            transport,
            server: server.to_string(),
            port,
            reply,
        })
        .await?
    }

    /// Register with the server: PASS (when non-empty), NICK, USER.
    pub async fn logon(
        &self,
        pass: &str,
        nick: &str,
        user: &str,
        realname: &str,
    ) -> Result<()> {
        self.request(|reply| Request::Logon {
            pass: pass.to_string(),
            nick: nick.to_string(),
            user: user.to_string(),
            realname: realname.to_string(),
            reply,
        })
        .await?
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.request(|reply| Request::Send { command, reply }).await?
    }

    /// Send a PRIVMSG.
    pub async fn privmsg(&self, target: &str, text: &str) -> Result<()> {
        self.send(Command::PRIVMSG(target.to_string(), text.to_string()))
            .await
    }

    /// Send a NOTICE.
    pub async fn notice(&self, target: &str, text: &str) -> Result<()> {
        self.send(Command::NOTICE(target.to_string(), text.to_string()))
            .await
    }

    /// Send a CTCP reply (NOTICE with `\x01` framing).
    pub async fn ctcp(&self, target: &str, payload: &str) -> Result<()> {
        self.send(Command::CTCP(target.to_string(), payload.to_string()))
            .await
    }

    /// Send a "/me" action to a channel.
    pub async fn me(&self, channel: &str, text: &str) -> Result<()> {
        self.send(Command::ACTION(channel.to_string(), text.to_string()))
            .await
    }

    /// Request a nick change. The session nick updates when the server
    /// confirms it.
    pub async fn nick(&self, new: &str) -> Result<()> {
        self.send(Command::NICK(new.to_string())).await
    }

    /// Join a channel, with an optional key.
    pub async fn join(&self, channel: &str, key: Option<&str>) -> Result<()> {
        self.send(Command::JOIN(
            channel.to_string(),
            key.map(str::to_string),
        ))
        .await
    }

    /// Part a channel, with an optional reason.
    pub async fn part(&self, channel: &str, reason: Option<&str>) -> Result<()> {
        self.send(Command::PART(
            channel.to_string(),
            reason.map(str::to_string),
        ))
        .await
    }

    /// Kick a user from a channel.
    pub async fn kick(&self, channel: &str, nick: &str, message: Option<&str>) -> Result<()> {
        self.send(Command::KICK(
            channel.to_string(),
            nick.to_string(),
            message.map(str::to_string),
        ))
        .await
    }

    /// Invite a user to a channel.
    pub async fn invite(&self, nick: &str, channel: &str) -> Result<()> {
        self.send(Command::INVITE(nick.to_string(), channel.to_string()))
            .await
    }

    /// Set modes on a channel or user.
    pub async fn mode(&self, target: &str, flags: &str, args: Option<&str>) -> Result<()> {
        self.send(Command::MODE(
            target.to_string(),
            flags.to_string(),
            args.map(str::to_string),
        ))
        .await
    }

    /// Request the NAMES list of a channel.
    pub async fn names(&self, channel: &str) -> Result<()> {
        self.send(Command::NAMES(channel.to_string())).await
    }

    /// Request a WHO listing; the result arrives as one [`Event::Who`].
    pub async fn who(&self, channel: &str) -> Result<()> {
        self.send(Command::WHO(channel.to_string())).await
    }

    /// Send a raw line.
    pub async fn send_raw(&self, line: &str) -> Result<()> {
        self.send(Command::Raw(line.to_string())).await
    }

    /// Disconnect, sending QUIT first when connected.
    pub async fn quit(&self, message: Option<&str>) -> Result<()> {
        self.request(|reply| Request::Quit {
            message: message.map(str::to_string),
            reply,
        })
        .await?
    }

    /// Disconnect like [`quit`](Client::quit), then terminate the actor.
    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| Request::Stop { reply }).await?
    }

    /// Register an event subscriber. Idempotent per channel.
    pub async fn add_handler(&self, sink: EventSink) -> Result<()> {
        self.request(|reply| Request::AddHandler { sink, reply }).await
    }

    /// Deregister an event subscriber.
    pub async fn remove_handler(&self, sink: &EventSink) -> Result<()> {
        let sink = sink.clone();
        self.request(|reply| Request::RemoveHandler { sink, reply })
            .await
    }

    /// Create, register, and return a fresh event stream.
    pub async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<Event>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.add_handler(tx).await?;
        Ok(rx)
    }

    /// Snapshot of the observable session fields.
    pub async fn state(&self) -> Result<StateSnapshot> {
        self.request(|reply| Request::Snapshot { reply }).await
    }

    /// Names of all joined channels.
    pub async fn channels(&self) -> Result<Vec<String>> {
        self.request(|reply| Request::Channels { reply }).await
    }

    /// Occupants of a channel.
    pub async fn channel_users(&self, channel: &str) -> Result<Vec<String>> {
        self.request(|reply| Request::ChannelUsers {
            channel: channel.to_string(),
            reply,
        })
        .await?
    }

    /// Topic of a channel.
    pub async fn channel_topic(&self, channel: &str) -> Result<String> {
        self.request(|reply| Request::ChannelTopic {
            channel: channel.to_string(),
            reply,
        })
        .await?
    }

    /// Visibility marker of a channel from its NAMES reply.
    pub async fn channel_kind(&self, channel: &str) -> Result<Option<char>> {
        self.request(|reply| Request::ChannelKind {
            channel: channel.to_string(),
            reply,
        })
        .await?
    }

    /// Whether a nick is present in a channel.
    pub async fn channel_has_user(&self, channel: &str, nick: &str) -> Result<bool> {
        self.request(|reply| Request::ChannelHasUser {
            channel: channel.to_string(),
            nick: nick.to_string(),
            reply,
        })
        .await?
    }
}

enum Flow {
    Continue,
    Shutdown(Result<()>),
}

struct Actor {
    session: Session,
    dispatcher: Dispatcher,
    transport: Option<Transport>,
}

/// Await the next inbound line, or park forever while disconnected (the
/// select arm is disabled then, but its future must stay harmless).
async fn next_line(
    transport: &mut Option<Transport>,
) -> Result<Option<String>, TransportError> {
    match transport {
        Some(t) => t.next_line().await,
        None => std::future::pending().await,
    }
}

impl Actor {
    async fn run(mut self, mut rx: mpsc::Receiver<Request>) -> Result<()> {
        loop {
            tokio::select! {
                req = rx.recv() => {
                    let Some(req) = req else {
                        // Every handle dropped: disconnect quietly and stop.
                        self.teardown(false).await;
                        return Ok(());
                    };
                    match self.handle_request(req).await {
                        Flow::Continue => {}
                        Flow::Shutdown(result) => return result,
                    }
                }
                inbound = next_line(&mut self.transport), if self.transport.is_some() => {
                    match inbound {
                        Ok(Some(line)) => {
                            if let Err(err) = self.handle_line(&line).await {
                                self.teardown(true).await;
                                return Err(err.into());
                            }
                        }
                        Ok(None) => {
                            debug!("server closed the connection");
                            self.teardown(true).await;
                        }
                        Err(err) => {
                            warn!(%err, "transport failed");
                            self.teardown(true).await;
                            return Err(err.into());
                        }
                    }
                }
            }
        }
    }

    /// Dispatch one inbound line: wire replies first (so a PING answer is
    /// the immediately next send), then event fan-out.
    async fn handle_line(&mut self, line: &str) -> Result<(), TransportError> {
        if self.session.state.debug {
            debug!(line, "recv");
        }
        let transition = self.session.apply_line(line);
        for reply in transition.replies {
            self.send_line(reply.to_string()).await?;
        }
        for event in &transition.events {
            self.dispatcher.emit(event);
        }
        Ok(())
    }

    async fn send_line(&mut self, line: String) -> Result<(), TransportError> {
        let Some(transport) = self.transport.as_mut() else {
            return Err(TransportError::Closed);
        };
        if self.session.state.debug {
            debug!(line = %line, "send");
        }
        transport.send_line(line).await
    }

    /// Close the transport and reset per-connection state. `announce`
    /// controls whether subscribers hear a `Disconnected` event (a
    /// reconnect replacing the old transport stays quiet).
    async fn teardown(&mut self, announce: bool) {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        let was_connected = self.session.state.connected;
        self.session.state.reset_connection();
        if announce && was_connected {
            self.dispatcher.emit(&Event::Disconnected);
        }
    }

    fn gate(&self) -> Result<()> {
        if !self.session.state.connected {
            Err(ClientError::NotConnected)
        } else if !self.session.state.logged_on {
            Err(ClientError::NotLoggedIn)
        } else {
            Ok(())
        }
    }

    fn attach(&mut self, transport: Transport, server: String, port: u16, tls: bool) {
        let st = &mut self.session.state;
        st.server = server;
        st.port = port;
        st.tls = tls;
        st.connected = true;
        self.transport = Some(transport);
        self.dispatcher.emit(&Event::Connected {
            server: self.session.state.server.clone(),
            port,
        });
    }

    async fn handle_request(&mut self, req: Request) -> Flow {
        match req {
            Request::Connect {
                server,
                port,
                config,
                reply,
            } => {
                self.teardown(false).await;
                match Transport::connect(&server, port, &config).await {
                    Ok(transport) => {
                        self.attach(transport, server, port, config.tls);
                        let _ = reply.send(Ok(()));
                    }
                    Err(err) => {
                        let _ = reply.send(Err(err.into()));
                    }
                }
                Flow::Continue
            }
            Request::ConnectVia {
                transport,
                server,
                port,
                reply,
            } => {
                self.teardown(false).await;
                let tls = matches!(transport, Transport::Tls { .. });
                self.attach(transport, server, port, tls);
                let _ = reply.send(Ok(()));
                Flow::Continue
            }
            Request::Logon {
                pass,
                nick,
                user,
                realname,
                reply,
            } => {
                if !self.session.state.connected {
                    let _ = reply.send(Err(ClientError::NotConnected));
                    return Flow::Continue;
                }
                if self.session.state.logged_on {
                    let _ = reply.send(Err(ClientError::AlreadyLoggedOn));
                    return Flow::Continue;
                }
                {
                    let st = &mut self.session.state;
                    st.pass = pass.clone();
                    st.nick = nick.clone();
                    st.user = user.clone();
                    st.realname = realname.clone();
                }
                let mut sequence = Vec::new();
                if !pass.is_empty() {
                    sequence.push(Command::PASS(pass));
                }
                sequence.push(Command::NICK(nick));
                sequence.push(Command::USER(user, realname));
                for command in sequence {
                    if let Err(err) = self.send_line(command.to_string()).await {
                        let reason = std::io::Error::other(err.to_string());
                        let _ = reply.send(Err(err.into()));
                        self.teardown(true).await;
                        return Flow::Shutdown(Err(TransportError::Io(reason).into()));
                    }
                }
                let _ = reply.send(Ok(()));
                Flow::Continue
            }
            Request::Send { command, reply } => {
                if let Err(err) = self.gate() {
                    let _ = reply.send(Err(err));
                    return Flow::Continue;
                }
                match self.send_line(command.to_string()).await {
                    Ok(()) => {
                        let _ = reply.send(Ok(()));
                        Flow::Continue
                    }
                    Err(err) => {
                        let reason = std::io::Error::other(err.to_string());
                        let _ = reply.send(Err(err.into()));
                        self.teardown(true).await;
                        Flow::Shutdown(Err(TransportError::Io(reason).into()))
                    }
                }
            }
            Request::Quit { message, reply } => {
                if self.session.state.connected {
                    // Best effort: the server may already be gone.
                    let _ = self.send_line(Command::QUIT(message).to_string()).await;
                    self.teardown(true).await;
                }
                let _ = reply.send(Ok(()));
                Flow::Continue
            }
            Request::Stop { reply } => {
                if self.session.state.connected {
                    let _ = self.send_line(Command::QUIT(None).to_string()).await;
                    self.teardown(true).await;
                }
                let _ = reply.send(Ok(()));
                Flow::Shutdown(Ok(()))
            }
            Request::AddHandler { sink, reply } => {
                self.dispatcher.add(sink);
                let _ = reply.send(());
                Flow::Continue
            }
            Request::RemoveHandler { sink, reply } => {
                self.dispatcher.remove(&sink);
                let _ = reply.send(());
                Flow::Continue
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(self.session.snapshot());
                Flow::Continue
            }
            Request::Channels { reply } => {
                let _ = reply.send(self.session.state.channels.channels());
                Flow::Continue
            }
            Request::ChannelUsers { channel, reply } => {
                let answer = self.session.state.channels.users(&channel);
                let _ = reply.send(answer.map_err(|_| ClientError::NotFound));
                Flow::Continue
            }
            Request::ChannelTopic { channel, reply } => {
                let answer = self.session.state.channels.topic(&channel);
                let _ = reply.send(answer.map_err(|_| ClientError::NotFound));
                Flow::Continue
            }
            Request::ChannelKind { channel, reply } => {
                let answer = self.session.state.channels.kind(&channel);
                let _ = reply.send(answer.map_err(|_| ClientError::NotFound));
                Flow::Continue
            }
            Request::ChannelHasUser {
                channel,
                nick,
                reply,
            } => {
                let answer = self.session.state.channels.has_user(&channel, &nick);
                let _ = reply.send(answer.map_err(|_| ClientError::NotFound));
                Flow::Continue
            }
        }
    }
}
