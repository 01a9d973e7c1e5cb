// TCP accept loop with per-connection watchdog
//
// One client at a time: the listener is not polled while a connection is served, so
// extra clients wait in the kernel backlog. The serving task owns the motion state
// and is the only place that publishes, which keeps frame updates and watchdog
// stops strictly ordered.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{
    ACCEPT_RETRY_DELAY, Args, BridgeConfig, LISTEN_BACKLOG, TOPIC_CMD_VEL, TOPIC_HEALTH,
};
use crate::error::{BridgeError, Result};
use crate::mapping;
use crate::messages::{BridgeHealth, Twist};
use crate::protocol::{CommandFrame, FRAME_LEN, ProtocolError};
use crate::sink::{MotionSink, ZenohSink};
use crate::state::MotionState;
use crate::watchdog::Watchdog;

/// Why the link to the client went away
#[derive(Debug)]
pub enum CloseReason {
    /// Client closed the connection
    Eof,
    /// A read returned less than a full frame
    Malformed(ProtocolError),
    /// Socket error
    Io(io::Error),
}

/// Everything that can change the motion state while a client is connected
#[derive(Debug)]
enum LinkEvent {
    Frame(CommandFrame),
    Closed(CloseReason),
    WatchdogExpired,
}

/// How serving a client ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Connection lost or closed, back to accepting
    Disconnected,
    /// Client went silent, connection closed by the bridge
    WatchdogExpired,
    /// Interrupt symbol received, the bridge should exit
    Interrupted,
}

pub struct Bridge<S: MotionSink> {
    listener: TcpListener,
    sink: S,
    config: BridgeConfig,
    health: Option<BridgeHealth>,
}

impl<S: MotionSink> Bridge<S> {
    /// Bind the listener; failure here is fatal for the process
    pub async fn bind(config: BridgeConfig, sink: S) -> Result<Self> {
        let addr = config.listen_addr;
        let listener = listen(addr).map_err(|source| BridgeError::Bind { addr, source })?;
        info!(
            "Listening on {} ({}ms watchdog timeout)",
            listener.local_addr()?,
            config.watchdog_timeout.as_millis()
        );

        Ok(Self {
            listener,
            sink,
            config,
            health: None,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and serve clients until an interrupt frame arrives
    ///
    /// Disconnections and watchdog stops are handled here and never returned.
    pub async fn run(&mut self) -> Result<()> {
        self.set_health(BridgeHealth::Disconnected).await;

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Accept failed: {}, retrying", e);
                    sleep(ACCEPT_RETRY_DELAY).await;
                    continue;
                }
            };

            info!("Client connected: {}", peer);
            let end = self.serve(stream).await;
            self.set_health(BridgeHealth::Disconnected).await;

            if end == SessionEnd::Interrupted {
                info!("Interrupt received from {}, shutting down", peer);
                return Ok(());
            }
            info!("Client {} gone ({:?}), waiting for connection", peer, end);
        }
    }

    /// Serve like [`Bridge::run`] until `shutdown` resolves
    ///
    /// An interrupt frame has already published its stop, so only an external
    /// shutdown publishes a final one here.
    pub async fn run_until<F: Future>(&mut self, shutdown: F) -> Result<()> {
        let shutdown_requested = tokio::select! {
            res = self.run() => {
                res?;
                false
            }
            _ = shutdown => true,
        };

        if shutdown_requested {
            info!("Shutdown requested, stopping robot");
            self.stop().await;
        }
        Ok(())
    }

    /// Publish a final stop, used on process shutdown
    pub async fn stop(&mut self) {
        self.emit(&Twist::stop()).await;
        self.set_health(BridgeHealth::Disconnected).await;
    }

    /// Serve one client until it disconnects, goes silent or interrupts
    async fn serve(&mut self, mut stream: TcpStream) -> SessionEnd {
        let mut state = MotionState::new();
        let mut watchdog = Watchdog::new(self.config.watchdog_timeout);
        let mut buf = [0u8; FRAME_LEN];

        watchdog.arm();
        self.set_health(BridgeHealth::Ok).await;

        loop {
            // A frame that is ready wins over an expiry in the same poll
            let event = tokio::select! {
                biased;
                read = stream.read(&mut buf) => match read {
                    Ok(0) => LinkEvent::Closed(CloseReason::Eof),
                    Ok(n) => match CommandFrame::decode(&buf[..n]) {
                        Ok(frame) => LinkEvent::Frame(frame),
                        Err(e) => LinkEvent::Closed(CloseReason::Malformed(e)),
                    },
                    Err(e) => LinkEvent::Closed(CloseReason::Io(e)),
                },
                _ = watchdog.expired() => LinkEvent::WatchdogExpired,
            };

            match event {
                LinkEvent::Frame(frame) => {
                    watchdog.arm();
                    debug!(
                        "Frame {:?}: turn={:.3} speed={:.3}",
                        frame.symbol as char, frame.turn_rate, frame.speed_scale
                    );

                    let twist = state.apply(&frame);
                    self.emit(&twist).await;

                    if mapping::is_interrupt(frame.symbol) {
                        let _ = stream.shutdown().await;
                        return SessionEnd::Interrupted;
                    }
                }
                LinkEvent::Closed(reason) => {
                    match reason {
                        CloseReason::Eof => info!("Client closed the connection"),
                        CloseReason::Malformed(e) => warn!("{}, dropping client", e),
                        CloseReason::Io(e) => warn!("Read failed: {}, dropping client", e),
                    }
                    let twist = state.force_stop();
                    self.emit(&twist).await;
                    return SessionEnd::Disconnected;
                }
                LinkEvent::WatchdogExpired => {
                    warn!(
                        "No command for {}ms, stopping robot",
                        watchdog.timeout().as_millis()
                    );
                    let twist = state.force_stop();
                    self.emit(&twist).await;
                    self.set_health(BridgeHealth::CmdStale).await;

                    // The read may never return on its own, close to release the client
                    if let Err(e) = stream.shutdown().await {
                        debug!("Shutdown after watchdog expiry failed: {}", e);
                    }
                    return SessionEnd::WatchdogExpired;
                }
            }
        }
    }

    async fn emit(&mut self, twist: &Twist) {
        if let Err(e) = self.sink.publish_velocity(twist).await {
            warn!("Failed to publish velocity: {}", e);
        }
    }

    /// Publish health on change only
    async fn set_health(&mut self, health: BridgeHealth) {
        if self.health == Some(health) {
            return;
        }
        self.health = Some(health);
        if let Err(e) = self.sink.publish_health(health).await {
            warn!("Failed to publish health: {}", e);
        }
    }
}

/// Open the zenoh session, bind the listener and serve until interrupted or Ctrl-C
pub async fn run(
    args: &Args,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let sink = ZenohSink::declare(&session, TOPIC_CMD_VEL, TOPIC_HEALTH).await?;

    let mut bridge = Bridge::bind(BridgeConfig::from(args), sink).await?;
    bridge.run_until(tokio::signal::ctrl_c()).await?;
    Ok(())
}

/// Listener with address reuse and a short backlog
fn listen(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{ChannelSink, Emission};
    use std::time::Duration;

    fn local_config() -> BridgeConfig {
        BridgeConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            watchdog_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_bind_reports_address() {
        let (sink, _rx) = ChannelSink::new();
        let bridge = Bridge::bind(local_config(), sink).await.unwrap();
        let addr = bridge.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_fatal() {
        let (sink, _rx) = ChannelSink::new();
        let first = Bridge::bind(local_config(), sink).await.unwrap();

        // Reuse-address does not allow two live listeners on one port
        let mut config = local_config();
        config.listen_addr = first.local_addr().unwrap();
        let (sink, _rx) = ChannelSink::new();
        let err = Bridge::bind(config, sink).await.err().unwrap();
        assert!(matches!(err, BridgeError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_stop_publishes_zero_and_disconnected() {
        let (sink, mut rx) = ChannelSink::new();
        let mut bridge = Bridge::bind(local_config(), sink).await.unwrap();
        bridge.stop().await;

        assert_eq!(rx.recv().await, Some(Emission::Velocity(Twist::stop())));
        assert_eq!(
            rx.recv().await,
            Some(Emission::Health(BridgeHealth::Disconnected))
        );
    }
}
