use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::debug;

use crate::error::{PublishError, Result};
use crate::snapshot::Snapshot;

/// Port the home-automation listeners expect snapshots on.
pub const DEFAULT_BROADCAST_PORT: u16 = 65432;

const SEND_TIMEOUT: Duration = Duration::from_millis(200);

/// Hands a finished snapshot to whoever consumes it.
pub trait Publisher {
    fn publish(&mut self, snapshot: &Snapshot) -> Result<()>;
}

impl<P: Publisher + ?Sized> Publisher for &mut P {
    fn publish(&mut self, snapshot: &Snapshot) -> Result<()> {
        (**self).publish(snapshot)
    }
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&mut self, snapshot: &Snapshot) -> Result<()> {
        (**self).publish(snapshot)
    }
}

/// Sends each snapshot as one JSON datagram.
#[derive(Debug)]
pub struct UdpPublisher {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpPublisher {
    /// Bind an ephemeral local socket able to reach `target`.
    ///
    /// Broadcast is enabled for IPv4 targets so the limited broadcast
    /// address works out of the box.
    pub fn bind(target: SocketAddr) -> Result<Self> {
        let local = match target {
            SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket = UdpSocket::bind(local).map_err(PublishError::Bind)?;
        if target.is_ipv4() {
            socket.set_broadcast(true).map_err(PublishError::Bind)?;
        }
        socket
            .set_write_timeout(Some(SEND_TIMEOUT))
            .map_err(PublishError::Bind)?;
        Ok(Self { socket, target })
    }

    /// `255.255.255.255:65432`.
    pub fn default_target() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), DEFAULT_BROADCAST_PORT)
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Publisher for UdpPublisher {
    fn publish(&mut self, snapshot: &Snapshot) -> Result<()> {
        let payload = serde_json::to_vec(snapshot)?;
        let sent = self
            .socket
            .send_to(&payload, self.target)
            .map_err(|source| PublishError::Send {
                target: self.target,
                source,
            })?;
        debug!(channel = %snapshot.kind(), target = %self.target, bytes = sent, "snapshot published");
        Ok(())
    }
}
