//! Best-effort UDP multicast of the animation state.

use crate::animation::EyeState;
use crate::channel::{encode, MESSAGE_LEN};
use crate::config::TransportConfig;
use crate::{Error, Result};
use log::{debug, info, warn};
use socket2::{Domain, Protocol, Socket, Type};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

// Datagrams larger than a message are read whole and rejected by the decoder
const RECEIVE_BUFFER_LEN: usize = 2048;

fn udp_socket() -> Result<Socket> {
    Ok(Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?)
}

/// Bind `port` on all interfaces, shared with other listeners on this host
fn shared_socket(port: u16) -> Result<UdpSocket> {
    let socket = udp_socket()?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)).into())?;
    Ok(socket.into())
}

/// Sends encoded state to a fixed destination.
///
/// Send failures are logged and otherwise ignored.
pub struct StatePublisher {
    socket: UdpSocket,
    destination: SocketAddr,
    sent: u64,
}

impl StatePublisher {
    /// Publisher for the configured multicast group
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let socket = udp_socket()?;
        socket.set_multicast_if_v4(&config.interface)?;
        socket.set_multicast_ttl_v4(config.ttl)?;
        socket.set_multicast_loop_v4(config.loopback)?;
        socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)).into())?;

        let destination = config.destination();
        info!("Publishing eye state to {} via {}", destination, config.interface);
        Ok(Self {
            socket: socket.into(),
            destination,
            sent: 0,
        })
    }

    /// Publisher sending unicast datagrams to `destination`
    pub fn to_address(destination: SocketAddr) -> Result<Self> {
        if !destination.is_ipv4() {
            return Err(Error::Transport(format!("IPv6 destination {destination} is not supported")));
        }
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        Ok(Self {
            socket,
            destination,
            sent: 0,
        })
    }

    #[must_use]
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Number of datagrams handed to the OS
    #[must_use]
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Send `state`, returning whether the datagram left the socket
    pub fn publish(&mut self, state: &EyeState) -> bool {
        let message = encode(state);
        match self.socket.send_to(&message, self.destination) {
            Ok(_) => {
                self.sent += 1;
                true
            }
            Err(e) => {
                warn!("Failed to publish eye state: {}", e);
                false
            }
        }
    }
}

/// Non-blocking receiver that drains whatever has arrived since the last call
pub struct StateSubscriber {
    socket: UdpSocket,
    buffer: Vec<u8>,
}

impl StateSubscriber {
    /// Bind the configured port and join the multicast group.
    ///
    /// The port is shared so that several displays can run on one host.
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let socket = shared_socket(config.port)?;
        socket.join_multicast_v4(&config.group, &config.interface)?;
        info!(
            "Joined multicast group {} on port {} via {}",
            config.group, config.port, config.interface
        );
        Self::from_socket(socket)
    }

    /// Subscriber on a plain unicast address
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        Self::from_socket(UdpSocket::bind(addr)?)
    }

    fn from_socket(socket: UdpSocket) -> Result<Self> {
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            buffer: vec![0; RECEIVE_BUFFER_LEN],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Read every pending datagram, oldest first
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        let mut messages = Vec::new();
        loop {
            match self.socket.recv_from(&mut self.buffer) {
                Ok((len, _)) => {
                    if len != MESSAGE_LEN {
                        debug!("Received datagram of {} bytes", len);
                    }
                    messages.push(self.buffer[..len].to_vec());
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Failed to receive eye state: {}", e);
                    break;
                }
            }
        }
        messages
    }

    /// Read every pending datagram and return the most recent one
    pub fn drain_latest(&mut self) -> Option<Vec<u8>> {
        let mut messages = self.drain();
        if messages.len() > 1 {
            debug!("Dropped {} stale messages", messages.len() - 1);
        }
        messages.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::GazePoint;
    use crate::channel::decode;
    use std::thread;
    use std::time::{Duration, Instant};

    fn loopback_pair() -> (StatePublisher, StateSubscriber) {
        let subscriber = StateSubscriber::bind((Ipv4Addr::LOCALHOST, 0).into()).unwrap();
        let publisher = StatePublisher::to_address(subscriber.local_addr().unwrap()).unwrap();
        (publisher, subscriber)
    }

    fn wait_for(subscriber: &mut StateSubscriber, expected: &EyeState) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if let Some(message) = subscriber.drain_latest() {
                if decode(&message).ok().as_ref() == Some(expected) {
                    return true;
                }
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_empty_socket_yields_nothing() {
        let (_, mut subscriber) = loopback_pair();
        assert!(subscriber.drain_latest().is_none());
    }

    #[test]
    fn test_published_state_arrives() {
        let (mut publisher, mut subscriber) = loopback_pair();
        let state = EyeState {
            gaze_left: GazePoint::new(0.25, 0.5),
            gaze_right: GazePoint::new(0.25, 0.5),
            eyelid_closure: 0.1,
            update_requested: true,
            motion_detected: true,
        };
        assert!(publisher.publish(&state));
        assert_eq!(publisher.sent(), 1);
        assert!(wait_for(&mut subscriber, &state));
    }

    #[test]
    fn test_latest_message_wins() {
        let (mut publisher, mut subscriber) = loopback_pair();
        let first = EyeState {
            eyelid_closure: 0.2,
            ..EyeState::default()
        };
        let second = EyeState {
            eyelid_closure: 0.8,
            ..EyeState::default()
        };
        publisher.publish(&first);
        publisher.publish(&second);
        assert!(wait_for(&mut subscriber, &second));
    }

    #[test]
    fn test_drain_keeps_arrival_order() {
        let (mut publisher, mut subscriber) = loopback_pair();
        let states: Vec<EyeState> = [0.2, 0.4, 0.6]
            .into_iter()
            .map(|eyelid_closure| EyeState {
                eyelid_closure,
                ..EyeState::default()
            })
            .collect();
        for state in &states {
            publisher.publish(state);
        }

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut received = Vec::new();
        while received.len() < states.len() && Instant::now() < deadline {
            received.extend(subscriber.drain().iter().map(|message| decode(message).unwrap()));
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(received, states);
    }

    #[test]
    fn test_subscribers_share_port() {
        let config = TransportConfig {
            port: 45467,
            ..TransportConfig::default()
        };
        let first = StateSubscriber::new(&config).unwrap();
        let second = StateSubscriber::new(&config).unwrap();
        assert_eq!(first.local_addr().unwrap().port(), config.port);
        assert_eq!(second.local_addr().unwrap().port(), config.port);
    }

    #[test]
    fn test_ipv6_destination_rejected() {
        let addr: SocketAddr = "[::1]:45454".parse().unwrap();
        assert!(StatePublisher::to_address(addr).is_err());
    }
}
