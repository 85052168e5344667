use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use loft_proto::command::{self, Command};
use loft_proto::telemetry::{decode_fiducial, decode_proximity, FiducialReading, ProximityReading};
use loft_proto::{Direction, OperationMode, ProtoError, Waypoint};

/// A reply never exceeds one bounded read.
const MAX_REPLY: usize = 1024;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("connect {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },
    #[error("link i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Proto(#[from] ProtoError),
    #[error("controller replied `{0}` where an ack was expected")]
    ErrorReply(String),
}

/// Console-side request client. Every operation opens its own connection,
/// writes one command line, reads at most one reply of up to 1024 bytes,
/// and drops the connection. No retries, no timeouts, no reuse; callers
/// that need a deadline wrap the future themselves.
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    endpoint: String,
}

impl TelemetryClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn connect(&self) -> Result<TcpStream, LinkError> {
        TcpStream::connect(&self.endpoint).await.map_err(|source| LinkError::Connect {
            endpoint: self.endpoint.clone(),
            source,
        })
    }

    async fn exchange(&self, line: &str) -> Result<String, LinkError> {
        let mut stream = self.connect().await?;
        stream.write_all(line.as_bytes()).await?;
        let mut buf = [0u8; MAX_REPLY];
        let n = stream.read(&mut buf).await?;
        Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
    }

    async fn fire(&self, line: &str) -> Result<(), LinkError> {
        let mut stream = self.connect().await?;
        stream.write_all(line.as_bytes()).await?;
        Ok(())
    }

    async fn exchange_ack(&self, line: &str) -> Result<(), LinkError> {
        let reply = self.exchange(line).await?;
        if reply == command::ACK {
            Ok(())
        } else {
            Err(LinkError::ErrorReply(reply))
        }
    }

    pub async fn request_fiducial(&self) -> Result<FiducialReading, LinkError> {
        let reply = self.exchange(&Command::At.to_line()).await?;
        Ok(decode_fiducial(&reply)?)
    }

    pub async fn request_proximity(&self) -> Result<ProximityReading, LinkError> {
        let reply = self.exchange(&Command::Tof.to_line()).await?;
        Ok(decode_proximity(&reply)?)
    }

    pub async fn request_waypoint(&self) -> Result<Waypoint, LinkError> {
        let reply = self.exchange(&Command::CurrWp.to_line()).await?;
        Ok(Waypoint::from_csv(&reply)?)
    }

    /// Manual motion. The direction word is validated before any socket
    /// work; nothing invalid reaches the wire. No reply is read.
    pub async fn send_acceleration(&self, dir: &str) -> Result<(), LinkError> {
        let dir: Direction = dir.parse().map_err(LinkError::Proto)?;
        self.fire(dir.as_str()).await
    }

    /// Replace the controller waypoint and wait for its ack, so a follow-up
    /// `request_waypoint` observes the new value.
    pub async fn send_waypoint(&self, wp: &Waypoint) -> Result<(), LinkError> {
        self.exchange_ack(&Command::SetWp(*wp).to_line()).await
    }

    pub async fn send_drive_mode(&self, mode: OperationMode) -> Result<(), LinkError> {
        self.exchange_ack(&Command::SetMode(mode).to_line()).await
    }

    /// Ask the controller to shut down; blocks for its one farewell reply.
    pub async fn send_terminate(&self) -> Result<(), LinkError> {
        let reply = self.exchange(&Command::Quit.to_line()).await?;
        if reply == command::QUITTING {
            Ok(())
        } else {
            Err(LinkError::ErrorReply(reply))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accepts a single connection, records the request line, answers with
    /// `reply`, and hangs up.
    async fn one_shot_server(reply: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let n = sock.read(&mut buf).await.unwrap();
            sock.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (endpoint, handle)
    }

    #[tokio::test]
    async fn bad_direction_fails_before_any_network() {
        // Nothing listens at this endpoint; a connect attempt would surface
        // as LinkError::Connect, not the validation fault.
        let client = TelemetryClient::new("127.0.0.1:1");
        let err = client.send_acceleration("diagonally").await.unwrap_err();
        assert!(matches!(err, LinkError::Proto(ProtoError::UnknownDirection(_))));
    }

    #[tokio::test]
    async fn valid_direction_does_reach_the_socket() {
        let (endpoint, handle) = one_shot_server(command::ACK).await;
        let client = TelemetryClient::new(endpoint);
        client.send_acceleration("forward").await.unwrap();
        assert_eq!(handle.await.unwrap(), "forward");
    }

    #[tokio::test]
    async fn send_waypoint_requires_the_ack() {
        let (endpoint, handle) = one_shot_server(command::ACK).await;
        let client = TelemetryClient::new(endpoint);
        let wp = Waypoint { x: 1, y: 2, z: 3, theta: 4 };
        client.send_waypoint(&wp).await.unwrap();
        assert_eq!(handle.await.unwrap(), "wp 1,2,3,4");

        let (endpoint, _handle) = one_shot_server("error: invalid wp payload").await;
        let client = TelemetryClient::new(endpoint);
        let err = client.send_waypoint(&wp).await.unwrap_err();
        assert!(matches!(err, LinkError::ErrorReply(_)));
    }

    #[tokio::test]
    async fn request_waypoint_decodes_reply() {
        let (endpoint, handle) = one_shot_server("1,2,3,4").await;
        let client = TelemetryClient::new(endpoint);
        let wp = client.request_waypoint().await.unwrap();
        assert_eq!(wp, Waypoint { x: 1, y: 2, z: 3, theta: 4 });
        assert_eq!(handle.await.unwrap(), "curr wp");
    }
}
