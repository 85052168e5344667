use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, warn};

use loft_link::{LinkError, TelemetryClient};
use loft_proto::{OperationMode, Waypoint};

use crate::scheduler::{PollKind, PollScheduler};
use crate::store::{SharedState, WaypointEntry, WpField};
use crate::ConsoleConfig;

/// Console runtime: owns the scheduler and dispatches polls and operator
/// commands as fire-and-forget tasks against the controller. All network
/// faults stay inside their task, logged and surfaced as a banner, never
/// propagated to the tick loop.
pub struct Console {
    store: Arc<SharedState>,
    client: TelemetryClient,
    sched: PollScheduler,
    inflight: Arc<Semaphore>,
    request_timeout: Duration,
}

impl Console {
    pub fn new(cfg: &ConsoleConfig) -> Self {
        let store = Arc::new(SharedState::default());
        store.init_flags(cfg.fiducial_enabled, cfg.proximity_enabled);
        Self {
            store,
            client: TelemetryClient::new(cfg.endpoint.clone()),
            sched: PollScheduler::new(),
            inflight: Arc::new(Semaphore::new(cfg.max_inflight)),
            request_timeout: Duration::from_millis(cfg.request_timeout_ms),
        }
    }

    pub fn store(&self) -> Arc<SharedState> {
        self.store.clone()
    }

    /// One frame: decide the due poll and dispatch it. Never blocks on the
    /// network.
    pub fn tick(&mut self) {
        let Some(kind) = self.sched.advance(self.store.mode(), self.store.flags()) else {
            return;
        };
        self.dispatch(kind);
    }

    fn dispatch(&self, kind: PollKind) {
        // Bounded in-flight window: a saturated window drops this poll
        // rather than queueing without limit. The next slot retries.
        let Ok(permit) = self.inflight.clone().try_acquire_owned() else {
            warn!("poll window saturated, skipping {:?}", kind);
            return;
        };
        let client = self.client.clone();
        let store = self.store.clone();
        let deadline = self.request_timeout;
        tokio::spawn(async move {
            let _permit = permit;
            let outcome = match kind {
                PollKind::Waypoint => {
                    bounded(deadline, client.request_waypoint()).await.map(|wp| store.set_waypoint(wp))
                }
                PollKind::Fiducial => {
                    bounded(deadline, client.request_fiducial()).await.map(|r| store.set_fiducial(r))
                }
                PollKind::Proximity => {
                    bounded(deadline, client.request_proximity()).await.map(|r| store.set_proximity(r))
                }
            };
            if let Err(msg) = outcome {
                warn!("{:?} poll failed: {}", kind, msg);
                store.raise_banner(format!("{:?} poll failed: {}", kind, msg));
            }
        });
    }

    pub fn toggle_fiducial(&self) {
        let on = self.store.toggle_fiducial();
        info!("fiducial polling {}", if on { "enabled" } else { "disabled" });
    }

    pub fn toggle_proximity(&self) {
        let on = self.store.toggle_proximity();
        info!("proximity polling {}", if on { "enabled" } else { "disabled" });
    }

    /// Operator mode selection: record it locally, refresh the waypoint
    /// mirror, then tell the controller, each step awaited in order.
    pub fn select_mode(&self, mode: OperationMode) {
        self.store.set_mode(mode);
        let client = self.client.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            match client.request_waypoint().await {
                Ok(wp) => store.set_waypoint(wp),
                Err(e) => warn!("waypoint refresh failed: {}", e),
            }
            if let Err(e) = client.send_drive_mode(mode).await {
                warn!("mode change failed: {}", e);
                store.raise_banner(format!("mode change failed: {}", e));
            }
        });
    }

    /// Manual motion press. An invalid word banners locally and never
    /// reaches the wire.
    pub fn manual_move(&self, dir: &str) {
        let client = self.client.clone();
        let store = self.store.clone();
        let dir = dir.to_owned();
        tokio::spawn(async move {
            if let Err(e) = client.send_acceleration(&dir).await {
                warn!("manual command `{}` failed: {}", dir, e);
                store.raise_banner(e.to_string());
            }
        });
    }

    /// Button release in manual mode stops the motors.
    pub fn manual_release(&self) {
        self.manual_move("stop");
    }

    /// Submit the waypoint entry fields. Blank fields fall back to the
    /// hover defaults; the first non-numeric field raises a banner and
    /// takes focus, and nothing is sent. On success the controller's ack
    /// is awaited before the mirror refresh, so the read observes the new
    /// waypoint.
    pub fn submit_waypoint(&self) {
        let entry = self.store.entry();
        self.store.set_entry_active(None);
        let wp = match parse_entry(&entry) {
            Ok(wp) => wp,
            Err(field) => {
                self.store.raise_banner(format!("{} value is not a number", field.label()));
                self.store.set_entry_active(Some(field));
                return;
            }
        };
        let client = self.client.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = client.send_waypoint(&wp).await {
                warn!("waypoint send failed: {}", e);
                store.raise_banner(format!("waypoint send failed: {}", e));
                return;
            }
            match client.request_waypoint().await {
                Ok(cur) => store.set_waypoint(cur),
                Err(e) => warn!("waypoint refresh failed: {}", e),
            }
        });
    }

    /// Quit button: ask the controller to shut down.
    pub fn quit(&self) {
        let client = self.client.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            match client.send_terminate().await {
                Ok(()) => info!("controller acknowledged quit"),
                Err(e) => {
                    warn!("terminate failed: {}", e);
                    store.raise_banner(format!("terminate failed: {}", e));
                }
            }
        });
    }
}

async fn bounded<T>(
    deadline: Duration,
    fut: impl Future<Output = Result<T, LinkError>>,
) -> Result<T, String> {
    match timeout(deadline, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("request timed out".into()),
    }
}

fn parse_entry(entry: &WaypointEntry) -> Result<Waypoint, WpField> {
    fn parse_field(text: &str, default: i32, field: WpField) -> Result<i32, WpField> {
        let t = text.trim();
        if t.is_empty() {
            return Ok(default);
        }
        t.parse().map_err(|_| field)
    }
    Ok(Waypoint {
        x: parse_field(&entry.x, 0, WpField::X)?,
        y: parse_field(&entry.y, 0, WpField::Y)?,
        z: parse_field(&entry.z, 1, WpField::Z)?,
        theta: parse_field(&entry.theta, 0, WpField::Theta)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn console_at(endpoint: &str) -> Console {
        Console::new(&ConsoleConfig { endpoint: endpoint.into(), ..Default::default() })
    }

    #[test]
    fn entry_blanks_default_to_hover_pose() {
        let entry = WaypointEntry::default();
        assert_eq!(parse_entry(&entry).unwrap(), Waypoint::default());
    }

    #[test]
    fn entry_first_bad_field_wins() {
        let entry = WaypointEntry {
            x: "1".into(),
            y: "abc".into(),
            z: "oops".into(),
            theta: "4".into(),
            active: None,
        };
        assert_eq!(parse_entry(&entry), Err(WpField::Y));
    }

    #[tokio::test]
    async fn bad_entry_banners_and_sends_nothing() {
        // Nothing listens here; a send attempt would fault differently.
        let console = console_at("127.0.0.1:1");
        let store = console.store();
        store.set_entry_field(WpField::Theta, "north");
        console.submit_waypoint();

        assert_eq!(store.active_banner().as_deref(), Some("theta value is not a number"));
        assert_eq!(store.entry().active, Some(WpField::Theta));
    }

    #[tokio::test]
    async fn submit_sequences_ack_before_refresh() {
        // Two sequential request/reply connections: the wp write, then the
        // read-back of the stored value.
        let (endpoint, server) = scripted_server(&["ok", "5,6,7,8"]).await;

        let console = console_at(&endpoint);
        let store = console.store();
        store.set_entry_field(WpField::X, "5");
        store.set_entry_field(WpField::Y, "6");
        store.set_entry_field(WpField::Z, "7");
        store.set_entry_field(WpField::Theta, "8");
        console.submit_waypoint();

        let lines = server.await.unwrap();
        assert_eq!(lines, vec!["wp 5,6,7,8".to_string(), "curr wp".to_string()]);

        // The mirror picks up the read-back once the task completes.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if store.waypoint() == (Waypoint { x: 5, y: 6, z: 7, theta: 8 }) {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "mirror never updated");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(store.active_banner().is_none());
    }

    /// Serves `replies` over sequential one-request connections, returning
    /// the request lines seen.
    async fn scripted_server(
        replies: &'static [&'static str],
    ) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let mut lines = Vec::new();
            for reply in replies {
                let (mut sock, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 1024];
                let n = sock.read(&mut buf).await.unwrap();
                lines.push(String::from_utf8_lossy(&buf[..n]).into_owned());
                sock.write_all(reply.as_bytes()).await.unwrap();
            }
            lines
        });
        (endpoint, handle)
    }

    #[tokio::test]
    async fn invalid_manual_word_banners_and_stays_local() {
        let console = console_at("127.0.0.1:1");
        let store = console.store();
        console.manual_move("sideways");

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if let Some(banner) = store.active_banner() {
                assert!(banner.contains("direction not recognized"), "got {}", banner);
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "banner never raised");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn mode_select_refreshes_mirror_before_sending_mode() {
        let (endpoint, server) = scripted_server(&["0,0,1,0", "ok"]).await;
        let console = console_at(&endpoint);
        let store = console.store();
        console.select_mode(OperationMode::Waypoint);

        assert_eq!(store.mode(), OperationMode::Waypoint);
        let lines = server.await.unwrap();
        assert_eq!(lines, vec!["curr wp".to_string(), "mode 1".to_string()]);
    }

    #[tokio::test]
    async fn quit_sends_terminate() {
        let (endpoint, server) = scripted_server(&["quitting"]).await;
        let console = console_at(&endpoint);
        console.quit();
        assert_eq!(server.await.unwrap(), vec!["quit".to_string()]);
    }

    #[tokio::test]
    async fn poll_fault_raises_banner_not_panic() {
        let console = console_at("127.0.0.1:1");
        let store = console.store();
        console.dispatch(PollKind::Proximity);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if store.active_banner().is_some() {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "banner never raised");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
