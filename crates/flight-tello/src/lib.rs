//! # Flight Tello
//!
//! Drone backend for a real Tello-class quadcopter. Commands are plain
//! ASCII datagrams acknowledged with a line containing `ok`; telemetry
//! arrives on a second socket as semicolon-delimited `key:value` records
//! that a background listener folds into the shared state.

pub mod protocol;

use async_trait::async_trait;
use chrono::Utc;
use flight_core::{DroneBackend, DroneState, FlightError, FlightResult, MoveDirection, RcCommand};
use parking_lot::Mutex;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

/// Adapter configuration. Defaults match the stock device: commands to
/// `192.168.10.1:8889`, telemetry bound on 8890.
#[derive(Debug, Clone)]
pub struct TelloConfig {
    pub device_addr: SocketAddr,
    pub local_ip: IpAddr,
    pub command_port: u16,
    pub telemetry_port: u16,
    /// How long to wait for a command acknowledgement
    pub command_timeout: Duration,
    /// Telemetry poll interval; bounds how fast disconnect is noticed
    pub telemetry_timeout: Duration,
}

impl Default for TelloConfig {
    fn default() -> Self {
        Self {
            device_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 10, 1)), 8889),
            local_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            command_port: 8889,
            telemetry_port: 8890,
            command_timeout: Duration::from_secs(10),
            telemetry_timeout: Duration::from_secs(2),
        }
    }
}

struct TelloInner {
    state: Mutex<DroneState>,
    running: AtomicBool,
}

/// Controls a real drone via its UDP SDK
pub struct TelloDrone {
    config: TelloConfig,
    inner: Arc<TelloInner>,
    cmd_socket: Mutex<Option<Arc<UdpSocket>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Default for TelloDrone {
    fn default() -> Self {
        Self::new()
    }
}

impl TelloDrone {
    pub fn new() -> Self {
        Self::with_config(TelloConfig::default())
    }

    pub fn with_config(config: TelloConfig) -> Self {
        Self {
            config,
            inner: Arc::new(TelloInner {
                state: Mutex::new(DroneState::new()),
                running: AtomicBool::new(false),
            }),
            cmd_socket: Mutex::new(None),
            listener: Mutex::new(None),
        }
    }

    /// Send a command and wait for its reply. Timeouts surface as
    /// `NoAck`; the adapter itself stays usable.
    async fn send_command(&self, cmd: &str) -> FlightResult<String> {
        let socket = self
            .cmd_socket
            .lock()
            .clone()
            .ok_or(FlightError::NotConnected)?;

        debug!(command = cmd, "sending");
        socket.send_to(cmd.as_bytes(), self.config.device_addr).await?;

        let mut buf = [0u8; 1024];
        let (len, _) = time::timeout(self.config.command_timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| FlightError::no_ack(cmd))??;

        Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
    }

    /// Send a command that must be acknowledged with `ok`
    async fn command_expect_ok(&self, cmd: &str) -> FlightResult<()> {
        let resp = self.send_command(cmd).await?;
        if resp.to_lowercase().contains("ok") {
            Ok(())
        } else {
            warn!(command = cmd, response = %resp.trim(), "command rejected");
            Err(FlightError::no_ack(cmd))
        }
    }

    fn stop_listener(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
    }
}

/// Receive telemetry packets until the running flag clears. The poll
/// timeout bounds how long a stale socket is held after disconnect.
async fn telemetry_listener(socket: UdpSocket, inner: Arc<TelloInner>, poll: Duration) {
    let mut buf = [0u8; 1024];
    while inner.running.load(Ordering::SeqCst) {
        match time::timeout(poll, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => {
                let raw = String::from_utf8_lossy(&buf[..len]);
                let record = protocol::parse_telemetry(&raw);
                record.apply(&mut inner.state.lock());
            }
            Ok(Err(e)) => {
                debug!("telemetry read failed: {e}");
            }
            Err(_) => continue,
        }
    }
    debug!("telemetry listener stopped");
}

#[async_trait]
impl DroneBackend for TelloDrone {
    async fn connect(&self) -> FlightResult<()> {
        let cmd_socket = Arc::new(
            UdpSocket::bind((self.config.local_ip, self.config.command_port)).await?,
        );
        let telemetry_socket =
            UdpSocket::bind((self.config.local_ip, self.config.telemetry_port)).await?;

        *self.cmd_socket.lock() = Some(cmd_socket);

        // Activation string switches the device into SDK mode
        if let Err(e) = self.command_expect_ok("command").await {
            *self.cmd_socket.lock() = None;
            return Err(e);
        }

        self.inner.running.store(true, Ordering::SeqCst);
        let handle = tokio::spawn(telemetry_listener(
            telemetry_socket,
            Arc::clone(&self.inner),
            self.config.telemetry_timeout,
        ));
        *self.listener.lock() = Some(handle);

        self.inner.state.lock().is_connected = true;
        info!(device = %self.config.device_addr, "connected to drone");
        Ok(())
    }

    async fn disconnect(&self) {
        self.emergency_stop().await;
        // Listener goes down before its socket so nothing reads a closing fd
        self.stop_listener();
        *self.cmd_socket.lock() = None;
        self.inner.state.lock().is_connected = false;
        info!("disconnected from drone");
    }

    async fn takeoff(&self) -> FlightResult<()> {
        self.command_expect_ok("takeoff").await?;
        self.inner.state.lock().is_flying = true;
        Ok(())
    }

    async fn land(&self) -> FlightResult<()> {
        self.command_expect_ok("land").await?;
        let mut state = self.inner.state.lock();
        state.is_flying = false;
        state.speed = 0.0;
        Ok(())
    }

    async fn emergency_stop(&self) {
        // Best effort; the local state is cleared regardless
        let _ = self.send_command("emergency").await;
        let mut state = self.inner.state.lock();
        state.is_flying = false;
        state.speed = 0.0;
    }

    async fn move_by(&self, direction: MoveDirection, distance_cm: u32) -> FlightResult<()> {
        let distance = distance_cm.clamp(20, 500);
        self.command_expect_ok(&format!("{direction} {distance}"))
            .await
    }

    async fn rotate(&self, degrees: i32) -> FlightResult<()> {
        let cmd = if degrees >= 0 {
            format!("cw {}", degrees)
        } else {
            format!("ccw {}", degrees.unsigned_abs())
        };
        self.command_expect_ok(&cmd).await
    }

    async fn set_speed(&self, speed_cm_s: u32) -> FlightResult<()> {
        let speed = speed_cm_s.clamp(10, 100);
        self.command_expect_ok(&format!("speed {speed}")).await
    }

    fn send_rc(&self, rc: RcCommand) {
        // Fire and forget; RC updates are latest-wins and never acked
        if let Some(socket) = self.cmd_socket.lock().clone() {
            let cmd = format!(
                "rc {} {} {} {}",
                rc.left_right, rc.forward_back, rc.up_down, rc.yaw
            );
            let _ = socket.try_send_to(cmd.as_bytes(), self.config.device_addr);
        }
    }

    fn state(&self) -> DroneState {
        let mut state = self.inner.state.lock();
        state.timestamp = Utc::now();
        state.clone()
    }

    async fn go_to(&self, x: f64, y: f64, z: f64, speed_cm_s: u32) -> FlightResult<()> {
        let speed = speed_cm_s.clamp(10, 100);
        self.command_expect_ok(&format!("go {x:.0} {y:.0} {z:.0} {speed}"))
            .await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::sync::mpsc;

    /// Loopback stand-in for the device: acks every command with `ok` and
    /// reports what it received
    async fn spawn_fake_device(ack: &'static str) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = socket.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut buf = [0u8; 1024];
            while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
                let cmd = String::from_utf8_lossy(&buf[..len]).into_owned();
                let _ = tx.send(cmd);
                let _ = socket.send_to(ack.as_bytes(), peer).await;
            }
        });

        (addr, rx)
    }

    fn loopback_drone(device_addr: SocketAddr) -> TelloDrone {
        TelloDrone::with_config(TelloConfig {
            device_addr,
            local_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            command_port: 0,
            telemetry_port: 0,
            command_timeout: Duration::from_millis(500),
            telemetry_timeout: Duration::from_millis(50),
        })
    }

    #[tokio::test]
    async fn test_connect_and_takeoff() {
        let (addr, mut rx) = spawn_fake_device("ok").await;
        let drone = loopback_drone(addr);

        drone.connect().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "command");
        assert!(drone.state().is_connected);

        drone.takeoff().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "takeoff");
        assert!(drone.state().is_flying);

        drone.disconnect().await;
        assert!(!drone.state().is_connected);
        assert!(!drone.state().is_flying);
    }

    #[tokio::test]
    async fn test_command_wire_format() {
        let (addr, mut rx) = spawn_fake_device("ok").await;
        let drone = loopback_drone(addr);
        drone.connect().await.unwrap();
        rx.recv().await.unwrap(); // activation

        drone.move_by(MoveDirection::Forward, 900).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "forward 500"); // clamped

        drone.move_by(MoveDirection::Back, 5).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "back 20");

        drone.rotate(90).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "cw 90");

        drone.rotate(-45).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "ccw 45");

        drone.set_speed(250).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "speed 100");

        drone.go_to(100.0, -50.0, 80.0, 60).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "go 100 -50 80 60");

        drone.send_rc(RcCommand::new(0, 45, 0, -30));
        assert_eq!(rx.recv().await.unwrap(), "rc 0 45 0 -30");
    }

    #[tokio::test]
    async fn test_rejection_is_no_ack() {
        let (addr, mut rx) = spawn_fake_device("error").await;
        let drone = loopback_drone(addr);

        // Activation itself is rejected, so connect fails cleanly
        assert!(matches!(
            drone.connect().await,
            Err(FlightError::NoAck(_))
        ));
        assert!(!drone.state().is_connected);
        assert_eq!(rx.recv().await.unwrap(), "command");

        // And later commands report not connected
        assert!(matches!(
            drone.takeoff().await,
            Err(FlightError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_silent_device_times_out() {
        // A bound socket that never replies
        let silent = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = silent.local_addr().unwrap();

        let drone = loopback_drone(addr);
        let result = drone.connect().await;
        assert!(matches!(result, Err(FlightError::NoAck(_))));
    }
}
