//! Per-connection driver state.
//!
//! A [`DeviceContext`] exists from a successful open until close. It owns the
//! transport handle, the capabilities computed at open, the last decoded
//! snapshot and the pending [`EffectCommand`]. It is never shared: every
//! driver entry point takes it by `&mut`.
//!
//! Reconnecting means a fresh context; capabilities are never recomputed.

use crate::error::{DriverError, Result};
use crate::probe::ConnectionKind;
use crate::snapshot::{EffectCommand, NormalizedState};
use crate::transport::{HidTransport, TransportError};
use tracing::{info, warn};

/// Fixed per-connection capability flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverCapabilities {
    pub is_dongle: bool,
    pub is_bluetooth: bool,
    pub supports_audio: bool,
    pub supports_effects: bool,
    pub supports_led: bool,
}

impl DriverCapabilities {
    /// Transport flags for a classified connection. A dongle is never Bluetooth.
    pub fn for_connection(connection: ConnectionKind) -> Self {
        Self {
            is_dongle: connection == ConnectionKind::Dongle,
            is_bluetooth: connection == ConnectionKind::Bluetooth,
            ..Self::default()
        }
    }

    pub fn connection(&self) -> ConnectionKind {
        if self.is_dongle {
            ConnectionKind::Dongle
        } else if self.is_bluetooth {
            ConnectionKind::Bluetooth
        } else {
            ConnectionKind::Usb
        }
    }
}

pub struct DeviceContext {
    path: String,
    transport: Option<Box<dyn HidTransport>>,
    caps: DriverCapabilities,
    last_state: Option<NormalizedState>,
    effects: EffectCommand,
    disconnected: bool,
    counter_advances: bool,
}

impl DeviceContext {
    pub fn new(
        path: impl Into<String>,
        transport: Box<dyn HidTransport>,
        caps: DriverCapabilities,
        effects: EffectCommand,
    ) -> Self {
        debug_assert!(!(caps.is_dongle && caps.is_bluetooth));
        Self {
            path: path.into(),
            transport: Some(transport),
            caps,
            last_state: None,
            effects,
            disconnected: false,
            counter_advances: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn capabilities(&self) -> &DriverCapabilities {
        &self.caps
    }

    pub fn effects(&self) -> &EffectCommand {
        &self.effects
    }

    pub(crate) fn effects_mut(&mut self) -> &mut EffectCommand {
        &mut self.effects
    }

    pub fn last_state(&self) -> Option<&NormalizedState> {
        self.last_state.as_ref()
    }

    pub(crate) fn replace_state(&mut self, state: NormalizedState) {
        self.last_state = Some(state);
    }

    /// Whether the report counter has been seen to change on this connection.
    /// Some third-party pads leave it at zero.
    pub fn counter_advances(&self) -> bool {
        self.counter_advances
    }

    pub(crate) fn note_counter_advance(&mut self) {
        self.counter_advances = true;
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Usable for I/O: open and not disconnected.
    pub fn check_live(&self) -> Result<()> {
        if self.disconnected {
            Err(DriverError::Disconnected)
        } else if self.transport.is_none() {
            Err(DriverError::Closed)
        } else {
            Ok(())
        }
    }

    /// Record a disconnect. Returns `true` only the first time.
    pub(crate) fn mark_disconnected(&mut self) -> bool {
        if self.disconnected {
            return false;
        }
        info!("{} disconnected", self.path);
        self.disconnected = true;
        true
    }

    pub(crate) fn read(&mut self, buf: &mut [u8]) -> std::result::Result<usize, TransportError> {
        let transport = self.transport.as_mut().ok_or(TransportError::Closed)?;
        transport.read_timeout(buf, 0)
    }

    /// Write a complete output report. A short count is an error.
    pub(crate) fn send(&mut self, report: &[u8]) -> Result<()> {
        self.check_live()?;
        let transport = self.transport.as_mut().ok_or(DriverError::Closed)?;

        #[cfg(feature = "debug-log")]
        tracing::trace!("TX {} bytes: {:02x?}", report.len(), report);

        let written = transport.write(report).map_err(|e| {
            warn!("{}: output write failed: {e}", self.path);
            DriverError::Write(e)
        })?;
        if written != report.len() {
            warn!("{}: short output write ({written}/{})", self.path, report.len());
            return Err(DriverError::ShortWrite {
                written,
                expected: report.len(),
            });
        }
        Ok(())
    }

    /// Release the transport. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            info!("closed {}", self.path);
        }
    }
}

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("caps", &self.caps)
            .field("effects", &self.effects)
            .field("disconnected", &self.disconnected)
            .field("counter_advances", &self.counter_advances)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::VirtualDevice;

    fn context(dev: &VirtualDevice) -> DeviceContext {
        DeviceContext::new(
            "virt",
            Box::new(dev.transport()),
            DriverCapabilities::for_connection(ConnectionKind::Usb),
            EffectCommand::default(),
        )
    }

    #[test]
    fn dongle_is_never_bluetooth() {
        let caps = DriverCapabilities::for_connection(ConnectionKind::Dongle);
        assert!(caps.is_dongle);
        assert!(!caps.is_bluetooth);
        assert_eq!(caps.connection(), ConnectionKind::Dongle);
        assert_eq!(
            DriverCapabilities::for_connection(ConnectionKind::Bluetooth).connection(),
            ConnectionKind::Bluetooth
        );
    }

    #[test]
    fn close_is_idempotent() {
        let dev = VirtualDevice::new();
        let mut ctx = context(&dev);
        assert_eq!(dev.open_handles(), 1);
        ctx.close();
        ctx.close();
        assert_eq!(dev.open_handles(), 0);
        assert!(matches!(ctx.check_live(), Err(DriverError::Closed)));
    }

    #[test]
    fn short_write_is_surfaced() {
        let dev = VirtualDevice::new();
        dev.set_write_limit(Some(3));
        let mut ctx = context(&dev);
        let err = ctx.send(&[0u8; 8]).unwrap_err();
        assert!(matches!(
            err,
            DriverError::ShortWrite {
                written: 3,
                expected: 8
            }
        ));
    }

    #[test]
    fn counter_tracking_starts_off() {
        let dev = VirtualDevice::new();
        let mut ctx = context(&dev);
        assert!(!ctx.counter_advances());
        ctx.note_counter_advance();
        assert!(ctx.counter_advances());
    }

    #[test]
    fn disconnect_reported_once() {
        let dev = VirtualDevice::new();
        let mut ctx = context(&dev);
        assert!(ctx.mark_disconnected());
        assert!(!ctx.mark_disconnected());
        assert!(matches!(ctx.send(&[0]), Err(DriverError::Disconnected)));
    }
}
