//! Transport probe.
//!
//! Enumeration metadata does not say whether a PS4-class pad is on a cable or
//! on Bluetooth. Asking for a feature report does: the serial-number report
//! only answers over USB.
//!
//! The heuristic is best-effort. A wireless adapter with no pad paired answers
//! with all zeros and so reads as Bluetooth; callers must tolerate that.

use crate::transport::{HidTransport, MAX_REPORT_LEN};
use tracing::debug;

/// How a device is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    Usb,
    /// USB receiver relaying a paired pad. Uses USB framing.
    Dongle,
    Bluetooth,
}

/// Bytes of the feature response inspected for a non-zero value.
const PROBE_BYTES: usize = 16;

/// Fetch feature report `report_id` into `data`.
///
/// Returns `false` if the transport refused the request.
pub fn read_feature_report(transport: &mut dyn HidTransport, report_id: u8, data: &mut [u8]) -> bool {
    let mut report = [0u8; MAX_REPORT_LEN + 1];
    report[0] = report_id;
    if let Err(e) = transport.get_feature_report(&mut report) {
        debug!("feature report 0x{report_id:02x} failed: {e}");
        return false;
    }
    let n = data.len().min(report.len());
    data[..n].copy_from_slice(&report[..n]);
    true
}

/// Classify a non-dongle connection by requesting `serial_report_id`.
///
/// Any non-zero byte in the answer means USB. A refused request, or an
/// all-zero answer, means Bluetooth.
pub fn probe_connection(transport: &mut dyn HidTransport, serial_report_id: u8) -> ConnectionKind {
    let mut data = [0u8; PROBE_BYTES];
    if read_feature_report(transport, serial_report_id, &mut data) && data.iter().any(|&b| b != 0) {
        ConnectionKind::Usb
    } else {
        ConnectionKind::Bluetooth
    }
}
