use crate::event::{InputEvent, InputKind};
use crate::eventbus::InputListener;
use tracing::{debug, info, trace};

/// A listener that logs input events through `tracing`.
///
/// Continuous samples (axes, touch) go to `trace`, edges to `debug`,
/// disconnects to `info`.
#[derive(Debug, Default)]
pub struct LogListener;

impl LogListener {
    pub fn new() -> Self {
        LogListener
    }
}

impl InputListener for LogListener {
    fn on_input(&mut self, event: &InputEvent) {
        match &event.kind {
            InputKind::AxisMoved { .. } | InputKind::Touchpad { .. } => {
                trace!(device = %event.device, "{:?}", event.kind)
            }
            InputKind::Disconnected => info!(device = %event.device, "disconnected"),
            kind => debug!(device = %event.device, "{:?}", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventbus::{EventFilter, InputEventBus};
    use crate::metadata::DeviceId;
    use std::time::Instant;

    #[test]
    fn logs_without_a_subscriber() {
        let mut bus = InputEventBus::new();
        bus.add_listener(LogListener::new(), EventFilter::All, None);
        bus.emit_all(&[
            InputEvent {
                device: DeviceId(0),
                at: Instant::now(),
                kind: InputKind::Disconnected,
            },
            InputEvent {
                device: DeviceId(0),
                at: Instant::now(),
                kind: InputKind::PowerChanged {
                    level: crate::event::PowerLevel::Low,
                },
            },
        ]);
        assert_eq!(bus.len(), 1);
    }
}
