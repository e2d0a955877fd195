use padlink::backends::hid::HidapiBackend;
use padlink::{DeviceManager, DriverConfig, EventFilter, InputKind, LogListener};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Optional config path as the first argument.
    let config = match std::env::args().nth(1) {
        Some(path) => DriverConfig::load(&path).expect("load config"),
        None => DriverConfig::default(),
    };

    let backend = HidapiBackend::new().expect("init hidapi");
    let mut manager = DeviceManager::new(backend, &config);
    manager
        .event_bus_mut()
        .add_listener(LogListener::new(), EventFilter::ButtonsOnly, None);

    let ids = manager.discover();
    println!("Found {} controller(s)", ids.len());
    for (id, desc) in manager.devices() {
        println!("  {id}: {desc}");
    }
    manager.open_all();
    for (slot, id) in ids.iter().enumerate() {
        let _ = manager.set_player_index(*id, slot as i32);
    }

    // Aggregation buffers (per flush window)
    let flush_every = Duration::from_millis(40);
    let mut last_flush = Instant::now();
    let mut axes = BTreeMap::new();
    let mut changes: BTreeMap<_, Vec<String>> = BTreeMap::new();
    let mut gone = BTreeSet::new();

    loop {
        for event in manager.poll() {
            match event.kind {
                InputKind::AxisMoved { axis, value } => {
                    axes.insert((event.device, axis.index()), (axis, value));
                }
                InputKind::ButtonPressed { button } => {
                    changes.entry(event.device).or_default().push(format!("+{button:?}"));
                }
                InputKind::ButtonReleased { button } => {
                    changes.entry(event.device).or_default().push(format!("-{button:?}"));
                }
                InputKind::PowerChanged { level } => {
                    changes.entry(event.device).or_default().push(format!("power={level:?}"));
                }
                InputKind::Touchpad { .. } => {}
                InputKind::Disconnected => {
                    gone.insert(event.device);
                }
            }
        }

        if last_flush.elapsed() >= flush_every {
            let mut lines: BTreeMap<_, Vec<String>> = BTreeMap::new();
            for ((device, _), (axis, value)) in &axes {
                lines
                    .entry(*device)
                    .or_default()
                    .push(format!("{axis:?}={value}"));
            }
            for (device, items) in changes.iter_mut() {
                lines
                    .entry(*device)
                    .or_default()
                    .push(format!("[{}]", items.join(",")));
            }
            for (device, sections) in lines {
                println!("{device}: {}", sections.join(" "));
            }
            for device in &gone {
                println!("{device}: disconnected");
            }

            axes.clear();
            changes.clear();
            gone.clear();
            last_flush = Instant::now();
        }

        // Keep CPU usage sane
        std::thread::sleep(Duration::from_millis(5));
    }
}
