use padlink::backends::virtual_input::VirtualBackend;
use padlink::{DeviceDescriptor, DeviceManager, DriverConfig, InputKind};

fn main() {
    let mut manager = DeviceManager::new(VirtualBackend::new(), &DriverConfig::default());

    // A wireless adapter is recognized by id, so no probe answer is needed.
    let pad = manager
        .backend_mut()
        .plug(DeviceDescriptor::new(0x054c, 0x0ba0, "virtual:demo").with_name("Demo Adapter"));

    let id = manager.discover()[0];
    manager.open(id).expect("open virtual pad");
    manager.set_player_index(id, 1).expect("set player");
    manager.rumble(id, 0x8000, 0x2000).expect("rumble");
    println!("(Virtual) {} output report(s) written", pad.writes().len());

    // USB state report: left stick pushed right, cross held, battery full.
    let mut report = vec![0u8; 64];
    report[0] = 0x01;
    report[1..5].copy_from_slice(&[0xff, 0x80, 0x80, 0x80]);
    report[5] = 0x28;
    report[30] = 0x0a;
    report[35] = 0x80;
    report[39] = 0x80;
    pad.feed(report);
    pad.disconnect();

    for event in manager.poll() {
        match event.kind {
            InputKind::AxisMoved { axis, value } => println!("(Virtual) {axis:?} = {value}"),
            InputKind::ButtonPressed { button } => println!("(Virtual) {button:?} pressed"),
            InputKind::ButtonReleased { button } => println!("(Virtual) {button:?} released"),
            InputKind::PowerChanged { level } => println!("(Virtual) battery {level:?}"),
            InputKind::Touchpad { finger, down, .. } => {
                println!("(Virtual) finger {finger} {}", if down { "down" } else { "up" })
            }
            InputKind::Disconnected => println!("(Virtual) {} disconnected", event.device),
        }
    }
}
