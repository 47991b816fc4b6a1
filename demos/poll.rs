//! Minimal polling demo: create the standard devices, tick the manager,
//! and print whatever is held down.
//!
//! Run with `RUST_LOG=debug` to watch device discovery.

use std::time::{Duration, Instant};

use intake::prelude::*;

fn main() {
    env_logger::init();

    let mut manager = InputManager::new(InputConfig::default());
    manager.init().expect("init input manager");

    let keyboard = manager
        .create_keyboard(DeviceVariant::Standard)
        .expect("create keyboard");
    manager
        .create_mouse(DeviceVariant::Standard)
        .expect("create mouse");
    manager.create_controllers(4).expect("create controllers");

    manager.set_device_listener(Some(Box::new(|id, kind, index, added| {
        let verb = if added { "attached" } else { "detached" };
        println!("device {id} ({} {index}) {verb}", kind.type_name());
    })));

    println!("polling for 10 seconds; press keys / plug in a controller...");
    let started = Instant::now();
    let mut held = [DeviceButtonSpec::default(); 16];
    let mut last = Instant::now();

    while started.elapsed() < Duration::from_secs(10) {
        let dt = last.elapsed().as_secs_f32();
        last = Instant::now();
        manager.update(dt).expect("update");

        let count = manager.any_button_down(&mut held);
        for spec in &held[..count] {
            let Some(device) = manager.get_device(spec.device) else {
                continue;
            };
            let name = device.button_name(spec.button).unwrap_or("?");
            println!("{} {}: {name}", device.kind().type_name(), device.index());
        }
        let _ = keyboard;

        std::thread::sleep(Duration::from_millis(16));
    }

    manager.exit().expect("exit");
}
