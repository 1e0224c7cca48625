use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vjoy_feeder::{Binding, HidUsage, VJoyDevice};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let binding = Binding::global().expect("load vJoy interface");
    let mut dev = VJoyDevice::new(binding, 1).expect("acquire device 1");
    println!("Feeding device {} ({})", dev.id(), dev.status());

    // Sweep X from one end to the other, holding button 1 halfway through.
    for step in 0..=32 {
        let value = (step * 0x400).min(0x8000);
        dev.data_mut().set_axis(HidUsage::X, value).expect("stage X");
        dev.data_mut()
            .set_button(1, step >= 16)
            .expect("stage button 1");
        if !dev.update().expect("update") {
            eprintln!("driver rejected report at step {step}");
        }
        std::thread::sleep(Duration::from_millis(30));
    }

    dev.set_continuous_pov(1, 9000).expect("POV east");
    std::thread::sleep(Duration::from_millis(250));
    dev.reset().expect("reset");

    dev.relinquish().expect("relinquish");
}
