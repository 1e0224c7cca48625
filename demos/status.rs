use vjoy_feeder::{Binding, DeviceId};

fn main() {
    let binding = Binding::global().expect("load vJoy interface");
    match binding.check_version() {
        Ok(v) => println!("vJoy enabled, interface 0x{:04X} / driver 0x{:04X}", v.dll, v.driver),
        Err(e) => println!("warning: {e}"),
    }
    for id in DeviceId::all() {
        println!("device {id:>2}: {}", binding.query_status(id));
    }
}
