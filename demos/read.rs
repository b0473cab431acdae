use std::sync::mpsc::Receiver;
#[allow(unused_imports)]
use std::sync::Arc;

use utun_rs::BoxError;

fn main() -> Result<(), BoxError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();
    let (tx, rx) = std::sync::mpsc::channel();

    let handle = ctrlc2::set_handler(move || {
        tx.send(()).expect("Signal error.");
        true
    })
    .expect("Error setting Ctrl-C handler");

    main_entry(rx)?;
    handle.join().unwrap();
    Ok(())
}
#[cfg(not(target_os = "macos"))]
fn main_entry(_quit: Receiver<()>) -> Result<(), BoxError> {
    unimplemented!()
}
#[cfg(target_os = "macos")]
fn main_entry(quit: Receiver<()>) -> Result<(), BoxError> {
    use utun_rs::{BufferRegion, DeviceBuilder, Error};

    let dev = Arc::new(DeviceBuilder::new().name("utun7").mtu(1400).build_sync()?);
    println!("name = {}", dev.name());
    println!("mtu = {}", dev.mtu());
    // park the reader thread instead of polling
    dev.set_nonblocking(false)?;

    let dev_t = dev.clone();
    let _join = std::thread::spawn(move || {
        let mut buf = vec![0; dev_t.packet_buffer_len()];
        loop {
            let mut region = BufferRegion::new(&mut buf);
            match dev_t.read(&mut region) {
                Ok(amount) => println!("{:?}", &buf[0..amount]),
                Err(Error::WouldBlock) => continue,
                Err(Error::Closed) | Err(Error::Eof) => break,
                Err(e) => return Err(e),
            }
        }
        Ok::<(), Error>(())
    });
    _ = quit.recv();
    println!("Quit...");
    Ok(())
}
