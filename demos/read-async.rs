use tokio::sync::mpsc::Receiver;
use utun_rs::BoxError;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();
    let (tx, rx) = tokio::sync::mpsc::channel::<()>(1);

    ctrlc2::set_async_handler(async move {
        tx.send(()).await.expect("Signal error");
    })
    .await;

    main_entry(rx).await?;
    Ok(())
}
#[cfg(not(target_os = "macos"))]
async fn main_entry(_quit: Receiver<()>) -> Result<(), BoxError> {
    unimplemented!()
}
#[cfg(target_os = "macos")]
async fn main_entry(mut quit: Receiver<()>) -> Result<(), BoxError> {
    let dev = utun_rs::DeviceBuilder::new().mtu(1400).build_async()?;
    println!("name = {}, mtu = {}", dev.name(), dev.mtu());

    let mut buf = vec![0; dev.packet_buffer_len()];
    loop {
        tokio::select! {
            _ = quit.recv() => {
                println!("Quit...");
                break;
            }
            len = dev.recv(&mut buf) => {
                println!("pkt: {:?}", &buf[..len?]);
            }
        };
    }
    dev.close()?;
    Ok(())
}
