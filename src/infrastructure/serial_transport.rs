// Bluetooth serial transport - raw fragment source for the ingest session
use anyhow::{Context, Result};
use bytes::{Bytes, BytesMut};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{info, warn};

const READ_BUFFER_SIZE: usize = 512;

/// Open the HC-05 rfcomm device (or any serial port the sensor shows up as).
pub fn open_port(port: &str, baud_rate: u32) -> Result<SerialStream> {
    tokio_serial::new(port, baud_rate)
        .open_native_async()
        .with_context(|| format!("Failed to open serial port {port}"))
}

/// Pump raw fragments from the port into the channel until the link dies.
/// The sender dropping on exit closes the channel, which is the disconnect
/// signal the session side drains on. Read errors count as EOF since a
/// vanished Bluetooth link surfaces as either depending on the platform.
pub fn spawn_reader(mut port: SerialStream, tx: mpsc::Sender<Bytes>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = BytesMut::with_capacity(READ_BUFFER_SIZE);
        loop {
            match port.read_buf(&mut buf).await {
                Ok(0) => {
                    info!("serial port closed, treating as disconnect");
                    break;
                }
                Ok(_) => {
                    if tx.send(buf.split().freeze()).await.is_err() {
                        // Session side went away first.
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "serial read failed, treating as disconnect");
                    break;
                }
            }
        }
    })
}
