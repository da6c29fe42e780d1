//! Interactive field-control console.
//!
//! Connects to the configured field set and maps single-letter operator
//! commands to field-control requests. Command failures are logged and never
//! fatal; the only way out is `q`.

use anyhow::Result;
use fieldclient::{ClientEvent, FieldControlConfig, FieldSetClient, SessionManager};
use std::sync::Arc;
use std::time::Duration;
use tm_fieldctl::bin_common::config_path_from_env;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config_path = config_path_from_env();
    let config = FieldControlConfig::load(&config_path)?;
    fieldclient::init_tracing(&config.log_level);

    let session = Arc::new(SessionManager::new(
        config.server.address.clone(),
        config.admin_password.clone(),
    ));
    let client = FieldSetClient::new(session, config.server.address.clone(), config.field_set.id)
        .with_handshake_timeout(Duration::from_secs(config.handshake_timeout_secs));

    print_banner(&config);

    // Mirror server-pushed state into the log from a dedicated thread.
    let events = client.events();
    std::thread::spawn(move || {
        while let Ok(event) = events.recv() {
            match event {
                ClientEvent::Ready => info!("Field set ready for commands"),
                ClientEvent::Disconnected => {
                    warn!("Connection lost; enter 'c' to reconnect");
                }
                ClientEvent::FieldActivated(field_id) => {
                    info!("Active field is now {}", field_id);
                }
                ClientEvent::DecodeError(reason) => warn!("Dropped frame: {}", reason),
                ClientEvent::Connected | ClientEvent::Notice(_) => {}
            }
        }
    });

    if let Err(e) = client.connect().await {
        error!("Initial connect failed: {}", e);
        info!("Enter 'c' to retry");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();

    while let Some(line) = lines.next_line().await? {
        let result = match line.trim() {
            "s" => client.start_match().await,
            "e" => client.end_early().await,
            "a" => client.abort_match().await,
            "r" => client.reset_timer().await,
            "n" | "p" => {
                info!("Match queueing is not supported");
                Ok(())
            }
            "c" => client.connect().await,
            "q" => break,
            "h" => {
                print_help();
                Ok(())
            }
            "" => Ok(()),
            other => {
                info!("Command not recognized: {}", other);
                print_help();
                Ok(())
            }
        };

        if let Err(e) = result {
            error!("{}", e);
        }
    }

    client.disconnect().await;
    info!("Field console stopped");
    Ok(())
}

fn print_banner(config: &FieldControlConfig) {
    info!("");
    info!("========================================");
    info!("Starting field console");
    info!("Server: {}", config.server.address);
    info!("Field set: {}", config.field_set.id);
    info!("========================================");
    info!("");
}

fn print_help() {
    println!(
        "Commands:\n\
         \x20 s - start match\n\
         \x20 e - end match early\n\
         \x20 a - abort match\n\
         \x20 r - reset timer\n\
         \x20 n - queue next match (not supported)\n\
         \x20 p - queue previous match (not supported)\n\
         \x20 c - reconnect\n\
         \x20 q - quit"
    );
}
