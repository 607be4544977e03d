//! Gateway connection status.

use anyhow::Result;
use colored::Colorize;

use tenure_core::client::ConnectionState;

use crate::api::ApiClient;

pub async fn execute(api: &ApiClient, json: bool) -> Result<()> {
    let status = api.status().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let label = match status.status {
        ConnectionState::Ready => "ready".green().bold(),
        ConnectionState::Authenticated => "authenticated".yellow(),
        ConnectionState::Pairing => "pairing".yellow(),
        ConnectionState::AuthFailure => "auth_failure".red().bold(),
        ConnectionState::Disconnected => "disconnected".red(),
    };
    println!("Connection: {label}");

    if status.status == ConnectionState::Pairing {
        match status.qr {
            Some(_) => println!("Pairing QR available in the admin panel"),
            None => println!("Waiting for pairing QR..."),
        }
    }
    Ok(())
}
