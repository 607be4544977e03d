//! Enroll current participants of the target groups.

use anyhow::Result;
use colored::Colorize;

use crate::api::ApiClient;

pub async fn execute(api: &ApiClient) -> Result<()> {
    let report = api.sync().await?;

    for group in &report.groups {
        match &group.error {
            Some(error) => println!("{} {}: {error}", "ERR".red().bold(), group.id),
            None => println!(
                "{} {}: {} new of {} participants",
                "OK".green().bold(),
                group.id,
                group.added,
                group.participants
            ),
        }
    }
    println!(
        "\n{} added, {} already tracked ({} total)",
        report.added, report.skipped, report.total
    );
    Ok(())
}
