//! Mark a member manually removed.

use anyhow::Result;
use colored::Colorize;

use crate::api::ApiClient;

pub async fn execute(api: &ApiClient, id: usize) -> Result<()> {
    let member = api.remove_member(id).await?;
    println!(
        "{} {} marked manually removed",
        "OK".green().bold(),
        member.phone_number
    );
    Ok(())
}
