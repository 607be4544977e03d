//! Set a member's expiry policy.

use anyhow::Result;
use colored::Colorize;

use crate::api::ApiClient;

pub async fn execute(api: &ApiClient, id: usize, policy: &str) -> Result<()> {
    // Validate locally so a typo fails before the request goes out.
    policy
        .parse::<tenure_core::types::ExpiryPolicy>()
        .map_err(anyhow::Error::msg)?;

    let member = api.set_policy(id, policy).await?;
    println!(
        "{} {} now expires under '{}'",
        "OK".green().bold(),
        member.phone_number,
        member.expiry.as_str()
    );
    Ok(())
}
