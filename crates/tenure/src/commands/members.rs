//! List tracked members.

use anyhow::Result;
use colored::Colorize;

use tenure_core::types::MemberStatus;

use crate::api::{ApiClient, Member};

pub async fn execute(api: &ApiClient, search: Option<&str>, json: bool) -> Result<()> {
    let members = api.list_members(search).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&members)?);
        return Ok(());
    }

    if members.is_empty() {
        println!("{}", "No tracked members".dimmed());
        return Ok(());
    }

    println!(
        "{:<4} {:<22} {:<20} {:<12} {:<9} {}",
        "ID".bold(),
        "MEMBER".bold(),
        "GROUP".bold(),
        "JOINED".bold(),
        "POLICY".bold(),
        "STATUS".bold()
    );
    for member in &members {
        println!(
            "{:<4} {:<22} {:<20} {:<12} {:<9} {}",
            member.id,
            member.phone_number,
            tenure_core::identity::short_group(&member.group_id),
            member.joined_at.format("%Y-%m-%d"),
            member.expiry.as_str(),
            status_label(member)
        );
    }
    println!("\n{} member(s)", members.len());

    Ok(())
}

fn status_label(member: &Member) -> String {
    match member.status {
        MemberStatus::Active => member.status.as_str().green().to_string(),
        MemberStatus::Expired => member.status.as_str().yellow().to_string(),
        MemberStatus::Failed => match &member.fail_reason {
            Some(reason) => format!("{} ({reason})", "failed".red()),
            None => "failed".red().to_string(),
        },
        MemberStatus::Removed | MemberStatus::ManuallyRemoved => {
            member.status.as_str().dimmed().to_string()
        }
    }
}
