use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{CampaignOverview, ClientSnapshot, HealthLevel, HealthLevelSummary};
use crate::onboarding;

const LEVELS: [HealthLevel; 4] = [
    HealthLevel::Healthy,
    HealthLevel::Warning,
    HealthLevel::Critical,
    HealthLevel::Unknown,
];

pub fn summarize_by_level(campaigns: &[CampaignOverview]) -> Vec<HealthLevelSummary> {
    LEVELS
        .into_iter()
        .map(|level| HealthLevelSummary {
            level,
            count: campaigns
                .iter()
                .filter(|campaign| campaign.health.level == level)
                .count(),
        })
        .collect()
}

/// Critical campaigns first, then warnings, lowest score first within a level.
pub fn needs_attention(campaigns: &[CampaignOverview]) -> Vec<&CampaignOverview> {
    let mut flagged: Vec<&CampaignOverview> = campaigns
        .iter()
        .filter(|campaign| {
            matches!(
                campaign.health.level,
                HealthLevel::Critical | HealthLevel::Warning
            )
        })
        .collect();
    flagged.sort_by(|a, b| {
        a.health
            .level
            .cmp(&b.health.level)
            .then_with(|| a.health.score.cmp(&b.health.score))
            .then_with(|| a.name.cmp(&b.name))
    });
    flagged
}

pub fn awaiting_data(campaigns: &[CampaignOverview]) -> Vec<&CampaignOverview> {
    campaigns
        .iter()
        .filter(|campaign| campaign.health.level == HealthLevel::Unknown)
        .collect()
}

pub fn top_performers(campaigns: &[CampaignOverview]) -> Vec<&CampaignOverview> {
    let mut healthy: Vec<&CampaignOverview> = campaigns
        .iter()
        .filter(|campaign| campaign.health.level == HealthLevel::Healthy)
        .collect();
    healthy.sort_by(|a, b| {
        let a_rate = a.rates.reply_rate.unwrap_or(0.0);
        let b_rate = b.rates.reply_rate.unwrap_or(0.0);
        b_rate.total_cmp(&a_rate)
    });
    healthy
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}%"))
}

fn score(value: Option<u8>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

pub fn build_report(
    client: Option<&str>,
    generated_on: NaiveDate,
    campaigns: &[CampaignOverview],
    snapshots: &[ClientSnapshot],
) -> String {
    let mut output = String::new();
    let client_label = client.unwrap_or("all clients");

    let _ = writeln!(output, "# Campaign Health Report");
    let _ = writeln!(output, "Generated for {} on {}", client_label, generated_on);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Portfolio Health");

    if campaigns.is_empty() {
        let _ = writeln!(output, "No campaigns recorded.");
    } else {
        for summary in summarize_by_level(campaigns) {
            let _ = writeln!(output, "- {}: {} campaigns", summary.level.as_str(), summary.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Campaigns Needing Attention");

    let flagged = needs_attention(campaigns);
    if flagged.is_empty() {
        let _ = writeln!(output, "No campaigns below the healthy threshold.");
    } else {
        for campaign in flagged.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}) {} score {}: open {}, reply {}, bounce {}",
                campaign.name,
                campaign.client_name,
                campaign.health.level.as_str(),
                score(campaign.health.score),
                percent(campaign.averages.open_rate),
                percent(campaign.averages.reply_rate),
                percent(campaign.averages.bounce_rate),
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Awaiting Data");

    let pending = awaiting_data(campaigns);
    if pending.is_empty() {
        let _ = writeln!(output, "Every campaign has recent metrics.");
    } else {
        for campaign in pending.iter() {
            let _ = writeln!(
                output,
                "- {} ({}) {} score {}, open {}",
                campaign.name,
                campaign.client_name,
                campaign.health.level.as_str(),
                score(campaign.health.score),
                percent(campaign.rates.open_rate),
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Performers");

    let performers = top_performers(campaigns);
    if performers.is_empty() {
        let _ = writeln!(output, "No healthy campaigns yet.");
    } else {
        for campaign in performers.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}) reply {} across {} sent",
                campaign.name,
                campaign.client_name,
                percent(campaign.rates.reply_rate),
                campaign.rates.total_sent
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Onboarding Progress");

    if snapshots.is_empty() {
        let _ = writeln!(output, "No clients recorded.");
    } else {
        for snapshot in snapshots {
            let status = onboarding::client_onboarding(snapshot);
            let next = status
                .next_step
                .map_or("complete", |step| step.label());
            let _ = writeln!(
                output,
                "- {}: {}/{} steps ({}%), next: {}",
                status.client_name,
                status.progress.completed_count,
                status.progress.total_steps,
                status.progress.percent,
                next
            );
        }
    }

    output
}
