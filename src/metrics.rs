use crate::models::{
    AveragedMetrics, CampaignOverview, CampaignRecord, HealthAssessment, HealthLevel,
    MetricSample, RateSummary,
};

/// Number of most recent samples a health assessment looks at.
pub const HEALTH_WINDOW: usize = 7;

pub fn compute_rates(samples: &[MetricSample]) -> RateSummary {
    let mut summary = RateSummary::default();

    for sample in samples {
        summary.total_sent = summary.total_sent.saturating_add(sample.emails_sent);
        summary.total_opened = summary.total_opened.saturating_add(sample.emails_opened);
        summary.total_replied = summary.total_replied.saturating_add(sample.emails_replied);
    }

    if summary.total_sent > 0 {
        let sent = summary.total_sent as f64;
        summary.open_rate = Some(summary.total_opened as f64 / sent * 100.0);
        summary.reply_rate = Some(summary.total_replied as f64 / sent * 100.0);
    }

    summary
}

/// Averages each rate over the samples that carry a usable value for it.
///
/// A sample without a stored rate falls back to its own counters when it has
/// sent anything. Rates outside `[0, 100]` are dropped.
pub fn average_metrics(samples: &[MetricSample]) -> AveragedMetrics {
    let mut deliverability = RateAccumulator::default();
    let mut open = RateAccumulator::default();
    let mut reply = RateAccumulator::default();
    let mut bounce = RateAccumulator::default();

    for sample in samples {
        deliverability.push(sample.deliverability_rate, sample.emails_delivered, sample.emails_sent);
        open.push(sample.open_rate, sample.emails_opened, sample.emails_sent);
        reply.push(sample.reply_rate, sample.emails_replied, sample.emails_sent);
        bounce.push(sample.bounce_rate, sample.emails_bounced, sample.emails_sent);
    }

    AveragedMetrics {
        deliverability_rate: deliverability.mean(),
        open_rate: open.mean(),
        reply_rate: reply.mean(),
        bounce_rate: bounce.mean(),
    }
}

#[derive(Default)]
struct RateAccumulator {
    total: f64,
    count: usize,
}

impl RateAccumulator {
    fn push(&mut self, stored: Option<f64>, numerator: u64, sent: u64) {
        let rate = match stored {
            Some(rate) => Some(rate),
            None if sent > 0 => Some(numerator as f64 / sent as f64 * 100.0),
            None => None,
        };

        if let Some(rate) = rate.filter(|r| (0.0..=100.0).contains(r)) {
            self.total += rate;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.total / self.count as f64)
        }
    }
}

pub fn deliverability_sub_score(rate: f64) -> u32 {
    if rate >= 90.0 {
        100
    } else if rate >= 85.0 {
        70
    } else {
        30
    }
}

pub fn open_rate_sub_score(rate: f64) -> u32 {
    if rate >= 30.0 {
        100
    } else if rate >= 15.0 {
        70
    } else {
        30
    }
}

pub fn reply_rate_sub_score(rate: f64) -> u32 {
    if rate >= 3.0 {
        100
    } else if rate >= 1.0 {
        70
    } else {
        30
    }
}

pub fn bounce_rate_sub_score(rate: f64) -> u32 {
    if rate <= 2.0 {
        100
    } else if rate <= 5.0 {
        70
    } else {
        30
    }
}

/// Mean of the sub-scores of every present metric, each weighted equally.
pub fn compute_health_score(avg: &AveragedMetrics) -> Option<u8> {
    let sub_scores: Vec<u32> = [
        avg.deliverability_rate.map(deliverability_sub_score),
        avg.open_rate.map(open_rate_sub_score),
        avg.reply_rate.map(reply_rate_sub_score),
        avg.bounce_rate.map(bounce_rate_sub_score),
    ]
    .into_iter()
    .flatten()
    .collect();

    if sub_scores.is_empty() {
        return None;
    }

    let total: u32 = sub_scores.iter().sum();
    let mean = total as f64 / sub_scores.len() as f64;
    Some(mean.round() as u8)
}

pub fn classify(score: Option<u8>) -> HealthLevel {
    match score {
        Some(score) if score >= 80 => HealthLevel::Healthy,
        Some(score) if score >= 60 => HealthLevel::Warning,
        Some(_) => HealthLevel::Critical,
        None => HealthLevel::Unknown,
    }
}

pub fn health_window(samples: &[MetricSample]) -> &[MetricSample] {
    &samples[samples.len().saturating_sub(HEALTH_WINDOW)..]
}

pub fn assess(averages: &AveragedMetrics) -> HealthAssessment {
    let score = compute_health_score(averages);
    HealthAssessment {
        score,
        level: classify(score),
    }
}

/// Rates and health for one campaign; health only looks at the recent window.
pub fn campaign_overview(campaign: &CampaignRecord) -> CampaignOverview {
    let averages = average_metrics(health_window(&campaign.samples));

    CampaignOverview {
        id: campaign.id,
        name: campaign.name.clone(),
        client_name: campaign.client_name.clone(),
        status: campaign.status.clone(),
        created_at: campaign.created_at,
        rates: compute_rates(&campaign.samples),
        averages,
        health: assess(&averages),
    }
}
