use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// One day of sending activity for a single campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub metric_date: NaiveDate,
    pub emails_sent: u64,
    pub emails_delivered: u64,
    pub emails_opened: u64,
    pub emails_replied: u64,
    pub emails_bounced: u64,
    pub deliverability_rate: Option<f64>,
    pub open_rate: Option<f64>,
    pub reply_rate: Option<f64>,
    pub bounce_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RateSummary {
    pub total_sent: u64,
    pub total_opened: u64,
    pub total_replied: u64,
    pub open_rate: Option<f64>,
    pub reply_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AveragedMetrics {
    pub deliverability_rate: Option<f64>,
    pub open_rate: Option<f64>,
    pub reply_rate: Option<f64>,
    pub bounce_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Critical,
    Warning,
    Healthy,
    Unknown,
}

impl HealthLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthAssessment {
    pub score: Option<u8>,
    pub level: HealthLevel,
}

/// Client state the onboarding checklist is derived from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientSnapshot {
    pub client_id: Uuid,
    pub client_name: String,
    pub profile_complete: bool,
    pub domain_verified: bool,
    pub api_keys_configured: bool,
    pub campaign_count: u64,
    pub lead_count: u64,
    pub emails_sent: u64,
    pub replies: u64,
    pub meetings_booked: u64,
}

#[derive(Debug, Clone)]
pub struct CampaignRecord {
    pub id: Uuid,
    pub name: String,
    pub client_name: String,
    pub status: String,
    pub created_at: NaiveDate,
    pub samples: Vec<MetricSample>,
}

/// A campaign row as shown in the campaigns table.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignOverview {
    pub id: Uuid,
    pub name: String,
    pub client_name: String,
    pub status: String,
    pub created_at: NaiveDate,
    pub rates: RateSummary,
    pub averages: AveragedMetrics,
    pub health: HealthAssessment,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub company: Option<String>,
    pub client_name: String,
    pub status: String,
    pub source: Option<String>,
    pub stage: Option<String>,
    pub score: Option<i32>,
    pub created_at: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthLevelSummary {
    pub level: HealthLevel,
    pub count: usize,
}
