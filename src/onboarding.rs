use serde::Serialize;

use crate::models::ClientSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    ProfileComplete,
    DomainVerified,
    ApiKeysSet,
    CampaignCreated,
    LeadsImported,
    FirstEmailSent,
    FirstReply,
    MeetingBooked,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 8] = [
        Self::ProfileComplete,
        Self::DomainVerified,
        Self::ApiKeysSet,
        Self::CampaignCreated,
        Self::LeadsImported,
        Self::FirstEmailSent,
        Self::FirstReply,
        Self::MeetingBooked,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::ProfileComplete => "Complete company profile",
            Self::DomainVerified => "Verify sending domain",
            Self::ApiKeysSet => "Configure API keys",
            Self::CampaignCreated => "Create first campaign",
            Self::LeadsImported => "Import leads",
            Self::FirstEmailSent => "Send first email",
            Self::FirstReply => "Receive first reply",
            Self::MeetingBooked => "Book first meeting",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OnboardingFlags {
    pub profile_complete: bool,
    pub domain_verified: bool,
    pub api_keys_set: bool,
    pub campaign_created: bool,
    pub leads_imported: bool,
    pub first_email_sent: bool,
    pub first_reply: bool,
    pub meeting_booked: bool,
}

impl OnboardingFlags {
    pub fn from_snapshot(snapshot: &ClientSnapshot) -> Self {
        Self {
            profile_complete: snapshot.profile_complete,
            domain_verified: snapshot.domain_verified,
            api_keys_set: snapshot.api_keys_configured,
            campaign_created: snapshot.campaign_count > 0,
            leads_imported: snapshot.lead_count > 0,
            first_email_sent: snapshot.emails_sent > 0,
            first_reply: snapshot.replies > 0,
            meeting_booked: snapshot.meetings_booked > 0,
        }
    }

    pub fn is_done(&self, step: OnboardingStep) -> bool {
        match step {
            OnboardingStep::ProfileComplete => self.profile_complete,
            OnboardingStep::DomainVerified => self.domain_verified,
            OnboardingStep::ApiKeysSet => self.api_keys_set,
            OnboardingStep::CampaignCreated => self.campaign_created,
            OnboardingStep::LeadsImported => self.leads_imported,
            OnboardingStep::FirstEmailSent => self.first_email_sent,
            OnboardingStep::FirstReply => self.first_reply,
            OnboardingStep::MeetingBooked => self.meeting_booked,
        }
    }

    /// First incomplete step in checklist order.
    pub fn next_step(&self) -> Option<OnboardingStep> {
        OnboardingStep::ALL
            .into_iter()
            .find(|step| !self.is_done(*step))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OnboardingProgress {
    pub completed_count: usize,
    pub total_steps: usize,
    pub percent: u8,
}

pub fn compute_onboarding_progress(flags: &OnboardingFlags) -> OnboardingProgress {
    let total_steps = OnboardingStep::ALL.len();
    let completed_count = OnboardingStep::ALL
        .into_iter()
        .filter(|step| flags.is_done(*step))
        .count();
    let percent = (completed_count as f64 / total_steps as f64 * 100.0).round() as u8;

    OnboardingProgress {
        completed_count,
        total_steps,
        percent,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientOnboarding {
    pub client_name: String,
    pub flags: OnboardingFlags,
    pub progress: OnboardingProgress,
    pub next_step: Option<OnboardingStep>,
}

pub fn client_onboarding(snapshot: &ClientSnapshot) -> ClientOnboarding {
    let flags = OnboardingFlags::from_snapshot(snapshot);
    ClientOnboarding {
        client_name: snapshot.client_name.clone(),
        flags,
        progress: compute_onboarding_progress(&flags),
        next_step: flags.next_step(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_the_steps_is_fifty_percent() {
        let flags = OnboardingFlags {
            profile_complete: true,
            domain_verified: true,
            api_keys_set: true,
            campaign_created: true,
            ..Default::default()
        };
        let progress = compute_onboarding_progress(&flags);
        assert_eq!(progress.completed_count, 4);
        assert_eq!(progress.total_steps, 8);
        assert_eq!(progress.percent, 50);
    }

    #[test]
    fn percent_rounds_half_up() {
        let flags = OnboardingFlags {
            profile_complete: true,
            ..Default::default()
        };
        assert_eq!(compute_onboarding_progress(&flags).percent, 13);

        let flags = OnboardingFlags {
            profile_complete: true,
            domain_verified: true,
            api_keys_set: true,
            ..Default::default()
        };
        assert_eq!(compute_onboarding_progress(&flags).percent, 38);
    }

    #[test]
    fn empty_and_complete_checklists() {
        let none = compute_onboarding_progress(&OnboardingFlags::default());
        assert_eq!(none.completed_count, 0);
        assert_eq!(none.percent, 0);

        let all = OnboardingFlags {
            profile_complete: true,
            domain_verified: true,
            api_keys_set: true,
            campaign_created: true,
            leads_imported: true,
            first_email_sent: true,
            first_reply: true,
            meeting_booked: true,
        };
        assert_eq!(compute_onboarding_progress(&all).percent, 100);
        assert_eq!(all.next_step(), None);
    }

    #[test]
    fn snapshot_counts_drive_flags() {
        let snapshot = ClientSnapshot {
            client_name: "Northwind".to_string(),
            profile_complete: true,
            campaign_count: 2,
            lead_count: 40,
            emails_sent: 120,
            ..Default::default()
        };
        let onboarding = client_onboarding(&snapshot);
        assert!(onboarding.flags.campaign_created);
        assert!(onboarding.flags.first_email_sent);
        assert!(!onboarding.flags.first_reply);
        assert_eq!(onboarding.progress.completed_count, 4);
        assert_eq!(onboarding.next_step, Some(OnboardingStep::DomainVerified));
    }
}
