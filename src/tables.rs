use chrono::{Datelike, NaiveDate};

use crate::models::{CampaignOverview, LeadRecord};
use crate::view::{FilterField, SortField, SortKey, TableRecord};

fn date_key(date: NaiveDate) -> SortKey<'static> {
    SortKey::Number(f64::from(date.num_days_from_ce()))
}

impl TableRecord for CampaignOverview {
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::Name,
        SortField::Client,
        SortField::Status,
        SortField::Created,
        SortField::Health,
        SortField::Score,
        SortField::Sent,
        SortField::OpenRate,
        SortField::ReplyRate,
    ];

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.client_name.as_str()]
    }

    fn filter_value(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::Status => Some(&self.status),
            FilterField::Client => Some(&self.client_name),
            FilterField::Health => Some(self.health.level.as_str()),
            FilterField::Source | FilterField::Stage => None,
        }
    }

    fn sort_key(&self, field: SortField) -> SortKey<'_> {
        match field {
            SortField::Name => SortKey::Text(&self.name),
            SortField::Client => SortKey::Text(&self.client_name),
            SortField::Status => SortKey::Text(&self.status),
            SortField::Created => date_key(self.created_at),
            SortField::Health | SortField::Score => {
                SortKey::from_option(self.health.score.map(f64::from))
            }
            SortField::Sent => SortKey::Number(self.rates.total_sent as f64),
            SortField::OpenRate => SortKey::from_option(self.rates.open_rate),
            SortField::ReplyRate => SortKey::from_option(self.rates.reply_rate),
        }
    }
}

impl TableRecord for LeadRecord {
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::Name,
        SortField::Client,
        SortField::Status,
        SortField::Created,
        SortField::Score,
    ];

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.full_name.as_str(), self.email.as_str()];
        if let Some(company) = self.company.as_deref() {
            fields.push(company);
        }
        fields
    }

    fn filter_value(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::Status => Some(&self.status),
            FilterField::Client => Some(&self.client_name),
            FilterField::Source => self.source.as_deref(),
            FilterField::Stage => self.stage.as_deref(),
            FilterField::Health => None,
        }
    }

    fn sort_key(&self, field: SortField) -> SortKey<'_> {
        match field {
            SortField::Name => SortKey::Text(&self.full_name),
            SortField::Client => SortKey::Text(&self.client_name),
            SortField::Status => SortKey::Text(&self.status),
            SortField::Created => date_key(self.created_at),
            SortField::Score => SortKey::from_option(self.score.map(f64::from)),
            SortField::Health | SortField::Sent | SortField::OpenRate | SortField::ReplyRate => {
                SortKey::missing()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;
    use crate::metrics::tests::sample;
    use crate::models::CampaignRecord;
    use crate::view::{apply_view_state, validate_sort, SortOrder, ViewState};
    use uuid::Uuid;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).expect("valid date")
    }

    fn campaign(name: &str, client: &str, status: &str, sent: u64, replied: u64) -> CampaignOverview {
        let samples = if sent == 0 {
            Vec::new()
        } else {
            vec![sample(sent, sent / 10, replied)]
        };
        metrics::campaign_overview(&CampaignRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            client_name: client.to_string(),
            status: status.to_string(),
            created_at: date(1),
            samples,
        })
    }

    fn lead(name: &str, email: &str, company: Option<&str>, score: Option<i32>, day: u32) -> LeadRecord {
        LeadRecord {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            email: email.to_string(),
            company: company.map(str::to_string),
            client_name: "Acme".to_string(),
            status: "new".to_string(),
            source: Some("apollo".to_string()),
            stage: None,
            score,
            created_at: date(day),
        }
    }

    #[test]
    fn campaigns_filter_by_health_level() {
        let campaigns = vec![
            campaign("Warm Intro", "Acme", "active", 300, 15),
            campaign("Cold Blast", "Acme", "active", 300, 0),
            campaign("Draft", "Globex", "draft", 0, 0),
        ];

        let healthy = ViewState::default().with_filter(FilterField::Health, "healthy");
        let page = apply_view_state(&campaigns, &healthy);
        assert_eq!(page.total_count, 1);
        assert_eq!(page.rows[0].name, "Warm Intro");

        let unknown = ViewState::default().with_filter(FilterField::Health, "unknown");
        assert_eq!(apply_view_state(&campaigns, &unknown).rows[0].name, "Draft");
    }

    #[test]
    fn campaigns_without_score_sort_first_ascending() {
        let campaigns = vec![
            campaign("Warm Intro", "Acme", "active", 300, 15),
            campaign("Draft", "Globex", "draft", 0, 0),
            campaign("Cold Blast", "Acme", "active", 300, 0),
        ];
        let state = ViewState::default().toggle_sort(SortField::Health);
        let page = apply_view_state(&campaigns, &state);
        let names: Vec<&str> = page.rows.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Draft", "Cold Blast", "Warm Intro"]);
    }

    #[test]
    fn campaign_search_covers_client_name() {
        let campaigns = vec![
            campaign("Warm Intro", "Acme", "active", 300, 15),
            campaign("Cold Blast", "Globex", "active", 300, 0),
        ];
        let state = ViewState::default().with_search("glob");
        let page = apply_view_state(&campaigns, &state);
        assert_eq!(page.total_count, 1);
        assert_eq!(page.rows[0].name, "Cold Blast");
    }

    #[test]
    fn leads_search_email_and_company() {
        let leads = vec![
            lead("Dana Fox", "dana@northwind.io", Some("Northwind"), Some(80), 3),
            lead("Lee Park", "lee@contoso.com", None, None, 5),
        ];

        let by_email = ViewState::default().with_search("CONTOSO");
        assert_eq!(apply_view_state(&leads, &by_email).rows[0].full_name, "Lee Park");

        let by_company = ViewState::default().with_search("northwind");
        assert_eq!(apply_view_state(&leads, &by_company).total_count, 1);
    }

    #[test]
    fn leads_filter_by_source_and_sort_by_date() {
        let mut leads = vec![
            lead("Dana Fox", "dana@northwind.io", Some("Northwind"), Some(80), 3),
            lead("Lee Park", "lee@contoso.com", None, None, 5),
            lead("Ivy Chen", "ivy@fabrikam.com", Some("Fabrikam"), Some(55), 1),
        ];
        leads[2].source = Some("linkedin".to_string());

        let state = ViewState::default()
            .with_filter(FilterField::Source, "Apollo")
            .with_sort(SortField::Created, SortOrder::Descending);
        let page = apply_view_state(&leads, &state);
        let names: Vec<&str> = page.rows.iter().map(|l| l.full_name.as_str()).collect();
        assert_eq!(names, vec!["Lee Park", "Dana Fox"]);

        let by_stage = ViewState::default().with_filter(FilterField::Stage, "qualified");
        assert_eq!(apply_view_state(&leads, &by_stage).total_count, 0);
    }

    #[test]
    fn leads_reject_campaign_only_sorts() {
        for field in [SortField::Sent, SortField::OpenRate, SortField::ReplyRate, SortField::Health] {
            assert!(validate_sort::<LeadRecord>(field).is_err(), "{field:?}");
        }
        assert!(validate_sort::<LeadRecord>(SortField::Score).is_ok());
        assert!(validate_sort::<CampaignOverview>(SortField::ReplyRate).is_ok());
    }
}
