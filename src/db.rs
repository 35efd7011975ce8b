use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use anyhow::Context;
use chrono::{Duration, NaiveDate};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{CampaignRecord, ClientSnapshot, LeadRecord, MetricSample};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Reads from the backend degrade to an empty snapshot; aggregation then
/// reports `unknown` instead of failing the command.
pub async fn fetch_or_empty<T, F>(what: &str, fetch: F) -> Vec<T>
where
    F: Future<Output = anyhow::Result<Vec<T>>>,
{
    match fetch.await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(error = %err, "failed to fetch {what}; continuing with no data");
            Vec::new()
        }
    }
}

fn counter(row: &PgRow, column: &str) -> anyhow::Result<u64> {
    let value: i64 = row.try_get(column)?;
    u64::try_from(value).with_context(|| format!("negative {column} in stored row: {value}"))
}

async fn upsert_client(
    conn: &mut sqlx::PgConnection,
    name: &str,
    contact_email: Option<&str>,
    flags: (bool, bool, bool),
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO campaign_health.clients AS existing
        (id, name, contact_email, profile_complete, domain_verified, api_keys_configured)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (name) DO UPDATE
        SET contact_email = COALESCE(EXCLUDED.contact_email, existing.contact_email),
            profile_complete = existing.profile_complete OR EXCLUDED.profile_complete,
            domain_verified = existing.domain_verified OR EXCLUDED.domain_verified,
            api_keys_configured = existing.api_keys_configured OR EXCLUDED.api_keys_configured
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(contact_email)
    .bind(flags.0)
    .bind(flags.1)
    .bind(flags.2)
    .fetch_one(&mut *conn)
    .await?
    .get("id");

    Ok(id)
}

async fn upsert_campaign(
    conn: &mut sqlx::PgConnection,
    client_id: Uuid,
    name: &str,
    status: &str,
    created_at: NaiveDate,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO campaign_health.campaigns AS existing (id, client_id, name, status, created_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (client_id, name) DO UPDATE
        SET created_at = LEAST(existing.created_at, EXCLUDED.created_at)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(client_id)
    .bind(name)
    .bind(status)
    .bind(created_at)
    .fetch_one(&mut *conn)
    .await?
    .get("id");

    Ok(id)
}

async fn upsert_metric(
    conn: &mut sqlx::PgConnection,
    campaign_id: Uuid,
    sample: &MetricSample,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO campaign_health.campaign_metrics
        (id, campaign_id, metric_date, emails_sent, emails_delivered, emails_opened,
         emails_replied, emails_bounced, deliverability_rate, open_rate, reply_rate, bounce_rate)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (campaign_id, metric_date) DO UPDATE
        SET emails_sent = EXCLUDED.emails_sent,
            emails_delivered = EXCLUDED.emails_delivered,
            emails_opened = EXCLUDED.emails_opened,
            emails_replied = EXCLUDED.emails_replied,
            emails_bounced = EXCLUDED.emails_bounced,
            deliverability_rate = EXCLUDED.deliverability_rate,
            open_rate = EXCLUDED.open_rate,
            reply_rate = EXCLUDED.reply_rate,
            bounce_rate = EXCLUDED.bounce_rate
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(campaign_id)
    .bind(sample.metric_date)
    .bind(i64::try_from(sample.emails_sent)?)
    .bind(i64::try_from(sample.emails_delivered)?)
    .bind(i64::try_from(sample.emails_opened)?)
    .bind(i64::try_from(sample.emails_replied)?)
    .bind(i64::try_from(sample.emails_bounced)?)
    .bind(sample.deliverability_rate)
    .bind(sample.open_rate)
    .bind(sample.reply_rate)
    .bind(sample.bounce_rate)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Daily counters for a seeded campaign, as (sent, delivered%, opened%, replied%, bounced%).
type SeedProfile = (u64, u64, u64, u64, u64);

fn seeded_samples(start: NaiveDate, days: i64, profile: SeedProfile) -> Vec<MetricSample> {
    let (sent, delivered_pct, opened_pct, replied_pct, bounced_pct) = profile;
    (0..days)
        .map(|day| {
            // Small deterministic wobble so charts are not flat.
            let daily_sent = sent + (day as u64 % 3) * 10;
            MetricSample {
                metric_date: start + Duration::days(day),
                emails_sent: daily_sent,
                emails_delivered: daily_sent * delivered_pct / 100,
                emails_opened: daily_sent * opened_pct / 100,
                emails_replied: daily_sent * replied_pct / 100,
                emails_bounced: daily_sent * bounced_pct / 100,
                deliverability_rate: None,
                open_rate: None,
                reply_rate: None,
                bounce_rate: None,
            }
        })
        .collect()
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let start = NaiveDate::from_ymd_opt(2026, 2, 2).context("invalid date")?;
    let mut tx = pool.begin().await?;

    let clients = vec![
        ("Northwind Analytics", "ops@northwind.io", (true, true, true)),
        ("Contoso Staffing", "growth@contoso.com", (true, true, false)),
        ("Fabrikam Robotics", "sales@fabrikam.com", (true, false, false)),
    ];

    let mut client_ids = HashMap::new();
    for (name, email, flags) in clients {
        let id = upsert_client(&mut tx, name, Some(email), flags).await?;
        client_ids.insert(name, id);
    }

    let campaigns: Vec<(&str, &str, &str, Option<SeedProfile>)> = vec![
        ("Northwind Analytics", "Q1 Data Leaders", "active", Some((120, 96, 42, 5, 1))),
        ("Northwind Analytics", "Churned Trials", "paused", Some((80, 87, 18, 1, 4))),
        ("Contoso Staffing", "Agency Founders", "active", Some((200, 82, 11, 0, 9))),
        ("Contoso Staffing", "Spring Reactivation", "draft", None),
    ];

    let mut campaign_ids = HashMap::new();
    for (client, name, status, profile) in campaigns {
        let client_id = client_ids[client];
        let campaign_id = upsert_campaign(&mut tx, client_id, name, status, start).await?;
        campaign_ids.insert(name, (client_id, campaign_id));

        if let Some(profile) = profile {
            for sample in seeded_samples(start, 10, profile) {
                upsert_metric(&mut tx, campaign_id, &sample).await?;
            }
        }
    }

    let leads = vec![
        ("Q1 Data Leaders", "Dana Fox", "dana@acme.io", "Acme", "replied", "apollo", "meeting_booked", Some(88)),
        ("Q1 Data Leaders", "Lee Park", "lee@globex.com", "Globex", "contacted", "linkedin", "qualified", Some(64)),
        ("Churned Trials", "Ivy Chen", "ivy@initech.com", "Initech", "new", "import", "new", None),
        ("Agency Founders", "Sam Ortiz", "sam@umbrella.co", "Umbrella", "bounced", "apollo", "lost", Some(12)),
    ];

    for (campaign, full_name, email, company, status, source, stage, score) in leads {
        let (client_id, campaign_id) = campaign_ids[campaign];
        sqlx::query(
            r#"
            INSERT INTO campaign_health.leads
            (id, client_id, campaign_id, full_name, email, company, status, source, stage, score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (client_id, email) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(campaign_id)
        .bind(full_name)
        .bind(email)
        .bind(company)
        .bind(status)
        .bind(source)
        .bind(stage)
        .bind(score)
        .bind(start)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::info!(clients = client_ids.len(), campaigns = campaign_ids.len(), "seed data written");
    Ok(())
}

#[derive(Debug, serde::Deserialize)]
pub struct MetricCsvRow {
    pub client: String,
    pub campaign: String,
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

impl MetricCsvRow {
    fn sample(&self) -> MetricSample {
        MetricSample {
            metric_date: self.metric_date,
            emails_sent: self.emails_sent,
            emails_delivered: self.emails_delivered,
            emails_opened: self.emails_opened,
            emails_replied: self.emails_replied,
            emails_bounced: self.emails_bounced,
            deliverability_rate: self.deliverability_rate,
            open_rate: self.open_rate,
            reply_rate: self.reply_rate,
            bounce_rate: self.bounce_rate,
        }
    }
}

pub fn read_metric_csv(csv_path: &Path) -> anyhow::Result<Vec<MetricCsvRow>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<MetricCsvRow>().enumerate() {
        // Header is line 1.
        let row = result.with_context(|| format!("invalid metric row on line {}", index + 2))?;
        rows.push(row);
    }

    Ok(rows)
}

pub async fn import_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    let rows = read_metric_csv(csv_path)?;
    let mut tx = pool.begin().await?;
    let mut written = 0usize;

    for row in rows.iter() {
        let client_id = upsert_client(&mut tx, &row.client, None, (false, false, false)).await?;
        let campaign_id =
            upsert_campaign(&mut tx, client_id, &row.campaign, "active", row.metric_date).await?;

        if upsert_metric(&mut tx, campaign_id, &row.sample()).await? > 0 {
            written += 1;
        }
    }

    tx.commit().await?;
    tracing::info!(rows = rows.len(), written, path = %csv_path.display(), "metric import finished");
    Ok(written)
}

pub async fn fetch_campaigns(
    pool: &PgPool,
    client: Option<&str>,
) -> anyhow::Result<Vec<CampaignRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.name, c.status, c.created_at, cl.name AS client_name
        FROM campaign_health.campaigns c
        JOIN campaign_health.clients cl ON cl.id = c.client_id
        WHERE ($1::TEXT IS NULL OR cl.name = $1)
        ORDER BY cl.name, c.name
        "#,
    )
    .bind(client)
    .fetch_all(pool)
    .await?;

    let ids: Vec<Uuid> = rows.iter().map(|row| row.get("id")).collect();
    let metric_rows = sqlx::query(
        r#"
        SELECT campaign_id, metric_date, emails_sent, emails_delivered, emails_opened,
               emails_replied, emails_bounced, deliverability_rate, open_rate, reply_rate, bounce_rate
        FROM campaign_health.campaign_metrics
        WHERE campaign_id = ANY($1)
        ORDER BY campaign_id, metric_date
        "#,
    )
    .bind(&ids[..])
    .fetch_all(pool)
    .await?;

    let mut samples: HashMap<Uuid, Vec<MetricSample>> = HashMap::new();
    for row in metric_rows {
        let campaign_id: Uuid = row.get("campaign_id");
        samples.entry(campaign_id).or_default().push(MetricSample {
            metric_date: row.get("metric_date"),
            emails_sent: counter(&row, "emails_sent")?,
            emails_delivered: counter(&row, "emails_delivered")?,
            emails_opened: counter(&row, "emails_opened")?,
            emails_replied: counter(&row, "emails_replied")?,
            emails_bounced: counter(&row, "emails_bounced")?,
            deliverability_rate: row.get("deliverability_rate"),
            open_rate: row.get("open_rate"),
            reply_rate: row.get("reply_rate"),
            bounce_rate: row.get("bounce_rate"),
        });
    }

    let campaigns = rows
        .into_iter()
        .map(|row| {
            let id: Uuid = row.get("id");
            CampaignRecord {
                id,
                name: row.get("name"),
                client_name: row.get("client_name"),
                status: row.get("status"),
                created_at: row.get("created_at"),
                samples: samples.remove(&id).unwrap_or_default(),
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(campaigns = campaigns.len(), "fetched campaigns");
    Ok(campaigns)
}

pub async fn fetch_leads(pool: &PgPool, client: Option<&str>) -> anyhow::Result<Vec<LeadRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT l.id, l.full_name, l.email, l.company, l.status, l.source, l.stage,
               l.score, l.created_at, cl.name AS client_name
        FROM campaign_health.leads l
        JOIN campaign_health.clients cl ON cl.id = l.client_id
        WHERE ($1::TEXT IS NULL OR cl.name = $1)
        ORDER BY l.created_at DESC, l.full_name
        "#,
    )
    .bind(client)
    .fetch_all(pool)
    .await?;

    let leads = rows
        .into_iter()
        .map(|row| LeadRecord {
            id: row.get("id"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            company: row.get("company"),
            client_name: row.get("client_name"),
            status: row.get("status"),
            source: row.get("source"),
            stage: row.get("stage"),
            score: row.get("score"),
            created_at: row.get("created_at"),
        })
        .collect::<Vec<_>>();

    tracing::debug!(leads = leads.len(), "fetched leads");
    Ok(leads)
}

pub async fn fetch_client_snapshots(
    pool: &PgPool,
    client: Option<&str>,
) -> anyhow::Result<Vec<ClientSnapshot>> {
    let rows = sqlx::query(
        r#"
        SELECT cl.id, cl.name, cl.profile_complete, cl.domain_verified, cl.api_keys_configured,
               (SELECT COUNT(*) FROM campaign_health.campaigns c WHERE c.client_id = cl.id)
                   AS campaign_count,
               (SELECT COUNT(*) FROM campaign_health.leads l WHERE l.client_id = cl.id)
                   AS lead_count,
               (SELECT COUNT(*) FROM campaign_health.leads l
                 WHERE l.client_id = cl.id AND l.stage = 'meeting_booked')
                   AS meetings_booked,
               COALESCE((SELECT SUM(m.emails_sent) FROM campaign_health.campaign_metrics m
                          JOIN campaign_health.campaigns c ON c.id = m.campaign_id
                         WHERE c.client_id = cl.id), 0)::BIGINT AS emails_sent,
               COALESCE((SELECT SUM(m.emails_replied) FROM campaign_health.campaign_metrics m
                          JOIN campaign_health.campaigns c ON c.id = m.campaign_id
                         WHERE c.client_id = cl.id), 0)::BIGINT AS replies
        FROM campaign_health.clients cl
        WHERE ($1::TEXT IS NULL OR cl.name = $1)
        ORDER BY cl.name
        "#,
    )
    .bind(client)
    .fetch_all(pool)
    .await?;

    let mut snapshots = Vec::with_capacity(rows.len());
    for row in rows {
        snapshots.push(ClientSnapshot {
            client_id: row.get("id"),
            client_name: row.get("name"),
            profile_complete: row.get("profile_complete"),
            domain_verified: row.get("domain_verified"),
            api_keys_configured: row.get("api_keys_configured"),
            campaign_count: counter(&row, "campaign_count")?,
            lead_count: counter(&row, "lead_count")?,
            emails_sent: counter(&row, "emails_sent")?,
            replies: counter(&row, "replies")?,
            meetings_booked: counter(&row, "meetings_booked")?,
        });
    }

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn failed_fetch_degrades_to_empty() {
        let campaigns: Vec<CampaignRecord> = fetch_or_empty("campaigns", async {
            Err::<Vec<CampaignRecord>, _>(anyhow::anyhow!("connection reset by peer"))
        })
        .await;
        assert!(campaigns.is_empty());

        let overviews: Vec<_> = campaigns.iter().map(crate::metrics::campaign_overview).collect();
        let report = crate::report::build_report(
            None,
            NaiveDate::from_ymd_opt(2026, 3, 9).expect("valid date"),
            &overviews,
            &[],
        );
        assert!(report.contains("No campaigns recorded."));
    }

    #[tokio::test]
    async fn successful_fetch_passes_rows_through() {
        let rows = fetch_or_empty("leads", async { Ok::<_, anyhow::Error>(vec![1, 2, 3]) }).await;
        assert_eq!(rows, vec![1, 2, 3]);
    }

    #[test]
    fn seeded_samples_span_requested_days() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 2).expect("valid date");
        let samples = seeded_samples(start, 10, (100, 95, 40, 4, 2));
        assert_eq!(samples.len(), 10);
        assert_eq!(samples[0].metric_date, start);
        assert_eq!(samples[0].emails_sent, 100);
        assert_eq!(samples[0].emails_delivered, 95);
        assert_eq!(samples[1].emails_sent, 110);
        assert_eq!(samples[9].metric_date, start + Duration::days(9));
    }

    #[test]
    fn reads_metric_rows_with_optional_rates() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "client,campaign,metric_date,emails_sent,emails_delivered,emails_opened,emails_replied,emails_bounced,deliverability_rate,open_rate,reply_rate,bounce_rate"
        )
        .expect("write header");
        writeln!(file, "Northwind,Q1 Push,2026-03-01,100,97,41,4,3,,,,").expect("write row");
        writeln!(file, "Northwind,Q1 Push,2026-03-02,120,118,50,6,2,98.3,41.7,5.0,1.7")
            .expect("write row");

        let rows = read_metric_csv(file.path()).expect("rows parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].emails_sent, 100);
        assert_eq!(rows[0].open_rate, None);
        assert_eq!(rows[1].open_rate, Some(41.7));
        assert_eq!(rows[1].sample().emails_replied, 6);
    }

    #[test]
    fn rejects_negative_counters() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "client,campaign,metric_date,emails_sent,emails_delivered,emails_opened,emails_replied,emails_bounced,deliverability_rate,open_rate,reply_rate,bounce_rate"
        )
        .expect("write header");
        writeln!(file, "Northwind,Q1 Push,2026-03-01,-5,0,0,0,0,,,,").expect("write row");

        let err = read_metric_csv(file.path()).expect_err("negative sent is rejected");
        assert!(err.to_string().contains("line 2"));
    }
}
