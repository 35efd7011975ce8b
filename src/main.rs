use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;

use outbound_campaign_health::db::fetch_or_empty;
use outbound_campaign_health::models::{CampaignOverview, LeadRecord};
use outbound_campaign_health::view::{self, FilterField, SortField, SortOrder, TableRecord, ViewState};
use outbound_campaign_health::{config, db, logging, metrics, onboarding, report};

#[derive(Parser)]
#[command(name = "campaign-health")]
#[command(about = "Campaign health, lead tables and onboarding progress for outbound email clients", long_about = None)]
struct Cli {
    /// Debug-level logs for this tool
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TableArgs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    client: Option<String>,
    #[arg(long, value_enum)]
    sort: Option<SortField>,
    /// Sort descending instead of ascending
    #[arg(long)]
    desc: bool,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long, default_value_t = view::DEFAULT_PAGE_SIZE)]
    page_size: usize,
    #[arg(long)]
    json: bool,
}

impl TableArgs {
    fn view_state<T: TableRecord>(&self) -> anyhow::Result<ViewState> {
        let mut state = ViewState::default()
            .with_page_size(self.page_size)
            .with_search(self.search.clone().unwrap_or_default());

        if let Some(status) = &self.status {
            state = state.with_filter(FilterField::Status, status.as_str());
        }
        if let Some(client) = &self.client {
            state = state.with_filter(FilterField::Client, client.as_str());
        }
        if let Some(field) = self.sort {
            view::validate_sort::<T>(field)?;
            let order = if self.desc {
                SortOrder::Descending
            } else {
                view::DEFAULT_SORT_ORDER
            };
            state = state.with_sort(field, order);
        }

        Ok(state.with_page(self.page))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import daily campaign metrics from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show rates and health per campaign
    Health {
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List campaigns with search, filters, sorting and pagination
    Campaigns {
        #[command(flatten)]
        table: TableArgs,
        /// healthy, warning, critical or unknown
        #[arg(long)]
        health: Option<String>,
    },
    /// List leads with search, filters, sorting and pagination
    Leads {
        #[command(flatten)]
        table: TableArgs,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        stage: Option<String>,
    },
    /// Show onboarding checklist progress per client
    Onboarding {
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        client: Option<String>,
        #[arg(long, default_value = "campaign-health.md")]
        out: PathBuf,
    },
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |r| format!("{r:.1}%"))
}

fn format_score(score: Option<u8>) -> String {
    score.map_or_else(|| "n/a".to_string(), |s| s.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = config::Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    tracing::debug!(max_connections = config.max_connections, "connected to Postgres");

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let written = db::import_csv(&pool, &csv).await?;
            println!("Wrote {written} metric rows from {}.", csv.display());
        }
        Commands::Health { client, json } => {
            let campaigns =
                fetch_or_empty("campaigns", db::fetch_campaigns(&pool, client.as_deref())).await;
            let overviews: Vec<_> = campaigns.iter().map(metrics::campaign_overview).collect();

            if json {
                return print_json(&overviews);
            }
            if overviews.is_empty() {
                println!("No campaigns found.");
                return Ok(());
            }

            for campaign in overviews.iter() {
                println!(
                    "- {} ({}) {} score {}: sent {}, open {}, reply {}",
                    campaign.name,
                    campaign.client_name,
                    campaign.health.level.as_str(),
                    format_score(campaign.health.score),
                    campaign.rates.total_sent,
                    format_rate(campaign.rates.open_rate),
                    format_rate(campaign.rates.reply_rate)
                );
            }
        }
        Commands::Campaigns { table, health } => {
            let campaigns =
                fetch_or_empty("campaigns", db::fetch_campaigns(&pool, None)).await;
            let overviews: Vec<_> = campaigns.iter().map(metrics::campaign_overview).collect();

            let mut state = table.view_state::<CampaignOverview>()?;
            if let Some(level) = &health {
                state = state.with_filter(FilterField::Health, level.as_str()).with_page(table.page);
            }
            let page = view::apply_view_state(&overviews, &state);

            if table.json {
                return print_json(&page);
            }

            println!(
                "Page {} of {} ({} campaigns)",
                page.page,
                page.total_pages.max(1),
                page.total_count
            );
            for campaign in page.rows.iter() {
                println!(
                    "- {} ({}, {}) {} score {}, sent {}, created {}",
                    campaign.name,
                    campaign.client_name,
                    campaign.status,
                    campaign.health.level.as_str(),
                    format_score(campaign.health.score),
                    campaign.rates.total_sent,
                    campaign.created_at
                );
            }
        }
        Commands::Leads { table, source, stage } => {
            let leads = fetch_or_empty("leads", db::fetch_leads(&pool, None)).await;

            let mut state = table.view_state::<LeadRecord>()?;
            if let Some(source) = &source {
                state = state.with_filter(FilterField::Source, source.as_str());
            }
            if let Some(stage) = &stage {
                state = state.with_filter(FilterField::Stage, stage.as_str());
            }
            let state = state.with_page(table.page);
            let page = view::apply_view_state(&leads, &state);

            if table.json {
                return print_json(&page);
            }

            println!(
                "Page {} of {} ({} leads)",
                page.page,
                page.total_pages.max(1),
                page.total_count
            );
            for lead in page.rows.iter() {
                println!(
                    "- {} <{}> {} [{} / {}] score {}",
                    lead.full_name,
                    lead.email,
                    lead.company.as_deref().unwrap_or("-"),
                    lead.status,
                    lead.stage.as_deref().unwrap_or("-"),
                    lead.score.map_or_else(|| "n/a".to_string(), |s| s.to_string())
                );
            }
        }
        Commands::Onboarding { client, json } => {
            let snapshots = fetch_or_empty(
                "clients",
                db::fetch_client_snapshots(&pool, client.as_deref()),
            )
            .await;
            let statuses: Vec<_> = snapshots.iter().map(onboarding::client_onboarding).collect();

            if json {
                return print_json(&statuses);
            }
            if statuses.is_empty() {
                println!("No clients found.");
                return Ok(());
            }

            for status in statuses.iter() {
                println!(
                    "- {}: {}/{} steps ({}%), next: {}",
                    status.client_name,
                    status.progress.completed_count,
                    status.progress.total_steps,
                    status.progress.percent,
                    status.next_step.map_or("complete", |step| step.label())
                );
            }
        }
        Commands::Report { client, out } => {
            let campaigns =
                fetch_or_empty("campaigns", db::fetch_campaigns(&pool, client.as_deref())).await;
            let snapshots = fetch_or_empty(
                "clients",
                db::fetch_client_snapshots(&pool, client.as_deref()),
            )
            .await;
            let overviews: Vec<_> = campaigns.iter().map(metrics::campaign_overview).collect();

            let report = report::build_report(
                client.as_deref(),
                chrono::Utc::now().date_naive(),
                &overviews,
                &snapshots,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
