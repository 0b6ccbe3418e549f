pub mod cli;
pub mod core;
pub mod providers;
pub mod views;

use crate::cli::session::{FilterOverrides, Session};
use crate::core::config::AppConfig;
use crate::views::listings::ListingSort;
use crate::views::price_changes::PriceChangeSort;
use crate::views::valuation::ValuationRequest;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

/// What to render once the session is connected.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Dashboard,
    Distribution,
    Scatter,
    Accessible {
        min_size: Option<f64>,
        max_size: Option<f64>,
    },
    Types,
    Agencies {
        expand: Vec<i64>,
    },
    PriceChanges {
        sort: PriceChangeSort,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        history: Vec<i64>,
    },
    Listings {
        sort: ListingSort,
    },
    Sold,
    Heatmap,
    Evolution,
    Regions,
    Valuate(ValuationRequest),
}

pub async fn run_command(
    command: AppCommand,
    overrides: &FilterOverrides,
    config_path: Option<&str>,
) -> Result<()> {
    info!("estatedash starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let session = Session::connect(config, overrides).await?;
    run_session_command(command, &session).await
}

pub async fn run_session_command(command: AppCommand, session: &Session) -> Result<()> {
    match command {
        AppCommand::Dashboard => cli::dashboard::run(session).await,
        AppCommand::Distribution => cli::charts::distribution(session).await,
        AppCommand::Scatter => cli::charts::scatter(session).await,
        AppCommand::Accessible { min_size, max_size } => {
            cli::charts::accessible(session, min_size, max_size).await
        }
        AppCommand::Types => cli::charts::property_types(session).await,
        AppCommand::Agencies { expand } => cli::tables::agencies(session, &expand).await,
        AppCommand::PriceChanges {
            sort,
            start_date,
            end_date,
            history,
        } => cli::tables::price_changes(session, sort, (start_date, end_date), &history).await,
        AppCommand::Listings { sort } => cli::tables::listings(session, sort).await,
        AppCommand::Sold => cli::tables::sold(session).await,
        AppCommand::Heatmap => cli::charts::heatmap(session).await,
        AppCommand::Evolution => cli::charts::evolution(session).await,
        AppCommand::Regions => cli::charts::regions(session).await,
        AppCommand::Valuate(request) => cli::valuate::run(session, request).await,
    }
}
