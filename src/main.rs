use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use estatedash::AppCommand;
use estatedash::cli::session::FilterOverrides;
use estatedash::core::filter::{Currency, Region};
use estatedash::core::log::init_logging;
use estatedash::views::listings::ListingSort;
use estatedash::views::price_changes::PriceChangeSort;
use estatedash::views::valuation::ValuationRequest;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(flatten)]
    filters: FilterArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct FilterArgs {
    /// Display currency: Rs, €, $ or MUR, EUR, USD
    #[arg(long, global = true)]
    currency: Option<Currency>,

    /// Property type, or "All"
    #[arg(short = 't', long, global = true)]
    property_type: Option<String>,

    /// Region: All, West, East, North, South or Center
    #[arg(short, long, global = true)]
    region: Option<Region>,

    /// Location within the selected region
    #[arg(short, long, global = true)]
    location: Option<String>,
}

impl From<FilterArgs> for FilterOverrides {
    fn from(args: FilterArgs) -> Self {
        FilterOverrides {
            currency: args.currency,
            property_type: args.property_type,
            region: args.region,
            location: args.location,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Market value, key metrics, type breakdown and price distribution
    Dashboard,
    /// Price distribution histogram
    Distribution,
    /// Price against surface area
    Scatter,
    /// Price against accessibility to foreigners
    Accessible {
        /// Smallest surface to include, in m²
        #[arg(long)]
        min_size: Option<f64>,
        /// Largest surface to include, in m²
        #[arg(long)]
        max_size: Option<f64>,
    },
    /// Property type breakdown for the region
    Types,
    /// Agency ranking by total listed value
    Agencies {
        /// Agency ids to show details for
        #[arg(short, long, value_delimiter = ',')]
        expand: Vec<i64>,
    },
    /// Listings whose price went up or down
    PriceChanges {
        /// price_change or interior_size
        #[arg(long, default_value = "price_change")]
        sort: PriceChangeSort,
        /// First day of the period (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// Last day of the period (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Property ids to show the price history of
        #[arg(long, value_delimiter = ',')]
        history: Vec<i64>,
    },
    /// Listings added during the last week
    Listings {
        /// date_added, price or interior_surface
        #[arg(long, default_value = "date_added")]
        sort: ListingSort,
    },
    /// Recently sold properties
    Sold,
    /// Average price per location
    Heatmap,
    /// Rolling average price over time
    Evolution,
    /// Listing counts and busiest price band for every region
    Regions,
    /// Predict the price of a property
    Valuate(ValuateArgs),
}

#[derive(Args)]
struct ValuateArgs {
    /// Property type, e.g. Villa
    #[arg(long = "type")]
    kind: String,
    /// Region of the property
    #[arg(long = "in")]
    region_name: String,
    #[arg(long, default_value_t = 0.0)]
    interior: f64,
    #[arg(long, default_value_t = 0.0)]
    land: f64,
    #[arg(long, default_value_t = 0)]
    bedrooms: u32,
    #[arg(long, default_value_t = 0)]
    bathrooms: u32,
    /// General features, comma separated
    #[arg(long, value_delimiter = ',')]
    features: Vec<String>,
    /// Description features, comma separated
    #[arg(long, value_delimiter = ',')]
    description: Vec<String>,
}

impl From<ValuateArgs> for ValuationRequest {
    fn from(args: ValuateArgs) -> Self {
        ValuationRequest::new(args.kind, args.region_name)
            .with_surfaces(args.interior, args.land)
            .with_rooms(args.bedrooms, args.bathrooms)
            .with_general_features(args.features)
            .with_description_features(&args.description)
    }
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Dashboard => AppCommand::Dashboard,
            Commands::Distribution => AppCommand::Distribution,
            Commands::Scatter => AppCommand::Scatter,
            Commands::Accessible { min_size, max_size } => {
                AppCommand::Accessible { min_size, max_size }
            }
            Commands::Types => AppCommand::Types,
            Commands::Agencies { expand } => AppCommand::Agencies { expand },
            Commands::PriceChanges {
                sort,
                start_date,
                end_date,
                history,
            } => AppCommand::PriceChanges {
                sort,
                start_date,
                end_date,
                history,
            },
            Commands::Listings { sort } => AppCommand::Listings { sort },
            Commands::Sold => AppCommand::Sold,
            Commands::Heatmap => AppCommand::Heatmap,
            Commands::Evolution => AppCommand::Evolution,
            Commands::Regions => AppCommand::Regions,
            Commands::Valuate(args) => AppCommand::Valuate(args.into()),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let overrides = FilterOverrides::from(cli.filters);
    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => estatedash::cli::setup::setup_at_path(path),
            None => estatedash::cli::setup::setup(),
        },
        Some(cmd) => {
            estatedash::run_command(cmd.into(), &overrides, cli.config_path.as_deref()).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
