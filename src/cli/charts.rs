//! Terminal renderings of the chart views.

use super::session::Session;
use super::ui;
use crate::core::filter::{FilterStore, Region};
use crate::core::view::FetchOutcome;
use crate::views::evolution::{LineChart, MarketEvolutionView};
use crate::views::heatmap::{HeatMap, LocationsView};
use crate::views::histogram::{Histogram, PriceDistributionView};
use crate::views::pie::{PieChart, PropertyTypeView};
use crate::views::scatter::{ScatterChart, ScatterView, Series};
use anyhow::Result;
use comfy_table::Cell;
use tokio::sync::mpsc;
use tracing::debug;

const BAR_WIDTH: usize = 30;

impl Histogram {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Price up to"),
            ui::header_cell("Listings"),
            ui::header_cell(""),
        ]);

        let max = self.bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
        for bin in &self.bins {
            table.add_row(vec![
                ui::amount_cell(&bin.label),
                ui::count_cell(bin.count),
                Cell::new(ui::bar(bin.count as f64, max, BAR_WIDTH)),
            ]);
        }

        format!(
            "{}\n\n{}\n\nTotal listings: {}",
            ui::style_text("Price Distribution", ui::StyleType::Title),
            table,
            ui::style_text(&self.total().to_string(), ui::StyleType::Value)
        )
    }
}

impl ScatterChart {
    pub fn display_as_table(&self, title: &str, x_label: &str) -> String {
        let mut output = format!("{}\n", ui::style_text(title, ui::StyleType::Title));

        for (series, name) in [
            (Series::Accessible, "Accessible to foreigners"),
            (Series::NotAccessible, "Not accessible to foreigners"),
        ] {
            let points = self.series(series);
            let mut table = ui::new_styled_table();
            table.set_header(vec![
                ui::header_cell("Property"),
                ui::header_cell(x_label),
                ui::header_cell("Price"),
                ui::header_cell("Link"),
            ]);
            for point in points {
                table.add_row(vec![
                    Cell::new(&point.label),
                    ui::amount_cell(&format!("{:.0} m²", point.x)),
                    ui::amount_cell(&format!("{:.2}", point.y)),
                    Cell::new(point.link.as_deref().unwrap_or("")),
                ]);
            }
            output.push_str(&format!(
                "\n{} ({})\n{}\n",
                ui::style_text(name, ui::StyleType::Label),
                points.len(),
                table
            ));
        }
        output
    }
}

impl PieChart {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Type"),
            ui::header_cell("Count"),
            ui::header_cell("Share"),
            ui::header_cell(""),
        ]);
        for (i, slice) in self.slices.iter().enumerate() {
            let share = self.share(i);
            table.add_row(vec![
                Cell::new(&slice.label),
                ui::count_cell(slice.count),
                ui::amount_cell(&format!("{share:.1}%")),
                Cell::new(ui::bar(share, 100.0, BAR_WIDTH)),
            ]);
        }
        table.to_string()
    }
}

impl LineChart {
    pub fn display_as_table(&self, currency_code: &str) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Date"),
            ui::header_cell(&format!("Average price ({currency_code})")),
            ui::header_cell(""),
        ]);
        let max = self.points.iter().copied().fold(0.0, f64::max);
        for (label, point) in self.labels.iter().zip(&self.points) {
            table.add_row(vec![
                Cell::new(label),
                ui::amount_cell(&format!("{point:.2}")),
                Cell::new(ui::bar(*point, max, BAR_WIDTH)),
            ]);
        }

        let mut output = format!(
            "{}\n\n{}",
            ui::style_text("Market Evolution", ui::StyleType::Title),
            table
        );
        if let Some(change) = self.change() {
            output.push_str(&format!(
                "\n\nChange over period: {}",
                ui::style_text(&format!("{change:.2}%"), ui::StyleType::Value)
            ));
        }
        output
    }
}

impl HeatMap {
    pub fn display_as_table(&self) -> String {
        let mut points: Vec<_> = self.points.iter().collect();
        points.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        let max = self.max_weight().unwrap_or(0.0);

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Location"),
            ui::header_cell("Lat"),
            ui::header_cell("Lng"),
            ui::header_cell("Average price"),
            ui::header_cell(""),
        ]);
        for point in points {
            table.add_row(vec![
                Cell::new(&point.name),
                ui::amount_cell(&format!("{:.4}", point.lat)),
                ui::amount_cell(&format!("{:.4}", point.lng)),
                ui::amount_cell(&point.average_price),
                Cell::new(ui::bar(point.weight, max, BAR_WIDTH)),
            ]);
        }

        format!(
            "{}\n\n{}\n\n{} {}",
            ui::style_text("Average Price by Location", ui::StyleType::Title),
            table,
            ui::style_text("Locations:", ui::StyleType::Label),
            self.locations.join(", ")
        )
    }
}

/// Prints either the rendering or a notice when the fetch failed or came back
/// empty.
pub(crate) fn print_or_notice(
    outcome: FetchOutcome,
    empty: bool,
    what: &str,
    rendered: impl FnOnce() -> String,
) {
    if let FetchOutcome::Failed(kind) = outcome {
        debug!(?kind, what, "Rendering empty view");
    }
    if empty {
        println!("{}", ui::empty_notice(what));
    } else {
        println!("{}", rendered());
    }
}

pub async fn distribution(session: &Session) -> Result<()> {
    println!("{}\n", ui::filter_banner(&session.filter()));
    let (outcome, histogram) = session.load(PriceDistributionView).await;
    print_or_notice(outcome, histogram.bins.is_empty(), "price distribution", || {
        histogram.display_as_table()
    });
    Ok(())
}

pub async fn scatter(session: &Session) -> Result<()> {
    println!("{}\n", ui::filter_banner(&session.filter()));
    let (outcome, chart) = session.load(ScatterView::price_vs_size()).await;
    let currency = session.filter().currency;
    print_or_notice(outcome, chart.is_empty(), "properties", || {
        chart.display_as_table(&format!("Price ({}) vs Size", currency.code()), "Size")
    });
    Ok(())
}

pub async fn accessible(
    session: &Session,
    min_size: Option<f64>,
    max_size: Option<f64>,
) -> Result<()> {
    println!("{}\n", ui::filter_banner(&session.filter()));
    let (outcome, chart) = session
        .load(ScatterView::price_vs_accessible(min_size, max_size))
        .await;
    let currency = session.filter().currency;
    print_or_notice(outcome, chart.is_empty(), "properties", || {
        chart.display_as_table(
            &format!("Price ({}) vs Accessibility", currency.code()),
            "Interior",
        )
    });
    Ok(())
}

pub async fn property_types(session: &Session) -> Result<()> {
    let filter = session.filter();
    let (outcome, pie) = session.load(PropertyTypeView).await;
    print_or_notice(outcome, pie.slices.is_empty(), "property types", || {
        format!(
            "{} ({})\n\n{}",
            ui::style_text("Property Type Distribution", ui::StyleType::Title),
            filter.region,
            pie.display_as_table()
        )
    });
    Ok(())
}

pub async fn evolution(session: &Session) -> Result<()> {
    let filter = session.filter();
    println!("{}\n", ui::filter_banner(&filter));
    let (outcome, chart) = session.load(MarketEvolutionView).await;
    print_or_notice(outcome, chart.is_empty(), "price history", || {
        chart.display_as_table(filter.currency.code())
    });
    Ok(())
}

pub async fn heatmap(session: &Session) -> Result<()> {
    let (outcome, map) = session.load(LocationsView).await;
    print_or_notice(outcome, map.points.is_empty(), "locations", || {
        map.display_as_table()
    });
    Ok(())
}

/// One line of the region comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRow {
    pub region: Region,
    pub listings: u64,
    /// Upper edge of the fullest price band.
    pub busiest_band: Option<String>,
    pub available: bool,
}

impl RegionRow {
    fn new(region: Region, outcome: FetchOutcome, histogram: &Histogram) -> Self {
        let busiest_band = histogram
            .bins
            .iter()
            .filter(|b| b.count > 0)
            .max_by_key(|b| b.count)
            .map(|b| b.label.clone());
        RegionRow {
            region,
            listings: histogram.total(),
            busiest_band,
            available: !matches!(outcome, FetchOutcome::Failed(_)),
        }
    }
}

pub fn regions_table(rows: &[RegionRow]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Region"),
        ui::header_cell("Listings"),
        ui::header_cell("Busiest price band"),
        ui::header_cell(""),
    ]);

    let max = rows.iter().map(|r| r.listings).max().unwrap_or(0) as f64;
    for row in rows {
        let band = match (&row.busiest_band, row.available) {
            (_, false) => "unavailable".to_string(),
            (Some(band), true) => band.clone(),
            (None, true) => "N/A".to_string(),
        };
        table.add_row(vec![
            Cell::new(row.region),
            ui::count_cell(row.listings),
            ui::amount_cell(&band),
            Cell::new(ui::bar(row.listings as f64, max, BAR_WIDTH)),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Listings by Region", ui::StyleType::Title),
        table
    )
}

/// Walks a private filter store through every region while one adapter
/// follows it. Each step waits for the refresh of the previous region, so no
/// region is coalesced away by the watch channel.
pub(crate) async fn compare_regions(session: &Session) -> Vec<RegionRow> {
    let adapter = &session.adapter(PriceDistributionView);
    let store = FilterStore::new(session.filter().with_region(Region::All));
    let changes = store.subscribe();
    let (refreshed_tx, mut refreshed) = mpsc::unbounded_channel();

    let follower = adapter.follow(changes, move |filter, outcome| {
        let _ = refreshed_tx.send((filter.region, outcome));
    });
    let driver = async move {
        let ctx = session.render_context();
        let mut rows = Vec::with_capacity(Region::ALL.len());
        for region in Region::ALL {
            if !region.is_all() {
                store.set_region(region);
            }
            let Some((region, outcome)) = refreshed.recv().await else {
                break;
            };
            let histogram = adapter.render(&ctx).await;
            rows.push(RegionRow::new(region, outcome, &histogram));
        }
        // Closing the store ends the follower.
        drop(store);
        rows
    };

    let ((), rows) = tokio::join!(follower, driver);
    rows
}

pub async fn regions(session: &Session) -> Result<()> {
    println!(
        "{}\n",
        ui::filter_banner(&session.filter().with_region(Region::All))
    );

    let rows = compare_regions(session).await;
    let empty = rows.iter().all(|r| !r.available || r.listings == 0);
    if empty {
        println!("{}", ui::empty_notice("listings"));
    } else {
        println!("{}", regions_table(&rows));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::session::FilterOverrides;
    use crate::core::config::AppConfig;
    use crate::core::view::test_support::MockApi;
    use crate::views::histogram::HistogramBin;
    use serde_json::json;
    use std::sync::Arc;
    use crate::views::scatter::ScatterPoint;

    #[test]
    fn test_histogram_table() {
        console::set_colors_enabled(false);
        let histogram = Histogram {
            bins: vec![
                HistogramBin {
                    label: "0 – €105,000.00".to_string(),
                    count: 3,
                },
                HistogramBin {
                    label: "€210,000.00".to_string(),
                    count: 7,
                },
            ],
        };
        let output = histogram.display_as_table();
        assert!(output.contains("€210,000.00"));
        assert!(output.contains("Total listings: 10"));
    }

    #[test]
    fn test_scatter_table_lists_both_series() {
        console::set_colors_enabled(false);
        let chart = ScatterChart {
            accessible: vec![ScatterPoint {
                x: 300.0,
                y: 400_000.0,
                label: "Villa - Tamarin".to_string(),
                link: Some("https://example.com/1".to_string()),
            }],
            not_accessible: vec![],
        };
        let output = chart.display_as_table("Price vs Size", "Size");
        assert!(output.contains("Accessible to foreigners (1)"));
        assert!(output.contains("Not accessible to foreigners (0)"));
        assert!(output.contains("400000.00"));
    }

    #[tokio::test]
    async fn test_compare_regions_fetches_each_region_once() {
        let api = Arc::new(MockApi::new().respond(
            "price_distribution/",
            json!({"bin_edges": [0, 5000000, 10000000], "counts": [3, 7]}),
        ));
        let overrides = FilterOverrides {
            region: Some(Region::North),
            location: Some("Grand Baie".to_string()),
            ..Default::default()
        };
        let session = Session::with_api(AppConfig::default(), &overrides, api.clone()).await;
        let calls_before = api.call_count();

        let rows = compare_regions(&session).await;

        let regions: Vec<Region> = rows.iter().map(|r| r.region).collect();
        assert_eq!(regions, Region::ALL.to_vec());
        assert!(rows.iter().all(|r| r.available && r.listings == 10));
        assert_eq!(api.call_count() - calls_before, Region::ALL.len());
        // The session's own selection is left alone.
        assert_eq!(session.filter().region, Region::North);
        assert_eq!(session.filter().location.as_deref(), Some("Grand Baie"));
    }

    #[tokio::test]
    async fn test_compare_regions_marks_failures() {
        let api = Arc::new(MockApi::new());
        let session = Session::with_api(AppConfig::default(), &FilterOverrides::default(), api).await;

        let rows = compare_regions(&session).await;
        assert_eq!(rows.len(), Region::ALL.len());
        assert!(rows.iter().all(|r| !r.available && r.busiest_band.is_none()));

        console::set_colors_enabled(false);
        let output = regions_table(&rows);
        assert!(output.contains("unavailable"));
    }

    #[test]
    fn test_region_row_picks_busiest_band() {
        let histogram = Histogram {
            bins: vec![
                HistogramBin {
                    label: "0 – Rs 5".to_string(),
                    count: 3,
                },
                HistogramBin {
                    label: "Rs 10".to_string(),
                    count: 7,
                },
            ],
        };
        let row = RegionRow::new(Region::West, FetchOutcome::Fetched, &histogram);
        assert_eq!(row.busiest_band.as_deref(), Some("Rs 10"));
        assert_eq!(row.listings, 10);
    }
}
