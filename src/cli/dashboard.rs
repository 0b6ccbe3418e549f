use super::charts::print_or_notice;
use super::session::Session;
use super::ui;
use crate::core::view::FetchOutcome;
use crate::views::histogram::PriceDistributionView;
use crate::views::metrics::{DASHBOARD_TIMEOUT, MarketValueView, MetricsCard, MetricsView};
use crate::views::pie::PropertyTypeView;
use anyhow::Result;
use comfy_table::Cell;
use tracing::info;

impl MetricsCard {
    pub fn display_as_table(&self, market_value: Option<&str>) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
        table.add_row(vec![
            Cell::new("Current market value"),
            ui::amount_cell(market_value.unwrap_or("N/A")),
        ]);
        table.add_row(vec![
            Cell::new("Price per m²"),
            ui::amount_cell(&self.price_per_sq_meter),
        ]);
        table.add_row(vec![
            Cell::new("Average interior size"),
            ui::amount_cell(&self.average_interior_size),
        ]);
        table.add_row(vec![
            Cell::new("Average land size"),
            ui::amount_cell(&self.average_land_size),
        ]);
        table.add_row(vec![Cell::new("Listings"), ui::count_cell(self.count)]);
        table.to_string()
    }
}

/// Loads the overview views concurrently and prints them in a fixed order.
pub async fn run(session: &Session) -> Result<()> {
    let filter = session.filter();
    println!("{}\n", ui::filter_banner(&filter));

    let pb = ui::new_progress_bar(4, true);
    pb.set_message("Loading dashboard...");
    let tracked = |outcome: FetchOutcome| {
        pb.inc(1);
        outcome
    };

    let (metrics, market_value, types, distribution) = tokio::join!(
        async {
            let (outcome, card) = session.load_with_timeout(MetricsView, DASHBOARD_TIMEOUT).await;
            (tracked(outcome), card)
        },
        async {
            let (outcome, value) = session
                .load_with_timeout(MarketValueView, DASHBOARD_TIMEOUT)
                .await;
            (tracked(outcome), value)
        },
        async {
            let (outcome, pie) = session.load(PropertyTypeView).await;
            (tracked(outcome), pie)
        },
        async {
            let (outcome, histogram) = session.load(PriceDistributionView).await;
            (tracked(outcome), histogram)
        },
    );
    pb.finish_and_clear();
    info!(
        metrics = ?metrics.0,
        market_value = ?market_value.0,
        types = ?types.0,
        distribution = ?distribution.0,
        "Dashboard loaded"
    );

    println!(
        "{}\n\n{}",
        ui::style_text("Sales Market Analysis", ui::StyleType::Title),
        metrics.1.display_as_table(market_value.1.as_deref())
    );

    ui::print_separator();
    let (outcome, pie) = types;
    print_or_notice(outcome, pie.slices.is_empty(), "property types", || {
        format!(
            "{}\n\n{}",
            ui::style_text("Property Type Distribution", ui::StyleType::Title),
            pie.display_as_table()
        )
    });

    ui::print_separator();
    let (outcome, histogram) = distribution;
    print_or_notice(outcome, histogram.bins.is_empty(), "price distribution", || {
        histogram.display_as_table()
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_table() {
        console::set_colors_enabled(false);
        let card = MetricsCard {
            price_per_sq_meter: "€1,050.00".to_string(),
            average_interior_size: "153 m²".to_string(),
            average_land_size: "0 m²".to_string(),
            count: 42,
        };
        let output = card.display_as_table(Some("€21,000.00"));
        assert!(output.contains("€1,050.00"));
        assert!(output.contains("€21,000.00"));
        assert!(MetricsCard::default().display_as_table(None).contains("N/A"));
    }
}
