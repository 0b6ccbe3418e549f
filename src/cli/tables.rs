//! Terminal renderings of the table and feed views.

use super::charts::print_or_notice;
use super::session::Session;
use super::ui;
use crate::views::listings::{
    LatestListingsView, ListingCard, ListingSort, SoldPropertiesView, SoldRow,
};
use crate::views::price_changes::{
    HistoryEntry, PriceChangeFeedView, PriceChangeItem, PriceChangeLists, PriceChangeSort,
};
use crate::views::ranking::{AgencyDetailView, AgencyRanking, RankingTable};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use futures::future::join_all;
use std::sync::Arc;

impl RankingTable {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell("Id"),
            ui::header_cell("Agency"),
            ui::header_cell("Listings"),
            ui::header_cell("Total value"),
        ]);
        for (rank, row) in self.rows.iter().enumerate() {
            table.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(row.key),
                Cell::new(&row.agency),
                ui::count_cell(row.property_count),
                ui::amount_cell(&row.total_value),
            ]);
        }
        format!(
            "{}\n\n{}",
            ui::style_text("Agency Ranking", ui::StyleType::Title),
            table
        )
    }
}

impl AgencyDetailView {
    pub fn display(&self, agency: &str) -> String {
        let heading = ui::style_text(agency, ui::StyleType::Label);
        match self {
            AgencyDetailView::Comparison {
                agency_price,
                market_price,
                above_market,
            } => {
                let verdict = if *above_market {
                    ui::style_text("above market", ui::StyleType::Error)
                } else {
                    ui::style_text("at or below market", ui::StyleType::Value)
                };
                format!(
                    "{heading}\n  Agency price per m²: {agency_price}\n  Market price per m²: {market_price}\n  The agency is {verdict}"
                )
            }
            AgencyDetailView::Distribution(pie) => {
                format!("{heading}\n{}", pie.display_as_table())
            }
            AgencyDetailView::Empty => {
                format!("{heading}\n  {}", ui::empty_notice("details"))
            }
        }
    }
}

fn change_table(items: &[PriceChangeItem], up: bool) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Property"),
        ui::header_cell("Previous"),
        ui::header_cell("Current"),
        ui::header_cell("Change"),
        ui::header_cell("%"),
        ui::header_cell("Date"),
    ]);
    for item in items {
        table.add_row(vec![
            Cell::new(item.property_id),
            Cell::new(&item.title),
            ui::amount_cell(&item.previous_price),
            ui::amount_cell(&item.current_price),
            ui::direction_cell(&item.change, up),
            ui::direction_cell(&item.percentage, up),
            Cell::new(&item.date),
        ]);
    }
    table.to_string()
}

impl PriceChangeLists {
    pub fn display_as_table(&self) -> String {
        format!(
            "{}\n\n{} ({})\n{}\n\n{} ({})\n{}",
            ui::style_text("Market Analysis: Price Changes", ui::StyleType::Title),
            ui::style_text("Price Increases", ui::StyleType::Label),
            self.increasing.len(),
            change_table(&self.increasing, true),
            ui::style_text("Price Decreases", ui::StyleType::Label),
            self.decreasing.len(),
            change_table(&self.decreasing, false),
        )
    }
}

fn history_table(property_id: i64, entries: &[HistoryEntry]) -> String {
    let heading = ui::style_text(
        &format!("Price history for property {property_id}"),
        ui::StyleType::Label,
    );
    if entries.is_empty() {
        return format!("{heading}\n  {}", ui::empty_notice("price history"));
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Date"), ui::header_cell("Price")]);
    for entry in entries {
        table.add_row(vec![Cell::new(&entry.date), ui::amount_cell(&entry.price)]);
    }
    format!("{heading}\n{table}")
}

pub fn listings_table(cards: &[ListingCard]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Title"),
        ui::header_cell("Location"),
        ui::header_cell("Price"),
        ui::header_cell("Interior"),
        ui::header_cell("Link"),
    ]);
    for card in cards {
        table.add_row(vec![
            Cell::new(&card.title),
            Cell::new(&card.location),
            ui::amount_cell(&card.price),
            ui::amount_cell(&card.interior_size),
            Cell::new(card.link.as_deref().unwrap_or("")),
        ]);
    }
    format!(
        "{}\n\n{}",
        ui::style_text("New Listings", ui::StyleType::Title),
        table
    )
}

pub fn sold_table(rows: &[SoldRow]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Title"),
        ui::header_cell("Date"),
        ui::header_cell("Location"),
        ui::header_cell("Price"),
        ui::header_cell("Agency"),
        ui::header_cell("Type"),
        ui::header_cell("Land"),
        ui::header_cell("Interior"),
    ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.title),
            Cell::new(&row.date),
            Cell::new(&row.location),
            ui::amount_cell(&row.price),
            Cell::new(&row.agency),
            Cell::new(&row.kind),
            ui::amount_cell(&row.land_size),
            ui::amount_cell(&row.interior_size),
        ]);
    }
    format!(
        "{}\n\n{}",
        ui::style_text("Sold Properties", ui::StyleType::Title),
        table
    )
}

pub async fn agencies(session: &Session, expand: &[i64]) -> Result<()> {
    let filter = session.filter();
    println!("{}\n", ui::filter_banner(&filter));

    let ranking = AgencyRanking::new(Arc::clone(&session.api), session.config.cache.policy());
    let outcome = ranking.refresh(&filter).await;
    let ctx = session.render_context();
    let table = ranking.render(&ctx).await;
    print_or_notice(outcome, table.rows.is_empty(), "agencies", || {
        table.display_as_table()
    });
    if expand.is_empty() {
        return Ok(());
    }

    let pb = ui::new_progress_bar(expand.len() as u64, true);
    pb.set_message("Fetching agency details...");
    let detail_futures = expand.iter().map(|&agency_id| {
        let pb_clone = pb.clone();
        let (ranking, filter, ctx) = (&ranking, &filter, &ctx);
        async move {
            let details = ranking.expand(agency_id, filter, ctx).await;
            pb_clone.inc(1);
            (agency_id, details)
        }
    });
    let details = join_all(detail_futures).await;
    pb.finish_and_clear();

    for (agency_id, detail) in details {
        let name = table
            .rows
            .iter()
            .find(|row| row.key == agency_id)
            .map_or_else(|| format!("Agency {agency_id}"), |row| row.agency.clone());
        ui::print_separator();
        println!("{}", detail.display(&name));
    }
    Ok(())
}

pub async fn price_changes(
    session: &Session,
    sort: PriceChangeSort,
    dates: (Option<NaiveDate>, Option<NaiveDate>),
    history: &[i64],
) -> Result<()> {
    let filter = session.filter();
    println!("{}\n", ui::filter_banner(&filter));

    let view = PriceChangeFeedView::new(Arc::clone(&session.api), session.config.cache.policy());
    view.feed.configure(|spec| {
        spec.sort = sort;
        if let Some(start) = dates.0 {
            spec.start_date = start;
        }
        if let Some(end) = dates.1 {
            spec.end_date = end;
        }
    });

    let outcome = view.refresh(&filter).await;
    let ctx = session.render_context();
    let lists = view.render(&ctx).await;
    print_or_notice(outcome, lists.is_empty(), "price changes", || {
        lists.display_as_table()
    });

    let histories = join_all(history.iter().map(|&id| {
        let (view, ctx) = (&view, &ctx);
        async move { (id, view.history(id, ctx).await) }
    }))
    .await;
    for (id, entries) in histories {
        ui::print_separator();
        println!("{}", history_table(id, &entries));
    }
    Ok(())
}

pub async fn listings(session: &Session, sort: ListingSort) -> Result<()> {
    println!("{}\n", ui::filter_banner(&session.filter()));
    let (outcome, cards) = session.load(LatestListingsView { sort }).await;
    print_or_notice(outcome, cards.is_empty(), "new listings", || {
        listings_table(&cards)
    });
    Ok(())
}

pub async fn sold(session: &Session) -> Result<()> {
    println!("{}\n", ui::filter_banner(&session.filter()));
    let (outcome, rows) = session.load(SoldPropertiesView).await;
    print_or_notice(outcome, rows.is_empty(), "sold properties", || {
        sold_table(&rows)
    });
    Ok(())
}
