use super::session::Session;
use super::ui;
use crate::core::currency;
use crate::core::filter::Currency;
use crate::views::valuation::{DistinctFeaturesView, ValuationRequest, Valuator};
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Requests a prediction and prints it in MUR and in the selected currency.
pub async fn run(session: &Session, request: ValuationRequest) -> Result<()> {
    let (_, options) = session.load(DistinctFeaturesView).await;
    let unknown = options.unknown_general(&request.general_features);
    if !options.general_features.is_empty() && !unknown.is_empty() {
        warn!(?unknown, "Features not known to the valuation model");
    }

    let prediction = Valuator::new(Arc::clone(&session.api))
        .predict(&request)
        .await?;

    let ctx = session.render_context();
    println!(
        "{} {} in {}\n",
        ui::style_text("Valuation for a", ui::StyleType::Title),
        request.property_type,
        request.region
    );
    println!(
        "Predicted price: {}",
        ui::style_text(&prediction.display(&ctx), ui::StyleType::Value)
    );
    if ctx.currency != Currency::Rupee {
        let in_rupees = currency::format(prediction.predicted_price, Currency::Rupee);
        println!("{}", ui::style_text(&in_rupees, ui::StyleType::Subtle));
    }
    Ok(())
}
