use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::{Money, OfferRecord};

/// Headline figures across every offer in a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_offers: usize,
    pub covered_count: usize,
    /// Share of offers that received a counter-offer, `0` for an empty batch.
    pub coverage_ratio: Decimal,
    pub total_savings: Money,
}

pub fn summarize<'a, I>(offers: I) -> DashboardSummary
where
    I: IntoIterator<Item = &'a OfferRecord>,
{
    let (total_offers, covered_count, total_savings) = offers.into_iter().fold(
        (0usize, 0usize, Decimal::ZERO),
        |(total, covered, savings), offer| {
            (
                total + 1,
                covered + usize::from(offer.competitively_covered),
                savings + offer.savings_amount,
            )
        },
    );

    let coverage_ratio = if total_offers == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(covered_count) / Decimal::from(total_offers)
    };

    DashboardSummary {
        total_offers,
        covered_count,
        coverage_ratio,
        total_savings,
    }
}
