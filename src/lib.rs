//! `bank_offer_analytics` is the numeric core of a dashboard that lists third-party credit
//! offers and highlights which ones received a competitive counter-offer.
//!
//! It provides two independent, pure computations:
//! - **Amortization estimates**: from a loan's original value, rate, term and current balance,
//!   estimate how many installments were already paid (assuming a Price table contract) and
//!   build the month-by-month comparison against a counter-offer for the remainder.
//! - **Bank statistics**: group a batch of offers by bank and reporting month, producing
//!   average rates, financed volume, interest still due and counts by loan type and coverage.
//!
//! Neither keeps state between calls; both can run concurrently on separate inputs.
//!
//! ## Usage
//!
//! ```rust
//! use bank_offer_analytics::{aggregate, estimate_elapsed_periods, parse_offers_payload};
//! use rust_decimal_macros::dec;
//!
//! fn main() -> anyhow::Result<()> {
//!     let payload = r#"{
//!         "count": 1,
//!         "status": "success",
//!         "offers": [{
//!             "bank_name": "Banco Votorantim S/A",
//!             "year": 2024,
//!             "month": 8,
//!             "monthly_interest_rate": "0.02630",
//!             "financed_amount": "42500.00000",
//!             "asset_value": "60000.00000",
//!             "total_value_with_interest": "85000.00000",
//!             "installments_count": 48,
//!             "type": "automobile",
//!             "offered": true,
//!             "offered_interest_rate": "0.01990"
//!         }]
//!     }"#;
//!
//!     let offers = parse_offers_payload(payload)?;
//!     let stats = aggregate(&offers);
//!     let bank = stats.get("Banco Votorantim S/A").unwrap();
//!     println!("Average rate: {:.4}", bank.avg_rate);
//!     println!("Interest due: {:.2}", bank.total_interest_earned);
//!
//!     let schedule = offers[0].comparison_schedule()?;
//!     println!("Installment {} of {}", schedule.elapsed, schedule.term);
//!
//!     let elapsed = estimate_elapsed_periods(dec!(12000), dec!(0), 12, dec!(6000))?;
//!     assert_eq!(elapsed, 6);
//!     Ok(())
//! }
//! ```

pub mod amortization;
pub mod bank_stats;
pub mod error;
pub mod model;
pub mod parse;
pub mod rate_solver;
pub mod summary;

pub use amortization::{
    balance_after, build_comparison_schedule, build_comparison_schedule_with,
    estimate_elapsed_periods, estimate_elapsed_periods_with, periodic_payment,
    ComparisonSchedule, EstimatorConfig, SchedulePoint, FALLBACK_RATIO, TOLERANCE_BAND,
};
pub use bank_stats::{aggregate, BankStatistics, BankStatsMap, MonthlyBucket};
pub use error::{FinancingError, FinancingResult};
pub use model::{round_money, LoanType, Money, OfferRecord, Period, Rate};
pub use parse::{parse_offers_payload, safe_parse_decimal, usable_records, OffersEnvelope, RawOffer};
pub use rate_solver::{annual_to_monthly_rate, implied_price_rate, implied_sac_rate};
pub use summary::{summarize, DashboardSummary};
