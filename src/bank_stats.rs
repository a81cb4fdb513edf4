//! Per-bank statistics over a batch of offers.
//!
//! Banks and their monthly buckets are kept in the order they are first encountered, which is
//! the order the time series is charted in. Sorting chronologically is left to the caller.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::model::{LoanType, Money, OfferRecord, Period, Rate};

/// Offers of one bank in one reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    #[serde(skip)]
    pub period: Period,
    /// Chart label of the period, e.g. `8/2024`.
    pub month: String,
    /// Mean periodic rate of the offers in this bucket.
    pub rate: Rate,
    pub total_financed: Money,
    pub interest_earned: Money,
    pub count: u32,
}

impl MonthlyBucket {
    fn open(offer: &OfferRecord) -> Self {
        MonthlyBucket {
            period: offer.period,
            month: offer.period.label(),
            rate: offer.periodic_rate,
            total_financed: offer.outstanding_balance,
            interest_earned: offer.interest_earned(),
            count: 1,
        }
    }

    fn absorb(&mut self, offer: &OfferRecord) {
        // mean uses the count before this offer, then the count moves
        let previous = Decimal::from(self.count);
        self.rate = (self.rate * previous + offer.periodic_rate) / (previous + Decimal::ONE);
        self.count += 1;
        self.total_financed += offer.outstanding_balance;
        self.interest_earned += offer.interest_earned();
    }
}

/// Summary of every offer seen for one bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankStatistics {
    pub bank_name: String,
    /// Mean periodic rate over all of the bank's offers.
    pub avg_rate: Rate,
    /// Sum of outstanding balances.
    pub total_financing: Money,
    /// Sum of `total_value_with_interest - outstanding_balance`, i.e. interest still due on the
    /// current balances rather than over the life of the loans.
    pub total_interest_earned: Money,
    pub offer_count: u32,
    /// Automobile offers (Price table contracts).
    pub price_count: u32,
    /// Property offers (SAC contracts).
    pub sac_count: u32,
    pub covered_count: u32,
    monthly_data: Vec<MonthlyBucket>,
    #[serde(skip)]
    bucket_index: HashMap<Period, usize>,
}

impl BankStatistics {
    fn new(bank_name: &str) -> Self {
        BankStatistics {
            bank_name: bank_name.to_string(),
            avg_rate: Decimal::ZERO,
            total_financing: Decimal::ZERO,
            total_interest_earned: Decimal::ZERO,
            offer_count: 0,
            price_count: 0,
            sac_count: 0,
            covered_count: 0,
            monthly_data: Vec::new(),
            bucket_index: HashMap::new(),
        }
    }

    /// Monthly buckets in encounter order.
    pub fn monthly_data(&self) -> &[MonthlyBucket] {
        &self.monthly_data
    }

    pub fn bucket(&self, period: &Period) -> Option<&MonthlyBucket> {
        self.bucket_index
            .get(period)
            .map(|&slot| &self.monthly_data[slot])
    }

    fn record(&mut self, offer: &OfferRecord) {
        self.offer_count += 1;
        self.total_financing += offer.outstanding_balance;
        self.total_interest_earned += offer.interest_earned();

        match offer.loan_type {
            LoanType::Automobile => self.price_count += 1,
            LoanType::Property => self.sac_count += 1,
            LoanType::Other => {}
        }

        if offer.competitively_covered {
            self.covered_count += 1;
        }

        match self.bucket_index.get(&offer.period).copied() {
            Some(slot) => self.monthly_data[slot].absorb(offer),
            None => {
                self.bucket_index.insert(offer.period, self.monthly_data.len());
                self.monthly_data.push(MonthlyBucket::open(offer));
            }
        }
    }

    fn finish(&mut self) {
        if self.offer_count == 0 {
            unreachable!("bank statistics for {} hold no offers", self.bank_name);
        }
        let weighted: Decimal = self
            .monthly_data
            .iter()
            .map(|bucket| bucket.rate * Decimal::from(bucket.count))
            .sum();
        self.avg_rate = weighted / Decimal::from(self.offer_count);
    }
}

/// Bank statistics keyed by bank name, in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BankStatsMap {
    banks: Vec<BankStatistics>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl BankStatsMap {
    pub fn get(&self, bank_name: &str) -> Option<&BankStatistics> {
        self.index.get(bank_name).map(|&slot| &self.banks[slot])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BankStatistics> {
        self.banks.iter()
    }

    pub fn bank_names(&self) -> impl Iterator<Item = &str> {
        self.banks.iter().map(|stats| stats.bank_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    pub fn into_vec(self) -> Vec<BankStatistics> {
        self.banks
    }

    fn entry(&mut self, bank_name: &str) -> &mut BankStatistics {
        let slot = match self.index.get(bank_name).copied() {
            Some(slot) => slot,
            None => {
                let slot = self.banks.len();
                self.banks.push(BankStatistics::new(bank_name));
                self.index.insert(bank_name.to_string(), slot);
                slot
            }
        };
        &mut self.banks[slot]
    }
}

impl<'a> IntoIterator for &'a BankStatsMap {
    type Item = &'a BankStatistics;
    type IntoIter = std::slice::Iter<'a, BankStatistics>;

    fn into_iter(self) -> Self::IntoIter {
        self.banks.iter()
    }
}

/// Groups `offers` by bank and reporting period in a single pass.
///
/// Every call starts from scratch; nothing is carried over between calls. An empty input
/// yields an empty map.
pub fn aggregate<'a, I>(offers: I) -> BankStatsMap
where
    I: IntoIterator<Item = &'a OfferRecord>,
{
    let mut stats = BankStatsMap::default();
    let mut seen = 0usize;

    for offer in offers {
        stats.entry(&offer.bank_name).record(offer);
        seen += 1;
    }

    for bank in &mut stats.banks {
        bank.finish();
    }

    debug!(offers = seen, banks = stats.len(), "aggregated bank statistics");
    stats
}
