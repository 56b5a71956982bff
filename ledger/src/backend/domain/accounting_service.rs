//! Accounting domain logic for the inventory ledger.
//!
//! This module filters financial operations by period, aggregates revenue and
//! expense totals, and groups operations by day for display. Every function is
//! a pure computation over the slice it is given; reading operations from a
//! store and presenting the results are the caller's business.

use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use rust_decimal::Decimal;
use shared::{DayGroup, LedgerSummary, OperationComptable, Period, Polarity};
use std::collections::{BTreeMap, BTreeSet};

use super::period::{date_bounds, CalendarZone, PeriodError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountingError {
    #[error(transparent)]
    Period(#[from] PeriodError),
    #[error("The {0} total does not fit in an amount")]
    Overflow(&'static str),
}

/// Accounting service that handles filtering and aggregation of operations
#[derive(Debug, Clone, Default)]
pub struct AccountingService {
    zone: CalendarZone,
}

impl AccountingService {
    /// Create a service that reads dates in the given calendar zone
    pub fn new(zone: CalendarZone) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> CalendarZone {
        self.zone
    }

    /// Calendar date of an operation in the service's zone
    pub fn day_of(&self, operation: &OperationComptable) -> NaiveDate {
        self.zone.local_date(operation.date)
    }

    /// All operations whose date falls within the given month, in input order
    pub fn operations_for_month(
        &self,
        operations: &[OperationComptable],
        month: u32,
        year: i32,
    ) -> Result<Vec<OperationComptable>, PeriodError> {
        self.operations_for_period(operations, Period::Month { year, month })
    }

    /// All operations whose date falls within the given year, in input order
    pub fn operations_for_year(
        &self,
        operations: &[OperationComptable],
        year: i32,
    ) -> Result<Vec<OperationComptable>, PeriodError> {
        self.operations_for_period(operations, Period::Year(year))
    }

    /// The whole collection, unfiltered
    pub fn all_operations(&self, operations: &[OperationComptable]) -> Vec<OperationComptable> {
        operations.to_vec()
    }

    pub fn operations_for_period(
        &self,
        operations: &[OperationComptable],
        period: Period,
    ) -> Result<Vec<OperationComptable>, PeriodError> {
        let Some((first, last)) = date_bounds(period)? else {
            return Ok(self.all_operations(operations));
        };

        let filtered: Vec<OperationComptable> = operations
            .iter()
            .filter(|operation| {
                let day = self.day_of(operation);
                day >= first && day <= last
            })
            .cloned()
            .collect();

        debug!(
            "📒 LEDGER: {} of {} operations fall in {} ({} to {})",
            filtered.len(),
            operations.len(),
            period,
            first,
            last
        );
        Ok(filtered)
    }

    /// Distinct years present in the collection, most recent first.
    ///
    /// An empty collection yields the current year so pickers are never blank.
    pub fn available_years(&self, operations: &[OperationComptable]) -> Vec<i32> {
        self.available_years_at(operations, self.zone.today())
    }

    pub fn available_years_at(&self, operations: &[OperationComptable], today: NaiveDate) -> Vec<i32> {
        let years: BTreeSet<i32> = operations
            .iter()
            .map(|operation| self.day_of(operation).year())
            .collect();

        if years.is_empty() {
            return vec![today.year()];
        }
        years.into_iter().rev().collect()
    }

    /// Distinct months (1-12) present in the given year, ascending
    pub fn available_months(&self, operations: &[OperationComptable], year: i32) -> Vec<u32> {
        let months: BTreeSet<u32> = operations
            .iter()
            .map(|operation| self.day_of(operation))
            .filter(|day| day.year() == year)
            .map(|day| day.month())
            .collect();
        months.into_iter().collect()
    }

    /// Sum of amounts over revenue operations
    pub fn total_revenue(&self, operations: &[OperationComptable]) -> Result<Decimal, AccountingError> {
        sum_by_polarity(operations, Polarity::Revenue)
    }

    /// Sum of amounts over expense operations
    pub fn total_expense(&self, operations: &[OperationComptable]) -> Result<Decimal, AccountingError> {
        sum_by_polarity(operations, Polarity::Expense)
    }

    pub fn net_profit(&self, operations: &[OperationComptable]) -> Result<Decimal, AccountingError> {
        net_of(self.total_revenue(operations)?, self.total_expense(operations)?)
    }

    /// Revenue, expense and net totals of the operations
    pub fn summarize(&self, operations: &[OperationComptable]) -> Result<LedgerSummary, AccountingError> {
        let total_revenus = self.total_revenue(operations)?;
        let total_depenses = self.total_expense(operations)?;
        Ok(LedgerSummary {
            total_revenus,
            total_depenses,
            benefice_net: net_of(total_revenus, total_depenses)?,
            operation_count: operations.len(),
        })
    }

    /// Summary of the operations falling in a period
    pub fn summarize_period(
        &self,
        operations: &[OperationComptable],
        period: Period,
    ) -> Result<LedgerSummary, AccountingError> {
        let filtered = self.operations_for_period(operations, period)?;
        let summary = self.summarize(&filtered)?;
        info!(
            "📊 LEDGER: {} -> revenue {}, expense {}, net {} over {} operations",
            period, summary.total_revenus, summary.total_depenses, summary.benefice_net, summary.operation_count
        );
        Ok(summary)
    }

    /// Partition operations by calendar day.
    ///
    /// Groups come most recent day first; operations inside a group are sorted
    /// by descending timestamp, ties keeping their input order.
    pub fn group_by_day(&self, operations: &[OperationComptable]) -> Vec<DayGroup> {
        let mut by_day: BTreeMap<NaiveDate, Vec<OperationComptable>> = BTreeMap::new();
        for operation in operations {
            by_day
                .entry(self.day_of(operation))
                .or_default()
                .push(operation.clone());
        }

        by_day
            .into_iter()
            .rev()
            .map(|(date, mut members)| {
                members.sort_by(|a, b| b.date.cmp(&a.date));
                DayGroup { date, operations: members }
            })
            .collect()
    }
}

fn sum_by_polarity(operations: &[OperationComptable], polarity: Polarity) -> Result<Decimal, AccountingError> {
    let label = match polarity {
        Polarity::Revenue => "revenue",
        Polarity::Expense => "expense",
    };
    operations
        .iter()
        .filter(|operation| operation.polarity() == polarity)
        .try_fold(Decimal::ZERO, |total, operation| {
            total.checked_add(operation.montant).ok_or(AccountingError::Overflow(label))
        })
}

fn net_of(revenue: Decimal, expense: Decimal) -> Result<Decimal, AccountingError> {
    revenue.checked_sub(expense).ok_or(AccountingError::Overflow("net"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use shared::TypeOperation;

    fn service() -> AccountingService {
        AccountingService::new(CalendarZone::utc())
    }

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    fn op(id: &str, date: DateTime<Utc>, kind: TypeOperation, montant: Decimal) -> OperationComptable {
        OperationComptable {
            id: id.to_string(),
            date,
            type_operation: kind,
            montant,
            materiel_nom: None,
            personne_nom: None,
        }
    }

    fn scenario() -> Vec<OperationComptable> {
        vec![
            op("a", at(2024, 1, 15, 9), TypeOperation::LocationRevenu, dec!(100.00)),
            op("b", at(2024, 1, 20, 9), TypeOperation::ReparationDepense, dec!(30.00)),
        ]
    }

    #[test]
    fn test_scenario_totals() {
        let service = service();
        let operations = scenario();
        assert_eq!(service.total_revenue(&operations), Ok(dec!(100.00)));
        assert_eq!(service.total_expense(&operations), Ok(dec!(30.00)));
        assert_eq!(service.net_profit(&operations), Ok(dec!(70.00)));
    }

    #[test]
    fn test_every_kind_counts_on_its_side() {
        let service = service();
        let operations: Vec<OperationComptable> = TypeOperation::ALL
            .iter()
            .enumerate()
            .map(|(i, kind)| op(&i.to_string(), at(2024, 3, 1, 8), *kind, dec!(10.00)))
            .collect();

        let summary = service.summarize(&operations).unwrap();
        assert_eq!(summary.total_revenus, dec!(20.00));
        assert_eq!(summary.total_depenses, dec!(30.00));
        assert_eq!(summary.benefice_net, dec!(-10.00));
        assert_eq!(summary.operation_count, 5);
    }

    #[test]
    fn test_empty_collection_totals_are_zero() {
        let summary = service().summarize(&[]).unwrap();
        assert_eq!(summary.total_revenus, Decimal::ZERO);
        assert_eq!(summary.benefice_net, Decimal::ZERO);
    }

    #[test]
    fn test_totals_report_overflow() {
        let service = service();
        let revenues = vec![
            op("a", at(2024, 1, 15, 9), TypeOperation::LocationRevenu, Decimal::MAX),
            op("b", at(2024, 1, 16, 9), TypeOperation::LocationCaution, Decimal::MAX),
        ];
        assert_eq!(service.total_revenue(&revenues), Err(AccountingError::Overflow("revenue")));
        assert_eq!(service.total_expense(&revenues), Ok(Decimal::ZERO));
        assert_eq!(service.summarize(&revenues), Err(AccountingError::Overflow("revenue")));

        let net = vec![
            op("a", at(2024, 1, 15, 9), TypeOperation::LocationRevenu, Decimal::MAX),
            op("b", at(2024, 1, 16, 9), TypeOperation::ReparationDepense, Decimal::MAX),
        ];
        assert_eq!(service.net_profit(&net), Ok(Decimal::ZERO));
    }

    #[test]
    fn test_summarize_period_rejects_invalid_month() {
        let result = service().summarize_period(&scenario(), Period::Month { year: 2024, month: 0 });
        assert_eq!(result, Err(AccountingError::Period(PeriodError::InvalidMonth(0))));
    }

    #[test]
    fn test_month_filter_includes_leap_day_and_excludes_march_first() {
        let operations = vec![
            op("jan", at(2024, 1, 31, 23), TypeOperation::LocationRevenu, dec!(1.00)),
            op("feb1", at(2024, 2, 1, 0), TypeOperation::LocationRevenu, dec!(1.00)),
            op("leap", at(2024, 2, 29, 23), TypeOperation::LocationRevenu, dec!(1.00)),
            op("mar", at(2024, 3, 1, 0), TypeOperation::LocationRevenu, dec!(1.00)),
        ];

        let february = service().operations_for_month(&operations, 2, 2024).unwrap();
        let ids: Vec<&str> = february.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["feb1", "leap"]);
    }

    #[test]
    fn test_december_filter_stops_at_new_year() {
        let operations = vec![
            op("eve", at(2023, 12, 31, 22), TypeOperation::LocationRevenu, dec!(1.00)),
            op("new", at(2024, 1, 1, 0), TypeOperation::LocationRevenu, dec!(1.00)),
        ];
        let december = service().operations_for_month(&operations, 12, 2023).unwrap();
        assert_eq!(december.len(), 1);
        assert_eq!(december[0].id, "eve");
    }

    #[test]
    fn test_month_filter_respects_zone() {
        let operations = vec![op("late", at(2024, 1, 31, 23), TypeOperation::LocationRevenu, dec!(1.00))];
        let paris = AccountingService::new(CalendarZone::from_offset_minutes(60).unwrap());
        assert!(paris.operations_for_month(&operations, 1, 2024).unwrap().is_empty());
        assert_eq!(paris.operations_for_month(&operations, 2, 2024).unwrap().len(), 1);
    }

    #[test]
    fn test_year_filter() {
        let operations = vec![
            op("old", at(2023, 6, 1, 12), TypeOperation::LocationRevenu, dec!(1.00)),
            op("new", at(2024, 6, 1, 12), TypeOperation::LocationRevenu, dec!(1.00)),
        ];
        let year = service().operations_for_year(&operations, 2024).unwrap();
        assert_eq!(year.len(), 1);
        assert_eq!(year[0].id, "new");
    }

    #[test]
    fn test_filter_outside_range_is_empty() {
        let service = service();
        let operations = scenario();
        assert!(service.operations_for_month(&operations, 2, 2024).unwrap().is_empty());
        assert!(service.operations_for_year(&operations, 1999).unwrap().is_empty());
    }

    #[test]
    fn test_total_period_returns_everything_in_order() {
        let operations = scenario();
        let all = service().operations_for_period(&operations, Period::Total).unwrap();
        assert_eq!(all, operations);
    }

    #[test]
    fn test_invalid_month_is_an_error() {
        let result = service().operations_for_month(&scenario(), 13, 2024);
        assert_eq!(result, Err(PeriodError::InvalidMonth(13)));
    }

    #[test]
    fn test_available_years_descending() {
        let operations = vec![
            op("1", at(2022, 5, 1, 12), TypeOperation::LocationRevenu, dec!(1.00)),
            op("2", at(2024, 5, 1, 12), TypeOperation::LocationRevenu, dec!(1.00)),
            op("3", at(2022, 8, 1, 12), TypeOperation::LocationRevenu, dec!(1.00)),
        ];
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(service().available_years_at(&operations, today), vec![2024, 2022]);
    }

    #[test]
    fn test_available_years_defaults_to_current_year() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(service().available_years_at(&[], today), vec![2026]);
        assert_eq!(service().available_years(&[]).len(), 1);
    }

    #[test]
    fn test_available_months() {
        let operations = vec![
            op("1", at(2024, 5, 1, 12), TypeOperation::LocationRevenu, dec!(1.00)),
            op("2", at(2024, 1, 3, 12), TypeOperation::LocationRevenu, dec!(1.00)),
            op("3", at(2024, 5, 20, 12), TypeOperation::LocationRevenu, dec!(1.00)),
            op("4", at(2023, 7, 20, 12), TypeOperation::LocationRevenu, dec!(1.00)),
        ];
        assert_eq!(service().available_months(&operations, 2024), vec![1, 5]);
        assert!(service().available_months(&operations, 2020).is_empty());
    }

    #[test]
    fn test_group_by_day_orders_most_recent_first() {
        let operations = vec![
            op("morning", at(2024, 1, 15, 8), TypeOperation::LocationRevenu, dec!(1.00)),
            op("older", at(2024, 1, 10, 8), TypeOperation::LocationRevenu, dec!(1.00)),
            op("evening", at(2024, 1, 15, 20), TypeOperation::ReparationDepense, dec!(1.00)),
        ];

        let groups = service().group_by_day(&operations);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        let ids: Vec<&str> = groups[0].operations.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["evening", "morning"]);
        assert_eq!(groups[1].operations[0].id, "older");
    }

    #[test]
    fn test_group_by_day_keeps_ties_in_input_order() {
        let when = at(2024, 1, 15, 8);
        let operations = vec![
            op("first", when, TypeOperation::LocationRevenu, dec!(1.00)),
            op("second", when, TypeOperation::LocationRevenu, dec!(1.00)),
        ];
        let groups = service().group_by_day(&operations);
        assert_eq!(groups[0].operations[0].id, "first");
        assert_eq!(groups[0].operations[1].id, "second");
    }

    fn arb_operation() -> impl Strategy<Value = OperationComptable> {
        (0usize..5, 0i64..10_000_000, 0i64..1_000_000_000).prop_map(|(kind, cents, seconds)| {
            op(
                &format!("op-{}", seconds),
                Utc.timestamp_opt(1_600_000_000 + seconds, 0).unwrap(),
                TypeOperation::ALL[kind],
                Decimal::new(cents, 2),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_net_is_revenue_minus_expense(operations in prop::collection::vec(arb_operation(), 0..50)) {
            let service = service();
            prop_assert_eq!(
                service.total_revenue(&operations).unwrap() - service.total_expense(&operations).unwrap(),
                service.net_profit(&operations).unwrap()
            );
        }

        #[test]
        fn prop_year_before_any_operation_is_empty(operations in prop::collection::vec(arb_operation(), 0..50)) {
            let service = service();
            prop_assert!(service.operations_for_year(&operations, 1990).unwrap().is_empty());
            prop_assert!(service.operations_for_month(&operations, 6, 1990).unwrap().is_empty());
        }

        #[test]
        fn prop_months_partition_their_year(operations in prop::collection::vec(arb_operation(), 0..50)) {
            let service = service();
            for year in service.available_years(&operations) {
                let mut per_month = 0;
                for month in 1..=12 {
                    per_month += service.operations_for_month(&operations, month, year).unwrap().len();
                }
                prop_assert_eq!(per_month, service.operations_for_year(&operations, year).unwrap().len());
            }
        }
    }
}
