//! Job money math: labor cost, profit and balances.
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Hours between two instants, rounded to two decimals. Never negative.
pub fn elapsed_hours(clock_in: DateTime<Utc>, clock_out: DateTime<Utc>) -> Decimal {
    let seconds = (clock_out - clock_in).num_seconds().max(0);
    (Decimal::from(seconds) / Decimal::from(3600)).round_dp(2)
}

/// Stored hours win; otherwise the clock span; zero while still clocked in.
pub fn effective_hours(
    hours: Option<Decimal>,
    clock_in: DateTime<Utc>,
    clock_out: Option<DateTime<Utc>>,
) -> Decimal {
    match (hours, clock_out) {
        (Some(h), _) => h,
        (None, Some(out)) => elapsed_hours(clock_in, out),
        (None, None) => Decimal::ZERO,
    }
}

/// `None` when the product does not fit in a `Decimal`.
pub fn calculated_earnings(hours_worked: Decimal, hourly_rate: Decimal) -> Option<Decimal> {
    hours_worked.checked_mul(hourly_rate).map(|v| v.round_dp(2))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFinancials {
    pub labor_cost: Decimal,
    pub receipt_expenses: Decimal,
    pub total_cost: Decimal,
    pub profit: Decimal,
    pub remaining_balance: Decimal,
}

impl JobFinancials {
    pub fn compute(
        project_value: Decimal,
        amount_paid: Decimal,
        labor_cost: Decimal,
        receipt_expenses: Decimal,
    ) -> Self {
        let total_cost = labor_cost + receipt_expenses;
        Self {
            labor_cost,
            receipt_expenses,
            total_cost,
            profit: project_value - labor_cost - receipt_expenses,
            remaining_balance: project_value - amount_paid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn profit_subtracts_labor_and_receipts() {
        let f = JobFinancials::compute(dec("10000"), dec("2500"), dec("3200.50"), dec("1800.25"));
        assert_eq!(f.total_cost, dec("5000.75"));
        assert_eq!(f.profit, dec("4999.25"));
        assert_eq!(f.remaining_balance, dec("7500"));
    }

    #[test]
    fn profit_can_go_negative() {
        let f = JobFinancials::compute(dec("1000"), dec("0"), dec("900"), dec("300"));
        assert_eq!(f.profit, dec("-200"));
    }

    #[test]
    fn elapsed_hours_rounds_to_cents() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(elapsed_hours(start, start + Duration::minutes(90)), dec("1.5"));
        assert_eq!(elapsed_hours(start, start + Duration::minutes(20)), dec("0.33"));
        assert_eq!(elapsed_hours(start, start - Duration::hours(1)), Decimal::ZERO);
    }

    #[test]
    fn effective_hours_prefers_stored_value() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let end = start + Duration::hours(8);
        assert_eq!(effective_hours(Some(dec("7.5")), start, Some(end)), dec("7.5"));
        assert_eq!(effective_hours(None, start, Some(end)), dec("8"));
        assert_eq!(effective_hours(None, start, None), Decimal::ZERO);
    }

    #[test]
    fn earnings_are_hours_times_rate() {
        assert_eq!(calculated_earnings(dec("37.5"), dec("24.80")), Some(dec("930.00")));
    }

    #[test]
    fn earnings_overflow_is_reported_not_panicked() {
        let huge = dec("1000000000000000");
        assert_eq!(calculated_earnings(huge, huge), None);
    }
}
