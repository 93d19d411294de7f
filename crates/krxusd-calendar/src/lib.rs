//! Pure, timezone-anchored market-calendar math for the Korea Exchange.
//!
//! Every function here is a pure function over KST wall-clock time —
//! no I/O, no shared state beyond an immutable holiday table. All
//! times are anchored to `Asia/Seoul` (KST, UTC+09, no DST).

mod holidays;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Asia::Seoul;
use krxusd_models::MarketPhase;
use std::collections::HashSet;

const PRE_MARKET_START: (u32, u32) = (8, 30);
const MARKET_OPEN_AT: (u32, u32) = (9, 0);
const MARKET_CLOSE_AT: (u32, u32) = (15, 30);
const AFTER_HOURS_END: (u32, u32) = (16, 0);

fn time_of(hm: (u32, u32)) -> NaiveTime {
  NaiveTime::from_hms_opt(hm.0, hm.1, 0).expect("static time constant is valid")
}

/// Pure functions over KST dates: weekend/holiday tables, trading-day
/// math, and the market-phase state machine.
#[derive(Debug, Clone)]
pub struct MarketCalendar {
  holidays: HashSet<NaiveDate>,
}

impl Default for MarketCalendar {
  fn default() -> Self {
    Self::new()
  }
}

impl MarketCalendar {
  /// Build a calendar using the compiled-in default KRX holiday table.
  pub fn new() -> Self {
    MarketCalendar { holidays: holidays::default_holidays().into_iter().collect() }
  }

  /// Build a calendar from a caller-supplied holiday table. Holiday
  /// tables are data, not code; this constructor is how operators
  /// reload or extend them without a rebuild of the compiled-in set.
  pub fn with_holidays(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
    MarketCalendar { holidays: holidays.into_iter().collect() }
  }

  /// Current wall-clock time in KST.
  pub fn now_kst(&self) -> DateTime<chrono_tz::Tz> {
    Utc::now().with_timezone(&Seoul)
  }

  pub fn is_weekend(date: NaiveDate) -> bool {
    use chrono::Weekday::*;
    matches!(date.weekday(), Sat | Sun)
  }

  pub fn is_holiday(&self, date: NaiveDate) -> bool {
    self.holidays.contains(&date)
  }

  /// Trading day ⇔ weekday ∧ not in the holiday table.
  pub fn is_trading_day(&self, date: NaiveDate) -> bool {
    !Self::is_weekend(date) && !self.is_holiday(date)
  }

  /// Iterates forward from (but not including) `from` to the next
  /// trading day.
  pub fn next_trading_day(&self, from: NaiveDate) -> NaiveDate {
    let mut candidate = from + Duration::days(1);
    while !self.is_trading_day(candidate) {
      candidate += Duration::days(1);
    }
    candidate
  }

  /// Iterates backward from (but not including) `from` to the previous
  /// trading day.
  pub fn prev_trading_day(&self, from: NaiveDate) -> NaiveDate {
    let mut candidate = from - Duration::days(1);
    while !self.is_trading_day(candidate) {
      candidate -= Duration::days(1);
    }
    candidate
  }

  /// The market phase at a given instant, per the boundaries in the
  /// component design: `PRE_MARKET [08:30, 09:00)`,
  /// `MARKET_OPEN [09:00, 15:30)`, `AFTER_HOURS [15:30, 16:00)`,
  /// `MARKET_CLOSED` otherwise. Weekends and holidays are
  /// `MARKET_CLOSED` regardless of time-of-day.
  pub fn phase_at(&self, at: DateTime<Utc>) -> MarketPhase {
    let kst = at.with_timezone(&Seoul);
    let date = kst.date_naive();

    if !self.is_trading_day(date) {
      return MarketPhase::MarketClosed;
    }

    let t = kst.time();
    if t >= time_of(PRE_MARKET_START) && t < time_of(MARKET_OPEN_AT) {
      MarketPhase::PreMarket
    } else if t >= time_of(MARKET_OPEN_AT) && t < time_of(MARKET_CLOSE_AT) {
      MarketPhase::MarketOpen
    } else if t >= time_of(MARKET_CLOSE_AT) && t < time_of(AFTER_HOURS_END) {
      MarketPhase::AfterHours
    } else {
      MarketPhase::MarketClosed
    }
  }

  pub fn is_trading_time_at(&self, at: DateTime<Utc>) -> bool {
    self.phase_at(at).is_trading_time()
  }

  /// `max(0, (15:30 − now).minutes)` during trading time, else 0.
  pub fn minutes_remaining(&self, at: DateTime<Utc>) -> i64 {
    if !self.is_trading_time_at(at) {
      return 0;
    }
    let kst = at.with_timezone(&Seoul);
    let close = kst
      .date_naive()
      .and_time(time_of(MARKET_CLOSE_AT))
      .and_local_timezone(Seoul)
      .single()
      .expect("KST has no DST, local time is unambiguous");
    let remaining = close.signed_duration_since(kst);
    (remaining.num_seconds().max(0)) / 60
  }

  /// "yesterday_KST", defined against the system clock (not against
  /// the last trading day — see the Gap-Filling cursor semantics):
  /// the calendar date one day before `at`'s KST date.
  pub fn yesterday_kst(&self, at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Seoul).date_naive() - Duration::days(1)
  }

  /// Today's KST calendar date.
  pub fn today_kst(&self, at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Seoul).date_naive()
  }
}

/// Convert a naive KST wall-clock instant to UTC, for building test
/// fixtures and for the scheduler's cron anchoring.
pub fn kst_to_utc(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
  Seoul
    .from_local_datetime(&date.and_time(time))
    .single()
    .expect("KST has no DST, local time is unambiguous")
    .with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    kst_to_utc(
      NaiveDate::from_ymd_opt(y, m, d).unwrap(),
      NaiveTime::from_hms_opt(h, min, s).unwrap(),
    )
  }

  #[test]
  fn phase_boundaries_match_the_component_design() {
    let cal = MarketCalendar::new();
    // 2025-03-17 is a Monday and not a holiday.
    assert_eq!(cal.phase_at(at(2025, 3, 17, 9, 0, 0)), MarketPhase::MarketOpen);
    assert_eq!(cal.phase_at(at(2025, 3, 17, 15, 30, 0)), MarketPhase::AfterHours);
    assert_eq!(cal.phase_at(at(2025, 3, 17, 16, 0, 0)), MarketPhase::MarketClosed);
    assert_eq!(cal.phase_at(at(2025, 3, 17, 8, 30, 0)), MarketPhase::PreMarket);
    assert_eq!(cal.phase_at(at(2025, 3, 17, 8, 29, 59)), MarketPhase::MarketClosed);
  }

  #[test]
  fn weekends_are_closed_regardless_of_time() {
    let cal = MarketCalendar::new();
    // 2025-03-15 is a Saturday.
    assert_eq!(cal.phase_at(at(2025, 3, 15, 10, 0, 0)), MarketPhase::MarketClosed);
    // 2025-03-16 is a Sunday.
    assert_eq!(cal.phase_at(at(2025, 3, 16, 10, 0, 0)), MarketPhase::MarketClosed);
  }

  #[test]
  fn configured_holidays_are_closed_regardless_of_time() {
    let cal = MarketCalendar::new();
    // 2025-01-01 New Year's Day, a Wednesday.
    assert_eq!(cal.phase_at(at(2025, 1, 1, 10, 0, 0)), MarketPhase::MarketClosed);
  }

  #[test]
  fn next_and_prev_trading_day_skip_weekends() {
    let cal = MarketCalendar::new();
    let friday = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let monday = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
    assert_eq!(cal.next_trading_day(friday), monday);
    assert_eq!(cal.prev_trading_day(monday), friday);
  }

  #[test]
  fn minutes_remaining_is_zero_outside_trading_time() {
    let cal = MarketCalendar::new();
    assert_eq!(cal.minutes_remaining(at(2025, 3, 17, 16, 0, 0)), 0);
    assert_eq!(cal.minutes_remaining(at(2025, 3, 15, 10, 0, 0)), 0);
  }

  #[test]
  fn minutes_remaining_counts_down_to_close() {
    let cal = MarketCalendar::new();
    assert_eq!(cal.minutes_remaining(at(2025, 3, 17, 15, 0, 0)), 30);
  }

  #[test]
  fn with_holidays_overrides_the_compiled_in_table() {
    let custom = MarketCalendar::with_holidays(vec![NaiveDate::from_ymd_opt(2025, 3, 17).unwrap()]);
    assert!(!custom.is_trading_day(NaiveDate::from_ymd_opt(2025, 3, 17).unwrap()));
    // 2025-01-01 is not in the overriding table, so it is a trading day
    // under this calendar even though it is a holiday in the default one.
    assert!(custom.is_trading_day(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
  }

  #[test]
  fn yesterday_kst_is_the_calendar_date_before_today_not_the_last_trading_day() {
    let cal = MarketCalendar::new();
    // Monday 2025-03-17: yesterday_KST is Sunday 2025-03-16, not Friday.
    assert_eq!(cal.yesterday_kst(at(2025, 3, 17, 10, 0, 0)), NaiveDate::from_ymd_opt(2025, 3, 16).unwrap());
  }
}
