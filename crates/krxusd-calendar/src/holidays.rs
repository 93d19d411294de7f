use chrono::NaiveDate;

macro_rules! d {
  ($y:expr, $m:expr, $d:expr) => {
    NaiveDate::from_ymd_opt($y, $m, $d).expect("static holiday date is valid")
  };
}

/// KRX market holidays, 2024–2026. Reloadable data, not code: this is
/// the compiled-in default set; `MarketCalendar::with_holidays` lets
/// operators substitute or extend it without a code change.
///
/// Half-day trading sessions (e.g. the final session before Lunar New
/// Year in some years) are NOT represented here — the calendar's phase
/// function will report normal `MARKET_OPEN` across what is actually a
/// shortened or closed interval on those dates. Operators should extend
/// this table if KRX publishes a half-day calendar for a given year.
pub fn default_holidays() -> Vec<NaiveDate> {
  vec![
    // 2024
    d!(2024, 1, 1),   // New Year's Day
    d!(2024, 2, 9),   // Seollal holiday
    d!(2024, 2, 10),  // Seollal
    d!(2024, 2, 11),  // Seollal holiday
    d!(2024, 2, 12),  // substitute holiday
    d!(2024, 3, 1),   // Independence Movement Day
    d!(2024, 4, 10),  // National Assembly election day
    d!(2024, 5, 1),   // Labour Day
    d!(2024, 5, 6),   // substitute holiday
    d!(2024, 5, 15),  // Buddha's Birthday
    d!(2024, 6, 6),   // Memorial Day
    d!(2024, 8, 15),  // Liberation Day
    d!(2024, 9, 16),  // Chuseok holiday
    d!(2024, 9, 17),  // Chuseok
    d!(2024, 9, 18),  // Chuseok holiday
    d!(2024, 10, 3),  // National Foundation Day
    d!(2024, 10, 9),  // Hangeul Day
    d!(2024, 12, 25), // Christmas Day
    d!(2024, 12, 31), // year-end market holiday
    // 2025
    d!(2025, 1, 1),   // New Year's Day
    d!(2025, 1, 28),  // Seollal holiday
    d!(2025, 1, 29),  // Seollal
    d!(2025, 1, 30),  // Seollal holiday
    d!(2025, 3, 1),   // Independence Movement Day
    d!(2025, 3, 3),   // substitute holiday
    d!(2025, 5, 1),   // Labour Day
    d!(2025, 5, 5),   // Children's Day
    d!(2025, 5, 6),   // substitute holiday (Buddha's Birthday)
    d!(2025, 6, 6),   // Memorial Day
    d!(2025, 8, 15),  // Liberation Day
    d!(2025, 10, 3),  // National Foundation Day
    d!(2025, 10, 5),  // Chuseok holiday
    d!(2025, 10, 6),  // Chuseok
    d!(2025, 10, 7),  // Chuseok holiday
    d!(2025, 10, 8),  // substitute holiday
    d!(2025, 10, 9),  // Hangeul Day
    d!(2025, 12, 25), // Christmas Day
    d!(2025, 12, 31), // year-end market holiday
    // 2026
    d!(2026, 1, 1),   // New Year's Day
    d!(2026, 2, 16),  // Seollal holiday
    d!(2026, 2, 17),  // Seollal
    d!(2026, 2, 18),  // Seollal holiday
    d!(2026, 3, 1),   // Independence Movement Day
    d!(2026, 3, 2),   // substitute holiday
    d!(2026, 5, 1),   // Labour Day
    d!(2026, 5, 5),   // Children's Day / Buddha's Birthday (observed)
    d!(2026, 6, 6),   // Memorial Day
    d!(2026, 8, 15),  // Liberation Day
    d!(2026, 9, 24),  // Chuseok holiday
    d!(2026, 9, 25),  // Chuseok
    d!(2026, 9, 26),  // Chuseok holiday
    d!(2026, 10, 3),  // National Foundation Day
    d!(2026, 10, 9),  // Hangeul Day
    d!(2026, 12, 25), // Christmas Day
    d!(2026, 12, 31), // year-end market holiday
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_table_has_no_duplicate_entries() {
    let holidays = default_holidays();
    let mut sorted = holidays.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(holidays.len(), sorted.len());
  }

  #[test]
  fn default_table_covers_new_years_day_each_year() {
    let holidays = default_holidays();
    assert!(holidays.contains(&d!(2024, 1, 1)));
    assert!(holidays.contains(&d!(2025, 1, 1)));
    assert!(holidays.contains(&d!(2026, 1, 1)));
  }
}
