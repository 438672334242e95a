//! Due-date generation for monthly and weekly payment series.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

use crate::{Error, Result};

/// Day of month used when a monthly plan does not name one.
pub const DEFAULT_DUE_DAY: u32 = 5;

/// Days a monthly installment moves when postponed without an explicit count.
pub const DEFAULT_POSTPONE_DAYS: u32 = 7;

/// Longest series a plan may be activated with or previewed for.
pub const MAX_PERIODS: u32 = 520;

// ─── Monthly ─────────────────────────────────────────────────────────────────

/// Due dates for installments `1..=total_months`, installment `i` falling in
/// the `i`-th month after `start`'s month.
///
/// The day is `min(due_day, days in that month)`, so asking for the 31st in
/// February lands on the 28th or 29th. `due_day` outside `1..=31` is clamped.
pub fn monthly_schedule(
  start: NaiveDate,
  total_months: u32,
  due_day: u32,
) -> Vec<NaiveDate> {
  (1..=total_months)
    .filter_map(|i| month_offset(start, i, due_day))
    .collect()
}

/// The date `months` calendar months after `from`'s month, on `due_day`
/// clamped to that month's length. `None` only past chrono's date range.
pub fn month_offset(from: NaiveDate, months: u32, due_day: u32) -> Option<NaiveDate> {
  let first = from.with_day(1)?.checked_add_months(Months::new(months))?;
  let last = first.checked_add_months(Months::new(1))?.pred_opt()?.day();
  first.with_day(due_day.clamp(1, 31).min(last))
}

// ─── Weekly ──────────────────────────────────────────────────────────────────

/// `total_weeks` dates seven days apart, starting on the first `weekday` on or
/// after `start` (which is `start` itself when it already falls on `weekday`).
pub fn weekly_schedule(
  start: NaiveDate,
  total_weeks: u32,
  weekday: Weekday,
) -> Vec<NaiveDate> {
  let offset =
    (weekday_index(weekday) + 7 - weekday_index(start.weekday())) % 7;
  let Some(first) = start.checked_add_days(Days::new(u64::from(offset))) else {
    return Vec::new();
  };

  (0..u64::from(total_weeks))
    .filter_map(|i| first.checked_add_days(Days::new(7 * i)))
    .collect()
}

/// 0 = Sunday … 6 = Saturday.
pub fn weekday_index(day: Weekday) -> u32 { day.num_days_from_sunday() }

/// Parse a weekday name.
///
/// Accepts Portuguese names with or without accents and the `-feira` suffix
/// (`"sexta"`, `"Terça-feira"`, `"sabado"`), and English names or
/// abbreviations (`"friday"`, `"fri"`).
pub fn parse_weekday(name: &str) -> Result<Weekday> {
  let folded: String = name
    .trim()
    .to_lowercase()
    .chars()
    .map(|c| match c {
      'ç' => 'c',
      'á' | 'à' | 'â' | 'ã' => 'a',
      'é' | 'ê' => 'e',
      other => other,
    })
    .collect();
  let key = folded
    .strip_suffix("-feira")
    .or_else(|| folded.strip_suffix(" feira"))
    .unwrap_or(&folded);

  let day = match key {
    "domingo" => Weekday::Sun,
    "segunda" => Weekday::Mon,
    "terca" => Weekday::Tue,
    "quarta" => Weekday::Wed,
    "quinta" => Weekday::Thu,
    "sexta" => Weekday::Fri,
    "sabado" => Weekday::Sat,
    other => other
      .parse::<Weekday>()
      .map_err(|_| Error::InvalidWeekday(name.to_owned()))?,
  };
  Ok(day)
}
