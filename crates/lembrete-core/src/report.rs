//! Aggregates handed to the report renderer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::appointment::Appointment;

/// Entries listed when the query does not set a limit.
pub const DEFAULT_REPORT_ENTRIES: usize = 50;

/// Upper bound on listed entries regardless of the requested limit.
pub const MAX_REPORT_ENTRIES: usize = 500;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportQuery {
  pub from:   Option<NaiveDate>,
  pub to:     Option<NaiveDate>,
  /// Exact client name.
  pub client: Option<String>,
  pub limit:  Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
  pub client_name:  String,
  pub date:         NaiveDate,
  pub service_type: String,
  pub amount:       Decimal,
}

/// Totals cover every matching appointment; `entries` is capped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
  pub total_count:  usize,
  pub total_amount: Decimal,
  pub paid_count:   usize,
  pub entries:      Vec<ReportEntry>,
}

pub fn build_report(appointments: &[Appointment], query: &ReportQuery) -> ReportSummary {
  let mut matching: Vec<&Appointment> = appointments
    .iter()
    .filter(|a| query.from.is_none_or(|from| a.date >= from))
    .filter(|a| query.to.is_none_or(|to| a.date <= to))
    .filter(|a| {
      query
        .client
        .as_deref()
        .is_none_or(|c| a.client_name == c.trim())
    })
    .collect();
  matching.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.client_name.cmp(&b.client_name)));

  let limit = query
    .limit
    .unwrap_or(DEFAULT_REPORT_ENTRIES)
    .min(MAX_REPORT_ENTRIES);

  ReportSummary {
    total_count:  matching.len(),
    total_amount: matching.iter().map(|a| a.amount).sum(),
    paid_count:   matching.iter().filter(|a| a.paid).count(),
    entries:      matching
      .iter()
      .take(limit)
      .map(|a| ReportEntry {
        client_name:  a.client_name.clone(),
        date:         a.date,
        service_type: a.service_type.clone(),
        amount:       a.amount,
      })
      .collect(),
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use rust_decimal_macros::dec;
  use uuid::Uuid;

  use super::*;

  fn appointment(client: &str, day: u32, amount: Decimal, paid: bool) -> Appointment {
    Appointment {
      appointment_id: Uuid::new_v4(),
      client_name:    client.into(),
      date:           NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
      service_type:   "tarot".into(),
      amount,
      paid,
      notes:          None,
      created_at:     Utc::now(),
    }
  }

  #[test]
  fn totals_cover_all_matches_and_entries_are_capped() {
    let appointments = vec![
      appointment("Ana", 3, dec!(120.50), true),
      appointment("Bruno", 1, dec!(80), false),
      appointment("Ana", 2, dec!(99.50), true),
    ];
    let report = build_report(&appointments, &ReportQuery {
      limit: Some(2),
      ..Default::default()
    });

    assert_eq!(report.total_count, 3);
    assert_eq!(report.total_amount, dec!(300.00));
    assert_eq!(report.paid_count, 2);
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.entries[0].client_name, "Bruno");
    assert_eq!(report.entries[1].amount, dec!(99.50));
  }

  #[test]
  fn filters_by_range_and_client() {
    let appointments = vec![
      appointment("Ana", 1, dec!(10), false),
      appointment("Ana", 10, dec!(20), true),
      appointment("Bruno", 10, dec!(30), true),
    ];
    let report = build_report(&appointments, &ReportQuery {
      from: NaiveDate::from_ymd_opt(2024, 6, 5),
      client: Some("Ana".into()),
      ..Default::default()
    });
    assert_eq!(report.total_count, 1);
    assert_eq!(report.total_amount, dec!(20));
  }

  #[test]
  fn oversized_limit_hits_hard_cap() {
    let appointments: Vec<_> = (0..(MAX_REPORT_ENTRIES + 10))
      .map(|_| appointment("Ana", 1, dec!(1), false))
      .collect();
    let report = build_report(&appointments, &ReportQuery {
      limit: Some(usize::MAX),
      ..Default::default()
    });
    assert_eq!(report.entries.len(), MAX_REPORT_ENTRIES);
    assert_eq!(report.total_count, MAX_REPORT_ENTRIES + 10);
  }

  #[test]
  fn empty_input_yields_zero_totals() {
    let report = build_report(&[], &ReportQuery::default());
    assert_eq!(report.total_count, 0);
    assert_eq!(report.total_amount, Decimal::ZERO);
    assert!(report.entries.is_empty());
  }
}
