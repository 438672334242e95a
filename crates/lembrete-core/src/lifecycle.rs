//! Record lifecycle: activation, payment, postponement and removal.
//!
//! Every function works on the full in-memory collection. On error the
//! collection is left exactly as it was passed in.
//!
//! ```text
//!   active ──mark_as_paid──▶ paid (terminal)
//!     │ ▲
//!     └─┘ postpone
//!   delete_record removes a record from either state
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  Error, Result,
  plan::{Installment, NewPlan, PaymentPlan, PlanTerms},
  schedule,
};

// ─── Activation ──────────────────────────────────────────────────────────────

/// Build the initial records of a new series.
///
/// Monthly series get every installment; weekly series get installment 1
/// only. `default_due_day` applies when monthly terms omit a day.
pub fn activate(
  input: NewPlan,
  default_due_day: u32,
  now: DateTime<Utc>,
) -> Result<Vec<PaymentPlan>> {
  let client_name = input.client_name.trim();
  if client_name.is_empty() {
    return Err(Error::EmptyClientName);
  }
  if input.amount < Decimal::ZERO {
    return Err(Error::NegativeAmount);
  }

  let series_id = Uuid::new_v4();
  let record = |due_date: NaiveDate, installment: Installment| PaymentPlan {
    plan_id: Uuid::new_v4(),
    series_id,
    client_name: client_name.to_owned(),
    amount: input.amount,
    due_date,
    created_at: now,
    paid_at: None,
    active: true,
    notification_timing: input.notification_timing,
    analysis_id: input.analysis_id,
    installment,
  };

  let plans = match &input.terms {
    PlanTerms::Monthly { total_months, due_day } => {
      check_period_count(*total_months)?;
      let due_day = due_day.unwrap_or(default_due_day);
      schedule::monthly_schedule(input.start_date, *total_months, due_day)
        .into_iter()
        .zip(1..)
        .map(|(due, month)| {
          record(due, Installment::Monthly {
            month,
            total_months: *total_months,
            due_day: due_day.clamp(1, 31),
          })
        })
        .collect()
    }
    PlanTerms::Weekly { total_weeks, weekday } => {
      check_period_count(*total_weeks)?;
      let weekday = schedule::parse_weekday(weekday)?;
      schedule::weekly_schedule(input.start_date, 1, weekday)
        .into_iter()
        .map(|due| {
          record(due, Installment::Weekly { week: 1, total_weeks: *total_weeks })
        })
        .collect()
    }
  };

  Ok(plans)
}

/// A series needs at least one period and at most [`schedule::MAX_PERIODS`].
pub fn check_period_count(count: u32) -> Result<()> {
  if count == 0 || count > schedule::MAX_PERIODS {
    return Err(Error::InvalidPeriodCount);
  }
  Ok(())
}

// ─── Mark as paid ────────────────────────────────────────────────────────────

/// Result of [`mark_as_paid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkPaid {
  /// The record was outstanding and is now paid. `successor` is the next
  /// installment appended to the collection, if one was created.
  Paid { successor: Option<PaymentPlan> },
  /// The record was already paid; nothing changed.
  AlreadyPaid,
}

/// Mark `plan_id` as paid and append its successor when the series has one
/// left that does not exist yet.
pub fn mark_as_paid(
  plans: &mut Vec<PaymentPlan>,
  plan_id: Uuid,
  now: DateTime<Utc>,
) -> Result<MarkPaid> {
  let pos = plans
    .iter()
    .position(|p| p.plan_id == plan_id)
    .ok_or(Error::PlanNotFound(plan_id))?;

  if !plans[pos].active {
    return Ok(MarkPaid::AlreadyPaid);
  }

  let successor = next_installment(&plans[pos], now).filter(|next| {
    !plans.iter().any(|p| {
      p.series_id == next.series_id
        && p.installment.index() == next.installment.index()
    })
  });

  let paid = &mut plans[pos];
  paid.active = false;
  paid.paid_at = Some(now);

  if let Some(next) = &successor {
    plans.push(next.clone());
  }
  Ok(MarkPaid::Paid { successor })
}

/// The record that follows `plan` in its series, or `None` at the end.
pub fn next_installment(plan: &PaymentPlan, now: DateTime<Utc>) -> Option<PaymentPlan> {
  let installment = plan.installment.next()?;
  let due_date = match installment {
    Installment::Monthly { due_day, .. } => {
      schedule::month_offset(plan.due_date, 1, due_day)?
    }
    Installment::Weekly { .. } => plan.due_date.checked_add_days(Days::new(7))?,
  };

  Some(PaymentPlan {
    plan_id: Uuid::new_v4(),
    due_date,
    created_at: now,
    paid_at: None,
    active: true,
    installment,
    ..plan.clone()
  })
}

// ─── Postpone ────────────────────────────────────────────────────────────────

/// Push an outstanding monthly installment back by `days`. Returns the new
/// due date.
pub fn postpone(plans: &mut [PaymentPlan], plan_id: Uuid, days: u32) -> Result<NaiveDate> {
  if days == 0 {
    return Err(Error::InvalidPostponeDays);
  }
  let plan = plans
    .iter_mut()
    .find(|p| p.plan_id == plan_id)
    .ok_or(Error::PlanNotFound(plan_id))?;

  if !matches!(plan.installment, Installment::Monthly { .. }) {
    return Err(Error::PostponeUnsupported(plan_id));
  }
  if !plan.active {
    return Err(Error::AlreadyPaid(plan_id));
  }

  plan.due_date = plan
    .due_date
    .checked_add_days(Days::new(u64::from(days)))
    .ok_or(Error::InvalidPostponeDays)?;
  Ok(plan.due_date)
}

// ─── Removal ─────────────────────────────────────────────────────────────────

/// Remove one record. Siblings in the same series are left alone.
pub fn delete_record(plans: &mut Vec<PaymentPlan>, plan_id: Uuid) -> Result<PaymentPlan> {
  let pos = plans
    .iter()
    .position(|p| p.plan_id == plan_id)
    .ok_or(Error::PlanNotFound(plan_id))?;
  Ok(plans.remove(pos))
}

/// Remove every record of a series and return them.
pub fn delete_series(
  plans: &mut Vec<PaymentPlan>,
  series_id: Uuid,
) -> Result<Vec<PaymentPlan>> {
  if !plans.iter().any(|p| p.series_id == series_id) {
    return Err(Error::SeriesNotFound(series_id));
  }
  let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(plans)
    .into_iter()
    .partition(|p| p.series_id == series_id);
  *plans = kept;
  Ok(removed)
}

/// Drop records whose client is no longer known. Returns how many were
/// removed.
pub fn remove_orphans(plans: &mut Vec<PaymentPlan>, known_clients: &HashSet<String>) -> usize {
  let before = plans.len();
  plans.retain(|p| known_clients.contains(&p.client_name));
  before - plans.len()
}
