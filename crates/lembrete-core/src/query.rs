//! Read-side helpers: list filters, reminder selection and client grouping.

use std::collections::{BTreeMap, HashSet};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::plan::{NotificationTiming, PaymentPlan, PlanCategory};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`filter_plans`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanQuery {
  /// Case-insensitive substring match on the client name.
  pub client:   Option<String>,
  pub due_from: Option<NaiveDate>,
  pub due_to:   Option<NaiveDate>,
  pub active:   Option<bool>,
  pub category: Option<PlanCategory>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

impl PlanQuery {
  pub fn matches(&self, plan: &PaymentPlan) -> bool {
    if let Some(needle) = &self.client
      && !plan
        .client_name
        .to_lowercase()
        .contains(&needle.trim().to_lowercase())
    {
      return false;
    }
    self.due_from.is_none_or(|from| plan.due_date >= from)
      && self.due_to.is_none_or(|to| plan.due_date <= to)
      && self.active.is_none_or(|a| plan.active == a)
      && self.category.is_none_or(|c| plan.category() == c)
  }
}

/// Records matching `query`, ordered by due date then installment index.
pub fn filter_plans<'a>(plans: &'a [PaymentPlan], query: &PlanQuery) -> Vec<&'a PaymentPlan> {
  let mut hits: Vec<&PaymentPlan> = plans.iter().filter(|p| query.matches(p)).collect();
  hits.sort_by_key(|p| urgency_key(p));
  hits
    .into_iter()
    .skip(query.offset.unwrap_or(0))
    .take(query.limit.unwrap_or(usize::MAX))
    .collect()
}

// ─── Plan set ────────────────────────────────────────────────────────────────

/// Records of `category` whose client still exists.
pub fn plan_set<'a>(
  plans: &'a [PaymentPlan],
  known_clients: &HashSet<String>,
  category: PlanCategory,
) -> Vec<&'a PaymentPlan> {
  plans
    .iter()
    .filter(|p| known_clients.contains(&p.client_name) && p.category() == category)
    .collect()
}

// ─── Reminders ───────────────────────────────────────────────────────────────

/// Whether an outstanding record should be shown as a reminder on `today`.
pub fn is_notification_due(plan: &PaymentPlan, today: NaiveDate) -> bool {
  if !plan.active {
    return false;
  }
  match plan.timing() {
    NotificationTiming::OnDueDate => plan.due_date <= today,
    NotificationTiming::NextWeek => plan
      .due_date
      .checked_add_days(Days::new(7))
      .is_some_and(|d| d <= today),
  }
}

/// Records due for a reminder on `today`, most overdue first.
pub fn due_notifications(plans: &[PaymentPlan], today: NaiveDate) -> Vec<&PaymentPlan> {
  let mut due: Vec<&PaymentPlan> =
    plans.iter().filter(|p| is_notification_due(p, today)).collect();
  due.sort_by_key(|p| urgency_key(p));
  due
}

// ─── Grouping ────────────────────────────────────────────────────────────────

/// A client's outstanding records: the soonest due one plus the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientGroup {
  pub client_name: String,
  pub most_urgent: PaymentPlan,
  pub additional:  Vec<PaymentPlan>,
}

/// Group active records by client.
///
/// Within a group, records are ordered by due date, then installment index,
/// then plan id; the first becomes `most_urgent`. Groups are ordered by their
/// most urgent due date, then client name.
pub fn group_by_client(plans: &[PaymentPlan]) -> Vec<ClientGroup> {
  let mut by_client: BTreeMap<&str, Vec<&PaymentPlan>> = BTreeMap::new();
  for plan in plans.iter().filter(|p| p.active) {
    by_client.entry(plan.client_name.as_str()).or_default().push(plan);
  }

  let mut groups: Vec<ClientGroup> = by_client
    .into_iter()
    .filter_map(|(client, mut records)| {
      records.sort_by_key(|p| urgency_key(p));
      let mut records = records.into_iter().cloned();
      let most_urgent = records.next()?;
      Some(ClientGroup {
        client_name: client.to_owned(),
        most_urgent,
        additional: records.collect(),
      })
    })
    .collect();

  groups.sort_by(|a, b| {
    a.most_urgent
      .due_date
      .cmp(&b.most_urgent.due_date)
      .then_with(|| a.client_name.cmp(&b.client_name))
  });
  groups
}

fn urgency_key(plan: &PaymentPlan) -> (NaiveDate, u32, uuid::Uuid) {
  (plan.due_date, plan.installment.index(), plan.plan_id)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use rust_decimal_macros::dec;
  use uuid::Uuid;

  use super::*;
  use crate::plan::Installment;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn plan(client: &str, due: NaiveDate, index: u32) -> PaymentPlan {
    PaymentPlan {
      plan_id:             Uuid::new_v4(),
      series_id:           Uuid::new_v4(),
      client_name:         client.into(),
      amount:              dec!(100),
      due_date:            due,
      created_at:          Utc::now(),
      paid_at:             None,
      active:              true,
      notification_timing: None,
      analysis_id:         None,
      installment:         Installment::Monthly { month: index, total_months: 6, due_day: 5 },
    }
  }

  // ── Filters ───────────────────────────────────────────────────────────────

  #[test]
  fn query_filters_by_name_date_and_state() {
    let mut paid = plan("Ana Souza", date(2024, 3, 5), 2);
    paid.active = false;
    let plans = vec![
      plan("Ana Souza", date(2024, 2, 5), 1),
      paid,
      plan("Bruno", date(2024, 2, 10), 1),
    ];

    let query = PlanQuery { client: Some("ana".into()), ..Default::default() };
    assert_eq!(filter_plans(&plans, &query).len(), 2);

    let query = PlanQuery { active: Some(true), ..Default::default() };
    assert_eq!(filter_plans(&plans, &query).len(), 2);

    let query = PlanQuery {
      due_from: Some(date(2024, 2, 6)),
      due_to: Some(date(2024, 3, 1)),
      ..Default::default()
    };
    let hits = filter_plans(&plans, &query);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].client_name, "Bruno");
  }

  #[test]
  fn query_paginates_in_due_order() {
    let plans = vec![
      plan("C", date(2024, 4, 1), 1),
      plan("A", date(2024, 2, 1), 1),
      plan("B", date(2024, 3, 1), 1),
    ];
    let query = PlanQuery { offset: Some(1), limit: Some(1), ..Default::default() };
    let hits = filter_plans(&plans, &query);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].client_name, "B");
  }

  #[test]
  fn plan_set_splits_by_origin_and_known_clients() {
    let mut linked = plan("Ana", date(2024, 2, 5), 1);
    linked.analysis_id = Some(Uuid::new_v4());
    let plans = vec![
      plan("Ana", date(2024, 2, 5), 1),
      linked,
      plan("Gone", date(2024, 2, 5), 1),
    ];
    let known: HashSet<String> = ["Ana".to_string()].into();

    let general = plan_set(&plans, &known, PlanCategory::General);
    assert_eq!(general.len(), 1);
    assert!(general[0].analysis_id.is_none());

    let analysis = plan_set(&plans, &known, PlanCategory::Analysis);
    assert_eq!(analysis.len(), 1);
    assert!(analysis[0].analysis_id.is_some());
  }

  // ── Reminders ─────────────────────────────────────────────────────────────

  #[test]
  fn on_due_date_timing_alerts_from_due_date() {
    let mut p = plan("Ana", date(2024, 2, 5), 1);
    p.notification_timing = Some(NotificationTiming::OnDueDate);
    assert!(!is_notification_due(&p, date(2024, 2, 4)));
    assert!(is_notification_due(&p, date(2024, 2, 5)));
    assert!(is_notification_due(&p, date(2024, 2, 20)));
  }

  #[test]
  fn next_week_timing_alerts_a_week_later() {
    let mut p = plan("Ana", date(2024, 2, 5), 1);
    p.notification_timing = Some(NotificationTiming::NextWeek);
    assert!(!is_notification_due(&p, date(2024, 2, 11)));
    assert!(is_notification_due(&p, date(2024, 2, 12)));
  }

  #[test]
  fn missing_timing_behaves_as_due_date_and_paid_never_alerts() {
    let mut p = plan("Ana", date(2024, 2, 5), 1);
    assert!(is_notification_due(&p, date(2024, 2, 5)));
    p.active = false;
    assert!(!is_notification_due(&p, date(2024, 3, 5)));
  }

  #[test]
  fn due_notifications_lists_overdue_first() {
    let plans = vec![
      plan("B", date(2024, 2, 10), 1),
      plan("A", date(2024, 2, 1), 1),
      plan("C", date(2024, 3, 1), 1),
    ];
    let due = due_notifications(&plans, date(2024, 2, 15));
    let names: Vec<_> = due.iter().map(|p| p.client_name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
  }

  // ── Grouping ──────────────────────────────────────────────────────────────

  #[test]
  fn groups_pick_soonest_and_attach_rest() {
    let mut paid = plan("Ana", date(2024, 1, 5), 1);
    paid.active = false;
    let plans = vec![
      plan("Ana", date(2024, 3, 5), 3),
      paid,
      plan("Ana", date(2024, 2, 5), 2),
      plan("Bruno", date(2024, 1, 20), 1),
    ];

    let groups = group_by_client(&plans);
    assert_eq!(groups.len(), 2);

    assert_eq!(groups[0].client_name, "Bruno");
    assert!(groups[0].additional.is_empty());

    assert_eq!(groups[1].client_name, "Ana");
    assert_eq!(groups[1].most_urgent.due_date, date(2024, 2, 5));
    assert_eq!(groups[1].additional.len(), 1);
    assert_eq!(groups[1].additional[0].due_date, date(2024, 3, 5));
  }

  #[test]
  fn equal_due_dates_break_on_index() {
    let plans = vec![
      plan("Ana", date(2024, 2, 5), 4),
      plan("Ana", date(2024, 2, 5), 2),
    ];
    let groups = group_by_client(&plans);
    assert_eq!(groups[0].most_urgent.installment.index(), 2);
  }
}
