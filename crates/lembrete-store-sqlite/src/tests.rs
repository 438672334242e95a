//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, Utc};
use lembrete_core::{
  appointment::{Appointment, NewAppointment},
  lifecycle::{self, MarkPaid},
  plan::{Installment, NewPlan, NotificationTiming, PaymentPlan, PlanTerms},
  query::PlanQuery,
  service::{PlanService, ScheduleDefaults},
  store::PlanStore,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn monthly_plan(client: &str) -> NewPlan {
  NewPlan {
    client_name:         client.into(),
    amount:              dec!(150.00),
    start_date:          date(2024, 1, 31),
    terms:               PlanTerms::Monthly { total_months: 3, due_day: Some(31) },
    notification_timing: Some(NotificationTiming::NextWeek),
    analysis_id:         Some(Uuid::new_v4()),
  }
}

fn weekly_plan(client: &str) -> NewPlan {
  NewPlan {
    client_name:         client.into(),
    amount:              dec!(45.5),
    start_date:          date(2024, 5, 15),
    terms:               PlanTerms::Weekly { total_weeks: 3, weekday: "sexta".into() },
    notification_timing: None,
    analysis_id:         None,
  }
}

fn appointment(client: &str) -> Appointment {
  Appointment {
    appointment_id: Uuid::new_v4(),
    client_name:    client.into(),
    date:           date(2024, 6, 1),
    service_type:   "tarot".into(),
    amount:         dec!(120.00),
    paid:           true,
    notes:          Some("primeira consulta".into()),
    created_at:     Utc::now(),
  }
}

// ─── Plans ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_store_loads_nothing() {
  let s = store().await;
  assert!(s.load_plans().await.unwrap().is_empty());
  assert!(s.load_appointments().await.unwrap().is_empty());
}

#[tokio::test]
async fn plans_roundtrip_without_field_loss() {
  let s = store().await;
  let mut plans = lifecycle::activate(monthly_plan("Ana"), 5, Utc::now()).unwrap();
  plans.extend(lifecycle::activate(weekly_plan("Bruno"), 5, Utc::now()).unwrap());
  let first = plans[0].plan_id;
  lifecycle::mark_as_paid(&mut plans, first, Utc::now()).unwrap();

  s.save_plans(plans.clone()).await.unwrap();
  let loaded = s.load_plans().await.unwrap();
  assert_eq!(loaded, plans);

  // Saving what was loaded changes nothing.
  s.save_plans(loaded.clone()).await.unwrap();
  assert_eq!(s.load_plans().await.unwrap(), loaded);
}

#[tokio::test]
async fn save_replaces_the_whole_collection() {
  let s = store().await;
  let plans = lifecycle::activate(monthly_plan("Ana"), 5, Utc::now()).unwrap();
  s.save_plans(plans.clone()).await.unwrap();

  s.save_plans(plans[1..2].to_vec()).await.unwrap();
  let loaded = s.load_plans().await.unwrap();
  assert_eq!(loaded.len(), 1);
  assert_eq!(loaded[0].plan_id, plans[1].plan_id);
}

#[tokio::test]
async fn load_preserves_collection_order() {
  let s = store().await;
  let mut plans = lifecycle::activate(monthly_plan("Ana"), 5, Utc::now()).unwrap();
  plans.reverse();
  s.save_plans(plans.clone()).await.unwrap();

  let ids: Vec<Uuid> = s.load_plans().await.unwrap().iter().map(|p| p.plan_id).collect();
  let expected: Vec<Uuid> = plans.iter().map(|p| p.plan_id).collect();
  assert_eq!(ids, expected);
}

#[tokio::test]
async fn installment_shape_survives_storage() {
  let s = store().await;
  let plans = lifecycle::activate(weekly_plan("Bruno"), 5, Utc::now()).unwrap();
  s.save_plans(plans).await.unwrap();

  let loaded = s.load_plans().await.unwrap();
  assert_eq!(loaded[0].installment, Installment::Weekly { week: 1, total_weeks: 3 });
  assert_eq!(loaded[0].amount, dec!(45.5));
  assert_eq!(loaded[0].notification_timing, None);
}

// ─── Appointments ────────────────────────────────────────────────────────────

#[tokio::test]
async fn appointments_roundtrip() {
  let s = store().await;
  let mut unpaid = appointment("Bruno");
  unpaid.paid = false;
  unpaid.notes = None;
  let appointments = vec![appointment("Ana"), unpaid];

  s.save_appointments(appointments.clone()).await.unwrap();
  assert_eq!(s.load_appointments().await.unwrap(), appointments);
}

#[tokio::test]
async fn file_store_persists_across_reopen() {
  let path = std::env::temp_dir().join(format!("lembrete-{}.db", Uuid::new_v4()));
  let plans = lifecycle::activate(monthly_plan("Ana"), 5, Utc::now()).unwrap();
  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.save_plans(plans.clone()).await.unwrap();
  }
  let reopened = SqliteStore::open(&path).await.unwrap();
  assert_eq!(reopened.load_plans().await.unwrap(), plans);
  drop(reopened);
  let _ = std::fs::remove_file(&path);
}

// ─── Service over SQLite ─────────────────────────────────────────────────────

async fn service() -> PlanService<SqliteStore> {
  PlanService::new(store().await, ScheduleDefaults::default())
}

#[tokio::test]
async fn paying_middle_monthly_installment_keeps_pregenerated_successor() {
  let svc = service().await;
  let created = svc.activate_plan(monthly_plan("Ana")).await.unwrap();
  let third_before: PaymentPlan = created[2].clone();

  let outcome = svc.mark_as_paid(created[1].plan_id).await.unwrap();
  assert_eq!(outcome, MarkPaid::Paid { successor: None });

  let stored = svc.list_plans(&PlanQuery::default()).await.unwrap();
  assert_eq!(stored.len(), 3);
  let second = stored.iter().find(|p| p.plan_id == created[1].plan_id).unwrap();
  assert!(!second.active);
  let third = stored.iter().find(|p| p.plan_id == third_before.plan_id).unwrap();
  assert_eq!(*third, third_before);
}

#[tokio::test]
async fn paying_first_week_creates_exactly_one_successor() {
  let svc = service().await;
  let created = svc.activate_plan(weekly_plan("Bruno")).await.unwrap();
  svc.mark_as_paid(created[0].plan_id).await.unwrap();

  let stored = svc.list_plans(&PlanQuery::default()).await.unwrap();
  let active: Vec<_> = stored.iter().filter(|p| p.active).collect();
  assert_eq!(stored.len(), 2);
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].installment.index(), 2);
  assert_eq!(active[0].due_date, date(2024, 5, 24));
}

#[tokio::test]
async fn deleting_missing_record_leaves_store_unchanged() {
  let svc = service().await;
  svc.activate_plan(weekly_plan("Bruno")).await.unwrap();
  let before = svc.list_plans(&PlanQuery::default()).await.unwrap();

  let err = svc.delete_plan(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), lembrete_core::ErrorKind::NotFound);
  assert_eq!(svc.list_plans(&PlanQuery::default()).await.unwrap(), before);
}

#[tokio::test]
async fn appointment_client_name_is_trimmed_and_persisted() {
  let svc = service().await;
  let created = svc
    .add_appointment(NewAppointment {
      client_name:  "  Carla ".into(),
      date:         date(2024, 5, 15),
      service_type: "mapa astral".into(),
      amount:       dec!(300),
      paid:         false,
      notes:        None,
      plan:         None,
    })
    .await
    .unwrap();
  assert_eq!(created.appointment.client_name, "Carla");

  let listed = svc.list_appointments(Some("Carla")).await.unwrap();
  assert_eq!(listed, vec![created.appointment]);
}

// ─── Combined saves ──────────────────────────────────────────────────────────

#[tokio::test]
async fn save_all_writes_both_collections() {
  let s = store().await;
  let plans = lifecycle::activate(monthly_plan("Ana"), 5, Utc::now()).unwrap();
  let appointments = vec![appointment("Ana")];

  s.save_all(plans.clone(), appointments.clone()).await.unwrap();
  assert_eq!(s.load_plans().await.unwrap(), plans);
  assert_eq!(s.load_appointments().await.unwrap(), appointments);
}

#[tokio::test]
async fn failed_save_all_rolls_back_plans() {
  let s = store().await;
  let before = lifecycle::activate(weekly_plan("Bruno"), 5, Utc::now()).unwrap();
  s.save_plans(before.clone()).await.unwrap();

  // Duplicate primary keys make the appointment insert fail after the
  // plans were already written inside the transaction.
  let duplicate = appointment("Ana");
  let plans = lifecycle::activate(monthly_plan("Ana"), 5, Utc::now()).unwrap();
  let result = s.save_all(plans, vec![duplicate.clone(), duplicate]).await;

  assert!(result.is_err());
  assert_eq!(s.load_plans().await.unwrap(), before);
  assert!(s.load_appointments().await.unwrap().is_empty());
}
