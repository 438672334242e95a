//! [`PlanService`] — runs the lifecycle against a [`PlanStore`].
//!
//! Each mutation is one read-modify-write cycle over the full collection,
//! serialised by an internal lock. Nothing is written and no event is
//! published when a step fails.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use crate::{
  Error, Result,
  appointment::{Appointment, NewAppointment},
  events::{ChangeAction, ChangeBus, ChangeEvent, RecordKind},
  lifecycle::{self, MarkPaid},
  plan::{NewPlan, PaymentPlan, PlanCategory},
  query::{self, ClientGroup, PlanQuery},
  report::{self, ReportQuery, ReportSummary},
  schedule::{DEFAULT_DUE_DAY, DEFAULT_POSTPONE_DAYS},
  store::PlanStore,
};

// ─── Defaults ────────────────────────────────────────────────────────────────

/// Values applied when a request leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleDefaults {
  pub due_day:       u32,
  pub postpone_days: u32,
}

impl Default for ScheduleDefaults {
  fn default() -> Self {
    Self { due_day: DEFAULT_DUE_DAY, postpone_days: DEFAULT_POSTPONE_DAYS }
  }
}

/// An appointment together with the plan records its terms activated.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreatedAppointment {
  pub appointment: Appointment,
  pub plans:       Vec<PaymentPlan>,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct PlanService<S> {
  store:    S,
  bus:      ChangeBus,
  defaults: ScheduleDefaults,
  writes:   Mutex<()>,
}

impl<S: PlanStore> PlanService<S> {
  pub fn new(store: S, defaults: ScheduleDefaults) -> Self {
    Self { store, bus: ChangeBus::new(), defaults, writes: Mutex::new(()) }
  }

  pub fn defaults(&self) -> ScheduleDefaults { self.defaults }

  pub fn bus(&self) -> &ChangeBus { &self.bus }

  pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> { self.bus.subscribe() }

  // ── Store access ──────────────────────────────────────────────────────────

  async fn load_plans(&self) -> Result<Vec<PaymentPlan>> {
    self.store.load_plans().await.map_err(Error::store)
  }

  async fn save_plans(&self, plans: Vec<PaymentPlan>) -> Result<()> {
    self.store.save_plans(plans).await.map_err(Error::store)
  }

  async fn load_appointments(&self) -> Result<Vec<Appointment>> {
    self.store.load_appointments().await.map_err(Error::store)
  }

  async fn save_appointments(&self, appointments: Vec<Appointment>) -> Result<()> {
    self.store.save_appointments(appointments).await.map_err(Error::store)
  }

  async fn save_all(
    &self,
    plans: Vec<PaymentPlan>,
    appointments: Vec<Appointment>,
  ) -> Result<()> {
    self.store.save_all(plans, appointments).await.map_err(Error::store)
  }

  async fn known_clients(&self) -> Result<HashSet<String>> {
    Ok(
      self
        .load_appointments()
        .await?
        .into_iter()
        .map(|a| a.client_name)
        .collect(),
    )
  }

  // ── Plan mutations ────────────────────────────────────────────────────────

  /// Activate a plan and persist its initial installments.
  pub async fn activate_plan(&self, input: NewPlan) -> Result<Vec<PaymentPlan>> {
    let _guard = self.writes.lock().await;
    let result = async move {
      let created = lifecycle::activate(input, self.defaults.due_day, Utc::now())?;
      let mut plans = self.load_plans().await?;
      plans.extend(created.iter().cloned());
      self.save_plans(plans).await?;
      Ok::<_, Error>(created)
    }
    .await;

    let created = logged("activate_plan", result)?;
    if let Some(first) = created.first() {
      tracing::info!(
        series_id = %first.series_id,
        client = %first.client_name,
        installments = created.len(),
        "plan activated"
      );
    }
    for plan in &created {
      self.bus.publish(ChangeEvent::plan(plan.plan_id, ChangeAction::Create));
    }
    Ok(created)
  }

  /// Mark an installment paid; a second call on the same record is a no-op.
  pub async fn mark_as_paid(&self, plan_id: Uuid) -> Result<MarkPaid> {
    let _guard = self.writes.lock().await;
    let result = async move {
      let mut plans = self.load_plans().await?;
      let outcome = lifecycle::mark_as_paid(&mut plans, plan_id, Utc::now())?;
      if outcome != MarkPaid::AlreadyPaid {
        self.save_plans(plans).await?;
      }
      Ok::<_, Error>(outcome)
    }
    .await;

    let outcome = logged("mark_as_paid", result)?;
    match &outcome {
      MarkPaid::AlreadyPaid => {
        tracing::debug!(%plan_id, "plan already paid");
      }
      MarkPaid::Paid { successor } => {
        tracing::info!(
          %plan_id,
          successor = ?successor.as_ref().map(|s| s.plan_id),
          "plan marked as paid"
        );
        self.bus.publish(ChangeEvent::plan(plan_id, ChangeAction::MarkAsPaid));
        if let Some(next) = successor {
          self.bus.publish(ChangeEvent::plan(next.plan_id, ChangeAction::Create));
        }
      }
    }
    Ok(outcome)
  }

  /// Postpone a monthly installment by `days`, or the configured default.
  pub async fn postpone(&self, plan_id: Uuid, days: Option<u32>) -> Result<PaymentPlan> {
    let days = days.unwrap_or(self.defaults.postpone_days);
    let _guard = self.writes.lock().await;
    let result = async move {
      let mut plans = self.load_plans().await?;
      lifecycle::postpone(&mut plans, plan_id, days)?;
      let updated = plans
        .iter()
        .find(|p| p.plan_id == plan_id)
        .cloned()
        .ok_or(Error::PlanNotFound(plan_id))?;
      self.save_plans(plans).await?;
      Ok::<_, Error>(updated)
    }
    .await;

    let updated = logged("postpone", result)?;
    tracing::info!(%plan_id, days, due_date = %updated.due_date, "plan postponed");
    self.bus.publish(ChangeEvent::plan(plan_id, ChangeAction::Postpone));
    Ok(updated)
  }

  pub async fn delete_plan(&self, plan_id: Uuid) -> Result<PaymentPlan> {
    let _guard = self.writes.lock().await;
    let result = async move {
      let mut plans = self.load_plans().await?;
      let removed = lifecycle::delete_record(&mut plans, plan_id)?;
      self.save_plans(plans).await?;
      Ok::<_, Error>(removed)
    }
    .await;

    let removed = logged("delete_plan", result)?;
    tracing::info!(%plan_id, "plan deleted");
    self.bus.publish(ChangeEvent::plan(plan_id, ChangeAction::Delete));
    Ok(removed)
  }

  pub async fn delete_series(&self, series_id: Uuid) -> Result<Vec<PaymentPlan>> {
    let _guard = self.writes.lock().await;
    let result = async move {
      let mut plans = self.load_plans().await?;
      let removed = lifecycle::delete_series(&mut plans, series_id)?;
      self.save_plans(plans).await?;
      Ok::<_, Error>(removed)
    }
    .await;

    let removed = logged("delete_series", result)?;
    tracing::info!(%series_id, removed = removed.len(), "series deleted");
    for plan in &removed {
      self.bus.publish(ChangeEvent::plan(plan.plan_id, ChangeAction::Delete));
    }
    Ok(removed)
  }

  /// Remove plans whose client no longer has any appointment.
  pub async fn cleanup(&self) -> Result<usize> {
    let _guard = self.writes.lock().await;
    let result = async move {
      let known = self.known_clients().await?;
      let mut plans = self.load_plans().await?;
      let removed = lifecycle::remove_orphans(&mut plans, &known);
      if removed > 0 {
        self.save_plans(plans).await?;
      }
      Ok::<_, Error>(removed)
    }
    .await;

    let removed = logged("cleanup", result)?;
    if removed > 0 {
      tracing::info!(removed, "orphaned plans removed");
      self.bus.publish(ChangeEvent {
        kind:      RecordKind::Plan,
        record_id: None,
        action:    ChangeAction::DataCleanup,
      });
    }
    Ok(removed)
  }

  // ── Plan reads ────────────────────────────────────────────────────────────

  pub async fn get_plan(&self, plan_id: Uuid) -> Result<PaymentPlan> {
    self
      .load_plans()
      .await?
      .into_iter()
      .find(|p| p.plan_id == plan_id)
      .ok_or(Error::PlanNotFound(plan_id))
  }

  pub async fn list_plans(&self, query: &PlanQuery) -> Result<Vec<PaymentPlan>> {
    let plans = self.load_plans().await?;
    Ok(query::filter_plans(&plans, query).into_iter().cloned().collect())
  }

  pub async fn plan_set(&self, category: PlanCategory) -> Result<Vec<PaymentPlan>> {
    let known = self.known_clients().await?;
    let plans = self.load_plans().await?;
    Ok(query::plan_set(&plans, &known, category).into_iter().cloned().collect())
  }

  pub async fn due_notifications(&self, today: NaiveDate) -> Result<Vec<PaymentPlan>> {
    let plans = self.load_plans().await?;
    Ok(query::due_notifications(&plans, today).into_iter().cloned().collect())
  }

  pub async fn client_groups(&self) -> Result<Vec<ClientGroup>> {
    let plans = self.load_plans().await?;
    Ok(query::group_by_client(&plans))
  }

  // ── Appointments ──────────────────────────────────────────────────────────

  /// Record an appointment, activating a general plan if terms are attached.
  pub async fn add_appointment(&self, input: NewAppointment) -> Result<CreatedAppointment> {
    let _guard = self.writes.lock().await;
    let result = async move {
      let client_name = input.client_name.trim().to_owned();
      if client_name.is_empty() {
        return Err(Error::EmptyClientName);
      }
      if input.amount < Decimal::ZERO {
        return Err(Error::NegativeAmount);
      }

      let now = Utc::now();
      let created_plans = match input.plan {
        Some(attached) => lifecycle::activate(
          NewPlan {
            client_name:         client_name.clone(),
            amount:              attached.amount,
            start_date:          input.date,
            terms:               attached.terms,
            notification_timing: attached.notification_timing,
            analysis_id:         None,
          },
          self.defaults.due_day,
          now,
        )?,
        None => Vec::new(),
      };

      let appointment = Appointment {
        appointment_id: Uuid::new_v4(),
        client_name,
        date: input.date,
        service_type: input.service_type,
        amount: input.amount,
        paid: input.paid,
        notes: input.notes,
        created_at: now,
      };

      let mut appointments = self.load_appointments().await?;
      let mut plans = self.load_plans().await?;
      appointments.push(appointment.clone());
      plans.extend(created_plans.iter().cloned());

      // Appointment and plans land together or not at all.
      if created_plans.is_empty() {
        self.save_appointments(appointments).await?;
      } else {
        self.save_all(plans, appointments).await?;
      }
      Ok::<_, Error>(CreatedAppointment { appointment, plans: created_plans })
    }
    .await;

    let created = logged("add_appointment", result)?;
    tracing::info!(
      appointment_id = %created.appointment.appointment_id,
      client = %created.appointment.client_name,
      plans = created.plans.len(),
      "appointment recorded"
    );
    self.bus.publish(ChangeEvent::appointment(
      created.appointment.appointment_id,
      ChangeAction::Create,
    ));
    for plan in &created.plans {
      self.bus.publish(ChangeEvent::plan(plan.plan_id, ChangeAction::Create));
    }
    Ok(created)
  }

  /// Appointments ordered by date, optionally for one client.
  pub async fn list_appointments(&self, client: Option<&str>) -> Result<Vec<Appointment>> {
    let mut appointments = self.load_appointments().await?;
    if let Some(client) = client {
      appointments.retain(|a| a.client_name == client.trim());
    }
    appointments.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));
    Ok(appointments)
  }

  pub async fn delete_appointment(&self, appointment_id: Uuid) -> Result<Appointment> {
    let _guard = self.writes.lock().await;
    let result = async move {
      let mut appointments = self.load_appointments().await?;
      let pos = appointments
        .iter()
        .position(|a| a.appointment_id == appointment_id)
        .ok_or(Error::AppointmentNotFound(appointment_id))?;
      let removed = appointments.remove(pos);
      self.save_appointments(appointments).await?;
      Ok::<_, Error>(removed)
    }
    .await;

    let removed = logged("delete_appointment", result)?;
    tracing::info!(%appointment_id, "appointment deleted");
    self.bus.publish(ChangeEvent::appointment(appointment_id, ChangeAction::Delete));
    Ok(removed)
  }

  pub async fn set_appointment_paid(&self, appointment_id: Uuid, paid: bool) -> Result<Appointment> {
    let _guard = self.writes.lock().await;
    let result = async move {
      let mut appointments = self.load_appointments().await?;
      let appointment = appointments
        .iter_mut()
        .find(|a| a.appointment_id == appointment_id)
        .ok_or(Error::AppointmentNotFound(appointment_id))?;
      appointment.paid = paid;
      let updated = appointment.clone();
      self.save_appointments(appointments).await?;
      Ok::<_, Error>(updated)
    }
    .await;

    let updated = logged("set_appointment_paid", result)?;
    tracing::info!(%appointment_id, paid, "appointment payment updated");
    self.bus.publish(ChangeEvent::appointment(appointment_id, ChangeAction::Update));
    Ok(updated)
  }

  pub async fn report(&self, query: &ReportQuery) -> Result<ReportSummary> {
    let appointments = self.load_appointments().await?;
    Ok(report::build_report(&appointments, query))
  }
}

/// Log a failed mutation. The collection was not written.
fn logged<T>(operation: &'static str, result: Result<T>) -> Result<T> {
  if let Err(e) = &result {
    tracing::warn!(operation, kind = ?e.kind(), error = %e, "operation failed");
  }
  result
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex as StdMutex;

  use rust_decimal_macros::dec;

  use super::*;
  use crate::{
    ErrorKind,
    appointment::AttachedPlan,
    plan::{Installment, PlanTerms},
  };

  // A store holding both collections in memory.
  #[derive(Default)]
  struct MemoryStore {
    plans:        StdMutex<Vec<PaymentPlan>>,
    appointments: StdMutex<Vec<Appointment>>,
    fail_saves:   bool,
    plans_locked: bool,
  }

  #[derive(Debug, thiserror::Error)]
  #[error("disk full")]
  struct DiskFull;

  impl PlanStore for MemoryStore {
    type Error = DiskFull;

    async fn load_plans(&self) -> Result<Vec<PaymentPlan>, DiskFull> {
      Ok(self.plans.lock().unwrap().clone())
    }

    async fn save_plans(&self, plans: Vec<PaymentPlan>) -> Result<(), DiskFull> {
      if self.fail_saves || self.plans_locked {
        return Err(DiskFull);
      }
      *self.plans.lock().unwrap() = plans;
      Ok(())
    }

    async fn load_appointments(&self) -> Result<Vec<Appointment>, DiskFull> {
      Ok(self.appointments.lock().unwrap().clone())
    }

    async fn save_appointments(&self, appointments: Vec<Appointment>) -> Result<(), DiskFull> {
      if self.fail_saves {
        return Err(DiskFull);
      }
      *self.appointments.lock().unwrap() = appointments;
      Ok(())
    }
  }

  fn service() -> PlanService<MemoryStore> {
    PlanService::new(MemoryStore::default(), ScheduleDefaults::default())
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn weekly_plan(client: &str) -> NewPlan {
    NewPlan {
      client_name:         client.into(),
      amount:              dec!(50),
      start_date:          date(2024, 5, 15),
      terms:               PlanTerms::Weekly { total_weeks: 3, weekday: "sexta".into() },
      notification_timing: None,
      analysis_id:         None,
    }
  }

  fn appointment(client: &str, plan: Option<AttachedPlan>) -> NewAppointment {
    NewAppointment {
      client_name:  client.into(),
      date:         date(2024, 1, 31),
      service_type: "tarot".into(),
      amount:       dec!(200),
      paid:         false,
      notes:        None,
      plan,
    }
  }

  #[tokio::test]
  async fn mark_as_paid_persists_and_notifies() {
    let svc = service();
    let created = svc.activate_plan(weekly_plan("Ana")).await.unwrap();
    let mut rx = svc.subscribe();

    let outcome = svc.mark_as_paid(created[0].plan_id).await.unwrap();
    let MarkPaid::Paid { successor: Some(next) } = outcome else { panic!("no successor") };

    let stored = svc.list_plans(&PlanQuery::default()).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().any(|p| p.plan_id == next.plan_id && p.active));

    let paid = rx.recv().await.unwrap();
    assert_eq!(paid, ChangeEvent::plan(created[0].plan_id, ChangeAction::MarkAsPaid));
    let spawned = rx.recv().await.unwrap();
    assert_eq!(spawned, ChangeEvent::plan(next.plan_id, ChangeAction::Create));
  }

  #[tokio::test]
  async fn repeated_payment_neither_saves_nor_notifies() {
    let svc = service();
    let created = svc.activate_plan(weekly_plan("Ana")).await.unwrap();
    svc.mark_as_paid(created[0].plan_id).await.unwrap();

    let mut rx = svc.subscribe();
    let outcome = svc.mark_as_paid(created[0].plan_id).await.unwrap();
    assert_eq!(outcome, MarkPaid::AlreadyPaid);
    assert_eq!(svc.list_plans(&PlanQuery::default()).await.unwrap().len(), 2);
    assert!(rx.try_recv().is_err());
  }

  #[tokio::test]
  async fn unknown_ids_are_not_found() {
    let svc = service();
    svc.activate_plan(weekly_plan("Ana")).await.unwrap();

    let err = svc.delete_plan(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = svc.mark_as_paid(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(svc.list_plans(&PlanQuery::default()).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn failed_save_is_reported_and_not_published() {
    let svc = PlanService::new(
      MemoryStore { fail_saves: true, ..Default::default() },
      ScheduleDefaults::default(),
    );
    let mut rx = svc.subscribe();
    let err = svc.activate_plan(weekly_plan("Ana")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SerializationFailure);
    assert!(rx.try_recv().is_err());
  }

  #[tokio::test]
  async fn appointment_is_not_kept_when_its_plans_cannot_be_saved() {
    let svc = PlanService::new(
      MemoryStore { plans_locked: true, ..Default::default() },
      ScheduleDefaults::default(),
    );
    let mut rx = svc.subscribe();
    let err = svc
      .add_appointment(appointment(
        "Ana",
        Some(AttachedPlan {
          amount:              dec!(100),
          terms:               PlanTerms::Monthly { total_months: 3, due_day: None },
          notification_timing: None,
        }),
      ))
      .await
      .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SerializationFailure);
    assert!(svc.list_appointments(None).await.unwrap().is_empty());
    assert!(svc.list_plans(&PlanQuery::default()).await.unwrap().is_empty());
    assert!(rx.try_recv().is_err());

    // Appointments without terms never touch the plans collection.
    svc.add_appointment(appointment("Bruno", None)).await.unwrap();
    assert_eq!(svc.list_appointments(None).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn postpone_uses_configured_default() {
    let svc = PlanService::new(MemoryStore::default(), ScheduleDefaults {
      due_day:       10,
      postpone_days: 3,
    });
    let created = svc
      .activate_plan(NewPlan {
        terms: PlanTerms::Monthly { total_months: 2, due_day: None },
        ..weekly_plan("Ana")
      })
      .await
      .unwrap();
    assert_eq!(created[0].due_date, date(2024, 6, 10));

    let moved = svc.postpone(created[0].plan_id, None).await.unwrap();
    assert_eq!(moved.due_date, date(2024, 6, 13));
    assert_eq!(svc.get_plan(created[0].plan_id).await.unwrap().due_date, date(2024, 6, 13));
  }

  #[tokio::test]
  async fn appointment_with_terms_activates_general_plan() {
    let svc = service();
    let created = svc
      .add_appointment(appointment(
        "Ana",
        Some(AttachedPlan {
          amount:              dec!(100),
          terms:               PlanTerms::Monthly { total_months: 3, due_day: Some(31) },
          notification_timing: None,
        }),
      ))
      .await
      .unwrap();

    assert_eq!(created.plans.len(), 3);
    assert_eq!(created.plans[0].due_date, date(2024, 2, 29));
    assert!(matches!(created.plans[0].installment, Installment::Monthly { .. }));

    let general = svc.plan_set(PlanCategory::General).await.unwrap();
    assert_eq!(general.len(), 3);
    assert!(svc.plan_set(PlanCategory::Analysis).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn cleanup_drops_plans_of_removed_clients() {
    let svc = service();
    let ana = svc.add_appointment(appointment("Ana", None)).await.unwrap();
    svc.activate_plan(weekly_plan("Ana")).await.unwrap();
    svc.activate_plan(weekly_plan("Bruno")).await.unwrap();

    let mut rx = svc.subscribe();
    assert_eq!(svc.cleanup().await.unwrap(), 1);
    let event = rx.recv().await.unwrap();
    assert_eq!(event.action, ChangeAction::DataCleanup);
    assert_eq!(event.record_id, None);

    svc.delete_appointment(ana.appointment.appointment_id).await.unwrap();
    assert_eq!(svc.cleanup().await.unwrap(), 1);
    assert!(svc.list_plans(&PlanQuery::default()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn report_and_paid_toggle() {
    let svc = service();
    let first = svc.add_appointment(appointment("Ana", None)).await.unwrap();
    svc.add_appointment(appointment("Bruno", None)).await.unwrap();
    svc
      .set_appointment_paid(first.appointment.appointment_id, true)
      .await
      .unwrap();

    let report = svc.report(&ReportQuery::default()).await.unwrap();
    assert_eq!(report.total_count, 2);
    assert_eq!(report.paid_count, 1);
    assert_eq!(report.total_amount, dec!(400));
  }

  #[tokio::test]
  async fn client_groups_and_reminders() {
    let svc = service();
    svc.activate_plan(weekly_plan("Ana")).await.unwrap();
    svc
      .activate_plan(NewPlan {
        terms: PlanTerms::Monthly { total_months: 2, due_day: Some(1) },
        ..weekly_plan("Ana")
      })
      .await
      .unwrap();

    let groups = svc.client_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].most_urgent.due_date, date(2024, 5, 17));
    assert_eq!(groups[0].additional.len(), 2);

    let due = svc.due_notifications(date(2024, 6, 1)).await.unwrap();
    assert_eq!(due.len(), 2);
  }
}
