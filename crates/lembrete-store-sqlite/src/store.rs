//! [`SqliteStore`] — the SQLite implementation of [`PlanStore`].

use std::path::Path;

use lembrete_core::{appointment::Appointment, plan::PaymentPlan, store::PlanStore};

use crate::{
  Result,
  encode::{RawAppointment, RawPlan},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lembrete store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PlanStore impl ──────────────────────────────────────────────────────────

impl PlanStore for SqliteStore {
  type Error = crate::Error;

  // ── Payment plans ─────────────────────────────────────────────────────────

  async fn load_plans(&self) -> Result<Vec<PaymentPlan>> {
    let raws: Vec<RawPlan> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT plan_id, series_id, client_name, amount, due_date,
                  created_at, paid_at, active, notification_timing,
                  analysis_id, cadence, installment, total, due_day
           FROM payment_plans
           ORDER BY position",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawPlan {
              plan_id:             row.get(0)?,
              series_id:           row.get(1)?,
              client_name:         row.get(2)?,
              amount:              row.get(3)?,
              due_date:            row.get(4)?,
              created_at:          row.get(5)?,
              paid_at:             row.get(6)?,
              active:              row.get(7)?,
              notification_timing: row.get(8)?,
              analysis_id:         row.get(9)?,
              cadence:             row.get(10)?,
              installment:         row.get(11)?,
              total:               row.get(12)?,
              due_day:             row.get(13)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPlan::into_plan).collect()
  }

  async fn save_plans(&self, plans: Vec<PaymentPlan>) -> Result<()> {
    let raws: Vec<RawPlan> = plans.iter().map(RawPlan::from_plan).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        write_plans(&tx, &raws)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Appointments ──────────────────────────────────────────────────────────

  async fn load_appointments(&self) -> Result<Vec<Appointment>> {
    let raws: Vec<RawAppointment> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT appointment_id, client_name, date, service_type, amount,
                  paid, notes, created_at
           FROM appointments
           ORDER BY position",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawAppointment {
              appointment_id: row.get(0)?,
              client_name:    row.get(1)?,
              date:           row.get(2)?,
              service_type:   row.get(3)?,
              amount:         row.get(4)?,
              paid:           row.get(5)?,
              notes:          row.get(6)?,
              created_at:     row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAppointment::into_appointment).collect()
  }

  async fn save_appointments(&self, appointments: Vec<Appointment>) -> Result<()> {
    let raws: Vec<RawAppointment> =
      appointments.iter().map(RawAppointment::from_appointment).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        write_appointments(&tx, &raws)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Both collections ──────────────────────────────────────────────────────

  async fn save_all(
    &self,
    plans: Vec<PaymentPlan>,
    appointments: Vec<Appointment>,
  ) -> Result<()> {
    let plan_raws: Vec<RawPlan> = plans.iter().map(RawPlan::from_plan).collect();
    let appointment_raws: Vec<RawAppointment> =
      appointments.iter().map(RawAppointment::from_appointment).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        write_plans(&tx, &plan_raws)?;
        write_appointments(&tx, &appointment_raws)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Writers ─────────────────────────────────────────────────────────────────

fn write_plans(tx: &rusqlite::Transaction<'_>, raws: &[RawPlan]) -> rusqlite::Result<()> {
  tx.execute("DELETE FROM payment_plans", [])?;
  let mut stmt = tx.prepare(
    "INSERT INTO payment_plans (
       plan_id, series_id, client_name, amount, due_date,
       created_at, paid_at, active, notification_timing,
       analysis_id, cadence, installment, total, due_day, position
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
  )?;
  for (position, raw) in raws.iter().enumerate() {
    stmt.execute(rusqlite::params![
      raw.plan_id,
      raw.series_id,
      raw.client_name,
      raw.amount,
      raw.due_date,
      raw.created_at,
      raw.paid_at,
      raw.active,
      raw.notification_timing,
      raw.analysis_id,
      raw.cadence,
      raw.installment,
      raw.total,
      raw.due_day,
      position as i64,
    ])?;
  }
  Ok(())
}

fn write_appointments(
  tx: &rusqlite::Transaction<'_>,
  raws: &[RawAppointment],
) -> rusqlite::Result<()> {
  tx.execute("DELETE FROM appointments", [])?;
  let mut stmt = tx.prepare(
    "INSERT INTO appointments (
       appointment_id, client_name, date, service_type, amount,
       paid, notes, created_at, position
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
  )?;
  for (position, raw) in raws.iter().enumerate() {
    stmt.execute(rusqlite::params![
      raw.appointment_id,
      raw.client_name,
      raw.date,
      raw.service_type,
      raw.amount,
      raw.paid,
      raw.notes,
      raw.created_at,
      position as i64,
    ])?;
  }
  Ok(())
}
