//! Async HTTP client wrapping the Lembrete JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use lembrete_core::{
  appointment::{Appointment, NewAppointment},
  plan::{NewPlan, PaymentPlan, PlanCategory},
  query::{ClientGroup, PlanQuery},
  report::{ReportQuery, ReportSummary},
  service::CreatedAppointment,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use uuid::Uuid;

/// Connection settings for the Lembrete API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Result of `POST /plans/:id/pay`.
#[derive(Debug, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PayOutcome {
  Paid { successor: Option<PaymentPlan> },
  AlreadyPaid,
}

/// Async HTTP client for the Lembrete JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  /// Send `req` and decode a JSON body, surfacing the server's `error`
  /// message on failure.
  async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
    let resp: Response = self
      .auth(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;

    let status = resp.status();
    if !status.is_success() {
      let message = resp
        .json::<Value>()
        .await
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| status.to_string());
      return Err(anyhow!("{what} → {status}: {message}"));
    }
    resp.json().await.with_context(|| format!("deserialising {what} response"))
  }

  // ── Plans ─────────────────────────────────────────────────────────────────

  /// `GET /api/plans`
  pub async fn list_plans(&self, query: &PlanQuery) -> Result<Vec<PaymentPlan>> {
    let req = self.client.get(self.url("/plans")).query(query);
    self.send(req, "GET /plans").await
  }

  /// `POST /api/plans`
  pub async fn create_plan(&self, plan: &NewPlan) -> Result<Vec<PaymentPlan>> {
    let req = self.client.post(self.url("/plans")).json(plan);
    self.send(req, "POST /plans").await
  }

  /// `POST /api/plans/:id/pay`
  pub async fn pay(&self, plan_id: Uuid) -> Result<PayOutcome> {
    let req = self.client.post(self.url(&format!("/plans/{plan_id}/pay")));
    self.send(req, "POST /plans/:id/pay").await
  }

  /// `POST /api/plans/:id/postpone`
  pub async fn postpone(&self, plan_id: Uuid, days: Option<u32>) -> Result<PaymentPlan> {
    let req = self
      .client
      .post(self.url(&format!("/plans/{plan_id}/postpone")))
      .json(&json!({ "days": days }));
    self.send(req, "POST /plans/:id/postpone").await
  }

  /// `DELETE /api/plans/:id`
  pub async fn delete_plan(&self, plan_id: Uuid) -> Result<PaymentPlan> {
    let req = self.client.delete(self.url(&format!("/plans/{plan_id}")));
    self.send(req, "DELETE /plans/:id").await
  }

  /// `DELETE /api/series/:id`
  pub async fn delete_series(&self, series_id: Uuid) -> Result<Vec<PaymentPlan>> {
    let req = self.client.delete(self.url(&format!("/series/{series_id}")));
    self.send(req, "DELETE /series/:id").await
  }

  /// `GET /api/plan-set?category=..`
  pub async fn plan_set(&self, category: PlanCategory) -> Result<Vec<PaymentPlan>> {
    let req = self
      .client
      .get(self.url("/plan-set"))
      .query(&[("category", category)]);
    self.send(req, "GET /plan-set").await
  }

  /// `POST /api/cleanup` — number of plans removed.
  pub async fn cleanup(&self) -> Result<u64> {
    let req = self.client.post(self.url("/cleanup"));
    let body: Value = self.send(req, "POST /cleanup").await?;
    body
      .get("removed")
      .and_then(Value::as_u64)
      .ok_or_else(|| anyhow!("POST /cleanup: missing `removed` count"))
  }

  // ── Reminders ─────────────────────────────────────────────────────────────

  /// `GET /api/reminders[?today=..]`
  pub async fn reminders(&self, today: Option<NaiveDate>) -> Result<Vec<PaymentPlan>> {
    let mut req = self.client.get(self.url("/reminders"));
    if let Some(today) = today {
      req = req.query(&[("today", today)]);
    }
    self.send(req, "GET /reminders").await
  }

  /// `GET /api/clients`
  pub async fn clients(&self) -> Result<Vec<ClientGroup>> {
    let req = self.client.get(self.url("/clients"));
    self.send(req, "GET /clients").await
  }

  // ── Appointments ──────────────────────────────────────────────────────────

  /// `GET /api/appointments[?client=..]`
  pub async fn list_appointments(&self, client: Option<&str>) -> Result<Vec<Appointment>> {
    let mut req = self.client.get(self.url("/appointments"));
    if let Some(client) = client {
      req = req.query(&[("client", client)]);
    }
    self.send(req, "GET /appointments").await
  }

  /// `POST /api/appointments`
  pub async fn add_appointment(&self, input: &NewAppointment) -> Result<CreatedAppointment> {
    let req = self.client.post(self.url("/appointments")).json(input);
    self.send(req, "POST /appointments").await
  }

  /// `DELETE /api/appointments/:id`
  pub async fn delete_appointment(&self, appointment_id: Uuid) -> Result<Appointment> {
    let req = self
      .client
      .delete(self.url(&format!("/appointments/{appointment_id}")));
    self.send(req, "DELETE /appointments/:id").await
  }

  /// `POST /api/appointments/:id/paid`
  pub async fn set_appointment_paid(&self, appointment_id: Uuid, paid: bool) -> Result<Appointment> {
    let req = self
      .client
      .post(self.url(&format!("/appointments/{appointment_id}/paid")))
      .json(&json!({ "paid": paid }));
    self.send(req, "POST /appointments/:id/paid").await
  }

  // ── Report & schedule ─────────────────────────────────────────────────────

  /// `GET /api/report`
  pub async fn report(&self, query: &ReportQuery) -> Result<ReportSummary> {
    let req = self.client.get(self.url("/report")).query(query);
    self.send(req, "GET /report").await
  }

  /// `GET /api/schedule/monthly`
  pub async fn preview_monthly(
    &self,
    start: NaiveDate,
    months: u32,
    due_day: Option<u32>,
  ) -> Result<Vec<NaiveDate>> {
    let mut params = vec![("start", start.to_string()), ("months", months.to_string())];
    if let Some(day) = due_day {
      params.push(("due_day", day.to_string()));
    }
    let req = self.client.get(self.url("/schedule/monthly")).query(&params);
    self.send(req, "GET /schedule/monthly").await
  }

  /// `GET /api/schedule/weekly`
  pub async fn preview_weekly(
    &self,
    start: NaiveDate,
    weeks: u32,
    weekday: &str,
  ) -> Result<Vec<NaiveDate>> {
    let params = [
      ("start", start.to_string()),
      ("weeks", weeks.to_string()),
      ("weekday", weekday.to_string()),
    ];
    let req = self.client.get(self.url("/schedule/weekly")).query(&params);
    self.send(req, "GET /schedule/weekly").await
  }
}
