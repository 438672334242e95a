//! Plain-text tables for terminal output.

use chrono::NaiveDate;
use comfy_table::Table;
use lembrete_core::{
  appointment::Appointment,
  plan::{Installment, PaymentPlan},
  query::ClientGroup,
  report::ReportSummary,
};

fn installment_label(installment: &Installment) -> String {
  match installment {
    Installment::Monthly { month, total_months, .. } => format!("month {month}/{total_months}"),
    Installment::Weekly { week, total_weeks } => format!("week {week}/{total_weeks}"),
  }
}

fn status_label(plan: &PaymentPlan) -> &'static str {
  if plan.active { "open" } else { "paid" }
}

pub fn plans_table(plans: &[PaymentPlan]) -> String {
  if plans.is_empty() {
    return "No payment plans".to_string();
  }
  let mut table = Table::new();
  table.set_header(vec!["Id", "Client", "Due", "Installment", "Amount", "Status"]);
  for plan in plans {
    table.add_row(vec![
      plan.plan_id.to_string(),
      plan.client_name.clone(),
      plan.due_date.to_string(),
      installment_label(&plan.installment),
      plan.amount.to_string(),
      status_label(plan).to_string(),
    ]);
  }
  table.to_string()
}

pub fn groups_table(groups: &[ClientGroup]) -> String {
  if groups.is_empty() {
    return "No outstanding payments".to_string();
  }
  let mut table = Table::new();
  table.set_header(vec!["Client", "Next due", "Amount", "Installment", "Also open"]);
  for group in groups {
    let next = &group.most_urgent;
    table.add_row(vec![
      group.client_name.clone(),
      next.due_date.to_string(),
      next.amount.to_string(),
      installment_label(&next.installment),
      group.additional.len().to_string(),
    ]);
  }
  table.to_string()
}

pub fn appointments_table(appointments: &[Appointment]) -> String {
  if appointments.is_empty() {
    return "No appointments".to_string();
  }
  let mut table = Table::new();
  table.set_header(vec!["Id", "Date", "Client", "Service", "Amount", "Paid"]);
  for a in appointments {
    table.add_row(vec![
      a.appointment_id.to_string(),
      a.date.to_string(),
      a.client_name.clone(),
      a.service_type.clone(),
      a.amount.to_string(),
      (if a.paid { "yes" } else { "no" }).to_string(),
    ]);
  }
  table.to_string()
}

pub fn report_text(report: &ReportSummary) -> String {
  let mut table = Table::new();
  table.set_header(vec!["Date", "Client", "Service", "Amount"]);
  for entry in &report.entries {
    table.add_row(vec![
      entry.date.to_string(),
      entry.client_name.clone(),
      entry.service_type.clone(),
      entry.amount.to_string(),
    ]);
  }
  table.add_row(vec![
    "Total".to_string(),
    format!("{} appointments", report.total_count),
    format!("{} paid", report.paid_count),
    report.total_amount.to_string(),
  ]);
  table.to_string()
}

pub fn dates_list(dates: &[NaiveDate]) -> String {
  dates
    .iter()
    .zip(1..)
    .map(|(date, i)| format!("{i:>3}  {date}  {}", date.format("%a")))
    .collect::<Vec<_>>()
    .join("\n")
}
