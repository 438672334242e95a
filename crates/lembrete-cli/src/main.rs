//! `lembrete` — command-line client for the Lembrete payment reminder server.
//!
//! # Usage
//!
//! ```
//! lembrete --url http://localhost:5480 --user alice --password secret due
//! lembrete --config ~/.config/lembrete/config.toml clients
//! lembrete add-plan "Ana" 150.00 2024-01-31 monthly 3 --due-day 31
//! lembrete add-appointment "Ana" 2024-01-31 tarot 300 weekly 4 sexta --plan-amount 75
//! ```

mod client;
mod format;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, PayOutcome};
use lembrete_core::{
  appointment::{AttachedPlan, NewAppointment},
  plan::{NewPlan, NotificationTiming, PlanCategory, PlanTerms},
  query::PlanQuery,
  report::ReportQuery,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "lembrete", about = "Client for the Lembrete payment reminder server")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the lembrete server (default: http://localhost:5480).
  #[arg(long, env = "LEMBRETE_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "LEMBRETE_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "LEMBRETE_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List payment plan installments.
  Plans {
    #[arg(long)]
    client:   Option<String>,
    /// Include paid installments.
    #[arg(long)]
    all:      bool,
    #[arg(long)]
    from:     Option<NaiveDate>,
    #[arg(long)]
    to:       Option<NaiveDate>,
    /// Only plans of this category whose client still has appointments.
    #[arg(
      long,
      value_parser = parse_category,
      conflicts_with_all = ["client", "all", "from", "to"]
    )]
    category: Option<PlanCategory>,
  },
  /// Activate a new payment plan.
  AddPlan {
    client:    String,
    amount:    Decimal,
    start:     NaiveDate,
    #[command(subcommand)]
    terms:     TermsArg,
    /// Start reminding one week after each due date.
    #[arg(long, global = true)]
    next_week: bool,
    /// Link the plan to an analysis record.
    #[arg(long, global = true)]
    analysis:  Option<Uuid>,
  },
  /// Mark an installment paid.
  Pay { id: Uuid },
  /// Move a monthly installment's due date forward.
  Postpone {
    id:   Uuid,
    #[arg(long)]
    days: Option<u32>,
  },
  /// Delete one installment record.
  Delete { id: Uuid },
  /// Delete every installment of a series.
  DeleteSeries { id: Uuid },
  /// Installments whose reminder is due.
  Due {
    /// Evaluate reminders as of this date instead of today.
    #[arg(long)]
    today: Option<NaiveDate>,
  },
  /// Outstanding installments grouped by client.
  Clients,
  /// Remove plans whose client has no appointments left.
  Cleanup,
  /// List appointments.
  Appointments {
    #[arg(long)]
    client: Option<String>,
  },
  /// Record an appointment, optionally with a payment plan starting on its date.
  AddAppointment {
    client:      String,
    date:        NaiveDate,
    service:     String,
    amount:      Decimal,
    #[arg(long)]
    paid:        bool,
    #[arg(long)]
    notes:       Option<String>,
    #[command(subcommand)]
    terms:       Option<TermsArg>,
    /// Amount of each installment (default: the appointment amount).
    #[arg(long, global = true)]
    plan_amount: Option<Decimal>,
    /// Start reminding one week after each due date.
    #[arg(long, global = true)]
    next_week:   bool,
  },
  /// Mark an appointment paid (or unpaid with `--unpaid`).
  AppointmentPaid {
    id:     Uuid,
    #[arg(long)]
    unpaid: bool,
  },
  /// Delete an appointment.
  DeleteAppointment { id: Uuid },
  /// Appointment totals for a period.
  Report {
    #[arg(long)]
    from:   Option<NaiveDate>,
    #[arg(long)]
    to:     Option<NaiveDate>,
    #[arg(long)]
    client: Option<String>,
    #[arg(long)]
    limit:  Option<usize>,
  },
  /// Preview the due dates a plan would get.
  Schedule {
    start: NaiveDate,
    #[command(subcommand)]
    terms: TermsArg,
  },
}

#[derive(Subcommand, Debug, Clone)]
enum TermsArg {
  /// Monthly installments, all generated up front.
  Monthly {
    months:  u32,
    #[arg(long)]
    due_day: Option<u32>,
  },
  /// Weekly installments, one generated per payment.
  Weekly { weeks: u32, weekday: String },
}

impl From<TermsArg> for PlanTerms {
  fn from(terms: TermsArg) -> Self {
    match terms {
      TermsArg::Monthly { months, due_day } => PlanTerms::Monthly { total_months: months, due_day },
      TermsArg::Weekly { weeks, weekday } => PlanTerms::Weekly { total_weeks: weeks, weekday },
    }
  }
}

fn parse_category(s: &str) -> Result<PlanCategory, String> {
  match s {
    "general" => Ok(PlanCategory::General),
    "analysis" => Ok(PlanCategory::Analysis),
    other => Err(format!("unknown category {other:?} (expected general or analysis)")),
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_string()) }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:5480".to_string()),
    username: args
      .user
      .or_else(|| non_empty(&file_cfg.username))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| non_empty(&file_cfg.password))
      .unwrap_or_default(),
  };
  tracing::debug!(url = %api_config.base_url, "using server");

  let client = ApiClient::new(api_config)?;
  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Plans { client: name, all, from, to, category } => {
      let plans = match category {
        Some(category) => client.plan_set(category).await?,
        None => {
          let query = PlanQuery {
            client: name,
            due_from: from,
            due_to: to,
            active: (!all).then_some(true),
            ..Default::default()
          };
          client.list_plans(&query).await?
        }
      };
      println!("{}", format::plans_table(&plans));
    }
    Command::AddPlan { client: name, amount, start, terms, next_week, analysis } => {
      let plan = NewPlan {
        client_name:         name,
        amount,
        start_date:          start,
        terms:               terms.into(),
        notification_timing: next_week.then_some(NotificationTiming::NextWeek),
        analysis_id:         analysis,
      };
      let created = client.create_plan(&plan).await?;
      println!("{}", format::plans_table(&created));
    }
    Command::Pay { id } => match client.pay(id).await? {
      PayOutcome::AlreadyPaid => println!("{id} was already paid"),
      PayOutcome::Paid { successor: None } => println!("{id} marked as paid"),
      PayOutcome::Paid { successor: Some(next) } => {
        println!("{id} marked as paid; next installment due {}", next.due_date);
      }
    },
    Command::Postpone { id, days } => {
      let plan = client.postpone(id, days).await?;
      println!("{id} now due {}", plan.due_date);
    }
    Command::Delete { id } => {
      let removed = client.delete_plan(id).await?;
      println!("deleted {} ({})", removed.plan_id, removed.client_name);
    }
    Command::DeleteSeries { id } => {
      let removed = client.delete_series(id).await?;
      println!("deleted {} installments", removed.len());
    }
    Command::Due { today } => {
      let due = client.reminders(today).await?;
      println!("{}", format::plans_table(&due));
    }
    Command::Clients => {
      let groups = client.clients().await?;
      println!("{}", format::groups_table(&groups));
    }
    Command::Cleanup => {
      let removed = client.cleanup().await?;
      println!("removed {removed} orphaned plans");
    }
    Command::Appointments { client: name } => {
      let appointments = client.list_appointments(name.as_deref()).await?;
      println!("{}", format::appointments_table(&appointments));
    }
    Command::AddAppointment {
      client: name,
      date,
      service,
      amount,
      paid,
      notes,
      terms,
      plan_amount,
      next_week,
    } => {
      let plan = terms.map(|terms| AttachedPlan {
        amount:              plan_amount.unwrap_or(amount),
        terms:               terms.into(),
        notification_timing: next_week.then_some(NotificationTiming::NextWeek),
      });
      let input = NewAppointment {
        client_name: name,
        date,
        service_type: service,
        amount,
        paid,
        notes,
        plan,
      };
      let created = client.add_appointment(&input).await?;
      println!("recorded {}", created.appointment.appointment_id);
      if !created.plans.is_empty() {
        println!("{}", format::plans_table(&created.plans));
      }
    }
    Command::AppointmentPaid { id, unpaid } => {
      let updated = client.set_appointment_paid(id, !unpaid).await?;
      println!("{id} paid: {}", updated.paid);
    }
    Command::DeleteAppointment { id } => {
      client.delete_appointment(id).await?;
      println!("deleted {id}");
    }
    Command::Report { from, to, client: name, limit } => {
      let query = ReportQuery { from, to, client: name, limit };
      let report = client.report(&query).await?;
      println!("{}", format::report_text(&report));
    }
    Command::Schedule { start, terms } => {
      let dates = match terms {
        TermsArg::Monthly { months, due_day } => {
          client.preview_monthly(start, months, due_day).await?
        }
        TermsArg::Weekly { weeks, weekday } => client.preview_weekly(start, weeks, &weekday).await?,
      };
      println!("{}", format::dates_list(&dates));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory as _;

  use super::*;

  #[test]
  fn cli_definition_is_consistent() { Args::command().debug_assert(); }

  #[test]
  fn add_plan_parses_weekly_terms() {
    let args = Args::try_parse_from([
      "lembrete", "add-plan", "Ana", "50", "2024-05-15", "weekly", "3", "sexta",
    ])
    .unwrap();
    let Command::AddPlan { terms, amount, .. } = args.command else { panic!("wrong command") };
    assert_eq!(amount, Decimal::from(50));
    assert_eq!(PlanTerms::from(terms), PlanTerms::Weekly {
      total_weeks: 3,
      weekday:     "sexta".into(),
    });
  }

  #[test]
  fn add_appointment_attaches_optional_terms() {
    let args = Args::try_parse_from([
      "lembrete", "add-appointment", "Ana", "2024-01-31", "tarot", "300", "monthly", "3",
      "--plan-amount", "100",
    ])
    .unwrap();
    let Command::AddAppointment { terms, plan_amount, .. } = args.command else {
      panic!("wrong command")
    };
    assert_eq!(plan_amount, Some(Decimal::from(100)));
    assert_eq!(PlanTerms::from(terms.unwrap()), PlanTerms::Monthly {
      total_months: 3,
      due_day:      None,
    });

    let args = Args::try_parse_from([
      "lembrete", "add-appointment", "Ana", "2024-01-31", "tarot", "300",
    ])
    .unwrap();
    let Command::AddAppointment { terms, .. } = args.command else { panic!("wrong command") };
    assert!(terms.is_none());
  }

  #[test]
  fn category_excludes_plan_filters() {
    let result = Args::try_parse_from([
      "lembrete", "plans", "--category", "general", "--client", "Ana",
    ]);
    assert!(result.is_err());
    assert!(Args::try_parse_from(["lembrete", "plans", "--category", "analysis"]).is_ok());
  }

  #[test]
  fn category_parser_rejects_unknown() {
    assert_eq!(parse_category("analysis"), Ok(PlanCategory::Analysis));
    assert!(parse_category("other").is_err());
  }
}
