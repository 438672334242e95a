//! Change notifications broadcast after every successful mutation.
//!
//! Delivery is best-effort: only receivers subscribed when an event is
//! published see it, and a receiver that falls more than the channel capacity
//! behind loses the oldest events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Buffered events per receiver.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
  Plan,
  Appointment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
  Create,
  Update,
  MarkAsPaid,
  Postpone,
  Delete,
  DataCleanup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub kind:      RecordKind,
  /// `None` for collection-wide actions such as cleanup.
  pub record_id: Option<Uuid>,
  pub action:    ChangeAction,
}

impl ChangeEvent {
  pub fn plan(record_id: Uuid, action: ChangeAction) -> Self {
    Self { kind: RecordKind::Plan, record_id: Some(record_id), action }
  }

  pub fn appointment(record_id: Uuid, action: ChangeAction) -> Self {
    Self { kind: RecordKind::Appointment, record_id: Some(record_id), action }
  }
}

/// Publish/subscribe hub. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct ChangeBus {
  tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeBus {
  fn default() -> Self { Self::new() }
}

impl ChangeBus {
  pub fn new() -> Self {
    let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
    Self { tx }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> { self.tx.subscribe() }

  /// Returns the number of receivers the event reached.
  pub fn publish(&self, event: ChangeEvent) -> usize {
    // `send` only fails when nobody is subscribed.
    self.tx.send(event).unwrap_or(0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn subscribers_receive_published_events() {
    let bus = ChangeBus::new();
    let mut rx = bus.subscribe();
    let id = Uuid::new_v4();

    assert_eq!(bus.publish(ChangeEvent::plan(id, ChangeAction::MarkAsPaid)), 1);
    let event = rx.recv().await.unwrap();
    assert_eq!(event.kind, RecordKind::Plan);
    assert_eq!(event.record_id, Some(id));
    assert_eq!(event.action, ChangeAction::MarkAsPaid);
  }

  #[test]
  fn publishing_without_subscribers_is_dropped() {
    let bus = ChangeBus::new();
    assert_eq!(bus.publish(ChangeEvent::plan(Uuid::new_v4(), ChangeAction::Delete)), 0);
  }

  #[tokio::test]
  async fn late_subscribers_miss_earlier_events() {
    let bus = ChangeBus::new();
    let mut early = bus.subscribe();
    bus.publish(ChangeEvent::appointment(Uuid::new_v4(), ChangeAction::Create));
    let mut late = bus.subscribe();

    assert!(early.try_recv().is_ok());
    assert!(late.try_recv().is_err());
  }

  #[test]
  fn actions_use_snake_case_tags() {
    let json = serde_json::to_string(&ChangeAction::DataCleanup).unwrap();
    assert_eq!(json, "\"data_cleanup\"");
  }
}
