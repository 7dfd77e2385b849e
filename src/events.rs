//! Optional push seam for collaborators that want change notifications
//!
//! The engine is pull-first; this channel exists for subscribers such as a
//! notification scheduler. Sends never block and a full or closed channel
//! drops the event — subscribers that care must keep up.

use tokio::sync::mpsc;

use crate::model::{FoodItem, Household, OwnerScope};

#[derive(Debug, Clone)]
pub enum EngineEvent {
    ItemAdded(FoodItem),
    ItemUpdated(FoodItem),
    ItemConsumed(FoodItem),
    ItemThrownAway(FoodItem),
    ItemRestored(FoodItem),
    HouseholdCreated(Household),
    MemberJoined { household_id: String, user_id: String },
    MemberLeft { household_id: String, user_id: String },
    HouseholdDeleted { household_id: String },
    ScopePurged { scope: OwnerScope },
}

/// Shared by the managers; `None` sender means nobody subscribed.
#[derive(Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<EngineEvent>>,
}

impl EventSink {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn emit(&self, event: EngineEvent) {
        if let Some(ref tx) = self.tx {
            if let Err(err) = tx.try_send(event) {
                log::debug!("event dropped: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_delivers_to_subscriber() {
        let (tx, mut rx) = mpsc::channel(8);
        let sink = EventSink::new(tx);
        sink.emit(EngineEvent::HouseholdDeleted {
            household_id: "h".repeat(20),
        });
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, EngineEvent::HouseholdDeleted { .. }));
    }

    #[test]
    fn test_emit_without_subscriber_is_a_noop() {
        EventSink::disabled().emit(EngineEvent::HouseholdDeleted {
            household_id: "h".repeat(20),
        });
    }

    #[tokio::test]
    async fn test_full_channel_drops_instead_of_blocking() {
        let (tx, _rx) = mpsc::channel(1);
        let sink = EventSink::new(tx);
        for _ in 0..10 {
            sink.emit(EngineEvent::HouseholdDeleted {
                household_id: "h".repeat(20),
            });
        }
    }
}
