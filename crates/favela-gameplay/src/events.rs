//! Event bus carrying round notifications to the orchestrator and UI.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use favela_common::{AgentId, Team};

/// Notifications emitted by gameplay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The player's health reached zero
    PlayerDied,
    /// An agent died
    AgentDied {
        /// Agent ID
        agent: AgentId,
        /// Team the agent fought for
        team: Team,
    },
    /// Every enemy is down
    RoundWon {
        /// Seconds since round start
        elapsed: f64,
        /// Player kill count
        kills: u32,
    },
    /// The player died before clearing the enemy team
    RoundLost {
        /// Seconds since round start
        elapsed: f64,
        /// Player kill count
        kills: u32,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: GameEvent) {
        // Non-blocking send - if full, event is dropped
        if self.sender.try_send(event).is_err() {
            tracing::warn!("Event bus full, dropping event");
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<GameEvent> {
        self.sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(4);
        bus.publish(GameEvent::PlayerDied);
        bus.publish(GameEvent::AgentDied {
            agent: AgentId::from_raw(1),
            team: Team::Criminal,
        });
        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], GameEvent::PlayerDied);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(1);
        bus.publish(GameEvent::PlayerDied);
        bus.publish(GameEvent::PlayerDied);
        assert_eq!(bus.drain().len(), 1);
    }

    #[test]
    fn test_sender_handle_publishes() {
        let bus = EventBus::default();
        bus.sender()
            .try_send(GameEvent::PlayerDied)
            .expect("send");
        assert_eq!(bus.capacity(), 256);
        assert_eq!(bus.drain(), vec![GameEvent::PlayerDied]);
    }
}
