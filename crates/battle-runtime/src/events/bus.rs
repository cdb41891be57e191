//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};

use battle_core::{BeatResult, CombatEvent, ViewEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Combat outcomes (damage, death, turn flow)
    Combat,
    /// Beat classification results
    Timing,
    /// View-directed requests (health displays, list population)
    View,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Combat(CombatEvent),
    Timing(BeatResult),
    View(ViewEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Combat(_) => Topic::Combat,
            Event::Timing(_) => Topic::Timing,
            Event::View(_) => Topic::View,
        }
    }
}

impl From<CombatEvent> for Event {
    /// Engine events split by consumer: view requests and beat results get
    /// their own topics, everything else is combat.
    fn from(event: CombatEvent) -> Self {
        match event {
            CombatEvent::View(view) => Event::View(view),
            CombatEvent::BeatResult(result) => Event::Timing(result),
            other => Event::Combat(other),
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about.
pub struct EventBus {
    channels: Arc<RwLock<HashMap<Topic, broadcast::Sender<Event>>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let mut channels = HashMap::new();

        // Pre-create channels for each topic
        channels.insert(Topic::Combat, broadcast::channel(capacity).0);
        channels.insert(Topic::Timing, broadcast::channel(capacity).0);
        channels.insert(Topic::View, broadcast::channel(capacity).0);

        Self {
            channels: Arc::new(RwLock::new(channels)),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();

        // Use try_read to avoid blocking in async context
        // If we can't get the lock, just skip (events are best-effort)
        match self.channels.try_read() {
            Ok(channels) => {
                if let Some(tx) = channels.get(&topic)
                    && tx.send(event).is_err()
                {
                    // No subscribers for this topic - this is normal, not an error
                    tracing::trace!("No subscribers for topic {:?}", topic);
                }
            }
            Err(_) => {
                tracing::debug!("Failed to acquire event bus lock for topic {:?}", topic);
            }
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        let channels = self
            .channels
            .try_read()
            .expect("Failed to acquire read lock on event channels");
        channels
            .get(&topic)
            .expect("Topic channel not initialized")
            .subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        let channels = self
            .channels
            .try_read()
            .expect("Failed to acquire read lock on event channels");
        topics
            .iter()
            .map(|&topic| {
                let rx = channels
                    .get(&topic)
                    .expect("Topic channel not initialized")
                    .subscribe();
                (topic, rx)
            })
            .collect()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::CombatantId;

    #[test]
    fn events_route_to_their_topic() {
        let bus = EventBus::new();
        let mut combat_rx = bus.subscribe(Topic::Combat);
        let mut view_rx = bus.subscribe(Topic::View);

        bus.publish(Event::from(CombatEvent::Death {
            target: CombatantId(1),
        }));
        bus.publish(Event::from(CombatEvent::View(ViewEvent::HideHealth {
            target: CombatantId(1),
        })));

        assert!(matches!(
            combat_rx.try_recv(),
            Ok(Event::Combat(CombatEvent::Death { .. }))
        ));
        assert!(combat_rx.try_recv().is_err());
        assert!(matches!(view_rx.try_recv(), Ok(Event::View(_))));
    }

    #[test]
    fn beat_results_land_on_the_timing_topic() {
        let bus = EventBus::new();
        let mut timing_rx = bus.subscribe(Topic::Timing);
        bus.publish(Event::from(CombatEvent::BeatResult(BeatResult::Perfect)));
        assert!(matches!(
            timing_rx.try_recv(),
            Ok(Event::Timing(BeatResult::Perfect))
        ));
    }
}
