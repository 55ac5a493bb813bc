use std::sync::Arc;

use entity::prelude::*;
use tokio::sync::RwLock;
use tracing::debug;

/// Append-only event store. Clones share the same backing list.
#[derive(Clone, Debug, Default)]
pub struct EventRepository {
    events: Arc<RwLock<Vec<EventEntity>>>,
}

impl EventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn save(&self, model: EventEntity) {
        let mut events = self.events.write().await;
        events.push(model);
        debug!(task = "save event", stored = events.len());
    }

    /// Snapshot in insertion order.
    pub async fn find_all(&self) -> Vec<EventEntity> {
        self.events.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }
}

#[cfg(test)]
mod test {
    use entity::prelude::*;

    use super::EventRepository;

    fn push_event(author: &str) -> EventEntity {
        EventEntity {
            request_id: None,
            action: EventAction::Push,
            author: author.to_string(),
            to_branch: "main".to_string(),
            from_branch: None,
            timestamp: Timestamp::Millis(0),
        }
    }

    #[tokio::test]
    async fn test_save_keeps_insertion_order() {
        // Arrange
        let repository = EventRepository::new();

        // Act
        repository.save(push_event("alice")).await;
        repository.save(push_event("bob")).await;
        repository.save(push_event("alice")).await;

        // Assert
        let authors = repository
            .find_all()
            .await
            .into_iter()
            .map(|e| e.author)
            .collect::<Vec<_>>();
        assert_eq!(authors, ["alice", "bob", "alice"]);
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        // Arrange
        let repository = EventRepository::new();
        let other = repository.clone();

        // Act
        other.save(push_event("carol")).await;

        // Assert
        assert_eq!(repository.count().await, 1);
    }

    #[tokio::test]
    async fn test_find_all_is_a_snapshot() {
        // Arrange
        let repository = EventRepository::new();
        repository.save(push_event("alice")).await;

        // Act
        let snapshot = repository.find_all().await;
        repository.save(push_event("bob")).await;

        // Assert
        assert_eq!(snapshot.len(), 1);
        assert_eq!(repository.count().await, 2);
    }
}
