use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::trace;

use crate::Graph;
use crate::NodeClass;
use crate::NodeRecord;
use crate::Source;
use crate::Value;

/// A typed facade a watch can hand to its delegate
pub trait Watchable: Sized + Send + Sync + 'static {
    /// Only nodes of this class produce events
    const CLASS: NodeClass;

    fn from_node(
        graph: &Graph,
        node: NodeRecord,
    ) -> Self;
}

/// Receives the events of one watch. Every method defaults to a no-op.
///
/// Calls happen on the thread that committed or merged, after the changes
/// are durable. A delegate may read the graph, stage changes and commit
/// from inside a callback.
#[allow(unused_variables)]
pub trait WatchDelegate<T: Watchable>: Send + Sync {
    fn inserted(
        &self,
        graph: &Graph,
        entity: &T,
        source: Source,
    ) {
    }

    fn deleted(
        &self,
        graph: &Graph,
        entity: &T,
        source: Source,
    ) {
    }

    fn added_tag(
        &self,
        graph: &Graph,
        entity: &T,
        tag: &str,
        source: Source,
    ) {
    }

    fn removed_tag(
        &self,
        graph: &Graph,
        entity: &T,
        tag: &str,
        source: Source,
    ) {
    }

    fn added_to_group(
        &self,
        graph: &Graph,
        entity: &T,
        group: &str,
        source: Source,
    ) {
    }

    fn removed_from_group(
        &self,
        graph: &Graph,
        entity: &T,
        group: &str,
        source: Source,
    ) {
    }

    fn added_property(
        &self,
        graph: &Graph,
        entity: &T,
        property: &str,
        value: &Value,
        source: Source,
    ) {
    }

    fn updated_property(
        &self,
        graph: &Graph,
        entity: &T,
        property: &str,
        value: &Value,
        source: Source,
    ) {
    }

    fn removed_property(
        &self,
        graph: &Graph,
        entity: &T,
        property: &str,
        value: &Value,
        source: Source,
    ) {
    }
}

/// Owned form of a delegate callback
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent<T> {
    Inserted {
        entity: T,
        source: Source,
    },
    Deleted {
        entity: T,
        source: Source,
    },
    AddedTag {
        entity: T,
        tag: String,
        source: Source,
    },
    RemovedTag {
        entity: T,
        tag: String,
        source: Source,
    },
    AddedToGroup {
        entity: T,
        group: String,
        source: Source,
    },
    RemovedFromGroup {
        entity: T,
        group: String,
        source: Source,
    },
    AddedProperty {
        entity: T,
        property: String,
        value: Value,
        source: Source,
    },
    UpdatedProperty {
        entity: T,
        property: String,
        value: Value,
        source: Source,
    },
    RemovedProperty {
        entity: T,
        property: String,
        value: Value,
        source: Source,
    },
}

impl<T> WatchEvent<T> {
    pub fn entity(&self) -> &T {
        match self {
            WatchEvent::Inserted { entity, .. }
            | WatchEvent::Deleted { entity, .. }
            | WatchEvent::AddedTag { entity, .. }
            | WatchEvent::RemovedTag { entity, .. }
            | WatchEvent::AddedToGroup { entity, .. }
            | WatchEvent::RemovedFromGroup { entity, .. }
            | WatchEvent::AddedProperty { entity, .. }
            | WatchEvent::UpdatedProperty { entity, .. }
            | WatchEvent::RemovedProperty { entity, .. } => entity,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            WatchEvent::Inserted { source, .. }
            | WatchEvent::Deleted { source, .. }
            | WatchEvent::AddedTag { source, .. }
            | WatchEvent::RemovedTag { source, .. }
            | WatchEvent::AddedToGroup { source, .. }
            | WatchEvent::RemovedFromGroup { source, .. }
            | WatchEvent::AddedProperty { source, .. }
            | WatchEvent::UpdatedProperty { source, .. }
            | WatchEvent::RemovedProperty { source, .. } => *source,
        }
    }

    /// Stable event name, also used as metric label
    pub fn name(&self) -> &'static str {
        match self {
            WatchEvent::Inserted { .. } => "inserted",
            WatchEvent::Deleted { .. } => "deleted",
            WatchEvent::AddedTag { .. } => "added_tag",
            WatchEvent::RemovedTag { .. } => "removed_tag",
            WatchEvent::AddedToGroup { .. } => "added_to_group",
            WatchEvent::RemovedFromGroup { .. } => "removed_from_group",
            WatchEvent::AddedProperty { .. } => "added_property",
            WatchEvent::UpdatedProperty { .. } => "updated_property",
            WatchEvent::RemovedProperty { .. } => "removed_property",
        }
    }
}

/// Delegate that forwards every callback into an unbounded channel, for
/// consumers that prefer to receive events on their own task.
pub struct EventForwarder<T> {
    sender: mpsc::UnboundedSender<WatchEvent<T>>,
}

impl<T: Watchable + Clone> EventForwarder<T> {
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<WatchEvent<T>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { sender }), receiver)
    }

    fn forward(
        &self,
        event: WatchEvent<T>,
    ) {
        if self.sender.send(event).is_err() {
            trace!("event receiver dropped, event discarded");
        }
    }
}

impl<T: Watchable + Clone> WatchDelegate<T> for EventForwarder<T> {
    fn inserted(
        &self,
        _graph: &Graph,
        entity: &T,
        source: Source,
    ) {
        self.forward(WatchEvent::Inserted {
            entity: entity.clone(),
            source,
        });
    }

    fn deleted(
        &self,
        _graph: &Graph,
        entity: &T,
        source: Source,
    ) {
        self.forward(WatchEvent::Deleted {
            entity: entity.clone(),
            source,
        });
    }

    fn added_tag(
        &self,
        _graph: &Graph,
        entity: &T,
        tag: &str,
        source: Source,
    ) {
        self.forward(WatchEvent::AddedTag {
            entity: entity.clone(),
            tag: tag.to_string(),
            source,
        });
    }

    fn removed_tag(
        &self,
        _graph: &Graph,
        entity: &T,
        tag: &str,
        source: Source,
    ) {
        self.forward(WatchEvent::RemovedTag {
            entity: entity.clone(),
            tag: tag.to_string(),
            source,
        });
    }

    fn added_to_group(
        &self,
        _graph: &Graph,
        entity: &T,
        group: &str,
        source: Source,
    ) {
        self.forward(WatchEvent::AddedToGroup {
            entity: entity.clone(),
            group: group.to_string(),
            source,
        });
    }

    fn removed_from_group(
        &self,
        _graph: &Graph,
        entity: &T,
        group: &str,
        source: Source,
    ) {
        self.forward(WatchEvent::RemovedFromGroup {
            entity: entity.clone(),
            group: group.to_string(),
            source,
        });
    }

    fn added_property(
        &self,
        _graph: &Graph,
        entity: &T,
        property: &str,
        value: &Value,
        source: Source,
    ) {
        self.forward(WatchEvent::AddedProperty {
            entity: entity.clone(),
            property: property.to_string(),
            value: value.clone(),
            source,
        });
    }

    fn updated_property(
        &self,
        _graph: &Graph,
        entity: &T,
        property: &str,
        value: &Value,
        source: Source,
    ) {
        self.forward(WatchEvent::UpdatedProperty {
            entity: entity.clone(),
            property: property.to_string(),
            value: value.clone(),
            source,
        });
    }

    fn removed_property(
        &self,
        _graph: &Graph,
        entity: &T,
        property: &str,
        value: &Value,
        source: Source,
    ) {
        self.forward(WatchEvent::RemovedProperty {
            entity: entity.clone(),
            property: property.to_string(),
            value: value.clone(),
            source,
        });
    }
}
