//! Notifications emitted by the layer manager.

use crate::types::LayerId;

/// A change to the layer stack.
///
/// Events are dispatched synchronously, in listener registration order, after
/// the manager's state already reflects the change.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    Created { id: LayerId },
    Deleted { id: LayerId },
    /// A layer moved between stack positions (bottom = 0)
    Reordered { id: LayerId, from: usize, to: usize },
    /// `removed` layers were combined into `into`
    Merged { into: LayerId, removed: Vec<LayerId> },
    ActiveChanged {
        previous: Option<LayerId>,
        current: Option<LayerId>,
    },
    /// Name, visibility, lock, opacity or blend mode changed
    PropertiesChanged { id: LayerId },
}

/// Listener callback registered with [`super::LayerManager::add_listener`]
pub type LayerListener = Box<dyn FnMut(&LayerEvent) + Send>;
