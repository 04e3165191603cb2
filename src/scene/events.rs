//! Input forwarded to components and UI events emitted by them.
//!
//! UI components never call user callbacks. They push a [`UiEvent`] into the
//! scene's queue, which the application drains once per frame.

use glam::Vec2;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Space,
    Escape,
    Other(u32),
}

/// Platform-independent input event.
///
/// Positions are in the coordinate space of the receiving node's pass.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MouseMoved { position: Vec2, delta: Vec2 },
    MouseButton {
        button: MouseButton,
        pressed: bool,
        position: Vec2,
    },
    MouseWheel { delta: Vec2 },
    Key { key: Key, pressed: bool },
    /// A named input action (e.g. `camera_orbit_left`) changed state.
    Action { name: String, pressed: bool },
}

/// Message emitted by a UI component.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Clicked { node: Uuid },
    Pressed { node: Uuid },
    Released { node: Uuid },
    HoverChanged { node: Uuid, hovered: bool },
}

impl UiEvent {
    #[must_use]
    pub fn node(&self) -> Uuid {
        match self {
            UiEvent::Clicked { node }
            | UiEvent::Pressed { node }
            | UiEvent::Released { node }
            | UiEvent::HoverChanged { node, .. } => *node,
        }
    }
}

/// Sending half handed to components.
#[derive(Debug, Clone)]
pub struct UiEventSender {
    tx: flume::Sender<UiEvent>,
}

impl UiEventSender {
    pub fn send(&self, event: UiEvent) {
        // The receiver lives in the scene; a closed channel means the scene
        // is being torn down.
        if self.tx.send(event).is_err() {
            log::debug!("UI event dropped: queue closed");
        }
    }
}

/// Unbounded multi-producer queue owned by the scene.
#[derive(Debug)]
pub struct UiEventQueue {
    tx: flume::Sender<UiEvent>,
    rx: flume::Receiver<UiEvent>,
}

impl UiEventQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    #[must_use]
    pub fn sender(&self) -> UiEventSender {
        UiEventSender {
            tx: self.tx.clone(),
        }
    }

    /// Removes every pending event in emission order.
    pub fn drain(&self) -> Vec<UiEvent> {
        self.rx.try_iter().collect()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Default for UiEventQueue {
    fn default() -> Self {
        Self::new()
    }
}
