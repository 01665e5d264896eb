//! Click subscriptions.
//!
//! The canvas keeps a registry of click listeners. Subscribing hands back a
//! [`ClickSubscription`]; dropping it removes the listener again, so a
//! component can never leave a stale handler behind.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use crate::camera::{Camera, Projection};

/// A completed primary click in viewport pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickEvent {
    pub x: f64,
    pub y: f64,
    pub width: u32,
    pub height: u32,
}

pub type ClickCallback = Rc<dyn Fn(&ClickEvent, &Camera, &Projection)>;

#[derive(Default)]
struct Registry {
    next_id: Cell<u64>,
    listeners: RefCell<BTreeMap<u64, ClickCallback>>,
}

/// Listeners for clicks on the canvas, called in subscription order.
#[derive(Clone, Default)]
pub struct ClickListeners {
    registry: Rc<Registry>,
}

impl ClickListeners {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "the listener is removed as soon as the subscription is dropped"]
    pub fn subscribe(
        &self,
        callback: impl Fn(&ClickEvent, &Camera, &Projection) + 'static,
    ) -> ClickSubscription {
        let id = self.registry.next_id.get();
        self.registry.next_id.set(id + 1);
        self.registry
            .listeners
            .borrow_mut()
            .insert(id, Rc::new(callback));
        ClickSubscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Call every listener with `event`.
    ///
    /// Listeners are collected first, so a listener may subscribe or
    /// unsubscribe without invalidating the iteration.
    pub fn emit(&self, event: &ClickEvent, camera: &Camera, projection: &Projection) {
        let listeners: Vec<ClickCallback> =
            self.registry.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(event, camera, projection);
        }
    }

    pub fn len(&self) -> usize {
        self.registry.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps a listener registered for as long as it lives.
pub struct ClickSubscription {
    id: u64,
    registry: Weak<Registry>,
}

impl std::fmt::Debug for ClickSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickSubscription")
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for ClickSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.listeners.borrow_mut().remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click() -> ClickEvent {
        ClickEvent {
            x: 10.0,
            y: 10.0,
            width: 100,
            height: 100,
        }
    }

    fn camera() -> (Camera, Projection) {
        let camera = Camera::new([0.0, 0.0, 5.0], [0.0, 0.0, 0.0]);
        let projection = Projection::new(100, 100, cgmath::Deg(75.0), 0.1, 1000.0);
        (camera, projection)
    }

    #[test]
    fn dropping_the_subscription_unregisters() {
        let listeners = ClickListeners::new();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let subscription = listeners.subscribe(move |_, _, _| counter.set(counter.get() + 1));
        let (camera, projection) = camera();

        listeners.emit(&click(), &camera, &projection);
        assert_eq!(calls.get(), 1);

        drop(subscription);
        assert!(listeners.is_empty());
        listeners.emit(&click(), &camera, &projection);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn listeners_run_in_subscription_order() {
        let listeners = ClickListeners::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let (first, second) = (order.clone(), order.clone());
        let _a = listeners.subscribe(move |_, _, _| first.borrow_mut().push("a"));
        let _b = listeners.subscribe(move |_, _, _| second.borrow_mut().push("b"));
        let (camera, projection) = camera();

        listeners.emit(&click(), &camera, &projection);
        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn subscription_outliving_the_registry_is_harmless() {
        let listeners = ClickListeners::new();
        let subscription = listeners.subscribe(|_, _, _| {});
        drop(listeners);
        drop(subscription);
    }
}
