//! The click-enabled calculator model.
//!
//! [`CalculatorModel`] owns the mounted scene graph and, while the model is
//! present, exactly one click subscription. The subscription depends on the
//! active camera, the model and the button handler. Whenever one of them
//! changes the old subscription is dropped and a new one registered.

use std::rc::Rc;

use crate::{
    camera::CameraKey,
    data_structures::scene_graph::SceneNode,
    dispatch::{ButtonCallback, ButtonDispatch},
    listener::{ClickListeners, ClickSubscription},
    pick,
};

struct Registration {
    camera: CameraKey,
    model: Rc<SceneNode>,
    handler: ButtonCallback,
    _subscription: ClickSubscription,
}

impl Registration {
    fn matches(&self, camera: CameraKey, model: &Rc<SceneNode>, handler: &ButtonCallback) -> bool {
        self.camera == camera && Rc::ptr_eq(&self.model, model) && Rc::ptr_eq(&self.handler, handler)
    }
}

pub struct CalculatorModel {
    dispatch: ButtonDispatch,
    model: Option<Rc<SceneNode>>,
    registration: Option<Registration>,
}

impl CalculatorModel {
    pub fn new(on_button_click: ButtonCallback) -> Self {
        Self {
            dispatch: ButtonDispatch::new(on_button_click),
            model: None,
            registration: None,
        }
    }

    /// Replace the handler. Takes effect on the next [`Self::sync`].
    pub fn set_handler(&mut self, on_button_click: ButtonCallback) {
        self.dispatch = ButtonDispatch::new(on_button_click);
    }

    pub fn mount(&mut self, model: SceneNode) {
        self.model = Some(Rc::new(model));
    }

    pub fn model(&self) -> Option<&SceneNode> {
        self.model.as_deref()
    }

    /// Bring the click subscription in line with the current camera, model and
    /// handler. Returns whether a new subscription was registered.
    pub fn sync(&mut self, listeners: &ClickListeners, camera: CameraKey) -> bool {
        let Some(model) = self.model.clone() else {
            self.registration = None;
            return false;
        };
        let handler = self.dispatch.handler().clone();
        if self
            .registration
            .as_ref()
            .is_some_and(|registration| registration.matches(camera, &model, &handler))
        {
            return false;
        }

        self.registration = None;
        let dispatch = self.dispatch.clone();
        let root = model.clone();
        let subscription = listeners.subscribe(move |click, camera, projection| {
            if let Some(name) = pick::resolve_button(click, camera, projection, &root) {
                dispatch.dispatch(&name);
            }
        });
        self.registration = Some(Registration {
            camera,
            model,
            handler,
            _subscription: subscription,
        });
        true
    }

    /// Drop the model together with its click subscription.
    pub fn unmount(&mut self) {
        self.registration = None;
        self.model = None;
    }
}
