//! Delivery of resolved button presses.

use std::rc::Rc;

/// Called with the name of the pressed button.
pub type ButtonCallback = Rc<dyn Fn(&str)>;

/// The default handler: log the press and nothing more.
pub fn log_button_press(name: &str) {
    log::info!("Button {} pressed", name);
}

/// Hands button names to the host's handler, synchronously and exactly once
/// per resolved click.
#[derive(Clone)]
pub struct ButtonDispatch {
    handler: ButtonCallback,
}

impl ButtonDispatch {
    pub fn new(handler: ButtonCallback) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &ButtonCallback {
        &self.handler
    }

    pub fn dispatch(&self, name: &str) {
        log::debug!("Dispatching press of {}", name);
        (self.handler)(name);
    }
}

impl Default for ButtonDispatch {
    fn default() -> Self {
        Self::new(Rc::new(log_button_press))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn handler_receives_the_name_once() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let dispatch = ButtonDispatch::new(Rc::new(move |name: &str| {
            sink.borrow_mut().push(name.to_string())
        }));

        dispatch.dispatch("button_7");
        assert_eq!(*seen.borrow(), vec!["button_7".to_string()]);
    }

    #[test]
    fn default_handler_only_logs() {
        ButtonDispatch::default().dispatch("button_equals");
    }
}
