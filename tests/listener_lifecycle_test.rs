use calculator_scene::{
    calculator::CalculatorModel,
    data_structures::scene_graph::SceneNode,
    listener::{ClickEvent, ClickListeners},
    resources,
    scene::ModelMount,
};

use crate::common::test_utils::{Quad, default_view, glb, recording_handler};
mod common;

const CENTRE: ClickEvent = ClickEvent {
    x: 400.0,
    y: 300.0,
    width: 800,
    height: 600,
};

async fn calculator_model() -> SceneNode {
    let scene = resources::model_from_bytes("calculator.glb", &glb(&[Quad::new("button_equals", [0.0; 3])]))
        .await
        .unwrap();
    resources::mount(scene, &ModelMount::default())
}

#[tokio::test]
async fn click_on_a_button_dispatches_exactly_once() {
    let listeners = ClickListeners::new();
    let (camera, projection) = default_view();
    let (handler, pressed) = recording_handler();
    let mut calculator = CalculatorModel::new(handler);
    calculator.mount(calculator_model().await);
    calculator.sync(&listeners, camera.key());

    listeners.emit(&CENTRE, &camera, &projection);
    assert_eq!(*pressed.borrow(), vec!["button_equals".to_string()]);
}

#[tokio::test]
async fn unmount_removes_the_listener() {
    let listeners = ClickListeners::new();
    let (camera, projection) = default_view();
    let (handler, pressed) = recording_handler();
    let mut calculator = CalculatorModel::new(handler);
    calculator.mount(calculator_model().await);
    calculator.sync(&listeners, camera.key());
    assert_eq!(listeners.len(), 1);

    calculator.unmount();
    listeners.emit(&CENTRE, &camera, &projection);

    assert!(listeners.is_empty());
    assert!(pressed.borrow().is_empty());
}

#[tokio::test]
async fn dropping_the_component_removes_the_listener() {
    let listeners = ClickListeners::new();
    let (camera, _) = default_view();
    let (handler, _) = recording_handler();
    let mut calculator = CalculatorModel::new(handler);
    calculator.mount(calculator_model().await);
    calculator.sync(&listeners, camera.key());

    drop(calculator);
    assert!(listeners.is_empty());
}

#[tokio::test]
async fn new_handler_replaces_the_old_one() {
    let listeners = ClickListeners::new();
    let (camera, projection) = default_view();
    let (first, first_pressed) = recording_handler();
    let (second, second_pressed) = recording_handler();
    let mut calculator = CalculatorModel::new(first);
    calculator.mount(calculator_model().await);
    calculator.sync(&listeners, camera.key());

    calculator.set_handler(second);
    assert!(calculator.sync(&listeners, camera.key()));
    assert_eq!(listeners.len(), 1);

    listeners.emit(&CENTRE, &camera, &projection);
    assert!(first_pressed.borrow().is_empty());
    assert_eq!(*second_pressed.borrow(), vec!["button_equals".to_string()]);
}

#[test]
fn click_before_the_model_loaded_does_nothing() {
    let listeners = ClickListeners::new();
    let (camera, projection) = default_view();
    let (handler, pressed) = recording_handler();
    let mut calculator = CalculatorModel::new(handler);

    assert!(!calculator.sync(&listeners, camera.key()));
    listeners.emit(&CENTRE, &camera, &projection);

    assert!(listeners.is_empty());
    assert!(pressed.borrow().is_empty());
}
