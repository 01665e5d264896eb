//! calculator-scene
//!
//! A clickable 3D calculator. The crate loads a glTF model, renders it over a
//! gradient backdrop with lights, fog, bloom and depth of field, and reports
//! which button mesh was clicked. It runs in a native window and in a browser
//! canvas.
//!
//! High-level modules
//! - `background`: the scene configuration and the gradient backdrop binder
//! - `calculator`: the click-enabled model component and its subscription
//! - `camera`: camera, projection, orbit controls and camera uniforms
//! - `context`: central GPU and window context that owns device/queue/surface
//! - `data_structures`: scene graph, transforms, colours and GPU model data
//! - `dispatch`: delivery of pressed button names to the host
//! - `flow`: the event loop and the `run` entry points
//! - `listener`: scoped click subscriptions
//! - `pick`: ray casting from a click to a button name
//! - `pipelines`: render pipelines and shaders for the scene and post-processing
//! - `render`: the per-frame chain of passes
//! - `resources`: loading the model and building the gradient image
//! - `scene`: the declarative scene composition and its defaults
//!

pub mod background;
pub mod calculator;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod dispatch;
pub mod flow;
pub mod listener;
pub mod pick;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

pub use dispatch::ButtonCallback;
pub use flow::{run, run_with};
pub use scene::SceneComposition;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Entry point on the web: renders into `<canvas id="canvas">`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    flow::run().map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
