//! Engine data structures: colours, transforms, scene graph, models and textures.
//!
//! - `colour` parses the `#rrggbb` colours used by the scene description
//! - `instance` holds decomposed node transforms
//! - `scene_graph` is the CPU-side tree of named nodes the loader produces
//! - `model` contains the GPU buffers uploaded from a scene graph
//! - `texture` contains GPU texture wrapper and creation utilities

pub mod colour;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
