//! Scene composition.
//!
//! [`SceneComposition`] is the declarative description of everything that is on
//! screen: camera, lights, fog, post-processing, orbit controls, the backdrop and
//! where the model is mounted. The values never change while the program runs;
//! the renderer reads them every frame.

use crate::{data_structures::colour::Colour, resources::gradient::GradientSpec};

#[derive(Clone, Debug, PartialEq)]
pub struct CameraSettings {
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AmbientLight {
    pub colour: Colour,
    pub intensity: f32,
}

/// A directional light shining from `position` towards `target`.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub colour: Colour,
    pub intensity: f32,
    /// Recorded for completeness; no shadow map is rendered.
    pub cast_shadow: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: [f32; 3],
    pub colour: Colour,
    pub intensity: f32,
}

impl PointLight {
    fn white(position: [f32; 3], intensity: f32) -> Self {
        Self {
            position,
            colour: Colour::WHITE,
            intensity,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub points: [PointLight; 3],
}

impl Default for Lights {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                colour: Colour::WHITE,
                intensity: 0.7,
            },
            directional: DirectionalLight {
                position: [5.0, 5.0, 5.0],
                target: [0.0, 0.0, 0.0],
                colour: Colour::WHITE,
                intensity: 0.8,
                cast_shadow: true,
            },
            points: [
                PointLight::white([5.0, 5.0, 5.0], 0.3),
                PointLight::white([-5.0, -5.0, -5.0], 0.3),
                PointLight::white([10.0, 10.0, 10.0], 1.0),
            ],
        }
    }
}

/// Linear fog over view-space depth.
#[derive(Clone, Debug, PartialEq)]
pub struct Fog {
    pub colour: Colour,
    pub near: f32,
    pub far: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            colour: Colour::WHITE,
            near: 5.0,
            far: 15.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bloom {
    pub luminance_threshold: f32,
    pub luminance_smoothing: f32,
    /// Height in pixels of the buffers the glow is blurred in.
    pub height: u32,
    pub intensity: f32,
}

impl Default for Bloom {
    fn default() -> Self {
        Self {
            luminance_threshold: 0.3,
            luminance_smoothing: 0.9,
            height: 300,
            intensity: 1.0,
        }
    }
}

/// Depth of field. Distances are normalized depth between the near and far plane.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthOfField {
    pub focus_distance: f32,
    pub focal_length: f32,
    pub bokeh_scale: f32,
    /// Reference height in pixels the bokeh radius is expressed in.
    pub height: u32,
}

impl Default for DepthOfField {
    fn default() -> Self {
        Self {
            focus_distance: 0.005,
            focal_length: 0.02,
            bokeh_scale: 2.0,
            height: 480,
        }
    }
}

/// The post-processing chain. Bloom always runs before depth of field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostProcessing {
    pub bloom: Bloom,
    pub depth_of_field: DepthOfField,
}

/// Orbit controls. The defaults leave distance and azimuth unclamped.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitSettings {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: std::f32::consts::PI,
        }
    }
}

/// Which asset to load and where to put it.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelMount {
    pub asset: String,
    pub scale: f32,
    pub position: [f32; 3],
}

impl Default for ModelMount {
    fn default() -> Self {
        Self {
            asset: "calculator.glb".to_string(),
            scale: 1.5,
            position: [0.0, 0.0, 0.0],
        }
    }
}

/// The complete, static description of the calculator scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneComposition {
    pub camera: CameraSettings,
    pub lights: Lights,
    pub fog: Fog,
    pub post_processing: PostProcessing,
    pub controls: OrbitSettings,
    pub background: GradientSpec,
    pub model: ModelMount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_composition_matches_the_calculator_scene() {
        let scene = SceneComposition::default();
        assert_eq!(scene.model.asset, "calculator.glb");
        assert_eq!(scene.model.scale, 1.5);
        assert_eq!(scene.post_processing.bloom.luminance_threshold, 0.3);
        assert_eq!(scene.post_processing.bloom.luminance_smoothing, 0.9);
        assert_eq!(scene.fog.near, 5.0);
        assert_eq!(scene.fog.far, 15.0);
        assert_eq!(scene.lights.points.len(), 3);
        assert!(scene.lights.directional.cast_shadow);
        assert!(scene.controls.max_distance.is_infinite());
    }
}
