//! The scene backdrop.
//!
//! [`SceneConfig`] is the scene-wide state the renderer reads: for now only the
//! background image. It is passed around explicitly; whoever wants to change
//! it needs `&mut` access and every change bumps [`SceneConfig::revision`] so
//! the renderer knows to upload again.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use image::RgbaImage;

use crate::resources::gradient::{GradientError, GradientSpec, build_gradient};

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a [`SceneConfig`]. Clones share it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneId(u64);

#[derive(Clone, Debug)]
pub struct SceneConfig {
    id: SceneId,
    background: Option<Arc<RgbaImage>>,
    revision: u64,
}

impl SceneConfig {
    pub fn new() -> Self {
        Self {
            id: SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed)),
            background: None,
            revision: 0,
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn background(&self) -> Option<&Arc<RgbaImage>> {
        self.background.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_background(&mut self, background: Arc<RgbaImage>) {
        self.background = Some(background);
        self.revision += 1;
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the gradient once and hands it to each scene it is applied to.
pub struct BackgroundBinder {
    texture: Arc<RgbaImage>,
    bound_to: Option<SceneId>,
}

impl BackgroundBinder {
    pub fn new(spec: &GradientSpec) -> Result<Self, GradientError> {
        let texture = Arc::new(build_gradient(spec)?);
        Ok(Self {
            texture,
            bound_to: None,
        })
    }

    pub fn texture(&self) -> &Arc<RgbaImage> {
        &self.texture
    }

    /// Set the background of `scene` unless this binder already did. Returns
    /// whether the scene changed.
    pub fn apply(&mut self, scene: &mut SceneConfig) -> bool {
        if self.bound_to == Some(scene.id()) {
            return false;
        }
        scene.set_background(self.texture.clone());
        self.bound_to = Some(scene.id());
        log::debug!("Bound gradient background to scene {:?}", scene.id());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_once_per_scene() {
        let mut binder = BackgroundBinder::new(&GradientSpec::default()).unwrap();
        let mut scene = SceneConfig::new();

        assert!(binder.apply(&mut scene));
        assert_eq!(scene.revision(), 1);
        assert!(!binder.apply(&mut scene));
        assert_eq!(scene.revision(), 1);

        let background = scene.background().unwrap();
        assert!(Arc::ptr_eq(background, binder.texture()));
    }

    #[test]
    fn new_scene_gets_the_background_again() {
        let mut binder = BackgroundBinder::new(&GradientSpec::default()).unwrap();
        let mut first = SceneConfig::new();
        let mut second = SceneConfig::new();
        assert_ne!(first.id(), second.id());

        assert!(binder.apply(&mut first));
        assert!(binder.apply(&mut second));
        assert!(second.background().is_some());
    }

    #[test]
    fn empty_surface_fails_construction() {
        let spec = GradientSpec {
            width: 0,
            ..Default::default()
        };
        assert!(BackgroundBinder::new(&spec).is_err());
    }
}
