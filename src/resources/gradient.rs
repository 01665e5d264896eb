//! Two-stop linear gradient images, used as the scene backdrop.

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::data_structures::colour::Colour;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GradientError {
    #[error("cannot draw a gradient onto a {width}x{height} surface")]
    EmptySurface { width: u32, height: u32 },
}

/// Size and colour stops of a gradient running from the top-left to the
/// bottom-right corner.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientSpec {
    pub width: u32,
    pub height: u32,
    pub start: Colour,
    pub end: Colour,
}

impl Default for GradientSpec {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            start: Colour::new(0xf4, 0xb9, 0xff),
            end: Colour::new(0xdd, 0x86, 0xd6),
        }
    }
}

/// Rasterize the gradient.
///
/// Each pixel centre is projected onto the diagonal `(0, 0) -> (width, height)`
/// and the stops are interpolated in sRGB space, which is what a 2D canvas does.
pub fn build_gradient(spec: &GradientSpec) -> Result<RgbaImage, GradientError> {
    if spec.width == 0 || spec.height == 0 {
        return Err(GradientError::EmptySurface {
            width: spec.width,
            height: spec.height,
        });
    }
    let gx = f64::from(spec.width);
    let gy = f64::from(spec.height);
    let length2 = gx * gx + gy * gy;
    let start = spec.start.to_rgba8();
    let end = spec.end.to_rgba8();

    Ok(RgbaImage::from_fn(spec.width, spec.height, |x, y| {
        let px = f64::from(x) + 0.5;
        let py = f64::from(y) + 0.5;
        let t = ((px * gx + py * gy) / length2).clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| {
            (f64::from(a) + (f64::from(b) - f64::from(a)) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgba([
            mix(start[0], end[0]),
            mix(start[1], end[1]),
            mix(start[2], end[2]),
            255,
        ])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic() {
        let spec = GradientSpec::default();
        let a = build_gradient(&spec).unwrap();
        let b = build_gradient(&spec).unwrap();
        assert_eq!(a.dimensions(), (512, 512));
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn corners_approach_the_stops() {
        let spec = GradientSpec::default();
        let img = build_gradient(&spec).unwrap();
        let first = img.get_pixel(0, 0).0;
        let last = img.get_pixel(511, 511).0;
        for channel in 0..3 {
            assert!((i16::from(first[channel]) - i16::from(spec.start.to_rgba8()[channel])).abs() <= 1);
            assert!((i16::from(last[channel]) - i16::from(spec.end.to_rgba8()[channel])).abs() <= 1);
        }
        assert_eq!(first[3], 255);
    }

    #[test]
    fn anti_diagonal_is_uniform() {
        // pixels with the same x + y on a square image share one colour
        let img = build_gradient(&GradientSpec::default()).unwrap();
        assert_eq!(img.get_pixel(100, 300), img.get_pixel(300, 100));
        assert_eq!(img.get_pixel(0, 511), img.get_pixel(511, 0));
    }

    #[test]
    fn empty_surface_fails() {
        let spec = GradientSpec {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(
            build_gradient(&spec),
            Err(GradientError::EmptySurface {
                width: 0,
                height: 512
            })
        ));
    }
}
