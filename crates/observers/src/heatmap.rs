//! PNG heatmaps of a 2D cut through the flow.
//!
//! Construct a [`Heatmap`] and chain builder methods as needed:
//!
//! ```ignore
//! let outflow = Heatmap::new("outflow")
//!     .colormap(Colormap::Blackbody)
//!     .contour_levels(5)
//!     .zoom([0.6, 0.3], [0.4, 0.7]);
//! outflow.write(&plane, step, output_dir)?;
//! ```

use std::path::{Path, PathBuf};

use image::{ImageResult, Rgb, RgbImage};
use venturi_core::Plane;

/// Target length in pixels of the longer image side.
const TARGET_SIZE: usize = 600;

/// Color of cells without a value.
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Color of contour lines.
const CONTOUR: Rgb<u8> = Rgb([0, 0, 0]);

/// Selects which color palette maps values to pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Colormap {
    /// Deep blue -> teal -> green -> sand -> white.
    #[default]
    EarthLike,

    /// Black -> dark red -> orange -> yellow -> white.
    Blackbody,
}

const EARTH_LIKE_STOPS: [(f64, f64, f64); 5] = [
    (10.0, 20.0, 120.0),   // deep blue  (0.00)
    (0.0, 120.0, 170.0),   // teal       (0.25)
    (70.0, 170.0, 70.0),   // green      (0.50)
    (220.0, 200.0, 120.0), // sand       (0.75)
    (250.0, 250.0, 250.0), // white      (1.00)
];

const BLACKBODY_STOPS: [(f64, f64, f64); 5] = [
    (0.0, 0.0, 0.0),       // black      (0.00)
    (120.0, 10.0, 0.0),    // dark red   (0.25)
    (230.0, 70.0, 0.0),    // orange     (0.50)
    (255.0, 210.0, 40.0),  // yellow     (0.75)
    (255.0, 255.0, 255.0), // white      (1.00)
];

impl Colormap {
    /// Maps a value in `[0, 1]` to a color; values outside are clamped.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn rgb(self, t: f64) -> Rgb<u8> {
        let stops = match self {
            Self::EarthLike => &EARTH_LIKE_STOPS,
            Self::Blackbody => &BLACKBODY_STOPS,
        };

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let seg = t * 4.0;
        let i = (seg as usize).min(3);
        let s = seg - i as f64;

        let (r0, g0, b0) = stops[i];
        let (r1, g1, b1) = stops[i + 1];
        Rgb([
            (r0 + s * (r1 - r0)).round() as u8,
            (g0 + s * (g1 - g0)).round() as u8,
            (b0 + s * (b1 - b0)).round() as u8,
        ])
    }
}

/// Rendering settings for one heatmap series.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    name: String,
    colormap: Colormap,
    contour_levels: usize,
    zoom_origin: [f64; 2],
    zoom_extent: [f64; 2],
    range: Option<(f64, f64)>,
}

/// The part of a plane shown by a heatmap, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub i0: usize,
    pub j0: usize,
    pub width: usize,
    pub height: usize,
}

impl Heatmap {
    /// Full-plane heatmap with the default colormap and no contours.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            colormap: Colormap::default(),
            contour_levels: 0,
            zoom_origin: [0.0, 0.0],
            zoom_extent: [1.0, 1.0],
            range: None,
        }
    }

    #[must_use]
    pub fn colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = colormap;
        self
    }

    /// Draws `levels` iso-lines between the lower and upper value; zero draws none.
    #[must_use]
    pub fn contour_levels(mut self, levels: usize) -> Self {
        self.contour_levels = levels;
        self
    }

    /// Shows only the part of the plane starting at `origin` and spanning
    /// `extent`, both given as fractions of the plane size.
    #[must_use]
    pub fn zoom(mut self, origin: [f64; 2], extent: [f64; 2]) -> Self {
        self.zoom_origin = origin;
        self.zoom_extent = extent;
        self
    }

    /// Fixes the value range mapped to the colormap instead of using the
    /// range of each plane.
    #[must_use]
    pub fn range(mut self, lower: f64, upper: f64) -> Self {
        self.range = Some((lower, upper));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn file_name(&self, step: usize) -> String {
        format!("{}_iT{step:07}.png", self.name)
    }

    /// The cells of a `width` x `height` plane inside the zoom window.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn window(&self, width: usize, height: usize) -> Window {
        let span = |origin: f64, extent: f64, size: usize| {
            let size_f = size as f64;
            let start = ((origin.clamp(0.0, 1.0) * size_f).floor() as usize).min(size);
            let len = ((extent.max(0.0) * size_f).ceil() as usize).min(size - start);
            (start, len)
        };
        let (i0, w) = span(self.zoom_origin[0], self.zoom_extent[0], width);
        let (j0, h) = span(self.zoom_origin[1], self.zoom_extent[1], height);
        Window {
            i0,
            j0,
            width: w,
            height: h,
        }
    }

    /// Renders the zoom window of `plane`, upper rows at the top.
    ///
    /// Returns `None` if the window is empty or holds no value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render(&self, plane: &Plane) -> Option<RgbImage> {
        let window = self.window(plane.width, plane.height);
        if window.width == 0 || window.height == 0 {
            return None;
        }

        let cell = |i: usize, j: usize| plane.get(window.i0 + i, window.j0 + j);
        let (lower, upper) = self.range.or_else(|| {
            (0..window.height)
                .flat_map(|j| (0..window.width).map(move |i| (i, j)))
                .filter_map(|(i, j)| cell(i, j))
                .fold(None, |range, value| match range {
                    None => Some((value, value)),
                    Some((lo, hi)) => Some((f64::min(lo, value), f64::max(hi, value))),
                })
        })?;
        let spread = upper - lower;
        let normalize = |value: f64| {
            if spread > 0.0 { (value - lower) / spread } else { 0.0 }
        };
        let level = |value: f64| {
            let levels = self.contour_levels as f64;
            (normalize(value) * levels).floor().min(levels - 1.0) as usize
        };
        let is_contour = |i: usize, j: usize, value: f64| {
            self.contour_levels > 0
                && [(i + 1, j), (i, j + 1)].into_iter().any(|(ni, nj)| {
                    ni < window.width
                        && nj < window.height
                        && cell(ni, nj).is_some_and(|other| level(other) != level(value))
                })
        };

        let scale = (TARGET_SIZE / window.width.max(window.height)).max(1);
        let (width, height) = (window.width * scale, window.height * scale);
        let image = RgbImage::from_fn(
            u32::try_from(width).ok()?,
            u32::try_from(height).ok()?,
            |x, y| {
                let i = x as usize / scale;
                let j = window.height - 1 - y as usize / scale;
                match cell(i, j) {
                    None => BACKGROUND,
                    Some(value) if is_contour(i, j, value) => CONTOUR,
                    Some(value) => self.colormap.rgb(normalize(value)),
                }
            },
        );
        Some(image)
    }

    /// Renders `plane` and saves it as `<dir>/<name>_iT<step>.png`.
    ///
    /// Returns the path written, or `None` if there was nothing to render.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be encoded or written.
    pub fn write(&self, plane: &Plane, step: usize, dir: &Path) -> ImageResult<Option<PathBuf>> {
        let Some(image) = self.render(plane) else {
            return Ok(None);
        };
        let path = dir.join(self.file_name(step));
        image.save(&path)?;
        Ok(Some(path))
    }
}

/// The two heatmaps of a duct run: the full cut and a zoom on the outflow.
#[must_use]
pub fn duct_heatmaps(name: &str) -> Vec<Heatmap> {
    vec![
        Heatmap::new(name),
        Heatmap::new(format!("{name}_outflow"))
            .colormap(Colormap::Blackbody)
            .contour_levels(5)
            .zoom([0.6, 0.3], [0.4, 0.7]),
    ]
}
