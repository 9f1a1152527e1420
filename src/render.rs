//! Hand-off of a loaded volume to an external volume renderer.
//!
//! Rendering itself is owned by the renderer. This module only describes
//! what is handed over: a contiguous `u16` buffer with its extents, and the
//! settings the renderer is configured with.

use std::fmt;

/// Voxel counts along the (width, depth, height) axes of a volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    pub width: usize,
    pub depth: usize,
    pub height: usize,
}

impl Extent {
    /// Zero-based inclusive upper bounds (width - 1, depth - 1, height - 1).
    pub fn max_index(&self) -> (usize, usize, usize) {
        (
            self.width.saturating_sub(1),
            self.depth.saturating_sub(1),
            self.height.saturating_sub(1),
        )
    }

    /// Inclusive bounds in buffer order, fastest varying axis first:
    /// `[0, height - 1, 0, depth - 1, 0, width - 1]`.
    pub fn whole_extent(&self) -> [usize; 6] {
        let (width, depth, height) = self.max_index();
        [0, height, 0, depth, 0, width]
    }

    pub fn voxel_count(&self) -> usize {
        self.width * self.depth * self.height
    }
}

/// Borrowed voxel buffer in (width, depth, height) C order.
#[derive(Clone, Copy, Debug)]
pub struct VolumeImport<'a> {
    pub samples: &'a [u16],
    pub extent: Extent,
}

/// Polled by the renderer between frames; `true` cancels the current render.
pub type AbortCheck = Box<dyn Fn() -> bool + Send + Sync>;

pub struct RenderSettings {
    /// (width, height) in pixels
    pub window_size: (u32, u32),
    pub multi_samples: u32,
    pub max_image_sample_distance: f32,
    /// RGB in 0..=1
    pub background: [f32; 3],
    /// (scalar, gray level) control points of the color ramp
    pub color_points: Vec<(f32, f32)>,
    /// (scalar, opacity) control points
    pub opacity_points: Vec<(f32, f32)>,
    pub abort_check: Option<AbortCheck>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            window_size: (800, 600),
            multi_samples: 4,
            max_image_sample_distance: 0.01,
            background: [1.0, 1.0, 1.0],
            color_points: vec![(0.0, 0.0), (255.0, 1.0)],
            opacity_points: vec![(25.0, 0.0), (255.0, 1.0)],
            abort_check: None,
        }
    }
}

impl fmt::Debug for RenderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSettings")
            .field("window_size", &self.window_size)
            .field("multi_samples", &self.multi_samples)
            .field("max_image_sample_distance", &self.max_image_sample_distance)
            .field("background", &self.background)
            .field("color_points", &self.color_points)
            .field("opacity_points", &self.opacity_points)
            .field("abort_check", &self.abort_check.is_some())
            .finish()
    }
}

impl RenderSettings {
    pub fn with_abort_check(mut self, check: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.abort_check = Some(Box::new(check));
        self
    }

    pub fn should_abort(&self) -> bool {
        self.abort_check.as_ref().is_some_and(|check| check())
    }
}

/// A renderer that takes over a loaded volume.
pub trait RenderCollaborator {
    type Error;

    fn present(
        &mut self,
        import: VolumeImport<'_>,
        settings: &RenderSettings,
    ) -> Result<(), Self::Error>;
}
