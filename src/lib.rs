//! # Slice-volume library
//!
//! This crate assembles a stack of 2D slice images into a dense 3D voxel
//! volume that can be handed to a volume renderer.

//!
//! Slices are selected with a glob pattern, stacked in path order and
//! decoded by a pluggable [`SliceDecoder`](slice_decoder::SliceDecoder).
//! Two adapters are provided:
//!  - [`BitmapSlices`](slice_decoder::BitmapSlices) for gray raster images
//!    (TIFF, PNG, ...), optionally tolerating truncated files
//!  - [`DicomSlices`](slice_decoder::DicomSlices) for DICOM files
//!
//!  The volume is stored as `u16` samples with axes (width, depth, height):
//!  width and depth are the columns and rows of each slice and height is the
//!  slice index. All slices must have the same size.
//!
//!  Rendering is left to an external renderer. The loaded volume is handed
//!  over as a contiguous buffer plus its extents, see [`render`]. An upload
//!  into a wgpu 3D texture is included in [`gpu_volume`].
//!
//! # Examples
//!
//! ## Reading a TIFF stack into a volume
//!
//! Slices are stacked in lexicographic path order, so numbered files must
//! be zero padded (`slice_009.tif` before `slice_010.tif`).
//!
//! ```no_run
//! # use slice_volume::{enums::Orientation, slice_decoder::BitmapSlices, volume_loader::VolumeLoader};
//! let volume = VolumeLoader::load_from_pattern("MRBrain/*.tif", &BitmapSlices::default())
//!     .expect("should have loaded slices matching the pattern");
//! let (_, _, height) = volume.dim();
//! let image = volume
//!     .get_image_from_axis(height / 2, Orientation::Axial)
//!     .expect("should have returned the center slice");
//! image.save("result.png");
//! ```

pub mod enums;
pub mod gpu_volume;
pub mod render;
pub mod slice_decoder;
#[cfg(test)]
mod test_support;
pub mod volume;
pub mod volume_loader;
