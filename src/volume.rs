use crate::enums::Orientation;
use crate::render::Extent;
use crate::render::VolumeImport;

use image::GrayImage;
use image::ImageBuffer;
use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::s;
use rayon::prelude::*;

/// Dense voxel volume with axes (width, depth, height).
///
/// Width and depth are the columns and rows of the source slices, height
/// is the slice index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Volume {
    pub data: Array3<u16>,
    /// Voxel spacing along (width, depth, height)
    pub spacing: (f32, f32, f32),
}

impl Volume {
    pub fn new(data: Array3<u16>, spacing: (f32, f32, f32)) -> Self {
        Self { data, spacing }
    }

    /// Get the dimensions of the volume (width, depth, height)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<u16> {
        &self.data
    }

    /// Get a mutable reference to the underlying data
    pub fn data_mut(&mut self) -> &mut Array3<u16> {
        &mut self.data
    }

    pub fn spacing(&self) -> (f32, f32, f32) {
        self.spacing
    }

    pub fn extent(&self) -> Extent {
        let (width, depth, height) = self.dim();
        Extent {
            width,
            depth,
            height,
        }
    }

    /// Contiguous buffer and extents for a renderer. `None` if the data is
    /// not in standard layout (only after external mutation through
    /// [`Volume::data_mut`]).
    pub fn as_import(&self) -> Option<VolumeImport<'_>> {
        Some(VolumeImport {
            samples: self.data.as_slice()?,
            extent: self.extent(),
        })
    }

    pub fn get_slice_from_axis(
        &self,
        index: usize,
        orientation: Orientation,
    ) -> Option<ArrayView2<'_, u16>> {
        if !self.is_valid_index(index, orientation) {
            return None;
        }
        let slice = match orientation {
            Orientation::Axial => self.data.slice(s![.., .., index]),
            Orientation::Coronal => self.data.slice(s![.., index, ..]),
            Orientation::Sagittal => self.data.slice(s![index, .., ..]),
        };
        Some(slice)
    }

    /// 8 bit preview of one cut through the volume, windowed to the
    /// volume's sample range.
    ///
    /// The first axis of the cut becomes the image x axis, so an axial
    /// preview looks like the source slice.
    pub fn get_image_from_axis(&self, index: usize, orientation: Orientation) -> Option<GrayImage> {
        let slice = self.get_slice_from_axis(index, orientation)?;
        let (low, high) = self.sample_range()?;
        Self::slice_to_image(&slice, low, high)
    }

    fn sample_range(&self) -> Option<(u16, u16)> {
        let low = self.data.par_iter().copied().min()?;
        let high = self.data.par_iter().copied().max()?;
        Some((low, high))
    }

    #[inline]
    fn normalize_to_u8(value: u16, low: u16, high: u16) -> u8 {
        if high <= low {
            return 0;
        }
        let scaled = f32::from(value.saturating_sub(low)) / f32::from(high - low) * 255.0;
        scaled.round().clamp(0.0, 255.0) as u8
    }

    fn slice_to_image(slice: &ArrayView2<'_, u16>, low: u16, high: u16) -> Option<GrayImage> {
        let (width, height) = slice.dim();
        // Row-major copy so the flat buffer is in image (y, x) order
        let transposed = slice.t();
        let rows = transposed.as_standard_layout();
        let pixel_data: Vec<u8> = rows
            .as_slice()?
            .par_iter()
            .map(|&v| Self::normalize_to_u8(v, low, high))
            .collect();
        ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
    }

    fn is_valid_index(&self, index: usize, orientation: Orientation) -> bool {
        let (width, depth, height) = self.dim();
        let max_index = match orientation {
            Orientation::Axial => height,
            Orientation::Coronal => depth,
            Orientation::Sagittal => width,
        };
        index < max_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // width 3, depth 2, height 2
    fn volume() -> Volume {
        let data = Array3::from_shape_fn((3, 2, 2), |(x, y, k)| (k * 100 + y * 10 + x) as u16);
        Volume::new(data, (0.5, 0.5, 2.0))
    }

    #[test]
    fn import_is_c_ordered_with_height_fastest() {
        let volume = volume();
        let import = volume.as_import().unwrap();
        let (_, depth, height) = volume.dim();

        assert_eq!(import.samples.len(), import.extent.voxel_count());
        for ((x, y, k), &value) in volume.data().indexed_iter() {
            assert_eq!(import.samples[(x * depth + y) * height + k], value);
        }
    }

    #[test]
    fn axial_cut_is_a_source_slice() {
        let volume = volume();

        let slice = volume.get_slice_from_axis(1, Orientation::Axial).unwrap();

        assert_eq!(slice.t(), array![[100, 101, 102], [110, 111, 112]]);
    }

    #[test]
    fn cuts_have_expected_shapes() {
        let volume = volume();

        let coronal = volume.get_slice_from_axis(0, Orientation::Coronal).unwrap();
        let sagittal = volume.get_slice_from_axis(2, Orientation::Sagittal).unwrap();

        assert_eq!(coronal.dim(), (3, 2));
        assert_eq!(sagittal.dim(), (2, 2));
    }

    #[test]
    fn out_of_range_cut_is_none() {
        let volume = volume();

        assert!(volume.get_slice_from_axis(2, Orientation::Axial).is_none());
        assert!(volume.get_slice_from_axis(2, Orientation::Coronal).is_none());
        assert!(volume.get_slice_from_axis(3, Orientation::Sagittal).is_none());
        assert!(volume.get_image_from_axis(5, Orientation::Axial).is_none());
    }

    #[test]
    fn preview_is_windowed_to_sample_range() {
        let volume = volume();

        let first = volume.get_image_from_axis(0, Orientation::Axial).unwrap();
        let last = volume.get_image_from_axis(1, Orientation::Axial).unwrap();

        assert_eq!(first.dimensions(), (3, 2));
        assert_eq!(first.get_pixel(0, 0).0, [0]);
        assert_eq!(last.get_pixel(2, 1).0, [255]);
        // 101 of 0..=112
        assert_eq!(last.get_pixel(1, 0).0, [230]);
    }

    #[test]
    fn preview_pixels_follow_cut_axes() {
        let volume = volume();

        for (orientation, index) in [
            (Orientation::Axial, 1),
            (Orientation::Coronal, 1),
            (Orientation::Sagittal, 2),
        ] {
            let slice = volume.get_slice_from_axis(index, orientation).unwrap();
            let image = volume.get_image_from_axis(index, orientation).unwrap();

            assert_eq!(image.dimensions(), (slice.dim().0 as u32, slice.dim().1 as u32));
            for ((x, y), &value) in slice.indexed_iter() {
                assert_eq!(
                    image.get_pixel(x as u32, y as u32).0,
                    [Volume::normalize_to_u8(value, 0, 112)],
                    "{orientation:?} pixel ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn flat_volume_previews_black() {
        let volume = Volume::new(Array3::from_elem((2, 2, 1), 42), (1.0, 1.0, 1.0));

        let image = volume.get_image_from_axis(0, Orientation::Axial).unwrap();

        assert!(image.pixels().all(|pixel| pixel.0 == [0]));
    }
}
