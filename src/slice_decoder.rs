use dicom::{
    object::{DefaultDicomObject, ReadError, open_file},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder},
};
use dicom_dictionary_std::tags;
use image::{ColorType, ImageDecoder, ImageError, ImageReader};
use log::warn;
use ndarray::{Array2, s};
use std::{io, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SliceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Unsupported color type {0:?}, expected a single gray channel")]
    UnsupportedColor(ColorType),

    #[error("DICOM error: {0}")]
    Dicom(#[from] ReadError),

    #[error("Pixel data error: {0}")]
    PixelData(#[from] dicom::pixeldata::Error),

    #[error("{len} samples do not fill a {rows}x{columns} grid")]
    InvalidDimensions {
        rows: usize,
        columns: usize,
        len: usize,
    },
}

/// Per-format adapter turning one slice file into a grid of samples.
pub trait SliceDecoder {
    /// Decode the slice at `path` into a row-major (rows, columns) grid.
    fn decode(&self, path: &Path) -> Result<Array2<u16>, SliceError>;

    /// Decode a slice together with its voxel spacing along (columns, rows,
    /// slices), when the format records it. The file is read once.
    fn decode_with_spacing(
        &self,
        path: &Path,
    ) -> Result<(Array2<u16>, Option<(f32, f32, f32)>), SliceError> {
        Ok((self.decode(path)?, None))
    }
}

/// Raster images readable by the `image` crate (TIFF, PNG, ...).
///
/// Only gray images are accepted; an alpha channel is dropped.
#[derive(Clone, Copy, Debug)]
pub struct BitmapSlices {
    /// Keep the rows decoded before a truncated or corrupt tail instead of
    /// failing. Missing samples stay zero.
    pub tolerate_truncation: bool,
}

impl Default for BitmapSlices {
    fn default() -> Self {
        Self {
            tolerate_truncation: true,
        }
    }
}

impl SliceDecoder for BitmapSlices {
    fn decode(&self, path: &Path) -> Result<Array2<u16>, SliceError> {
        let decoder = ImageReader::open(path)?
            .with_guessed_format()?
            .into_decoder()?;
        let (columns, rows) = decoder.dimensions();
        let color = decoder.color_type();

        let mut buffer = vec![0u8; decoder.total_bytes() as usize];
        if let Err(error) = decoder.read_image(&mut buffer) {
            if !(self.tolerate_truncation && is_truncation(&error)) {
                return Err(error.into());
            }
            warn!(
                "Slice {} is truncated ({error}), keeping the decoded part",
                path.display()
            );
        }

        let samples = gray_samples(&buffer, color)?;
        into_grid(rows as usize, columns as usize, samples)
    }
}

fn is_truncation(error: &ImageError) -> bool {
    match error {
        ImageError::IoError(error) => error.kind() == io::ErrorKind::UnexpectedEof,
        ImageError::Decoding(_) => true,
        _ => false,
    }
}

// 16 bit buffers from `ImageDecoder::read_image` are native endian.
fn gray_samples(buffer: &[u8], color: ColorType) -> Result<Vec<u16>, SliceError> {
    let samples = match color {
        ColorType::L8 => buffer.iter().map(|&value| u16::from(value)).collect(),
        ColorType::La8 => buffer
            .chunks_exact(2)
            .map(|pixel| u16::from(pixel[0]))
            .collect(),
        ColorType::L16 => buffer
            .chunks_exact(2)
            .map(|bytes| u16::from_ne_bytes([bytes[0], bytes[1]]))
            .collect(),
        ColorType::La16 => buffer
            .chunks_exact(4)
            .map(|pixel| u16::from_ne_bytes([pixel[0], pixel[1]]))
            .collect(),
        other => return Err(SliceError::UnsupportedColor(other)),
    };
    Ok(samples)
}

fn into_grid(rows: usize, columns: usize, samples: Vec<u16>) -> Result<Array2<u16>, SliceError> {
    let len = samples.len();
    Array2::from_shape_vec((rows, columns), samples)
        .map_err(|_| SliceError::InvalidDimensions { rows, columns, len })
}

/// DICOM slices, one frame each. Multi-frame files contribute their first
/// frame only.
#[derive(Clone, Copy, Debug, Default)]
pub struct DicomSlices {
    /// Apply Rescale Slope/Intercept instead of returning stored values.
    pub apply_modality_lut: bool,
}

impl DicomSlices {
    fn first_frame(&self, dicom_object: &DefaultDicomObject) -> Result<Array2<u16>, SliceError> {
        let pixel_data = dicom_object.decode_pixel_data()?;
        let modality_lut = if self.apply_modality_lut {
            ModalityLutOption::Default
        } else {
            ModalityLutOption::None
        };
        let options = ConvertOptions::new().with_modality_lut(modality_lut);
        let frames = pixel_data.to_ndarray_with_options::<u16>(&options)?;
        Ok(frames.slice_move(s![0, .., .., 0]))
    }

    fn spacing(dicom_object: &DefaultDicomObject) -> Option<(f32, f32, f32)> {
        // PixelSpacing is (row spacing, column spacing)
        let pixel_spacing = dicom_object
            .element(tags::PIXEL_SPACING)
            .ok()?
            .to_multi_float32()
            .ok()?;
        let slice_thickness = dicom_object
            .element(tags::SLICE_THICKNESS)
            .ok()?
            .to_float32()
            .ok()?;

        Some((*pixel_spacing.get(1)?, *pixel_spacing.first()?, slice_thickness))
    }
}

impl SliceDecoder for DicomSlices {
    fn decode(&self, path: &Path) -> Result<Array2<u16>, SliceError> {
        let dicom_object = open_file(path)?;
        self.first_frame(&dicom_object)
    }

    fn decode_with_spacing(
        &self,
        path: &Path,
    ) -> Result<(Array2<u16>, Option<(f32, f32, f32)>), SliceError> {
        let dicom_object = open_file(path)?;
        let image = self.first_frame(&dicom_object)?;
        Ok((image, Self::spacing(&dicom_object)))
    }
}
