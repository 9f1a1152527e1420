use crate::{
    enums::SortBy,
    slice_decoder::{SliceDecoder, SliceError},
    volume::Volume,
};

use glob::{MatchOptions, glob_with};
use log::{debug, info};
use ndarray::{Array2, Array3, s};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No slice files found")]
    EmptyInput,

    #[error("Failed to decode slice {}: {source}", path.display())]
    Decode { path: PathBuf, source: SliceError },

    #[error(
        "Slice {} has shape {found:?} (width, depth), expected {expected:?}",
        path.display()
    )]
    ShapeMismatch {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Unreadable path while matching pattern: {0}")]
    Glob(#[from] glob::GlobError),
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from every file matching a glob pattern
    ///
    /// # Arguments
    ///
    /// * `pattern` - Shell-style glob, e.g. `scans/*.tif`
    /// * `decoder` - Adapter for the slice file format
    /// * `sort_by` - Order of the slices along the height axis
    ///
    /// # Errors
    ///
    /// Fails if nothing matches, a slice cannot be decoded or a slice
    /// differs in shape from the first one. No partial volume is returned.
    pub fn load<D: SliceDecoder + ?Sized>(
        pattern: &str,
        decoder: &D,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        // `*` does not match a leading dot, as in a shell
        let options = MatchOptions {
            require_literal_leading_dot: true,
            ..MatchOptions::new()
        };
        let mut paths = glob_with(pattern, options)?.collect::<Result<Vec<_>, _>>()?;
        debug!("{} files match {pattern}", paths.len());

        sort_slice_paths(&mut paths, sort_by);
        Self::load_from_paths(&paths, decoder)
    }

    /// Load a volume from a glob pattern, stacking files in lexicographic
    /// path order
    pub fn load_from_pattern<D: SliceDecoder + ?Sized>(
        pattern: &str,
        decoder: &D,
    ) -> Result<Volume, VolumeLoaderError> {
        Self::load(pattern, decoder, SortBy::Lexicographic)
    }

    /// Load a volume from slice files that are already in stacking order
    pub fn load_from_paths<D: SliceDecoder + ?Sized>(
        paths: &[impl AsRef<Path>],
        decoder: &D,
    ) -> Result<Volume, VolumeLoaderError> {
        let first_path: &Path = paths
            .first()
            .ok_or(VolumeLoaderError::EmptyInput)?
            .as_ref();
        debug!("Decoding slice {}", first_path.display());
        let (first_image, spacing) = decoder
            .decode_with_spacing(first_path)
            .map_err(|source| VolumeLoaderError::Decode {
                path: first_path.to_path_buf(),
                source,
            })?;

        let (width, depth) = first_image.t().dim();
        let height = paths.len();
        info!("Volume data: {width}W {height}H {depth}D");

        let mut volume_array = Array3::<u16>::zeros((width, depth, height));
        volume_array
            .slice_mut(s![.., .., 0])
            .assign(&first_image.t());

        for (index, path) in paths.iter().enumerate().skip(1) {
            let path: &Path = path.as_ref();
            let image = Self::decode_slice(path, decoder)?;
            let layer = image.t();
            if layer.dim() != (width, depth) {
                return Err(VolumeLoaderError::ShapeMismatch {
                    path: path.to_path_buf(),
                    expected: (width, depth),
                    found: layer.dim(),
                });
            }
            volume_array.slice_mut(s![.., .., index]).assign(&layer);
        }

        Ok(Volume::new(volume_array, spacing.unwrap_or((1.0, 1.0, 1.0))))
    }

    fn decode_slice<D: SliceDecoder + ?Sized>(
        path: &Path,
        decoder: &D,
    ) -> Result<Array2<u16>, VolumeLoaderError> {
        debug!("Decoding slice {}", path.display());
        decoder
            .decode(path)
            .map_err(|source| VolumeLoaderError::Decode {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Sort slice paths into stacking order. The sort is stable.
pub fn sort_slice_paths(paths: &mut [PathBuf], sort_by: SortBy) {
    match sort_by {
        SortBy::Lexicographic => paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str())),
        SortBy::FileNumber => paths.sort_by_cached_key(|path| {
            let number = file_number(path).map_or((true, 0), |number| (false, number));
            (number, path.as_os_str().to_owned())
        }),
    }
}

/// Last run of ASCII digits in the file stem.
fn file_number(path: &Path) -> Option<u128> {
    let stem = path.file_stem()?.to_str()?;
    let end = stem.rfind(|c: char| c.is_ascii_digit())? + 1;
    let start = stem[..end]
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(0, |(index, c)| index + c.len_utf8());
    stem[start..end].parse().ok()
}
