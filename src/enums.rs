/// Fixed axis of a cut through a [`Volume`](crate::volume::Volume).
///
/// Volumes are laid out as (width, depth, height), where height is the
/// slice index, so `Axial` returns one of the original slices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Axial,
    Coronal,
    Sagittal,
}

/// Order in which matched slice files are stacked along the height axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Byte-wise order of the full path string. `s10` sorts before `s2`,
    /// so slice numbers must be zero padded.
    #[default]
    Lexicographic,
    /// Last run of digits in the file name, ascending. Names without
    /// digits go last.
    FileNumber,
}
