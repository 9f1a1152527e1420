use std::{error::Error, path::PathBuf};

use clap::{Parser, ValueEnum};
use log::info;
use slice_volume::{
    enums::{Orientation, SortBy},
    gpu_volume::GpuUploader,
    render::{RenderCollaborator, RenderSettings},
    slice_decoder::{BitmapSlices, DicomSlices, SliceDecoder},
    volume_loader::VolumeLoader,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Bitmap,
    Dicom,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Order {
    Lexicographic,
    FileNumber,
}

impl From<Order> for SortBy {
    fn from(order: Order) -> Self {
        match order {
            Order::Lexicographic => SortBy::Lexicographic,
            Order::FileNumber => SortBy::FileNumber,
        }
    }
}

/// Load a stack of slice images into a 3D volume
#[derive(Parser, Debug)]
#[command(author, about, version, long_about)]
struct Args {
    /// glob selecting the slice files
    #[arg(short, long, default_value = "assets/volumes/MRBrain/*.tif")]
    pattern: String,

    /// slice file format
    #[arg(short, long, value_enum, default_value_t = Format::Bitmap)]
    format: Format,

    /// stacking order of the matched files
    #[arg(short, long, value_enum, default_value_t = Order::Lexicographic)]
    sort: Order,

    /// fail on truncated bitmap slices instead of zero filling them
    #[arg(long)]
    strict: bool,

    /// apply the DICOM rescale slope and intercept
    #[arg(long)]
    rescale: bool,

    /// write the center axial slice as an 8 bit PNG
    #[arg(long)]
    preview: Option<PathBuf>,

    /// upload the volume into a GPU 3D texture
    #[arg(long)]
    gpu: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let decoder: Box<dyn SliceDecoder> = match args.format {
        Format::Bitmap => Box::new(BitmapSlices {
            tolerate_truncation: !args.strict,
        }),
        Format::Dicom => Box::new(DicomSlices {
            apply_modality_lut: args.rescale,
        }),
    };
    let volume = VolumeLoader::load(&args.pattern, decoder.as_ref(), args.sort.into())?;
    let extent = volume.extent();
    info!(
        "Extents {:?}, spacing {:?}",
        extent.max_index(),
        volume.spacing()
    );

    if let Some(path) = &args.preview {
        let image = volume
            .get_image_from_axis(extent.height / 2, Orientation::Axial)
            .ok_or("volume has no center slice")?;
        image.save(path)?;
        info!("Preview written to {}", path.display());
    }

    if args.gpu {
        let import = volume
            .as_import()
            .ok_or("volume buffer is not contiguous")?;
        let mut uploader = GpuUploader::new().await?;
        uploader.present(import, &RenderSettings::default())?;
        if let Some(gpu_volume) = uploader.volume() {
            info!("GPU texture size {:?}", gpu_volume.size);
        }
    }

    Ok(())
}
