//! Inspect a structured volume
//!
//! Prints the grid layout and field ranges, extracts an isosurface and
//! optionally writes a colored slice as a PNG.
//!
//! ```text
//! cargo run --bin inspect_volume -- data/field.vtk --iso 0.5 --axis y --slice-out slice.png
//! ```

use anyhow::{anyhow, Context};
use clap::Parser;
use image::{ImageBuffer, Rgb as Rgb8};
use isovox_core::{ColorMap, Volume};
use isovox_extract::{
    current_num_threads, init_thread_pool, render_slice, MarchingCubes, MarchingCubesConfig,
    SliceAxis, SliceConfig, ThreadPoolConfig,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(about = "Inspect a VTK structured-points volume")]
struct Args {
    /// Input volume (.vtk)
    file: PathBuf,

    /// Field to use; defaults to the first declared field
    #[arg(long)]
    field: Option<String>,

    /// Isovalue; defaults to the middle of the field range
    #[arg(long)]
    iso: Option<f32>,

    /// Slice axis (x, y or z)
    #[arg(long, default_value = "z")]
    axis: SliceAxis,

    /// Normalized slice position along the axis
    #[arg(long, default_value_t = 0.5)]
    position: f32,

    /// Write the slice to this PNG file
    #[arg(long)]
    slice_out: Option<PathBuf>,

    /// Colormap name (viridis, coolwarm)
    #[arg(long, default_value = "viridis")]
    colormap: String,

    /// Worker threads; one per core when omitted
    #[arg(long)]
    threads: Option<usize>,

    /// Disable parallel processing
    #[arg(long)]
    serial: bool,
}

fn print_summary(volume: &Volume) {
    let [nx, ny, nz] = volume.dimensions();
    let spacing = volume.spacing();
    let origin = volume.origin();
    let size = volume.physical_size();

    println!("Dimensions: {} x {} x {} ({} points)", nx, ny, nz, volume.point_count());
    println!("Spacing:    {} {} {}", spacing[0], spacing[1], spacing[2]);
    println!("Origin:     {} {} {}", origin.x, origin.y, origin.z);
    println!("Extent:     {:.3} {:.3} {:.3}", size.x, size.y, size.z);
    println!("Fields:");
    for name in volume.field_names() {
        match volume.field(name).ok().and_then(|f| f.range()) {
            Some((lo, hi)) => println!("  {:<20} [{}, {}]", name, lo, hi),
            None => println!("  {:<20} (no finite values)", name),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let colormap = ColorMap::from_name(&args.colormap)
        .ok_or_else(|| anyhow!("unknown colormap '{}'", args.colormap))?;

    let mut pool = ThreadPoolConfig::default().with_enabled(!args.serial);
    if let Some(threads) = args.threads {
        pool = pool.with_threads(threads);
    }
    init_thread_pool(pool)?;
    log::info!("Using {} worker thread(s)", current_num_threads());

    let volume = isovox_io::read_volume(&args.file)
        .with_context(|| format!("failed to load {}", args.file.display()))?;
    print_summary(&volume);

    let field = volume.field_or_first(args.field.as_deref())?;
    if let Some(requested) = args.field.as_deref() {
        if requested != field.name() {
            log::warn!("Field '{}' not found, using '{}'", requested, field.name());
        }
    }

    let (lo, hi) = field
        .range()
        .ok_or_else(|| anyhow!("field '{}' has no finite values", field.name()))?;
    let isovalue = args.iso.unwrap_or((lo + hi) / 2.0);

    let config = MarchingCubesConfig::default()
        .with_parallel(!args.serial)
        .with_colormap(colormap);
    let start = Instant::now();
    let mesh = MarchingCubes::new(config).extract(&field, isovalue);
    println!(
        "\nIsosurface '{}' = {}: {} triangles in {:.2?}",
        field.name(),
        isovalue,
        mesh.triangle_count(),
        start.elapsed()
    );

    if let Some(out) = args.slice_out {
        let slice_config = SliceConfig::default()
            .with_parallel(!args.serial)
            .with_colormap(colormap);
        let image = render_slice(&field, args.axis, args.position, &slice_config);
        let (width, height) = (image.width as u32, image.height as u32);
        let buffer: ImageBuffer<Rgb8<u8>, Vec<u8>> =
            ImageBuffer::from_raw(width, height, image.to_rgb_bytes())
                .ok_or_else(|| anyhow!("slice buffer does not match {}x{}", width, height))?;
        buffer
            .save(&out)
            .with_context(|| format!("failed to write {}", out.display()))?;
        println!(
            "Slice {} at {:.2}: {}x{} written to {}",
            args.axis,
            args.position,
            width,
            height,
            out.display()
        );
    }

    Ok(())
}
