//! Write a synthetic sphere volume
//!
//! The volume carries two fields: `distance`, the distance from the grid
//! center minus the radius (zero on the sphere), and `temperature`, a smooth
//! falloff that peaks at the center.

use anyhow::{ensure, Context};
use clap::Parser;
use isovox_core::{Point3f, Volume};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Generate a signed-distance sphere as a VTK volume")]
struct Args {
    /// Output file (.vtk)
    out: PathBuf,

    /// Grid points per axis
    #[arg(long, default_value_t = 32)]
    size: usize,

    /// Sphere radius as a fraction of the half-extent
    #[arg(long, default_value_t = 0.6)]
    radius: f32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    ensure!(args.size >= 2, "size must be at least 2, got {}", args.size);
    ensure!(args.radius > 0.0, "radius must be positive, got {}", args.radius);

    let n = args.size;
    let spacing = 2.0 / (n - 1) as f32;
    let origin = Point3f::new(-1.0, -1.0, -1.0);
    let radius = args.radius;

    let position = |i: usize, j: usize, k: usize| {
        Point3f::new(
            origin.x + i as f32 * spacing,
            origin.y + j as f32 * spacing,
            origin.z + k as f32 * spacing,
        )
    };

    let mut volume = Volume::from_fn([n; 3], [spacing; 3], origin, "distance", |i, j, k| {
        position(i, j, k).coords.magnitude() - radius
    })?;

    let mut temperature = Vec::with_capacity(volume.point_count());
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let r2 = position(i, j, k).coords.magnitude_squared();
                temperature.push(300.0 + 100.0 * (-r2 / (radius * radius)).exp());
            }
        }
    }
    volume.add_field("temperature", temperature)?;

    isovox_io::write_volume(&volume, &args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    log::info!(
        "Wrote {}^3 sphere volume (radius {}) to {}",
        n,
        radius,
        args.out.display()
    );

    Ok(())
}
