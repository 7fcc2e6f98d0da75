use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod annotate;
mod bag_io;
mod camera;
mod cli;
mod extract;
mod mosaic;
mod msgs;
mod sink;
mod telemetry;

use cli::{Cli, Commands};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

fn list_cameras(cfg_dir: &str) -> Result<()> {
    let (profiles, failures) = camera::CameraProfile::resolve_all(std::path::Path::new(cfg_dir))?;
    for failure in &failures {
        eprintln!("[bag2img][error] {failure}");
    }

    println!("{:<20} {:<15} {:<25} {:<10} {:<8} {}", "Camera", "Make", "Model", "Class", "Bands", "Image topic");
    println!("{}", "-".repeat(100));
    for profile in profiles {
        let class = match profile.sensor_class {
            camera::SensorClass::Standard => "standard",
            camera::SensorClass::Mosaic => "mosaic",
        };
        let bands = profile
            .filter
            .map(|f| f.band_count().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:<15} {:<25} {:<10} {:<8} {}",
            profile.name, profile.make, profile.model, class, bands, profile.image_topic
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect { bag } => bag_io::inspect_bag(&bag),
        Commands::Cameras { cfg_dir } => list_cameras(&cfg_dir),
        Commands::Extract {
            bag,
            out,
            cfg_dir,
            rtk_topic,
            timezone,
            camera,
            exposure_topic,
            dry_run,
            progress,
        } => {
            let options = extract::ExtractOptions {
                bag_path: bag,
                output_dir: out,
                camera_cfg_dir: cfg_dir,
                rtk_topic,
                timezone_hours: timezone,
                cameras: camera,
                exposure_topics: exposure_topic,
                dry_run,
                show_progress: progress,
            };
            extract::extract_bag(&options)
        }
    }
}
