//! Session orchestration: discover cameras in a bag, build telemetry
//! series, and drive per-frame annotation and reconstruction.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array2;
use rosbag::ChunkRecord;

use crate::annotate::annotate;
use crate::bag_io::{self, Catalogue};
use crate::camera::CameraProfile;
use crate::mosaic;
use crate::msgs::{self, ImageMsg};
use crate::sink::{FramePixels, FrameSink, ImageDirSink};
use crate::telemetry::TelemetrySeries;

/// Options for extracting geotagged imagery from a bag.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Path to the input .bag file
    pub bag_path: String,
    /// Output directory (one sub-directory per camera)
    pub output_dir: String,
    /// Camera configuration directory
    pub camera_cfg_dir: String,
    /// Topic carrying RTK-GPS fixes (shared by all cameras)
    pub rtk_topic: String,
    /// Whole-hour time-zone offset applied to capture times
    pub timezone_hours: i32,
    /// Restrict extraction to these camera names (empty means all discovered)
    pub cameras: Vec<String>,
    /// Per-camera exposure streams: CAMERA=/topic
    pub exposure_topics: Vec<String>,
    /// Dry run: report the plan but decode and write nothing
    pub dry_run: bool,
    /// Show progress bar
    pub show_progress: bool,
}

#[derive(Default)]
struct Stats {
    cameras: u64,
    frames: u64,
    cubes: u64,
    planar: u64,
    parse_errors: u64,
    skipped_encoding: u64,
    geometry_errors: u64,
}

/// Extract a bag into per-frame images under `output_dir` using the bundled
/// [`ImageDirSink`].
pub fn extract_bag(options: &ExtractOptions) -> Result<()> {
    let mut sink = ImageDirSink::new(&options.output_dir);
    extract_bag_with_sink(options, &mut sink)
}

/// Extract a bag, handing every annotated frame to `sink`.
pub fn extract_bag_with_sink(options: &ExtractOptions, sink: &mut dyn FrameSink) -> Result<()> {
    let bag = bag_io::open_bag(&options.bag_path)?;
    let chunks = bag_io::collect_chunks(&bag)?;
    let catalogue = bag_io::collect_catalogue(&chunks)?;
    let topics = bag_io::topic_set(&catalogue);

    let (mut profiles, failures) =
        CameraProfile::discover(Path::new(&options.camera_cfg_dir), &topics)?;
    for failure in &failures {
        tracing::error!(error = %failure, "camera setup failed; other cameras continue");
    }
    if !options.cameras.is_empty() {
        profiles.retain(|p| options.cameras.contains(&p.name));
    }
    if profiles.is_empty() {
        bail!("no configured camera matches the bag topics");
    }

    // The position series is mandatory: without it no frame can be
    // geotagged, so an empty RTK stream aborts before any camera runs.
    let position = build_position_series(&chunks, &catalogue, &options.rtk_topic)?;
    let exposure_topics = parse_exposure_topics(&options.exposure_topics)?;

    let pb = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner} {pos} frames").unwrap());
        Some(pb)
    } else {
        None
    };

    let mut stats = Stats::default();
    for profile in &profiles {
        stats.cameras += 1;
        let exposure =
            build_exposure_series(&chunks, &catalogue, profile, &exposure_topics, &topics)?;

        // A statically broken filter pattern disables reconstruction for
        // this camera only; its frames are still emitted planar.
        let filter = match profile.filter {
            Some(geom) => match mosaic::pattern_side(&geom) {
                Ok(_) => Some(geom),
                Err(err) => {
                    tracing::error!(camera = %profile.name, error = %err, "invalid filter geometry; emitting planar frames");
                    stats.geometry_errors += 1;
                    None
                }
            },
            None => None,
        };

        let frames = bag_io::read_topic(&chunks, &catalogue, &profile.image_topic)?;
        for (frame_index, (stamp_ns, payload)) in frames.iter().enumerate() {
            stats.frames += 1;
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            if options.dry_run {
                continue;
            }

            let img = match msgs::parse_image(payload) {
                Ok(img) => img,
                Err(err) => {
                    tracing::warn!(camera = %profile.name, error = %err, "failed to parse image message; skipping");
                    stats.parse_errors += 1;
                    continue;
                }
            };
            let Some(frame) = decode_mono(&img) else {
                tracing::warn!(camera = %profile.name, encoding = %img.encoding, "unsupported encoding; skipping");
                stats.skipped_encoding += 1;
                continue;
            };

            let meta = annotate(
                *stamp_ns,
                options.timezone_hours,
                &position,
                exposure.as_ref(),
                profile.default_exposure_ms,
            );

            let pixels = match filter {
                Some(geom) => match mosaic::reconstruct(&frame, &geom) {
                    Ok(cube) => {
                        stats.cubes += 1;
                        FramePixels::Cube(cube)
                    }
                    Err(err) => {
                        tracing::warn!(camera = %profile.name, error = %err, "reconstruction failed; emitting planar frame");
                        stats.geometry_errors += 1;
                        stats.planar += 1;
                        FramePixels::Planar(frame)
                    }
                },
                None => {
                    stats.planar += 1;
                    FramePixels::Planar(frame)
                }
            };

            sink.write_frame(profile, frame_index, &pixels, &meta)?;
        }
    }

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    println!(
        "Plan: {} cameras, {} frames → output: {}",
        stats.cameras, stats.frames, options.output_dir
    );
    if !options.dry_run {
        eprintln!(
            "[bag2img][stats] cameras={} frames={} cubes={} planar={} parse_errors={} skipped_encoding={} geometry_errors={}",
            stats.cameras,
            stats.frames,
            stats.cubes,
            stats.planar,
            stats.parse_errors,
            stats.skipped_encoding,
            stats.geometry_errors
        );
    }
    Ok(())
}

fn build_position_series(
    chunks: &[ChunkRecord<'_>],
    catalogue: &Catalogue,
    rtk_topic: &str,
) -> Result<TelemetrySeries> {
    let mut samples = Vec::new();
    for (stamp, payload) in bag_io::read_topic(chunks, catalogue, rtk_topic)? {
        match msgs::parse_navsatfix(payload) {
            Ok(fix) => {
                if fix.status < 0 {
                    tracing::warn!(topic = %rtk_topic, "GPS fix status < 0; sample skipped");
                    continue;
                }
                samples.push((stamp, [fix.latitude, fix.longitude, fix.altitude]));
            }
            Err(err) => {
                tracing::warn!(topic = %rtk_topic, error = %err, "failed to parse NavSatFix; sample skipped");
            }
        }
    }
    TelemetrySeries::from_samples(rtk_topic, 3, samples).with_context(|| {
        format!(
            "no RTK-GPS fixes found; check the topic '{rtk_topic}' for correctness and verify it is not empty"
        )
    })
}

/// Build the exposure series for one camera, or fall back to its static
/// default. A missing or empty stream is a per-camera degradation, never a
/// session failure.
fn build_exposure_series(
    chunks: &[ChunkRecord<'_>],
    catalogue: &Catalogue,
    profile: &CameraProfile,
    exposure_topics: &HashMap<String, String>,
    topics: &std::collections::HashSet<String>,
) -> Result<Option<TelemetrySeries>> {
    let Some(topic) = exposure_topics.get(&profile.name) else {
        tracing::debug!(camera = %profile.name, "no exposure topic declared; using the static default");
        return Ok(None);
    };
    if !topics.contains(topic) {
        tracing::warn!(
            camera = %profile.name,
            topic = %topic,
            "exposure topic not in bag; exposure falls back to the static default"
        );
        return Ok(None);
    }

    let mut samples = Vec::new();
    for (stamp, payload) in bag_io::read_topic(chunks, catalogue, topic)? {
        match msgs::parse_float64(payload) {
            Ok(exposure_ms) => samples.push((stamp, [exposure_ms])),
            Err(err) => {
                tracing::warn!(topic = %topic, error = %err, "failed to parse exposure message; sample skipped");
            }
        }
    }
    match TelemetrySeries::from_samples(topic, 1, samples) {
        Ok(series) => Ok(Some(series)),
        Err(_) => {
            tracing::warn!(
                camera = %profile.name,
                topic = %topic,
                "exposure stream is empty; exposure falls back to the static default"
            );
            Ok(None)
        }
    }
}

fn parse_exposure_topics(entries: &[String]) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for entry in entries {
        let Some((camera, topic)) = entry.split_once('=') else {
            bail!("invalid exposure topic mapping '{entry}' (expected CAMERA=/topic)");
        };
        map.insert(camera.trim().to_string(), topic.trim().to_string());
    }
    Ok(map)
}

/// Decode a mono ROS image payload into a 2-D frame; `None` for encodings
/// this pipeline does not handle.
fn decode_mono(img: &ImageMsg<'_>) -> Option<Array2<u16>> {
    let pixels = img.height * img.width;
    match img.encoding.as_str() {
        "mono8" => {
            if img.data.len() < pixels {
                return None;
            }
            let raw: Vec<u16> = img.data[..pixels].iter().map(|&v| v as u16).collect();
            Array2::from_shape_vec((img.height, img.width), raw).ok()
        }
        "mono16" => {
            if img.data.len() < pixels * 2 {
                return None;
            }
            let raw: Vec<u16> = img.data[..pixels * 2]
                .chunks_exact(2)
                .map(|b| u16::from_le_bytes([b[0], b[1]]))
                .collect();
            Array2::from_shape_vec((img.height, img.width), raw).ok()
        }
        _ => None,
    }
}
