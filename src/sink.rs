//! Frame output: the sink seam the session hands annotated frames to, plus
//! the bundled image-directory implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ndarray::{s, Array2, Array3};
use serde_json::json;

use crate::annotate::{
    altitude_rational, altitude_ref, exposure_rational, latitude_ref, longitude_ref, to_dms,
    FrameMetadata, Rational, SECONDS_PRECISION,
};
use crate::camera::CameraProfile;

/// Pixel payload of one annotated frame.
#[derive(Debug)]
pub enum FramePixels {
    /// Planar single-channel frame (standard sensors, or mosaic sensors
    /// whose geometry is unresolved).
    Planar(Array2<u16>),
    /// Demosaiced band cube, `(rows, cols, bands)`.
    Cube(Array3<u16>),
}

/// Consumer of annotated frames. The extraction core computes pixels and
/// metadata; persistence stays behind this seam.
pub trait FrameSink {
    fn write_frame(
        &mut self,
        camera: &CameraProfile,
        frame_index: usize,
        pixels: &FramePixels,
        meta: &FrameMetadata,
    ) -> Result<()>;
}

/// Writes one 16-bit grayscale PNG per frame (one per band for cubes) into
/// `<root>/<camera>/`, with a JSON metadata sidecar carrying EXIF-shaped
/// keys.
pub struct ImageDirSink {
    root: PathBuf,
}

impl ImageDirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn camera_dir(&self, camera: &CameraProfile) -> Result<PathBuf> {
        let dir = self.root.join(&camera.name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output dir {}", dir.display()))?;
        Ok(dir)
    }
}

impl FrameSink for ImageDirSink {
    fn write_frame(
        &mut self,
        camera: &CameraProfile,
        frame_index: usize,
        pixels: &FramePixels,
        meta: &FrameMetadata,
    ) -> Result<()> {
        let dir = self.camera_dir(camera)?;
        let stem = format!("frame_{frame_index:06}");

        match pixels {
            FramePixels::Planar(frame) => {
                save_gray16(&dir.join(format!("{stem}.png")), frame)?;
            }
            FramePixels::Cube(cube) => {
                let bands = cube.dim().2;
                for band in 0..bands {
                    let plane = cube.slice(s![.., .., band]).to_owned();
                    save_gray16(&dir.join(format!("{stem}_band{band:02}.png")), &plane)?;
                }
            }
        }

        let sidecar = sidecar_json(camera, meta);
        let sidecar_path = dir.join(format!("{stem}.json"));
        fs::write(&sidecar_path, serde_json::to_string_pretty(&sidecar)?)
            .with_context(|| format!("failed to write {}", sidecar_path.display()))?;
        Ok(())
    }
}

fn save_gray16(path: &Path, frame: &Array2<u16>) -> Result<()> {
    let (height, width) = frame.dim();
    let raw: Vec<u16> = frame.iter().copied().collect();
    let buffer = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_raw(
        width as u32,
        height as u32,
        raw,
    )
    .expect("row-major buffer matches frame dimensions");
    buffer
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn dms_string(decimal_degrees: f64) -> String {
    let dms = to_dms(decimal_degrees, SECONDS_PRECISION);
    format!("{}/1 {}/1 {}", dms.degrees, dms.minutes, dms.seconds)
}

fn sidecar_json(camera: &CameraProfile, meta: &FrameMetadata) -> serde_json::Value {
    json!({
        "Exif.Image.Make": camera.make,
        "Exif.Image.Model": camera.model,
        "Exif.Photo.FocalLength": Rational::new((camera.focal_length_mm * 100.0) as i64, 100).to_string(),
        "Exif.Photo.DateTimeOriginal": meta.capture_time,
        "Exif.Photo.SubSecTimeOriginal": meta.capture_subsec,
        "Exif.Photo.ExposureTime": exposure_rational(meta.exposure_ms).to_string(),
        "Exif.GPSInfo.GPSLatitude": dms_string(meta.latitude),
        "Exif.GPSInfo.GPSLatitudeRef": latitude_ref(meta.latitude).to_string(),
        "Exif.GPSInfo.GPSLongitude": dms_string(meta.longitude),
        "Exif.GPSInfo.GPSLongitudeRef": longitude_ref(meta.longitude).to_string(),
        "Exif.GPSInfo.GPSAltitude": altitude_rational(meta.altitude).to_string(),
        "Exif.GPSInfo.GPSAltitudeRef": altitude_ref(meta.altitude).to_string(),
    })
}
