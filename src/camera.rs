//! Camera configuration store: per-camera descriptors and mosaic filter
//! geometry.
//!
//! The configuration directory holds one sub-directory per camera:
//!
//! ```text
//! cfg/cameras/
//!   photonfocus_nir/
//!     photonfocus_nir.json    # required descriptor
//!     geometry.json           # mosaic sensors only, optional
//!   sony_rgb/
//!     sony_rgb.json
//! ```
//!
//! Descriptors are schema-exact: a field set that does not match the
//! expected one is rejected rather than silently merged.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no camera configuration found under '{}'", .0.display())]
    ConfigurationMissing(PathBuf),
    #[error("camera '{camera}': invalid descriptor: {reason}")]
    InvalidProfile { camera: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorClass {
    Standard,
    Mosaic,
}

/// Spatial filter layout of a mosaic sensor.
///
/// `height`/`width` bound the valid filter region on the raw frame,
/// `offset_x`/`offset_y` locate its top-left corner, and the repeating
/// pattern spans `pattern_width * pattern_height` spectral bands.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterGeometry {
    pub height: usize,
    pub width: usize,
    pub offset_x: usize,
    pub offset_y: usize,
    pub pattern_width: usize,
    pub pattern_height: usize,
}

impl FilterGeometry {
    pub fn band_count(&self) -> usize {
        self.pattern_width * self.pattern_height
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileDescriptor {
    make: String,
    model: String,
    sensor_class: SensorClass,
    focal_length_mm: f64,
    image_topic: String,
    default_exposure_ms: f64,
}

/// Static per-camera description, read-only once resolved.
#[derive(Debug, Clone)]
pub struct CameraProfile {
    pub name: String,
    pub make: String,
    pub model: String,
    pub sensor_class: SensorClass,
    pub focal_length_mm: f64,
    pub image_topic: String,
    pub default_exposure_ms: f64,
    /// Resolved filter geometry; `None` for standard sensors and for mosaic
    /// sensors whose auxiliary descriptor is absent (reconstruction is then
    /// skipped for that camera).
    pub filter: Option<FilterGeometry>,
}

impl CameraProfile {
    /// Load the profile for one camera directory.
    ///
    /// The directory name is the camera name and must contain
    /// `<name>.json`. Mosaic cameras additionally resolve `geometry.json`;
    /// its absence degrades to `filter: None` with a warning, one camera's
    /// missing calibration must not abort the others.
    pub fn resolve(dir: &Path) -> Result<Self, ProfileError> {
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ProfileError::InvalidProfile {
                camera: dir.display().to_string(),
                reason: "directory name is not valid UTF-8".to_string(),
            })?
            .to_string();

        let descriptor_path = dir.join(format!("{name}.json"));
        let descriptor: ProfileDescriptor = read_schema_exact(&name, &descriptor_path)?;

        let filter = match descriptor.sensor_class {
            SensorClass::Standard => None,
            SensorClass::Mosaic => {
                let geometry_path = dir.join("geometry.json");
                if geometry_path.is_file() {
                    Some(read_schema_exact(&name, &geometry_path)?)
                } else {
                    tracing::warn!(
                        camera = %name,
                        "no geometry.json found; mosaic reconstruction will be skipped"
                    );
                    None
                }
            }
        };

        Ok(Self {
            name,
            make: descriptor.make,
            model: descriptor.model,
            sensor_class: descriptor.sensor_class,
            focal_length_mm: descriptor.focal_length_mm,
            image_topic: descriptor.image_topic,
            default_exposure_ms: descriptor.default_exposure_ms,
            filter,
        })
    }

    /// Resolve every camera directory under `cfg_dir`.
    ///
    /// A missing or camera-less configuration directory is a structural
    /// misconfiguration and fails the whole run. A camera with a broken
    /// descriptor fails its own setup only; the remaining cameras are still
    /// returned, alongside the per-camera failures.
    pub fn resolve_all(
        cfg_dir: &Path,
    ) -> Result<(Vec<CameraProfile>, Vec<ProfileError>), ProfileError> {
        let mut camera_dirs: Vec<PathBuf> = fs::read_dir(cfg_dir)
            .map_err(|_| ProfileError::ConfigurationMissing(cfg_dir.to_path_buf()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        if camera_dirs.is_empty() {
            return Err(ProfileError::ConfigurationMissing(cfg_dir.to_path_buf()));
        }
        camera_dirs.sort();

        let mut profiles = Vec::new();
        let mut failures = Vec::new();
        for dir in camera_dirs {
            match CameraProfile::resolve(&dir) {
                Ok(profile) => profiles.push(profile),
                Err(err) => failures.push(err),
            }
        }
        Ok((profiles, failures))
    }

    /// Enumerate cameras under `cfg_dir` whose image topic is present in the
    /// bag.
    pub fn discover(
        cfg_dir: &Path,
        topics: &HashSet<String>,
    ) -> Result<(Vec<CameraProfile>, Vec<ProfileError>), ProfileError> {
        let (mut profiles, failures) = Self::resolve_all(cfg_dir)?;
        profiles.retain(|profile| {
            let present = topics.contains(&profile.image_topic);
            if !present {
                tracing::debug!(
                    camera = %profile.name,
                    topic = %profile.image_topic,
                    "image topic not present in bag; camera skipped"
                );
            }
            present
        });
        Ok((profiles, failures))
    }
}

fn read_schema_exact<T: serde::de::DeserializeOwned>(
    camera: &str,
    path: &Path,
) -> Result<T, ProfileError> {
    let text = fs::read_to_string(path).map_err(|e| ProfileError::InvalidProfile {
        camera: camera.to_string(),
        reason: format!("cannot read {}: {e}", path.display()),
    })?;
    // deny_unknown_fields + non-optional fields: the field set must match
    // the schema exactly, extra and missing keys are both rejected.
    serde_json::from_str(&text).map_err(|e| ProfileError::InvalidProfile {
        camera: camera.to_string(),
        reason: format!("{}: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_camera(root: &Path, name: &str, descriptor: &str, geometry: Option<&str>) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        let mut f = fs::File::create(dir.join(format!("{name}.json"))).unwrap();
        f.write_all(descriptor.as_bytes()).unwrap();
        if let Some(geometry) = geometry {
            let mut g = fs::File::create(dir.join("geometry.json")).unwrap();
            g.write_all(geometry.as_bytes()).unwrap();
        }
        dir
    }

    const NIR: &str = r#"{
        "make": "Photonfocus",
        "model": "MV1-D2048x1088-HS02",
        "sensor_class": "mosaic",
        "focal_length_mm": 16.0,
        "image_topic": "/ssf/photonfocus_camera_nir_node/image_raw",
        "default_exposure_ms": 4.0
    }"#;

    const GEOMETRY: &str = r#"{
        "height": 1080, "width": 2040,
        "offset_x": 4, "offset_y": 4,
        "pattern_width": 5, "pattern_height": 5
    }"#;

    #[test]
    fn resolves_mosaic_profile_with_geometry() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_camera(tmp.path(), "photonfocus_nir", NIR, Some(GEOMETRY));
        let profile = CameraProfile::resolve(&dir).unwrap();
        assert_eq!(profile.name, "photonfocus_nir");
        assert_eq!(profile.sensor_class, SensorClass::Mosaic);
        let filter = profile.filter.expect("geometry should resolve");
        assert_eq!(filter.band_count(), 25);
        assert_eq!((filter.offset_x, filter.offset_y), (4, 4));
    }

    #[test]
    fn missing_geometry_degrades_to_none() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_camera(tmp.path(), "photonfocus_nir", NIR, None);
        let profile = CameraProfile::resolve(&dir).unwrap();
        assert!(profile.filter.is_none());
    }

    #[test]
    fn unknown_descriptor_field_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let with_extra = NIR.replace("\"make\"", "\"serial\": 7, \"make\"");
        let dir = write_camera(tmp.path(), "cam", &with_extra, None);
        let err = CameraProfile::resolve(&dir).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidProfile { .. }));
    }

    #[test]
    fn missing_descriptor_field_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let without_model = NIR.replace("\"model\": \"MV1-D2048x1088-HS02\",", "");
        let dir = write_camera(tmp.path(), "cam", &without_model, None);
        let err = CameraProfile::resolve(&dir).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidProfile { .. }));
    }

    #[test]
    fn discover_filters_on_bag_topics() {
        let tmp = tempfile::tempdir().unwrap();
        write_camera(tmp.path(), "photonfocus_nir", NIR, Some(GEOMETRY));
        write_camera(
            tmp.path(),
            "sony_rgb",
            r#"{
                "make": "Sony", "model": "A7", "sensor_class": "standard",
                "focal_length_mm": 35.0,
                "image_topic": "/sony/image_raw",
                "default_exposure_ms": 2.0
            }"#,
            None,
        );

        let topics: HashSet<String> =
            ["/ssf/photonfocus_camera_nir_node/image_raw".to_string()].into();
        let (profiles, failures) = CameraProfile::discover(tmp.path(), &topics).unwrap();
        assert!(failures.is_empty());
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "photonfocus_nir");
    }

    #[test]
    fn missing_config_dir_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nowhere");
        let err = CameraProfile::discover(&missing, &HashSet::new()).unwrap_err();
        assert!(matches!(err, ProfileError::ConfigurationMissing(_)));
    }

    #[test]
    fn broken_camera_does_not_abort_discovery() {
        let tmp = tempfile::tempdir().unwrap();
        write_camera(tmp.path(), "good", NIR, Some(GEOMETRY));
        write_camera(tmp.path(), "broken", "{ not json", None);

        let topics: HashSet<String> =
            ["/ssf/photonfocus_camera_nir_node/image_raw".to_string()].into();
        let (profiles, failures) = CameraProfile::discover(tmp.path(), &topics).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(failures.len(), 1);
    }
}
