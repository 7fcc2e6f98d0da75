//! bag2img - Extract geotagged imagery from ROS1 .bag survey logs
//!
//! This library turns a multi-sensor survey bag (camera frames, RTK-GPS
//! fixes, exposure-time telemetry) into per-frame images carrying position
//! and exposure metadata. Raw frames from mosaic hyperspectral sensors are
//! demosaiced into band cubes before emission.
//!
//! # Features
//!
//! - **Telemetry**: piecewise-linear interpolation of sparsely-sampled
//!   position and exposure streams at arbitrary frame timestamps
//! - **Cameras**: schema-exact per-camera descriptors with optional mosaic
//!   filter geometry
//! - **Mosaic reconstruction**: band-interleave reversal into an
//!   `ndarray` band cube
//! - **Annotation**: capture time with sub-second remainder, interpolated
//!   GPS triple, exposure with static-default fallback, EXIF-style
//!   degree/minute/second rational encoding
//! - **Sinks**: pluggable frame output; the bundled sink writes 16-bit
//!   PNGs plus JSON metadata sidecars
//!
//! # Example
//!
//! ```rust,no_run
//! use bag2img::{extract_bag, ExtractOptions};
//!
//! let options = ExtractOptions {
//!     bag_path: "survey.bag".to_string(),
//!     output_dir: "out".to_string(),
//!     camera_cfg_dir: "cfg/cameras".to_string(),
//!     rtk_topic: "/ssf/dji_sdk/rtk_position".to_string(),
//!     timezone_hours: 2,
//!     cameras: vec![],
//!     exposure_topics: vec![],
//!     dry_run: false,
//!     show_progress: true,
//! };
//!
//! extract_bag(&options)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod annotate;
pub mod bag_io;
pub mod camera;
pub mod cli;
pub mod extract;
pub mod mosaic;
pub mod msgs;
pub mod sink;
pub mod telemetry;

// Re-export main types for convenience
pub use annotate::{annotate, FrameMetadata};
pub use camera::{CameraProfile, FilterGeometry, SensorClass};
pub use extract::{extract_bag, extract_bag_with_sink, ExtractOptions};
pub use mosaic::reconstruct;
pub use sink::{FramePixels, FrameSink, ImageDirSink};
pub use telemetry::TelemetrySeries;
