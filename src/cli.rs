use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bag2img", about = "Extract geotagged imagery from ROS1 bag survey logs", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List topics, types, message counts and time span of a bag
    Inspect {
        /// Path to the .bag file
        bag: String,
    },

    /// List the camera profiles resolvable from a configuration directory
    Cameras {
        /// Camera configuration directory
        #[arg(default_value = "cfg/cameras")]
        cfg_dir: String,
    },

    /// Extract annotated per-frame images (band cubes for mosaic sensors)
    Extract {
        /// Path to the .bag file
        bag: String,
        /// Output directory (one sub-directory per camera)
        out: String,
        /// Camera configuration directory
        #[arg(long = "cfg-dir", default_value = "cfg/cameras")]
        cfg_dir: String,
        /// Topic carrying RTK-GPS position fixes
        #[arg(long = "rtk-topic", default_value = "/ssf/dji_sdk/rtk_position")]
        rtk_topic: String,
        /// Whole-hour time-zone offset applied to capture times
        #[arg(long = "timezone", default_value_t = 2, allow_hyphen_values = true)]
        timezone: i32,
        /// Extract only these cameras (can be repeated)
        #[arg(long = "camera", action = ArgAction::Append)]
        camera: Vec<String>,
        /// Exposure-time stream for a camera: CAMERA=/topic (can be repeated)
        #[arg(long = "exposure-topic", action = ArgAction::Append)]
        exposure_topic: Vec<String>,
        /// Dry-run: report the plan but do not decode or write images
        #[arg(long = "dry-run")]
        dry_run: bool,
        /// Show progress bar (enabled by default)
        #[arg(long = "progress", action = ArgAction::SetTrue, default_value_t = true)]
        progress: bool,
    },
}
