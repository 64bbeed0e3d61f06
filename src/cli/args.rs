//! Command-line surface.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::ConflictPolicy;

/// Convert, compress, resize, rotate and watermark raster images
#[derive(Parser, Debug)]
#[command(name = "image-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show per-file progress and debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Walk directories recursively in batch mode
    #[arg(long, global = true, value_name = "BOOL")]
    pub recursive: Option<bool>,

    /// Only take the direct children of a batch directory
    #[arg(long, global = true, conflicts_with = "recursive")]
    pub no_recursive: bool,

    /// What to do when the output exists: skip, overwrite or rename
    #[arg(long, global = true)]
    pub conflict: Option<ConflictPolicy>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The recursion override from `--recursive` / `--no-recursive`.
    pub fn recursive_override(&self) -> Option<bool> {
        if self.no_recursive {
            Some(false)
        } else {
            self.recursive
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert an image to another format
    Convert(ConvertArgs),
    /// Re-encode an image, optionally under a byte budget
    Compress(CompressArgs),
    /// Resize an image
    Resize(ResizeArgs),
    /// Rotate or mirror an image
    Rotate(RotateArgs),
    /// Add a logo or text watermark
    Watermark(WatermarkArgs),
    /// Run one operation over many files
    Batch {
        #[command(subcommand)]
        op: BatchOp,
    },
    /// List supported input and output formats
    Formats(FormatsArgs),
    /// Show format, size and orientation of an image
    Info(InfoArgs),
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Print the version
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConvertFlags {
    /// Target format; inferred from the output extension when unset
    #[arg(short, long)]
    pub format: Option<String>,

    /// Encoder quality (1-100)
    #[arg(short, long, default_value_t = 85)]
    pub quality: i32,

    /// ICO sizes, e.g. 256,64,32
    #[arg(long, value_name = "CSV")]
    pub ico_sizes: Option<String>,

    /// Replace an existing output
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CompressFlags {
    /// Starting quality; 0 uses compress.default_quality
    #[arg(short = 'Q', long, default_value_t = 0)]
    pub quality: i32,

    /// Byte budget such as 500KB or 1.5MB
    #[arg(long, value_name = "SIZE")]
    pub max_size: Option<String>,

    /// Larger quality steps and a lower floor
    #[arg(long)]
    pub aggressive: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ResizeFlags {
    /// Width in pixels or a percentage like 50%
    #[arg(short, long, default_value = "")]
    pub width: String,

    /// Height in pixels or a percentage
    #[arg(long, default_value = "")]
    pub height: String,

    /// cover, contain, fill, inside or outside
    #[arg(short, long, default_value = "")]
    pub fit: String,

    /// Never upscale
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub without_enlargement: bool,

    /// Keep the aspect ratio
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub keep_ratio: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RotateFlags {
    /// Clockwise degrees: 0, ±90, ±180, ±270
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub degrees: i32,

    /// Mirror left-right
    #[arg(long)]
    pub flip: bool,

    /// Mirror top-bottom
    #[arg(long)]
    pub flop: bool,
}

/// Watermark flags; unset values fall back to `watermark.default_*`.
#[derive(Args, Debug, Clone, Default)]
pub struct WatermarkFlags {
    /// Logo image to overlay
    #[arg(long, conflicts_with = "text")]
    pub logo: Option<PathBuf>,

    /// Text to overlay
    #[arg(long)]
    pub text: Option<String>,

    #[arg(short, long)]
    pub gravity: Option<String>,

    #[arg(long)]
    pub opacity: Option<f64>,

    /// Logo size as a share of the image's short side
    #[arg(short, long)]
    pub scale: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub offset_x: Option<i32>,

    #[arg(long, allow_negative_numbers = true)]
    pub offset_y: Option<i32>,

    #[arg(long)]
    pub font_size: Option<u32>,

    /// Font name or path
    #[arg(long)]
    pub font: Option<String>,

    #[arg(long)]
    pub font_file: Option<String>,

    #[arg(long)]
    pub color: Option<String>,

    #[arg(long)]
    pub stroke_color: Option<String>,

    #[arg(long)]
    pub stroke_width: Option<u32>,

    #[arg(long)]
    pub background: Option<String>,

    /// circle or 8dir
    #[arg(long)]
    pub stroke_mode: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    pub input: PathBuf,
    pub output: String,
    #[command(flatten)]
    pub flags: ConvertFlags,
}

#[derive(Args, Debug, Clone)]
pub struct CompressArgs {
    pub input: PathBuf,
    /// Output file or directory; defaults to base.output_dir
    #[arg(short, long)]
    pub output: Option<String>,
    #[command(flatten)]
    pub flags: CompressFlags,
}

#[derive(Args, Debug, Clone)]
pub struct ResizeArgs {
    pub input: PathBuf,
    pub output: String,
    #[command(flatten)]
    pub flags: ResizeFlags,
}

#[derive(Args, Debug, Clone)]
pub struct RotateArgs {
    pub input: PathBuf,
    pub output: String,
    #[command(flatten)]
    pub flags: RotateFlags,
}

#[derive(Args, Debug, Clone)]
pub struct WatermarkArgs {
    pub input: PathBuf,
    pub output: String,
    #[command(flatten)]
    pub flags: WatermarkFlags,
}

/// Input pattern and output directory shared by every batch operation.
#[derive(Args, Debug, Clone)]
pub struct BatchTarget {
    /// File, directory or glob such as 'photos/*.jpg'
    pub pattern: String,
    /// Output directory; defaults to base.output_dir
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum BatchOp {
    Convert {
        #[command(flatten)]
        target: BatchTarget,
        #[command(flatten)]
        flags: ConvertFlags,
    },
    Compress {
        #[command(flatten)]
        target: BatchTarget,
        #[command(flatten)]
        flags: CompressFlags,
    },
    Resize {
        #[command(flatten)]
        target: BatchTarget,
        #[command(flatten)]
        flags: ResizeFlags,
    },
    Rotate {
        #[command(flatten)]
        target: BatchTarget,
        #[command(flatten)]
        flags: RotateFlags,
    },
    Watermark {
        #[command(flatten)]
        target: BatchTarget,
        #[command(flatten)]
        flags: WatermarkFlags,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FormatsArgs {
    /// Only conversions from this format
    #[arg(long)]
    pub from: Option<String>,
    /// Only conversions to this format
    #[arg(long)]
    pub to: Option<String>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    pub input: PathBuf,
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Write the default configuration file
    Init {
        /// Replace an existing file
        #[arg(long)]
        overwrite: bool,
    },
    /// Print the effective configuration
    Show,
}
