//! Command-line interface running the baseline ensemble over image files

use crate::algorithm::baseline::IntensityThresholdModel;
use crate::algorithm::ensemble::SegmentationModel;
use crate::algorithm::executor::{PredictOptions, Prediction, Predictor};
use crate::analysis::statistics::{ChannelStats, class_fractions, uncertainty_score};
use crate::io::configuration::{
    DEFAULT_BASELINE_GAIN, DEFAULT_BASELINE_THRESHOLDS, DEFAULT_BORDER_PADDING_FACTOR,
    DEFAULT_GAUSSIAN_SIGMA_SCALE, DEFAULT_MAX_TILE_SHIFT, DEFAULT_SCALE, DEFAULT_TILE_SHAPE,
    InferenceConfig, MASK_SUFFIX, UNCERTAINTY_SUFFIX,
};
use crate::io::error::{Result, invalid_input, invalid_parameter};
use crate::io::image::{class_map_to_gray, load_image, save_gray, uncertainty_to_gray};
use crate::io::progress::TileProgress;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Image extensions picked up when the target is a directory
const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "tif", "tiff", "jpg"];

#[derive(Parser, Debug)]
#[command(name = "gausstile")]
#[command(
    author,
    version,
    about = "Tiled ensemble segmentation with Gaussian blending and uncertainty maps"
)]
/// Command-line arguments for tiled prediction
// Boolean switches mirror the configuration toggles one-to-one
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input image file or directory of images
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Tile height in model pixels
    #[arg(long, default_value_t = DEFAULT_TILE_SHAPE.0)]
    pub tile_height: usize,

    /// Tile width in model pixels
    #[arg(long, default_value_t = DEFAULT_TILE_SHAPE.1)]
    pub tile_width: usize,

    /// Image pixels per model pixel
    #[arg(short, long, default_value_t = DEFAULT_SCALE)]
    pub scale: f64,

    /// Border padding as a fraction of the tile size, in [0, 1)
    #[arg(short, long, default_value_t = DEFAULT_BORDER_PADDING_FACTOR)]
    pub padding: f64,

    /// Center spacing as a fraction of the tile size, in (0, 1]
    #[arg(long, default_value_t = DEFAULT_MAX_TILE_SHIFT)]
    pub shift: f64,

    /// Gaussian sigma as a fraction of the tile size
    #[arg(long, default_value_t = DEFAULT_GAUSSIAN_SIGMA_SCALE)]
    pub sigma_scale: f64,

    /// Blend tiles uniformly instead of with a Gaussian
    #[arg(long)]
    pub no_gaussian: bool,

    /// Disable flip test-time augmentation
    #[arg(long)]
    pub no_tta: bool,

    /// Thresholds of the baseline ensemble, in normalized intensity units
    #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
    pub thresholds: Vec<f32>,

    /// Logit gain of the baseline models
    #[arg(long, default_value_t = DEFAULT_BASELINE_GAIN)]
    pub gain: f32,

    /// Directory for class map and uncertainty previews
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Log progress details
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Inference configuration described by the arguments
    pub fn inference_config(&self) -> InferenceConfig {
        InferenceConfig {
            gaussian_sigma_scale: self.sigma_scale,
            ..InferenceConfig::default()
        }
        .with_tile_shape(self.tile_height, self.tile_width)
        .with_scale(self.scale)
        .with_border_padding(self.padding)
        .with_max_tile_shift(self.shift)
        .with_gaussian(!self.no_gaussian)
        .with_tta(!self.no_tta)
        .with_num_classes(2)
    }

    /// Baseline thresholds, falling back to the defaults when none are given
    pub fn baseline_thresholds(&self) -> Vec<f32> {
        if self.thresholds.is_empty() {
            DEFAULT_BASELINE_THRESHOLDS.to_vec()
        } else {
            self.thresholds.clone()
        }
    }
}

/// Summary of one processed file
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// Input image
    pub path: PathBuf,
    /// Tiles evaluated
    pub tiles: usize,
    /// Fraction of pixels per class
    pub class_fractions: Vec<f32>,
    /// Mean foreground uncertainty, if any foreground was found
    pub uncertainty_score: Option<f32>,
}

/// Runs prediction over every target file
pub struct FileProcessor {
    cli: Cli,
}

impl FileProcessor {
    /// Create a new file processor with the given CLI arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Process files according to CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the target cannot be
    /// read, or prediction fails on any file
    pub fn process(&self) -> Result<Vec<FileReport>> {
        let config = self.cli.inference_config();
        config.validate()?;
        if !(self.cli.gain.is_finite() && self.cli.gain > 0.0) {
            return Err(invalid_parameter(
                "gain",
                &self.cli.gain,
                &"must be a positive finite number",
            ));
        }

        let files = self.collect_files()?;
        let mut reports = Vec::with_capacity(files.len());
        for file in &files {
            reports.push(self.process_file(file, config)?);
        }
        Ok(reports)
    }

    fn build_models(&self) -> Vec<Box<dyn SegmentationModel>> {
        self.cli
            .baseline_thresholds()
            .into_iter()
            .map(|t| {
                Box::new(IntensityThresholdModel::new(t, self.cli.gain)) as Box<dyn SegmentationModel>
            })
            .collect()
    }

    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let target = &self.cli.target;
        if target.is_file() {
            Ok(vec![target.clone()])
        } else if target.is_dir() {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(target)? {
                let path = entry?.path();
                if is_supported(&path) {
                    files.push(path);
                }
            }
            files.sort();
            Ok(files)
        } else {
            Err(invalid_input(&format!(
                "target '{}' is neither a file nor a directory",
                target.display()
            )))
        }
    }

    fn process_file(&self, input_path: &Path, config: InferenceConfig) -> Result<FileReport> {
        let start_time = Instant::now();
        let image = load_image(input_path)?;
        let stats = ChannelStats::from_image(image.view());
        let predictor = Predictor::with_models(config, self.build_models(), stats)?;

        let label = input_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let progress = if self.cli.should_show_progress() {
            TileProgress::new(&label)
        } else {
            TileProgress::hidden()
        };
        let options = PredictOptions {
            observer: Some(&progress),
            cancel: None,
        };
        let prediction = predictor.predict_with(image.view(), &options);
        progress.finish();
        let prediction = prediction?;

        if let Some(output_dir) = &self.cli.output_dir {
            Self::export_previews(input_path, output_dir, &prediction, config.num_classes)?;
        }

        let report = FileReport {
            path: input_path.to_path_buf(),
            tiles: prediction.tiles,
            class_fractions: class_fractions(prediction.argmax.view(), config.num_classes),
            uncertainty_score: uncertainty_score(
                prediction.argmax.view(),
                prediction.uncertainty.view(),
            ),
        };
        info!(
            file = %input_path.display(),
            tiles = report.tiles,
            foreground = report.class_fractions.get(1).copied().unwrap_or(0.0),
            uncertainty = report.uncertainty_score.unwrap_or(0.0),
            elapsed = ?start_time.elapsed(),
            "processed image"
        );
        Ok(report)
    }

    fn export_previews(
        input_path: &Path,
        output_dir: &Path,
        prediction: &Prediction,
        num_classes: usize,
    ) -> Result<()> {
        let stem = input_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let mask_path = output_dir.join(format!("{stem}{MASK_SUFFIX}.png"));
        let uncertainty_path = output_dir.join(format!("{stem}{UNCERTAINTY_SUFFIX}.png"));

        save_gray(
            &class_map_to_gray(prediction.argmax.view(), num_classes),
            &mask_path,
        )?;
        save_gray(
            &uncertainty_to_gray(prediction.uncertainty.view()),
            &uncertainty_path,
        )
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Print one line per report
// Allow print for the user-facing summary
#[allow(clippy::print_stdout)]
pub fn print_reports(reports: &[FileReport]) {
    for report in reports {
        let fractions = report
            .class_fractions
            .iter()
            .map(|f| format!("{:.1}%", f * 100.0))
            .collect::<Vec<_>>()
            .join(" / ");
        let score = report
            .uncertainty_score
            .map_or_else(|| "n/a".to_string(), |s| format!("{s:.4}"));
        println!(
            "{}: {} tiles, classes {fractions}, foreground uncertainty {score}",
            report.path.display(),
            report.tiles
        );
    }
}
