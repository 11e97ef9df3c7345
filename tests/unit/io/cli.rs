//! Tests for command-line parsing and batch file processing

#[cfg(test)]
mod tests {
    use clap::Parser;
    use gausstile::InferenceError;
    use gausstile::io::cli::{Cli, FileProcessor};
    use gausstile::io::configuration::{
        DEFAULT_BASELINE_GAIN, DEFAULT_BASELINE_THRESHOLDS, DEFAULT_SCALE, DEFAULT_TILE_SHAPE,
    };
    use image::{GrayImage, Luma};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_split_png(path: &Path) {
        let image = GrayImage::from_fn(24, 16, |x, _| Luma([if x < 12 { 20 } else { 230 }]));
        image.save(path).expect("write test image");
    }

    // Tests parsing with only the required target argument
    // Verified by changing default values to ensure defaults are used
    #[test]
    fn test_cli_parse_minimal_args() {
        let cli = Cli::parse_from(["program", "scan.png"]);

        assert_eq!(cli.target, PathBuf::from("scan.png"));
        assert_eq!((cli.tile_height, cli.tile_width), DEFAULT_TILE_SHAPE);
        assert!((cli.scale - DEFAULT_SCALE).abs() < f64::EPSILON);
        assert!((cli.gain - DEFAULT_BASELINE_GAIN).abs() < f32::EPSILON);
        assert!(cli.thresholds.is_empty());
        assert_eq!(cli.baseline_thresholds(), DEFAULT_BASELINE_THRESHOLDS.to_vec());
        assert!(cli.output_dir.is_none());
        assert!(cli.should_show_progress());
        assert!(!cli.verbose);
    }

    // Tests parsing with all available arguments
    // Verified by renaming a flag
    #[test]
    fn test_cli_parse_all_args() {
        let cli = Cli::parse_from([
            "program",
            "images",
            "--tile-height",
            "64",
            "--tile-width",
            "32",
            "--scale",
            "2",
            "--padding",
            "0.1",
            "--shift",
            "0.5",
            "--sigma-scale",
            "0.2",
            "--no-gaussian",
            "--no-tta",
            "--thresholds=-0.5,0.5",
            "--gain",
            "2",
            "--output-dir",
            "out",
            "--quiet",
            "--verbose",
        ]);

        assert_eq!(cli.baseline_thresholds(), vec![-0.5, 0.5]);
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert!(!cli.should_show_progress());
        assert!(cli.verbose);

        let config = cli.inference_config();
        assert_eq!(config.tile_shape, (64, 32));
        assert!((config.scale - 2.0).abs() < f64::EPSILON);
        assert!((config.border_padding_factor - 0.1).abs() < f64::EPSILON);
        assert!((config.max_tile_shift - 0.5).abs() < f64::EPSILON);
        assert!((config.gaussian_sigma_scale - 0.2).abs() < f64::EPSILON);
        assert!(!config.use_gaussian);
        assert!(!config.use_tta);
        assert_eq!(config.num_classes, 2);
    }

    // Tests processing a single file with preview export
    // Verified by skipping the export step
    #[test]
    fn test_process_single_file() {
        let dir = TempDir::new().expect("temp dir");
        let input = dir.path().join("cells.png");
        write_split_png(&input);
        let output = dir.path().join("out");

        let cli = Cli::parse_from([
            "program",
            input.to_str().expect("utf-8 path"),
            "--tile-height",
            "8",
            "--tile-width",
            "8",
            "--output-dir",
            output.to_str().expect("utf-8 path"),
            "--quiet",
        ]);
        let reports = FileProcessor::new(cli).process().expect("processing succeeds");

        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.path, input);
        assert!(report.tiles > 1);
        assert_eq!(report.class_fractions.len(), 2);
        let total: f32 = report.class_fractions.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(report.class_fractions[1] > 0.3 && report.class_fractions[1] < 0.7);
        assert!(report.uncertainty_score.is_some());

        assert!(output.join("cells_mask.png").exists());
        assert!(output.join("cells_uncertainty.png").exists());
    }

    // Tests directories are scanned for supported images in sorted order
    // Verified by removing the extension filter
    #[test]
    fn test_process_directory() {
        let dir = TempDir::new().expect("temp dir");
        write_split_png(&dir.path().join("b.png"));
        write_split_png(&dir.path().join("a.PNG"));
        write_split_png(&dir.path().join("c.tif"));
        std::fs::write(dir.path().join("notes.txt"), "not an image").expect("write notes");
        std::fs::write(dir.path().join("d.gif"), "not decoded").expect("write gif");

        let cli = Cli::parse_from([
            "program",
            dir.path().to_str().expect("utf-8 path"),
            "--tile-height",
            "8",
            "--tile-width",
            "8",
            "--no-tta",
            "--quiet",
        ]);
        let reports = FileProcessor::new(cli).process().expect("processing succeeds");

        let names: Vec<_> = reports
            .iter()
            .filter_map(|r| r.path.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.png", "c.tif"]);
    }

    // Tests missing targets and invalid parameters are reported
    // Verified by ignoring the gain check
    #[test]
    fn test_process_errors() {
        let dir = TempDir::new().expect("temp dir");
        let missing = dir.path().join("missing.png");
        let missing_target = Cli::parse_from(["program", missing.to_str().expect("utf-8 path")]);
        assert!(matches!(
            FileProcessor::new(missing_target).process(),
            Err(InferenceError::InvalidInput { .. })
        ));

        let zero_gain = Cli::parse_from(["program", "scan.png", "--gain", "0"]);
        assert!(matches!(
            FileProcessor::new(zero_gain).process(),
            Err(InferenceError::InvalidParameter {
                parameter: "gain",
                ..
            })
        ));

        let zero_shift = Cli::parse_from(["program", "scan.png", "--shift", "0"]);
        assert!(matches!(
            FileProcessor::new(zero_shift).process(),
            Err(InferenceError::InvalidParameter {
                parameter: "max_tile_shift",
                ..
            })
        ));
    }
}
