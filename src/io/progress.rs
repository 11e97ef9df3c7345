//! Terminal progress for tiled prediction

use crate::algorithm::executor::TileObserver;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::LazyLock;

static TILE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{prefix} [{bar:30.cyan/blue}] {pos}/{len} tiles")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Progress bar advanced once per merged tile
#[derive(Debug, Clone)]
pub struct TileProgress {
    bar: ProgressBar,
}

impl TileProgress {
    /// Visible bar labelled with `label` (typically a file name)
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(TILE_STYLE.clone());
        bar.set_prefix(label.to_string());
        Self { bar }
    }

    /// Bar that tracks progress without drawing
    pub fn hidden() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden());
        Self { bar }
    }

    /// Tiles reported so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Total tiles reported by the last update
    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    /// Remove the bar from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl TileObserver for TileProgress {
    fn tile_merged(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
    }
}
