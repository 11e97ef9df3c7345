//! Invertible geometric transforms for test-time augmentation
//!
//! A tile is augmented before inference and the resulting logits are
//! de-augmented, so every ensemble member's output is aligned with the
//! original tile. Transforms operate on the two trailing (spatial) axes of
//! channel-first arrays and are therefore valid for both image tiles and
//! class logits.

use ndarray::{Array3, ArrayView3, s};
use std::fmt;

/// Invertible transform applied around a model call
pub trait Augmentation: Send + Sync + fmt::Debug {
    /// Transform a `(channels, rows, cols)` tile
    fn augment(&self, tile: ArrayView3<'_, f32>) -> Array3<f32>;

    /// Undo [`Augmentation::augment`] on a `(classes, rows, cols)` output
    fn deaugment(&self, output: ArrayView3<'_, f32>) -> Array3<f32>;

    /// Short human-readable name
    fn name(&self) -> &'static str;
}

/// Leaves tiles untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

impl Augmentation for Identity {
    fn augment(&self, tile: ArrayView3<'_, f32>) -> Array3<f32> {
        tile.to_owned()
    }

    fn deaugment(&self, output: ArrayView3<'_, f32>) -> Array3<f32> {
        output.to_owned()
    }

    fn name(&self) -> &'static str {
        "identity"
    }
}

/// Mirrors columns (left-right)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HorizontalFlip;

impl Augmentation for HorizontalFlip {
    fn augment(&self, tile: ArrayView3<'_, f32>) -> Array3<f32> {
        tile.slice(s![.., .., ..;-1]).to_owned()
    }

    fn deaugment(&self, output: ArrayView3<'_, f32>) -> Array3<f32> {
        self.augment(output)
    }

    fn name(&self) -> &'static str {
        "horizontal_flip"
    }
}

/// Mirrors rows (top-bottom)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerticalFlip;

impl Augmentation for VerticalFlip {
    fn augment(&self, tile: ArrayView3<'_, f32>) -> Array3<f32> {
        tile.slice(s![.., ..;-1, ..]).to_owned()
    }

    fn deaugment(&self, output: ArrayView3<'_, f32>) -> Array3<f32> {
        self.augment(output)
    }

    fn name(&self) -> &'static str {
        "vertical_flip"
    }
}

/// Applies several transforms in order and inverts them in reverse order
#[derive(Debug)]
pub struct Composed {
    steps: Vec<Box<dyn Augmentation>>,
}

impl Composed {
    /// Chain `steps`; the first step is applied first
    pub fn new(steps: Vec<Box<dyn Augmentation>>) -> Self {
        Self { steps }
    }
}

impl Augmentation for Composed {
    fn augment(&self, tile: ArrayView3<'_, f32>) -> Array3<f32> {
        self.steps
            .iter()
            .fold(tile.to_owned(), |acc, step| step.augment(acc.view()))
    }

    fn deaugment(&self, output: ArrayView3<'_, f32>) -> Array3<f32> {
        self.steps
            .iter()
            .rev()
            .fold(output.to_owned(), |acc, step| step.deaugment(acc.view()))
    }

    fn name(&self) -> &'static str {
        "composed"
    }
}

/// Ordered set of augmentations evaluated for every tile
#[derive(Debug)]
pub struct AugmentationSet {
    items: Vec<Box<dyn Augmentation>>,
}

impl Default for AugmentationSet {
    fn default() -> Self {
        Self::identity()
    }
}

impl AugmentationSet {
    /// Set containing only [`Identity`]
    pub fn identity() -> Self {
        Self {
            items: vec![Box::new(Identity) as Box<dyn Augmentation>],
        }
    }

    /// Full flip product: identity, horizontal, vertical and both
    pub fn flips() -> Self {
        Self {
            items: vec![
                Box::new(Identity) as Box<dyn Augmentation>,
                Box::new(HorizontalFlip),
                Box::new(VerticalFlip),
                Box::new(Composed::new(vec![
                    Box::new(HorizontalFlip) as Box<dyn Augmentation>,
                    Box::new(VerticalFlip),
                ])),
            ],
        }
    }

    /// Flip product when `use_tta` is set, identity otherwise
    pub fn from_flag(use_tta: bool) -> Self {
        if use_tta { Self::flips() } else { Self::identity() }
    }

    /// Set with caller-supplied transforms
    pub fn custom(items: Vec<Box<dyn Augmentation>>) -> Self {
        Self { items }
    }

    /// Append a transform
    pub fn push(&mut self, augmentation: Box<dyn Augmentation>) {
        self.items.push(augmentation);
    }

    /// Transforms in evaluation order
    pub fn iter(&self) -> std::slice::Iter<'_, Box<dyn Augmentation>> {
        self.items.iter()
    }

    /// Number of transforms
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
