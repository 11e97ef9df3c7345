//! Class-axis probability operations on channel-first volumes

use ndarray::{Array2, Array3, ArrayView3, Axis, Zip};

/// Numerically stable softmax over axis 0 of a `(classes, rows, cols)` volume
pub fn softmax_classes(logits: ArrayView3<'_, f32>) -> Array3<f32> {
    let max = logits.fold_axis(Axis(0), f32::NEG_INFINITY, |&acc, &v| acc.max(v));
    let mut exp = logits.to_owned();
    for mut class in exp.axis_iter_mut(Axis(0)) {
        Zip::from(&mut class)
            .and(&max)
            .for_each(|v, &m| *v = (*v - m).exp());
    }
    let sum = exp.sum_axis(Axis(0));
    for mut class in exp.axis_iter_mut(Axis(0)) {
        Zip::from(&mut class).and(&sum).for_each(|v, &s| *v /= s);
    }
    exp
}

/// Per-pixel index of the most probable class
///
/// Ties resolve to the lowest class index. NaN never wins against a number.
pub fn argmax_classes(volume: ArrayView3<'_, f32>) -> Array2<usize> {
    let (_, rows, cols) = volume.dim();
    let mut best_value = Array2::from_elem((rows, cols), f32::NEG_INFINITY);
    let mut best_index = Array2::<usize>::zeros((rows, cols));

    for (class, plane) in volume.axis_iter(Axis(0)).enumerate() {
        Zip::from(&mut best_value)
            .and(&mut best_index)
            .and(&plane)
            .for_each(|best, index, &v| {
                // Strict comparison keeps the earliest maximum
                if v > *best {
                    *best = v;
                    *index = class;
                }
            });
    }
    best_index
}
