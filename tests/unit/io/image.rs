//! Tests for image decoding and preview export

#[cfg(test)]
mod tests {
    use gausstile::InferenceError;
    use gausstile::io::image::{
        class_map_to_gray, image_to_array, load_image, save_gray, uncertainty_to_gray,
    };
    use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
    use ndarray::array;
    use tempfile::TempDir;

    // Tests grayscale images become a single channel in [0, 1]
    // Verified by always converting to RGB
    #[test]
    fn test_gray_to_array() {
        let gray = GrayImage::from_fn(3, 2, |x, y| Luma([if x == 2 && y == 1 { 255 } else { 0 }]));
        let array = image_to_array(&DynamicImage::ImageLuma8(gray)).expect("valid image");

        assert_eq!(array.dim(), (2, 3, 1));
        assert!((array[[1, 2, 0]] - 1.0).abs() < 1e-6);
        assert!(array[[0, 2, 0]].abs() < 1e-6);
    }

    // Tests color images keep three channels in row-major order
    // Verified by swapping width and height
    #[test]
    fn test_rgb_to_array() {
        let rgb = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) });
        let array = image_to_array(&DynamicImage::ImageRgb8(rgb)).expect("valid image");

        assert_eq!(array.dim(), (1, 2, 3));
        assert!((array[[0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!((array[[0, 1, 2]] - 1.0).abs() < 1e-6);
        assert!(array[[0, 1, 0]].abs() < 1e-6);
    }

    // Tests class maps spread over the gray range
    // Verified by dividing by the class count instead of the top class
    #[test]
    fn test_class_map_to_gray() {
        let argmax = array![[0_usize, 1, 2]];
        let gray = class_map_to_gray(argmax.view(), 3);
        assert_eq!(gray.dimensions(), (3, 1));
        assert_eq!(gray.get_pixel(0, 0).0, [0]);
        assert_eq!(gray.get_pixel(1, 0).0, [127]);
        assert_eq!(gray.get_pixel(2, 0).0, [255]);
    }

    // Tests uncertainty previews clamp to the displayable range
    // Verified by removing the clamp
    #[test]
    fn test_uncertainty_to_gray() {
        let uncertainty = array![[-0.5_f32, 0.5], [1.0, 3.0]];
        let gray = uncertainty_to_gray(uncertainty.view());
        assert_eq!(gray.get_pixel(0, 0).0, [0]);
        assert_eq!(gray.get_pixel(1, 0).0, [128]);
        assert_eq!(gray.get_pixel(0, 1).0, [255]);
        assert_eq!(gray.get_pixel(1, 1).0, [255]);
    }

    // Tests saving creates directories and loading reads the pixels back
    // Verified by skipping directory creation
    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join("mask.png");
        let gray = class_map_to_gray(array![[0_usize, 1], [1, 0]].view(), 2);

        save_gray(&gray, &path).expect("save succeeds");
        let loaded = load_image(&path).expect("load succeeds");

        assert_eq!(loaded.dim(), (2, 2, 1));
        assert!((loaded[[0, 1, 0]] - 1.0).abs() < 1e-6);
        assert!(loaded[[1, 1, 0]].abs() < 1e-6);
    }

    // Tests missing files surface as load errors
    // Verified by mapping to a file system error
    #[test]
    fn test_load_missing() {
        let dir = TempDir::new().expect("temp dir");
        let result = load_image(&dir.path().join("absent.png"));
        assert!(matches!(result, Err(InferenceError::ImageLoad { .. })));
    }
}
