//! Tests for tile center placement and in/out slice computation

#[cfg(test)]
mod tests {
    use gausstile::InferenceError;
    use gausstile::io::configuration::InferenceConfig;
    use gausstile::spatial::tiles::{SliceRange, TileGeometry, axis_slices, centers_1d};

    fn small_config() -> InferenceConfig {
        InferenceConfig::default()
            .with_tile_shape(4, 4)
            .with_border_padding(0.0)
            .with_max_tile_shift(1.0)
    }

    // Tests that an axis matching the tile size yields one center
    // Verified by removing the duplicate collapse
    #[test]
    fn test_single_center_when_axis_fits_tile() {
        assert_eq!(centers_1d(4, 4, 0.0, 1.0), vec![2]);
        assert_eq!(centers_1d(3, 4, 0.0, 1.0), vec![2]);
    }

    // Tests even spacing between the first and mirrored last center
    // Verified by dropping the `+ 1` in the center count
    #[test]
    fn test_centers_span_axis() {
        let centers = centers_1d(10, 4, 0.0, 0.5);
        assert_eq!(centers, vec![2, 3, 4, 5, 6, 8]);

        let padded = centers_1d(100, 16, 0.25, 0.9);
        assert_eq!(padded.first(), Some(&4));
        assert_eq!(padded.last(), Some(&96));
        assert!(padded.windows(2).all(|w| w[0] < w[1]));
    }

    // Tests negative candidates from heavy padding truncate toward zero
    // Verified by flooring candidates instead of truncating
    #[test]
    fn test_centers_truncate_toward_zero() {
        assert_eq!(centers_1d(4, 4, 0.6, 1.0), vec![0, 2, 4]);
        assert_eq!(centers_1d(4, 4, 0.9, 1.0), vec![-1, 2, 5]);
    }

    // Tests slices for a tile fully inside the axis
    // Verified by using a rounded half-width
    #[test]
    fn test_axis_slices_interior() {
        let slices = axis_slices(0, 5, 10, 4).expect("valid slices");
        assert_eq!(slices.output, SliceRange::new(3, 7));
        assert_eq!(slices.input, SliceRange::new(0, 4));
    }

    // Tests slices clipped at both edges keep equal lengths
    // Verified by not shifting the in range by the clipped amount
    #[test]
    fn test_axis_slices_clipped() {
        let low = axis_slices(0, 0, 10, 4).expect("valid slices");
        assert_eq!(low.output, SliceRange::new(0, 2));
        assert_eq!(low.input, SliceRange::new(2, 4));

        let high = axis_slices(1, 9, 10, 5).expect("valid slices");
        assert_eq!(high.output, SliceRange::new(7, 10));
        assert_eq!(high.input, SliceRange::new(0, 3));
        assert_eq!(high.input.len(), high.output.len());
    }

    // Tests odd tile sizes use the integer half-width
    // Verified by rounding the half-width up
    #[test]
    fn test_axis_slices_odd_tile() {
        let slices = axis_slices(0, 3, 20, 5).expect("valid slices");
        assert_eq!(slices.output, SliceRange::new(1, 6));
        assert_eq!(slices.input, SliceRange::new(0, 5));
    }

    // Tests that a tile outside the axis yields empty ranges
    // Verified by clamping only the upper bound
    #[test]
    fn test_axis_slices_outside() {
        let slices = axis_slices(0, 20, 10, 4).expect("valid slices");
        assert!(slices.output.is_empty());
        assert!(slices.input.is_empty());
    }

    // Tests the single-tile layout of a tile-sized image
    // Verified by disabling the duplicate collapse
    #[test]
    fn test_geometry_single_tile() {
        let geometry = TileGeometry::new(&small_config(), (4, 4)).expect("valid geometry");
        assert_eq!(geometry.len(), 1);
        assert_eq!(geometry.scaled_shape(), (4, 4));
        assert_eq!(geometry.image_shape(), (4, 4));
        assert_eq!(geometry.tile_shape(), (4, 4));

        let placement = geometry.placements()[0];
        assert_eq!(placement.center, [2, 2]);
        assert_eq!(placement.rows.output, SliceRange::new(0, 4));
        assert_eq!(placement.cols.output, SliceRange::new(0, 4));
    }

    // Tests row-major ordering and sequential indices
    // Verified by swapping the loop nesting
    #[test]
    fn test_geometry_row_major_order() {
        let config = small_config().with_max_tile_shift(0.5);
        let geometry = TileGeometry::new(&config, (10, 7)).expect("valid geometry");
        let placements = geometry.placements();

        assert!(!geometry.is_empty());
        for (i, placement) in placements.iter().enumerate() {
            assert_eq!(placement.index, i);
        }
        assert!(
            placements
                .windows(2)
                .all(|w| (w[0].center[0], w[0].center[1]) < (w[1].center[0], w[1].center[1]))
        );
    }

    // Tests scaled buffer shape and image-space centers
    // Verified by multiplying the shape by the scale instead of dividing
    #[test]
    fn test_geometry_scaled() {
        let config = small_config().with_scale(2.0);
        let geometry = TileGeometry::new(&config, (21, 18)).expect("valid geometry");
        assert_eq!(geometry.scaled_shape(), (10, 9));
        for placement in geometry.placements() {
            assert_eq!(placement.image_center[0], placement.center[0] * 2);
            assert_eq!(placement.image_center[1], placement.center[1] * 2);
        }
    }

    // Tests image-space centers truncate toward zero for negative centers
    // Verified by flooring the scaled center
    #[test]
    fn test_geometry_image_centers_truncate() {
        let config = small_config().with_border_padding(0.9).with_scale(1.5);
        let geometry = TileGeometry::new(&config, (6, 6)).expect("valid geometry");
        assert_eq!(geometry.scaled_shape(), (4, 4));

        let rows: Vec<[i64; 2]> = geometry
            .placements()
            .iter()
            .filter(|p| p.center[1] == 2)
            .map(|p| [p.center[0], p.image_center[0]])
            .collect();
        assert_eq!(rows, vec![[-1, -1], [2, 3], [5, 7]]);
    }

    // Tests rejection of images that vanish after scaling
    // Verified by removing the empty-shape check
    #[test]
    fn test_geometry_empty_scaled_image() {
        let config = small_config().with_scale(4.0);
        let result = TileGeometry::new(&config, (3, 20));
        assert!(matches!(result, Err(InferenceError::InvalidInput { .. })));
    }

    // Tests that invalid configurations are reported before tiling
    // Verified by skipping validation
    #[test]
    fn test_geometry_invalid_config() {
        let config = small_config().with_tile_shape(2, 8);
        let result = TileGeometry::new(&config, (16, 16));
        assert!(matches!(
            result,
            Err(InferenceError::InvalidParameter {
                parameter: "tile_shape",
                ..
            })
        ));
    }
}
