//! Tests for tile progress reporting

#[cfg(test)]
mod tests {
    use gausstile::algorithm::executor::TileObserver;
    use gausstile::io::progress::TileProgress;

    // Tests the bar tracks merged tiles and the total
    // Verified by ignoring the total in the observer
    #[test]
    fn test_hidden_progress_tracks_tiles() {
        let progress = TileProgress::hidden();
        assert_eq!(progress.position(), 0);

        progress.tile_merged(1, 6);
        progress.tile_merged(4, 6);
        assert_eq!(progress.position(), 4);
        assert_eq!(progress.length(), Some(6));

        progress.finish();
    }

    // Tests a labelled bar can be created and finished
    // Verified by panicking on an empty label
    #[test]
    fn test_labelled_progress() {
        let progress = TileProgress::new("");
        progress.tile_merged(2, 2);
        assert_eq!(progress.position(), 2);
        progress.finish();
    }
}
