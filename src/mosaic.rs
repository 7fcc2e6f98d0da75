//! Mosaic sensor reconstruction: reverse a spatial band-interleave pattern
//! into a band cube.

use ndarray::{s, Array2, Array3};
use thiserror::Error;

use crate::camera::FilterGeometry;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("band count {0} is not a perfect square")]
    NonSquarePattern(usize),
    #[error("filter region is empty ({height}x{width})")]
    EmptyRegion { height: usize, width: usize },
    #[error("filter region {region_h}x{region_w}+{offset_y}+{offset_x} exceeds frame {frame_h}x{frame_w}")]
    RegionOutOfBounds {
        region_h: usize,
        region_w: usize,
        offset_y: usize,
        offset_x: usize,
        frame_h: usize,
        frame_w: usize,
    },
}

/// Rebuild the band cube from a single interleaved raw frame.
///
/// The filter pattern is a `side x side` tile repeated across the region,
/// `side = sqrt(band_count)`. Band `i*side + j` collects the pixels at row
/// offset `i` and column offset `j` within each tile, so the output has
/// shape `(region_h / side, region_w / side, band_count)`. The crop extents
/// are truncated down to tile multiples so every band plane comes out the
/// same size.
pub fn reconstruct(raw: &Array2<u16>, geom: &FilterGeometry) -> Result<Array3<u16>, GeometryError> {
    let bands = geom.band_count();
    let side = pattern_side(geom)?;
    let (frame_h, frame_w) = raw.dim();
    if geom.offset_y + geom.height > frame_h || geom.offset_x + geom.width > frame_w {
        return Err(GeometryError::RegionOutOfBounds {
            region_h: geom.height,
            region_w: geom.width,
            offset_y: geom.offset_y,
            offset_x: geom.offset_x,
            frame_h,
            frame_w,
        });
    }

    // Tile-aligned crop of the valid filter region.
    let crop_h = geom.height - geom.height % side;
    let crop_w = geom.width - geom.width % side;
    if crop_h == 0 || crop_w == 0 {
        return Err(GeometryError::EmptyRegion { height: crop_h, width: crop_w });
    }
    let region = raw.slice(s![
        geom.offset_y..geom.offset_y + crop_h,
        geom.offset_x..geom.offset_x + crop_w,
    ]);

    let mut cube = Array3::<u16>::zeros((crop_h / side, crop_w / side, bands));
    for i in 0..side {
        for j in 0..side {
            let band = i * side + j;
            let plane = region.slice(s![i..;side, j..;side]);
            cube.slice_mut(s![.., .., band]).assign(&plane);
        }
    }
    Ok(cube)
}

/// Side length of the square filter tile. Reconstruction is only defined
/// for square patterns over a non-empty region.
pub fn pattern_side(geom: &FilterGeometry) -> Result<usize, GeometryError> {
    if geom.height == 0 || geom.width == 0 {
        return Err(GeometryError::EmptyRegion { height: geom.height, width: geom.width });
    }
    let bands = geom.band_count();
    if bands == 0 {
        return Err(GeometryError::NonSquarePattern(bands));
    }
    let side = (bands as f64).sqrt().round() as usize;
    if side * side != bands {
        return Err(GeometryError::NonSquarePattern(bands));
    }
    Ok(side)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(height: usize, width: usize, pattern: usize) -> FilterGeometry {
        FilterGeometry {
            height,
            width,
            offset_x: 0,
            offset_y: 0,
            pattern_width: pattern,
            pattern_height: pattern,
        }
    }

    /// Raw frame tiled with a periodic `side x side` pattern: the pixel at
    /// tile offset `(i, j)` carries the constant `values[i*side + j]`.
    fn tiled_frame(rows: usize, cols: usize, side: usize, values: &[u16]) -> Array2<u16> {
        Array2::from_shape_fn((rows, cols), |(r, c)| values[(r % side) * side + c % side])
    }

    #[test]
    fn recovers_constant_band_planes() {
        let raw = tiled_frame(8, 12, 2, &[1, 2, 3, 4]);
        let cube = reconstruct(&raw, &geometry(8, 12, 2)).unwrap();
        assert_eq!(cube.dim(), (4, 6, 4));
        for band in 0..4 {
            assert!(cube.slice(s![.., .., band]).iter().all(|&v| v == band as u16 + 1));
        }
    }

    #[test]
    fn band_order_is_row_major_over_tile_offsets() {
        let raw = tiled_frame(6, 6, 3, &[10, 11, 12, 20, 21, 22, 30, 31, 32]);
        let cube = reconstruct(&raw, &geometry(6, 6, 3)).unwrap();
        assert_eq!(cube.dim(), (2, 2, 9));
        // Band index i*side + j: row offset 1, column offset 2 is band 5.
        assert_eq!(cube[[0, 0, 5]], 22);
        assert_eq!(cube[[1, 1, 0]], 10);
        assert_eq!(cube[[0, 1, 8]], 32);
    }

    #[test]
    fn crop_offsets_are_honored() {
        // Shift the pattern phase by writing the frame, then cropping at
        // (1, 1): the pixel at tile offset (0, 0) of the cropped region is
        // the raw pattern's (1, 1) value.
        let raw = tiled_frame(9, 9, 2, &[1, 2, 3, 4]);
        let geom = FilterGeometry {
            height: 8,
            width: 8,
            offset_x: 1,
            offset_y: 1,
            pattern_width: 2,
            pattern_height: 2,
        };
        let cube = reconstruct(&raw, &geom).unwrap();
        assert_eq!(cube.dim(), (4, 4, 4));
        assert!(cube.slice(s![.., .., 0]).iter().all(|&v| v == 4));
        assert!(cube.slice(s![.., .., 3]).iter().all(|&v| v == 1));
    }

    #[test]
    fn region_is_truncated_to_tile_multiples() {
        let raw = tiled_frame(7, 9, 2, &[1, 2, 3, 4]);
        let cube = reconstruct(&raw, &geometry(7, 9, 2)).unwrap();
        assert_eq!(cube.dim(), (3, 4, 4));
    }

    #[test]
    fn non_square_band_count_is_rejected() {
        let raw = tiled_frame(8, 8, 2, &[1, 2, 3, 4]);
        let geom = FilterGeometry {
            height: 8,
            width: 8,
            offset_x: 0,
            offset_y: 0,
            pattern_width: 3,
            pattern_height: 2,
        };
        let err = reconstruct(&raw, &geom).unwrap_err();
        assert!(matches!(err, GeometryError::NonSquarePattern(6)));
    }

    #[test]
    fn empty_region_is_rejected() {
        let raw = tiled_frame(8, 8, 2, &[1, 2, 3, 4]);
        let err = reconstruct(&raw, &geometry(0, 8, 2)).unwrap_err();
        assert!(matches!(err, GeometryError::EmptyRegion { .. }));
    }

    #[test]
    fn oversized_region_is_rejected() {
        let raw = tiled_frame(8, 8, 2, &[1, 2, 3, 4]);
        let err = reconstruct(&raw, &geometry(10, 8, 2)).unwrap_err();
        assert!(matches!(err, GeometryError::RegionOutOfBounds { .. }));
    }
}
