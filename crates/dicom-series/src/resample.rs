//! Slice resampling and intensity normalisation.

use ndarray::{Array2, Array3};

use crate::{Result, SeriesError};

/// Resize a 2D image using bilinear interpolation.
///
/// Source coordinates are `dst * (src_len / dst_len)`; neighbours are
/// clamped at the last row/column.
pub fn resize_bilinear(image: &Array2<f32>, target_h: usize, target_w: usize) -> Result<Array2<f32>> {
    let (orig_h, orig_w) = image.dim();
    if orig_h == 0 || orig_w == 0 || target_h == 0 || target_w == 0 {
        return Err(SeriesError::EmptyImage);
    }
    if (orig_h, orig_w) == (target_h, target_w) {
        return Ok(image.clone());
    }

    let scale_h = orig_h as f32 / target_h as f32;
    let scale_w = orig_w as f32 / target_w as f32;

    let resized = Array2::from_shape_fn((target_h, target_w), |(h, w)| {
        let src_h = h as f32 * scale_h;
        let src_w = w as f32 * scale_w;

        let h0 = (src_h.floor() as usize).min(orig_h - 1);
        let w0 = (src_w.floor() as usize).min(orig_w - 1);
        let h1 = (h0 + 1).min(orig_h - 1);
        let w1 = (w0 + 1).min(orig_w - 1);

        let dh = src_h - h0 as f32;
        let dw = src_w - w0 as f32;

        let p00 = image[[h0, w0]];
        let p01 = image[[h0, w1]];
        let p10 = image[[h1, w0]];
        let p11 = image[[h1, w1]];

        let p0 = (1.0 - dw).mul_add(p00, p01 * dw);
        let p1 = (1.0 - dw).mul_add(p10, p11 * dw);
        (1.0 - dh).mul_add(p0, p1 * dh)
    });

    Ok(resized)
}

/// Min-max scale a volume into [0, 1] in place.
///
/// A constant volume becomes all zeros.
pub fn normalize_unit(volume: &mut Array3<f32>) {
    let (lo, hi) = volume
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = hi - lo;
    if !range.is_finite() || range <= 0.0 {
        volume.fill(0.0);
        return;
    }
    volume.mapv_inplace(|v| (v - lo) / range);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_identity_size_is_copy() {
        let img = array![[1.0, 2.0], [3.0, 4.0]];
        let out = resize_bilinear(&img, 2, 2).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_upsample_interpolates_between_neighbours() {
        let img = array![[0.0, 10.0]];
        let out = resize_bilinear(&img, 1, 4).unwrap();
        assert_eq!(out.dim(), (1, 4));
        assert_eq!(out[[0, 0]], 0.0);
        assert!((out[[0, 1]] - 5.0).abs() < 1e-5);
        assert_eq!(out[[0, 2]], 10.0);
        assert_eq!(out[[0, 3]], 10.0);
    }

    #[test]
    fn test_downsample_constant_stays_constant() {
        let img = Array2::from_elem((512, 512), 7.5_f32);
        let out = resize_bilinear(&img, 200, 200).unwrap();
        assert_eq!(out.dim(), (200, 200));
        assert!(out.iter().all(|&v| (v - 7.5).abs() < 1e-5));
    }

    #[test]
    fn test_empty_target_is_error() {
        let img = array![[1.0]];
        assert!(matches!(
            resize_bilinear(&img, 0, 3),
            Err(SeriesError::EmptyImage)
        ));
    }

    #[test]
    fn test_normalize_unit_range() {
        let mut vol = Array3::from_shape_vec((1, 2, 2), vec![-10.0, 0.0, 10.0, 30.0]).unwrap();
        normalize_unit(&mut vol);
        assert_eq!(vol[[0, 0, 0]], 0.0);
        assert_eq!(vol[[0, 0, 1]], 0.25);
        assert_eq!(vol[[0, 1, 1]], 1.0);
    }

    #[test]
    fn test_normalize_constant_volume_is_zero() {
        let mut vol = Array3::from_elem((2, 3, 3), 42.0_f32);
        normalize_unit(&mut vol);
        assert!(vol.iter().all(|&v| v == 0.0));
    }
}
