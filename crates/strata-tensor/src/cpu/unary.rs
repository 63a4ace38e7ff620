// Float-evaluated unary kernels shared by CpuBackend.
//
// Each value is widened to f64, transformed, and narrowed back to T, so
// integer tensors get truncated results.

use crate::dtype::Element;

/// Apply `f` to every element through f64.
pub(crate) fn map_f64<T: Element>(x: &[T], f: impl Fn(f64) -> f64) -> Vec<T> {
    x.iter().map(|&v| T::from_f64(f(v.as_f64()))).collect()
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_points() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(1.0) - 0.731_058_578_6).abs() < 1e-9);
        assert!(sigmoid(-800.0) >= 0.0);
        assert_eq!(sigmoid(800.0), 1.0);
    }

    #[test]
    fn test_map_truncates_integers() {
        let r = map_f64(&[4i32, 10], f64::sqrt);
        assert_eq!(r, vec![2, 3]);
    }
}
