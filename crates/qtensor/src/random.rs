//! Random tensor construction.

use rand::Rng;
use rand::distr::StandardUniform;
use rand_distr::StandardNormal;

use crate::error::TensorError;
use crate::scalar::{Scalar, c64};
use crate::tensor::Tensor;

/// Element types that can be drawn uniformly from [0, 1).
pub trait RandomUniform: Scalar {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self;
}

impl RandomUniform for f64 {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardUniform)
    }
}

impl RandomUniform for c64 {
    /// Real and imaginary parts are drawn independently.
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        c64::new(rng.sample(StandardUniform), rng.sample(StandardUniform))
    }
}

/// Element types that can be drawn from a standard normal distribution.
pub trait RandomNormal: Scalar {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self;
}

impl RandomNormal for f64 {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }
}

impl RandomNormal for c64 {
    /// Standard complex normal: E|z|^2 = 1.
    fn sample_normal<R: Rng>(rng: &mut R) -> Self {
        let scale = std::f64::consts::FRAC_1_SQRT_2;
        c64::new(
            rng.sample::<f64, _>(StandardNormal) * scale,
            rng.sample::<f64, _>(StandardNormal) * scale,
        )
    }
}

impl<T: RandomUniform> Tensor<'static, T> {
    /// Owned tensor on the default backend with uniform values in [0, 1).
    ///
    /// # Example
    ///
    /// ```
    /// use qtensor::Tensor;
    ///
    /// let t: Tensor<f64> = Tensor::random(&[2, 3]).unwrap();
    /// assert!(t.data().iter().all(|&v| (0.0..1.0).contains(&v)));
    /// ```
    pub fn random(shape: &[usize]) -> Result<Self, TensorError> {
        Self::random_with_rng(shape, &mut rand::rng())
    }

    /// Like [`random`](Self::random), drawing from `rng`.
    ///
    /// # Example
    ///
    /// ```
    /// use qtensor::Tensor;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t1: Tensor = Tensor::random_with_rng(&[2, 3], &mut rng).unwrap();
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t2: Tensor = Tensor::random_with_rng(&[2, 3], &mut rng).unwrap();
    ///
    /// assert_eq!(t1, t2);
    /// ```
    pub fn random_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Result<Self, TensorError> {
        let mut tensor = Self::zeros(shape)?;
        for x in tensor.data_mut() {
            *x = T::sample_uniform(rng);
        }
        Ok(tensor)
    }
}

impl<T: RandomNormal> Tensor<'static, T> {
    /// Owned tensor on the default backend with standard normal values.
    pub fn randn(shape: &[usize]) -> Result<Self, TensorError> {
        Self::randn_with_rng(shape, &mut rand::rng())
    }

    /// Like [`randn`](Self::randn), drawing from `rng`.
    pub fn randn_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Result<Self, TensorError> {
        let mut tensor = Self::zeros(shape)?;
        for x in tensor.data_mut() {
            *x = T::sample_normal(rng);
        }
        Ok(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::OwnershipMode;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_c64() {
        let t: Tensor = Tensor::random(&[3, 4]).unwrap();
        assert_eq!(t.shape(), &[3, 4]);
        assert_eq!(t.mode(), OwnershipMode::Owned);
        for z in t.data() {
            assert!((0.0..1.0).contains(&z.re));
            assert!((0.0..1.0).contains(&z.im));
        }
    }

    #[test]
    fn test_random_seeded_is_reproducible() {
        let mut rng = StdRng::seed_from_u64(7);
        let a: Tensor<f64> = Tensor::random_with_rng(&[5], &mut rng).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let b: Tensor<f64> = Tensor::random_with_rng(&[5], &mut rng).unwrap();
        assert_eq!(a, b);

        let c: Tensor<f64> = Tensor::random_with_rng(&[5], &mut rng).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_randn_statistics() {
        let mut rng = StdRng::seed_from_u64(1234);
        let t: Tensor = Tensor::randn_with_rng(&[4000], &mut rng).unwrap();

        let n = t.size() as f64;
        let mean_sq: f64 = t.data().iter().map(|z| z.re * z.re + z.im * z.im).sum::<f64>() / n;
        assert!((mean_sq - 1.0).abs() < 0.1, "mean |z|^2 = {mean_sq}");
    }

    #[test]
    fn test_random_scalar_shape() {
        let t: Tensor<f64> = Tensor::randn(&[]).unwrap();
        assert_eq!(t.size(), 1);
    }
}
