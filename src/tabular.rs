// One-dimensional tabulated distributions
use crate::error::{Result, TableError};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the density behaves between tabulated points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabularShape {
    /// Density tabulated at points and linear in between.
    LinLin,
    /// Cumulative values tabulated at points, constant density in each bin.
    Histogram,
}

/// A normalised one-dimensional distribution over an ordered set of values.
///
/// Built once from tabulated data and read-only afterwards. The cumulative
/// distribution runs from exactly 0 at the first value to exactly 1 at the
/// last.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularDistribution {
    shape: TabularShape,
    values: Vec<f64>,
    /// Point densities for `LinLin`; bin densities for `Histogram`, with the
    /// last bin's density repeated at the final point.
    pdf: Vec<f64>,
    cdf: Vec<f64>,
}

fn check_values(values: &[f64], other_len: usize, other_name: &str) -> Result<()> {
    if values.len() < 2 {
        return Err(TableError::DegenerateDistribution(format!(
            "a tabular distribution needs at least 2 points, got {}",
            values.len()
        )));
    }
    if values.len() != other_len {
        return Err(TableError::Construction(format!(
            "{} values but {} {} entries",
            values.len(),
            other_len,
            other_name
        )));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(TableError::Construction(format!(
            "distribution value {} is not finite",
            i
        )));
    }
    if let Some(i) = values.windows(2).position(|w| w[0] > w[1]) {
        return Err(TableError::DegenerateDistribution(format!(
            "distribution values decrease at index {}",
            i
        )));
    }
    if values[0] >= values[values.len() - 1] {
        return Err(TableError::DegenerateDistribution(
            "distribution has an empty support".to_string(),
        ));
    }
    Ok(())
}

impl TabularDistribution {
    /// Build from densities tabulated at `values`, linear in between.
    pub fn lin_lin(values: Vec<f64>, pdf: Vec<f64>) -> Result<Self> {
        check_values(&values, pdf.len(), "density")?;
        if let Some(i) = pdf.iter().position(|p| !p.is_finite() || *p < 0.0) {
            return Err(TableError::DegenerateDistribution(format!(
                "density {} is not a non-negative finite number ({})",
                i, pdf[i]
            )));
        }

        let mut cdf = Vec::with_capacity(values.len());
        cdf.push(0.0);
        for i in 0..values.len() - 1 {
            let area = 0.5 * (pdf[i] + pdf[i + 1]) * (values[i + 1] - values[i]);
            cdf.push(cdf[i] + area);
        }
        let total = cdf[cdf.len() - 1];
        if total <= 0.0 {
            return Err(TableError::DegenerateDistribution(
                "distribution has zero total probability".to_string(),
            ));
        }

        let pdf = pdf.into_iter().map(|p| p / total).collect();
        let mut cdf: Vec<f64> = cdf.into_iter().map(|c| c / total).collect();
        let last = cdf.len() - 1;
        cdf[last] = 1.0;

        Ok(TabularDistribution {
            shape: TabularShape::LinLin,
            values,
            pdf,
            cdf,
        })
    }

    /// Rebuild a `LinLin` distribution from densities and cumulative values
    /// that are already normalised, keeping them bit for bit.
    ///
    /// The cumulative values must start at 0, end at 1 and match the
    /// trapezoids of the densities.
    pub(crate) fn lin_lin_normalized(values: Vec<f64>, pdf: Vec<f64>, cdf: Vec<f64>) -> Result<Self> {
        check_values(&values, pdf.len(), "density")?;
        if cdf.len() != values.len() {
            return Err(TableError::Construction(format!(
                "{} values but {} cumulative entries",
                values.len(),
                cdf.len()
            )));
        }
        if let Some(i) = pdf.iter().position(|p| !p.is_finite() || *p < 0.0) {
            return Err(TableError::DegenerateDistribution(format!(
                "density {} is not a non-negative finite number ({})",
                i, pdf[i]
            )));
        }
        let last = cdf.len() - 1;
        if cdf[0] != 0.0 || cdf[last] != 1.0 {
            return Err(TableError::DegenerateDistribution(format!(
                "normalised cumulative values must run from 0 to 1, got {} to {}",
                cdf[0], cdf[last]
            )));
        }
        for i in 0..last {
            let area = 0.5 * (pdf[i] + pdf[i + 1]) * (values[i + 1] - values[i]);
            let mass = cdf[i + 1] - cdf[i];
            if !(mass >= 0.0) || (mass - area).abs() > 1e-9 * (1.0 + area) {
                return Err(TableError::DegenerateDistribution(format!(
                    "cumulative step {} in bin {} does not match its density area {}",
                    mass, i, area
                )));
            }
        }

        Ok(TabularDistribution {
            shape: TabularShape::LinLin,
            values,
            pdf,
            cdf,
        })
    }

    /// Build from cumulative values at `values`; density is constant per bin.
    pub fn from_cdf(values: Vec<f64>, cdf: Vec<f64>) -> Result<Self> {
        check_values(&values, cdf.len(), "cumulative")?;
        if let Some(i) = cdf.iter().position(|c| !c.is_finite()) {
            return Err(TableError::DegenerateDistribution(format!(
                "cumulative value {} is not finite",
                i
            )));
        }
        if let Some(i) = cdf.windows(2).position(|w| w[0] > w[1]) {
            return Err(TableError::DegenerateDistribution(format!(
                "cumulative values decrease at index {}",
                i
            )));
        }
        let first = cdf[0];
        let total = cdf[cdf.len() - 1] - first;
        if total <= 0.0 {
            return Err(TableError::DegenerateDistribution(
                "distribution has zero total probability".to_string(),
            ));
        }

        let mut cdf: Vec<f64> = cdf.into_iter().map(|c| (c - first) / total).collect();
        let last = cdf.len() - 1;
        cdf[last] = 1.0;

        let mut pdf = Vec::with_capacity(values.len());
        for i in 0..last {
            let width = values[i + 1] - values[i];
            let mass = cdf[i + 1] - cdf[i];
            if width == 0.0 {
                if mass > 0.0 {
                    return Err(TableError::DegenerateDistribution(format!(
                        "bin {} has probability but no width",
                        i
                    )));
                }
                pdf.push(0.0);
            } else {
                pdf.push(mass / width);
            }
        }
        pdf.push(pdf[last - 1]);

        Ok(TabularDistribution {
            shape: TabularShape::Histogram,
            values,
            pdf,
            cdf,
        })
    }

    pub fn shape(&self) -> TabularShape {
        self.shape
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Normalised densities, see the field docs for their layout.
    pub fn pdf_values(&self) -> &[f64] {
        &self.pdf
    }

    pub fn cdf_values(&self) -> &[f64] {
        &self.cdf
    }

    #[inline]
    pub fn lower_bound(&self) -> f64 {
        self.values[0]
    }

    #[inline]
    pub fn upper_bound(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Bin `i` with `values[i] <= x < values[i + 1]`, for x inside the support.
    #[inline]
    fn bin_of(&self, x: f64) -> usize {
        let last_bin = self.values.len() - 2;
        self.values
            .partition_point(|&v| v <= x)
            .saturating_sub(1)
            .min(last_bin)
    }

    #[inline]
    fn slope(&self, bin: usize) -> f64 {
        let width = self.values[bin + 1] - self.values[bin];
        if width > 0.0 {
            (self.pdf[bin + 1] - self.pdf[bin]) / width
        } else {
            0.0
        }
    }

    pub fn evaluate_pdf(&self, x: f64) -> f64 {
        if !(x >= self.lower_bound() && x <= self.upper_bound()) {
            return 0.0;
        }
        let bin = self.bin_of(x);
        match self.shape {
            TabularShape::LinLin => {
                if x == self.values[bin + 1] {
                    self.pdf[bin + 1]
                } else {
                    self.pdf[bin] + self.slope(bin) * (x - self.values[bin])
                }
            }
            TabularShape::Histogram => self.pdf[bin],
        }
    }

    pub fn evaluate_cdf(&self, x: f64) -> f64 {
        if x.is_nan() || x <= self.lower_bound() {
            return 0.0;
        }
        if x >= self.upper_bound() {
            return 1.0;
        }
        let bin = self.bin_of(x);
        let dx = x - self.values[bin];
        let value = match self.shape {
            TabularShape::LinLin => {
                self.cdf[bin] + dx * (self.pdf[bin] + 0.5 * self.slope(bin) * dx)
            }
            TabularShape::Histogram => self.cdf[bin] + self.pdf[bin] * dx,
        };
        value.min(1.0)
    }

    /// Inverse of the cumulative distribution at `u` in `[0, 1]`.
    pub fn sample_with_random_number(&self, u: f64) -> f64 {
        if u >= 1.0 {
            return self.upper_bound();
        }
        let last_bin = self.values.len() - 2;
        let bin = self
            .cdf
            .partition_point(|&c| c <= u)
            .saturating_sub(1)
            .min(last_bin);
        let x0 = self.values[bin];
        let delta = u - self.cdf[bin];
        if delta <= 0.0 {
            return x0;
        }

        let x = match self.shape {
            TabularShape::LinLin => {
                let p0 = self.pdf[bin];
                let m = self.slope(bin);
                if m == 0.0 {
                    x0 + delta / p0
                } else {
                    x0 + ((p0 * p0 + 2.0 * m * delta).max(0.0).sqrt() - p0) / m
                }
            }
            TabularShape::Histogram => x0 + delta / self.pdf[bin],
        };
        x.min(self.values[bin + 1])
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.sample_with_random_number(rng.gen::<f64>())
    }

    /// Sample and count the attempt in `trials`.
    pub fn sample_and_record_trials<R: Rng + ?Sized>(&self, rng: &mut R, trials: &mut u64) -> f64 {
        *trials += 1;
        self.sample(rng)
    }

    /// Sample restricted to `[lower_bound, max_value]`.
    pub fn sample_with_random_number_in_subrange(&self, u: f64, max_value: f64) -> Result<f64> {
        if !(max_value > self.lower_bound() && max_value <= self.upper_bound()) {
            return Err(TableError::out_of_range(
                max_value,
                self.lower_bound(),
                self.upper_bound(),
            ));
        }
        Ok(self.sample_with_random_number(u * self.evaluate_cdf(max_value)))
    }

    pub fn sample_in_subrange<R: Rng + ?Sized>(&self, rng: &mut R, max_value: f64) -> Result<f64> {
        self.sample_with_random_number_in_subrange(rng.gen::<f64>(), max_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn triangle() -> TabularDistribution {
        // density rising from 0 to 2 over [0, 1]
        TabularDistribution::lin_lin(vec![0.0, 1.0], vec![0.0, 7.0]).unwrap()
    }

    #[test]
    fn test_lin_lin_is_normalised() {
        let dist = triangle();
        assert_eq!(dist.cdf_values(), &[0.0, 1.0]);
        assert_relative_eq!(dist.evaluate_pdf(1.0), 2.0);
        assert_relative_eq!(dist.evaluate_pdf(0.25), 0.5);
        assert_relative_eq!(dist.evaluate_cdf(0.5), 0.25);
        assert_eq!(dist.evaluate_cdf(-1.0), 0.0);
        assert_eq!(dist.evaluate_cdf(2.0), 1.0);
        assert_eq!(dist.evaluate_pdf(1.5), 0.0);
    }

    #[test]
    fn test_lin_lin_inverse() {
        // cdf(x) = x^2
        let dist = triangle();
        for u in [0.0, 0.01, 0.25, 0.5, 0.81, 0.999] {
            assert_relative_eq!(
                dist.sample_with_random_number(u),
                f64::sqrt(u),
                max_relative = 1e-12
            );
        }
        assert_eq!(dist.sample_with_random_number(1.0), 1.0);
    }

    #[test]
    fn test_flat_and_multi_bin_round_trip() {
        let dist =
            TabularDistribution::lin_lin(vec![1.0, 2.0, 4.0, 5.0], vec![1.0, 1.0, 3.0, 0.5]).unwrap();
        for i in 0..50 {
            let u = i as f64 / 50.0;
            let x = dist.sample_with_random_number(u);
            assert_relative_eq!(dist.evaluate_cdf(x), u, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normalized_rebuild_keeps_every_bit() {
        let mut rng = StdRng::seed_from_u64(11);
        for n in 2..60 {
            let mut values = vec![rng.gen_range(-1.0..1.0)];
            for _ in 1..n {
                let last = values[values.len() - 1];
                values.push(last + rng.gen_range(1e-3..0.7));
            }
            let pdf: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..5.0)).collect();
            let dist = TabularDistribution::lin_lin(values, pdf).unwrap();
            let rebuilt = TabularDistribution::lin_lin_normalized(
                dist.values().to_vec(),
                dist.pdf_values().to_vec(),
                dist.cdf_values().to_vec(),
            )
            .unwrap();
            assert_eq!(rebuilt, dist);
        }
    }

    #[test]
    fn test_normalized_rebuild_rejects_inconsistent_cdf() {
        let dist = triangle();
        let err = TabularDistribution::lin_lin_normalized(
            dist.values().to_vec(),
            dist.pdf_values().to_vec(),
            vec![0.0, 0.9],
        )
        .unwrap_err();
        assert!(err.is_degenerate());
        let err = TabularDistribution::lin_lin_normalized(
            vec![0.0, 1.0, 2.0],
            vec![1.0, 1.0, 0.0],
            vec![0.0, 0.5, 1.0],
        )
        .unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_histogram_from_cdf() {
        let dist = TabularDistribution::from_cdf(vec![0.0, 1.0, 3.0], vec![0.0, 0.5, 1.0]).unwrap();
        assert_eq!(dist.shape(), TabularShape::Histogram);
        assert_relative_eq!(dist.evaluate_pdf(0.5), 0.5);
        assert_relative_eq!(dist.evaluate_pdf(2.0), 0.25);
        assert_relative_eq!(dist.evaluate_cdf(2.0), 0.75);
        assert_relative_eq!(dist.sample_with_random_number(0.75), 2.0);
        assert_relative_eq!(dist.sample_with_random_number(0.25), 0.5);
    }

    #[test]
    fn test_histogram_normalises_unscaled_cdf() {
        let dist = TabularDistribution::from_cdf(vec![0.0, 1.0, 2.0], vec![2.0, 4.0, 6.0]).unwrap();
        assert_eq!(dist.cdf_values(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_degenerate_distributions_rejected() {
        let err = TabularDistribution::lin_lin(vec![0.0, 1.0], vec![0.0, 0.0]).unwrap_err();
        assert!(err.is_degenerate());
        let err =
            TabularDistribution::from_cdf(vec![0.0, 1.0, 2.0], vec![0.0, 0.7, 0.4]).unwrap_err();
        assert!(err.is_degenerate());
        let err = TabularDistribution::lin_lin(vec![1.0, 1.0], vec![1.0, 1.0]).unwrap_err();
        assert!(err.is_degenerate());
        let err = TabularDistribution::lin_lin(vec![2.0, 1.0], vec![1.0, 1.0]).unwrap_err();
        assert!(err.is_degenerate());
        let err = TabularDistribution::lin_lin(vec![0.0, 1.0], vec![1.0, -1.0]).unwrap_err();
        assert!(err.is_degenerate());
        let err = TabularDistribution::lin_lin(vec![0.0, 1.0], vec![1.0]).unwrap_err();
        assert!(err.is_construction());
    }

    #[test]
    fn test_zero_probability_bins_are_skipped() {
        let dist =
            TabularDistribution::lin_lin(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 0.0, 1.0, 1.0]).unwrap();
        let x = dist.sample_with_random_number(0.0);
        assert!(x >= 1.0);
        assert_eq!(dist.evaluate_pdf(0.5), 0.0);
    }

    #[test]
    fn test_subrange_sampling() {
        let dist = triangle();
        let x = dist.sample_with_random_number_in_subrange(1.0, 0.5).unwrap();
        assert_relative_eq!(x, 0.5, max_relative = 1e-12);
        let x = dist.sample_with_random_number_in_subrange(0.5, 0.5).unwrap();
        assert_relative_eq!(x, f64::sqrt(0.125), max_relative = 1e-12);
        assert!(dist.sample_with_random_number_in_subrange(0.5, 1.5).is_err());
    }

    #[test]
    fn test_trials_are_recorded() {
        let dist = triangle();
        let mut rng = StdRng::seed_from_u64(7);
        let mut trials = 0;
        for _ in 0..10 {
            let x = dist.sample_and_record_trials(&mut rng, &mut trials);
            assert!((0.0..=1.0).contains(&x));
        }
        assert_eq!(trials, 10);
    }
}
