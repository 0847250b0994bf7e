//! Synthetic damaged wind profiles for local development runs.

use chrono::{Duration, NaiveDateTime};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::Profile;
use crate::error::{DispatchError, DispatchResult};

/// Parameters of the synthetic wind capacity-factor process.
///
/// Each bus follows an AR(1) deviation around `mean_cf`:
/// ```text
/// d(t) = alpha * d(t-1) + epsilon(t)
/// cf(t) = clamp(mean_cf + d(t), 0, 1) * damage_factor
/// ```
/// where `epsilon` is Gaussian noise with standard deviation `noise_std`.
#[derive(Debug, Clone)]
pub struct SyntheticWind {
    /// Long-run mean capacity factor of the undamaged resource.
    pub mean_cf: f64,
    /// AR(1) persistence (0.0 = uncorrelated, 1.0 = random walk).
    pub alpha: f64,
    /// Innovation noise standard deviation.
    pub noise_std: f64,
    /// Multiplier applied to the undamaged capacity factor (0.0-1.0).
    pub damage_factor: f64,
    /// Master seed; bus `i` uses `seed + i`.
    pub seed: u64,
}

impl Default for SyntheticWind {
    fn default() -> Self {
        Self {
            mean_cf: 0.35,
            alpha: 0.95,
            noise_std: 0.05,
            damage_factor: 0.6,
            seed: 42,
        }
    }
}

/// Gaussian noise via the Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos() * std_dev
}

impl SyntheticWind {
    /// Generates an hourly profile of `hours` rows starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Profile`] if the parameters are out of range.
    pub fn generate(
        &self,
        buses: &[String],
        start: NaiveDateTime,
        hours: usize,
    ) -> DispatchResult<Profile> {
        if !(0.0..=1.0).contains(&self.mean_cf) || !(0.0..=1.0).contains(&self.damage_factor) {
            return Err(DispatchError::Profile(
                "mean_cf and damage_factor must lie in [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(DispatchError::Profile("alpha must lie in [0, 1]".to_string()));
        }

        let mut rngs: Vec<StdRng> = (0..buses.len())
            .map(|i| StdRng::seed_from_u64(self.seed.wrapping_add(i as u64)))
            .collect();
        let mut deviation = vec![0.0_f64; buses.len()];

        let index = (0..hours)
            .map(|h| start + Duration::hours(h as i64))
            .collect();
        let rows = (0..hours)
            .map(|_| {
                rngs.iter_mut()
                    .zip(deviation.iter_mut())
                    .map(|(rng, d)| {
                        *d = self.alpha * *d + gaussian_noise(rng, self.noise_std);
                        (self.mean_cf + *d).clamp(0.0, 1.0) * self.damage_factor
                    })
                    .collect()
            })
            .collect();

        Profile::new(index, buses.to_vec(), rows)
    }
}
