use std::collections::VecDeque;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::observables::mean_kinetic_energy;

/// Temperature from the mean kinetic energy per particle.
///
/// The 2/3 factor is used for every dimensionality.
pub fn temperature(mean_ke: f64, k_boltzmann: f64) -> f64 {
    (2.0 / 3.0) * mean_ke / k_boltzmann
}

/// Scheduled instantaneous rescale to `temperature` at `step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quench {
    pub step: usize,
    pub temperature: f64,
}

/// Velocity rescaling: an optional isothermal target plus a quench schedule.
#[derive(Debug, Clone, Default)]
pub struct Thermostat {
    isothermal: Option<f64>,
    schedule: VecDeque<Quench>,
    missed: Vec<Quench>,
}

impl Thermostat {
    /// Builds the controller for a run that starts at `start_step`.
    ///
    /// The schedule is sorted by trigger step, keeping the given order for
    /// entries that share a step. Entries already in the past are set aside
    /// as missed.
    pub fn new(isothermal: Option<f64>, mut quenches: Vec<Quench>, start_step: usize) -> Self {
        quenches.sort_by_key(|q| q.step);
        let mut thermostat = Thermostat {
            isothermal,
            schedule: quenches.into(),
            missed: Vec::new(),
        };
        thermostat.skip_past(start_step);
        thermostat
    }

    pub fn isothermal(&self) -> Option<f64> {
        self.isothermal
    }

    /// Quenches still waiting for their step.
    pub fn pending(&self) -> impl Iterator<Item = &Quench> {
        self.schedule.iter()
    }

    /// Quenches whose step passed before they could be applied.
    pub fn missed(&self) -> &[Quench] {
        &self.missed
    }

    /// Every quench that has not been applied, missed entries first.
    pub fn unconsumed(&self) -> Vec<Quench> {
        self.missed.iter().chain(self.schedule.iter()).copied().collect()
    }

    /// Rescale `velocities` for `step`: isothermal target first, then every
    /// quench scheduled for exactly this step, in schedule order.
    ///
    /// Returns the quenches that were applied.
    pub fn apply(
        &mut self,
        step: usize,
        velocities: &mut DMatrix<f64>,
        mass: f64,
        k_boltzmann: f64,
    ) -> Vec<Quench> {
        if let Some(target) = self.isothermal {
            rescale_to(velocities, target, mass, k_boltzmann);
        }

        self.skip_past(step);
        let mut applied = Vec::new();
        while let Some(quench) = self.schedule.front().copied() {
            if quench.step != step {
                break;
            }
            self.schedule.pop_front();
            info!("Step {}: quenching to T = {}", step, quench.temperature);
            rescale_to(velocities, quench.temperature, mass, k_boltzmann);
            applied.push(quench);
        }
        applied
    }

    fn skip_past(&mut self, step: usize) {
        while let Some(quench) = self.schedule.front().copied() {
            if quench.step >= step {
                break;
            }
            self.schedule.pop_front();
            warn!(
                "Quench to T = {} scheduled for step {} was missed (now at step {})",
                quench.temperature, quench.step, step
            );
            self.missed.push(quench);
        }
    }
}

/// Scale `velocities` so that their temperature becomes `target`.
///
/// Returns the temperature measured before scaling. A system at exactly zero
/// temperature is left alone since no scale factor can heat it.
pub fn rescale_to(velocities: &mut DMatrix<f64>, target: f64, mass: f64, k_boltzmann: f64) -> f64 {
    let current = temperature(mean_kinetic_energy(velocities, mass), k_boltzmann);
    if current == 0.0 {
        debug!("Skipping rescale of a system at zero temperature");
        return current;
    }
    *velocities *= (target / current).sqrt();
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn velocities_at(temp: f64) -> DMatrix<f64> {
        // one particle, unit mass and kB: KE = v^2 / 2, T = v^2 / 3
        DMatrix::from_element(1, 1, (3.0 * temp).sqrt())
    }

    #[test]
    fn test_temperature_uses_two_thirds() {
        assert_relative_eq!(temperature(3.0, 1.0), 2.0);
        assert_relative_eq!(temperature(3.0, 2.0), 1.0);
    }

    #[test]
    fn test_isothermal_rescale_factor() {
        let mut v = DMatrix::from_row_slice(2, 3, &[1.0, -2.0, 0.5, 0.3, 1.5, -1.0]);
        let mass = 1.7;
        let t0 = temperature(mean_kinetic_energy(&v, mass), 1.0);
        // bring the system to T = 2 first
        rescale_to(&mut v, 2.0, mass, 1.0);
        let before = v.clone();

        let mut thermostat = Thermostat::new(Some(1.0), vec![], 0);
        thermostat.apply(0, &mut v, mass, 1.0);

        assert!(t0 > 0.0);
        for (after, before) in v.iter().zip(before.iter()) {
            assert_relative_eq!(*after, before * 0.5f64.sqrt(), epsilon = 1e-12);
        }
        assert_relative_eq!(
            temperature(mean_kinetic_energy(&v, mass), 1.0),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_zero_temperature_is_left_alone() {
        let mut v = DMatrix::zeros(3, 4);
        let measured = rescale_to(&mut v, 5.0, 1.0, 1.0);
        assert_eq!(measured, 0.0);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_quenches_fire_on_their_step() {
        let schedule = vec![
            Quench { step: 5, temperature: 0.5 },
            Quench { step: 2, temperature: 3.0 },
        ];
        let mut thermostat = Thermostat::new(None, schedule, 0);
        let mut v = velocities_at(1.0);

        assert!(thermostat.apply(0, &mut v, 1.0, 1.0).is_empty());
        assert!(thermostat.apply(1, &mut v, 1.0, 1.0).is_empty());
        let applied = thermostat.apply(2, &mut v, 1.0, 1.0);
        assert_eq!(applied, vec![Quench { step: 2, temperature: 3.0 }]);
        assert_relative_eq!(temperature(0.5 * v[(0, 0)].powi(2), 1.0), 3.0, epsilon = 1e-12);
        assert_eq!(thermostat.unconsumed(), vec![Quench { step: 5, temperature: 0.5 }]);
    }

    #[test]
    fn test_same_step_quenches_apply_in_order() {
        let schedule = vec![
            Quench { step: 1, temperature: 4.0 },
            Quench { step: 1, temperature: 2.0 },
        ];
        let mut thermostat = Thermostat::new(None, schedule, 0);
        let mut v = velocities_at(1.0);
        let applied = thermostat.apply(1, &mut v, 1.0, 1.0);

        assert_eq!(applied.len(), 2);
        assert_eq!(applied[1].temperature, 2.0);
        assert_relative_eq!(temperature(0.5 * v[(0, 0)].powi(2), 1.0), 2.0, epsilon = 1e-12);
        assert!(thermostat.unconsumed().is_empty());
    }

    #[test]
    fn test_past_quenches_are_missed() {
        let schedule = vec![
            Quench { step: 3, temperature: 1.0 },
            Quench { step: 10, temperature: 2.0 },
        ];
        let thermostat = Thermostat::new(None, schedule, 4);
        assert_eq!(thermostat.missed(), &[Quench { step: 3, temperature: 1.0 }]);
        assert_eq!(thermostat.pending().count(), 1);
        assert_eq!(thermostat.unconsumed().len(), 2);
    }

    #[test]
    fn test_quench_follows_isothermal_rescale() {
        let schedule = vec![Quench { step: 0, temperature: 0.25 }];
        let mut thermostat = Thermostat::new(Some(1.0), schedule, 0);
        let mut v = velocities_at(4.0);
        thermostat.apply(0, &mut v, 1.0, 1.0);
        // the quench wins because it runs last
        assert_relative_eq!(temperature(0.5 * v[(0, 0)].powi(2), 1.0), 0.25, epsilon = 1e-12);

        // the isothermal target itself is unchanged by the quench
        thermostat.apply(1, &mut v, 1.0, 1.0);
        assert_relative_eq!(temperature(0.5 * v[(0, 0)].powi(2), 1.0), 1.0, epsilon = 1e-12);
    }
}
