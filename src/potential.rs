//! Pairwise potentials.
//!
//! The simulation only needs the [`Potential`] capability; the concrete
//! models below cover the usual reduced-unit test systems.

use crate::error::ConfigError;

/// A central pair interaction as a function of separation distance.
///
/// `force` returns the radial derivative `dV/dr`. Along the unit vector that
/// points from the first particle of a pair to the second, the first particle
/// is accelerated by `+force / m` and the second by `-force / m`, so positive
/// values attract and negative values repel.
pub trait Potential {
    fn force(&self, r: f64) -> f64;

    fn potential(&self, r: f64) -> f64;

    /// Distance of the potential minimum, when there is one.
    fn equilibrium_distance(&self) -> Option<f64> {
        None
    }
}

impl<P: Potential + ?Sized> Potential for &P {
    fn force(&self, r: f64) -> f64 {
        (**self).force(r)
    }
    fn potential(&self, r: f64) -> f64 {
        (**self).potential(r)
    }
    fn equilibrium_distance(&self) -> Option<f64> {
        (**self).equilibrium_distance()
    }
}

impl<P: Potential + ?Sized> Potential for Box<P> {
    fn force(&self, r: f64) -> f64 {
        (**self).force(r)
    }
    fn potential(&self, r: f64) -> f64 {
        (**self).potential(r)
    }
    fn equilibrium_distance(&self) -> Option<f64> {
        (**self).equilibrium_distance()
    }
}

/// No interaction at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ideal;

impl Potential for Ideal {
    fn force(&self, _r: f64) -> f64 {
        0.0
    }
    fn potential(&self, _r: f64) -> f64 {
        0.0
    }
}

/// Lennard-Jones 12-6 potential, `V(r) = 4ε((σ/r)^12 - (σ/r)^6)`.
#[derive(Debug, Clone, Copy)]
pub struct LennardJones {
    pub epsilon: f64,
    pub sigma: f64,
}

impl LennardJones {
    pub fn new(epsilon: f64, sigma: f64) -> Self {
        LennardJones { epsilon, sigma }
    }

    #[inline]
    fn inv_r6(&self, r: f64) -> f64 {
        let inv_r2 = self.sigma * self.sigma / (r * r);
        inv_r2 * inv_r2 * inv_r2
    }
}

impl Potential for LennardJones {
    fn force(&self, r: f64) -> f64 {
        let inv_r6 = self.inv_r6(r);
        24.0 * self.epsilon * (inv_r6 - 2.0 * inv_r6 * inv_r6) / r
    }

    fn potential(&self, r: f64) -> f64 {
        let inv_r6 = self.inv_r6(r);
        4.0 * self.epsilon * (inv_r6 * inv_r6 - inv_r6)
    }

    fn equilibrium_distance(&self) -> Option<f64> {
        Some(2f64.powf(1.0 / 6.0) * self.sigma)
    }
}

/// Generalised Mie `m`-`n` potential, normalised so the well depth is `ε`.
#[derive(Debug, Clone, Copy)]
pub struct Mie {
    pub epsilon: f64,
    pub sigma: f64,
    pub m: f64,
    pub n: f64,
    prefactor: f64,
}

impl Mie {
    pub fn new(epsilon: f64, sigma: f64, m: f64, n: f64) -> Result<Self, ConfigError> {
        if !(n > 0.0 && m > n) {
            return Err(ConfigError::Potential(format!(
                "Mie exponents need m > n > 0, found m = {m}, n = {n}"
            )));
        }
        if sigma <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "Mie sigma",
                value: sigma,
            });
        }
        let prefactor = (m / (m - n)) * (m / n).powf(n / (m - n));
        Ok(Mie {
            epsilon,
            sigma,
            m,
            n,
            prefactor,
        })
    }
}

impl Potential for Mie {
    fn force(&self, r: f64) -> f64 {
        let x = self.sigma / r;
        self.prefactor * self.epsilon * (self.n * x.powf(self.n) - self.m * x.powf(self.m)) / r
    }

    fn potential(&self, r: f64) -> f64 {
        let x = self.sigma / r;
        self.prefactor * self.epsilon * (x.powf(self.m) - x.powf(self.n))
    }

    fn equilibrium_distance(&self) -> Option<f64> {
        Some(self.sigma * (self.m / self.n).powf(1.0 / (self.m - self.n)))
    }
}

/// Mie potential evaluated at the softened distance `s = sqrt(r² + a²)`.
///
/// Stays finite when two particles overlap, which makes it forgiving for
/// dense initial lattices.
#[derive(Debug, Clone, Copy)]
pub struct BoundedMie {
    pub mie: Mie,
    pub a: f64,
}

impl BoundedMie {
    pub fn new(a: f64, epsilon: f64, sigma: f64, m: f64, n: f64) -> Result<Self, ConfigError> {
        if a < 0.0 {
            return Err(ConfigError::Negative {
                name: "bounded Mie softening",
                value: a,
            });
        }
        Ok(BoundedMie {
            mie: Mie::new(epsilon, sigma, m, n)?,
            a,
        })
    }

    #[inline]
    fn softened(&self, r: f64) -> f64 {
        (r * r + self.a * self.a).sqrt()
    }
}

impl Potential for BoundedMie {
    fn force(&self, r: f64) -> f64 {
        let s = self.softened(r);
        self.mie.force(s) * r / s
    }

    fn potential(&self, r: f64) -> f64 {
        self.mie.potential(self.softened(r))
    }

    fn equilibrium_distance(&self) -> Option<f64> {
        let r_min = self.mie.equilibrium_distance()?;
        (r_min > self.a).then(|| (r_min * r_min - self.a * self.a).sqrt())
    }
}

/// Harmonic spring, `V(r) = k (r - r0)^2 / 2`.
#[derive(Debug, Clone, Copy)]
pub struct Harmonic {
    pub k: f64,
    pub r0: f64,
}

impl Harmonic {
    pub fn new(k: f64, r0: f64) -> Self {
        Harmonic { k, r0 }
    }
}

impl Potential for Harmonic {
    fn force(&self, r: f64) -> f64 {
        self.k * (r - self.r0)
    }

    fn potential(&self, r: f64) -> f64 {
        0.5 * self.k * (r - self.r0).powi(2)
    }

    fn equilibrium_distance(&self) -> Option<f64> {
        Some(self.r0)
    }
}
