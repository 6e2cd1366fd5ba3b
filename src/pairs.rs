use crate::error::ConfigError;

/// Every unordered particle pair of a system, enumerated once.
///
/// Pairs are listed lexicographically over `(i, j)` with `i < j`, so pair `k`
/// always refers to the same two particles for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairIndex {
    n_particles: usize,
    first: Vec<usize>,
    second: Vec<usize>,
}

impl PairIndex {
    /// Build the pair list for `n_particles`. Fewer than two particles cannot
    /// interact and are rejected.
    pub fn build(n_particles: usize) -> Result<Self, ConfigError> {
        if n_particles < 2 {
            return Err(ConfigError::TooFewParticles(n_particles));
        }

        let n_pairs = n_particles * (n_particles - 1) / 2;
        let mut first = Vec::with_capacity(n_pairs);
        let mut second = Vec::with_capacity(n_pairs);
        for i in 0..n_particles {
            for j in (i + 1)..n_particles {
                first.push(i);
                second.push(j);
            }
        }

        Ok(Self {
            n_particles,
            first,
            second,
        })
    }

    pub fn n_particles(&self) -> usize {
        self.n_particles
    }

    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// First member `a[k]` of every pair.
    pub fn first(&self) -> &[usize] {
        &self.first
    }

    /// Second member `b[k]` of every pair.
    pub fn second(&self) -> &[usize] {
        &self.second
    }

    #[inline]
    pub fn pair(&self, k: usize) -> (usize, usize) {
        (self.first[k], self.second[k])
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.first.iter().copied().zip(self.second.iter().copied())
    }
}
