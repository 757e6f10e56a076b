use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::utils::linspace;

/// How values of a variable are drawn when it is held fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Uniform over the closed range.
    #[default]
    Continuous,
    /// Uniform over an evenly spaced grid spanning the range.
    Discrete,
}

/// One input dimension of a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Symbol used when binding skeletons to this variable.
    pub name: String,
    pub kind: VariableKind,
    pub lower: f64,
    pub upper: f64,
}

impl Variable {
    pub fn new(name: impl Into<String>, kind: VariableKind, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            lower,
            upper,
        }
    }

    pub fn continuous(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self::new(name, VariableKind::Continuous, lower, upper)
    }

    pub fn discrete(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self::new(name, VariableKind::Discrete, lower, upper)
    }

    /// Range is finite and ordered.
    pub fn is_valid(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite() && self.lower <= self.upper
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Draw one fixed value according to the variable kind.
    pub fn draw_fixed<R: Rng + ?Sized>(&self, rng: &mut R, grid_points: usize) -> f64 {
        match self.kind {
            VariableKind::Continuous => self.draw_uniform(rng),
            VariableKind::Discrete => {
                let grid = linspace(self.lower, self.upper, grid_points.max(1));
                grid[rng.gen_range(0..grid.len())]
            }
        }
    }

    /// Draw uniformly over the closed range regardless of kind.
    #[inline]
    pub fn draw_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.lower..=self.upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn continuous_draws_stay_in_range() {
        let v = Variable::continuous("x0", -2.0, 3.0);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(v.contains(v.draw_fixed(&mut rng, 100)));
        }
    }

    #[test]
    fn discrete_draws_land_on_grid() {
        let v = Variable::discrete("x1", 0.0, 99.0);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        for _ in 0..200 {
            let value = v.draw_fixed(&mut rng, 100);
            assert!((value - value.round()).abs() < 1e-9);
            assert!(v.contains(value));
        }
    }

    #[test]
    fn degenerate_range_is_valid() {
        let v = Variable::continuous("x", 1.0, 1.0);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        assert!(v.is_valid());
        assert_eq!(v.draw_uniform(&mut rng), 1.0);
        assert!(!Variable::continuous("x", 2.0, 1.0).is_valid());
        assert!(!Variable::continuous("x", f64::NAN, 1.0).is_valid());
    }
}
