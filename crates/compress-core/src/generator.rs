use crate::{Symbol, EMPTY};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("number of zeros ({zeros}) cannot exceed length ({length})")]
    TooManyZeros { zeros: usize, length: usize },
}

/// Shape of generated starting sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Number of cells
    pub length: usize,
    /// Number of empty cells; the rest hold `1`
    pub zeros: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            length: 9,
            zeros: 3,
        }
    }
}

/// Random starting sequences of ones and empty cells
pub struct Generator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    pub fn new() -> Self {
        Self {
            config: GeneratorConfig::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for reproducible runs
    pub fn with_seed(config: GeneratorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> GeneratorConfig {
        self.config
    }

    /// Shuffled sequence with exactly `zeros` empty cells
    pub fn generate(&mut self) -> Result<Vec<Symbol>, GeneratorError> {
        let GeneratorConfig { length, zeros } = self.config;
        if zeros > length {
            return Err(GeneratorError::TooManyZeros { zeros, length });
        }
        let mut state = vec![1; length - zeros];
        state.extend(std::iter::repeat(EMPTY).take(zeros));
        state.shuffle(&mut self.rng);
        Ok(state)
    }

    /// Uniform index into a sequence of `length` cells
    pub fn hole(&mut self, length: usize) -> Option<usize> {
        (length > 0).then(|| self.rng.gen_range(0..length))
    }
}

/// Random state of `length` cells with `zeros` of them empty
pub fn generate_random_state(length: usize, zeros: usize) -> Result<Vec<Symbol>, GeneratorError> {
    Generator::with_config(GeneratorConfig { length, zeros }).generate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_counts() {
        let state = generate_random_state(9, 3).unwrap();
        assert_eq!(state.len(), 9);
        assert_eq!(state.iter().filter(|&&s| s == EMPTY).count(), 3);
        assert_eq!(state.iter().filter(|&&s| s == 1).count(), 6);
    }

    #[test]
    fn test_too_many_zeros() {
        assert_eq!(
            generate_random_state(3, 4),
            Err(GeneratorError::TooManyZeros { zeros: 4, length: 3 })
        );
    }

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let config = GeneratorConfig { length: 12, zeros: 5 };
        let a = Generator::with_seed(config, 42).generate().unwrap();
        let b = Generator::with_seed(config, 42).generate().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hole_in_range() {
        let mut generator = Generator::with_seed(GeneratorConfig::default(), 7);
        for _ in 0..50 {
            assert!(generator.hole(9).unwrap() < 9);
        }
        assert_eq!(generator.hole(0), None);
    }

    #[test]
    fn test_generated_state_and_hole_build_an_engine() {
        let config = GeneratorConfig { length: 8, zeros: 2 };
        let mut generator = Generator::with_seed(config, 3);
        let state = generator.generate().unwrap();
        let hole = generator.hole(state.len());
        let engine = crate::Engine::new(&state, hole).unwrap();
        assert_eq!(engine.root(), state.as_slice());
        assert_eq!(engine.hole(), hole);
    }
}
