use crate::numeric::NumericEquivalence;
use csvcmp_common::{CompareOutcome, MatchStrategy};

/// Compares two field lists elementwise
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldComparer {
    strategy: MatchStrategy,
}

impl FieldComparer {
    pub fn new(strategy: MatchStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Report the first differing field, using 1-based field numbers.
    ///
    /// Lists of different length are reported without looking at any field.
    pub fn compare<S0, S1>(&self, fields0: &[S0], fields1: &[S1]) -> CompareOutcome
    where
        S0: AsRef<str>,
        S1: AsRef<str>,
    {
        if fields0.len() != fields1.len() {
            return CompareOutcome::Unequal(format!(
                "Lengths differ ({}, {})",
                fields0.len(),
                fields1.len()
            ));
        }

        for (idx, (v0, v1)) in fields0.iter().zip(fields1).enumerate() {
            let (v0, v1) = (v0.as_ref(), v1.as_ref());
            if !self.strategy.equal(v0, v1) {
                return CompareOutcome::Unequal(format!(
                    "field {} differs ({}, {})",
                    idx + 1,
                    v0,
                    v1
                ));
            }
        }

        CompareOutcome::Equal
    }
}
