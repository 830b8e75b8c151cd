use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of comparing two files, two line lists or two field lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum CompareOutcome {
    /// No divergence found
    Equal,
    /// Description of the first divergence
    Unequal(String),
}

impl CompareOutcome {
    pub fn is_equal(&self) -> bool {
        matches!(self, CompareOutcome::Equal)
    }

    /// Prefix the description of an unequal outcome, leaving `Equal` untouched
    pub fn with_context(self, context: impl fmt::Display) -> Self {
        match self {
            CompareOutcome::Equal => CompareOutcome::Equal,
            CompareOutcome::Unequal(msg) => CompareOutcome::Unequal(format!("{context}{msg}")),
        }
    }
}

/// How two scalar fields are judged to be the same number
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// Equal within the resolution of the less precise literal
    #[default]
    SignificantFigureMatch,
    /// Equal when the difference is within `tolerance` times the smaller magnitude
    RelativeToleranceMatch { tolerance: f64 },
}

impl MatchStrategy {
    pub const DEFAULT_TOLERANCE: f64 = 0.01;

    pub fn relative() -> Self {
        MatchStrategy::RelativeToleranceMatch {
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }
}

/// Strategy names as they appear in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    SigFigs,
    Relative,
}

/// How a raw line is split into fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenizerMode {
    /// Delimited-record parsing with quote stripping
    #[default]
    Quoted,
    /// Plain split on the separator string
    Naive,
}

/// Comparison settings, as stored in `csvcmp.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Field separator in escaped form (e.g. `"\\t"`)
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    #[serde(default)]
    pub strategy: StrategyKind,

    /// Relative tolerance used by the `relative` strategy
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    #[serde(default)]
    pub tokenizer: TokenizerMode,
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_tolerance() -> f64 {
    MatchStrategy::DEFAULT_TOLERANCE
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            strategy: StrategyKind::default(),
            tolerance: default_tolerance(),
            tokenizer: TokenizerMode::default(),
        }
    }
}

impl CompareConfig {
    pub fn match_strategy(&self) -> MatchStrategy {
        match self.strategy {
            StrategyKind::SigFigs => MatchStrategy::SignificantFigureMatch,
            StrategyKind::Relative => MatchStrategy::RelativeToleranceMatch {
                tolerance: self.tolerance,
            },
        }
    }
}
