//! Numeric equivalence of field literals.
//!
//! Two fields are the same value if they are textually identical, or if both
//! parse as numbers that agree under the configured [`MatchStrategy`]:
//!
//! * [`MatchStrategy::SignificantFigureMatch`] compares the digit sequences
//!   written in each literal, treating the less precise literal's last digit
//!   as the tolerance band. `"3.0"` and `"3.04"` agree, `"3.00"` and `"3.04"`
//!   do not.
//! * [`MatchStrategy::RelativeToleranceMatch`] accepts any difference no
//!   larger than `tolerance` times the smaller magnitude.

use csvcmp_common::MatchStrategy;
use regex::Regex;
use std::sync::OnceLock;

/// Integer mantissas are compared as `u128`; longer digit runs are truncated.
/// 37 digits leaves headroom for the `* 10` straddle correction.
const MAX_MANTISSA_DIGITS: usize = 37;

fn literal_regex() -> &'static Regex {
    static LITERAL: OnceLock<Regex> = OnceLock::new();
    LITERAL.get_or_init(|| {
        Regex::new(r"^([-+])?([0-9]*)\.?([0-9]+)([eE][-+]?[0-9]+)?$")
            .expect("numeric literal pattern is valid")
    })
}

/// Lexical breakdown of a decimal literal such as `-12.50e+3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericLiteral<'a> {
    pub negative: bool,
    /// Digits before the decimal point (may be empty, as in `.5`)
    pub integer_digits: &'a str,
    /// Digits after the decimal point, or the trailing digit run when there is no point
    pub fraction_digits: &'a str,
    /// Exponent including its marker, e.g. `e-07`
    pub exponent: Option<&'a str>,
}

impl<'a> NumericLiteral<'a> {
    /// Split `literal` into its lexical parts, or `None` if it is not a
    /// plain decimal literal. `"3."`, `"inf"` and `"1_000"` do not match.
    pub fn parse(literal: &'a str) -> Option<Self> {
        let caps = literal_regex().captures(literal)?;
        Some(Self {
            negative: caps.get(1).is_some_and(|m| m.as_str() == "-"),
            integer_digits: caps.get(2).map_or("", |m| m.as_str()),
            fraction_digits: caps.get(3).map_or("", |m| m.as_str()),
            exponent: caps.get(4).map(|m| m.as_str()),
        })
    }

    /// Integer and fractional digits concatenated, e.g. `"300"` for `3.00`
    pub fn mantissa_digits(&self) -> String {
        let mut digits = String::with_capacity(self.sig_figs());
        digits.push_str(self.integer_digits);
        digits.push_str(self.fraction_digits);
        digits
    }

    /// Number of written mantissa digits; the exponent does not count
    pub fn sig_figs(&self) -> usize {
        self.integer_digits.len() + self.fraction_digits.len()
    }
}

/// Scalar equivalence policy applied to each field pair
pub trait NumericEquivalence {
    fn equal(&self, a: &str, b: &str) -> bool;
}

impl NumericEquivalence for MatchStrategy {
    fn equal(&self, a: &str, b: &str) -> bool {
        match *self {
            MatchStrategy::SignificantFigureMatch => equal_to_given_precision(a, b),
            MatchStrategy::RelativeToleranceMatch { tolerance } => {
                equal_within_tolerance(a, b, tolerance)
            }
        }
    }
}

/// Surrounding whitespace is ignored, so a padded `3.00 ` still reads as a number
fn parse_pair(a: &str, b: &str) -> Option<(f64, f64)> {
    Some((a.trim().parse::<f64>().ok()?, b.trim().parse::<f64>().ok()?))
}

/// Significant-figure aware comparison.
pub fn equal_to_given_precision(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }

    let Some((f0, f1)) = parse_pair(a, b) else {
        return false;
    };

    // Also catches -0 against 0
    if f0 == f1 {
        return true;
    }

    // Opposite signs
    if f0.copysign(f1) != f0 {
        return false;
    }

    let (p0, p1) = (f0.abs(), f1.abs());
    if p0 >= p1 * 10.0 || p1 >= p0 * 10.0 {
        return false;
    }

    let (Some(lit0), Some(lit1)) = (NumericLiteral::parse(a.trim()), NumericLiteral::parse(b.trim()))
    else {
        return false;
    };

    let (sig0, sig1) = (lit0.sig_figs(), lit1.sig_figs());
    let max_sig = sig0.max(sig1);
    let min_sig = sig0.min(sig1);

    let excess = max_sig.saturating_sub(MAX_MANTISSA_DIGITS);
    let width = max_sig - excess;
    let diff_exp = (max_sig - min_sig).saturating_sub(excess);

    let (Some(mut m0), Some(mut m1)) = (
        padded_mantissa(&lit0, max_sig, width),
        padded_mantissa(&lit1, max_sig, width),
    ) else {
        return false;
    };
    let max_diff = 10u128.pow(diff_exp as u32);

    // Values straddling a power of ten (9.9952e-8 against 1.00e-07) come out
    // an order of magnitude apart after alignment. Only correct when the
    // parsed magnitudes confirm the values really are close.
    if m0 * 9 < m1 && p0 * 9.0 >= p1 {
        m0 *= 10;
    }
    if m1 * 9 < m0 && p1 * 9.0 >= p0 {
        m1 *= 10;
    }

    m0.abs_diff(m1) < max_diff
}

/// Right-pad the mantissa with zeros to `total` digits, keep the leading `width`.
fn padded_mantissa(literal: &NumericLiteral<'_>, total: usize, width: usize) -> Option<u128> {
    let mut digits = literal.mantissa_digits();
    digits.push_str(&"0".repeat(total - digits.len()));
    digits.truncate(width);
    digits.parse::<u128>().ok()
}

/// Fixed relative tolerance comparison.
///
/// A zero on either side makes the band zero, so only an exact match passes.
pub fn equal_within_tolerance(a: &str, b: &str, tolerance: f64) -> bool {
    if a == b {
        return true;
    }

    let Some((f0, f1)) = parse_pair(a, b) else {
        return false;
    };

    let smaller = f0.abs().min(f1.abs());
    let band = smaller * tolerance;
    (f0 - f1).abs() <= band
}
