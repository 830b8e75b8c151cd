pub mod comparator;
pub mod field;
pub mod numeric;
pub mod tokenizer;

pub use comparator::{Comparator, SAME_VALUES_MESSAGE};
pub use field::FieldComparer;
pub use numeric::{
    equal_to_given_precision, equal_within_tolerance, NumericEquivalence, NumericLiteral,
};
pub use tokenizer::{unescape_separator, LineTokenizer, Record};
