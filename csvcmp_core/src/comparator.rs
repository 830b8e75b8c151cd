use crate::field::FieldComparer;
use crate::tokenizer::{unescape_separator, LineTokenizer};
use csvcmp_common::{
    validate_config, CompareConfig, CompareOutcome, CsvCmpError, MatchStrategy, TokenizerMode,
};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Message printed when no divergence is found
pub const SAME_VALUES_MESSAGE: &str = "The files contain the same values.";

/// Engine for comparing two delimited files line by line.
///
/// Holds only configuration, so one instance can be shared across threads
/// comparing different file pairs.
#[derive(Debug, Clone)]
pub struct Comparator {
    tokenizer: LineTokenizer,
    fields: FieldComparer,
}

impl Comparator {
    /// Comma separated, quote-aware, significant-figure matching
    pub fn new() -> Self {
        Self {
            tokenizer: LineTokenizer::default(),
            fields: FieldComparer::default(),
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: LineTokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        debug!(?strategy, "numeric strategy selected");
        self.fields = FieldComparer::new(strategy);
        self
    }

    /// Build from stored settings; the delimiter is unescaped first
    pub fn from_config(config: &CompareConfig) -> Result<Self, CsvCmpError> {
        validate_config(config)?;
        let separator = unescape_separator(&config.delimiter)?;
        let tokenizer = LineTokenizer::new(separator, config.tokenizer)?;
        Ok(Self::new()
            .with_tokenizer(tokenizer)
            .with_strategy(config.match_strategy()))
    }

    pub fn tokenizer(&self) -> &LineTokenizer {
        &self.tokenizer
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.fields.strategy()
    }

    pub fn compare_fields<S0, S1>(&self, fields0: &[S0], fields1: &[S1]) -> CompareOutcome
    where
        S0: AsRef<str>,
        S1: AsRef<str>,
    {
        self.fields.compare(fields0, fields1)
    }

    /// Report the first divergence between two line lists.
    ///
    /// Errors only come from the quote-aware tokenizer; every mismatch is an
    /// `Unequal` outcome.
    pub fn compare_linelists<S: AsRef<str>>(
        &self,
        list0: &[S],
        list1: &[S],
    ) -> Result<CompareOutcome, CsvCmpError> {
        if list0.len() != list1.len() {
            debug!(left = list0.len(), right = list1.len(), "line counts differ");
            return Ok(CompareOutcome::Unequal(format!(
                "Unequal numbers of lines ({}, {})",
                list0.len(),
                list1.len()
            )));
        }

        match self.tokenizer.mode() {
            TokenizerMode::Naive => Ok(self.compare_split_lines(list0, list1)),
            TokenizerMode::Quoted => self.compare_records(list0, list1),
        }
    }

    fn compare_split_lines<S: AsRef<str>>(&self, list0: &[S], list1: &[S]) -> CompareOutcome {
        for (idx, (line0, line1)) in list0.iter().zip(list1).enumerate() {
            let (line0, line1) = (line0.as_ref().trim_end(), line1.as_ref().trim_end());
            if line0 == line1 {
                continue;
            }

            let fields0 = self.tokenizer.split_line(line0);
            let fields1 = self.tokenizer.split_line(line1);
            let outcome = self.fields.compare(&fields0, &fields1);
            if !outcome.is_equal() {
                debug!(line = idx + 1, "first difference found");
                return outcome.with_context(format!("On line {}: ", idx + 1));
            }
        }

        CompareOutcome::Equal
    }

    fn compare_records<S: AsRef<str>>(
        &self,
        list0: &[S],
        list1: &[S],
    ) -> Result<CompareOutcome, CsvCmpError> {
        let records0 = self.tokenizer.tokenize_records(list0)?;
        let records1 = self.tokenizer.tokenize_records(list1)?;

        if records0.len() != records1.len() {
            debug!(left = records0.len(), right = records1.len(), "record counts differ");
            return Ok(CompareOutcome::Unequal(format!(
                "Unequal numbers of records ({}, {})",
                records0.len(),
                records1.len()
            )));
        }

        for (record0, record1) in records0.iter().zip(&records1) {
            let outcome = self.fields.compare(&record0.fields, &record1.fields);
            if !outcome.is_equal() {
                debug!(line = record0.line, "first difference found");
                return Ok(outcome.with_context(format!("On line {}: ", record0.line)));
            }
        }

        Ok(CompareOutcome::Equal)
    }

    /// Read both files fully and compare their lines
    pub fn compare_files(&self, left: &Path, right: &Path) -> Result<CompareOutcome, CsvCmpError> {
        let text0 = fs::read_to_string(left)?;
        let text1 = fs::read_to_string(right)?;

        let lines0: Vec<&str> = text0.lines().collect();
        let lines1: Vec<&str> = text1.lines().collect();
        debug!(
            left = %left.display(),
            right = %right.display(),
            lines = lines0.len(),
            "comparing files"
        );

        self.compare_linelists(&lines0, &lines1)
    }
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn tab_comparator(mode: TokenizerMode) -> Comparator {
        Comparator::new().with_tokenizer(LineTokenizer::new("\t", mode).unwrap())
    }

    fn create_temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const LEFT: [&str; 4] = ["same1", "same2\tsame2", "same\t3.00\t0", "same4\tsame4"];
    const RIGHT: [&str; 4] = ["same1", "same2\tsame2", "same\t3.0\t0.0", "same4\tsame4"];

    #[test]
    fn test_numerically_equal_linelists() {
        for mode in [TokenizerMode::Quoted, TokenizerMode::Naive] {
            let result = tab_comparator(mode).compare_linelists(&LEFT, &RIGHT).unwrap();
            assert_eq!(result, CompareOutcome::Equal, "{mode:?}");
        }
    }

    #[test]
    fn test_numerically_unequal_linelists() {
        let right = ["same1", "same2\tsame2", "same\t3.1\t0.0", "same4\tsame4"];
        for mode in [TokenizerMode::Quoted, TokenizerMode::Naive] {
            let result = tab_comparator(mode).compare_linelists(&LEFT, &right).unwrap();
            assert_eq!(
                result,
                CompareOutcome::Unequal("On line 3: field 2 differs (3.00, 3.1)".to_string()),
                "{mode:?}"
            );
        }
    }

    #[test]
    fn test_quotation_marks_are_transparent() {
        let result = tab_comparator(TokenizerMode::Quoted)
            .compare_linelists(&["one\ttwo\tthree"], &["one\t\"two\"\tthree"])
            .unwrap();
        assert!(result.is_equal());

        let result = Comparator::new()
            .compare_linelists(&["one,two,three"], &["one,\"two\",three"])
            .unwrap();
        assert!(result.is_equal());
    }

    #[test]
    fn test_naive_mode_keeps_quotes() {
        let result = tab_comparator(TokenizerMode::Naive)
            .compare_linelists(&["one\ttwo"], &["one\t\"two\""])
            .unwrap();
        assert_eq!(
            result,
            CompareOutcome::Unequal("On line 1: field 2 differs (two, \"two\")".to_string())
        );
    }

    #[test]
    fn test_line_count_mismatch() {
        let result = Comparator::new().compare_linelists(&["x"], &["x", "y"]).unwrap();
        assert_eq!(
            result,
            CompareOutcome::Unequal("Unequal numbers of lines (1, 2)".to_string())
        );
    }

    #[test]
    fn test_line_count_checked_before_tokenizing() {
        // An unterminated quote would otherwise be tokenized
        let result = Comparator::new()
            .compare_linelists(&["\"open"], &["a", "b"])
            .unwrap();
        assert_eq!(
            result,
            CompareOutcome::Unequal("Unequal numbers of lines (1, 2)".to_string())
        );
    }

    #[test]
    fn test_field_count_mismatch_reports_line() {
        let result = Comparator::new()
            .compare_linelists(&["a,b", "c,d"], &["a,b", "c"])
            .unwrap();
        assert_eq!(
            result,
            CompareOutcome::Unequal("On line 2: Lengths differ (2, 1)".to_string())
        );
    }

    #[test]
    fn test_blank_lines_are_empty_records() {
        let result = Comparator::new()
            .compare_linelists(&["a", "", "b"], &["a", "b", ""])
            .unwrap();
        assert_eq!(
            result,
            CompareOutcome::Unequal("On line 2: Lengths differ (0, 1)".to_string())
        );

        let result = Comparator::new()
            .compare_linelists(&["a", "", "3.0"], &["a", "", "3"])
            .unwrap();
        assert!(result.is_equal());
    }

    #[test]
    fn test_spaces_after_separator_are_skipped() {
        let result = Comparator::new()
            .compare_linelists(&["one, \"two\""], &["one,two"])
            .unwrap();
        assert!(result.is_equal());

        let result = Comparator::new()
            .compare_linelists(&["a,\"  b\""], &["a,b"])
            .unwrap();
        assert_eq!(
            result,
            CompareOutcome::Unequal("On line 1: field 2 differs (  b, b)".to_string())
        );
    }

    #[test]
    fn test_padded_number_matches() {
        let result = Comparator::new()
            .compare_linelists(&["3.00 ,x"], &["3,x"])
            .unwrap();
        assert!(result.is_equal());
    }

    #[test]
    fn test_record_count_mismatch() {
        let result = Comparator::new()
            .compare_linelists(&["\"a", "b\""], &["a", "b"])
            .unwrap();
        assert_eq!(
            result,
            CompareOutcome::Unequal("Unequal numbers of records (1, 2)".to_string())
        );
    }

    #[test]
    fn test_relative_strategy() {
        let comparator = Comparator::new().with_strategy(MatchStrategy::relative());
        assert!(comparator
            .compare_linelists(&["a,100"], &["a,100.5"])
            .unwrap()
            .is_equal());
        assert_eq!(
            comparator.compare_linelists(&["a,100"], &["a,102"]).unwrap(),
            CompareOutcome::Unequal("On line 1: field 2 differs (100, 102)".to_string())
        );
    }

    #[test]
    fn test_from_config_unescapes_delimiter() {
        let config = CompareConfig {
            delimiter: "\\t".to_string(),
            tokenizer: TokenizerMode::Naive,
            ..CompareConfig::default()
        };
        let comparator = Comparator::from_config(&config).unwrap();
        assert_eq!(comparator.tokenizer().separator(), "\t");
        assert_eq!(comparator.tokenizer().mode(), TokenizerMode::Naive);
        assert_eq!(comparator.strategy(), MatchStrategy::SignificantFigureMatch);
    }

    #[test]
    fn test_from_config_rejects_multi_byte_quoted_separator() {
        let config = CompareConfig {
            delimiter: "::".to_string(),
            ..CompareConfig::default()
        };
        assert!(matches!(
            Comparator::from_config(&config),
            Err(CsvCmpError::Separator(_))
        ));
    }

    #[test]
    fn test_from_config_rejects_negative_tolerance() {
        let config = CompareConfig {
            tolerance: -0.5,
            ..CompareConfig::default()
        };
        assert!(matches!(
            Comparator::from_config(&config),
            Err(CsvCmpError::Config(_))
        ));
    }

    #[test]
    fn test_compare_files() {
        let left = create_temp_file("name,value\nalpha,3.00\nbeta,1.00e-07\n");
        let right = create_temp_file("name,value\nalpha,3.0\nbeta,9.9952e-8\n");

        let result = Comparator::new().compare_files(left.path(), right.path()).unwrap();
        assert_eq!(result, CompareOutcome::Equal);
    }

    #[test]
    fn test_compare_files_missing_file() {
        let left = create_temp_file("a\n");
        let missing = left.path().with_extension("missing");

        let err = Comparator::new().compare_files(left.path(), &missing).unwrap_err();
        assert!(matches!(err, CsvCmpError::Io(_)));
    }

    #[test]
    fn test_shared_across_threads() {
        let comparator = std::sync::Arc::new(tab_comparator(TokenizerMode::Naive));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let comparator = comparator.clone();
                std::thread::spawn(move || comparator.compare_linelists(&LEFT, &RIGHT).unwrap())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_equal());
        }
    }
}
