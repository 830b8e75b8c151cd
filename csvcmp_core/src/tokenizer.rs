use csv::ReaderBuilder;
use csvcmp_common::{CsvCmpError, TokenizerMode};

/// One parsed record and the physical line it starts on (1-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: u64,
    pub fields: Vec<String>,
}

/// Splits raw lines into fields
#[derive(Debug, Clone)]
pub struct LineTokenizer {
    separator: String,
    mode: TokenizerMode,
}

impl LineTokenizer {
    pub fn new(separator: impl Into<String>, mode: TokenizerMode) -> Result<Self, CsvCmpError> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(CsvCmpError::Separator("separator must not be empty".to_string()));
        }
        if mode == TokenizerMode::Quoted && separator.len() != 1 {
            return Err(CsvCmpError::Separator(format!(
                "quote-aware tokenizing needs a single-byte separator, got {:?}",
                separator
            )));
        }
        Ok(Self { separator, mode })
    }

    pub fn quoted(separator: impl Into<String>) -> Result<Self, CsvCmpError> {
        Self::new(separator, TokenizerMode::Quoted)
    }

    pub fn naive(separator: impl Into<String>) -> Result<Self, CsvCmpError> {
        Self::new(separator, TokenizerMode::Naive)
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn mode(&self) -> TokenizerMode {
        self.mode
    }

    /// Naive split: strip trailing whitespace, then split on the separator
    pub fn split_line(&self, line: &str) -> Vec<String> {
        line.trim_end()
            .split(self.separator.as_str())
            .map(str::to_string)
            .collect()
    }

    /// Parse a whole line list as one delimited record stream.
    ///
    /// Every physical line starts a record unless it continues a quoted field
    /// opened on an earlier line. A blank line is a record with no fields.
    /// Spaces at the start of an unquoted position are skipped before the
    /// record is parsed, so `a, "b"` yields `b`.
    pub fn tokenize_records<S: AsRef<str>>(
        &self,
        lines: &[S],
    ) -> Result<Vec<Record>, CsvCmpError> {
        let separator = self.separator.as_bytes()[0] as char;
        let mut records = Vec::new();
        let mut pending = String::new();
        let mut start_line = 0u64;
        let mut state = FieldState::Start;

        for (idx, line) in lines.iter().enumerate() {
            let line = line.as_ref().trim_end_matches(|c: char| c == '\r' || c == '\n');
            if state == FieldState::Quoted {
                pending.push('\n');
            } else {
                start_line = idx as u64 + 1;
                if line.is_empty() {
                    records.push(Record {
                        line: start_line,
                        fields: Vec::new(),
                    });
                    continue;
                }
                state = FieldState::Start;
            }

            state = skip_initial_spaces(line, separator, state, &mut pending);

            if state != FieldState::Quoted {
                records.push(self.parse_record(&pending, start_line)?);
                pending.clear();
            }
        }

        // Unterminated quote at end of input
        if state == FieldState::Quoted {
            records.push(self.parse_record(&pending, start_line)?);
        }

        Ok(records)
    }

    fn parse_record(&self, text: &str, line: u64) -> Result<Record, CsvCmpError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.separator.as_bytes()[0])
            .from_reader(text.as_bytes());

        let fields = match reader.records().next() {
            Some(result) => {
                let record = result.map_err(|e| CsvCmpError::Csv(e.to_string()))?;
                record.iter().map(str::to_string).collect()
            }
            // Only spaces on the line
            None => vec![String::new()],
        };

        Ok(Record { line, fields })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    Start,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Copy `line` into `out`, dropping spaces at the start of each field.
/// Returns the state at end of line; `Quoted` means the field continues on
/// the next line.
fn skip_initial_spaces(
    line: &str,
    separator: char,
    mut state: FieldState,
    out: &mut String,
) -> FieldState {
    for c in line.chars() {
        state = match state {
            FieldState::Start if c == ' ' => continue,
            FieldState::Start if c == '"' => FieldState::Quoted,
            FieldState::Start if c == separator => FieldState::Start,
            FieldState::Start => FieldState::Unquoted,
            FieldState::Unquoted if c == separator => FieldState::Start,
            FieldState::Unquoted => FieldState::Unquoted,
            FieldState::Quoted if c == '"' => FieldState::QuoteInQuoted,
            FieldState::Quoted => FieldState::Quoted,
            FieldState::QuoteInQuoted if c == '"' => FieldState::Quoted,
            FieldState::QuoteInQuoted if c == separator => FieldState::Start,
            FieldState::QuoteInQuoted => FieldState::Unquoted,
        };
        out.push(c);
    }
    state
}

impl Default for LineTokenizer {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
            mode: TokenizerMode::Quoted,
        }
    }
}

/// Interpret backslash escapes in a separator given on the command line or
/// in a config file, so that `\t` becomes a tab.
///
/// Unknown escapes are kept as written; malformed hex escapes are an error.
pub fn unescape_separator(raw: &str) -> Result<String, CsvCmpError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            None => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('v') => out.push('\x0b'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('x') => out.push(hex_escape(&mut chars, 2, raw)?),
            Some('u') => out.push(hex_escape(&mut chars, 4, raw)?),
            Some('U') => out.push(hex_escape(&mut chars, 8, raw)?),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Ok(out)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, len: usize, raw: &str) -> Result<char, CsvCmpError> {
    let digits: String = chars.by_ref().take(len).collect();
    if digits.len() != len {
        return Err(CsvCmpError::Separator(format!("truncated escape in {:?}", raw)));
    }
    u32::from_str_radix(&digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| CsvCmpError::Separator(format!("invalid escape \\{} in {:?}", digits, raw)))
}
