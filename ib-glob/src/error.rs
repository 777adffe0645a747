use thiserror::Error;

/// A pattern rejected before any regex is generated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected a non-empty pattern")]
    Empty,

    #[error("input length: {len}, exceeds maximum allowed length: {max}")]
    TooLong { len: usize, max: usize },

    /// An unbalanced delimiter with [`strict_brackets`](crate::Options::strict_brackets).
    #[error(r#"missing {kind}: "{ch}" - use "\\{ch}" to match literal characters"#)]
    Missing { kind: &'static str, ch: char },
}

impl ParseError {
    pub(crate) fn opening(ch: char) -> Self {
        ParseError::Missing { kind: "opening", ch }
    }

    pub(crate) fn closing(ch: char) -> Self {
        ParseError::Missing { kind: "closing", ch }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The generated regex failed to compile. Only returned with [`debug`](crate::Options::debug).
    #[error("invalid regex {source_text:?}: {error}")]
    Regex {
        source_text: String,
        #[source]
        error: Box<fancy_regex::Error>,
    },
}
