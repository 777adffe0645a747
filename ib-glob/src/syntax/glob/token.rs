/// The lexical kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Beginning of string. Always the first token.
    Bos,
    Text,
    Slash,
    Star,
    /// `**`, crossing path separators.
    Globstar,
    Qmark,
    /// `[...]`, or a literal `\[` if never closed.
    Bracket,
    Brace,
    Paren,
    Comma,
    Pipe,
    Dot,
    /// `..` inside a brace range.
    Dots,
    Plus,
    At,
    /// The optional trailing separator.
    MaybeSlash,
    Negate,
}

/// One lexical unit produced by the [compiler](super::parse).
///
/// Tokens live in [`ParseState::tokens`](super::ParseState::tokens) and refer to their
/// predecessor by index. Later input may rewrite a token in place, e.g. a second `*` turns a
/// [`Star`](TokenKind::Star) into a [`Globstar`](TokenKind::Globstar).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The glob text this token was made of (possibly normalized).
    pub value: String,
    /// Regex source emitted for this token. [`value`](Self::value) is emitted if `None`.
    pub output: Option<String>,
    /// Index of the previous token.
    pub prev: Option<usize>,
    /// Part of an extglob introducer or group.
    pub extglob: bool,
    /// A star that followed a globstar.
    pub star: bool,
    /// A bracket containing a POSIX character class.
    pub posix: bool,
    /// A brace group that saw a `,`.
    pub comma: bool,
    /// A brace group that saw a `..`.
    pub dots: bool,
    /// The [`Bos`](TokenKind::Bos) of a pattern whose leading `./` was stripped.
    pub prefix: bool,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            output: None,
            prev: None,
            extglob: false,
            star: false,
            posix: false,
            comma: false,
            dots: false,
            prefix: false,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub(crate) fn extglob(mut self) -> Self {
        self.extglob = true;
        self
    }

    /// The regex source this token contributes.
    pub fn emitted(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.value)
    }
}
