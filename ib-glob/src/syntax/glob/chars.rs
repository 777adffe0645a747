//! Regex fragments shared by the [scanner](super::scan) and the [compiler](super::parse).
//!
//! All tables are `static` and built at compile time, so they can be read from any thread
//! without synchronization.
use super::token::TokenKind;

/// Precomputed regex fragments for one path flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobChars {
    pub dot_literal: &'static str,
    pub plus_literal: &'static str,
    pub qmark_literal: &'static str,
    pub slash_literal: &'static str,
    /// Lookahead requiring at least one more character.
    pub one_char: &'static str,
    /// Any single character except a separator.
    pub qmark: &'static str,
    pub end_anchor: &'static str,
    pub start_anchor: &'static str,
    pub dots_slash: &'static str,
    pub no_dot: &'static str,
    pub no_dots: &'static str,
    pub no_dot_slash: &'static str,
    pub no_dots_slash: &'static str,
    pub qmark_no_dot: &'static str,
    /// Zero or more characters within one path segment.
    pub star: &'static str,
    pub sep: char,
    extglobs: [ExtglobChar; 5],
}

/// The fragment pair of an extglob introducer, e.g. `+` in `+(a|b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtglobChar {
    pub ch: char,
    pub kind: TokenKind,
    pub open: &'static str,
    pub close: &'static str,
}

macro_rules! glob_chars {
    (slash: $slash:literal, qmark: $qmark:literal, qmark_no_dot: $qmark_no_dot:literal, sep: $sep:literal $(,)?) => {
        GlobChars {
            dot_literal: r"\.",
            plus_literal: r"\+",
            qmark_literal: r"\?",
            slash_literal: $slash,
            one_char: "(?=.)",
            qmark: $qmark,
            end_anchor: concat!("(?:", $slash, "|$)"),
            start_anchor: concat!("(?:^|", $slash, ")"),
            dots_slash: concat!(r"\.{1,2}(?:", $slash, "|$)"),
            no_dot: r"(?!\.)",
            no_dots: concat!("(?!(?:^|", $slash, r")\.{1,2}(?:", $slash, "|$))"),
            no_dot_slash: concat!(r"(?!\.{0,1}(?:", $slash, "|$))"),
            no_dots_slash: concat!(r"(?!\.{1,2}(?:", $slash, "|$))"),
            qmark_no_dot: $qmark_no_dot,
            star: concat!($qmark, "*?"),
            sep: $sep,
            extglobs: [
                ExtglobChar {
                    ch: '!',
                    kind: TokenKind::Negate,
                    open: "(?:(?!(?:",
                    close: concat!("))", $qmark, "*?)"),
                },
                ExtglobChar {
                    ch: '?',
                    kind: TokenKind::Qmark,
                    open: "(?:",
                    close: ")?",
                },
                ExtglobChar {
                    ch: '+',
                    kind: TokenKind::Plus,
                    open: "(?:",
                    close: ")+",
                },
                ExtglobChar {
                    ch: '*',
                    kind: TokenKind::Star,
                    open: "(?:",
                    close: ")*",
                },
                ExtglobChar {
                    ch: '@',
                    kind: TokenKind::At,
                    open: "(?:",
                    close: ")",
                },
            ],
        }
    };
}

pub static POSIX_CHARS: GlobChars = glob_chars!(
    slash: "/",
    qmark: "[^/]",
    qmark_no_dot: "[^./]",
    sep: '/',
);

pub static WINDOWS_CHARS: GlobChars = glob_chars!(
    slash: r"[\\/]",
    qmark: r"[^\\/]",
    qmark_no_dot: r"[^.\\/]",
    sep: '\\',
);

/// Returns the fragment set for Windows (`\` and `/` separators) or POSIX (`/` only) paths.
pub fn glob_chars(windows: bool) -> &'static GlobChars {
    if windows {
        &WINDOWS_CHARS
    } else {
        &POSIX_CHARS
    }
}

impl GlobChars {
    /// Look up the extglob introducer `ch`, one of `!?+*@`.
    pub fn extglob(&self, ch: char) -> Option<&ExtglobChar> {
        self.extglobs.iter().find(|e| e.ch == ch)
    }

    pub fn extglobs(&self) -> &[ExtglobChar] {
        &self.extglobs
    }

    /// The globstar fragment: any number of path segments, none of them starting with a dot
    /// (or none of them being `.`/`..` when `dot` is set).
    pub fn globstar(&self, dot: bool, capture: bool) -> String {
        format!(
            "({}(?:(?!{}{}).)*?)",
            if capture { "" } else { "?:" },
            self.start_anchor,
            if dot { self.dots_slash } else { self.dot_literal },
        )
    }
}

/// Bracket expression contents of POSIX character classes, e.g. `[:alpha:]`.
///
/// `[`, `&`, `-` and `~` are escaped since they are class operators in the regex dialect.
static POSIX_CLASSES: [(&str, &str); 14] = [
    ("alnum", "a-zA-Z0-9"),
    ("alpha", "a-zA-Z"),
    ("ascii", r"\x00-\x7F"),
    ("blank", r" \t"),
    ("cntrl", r"\x00-\x1F\x7F"),
    ("digit", "0-9"),
    ("graph", r"\x21-\x7E"),
    ("lower", "a-z"),
    ("print", r"\x20-\x7E "),
    ("punct", r##"\-!"#$%\&'()\*+,./:;<=>?@\[\\\]\^_`{|}\~"##),
    ("space", r" \t\r\n\v\f"),
    ("upper", "A-Z"),
    ("word", "A-Za-z0-9_"),
    ("xdigit", "A-Fa-f0-9"),
];

pub fn posix_class(name: &str) -> Option<&'static str> {
    POSIX_CLASSES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, source)| *source)
}

/// Glob patterns rewritten before parsing.
pub(crate) fn replacement(input: &str) -> Option<&'static str> {
    match input {
        "***" => Some("*"),
        "**/**" | "**/**/**" => Some("**"),
        _ => None,
    }
}

/// Patterns longer than this are always rejected.
pub const MAX_LENGTH: usize = 1024 * 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments() {
        let c = glob_chars(false);
        assert_eq!(c.star, "[^/]*?");
        assert_eq!(c.start_anchor, "(?:^|/)");
        assert_eq!(c.no_dots_slash, r"(?!\.{1,2}(?:/|$))");
        assert_eq!(c.globstar(false, false), r"(?:(?:(?!(?:^|/)\.).)*?)");

        let c = glob_chars(true);
        assert_eq!(c.star, r"[^\\/]*?");
        assert_eq!(c.end_anchor, r"(?:[\\/]|$)");
        assert_eq!(c.sep, '\\');
    }

    #[test]
    fn extglob_map() {
        let c = glob_chars(false);
        assert_eq!(c.extglobs().len(), 5);
        let negate = c.extglob('!').unwrap();
        assert_eq!(negate.kind, TokenKind::Negate);
        assert_eq!(negate.close, "))[^/]*?)");
        assert_eq!(c.extglob('+').unwrap().close, ")+");
        assert!(c.extglob('x').is_none());
        assert_eq!(glob_chars(true).extglob('!').unwrap().close, r"))[^\\/]*?)");
    }

    #[test]
    fn fragments_compile() {
        for c in [glob_chars(false), glob_chars(true)] {
            for source in [
                c.one_char,
                c.no_dot,
                c.no_dots,
                c.no_dot_slash,
                c.no_dots_slash,
                c.qmark_no_dot,
                c.star,
                c.end_anchor,
                c.start_anchor,
            ] {
                assert!(fancy_regex::Regex::new(source).is_ok(), "{source}");
            }
            assert!(fancy_regex::Regex::new(&c.globstar(true, true)).is_ok());
        }
        for (name, source) in POSIX_CLASSES {
            assert!(
                fancy_regex::Regex::new(&format!("[{source}]")).is_ok(),
                "{name}"
            );
        }
    }

    #[test]
    fn posix_lookup() {
        assert_eq!(posix_class("digit"), Some("0-9"));
        assert_eq!(posix_class("nope"), None);
    }
}
