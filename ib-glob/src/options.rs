use std::{path::MAIN_SEPARATOR, sync::Arc};

use bitflags::bitflags;
use bon::Builder;

use crate::{matcher::MatchResult, syntax::glob::chars::MAX_LENGTH};

bitflags! {
    /// Flags of the compiled regex.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegexFlags: u8 {
        /// `i`
        const CASE_INSENSITIVE = 1;
        /// `m`: `^` and `$` match at line boundaries.
        const MULTI_LINE = 1 << 1;
        /// `s`: `.` matches `\n`.
        const DOT_MATCHES_NEW_LINE = 1 << 2;
    }
}

impl RegexFlags {
    /// Inline flag group, e.g. `(?i)`. Empty if no flag is set.
    pub fn to_inline(self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut s = String::from("(?");
        if self.contains(Self::CASE_INSENSITIVE) {
            s.push('i');
        }
        if self.contains(Self::MULTI_LINE) {
            s.push('m');
        }
        if self.contains(Self::DOT_MATCHES_NEW_LINE) {
            s.push('s');
        }
        s.push(')');
        s
    }
}

/// Formats an input string before it is matched.
pub type FormatFn = Arc<dyn Fn(&str) -> String + Send + Sync>;
/// Expands the endpoints of a brace range like `{a..z}` into regex source.
pub type ExpandRangeFn = Arc<dyn Fn(&[String], &Options) -> String + Send + Sync>;
pub type Callback = Arc<dyn Fn(&MatchResult) + Send + Sync>;

/// Options of the scanner, the compiler and [`Matcher`](crate::Matcher).
///
/// ## Example
/// ```
/// use ib_glob::{Matcher, Options};
///
/// let m = Matcher::new("*.js", Options::builder().dot(true).build()).unwrap();
/// assert!(m.is_match(".eslintrc.js"));
/// ```
#[derive(Builder, Default, Clone)]
pub struct Options {
    /// Match the pattern against the basename of the input only, if the pattern has no slashes.
    #[builder(default)]
    pub basename: bool,
    /// Alias of [`basename`](Self::basename).
    #[builder(default)]
    pub match_base: bool,
    /// Follow bash matching rules more strictly: `*` may cross separators unless it is a whole
    /// segment, and escaped `/` is kept.
    #[builder(default)]
    pub bash: bool,
    /// Emit capturing groups.
    #[builder(default)]
    pub capture: bool,
    /// Allow the pattern to match any part of the input, i.e. no anchors.
    #[builder(default)]
    pub contains: bool,
    /// Return regex compilation errors instead of a never-matching regex.
    #[builder(default)]
    pub debug: bool,
    /// Match dotfiles.
    #[builder(default)]
    pub dot: bool,
    /// Try the fast paths before the full parser. Defaults to `true`.
    pub fastpaths: Option<bool>,
    /// Flags of the compiled regex. Overrides [`nocase`](Self::nocase).
    pub flags: Option<RegexFlags>,
    /// Formats the input before matching.
    ///
    /// Defaults to converting `\` to `/` on Windows.
    pub format: Option<FormatFn>,
    /// Patterns to exclude from matches.
    #[builder(default, into)]
    pub ignore: Vec<String>,
    /// Keep double quotes in the generated regex.
    #[builder(default)]
    pub keep_quotes: bool,
    /// - `Some(true)`: brackets without regex characters match literally, e.g. `[a]` matches `[a]`.
    /// - `Some(false)`: brackets are always character classes.
    /// - `None`: both.
    pub literal_brackets: Option<bool>,
    /// Limit of the pattern length. Never more than 65536.
    pub max_length: Option<usize>,
    /// Treat braces literally.
    #[builder(default)]
    pub nobrace: bool,
    /// Treat brackets literally.
    #[builder(default)]
    pub nobracket: bool,
    /// Case-insensitive matching.
    #[builder(default)]
    pub nocase: bool,
    /// Alias of [`noextglob`](Self::noextglob). Overrides it if set.
    pub noext: Option<bool>,
    /// Disable extglobs like `+(a|b)`.
    #[builder(default)]
    pub noextglob: bool,
    /// Treat `**` as `*`.
    #[builder(default)]
    pub noglobstar: bool,
    /// Treat a leading `!` literally.
    #[builder(default)]
    pub nonegate: bool,
    /// Treat plain parens literally when scanning.
    #[builder(default)]
    pub noparen: bool,
    /// Treat `+` after a group as a literal instead of a quantifier.
    #[builder(default)]
    pub noquantifiers: bool,
    /// POSIX character classes (`[[:alpha:]]`) and `[!...]` negation. Defaults to `true`.
    pub posix: Option<bool>,
    /// Regex source prepended to the generated regex, inside the anchors.
    #[builder(into)]
    pub prepend: Option<String>,
    /// - `Some(true)`: `*` after a bracket or paren is a regex quantifier.
    /// - `Some(false)`: `+` is always literal.
    pub regex: Option<bool>,
    /// Fail on unbalanced brackets, braces and parens instead of escaping them.
    pub strict_brackets: Option<bool>,
    /// Do not match a trailing slash after a trailing `*` or bracket.
    pub strict_slashes: Option<bool>,
    /// Remove backslashes preceding escaped characters.
    pub unescape: Option<bool>,
    /// Windows paths: both `\` and `/` are separators. Defaults to the current OS.
    pub windows: Option<bool>,
    /// Custom brace range expansion, e.g. `{1..10}`.
    pub expand_range: Option<ExpandRangeFn>,
    /// Called with every match result.
    pub on_result: Option<Callback>,
    /// Called when a matched input is excluded by [`ignore`](Self::ignore).
    pub on_ignore: Option<Callback>,
    /// Called when an input matches.
    pub on_match: Option<Callback>,

    /// Scanner: compute [`ScanResult::parts`](crate::ScanResult::parts).
    #[builder(default)]
    pub parts: bool,
    /// Scanner: do not stop at the first glob character.
    #[builder(default)]
    pub scan_to_end: bool,
    /// Scanner: compute [`ScanResult::tokens`](crate::ScanResult::tokens).
    #[builder(default)]
    pub tokens: bool,
}

impl Options {
    pub fn is_windows(&self) -> bool {
        self.windows.unwrap_or(MAIN_SEPARATOR == '\\')
    }

    pub fn is_noextglob(&self) -> bool {
        self.noext.unwrap_or(self.noextglob)
    }

    pub fn is_basename(&self) -> bool {
        self.basename || self.match_base
    }

    pub fn max_length(&self) -> usize {
        self.max_length.map_or(MAX_LENGTH, |max| max.min(MAX_LENGTH))
    }

    pub(crate) fn is_strict_brackets(&self) -> bool {
        self.strict_brackets == Some(true)
    }

    pub(crate) fn is_strict_slashes(&self) -> bool {
        self.strict_slashes == Some(true)
    }

    pub(crate) fn is_unescape(&self) -> bool {
        self.unescape == Some(true)
    }

    pub(crate) fn regex_flags(&self) -> RegexFlags {
        self.flags.unwrap_or(if self.nocase {
            RegexFlags::CASE_INSENSITIVE
        } else {
            RegexFlags::empty()
        })
    }

    /// A copy without the ignore list and callbacks, used for ignore matchers.
    pub(crate) fn without_hooks(&self) -> Self {
        Self {
            ignore: Vec::new(),
            on_result: None,
            on_ignore: None,
            on_match: None,
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("basename", &self.is_basename())
            .field("bash", &self.bash)
            .field("dot", &self.dot)
            .field("flags", &self.regex_flags())
            .field("ignore", &self.ignore)
            .field("noextglob", &self.is_noextglob())
            .field("noglobstar", &self.noglobstar)
            .field("windows", &self.is_windows())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = Options::default();
        assert_eq!(o.max_length(), MAX_LENGTH);
        assert!(!o.is_noextglob());
        assert_eq!(o.regex_flags(), RegexFlags::empty());

        let o = Options::builder()
            .max_length(usize::MAX)
            .noext(true)
            .nocase(true)
            .build();
        assert_eq!(o.max_length(), MAX_LENGTH);
        assert!(o.is_noextglob());
        assert_eq!(o.regex_flags().to_inline(), "(?i)");
    }

    #[test]
    fn without_hooks() {
        let o = Options::builder()
            .ignore(vec!["a".to_string()])
            .on_match(Arc::new(|_: &MatchResult| {}))
            .dot(true)
            .build();
        let o = o.without_hooks();
        assert!(o.ignore.is_empty());
        assert!(o.on_match.is_none());
        assert!(o.dot);
    }

    #[test]
    fn inline_flags() {
        let flags = RegexFlags::CASE_INSENSITIVE | RegexFlags::DOT_MATCHES_NEW_LINE;
        assert_eq!(flags.to_inline(), "(?is)");
    }
}
