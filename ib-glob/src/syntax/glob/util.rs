use std::borrow::Cow;

/// Characters that make a bracket expression worth keeping as a regex class.
const REGEX_SPECIAL_CHARS: &[char] = &[
    '-', '*', '+', '?', '.', '^', '$', '{', '}', '(', '|', ')', '[', ']',
];

pub fn has_regex_chars(s: &str) -> bool {
    s.contains(REGEX_SPECIAL_CHARS)
}

/// Push `c` so that it matches literally outside of a character class.
pub fn push_literal(out: &mut String, c: char) {
    // `\<` and `\>` are word boundaries
    if c.is_ascii_punctuation() && !matches!(c, '<' | '>') {
        out.push('\\');
    }
    out.push(c);
}

/// Escape `s` so that it matches literally.
pub fn escape_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if regex_syntax::is_meta_character(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Source of the escaped character `c` (as in `\c`) inside a character class.
pub fn class_escape(c: char) -> String {
    match c {
        // Perl classes behave the same in globs and regexes
        'd' | 'D' | 'w' | 'W' | 's' | 'S' => format!("\\{c}"),
        c if c.is_ascii_punctuation() && !matches!(c, '<' | '>') => format!("\\{c}"),
        c => c.to_string(),
    }
}

/// The result of a backslash run in a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escape {
    /// The backslash is dropped and the next character is handled normally.
    Skip,
    Literal {
        /// Characters consumed after the first backslash.
        consumed: usize,
        /// The normalized glob text.
        value: String,
        /// The escaped character, if any.
        escaped: Option<char>,
        /// Literal backslashes around `escaped`.
        backslashes: usize,
    },
}

/// Resolve the backslash at `chars[at]`.
///
/// Any even number of backslashes collapses into one literal backslash; an odd trailing
/// backslash escapes the following character.
pub fn escape_at(chars: &[char], at: usize, bash: bool, unescape: bool) -> Escape {
    let run = chars[at..].iter().take_while(|&&c| c == '\\').count();
    let next = chars.get(at + run).copied();
    if run == 1 {
        match next {
            Some('/') if !bash => return Escape::Skip,
            Some('.' | ';') => return Escape::Skip,
            _ => (),
        }
    }

    let escaped = if run % 2 == 1 { next } else { None };
    // A trailing lone backslash matches itself
    let backslashes = (run >= 2) as usize + (run % 2 == 1 && escaped.is_none()) as usize;
    let mut value = String::new();
    if run >= 2 {
        value.push_str(r"\\");
    }
    match escaped {
        Some(c) => {
            if !unescape {
                value.push('\\');
            }
            value.push(c);
        }
        None if run % 2 == 1 => value.push_str(r"\\"),
        None => (),
    }
    Escape::Literal {
        consumed: run - 1 + escaped.is_some() as usize,
        value,
        escaped,
        backslashes,
    }
}

impl Escape {
    /// Regex source of a literal escape outside of brackets.
    pub fn output(&self) -> String {
        match self {
            Escape::Skip => String::new(),
            Escape::Literal {
                escaped,
                backslashes,
                ..
            } => {
                let mut out = r"\\".repeat(*backslashes);
                if let Some(c) = escaped {
                    push_literal(&mut out, *c);
                }
                out
            }
        }
    }

    /// Regex source of a literal escape inside brackets.
    pub fn class_output(&self) -> String {
        match self {
            Escape::Skip => String::new(),
            Escape::Literal {
                escaped,
                backslashes,
                ..
            } => {
                let mut out = r"\\".repeat(*backslashes);
                if let Some(c) = escaped {
                    out.push_str(&class_escape(*c));
                }
                out
            }
        }
    }
}

/// Escape the last unescaped occurrence of `c` in `s`.
pub fn escape_last(s: &mut String, c: char) {
    let mut end = s.len();
    while let Some(i) = s[..end].rfind(c) {
        if s[..i].ends_with('\\') {
            end = i - 1;
            continue;
        }
        s.insert(i, '\\');
        return;
    }
}

/// Strip a leading `./`. Returns the stripped prefix.
pub fn remove_prefix(input: &str) -> (&str, &'static str) {
    match input.strip_prefix("./") {
        Some(rest) => (rest, "./"),
        None => (input, ""),
    }
}

/// Remove backslashes that escape a character, except inside bracket expressions.
pub fn remove_backslashes(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '[' => {
                let end = (i + 2..chars.len()).find(|&k| chars[k] == ']' && chars[k - 1] != '\\');
                match end {
                    Some(end) => {
                        out.extend(&chars[i..=end]);
                        i = end + 1;
                    }
                    None => {
                        out.push('[');
                        i += 1;
                    }
                }
            }
            '\\' if i + 1 < chars.len() => i += 1,
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

pub fn to_posix_slashes(s: &str) -> Cow<'_, str> {
    if s.contains('\\') {
        Cow::Owned(s.replace('\\', "/"))
    } else {
        Cow::Borrowed(s)
    }
}

/// The last path component of `s`, ignoring trailing separators.
pub fn basename(s: &str, windows: bool) -> &str {
    let is_sep = |c: char| c == '/' || (windows && c == '\\');
    let trimmed = s.trim_end_matches(is_sep);
    if trimmed.is_empty() {
        return trimmed;
    }
    match trimmed.rfind(is_sep) {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn esc(s: &str) -> Escape {
        let chars: Vec<char> = s.chars().collect();
        escape_at(&chars, 0, false, false)
    }

    #[test]
    fn escapes() {
        assert_eq!(esc(r"\/"), Escape::Skip);
        assert_eq!(esc(r"\."), Escape::Skip);
        assert_eq!(esc(r"\*").output(), r"\*");
        assert_eq!(esc(r"\a").output(), "a");
        assert_eq!(esc(r"\").output(), r"\\");
        assert_eq!(esc(r"\\*").output(), r"\\");
        assert_eq!(esc(r"\\\*").output(), r"\\\*");
        assert_eq!(esc(r"\\\\*").output(), r"\\");
        assert_eq!(esc(r"\\\\\").output(), r"\\\\");
        assert_eq!(esc(r"\d").class_output(), r"\d");
        assert_eq!(esc(r"\]").class_output(), r"\]");

        match esc(r"\\\*") {
            Escape::Literal { consumed, value, .. } => {
                assert_eq!(consumed, 3);
                assert_eq!(value, r"\\\*");
            }
            Escape::Skip => unreachable!(),
        }
        let chars: Vec<char> = r"\*".chars().collect();
        match escape_at(&chars, 0, false, true) {
            Escape::Literal { value, .. } => assert_eq!(value, "*"),
            Escape::Skip => unreachable!(),
        }
    }

    #[test]
    fn last() {
        let mut s = String::from("a[b[c");
        escape_last(&mut s, '[');
        assert_eq!(s, r"a[b\[c");
        let mut s = String::from(r"a[b\[c");
        escape_last(&mut s, '[');
        assert_eq!(s, r"a\[b\[c");
        let mut s = String::from("abc");
        escape_last(&mut s, '(');
        assert_eq!(s, "abc");
    }

    #[test]
    fn backslashes() {
        assert_eq!(remove_backslashes(r"a\*b"), "a*b");
        assert_eq!(remove_backslashes(r"[\]]\*"), r"[\]]*");
        assert_eq!(remove_backslashes(r"a\"), r"a\");
    }

    #[test]
    fn paths() {
        assert_eq!(basename("a/b/c.js", false), "c.js");
        assert_eq!(basename("a/b/", false), "b");
        assert_eq!(basename(r"a\b", false), r"a\b");
        assert_eq!(basename(r"a\b", true), "b");
        assert_eq!(remove_prefix("./a"), ("a", "./"));
        assert_eq!(to_posix_slashes(r"a\b"), "a/b");
    }

    #[test]
    fn escape() {
        assert_eq!(escape_regex("a.b*"), r"a\.b\*");
        assert!(has_regex_chars("a-z"));
        assert!(!has_regex_chars("abc"));
    }
}
