//! Structural pre-scan of a glob pattern, without generating any regex.
//!
//! ```
//! use ib_glob::{scan, Options};
//!
//! let r = scan("foo/bar/*.js", &Options::default());
//! assert!(r.is_glob);
//! assert_eq!(r.base, "foo/bar");
//! assert_eq!(r.glob, "*.js");
//! ```
use crate::Options;

use super::util;

/// Per-segment scan information. See [`Options::tokens`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanToken {
    pub value: String,
    /// 1 per segment, `usize::MAX` for globstar segments and 0 for the prefix.
    pub depth: usize,
    pub is_glob: bool,
    pub is_brace: bool,
    pub is_bracket: bool,
    pub is_extglob: bool,
    pub is_globstar: bool,
    pub negated: bool,
    pub backslashes: bool,
    pub is_prefix: bool,
}

impl ScanToken {
    fn update_depth(&mut self) {
        if !self.is_prefix {
            self.depth = if self.is_globstar { usize::MAX } else { 1 };
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Negation and `./` prefix.
    pub prefix: String,
    pub input: String,
    /// Index of the first character after the prefix.
    pub start: usize,
    /// The non-glob directory part.
    pub base: String,
    pub glob: String,
    pub is_brace: bool,
    pub is_bracket: bool,
    pub is_glob: bool,
    pub is_extglob: bool,
    pub is_globstar: bool,
    pub negated: bool,
    /// Starts with a negated extglob, e.g. `!(a)`.
    pub negated_extglob: bool,
    pub tokens: Option<Vec<ScanToken>>,
    /// Character indexes of the slashes.
    pub slashes: Option<Vec<usize>>,
    pub parts: Option<Vec<String>>,
    /// Sum of the token depths, saturating.
    pub max_depth: Option<usize>,
}

fn is_path_separator(c: Option<char>) -> bool {
    matches!(c, Some('/' | '\\'))
}

struct Scanner<'a> {
    chars: &'a [char],
    /// Number of characters advanced, i.e. the index of the next character.
    pos: usize,
    code: Option<char>,
    prev: Option<char>,
}

impl Scanner<'_> {
    fn eos(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        self.prev = self.code;
        self.code = self.chars.get(self.pos).copied();
        self.pos += 1;
        self.code
    }

    /// Index of the current character.
    fn index(&self) -> usize {
        self.pos - 1
    }
}

/// Scan `input` for its structure. Stops at the first glob character unless
/// [`scan_to_end`](Options::scan_to_end), [`parts`](Options::parts) or
/// [`tokens`](Options::tokens) is set.
pub fn scan(input: &str, opts: &Options) -> ScanResult {
    let chars: Vec<char> = input.chars().collect();
    let scan_to_end = opts.parts || opts.tokens || opts.scan_to_end;
    let noext = opts.is_noextglob();

    let mut slashes = Vec::new();
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut last_index = 0;
    let mut is_brace = false;
    let mut is_bracket = false;
    let mut is_glob = false;
    let mut is_extglob = false;
    let mut is_globstar = false;
    let mut brace_escaped = false;
    let mut backslashes = false;
    let mut negated = false;
    let mut negated_extglob = false;
    let mut finished = false;
    let mut braces = 0usize;
    let mut token = ScanToken::default();

    let mut s = Scanner {
        chars: &chars,
        pos: 0,
        code: None,
        prev: None,
    };

    while s.pos < chars.len() {
        let code = s.advance();

        if code == Some('\\') {
            backslashes = true;
            token.backslashes = true;
            if s.advance() == Some('{') {
                brace_escaped = true;
            }
            continue;
        }

        if brace_escaped || code == Some('{') {
            braces += 1;
            while !s.eos() {
                let Some(code) = s.advance() else { break };
                if code == '\\' {
                    backslashes = true;
                    token.backslashes = true;
                    s.advance();
                    continue;
                }
                if code == '{' {
                    braces += 1;
                    continue;
                }
                if !brace_escaped && code == '.' && s.advance() == Some('.') {
                    is_brace = true;
                    token.is_brace = true;
                    is_glob = true;
                    token.is_glob = true;
                    finished = true;
                    if scan_to_end {
                        continue;
                    }
                    break;
                }
                if !brace_escaped && code == ',' {
                    is_brace = true;
                    token.is_brace = true;
                    is_glob = true;
                    token.is_glob = true;
                    finished = true;
                    if scan_to_end {
                        continue;
                    }
                    break;
                }
                if code == '}' {
                    braces = braces.saturating_sub(1);
                    if braces == 0 {
                        brace_escaped = false;
                        is_brace = true;
                        token.is_brace = true;
                        finished = true;
                        break;
                    }
                }
            }
            if scan_to_end {
                continue;
            }
            break;
        }

        if code == Some('/') {
            slashes.push(s.index());
            tokens.push(std::mem::take(&mut token));
            if finished {
                continue;
            }
            if s.prev == Some('.') && s.index() == start + 1 {
                start += 2;
                continue;
            }
            last_index = s.index() + 1;
            continue;
        }

        if !noext
            && matches!(code, Some('+' | '@' | '*' | '?' | '!'))
            && s.peek() == Some('(')
        {
            is_glob = true;
            token.is_glob = true;
            is_extglob = true;
            token.is_extglob = true;
            finished = true;
            if code == Some('!') && s.index() == start {
                negated_extglob = true;
            }
            if scan_to_end {
                while !s.eos() {
                    match s.advance() {
                        Some('\\') => {
                            backslashes = true;
                            token.backslashes = true;
                            s.advance();
                        }
                        Some(')') => {
                            is_glob = true;
                            token.is_glob = true;
                            finished = true;
                            break;
                        }
                        _ => (),
                    }
                }
                continue;
            }
            break;
        }

        if code == Some('*') {
            if s.prev == Some('*') {
                is_globstar = true;
                token.is_globstar = true;
            }
            is_glob = true;
            token.is_glob = true;
            finished = true;
            if scan_to_end {
                continue;
            }
            break;
        }

        if code == Some('?') {
            is_glob = true;
            token.is_glob = true;
            finished = true;
            if scan_to_end {
                continue;
            }
            break;
        }

        if code == Some('[') {
            while !s.eos() {
                match s.advance() {
                    Some('\\') => {
                        backslashes = true;
                        token.backslashes = true;
                        s.advance();
                    }
                    Some(']') => {
                        is_bracket = true;
                        token.is_bracket = true;
                        is_glob = true;
                        token.is_glob = true;
                        finished = true;
                        break;
                    }
                    _ => (),
                }
            }
            if scan_to_end {
                continue;
            }
            break;
        }

        if !opts.nonegate && code == Some('!') && s.index() == start {
            negated = true;
            token.negated = true;
            start += 1;
            continue;
        }

        if !opts.noparen && code == Some('(') {
            is_glob = true;
            token.is_glob = true;
            if scan_to_end {
                while !s.eos() {
                    match s.advance() {
                        Some('\\') => {
                            backslashes = true;
                            token.backslashes = true;
                            s.advance();
                        }
                        Some(')') => {
                            finished = true;
                            break;
                        }
                        _ => (),
                    }
                }
                continue;
            }
            break;
        }

        if is_glob {
            finished = true;
            if scan_to_end {
                continue;
            }
            break;
        }
    }
    let last_code = s.code;

    if noext {
        is_extglob = false;
        is_glob = false;
    }

    // The `./` prefix ends after its own slash, so `from` can be past `to`
    let slice = |from: usize, to: usize| -> String {
        let to = to.min(chars.len());
        chars[from.min(to)..to].iter().collect()
    };

    let mut prefix = String::new();
    let rest: &[char] = if start > 0 {
        prefix = slice(0, start);
        last_index = last_index.saturating_sub(start);
        &chars[start.min(chars.len())..]
    } else {
        &chars
    };
    let rest_str: String = rest.iter().collect();

    let (mut base, mut glob) = if !chars.is_empty() && is_glob && last_index > 0 {
        (
            rest[..last_index.min(rest.len())].iter().collect::<String>(),
            rest[last_index.min(rest.len())..].iter().collect::<String>(),
        )
    } else if is_glob {
        (String::new(), rest_str.clone())
    } else {
        (rest_str.clone(), String::new())
    };

    if !base.is_empty() && base != "/" && base != rest_str && base.ends_with(['/', '\\']) {
        base.pop();
    }

    if opts.is_unescape() {
        if !glob.is_empty() {
            glob = util::remove_backslashes(&glob);
        }
        if !base.is_empty() && backslashes {
            base = util::remove_backslashes(&base);
        }
    }

    let mut result = ScanResult {
        prefix,
        input: input.to_string(),
        start,
        base,
        glob,
        is_brace,
        is_bracket,
        is_glob,
        is_extglob,
        is_globstar,
        negated,
        negated_extglob,
        ..Default::default()
    };

    if opts.tokens && !is_path_separator(last_code) {
        tokens.push(token);
    }

    if opts.parts || opts.tokens {
        let mut max_depth = 0usize;
        let mut parts = Vec::new();
        let mut prev_index: Option<usize> = None;
        for (idx, &i) in slashes.iter().enumerate() {
            let n = prev_index.map_or(start, |p| p + 1);
            let value = slice(n, i);
            if opts.tokens {
                let t = &mut tokens[idx];
                if idx == 0 && start != 0 {
                    t.is_prefix = true;
                    t.value = result.prefix.clone();
                } else {
                    t.value = value.clone();
                }
                t.update_depth();
                max_depth = max_depth.saturating_add(t.depth);
            }
            if idx != 0 || !value.is_empty() {
                parts.push(value);
            }
            prev_index = Some(i);
        }
        let n = prev_index.map_or(start, |p| p + 1);
        if n < chars.len() {
            let value = slice(n, chars.len());
            if opts.tokens {
                if let Some(t) = tokens.last_mut() {
                    t.value = value.clone();
                    t.update_depth();
                    max_depth = max_depth.saturating_add(t.depth);
                }
            }
            parts.push(value);
        }
        result.slashes = Some(slashes);
        result.parts = Some(parts);
        if opts.tokens {
            result.max_depth = Some(max_depth);
        }
    }
    if opts.tokens {
        result.tokens = Some(tokens);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_glob(pattern: &str) -> (String, String) {
        let r = scan(pattern, &Options::default());
        (r.base, r.glob)
    }

    #[test]
    fn base_and_glob() {
        assert_eq!(base_glob("foo/bar/*.js"), ("foo/bar".into(), "*.js".into()));
        assert_eq!(base_glob("*.js"), ("".into(), "*.js".into()));
        assert_eq!(base_glob("foo/bar"), ("foo/bar".into(), "".into()));
        assert_eq!(base_glob("/foo/*"), ("/foo".into(), "*".into()));
        assert_eq!(base_glob("foo/{a,b}/c"), ("foo".into(), "{a,b}/c".into()));
        assert_eq!(base_glob("foo/[abc]/c"), ("foo".into(), "[abc]/c".into()));
        assert_eq!(base_glob("foo/(a|b)"), ("foo".into(), "(a|b)".into()));
        assert_eq!(base_glob("foo/@(a|b)"), ("foo".into(), "@(a|b)".into()));
    }

    #[test]
    fn flags() {
        let o = Options::default();
        assert!(!scan("abc", &o).is_glob);
        assert!(scan("a/*.js", &o).is_glob);
        assert!(scan("a/**", &o).is_globstar);
        assert!(!scan("a/*", &o).is_globstar);
        assert!(scan("a/{b,c}", &o).is_brace);
        assert!(scan("a/{1..3}", &o).is_brace);
        assert!(scan("a/[bc]", &o).is_bracket);
        assert!(!scan("a/[bc", &o).is_bracket);
        assert!(scan("a/+(b)", &o).is_extglob);
        assert!(!scan("a/+(b)", &Options::builder().noext(true).build()).is_extglob);
        assert!(!scan(r"a/\*", &o).is_glob);
    }

    /// With `scan_to_end`, the flags agree with what the compiler finds.
    #[test]
    fn flags_agree_with_parse() {
        use crate::syntax::glob::{parse, TokenKind};

        let o = Options::builder().windows(false).scan_to_end(true).build();
        for pattern in [
            "abc",
            "a/{b,c}",
            "{1..3}",
            "{a}",
            "a{b",
            "[abc]",
            "a/[!b]",
            "a/[bc",
            "[[:alpha:]]",
            "+(a|b)",
            "a/@(b|c)",
            "!(foo).js",
            "a/!(b)",
            "a/**",
            "**/*.js",
            "a/*",
            "!*.md",
            "!a/[bc]/**",
        ] {
            let r = scan(pattern, &o);
            let state = parse(pattern, &o).unwrap();
            let tokens = &state.tokens;
            let brace = tokens
                .iter()
                .any(|t| t.kind == TokenKind::Brace && t.value == "}");
            let bracket = tokens
                .iter()
                .any(|t| t.kind == TokenKind::Bracket && t.value != r"\[");
            assert_eq!(r.is_brace, brace, "{pattern}");
            assert_eq!(r.is_bracket, bracket, "{pattern}");
            assert_eq!(r.is_extglob, tokens.iter().any(|t| t.extglob), "{pattern}");
            assert_eq!(r.is_globstar, state.globstar, "{pattern}");
            assert_eq!(r.negated, state.negated, "{pattern}");
            assert_eq!(r.negated_extglob, state.negated_extglob, "{pattern}");
        }
    }

    #[test]
    fn negation() {
        let r = scan("!foo/*.js", &Options::default());
        assert!(r.negated);
        assert_eq!(r.prefix, "!");
        assert_eq!(r.start, 1);
        assert_eq!(r.base, "foo");
        assert_eq!(r.glob, "*.js");

        let r = scan("!(foo)", &Options::default());
        assert!(r.negated_extglob);
        assert!(!r.negated);

        let r = scan("!foo", &Options::builder().nonegate(true).build());
        assert!(!r.negated);
        assert_eq!(r.base, "!foo");
    }

    #[test]
    fn dot_slash_prefix() {
        let r = scan("./foo/*.js", &Options::default());
        assert_eq!(r.prefix, "./");
        assert_eq!(r.base, "foo");
        assert_eq!(r.glob, "*.js");
    }

    #[test]
    fn parts_and_tokens() {
        let o = Options::builder().tokens(true).parts(true).build();
        let r = scan("foo/**/bar/*.js", &o);
        assert_eq!(
            r.parts.as_deref(),
            Some(&["foo", "**", "bar", "*.js"].map(String::from)[..])
        );
        assert_eq!(r.slashes.as_deref(), Some(&[3, 6, 10][..]));
        let tokens = r.tokens.unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[1].value, "**");
        assert!(tokens[1].is_globstar);
        assert_eq!(tokens[1].depth, usize::MAX);
        assert_eq!(tokens[3].value, "*.js");
        assert_eq!(r.max_depth, Some(usize::MAX));

        let r = scan("a/b/c", &o);
        assert_eq!(r.max_depth, Some(3));
        assert!(!r.is_glob);

        let r = scan("./a/b", &o);
        assert_eq!(r.prefix, "./");
        assert_eq!(r.parts.as_deref(), Some(&["a", "b"].map(String::from)[..]));
        assert_eq!(r.slashes.as_deref(), Some(&[1, 3][..]));
        let tokens = r.tokens.unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens[0].is_prefix);
        assert_eq!(tokens[0].value, "./");
        assert_eq!(tokens[0].depth, 0);
        assert_eq!(tokens[1].value, "a");
        assert_eq!(tokens[2].value, "b");
        assert_eq!(r.max_depth, Some(2));

        for pattern in ["./", "./a", "./.a", "./-a", "./*.js", "./**/b"] {
            let r = scan(pattern, &o);
            assert!(r.parts.is_some(), "{pattern}");
            assert_eq!(r.prefix, "./", "{pattern}");
        }
    }

    #[test]
    fn unescape() {
        let o = Options::builder().unescape(true).build();
        let r = scan(r"foo/\(bar\)/*.js", &o);
        assert_eq!(r.base, "foo/(bar)");
        assert_eq!(r.glob, "*.js");
    }

    #[test]
    fn empty() {
        let r = scan("", &Options::default());
        assert!(!r.is_glob);
        assert_eq!(r.base, "");
    }
}
