//! Glob matchers.
//!
//! ## Example
//! ```
//! use ib_glob::{Matcher, Options};
//!
//! let m = Matcher::new("**/*.js", Options::builder().windows(false).build()).unwrap();
//! assert!(m.is_match("a.js"));
//! assert!(m.is_match("a/b/c.js"));
//! assert!(!m.is_match("a/b/c.ts"));
//!
//! // Patterns in a list are alternatives
//! let m = Matcher::new_many(["*.js", "*.ts"], Options::default()).unwrap();
//! assert!(m.is_match("app.ts"));
//! ```
use tracing::trace;

use crate::{
    error::Error,
    regex::{make_re, GlobRegex},
    syntax::glob::{util, ParseState},
    Options,
};

/// The result of testing one input against one pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The pattern that was tested.
    pub glob: String,
    pub input: String,
    /// The input after [`format`](Options::format).
    pub output: String,
    pub is_match: bool,
    /// Capture groups, with [`capture`](Options::capture).
    pub captures: Option<Vec<Option<String>>>,
}

impl MatchResult {
    fn new(glob: &str, input: &str) -> Self {
        Self {
            glob: glob.to_string(),
            input: input.to_string(),
            output: String::new(),
            is_match: false,
            captures: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Arm {
    glob: String,
    regex: GlobRegex,
}

/// A predicate over paths or strings, compiled from one or more glob patterns.
///
/// `Matcher` is `Send + Sync`; matching takes `&self`.
#[derive(Debug, Clone)]
pub struct Matcher {
    arms: Vec<Arm>,
    ignore: Option<Box<Matcher>>,
    options: Options,
}

impl Matcher {
    /// ## Errors
    /// - An empty or too long pattern.
    /// - Unbalanced delimiters with [`strict_brackets`](Options::strict_brackets).
    /// - A regex compilation error with [`debug`](Options::debug).
    pub fn new(pattern: &str, options: Options) -> Result<Self, Error> {
        Self::new_many([pattern], options)
    }

    /// A matcher that matches if any of `patterns` matches.
    ///
    /// A `!`-prefixed pattern is a negated alternative like any other, so `["*.js", "!a.js"]`
    /// still matches `a.js`. Use [`ignore`](Options::ignore) to exclude inputs.
    pub fn new_many<I, S>(patterns: I, options: Options) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let arms = patterns
            .into_iter()
            .map(|glob| {
                let glob = glob.as_ref();
                Ok(Arm {
                    glob: glob.to_string(),
                    regex: make_re(glob, &options)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let ignore = if options.ignore.is_empty() {
            None
        } else {
            Some(Box::new(Self::new_many(
                &options.ignore,
                options.without_hooks(),
            )?))
        };
        Ok(Self {
            arms,
            ignore,
            options,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The compiler state of the first pattern.
    pub fn state(&self) -> Option<&ParseState> {
        self.arms.first().map(|arm| arm.regex.state())
    }

    /// The compiled patterns, in order.
    pub fn regexes(&self) -> impl Iterator<Item = &GlobRegex> {
        self.arms.iter().map(|arm| &arm.regex)
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.test(input).is_match
    }

    /// Test `input` against the patterns in order, returning the first match or the last
    /// result.
    ///
    /// Callbacks are called for each tested pattern.
    pub fn test(&self, input: &str) -> MatchResult {
        let mut last = None;
        for arm in &self.arms {
            let result = self.test_arm(arm, input);
            if result.is_match {
                return result;
            }
            last = Some(result);
        }
        last.unwrap_or_else(|| MatchResult::new("", input))
    }

    fn test_arm(&self, arm: &Arm, input: &str) -> MatchResult {
        let mut result = self.evaluate(arm, input);
        trace!(glob = %arm.glob, input, is_match = result.is_match);
        if let Some(on_result) = &self.options.on_result {
            on_result(&result);
        }
        if !result.is_match {
            return result;
        }

        if self
            .ignore
            .as_ref()
            .is_some_and(|ignore| ignore.is_match(input))
        {
            if let Some(on_ignore) = &self.options.on_ignore {
                on_ignore(&result);
            }
            result.is_match = false;
            return result;
        }

        if let Some(on_match) = &self.options.on_match {
            on_match(&result);
        }
        result
    }

    fn evaluate(&self, arm: &Arm, input: &str) -> MatchResult {
        let mut result = MatchResult::new(&arm.glob, input);
        if input.is_empty() {
            return result;
        }

        let opts = &self.options;
        let windows = opts.is_windows();
        result.output = match &opts.format {
            Some(format) => format(input),
            None if windows => util::to_posix_slashes(input).into_owned(),
            None => input.to_string(),
        };
        result.is_match = input == arm.glob || result.output == arm.glob;
        if result.is_match && !opts.capture {
            return result;
        }

        if opts.is_basename() {
            result.is_match |= match_base(input, &arm.regex, windows);
        } else if opts.capture {
            result.captures = arm.regex.captures(&result.output);
            result.is_match |= result.captures.is_some();
        } else {
            result.is_match = arm.regex.is_match(&result.output);
        }
        result
    }
}

/// Test whether `input` matches `pattern`.
///
/// ## Example
/// ```
/// use ib_glob::{is_match, Options};
///
/// let opts = Options::builder().windows(false).build();
/// assert!(is_match("src/app.js", "src/*.js", opts.clone()).unwrap());
/// assert!(!is_match("src/app.js", "*.js", opts).unwrap());
/// ```
pub fn is_match(input: &str, pattern: &str, options: Options) -> Result<bool, Error> {
    Ok(Matcher::new(pattern, options)?.is_match(input))
}

/// Test whether `input` matches any of `patterns`.
pub fn is_match_any<I, S>(input: &str, patterns: I, options: Options) -> Result<bool, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(Matcher::new_many(patterns, options)?.is_match(input))
}

/// Test the basename of `input` against `regex`.
pub fn match_base(input: &str, regex: &GlobRegex, windows: bool) -> bool {
    regex.is_match(util::basename(input, windows))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::{compile_re, error::ParseError, parse, regex::regex_source};

    use super::*;

    fn opts() -> Options {
        Options::builder().windows(false).build()
    }

    fn is(input: &str, pattern: &str) -> bool {
        is_match(input, pattern, opts()).unwrap()
    }

    #[test]
    fn send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Matcher>();
    }

    #[test]
    fn wildcards() {
        assert!(is("app.js", "*.js"));
        assert!(!is("App.JS", "*.js"));
        assert!(!is(".hidden.js", "*.js"));
        let dot = Options::builder().windows(false).dot(true).build();
        assert!(is_match(".hidden.js", "*.js", dot).unwrap());
        assert!(!is("src/app.js", "*.js"));
        assert!(is("a", "?"));
        assert!(!is("ab", "?"));
        assert!(is("abc", "a?c"));
        assert!(is("a/", "a*"));
        let strict = Options::builder()
            .windows(false)
            .strict_slashes(true)
            .build();
        assert!(!is_match("a/", "a*", strict).unwrap());
    }

    #[test]
    fn globstars() {
        for input in ["a.js", "a/b.js", "a/b/c.js"] {
            assert!(is(input, "**/*.js"), "{input}");
        }
        assert!(!is("a/.b/c.js", "**/*.js"));
        assert!(!is("a/.b/c.js", "a/**/*.js"));
        assert!(is("a/b/c/d", "a/**"));
        assert!(is("a", "a/**"));
        assert!(is("a/b", "a/**/b"));
        assert!(is("a/x/y/b", "a/**/b"));
        assert!(!is("a/b/c.js", "a/*.js"));

        let noglobstar = Options::builder().windows(false).noglobstar(true).build();
        assert!(!is_match("a/b.js", "**/*.js", noglobstar).unwrap());
        assert!(!is_match("a/b.js", "*.js", opts()).unwrap());
    }

    #[test]
    fn braces() {
        assert!(is("x.js", "*.{js,ts}"));
        assert!(is("x.ts", "*.{js,ts}"));
        assert!(!is("x.jsx", "*.{js,ts}"));
        assert!(is("b", "{a..c}"));
        assert!(!is("d", "{a..c}"));
        assert!(is("{a}", "{a}"));
    }

    #[test]
    fn brackets() {
        assert!(is("test-5a.txt", "test-[0-9][a-z].txt"));
        assert!(!is("test-5A.txt", "test-[0-9][a-z].txt"));
        assert!(!is("test-55.txt", "test-[0-9][a-z].txt"));
        assert!(is("b", "[!a]"));
        assert!(!is("a", "[!a]"));
        assert!(is("x", "[[:alpha:]]"));
        assert!(!is("1", "[[:alpha:]]"));
        assert!(is("[abc", "[abc"));

        let strict = Options::builder()
            .windows(false)
            .strict_brackets(true)
            .build();
        assert!(matches!(
            Matcher::new("[abc", strict),
            Err(Error::Parse(ParseError::Missing { .. }))
        ));
    }

    #[test]
    fn extglobs() {
        let p = "!(*.test|*.spec).{js,ts}";
        assert!(is("app.js", p));
        assert!(is("app.ts", p));
        assert!(!is("app.test.js", p));
        assert!(!is("app.spec.ts", p));

        assert!(is("a", "+(a|b)"));
        assert!(is("abab", "+(a|b)"));
        assert!(!is("", "+(a|b)"));
        assert!(is("x.js", "@(x|y).js"));
        assert!(!is("xy.js", "@(x|y).js"));
        assert!(is("foo.js", "?(foo).js"));
        assert!(is("bar", "!(foo)"));
        assert!(!is("foo", "!(foo)"));

        assert!(is("xy.ts", "!(x).ts"));
        assert!(is("y.ts", "!(x).ts"));
        assert!(!is("x.ts", "!(x).ts"));
        assert!(is("foo.bar.ts", "!(foo).ts"));
        assert!(!is("foo.ts", "!(foo).ts"));
        assert!(is("xy.tsx", "!(x).{ts,tsx}"));
        assert!(!is("x.tsx", "!(x).{ts,tsx}"));

        let noext = Options::builder().windows(false).noextglob(true).build();
        assert!(is_match("+(a|b)", "+(a|b)", noext.clone()).unwrap());
        assert!(!is_match("a", "+(a|b)", noext).unwrap());
    }

    #[test]
    fn unclosed_extglobs() {
        assert!(is("a/!(bc", "a/!(b*"));
        assert!(!is("a/bc", "a/!(b*"));
        assert!(is("xfoo+(bar", "*foo+(bar"));
        assert!(is("@(a|b", "@(a|b"));
        assert!(is("+(a|b", "+(a|b"));
        for pattern in ["a/!(b*", "*foo+(bar", "@(a|b", "*(a|+(b)"] {
            let re = make_re(pattern, &opts()).unwrap();
            assert!(re.regex().is_some(), "{pattern}: {}", re.source());
        }
    }

    #[test]
    fn negation() {
        assert!(is("app.js", "!*.md"));
        assert!(!is("readme.md", "!*.md"));
        assert!(is("readme.md", "!!*.md"));

        let nonegate = Options::builder().windows(false).nonegate(true).build();
        assert!(is_match("!a", "!a", nonegate.clone()).unwrap());
        assert!(!is_match("b", "!a", nonegate).unwrap());
    }

    #[test]
    fn bash() {
        let bash = Options::builder().windows(false).bash(true).build();
        assert!(is_match("a/b/c", "a*", bash.clone()).unwrap());
        assert!(!is("a/b/c", "a*"));
        assert!(is_match("a/b", "a/*", bash).unwrap());
    }

    #[test]
    fn exact_text() {
        // Invalid as a glob, but equal to the input
        assert!(is("a[", "a["));
        let m = Matcher::new("a/b", Options::builder().windows(true).build()).unwrap();
        assert!(m.is_match(r"a\b"));
        assert_eq!(m.test(r"a\b").output, "a/b");
    }

    #[test]
    fn empty() {
        assert!(!is("", "*"));
        assert!(!is("", "**"));
        assert!(matches!(
            Matcher::new("", opts()),
            Err(Error::Parse(ParseError::Empty))
        ));
        let m = Matcher::new_many(Vec::<String>::new(), opts()).unwrap();
        assert!(!m.is_match("a"));
        assert!(m.state().is_none());
    }

    #[test]
    fn windows() {
        let o = Options::builder().windows(true).build();
        assert!(is_match(r"a\b\c.js", "a/**/*.js", o.clone()).unwrap());
        assert!(is_match("a/b/c.js", "a/**/*.js", o.clone()).unwrap());
        assert!(!is_match(r"a\b.js", "*.js", o).unwrap());

        let format = Options::builder()
            .windows(false)
            .format(Arc::new(|s: &str| s.trim_start_matches("./").to_string()))
            .build();
        assert!(is_match("./a.js", "*.js", format).unwrap());
    }

    #[test]
    fn basename() {
        let o = Options::builder().windows(false).basename(true).build();
        assert!(is_match("a/b/c.js", "*.js", o.clone()).unwrap());
        assert!(!is_match("a/b/c.md", "*.js", o).unwrap());
        let o = Options::builder().windows(false).match_base(true).build();
        assert!(is_match("a/b/c.js", "c.js", o).unwrap());

        let re = make_re("b.js", &opts()).unwrap();
        assert!(match_base(r"a\b.js", &re, true));
        assert!(!match_base(r"a\b.js", &re, false));
    }

    #[test]
    fn ignore() {
        let o = Options::builder()
            .windows(false)
            .ignore(vec!["**/node_modules/**".to_string()])
            .build();
        let m = Matcher::new("**/*.js", o).unwrap();
        assert!(m.is_match("src/a.js"));
        assert!(!m.is_match("node_modules/a.js"));
        assert!(!m.is_match("a/node_modules/b/c.js"));
    }

    #[test]
    fn callbacks() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let hook = |name: &'static str| {
            let events = events.clone();
            Arc::new(move |r: &MatchResult| {
                events.lock().unwrap().push(format!("{name} {}", r.input))
            })
        };
        let o = Options::builder()
            .windows(false)
            .ignore(vec!["b.js".to_string()])
            .on_result(hook("result"))
            .on_ignore(hook("ignore"))
            .on_match(hook("match"))
            .build();
        let m = Matcher::new("*.js", o).unwrap();
        assert!(m.is_match("a.js"));
        assert!(!m.is_match("b.js"));
        assert!(!m.is_match("c.md"));
        assert_eq!(
            *events.lock().unwrap(),
            [
                "result a.js",
                "match a.js",
                "result b.js",
                "ignore b.js",
                "result c.md"
            ]
        );
    }

    #[test]
    fn pattern_lists() {
        assert!(is_match_any("a.ts", ["*.js", "*.ts"], opts()).unwrap());
        assert!(!is_match_any("a.md", ["*.js", "*.ts"], opts()).unwrap());

        // A negated entry is an alternative, not an exclusion
        let list = ["**/*.js", "!**/node_modules/**"];
        assert!(is_match_any("node_modules/x.js", list, opts()).unwrap());
        assert!(is_match_any("README", list, opts()).unwrap());

        let m = Matcher::new_many(["*.md", "*.js"], opts()).unwrap();
        let result = m.test("a.js");
        assert_eq!(result.glob, "*.js");
        assert!(result.is_match);
        assert_eq!(m.test("a.rs").glob, "*.js");
    }

    #[test]
    fn captures() {
        let o = Options::builder().windows(false).capture(true).build();
        let m = Matcher::new("src/*.{js,ts}", o).unwrap();
        let result = m.test("src/app.ts");
        assert!(result.is_match);
        assert_eq!(
            result.captures,
            Some(vec![Some("app".to_string()), Some("ts".to_string())])
        );
    }

    /// A matcher agrees with the anchored source of the compiled pattern.
    #[test]
    fn agrees_with_regex_source() {
        let o = opts();
        let patterns = [
            "*.js",
            "**/*.js",
            "a/**/b",
            "*.{js,ts}",
            "!(*.test|*.spec).{js,ts}",
            "test-[0-9][a-z].txt",
            "!*.md",
            "+(a|b)c",
            "{1..3}",
        ];
        let inputs = [
            "app.js",
            "a/b.js",
            "a/x/b",
            "x.ts",
            "app.test.js",
            "test-5a.txt",
            "readme.md",
            "abac",
            "2",
            ".hidden.js",
            "a.js/",
            "a/x/",
        ];
        for pattern in patterns {
            let m = Matcher::new(pattern, o.clone()).unwrap();
            let state = parse(pattern, &o).unwrap();
            let source = regex_source(&state, &o);
            let re = compile_re(&state, &o).unwrap();
            assert_eq!(re.source(), source);
            for input in inputs {
                assert_eq!(m.is_match(input), re.is_match(input), "{pattern} {input}");
            }
        }
    }
}
