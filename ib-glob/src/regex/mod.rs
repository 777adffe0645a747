/*!
Regexes of glob patterns, backed by [`fancy_regex`].

```
use ib_glob::{make_re, Options};

let re = make_re("*.{js,ts}", &Options::builder().windows(false).build()).unwrap();
assert!(re.is_match("app.ts"));
assert!(!re.is_match("app.tsx"));
assert_eq!(re.source(), r"^(?:(?!\.)(?=.)[^/]*?\.(?:js|ts))$");
```
*/
use fancy_regex::Regex;
use tracing::{trace, warn};

use crate::{
    error::Error,
    syntax::glob::{parse, ParseState},
    Options,
};

/// A compiled glob pattern.
///
/// A regex that failed to compile (without [`debug`](Options::debug)) never matches.
#[derive(Debug, Clone)]
pub struct GlobRegex {
    source: String,
    regex: Option<Regex>,
    state: ParseState,
}

impl GlobRegex {
    /// The anchored regex source, without inline flags.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    /// The compiler state the regex was built from.
    pub fn state(&self) -> &ParseState {
        &self.state
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        let Some(regex) = &self.regex else {
            return false;
        };
        match regex.is_match(haystack) {
            Ok(is_match) => is_match,
            Err(error) => {
                // Backtracking limit
                warn!(source = %self.source, %error, "glob regex failed to run");
                false
            }
        }
    }

    /// Capture groups of the first match, group 0 excluded.
    pub fn captures(&self, haystack: &str) -> Option<Vec<Option<String>>> {
        let captures = self.regex.as_ref()?.captures(haystack).ok()??;
        Some(
            captures
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()))
                .collect(),
        )
    }
}

/// The anchored regex source of `state`.
///
/// - `^(?:OUTPUT)$`, or just `(?:OUTPUT)` with [`contains`](Options::contains).
/// - Negated states are wrapped as `^(?!SOURCE).*$`.
pub fn regex_source(state: &ParseState, opts: &Options) -> String {
    let (prepend, append) = if opts.contains { ("", "") } else { ("^", "$") };
    let source = format!("{prepend}(?:{}){append}", state.output);
    if state.negated {
        format!("^(?!{source}).*$")
    } else {
        source
    }
}

/// Compile the output of [`parse`](crate::parse) into a regex.
///
/// ## Example
/// ```
/// use ib_glob::{compile_re, parse, Options};
///
/// let opts = Options::builder().windows(false).build();
/// let state = parse("!*.md", &opts).unwrap();
/// let re = compile_re(&state, &opts).unwrap();
/// assert!(re.is_match("app.js"));
/// assert!(!re.is_match("readme.md"));
/// ```
pub fn compile_re(state: &ParseState, opts: &Options) -> Result<GlobRegex, Error> {
    compile_owned(state.clone(), opts)
}

fn compile_owned(state: ParseState, opts: &Options) -> Result<GlobRegex, Error> {
    let source = regex_source(&state, opts);
    let flagged = format!("{}{source}", opts.regex_flags().to_inline());
    trace!(pattern = %state.input, source = %flagged, "compile");
    let regex = match Regex::new(&flagged) {
        Ok(regex) => Some(regex),
        Err(error) if opts.debug => {
            return Err(Error::Regex {
                source_text: flagged,
                error: Box::new(error),
            })
        }
        Err(error) => {
            warn!(
                pattern = %state.input,
                source = %flagged,
                %error,
                "invalid glob regex, matching nothing"
            );
            None
        }
    };
    Ok(GlobRegex {
        source,
        regex,
        state,
    })
}

/// Compile a glob pattern into a regex.
///
/// Common shapes like `*.js` or `**/*` skip the compiler, unless
/// [`fastpaths`](Options::fastpaths) is `Some(false)`.
pub fn make_re(pattern: &str, opts: &Options) -> Result<GlobRegex, Error> {
    let state = parse::compile_with_shortcut(pattern, opts)?;
    compile_owned(state, opts)
}

/// The unanchored regex source [`make_re`] would compile.
pub fn generate_regex_source(pattern: &str, opts: &Options) -> Result<String, Error> {
    Ok(parse::compile_with_shortcut(pattern, opts)?.output)
}

#[cfg(test)]
mod tests {
    use crate::{error::ParseError, parse};

    use super::*;

    fn opts() -> Options {
        Options::builder().windows(false).build()
    }

    #[test]
    fn anchors() {
        let re = make_re("*.js", &opts()).unwrap();
        assert_eq!(re.source(), r"^(?:(?!\.)(?=.)[^/]*?\.js)$");
        assert!(re.is_match("app.js"));
        assert!(!re.is_match("src/app.js"));
        assert!(!re.is_match("app.js/"));

        let contains = Options::builder().windows(false).contains(true).build();
        let re = make_re("b*c", &contains).unwrap();
        assert_eq!(re.source(), r"(?:b[^/]*?c)");
        assert!(re.is_match("abxcd"));
    }

    #[test]
    fn negated() {
        let o = opts();
        let state = parse("!*.md", &o).unwrap();
        assert!(state.negated);
        let source = regex_source(&state, &o);
        assert!(source.starts_with("^(?!^(?:"));
        assert!(source.ends_with(")$).*$"));
    }

    #[test]
    fn flags() {
        let o = opts();
        assert!(!make_re("*.js", &o).unwrap().is_match("App.JS"));
        let nocase = Options::builder().windows(false).nocase(true).build();
        assert!(make_re("*.js", &nocase).unwrap().is_match("App.JS"));
    }

    #[test]
    fn shortcut_and_compiler_agree() {
        let o = opts();
        for pattern in [
            "*", ".*", "*.*", "*/*", "**", "**/*", "**/*.js", "**/.*", "*.js", "./*.js",
        ] {
            let fast = make_re(pattern, &o).unwrap();
            let full = compile_re(&parse(pattern, &o).unwrap(), &o).unwrap();
            for input in [
                "a", ".a", "a.js", "a/b", "a/b.js", "a/.b", ".a/b.js", "a/b/c.js", "a/", "a.js/",
                "a/b/",
            ] {
                assert_eq!(
                    fast.is_match(input),
                    full.is_match(input),
                    "{pattern} {input}"
                );
            }
        }
    }

    #[test]
    fn source_generation() {
        let o = opts();
        assert_eq!(
            generate_regex_source("*.js", &o).unwrap(),
            r"(?!\.)(?=.)[^/]*?\.js"
        );
        assert_eq!(generate_regex_source("a/b", &o).unwrap(), "a/b");
        assert!(matches!(
            generate_regex_source("", &o),
            Err(Error::Parse(ParseError::Empty))
        ));
    }

    #[test]
    fn captures() {
        let o = Options::builder().windows(false).capture(true).build();
        let re = make_re("a/*.{js,ts}", &o).unwrap();
        assert_eq!(
            re.captures("a/b.ts"),
            Some(vec![Some("b".to_string()), Some("ts".to_string())])
        );
        assert_eq!(re.captures("a/b.md"), None);
    }

    #[test]
    fn invalid_regex() {
        let o = Options::builder().windows(false).prepend("(").build();
        let re = make_re("a", &o).unwrap();
        assert!(re.regex().is_none());
        assert!(!re.is_match("a"));

        let debug = Options::builder()
            .windows(false)
            .prepend("(")
            .debug(true)
            .build();
        assert!(matches!(make_re("a", &debug), Err(Error::Regex { .. })));
    }
}
