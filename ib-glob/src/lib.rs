/*!
An extended glob matcher with bash-compatible semantics. Glob patterns are compiled into
regexes ([`fancy_regex`]), which are then matched against paths or plain strings.

## Features
- Wildcards: `?`, `*` and globstar `**`.
- Bracket expressions, including `[!...]` negation and POSIX classes like `[[:alpha:]]`.
- Brace alternation `{a,b}` and ranges `{1..9}`.
- Extglobs: `?(...)`, `*(...)`, `+(...)`, `@(...)` and `!(...)`.
- Leading `!` negation, quoting and escaping.
- Windows paths, where both `\` and `/` are separators.
- Ignore lists and match callbacks.

See [`syntax::glob`] for the syntax.
*/
//! ## Usage
//! ```
//! use ib_glob::{is_match, Matcher, Options};
//!
//! let matcher = Matcher::new("src/**/*.{js,ts}", Options::default()).unwrap();
//! assert!(matcher.is_match("src/app.ts"));
//! assert!(matcher.is_match("src/lib/util.js"));
//! assert!(matcher.is_match("src/app.jsx") == false);
//!
//! let opts = Options::builder().ignore(vec!["*.test.js".to_string()]).build();
//! assert!(is_match("app.js", "*.js", opts.clone()).unwrap());
//! assert!(is_match("app.test.js", "*.js", opts).unwrap() == false);
//! ```
/*!
## Regex generation
```
use ib_glob::{generate_regex_source, make_re, Options};

let opts = Options::builder().windows(false).build();
assert_eq!(
    generate_regex_source("!(*.test).js", &opts).unwrap(),
    r"(?=.)(?:(?!(?:[^/]*?\.test)\.js)[^/]*?)\.js"
);

let re = make_re("{a..c}.md", &opts).unwrap();
assert!(re.is_match("b.md"));
```
*/
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
//! ## Crate features
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]

pub mod error;
pub mod matcher;
pub mod options;
pub mod regex;
pub mod syntax;

pub use error::{Error, ParseError};
pub use matcher::{is_match, is_match_any, match_base, MatchResult, Matcher};
pub use options::{Options, RegexFlags};
pub use regex::{compile_re, generate_regex_source, make_re, regex_source, GlobRegex};
pub use syntax::glob::{parse, scan, ParseState, ScanResult, ScanToken};
