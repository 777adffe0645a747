//! Extended glob syntax.
//!
//! - Wildcards: `?` matches one character and `*` any number of characters within a path segment.
//!   `**` as a whole segment crosses separators.
//! - Bracket expressions: `[a-z]`, `[!abc]`/`[^abc]` and POSIX classes like `[[:alpha:]]`.
//! - Braces: alternation `{a,b}` and ranges `{a..c}`.
//! - Extglobs: `?(a|b)`, `*(a|b)`, `+(a|b)`, `@(a|b)` and `!(a|b)`.
//! - A leading `!` negates the whole pattern.
//! - `\` escapes the next character, and `"..."` quotes a literal section.
//!
//! [`scan`] splits a pattern into its literal base and glob part without compiling it.
//! [`parse`] compiles a pattern into regex source:
//! ```
//! use ib_glob::{parse, scan, Options};
//!
//! let opts = Options::builder().windows(false).build();
//! let scanned = scan("src/**/*.{js,ts}", &opts);
//! assert_eq!(scanned.base, "src");
//! assert_eq!(scanned.glob, "**/*.{js,ts}");
//!
//! let state = parse("*.{js,ts}", &opts).unwrap();
//! assert_eq!(state.output, r"(?!\.)(?=.)[^/]*?\.(?:js|ts)");
//! ```
//!
//! On Windows (see [`Options::windows`](crate::Options::windows)) both `/` and `\` are path
//! separators in the input, while patterns still use `\` as the escape character.
pub mod chars;
mod fast;
pub mod parse;
pub mod scan;
pub mod token;
pub(crate) mod util;

pub use parse::{parse, ParseState};
pub use scan::{scan, ScanResult, ScanToken};
pub use token::{Token, TokenKind};
