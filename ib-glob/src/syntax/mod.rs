//! Syntax parsers of [`ib_glob`](crate).
//!
//! ## glob()-style pattern syntax
//! See [`glob`] for details. For example:
//! ```
//! use ib_glob::{syntax::glob::parse, Options};
//!
//! let state = parse("src/**/*.rs", &Options::builder().windows(false).build()).unwrap();
//! assert!(state.globstar);
//! ```
pub mod glob;
