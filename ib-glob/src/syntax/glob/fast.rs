//! Fast paths of the compiler.
//!
//! - [`compile`]: patterns without separators, groups or quotes. The output is the same as the
//!   full state machine's.
//! - [`shortcut`]: a few common shapes like `*.js` and `**/*`, used by
//!   [`make_re`](crate::make_re) only.
use logos::Logos;

use crate::{error::ParseError, Options};

use super::{
    chars::{self, glob_chars, GlobChars},
    util::{self, Escape},
};

#[derive(Logos, Clone, Copy, Debug, PartialEq)]
enum FastToken {
    #[regex(r"\\+")]
    Backslashes,

    #[token("*")]
    Star,

    #[token("?")]
    Qmark,

    #[token(".")]
    Dot,

    #[token("+")]
    Plus,

    #[token(",")]
    Comma,

    /// Escaped when matched literally.
    #[regex(r"[$^@!]")]
    Special,

    /// Plain text.
    #[regex(r#"[^\x00@!\[\].,$*+?^{}()|\\/"]+"#)]
    Text,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Prev {
    Bos,
    /// A leading dot.
    Dot,
    Star,
    Other,
}

fn is_eligible(input: &str) -> bool {
    !input.starts_with(['*', '!'])
        && !input.contains(['/', '(', ')', '[', ']', '{', '}', '"', '|', '\0'])
}

/// Compile a pattern without separators, groups, brackets or quotes in one pass.
///
/// Returns `None` if the pattern is not eligible.
pub(crate) fn compile(input: &str, opts: &Options, chars: &GlobChars) -> Option<String> {
    if !is_eligible(input) {
        return None;
    }

    let mut star = chars.star.to_string();
    if opts.capture {
        star = format!("({star})");
    }

    let mut out = opts.prepend.clone().unwrap_or_default();
    let mut prev = Prev::Bos;
    let mut lex = FastToken::lexer(input);
    while let Some(token) = lex.next() {
        let Ok(token) = token else {
            return None;
        };
        match token {
            FastToken::Backslashes => {
                let run = lex.slice().len();
                let escaped: Vec<char> = input[lex.span().start..].chars().take(run + 1).collect();
                match util::escape_at(&escaped, 0, opts.bash, opts.is_unescape()) {
                    Escape::Skip => continue,
                    escape @ Escape::Literal { consumed, .. } => {
                        if consumed >= run {
                            if let Some(c) = escaped.get(run) {
                                lex.bump(c.len_utf8());
                            }
                        }
                        out.push_str(&escape.output());
                    }
                }
                prev = Prev::Other;
            }
            FastToken::Star => {
                // `**` without separators is a single star
                if prev != Prev::Star {
                    if opts.bash {
                        out.push_str(".*?");
                    } else {
                        if prev == Prev::Dot {
                            out.push_str(chars.no_dot_slash);
                            if !lex.remainder().starts_with('*') {
                                out.push_str(chars.one_char);
                            }
                        }
                        out.push_str(&star);
                    }
                }
                prev = Prev::Star;
            }
            FastToken::Qmark => {
                out.push_str(if prev == Prev::Bos && !opts.dot {
                    chars.qmark_no_dot
                } else {
                    chars.qmark
                });
                prev = Prev::Other;
            }
            FastToken::Dot => {
                out.push_str(chars.dot_literal);
                prev = if prev == Prev::Bos {
                    Prev::Dot
                } else {
                    Prev::Other
                };
            }
            FastToken::Plus => {
                out.push_str(chars.plus_literal);
                prev = Prev::Other;
            }
            FastToken::Comma => {
                out.push(',');
                prev = Prev::Other;
            }
            FastToken::Special => {
                for c in lex.slice().chars() {
                    util::push_literal(&mut out, c);
                }
                prev = Prev::Other;
            }
            FastToken::Text => {
                out.push_str(lex.slice());
                prev = Prev::Other;
            }
        }
    }

    if prev == Prev::Star && !opts.is_strict_slashes() {
        out.push_str(chars.slash_literal);
        out.push('?');
    }
    Some(out)
}

/// Precomputed sources of common patterns, e.g. `*`, `**/*` or `*.js`.
///
/// Returns `Ok(None)` if the pattern is not one of them.
pub(crate) fn shortcut(input: &str, opts: &Options) -> Result<Option<String>, ParseError> {
    let len = input.chars().count();
    let max = opts.max_length();
    if len > max {
        return Err(ParseError::TooLong { len, max });
    }

    let input = chars::replacement(input).unwrap_or(input);
    let (rest, _) = util::remove_prefix(input);
    let chars = glob_chars(opts.is_windows());
    let mut star = if opts.bash {
        ".*?".to_string()
    } else {
        chars.star.to_string()
    };
    if opts.capture {
        star = format!("({star})");
    }

    // Only a trailing star allows a trailing separator, as in the compiler
    let maybe_slash = !opts.is_strict_slashes() && rest.ends_with('*') && rest != "**";
    Ok(create(rest, chars, opts, &star).map(|mut source| {
        if maybe_slash {
            source.push_str(chars.slash_literal);
            source.push('?');
        }
        format!("{}{source}", opts.prepend.as_deref().unwrap_or_default())
    }))
}

fn create(pattern: &str, c: &GlobChars, opts: &Options, star: &str) -> Option<String> {
    let nodot = if opts.dot { c.no_dots } else { c.no_dot };
    let slash_dot = if opts.dot { c.no_dots_slash } else { c.no_dot };
    let globstar = || {
        if opts.noglobstar {
            star.to_string()
        } else {
            c.globstar(opts.dot, opts.capture)
        }
    };
    let (one, dot, slash) = (c.one_char, c.dot_literal, c.slash_literal);

    Some(match pattern {
        "*" => format!("{nodot}{one}{star}"),
        ".*" => format!("{dot}{one}{star}"),
        "*.*" => format!("{nodot}{star}{dot}{one}{star}"),
        "*/*" => format!("{nodot}{star}{slash}{one}{slash_dot}{star}"),
        "**" => format!("{nodot}{}", globstar()),
        "**/*" => format!("(?:{nodot}{}{slash})?{slash_dot}{one}{star}", globstar()),
        "**/*.*" => format!(
            "(?:{nodot}{}{slash})?{slash_dot}{star}{dot}{one}{star}",
            globstar()
        ),
        "**/.*" => format!("(?:{nodot}{}{slash})?{dot}{one}{star}", globstar()),
        _ => {
            let (base, ext) = pattern.rsplit_once('.')?;
            if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return None;
            }
            format!("{}{dot}{ext}", create(base, c, opts, star)?)
        }
    })
}
