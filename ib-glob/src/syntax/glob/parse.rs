//! The glob compiler: a single pass from a glob pattern to regex source.
//!
//! ```
//! use ib_glob::{parse, Options};
//!
//! let state = parse("*.js", &Options::builder().windows(false).build()).unwrap();
//! assert_eq!(state.output, r"(?!\.)(?=.)[^/]*?\.js");
//! ```
//!
//! Tokens are kept in an arena ([`ParseState::tokens`]) and refer to their predecessor by
//! index. Some constructs rewrite earlier tokens (POSIX classes, brace ranges, globstar
//! continuations); they set [`ParseState::backtrack`] and the output is rebuilt from the
//! tokens before returning.
use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    error::{Error, ParseError},
    Options,
};

use super::{
    chars::{self, glob_chars, posix_class, GlobChars},
    fast,
    token::{Token, TokenKind},
    util::{self, Escape},
};

/// The compiler state, returned by [`parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseState {
    /// The pattern after replacement of the trivially equivalent forms like `***`.
    pub input: String,
    /// Number of characters consumed.
    pub index: usize,
    /// Index of the first character after the leading negation or `./`.
    pub start: usize,
    pub dot: bool,
    /// Glob text consumed so far.
    pub consumed: String,
    /// The unanchored regex source.
    pub output: String,
    /// `./` if it was stripped from the pattern.
    pub prefix: String,
    /// The output is stale and will be rebuilt from [`tokens`](Self::tokens).
    pub backtrack: bool,
    /// An odd run of leading `!`.
    pub negated: bool,
    /// The pattern starts with a negated extglob, e.g. `!(a)`.
    pub negated_extglob: bool,
    pub brackets: usize,
    pub braces: usize,
    pub parens: usize,
    /// Inside a `"..."` quoted section.
    pub quotes: bool,
    pub globstar: bool,
    /// The output was produced by the fast path.
    pub fastpaths: bool,
    pub tokens: Vec<Token>,
}

impl ParseState {
    pub(crate) fn new(input: &str, prefix: &str, opts: &Options) -> Self {
        let mut bos = Token::new(TokenKind::Bos, "")
            .with_output(opts.prepend.clone().unwrap_or_default());
        bos.prefix = !prefix.is_empty();
        Self {
            input: input.to_string(),
            index: 0,
            start: 0,
            dot: opts.dot,
            consumed: String::new(),
            output: bos.emitted().to_string(),
            prefix: prefix.to_string(),
            backtrack: false,
            negated: false,
            negated_extglob: false,
            brackets: 0,
            braces: 0,
            parens: 0,
            quotes: false,
            globstar: false,
            fastpaths: false,
            tokens: vec![bos],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Paren,
    Bracket,
    Brace,
}

#[derive(Debug)]
struct ExtglobEntry {
    kind: TokenKind,
    close: &'static str,
    /// Paren depth when the group was opened.
    parens: usize,
    /// Glob text inside the group.
    inner: String,
    conditions: usize,
    /// Token before the introducer.
    prev: usize,
}

#[derive(Debug)]
struct BraceEntry {
    token: usize,
    output_index: usize,
}

/// Compile `input` with the full state machine.
///
/// Malformed syntax is compiled to literal text, except with
/// [`strict_brackets`](Options::strict_brackets).
pub fn parse(input: &str, opts: &Options) -> Result<ParseState, Error> {
    Ok(compile(input, opts, false)?)
}

/// Compile `input`, trying the fast path first if `fastpaths` is set and the options allow it.
pub(crate) fn compile(
    input: &str,
    opts: &Options,
    fastpaths: bool,
) -> Result<ParseState, ParseError> {
    let input = chars::replacement(input).unwrap_or(input);
    if input.is_empty() {
        return Err(ParseError::Empty);
    }
    let len = input.chars().count();
    let max = opts.max_length();
    if len > max {
        return Err(ParseError::TooLong { len, max });
    }

    let (rest, prefix) = util::remove_prefix(input);
    let chars = glob_chars(opts.is_windows());

    if fastpaths && opts.fastpaths != Some(false) {
        if let Some(output) = fast::compile(rest, opts, chars) {
            trace!(pattern = input, %output, "fast path");
            let mut state = ParseState::new(input, prefix, opts);
            state.index = rest.chars().count();
            state.consumed = rest.to_string();
            state.output = output;
            state.fastpaths = true;
            return Ok(state);
        }
    }

    Parser::new(input, rest, prefix, opts, chars).run()
}

/// [`compile`] with the precomputed sources of common patterns like `*.js` tried first.
pub(crate) fn compile_with_shortcut(input: &str, opts: &Options) -> Result<ParseState, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty);
    }
    if opts.fastpaths != Some(false) && input.starts_with(['.', '*']) {
        if let Some(output) = fast::shortcut(input, opts)? {
            trace!(pattern = input, %output, "shortcut");
            let input = chars::replacement(input).unwrap_or(input);
            let (rest, prefix) = util::remove_prefix(input);
            let mut state = ParseState::new(input, prefix, opts);
            state.index = rest.chars().count();
            state.consumed = rest.to_string();
            state.output = output;
            state.fastpaths = true;
            return Ok(state);
        }
    }
    compile(input, opts, true)
}

fn is_text_stop(c: char) -> bool {
    matches!(
        c,
        '\0' | '@'
            | '!'
            | '['
            | ']'
            | '.'
            | ','
            | '$'
            | '*'
            | '+'
            | '?'
            | '^'
            | '{'
            | '}'
            | '('
            | ')'
            | '|'
            | '\\'
            | '/'
            | '"'
    )
}

/// `.ext` without separators or further dots.
fn is_extension(rest: &str) -> bool {
    rest.strip_prefix('.')
        .is_some_and(|ext| !ext.is_empty() && !ext.contains(['\\', '/', '.']))
}

/// `<=`, `<!` or `<name>` after `(?`.
fn is_lookbehind_or_name(rest: &str) -> bool {
    let Some(rest) = rest.strip_prefix('<') else {
        return false;
    };
    if rest.starts_with(['!', '=']) {
        return true;
    }
    let name = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .count();
    name > 0 && rest.chars().nth(name) == Some('>')
}

struct Parser<'a> {
    opts: &'a Options,
    chars: &'static GlobChars,
    input: Vec<char>,
    /// Index of the next character.
    idx: usize,
    prev: usize,
    stack: Vec<Delimiter>,
    extglobs: Vec<ExtglobEntry>,
    braces: Vec<BraceEntry>,
    /// Output offset of the open bracket.
    bracket_start: usize,
    star: String,
    globstar: String,
    state: ParseState,
}

impl<'a> Parser<'a> {
    fn new(
        input: &str,
        rest: &str,
        prefix: &str,
        opts: &'a Options,
        chars: &'static GlobChars,
    ) -> Self {
        let globstar = chars.globstar(opts.dot, opts.capture);
        let mut star = if opts.bash {
            globstar.clone()
        } else {
            chars.star.to_string()
        };
        if opts.capture {
            star = format!("({star})");
        }
        Self {
            opts,
            chars,
            input: rest.chars().collect(),
            idx: 0,
            prev: 0,
            stack: Vec::new(),
            extglobs: Vec::new(),
            braces: Vec::new(),
            bracket_start: 0,
            star,
            globstar,
            state: ParseState::new(input, prefix, opts),
        }
    }

    fn run(mut self) -> Result<ParseState, ParseError> {
        while let Some(c) = self.advance() {
            match c {
                '\0' => {}
                '\\' => self.escape(),
                _ if self.state.brackets > 0
                    && (c != ']' || matches!(self.prev_token().value.as_str(), "[" | "[^")) =>
                {
                    self.bracket_content(c)
                }
                _ if self.state.quotes && c != '"' => {
                    let mut output = String::new();
                    util::push_literal(&mut output, c);
                    self.push(Token::new(TokenKind::Text, c).with_output(output));
                }
                '"' => {
                    self.state.quotes = !self.state.quotes;
                    if self.opts.keep_quotes {
                        self.push(Token::new(TokenKind::Text, c));
                    }
                }
                '(' => {
                    self.increment(Delimiter::Paren);
                    self.push(Token::new(TokenKind::Paren, c));
                }
                ')' => self.close_paren()?,
                '[' => self.open_bracket()?,
                ']' => self.close_bracket()?,
                '{' if !self.opts.nobrace => self.open_brace(),
                '}' => self.close_brace(),
                '|' => {
                    if let Some(extglob) = self.extglobs.last_mut() {
                        extglob.conditions += 1;
                    }
                    self.push(Token::new(TokenKind::Pipe, c));
                }
                ',' => self.comma(),
                '/' => self.slash(),
                '.' => self.dot(),
                '?' => self.qmark(),
                '!' if !self.opts.is_noextglob()
                    && self.peek(1) == Some('(')
                    && (self.peek(2) != Some('?')
                        || !matches!(self.peek(3), Some('!' | '=' | '<' | ':'))) =>
                {
                    self.extglob_open(c)
                }
                '!' if !self.opts.nonegate && self.idx == 1 => self.negate(),
                '+' => self.plus(),
                '@' if self.extglob_follows() => self.extglob_open(c),
                '*' => self.star(),
                c => self.text(c),
            }
        }
        self.finish()
    }

    fn finish(mut self) -> Result<ParseState, ParseError> {
        while let Some(brace) = self.braces.pop() {
            if self.opts.is_strict_brackets() {
                return Err(ParseError::closing('}'));
            }
            debug!(pattern = %self.state.input, "unclosed '{{' escaped");
            self.unclose_brace(brace.token);
            self.decrement(Delimiter::Brace);
        }

        if self.state.parens > 0 {
            if self.opts.is_strict_brackets() {
                return Err(ParseError::closing(')'));
            }
            debug!(pattern = %self.state.input, parens = self.state.parens, "unclosed '(' escaped");
            self.unclose_parens();
        }

        if self.state.backtrack {
            self.state.output = self.state.tokens.iter().map(Token::emitted).collect();
        }

        while self.state.brackets > 0 {
            if self.opts.is_strict_brackets() {
                return Err(ParseError::closing(']'));
            }
            debug!(pattern = %self.state.input, "unclosed '[' escaped");
            util::escape_last(&mut self.state.output, '[');
            self.decrement(Delimiter::Bracket);
        }

        if !self.opts.is_strict_slashes()
            && matches!(self.prev_token().kind, TokenKind::Star | TokenKind::Bracket)
        {
            let output = format!("{}?", self.chars.slash_literal);
            self.push(Token::new(TokenKind::MaybeSlash, "").with_output(output));
        }

        self.state.index = self.idx;
        trace!(pattern = %self.state.input, output = %self.state.output, "compiled");
        Ok(self.state)
    }

    /// Turn an unclosed brace and its top-level alternatives back into literal text.
    fn unclose_brace(&mut self, token: usize) {
        let Some(brace) = self.state.tokens.get_mut(token) else {
            return;
        };
        brace.output = Some(r"\{".into());
        let mut depth = 0usize;
        for t in self.state.tokens.iter_mut().skip(token + 1) {
            match t.kind {
                TokenKind::Brace if t.value == "{" => depth += 1,
                TokenKind::Brace => depth = depth.saturating_sub(1),
                TokenKind::Comma if depth == 0 => t.output = None,
                TokenKind::Dots if depth == 0 => t.output = Some(r"\.\.".into()),
                _ => (),
            }
        }
        self.state.backtrack = true;
    }

    /// Turn unclosed parens and extglobs back into literal text, including the `|`s directly
    /// inside them.
    fn unclose_parens(&mut self) {
        let mut open = Vec::new();
        let mut pipes = Vec::new();
        for (i, t) in self.state.tokens.iter().enumerate() {
            match (t.kind, t.value.as_str()) {
                (TokenKind::Paren, "(") => open.push(i),
                (TokenKind::Paren, ")") => {
                    open.pop();
                }
                (TokenKind::Pipe, _) => {
                    if let Some(&paren) = open.last() {
                        pipes.push((i, paren));
                    }
                }
                _ => (),
            }
        }

        for &paren in &open {
            let t = &mut self.state.tokens[paren];
            t.output = Some(r"\(".into());
            if !t.extglob {
                continue;
            }
            // The introducer right before the group, e.g. `+` of `+(`
            if let Some(intro) = paren
                .checked_sub(1)
                .and_then(|i| self.state.tokens.get_mut(i))
            {
                let mut output = intro.output.clone().unwrap_or_default();
                for c in intro.value.chars() {
                    util::push_literal(&mut output, c);
                }
                intro.output = Some(output);
            }
        }
        for (pipe, paren) in pipes {
            if open.contains(&paren) {
                self.state.tokens[pipe].output = Some(r"\|".into());
            }
        }

        self.extglobs.clear();
        while self.state.parens > 0 {
            self.decrement(Delimiter::Paren);
        }
        self.state.backtrack = true;
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.input.get(self.idx).copied();
        if c.is_some() {
            self.idx += 1;
        }
        c
    }

    /// The `n`th character after the current one.
    fn peek(&self, n: usize) -> Option<char> {
        self.input.get(self.idx + n - 1).copied()
    }

    fn rest(&self) -> String {
        self.input[self.idx..].iter().collect()
    }

    fn extglob_follows(&self) -> bool {
        !self.opts.is_noextglob() && self.peek(1) == Some('(') && self.peek(2) != Some('?')
    }

    fn prev_token(&self) -> &Token {
        &self.state.tokens[self.prev]
    }

    fn prev_token_mut(&mut self) -> &mut Token {
        &mut self.state.tokens[self.prev]
    }

    fn counter(&mut self, delimiter: Delimiter) -> &mut usize {
        match delimiter {
            Delimiter::Paren => &mut self.state.parens,
            Delimiter::Bracket => &mut self.state.brackets,
            Delimiter::Brace => &mut self.state.braces,
        }
    }

    fn increment(&mut self, delimiter: Delimiter) {
        *self.counter(delimiter) += 1;
        self.stack.push(delimiter);
    }

    fn decrement(&mut self, delimiter: Delimiter) {
        let counter = self.counter(delimiter);
        if *counter > 0 {
            *counter -= 1;
            self.stack.pop();
        }
    }

    fn append(&mut self, value: &str, output: &str) {
        self.state.output.push_str(output);
        self.state.consumed.push_str(value);
    }

    /// Remove `suffix` from the output, or mark the output stale if it does not end with it.
    fn strip_output(&mut self, suffix: &str) {
        if self.state.output.ends_with(suffix) {
            let len = self.state.output.len() - suffix.len();
            self.state.output.truncate(len);
        } else {
            self.state.backtrack = true;
        }
    }

    fn truncate_output(&mut self, len: usize) {
        if len <= self.state.output.len() && self.state.output.is_char_boundary(len) {
            self.state.output.truncate(len);
        } else {
            self.state.backtrack = true;
        }
    }

    /// Reset the output to the `Bos` output without any guards added to it.
    fn reset_to_bos(&mut self) {
        let prepend = self.opts.prepend.clone().unwrap_or_default();
        self.state.output = prepend.clone();
        self.state.tokens[0].output = Some(prepend);
    }

    fn push(&mut self, mut tok: Token) {
        if self.prev_token().kind == TokenKind::Globstar {
            let is_brace =
                self.state.braces > 0 && matches!(tok.kind, TokenKind::Comma | TokenKind::Brace);
            let is_extglob = tok.extglob
                || (!self.extglobs.is_empty()
                    && matches!(tok.kind, TokenKind::Pipe | TokenKind::Paren));
            if !matches!(tok.kind, TokenKind::Slash | TokenKind::Paren) && !is_brace && !is_extglob
            {
                debug!(pattern = %self.state.input, "globstar demoted to star");
                let old = self.prev_token().emitted().to_string();
                self.strip_output(&old);
                let star = self.star.clone();
                self.state.output.push_str(&star);
                let prev = self.prev_token_mut();
                prev.kind = TokenKind::Star;
                prev.value = "*".into();
                prev.output = Some(star);
            }
        }

        if tok.kind != TokenKind::Paren {
            if let Some(extglob) = self.extglobs.last_mut() {
                extglob.inner.push_str(&tok.value);
            }
        }

        if !tok.value.is_empty() || tok.output.as_deref().is_some_and(|o| !o.is_empty()) {
            self.append(&tok.value, tok.emitted());
        }

        let prev = &mut self.state.tokens[self.prev];
        if prev.kind == TokenKind::Text && tok.kind == TokenKind::Text {
            prev.output = Some(format!("{}{}", prev.emitted(), tok.emitted()));
            prev.value.push_str(&tok.value);
            return;
        }

        tok.prev = Some(self.prev);
        self.state.tokens.push(tok);
        self.prev = self.state.tokens.len() - 1;
    }

    fn text(&mut self, c: char) {
        let mut value = String::from(c);
        let mut output = String::new();
        if is_text_stop(c) {
            util::push_literal(&mut output, c);
        } else {
            output.push(c);
        }
        while let Some(&c) = self.input.get(self.idx) {
            if is_text_stop(c) {
                break;
            }
            value.push(c);
            output.push(c);
            self.idx += 1;
        }
        self.push(Token::new(TokenKind::Text, value).with_output(output));
    }

    fn escape(&mut self) {
        let escape = util::escape_at(
            &self.input,
            self.idx - 1,
            self.opts.bash,
            self.opts.is_unescape(),
        );
        let Escape::Literal {
            consumed, value, ..
        } = &escape
        else {
            return;
        };
        self.idx += consumed;
        if self.state.brackets == 0 {
            self.push(Token::new(TokenKind::Text, value.clone()).with_output(escape.output()));
        } else {
            let output = escape.class_output();
            self.prev_token_mut().value.push_str(&output);
            self.append(value, &output);
        }
    }

    fn bracket_content(&mut self, c: char) {
        if c == ':' && self.opts.posix != Some(false) {
            let value = self.prev_token().value.clone();
            let inner = value.get(1..).unwrap_or_default();
            if inner.contains('[') {
                self.prev_token_mut().posix = true;
                if inner.contains(':') {
                    let class = value
                        .rfind('[')
                        .and_then(|at| Some((at, posix_class(value.get(at + 2..)?)?)));
                    if let Some((at, source)) = class {
                        self.prev_token_mut().value = format!("{}{source}", &value[..at]);
                        self.state.backtrack = true;
                        // `]` of `:]`
                        self.advance();
                        if self.prev == 1 && self.state.tokens[0].emitted().is_empty() {
                            self.state.tokens[0].output = Some(self.chars.one_char.into());
                        }
                        return;
                    }
                }
            }
        }

        let value = match c {
            '[' if self.peek(1) != Some(':') => r"\[".to_string(),
            '-' if self.peek(1) == Some(']') => r"\-".to_string(),
            ']' => r"\]".to_string(),
            '!' if self.prev_token().value == "[" && self.opts.posix != Some(false) => {
                "^".to_string()
            }
            '&' | '~' => format!("\\{c}"),
            c => c.to_string(),
        };
        self.prev_token_mut().value.push_str(&value);
        self.append(&value, &value);
    }

    fn open_bracket(&mut self) -> Result<(), ParseError> {
        if self.opts.nobracket || !self.input[self.idx..].contains(&']') {
            if !self.opts.nobracket && self.opts.is_strict_brackets() {
                return Err(ParseError::closing(']'));
            }
            self.push(Token::new(TokenKind::Bracket, r"\["));
            return Ok(());
        }
        self.increment(Delimiter::Bracket);
        self.push(Token::new(TokenKind::Bracket, '['));
        self.bracket_start = self.state.output.len().saturating_sub(1);
        Ok(())
    }

    fn close_bracket(&mut self) -> Result<(), ParseError> {
        let prev = self.prev_token();
        if self.opts.nobracket
            || (prev.kind == TokenKind::Bracket && prev.value.chars().count() == 1)
        {
            self.push(Token::new(TokenKind::Text, ']').with_output(r"\]"));
            return Ok(());
        }
        if self.state.brackets == 0 {
            if self.opts.is_strict_brackets() {
                return Err(ParseError::opening('['));
            }
            self.push(Token::new(TokenKind::Text, ']').with_output(r"\]"));
            return Ok(());
        }

        self.decrement(Delimiter::Bracket);
        let prev = self.prev_token();
        let content = prev.value.get(1..).unwrap_or_default().to_string();
        // A negated class never matches a separator
        let close = if !prev.posix && content.starts_with('^') && !content.contains('/') {
            if self.chars.sep == '\\' {
                r"\\/]"
            } else {
                "/]"
            }
        } else {
            "]"
        };
        self.prev_token_mut().value.push_str(close);
        self.append("]", close);

        if self.opts.literal_brackets == Some(false) || util::has_regex_chars(&content) {
            return Ok(());
        }

        let class = self.prev_token().value.clone();
        let escaped = util::escape_regex(&class);
        self.truncate_output(self.bracket_start);
        let value = match self.opts.literal_brackets {
            Some(true) => escaped,
            _ => format!(
                "({}{escaped}|{class})",
                if self.opts.capture { "" } else { "?:" }
            ),
        };
        self.state.output.push_str(&value);
        self.prev_token_mut().value = value;
        Ok(())
    }

    fn open_brace(&mut self) {
        self.increment(Delimiter::Brace);
        let output_index = self.state.output.len();
        let open = if self.opts.capture { "(" } else { "(?:" };
        self.push(Token::new(TokenKind::Brace, '{').with_output(open));
        self.braces.push(BraceEntry {
            token: self.prev,
            output_index,
        });
    }

    fn close_brace(&mut self) {
        let Some((token, output_index, comma, dots)) = self.braces.last().and_then(|brace| {
            let t = self.state.tokens.get(brace.token)?;
            Some((brace.token, brace.output_index, t.comma, t.dots))
        }) else {
            self.push(Token::new(TokenKind::Text, '}').with_output(r"\}"));
            return;
        };

        let mut output = ")".to_string();
        if dots {
            let range: Vec<String> = self.state.tokens[token + 1..]
                .iter()
                .filter(|t| t.kind != TokenKind::Dots)
                .map(|t| t.value.clone())
                .collect();
            self.state.tokens.truncate(token);
            self.prev = self.state.tokens.len() - 1;
            output = self.expand_range(&range);
            self.state.backtrack = true;
        } else if !comma {
            debug!(pattern = %self.state.input, "brace without alternatives escaped");
            self.state.tokens[token].output = Some(r"\{".into());
            output = r"\}".into();
            self.truncate_output(output_index);
            let rebuilt: String = self.state.tokens[token..]
                .iter()
                .map(Token::emitted)
                .collect();
            self.state.output.push_str(&rebuilt);
        }

        self.push(Token::new(TokenKind::Brace, '}').with_output(output));
        self.decrement(Delimiter::Brace);
        self.braces.pop();
    }

    fn expand_range(&self, args: &[String]) -> String {
        if let Some(expand) = &self.opts.expand_range {
            return expand(args, self.opts);
        }
        let mut sorted = args.to_vec();
        sorted.sort();
        let class = format!("[{}]", sorted.iter().join("-"));
        if regex_syntax::ParserBuilder::new()
            .build()
            .parse(&class)
            .is_ok()
        {
            class
        } else {
            args.iter().map(|arg| util::escape_regex(arg)).join("..")
        }
    }

    fn comma(&mut self) {
        let mut output = ",";
        if self.stack.last() == Some(&Delimiter::Brace) {
            if let Some(brace) = self.braces.last() {
                self.state.tokens[brace.token].comma = true;
                output = "|";
            }
        }
        self.push(Token::new(TokenKind::Comma, ',').with_output(output));
    }

    fn slash(&mut self) {
        // `./` after a leading negation
        if self.prev_token().kind == TokenKind::Dot && self.idx - 1 == self.state.start + 1 {
            self.state.start = self.idx;
            self.state.prefix = "./".into();
            self.state.tokens[0].prefix = true;
            self.state.consumed.clear();
            self.state.output = self.state.tokens[0].emitted().to_string();
            self.state.tokens.pop();
            self.prev = self.state.tokens.len() - 1;
            return;
        }
        self.push(Token::new(TokenKind::Slash, '/').with_output(self.chars.slash_literal));
    }

    fn dot(&mut self) {
        if self.state.braces > 0 && self.prev_token().kind == TokenKind::Dot {
            let dot_literal = self.chars.dot_literal;
            let prev = self.prev_token_mut();
            if prev.value == "." {
                prev.output = Some(dot_literal.into());
            }
            prev.kind = TokenKind::Dots;
            prev.output = Some(format!("{}.", prev.emitted()));
            prev.value.push('.');
            if let Some(brace) = self.braces.last() {
                self.state.tokens[brace.token].dots = true;
            }
            return;
        }

        let kind = if self.state.braces + self.state.parens == 0
            && !matches!(self.prev_token().kind, TokenKind::Bos | TokenKind::Slash)
        {
            TokenKind::Text
        } else {
            TokenKind::Dot
        };
        self.push(Token::new(kind, '.').with_output(self.chars.dot_literal));
    }

    fn qmark(&mut self) {
        let is_group = self.prev_token().value == "(";
        if !is_group && self.extglob_follows() {
            return self.extglob_open('?');
        }

        if self.prev_token().kind == TokenKind::Paren {
            // Regex group syntax like `(?:` passes through
            let next = self.peek(1);
            let escape = (is_group && !matches!(next, Some('!' | '=' | '<' | ':')))
                || (next == Some('<') && !is_lookbehind_or_name(&self.rest()));
            let output = if escape { self.chars.qmark_literal } else { "?" };
            self.push(Token::new(TokenKind::Text, '?').with_output(output));
            return;
        }

        let output = if !self.opts.dot
            && matches!(self.prev_token().kind, TokenKind::Slash | TokenKind::Bos)
        {
            self.chars.qmark_no_dot
        } else {
            self.chars.qmark
        };
        self.push(Token::new(TokenKind::Qmark, '?').with_output(output));
    }

    fn plus(&mut self) {
        if self.extglob_follows() {
            return self.extglob_open('+');
        }
        let prev = self.prev_token();
        let quantifier = prev.value != "("
            && self.opts.regex != Some(false)
            && !self.opts.noquantifiers
            && (matches!(
                prev.kind,
                TokenKind::Bracket | TokenKind::Paren | TokenKind::Brace
            ) || self.state.parens > 0);
        let output = if quantifier {
            "+"
        } else {
            self.chars.plus_literal
        };
        self.push(Token::new(TokenKind::Plus, '+').with_output(output));
    }

    /// Leading `!`s. Only an odd run negates the pattern.
    fn negate(&mut self) {
        let mut count = 1;
        while self.peek(1) == Some('!') && (self.peek(2) != Some('(') || self.peek(3) == Some('?'))
        {
            self.advance();
            count += 1;
        }
        self.state.start += count;
        if count % 2 == 1 {
            self.state.negated = true;
        }
    }

    fn extglob_open(&mut self, c: char) {
        let Some(ext) = self.chars.extglob(c).copied() else {
            return self.text(c);
        };
        let entry = ExtglobEntry {
            kind: ext.kind,
            close: ext.close,
            parens: self.state.parens,
            inner: String::new(),
            conditions: 1,
            prev: self.prev,
        };
        let open = format!("{}{}", if self.opts.capture { "(" } else { "" }, ext.open);
        self.increment(Delimiter::Paren);

        let intro = if self.state.output == self.state.tokens[0].emitted() {
            self.chars.one_char
        } else {
            ""
        };
        self.push(Token::new(ext.kind, c).with_output(intro));
        if let Some(paren) = self.advance() {
            self.push(Token::new(TokenKind::Paren, paren).with_output(open).extglob());
        }
        self.extglobs.push(entry);
    }

    fn close_paren(&mut self) -> Result<(), ParseError> {
        if self.state.parens == 0 && self.opts.is_strict_brackets() {
            return Err(ParseError::opening('('));
        }
        if self
            .extglobs
            .last()
            .is_some_and(|extglob| self.state.parens == extglob.parens + 1)
        {
            if let Some(extglob) = self.extglobs.pop() {
                return self.extglob_close(extglob);
            }
        }
        let output = if self.state.parens > 0 { ")" } else { r"\)" };
        self.push(Token::new(TokenKind::Paren, ')').with_output(output));
        self.decrement(Delimiter::Paren);
        Ok(())
    }

    fn extglob_close(&mut self, extglob: ExtglobEntry) -> Result<(), ParseError> {
        let mut close = extglob.close.to_string();
        if extglob.kind == TokenKind::Negate {
            let mut star = self.star.clone();
            if extglob.inner.chars().count() > 1 && extglob.inner.contains('/') {
                star = self.globstar.clone();
            }
            let rest = self.rest();
            if star != self.star || rest.chars().all(|c| c == ')') {
                close = format!(")$)){star}");
            }
            if is_extension(&rest) {
                let opts = Options {
                    fastpaths: Some(false),
                    prepend: None,
                    ..self.opts.clone()
                };
                let expression = compile(&rest, &opts, false)?.output;
                close = format!("){expression}){star})");
            }
            if self
                .state
                .tokens
                .get(extglob.prev)
                .is_some_and(|t| t.kind == TokenKind::Bos)
            {
                self.state.negated_extglob = true;
            }
        }
        if self.opts.capture {
            close.push(')');
        }
        trace!(kind = ?extglob.kind, conditions = extglob.conditions, "extglob closed");
        self.push(Token::new(TokenKind::Paren, ')').with_output(close).extglob());
        self.decrement(Delimiter::Paren);
        Ok(())
    }

    fn star(&mut self) {
        let prev = self.prev_token();
        if prev.kind == TokenKind::Globstar || prev.star {
            let star = self.star.clone();
            let prev = self.prev_token_mut();
            prev.kind = TokenKind::Star;
            prev.star = true;
            prev.value.push('*');
            prev.output = Some(star);
            self.state.backtrack = true;
            self.state.globstar = true;
            self.state.consumed.push('*');
            return;
        }

        if !self.opts.is_noextglob()
            && self.peek(1) == Some('(')
            && self.peek(2).is_some_and(|c| c != '?')
        {
            return self.extglob_open('*');
        }

        if prev.kind == TokenKind::Star {
            return self.double_star();
        }

        let prev_kind = prev.kind;
        if self.opts.bash {
            let mut output = ".*?".to_string();
            if !self.opts.dot && matches!(prev_kind, TokenKind::Bos | TokenKind::Slash) {
                output.insert_str(0, self.chars.no_dot);
            }
            self.push(Token::new(TokenKind::Star, '*').with_output(output));
            return;
        }

        if matches!(prev_kind, TokenKind::Bracket | TokenKind::Paren) && self.opts.regex == Some(true)
        {
            self.push(Token::new(TokenKind::Star, '*'));
            return;
        }

        if self.idx - 1 == self.state.start
            || matches!(prev_kind, TokenKind::Slash | TokenKind::Dot)
        {
            let mut guard = if prev_kind == TokenKind::Dot {
                self.chars.no_dot_slash
            } else if self.opts.dot {
                self.chars.no_dots_slash
            } else {
                self.chars.no_dot
            }
            .to_string();
            if self.peek(1) != Some('*') {
                guard.push_str(self.chars.one_char);
            }
            self.state.output.push_str(&guard);
            let prev = self.prev_token_mut();
            prev.output = Some(format!("{}{guard}", prev.emitted()));
        }

        let star = self.star.clone();
        self.push(Token::new(TokenKind::Star, '*').with_output(star));
    }

    /// A `*` right after a star: turn the star into a globstar if it is a whole segment.
    fn double_star(&mut self) {
        if self.opts.noglobstar {
            self.state.consumed.push('*');
            return;
        }

        let prev = self.prev;
        let prior = self.state.tokens[prev].prev.unwrap_or(0);
        let prior_kind = self.state.tokens[prior].kind;
        let before_kind = self.state.tokens[prior]
            .prev
            .map(|i| self.state.tokens[i].kind);
        let is_start = matches!(prior_kind, TokenKind::Slash | TokenKind::Bos);
        let after_star = matches!(before_kind, Some(TokenKind::Star | TokenKind::Globstar));

        if self.opts.bash && (!is_start || self.peek(1).is_some_and(|c| c != '/')) {
            self.push(Token::new(TokenKind::Star, '*').with_output(""));
            return;
        }

        let is_brace = self.state.braces > 0
            && matches!(prior_kind, TokenKind::Comma | TokenKind::Brace);
        let is_extglob = !self.extglobs.is_empty()
            && matches!(prior_kind, TokenKind::Pipe | TokenKind::Paren);
        if !is_start && prior_kind != TokenKind::Paren && !is_brace && !is_extglob {
            self.push(Token::new(TokenKind::Star, '*').with_output(""));
            return;
        }

        // `**/**/**` is `**`
        while self.input[self.idx..].starts_with(&['/', '*', '*']) {
            if self.input.get(self.idx + 3).is_some_and(|&c| c != '/') {
                break;
            }
            self.idx += 3;
            self.state.consumed.push_str("/**");
        }

        let globstar = self.globstar.clone();
        let slash = self.chars.slash_literal;
        let next = self.peek(1);
        let eos = next.is_none();
        self.state.globstar = true;
        self.state.consumed.push('*');

        if prior_kind == TokenKind::Bos && eos {
            debug!(pattern = %self.state.input, "globstar: whole pattern");
            self.reset_to_bos();
            self.state.output.push_str(&globstar);
            self.set_globstar(prev, globstar);
            return;
        }

        if prior_kind == TokenKind::Slash && before_kind != Some(TokenKind::Bos) {
            if !after_star && eos {
                debug!(pattern = %self.state.input, "globstar: trailing segment");
                let end = if self.opts.is_strict_slashes() { ")" } else { "|$)" };
                self.wrap_prior_slash(prior, prev, format!("{globstar}{end}"));
                return;
            }
            if next == Some('/') {
                debug!(pattern = %self.state.input, "globstar: middle segment");
                let end = if self.peek(2).is_some() { "|$" } else { "" };
                self.wrap_prior_slash(prior, prev, format!("{globstar}{slash}|{slash}{end})"));
                self.advance();
                self.push(Token::new(TokenKind::Slash, '/').with_output(""));
                return;
            }
        }

        if prior_kind == TokenKind::Bos && next == Some('/') {
            debug!(pattern = %self.state.input, "globstar: leading segment");
            let output = format!("(?:^|{slash}|{globstar}{slash})");
            self.reset_to_bos();
            self.state.output.push_str(&output);
            self.set_globstar(prev, output);
            self.advance();
            self.push(Token::new(TokenKind::Slash, '/').with_output(""));
            return;
        }

        let old = self.state.tokens[prev].emitted().to_string();
        self.strip_output(&old);
        self.state.output.push_str(&globstar);
        self.set_globstar(prev, globstar);
    }

    fn set_globstar(&mut self, token: usize, output: String) {
        let t = &mut self.state.tokens[token];
        t.kind = TokenKind::Globstar;
        t.value.push('*');
        t.output = Some(output);
    }

    /// Open a group at the slash before the globstar, so the separator becomes optional.
    fn wrap_prior_slash(&mut self, prior: usize, prev: usize, output: String) {
        let suffix = format!(
            "{}{}",
            self.state.tokens[prior].emitted(),
            self.state.tokens[prev].emitted()
        );
        self.strip_output(&suffix);
        let prior_output = format!("(?:{}", self.state.tokens[prior].emitted());
        self.state.output.push_str(&prior_output);
        self.state.output.push_str(&output);
        self.state.tokens[prior].output = Some(prior_output);
        self.set_globstar(prev, output);
    }
}
