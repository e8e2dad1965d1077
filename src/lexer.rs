// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::str::CharIndices;
use core::str::FromStr;
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};

use crate::number::Number;

#[derive(Clone)]
struct SourceInternal {
    pub file: String,
    pub contents: String,
    pub lines: Vec<(u32, u32)>,
}

#[derive(Clone)]
pub struct Source {
    src: Rc<SourceInternal>,
}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.src.file.fmt(f)
    }
}

impl Source {
    pub fn from_contents(file: String, contents: String) -> Result<Source> {
        let max_size = u32::MAX as usize - 2; // Account for rows, cols possibly starting at 1, EOF etc.
        if contents.len() > max_size {
            bail!("{file} exceeds maximum allowed configuration file size {max_size}");
        }
        let mut lines = vec![];
        let mut prev_ch = ' ';
        let mut prev_pos = 0u32;
        let mut start = 0u32;
        for (i, ch) in contents.char_indices() {
            if ch == '\n' {
                let end = match prev_ch {
                    '\r' => prev_pos,
                    _ => i as u32,
                };
                lines.push((start, end));
                start = i as u32 + 1;
            }
            prev_ch = ch;
            prev_pos = i as u32;
        }

        if (start as usize) < contents.len() {
            lines.push((start, contents.len() as u32));
        } else if contents.is_empty() {
            lines.push((0, 0));
        } else {
            let s = (contents.len() - 1) as u32;
            lines.push((s, s));
        }
        Ok(Self {
            src: Rc::new(SourceInternal {
                file,
                contents,
                lines,
            }),
        })
    }

    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Source> {
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => bail!("Failed to read {}. {e}", path.as_ref().display()),
        };
        Self::from_contents(path.as_ref().to_string_lossy().to_string(), contents)
    }

    pub fn file(&self) -> &String {
        &self.src.file
    }

    pub fn contents(&self) -> &String {
        &self.src.contents
    }

    pub fn line(&self, idx: u32) -> &str {
        let idx = idx as usize;
        if idx < self.src.lines.len() {
            let (start, end) = self.src.lines[idx];
            &self.src.contents[start as usize..end as usize]
        } else {
            ""
        }
    }

    pub fn message(&self, line: u32, col: u32, kind: &str, msg: &str) -> String {
        if line as usize > self.src.lines.len() {
            return format!("{}: invalid line {} specified", self.src.file, line);
        }

        let line_str = format!("{line}");
        let line_num_width = line_str.len() + 1;
        let col_spaces = col as usize - 1;

        format!(
            "\n--> {}:{}:{}\n{:<line_num_width$}|\n\
	    {:<line_num_width$}| {}\n\
	    {:<line_num_width$}| {:<col_spaces$}^\n\
	    {}: {}",
            self.src.file,
            line,
            col,
            "",
            line,
            self.line(line - 1),
            "",
            "",
            kind,
            msg
        )
    }

    pub fn error(&self, line: u32, col: u32, msg: &str) -> anyhow::Error {
        anyhow!(self.message(line, col, "error", msg))
    }
}

#[derive(Clone)]
pub struct Span {
    pub source: Source,
    pub line: u32,
    pub col: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn text(&self) -> &str {
        &self.source.contents()[self.start as usize..self.end as usize]
    }

    pub fn message(&self, kind: &str, msg: &str) -> String {
        self.source.message(self.line, self.col, kind, msg)
    }

    pub fn error(&self, msg: &str) -> anyhow::Error {
        self.source.error(self.line, self.col, msg)
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let t = self.text().escape_debug().to_string();
        let max = 32;
        let (txt, trailer) = if t.len() > max {
            (&t[0..max], "...")
        } else {
            (t.as_str(), "")
        };

        f.write_fmt(format_args!(
            "{}:{}:{}:{}, \"{}{}\"",
            self.line, self.col, self.start, self.end, txt, trailer
        ))
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    Symbol,
    String,
    Heredoc,
    Number,
    Ident,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token(pub TokenKind, pub Span);

#[derive(Clone)]
pub struct Lexer<'source> {
    source: Source,
    iter: Peekable<CharIndices<'source>>,
    line: u32,
    col: u32,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source Source) -> Self {
        Self {
            source: source.clone(),
            iter: source.contents().char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn peek(&mut self) -> (usize, char) {
        match self.iter.peek() {
            Some((index, chr)) => (*index, *chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn peekahead(&mut self, n: usize) -> (usize, char) {
        match self.iter.clone().nth(n) {
            Some((index, chr)) => (index, chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn read_ident(&mut self) -> Result<Token> {
        let start = self.peek().0;
        let col = self.col;
        loop {
            let ch = self.peek().1;
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                self.iter.next();
            } else {
                break;
            }
        }
        let end = self.peek().0;
        self.col += (end - start) as u32;
        Ok(Token(
            TokenKind::Ident,
            Span {
                source: self.source.clone(),
                line: self.line,
                col,
                start: start as u32,
                end: end as u32,
            },
        ))
    }

    fn read_digits(&mut self) {
        while self.peek().1.is_ascii_digit() {
            self.iter.next();
        }
    }

    fn read_number(&mut self) -> Result<Token> {
        let (start, chr) = self.peek();
        let col = self.col;
        self.iter.next();

        // Read integer part.
        if chr != '0' {
            // Starts with -, . or 1..9. Read the remaining digits.
            self.read_digits();
        }

        // Read fraction part.
        // . must be followed by at least 1 digit.
        if self.peek().1 == '.' && self.peekahead(1).1.is_ascii_digit() {
            self.iter.next(); // .
            self.read_digits();
        }

        // Read exponent part.
        let ch = self.peek().1;
        if ch == 'e' || ch == 'E' {
            self.iter.next();
            if matches!(self.peek().1, '+' | '-') {
                self.iter.next();
            }
            self.read_digits();
        }

        let end = self.peek().0;
        self.col += (end - start) as u32;

        // A valid number cannot be followed by these characters:
        let ch = self.peek().1;
        if ch == '_' || ch == '.' || ch.is_ascii_alphanumeric() {
            return Err(self.source.error(self.line, self.col, "invalid number"));
        }

        // Ensure that the number is representable.
        if Number::from_str(&self.source.contents()[start..end]).is_err() {
            return Err(self.source.error(self.line, col, "invalid number"));
        }

        Ok(Token(
            TokenKind::Number,
            Span {
                source: self.source.clone(),
                line: self.line,
                col,
                start: start as u32,
                end: end as u32,
            },
        ))
    }

    // The span covers the whole literal including both quotes, so the raw
    // text can be captured and re-lexed later.
    fn read_string(&mut self) -> Result<Token> {
        let (line, col) = (self.line, self.col);
        let (start, _) = self.peek();
        self.iter.next();
        self.col += 1;
        loop {
            let (_, ch) = self.peek();
            match ch {
                '"' | '\x00' => break,
                '\n' => return Err(self.source.error(line, col, "unmatched \"")),
                '\\' => {
                    self.iter.next();
                    self.col += 1;
                    let (_, ch) = self.peek();
                    self.iter.next();
                    self.col += 1;
                    match ch {
                        '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' => (),
                        'u' => {
                            for _i in 0..4 {
                                let (_, ch) = self.peek();
                                if !ch.is_ascii_hexdigit() {
                                    return Err(self.source.error(
                                        self.line,
                                        self.col,
                                        "invalid hex escape sequence",
                                    ));
                                }
                                self.iter.next();
                                self.col += 1;
                            }
                        }
                        _ => {
                            return Err(self.source.error(
                                self.line,
                                self.col,
                                "invalid escape sequence",
                            ))
                        }
                    }
                }
                _ => {
                    self.iter.next();
                    self.col += 1;
                }
            }
        }

        if self.peek().1 != '"' {
            return Err(self.source.error(line, col, "unmatched \""));
        }

        self.iter.next();
        self.col += 1;
        let end = self.peek().0;

        Ok(Token(
            TokenKind::String,
            Span {
                source: self.source.clone(),
                line,
                col,
                start: start as u32,
                end: end as u32,
            },
        ))
    }

    // Heredoc literal, e.g.
    //    <<EOT
    //    hello
    //    EOT
    // The span covers everything from `<<` through the closing delimiter so
    // the raw text can be captured; the parser extracts the body.
    fn read_heredoc(&mut self) -> Result<Token> {
        let (line, col) = (self.line, self.col);
        let (start, _) = self.peek();
        self.iter.next();
        self.iter.next();
        self.col += 2;

        if self.peek().1 == '-' {
            self.iter.next();
            self.col += 1;
        }

        let (delim_start, ch) = self.peek();
        if !(ch.is_ascii_alphabetic() || ch == '_') {
            return Err(self
                .source
                .error(self.line, self.col, "expecting heredoc delimiter"));
        }
        loop {
            let ch = self.peek().1;
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                self.iter.next();
                self.col += 1;
            } else {
                break;
            }
        }
        let delim_end = self.peek().0;
        let delim = self.source.contents()[delim_start..delim_end].to_string();

        while matches!(self.peek().1, ' ' | '\t') {
            self.iter.next();
            self.col += 1;
        }
        if self.peek().1 == '\r' {
            self.iter.next();
        }
        if self.peek().1 != '\n' {
            return Err(self.source.error(
                self.line,
                self.col,
                "expecting newline after heredoc delimiter",
            ));
        }
        self.iter.next();
        self.line += 1;
        self.col = 1;

        loop {
            let line_start = self.peek().0;
            let mut at_eof = false;
            loop {
                match self.peek().1 {
                    '\n' => break,
                    '\x00' => {
                        at_eof = true;
                        break;
                    }
                    _ => {
                        self.iter.next();
                    }
                }
            }
            let line_end = self.peek().0;
            let text = self.source.contents()[line_start..line_end].trim_end_matches('\r');
            if text.trim_start_matches([' ', '\t']) == delim {
                self.col = 1 + (line_end - line_start) as u32;
                return Ok(Token(
                    TokenKind::Heredoc,
                    Span {
                        source: self.source.clone(),
                        line,
                        col,
                        start: start as u32,
                        end: line_end as u32,
                    },
                ));
            }
            if at_eof {
                return Err(self.source.error(line, col, "unterminated heredoc"));
            }
            self.iter.next();
            self.line += 1;
            self.col = 1;
        }
    }

    fn skip_ws(&mut self) -> Result<()> {
        // Whitespace and all three comment forms are skipped.
        // A tab is considered 4 space characters.
        'outer: loop {
            match self.peek().1 {
                ' ' => self.col += 1,
                '\t' => self.col += 4,
                '\r' => {
                    if self.peekahead(1).1 != '\n' {
                        return Err(self.source.error(
                            self.line,
                            self.col,
                            "\\r must be followed by \\n",
                        ));
                    }
                }
                '\n' => {
                    self.col = 1;
                    self.line += 1;
                }
                '#' => {
                    self.iter.next();
                    loop {
                        match self.peek().1 {
                            '\n' | '\x00' => continue 'outer,
                            _ => self.iter.next(),
                        };
                    }
                }
                '/' if self.peekahead(1).1 == '/' => {
                    self.iter.next();
                    self.iter.next();
                    loop {
                        match self.peek().1 {
                            '\n' | '\x00' => continue 'outer,
                            _ => self.iter.next(),
                        };
                    }
                }
                '/' if self.peekahead(1).1 == '*' => {
                    let (line, col) = (self.line, self.col);
                    self.iter.next();
                    self.iter.next();
                    self.col += 2;
                    loop {
                        match self.peek().1 {
                            '\x00' => {
                                return Err(self.source.error(line, col, "unterminated comment"));
                            }
                            '\n' => {
                                self.line += 1;
                                self.col = 1;
                                self.iter.next();
                            }
                            '*' if self.peekahead(1).1 == '/' => {
                                self.iter.next();
                                self.iter.next();
                                self.col += 2;
                                continue 'outer;
                            }
                            _ => {
                                self.col += 1;
                                self.iter.next();
                            }
                        }
                    }
                }
                _ => break,
            }
            self.iter.next();
        }
        Ok(())
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_ws()?;

        let (start, chr) = self.peek();
        let col = self.col;

        match chr {
            // - followed by a digit is a negative number.
            '-' | '.' if self.peekahead(1).1.is_ascii_digit() => self.read_number(),
            '<' if self.peekahead(1).1 == '<' => self.read_heredoc(),
            // grouping, separators and the operator characters that can
            // occur inside skipped blocks
            '{' | '}' | '[' | ']' | '(' | ')' | ',' | ';' | '.' | '=' | ':' | '+' | '-' | '*'
            | '/' | '%' | '&' | '|' | '!' | '?' | '<' | '>' => {
                self.col += 1;
                self.iter.next();
                Ok(Token(
                    TokenKind::Symbol,
                    Span {
                        source: self.source.clone(),
                        line: self.line,
                        col,
                        start: start as u32,
                        end: start as u32 + 1,
                    },
                ))
            }
            '"' => self.read_string(),
            '\x00' => Ok(Token(
                TokenKind::Eof,
                Span {
                    source: self.source.clone(),
                    line: self.line,
                    col,
                    start: start as u32,
                    end: start as u32,
                },
            )),
            _ if chr.is_ascii_digit() => self.read_number(),
            _ if chr.is_ascii_alphabetic() || chr == '_' => self.read_ident(),
            _ => Err(self.source.error(self.line, self.col, "invalid character")),
        }
    }
}
