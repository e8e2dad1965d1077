// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::str::FromStr;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::Result;

use crate::lexer::{Lexer, Source, Span, Token, TokenKind};
use crate::loader::{ParsingMode, Variable};
use crate::number::Number;
use crate::value::Value;

/// Recursive-descent parser for the configuration-language subset handled
/// here: constant expressions, variable definitions files and `variable`
/// declaration blocks. Anything that would require evaluation context
/// (references, function calls, interpolation) is rejected.
#[derive(Clone)]
pub struct Parser<'source> {
    source: Source,
    lexer: Lexer<'source>,
    tok: Token,
    end: u32,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source Source) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let tok = lexer.next_token()?;
        Ok(Self {
            source: source.clone(),
            lexer,
            tok,
            end: 0,
        })
    }

    pub fn token_text(&self) -> &str {
        match self.tok.0 {
            TokenKind::Symbol | TokenKind::Number | TokenKind::Ident | TokenKind::Eof => {
                self.tok.1.text()
            }
            TokenKind::String | TokenKind::Heredoc => "",
        }
    }

    pub fn next_token(&mut self) -> Result<()> {
        self.end = self.tok.1.end;
        self.tok = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, text: &str, context: &str) -> Result<()> {
        if self.token_text() == text {
            self.next_token()
        } else {
            let msg = format!("expecting `{text}` {context}");
            Err(self.source.error(self.tok.1.line, self.tok.1.col, &msg))
        }
    }

    pub fn expect_eof(&mut self, context: &str) -> Result<()> {
        if self.tok.0 == TokenKind::Eof {
            Ok(())
        } else {
            let msg = format!("unexpected token {context}");
            Err(self.source.error(self.tok.1.line, self.tok.1.col, &msg))
        }
    }

    fn parse_ident(&mut self) -> Result<Span> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Ident => {
                self.next_token()?;
                Ok(span)
            }
            _ => Err(self
                .source
                .error(self.tok.1.line, self.tok.1.col, "expecting identifier")),
        }
    }

    /// Parses a constant expression into a [`Value`].
    pub fn parse_value(&mut self) -> Result<Value> {
        let span = self.tok.1.clone();
        match &self.tok.0 {
            TokenKind::Number => {
                let n = Number::from_str(span.text())
                    .map_err(|_| span.error("could not parse number"))?;
                self.next_token()?;
                Ok(Value::Number(n))
            }
            TokenKind::String => {
                let s = unquote(span.text())
                    .map_err(|e| span.error(&format!("invalid string literal: {e}")))?;
                self.next_token()?;
                Ok(Value::from(s))
            }
            TokenKind::Heredoc => {
                let s = heredoc_content(span.text());
                self.next_token()?;
                Ok(Value::from(s))
            }
            TokenKind::Ident => match span.text() {
                "null" => {
                    self.next_token()?;
                    Ok(Value::Null)
                }
                "true" => {
                    self.next_token()?;
                    Ok(Value::Bool(true))
                }
                "false" => {
                    self.next_token()?;
                    Ok(Value::Bool(false))
                }
                _ => Err(span.error("expecting a constant value")),
            },
            TokenKind::Symbol if span.text() == "[" => self.parse_array(),
            TokenKind::Symbol if span.text() == "{" => self.parse_object(),
            _ => Err(span.error("expecting a constant value")),
        }
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.expect("[", "while parsing list")?;
        let mut items = vec![];
        if self.token_text() != "]" {
            items.push(self.parse_value()?);
            while self.token_text() == "," {
                self.next_token()?;
                if self.token_text() == "]" {
                    break;
                }
                items.push(self.parse_value()?);
            }
        }
        self.expect("]", "while parsing list")?;
        Ok(Value::from(items))
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.expect("{", "while parsing object")?;
        let mut fields = BTreeMap::new();
        while self.token_text() != "}" {
            let key: Rc<str> = match self.tok.0 {
                TokenKind::Ident => {
                    let key = self.tok.1.text().into();
                    self.next_token()?;
                    key
                }
                TokenKind::String => {
                    let span = self.tok.1.clone();
                    let key = unquote(span.text())
                        .map_err(|e| span.error(&format!("invalid string literal: {e}")))?;
                    self.next_token()?;
                    key.into()
                }
                _ => {
                    return Err(self.source.error(
                        self.tok.1.line,
                        self.tok.1.col,
                        "expecting attribute name or `}` while parsing object",
                    ))
                }
            };
            // Both separators of the object grammar are accepted; the JSON
            // form uses the latter.
            if self.token_text() == "=" || self.token_text() == ":" {
                self.next_token()?;
            } else {
                return Err(self.source.error(
                    self.tok.1.line,
                    self.tok.1.col,
                    "expecting `=` after attribute name",
                ));
            }
            let value = self.parse_value()?;
            fields.insert(key, value);
            if self.token_text() == "," {
                self.next_token()?;
            }
        }
        self.next_token()?;
        Ok(Value::from(fields))
    }

    /// Parses a variable definitions file body: top-level `name = <expr>`
    /// attributes. Returns each attribute's name and the expression's
    /// source text, unevaluated.
    pub fn parse_tfvars_body(&mut self) -> Result<Vec<(String, String)>> {
        let mut attrs = vec![];
        while self.tok.0 != TokenKind::Eof {
            let name = self.parse_ident()?;
            self.expect("=", "after variable name")?;
            let start = self.tok.1.start;
            self.parse_value()?;
            let end = self.end;
            attrs.push((
                name.text().to_string(),
                self.source.contents()[start as usize..end as usize].to_string(),
            ));
        }
        Ok(attrs)
    }

    /// Parses a configuration file body, extracting `variable` blocks and
    /// skipping every other block unexamined.
    pub fn parse_config_body(&mut self) -> Result<Vec<Variable>> {
        let mut vars = vec![];
        while self.tok.0 != TokenKind::Eof {
            let ident = self.parse_ident()?;
            if ident.text() == "variable" {
                vars.push(self.parse_variable_block()?);
            } else {
                while matches!(self.tok.0, TokenKind::String | TokenKind::Ident) {
                    self.next_token()?;
                }
                self.skip_block()?;
            }
        }
        Ok(vars)
    }

    fn parse_variable_block(&mut self) -> Result<Variable> {
        let name = self.parse_block_label()?;
        self.expect("{", "while parsing variable block")?;

        let mut value = Value::Undefined;
        let mut parsing_mode = ParsingMode::Literal;

        while self.token_text() != "}" {
            if self.tok.0 == TokenKind::Eof {
                return Err(self.tok.1.error("expecting `}` in variable block"));
            }
            let attr = self.parse_ident()?;
            match attr.text() {
                "default" => {
                    self.expect("=", "after `default`")?;
                    value = self.parse_value()?;
                }
                "type" => {
                    self.expect("=", "after `type`")?;
                    parsing_mode = self.parse_type()?;
                }
                // description, sensitive, nullable, ...
                _ if self.token_text() == "=" => {
                    self.next_token()?;
                    self.parse_value()?;
                }
                // nested blocks such as validation
                _ => {
                    while matches!(self.tok.0, TokenKind::String | TokenKind::Ident) {
                        self.next_token()?;
                    }
                    self.skip_block()?;
                }
            }
        }
        self.next_token()?;

        Ok(Variable {
            name,
            value,
            parsing_mode,
        })
    }

    fn parse_block_label(&mut self) -> Result<String> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::String => {
                let label = unquote(span.text())
                    .map_err(|e| span.error(&format!("invalid string literal: {e}")))?;
                self.next_token()?;
                Ok(label)
            }
            TokenKind::Ident => {
                self.next_token()?;
                Ok(span.text().to_string())
            }
            _ => Err(span.error("expecting block label")),
        }
    }

    /// Determines the parsing mode from a declared type expression. The
    /// expression itself is consumed with balanced-delimiter scanning and
    /// not otherwise checked.
    fn parse_type(&mut self) -> Result<ParsingMode> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            // legacy quoted form, e.g. type = "string"
            TokenKind::String => {
                let text = unquote(span.text())
                    .map_err(|e| span.error(&format!("invalid string literal: {e}")))?;
                self.next_token()?;
                Ok(if text == "string" {
                    ParsingMode::Literal
                } else {
                    ParsingMode::Hcl
                })
            }
            TokenKind::Ident => {
                let name = span.text().to_string();
                self.next_token()?;
                if self.token_text() == "(" {
                    // constructor such as list(string) or object({...})
                    self.skip_delimited()?;
                    return Ok(ParsingMode::Hcl);
                }
                Ok(if name == "string" {
                    ParsingMode::Literal
                } else {
                    ParsingMode::Hcl
                })
            }
            _ => Err(span.error("expecting type expression")),
        }
    }

    // Consumes tokens from the current opening delimiter until it balances.
    // Strings and heredocs are single tokens, so delimiters inside them do
    // not count.
    fn skip_delimited(&mut self) -> Result<()> {
        let span = self.tok.1.clone();
        let mut depth = 0u32;
        loop {
            if self.tok.0 == TokenKind::Eof {
                return Err(span.error("unbalanced delimiter"));
            }
            match self.token_text() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| self.tok.1.error("unbalanced delimiter"))?;
                    if depth == 0 {
                        return self.next_token();
                    }
                }
                _ => (),
            }
            self.next_token()?;
        }
    }

    fn skip_block(&mut self) -> Result<()> {
        if self.token_text() != "{" {
            return Err(self.source.error(
                self.tok.1.line,
                self.tok.1.col,
                "expecting `{` while parsing block",
            ));
        }
        self.skip_delimited()
    }
}

// Decodes a quoted string literal, including the surrounding quotes. The
// escape grammar matches what the lexer admitted, so serde_json can do the
// decoding; the template escapes are handled afterwards.
fn unquote(text: &str) -> Result<String> {
    let s: String = serde_json::from_str(text)?;
    Ok(s.replace("$${", "${").replace("%%{", "%{"))
}

// Extracts the body of a heredoc literal from its raw text, which spans
// from `<<` through the closing delimiter line.
fn heredoc_content(text: &str) -> String {
    let indented = text.starts_with("<<-");
    let rest = &text[if indented { 3 } else { 2 }..];
    let Some((_, body)) = rest.split_once('\n') else {
        return String::new();
    };
    // Drop the closing delimiter line; the content keeps its final newline.
    let body = match body.rfind('\n') {
        Some(i) => &body[..=i],
        None => "",
    };
    if !indented {
        return body.to_string();
    }
    let min_indent = body
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    let mut out = String::with_capacity(body.len());
    for line in body.lines() {
        if line.len() >= min_indent {
            out.push_str(&line[min_indent..]);
        } else {
            out.push_str(line.trim_start_matches([' ', '\t']));
        }
        out.push('\n');
    }
    out
}
