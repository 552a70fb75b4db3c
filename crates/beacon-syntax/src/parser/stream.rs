//! Token stream wrapper for the hand-written parser.

use crate::ast::{Position, Span};
use crate::diag::Diagnostic;
use crate::token::Token;
use std::ops::Range;

/// Source name plus line index, for converting byte offsets to positions.
pub(crate) struct SourceContext {
    name: String,
    line_starts: Vec<usize>,
}

impl SourceContext {
    pub(crate) fn new(name: &str, src: &str) -> Self {
        let mut line_starts = vec![0];
        for (idx, ch) in src.char_indices() {
            if ch == '\n' {
                line_starts.push(idx + 1);
            }
        }
        Self {
            name: name.to_string(),
            line_starts,
        }
    }

    /// Resolve a byte offset to a 1-based line/column position.
    pub(crate) fn position(&self, offset: usize) -> Position {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        Position {
            source: self.name.clone(),
            offset,
            line: (line_idx + 1) as u32,
            column: (offset - self.line_starts[line_idx] + 1) as u32,
        }
    }

    pub(crate) fn span(&self, range: Range<usize>) -> Span {
        Span::new(self.position(range.start), self.position(range.end))
    }
}

/// Token stream with lookahead and position tracking.
pub(crate) struct TokenStream<'src> {
    tokens: &'src [(Token, Range<usize>)],
    pos: usize,
    ctx: &'src SourceContext,
}

impl<'src> TokenStream<'src> {
    pub(crate) fn new(tokens: &'src [(Token, Range<usize>)], ctx: &'src SourceContext) -> Self {
        Self {
            tokens,
            pos: 0,
            ctx,
        }
    }

    pub(crate) fn peek(&self) -> Option<&'src Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    pub(crate) fn advance(&mut self) -> Option<&'src (Token, Range<usize>)> {
        let entry = self.tokens.get(self.pos);
        if entry.is_some() {
            self.pos += 1;
        }
        entry
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Check the current token against `expected` by discriminant.
    pub(crate) fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Consume `expected` or produce a diagnostic at the current token.
    pub(crate) fn expect(&mut self, expected: Token) -> Result<(), Diagnostic> {
        if self.check(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(match self.peek() {
                Some(t) => format!("expected {expected}, got {t}"),
                None => format!("unexpected end of file, expected {expected}"),
            }))
        }
    }

    /// Consume an identifier token and return its text.
    pub(crate) fn eat_ident(&mut self) -> Result<String, Diagnostic> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            Some(t) => Err(self.error_here(format!("expected identifier, got {t}"))),
            None => Err(self.error_here("unexpected end of file, expected identifier")),
        }
    }

    /// Start position of the current token (or EOF).
    pub(crate) fn current_start(&self) -> Position {
        match self.tokens.get(self.pos) {
            Some((_, range)) => self.ctx.position(range.start),
            None => match self.tokens.last() {
                Some((_, range)) => self.ctx.position(range.end),
                None => self.ctx.position(0),
            },
        }
    }

    /// End position of the most recently consumed token.
    pub(crate) fn prev_end(&self) -> Position {
        if self.pos == 0 {
            return self.ctx.position(0);
        }
        let (_, range) = &self.tokens[self.pos - 1];
        self.ctx.position(range.end)
    }

    /// A span from `start` to the end of the last consumed token.
    pub(crate) fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.prev_end())
    }

    /// An error-severity diagnostic at the current token.
    pub(crate) fn error_here(&self, message: impl Into<String>) -> Diagnostic {
        let start = self.current_start();
        let end = match self.tokens.get(self.pos) {
            Some((_, range)) => self.ctx.position(range.end),
            None => start.clone(),
        };
        Diagnostic::error(message, &Span::new(start, end))
    }

    /// Skip ahead to the next plausible statement boundary after an error.
    ///
    /// Consumes tokens while tracking brace depth; stops after the closing
    /// brace of the statement the error occurred in, or at end of input.
    pub(crate) fn synchronize(&mut self) {
        let mut depth = 0usize;
        while let Some((token, _)) = self.advance() {
            match token {
                Token::LBrace => depth += 1,
                Token::RBrace => {
                    if depth <= 1 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
    }
}
