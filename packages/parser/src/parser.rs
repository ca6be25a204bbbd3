use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize, Token, VOID_TAGS};
use std::ops::Range;

/// Parse a markup file into a position-annotated document.
///
/// Parse failure is a hard stop: callers must never attempt mutation on a
/// tree that failed to parse.
pub fn parse(source: &str) -> ParseResult<Document> {
    let tokens = tokenize(source)?;
    Parser::new(source, tokens).parse_document()
}

/// Recursive-descent parser over the unified token stream.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
    line_starts: Vec<usize>,
    next_id: NodeId,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, tokens: Vec<(Token<'src>, Range<usize>)>) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }

        Self {
            source,
            tokens,
            pos: 0,
            line_starts,
            next_id: 0,
        }
    }

    pub fn parse_document(&mut self) -> ParseResult<Document> {
        let mut doc = Document::new();

        while let Some((token, span)) = self.peek() {
            match token {
                Token::Text(text) => {
                    doc.nodes.push(Node::Text(TextNode {
                        value: text.to_string(),
                        span: Span::new(span.start, span.end),
                        dirty: false,
                    }));
                    self.advance();
                }
                Token::Comment(raw) => {
                    doc.nodes.push(Node::Comment(CommentNode {
                        raw: raw.to_string(),
                        span: Span::new(span.start, span.end),
                    }));
                    self.advance();
                }
                Token::Expr(raw) => {
                    doc.nodes.push(Node::Expression(ExpressionNode {
                        raw: raw.to_string(),
                        span: Span::new(span.start, span.end),
                    }));
                    self.advance();
                }
                Token::TagOpen => {
                    doc.nodes.push(Node::Element(self.parse_element()?));
                }
                other => {
                    return Err(ParseError::unexpected_token(
                        span.start,
                        "text, comment, expression, or element",
                        format!("{other:?}"),
                    ));
                }
            }
        }

        Ok(doc)
    }

    fn parse_element(&mut self) -> ParseResult<Element> {
        let (_, open) = self.expect_token(|t| matches!(t, Token::TagOpen), "<")?;
        let start = open.start;
        let (line, column) = self.position(start);

        let tag_name = self.expect_ident()?;
        let id = self.new_id();

        let mut attributes = Vec::new();
        let (self_closing, open_end) = loop {
            let Some((token, span)) = self.peek() else {
                return Err(ParseError::unexpected_eof(self.source.len()));
            };

            match token {
                Token::Ident(_) => attributes.push(self.parse_attribute()?),
                Token::Expr(raw) => {
                    // Spread attributes ({...props}) are kept verbatim and
                    // never targeted by mutations.
                    attributes.push(Attribute {
                        name: raw.to_string(),
                        value: None,
                        span: Some(Span::new(span.start, span.end)),
                        dirty: false,
                    });
                    self.advance();
                }
                Token::Gt => {
                    let end = span.end;
                    self.advance();
                    break (false, end);
                }
                Token::SlashGt => {
                    let end = span.end;
                    self.advance();
                    break (true, end);
                }
                other => {
                    return Err(ParseError::unexpected_token(
                        span.start,
                        "attribute, '>', or '/>'",
                        format!("{other:?}"),
                    ));
                }
            }
        };

        let open_span = Span::new(start, open_end);

        if self_closing || VOID_TAGS.contains(&tag_name.as_str()) {
            return Ok(Element {
                id,
                tag_name,
                attributes,
                children: Vec::new(),
                self_closing,
                span: open_span,
                open_span,
                line,
                column,
                attrs_dirty: false,
            });
        }

        let (children, close_end) = self.parse_children(&tag_name)?;

        Ok(Element {
            id,
            tag_name,
            attributes,
            children,
            self_closing: false,
            span: Span::new(start, close_end),
            open_span,
            line,
            column,
            attrs_dirty: false,
        })
    }

    fn parse_children(&mut self, tag_name: &str) -> ParseResult<(Vec<Node>, usize)> {
        let mut children = Vec::new();

        loop {
            let Some((token, span)) = self.peek() else {
                return Err(ParseError::unexpected_eof(self.source.len()));
            };

            match token {
                Token::Text(text) => {
                    children.push(Node::Text(TextNode {
                        value: text.to_string(),
                        span: Span::new(span.start, span.end),
                        dirty: false,
                    }));
                    self.advance();
                }
                Token::Comment(raw) => {
                    children.push(Node::Comment(CommentNode {
                        raw: raw.to_string(),
                        span: Span::new(span.start, span.end),
                    }));
                    self.advance();
                }
                Token::Expr(raw) => {
                    children.push(Node::Expression(ExpressionNode {
                        raw: raw.to_string(),
                        span: Span::new(span.start, span.end),
                    }));
                    self.advance();
                }
                Token::TagOpen => {
                    children.push(Node::Element(self.parse_element()?));
                }
                Token::CloseTagOpen => {
                    let close_pos = span.start;
                    self.advance();
                    let found = self.expect_ident()?;
                    if found != tag_name {
                        return Err(ParseError::mismatched_tag(close_pos, tag_name, found));
                    }
                    let (_, gt) = self.expect_token(|t| matches!(t, Token::Gt), ">")?;
                    return Ok((children, gt.end));
                }
                other => {
                    return Err(ParseError::unexpected_token(
                        span.start,
                        "child node or closing tag",
                        format!("{other:?}"),
                    ));
                }
            }
        }
    }

    fn parse_attribute(&mut self) -> ParseResult<Attribute> {
        let (name, name_span) = match self.peek() {
            Some((Token::Ident(name), span)) => {
                let result = (name.to_string(), span);
                self.advance();
                result
            }
            _ => unreachable!("caller checked for Ident"),
        };

        let mut end = name_span.end;
        let value = if self.match_token(|t| matches!(t, Token::Eq)) {
            let Some((token, span)) = self.peek() else {
                return Err(ParseError::unexpected_eof(self.source.len()));
            };

            let value = match token {
                Token::String(raw) => {
                    // Strip the surrounding quotes
                    AttrValue::String {
                        value: raw[1..raw.len() - 1].to_string(),
                    }
                }
                Token::Expr(raw) => AttrValue::Expression {
                    raw: raw.to_string(),
                },
                Token::Bare(raw) | Token::Ident(raw) => AttrValue::Bare {
                    value: raw.to_string(),
                },
                other => {
                    return Err(ParseError::unexpected_token(
                        span.start,
                        "attribute value",
                        format!("{other:?}"),
                    ));
                }
            };

            end = span.end;
            self.advance();
            Some(value)
        } else {
            None
        };

        Ok(Attribute {
            name,
            value,
            span: Some(Span::new(name_span.start, end)),
            dirty: false,
        })
    }

    /// 1-indexed line and 0-indexed column for a byte offset.
    fn position(&self, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = offset - self.line_starts[line];
        (line as u32 + 1, column as u32)
    }

    fn new_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn peek(&self) -> Option<(Token<'src>, Range<usize>)> {
        self.tokens.get(self.pos).map(|(t, r)| (t.clone(), r.clone()))
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn match_token(&mut self, pred: impl Fn(&Token<'src>) -> bool) -> bool {
        if self.peek().is_some_and(|(t, _)| pred(&t)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_token(
        &mut self,
        pred: impl Fn(&Token<'src>) -> bool,
        expected: &str,
    ) -> ParseResult<(Token<'src>, Range<usize>)> {
        match self.peek() {
            Some((token, span)) if pred(&token) => {
                self.advance();
                Ok((token, span))
            }
            Some((token, span)) => Err(ParseError::unexpected_token(
                span.start,
                expected,
                format!("{token:?}"),
            )),
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some((Token::Ident(name), _)) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            Some((token, span)) => Err(ParseError::unexpected_token(
                span.start,
                "identifier",
                format!("{token:?}"),
            )),
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }
}
