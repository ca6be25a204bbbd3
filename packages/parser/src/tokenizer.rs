use crate::error::{ParseError, ParseResult};
use logos::{Lexer, Logos};
use std::ops::Range;

/// Elements that never take a closing tag in HTML-style markup.
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Tokens recognized in character-data position (outside tags).
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum ContentToken {
    #[token("<!--")]
    CommentOpen,

    #[token("</")]
    CloseTagOpen,

    #[token("<")]
    TagOpen,

    #[token("{")]
    ExprOpen,

    #[token("}")]
    BraceClose,

    #[regex(r"[^<{}]+")]
    Text,
}

/// Tokens recognized inside an open or close tag.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TagToken {
    // Tag and attribute names, including namespaced/dashed forms
    #[regex(r"[A-Za-z_][A-Za-z0-9_.:\-]*")]
    Ident,

    #[token("=")]
    Eq,

    #[token(">")]
    Gt,

    #[token("/>")]
    SlashGt,

    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r#"'([^'\\]|\\.)*'"#)]
    String,

    // Unquoted attribute values (numbers, percentages)
    #[regex(r"[0-9][A-Za-z0-9_.%\-]*")]
    Bare,

    #[token("{")]
    ExprOpen,
}

/// Unified token stream consumed by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    Text(&'src str),
    Comment(&'src str),
    Expr(&'src str),
    TagOpen,
    CloseTagOpen,
    Ident(&'src str),
    Eq,
    Gt,
    SlashGt,
    String(&'src str),
    Bare(&'src str),
}

/// Tokenize a markup source file.
///
/// The lexer switches between content and tag token sets via `morph`.
/// Stray `<` characters that do not start a tag name are folded back into
/// the surrounding text run, so raw non-markup code survives tokenization.
///
/// Brace expressions whose bodies contain no markup stay opaque. When a
/// `{...}` region does contain markup (the generated-component shape, where
/// a function body wraps the returned elements, or a conditional child like
/// `{cond && <span/>}`), the code fragments around the markup are emitted
/// as raw `Expr` runs and the elements inside stay addressable.
pub fn tokenize(source: &str) -> ParseResult<Vec<(Token<'_>, Range<usize>)>> {
    let mut tokens: Vec<(Token<'_>, Range<usize>)> = Vec::new();
    let mut content = ContentToken::lexer(source);

    // Element nesting depth, so text inside elements stays Text even when
    // the element sits inside a broken-open brace region.
    let mut elem_depth: usize = 0;
    // Each broken-open `{` records the element depth it was seen at; raw
    // mode is on whenever the innermost one matches the current depth.
    let mut raw_stack: Vec<usize> = Vec::new();

    while let Some(result) = content.next() {
        let span = content.span();
        let raw = raw_stack.last() == Some(&elem_depth);

        match result {
            Ok(ContentToken::Text) => {
                if raw {
                    push_raw(&mut tokens, source, span);
                } else {
                    push_text(&mut tokens, source, span);
                }
            }

            Ok(ContentToken::BraceClose) => {
                if raw {
                    raw_stack.pop();
                    push_raw(&mut tokens, source, span);
                } else {
                    // Stray close brace in plain content is just text
                    push_text(&mut tokens, source, span);
                }
            }

            Ok(ContentToken::CommentOpen) => {
                let rem = content.remainder();
                let Some(idx) = rem.find("-->") else {
                    return Err(ParseError::UnterminatedComment { pos: span.start });
                };
                content.bump(idx + 3);
                let end = content.span().end;
                tokens.push((Token::Comment(&source[span.start..end]), span.start..end));
            }

            Ok(ContentToken::ExprOpen) => {
                let rem = content.remainder();
                let Some(idx) = find_balanced_close(rem) else {
                    return Err(ParseError::UnbalancedExpression { pos: span.start });
                };

                if contains_markup(&rem[..idx]) {
                    // Break the region open: keep the brace as raw code and
                    // keep lexing so the markup inside stays addressable.
                    raw_stack.push(elem_depth);
                    push_raw(&mut tokens, source, span);
                } else if raw {
                    content.bump(idx + 1);
                    let end = content.span().end;
                    push_raw(&mut tokens, source, span.start..end);
                } else {
                    content.bump(idx + 1);
                    let end = content.span().end;
                    tokens.push((Token::Expr(&source[span.start..end]), span.start..end));
                }
            }

            Ok(ContentToken::TagOpen) => {
                if starts_name(content.remainder()) {
                    tokens.push((Token::TagOpen, span));
                    let name_idx = tokens.len();
                    let mut tag = content.morph::<TagToken>();
                    let self_closed = lex_tag(&mut tag, source, &mut tokens)?;
                    content = tag.morph();

                    if !self_closed {
                        if let Some((Token::Ident(name), _)) = tokens.get(name_idx) {
                            if !VOID_TAGS.contains(name) {
                                elem_depth += 1;
                            }
                        }
                    }
                } else if raw {
                    push_raw(&mut tokens, source, span);
                } else {
                    push_text(&mut tokens, source, span);
                }
            }

            Ok(ContentToken::CloseTagOpen) => {
                if starts_name(content.remainder()) {
                    tokens.push((Token::CloseTagOpen, span));
                    let mut tag = content.morph::<TagToken>();
                    lex_tag(&mut tag, source, &mut tokens)?;
                    content = tag.morph();
                    elem_depth = elem_depth.saturating_sub(1);
                } else if raw {
                    push_raw(&mut tokens, source, span);
                } else {
                    push_text(&mut tokens, source, span);
                }
            }

            Err(()) => return Err(ParseError::lexer_error(span.start)),
        }
    }

    Ok(tokens)
}

/// Lex tag-interior tokens until the closing `>` or `/>`. Returns whether
/// the tag was self-closing.
fn lex_tag<'src>(
    lexer: &mut Lexer<'src, TagToken>,
    source: &'src str,
    tokens: &mut Vec<(Token<'src>, Range<usize>)>,
) -> ParseResult<bool> {
    loop {
        let Some(result) = lexer.next() else {
            return Err(ParseError::unexpected_eof(source.len()));
        };
        let span = lexer.span();

        match result {
            Ok(TagToken::Ident) => tokens.push((Token::Ident(lexer.slice()), span)),
            Ok(TagToken::Eq) => tokens.push((Token::Eq, span)),
            Ok(TagToken::String) => tokens.push((Token::String(lexer.slice()), span)),
            Ok(TagToken::Bare) => tokens.push((Token::Bare(lexer.slice()), span)),

            Ok(TagToken::ExprOpen) => {
                let Some(idx) = find_balanced_close(lexer.remainder()) else {
                    return Err(ParseError::UnbalancedExpression { pos: span.start });
                };
                lexer.bump(idx + 1);
                let end = lexer.span().end;
                tokens.push((Token::Expr(&source[span.start..end]), span.start..end));
            }

            Ok(TagToken::Gt) => {
                tokens.push((Token::Gt, span));
                return Ok(false);
            }

            Ok(TagToken::SlashGt) => {
                tokens.push((Token::SlashGt, span));
                return Ok(true);
            }

            Err(()) => return Err(ParseError::lexer_error(span.start)),
        }
    }
}

fn starts_name(rem: &str) -> bool {
    rem.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

/// Merge adjacent text runs so stray `<`/`{` characters stay part of one
/// contiguous raw segment.
fn push_text<'src>(
    tokens: &mut Vec<(Token<'src>, Range<usize>)>,
    source: &'src str,
    span: Range<usize>,
) {
    if let Some((token, last_span)) = tokens.last_mut() {
        if matches!(token, Token::Text(_)) && last_span.end == span.start {
            last_span.end = span.end;
            *token = Token::Text(&source[last_span.start..last_span.end]);
            return;
        }
    }
    tokens.push((Token::Text(&source[span.start..span.end]), span));
}

/// Like `push_text`, but for code fragments inside a broken-open brace
/// region. These surface as expression tokens so the parser never mistakes
/// surrounding code for element text content.
fn push_raw<'src>(
    tokens: &mut Vec<(Token<'src>, Range<usize>)>,
    source: &'src str,
    span: Range<usize>,
) {
    if let Some((token, last_span)) = tokens.last_mut() {
        if matches!(token, Token::Expr(_)) && last_span.end == span.start {
            last_span.end = span.end;
            *token = Token::Expr(&source[last_span.start..last_span.end]);
            return;
        }
    }
    tokens.push((Token::Expr(&source[span.start..span.end]), span));
}

/// Find the byte index (within `rem`) of the `}` matching an already
/// consumed `{`, skipping braces inside string literals.
fn find_balanced_close(rem: &str) -> Option<usize> {
    let mut depth: usize = 1;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in rem.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }

        match quote {
            Some(q) => match c {
                '\\' => escaped = true,
                c if c == q => quote = None,
                _ => {}
            },
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
    }

    None
}

/// True if the region contains a `<` that starts a tag name outside any
/// string literal.
fn contains_markup(rem: &str) -> bool {
    let bytes = rem.as_bytes();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in rem.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }

        match quote {
            Some(q) => match c {
                '\\' => escaped = true,
                c if c == q => quote = None,
                _ => {}
            },
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '<' => {
                    if bytes
                        .get(i + 1)
                        .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_')
                    {
                        return true;
                    }
                }
                _ => {}
            },
        }
    }

    false
}
