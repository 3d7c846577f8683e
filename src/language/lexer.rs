use crate::language::{
    span::Span,
    token::{Token, TokenKind},
};
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{opt, recognize, value},
    sequence::{pair, preceded, tuple},
};

#[derive(Clone, Debug)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

/// Tokenizes a source text into spanned tokens, accumulating errors so a single
/// bad character does not hide later ones.
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<LexError>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut rest = source;
    let mut offset = 0usize;

    loop {
        let trimmed = skip_trivia(rest);
        offset += rest.len() - trimmed.len();
        rest = trimmed;
        if rest.is_empty() {
            break;
        }

        match token(rest) {
            Ok((next, kind)) => {
                let len = rest.len() - next.len();
                tokens.push(Token {
                    kind,
                    span: Span::new(offset, offset + len),
                });
                offset += len;
                rest = next;
            }
            Err(_) => {
                let first = rest.chars().next().unwrap_or('\u{fffd}');
                let len = first.len_utf8();
                errors.push(LexError {
                    message: lex_error_message(first),
                    span: Span::new(offset, offset + len),
                });
                offset += len;
                rest = &rest[len..];
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(offset, offset),
    });

    if errors.is_empty() { Ok(tokens) } else { Err(errors) }
}

fn lex_error_message(first: char) -> String {
    if first == '"' {
        "unterminated or invalid string literal".to_string()
    } else if first.is_ascii_digit() {
        "invalid numeric literal".to_string()
    } else {
        format!("unexpected character `{first}`")
    }
}

fn skip_trivia(mut input: &str) -> &str {
    loop {
        let trimmed = input.trim_start();
        if let Some(rest) = trimmed.strip_prefix("//") {
            input = match rest.find('\n') {
                Some(pos) => &rest[pos + 1..],
                None => "",
            };
            continue;
        }
        if trimmed.len() != input.len() {
            input = trimmed;
            continue;
        }
        return input;
    }
}

fn token(input: &str) -> IResult<&str, TokenKind> {
    alt((
        identifier_or_keyword,
        number_literal,
        string_literal,
        two_char_symbol,
        one_char_symbol,
    ))(input)
}

fn identifier_or_keyword(input: &str) -> IResult<&str, TokenKind> {
    let (rest, text) = recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)?;
    let kind = match text {
        "import" => TokenKind::Import,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "int" => TokenKind::KwInt,
        "float" => TokenKind::KwFloat,
        "bool" => TokenKind::KwBool,
        "string" => TokenKind::KwString,
        "void" => TokenKind::KwVoid,
        name => TokenKind::Identifier(name.to_string()),
    };
    Ok((rest, kind))
}

fn number_literal(input: &str) -> IResult<&str, TokenKind> {
    let (rest, text) = recognize(tuple((
        digit1,
        opt(preceded(char('.'), digit1)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;

    let is_float = text.contains(['.', 'e', 'E']);
    let kind = if is_float {
        match text.parse::<f64>() {
            Ok(value) => TokenKind::Float(value),
            Err(_) => return Err(fail(input)),
        }
    } else {
        match text.parse::<i64>() {
            Ok(value) => TokenKind::Integer(value),
            Err(_) => return Err(fail(input)),
        }
    };
    Ok((rest, kind))
}

fn string_literal(input: &str) -> IResult<&str, TokenKind> {
    let (mut rest, _) = char('"')(input)?;
    let mut text = String::new();
    loop {
        let mut chars = rest.chars();
        match chars.next() {
            None | Some('\n') => return Err(fail(input)),
            Some('"') => return Ok((chars.as_str(), TokenKind::Str(text))),
            Some('\\') => match chars.next() {
                Some('n') => text.push('\n'),
                Some('t') => text.push('\t'),
                Some('r') => text.push('\r'),
                Some('\\') => text.push('\\'),
                Some('"') => text.push('"'),
                _ => return Err(fail(input)),
            },
            Some(other) => text.push(other),
        }
        rest = chars.as_str();
    }
}

fn two_char_symbol(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::EqEq, tag("==")),
        value(TokenKind::BangEq, tag("!=")),
        value(TokenKind::LtEq, tag("<=")),
        value(TokenKind::GtEq, tag(">=")),
        value(TokenKind::AmpAmp, tag("&&")),
        value(TokenKind::PipePipe, tag("||")),
    ))(input)
}

fn one_char_symbol(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::Plus, tag("+")),
        value(TokenKind::Minus, tag("-")),
        value(TokenKind::Star, tag("*")),
        value(TokenKind::Slash, tag("/")),
        value(TokenKind::Percent, tag("%")),
        value(TokenKind::Bang, tag("!")),
        value(TokenKind::Eq, tag("=")),
        value(TokenKind::Lt, tag("<")),
        value(TokenKind::Gt, tag(">")),
        value(TokenKind::Dot, tag(".")),
        value(TokenKind::Comma, tag(",")),
        value(TokenKind::Semi, tag(";")),
        value(TokenKind::LParen, tag("(")),
        value(TokenKind::RParen, tag(")")),
        value(TokenKind::LBrace, tag("{")),
        value(TokenKind::RBrace, tag("}")),
    ))(input)
}

fn fail(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Fail))
}
