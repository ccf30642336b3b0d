//! # Lexer
//!
//! Tokenizes assembly source code into a stream of tokens.
//!
//! ## Features
//!
//! - **Registers**: `%r0`..`%r7`
//! - **Numeric literals**: decimal (`#10`, `#-5`), hexadecimal (`#x3000`,
//!   lowercase digits only), and binary (`#b1010`, bit 0 first) notation
//! - **String literals**: `"..."` with `\n`, `\t`, `\\`, `\"` escapes
//! - **Labels**: `$name:` defines, `$name` references
//! - **Directives**: `.org`, `.fill`, `.stringz`
//! - **Instructions**: every opcode in the mnemonic table, with `br`'s
//!   condition mask consumed as part of the `br` token
//!
//! The dialect has no comment syntax; every non-whitespace token must lex
//! to a recognized form or the source is rejected.

pub mod cursor;
pub mod token;

#[cfg(test)]
mod tests;

use crate::error::{AsmError, ErrorKind, Span};
use cursor::Cursor;
use token::{BrMask, Token, TokenKind};

pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<AsmError>,
}

#[inline]
fn process_escape_char(esc: char) -> Option<char> {
    match esc {
        'n' => Some('\n'),
        't' => Some('\t'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        _ => None,
    }
}

#[must_use]
pub fn tokenize(source: &str) -> LexResult {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    while !cursor.is_at_end() {
        match lex_token(&mut cursor) {
            Ok(Some(token)) => tokens.push(token),
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }

    let (b, l, c) = cursor.current_pos();
    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        span: Span {
            start: b,
            end: b,
            line: l,
            col: c,
        },
    });

    LexResult { tokens, errors }
}

fn skip_whitespace(cursor: &mut Cursor) {
    while matches!(cursor.peek(), Some(' ' | '\t' | '\n' | '\r')) {
        cursor.advance();
    }
}

fn lex_token(cursor: &mut Cursor) -> Result<Option<Token>, AsmError> {
    skip_whitespace(cursor);

    if cursor.is_at_end() {
        return Ok(None);
    }

    let (sb, sl, sc) = cursor.current_pos();
    let ch = cursor.peek().unwrap();

    match ch {
        '%' => lex_register(cursor, sb, sl, sc),
        '#' => lex_number(cursor, sb, sl, sc),
        '"' => lex_string(cursor, sb, sl, sc),
        '.' => lex_directive(cursor, sb, sl, sc),
        '$' => lex_label(cursor, sb, sl, sc),
        c if c.is_ascii_lowercase() => lex_word(cursor, sb, sl, sc),
        _ => {
            cursor.advance();
            Err(AsmError::new(
                ErrorKind::UnexpectedCharacter,
                format!("unexpected character: '{ch}'"),
                cursor.make_span(sb, sl, sc),
            ))
        }
    }
}

fn lex_register(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, AsmError> {
    cursor.advance(); // '%'
    if cursor.peek() != Some('r') {
        return Err(AsmError::new(
            ErrorKind::InvalidRegister,
            "expected 'r' after '%'",
            cursor.make_span(sb, sl, sc),
        ));
    }
    cursor.advance(); // 'r'

    let digit = match cursor.peek() {
        Some(c) if c.is_ascii_digit() => cursor.advance().unwrap(),
        _ => {
            return Err(AsmError::new(
                ErrorKind::InvalidRegister,
                "expected a digit 0-7 after '%r'",
                cursor.make_span(sb, sl, sc),
            ))
        }
    };

    // Reject a second digit (e.g. "%r10") rather than silently truncating.
    if matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
        while matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
            cursor.advance();
        }
        return Err(AsmError::new(
            ErrorKind::InvalidRegister,
            "register number must be a single digit 0-7",
            cursor.make_span(sb, sl, sc),
        ));
    }

    let reg = digit.to_digit(10).unwrap() as u8;
    if reg > 7 {
        return Err(AsmError::new(
            ErrorKind::InvalidRegister,
            format!("invalid register %r{reg} (must be %r0-%r7)"),
            cursor.make_span(sb, sl, sc),
        ));
    }

    Ok(Some(Token {
        kind: TokenKind::Register(reg),
        lexeme: format!("%r{reg}"),
        span: cursor.make_span(sb, sl, sc),
    }))
}

fn lex_number(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, AsmError> {
    cursor.advance(); // '#'

    match cursor.peek() {
        Some('x') => lex_hex(cursor, sb, sl, sc),
        Some('b') => lex_binary(cursor, sb, sl, sc),
        _ => lex_decimal(cursor, sb, sl, sc),
    }
}

fn lex_decimal(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, AsmError> {
    let mut raw = String::new();
    if cursor.peek() == Some('-') {
        raw.push(cursor.advance().unwrap());
    }

    let mut digits = String::new();
    while matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
        digits.push(cursor.advance().unwrap());
    }

    if digits.is_empty() {
        return Err(AsmError::new(
            ErrorKind::InvalidDecimalLiteral,
            "expected digits after '#'",
            cursor.make_span(sb, sl, sc),
        ));
    }
    raw.push_str(&digits);

    let value = raw.parse::<i32>().map_err(|_| {
        AsmError::new(
            ErrorKind::InvalidDecimalLiteral,
            format!("invalid decimal literal: #{raw}"),
            cursor.make_span(sb, sl, sc),
        )
    })?;

    Ok(Some(Token {
        kind: TokenKind::NumDecimal(value),
        lexeme: format!("#{raw}"),
        span: cursor.make_span(sb, sl, sc),
    }))
}

fn lex_hex(cursor: &mut Cursor, sb: usize, sl: usize, sc: usize) -> Result<Option<Token>, AsmError> {
    cursor.advance(); // 'x'
    let mut digits = String::new();
    while matches!(cursor.peek(), Some(c) if c.is_ascii_digit() || ('a'..='f').contains(&c)) {
        digits.push(cursor.advance().unwrap());
    }

    if digits.is_empty() {
        return Err(AsmError::new(
            ErrorKind::InvalidHexLiteral,
            "expected lowercase hex digits after '#x'",
            cursor.make_span(sb, sl, sc),
        ));
    }

    let value = u32::from_str_radix(&digits, 16).map_err(|_| {
        AsmError::new(
            ErrorKind::InvalidHexLiteral,
            format!("invalid hex literal: #x{digits}"),
            cursor.make_span(sb, sl, sc),
        )
    })?;

    if value > 0xFFFF {
        return Err(AsmError::new(
            ErrorKind::InvalidHexLiteral,
            format!("hex literal #x{digits} exceeds 16 bits"),
            cursor.make_span(sb, sl, sc),
        ));
    }

    Ok(Some(Token {
        kind: TokenKind::NumHex(value as i32),
        lexeme: format!("#x{digits}"),
        span: cursor.make_span(sb, sl, sc),
    }))
}

fn lex_binary(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, AsmError> {
    cursor.advance(); // 'b'
    let mut bits = String::new();
    while matches!(cursor.peek(), Some('0' | '1')) {
        bits.push(cursor.advance().unwrap());
    }

    if bits.is_empty() {
        return Err(AsmError::new(
            ErrorKind::InvalidBinaryLiteral,
            "expected binary digits after '#b'",
            cursor.make_span(sb, sl, sc),
        ));
    }

    if bits.len() > 16 {
        return Err(AsmError::new(
            ErrorKind::InvalidBinaryLiteral,
            format!("binary literal #b{bits} exceeds 16 bits"),
            cursor.make_span(sb, sl, sc),
        ));
    }

    // Bit 0 first: the leftmost character is the least significant bit.
    let mut value: u32 = 0;
    for (i, ch) in bits.chars().enumerate() {
        if ch == '1' {
            value |= 1 << i;
        }
    }

    Ok(Some(Token {
        kind: TokenKind::NumBinary(value as i32),
        lexeme: format!("#b{bits}"),
        span: cursor.make_span(sb, sl, sc),
    }))
}

fn lex_string(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, AsmError> {
    cursor.advance(); // opening quote
    let mut processed = String::new();
    let mut raw = String::from("\"");

    loop {
        match cursor.peek() {
            None | Some('\n') | Some('\r') => {
                return Err(AsmError::new(
                    ErrorKind::UnterminatedString,
                    "unterminated string literal",
                    cursor.make_span(sb, sl, sc),
                ));
            }
            Some('"') => {
                cursor.advance();
                raw.push('"');
                break;
            }
            Some('\\') => {
                cursor.advance();
                raw.push('\\');
                let esc = cursor.peek().ok_or_else(|| {
                    AsmError::new(
                        ErrorKind::UnterminatedString,
                        "unterminated string literal",
                        cursor.make_span(sb, sl, sc),
                    )
                })?;
                match process_escape_char(esc) {
                    Some(decoded) => {
                        processed.push(decoded);
                        cursor.advance();
                        raw.push(esc);
                    }
                    None => {
                        return Err(AsmError::new(
                            ErrorKind::InvalidEscapeSequence,
                            format!("invalid escape sequence: \\{esc}"),
                            cursor.make_span(sb, sl, sc),
                        ));
                    }
                }
            }
            Some(c) => {
                cursor.advance();
                processed.push(c);
                raw.push(c);
            }
        }
    }

    Ok(Some(Token {
        kind: TokenKind::StringLiteral(processed),
        lexeme: raw,
        span: cursor.make_span(sb, sl, sc),
    }))
}

fn lex_directive(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, AsmError> {
    cursor.advance(); // '.'
    let mut word = String::new();
    while matches!(cursor.peek(), Some(c) if c.is_ascii_lowercase()) {
        word.push(cursor.advance().unwrap());
    }

    let kind = match word.as_str() {
        "org" => TokenKind::DirOrg,
        "fill" => TokenKind::DirFill,
        "stringz" => TokenKind::DirStringz,
        _ => {
            return Err(AsmError::new(
                ErrorKind::UnknownDirective,
                format!("unknown directive .{word}"),
                cursor.make_span(sb, sl, sc),
            ))
        }
    };

    Ok(Some(Token {
        kind,
        lexeme: format!(".{word}"),
        span: cursor.make_span(sb, sl, sc),
    }))
}

fn lex_ident(cursor: &mut Cursor) -> String {
    let mut ident = String::new();
    if matches!(cursor.peek(), Some(c) if c.is_ascii_alphabetic() || c == '_') {
        ident.push(cursor.advance().unwrap());
        while matches!(cursor.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            ident.push(cursor.advance().unwrap());
        }
    }
    ident
}

fn lex_label(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, AsmError> {
    cursor.advance(); // '$'
    let ident = lex_ident(cursor);
    if ident.is_empty() {
        return Err(AsmError::new(
            ErrorKind::UnexpectedCharacter,
            "expected a label name after '$'",
            cursor.make_span(sb, sl, sc),
        ));
    }

    let kind = if cursor.peek() == Some(':') {
        cursor.advance();
        TokenKind::LabelDef(ident.clone())
    } else {
        TokenKind::LabelRef(ident.clone())
    };

    Ok(Some(Token {
        kind,
        lexeme: format!("${ident}"),
        span: cursor.make_span(sb, sl, sc),
    }))
}

fn lex_word(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, AsmError> {
    let mut word = String::new();
    while matches!(cursor.peek(), Some(c) if c.is_ascii_lowercase()) {
        word.push(cursor.advance().unwrap());
    }

    if word == "br" {
        return lex_br_mask(cursor, sb, sl, sc);
    }

    let kind = match word.as_str() {
        "add" => TokenKind::OpAdd,
        "and" => TokenKind::OpAnd,
        "not" => TokenKind::OpNot,
        "jmp" => TokenKind::OpJmp,
        "jsr" => TokenKind::OpJsr,
        "jsrr" => TokenKind::OpJsrr,
        "ret" => TokenKind::OpRet,
        "ld" => TokenKind::OpLd,
        "ldi" => TokenKind::OpLdi,
        "ldr" => TokenKind::OpLdr,
        "lea" => TokenKind::OpLea,
        "st" => TokenKind::OpSt,
        "sti" => TokenKind::OpSti,
        "str" => TokenKind::OpStr,
        "rti" => TokenKind::OpRti,
        "trap" => TokenKind::OpTrap,
        _ => {
            return Err(AsmError::new(
                ErrorKind::UnexpectedCharacter,
                format!("unrecognized mnemonic '{word}'"),
                cursor.make_span(sb, sl, sc),
            ))
        }
    };

    Ok(Some(Token {
        kind,
        lexeme: word,
        span: cursor.make_span(sb, sl, sc),
    }))
}

/// `br` always carries its condition mask as the following whitespace-
/// delimited word (bare letters `n`/`z`/`p`, OR-combined); it is consumed
/// here as part of lexing the `br` token rather than as an independent one.
fn lex_br_mask(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, AsmError> {
    skip_whitespace(cursor);

    let mut word = String::new();
    while matches!(cursor.peek(), Some(c) if c.is_ascii_lowercase()) {
        word.push(cursor.advance().unwrap());
    }

    let mask = BrMask::parse(&word).ok_or_else(|| {
        AsmError::new(
            ErrorKind::InvalidBrMask,
            format!("'br' must be followed by a mask of n/z/p letters, found '{word}'"),
            cursor.make_span(sb, sl, sc),
        )
    })?;

    Ok(Some(Token {
        kind: TokenKind::OpBr(mask),
        lexeme: format!("br{word}"),
        span: cursor.make_span(sb, sl, sc),
    }))
}
