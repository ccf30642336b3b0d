//! # Parser
//!
//! Turns the lexer's flat token stream into an AST of [`ast::SourceLine`]
//! values. The dialect has no line-oriented grammar (no newline token, no
//! comments), so a "statement" here is just a label definition (optional)
//! followed by a mnemonic or directive and its fixed-arity operand tokens —
//! there is nothing to split on but the tokens' own shapes.
//!
//! ## Macro-Based Parsing
//!
//! Declarative macros in `macros.rs` generate the parsing functions for
//! instruction families that share an operand shape:
//! - `parse_reg_reg_or_imm!` - ADD, AND (register or immediate mode)
//! - `parse_reg_pc!` - LD, LDI, LEA, ST, STI (PC-relative addressing)
//! - `parse_reg_reg_imm!` - LDR, STR (base+offset addressing)
//! - `parse_single_reg!` - JMP, JSRR (single register operand)
//! - `parse_single_pc!` - JSR (single label/offset operand)
//! - `parse_no_operands!` - RET, RTI

#[macro_use]
mod macros;
pub mod ast;


use crate::error::{AsmError, ErrorKind, Span};
use crate::lexer::token::{Token, TokenKind};
use ast::{Instruction, LineContent, PcOperand, SourceLine};

pub struct ParseResult {
    pub lines: Vec<SourceLine>,
    pub errors: Vec<AsmError>,
}

/// How many tokens (mnemonic/directive plus operands) a statement starting
/// with this token kind occupies. `BR`'s condition mask is folded into the
/// `OpBr` token by the lexer, so it never adds to the count here.
fn statement_arity(kind: &TokenKind) -> Option<usize> {
    use TokenKind::*;
    Some(match kind {
        OpAdd | OpAnd => 4,
        OpNot => 3,
        OpBr(_) => 2,
        OpJmp | OpJsr | OpJsrr => 2,
        OpRet | OpRti => 1,
        OpLd | OpLdi | OpLea | OpSt | OpSti => 3,
        OpLdr | OpStr => 4,
        OpTrap => 2,
        DirOrg | DirFill | DirStringz => 2,
        _ => return None,
    })
}

#[must_use]
pub fn parse_lines(tokens: &[Token]) -> ParseResult {
    let mut lines = Vec::new();
    let mut errors = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if matches!(tokens[i].kind, TokenKind::Eof) {
            break;
        }

        let label_span = tokens[i].span;
        let label = if let TokenKind::LabelDef(name) = &tokens[i].kind {
            let name = name.clone();
            i += 1;
            Some(name)
        } else {
            None
        };

        if i >= tokens.len() || matches!(tokens[i].kind, TokenKind::Eof) {
            errors.push(AsmError::new(
                ErrorKind::ExpectedOperand,
                "expected an instruction or directive after label",
                label_span,
            ));
            break;
        }

        let start_span = tokens[i].span;
        let Some(arity) = statement_arity(&tokens[i].kind) else {
            errors.push(AsmError::new(
                ErrorKind::UnexpectedToken,
                format!("unexpected token '{}'", tokens[i].lexeme),
                tokens[i].span,
            ));
            i += 1;
            continue;
        };

        let end = (i + arity).min(tokens.len());
        let slice: Vec<&Token> = tokens[i..end].iter().collect();

        match parse_content(&slice) {
            Ok(content) => {
                let end_span = tokens[end - 1].span;
                lines.push(SourceLine {
                    label,
                    content,
                    span: merge_span(start_span, end_span),
                });
                i += arity;
            }
            Err(err) => {
                errors.push(err);
                i += 1;
            }
        }
    }

    ParseResult { lines, errors }
}

fn merge_span(start: Span, end: Span) -> Span {
    Span {
        start: start.start,
        end: end.end,
        line: start.line,
        col: start.col,
    }
}

fn parse_content(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    let first = tokens[0];

    match &first.kind {
        TokenKind::OpAdd => parse_reg_reg_or_imm!(
            "add",
            |dr, sr1, sr2| Instruction::AddReg { dr, sr1, sr2 },
            |dr, sr1, imm5| Instruction::AddImm { dr, sr1, imm5 }
        )(tokens),
        TokenKind::OpAnd => parse_reg_reg_or_imm!(
            "and",
            |dr, sr1, sr2| Instruction::AndReg { dr, sr1, sr2 },
            |dr, sr1, imm5| Instruction::AndImm { dr, sr1, imm5 }
        )(tokens),
        TokenKind::OpNot => parse_not(tokens),
        TokenKind::OpBr(mask) => parse_br(tokens, *mask),

        TokenKind::OpLd => {
            parse_reg_pc!("ld", |dr, target| Instruction::Ld { dr, target })(tokens)
        }
        TokenKind::OpLdi => {
            parse_reg_pc!("ldi", |dr, target| Instruction::Ldi { dr, target })(tokens)
        }
        TokenKind::OpLea => {
            parse_reg_pc!("lea", |dr, target| Instruction::Lea { dr, target })(tokens)
        }
        TokenKind::OpSt => {
            parse_reg_pc!("st", |sr, target| Instruction::St { sr, target })(tokens)
        }
        TokenKind::OpSti => {
            parse_reg_pc!("sti", |sr, target| Instruction::Sti { sr, target })(tokens)
        }

        TokenKind::OpLdr => parse_reg_reg_imm!("ldr", |dr, base_r, offset6| Instruction::Ldr {
            dr,
            base_r,
            offset6
        })(tokens),
        TokenKind::OpStr => parse_reg_reg_imm!("str", |sr, base_r, offset6| Instruction::Str {
            sr,
            base_r,
            offset6
        })(tokens),

        TokenKind::OpJmp => parse_single_reg!("jmp", |base_r| Instruction::Jmp { base_r })(tokens),
        TokenKind::OpJsr => parse_single_pc!("jsr", |target| Instruction::Jsr { target })(tokens),
        TokenKind::OpJsrr => {
            parse_single_reg!("jsrr", |base_r| Instruction::Jsrr { base_r })(tokens)
        }

        TokenKind::OpRet => parse_no_operands!("ret", Instruction::Ret)(tokens),
        TokenKind::OpRti => parse_no_operands!("rti", Instruction::Rti)(tokens),

        TokenKind::OpTrap => parse_trap(tokens),

        TokenKind::DirOrg => parse_org(tokens),
        TokenKind::DirFill => parse_fill(tokens),
        TokenKind::DirStringz => parse_stringz(tokens),

        _ => Err(AsmError::new(
            ErrorKind::UnexpectedToken,
            format!("unexpected token '{}'", first.lexeme),
            first.span,
        )),
    }
}

fn parse_not(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    if tokens.len() < 3 {
        return Err(AsmError::new(
            ErrorKind::TooFewOperands,
            "not requires 2 operands: not Dr Sr",
            tokens[0].span,
        ));
    }
    let dr = expect_register(tokens, 1, "not's first operand must be a register")?;
    let sr = expect_register(tokens, 2, "not's second operand must be a register")?;
    ensure_no_extra(tokens, 3)?;
    Ok(LineContent::Instruction(Instruction::Not { dr, sr }))
}

fn parse_br(
    tokens: &[&Token],
    mask: crate::lexer::token::BrMask,
) -> Result<LineContent, AsmError> {
    if tokens.len() < 2 {
        return Err(AsmError::new(
            ErrorKind::TooFewOperands,
            "br requires an offset or label operand",
            tokens[0].span,
        ));
    }
    let target = expect_pc_operand(tokens, 1, "br requires an offset or label operand")?;
    ensure_no_extra(tokens, 2)?;
    Ok(LineContent::Instruction(Instruction::Br { mask, target }))
}

fn parse_trap(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    if tokens.len() < 2 {
        return Err(AsmError::new(
            ErrorKind::TooFewOperands,
            "trap requires a numeric trap vector (e.g. trap #x25)",
            tokens[0].span,
        ));
    }
    let value = token_to_i32(tokens[1]).ok_or_else(|| {
        AsmError::new(
            ErrorKind::InvalidOperandType,
            "trap requires a numeric trap vector (e.g. trap #x25)",
            tokens[1].span,
        )
    })?;
    if !(0..=0xFF).contains(&value) {
        return Err(AsmError::new(
            ErrorKind::ImmediateOutOfRange,
            format!("trap vector {value} is out of range (must be 0..255)"),
            tokens[1].span,
        ));
    }
    ensure_no_extra(tokens, 2)?;
    Ok(LineContent::Instruction(Instruction::Trap {
        trapvect8: value as u8,
    }))
}

fn parse_org(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    if tokens.len() < 2 {
        return Err(AsmError::new(
            ErrorKind::TooFewOperands,
            ".org requires a numeric address",
            tokens[0].span,
        ));
    }
    let value = token_to_i32(tokens[1]).ok_or_else(|| {
        AsmError::new(
            ErrorKind::InvalidOperandType,
            ".org requires a numeric address",
            tokens[1].span,
        )
    })?;
    if !(0..=0xFFFF).contains(&value) {
        return Err(AsmError::new(
            ErrorKind::ImmediateOutOfRange,
            format!(".org address {value} is out of 16-bit range (0..65535)"),
            tokens[1].span,
        ));
    }
    ensure_no_extra(tokens, 2)?;
    Ok(LineContent::Org(value as u16))
}

fn parse_fill(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    if tokens.len() < 2 {
        return Err(AsmError::new(
            ErrorKind::TooFewOperands,
            ".fill requires a numeric or label operand",
            tokens[0].span,
        ));
    }
    if let Some(value) = token_to_i32(tokens[1]) {
        if !(i16::MIN as i32..=0xFFFF_i32).contains(&value) {
            return Err(AsmError::new(
                ErrorKind::ImmediateOutOfRange,
                format!(".fill value {value} is out of 16-bit range (-32768..65535)"),
                tokens[1].span,
            ));
        }
        ensure_no_extra(tokens, 2)?;
        Ok(LineContent::FillImmediate(value))
    } else if let Some(label) = token_to_label(tokens[1]) {
        ensure_no_extra(tokens, 2)?;
        Ok(LineContent::FillLabel(label))
    } else {
        Err(AsmError::new(
            ErrorKind::ExpectedLabelOrLiteral,
            ".fill requires a numeric or label operand",
            tokens[1].span,
        ))
    }
}

fn parse_stringz(tokens: &[&Token]) -> Result<LineContent, AsmError> {
    if tokens.len() < 2 {
        return Err(AsmError::new(
            ErrorKind::TooFewOperands,
            ".stringz requires a string literal operand",
            tokens[0].span,
        ));
    }
    match &tokens[1].kind {
        TokenKind::StringLiteral(s) => {
            ensure_no_extra(tokens, 2)?;
            Ok(LineContent::Stringz(s.clone()))
        }
        _ => Err(AsmError::new(
            ErrorKind::InvalidOperandType,
            ".stringz requires a string literal operand",
            tokens[1].span,
        )),
    }
}

// Helper functions — pub(crate) so macros in macros.rs can call them via
// `$crate::parser::macros::*` without exposing them in the public library API.

pub(crate) fn ensure_no_extra(tokens: &[&Token], expected_len: usize) -> Result<(), AsmError> {
    if tokens.len() > expected_len {
        return Err(AsmError::new(
            ErrorKind::UnexpectedToken,
            "unexpected token after instruction",
            tokens[expected_len].span,
        ));
    }
    Ok(())
}

pub(crate) fn expect_register(tokens: &[&Token], idx: usize, message: &str) -> Result<u8, AsmError> {
    if tokens.len() <= idx {
        return Err(AsmError::new(ErrorKind::ExpectedRegister, message, tokens[0].span));
    }
    token_to_register(tokens[idx])
        .ok_or_else(|| AsmError::new(ErrorKind::ExpectedRegister, message, tokens[idx].span))
}

pub(crate) fn expect_pc_operand(
    tokens: &[&Token],
    idx: usize,
    message: &str,
) -> Result<PcOperand, AsmError> {
    if tokens.len() <= idx {
        return Err(AsmError::new(
            ErrorKind::ExpectedLabelOrLiteral,
            message,
            tokens[0].span,
        ));
    }
    match &tokens[idx].kind {
        TokenKind::NumDecimal(v) | TokenKind::NumHex(v) | TokenKind::NumBinary(v) => {
            Ok(PcOperand::Literal(*v))
        }
        TokenKind::LabelRef(name) => Ok(PcOperand::Label(name.clone())),
        _ => Err(AsmError::new(
            ErrorKind::ExpectedLabelOrLiteral,
            message,
            tokens[idx].span,
        )),
    }
}

pub(crate) fn token_to_i32(token: &Token) -> Option<i32> {
    match &token.kind {
        TokenKind::NumDecimal(v) => Some(*v),
        TokenKind::NumHex(v) => Some(*v),
        TokenKind::NumBinary(v) => Some(*v),
        _ => None,
    }
}

pub(crate) fn token_to_register(token: &Token) -> Option<u8> {
    match &token.kind {
        TokenKind::Register(r) => Some(*r),
        _ => None,
    }
}

pub(crate) fn token_to_label(token: &Token) -> Option<String> {
    match &token.kind {
        TokenKind::LabelRef(s) => Some(s.clone()),
        _ => None,
    }
}
