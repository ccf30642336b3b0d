//! # Parser Macros
//!
//! Declarative macros for generating instruction parsing functions.
//!
//! These macros eliminate repetitive parsing code by generating parsers for
//! similar instruction patterns. Each macro validates operand count and
//! constructs the appropriate AST node; operands are whitespace-separated,
//! so unlike a comma-delimited dialect there is no comma to check for.

/// Generates parsers for reg-reg-or-imm instructions (ADD, AND):
/// `add Dr Sr1 Sr2` or `add Dr Sr1 #imm5`.
macro_rules! parse_reg_reg_or_imm {
    ($name:expr, $reg_variant:expr, $imm_variant:expr) => {
        |tokens: &[&$crate::lexer::token::Token]| -> Result<$crate::parser::ast::LineContent, $crate::error::AsmError> {
            use $crate::error::{AsmError, ErrorKind};
            use $crate::parser::ast::LineContent;

            if tokens.len() < 4 {
                return Err(AsmError::new(
                    ErrorKind::TooFewOperands,
                    format!("{} requires 3 operands: {} Dr Sr1 Sr2/#imm5", $name, $name),
                    tokens[0].span,
                ));
            }
            let dr = $crate::parser::macros::expect_register(tokens, 1, &format!("{} first operand must be a register", $name))?;
            let sr1 = $crate::parser::macros::expect_register(tokens, 2, &format!("{} second operand must be a register", $name))?;

            if let Some(sr2) = $crate::parser::macros::token_to_register(tokens[3]) {
                $crate::parser::macros::ensure_no_extra(tokens, 4)?;
                Ok(LineContent::Instruction($reg_variant(dr, sr1, sr2)))
            } else if let Some(imm) = $crate::parser::macros::token_to_i32(tokens[3]) {
                $crate::parser::macros::ensure_no_extra(tokens, 4)?;
                Ok(LineContent::Instruction($imm_variant(dr, sr1, imm)))
            } else {
                Err(AsmError::new(
                    ErrorKind::InvalidOperandType,
                    format!("{} third operand must be a register or immediate (#n)", $name),
                    tokens[3].span,
                ))
            }
        }
    };
}

/// Generates parsers for reg-PC_operand instructions (LD, LDI, LEA, ST, STI):
/// `op Dr <int-lit|label>`.
macro_rules! parse_reg_pc {
    ($name:expr, $variant:expr) => {
        |tokens: &[&$crate::lexer::token::Token]| -> Result<$crate::parser::ast::LineContent, $crate::error::AsmError> {
            use $crate::error::{AsmError, ErrorKind};
            use $crate::parser::ast::LineContent;

            if tokens.len() < 3 {
                return Err(AsmError::new(
                    ErrorKind::TooFewOperands,
                    format!("{} requires 2 operands: {} Dr <offset|label>", $name, $name),
                    tokens[0].span,
                ));
            }
            let reg = $crate::parser::macros::expect_register(tokens, 1, &format!("{} first operand must be a register", $name))?;
            let target = $crate::parser::macros::expect_pc_operand(tokens, 2, &format!("{} requires an offset or label operand", $name))?;
            $crate::parser::macros::ensure_no_extra(tokens, 3)?;
            Ok(LineContent::Instruction($variant(reg, target)))
        }
    };
}

/// Generates parsers for reg-reg-imm instructions (LDR, STR):
/// `op Dr BaseR #offset6`.
macro_rules! parse_reg_reg_imm {
    ($name:expr, $variant:expr) => {
        |tokens: &[&$crate::lexer::token::Token]| -> Result<$crate::parser::ast::LineContent, $crate::error::AsmError> {
            use $crate::error::{AsmError, ErrorKind};
            use $crate::parser::ast::LineContent;

            if tokens.len() < 4 {
                return Err(AsmError::new(
                    ErrorKind::TooFewOperands,
                    format!("{} requires 3 operands: {} Dr BaseR #offset6", $name, $name),
                    tokens[0].span,
                ));
            }
            let r1 = $crate::parser::macros::expect_register(tokens, 1, &format!("{} first operand must be a register", $name))?;
            let r2 = $crate::parser::macros::expect_register(tokens, 2, &format!("{} second operand must be a register", $name))?;
            let value = $crate::parser::macros::token_to_i32(tokens[3]).ok_or_else(|| AsmError::new(
                ErrorKind::InvalidOperandType,
                format!("{} third operand must be an immediate (#n)", $name),
                tokens[3].span,
            ))?;
            $crate::parser::macros::ensure_no_extra(tokens, 4)?;
            Ok(LineContent::Instruction($variant(r1, r2, value)))
        }
    };
}

/// Generates parsers for single-register instructions (JMP, JSRR).
macro_rules! parse_single_reg {
    ($name:expr, $variant:expr) => {
        |tokens: &[&$crate::lexer::token::Token]| -> Result<$crate::parser::ast::LineContent, $crate::error::AsmError> {
            use $crate::error::{AsmError, ErrorKind};
            use $crate::parser::ast::LineContent;

            if tokens.len() < 2 {
                return Err(AsmError::new(
                    ErrorKind::TooFewOperands,
                    format!("{} requires 1 operand: {} BaseR", $name, $name),
                    tokens[0].span,
                ));
            }
            let base_r = $crate::parser::macros::expect_register(tokens, 1, &format!("{} operand must be a register", $name))?;
            $crate::parser::macros::ensure_no_extra(tokens, 2)?;
            Ok(LineContent::Instruction($variant(base_r)))
        }
    };
}

/// Generates parsers for single-PC_operand instructions (JSR).
macro_rules! parse_single_pc {
    ($name:expr, $variant:expr) => {
        |tokens: &[&$crate::lexer::token::Token]| -> Result<$crate::parser::ast::LineContent, $crate::error::AsmError> {
            use $crate::error::{AsmError, ErrorKind};
            use $crate::parser::ast::LineContent;

            if tokens.len() < 2 {
                return Err(AsmError::new(
                    ErrorKind::TooFewOperands,
                    format!("{} requires 1 operand: {} <offset|label>", $name, $name),
                    tokens[0].span,
                ));
            }
            let target = $crate::parser::macros::expect_pc_operand(tokens, 1, &format!("{} requires an offset or label operand", $name))?;
            $crate::parser::macros::ensure_no_extra(tokens, 2)?;
            Ok(LineContent::Instruction($variant(target)))
        }
    };
}

/// Generates parsers for no-operand instructions (RTI, RET).
macro_rules! parse_no_operands {
    ($name:expr, $variant:expr) => {
        |tokens: &[&$crate::lexer::token::Token]| -> Result<$crate::parser::ast::LineContent, $crate::error::AsmError> {
            use $crate::error::{AsmError, ErrorKind};
            use $crate::parser::ast::LineContent;

            if tokens.len() > 1 {
                return Err(AsmError::new(
                    ErrorKind::TooManyOperands,
                    format!("{} takes no operands", $name),
                    tokens[1].span,
                ));
            }
            Ok(LineContent::Instruction($variant))
        }
    };
}

// Helper functions used by macros (must be public for macro access).
pub use super::{
    ensure_no_extra, expect_pc_operand, expect_register, token_to_i32, token_to_register,
};
