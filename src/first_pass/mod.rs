//! # First Pass
//!
//! Builds the symbol table by walking the parsed AST once, tracking a word
//! counter (`wc`) that advances exactly the way [`ast::LineContent::word_count`]
//! says it does. Because the encoder (pass 2) walks the very same AST and
//! advances `wc` through that identical function, the two passes cannot
//! disagree about where any label or instruction lands.

pub mod symbol_table;


use crate::error::{AsmError, ErrorKind};
use crate::parser::ast::{LineContent, SourceLine};
use symbol_table::SymbolTable;

pub struct FirstPassResult {
    pub symbol_table: SymbolTable,
    pub source_lines: Vec<SourceLine>,
    pub errors: Vec<AsmError>,
}

/// Perform the first pass of the assembler.
///
/// Takes ownership of the parsed lines so the resulting `FirstPassResult`
/// can store them directly without cloning — the encoder needs the same AST
/// to drive pass 2.
#[must_use]
pub fn first_pass(lines: Vec<SourceLine>) -> FirstPassResult {
    let mut symbol_table = SymbolTable::new();
    let mut errors = Vec::new();
    let mut wc: u32 = 0;

    for line in &lines {
        if let Some(ref label) = line.label {
            record_label(&mut symbol_table, label, wc, line.span, &mut errors);
        }

        if let LineContent::Org(addr) = &line.content {
            wc = *addr as u32;
            continue;
        }

        let words = line.content.word_count();
        let new_wc = wc + words;
        if new_wc > 0x1_0000 {
            errors.push(AsmError::new(
                ErrorKind::AddressOverflow,
                format!(
                    "address overflow: location counter would exceed 0xFFFF (at x{wc:04X} + {words} words)"
                ),
                line.span,
            ));
        }
        wc = new_wc;
    }

    FirstPassResult {
        symbol_table,
        source_lines: lines,
        errors,
    }
}

fn record_label(
    table: &mut SymbolTable,
    label: &str,
    address: u32,
    span: crate::error::Span,
    errors: &mut Vec<AsmError>,
) {
    if let Some(first_addr) = table.get(label) {
        errors.push(AsmError::duplicate_label(label, first_addr, span));
    } else {
        table.insert(label.to_string(), address as u16);
    }
}
