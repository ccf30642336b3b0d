#[cfg(test)]
mod lexer_tests {
    use crate::error::ErrorKind;
    use crate::lexer::token::{BrMask, TokenKind};
    use crate::lexer::tokenize;

    fn lex_ok(input: &str) -> Vec<TokenKind> {
        let result = tokenize(input);
        assert!(
            result.errors.is_empty(),
            "unexpected errors: {:?}",
            result.errors
        );
        result.tokens.into_iter().map(|t| t.kind).collect()
    }

    fn lex_errors(input: &str) -> Vec<ErrorKind> {
        tokenize(input).errors.into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn empty_input() {
        assert_eq!(lex_ok(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn whitespace_only() {
        assert_eq!(lex_ok("  \n\t \r\n"), vec![TokenKind::Eof]);
    }

    #[test]
    fn registers() {
        assert_eq!(
            lex_ok("%r0 %r7"),
            vec![
                TokenKind::Register(0),
                TokenKind::Register(7),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn register_out_of_range() {
        assert_eq!(lex_errors("%r8"), vec![ErrorKind::InvalidRegister]);
    }

    #[test]
    fn decimal_literals() {
        assert_eq!(
            lex_ok("#5 #-16"),
            vec![
                TokenKind::NumDecimal(5),
                TokenKind::NumDecimal(-16),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn hex_literal() {
        assert_eq!(
            lex_ok("#x25"),
            vec![TokenKind::NumHex(0x25), TokenKind::Eof]
        );
    }

    #[test]
    fn hex_literal_rejects_uppercase() {
        // 'F' is not a recognized lowercase hex digit, so lexing stops the
        // digit run after 'x' with no digits collected.
        assert_eq!(lex_errors("#xF"), vec![ErrorKind::InvalidHexLiteral]);
    }

    #[test]
    fn binary_literal_bit_zero_first() {
        // "1010" read bit-0-first means bit0=1, bit1=0, bit2=1, bit3=0 => 5.
        let tokens = lex_ok("#b1010");
        assert_eq!(tokens, vec![TokenKind::NumBinary(5), TokenKind::Eof]);
    }

    #[test]
    fn string_literal_with_escapes() {
        let tokens = lex_ok(r#""Hi\n""#);
        assert_eq!(
            tokens,
            vec![TokenKind::StringLiteral("Hi\n".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string() {
        assert_eq!(lex_errors("\"abc"), vec![ErrorKind::UnterminatedString]);
    }

    #[test]
    fn unterminated_string_at_newline() {
        assert_eq!(lex_errors("\"abc\n\""), vec![ErrorKind::UnterminatedString]);
    }

    #[test]
    fn directives() {
        assert_eq!(
            lex_ok(".org .fill .stringz"),
            vec![
                TokenKind::DirOrg,
                TokenKind::DirFill,
                TokenKind::DirStringz,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unknown_directive() {
        assert_eq!(lex_errors(".blkw"), vec![ErrorKind::UnknownDirective]);
    }

    #[test]
    fn label_def_and_ref() {
        assert_eq!(
            lex_ok("$loop: $loop"),
            vec![
                TokenKind::LabelDef("loop".into()),
                TokenKind::LabelRef("loop".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn all_mnemonics() {
        let kinds = lex_ok("add and not jmp jsr jsrr ret ld ldi ldr lea st sti str rti trap");
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpAdd,
                TokenKind::OpAnd,
                TokenKind::OpNot,
                TokenKind::OpJmp,
                TokenKind::OpJsr,
                TokenKind::OpJsrr,
                TokenKind::OpRet,
                TokenKind::OpLd,
                TokenKind::OpLdi,
                TokenKind::OpLdr,
                TokenKind::OpLea,
                TokenKind::OpSt,
                TokenKind::OpSti,
                TokenKind::OpStr,
                TokenKind::OpRti,
                TokenKind::OpTrap,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn br_mask_is_consumed_with_mnemonic() {
        assert_eq!(
            lex_ok("br nzp"),
            vec![
                TokenKind::OpBr(BrMask::new(true, true, true)),
                TokenKind::Eof
            ]
        );
        assert_eq!(
            lex_ok("br p"),
            vec![
                TokenKind::OpBr(BrMask::new(false, false, true)),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn br_mask_or_combines_all_letters() {
        let tokens = lex_ok("br np");
        match &tokens[0] {
            TokenKind::OpBr(mask) => {
                assert!(mask.n);
                assert!(!mask.z);
                assert!(mask.p);
            }
            other => panic!("expected OpBr, got {other:?}"),
        }
    }

    #[test]
    fn br_mask_rejects_foreign_letters() {
        assert_eq!(lex_errors("br abc"), vec![ErrorKind::InvalidBrMask]);
    }

    #[test]
    fn unrecognized_mnemonic_is_illegal() {
        assert_eq!(lex_errors("foo"), vec![ErrorKind::UnexpectedCharacter]);
    }

    #[test]
    fn stray_character_is_illegal() {
        assert_eq!(lex_errors(","), vec![ErrorKind::UnexpectedCharacter]);
    }
}
