//! Recursive-descent compilation engine.
//!
//! One mutually-recursive production per Jack grammar rule, each consuming
//! tokens, optionally updating the symbol table, and appending VM lines
//! directly — no intermediate AST (spec §9's "emit-as-you-parse" note,
//! matching `original_source/projects/compilation_engine.py`'s structure).
//! Every production advances past the last token it consumes unless
//! documented otherwise; lookahead for `else` and for `.`/`[`/`(` after an
//! identifier is done with `peek`, never by consuming and regretting it.

use std::path::{Path, PathBuf};

use crate::error::{JackError, SourceLocation};
use crate::lookahead::LookaheadStream;
use crate::symbol_table::{Kind, SymbolTable};
use crate::token::{Token, TokenKind, tokenize};
use crate::vm::{InstructionBuffer, Segment};

const INFIX_OPS: &[&str] = &["+", "-", "*", "/", "&", "|", "<", ">", "="];

/// Compile one `.jack` source file's text into Hack VM text.
pub fn compile_class(source: &str, file: &Path) -> Result<String, JackError> {
    let tokens = tokenize(source, file)?;
    let mut engine = CompilationEngine::new(tokens, file.to_path_buf());
    engine.compile_class()?;
    Ok(engine.buffer.into_text())
}

struct CompilationEngine {
    class_name: String,
    file: PathBuf,
    symbol_table: SymbolTable,
    tokens: LookaheadStream,
    buffer: InstructionBuffer,
    /// Location of the last token consumed, used to anchor "unexpected
    /// end of input" diagnostics at something more useful than 0:0.
    last_loc: SourceLocation,
}

impl CompilationEngine {
    fn new(tokens: Vec<Token>, file: PathBuf) -> Self {
        let last_loc = SourceLocation::new(file.clone(), 0, 0);
        CompilationEngine {
            class_name: String::new(),
            file,
            symbol_table: SymbolTable::new(),
            tokens: LookaheadStream::new(tokens),
            buffer: InstructionBuffer::new(),
            last_loc,
        }
    }

    fn loc_of(&self, tok: &Token) -> SourceLocation {
        SourceLocation::new(self.file.clone(), tok.line, tok.column)
    }

    /// Consume and return the next token, or an `UnexpectedToken` error at
    /// the last-seen location if the stream is exhausted.
    fn advance(&mut self) -> Result<Token, JackError> {
        match self.tokens.next() {
            Some(tok) => {
                self.last_loc = self.loc_of(&tok);
                Ok(tok)
            }
            None => Err(JackError::UnexpectedToken {
                loc: self.last_loc.clone(),
                expected: "more input".to_string(),
                actual: "<end of file>".to_string(),
            }),
        }
    }

    /// Consume a token and fail unless its lexeme is exactly `lexeme`.
    fn expect(&mut self, lexeme: &str) -> Result<Token, JackError> {
        let tok = self.advance()?;
        if tok.lexeme != lexeme {
            return Err(JackError::UnexpectedToken {
                loc: self.loc_of(&tok),
                expected: format!("'{lexeme}'"),
                actual: tok.lexeme,
            });
        }
        Ok(tok)
    }

    /// Look at the next token's lexeme without consuming it. `None` at end
    /// of stream is not an error here — callers use this for optional
    /// lookahead (an `else` clause, a loop's closing brace, etc.).
    fn peek_lexeme(&mut self) -> Option<String> {
        self.tokens.peek().map(|t| t.lexeme)
    }

    // ---- class and declarations ------------------------------------

    fn compile_class(&mut self) -> Result<(), JackError> {
        self.expect("class")?;
        let name_tok = self.advance()?;
        self.class_name = name_tok.lexeme;
        self.expect("{")?;

        loop {
            match self.peek_lexeme().as_deref() {
                Some("static") | Some("field") => self.compile_class_var_dec()?,
                Some("constructor") | Some("function") | Some("method") => {
                    self.compile_subroutine()?
                }
                _ => break,
            }
        }

        self.expect("}")?;
        Ok(())
    }

    fn compile_class_var_dec(&mut self) -> Result<(), JackError> {
        let kind_tok = self.advance()?;
        let kind = if kind_tok.lexeme == "static" {
            Kind::Static
        } else {
            Kind::Field
        };
        self.compile_var_declarations(kind)
    }

    fn compile_var_dec(&mut self) -> Result<(), JackError> {
        self.expect("var")?;
        self.compile_var_declarations(Kind::Local)
    }

    /// Shared tail of `classVarDec` and `varDec`: `type varName (',' varName)* ';'`.
    /// No code is emitted; this only populates the symbol table.
    fn compile_var_declarations(&mut self, kind: Kind) -> Result<(), JackError> {
        let type_tok = self.advance()?;
        let declared_type = type_tok.lexeme;

        loop {
            let name_tok = self.advance()?;
            let loc = self.loc_of(&name_tok);
            self.symbol_table
                .define(&name_tok.lexeme, &declared_type, kind, loc)?;
            if self.peek_lexeme().as_deref() == Some(",") {
                self.advance()?;
                continue;
            }
            break;
        }

        self.expect(";")?;
        Ok(())
    }

    fn compile_subroutine(&mut self) -> Result<(), JackError> {
        let kind_tok = self.advance()?;
        let is_constructor = kind_tok.lexeme == "constructor";
        let is_method = kind_tok.lexeme == "method";

        // void | type return type; not semantically checked (spec: no type
        // checking beyond the grammar).
        self.advance()?;

        let name_tok = self.advance()?;
        let sub_name = name_tok.lexeme;

        self.expect("(")?;
        self.symbol_table.start_subroutine(is_method, &self.class_name);
        self.compile_parameter_list()?;
        self.expect(")")?;

        let function_name = format!("{}.{}", self.class_name, sub_name);
        let header_index = self.buffer.function_placeholder(&function_name);

        if is_constructor {
            let n_fields = self.symbol_table.count(Kind::Field);
            self.buffer.push(Segment::Constant, n_fields);
            self.buffer.call("Memory.alloc", 1);
            self.buffer.pop(Segment::Pointer, 0);
        } else if is_method {
            self.buffer.push(Segment::Argument, 0);
            self.buffer.pop(Segment::Pointer, 0);
        }

        self.expect("{")?;
        while self.peek_lexeme().as_deref() == Some("var") {
            self.compile_var_dec()?;
        }
        self.compile_statements()?;
        self.expect("}")?;

        let n_locals = self.symbol_table.count(Kind::Local);
        self.buffer.patch_function_header(header_index, n_locals)?;
        Ok(())
    }

    fn compile_parameter_list(&mut self) -> Result<(), JackError> {
        if self.peek_lexeme().as_deref() == Some(")") {
            return Ok(());
        }
        loop {
            let type_tok = self.advance()?;
            let declared_type = type_tok.lexeme;
            let name_tok = self.advance()?;
            let loc = self.loc_of(&name_tok);
            self.symbol_table
                .define(&name_tok.lexeme, &declared_type, Kind::Argument, loc)?;
            if self.peek_lexeme().as_deref() == Some(",") {
                self.advance()?;
                continue;
            }
            break;
        }
        Ok(())
    }

    // ---- statements ---------------------------------------------------

    fn compile_statements(&mut self) -> Result<(), JackError> {
        loop {
            match self.peek_lexeme().as_deref() {
                Some("let") => self.compile_let()?,
                Some("if") => self.compile_if()?,
                Some("while") => self.compile_while()?,
                Some("do") => self.compile_do()?,
                Some("return") => self.compile_return()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn compile_let(&mut self) -> Result<(), JackError> {
        self.expect("let")?;
        let name_tok = self.advance()?;
        let loc = self.loc_of(&name_tok);

        if self.peek_lexeme().as_deref() == Some("[") {
            self.advance()?;
            self.compile_expression()?;
            self.expect("]")?;

            let sym = self.symbol_table.resolve(&name_tok.lexeme, loc)?;
            let (seg, slot) = (sym.kind.segment(), sym.slot_index);
            self.buffer.push(seg, slot);
            self.buffer.arith("add");

            self.expect("=")?;
            self.compile_expression()?;
            self.expect(";")?;

            // The RHS expression may itself index an array and trash
            // `pointer 1`, so the target address must be stashed in a temp
            // register before the pointer is repointed.
            self.buffer.pop(Segment::Temp, 0);
            self.buffer.pop(Segment::Pointer, 1);
            self.buffer.push(Segment::Temp, 0);
            self.buffer.pop(Segment::That, 0);
        } else {
            self.expect("=")?;
            self.compile_expression()?;
            self.expect(";")?;

            let sym = self.symbol_table.resolve(&name_tok.lexeme, loc)?;
            let (seg, slot) = (sym.kind.segment(), sym.slot_index);
            self.buffer.pop(seg, slot);
        }

        Ok(())
    }

    fn compile_if(&mut self) -> Result<(), JackError> {
        let label_id = self.tokens.position();
        let else_label = format!("IF_ELSE_{label_id}");
        let end_label = format!("IF_END_{label_id}");

        self.expect("if")?;
        self.expect("(")?;
        self.compile_expression()?;
        self.expect(")")?;
        self.buffer.arith("not");
        self.buffer.if_goto(&else_label);

        self.expect("{")?;
        self.compile_statements()?;
        self.expect("}")?;

        if self.peek_lexeme().as_deref() == Some("else") {
            self.buffer.goto(&end_label);
            self.buffer.label(&else_label);
            self.advance()?;
            self.expect("{")?;
            self.compile_statements()?;
            self.expect("}")?;
            self.buffer.label(&end_label);
        } else {
            self.buffer.label(&else_label);
        }

        Ok(())
    }

    fn compile_while(&mut self) -> Result<(), JackError> {
        let label_id = self.tokens.position();
        let top_label = format!("WHILE_TOP_{label_id}");
        let end_label = format!("WHILE_END_{label_id}");

        self.expect("while")?;
        self.expect("(")?;
        self.buffer.label(&top_label);
        self.compile_expression()?;
        self.expect(")")?;
        self.buffer.arith("not");
        self.buffer.if_goto(&end_label);

        self.expect("{")?;
        self.compile_statements()?;
        self.expect("}")?;

        self.buffer.goto(&top_label);
        self.buffer.label(&end_label);
        Ok(())
    }

    fn compile_do(&mut self) -> Result<(), JackError> {
        self.expect("do")?;
        let name_tok = self.advance()?;
        self.compile_subroutine_call(name_tok)?;
        self.expect(";")?;
        self.buffer.pop(Segment::Temp, 0);
        Ok(())
    }

    fn compile_return(&mut self) -> Result<(), JackError> {
        self.expect("return")?;
        if self.peek_lexeme().as_deref() != Some(";") {
            self.compile_expression()?;
        } else {
            self.buffer.push(Segment::Constant, 0);
        }
        self.expect(";")?;
        self.buffer.ret();
        Ok(())
    }

    // ---- expressions ----------------------------------------------------

    fn compile_expression(&mut self) -> Result<(), JackError> {
        self.compile_term()?;
        while let Some(op) = self.peek_lexeme() {
            if !INFIX_OPS.contains(&op.as_str()) {
                break;
            }
            self.advance()?;
            self.compile_term()?;
            self.emit_infix(&op);
        }
        Ok(())
    }

    fn emit_infix(&mut self, op: &str) {
        match op {
            "+" => self.buffer.arith("add"),
            "-" => self.buffer.arith("sub"),
            "&" => self.buffer.arith("and"),
            "|" => self.buffer.arith("or"),
            "<" => self.buffer.arith("lt"),
            ">" => self.buffer.arith("gt"),
            "=" => self.buffer.arith("eq"),
            "*" => self.buffer.call("Math.multiply", 2),
            "/" => self.buffer.call("Math.divide", 2),
            other => unreachable!("'{other}' is not an infix operator"),
        }
    }

    fn compile_term(&mut self) -> Result<(), JackError> {
        let tok = self.advance()?;
        match tok.kind {
            TokenKind::IntConst => self.compile_int_const(tok),
            TokenKind::StringConst => {
                self.compile_string_const(&tok.lexeme);
                Ok(())
            }
            TokenKind::Keyword => self.compile_keyword_constant(&tok),
            TokenKind::Symbol if tok.lexeme == "-" || tok.lexeme == "~" => {
                self.compile_term()?;
                self.buffer.arith(if tok.lexeme == "-" { "neg" } else { "not" });
                Ok(())
            }
            TokenKind::Symbol if tok.lexeme == "(" => {
                self.compile_expression()?;
                self.expect(")")?;
                Ok(())
            }
            TokenKind::Identifier => self.compile_identifier_term(tok),
            _ => Err(JackError::UnexpectedToken {
                loc: self.loc_of(&tok),
                expected: "term".to_string(),
                actual: tok.lexeme,
            }),
        }
    }

    fn compile_int_const(&mut self, tok: Token) -> Result<(), JackError> {
        let n: usize = tok.lexeme.parse().map_err(|_| JackError::UnexpectedToken {
            loc: self.loc_of(&tok),
            expected: "integer constant".to_string(),
            actual: tok.lexeme.clone(),
        })?;
        self.buffer.push(Segment::Constant, n);
        Ok(())
    }

    /// `push constant len; call String.new 1;` then one
    /// `push constant ord(c); call String.appendChar 2` per character.
    /// `appendChar` returns the string itself, left on the stack so the
    /// chain of calls threads it through.
    fn compile_string_const(&mut self, s: &str) {
        self.buffer.push(Segment::Constant, s.chars().count());
        self.buffer.call("String.new", 1);
        for c in s.chars() {
            self.buffer.push(Segment::Constant, c as usize);
            self.buffer.call("String.appendChar", 2);
        }
    }

    fn compile_keyword_constant(&mut self, tok: &Token) -> Result<(), JackError> {
        match tok.lexeme.as_str() {
            "true" => {
                self.buffer.push(Segment::Constant, 0);
                self.buffer.arith("not");
            }
            "false" | "null" => self.buffer.push(Segment::Constant, 0),
            "this" => self.buffer.push(Segment::Pointer, 0),
            _ => {
                return Err(JackError::UnexpectedToken {
                    loc: self.loc_of(tok),
                    expected: "term".to_string(),
                    actual: tok.lexeme.clone(),
                });
            }
        }
        Ok(())
    }

    /// An identifier term needs one token of lookahead to tell a bare
    /// variable reference apart from an array read or a call.
    fn compile_identifier_term(&mut self, name_tok: Token) -> Result<(), JackError> {
        match self.peek_lexeme().as_deref() {
            Some("[") => {
                self.advance()?;
                self.compile_expression()?;
                self.expect("]")?;

                let loc = self.loc_of(&name_tok);
                let sym = self.symbol_table.resolve(&name_tok.lexeme, loc)?;
                let (seg, slot) = (sym.kind.segment(), sym.slot_index);
                self.buffer.push(seg, slot);
                self.buffer.arith("add");
                self.buffer.pop(Segment::Pointer, 1);
                self.buffer.push(Segment::That, 0);
                Ok(())
            }
            Some("(") | Some(".") => self.compile_subroutine_call(name_tok),
            _ => {
                let loc = self.loc_of(&name_tok);
                let sym = self.symbol_table.resolve(&name_tok.lexeme, loc)?;
                let (seg, slot) = (sym.kind.segment(), sym.slot_index);
                self.buffer.push(seg, slot);
                Ok(())
            }
        }
    }

    /// `subroutineName '(' expressionList ')'` (implicit-`this` method
    /// call) or `(className | varName) '.' subroutineName '(' expressionList ')'`.
    /// `name_tok` has already been consumed by the caller.
    fn compile_subroutine_call(&mut self, name_tok: Token) -> Result<(), JackError> {
        if self.peek_lexeme().as_deref() == Some(".") {
            self.advance()?;
            let member_tok = self.advance()?;

            // A dot-call on a name that resolves in scope is an instance
            // method call: push the receiver and dispatch on its declared
            // type, with the receiver as implicit argument 0. A name that
            // does not resolve is treated as a class name for a static
            // call, never as an error here (spec §9: only a bare value
            // reference raises UndefinedSymbol).
            let (target, base_args) = match self.symbol_table.lookup(&name_tok.lexeme) {
                Some(sym) => {
                    let (seg, slot) = (sym.kind.segment(), sym.slot_index);
                    let receiver_type = sym.declared_type.clone();
                    self.buffer.push(seg, slot);
                    (format!("{}.{}", receiver_type, member_tok.lexeme), 1)
                }
                None => (format!("{}.{}", name_tok.lexeme, member_tok.lexeme), 0),
            };

            self.expect("(")?;
            let n_args = self.compile_expression_list()?;
            self.expect(")")?;
            self.buffer.call(&target, n_args + base_args);
        } else {
            self.expect("(")?;
            self.buffer.push(Segment::Pointer, 0);
            let n_args = self.compile_expression_list()?;
            self.expect(")")?;
            let target = format!("{}.{}", self.class_name, name_tok.lexeme);
            self.buffer.call(&target, n_args + 1);
        }
        Ok(())
    }

    fn compile_expression_list(&mut self) -> Result<usize, JackError> {
        if self.peek_lexeme().as_deref() == Some(")") {
            return Ok(0);
        }
        let mut count = 1;
        self.compile_expression()?;
        while self.peek_lexeme().as_deref() == Some(",") {
            self.advance()?;
            self.compile_expression()?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(src: &str) -> String {
        compile_class(src, &PathBuf::from("Foo.jack")).unwrap()
    }

    fn lines(vm: &str) -> Vec<&str> {
        vm.lines().collect()
    }

    #[test]
    fn empty_void_function_returns_zero() {
        let vm = compile("class Foo { function void main() { return; } }");
        assert_eq!(
            lines(&vm),
            vec!["function Foo.main 0", "push constant 0", "return"]
        );
    }

    #[test]
    fn function_returning_a_constant() {
        let vm = compile("class Foo { function int seven() { return 7; } }");
        assert_eq!(
            lines(&vm),
            vec!["function Foo.seven 0", "push constant 7", "return"]
        );
    }

    #[test]
    fn static_variable_read() {
        let vm = compile("class Foo { static int n; function int get() { return n; } }");
        assert_eq!(
            lines(&vm),
            vec!["function Foo.get 0", "push static 0", "return"]
        );
    }

    #[test]
    fn constructor_allocates_and_assigns_a_field() {
        let vm = compile(
            "class Foo { field int x; constructor Foo new() { let x = 0; return this; } }",
        );
        assert_eq!(
            lines(&vm),
            vec![
                "function Foo.new 0",
                "push constant 1",
                "call Memory.alloc 1",
                "pop pointer 0",
                "push constant 0",
                "pop this 0",
                "push pointer 0",
                "return",
            ]
        );
    }

    #[test]
    fn while_loop_emits_matching_unique_labels() {
        let vm = compile(
            "class Foo { function void loop() { var int i; let i = 0; \
             while (i < 3) { let i = i + 1; } return; } }",
        );
        let body = lines(&vm);
        assert_eq!(body[0], "function Foo.loop 1");
        let top = body.iter().find(|l| l.starts_with("label WHILE_TOP_")).unwrap();
        let end = body.iter().find(|l| l.starts_with("label WHILE_END_")).unwrap();
        let top_n = top.trim_start_matches("label WHILE_TOP_");
        let end_n = end.trim_start_matches("label WHILE_END_");
        assert_eq!(top_n, end_n);
        assert!(body.contains(&"not"));
        assert!(body.iter().any(|l| l.starts_with("if-goto WHILE_END_")));
        assert!(body.iter().any(|l| l.starts_with("goto WHILE_TOP_")));
    }

    #[test]
    fn argument_addition() {
        let vm = compile("class Foo { function int addOne(int x) { return x + 1; } }");
        assert_eq!(
            lines(&vm),
            vec![
                "function Foo.addOne 0",
                "push argument 0",
                "push constant 1",
                "add",
                "return",
            ]
        );
    }

    #[test]
    fn method_binds_this_from_argument_zero() {
        let vm = compile(
            "class Foo { field int x; method void bump() { let x = x + 1; return; } }",
        );
        let body = lines(&vm);
        assert_eq!(body[0], "function Foo.bump 0");
        assert_eq!(body[1], "push argument 0");
        assert_eq!(body[2], "pop pointer 0");
    }

    #[test]
    fn do_statement_discards_the_return_value() {
        let vm = compile(
            "class Foo { function void main() { do Output.println(); return; } }",
        );
        let body = lines(&vm);
        let call_index = body.iter().position(|l| *l == "call Output.println 0").unwrap();
        assert_eq!(body[call_index + 1], "pop temp 0");
    }

    #[test]
    fn array_assignment_orders_address_then_rhs_then_temp_dance() {
        let vm = compile(
            "class Foo { function void main() { var Array a; var int i; \
             let a[i] = 1; return; } }",
        );
        let body = lines(&vm);
        let idx = body.iter().position(|l| *l == "pop that 0").unwrap();
        assert_eq!(
            &body[idx - 4..=idx],
            &["push constant 1", "pop temp 0", "pop pointer 1", "push temp 0", "pop that 0"]
        );
    }

    #[test]
    fn true_is_encoded_via_constant_zero_then_not() {
        let vm = compile("class Foo { function boolean yes() { return true; } }");
        assert_eq!(
            lines(&vm),
            vec!["function Foo.yes 0", "push constant 0", "not", "return"]
        );
    }

    #[test]
    fn expressions_evaluate_strictly_left_to_right() {
        // 2 + 3 * 4 would be 14 with precedence; left-to-right gives
        // Math.multiply(add(2,3), 4) = 20. We only assert on emission
        // order, not the arithmetic result.
        let vm = compile("class Foo { function int f() { return 2 + 3 * 4; } }");
        assert_eq!(
            lines(&vm),
            vec![
                "function Foo.f 0",
                "push constant 2",
                "push constant 3",
                "add",
                "push constant 4",
                "call Math.multiply 2",
                "return",
            ]
        );
    }

    #[test]
    fn method_call_on_instance_pushes_receiver_as_argument_zero() {
        let vm = compile(
            "class Foo { field int x; function void main() { \
             var Foo f; do f.bump(); return; } }",
        );
        let body = lines(&vm);
        assert!(body.contains(&"call Foo.bump 1"));
    }

    #[test]
    fn static_call_on_unresolved_name_has_no_receiver_argument() {
        let vm = compile(
            "class Foo { function void main() { do Output.println(); return; } }",
        );
        assert!(lines(&vm).contains(&"call Output.println 0"));
    }

    #[test]
    fn undefined_symbol_reference_is_an_error() {
        let err = compile_class(
            "class Foo { function void main() { return missing; } }",
            &PathBuf::from("Foo.jack"),
        )
        .unwrap_err();
        assert!(matches!(err, JackError::UndefinedSymbol { .. }));
    }

    #[test]
    fn duplicate_local_declaration_is_an_error() {
        let err = compile_class(
            "class Foo { function void main() { var int x; var int x; return; } }",
            &PathBuf::from("Foo.jack"),
        )
        .unwrap_err();
        assert!(matches!(err, JackError::DuplicateSymbol { .. }));
    }

    #[test]
    fn grammar_violation_is_a_syntax_error() {
        let err = compile_class(
            "class Foo { function void main( { return; } }",
            &PathBuf::from("Foo.jack"),
        )
        .unwrap_err();
        assert!(matches!(err, JackError::UnexpectedToken { .. }));
    }
}
