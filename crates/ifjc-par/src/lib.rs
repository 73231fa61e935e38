//! ifjc-par - Recursive-descent parser for IFJ25.
//!
//! The parser drives the lexer one token at a time with single-token
//! lookahead, builds the AST arena, installs symbols into the scope stack as
//! declarations are seen, and queues nodes whose meaning depends on
//! declarations that appear later in the source (the deferred list).
//!
//! Expressions are parsed by a table-driven shift/reduce machine in
//! [`expr`]; everything else is plain recursive descent.

pub mod ast;
pub mod expr;
pub mod items;
pub mod stmt;
pub mod types;

pub use ast::{Ast, AstKind, AstNode, Children, NodeId};

use ifjc_lex::{Lexer, Token, TokenKind};
use ifjc_sym::ScopeStack;
use ifjc_util::{CompileError, CompileResult};

/// Recursive-descent parser.
///
/// Holds the lexer, the AST arena being built, a borrowed scope stack and the
/// deferred-reference list. `current` is the most recently consumed token;
/// one more token of lookahead is available through [`peek`](Parser::peek).
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    pub ast: Ast,
    pub scopes: &'a mut ScopeStack,
    /// Nodes whose resolution waits for declarations met later.
    pub deferred: Vec<NodeId>,
    pub(crate) current: Token,
}

impl<'a> Parser<'a> {
    /// Creates a parser over a lexer whose prologue has been consumed.
    ///
    /// The scope stack must already hold the global scope (with the `Ifj.*`
    /// builtins primed).
    pub fn new(lexer: Lexer<'a>, scopes: &'a mut ScopeStack) -> Self {
        Self {
            lexer,
            ast: Ast::new(),
            scopes,
            deferred: Vec::new(),
            current: Token::new(TokenKind::Eof, 0),
        }
    }

    /// Parses the whole program and returns the class root.
    ///
    /// Top level: `class IDENT { static-decl* }` followed by an optional
    /// line break and end of input. A `main` function with zero parameters
    /// must exist in the global scope afterwards.
    pub fn parse_program(&mut self) -> CompileResult<NodeId> {
        let root = self.parse_class_dec()?;

        if self.peek_kind()? == TokenKind::Eol {
            self.advance()?;
        }
        self.advance()?;
        self.validate(TokenKind::Eof, "expected end of file after class body")?;

        if self.scopes.find("main$0").is_none() {
            return Err(CompileError::undefined(
                "missing 'main' function with no parameters",
                0,
            ));
        }

        Ok(root)
    }

    /// Consumes one token into `current`.
    pub(crate) fn advance(&mut self) -> CompileResult<()> {
        self.current = self.lexer.next()?;
        Ok(())
    }

    /// Kind of the buffered lookahead token.
    pub(crate) fn peek_kind(&mut self) -> CompileResult<TokenKind> {
        Ok(self.lexer.peek()?.kind)
    }

    /// Clone of the buffered lookahead token.
    pub(crate) fn peek_token(&mut self) -> CompileResult<Token> {
        Ok(self.lexer.peek()?.clone())
    }

    /// Errors unless `current` has the expected kind.
    pub(crate) fn validate(&self, kind: TokenKind, message: &str) -> CompileResult<()> {
        if self.current.kind != kind {
            return Err(self.syntax_error(message));
        }
        Ok(())
    }

    /// Advances and validates in one step.
    pub(crate) fn expect(&mut self, kind: TokenKind, message: &str) -> CompileResult<()> {
        self.advance()?;
        self.validate(kind, message)
    }

    /// Syntax error at the current token.
    pub(crate) fn syntax_error(&self, message: &str) -> CompileError {
        CompileError::syntax(message, self.current.line)
            .with_token(self.current.kind.to_string(), self.current.value.to_string())
    }

    /// Syntax error at an arbitrary token.
    pub(crate) fn syntax_error_at(&self, message: &str, token: &Token) -> CompileError {
        CompileError::syntax(message, token.line)
            .with_token(token.kind.to_string(), token.value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifjc_sym::{Symbol, SymbolKind, TypeMask};

    /// Parses a class body after pushing a bare global scope.
    fn parse(source: &str) -> CompileResult<(Ast, Vec<NodeId>)> {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let mut parser = Parser::new(Lexer::new(source), &mut scopes);
        parser.parse_program()?;
        Ok((parser.ast, parser.deferred))
    }

    #[test]
    fn test_minimal_program() {
        let (ast, deferred) = parse("class Main {\n static main() {\n }\n}\n").unwrap();
        assert!(deferred.is_empty());
        assert!(!ast.is_empty());
    }

    #[test]
    fn test_single_line_program() {
        // A block and class body without inner line breaks must parse.
        assert!(parse("class Main { static main() { } }\n").is_ok());
    }

    #[test]
    fn test_missing_main_is_undefined_symbol() {
        let err = parse("class Main {\n static run() {\n }\n}\n").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_main_with_params_does_not_count() {
        let err = parse("class Main {\n static main(a) {\n }\n}\n").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_garbage_after_class_is_syntax_error() {
        let err = parse("class Main {\n static main() {\n }\n}\nvar x\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_class_is_syntax_error() {
        let err = parse("static main() {\n}\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_overload_by_arity_installs_both() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let source = "class Main {\n static f() {\n }\n static f(a) {\n }\n static main() {\n }\n}\n";
        let mut parser = Parser::new(Lexer::new(source), &mut scopes);
        parser.parse_program().unwrap();
        assert!(scopes.find("f$0").is_some());
        assert!(scopes.find("f$1").is_some());
        assert!(scopes.find("f").is_none());
    }

    #[test]
    fn test_redefinition_is_error() {
        let err = parse("class Main {\n static f() {\n }\n static f() {\n }\n static main() {\n }\n}\n")
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_getter_and_setter_mangling() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let source =
            "class Main {\n static light {\n return 1\n }\n static light = (v) {\n }\n static main() {\n }\n}\n";
        let mut parser = Parser::new(Lexer::new(source), &mut scopes);
        parser.parse_program().unwrap();
        assert!(scopes.find("light#get").is_some());
        assert!(scopes.find("light#set").is_some());
    }

    #[test]
    fn test_setter_with_two_params_is_syntax_error() {
        let err = parse("class Main {\n static s = (a, b) {\n }\n static main() {\n }\n}\n")
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_forward_call_lands_in_deferred_list() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let source = "class Main {\n static main() {\n var x\n x = g(1)\n }\n static g(a) {\n return a\n }\n}\n";
        let mut parser = Parser::new(Lexer::new(source), &mut scopes);
        parser.parse_program().unwrap();
        assert!(!parser.deferred.is_empty());
        let kinds: Vec<_> = parser
            .deferred
            .iter()
            .map(|id| parser.ast.node(*id).kind)
            .collect();
        assert!(kinds.contains(&AstKind::FunCall) || kinds.contains(&AstKind::VarAssign));
    }

    #[test]
    fn test_known_builtin_call_is_not_deferred() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let mut write = Symbol::new("write", TypeMask::NULL, SymbolKind::Func, 1);
        write.declared = true;
        scopes.global_mut().insert(write);

        let source = "class Main {\n static main() {\n Ifj.write(\"x\")\n }\n}\n";
        let mut parser = Parser::new(Lexer::new(source), &mut scopes);
        parser.parse_program().unwrap();
        assert!(parser.deferred.is_empty());
    }

    #[test]
    fn test_undefined_variable_in_expression() {
        let err = parse("class Main {\n static main() {\n var x\n x = y + 1\n }\n}\n").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_type_clash_in_assignment() {
        let err = parse("class Main {\n static main() {\n var x\n x = 1 + \"a\"\n }\n}\n")
            .unwrap_err();
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_lone_else_is_syntax_error() {
        let err = parse("class Main {\n static main() {\n else {\n }\n }\n}\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_duplicate_parameter_is_redefinition() {
        let err = parse("class Main {\n static f(a, a) {\n }\n static main() {\n }\n}\n")
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_var_redeclaration_same_scope() {
        let err = parse("class Main {\n static main() {\n var x\n var x\n }\n}\n").unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_var_shadowing_in_nested_block_is_allowed() {
        assert!(parse("class Main {\n static main() {\n var x\n {\n var x\n }\n }\n}\n").is_ok());
    }

    #[test]
    fn test_return_type_union_on_symbol() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let source = "class Main {\n static f(a) {\n if (a < 1) {\n return 1\n }\n return \"s\"\n }\n static main() {\n }\n}\n";
        let mut parser = Parser::new(Lexer::new(source), &mut scopes);
        parser.parse_program().unwrap();
        let sym = scopes.find("f$1").unwrap();
        assert!(sym.ty.contains(TypeMask::INT));
        assert!(sym.ty.contains(TypeMask::STRING));
    }

    #[test]
    fn test_global_identifier_autocreated_in_global_scope() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let source = "class Main {\n static main() {\n __total = 1\n }\n}\n";
        let mut parser = Parser::new(Lexer::new(source), &mut scopes);
        parser.parse_program().unwrap();
        let sym = scopes.global().find("__total").unwrap();
        assert_eq!(sym.kind, SymbolKind::Var);
    }
}
