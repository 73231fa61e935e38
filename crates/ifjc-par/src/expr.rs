//! Expression parsing by table-driven shift/reduce.
//!
//! Terminal classes are ordered by the grid below; the action table is
//! indexed by (topmost operator on the stack, current token). A binary
//! reduction pops right, operator, left; unary `!` pops right and operator;
//! a group reduction pops the inner expression and discards the `(`.
//!
//! The sub-parser stops at `{`, at a line break, or at a `)` with no open
//! `(` of its own, leaving that terminator in `current` for the caller.

use ifjc_lex::TokenKind;
use ifjc_sym::{mangle, Symbol, SymbolKind, TypeMask};
use ifjc_util::{CompileError, CompileResult};

use crate::ast::{AstKind, NodeId};
use crate::Parser;

/// Terminal classes of the precedence grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PrecClass {
    Id = 0,
    Is,
    Type,
    LParen,
    // `)` classifies as the end marker; the grid keeps its row anyway.
    #[allow(dead_code)]
    RParen,
    MulDiv,
    PlusMinus,
    Cmp,
    Eq,
    And,
    Or,
    Not,
    End,
}

const NUM_CLASSES: usize = 13;

/// One cell of the action table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Shift,
    Reduce,
    Error,
}

use Action::{Error as E, Reduce as R, Shift as S};

/// Rows are the topmost operator's class, columns the current token's class.
#[rustfmt::skip]
const ACTION_TABLE: [[Action; NUM_CLASSES]; NUM_CLASSES] = [
    /*        id  is   T   (   )  MD  PM cmp  eq  &&  ||   !   $ */
    /* id */ [ E,  S,  E,  E,  S,  S,  S,  S,  S,  S,  S,  E,  R],
    /* is */ [ E,  E,  S,  E,  S,  E,  E,  E,  R,  R,  R,  E,  R],
    /* T  */ [ E,  E,  E,  E,  S,  E,  E,  E,  S,  S,  S,  E,  R],
    /* (  */ [ S,  S,  E,  S,  S,  S,  S,  S,  S,  S,  S,  S,  R],
    /* )  */ [ E,  R,  E,  E,  S,  R,  R,  R,  R,  R,  R,  S,  R],
    /* MD */ [ S,  S,  E,  S,  S,  R,  R,  R,  R,  R,  R,  S,  R],
    /* PM */ [ S,  S,  E,  S,  S,  S,  R,  R,  R,  R,  R,  S,  R],
    /* cmp*/ [ S,  S,  E,  S,  S,  S,  S,  R,  R,  R,  R,  S,  R],
    /* eq */ [ S,  S,  E,  S,  S,  S,  S,  S,  R,  R,  R,  S,  R],
    /* && */ [ S,  S,  E,  S,  S,  S,  S,  S,  S,  R,  R,  S,  R],
    /* || */ [ S,  S,  E,  S,  S,  S,  S,  S,  S,  S,  R,  S,  R],
    /* !  */ [ S,  S,  E,  S,  R,  R,  R,  R,  R,  R,  R,  R,  R],
    /* $  */ [ S,  S,  S,  S,  R,  S,  S,  S,  S,  S,  S,  S,  R],
];

/// Maps a token kind to its terminal class.
///
/// `)` and the line break act as the end marker; tokens outside the
/// expression grammar have no class at all.
fn prec_class(kind: TokenKind) -> Option<PrecClass> {
    let class = match kind {
        TokenKind::Ident
        | TokenKind::GlobalIdent
        | TokenKind::IntLit
        | TokenKind::FloatLit
        | TokenKind::StrLit
        | TokenKind::MultilineStrLit
        | TokenKind::KwNull
        | TokenKind::KwTrue
        | TokenKind::KwFalse => PrecClass::Id,
        TokenKind::KwTypeNum
        | TokenKind::KwTypeString
        | TokenKind::KwTypeNull
        | TokenKind::KwTypeBool => PrecClass::Type,
        TokenKind::EqEq | TokenKind::NotEq => PrecClass::Eq,
        TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => PrecClass::Cmp,
        TokenKind::Plus | TokenKind::Minus => PrecClass::PlusMinus,
        TokenKind::Star | TokenKind::Slash => PrecClass::MulDiv,
        TokenKind::LPar => PrecClass::LParen,
        TokenKind::AndAnd => PrecClass::And,
        TokenKind::OrOr => PrecClass::Or,
        TokenKind::Not => PrecClass::Not,
        TokenKind::KwIs => PrecClass::Is,
        TokenKind::Eol | TokenKind::RPar => PrecClass::End,
        _ => return None,
    };
    Some(class)
}

impl<'a> Parser<'a> {
    /// Parses one expression; `current` holds its first token on entry and
    /// the unconsumed terminator on return. Returns `None` for an empty
    /// expression.
    pub(crate) fn parse_expr(&mut self) -> CompileResult<Option<NodeId>> {
        let mut stack: Vec<NodeId> = Vec::new();
        let mut paren_depth: u32 = 0;

        loop {
            let kind = self.current.kind;

            if kind == TokenKind::LCurly || kind == TokenKind::Eol || kind == TokenKind::Eof {
                break;
            }
            if kind == TokenKind::RPar && paren_depth == 0 {
                break;
            }

            if kind == TokenKind::KwIs {
                let next = self.peek_token()?;
                if !matches!(
                    next.kind,
                    TokenKind::KwTypeNum
                        | TokenKind::KwTypeString
                        | TokenKind::KwTypeNull
                        | TokenKind::KwTypeBool
                ) {
                    return Err(self.syntax_error_at("expected type keyword after 'is'", &next));
                }
            }

            let cur_class = match kind {
                TokenKind::RPar => PrecClass::End,
                _ => prec_class(kind)
                    .ok_or_else(|| self.syntax_error("unexpected token in expression"))?,
            };
            let top_class = self
                .topmost_operator(&stack)
                .map(|(_, class)| class)
                .unwrap_or(PrecClass::End);

            match ACTION_TABLE[top_class as usize][cur_class as usize] {
                Action::Shift => {
                    let node = self.node_from_token()?;
                    if kind == TokenKind::LPar {
                        paren_depth += 1;
                    }
                    stack.push(node);
                    self.advance()?;
                }
                Action::Reduce => {
                    let (op_id, _) = self
                        .topmost_operator(&stack)
                        .ok_or_else(|| self.syntax_error("malformed expression"))?;
                    match self.ast.node(op_id).token.as_ref().map(|t| t.kind) {
                        Some(TokenKind::LPar) => {
                            self.reduce_group(&mut stack)?;
                            paren_depth -= 1;
                            self.advance()?;
                        }
                        Some(TokenKind::Not) => self.reduce_not(&mut stack)?,
                        _ => self.reduce_binary(&mut stack)?,
                    }
                }
                Action::Error => {
                    return Err(self.syntax_error("unexpected token in expression"));
                }
            }
        }

        // Everything shifted; fold the remaining operators.
        while stack.len() > 1 || stack.last().is_some_and(|id| self.is_operator(*id)) {
            match self.topmost_operator(&stack) {
                None => return Err(self.syntax_error("malformed expression")),
                Some((op_id, _)) => match self.ast.node(op_id).token.as_ref().map(|t| t.kind) {
                    Some(TokenKind::LPar) => {
                        return Err(self.syntax_error("mismatched parentheses in expression"));
                    }
                    Some(TokenKind::Not) => self.reduce_not(&mut stack)?,
                    _ => self.reduce_binary(&mut stack)?,
                },
            }
        }

        Ok(stack.pop())
    }

    /// Topmost stack entry that is still an unreduced operator.
    fn topmost_operator(&self, stack: &[NodeId]) -> Option<(NodeId, PrecClass)> {
        for id in stack.iter().rev() {
            if self.is_operator(*id) {
                let kind = self.ast.node(*id).token.as_ref()?.kind;
                let class = prec_class(kind)?;
                return Some((*id, class));
            }
        }
        None
    }

    fn is_operator(&self, id: NodeId) -> bool {
        self.ast.node(id).kind == AstKind::Operator
    }

    /// Pops right, operator and left, and rebuilds the operator node as an
    /// expression with those children.
    fn reduce_binary(&mut self, stack: &mut Vec<NodeId>) -> CompileResult<()> {
        let right = self.pop_operand(stack)?;
        let op = stack
            .pop()
            .ok_or_else(|| self.syntax_error("malformed expression, missing operator"))?;
        let left = self.pop_operand(stack)?;

        self.ast.node_mut(op).kind = AstKind::Expression;
        self.ast.set_left(op, left);
        self.ast.set_right(op, right);
        stack.push(op);
        Ok(())
    }

    /// Pops the operand and operator of a unary `!`.
    fn reduce_not(&mut self, stack: &mut Vec<NodeId>) -> CompileResult<()> {
        let right = self.pop_operand(stack)?;
        let op = stack
            .pop()
            .ok_or_else(|| self.syntax_error("malformed expression, missing operator"))?;

        self.ast.node_mut(op).kind = AstKind::Expression;
        self.ast.set_right(op, right);
        stack.push(op);
        Ok(())
    }

    /// Pops the parenthesised expression and the `(` below it, keeping only
    /// the expression.
    fn reduce_group(&mut self, stack: &mut Vec<NodeId>) -> CompileResult<()> {
        let inner = self.pop_operand(stack)?;
        stack
            .pop()
            .ok_or_else(|| self.syntax_error("mismatched parentheses in expression"))?;
        stack.push(inner);
        Ok(())
    }

    fn pop_operand(&mut self, stack: &mut Vec<NodeId>) -> CompileResult<NodeId> {
        let id = stack
            .pop()
            .ok_or_else(|| self.syntax_error("malformed expression, missing operand"))?;
        if self.is_operator(id) {
            return Err(self.syntax_error("operator cannot be used as an operand"));
        }
        Ok(id)
    }

    /// Builds the AST node for `current`: a typed atom, a type keyword leaf,
    /// or a raw operator awaiting reduction.
    fn node_from_token(&mut self) -> CompileResult<NodeId> {
        let token = self.current.clone();
        match token.kind {
            TokenKind::Ident | TokenKind::GlobalIdent => {
                let node = self.ast.alloc(AstKind::Identifier, Some(token));
                self.annotate_identifier(node)?;
                Ok(node)
            }
            TokenKind::KwTypeNum
            | TokenKind::KwTypeString
            | TokenKind::KwTypeNull
            | TokenKind::KwTypeBool => Ok(self.ast.alloc(AstKind::Type, Some(token))),
            TokenKind::IntLit
            | TokenKind::FloatLit
            | TokenKind::StrLit
            | TokenKind::MultilineStrLit
            | TokenKind::KwNull
            | TokenKind::KwTrue
            | TokenKind::KwFalse => {
                let node = self.ast.alloc(AstKind::Literal, Some(token));
                self.annotate_literal(node);
                Ok(node)
            }
            _ => Ok(self.ast.alloc(AstKind::Operator, Some(token))),
        }
    }

    /// Stamps an identifier atom with its static type from the symbol store.
    ///
    /// An unknown plain identifier falls back to a getter of the same name;
    /// failing that it is an undefined variable. An unknown `__` identifier
    /// is created in the global scope with an unresolved type.
    pub(crate) fn annotate_identifier(&mut self, id: NodeId) -> CompileResult<()> {
        let token = match &self.ast.node(id).token {
            Some(token) => token.clone(),
            None => return Ok(()),
        };
        let name = token.text().to_string();

        if token.kind == TokenKind::GlobalIdent {
            let known = self.scopes.find(&name).map(|symbol| symbol.ty);
            let ty = match known {
                Some(ty) => ty,
                None => {
                    self.scopes
                        .global_mut()
                        .insert(Symbol::new(&name, TypeMask::UNKNOWN, SymbolKind::Var, 0));
                    TypeMask::UNKNOWN
                }
            };
            self.ast.node_mut(id).ty = ty;
            return Ok(());
        }

        let ty = match self.scopes.find(&name) {
            Some(symbol) => symbol.ty,
            None => match self.scopes.find(&mangle(&name, SymbolKind::Get, 0)) {
                Some(getter) => getter.ty,
                None => {
                    return Err(CompileError::undefined("undefined variable", token.line)
                        .with_token(token.kind.to_string(), token.value.to_string()));
                }
            },
        };
        self.ast.node_mut(id).ty = ty;
        Ok(())
    }

    /// Stamps a literal atom with the type of its token kind.
    pub(crate) fn annotate_literal(&mut self, id: NodeId) {
        let ty = match self.ast.node(id).token.as_ref().map(|t| t.kind) {
            Some(TokenKind::IntLit) => TypeMask::INT,
            Some(TokenKind::FloatLit) => TypeMask::FLOAT,
            Some(TokenKind::StrLit) | Some(TokenKind::MultilineStrLit) => TypeMask::STRING,
            Some(TokenKind::KwNull) => TypeMask::NULL,
            Some(TokenKind::KwTrue) | Some(TokenKind::KwFalse) => TypeMask::BOOL,
            _ => TypeMask::UNKNOWN,
        };
        self.ast.node_mut(id).ty = ty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use ifjc_lex::Lexer;
    use ifjc_sym::ScopeStack;

    /// Parses `source` as a lone expression terminated by a line break.
    fn parse_expression(source: &str) -> CompileResult<(crate::Ast, Option<NodeId>)> {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let text = format!("{}\n", source);
        let mut parser = Parser::new(Lexer::new(&text), &mut scopes);
        parser.advance()?;
        let expr = parser.parse_expr()?;
        if let Some(expr) = expr {
            crate::types::semantic_expression(&mut parser.ast, expr)?;
        }
        Ok((parser.ast, expr))
    }

    fn expr_type(source: &str) -> TypeMask {
        let (ast, expr) = parse_expression(source).expect("expression should parse");
        ast.node(expr.expect("expression should be non-empty")).ty
    }

    fn op_of(ast: &crate::Ast, id: NodeId) -> TokenKind {
        ast.node(id).token.as_ref().unwrap().kind
    }

    #[test]
    fn test_literal_atom() {
        assert_eq!(expr_type("42"), TypeMask::INT);
        assert_eq!(expr_type("4.2"), TypeMask::FLOAT);
        assert_eq!(expr_type("\"s\""), TypeMask::STRING);
        assert_eq!(expr_type("null"), TypeMask::NULL);
        assert_eq!(expr_type("true"), TypeMask::BOOL);
    }

    #[test]
    fn test_precedence_mul_over_add() {
        let (ast, expr) = parse_expression("1 + 2 * 3").unwrap();
        let root = expr.unwrap();
        assert_eq!(op_of(&ast, root), TokenKind::Plus);
        let right = ast.right(root).unwrap();
        assert_eq!(op_of(&ast, right), TokenKind::Star);
    }

    #[test]
    fn test_left_associativity() {
        let (ast, expr) = parse_expression("1 - 2 - 3").unwrap();
        let root = expr.unwrap();
        assert_eq!(op_of(&ast, root), TokenKind::Minus);
        let left = ast.left(root).unwrap();
        assert_eq!(op_of(&ast, left), TokenKind::Minus);
    }

    #[test]
    fn test_grouping_overrides_precedence() {
        let (ast, expr) = parse_expression("(1 + 2) * 3").unwrap();
        let root = expr.unwrap();
        assert_eq!(op_of(&ast, root), TokenKind::Star);
        let left = ast.left(root).unwrap();
        assert_eq!(op_of(&ast, left), TokenKind::Plus);
    }

    #[test]
    fn test_comparison_binds_looser_than_arith() {
        let (ast, expr) = parse_expression("1 + 2 < 3 * 4").unwrap();
        let root = expr.unwrap();
        assert_eq!(op_of(&ast, root), TokenKind::Lt);
        assert_eq!(expr_type("1 + 2 < 3 * 4"), TypeMask::BOOL);
    }

    #[test]
    fn test_logic_binds_loosest() {
        let (ast, expr) = parse_expression("1 < 2 && 3 < 4").unwrap();
        let root = expr.unwrap();
        assert_eq!(op_of(&ast, root), TokenKind::AndAnd);
    }

    #[test]
    fn test_or_binds_looser_than_and() {
        let (ast, expr) = parse_expression("1 < 2 && 2 < 3 || 3 < 4").unwrap();
        let root = expr.unwrap();
        assert_eq!(op_of(&ast, root), TokenKind::OrOr);
    }

    #[test]
    fn test_not_operator() {
        let (ast, expr) = parse_expression("!true").unwrap();
        let root = expr.unwrap();
        assert_eq!(op_of(&ast, root), TokenKind::Not);
        assert!(ast.left(root).is_none());
        assert_eq!(ast.node(root).ty, TypeMask::BOOL);
    }

    #[test]
    fn test_is_requires_type_keyword() {
        assert_eq!(expr_type("1 is Num"), TypeMask::BOOL);
        assert_eq!(expr_type("null is Null"), TypeMask::BOOL);
        let err = parse_expression("1 is 2").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_chained_comparison_is_rejected() {
        let err = parse_expression("1 < 2 < 3").unwrap_err();
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_mismatched_parens() {
        assert!(parse_expression("(1 + 2").is_err());
    }

    #[test]
    fn test_adjacent_atoms_are_an_error() {
        assert!(parse_expression("1 2").is_err());
    }

    #[test]
    fn test_dangling_operator_is_an_error() {
        assert!(parse_expression("1 +").is_err());
    }

    #[test]
    fn test_empty_expression_is_none() {
        let (_, expr) = parse_expression("").unwrap();
        assert!(expr.is_none());
    }

    #[test]
    fn test_type_error_in_expression() {
        let err = parse_expression("1 + \"a\"").unwrap_err();
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_string_concat_type() {
        assert_eq!(expr_type("\"a\" + \"b\""), TypeMask::STRING);
    }

    #[test]
    fn test_string_repeat_type() {
        assert_eq!(expr_type("\"a\" * 3"), TypeMask::STRING);
    }
}
