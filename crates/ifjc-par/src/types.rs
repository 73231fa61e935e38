//! Static type rules for expressions.
//!
//! The parser types expressions as it reduces them, so the binary-operand
//! table lives here; the deferred-resolution pass in `ifjc-sem` re-runs the
//! same rules once forward references are known.

use ifjc_lex::TokenKind;
use ifjc_sym::TypeMask;
use ifjc_util::{CompileError, CompileResult};

use crate::ast::{Ast, AstKind, NodeId};

/// Whether `left op right` is statically allowed.
///
/// `UNKNOWN` in an operand is permissive for the arithmetic rows; the final
/// word is spoken once deferred references resolve.
pub fn check_binary(op: TokenKind, left: TypeMask, right: TypeMask) -> bool {
    let numeric = TypeMask::INT | TypeMask::FLOAT;
    let numeric_or_unknown = numeric | TypeMask::UNKNOWN;

    match op {
        TokenKind::Star => {
            if left.intersects(TypeMask::STRING) {
                return right.intersects(TypeMask::INT | TypeMask::UNKNOWN);
            }
            if left.intersects(numeric) {
                return right.intersects(numeric_or_unknown);
            }
            if left.intersects(TypeMask::UNKNOWN) {
                return right.intersects(numeric_or_unknown);
            }
            false
        }
        TokenKind::Slash | TokenKind::Minus => {
            if left.intersects(numeric) || left.intersects(TypeMask::UNKNOWN) {
                return right.intersects(numeric_or_unknown);
            }
            false
        }
        TokenKind::Plus => {
            if left.intersects(TypeMask::STRING) {
                return right.intersects(TypeMask::STRING | TypeMask::UNKNOWN);
            }
            if left.intersects(numeric) {
                return right.intersects(numeric_or_unknown);
            }
            if left.intersects(TypeMask::UNKNOWN) {
                return right
                    .intersects(numeric | TypeMask::STRING | TypeMask::UNKNOWN);
            }
            false
        }
        TokenKind::EqEq | TokenKind::NotEq => true,
        TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => {
            left.intersects(numeric_or_unknown) && right.intersects(numeric_or_unknown)
        }
        TokenKind::AndAnd | TokenKind::OrOr => {
            left.intersects(TypeMask::BOOL) && right.intersects(TypeMask::BOOL)
        }
        TokenKind::KwIs => true,
        _ => false,
    }
}

/// Result type of `left op right`, assuming [`check_binary`] passed.
pub fn binary_result(op: TokenKind, left: TypeMask, right: TypeMask) -> TypeMask {
    match op {
        TokenKind::Star | TokenKind::Slash | TokenKind::Plus | TokenKind::Minus => {
            if op == TokenKind::Plus
                && left.intersects(TypeMask::STRING)
                && right.intersects(TypeMask::STRING)
            {
                return TypeMask::STRING;
            }
            if op == TokenKind::Star
                && left.intersects(TypeMask::STRING)
                && right.intersects(TypeMask::INT)
            {
                return TypeMask::STRING;
            }
            if left.intersects(TypeMask::FLOAT) || right.intersects(TypeMask::FLOAT) {
                return TypeMask::FLOAT;
            }
            if left.intersects(TypeMask::INT) && right.intersects(TypeMask::INT) {
                return TypeMask::INT;
            }
            TypeMask::UNKNOWN
        }
        TokenKind::EqEq
        | TokenKind::NotEq
        | TokenKind::Lt
        | TokenKind::LtEq
        | TokenKind::Gt
        | TokenKind::GtEq
        | TokenKind::AndAnd
        | TokenKind::OrOr
        | TokenKind::KwIs => TypeMask::BOOL,
        _ => TypeMask::UNKNOWN,
    }
}

/// Recursively checks and types an expression subtree.
pub fn semantic_expression(ast: &mut Ast, id: NodeId) -> CompileResult<()> {
    match ast.node(id).kind {
        AstKind::Literal | AstKind::Identifier | AstKind::Type => Ok(()),
        AstKind::Expression => {
            let node = ast.node(id);
            let op = node.token.as_ref().map(|t| t.kind);
            let line = node.line();

            if op == Some(TokenKind::Not) {
                let right = ast
                    .right(id)
                    .ok_or_else(|| CompileError::internal("'!' node without operand"))?;
                semantic_expression(ast, right)?;
                let rty = ast.node(right).ty;
                if !rty.intersects(TypeMask::BOOL) && rty != TypeMask::UNKNOWN {
                    return Err(type_error(ast, id, "operand of '!' must be boolean", line));
                }
                ast.node_mut(id).ty = TypeMask::BOOL;
                return Ok(());
            }

            let left = ast
                .left(id)
                .ok_or_else(|| CompileError::internal("binary node without left operand"))?;
            let right = ast
                .right(id)
                .ok_or_else(|| CompileError::internal("binary node without right operand"))?;

            semantic_expression(ast, left)?;
            semantic_expression(ast, right)?;

            let op = op.ok_or_else(|| CompileError::internal("operator node without token"))?;
            let lty = ast.node(left).ty;
            let rty = ast.node(right).ty;

            if !check_binary(op, lty, rty) {
                return Err(type_error(ast, id, "type mismatch in expression", line));
            }
            ast.node_mut(id).ty = binary_result(op, lty, rty);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Checks an assignment node and propagates the right side's type to an
/// unresolved left side.
pub fn semantic_assignment(ast: &mut Ast, id: NodeId) -> CompileResult<()> {
    let (left, right) = match (ast.left(id), ast.right(id)) {
        (Some(left), Some(right)) => (left, right),
        _ => return Ok(()),
    };

    let lty = ast.node(left).ty;
    let rty = ast.node(right).ty;

    if lty != TypeMask::UNKNOWN && rty != TypeMask::UNKNOWN && lty != rty {
        let line = ast.node(left).line();
        return Err(type_error(
            ast,
            left,
            "invalid assignment: incompatible types",
            line,
        ));
    }

    if lty == TypeMask::UNKNOWN {
        ast.node_mut(left).ty = rty;
    }
    Ok(())
}

fn type_error(ast: &Ast, id: NodeId, message: &str, line: u32) -> CompileError {
    let err = CompileError::type_mismatch(message, line);
    match &ast.node(id).token {
        Some(token) => err.with_token(token.kind.to_string(), token.value.to_string()),
        None => err,
    }
}
