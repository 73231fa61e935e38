//! Dynamic operator dispatch.
//!
//! The language is dynamically typed, so arithmetic and ordering read the
//! operand types at runtime with `TYPE` and pick an instruction path:
//! strings concatenate under `+`, mixed int/float coerces through
//! `INT2FLOAT`, and `/` always takes the float path. `<=`, `>=` and `!=`
//! come from the complementary comparison followed by `NOTS`.

use ifjc_lex::TokenKind;
use ifjc_par::{Ast, NodeId};

use crate::codegen::{emit, CodeGen};
use crate::error::GenError;

impl<'a> CodeGen<'a> {
    /// Lowers an expression node by its operator token.
    pub(crate) fn gen_operator(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        let op = ast
            .node(id)
            .token
            .as_ref()
            .map(|t| t.kind)
            .ok_or(GenError::MalformedTree("operator node without token"))?;

        match op {
            TokenKind::AndAnd => return self.gen_and(ast, id),
            TokenKind::OrOr => return self.gen_or(ast, id),
            TokenKind::Not => {
                let right = ast
                    .right(id)
                    .ok_or(GenError::MalformedTree("'!' without operand"))?;
                self.gen_node(ast, right)?;
                emit!(self, "NOTS");
                return Ok(());
            }
            _ => {}
        }

        let left = ast
            .left(id)
            .ok_or(GenError::MalformedTree("binary operator without left operand"))?;
        let right = ast
            .right(id)
            .ok_or(GenError::MalformedTree("binary operator without right operand"))?;
        self.gen_node(ast, left)?;
        self.gen_node(ast, right)?;

        match op {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash => {
                self.gen_dynamic_arithmetic(op)
            }
            TokenKind::Lt => {
                self.gen_dynamic_comparison(TokenKind::Lt);
                Ok(())
            }
            TokenKind::Gt => {
                self.gen_dynamic_comparison(TokenKind::Gt);
                Ok(())
            }
            TokenKind::EqEq => {
                self.gen_dynamic_comparison(TokenKind::EqEq);
                Ok(())
            }
            TokenKind::NotEq => {
                self.gen_dynamic_comparison(TokenKind::EqEq);
                emit!(self, "NOTS");
                Ok(())
            }
            TokenKind::LtEq => {
                self.gen_dynamic_comparison(TokenKind::Gt);
                emit!(self, "NOTS");
                Ok(())
            }
            TokenKind::GtEq => {
                self.gen_dynamic_comparison(TokenKind::Lt);
                emit!(self, "NOTS");
                Ok(())
            }
            TokenKind::KwIs => {
                self.gen_is();
                Ok(())
            }
            kind => Err(GenError::UnknownOperator(kind.to_string())),
        }
    }

    /// Arithmetic with runtime dispatch. Both operands are popped into a
    /// scoped frame; `+` on two strings concatenates, any float operand
    /// coerces the other side, `/` always divides as floats.
    fn gen_dynamic_arithmetic(&mut self, op: TokenKind) -> Result<(), GenError> {
        emit!(self, "CREATEFRAME");
        emit!(self, "PUSHFRAME");

        let b = self.temp_var();
        let a = self.temp_var();
        let tb = self.temp_var();
        let ta = self.temp_var();
        let depth = self.frame_depth;

        emit!(self, "DEFVAR LF@{}${}", b, depth);
        emit!(self, "DEFVAR LF@{}${}", a, depth);
        emit!(self, "DEFVAR LF@{}${}", tb, depth);
        emit!(self, "DEFVAR LF@{}${}", ta, depth);
        emit!(self, "POPS LF@{}${}", b, depth);
        emit!(self, "POPS LF@{}${}", a, depth);
        emit!(self, "TYPE LF@{}${} LF@{}${}", tb, depth, b, depth);
        emit!(self, "TYPE LF@{}${} LF@{}${}", ta, depth, a, depth);

        let l_end = self.unique_label("op_end");

        if op == TokenKind::Plus {
            let l_not_str = self.unique_label("op_not_str");
            emit!(self, "JUMPIFNEQ {} LF@{}${} string@string", l_not_str, ta, depth);
            emit!(self, "JUMPIFNEQ {} LF@{}${} string@string", l_not_str, tb, depth);
            emit!(self, "CONCAT LF@{}${} LF@{}${} LF@{}${}", a, depth, a, depth, b, depth);
            emit!(self, "PUSHS LF@{}${}", a, depth);
            emit!(self, "JUMP {}", l_end);
            emit!(self, "LABEL {}", l_not_str);
        }

        let l_float = self.unique_label("op_flt");

        if op == TokenKind::Slash {
            emit!(self, "JUMP {}", l_float);
        } else {
            emit!(self, "JUMPIFEQ {} LF@{}${} string@float", l_float, ta, depth);
            emit!(self, "JUMPIFEQ {} LF@{}${} string@float", l_float, tb, depth);

            emit!(self, "PUSHS LF@{}${}", a, depth);
            emit!(self, "PUSHS LF@{}${}", b, depth);
            emit!(self, "{}", int_op(op)?);
            emit!(self, "JUMP {}", l_end);
        }

        emit!(self, "LABEL {}", l_float);
        let l_a_ok = self.unique_label("op_a_ok");
        let l_b_ok = self.unique_label("op_b_ok");

        emit!(self, "JUMPIFEQ {} LF@{}${} string@float", l_a_ok, ta, depth);
        emit!(self, "INT2FLOAT LF@{}${} LF@{}${}", a, depth, a, depth);
        emit!(self, "LABEL {}", l_a_ok);
        emit!(self, "JUMPIFEQ {} LF@{}${} string@float", l_b_ok, tb, depth);
        emit!(self, "INT2FLOAT LF@{}${} LF@{}${}", b, depth, b, depth);
        emit!(self, "LABEL {}", l_b_ok);

        emit!(self, "PUSHS LF@{}${}", a, depth);
        emit!(self, "PUSHS LF@{}${}", b, depth);
        emit!(self, "{}", float_op(op)?);

        emit!(self, "LABEL {}", l_end);
        emit!(self, "POPFRAME");
        Ok(())
    }

    /// `<`, `>` and `==` with the same int-to-float coercion rule, via
    /// `LTS`/`GTS`/`EQS`.
    fn gen_dynamic_comparison(&mut self, op: TokenKind) {
        emit!(self, "CREATEFRAME");
        emit!(self, "PUSHFRAME");

        let b = self.temp_var();
        let a = self.temp_var();
        let tb = self.temp_var();
        let ta = self.temp_var();
        let depth = self.frame_depth;

        emit!(self, "DEFVAR LF@{}${}", b, depth);
        emit!(self, "DEFVAR LF@{}${}", a, depth);
        emit!(self, "DEFVAR LF@{}${}", tb, depth);
        emit!(self, "DEFVAR LF@{}${}", ta, depth);
        emit!(self, "POPS LF@{}${}", b, depth);
        emit!(self, "POPS LF@{}${}", a, depth);
        emit!(self, "TYPE LF@{}${} LF@{}${}", tb, depth, b, depth);
        emit!(self, "TYPE LF@{}${} LF@{}${}", ta, depth, a, depth);

        let l_float = self.unique_label("cmp_flt");
        let l_end = self.unique_label("cmp_end");

        emit!(self, "JUMPIFEQ {} LF@{}${} string@float", l_float, ta, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} string@float", l_float, tb, depth);

        emit!(self, "PUSHS LF@{}${}", a, depth);
        emit!(self, "PUSHS LF@{}${}", b, depth);
        emit!(self, "{}", cmp_op(op));
        emit!(self, "JUMP {}", l_end);

        emit!(self, "LABEL {}", l_float);
        let l_a_ok = self.unique_label("cmp_a_ok");
        let l_b_ok = self.unique_label("cmp_b_ok");

        emit!(self, "JUMPIFEQ {} LF@{}${} string@float", l_a_ok, ta, depth);
        emit!(self, "INT2FLOAT LF@{}${} LF@{}${}", a, depth, a, depth);
        emit!(self, "LABEL {}", l_a_ok);
        emit!(self, "JUMPIFEQ {} LF@{}${} string@float", l_b_ok, tb, depth);
        emit!(self, "INT2FLOAT LF@{}${} LF@{}${}", b, depth, b, depth);
        emit!(self, "LABEL {}", l_b_ok);

        emit!(self, "PUSHS LF@{}${}", a, depth);
        emit!(self, "PUSHS LF@{}${}", b, depth);
        emit!(self, "{}", cmp_op(op));

        emit!(self, "LABEL {}", l_end);
        emit!(self, "POPFRAME");
    }

    /// `is TYPE`: reads the dynamic type of the value; `Num` (pushed as the
    /// string `float`) matches either int or float, the other keywords match
    /// exactly.
    fn gen_is(&mut self) {
        emit!(self, "CREATEFRAME");
        emit!(self, "PUSHFRAME");

        let wanted = self.temp_var();
        let val = self.temp_var();
        let actual = self.temp_var();
        let depth = self.frame_depth;

        emit!(self, "DEFVAR LF@{}${}", wanted, depth);
        emit!(self, "DEFVAR LF@{}${}", val, depth);
        emit!(self, "DEFVAR LF@{}${}", actual, depth);
        emit!(self, "POPS LF@{}${}", wanted, depth);
        emit!(self, "POPS LF@{}${}", val, depth);
        emit!(self, "TYPE LF@{}${} LF@{}${}", actual, depth, val, depth);

        let l_true = self.unique_label("is_true");
        let l_false = self.unique_label("is_false");
        let l_end = self.unique_label("is_end");
        let l_exact = self.unique_label("is_check_exact");

        emit!(self, "JUMPIFNEQ {} LF@{}${} string@float", l_exact, wanted, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} string@int", l_true, actual, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} string@float", l_true, actual, depth);
        emit!(self, "JUMP {}", l_false);

        emit!(self, "LABEL {}", l_exact);
        emit!(
            self,
            "JUMPIFEQ {} LF@{}${} LF@{}${}",
            l_true,
            actual,
            depth,
            wanted,
            depth
        );

        emit!(self, "LABEL {}", l_false);
        emit!(self, "PUSHS bool@false");
        emit!(self, "JUMP {}", l_end);
        emit!(self, "LABEL {}", l_true);
        emit!(self, "PUSHS bool@true");
        emit!(self, "LABEL {}", l_end);
        emit!(self, "POPFRAME");
    }

    /// Short-circuit `&&`: the right side only evaluates when the left is
    /// neither `bool@false` nor `nil@nil`.
    fn gen_and(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        let left = ast
            .left(id)
            .ok_or(GenError::MalformedTree("'&&' without left operand"))?;
        let right = ast
            .right(id)
            .ok_or(GenError::MalformedTree("'&&' without right operand"))?;

        let l_false = self.unique_label("and_false");
        let l_end = self.unique_label("and_end");

        self.gen_node(ast, left)?;

        emit!(self, "CREATEFRAME");
        emit!(self, "PUSHFRAME");
        let tmp = self.temp_var();
        let depth = self.frame_depth;
        emit!(self, "DEFVAR LF@{}${}", tmp, depth);
        emit!(self, "POPS LF@{}${}", tmp, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@false", l_false, tmp, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} nil@nil", l_false, tmp, depth);
        emit!(self, "POPFRAME");

        self.gen_node(ast, right)?;
        emit!(self, "JUMP {}", l_end);

        emit!(self, "LABEL {}", l_false);
        emit!(self, "POPFRAME");
        emit!(self, "PUSHS bool@false");
        emit!(self, "LABEL {}", l_end);
        Ok(())
    }

    /// Short-circuit `||`: a left value that is neither false nor nil short
    /// circuits to `bool@true`.
    fn gen_or(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        let left = ast
            .left(id)
            .ok_or(GenError::MalformedTree("'||' without left operand"))?;
        let right = ast
            .right(id)
            .ok_or(GenError::MalformedTree("'||' without right operand"))?;

        let l_calc_b = self.unique_label("or_calc_b");
        let l_end = self.unique_label("or_end");

        self.gen_node(ast, left)?;

        emit!(self, "CREATEFRAME");
        emit!(self, "PUSHFRAME");
        let tmp = self.temp_var();
        let depth = self.frame_depth;
        emit!(self, "DEFVAR LF@{}${}", tmp, depth);
        emit!(self, "POPS LF@{}${}", tmp, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@false", l_calc_b, tmp, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} nil@nil", l_calc_b, tmp, depth);
        emit!(self, "POPFRAME");
        emit!(self, "PUSHS bool@true");
        emit!(self, "JUMP {}", l_end);

        emit!(self, "LABEL {}", l_calc_b);
        emit!(self, "POPFRAME");
        self.gen_node(ast, right)?;
        emit!(self, "LABEL {}", l_end);
        Ok(())
    }
}

/// Integer-path instruction for an arithmetic operator.
fn int_op(op: TokenKind) -> Result<&'static str, GenError> {
    match op {
        TokenKind::Plus => Ok("ADDS"),
        TokenKind::Minus => Ok("SUBS"),
        TokenKind::Star => Ok("MULS"),
        kind => Err(GenError::UnknownOperator(kind.to_string())),
    }
}

/// Float-path instruction for an arithmetic operator.
fn float_op(op: TokenKind) -> Result<&'static str, GenError> {
    match op {
        TokenKind::Plus => Ok("ADDS"),
        TokenKind::Minus => Ok("SUBS"),
        TokenKind::Star => Ok("MULS"),
        TokenKind::Slash => Ok("DIVS"),
        kind => Err(GenError::UnknownOperator(kind.to_string())),
    }
}

/// Stack comparison instruction.
fn cmp_op(op: TokenKind) -> &'static str {
    match op {
        TokenKind::Lt => "LTS",
        TokenKind::Gt => "GTS",
        _ => "EQS",
    }
}
