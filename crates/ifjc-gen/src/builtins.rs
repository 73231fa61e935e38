//! Inline templates for the `Ifj.*` builtins.
//!
//! Builtin calls never become a VM `CALL`; each expands to a fixed
//! instruction sequence. Arguments land in freshly defined locals first
//! (identifiers and literals move directly, anything else evaluates and
//! pops), then the template runs per-value runtime type guards and pushes
//! the result. A failed guard terminates the program with `EXIT int@25`.

use ifjc_lex::TokenKind;
use ifjc_par::{Ast, AstKind, NodeId};

use crate::codegen::{emit, CodeGen};
use crate::error::GenError;

impl<'a> CodeGen<'a> {
    /// Lowers one `Ifj.name(args)` node.
    pub(crate) fn gen_ifj(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        let call = ast
            .right(id)
            .ok_or(GenError::MalformedTree("Ifj node without call"))?;
        let name = ast.node(call).text().to_string();
        let args: Vec<NodeId> = match ast.right(call) {
            Some(params) => ast.list(params).to_vec(),
            None => Vec::new(),
        };

        let expected = match name.as_str() {
            "read_str" | "read_num" => 0,
            "write" | "floor" | "str" | "length" | "chr" => 1,
            "strcmp" | "ord" => 2,
            "substring" => 3,
            _ => return Err(GenError::UnknownBuiltin(name)),
        };
        if args.len() != expected {
            return Err(GenError::MalformedTree("builtin argument count mismatch"));
        }

        let tmps = self.spill_args(ast, &args)?;

        match name.as_str() {
            "write" => self.gen_write(&tmps),
            "read_str" => self.gen_read("string"),
            "read_num" => self.gen_read("float"),
            "floor" => self.gen_floor(&tmps),
            "str" => self.gen_str(&tmps),
            "length" => self.gen_length(&tmps),
            "strcmp" => self.gen_strcmp(&tmps),
            "ord" => self.gen_ord(&tmps),
            "chr" => self.gen_chr(&tmps),
            "substring" => self.gen_substring(&tmps),
            _ => unreachable!("arity table covers the builtin set"),
        }
        Ok(())
    }

    /// Moves every argument into a fresh local of the current frame.
    fn spill_args(&mut self, ast: &Ast, args: &[NodeId]) -> Result<Vec<String>, GenError> {
        let depth = self.frame_depth;
        let mut tmps = Vec::with_capacity(args.len());

        for arg in args {
            let tmp = self.temp_var();
            emit!(self, "DEFVAR LF@{}${}", tmp, depth);

            let node = ast.node(*arg);
            match node.kind {
                AstKind::Identifier => {
                    let arg_name = node.text();
                    if node.token.as_ref().map(|t| t.kind) == Some(TokenKind::GlobalIdent) {
                        emit!(self, "MOVE LF@{}${} GF@{}", tmp, depth, arg_name);
                    } else {
                        emit!(self, "MOVE LF@{}${} LF@{}${}", tmp, depth, arg_name, depth);
                    }
                }
                AstKind::Literal => {
                    let token = node
                        .token
                        .as_ref()
                        .ok_or(GenError::MalformedTree("literal without token"))?;
                    let operand = self.literal_operand(token)?;
                    emit!(self, "MOVE LF@{}${} {}", tmp, depth, operand);
                }
                _ => {
                    self.gen_node(ast, *arg)?;
                    emit!(self, "POPS LF@{}${}", tmp, depth);
                }
            }
            tmps.push(tmp);
        }
        Ok(tmps)
    }

    /// Requires the dynamic type of `tmp` to be `wanted`, else exits 25.
    fn emit_type_guard(&mut self, tmp: &str, wanted: &str) {
        let depth = self.frame_depth;
        let tt = self.temp_var();
        let ok = self.unique_label("type_ok");
        emit!(self, "DEFVAR LF@{}${}", tt, depth);
        emit!(self, "TYPE LF@{}${} LF@{}${}", tt, depth, tmp, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} string@{}", ok, tt, depth, wanted);
        emit!(self, "EXIT int@25");
        emit!(self, "LABEL {}", ok);
    }

    fn gen_write(&mut self, tmps: &[String]) {
        emit!(self, "WRITE LF@{}${}", tmps[0], self.frame_depth);
        emit!(self, "PUSHS nil@nil");
    }

    /// `READ` into a new local of the given VM type and push it; a failed
    /// read yields nil at runtime.
    fn gen_read(&mut self, vm_type: &str) {
        let depth = self.frame_depth;
        let res = self.temp_var();
        emit!(self, "DEFVAR LF@{}${}", res, depth);
        emit!(self, "READ LF@{}${} {}", res, depth, vm_type);
        emit!(self, "PUSHS LF@{}${}", res, depth);
    }

    /// Int passes through, float truncates via `FLOAT2INT`, anything else
    /// exits 25.
    fn gen_floor(&mut self, tmps: &[String]) {
        let depth = self.frame_depth;
        let input = &tmps[0];
        let res = self.temp_var();
        let tt = self.temp_var();
        emit!(self, "DEFVAR LF@{}${}", res, depth);
        emit!(self, "DEFVAR LF@{}${}", tt, depth);
        emit!(self, "TYPE LF@{}${} LF@{}${}", tt, depth, input, depth);

        let l_int = self.unique_label("floor_int");
        let l_float = self.unique_label("floor_flt");
        let l_done = self.unique_label("floor_done");

        emit!(self, "JUMPIFEQ {} LF@{}${} string@int", l_int, tt, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} string@float", l_float, tt, depth);
        emit!(self, "EXIT int@25");

        emit!(self, "LABEL {}", l_int);
        emit!(self, "MOVE LF@{}${} LF@{}${}", res, depth, input, depth);
        emit!(self, "JUMP {}", l_done);

        emit!(self, "LABEL {}", l_float);
        emit!(self, "FLOAT2INT LF@{}${} LF@{}${}", res, depth, input, depth);

        emit!(self, "LABEL {}", l_done);
        emit!(self, "PUSHS LF@{}${}", res, depth);
    }

    /// Converts any of the five canonical types to its string rendering; a
    /// value outside them is a runtime argument-type error.
    fn gen_str(&mut self, tmps: &[String]) {
        let depth = self.frame_depth;
        let input = &tmps[0];
        let res = self.temp_var();
        let tt = self.temp_var();
        emit!(self, "DEFVAR LF@{}${}", res, depth);
        emit!(self, "DEFVAR LF@{}${}", tt, depth);
        emit!(self, "TYPE LF@{}${} LF@{}${}", tt, depth, input, depth);

        let l_str = self.unique_label("str_is_str");
        let l_int = self.unique_label("str_is_int");
        let l_float = self.unique_label("str_is_flt");
        let l_bool = self.unique_label("str_is_bool");
        let l_nil = self.unique_label("str_is_nil");
        let l_done = self.unique_label("str_done");

        emit!(self, "JUMPIFEQ {} LF@{}${} string@string", l_str, tt, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} string@int", l_int, tt, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} string@float", l_float, tt, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} string@bool", l_bool, tt, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} string@nil", l_nil, tt, depth);
        emit!(self, "EXIT int@25");

        emit!(self, "LABEL {}", l_str);
        emit!(self, "MOVE LF@{}${} LF@{}${}", res, depth, input, depth);
        emit!(self, "JUMP {}", l_done);

        emit!(self, "LABEL {}", l_int);
        emit!(self, "INT2STR LF@{}${} LF@{}${}", res, depth, input, depth);
        emit!(self, "JUMP {}", l_done);

        emit!(self, "LABEL {}", l_float);
        emit!(self, "FLOAT2STR LF@{}${} LF@{}${}", res, depth, input, depth);
        emit!(self, "JUMP {}", l_done);

        emit!(self, "LABEL {}", l_bool);
        let l_true = self.unique_label("str_bool_true");
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@true", l_true, input, depth);
        emit!(self, "MOVE LF@{}${} string@false", res, depth);
        emit!(self, "JUMP {}", l_done);
        emit!(self, "LABEL {}", l_true);
        emit!(self, "MOVE LF@{}${} string@true", res, depth);
        emit!(self, "JUMP {}", l_done);

        emit!(self, "LABEL {}", l_nil);
        emit!(self, "MOVE LF@{}${} string@null", res, depth);

        emit!(self, "LABEL {}", l_done);
        emit!(self, "PUSHS LF@{}${}", res, depth);
    }

    fn gen_length(&mut self, tmps: &[String]) {
        let depth = self.frame_depth;
        let input = &tmps[0];
        self.emit_type_guard(input, "string");
        let res = self.temp_var();
        emit!(self, "DEFVAR LF@{}${}", res, depth);
        emit!(self, "STRLEN LF@{}${} LF@{}${}", res, depth, input, depth);
        emit!(self, "PUSHS LF@{}${}", res, depth);
    }

    /// Three-branch string compare producing -1, 0 or 1.
    fn gen_strcmp(&mut self, tmps: &[String]) {
        let depth = self.frame_depth;
        let a = tmps[0].clone();
        let b = tmps[1].clone();
        self.emit_type_guard(&a, "string");
        self.emit_type_guard(&b, "string");

        let res = self.temp_var();
        emit!(self, "DEFVAR LF@{}${}", res, depth);

        let l_lt = self.unique_label("strcmp_lt");
        let l_eq = self.unique_label("strcmp_eq");
        let l_done = self.unique_label("strcmp_done");

        emit!(self, "LT LF@{}${} LF@{}${} LF@{}${}", res, depth, a, depth, b, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@true", l_lt, res, depth);
        emit!(self, "EQ LF@{}${} LF@{}${} LF@{}${}", res, depth, a, depth, b, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@true", l_eq, res, depth);
        emit!(self, "MOVE LF@{}${} int@1", res, depth);
        emit!(self, "JUMP {}", l_done);
        emit!(self, "LABEL {}", l_lt);
        emit!(self, "MOVE LF@{}${} int@-1", res, depth);
        emit!(self, "JUMP {}", l_done);
        emit!(self, "LABEL {}", l_eq);
        emit!(self, "MOVE LF@{}${} int@0", res, depth);
        emit!(self, "LABEL {}", l_done);
        emit!(self, "PUSHS LF@{}${}", res, depth);
    }

    /// Character code at an index; indices outside `[0, STRLEN)` yield 0.
    fn gen_ord(&mut self, tmps: &[String]) {
        let depth = self.frame_depth;
        let s = tmps[0].clone();
        let i = tmps[1].clone();
        self.emit_type_guard(&s, "string");
        self.emit_type_guard(&i, "int");

        let res = self.temp_var();
        let len = self.temp_var();
        let cmp = self.temp_var();
        emit!(self, "DEFVAR LF@{}${}", res, depth);
        emit!(self, "DEFVAR LF@{}${}", len, depth);
        emit!(self, "DEFVAR LF@{}${}", cmp, depth);

        emit!(self, "STRLEN LF@{}${} LF@{}${}", len, depth, s, depth);

        let l_zero = self.unique_label("ord_zero");
        let l_done = self.unique_label("ord_done");

        emit!(self, "LT LF@{}${} LF@{}${} int@0", cmp, depth, i, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@true", l_zero, cmp, depth);
        emit!(self, "LT LF@{}${} LF@{}${} LF@{}${}", cmp, depth, i, depth, len, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@false", l_zero, cmp, depth);

        emit!(self, "STRI2INT LF@{}${} LF@{}${} LF@{}${}", res, depth, s, depth, i, depth);
        emit!(self, "JUMP {}", l_done);

        emit!(self, "LABEL {}", l_zero);
        emit!(self, "MOVE LF@{}${} int@0", res, depth);
        emit!(self, "LABEL {}", l_done);
        emit!(self, "PUSHS LF@{}${}", res, depth);
    }

    fn gen_chr(&mut self, tmps: &[String]) {
        let depth = self.frame_depth;
        let input = tmps[0].clone();
        self.emit_type_guard(&input, "int");
        let res = self.temp_var();
        emit!(self, "DEFVAR LF@{}${}", res, depth);
        emit!(self, "INT2CHAR LF@{}${} LF@{}${}", res, depth, input, depth);
        emit!(self, "PUSHS LF@{}${}", res, depth);
    }

    /// Substring by a `GETCHAR`/`CONCAT` loop over `i..j`; out-of-range
    /// index combinations push nil instead.
    fn gen_substring(&mut self, tmps: &[String]) {
        let depth = self.frame_depth;
        let s = tmps[0].clone();
        let i = tmps[1].clone();
        let j = tmps[2].clone();
        self.emit_type_guard(&s, "string");
        self.emit_type_guard(&i, "int");
        self.emit_type_guard(&j, "int");

        let len = self.temp_var();
        let cmp = self.temp_var();
        emit!(self, "DEFVAR LF@{}${}", len, depth);
        emit!(self, "DEFVAR LF@{}${}", cmp, depth);
        emit!(self, "STRLEN LF@{}${} LF@{}${}", len, depth, s, depth);

        let l_nil = self.unique_label("substr_nil");
        let l_loop = self.unique_label("substr_loop");
        let l_done = self.unique_label("substr_done");
        let l_end = self.unique_label("substr_end");

        emit!(self, "LT LF@{}${} LF@{}${} int@0", cmp, depth, i, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@true", l_nil, cmp, depth);
        emit!(self, "LT LF@{}${} LF@{}${} int@0", cmp, depth, j, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@true", l_nil, cmp, depth);
        emit!(self, "GT LF@{}${} LF@{}${} LF@{}${}", cmp, depth, i, depth, j, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@true", l_nil, cmp, depth);
        emit!(self, "LT LF@{}${} LF@{}${} LF@{}${}", cmp, depth, i, depth, len, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@false", l_nil, cmp, depth);
        emit!(self, "GT LF@{}${} LF@{}${} LF@{}${}", cmp, depth, j, depth, len, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@true", l_nil, cmp, depth);

        let res = self.temp_var();
        let idx = self.temp_var();
        let ch = self.temp_var();
        emit!(self, "DEFVAR LF@{}${}", res, depth);
        emit!(self, "MOVE LF@{}${} string@", res, depth);
        emit!(self, "DEFVAR LF@{}${}", idx, depth);
        emit!(self, "MOVE LF@{}${} LF@{}${}", idx, depth, i, depth);
        emit!(self, "DEFVAR LF@{}${}", ch, depth);

        emit!(self, "LABEL {}", l_loop);
        emit!(self, "LT LF@{}${} LF@{}${} LF@{}${}", cmp, depth, idx, depth, j, depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@false", l_done, cmp, depth);
        emit!(self, "GETCHAR LF@{}${} LF@{}${} LF@{}${}", ch, depth, s, depth, idx, depth);
        emit!(self, "CONCAT LF@{}${} LF@{}${} LF@{}${}", res, depth, res, depth, ch, depth);
        emit!(self, "ADD LF@{}${} LF@{}${} int@1", idx, depth, idx, depth);
        emit!(self, "JUMP {}", l_loop);

        emit!(self, "LABEL {}", l_done);
        emit!(self, "PUSHS LF@{}${}", res, depth);
        emit!(self, "JUMP {}", l_end);

        emit!(self, "LABEL {}", l_nil);
        emit!(self, "PUSHS nil@nil");
        emit!(self, "LABEL {}", l_end);
    }
}
