//! Code generator core: program skeleton and per-statement lowering.

use ifjc_lex::{Token, TokenKind};
use ifjc_par::{Ast, AstKind, NodeId};
use ifjc_sym::{mangle, ScopeStack, SymbolKind};
use ifjc_util::{CompileError, CompileResult};

use crate::error::GenError;
use crate::escape::{escape_string, hex_float};

/// Writes one instruction line into the generator's output buffer.
macro_rules! emit {
    ($gen:expr, $($arg:tt)*) => {{
        use std::fmt::Write as _;
        let _ = writeln!($gen.out, $($arg)*);
    }};
}
pub(crate) use emit;

/// Lowers the resolved tree rooted at `root` to IFJcode25 text.
pub fn generate(ast: &Ast, root: NodeId, scopes: &ScopeStack) -> CompileResult<String> {
    let mut gen = CodeGen::new(scopes);
    gen.gen_node(ast, root).map_err(CompileError::from)?;
    Ok(gen.out)
}

/// Code generator state.
///
/// Labels and temporaries come from monotonic counters; `frame_depth` is the
/// number of function frames open at the emission point and suffixes every
/// local name, disambiguating identically named locals at different depths.
pub struct CodeGen<'a> {
    scopes: &'a ScopeStack,
    pub(crate) out: String,
    label_counter: u32,
    temp_counter: u32,
    pub(crate) frame_depth: u32,
}

impl<'a> CodeGen<'a> {
    pub fn new(scopes: &'a ScopeStack) -> Self {
        Self {
            scopes,
            out: String::new(),
            label_counter: 0,
            temp_counter: 0,
            frame_depth: 0,
        }
    }

    /// A fresh label `$base_N`.
    pub(crate) fn unique_label(&mut self, base: &str) -> String {
        let label = format!("${}_{}", base, self.label_counter);
        self.label_counter += 1;
        label
    }

    /// A fresh temporary name `$$tmp_N` (frame-depth suffix added at use).
    pub(crate) fn temp_var(&mut self) -> String {
        let name = format!("$$tmp_{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// Dispatches lowering for one node.
    pub(crate) fn gen_node(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        match ast.node(id).kind {
            AstKind::ClassDec => self.gen_class(ast, id),
            AstKind::Block => self.gen_stmt_list(ast, ast.list(id)),
            AstKind::VarDec => {
                self.gen_var_dec(ast, id);
                Ok(())
            }
            AstKind::FunDec | AstKind::FunGet | AstKind::FunSet => self.gen_fun(ast, id),
            AstKind::VarAssign => self.gen_var_assign(ast, id),
            AstKind::Identifier => {
                self.gen_identifier(ast, id);
                Ok(())
            }
            AstKind::Literal => self.gen_literal(ast, id),
            AstKind::Type => self.gen_type(ast, id),
            AstKind::Return => self.gen_return(ast, id),
            AstKind::Expression | AstKind::Operator => self.gen_operator(ast, id),
            AstKind::FunCall => self.gen_fun_call(ast, id),
            AstKind::Ifj => self.gen_ifj(ast, id),
            AstKind::IfStmt | AstKind::IfElseStmt => self.gen_if_chain(ast, &[id], None),
            AstKind::ElseStmt => match ast.right(id) {
                Some(body) => self.gen_node(ast, body),
                None => Ok(()),
            },
            AstKind::While => self.gen_while(ast, id),
            AstKind::Params => Ok(()),
        }
    }

    /// Emits the program skeleton around the class members.
    ///
    /// ```text
    /// .IFJcode25
    /// JUMP $$main_entry
    /// <function bodies>
    /// LABEL $$main_entry
    /// <DEFVAR + MOVE nil for each global var>
    /// CALL main$0
    /// EXIT int@0
    /// ```
    fn gen_class(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        emit!(self, ".IFJcode25");
        emit!(self, "JUMP $$main_entry");

        for member in ast.list(id) {
            if matches!(
                ast.node(*member).kind,
                AstKind::FunDec | AstKind::FunGet | AstKind::FunSet
            ) {
                self.gen_node(ast, *member)?;
            }
        }

        emit!(self, "");
        emit!(self, "LABEL $$main_entry");

        for symbol in self.scopes.global().iter() {
            if symbol.kind == SymbolKind::Var {
                emit!(self, "DEFVAR GF@{}", symbol.name);
                emit!(self, "MOVE GF@{} nil@nil", symbol.name);
            }
        }

        for member in ast.list(id) {
            if !matches!(
                ast.node(*member).kind,
                AstKind::FunDec | AstKind::FunGet | AstKind::FunSet | AstKind::VarDec
            ) {
                self.gen_node(ast, *member)?;
            }
        }

        emit!(self, "CALL main$0");
        emit!(self, "EXIT int@0");
        Ok(())
    }

    /// Emits a function, getter or setter body.
    ///
    /// Callers push arguments left to right; parameters pop in reverse
    /// source order into freshly defined locals. The default tail pushes nil
    /// so a caller always finds a return value on the operand stack.
    fn gen_fun(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        let node = ast.node(id);
        let name = node.text().to_string();
        let param_count = ast.left(id).map(|p| ast.list(p).len()).unwrap_or(0);

        let label = match node.kind {
            AstKind::FunGet => format!("{}_get", name),
            AstKind::FunSet => format!("{}_set", name),
            _ => format!("{}${}", name, param_count),
        };

        self.frame_depth += 1;

        emit!(self, "");
        emit!(self, "LABEL {}", label);
        emit!(self, "CREATEFRAME");
        emit!(self, "PUSHFRAME");

        if let Some(params) = ast.left(id) {
            for param in ast.list(params).iter().rev() {
                let param_name = ast.node(*param).text();
                emit!(self, "DEFVAR LF@{}${}", param_name, self.frame_depth);
                emit!(self, "POPS LF@{}${}", param_name, self.frame_depth);
            }
        }

        if let Some(body) = ast.right(id) {
            self.gen_node(ast, body)?;
        }

        emit!(self, "PUSHS nil@nil");
        emit!(self, "POPFRAME");
        emit!(self, "RETURN");

        self.frame_depth -= 1;
        Ok(())
    }

    /// Emits a statement list, merging each `if` with the chained arms that
    /// follow it so at most one arm runs.
    fn gen_stmt_list(&mut self, ast: &Ast, items: &[NodeId]) -> Result<(), GenError> {
        let mut i = 0;
        while i < items.len() {
            match ast.node(items[i]).kind {
                AstKind::IfStmt | AstKind::IfElseStmt => {
                    let mut arms = vec![items[i]];
                    i += 1;
                    while i < items.len() && ast.node(items[i]).kind == AstKind::IfElseStmt {
                        arms.push(items[i]);
                        i += 1;
                    }
                    let mut else_arm = None;
                    if i < items.len() && ast.node(items[i]).kind == AstKind::ElseStmt {
                        else_arm = Some(items[i]);
                        i += 1;
                    }
                    self.gen_if_chain(ast, &arms, else_arm)?;
                }
                _ => {
                    self.gen_node(ast, items[i])?;
                    i += 1;
                }
            }
        }
        Ok(())
    }

    /// Emits storage for a declared variable, initialised to nil.
    fn gen_var_dec(&mut self, ast: &Ast, id: NodeId) {
        let node = ast.node(id);
        let name = node.text();
        if node.token.as_ref().map(|t| t.kind) == Some(TokenKind::GlobalIdent) {
            emit!(self, "MOVE GF@{} nil@nil", name);
        } else {
            emit!(self, "DEFVAR LF@{}${}", name, self.frame_depth);
            emit!(self, "MOVE LF@{}${} nil@nil", name, self.frame_depth);
        }
    }

    /// Emits an assignment: the right side leaves its value on the operand
    /// stack; a setter target turns into `CALL base_set`, anything else pops
    /// into its frame slot.
    fn gen_var_assign(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        let left = ast
            .left(id)
            .ok_or(GenError::MalformedTree("assignment without target"))?;
        let right = ast
            .right(id)
            .ok_or(GenError::MalformedTree("assignment without value"))?;

        self.gen_node(ast, right)?;

        let target = ast.node(left);
        let name = target.text().to_string();
        let is_global = target.token.as_ref().map(|t| t.kind) == Some(TokenKind::GlobalIdent);

        if !is_global
            && self.scopes.find(&name).is_none()
            && self.scopes.find(&mangle(&name, SymbolKind::Set, 1)).is_some()
        {
            emit!(self, "CALL {}_set", name);
        } else if is_global {
            emit!(self, "POPS GF@{}", name);
        } else {
            emit!(self, "POPS LF@{}${}", name, self.frame_depth);
        }
        Ok(())
    }

    /// Emits a value read: getters become `CALL base_get`, everything else
    /// pushes the frame slot.
    pub(crate) fn gen_identifier(&mut self, ast: &Ast, id: NodeId) {
        let node = ast.node(id);
        let name = node.text().to_string();

        if node.token.as_ref().map(|t| t.kind) == Some(TokenKind::GlobalIdent) {
            emit!(self, "PUSHS GF@{}", name);
            return;
        }

        if self.scopes.find(&name).is_none()
            && self.scopes.find(&mangle(&name, SymbolKind::Get, 0)).is_some()
        {
            emit!(self, "CALL {}_get", name);
            return;
        }

        emit!(self, "PUSHS LF@{}${}", name, self.frame_depth);
    }

    /// The operand rendering of a literal token.
    pub(crate) fn literal_operand(&self, token: &Token) -> Result<String, GenError> {
        match token.kind {
            TokenKind::IntLit => match token.value {
                ifjc_lex::TokenValue::Int(v) => Ok(format!("int@{}", v)),
                _ => Err(GenError::MalformedTree("int literal without payload")),
            },
            TokenKind::FloatLit => match token.value {
                ifjc_lex::TokenValue::Float(v) => Ok(format!("float@{}", hex_float(v))),
                _ => Err(GenError::MalformedTree("float literal without payload")),
            },
            TokenKind::StrLit | TokenKind::MultilineStrLit => {
                Ok(format!("string@{}", escape_string(token.text())))
            }
            TokenKind::KwTrue => Ok("bool@true".to_string()),
            TokenKind::KwFalse => Ok("bool@false".to_string()),
            TokenKind::KwNull => Ok("nil@nil".to_string()),
            kind => Err(GenError::UnknownLiteral(kind.to_string())),
        }
    }

    /// Pushes a literal value.
    pub(crate) fn gen_literal(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        let token = ast
            .node(id)
            .token
            .as_ref()
            .ok_or(GenError::MalformedTree("literal without token"))?;
        let operand = self.literal_operand(token)?;
        emit!(self, "PUSHS {}", operand);
        Ok(())
    }

    /// Pushes the type-name string a type keyword compares against; `Num`
    /// stands for the float/int pair and is special-cased by `is`.
    fn gen_type(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        match ast.node(id).token.as_ref().map(|t| t.kind) {
            Some(TokenKind::KwTypeNum) => emit!(self, "PUSHS string@float"),
            Some(TokenKind::KwTypeString) => emit!(self, "PUSHS string@string"),
            Some(TokenKind::KwTypeBool) => emit!(self, "PUSHS string@bool"),
            Some(TokenKind::KwTypeNull) | Some(TokenKind::KwNull) => {
                emit!(self, "PUSHS string@nil")
            }
            _ => return Err(GenError::MalformedTree("type node without type keyword")),
        }
        Ok(())
    }

    /// Emits a return: value (or nil) on the stack, then frame teardown.
    fn gen_return(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        match ast.right(id) {
            Some(expr) => self.gen_node(ast, expr)?,
            None => emit!(self, "PUSHS nil@nil"),
        }
        emit!(self, "POPFRAME");
        emit!(self, "RETURN");
        Ok(())
    }

    /// Emits a call: arguments pushed left to right, then `CALL name$argc`.
    fn gen_fun_call(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        let mut argc = 0;
        if let Some(args) = ast.right(id) {
            for arg in ast.list(args) {
                self.gen_node(ast, *arg)?;
                argc += 1;
            }
        }
        emit!(self, "CALL {}${}", ast.node(id).text(), argc);
        Ok(())
    }

    /// Emits an if chain. Each conditional arm evaluates its condition, pops
    /// it into a scoped temporary and falls through to the next arm when the
    /// value is `bool@false` or `nil@nil`; both count as false.
    fn gen_if_chain(
        &mut self,
        ast: &Ast,
        arms: &[NodeId],
        else_arm: Option<NodeId>,
    ) -> Result<(), GenError> {
        let end = self.unique_label("if_end");

        emit!(self, "# if chain");
        for arm in arms {
            let cond = ast
                .left(*arm)
                .ok_or(GenError::MalformedTree("if without condition"))?;
            let body = ast
                .right(*arm)
                .ok_or(GenError::MalformedTree("if without body"))?;

            let skip = self.unique_label("if_skip");
            self.gen_node(ast, cond)?;

            emit!(self, "CREATEFRAME");
            emit!(self, "PUSHFRAME");
            let tmp = self.temp_var();
            emit!(self, "DEFVAR LF@{}${}", tmp, self.frame_depth);
            emit!(self, "POPS LF@{}${}", tmp, self.frame_depth);
            emit!(self, "JUMPIFEQ {} LF@{}${} bool@false", skip, tmp, self.frame_depth);
            emit!(self, "JUMPIFEQ {} LF@{}${} nil@nil", skip, tmp, self.frame_depth);
            emit!(self, "POPFRAME");

            self.gen_node(ast, body)?;
            emit!(self, "JUMP {}", end);

            emit!(self, "LABEL {}", skip);
            emit!(self, "POPFRAME");
        }

        if let Some(else_arm) = else_arm {
            if let Some(body) = ast.right(else_arm) {
                self.gen_node(ast, body)?;
            }
        }

        emit!(self, "LABEL {}", end);
        Ok(())
    }

    /// Emits a while loop. The condition temporary is defined once, before
    /// the loop label, so re-entering the loop does not redefine it.
    fn gen_while(&mut self, ast: &Ast, id: NodeId) -> Result<(), GenError> {
        let cond = ast
            .left(id)
            .ok_or(GenError::MalformedTree("while without condition"))?;
        let body = ast
            .right(id)
            .ok_or(GenError::MalformedTree("while without body"))?;

        let start = self.unique_label("while_start");
        let end = self.unique_label("while_end");
        let tmp = self.temp_var();

        emit!(self, "# while loop");
        emit!(self, "DEFVAR LF@{}${}", tmp, self.frame_depth);
        emit!(self, "LABEL {}", start);

        self.gen_node(ast, cond)?;
        emit!(self, "POPS LF@{}${}", tmp, self.frame_depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} bool@false", end, tmp, self.frame_depth);
        emit!(self, "JUMPIFEQ {} LF@{}${} nil@nil", end, tmp, self.frame_depth);

        self.gen_node(ast, body)?;
        emit!(self, "JUMP {}", start);
        emit!(self, "LABEL {}", end);
        Ok(())
    }
}
