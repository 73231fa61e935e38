//! Statement parsing: blocks, declarations, assignments, control flow and
//! calls.

use ifjc_lex::TokenKind;
use ifjc_sym::{mangle, Symbol, SymbolKind, TypeMask};
use ifjc_util::{CompileError, CompileResult};

use crate::ast::{AstKind, NodeId};
use crate::types;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parses `{ … }`. The line break after `{` is optional; after the
    /// closing `}` a line break is consumed unless `else`, another `}` or the
    /// end of input follows.
    ///
    /// `fun_name` is the mangled name of the enclosing function symbol,
    /// updated by `return` statements.
    pub(crate) fn parse_block(&mut self, fun_name: &str) -> CompileResult<NodeId> {
        self.expect(TokenKind::LCurly, "expected '{'")?;
        if self.peek_kind()? == TokenKind::Eol {
            self.advance()?;
        }

        let node = self.ast.alloc(AstKind::Block, None);
        self.parse_stmt_list(node, fun_name)?;

        self.expect(TokenKind::RCurly, "expected '}' closing the block")?;

        match self.peek_kind()? {
            TokenKind::Eol => {
                self.advance()?;
            }
            TokenKind::KwElse | TokenKind::RCurly | TokenKind::Eof => {}
            _ => {
                let token = self.peek_token()?;
                return Err(self.syntax_error_at("expected end of line after '}'", &token));
            }
        }

        Ok(node)
    }

    /// Parses statements until the closing `}` of the current block.
    fn parse_stmt_list(&mut self, block: NodeId, fun_name: &str) -> CompileResult<()> {
        loop {
            let node = match self.peek_kind()? {
                TokenKind::RCurly | TokenKind::Eof => break,
                TokenKind::KwIfj => self.parse_ifj()?,
                TokenKind::LCurly => {
                    self.scopes.push();
                    let inner = self.parse_block(fun_name)?;
                    self.scopes.pop();
                    inner
                }
                TokenKind::KwReturn => self.parse_return(fun_name)?,
                TokenKind::KwWhile => self.parse_while(fun_name)?,
                TokenKind::KwIf => {
                    self.parse_if_chain(block, fun_name)?;
                    continue;
                }
                TokenKind::KwVar => self.parse_var_dec()?,
                TokenKind::Ident | TokenKind::GlobalIdent => self.parse_var_assign()?,
                _ => {
                    let token = self.peek_token()?;
                    return Err(self.syntax_error_at("expected start of a statement", &token));
                }
            };
            self.ast.list_push(block, node);
        }
        Ok(())
    }

    /// Parses `var IDENT`, installing a NULL-typed variable in the current
    /// scope. Redeclaring the name in the same scope is a redefinition error.
    fn parse_var_dec(&mut self) -> CompileResult<NodeId> {
        self.advance()?; // var
        self.expect(TokenKind::Ident, "expected identifier after 'var'")?;

        let leaf = self.ast.alloc(AstKind::VarDec, Some(self.current.clone()));
        let name = self.current.text().to_string();
        let line = self.current.line;

        if self.scopes.current().find(&name).is_some() {
            return Err(CompileError::redefinition("redefinition of variable", line)
                .with_token(self.current.kind.to_string(), self.current.value.to_string()));
        }
        self.scopes
            .current_mut()
            .insert(Symbol::new(&name, TypeMask::NULL, SymbolKind::Var, 0));

        self.expect(TokenKind::Eol, "expected end of line after variable declaration")?;
        self.ast.node_mut(leaf).ty = TypeMask::NULL;
        Ok(leaf)
    }

    /// Parses `IDENT = …`.
    ///
    /// The right side is an `Ifj.*` call, a named call when `IDENT (`
    /// follows, or a full expression. An unknown non-global target is only
    /// legal when a setter with its name exists; an unknown `__` target is
    /// created in the global scope.
    fn parse_var_assign(&mut self) -> CompileResult<NodeId> {
        self.advance()?;
        let target = self.current.clone();
        let leaf = self.ast.alloc(AstKind::Identifier, Some(target.clone()));
        let node = self.ast.alloc(AstKind::VarAssign, None);
        self.ast.set_left(node, leaf);

        self.expect(TokenKind::Assign, "expected '=' after identifier")?;

        let name = target.text().to_string();
        if self.scopes.find(&name).is_none() {
            if target.kind == TokenKind::GlobalIdent {
                self.scopes
                    .global_mut()
                    .insert(Symbol::new(&name, TypeMask::UNKNOWN, SymbolKind::Var, 0));
            } else if self
                .scopes
                .find(&mangle(&name, SymbolKind::Set, 1))
                .is_none()
            {
                return Err(CompileError::undefined("undefined variable", target.line)
                    .with_token(target.kind.to_string(), target.value.to_string()));
            }
        }

        let right = match self.peek_kind()? {
            TokenKind::KwIfj => self.parse_ifj()?,
            TokenKind::Ident => {
                self.advance()?;
                if self.peek_kind()? == TokenKind::LPar {
                    self.parse_fun_call()?
                } else {
                    self.parse_assign_expr()?
                }
            }
            _ => {
                self.advance()?;
                self.parse_assign_expr()?
            }
        };
        self.ast.set_right(node, right);

        types::semantic_assignment(&mut self.ast, node)?;

        let leaf_ty = self.ast.node(leaf).ty;
        if let Some(symbol) = self.scopes.find_mut(&name) {
            symbol.ty = leaf_ty;
        }

        let right_ty = self.ast.node(right).ty;
        self.ast.node_mut(node).ty = right_ty;
        if right_ty.is_unresolved() {
            self.deferred.push(node);
        }

        Ok(node)
    }

    /// Parses an assignment's expression right side; `current` is the first
    /// expression token. Ends with the terminating line break consumed.
    fn parse_assign_expr(&mut self) -> CompileResult<NodeId> {
        let expr = self
            .parse_expr()?
            .ok_or_else(|| self.syntax_error("assignment is missing an expression"))?;
        self.validate(TokenKind::Eol, "expected end of line after assignment")?;
        types::semantic_expression(&mut self.ast, expr)?;
        Ok(expr)
    }

    /// Parses `return [expression]`, unioning the returned static type into
    /// the enclosing function's symbol. A bare return contributes NULL.
    fn parse_return(&mut self, fun_name: &str) -> CompileResult<NodeId> {
        self.advance()?; // return
        let node = self.ast.alloc(AstKind::Return, Some(self.current.clone()));

        let returned = if self.peek_kind()? == TokenKind::Eol {
            self.advance()?;
            TypeMask::NULL
        } else {
            self.advance()?;
            let expr = self
                .parse_expr()?
                .ok_or_else(|| self.syntax_error("return is missing an expression"))?;
            self.validate(TokenKind::Eol, "expected end of line after return")?;
            types::semantic_expression(&mut self.ast, expr)?;
            self.ast.set_right(node, expr);
            self.ast.node(expr).ty
        };

        if let Some(symbol) = self.scopes.find_mut(fun_name) {
            if symbol.ty.is_unresolved() {
                symbol.ty = returned;
            } else {
                symbol.ty |= returned;
            }
        }

        Ok(node)
    }

    /// Parses a greedy `if` chain: the leading `if`, any number of
    /// `else if` arms and an optional trailing `else`, appending each arm to
    /// the enclosing block as its own statement node.
    fn parse_if_chain(&mut self, block: NodeId, fun_name: &str) -> CompileResult<()> {
        let head = self.parse_if_like(AstKind::IfStmt, fun_name)?;
        self.ast.list_push(block, head);

        while self.peek_kind()? == TokenKind::KwElse {
            self.advance()?; // else
            let arm = if self.peek_kind()? == TokenKind::KwIf {
                self.parse_if_like(AstKind::IfElseStmt, fun_name)?
            } else {
                self.parse_else(fun_name)?
            };
            self.ast.list_push(block, arm);
        }
        Ok(())
    }

    /// Parses `if ( expression ) block`; `kind` distinguishes the chain head
    /// from `else if` arms.
    fn parse_if_like(&mut self, kind: AstKind, fun_name: &str) -> CompileResult<NodeId> {
        self.advance()?; // if
        let node = self.ast.alloc(kind, Some(self.current.clone()));

        self.expect(TokenKind::LPar, "expected '(' after 'if'")?;
        self.advance()?;
        let cond = self
            .parse_expr()?
            .ok_or_else(|| self.syntax_error("if is missing a condition"))?;
        self.validate(TokenKind::RPar, "expected ')' after condition")?;
        types::semantic_expression(&mut self.ast, cond)?;

        self.scopes.push();
        let body = self.parse_block(fun_name)?;
        self.scopes.pop();

        self.ast.set_left(node, cond);
        self.ast.set_right(node, body);
        Ok(node)
    }

    /// Parses the trailing `else block`; the node's left child stays empty.
    fn parse_else(&mut self, fun_name: &str) -> CompileResult<NodeId> {
        let node = self.ast.alloc(AstKind::ElseStmt, Some(self.current.clone()));

        self.scopes.push();
        let body = self.parse_block(fun_name)?;
        self.scopes.pop();

        self.ast.set_right(node, body);
        Ok(node)
    }

    /// Parses `while ( expression ) block`.
    fn parse_while(&mut self, fun_name: &str) -> CompileResult<NodeId> {
        self.advance()?; // while
        let node = self.ast.alloc(AstKind::While, Some(self.current.clone()));

        self.expect(TokenKind::LPar, "expected '(' after 'while'")?;
        self.advance()?;
        let cond = self
            .parse_expr()?
            .ok_or_else(|| self.syntax_error("while is missing a condition"))?;
        self.validate(TokenKind::RPar, "expected ')' after condition")?;
        types::semantic_expression(&mut self.ast, cond)?;

        self.scopes.push();
        let body = self.parse_block(fun_name)?;
        self.scopes.pop();

        self.ast.set_left(node, cond);
        self.ast.set_right(node, body);
        Ok(node)
    }

    /// Parses `Ifj . IDENT ( args )` as a distinct node kind wrapping the
    /// call, so code generation can inline the builtin template instead of
    /// emitting a `CALL`. A line break is tolerated after the dot.
    fn parse_ifj(&mut self) -> CompileResult<NodeId> {
        self.advance()?; // Ifj
        let node = self.ast.alloc(AstKind::Ifj, Some(self.current.clone()));

        self.expect(TokenKind::Dot, "expected '.' after 'Ifj'")?;
        if self.peek_kind()? == TokenKind::Eol {
            self.advance()?;
        }
        self.expect(TokenKind::Ident, "expected builtin name after 'Ifj.'")?;

        let call = self.parse_fun_call()?;
        self.ast.set_right(node, call);
        let call_ty = self.ast.node(call).ty;
        self.ast.node_mut(node).ty = call_ty;
        Ok(node)
    }

    /// Parses `IDENT ( args )` with `current` on the name, through the
    /// terminating line break.
    ///
    /// The call is keyed by `name$argc`; when no such symbol exists yet the
    /// node joins the deferred list for resolution after parsing.
    fn parse_fun_call(&mut self) -> CompileResult<NodeId> {
        self.validate(TokenKind::Ident, "expected function name")?;
        let name_token = self.current.clone();

        self.expect(TokenKind::LPar, "expected '(' after function name")?;

        let node = self.ast.alloc(AstKind::FunCall, Some(name_token.clone()));
        let args = self.parse_arguments()?;
        self.ast.set_right(node, args);

        let argc = self.ast.list(args).len();
        let mangled = mangle(name_token.text(), SymbolKind::Func, argc);
        match self.scopes.find(&mangled) {
            Some(symbol) => self.ast.node_mut(node).ty = symbol.ty,
            None => self.deferred.push(node),
        }

        self.expect(TokenKind::Eol, "expected end of line after call")?;
        Ok(node)
    }

    /// Parses call arguments up to and including the closing `)`.
    ///
    /// Arguments are restricted to atoms: identifiers and literals.
    fn parse_arguments(&mut self) -> CompileResult<NodeId> {
        let node = self.ast.alloc(AstKind::Params, None);

        if self.peek_kind()? == TokenKind::RPar {
            self.advance()?;
            return Ok(node);
        }

        loop {
            self.advance()?;
            let leaf = match self.current.kind {
                TokenKind::Ident | TokenKind::GlobalIdent => {
                    let leaf = self
                        .ast
                        .alloc(AstKind::Identifier, Some(self.current.clone()));
                    self.annotate_identifier(leaf)?;
                    leaf
                }
                TokenKind::IntLit
                | TokenKind::FloatLit
                | TokenKind::StrLit
                | TokenKind::MultilineStrLit
                | TokenKind::KwNull
                | TokenKind::KwTrue
                | TokenKind::KwFalse => {
                    let leaf = self.ast.alloc(AstKind::Literal, Some(self.current.clone()));
                    self.annotate_literal(leaf);
                    leaf
                }
                _ => return Err(self.syntax_error("invalid call argument")),
            };
            self.ast.list_push(node, leaf);

            match self.peek_kind()? {
                TokenKind::Comma => {
                    self.advance()?;
                }
                TokenKind::RPar => {
                    self.advance()?;
                    break;
                }
                _ => {
                    let token = self.peek_token()?;
                    return Err(
                        self.syntax_error_at("expected ',' or ')' in argument list", &token)
                    );
                }
            }
        }

        Ok(node)
    }
}
