//! Class and static-member declarations.

use ifjc_lex::TokenKind;
use ifjc_sym::{Symbol, SymbolKind, TypeMask};
use ifjc_util::CompileResult;

use crate::ast::{AstKind, NodeId};
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parses `class IDENT { static-decl* }`.
    pub(crate) fn parse_class_dec(&mut self) -> CompileResult<NodeId> {
        self.expect(TokenKind::KwClass, "expected 'class'")?;
        self.expect(TokenKind::Ident, "expected class name")?;

        let class_node = self
            .ast
            .alloc(AstKind::ClassDec, Some(self.current.clone()));

        self.expect(TokenKind::LCurly, "expected '{' after class name")?;
        if self.peek_kind()? == TokenKind::Eol {
            self.advance()?;
        }

        while self.peek_kind()? == TokenKind::KwStatic {
            let member = self.parse_fun_dec()?;
            self.ast.list_push(class_node, member);
        }

        self.expect(TokenKind::RCurly, "expected '}' closing the class body")?;

        Ok(class_node)
    }

    /// Parses one static member: function, setter or getter.
    ///
    /// ```text
    /// static name ( params ) block      function
    /// static name = ( param ) block     setter, exactly one parameter
    /// static name block                 getter
    /// ```
    ///
    /// The symbol is installed in the global scope under its mangled name
    /// before the body parses, so directly recursive calls resolve.
    pub(crate) fn parse_fun_dec(&mut self) -> CompileResult<NodeId> {
        self.expect(TokenKind::KwStatic, "expected 'static'")?;
        self.expect(TokenKind::Ident, "expected member name after 'static'")?;

        let name_token = self.current.clone();
        let node = self.ast.alloc(AstKind::FunDec, Some(name_token.clone()));

        let mut params = None;
        let kind = match self.peek_kind()? {
            TokenKind::LPar => {
                params = Some(self.parse_params()?);
                AstKind::FunDec
            }
            TokenKind::Assign => {
                self.advance()?;
                let list = self.parse_params()?;
                if self.ast.list(list).len() != 1 {
                    return Err(self.syntax_error_at(
                        "setter takes exactly one parameter",
                        &name_token,
                    ));
                }
                params = Some(list);
                AstKind::FunSet
            }
            TokenKind::LCurly => AstKind::FunGet,
            _ => {
                let token = self.peek_token()?;
                return Err(self.syntax_error_at(
                    "expected '(', '=' or '{' after member name",
                    &token,
                ));
            }
        };

        self.ast.node_mut(node).kind = kind;
        if let Some(params) = params {
            self.ast.set_left(node, params);
        }

        let sym_kind = match kind {
            AstKind::FunSet => SymbolKind::Set,
            AstKind::FunGet => SymbolKind::Get,
            _ => SymbolKind::Func,
        };
        let param_count = params.map(|p| self.ast.list(p).len()).unwrap_or(0);

        let mut symbol = Symbol::new(name_token.text(), TypeMask::NULL, sym_kind, param_count);
        symbol.declared = true;
        let mangled = symbol.name.clone();

        match self.scopes.find(&mangled).map(|found| found.declared) {
            Some(true) => {
                return Err(ifjc_util::CompileError::redefinition(
                    "conflicting declaration",
                    name_token.line,
                )
                .with_token(name_token.kind.to_string(), name_token.value.to_string()));
            }
            Some(false) => {
                if let Some(found) = self.scopes.find_mut(&mangled) {
                    found.declared = true;
                }
            }
            None => self.scopes.global_mut().insert(symbol),
        }

        // Parameters live in the body scope under their source names.
        self.scopes.push();
        if let Some(params) = params {
            for param in self.ast.list(params).to_vec() {
                let param_node = self.ast.node(param);
                let param_name = param_node.text().to_string();
                let line = param_node.line();
                if self.scopes.current().find(&param_name).is_some() {
                    return Err(ifjc_util::CompileError::redefinition(
                        "redefinition of parameter",
                        line,
                    ));
                }
                self.scopes
                    .current_mut()
                    .insert(Symbol::new(&param_name, TypeMask::UNKNOWN, SymbolKind::Param, 0));
            }
        }

        let body = self.parse_block(&mangled)?;
        self.ast.set_right(node, body);

        let fun_ty = self.scopes.find(&mangled).map(|symbol| symbol.ty);
        if let Some(ty) = fun_ty {
            self.ast.node_mut(node).ty = ty;
        }

        self.scopes.pop();

        Ok(node)
    }

    /// Parses `( IDENT , IDENT , … )`, possibly empty.
    pub(crate) fn parse_params(&mut self) -> CompileResult<NodeId> {
        let node = self.ast.alloc(AstKind::Params, None);

        self.expect(TokenKind::LPar, "expected '('")?;

        if self.peek_kind()? == TokenKind::RPar {
            self.advance()?;
            return Ok(node);
        }

        loop {
            self.expect(TokenKind::Ident, "expected parameter name")?;
            let leaf = self
                .ast
                .alloc(AstKind::Identifier, Some(self.current.clone()));
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
                        self.syntax_error_at("expected ',' or ')' in parameter list", &token)
                    );
                }
            }
        }

        Ok(node)
    }
}
