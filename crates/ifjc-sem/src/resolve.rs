//! Deferred-reference resolution.
//!
//! During parsing, calls whose callee is not yet declared and assignments
//! whose right side still has an unresolved type are queued by node id. Once
//! the whole class has parsed, every declaration is in the global scope and
//! the queued nodes can be given their final meaning.

use ifjc_par::{types, Ast, AstKind, NodeId};
use ifjc_sym::{mangle, ScopeStack, Symbol, SymbolKind, TypeMask};
use ifjc_util::{CompileError, CompileResult};

/// Resolves every node queued during parsing, in queue order.
///
/// Resolution is idempotent: re-running it over an already resolved tree
/// leaves all type masks unchanged.
pub fn resolve_deferred(
    ast: &mut Ast,
    deferred: &[NodeId],
    scopes: &mut ScopeStack,
) -> CompileResult<()> {
    for id in deferred {
        resolve_node(ast, *id, scopes)?;
    }
    Ok(())
}

/// Recursively resolves one queued subtree.
fn resolve_node(ast: &mut Ast, id: NodeId, scopes: &mut ScopeStack) -> CompileResult<()> {
    match ast.node(id).kind {
        AstKind::FunCall => resolve_call(ast, id, scopes),

        AstKind::VarAssign => {
            let left = ast
                .left(id)
                .ok_or_else(|| CompileError::internal("assignment without target"))?;
            let right = ast
                .right(id)
                .ok_or_else(|| CompileError::internal("assignment without right side"))?;

            resolve_node(ast, right, scopes)?;

            if ast.node(left).ty == TypeMask::UNKNOWN {
                let right_ty = ast.node(right).ty;
                ast.node_mut(left).ty = right_ty;

                if ast.node(left).kind == AstKind::Identifier {
                    let name = ast.node(left).text().to_string();
                    if scopes.find(&name).is_some() {
                        if let Some(symbol) = scopes.find_mut(&name) {
                            symbol.ty = right_ty;
                        }
                    } else {
                        // The defining scope is gone by now (locals die with
                        // their block); park the symbol in the resolution
                        // scope so later queue entries can still see it.
                        scopes
                            .current_mut()
                            .insert(Symbol::new(&name, right_ty, SymbolKind::Var, 0));
                    }
                }
            }

            types::semantic_assignment(ast, id)?;
            let left_ty = ast.node(left).ty;
            ast.node_mut(id).ty = left_ty;
            Ok(())
        }

        AstKind::Expression => {
            let left = ast.left(id);
            let right = ast.right(id);
            if let Some(left) = left {
                resolve_node(ast, left, scopes)?;
            }
            if let Some(right) = right {
                resolve_node(ast, right, scopes)?;
            }
            // Re-run the binary rules with the now-known operand types.
            types::semantic_expression(ast, id)
        }

        AstKind::Identifier => {
            let name = ast.node(id).text().to_string();
            if let Some(symbol) = scopes.find(&name) {
                let ty = symbol.ty;
                ast.node_mut(id).ty = ty;
            }
            Ok(())
        }

        AstKind::Ifj => {
            if let Some(right) = ast.right(id) {
                resolve_node(ast, right, scopes)?;
                let ty = ast.node(right).ty;
                ast.node_mut(id).ty = ty;
            }
            Ok(())
        }

        _ => Ok(()),
    }
}

/// Resolves one call node against the (now complete) global scope.
///
/// The lookup ladder: exact `base$arity`, getter, setter-as-call error,
/// same-base overload with a different arity, undefined function.
fn resolve_call(ast: &mut Ast, id: NodeId, scopes: &ScopeStack) -> CompileResult<()> {
    let node = ast.node(id);
    let name = node.text().to_string();
    let line = node.line();

    let args: Vec<NodeId> = match ast.right(id) {
        Some(params) => ast.list(params).to_vec(),
        None => Vec::new(),
    };
    let argc = args.len();

    if let Some(exact) = scopes.find(&mangle(&name, SymbolKind::Func, argc)) {
        let param_types = exact.param_types.clone();
        let result = exact.ty;

        for (arg, expected) in args.iter().zip(param_types) {
            let got = ast.node(*arg).ty;
            if !expected.intersects(got) && expected != TypeMask::UNKNOWN {
                let arg_node = ast.node(*arg);
                return Err(CompileError::arg_mismatch(
                    format!("invalid argument type for '{}'", name),
                    arg_node.line(),
                ));
            }
        }

        ast.node_mut(id).ty = result;
        return Ok(());
    }

    if let Some(getter) = scopes.find(&mangle(&name, SymbolKind::Get, 0)) {
        if argc != 0 {
            return Err(CompileError::arg_mismatch(
                format!("getter '{}' cannot take arguments", name),
                line,
            ));
        }
        let ty = getter.ty;
        ast.node_mut(id).ty = ty;
        return Ok(());
    }

    if scopes.find(&mangle(&name, SymbolKind::Set, 1)).is_some() {
        return Err(CompileError::type_mismatch(
            format!("setter '{}' cannot be called as a function", name),
            line,
        ));
    }

    if has_overload_with_other_arity(scopes, &name) {
        return Err(CompileError::arg_mismatch(
            format!("wrong number of arguments for '{}'", name),
            line,
        ));
    }

    Err(CompileError::undefined(
        format!("call to undefined function '{}'", name),
        line,
    ))
}

/// Whether some callable with the same base name exists in the global scope.
fn has_overload_with_other_arity(scopes: &ScopeStack, base: &str) -> bool {
    scopes.global().iter().any(|symbol| {
        symbol.kind.is_callable()
            && symbol
                .name
                .split_once(['$', '#'])
                .is_some_and(|(stem, _)| stem == base)
    })
}

/// After resolution, every callable in the global scope must have reached
/// its definition site.
pub fn check_declared(scopes: &ScopeStack) -> CompileResult<()> {
    for symbol in scopes.global().iter() {
        if symbol.kind.is_callable() && !symbol.declared {
            return Err(CompileError::undefined(
                format!("'{}' is referenced but never defined", symbol.name),
                0,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifjc_lex::Lexer;
    use ifjc_par::Parser;

    /// Parses a program with a bare global scope and resolves its deferred
    /// list, returning the tree, the queue and the scope stack.
    fn parse_and_resolve(source: &str) -> CompileResult<(Ast, Vec<NodeId>, ScopeStack)> {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let mut parser = Parser::new(Lexer::new(source), &mut scopes);
        parser.parse_program()?;
        let mut ast = parser.ast;
        let deferred = parser.deferred;
        scopes.push();
        resolve_deferred(&mut ast, &deferred, &mut scopes)?;
        check_declared(&scopes)?;
        scopes.pop();
        Ok((ast, deferred, scopes))
    }

    #[test]
    fn test_forward_reference_resolves() {
        let source = "class Main {\n static main() {\n var x\n x = g(1)\n }\n static g(a) {\n return a\n }\n}\n";
        let (ast, deferred, _) = parse_and_resolve(source).unwrap();
        assert!(!deferred.is_empty());
        for id in &deferred {
            assert!(
                !ast.node(*id).ty.is_unresolved() || ast.node(*id).ty != TypeMask::UNKNOWN,
                "deferred node left unresolved"
            );
        }
    }

    #[test]
    fn test_forward_reference_type_is_stamped() {
        // g returns its parameter (unknown) unioned with nothing else, so the
        // call site ends up carrying the parameter's mask.
        let source = "class Main {\n static main() {\n var x\n x = g(1)\n }\n static g(a) {\n return 1\n }\n}\n";
        let (ast, deferred, _) = parse_and_resolve(source).unwrap();
        let call = deferred
            .iter()
            .find(|id| ast.node(**id).kind == AstKind::FunCall)
            .copied();
        if let Some(call) = call {
            assert!(ast.node(call).ty.contains(TypeMask::INT));
        }
    }

    #[test]
    fn test_undefined_function_is_error() {
        let source = "class Main {\n static main() {\n var x\n x = g(1)\n }\n}\n";
        let err = parse_and_resolve(source).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_wrong_arity_is_arg_error() {
        let source =
            "class Main {\n static main() {\n var x\n x = g(1, 2)\n }\n static g(a) {\n return a\n }\n}\n";
        let err = parse_and_resolve(source).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_setter_called_as_function_is_error() {
        let source = "class Main {\n static s = (v) {\n }\n static main() {\n var x\n x = s(1)\n }\n}\n";
        let err = parse_and_resolve(source).unwrap_err();
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_argument_mask_check() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let mut length = Symbol::new("length", TypeMask::INT, SymbolKind::Func, 1);
        length.declared = true;
        length.param_types[0] = TypeMask::STRING | TypeMask::UNKNOWN;
        scopes.global_mut().insert(length);

        let source = "class Main {\n static main() {\n var x\n x = length(1)\n }\n}\n";
        let mut parser = Parser::new(Lexer::new(source), &mut scopes);
        // The call resolves at parse time (symbol exists), so the deferred
        // queue holds nothing; re-checking the same ladder must reject the
        // int argument.
        parser.parse_program().unwrap();
        let mut ast = parser.ast;
        let calls: Vec<NodeId> = (0..ast.len())
            .map(|i| NodeId(i as u32))
            .filter(|id| ast.node(*id).kind == AstKind::FunCall)
            .collect();
        scopes.push();
        let result = resolve_deferred(&mut ast, &calls, &mut scopes);
        assert_eq!(result.unwrap_err().exit_code(), 5);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let source = "class Main {\n static main() {\n var x\n x = g(1)\n }\n static g(a) {\n return 1\n }\n}\n";
        let mut scopes = ScopeStack::new();
        scopes.push();
        let mut parser = Parser::new(Lexer::new(source), &mut scopes);
        parser.parse_program().unwrap();
        let mut ast = parser.ast;
        let deferred = parser.deferred;

        scopes.push();
        resolve_deferred(&mut ast, &deferred, &mut scopes).unwrap();
        let first: Vec<TypeMask> = (0..ast.len()).map(|i| ast.node(NodeId(i as u32)).ty).collect();

        resolve_deferred(&mut ast, &deferred, &mut scopes).unwrap();
        let second: Vec<TypeMask> = (0..ast.len()).map(|i| ast.node(NodeId(i as u32)).ty).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_check_declared_flags_phantom_functions() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let phantom = Symbol::new("ghost", TypeMask::UNKNOWN, SymbolKind::Func, 0);
        scopes.global_mut().insert(phantom);
        let err = check_declared(&scopes).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
