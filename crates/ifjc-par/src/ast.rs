//! Abstract syntax tree.
//!
//! Nodes live in an arena ([`Ast`]) and refer to each other by [`NodeId`].
//! Ids are plain typed indices, so the deferred-resolution list can hold
//! references into the tree without owning any part of it.
//!
//! Children come in two layout shapes plus leaves: binary nodes carry an
//! ordered (left, right) pair where either side may be absent; the class
//! root, blocks and parameter lists carry an ordered sequence.

use std::fmt::Write;

use ifjc_lex::{Token, TokenValue};
use ifjc_sym::TypeMask;
use ifjc_util::{define_idx, IndexVec};

define_idx!(
    /// Index of a node in the [`Ast`] arena.
    pub NodeId
);

/// Node tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AstKind {
    ClassDec,
    VarDec,
    VarAssign,
    Return,
    Literal,
    Type,
    Identifier,
    Expression,
    FunDec,
    FunSet,
    FunGet,
    FunCall,
    IfStmt,
    IfElseStmt,
    ElseStmt,
    While,
    Ifj,
    Block,
    Params,
    Operator,
}

impl AstKind {
    /// Children layout for this tag.
    fn shape(self) -> Children {
        match self {
            AstKind::ClassDec | AstKind::Block | AstKind::Params => Children::List(Vec::new()),
            AstKind::Literal | AstKind::Type | AstKind::Identifier => Children::Leaf,
            _ => Children::Pair {
                left: None,
                right: None,
            },
        }
    }
}

/// Children of a node; the shape is fixed by the node's kind.
#[derive(Clone, Debug)]
pub enum Children {
    Leaf,
    Pair {
        left: Option<NodeId>,
        right: Option<NodeId>,
    },
    List(Vec<NodeId>),
}

/// One AST node: tag, source token, static type mask and children.
#[derive(Clone, Debug)]
pub struct AstNode {
    pub kind: AstKind,
    /// The token the node was built from; absent for structural nodes.
    pub token: Option<Token>,
    /// Statically possible runtime types of the node's value.
    pub ty: TypeMask,
    pub children: Children,
}

impl AstNode {
    /// Source line of the node's token (0 when the node has none).
    pub fn line(&self) -> u32 {
        self.token.as_ref().map(|t| t.line).unwrap_or(0)
    }

    /// Identifier or string payload of the node's token.
    pub fn text(&self) -> &str {
        self.token.as_ref().map(|t| t.text()).unwrap_or("")
    }
}

/// The tree arena. Node 0 is whatever was allocated first; the root id is
/// returned by the parser.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: IndexVec<NodeId, AstNode>,
}

impl Ast {
    pub fn new() -> Self {
        Self {
            nodes: IndexVec::new(),
        }
    }

    /// Allocates a node with the children shape of its kind.
    pub fn alloc(&mut self, kind: AstKind, token: Option<Token>) -> NodeId {
        self.nodes.push(AstNode {
            kind,
            token,
            ty: TypeMask::UNKNOWN,
            children: kind.shape(),
        })
    }

    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Left child of a pair-shaped node.
    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        match &self.nodes[id].children {
            Children::Pair { left, .. } => *left,
            _ => None,
        }
    }

    /// Right child of a pair-shaped node.
    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        match &self.nodes[id].children {
            Children::Pair { right, .. } => *right,
            _ => None,
        }
    }

    pub fn set_left(&mut self, id: NodeId, child: NodeId) {
        if let Children::Pair { left, .. } = &mut self.nodes[id].children {
            *left = Some(child);
        }
    }

    pub fn set_right(&mut self, id: NodeId, child: NodeId) {
        if let Children::Pair { right, .. } = &mut self.nodes[id].children {
            *right = Some(child);
        }
    }

    /// Children of a list-shaped node (empty slice otherwise).
    pub fn list(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id].children {
            Children::List(items) => items,
            _ => &[],
        }
    }

    pub fn list_push(&mut self, id: NodeId, child: NodeId) {
        if let Children::List(items) = &mut self.nodes[id].children {
            items.push(child);
        }
    }

    /// Renders the subtree under `id` for debug output.
    pub fn dump(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(id, 0, &mut out);
        out
    }

    fn dump_into(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        for _ in 0..depth {
            out.push_str("  ");
        }
        let _ = write!(out, "{:?}", node.kind);
        if let Some(token) = &node.token {
            match &token.value {
                TokenValue::None => {
                    let _ = write!(out, " {}", token.kind);
                }
                value => {
                    let _ = write!(out, " {}", value);
                }
            }
        }
        let _ = writeln!(out, " [{}]", node.ty);

        match &node.children {
            Children::Leaf => {}
            Children::Pair { left, right } => {
                if let Some(left) = left {
                    self.dump_into(*left, depth + 1, out);
                }
                if let Some(right) = right {
                    self.dump_into(*right, depth + 1, out);
                }
            }
            Children::List(items) => {
                for item in items {
                    self.dump_into(*item, depth + 1, out);
                }
            }
        }
    }
}
