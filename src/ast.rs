//! Abstract syntax tree for the bC compiler.
//!
//! Nodes live in a flattened arena ([`Ast`]) and reference each other through
//! [`NodeRef`] indices, so declaration links from uses never dangle and the
//! analyzer can annotate nodes without fighting ownership. Every node carries
//! up to three ordered children plus a `sibling` link; sibling chains form
//! statement lists, declaration lists, and argument lists.

use std::fmt::Write as _;
use std::num::NonZeroU32;

use crate::lexer::{Token, TokenKind};

/// Interned identifier, shared process-wide.
pub type Symbol = symbol_table::GlobalSymbol;

/// Index of a node inside the [`Ast`] arena (1-based).
pub type NodeRef = NonZeroU32;

/// Expression/value types of bC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpType {
    Void,
    Integer,
    Boolean,
    Char,
    /// Sentinel produced by unresolved names; downstream checks skip it.
    Undefined,
}

/// Where a variable's storage lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    None,
    Local,
    Global,
    Parameter,
    LocalStatic,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::None => "None",
            VarKind::Local => "Local",
            VarKind::Global => "Global",
            VarKind::Parameter => "Parameter",
            VarKind::LocalStatic => "LocalStatic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Func,
    Param,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtKind {
    If,
    While,
    For,
    Compound,
    Return,
    Break,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpKind {
    Assign,
    Call,
    Constant,
    Id,
    Op,
}

/// Node tag: the three node families and their sub-kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Decl(DeclKind),
    Stmt(StmtKind),
    Exp(ExpKind),
}

/// Token-derived attributes of a node.
#[derive(Debug, Clone, Default)]
pub struct Attr {
    /// Token class, used to classify operators and assignments.
    pub op: Option<TokenKind>,
    /// Identifier or token text.
    pub name: Option<Symbol>,
    /// Integer or boolean literal value.
    pub value: i32,
    /// Character literal value.
    pub cvalue: u8,
    /// String literal payload.
    pub string: Option<Symbol>,
}

/// One AST node. Created by the parser, annotated by the semantic analyzer.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub child: [Option<NodeRef>; 3],
    pub sibling: Option<NodeRef>,
    /// Source line; -1 marks library-synthesized nodes.
    pub lineno: i32,
    pub attr: Attr,
    pub exp_type: ExpType,
    pub is_static: bool,
    pub is_array: bool,
    pub is_const: bool,
    pub is_used: bool,
    pub is_assigned: bool,
    /// Storage slots: scalars are 1, arrays are element count + 1.
    pub size: i32,
    /// Frame/global offset for variables, entry address for functions.
    pub offset: i32,
    pub var_kind: VarKind,
}

impl Node {
    fn new(kind: NodeKind, token: Option<&Token>, children: [Option<NodeRef>; 3]) -> Self {
        let mut attr = Attr::default();
        let mut lineno = -1;
        if let Some(token) = token {
            lineno = token.lineno;
            attr.op = Some(token.kind);
            attr.name = Some(token.text);
            attr.value = token.ivalue;
            attr.cvalue = token.cvalue;
            attr.string = token.svalue.as_deref().map(Symbol::from);
        }
        Node {
            kind,
            child: children,
            sibling: None,
            lineno,
            attr,
            exp_type: ExpType::Undefined,
            is_static: false,
            is_array: false,
            is_const: false,
            is_used: false,
            is_assigned: false,
            size: 1,
            offset: 0,
            var_kind: VarKind::None,
        }
    }

    /// Identifier text, or the token text for operator nodes.
    pub fn name(&self) -> Symbol {
        self.attr.name.unwrap_or_else(|| Symbol::from(""))
    }
}

/// Render an expression type the way diagnostics spell it.
pub fn type_to_str(exp_type: ExpType, is_static: bool, is_array: bool) -> String {
    let type_name = match exp_type {
        ExpType::Void => "type void",
        ExpType::Integer => "type int",
        ExpType::Boolean => "type bool",
        ExpType::Char => "type char",
        ExpType::Undefined => "type UndefinedType",
    };
    format!(
        "{}{}{}",
        if is_static { "static " } else { "" },
        if is_array { "array of " } else { "" },
        type_name
    )
}

/// Flattened node storage. The root is the head of the top-level sibling
/// chain of declarations.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, r: NodeRef) -> &Node {
        &self.nodes[r.get() as usize - 1]
    }

    pub fn node_mut(&mut self, r: NodeRef) -> &mut Node {
        &mut self.nodes[r.get() as usize - 1]
    }

    fn push(&mut self, node: Node) -> NodeRef {
        self.nodes.push(node);
        NodeRef::new(self.nodes.len() as u32).expect("node arena overflow")
    }

    /// Create a declaration node.
    pub fn new_decl(
        &mut self,
        kind: DeclKind,
        exp_type: ExpType,
        token: Option<&Token>,
        c0: Option<NodeRef>,
        c1: Option<NodeRef>,
        c2: Option<NodeRef>,
    ) -> NodeRef {
        let mut node = Node::new(NodeKind::Decl(kind), token, [c0, c1, c2]);
        node.exp_type = exp_type;
        self.push(node)
    }

    /// Create a statement node.
    pub fn new_stmt(
        &mut self,
        kind: StmtKind,
        token: Option<&Token>,
        c0: Option<NodeRef>,
        c1: Option<NodeRef>,
        c2: Option<NodeRef>,
    ) -> NodeRef {
        self.push(Node::new(NodeKind::Stmt(kind), token, [c0, c1, c2]))
    }

    /// Create an expression node.
    pub fn new_exp(
        &mut self,
        kind: ExpKind,
        token: Option<&Token>,
        c0: Option<NodeRef>,
        c1: Option<NodeRef>,
        c2: Option<NodeRef>,
    ) -> NodeRef {
        self.push(Node::new(NodeKind::Exp(kind), token, [c0, c1, c2]))
    }

    /// Append `s` to the end of `t`'s sibling chain and return the head.
    pub fn add_sibling(&mut self, t: Option<NodeRef>, s: Option<NodeRef>) -> Option<NodeRef> {
        let Some(s) = s else { return t };
        let Some(t) = t else { return Some(s) };
        let mut tail = t;
        while let Some(next) = self.node(tail).sibling {
            tail = next;
        }
        self.node_mut(tail).sibling = Some(s);
        Some(t)
    }

    /// Apply a type and static flag to a whole sibling chain of declarations.
    pub fn set_type(&mut self, exp_type: ExpType, tree: Option<NodeRef>, is_static: bool) {
        let mut cursor = tree;
        while let Some(r) = cursor {
            let node = self.node_mut(r);
            node.exp_type = exp_type;
            node.is_static = is_static;
            cursor = node.sibling;
        }
    }

    /// Iterate a sibling chain without borrowing the arena across steps.
    pub fn siblings(&self, start: Option<NodeRef>) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut cursor = start;
        while let Some(r) = cursor {
            out.push(r);
            cursor = self.node(r).sibling;
        }
        out
    }

    /// Print the tree, optionally with type and allocation annotations.
    pub fn print_tree(&self, root: Option<NodeRef>, show_alloc: bool) -> String {
        let mut out = String::new();
        if let Some(root) = root {
            self.print_rec(&mut out, 1, 1, root, show_alloc);
        } else {
            out.push_str("NULL tree\n");
        }
        out
    }

    fn print_rec(&self, out: &mut String, depth: usize, sibling_cnt: usize, r: NodeRef, show_alloc: bool) {
        self.print_node(out, r, show_alloc);
        out.push('\n');

        let node = self.node(r);
        for (i, child) in node.child.iter().enumerate() {
            if let Some(child) = *child {
                for _ in 0..depth {
                    out.push_str(".   ");
                }
                let _ = write!(out, "Child: {}  ", i);
                self.print_rec(out, depth + 1, 1, child, show_alloc);
            }
        }

        if let Some(sibling) = node.sibling {
            if depth > 0 {
                for _ in 0..depth - 1 {
                    out.push_str(".   ");
                }
                let _ = write!(out, "Sibling: {}  ", sibling_cnt);
            }
            self.print_rec(out, depth, sibling_cnt + 1, sibling, show_alloc);
        }
    }

    fn print_node(&self, out: &mut String, r: NodeRef, show_alloc: bool) {
        let node = self.node(r);
        let type_str = type_to_str(node.exp_type, node.is_static, node.is_array);
        match node.kind {
            NodeKind::Decl(DeclKind::Var) => {
                let _ = write!(out, "Var: {} of {} ", node.name(), type_str);
                self.show_allocation(out, node, show_alloc);
            }
            NodeKind::Decl(DeclKind::Func) => {
                let _ = write!(out, "Func: {} returns {} ", node.name(), type_str);
                self.show_allocation(out, node, show_alloc);
            }
            NodeKind::Decl(DeclKind::Param) => {
                let _ = write!(out, "Parm: {} of {} ", node.name(), type_str);
                self.show_allocation(out, node, show_alloc);
            }
            NodeKind::Stmt(kind) => {
                let label = match kind {
                    StmtKind::If => "If ",
                    StmtKind::While => "While ",
                    StmtKind::For => "For ",
                    StmtKind::Compound => "Compound ",
                    StmtKind::Return => "Return ",
                    StmtKind::Break => "Break ",
                    StmtKind::Range => "Range ",
                };
                out.push_str(label);
                if matches!(kind, StmtKind::For | StmtKind::Compound) {
                    self.show_allocation(out, node, show_alloc);
                }
            }
            NodeKind::Exp(ExpKind::Assign) => {
                let _ = write!(out, "Assign: {} of {} ", node.name(), type_str);
            }
            NodeKind::Exp(ExpKind::Call) => {
                let _ = write!(out, "Call: {} of {} ", node.name(), type_str);
            }
            NodeKind::Exp(ExpKind::Constant) => {
                if node.exp_type == ExpType::Char && node.is_array {
                    let _ = write!(out, "Const \"{}\" of {} ", node.name(), type_str);
                    self.show_allocation(out, node, show_alloc);
                } else if node.exp_type == ExpType::Char {
                    let _ = write!(out, "Const '{}' of {} ", node.attr.cvalue as char, type_str);
                } else {
                    let _ = write!(out, "Const {} of {} ", node.name(), type_str);
                }
            }
            NodeKind::Exp(ExpKind::Id) => {
                let _ = write!(out, "Id: {} of {} ", node.name(), type_str);
                self.show_allocation(out, node, show_alloc);
            }
            NodeKind::Exp(ExpKind::Op) => {
                let op_str = type_to_str(node.exp_type, node.is_static, false);
                let _ = write!(out, "Op: {} of {} ", node.name(), op_str);
            }
        }
        let _ = write!(out, "[line: {}]", node.lineno);
    }

    fn show_allocation(&self, out: &mut String, node: &Node, show_alloc: bool) {
        if show_alloc {
            let _ = write!(
                out,
                "[mem: {} loc: {} size: {}] ",
                node.var_kind.as_str(),
                node.offset,
                node.size
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticEngine;
    use crate::lexer::Lexer;

    fn token(source: &str) -> Token {
        let mut diag = DiagnosticEngine::new();
        Lexer::new(source).scan(&mut diag).remove(0)
    }

    #[test]
    fn constructor_copies_token_data() {
        let mut ast = Ast::new();
        let tok = token("count");
        let r = ast.new_exp(ExpKind::Id, Some(&tok), None, None, None);
        let node = ast.node(r);
        assert_eq!(node.kind, NodeKind::Exp(ExpKind::Id));
        assert_eq!(node.name().as_str(), "count");
        assert_eq!(node.lineno, 1);
        assert_eq!(node.size, 1);
        assert_eq!(node.var_kind, VarKind::None);
    }

    #[test]
    fn add_sibling_appends_at_tail() {
        let mut ast = Ast::new();
        let a = ast.new_exp(ExpKind::Id, Some(&token("a")), None, None, None);
        let b = ast.new_exp(ExpKind::Id, Some(&token("b")), None, None, None);
        let c = ast.new_exp(ExpKind::Id, Some(&token("c")), None, None, None);
        let head = ast.add_sibling(Some(a), Some(b));
        let head = ast.add_sibling(head, Some(c));
        assert_eq!(head, Some(a));
        assert_eq!(ast.siblings(head), vec![a, b, c]);
    }

    #[test]
    fn add_sibling_handles_missing_ends() {
        let mut ast = Ast::new();
        let a = ast.new_exp(ExpKind::Id, Some(&token("a")), None, None, None);
        assert_eq!(ast.add_sibling(None, Some(a)), Some(a));
        assert_eq!(ast.add_sibling(Some(a), None), Some(a));
    }

    #[test]
    fn set_type_covers_whole_chain() {
        let mut ast = Ast::new();
        let a = ast.new_decl(DeclKind::Var, ExpType::Undefined, Some(&token("a")), None, None, None);
        let b = ast.new_decl(DeclKind::Var, ExpType::Undefined, Some(&token("b")), None, None, None);
        ast.add_sibling(Some(a), Some(b));
        ast.set_type(ExpType::Integer, Some(a), true);
        assert_eq!(ast.node(a).exp_type, ExpType::Integer);
        assert!(ast.node(b).is_static);
        assert_eq!(ast.node(b).exp_type, ExpType::Integer);
    }

    #[test]
    fn type_strings_match_diagnostic_forms() {
        assert_eq!(type_to_str(ExpType::Integer, false, false), "type int");
        assert_eq!(type_to_str(ExpType::Boolean, false, true), "array of type bool");
        assert_eq!(type_to_str(ExpType::Char, true, false), "static type char");
        assert_eq!(type_to_str(ExpType::Undefined, false, false), "type UndefinedType");
    }
}
