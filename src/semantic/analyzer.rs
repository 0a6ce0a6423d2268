//! The scope-aware semantic analyzer.
//!
//! A single recursive walk over the AST that interleaves two concerns:
//! name resolution with type checking, and storage layout. Offsets grow
//! downward from the global pointer (`goffset`) and the frame pointer
//! (`foffset`); every scope save/restores `foffset` so siblings can reuse
//! frame slots. Diagnostics never abort the walk.

use log::debug;

use crate::ast::{
    type_to_str, Ast, DeclKind, ExpKind, ExpType, NodeKind, NodeRef, StmtKind, Symbol, VarKind,
};
use crate::diagnostic::DiagnosticEngine;
use crate::lexer::TokenKind;
use crate::semantic::symbol_table::SymbolTable;

/// Result of semantic analysis, consumed by the code generator.
pub struct Analysis {
    /// Head of the declaration chain, library functions included.
    pub root: Option<NodeRef>,
    /// The symbol table, reduced to its global frame.
    pub globals: SymbolTable,
    /// Final size of the global region (negative, grows downward).
    pub global_offset: i32,
}

/// Analyze a parsed program. Prepends the I/O library declarations, then
/// annotates every node with its type, storage kind, offset and size.
pub fn semantic_analysis(ast: &mut Ast, root: Option<NodeRef>, diag: &mut DiagnosticEngine) -> Analysis {
    let root = load_io_lib(ast, root);
    let mut analyzer = Analyzer {
        ast,
        diag,
        symtab: SymbolTable::new(),
        goffset: 0,
        foffset: 0,
        var_counter: 0,
        new_scope: true,
        func_inside: None,
        assign_target: None,
    };
    analyzer.traverse(root);
    debug!("semantic analysis done, goffset {}", analyzer.goffset);

    let Analyzer { symtab, goffset, .. } = analyzer;
    Analysis {
        root,
        globals: symtab,
        global_offset: goffset,
    }
}

/// Synthesize the seven I/O library declarations and prefix them to the
/// program. A forest that already starts with the library block is returned
/// untouched, so re-running the analysis stays a no-op.
fn load_io_lib(ast: &mut Ast, syntree: Option<NodeRef>) -> Option<NodeRef> {
    if let Some(r) = syntree {
        if ast.node(r).lineno == -1 {
            return syntree;
        }
    }

    fn lib_func(ast: &mut Ast, name: &str, ret: ExpType, param: Option<ExpType>) -> NodeRef {
        let param = param.map(|ty| {
            let p = ast.new_decl(DeclKind::Param, ty, None, None, None, None);
            ast.node_mut(p).attr.name = Some(Symbol::from("*dummy*"));
            p
        });
        let f = ast.new_decl(DeclKind::Func, ret, None, param, None, None);
        ast.node_mut(f).attr.name = Some(Symbol::from(name));
        f
    }

    let input = lib_func(ast, "input", ExpType::Integer, None);
    let output = lib_func(ast, "output", ExpType::Void, Some(ExpType::Integer));
    let inputb = lib_func(ast, "inputb", ExpType::Boolean, None);
    let outputb = lib_func(ast, "outputb", ExpType::Void, Some(ExpType::Boolean));
    let inputc = lib_func(ast, "inputc", ExpType::Char, None);
    let outputc = lib_func(ast, "outputc", ExpType::Void, Some(ExpType::Char));
    let outnl = lib_func(ast, "outnl", ExpType::Void, None);

    let mut head = Some(input);
    for f in [output, inputb, outputb, inputc, outputc, outnl] {
        head = ast.add_sibling(head, Some(f));
    }
    ast.add_sibling(head, syntree)
}

struct Analyzer<'a> {
    ast: &'a mut Ast,
    diag: &'a mut DiagnosticEngine,
    symtab: SymbolTable,
    /// Next free global slot, grows downward from 0.
    goffset: i32,
    /// Next free frame slot, reset to -2 on function entry.
    foffset: i32,
    /// Uniquifier for static locals registered in the global frame.
    var_counter: i32,
    /// Whether the next compound statement opens its own scope.
    new_scope: bool,
    /// Function whose body is being traversed; used by `return` checks.
    func_inside: Option<NodeRef>,
    /// Direct LHS of a plain assignment; reading it is a write, not a use.
    assign_target: Option<NodeRef>,
}

impl<'a> Analyzer<'a> {
    fn traverse(&mut self, start: Option<NodeRef>) {
        let mut cursor = start;
        while let Some(r) = cursor {
            self.traverse_node(r);
            cursor = self.ast.node(r).sibling;
        }
    }

    fn traverse_node(&mut self, r: NodeRef) {
        match self.ast.node(r).kind {
            NodeKind::Decl(kind) => self.visit_decl(r, kind),
            NodeKind::Stmt(kind) => self.visit_stmt(r, kind),
            NodeKind::Exp(kind) => self.visit_exp(r, kind),
        }
    }

    // ----- declarations -------------------------------------------------

    fn visit_decl(&mut self, r: NodeRef, kind: DeclKind) {
        self.new_scope = true;
        match kind {
            DeclKind::Var => {
                let init = self.ast.node(r).child[0];
                self.traverse(init);
                if init.is_some() {
                    self.ast.node_mut(r).is_assigned = true;
                }
                self.alloc_var(r, kind);
            }
            DeclKind::Param => self.alloc_var(r, kind),
            DeclKind::Func => self.visit_func(r),
        }
    }

    /// Insert a variable or parameter and assign its storage.
    fn alloc_var(&mut self, r: NodeRef, kind: DeclKind) {
        let (name, lineno, size, is_static, is_array) = {
            let n = self.ast.node(r);
            (n.name(), n.lineno, n.size, n.is_static, n.is_array)
        };

        if !self.symtab.insert(name, r) {
            let prior_line = self
                .symtab
                .lookup(name)
                .map(|p| self.ast.node(p).lineno)
                .unwrap_or(0);
            self.diag.semantic_error(
                lineno,
                format!("Symbol '{}' is already declared at line {}.", name, prior_line),
            );
        }

        // storage layout is computed even for duplicates so every variable
        // ends up with a kind and an offset
        if self.symtab.depth() == 1 {
            let n = self.ast.node_mut(r);
            n.var_kind = VarKind::Global;
            n.offset = self.goffset;
            self.goffset -= size;
        } else if is_static {
            {
                let n = self.ast.node_mut(r);
                n.var_kind = VarKind::LocalStatic;
                n.offset = self.goffset;
            }
            self.goffset -= size;
            self.var_counter += 1;
            let decorated = Symbol::from(format!("{}-{}", name, self.var_counter).as_str());
            self.symtab.insert_global(decorated, r);
        } else {
            let n = self.ast.node_mut(r);
            n.var_kind = VarKind::Local;
            n.offset = self.foffset;
            self.foffset -= size;
        }

        let n = self.ast.node_mut(r);
        if kind == DeclKind::Param {
            n.var_kind = VarKind::Parameter;
        } else if is_array {
            // slot at offset+1 holds the runtime length
            n.offset -= 1;
        }
    }

    fn visit_func(&mut self, r: NodeRef) {
        self.foffset = -2;
        let (name, lineno) = {
            let n = self.ast.node(r);
            (n.name(), n.lineno)
        };

        if !self.symtab.insert(name, r) {
            let prior_line = self
                .symtab
                .lookup(name)
                .map(|p| self.ast.node(p).lineno)
                .unwrap_or(0);
            self.diag.semantic_error(
                lineno,
                format!("Symbol '{}' is already declared at line {}.", name, prior_line),
            );
        }

        self.symtab.enter(name.as_str());
        self.func_inside = Some(r);

        let params = self.ast.node(r).child[0];
        self.traverse(params);
        self.ast.node_mut(r).size = self.foffset;

        // the body reuses the function scope
        self.new_scope = false;
        let body = self.ast.node(r).child[1];
        self.traverse(body);

        self.ast.node_mut(r).var_kind = VarKind::Global;
        self.symtab.leave();
        self.new_scope = true;
    }

    // ----- statements ---------------------------------------------------

    fn visit_stmt(&mut self, r: NodeRef, kind: StmtKind) {
        if kind != StmtKind::Compound {
            self.new_scope = true;
        }
        match kind {
            StmtKind::If => self.visit_loop_header(r, "IfStmt", false),
            StmtKind::While => self.visit_loop_header(r, "WhileStmt", false),
            StmtKind::For => self.visit_loop_header(r, "ForStmt", true),
            StmtKind::Compound => self.visit_compound(r),
            StmtKind::Return => self.visit_return(r),
            StmtKind::Break => {
                if self.symtab.depth() <= 2 {
                    let lineno = self.ast.node(r).lineno;
                    self.diag
                        .semantic_error(lineno, "Cannot have a break statement outside of loop.".to_string());
                }
            }
            StmtKind::Range => {
                for i in 0..3 {
                    let child = self.ast.node(r).child[i];
                    self.traverse(child);
                }
            }
        }
    }

    /// Shared scaffolding for `if`/`while`/`for`: a named scope around the
    /// header expression and the bodies, with `foffset` save/restore.
    fn visit_loop_header(&mut self, r: NodeRef, scope_name: &str, is_for: bool) {
        self.symtab.enter(scope_name);
        let rem_offset = self.foffset;

        let c0 = self.ast.node(r).child[0];
        self.traverse(c0);

        if is_for {
            // loop index is written by the loop machinery itself
            if let Some(c0) = c0 {
                self.ast.node_mut(c0).is_assigned = true;
            }
            // reserve the stop and step temporaries
            self.foffset -= 2;
        } else {
            self.check_test_condition(r, scope_name);
        }
        self.ast.node_mut(r).size = self.foffset;

        let c1 = self.ast.node(r).child[1];
        if is_for {
            self.traverse(c1);
            self.check_for_range(r);
        } else {
            self.new_scope = false;
            self.traverse(c1);
        }

        self.new_scope = false;
        let c2 = self.ast.node(r).child[2];
        self.traverse(c2);

        self.foffset = rem_offset;
        self.symtab.leave();
        self.new_scope = true;
    }

    fn check_test_condition(&mut self, r: NodeRef, scope_name: &str) {
        let stmt_name = if scope_name == "IfStmt" { "if" } else { "while" };
        let Some(test) = self.ast.node(r).child[0] else { return };
        let lineno = self.ast.node(r).lineno;
        let (test_type, test_array) = {
            let t = self.ast.node(test);
            (t.exp_type, t.is_array)
        };
        if test_type != ExpType::Boolean && test_type != ExpType::Undefined {
            self.diag.semantic_error(
                lineno,
                format!(
                    "Expecting Boolean test condition in {} statement but got {}.",
                    stmt_name,
                    type_to_str(test_type, false, false)
                ),
            );
        }
        if test_array {
            self.diag.semantic_error(
                lineno,
                format!("Cannot use array as test condition in {} statement.", stmt_name),
            );
        }
    }

    fn check_for_range(&mut self, r: NodeRef) {
        let lineno = self.ast.node(r).lineno;
        let Some(range) = self.ast.node(r).child[1] else { return };
        for pos in 0..3 {
            let Some(part) = self.ast.node(range).child[pos] else { continue };
            let (part_type, part_array) = {
                let p = self.ast.node(part);
                (p.exp_type, p.is_array)
            };
            if part_type != ExpType::Integer && part_type != ExpType::Undefined {
                self.diag.semantic_error(
                    lineno,
                    format!(
                        "Expecting type int in position {} of range of for statement but got {}.",
                        pos + 1,
                        type_to_str(part_type, false, false)
                    ),
                );
            }
            if part_array {
                self.diag.semantic_error(
                    lineno,
                    format!("Cannot use array in position {} of range of for statement.", pos + 1),
                );
            }
        }
    }

    fn visit_compound(&mut self, r: NodeRef) {
        if self.new_scope {
            self.symtab.enter("CompoundStatement");
            let rem_offset = self.foffset;

            let decls = self.ast.node(r).child[0];
            self.traverse(decls);
            self.ast.node_mut(r).size = self.foffset;
            let body = self.ast.node(r).child[1];
            self.traverse(body);

            self.foffset = rem_offset;
            self.symtab.leave();
        } else {
            self.new_scope = true;

            let decls = self.ast.node(r).child[0];
            self.traverse(decls);
            self.ast.node_mut(r).size = self.foffset;
            let body = self.ast.node(r).child[1];
            self.traverse(body);
        }
    }

    fn visit_return(&mut self, r: NodeRef) {
        let value = self.ast.node(r).child[0];
        self.traverse(value);

        let lineno = self.ast.node(r).lineno;
        let Some(func) = self.func_inside else { return };
        let (func_name, func_line, func_type) = {
            let f = self.ast.node(func);
            (f.name(), f.lineno, f.exp_type)
        };

        match value {
            None => {
                if func_type != ExpType::Void && func_type != ExpType::Undefined {
                    self.diag.semantic_error(
                        lineno,
                        format!(
                            "Function '{}' at line {} is expecting to return {} but return has no value.",
                            func_name,
                            func_line,
                            type_to_str(func_type, false, false)
                        ),
                    );
                }
            }
            Some(value) => {
                let (value_type, value_array) = {
                    let v = self.ast.node(value);
                    (v.exp_type, v.is_array)
                };
                if value_array {
                    self.diag
                        .semantic_error(lineno, "Cannot return an array.".to_string());
                } else if func_type != value_type && value_type != ExpType::Undefined {
                    if func_type == ExpType::Void {
                        self.diag.semantic_error(
                            lineno,
                            format!(
                                "Function '{}' at line {} is expecting no return value, but return has a value.",
                                func_name, func_line
                            ),
                        );
                    } else {
                        self.diag.semantic_error(
                            lineno,
                            format!(
                                "Function '{}' at line {} is expecting to return {} but returns {}.",
                                func_name,
                                func_line,
                                type_to_str(func_type, false, false),
                                type_to_str(value_type, false, false)
                            ),
                        );
                    }
                }
            }
        }
    }

    // ----- expressions --------------------------------------------------

    fn visit_exp(&mut self, r: NodeRef, kind: ExpKind) {
        self.new_scope = true;
        match kind {
            ExpKind::Constant => self.visit_constant(r),
            ExpKind::Id => self.visit_id(r),
            ExpKind::Op => self.visit_op(r),
            ExpKind::Assign => self.visit_assign(r),
            ExpKind::Call => self.visit_call(r),
        }
    }

    fn visit_constant(&mut self, r: NodeRef) {
        // string constants live in the global region
        let n = self.ast.node(r);
        if n.exp_type == ExpType::Char && n.is_array {
            let size = n.size;
            let n = self.ast.node_mut(r);
            n.var_kind = VarKind::Global;
            n.offset = self.goffset - 1;
            self.goffset -= size;
        }
    }

    fn visit_id(&mut self, r: NodeRef) {
        let (name, lineno) = {
            let n = self.ast.node(r);
            (n.name(), n.lineno)
        };

        let Some(decl) = self.symtab.lookup(name) else {
            self.diag
                .semantic_error(lineno, format!("Symbol '{}' is not declared.", name));
            self.ast.node_mut(r).exp_type = ExpType::Undefined;
            return;
        };

        let (d_kind, d_offset, d_type, d_size, d_var_kind, d_array, d_static, d_assigned) = {
            let d = self.ast.node(decl);
            (
                d.kind, d.offset, d.exp_type, d.size, d.var_kind, d.is_array, d.is_static, d.is_assigned,
            )
        };

        if d_kind == NodeKind::Decl(DeclKind::Func) {
            self.diag
                .semantic_error(lineno, format!("Cannot use function '{}' as a variable.", name));
        }

        {
            let n = self.ast.node_mut(r);
            n.offset = d_offset;
            n.exp_type = d_type;
            n.size = d_size;
            n.var_kind = d_var_kind;
            n.is_array = d_array;
            n.is_static = d_static;
            n.is_used = true;
        }
        self.ast.node_mut(decl).is_used = true;

        // a scalar variable read before any assignment gets one warning,
        // then counts as assigned so the message never repeats
        if d_kind == NodeKind::Decl(DeclKind::Var)
            && !d_array
            && !d_assigned
            && self.assign_target != Some(r)
        {
            self.diag.semantic_warning(
                lineno,
                format!("Variable '{}' may be uninitialized when used here.", name),
            );
            self.ast.node_mut(decl).is_assigned = true;
        }
    }

    fn visit_op(&mut self, r: NodeRef) {
        let (op, c0, c1) = {
            let n = self.ast.node(r);
            (n.attr.op, n.child[0], n.child[1])
        };
        self.traverse(c0);
        self.traverse(c1);

        self.handle_op_errors(r);

        let result_type = match op {
            Some(
                TokenKind::Eq
                | TokenKind::Neq
                | TokenKind::Lt
                | TokenKind::Leq
                | TokenKind::Gt
                | TokenKind::Geq
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Not,
            ) => Some(ExpType::Boolean),
            Some(TokenKind::Sizeof) => Some(ExpType::Integer),
            _ => None,
        };
        match result_type {
            Some(ty) => self.ast.node_mut(r).exp_type = ty,
            None => {
                // arithmetic, min/max, chsign, ?, and indexing take the
                // type of the left operand
                if let Some(c0) = c0 {
                    let child_type = self.ast.node(c0).exp_type;
                    self.ast.node_mut(r).exp_type = child_type;
                }
            }
        }
    }

    fn visit_assign(&mut self, r: NodeRef) {
        let (op, c0, c1) = {
            let n = self.ast.node(r);
            (n.attr.op, n.child[0], n.child[1])
        };

        // the direct LHS of a plain `=` is written, not read
        if op == Some(TokenKind::Assign) {
            if let Some(c0) = c0 {
                if self.ast.node(c0).kind == NodeKind::Exp(ExpKind::Id) {
                    self.assign_target = Some(c0);
                }
            }
        }
        self.traverse(c0);
        self.assign_target = None;
        self.traverse(c1);

        self.handle_op_errors(r);

        if let Some(c0) = c0 {
            let lhs_type = self.ast.node(c0).exp_type;
            self.ast.node_mut(r).exp_type = lhs_type;

            if self.ast.node(c0).kind == NodeKind::Exp(ExpKind::Id) {
                let name = self.ast.node(c0).name();
                if let Some(decl) = self.symtab.lookup(name) {
                    let d = self.ast.node_mut(decl);
                    d.is_assigned = true;
                    d.is_used = true;
                }
            }
        }
    }

    fn visit_call(&mut self, r: NodeRef) {
        let (name, lineno, args) = {
            let n = self.ast.node(r);
            (n.name(), n.lineno, n.child[0])
        };

        let Some(decl) = self.symtab.lookup(name) else {
            self.diag
                .semantic_error(lineno, format!("Symbol '{}' is not declared.", name));
            self.ast.node_mut(r).exp_type = ExpType::Undefined;
            self.traverse(args);
            return;
        };

        let (d_kind, d_type, d_offset, d_lineno) = {
            let d = self.ast.node(decl);
            (d.kind, d.exp_type, d.offset, d.lineno)
        };

        if d_kind != NodeKind::Decl(DeclKind::Func) {
            self.diag.semantic_error(
                lineno,
                format!("'{}' is a simple variable and cannot be called.", name),
            );
            self.ast.node_mut(r).exp_type = d_type;
            self.ast.node_mut(decl).is_used = true;
            self.traverse(args);
            return;
        }

        {
            let n = self.ast.node_mut(r);
            n.exp_type = d_type;
            n.offset = d_offset;
        }
        self.ast.node_mut(decl).is_used = true;

        // walk declared parameters and actual arguments in lockstep
        let mut param = self.ast.node(decl).child[0];
        let mut arg = args;
        let mut pos = 1;
        loop {
            match (param, arg) {
                (Some(p), Some(a)) => {
                    // each argument is analyzed in isolation
                    self.traverse_node(a);
                    let (p_type, p_array) = {
                        let n = self.ast.node(p);
                        (n.exp_type, n.is_array)
                    };
                    let (a_type, a_array) = {
                        let n = self.ast.node(a);
                        (n.exp_type, n.is_array)
                    };
                    if p_type != a_type && a_type != ExpType::Undefined && p_type != ExpType::Undefined {
                        self.diag.semantic_error(
                            lineno,
                            format!(
                                "Expecting {} in parameter {} of call to '{}' declared on line {} but got {}.",
                                type_to_str(p_type, false, false),
                                pos,
                                name,
                                d_lineno,
                                type_to_str(a_type, false, false)
                            ),
                        );
                    }
                    if p_array && !a_array {
                        self.diag.semantic_error(
                            lineno,
                            format!(
                                "Expecting array in parameter {} of call to '{}' declared on line {}.",
                                pos, name, d_lineno
                            ),
                        );
                    } else if !p_array && a_array {
                        self.diag.semantic_error(
                            lineno,
                            format!(
                                "Not expecting array in parameter {} of call to '{}' declared on line {}.",
                                pos, name, d_lineno
                            ),
                        );
                    }
                    param = self.ast.node(p).sibling;
                    arg = self.ast.node(a).sibling;
                    pos += 1;
                }
                (Some(_), None) => {
                    self.diag.semantic_error(
                        lineno,
                        format!(
                            "Too few parameters passed for function '{}' declared on line {}.",
                            name, d_lineno
                        ),
                    );
                    break;
                }
                (None, Some(a)) => {
                    self.diag.semantic_error(
                        lineno,
                        format!(
                            "Too many parameters passed for function '{}' declared on line {}.",
                            name, d_lineno
                        ),
                    );
                    // the extra arguments still get analyzed
                    self.traverse(Some(a));
                    break;
                }
                (None, None) => break,
            }
        }
    }

    /// Operator and assignment operand checking. Operands resolved to
    /// `UndefinedType` short-circuit silently so one unresolved name does
    /// not cascade into a pile of follow-on messages.
    fn handle_op_errors(&mut self, r: NodeRef) {
        let (op, lineno, c0, c1) = {
            let n = self.ast.node(r);
            (n.attr.op, n.lineno, n.child[0], n.child[1])
        };
        let Some(op) = op else { return };
        let Some(c0) = c0 else {
            log::error!("operator node at line {} has no left operand", lineno);
            return;
        };

        let (lhs_type, lhs_array, lhs_name, lhs_op) = {
            let n = self.ast.node(c0);
            (n.exp_type, n.is_array, n.name(), n.attr.op)
        };
        let rhs = c1.map(|c1| {
            let n = self.ast.node(c1);
            (n.exp_type, n.is_array, n.name())
        });

        if lhs_type == ExpType::Undefined || rhs.is_some_and(|(t, _, _)| t == ExpType::Undefined) {
            return;
        }

        let op_text = op.text();
        match op {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::Min
            | TokenKind::Max
            | TokenKind::AddAss
            | TokenKind::SubAss
            | TokenKind::MulAss
            | TokenKind::DivAss => {
                if lhs_type != ExpType::Integer {
                    self.diag.semantic_error(
                        lineno,
                        format!(
                            "'{}' requires operands of type int but lhs is of {}.",
                            op_text,
                            type_to_str(lhs_type, false, false)
                        ),
                    );
                }
                if let Some((rhs_type, _, _)) = rhs {
                    if rhs_type != ExpType::Integer {
                        self.diag.semantic_error(
                            lineno,
                            format!(
                                "'{}' requires operands of type int but rhs is of {}.",
                                op_text,
                                type_to_str(rhs_type, false, false)
                            ),
                        );
                    }
                }
                if lhs_array || rhs.is_some_and(|(_, a, _)| a) {
                    self.diag.semantic_error(
                        lineno,
                        format!("The operation '{}' does not work with arrays.", op_text),
                    );
                }
            }
            TokenKind::And | TokenKind::Or => {
                if lhs_type != ExpType::Boolean {
                    self.diag.semantic_error(
                        lineno,
                        format!(
                            "'{}' requires operands of type bool but lhs is of {}.",
                            op_text,
                            type_to_str(lhs_type, false, false)
                        ),
                    );
                }
                if let Some((rhs_type, _, _)) = rhs {
                    if rhs_type != ExpType::Boolean {
                        self.diag.semantic_error(
                            lineno,
                            format!(
                                "'{}' requires operands of type bool but rhs is of {}.",
                                op_text,
                                type_to_str(rhs_type, false, false)
                            ),
                        );
                    }
                }
                if lhs_array || rhs.is_some_and(|(_, a, _)| a) {
                    self.diag.semantic_error(
                        lineno,
                        format!("The operation '{}' does not work with arrays.", op_text),
                    );
                }
            }
            TokenKind::Assign
            | TokenKind::Eq
            | TokenKind::Neq
            | TokenKind::Lt
            | TokenKind::Leq
            | TokenKind::Gt
            | TokenKind::Geq => {
                let Some((rhs_type, rhs_array, _)) = rhs else { return };
                if lhs_type != rhs_type {
                    self.diag.semantic_error(
                        lineno,
                        format!(
                            "'{}' requires operands of the same type but lhs is {} and rhs is {}.",
                            op_text,
                            type_to_str(lhs_type, false, false),
                            type_to_str(rhs_type, false, false)
                        ),
                    );
                }
                // an indexed lhs already names a scalar element
                if lhs_op != Some(TokenKind::LBracket) {
                    if lhs_array && !rhs_array {
                        self.diag.semantic_error(
                            lineno,
                            format!(
                                "'{}' requires both operands be arrays or not but lhs is an array and rhs is not an array.",
                                op_text
                            ),
                        );
                    } else if !lhs_array && rhs_array {
                        self.diag.semantic_error(
                            lineno,
                            format!(
                                "'{}' requires both operands be arrays or not but lhs is not an array and rhs is an array.",
                                op_text
                            ),
                        );
                    }
                }
            }
            TokenKind::Sizeof => {
                if !lhs_array {
                    self.diag.semantic_error(
                        lineno,
                        "The operation 'sizeof' only works with arrays.".to_string(),
                    );
                }
            }
            TokenKind::Question | TokenKind::Chsign | TokenKind::Inc | TokenKind::Dec => {
                if lhs_type != ExpType::Integer {
                    self.diag.semantic_error(
                        lineno,
                        format!(
                            "Unary '{}' requires an operand of type int but was given {}.",
                            op_text,
                            type_to_str(lhs_type, false, false)
                        ),
                    );
                }
                if lhs_array {
                    self.diag.semantic_error(
                        lineno,
                        format!("The operation '{}' does not work with arrays.", op_text),
                    );
                }
            }
            TokenKind::LBracket => {
                if !lhs_array {
                    self.diag
                        .semantic_error(lineno, format!("Cannot index nonarray '{}'.", lhs_name));
                }
                if let Some((rhs_type, rhs_array, rhs_name)) = rhs {
                    if rhs_type != ExpType::Integer {
                        self.diag.semantic_error(
                            lineno,
                            format!(
                                "Array '{}' should be indexed by type int but got {}.",
                                lhs_name,
                                type_to_str(rhs_type, false, false)
                            ),
                        );
                    }
                    if rhs_array {
                        self.diag.semantic_error(
                            lineno,
                            format!("Array index is the unindexed array '{}'.", rhs_name),
                        );
                    }
                }
            }
            _ => {}
        }
    }
}
