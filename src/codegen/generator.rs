//! Single-pass AST-to-TVM code generator.
//!
//! Walks the annotated tree once, emitting library bodies, user functions,
//! and finally the init block that sets up the global frame and jumps to
//! `main`. Forward references (the init jump, loop exits, calls to
//! functions emitted later) go through reserved slots that are backpatched
//! as soon as their target address exists.
//!
//! Calling convention: the caller builds a ghost frame at its next free
//! temporary slot, stores the old FP there, the return address at ghost-1,
//! and the actuals from ghost-2 downward, then swings FP onto the ghost
//! frame and jumps. Callees return with the result in RT.

use hashbrown::HashMap;
use log::debug;

use crate::ast::{Ast, DeclKind, ExpKind, ExpType, NodeKind, NodeRef, StmtKind, Symbol, VarKind};
use crate::codegen::emitter::{Emitter, Opcode, AC, AC1, AC2, AC3, FP, GP, PC, RT};
use crate::diagnostic::DiagnosticEngine;
use crate::lexer::TokenKind;
use crate::semantic::SymbolTable;

/// Generate TVM assembly for an analyzed program.
pub fn codegen(
    ast: &mut Ast,
    root: Option<NodeRef>,
    globals: &SymbolTable,
    global_offset: i32,
    diag: &mut DiagnosticEngine,
    src_file: &str,
    linenum_flag: bool,
) -> String {
    let mut gen = CodeGen {
        ast,
        globals,
        diag,
        emit: Emitter::new(),
        toffset: 0,
        breakloc: 0,
        linenum_flag,
        func_entries: HashMap::new(),
        call_fixups: Vec::new(),
    };

    // reserve the jump to the init block at address 0
    let init_jump = gen.emit.emit_skip(1);

    gen.emit
        .emit_comment(&format!("bC compiler version {}", env!("CARGO_PKG_VERSION")));
    gen.emit.emit_comment(&format!("File compiled: {}", src_file));

    gen.gen_chain(root);
    gen.gen_init(init_jump, global_offset);

    gen.emit.render()
}

struct CodeGen<'a> {
    ast: &'a mut Ast,
    globals: &'a SymbolTable,
    diag: &'a mut DiagnosticEngine,
    emit: Emitter,
    /// Next free temporary slot, negative and decreasing.
    toffset: i32,
    /// Reserved jump-past-loop slot of the innermost loop.
    breakloc: i32,
    linenum_flag: bool,
    /// Entry address of each emitted function.
    func_entries: HashMap<NodeRef, i32>,
    /// Reserved call slots waiting for their callee's entry address.
    call_fixups: Vec<(i32, NodeRef)>,
}

impl<'a> CodeGen<'a> {
    fn comment_line_num(&mut self, r: NodeRef) {
        if self.linenum_flag {
            let lineno = self.ast.node(r).lineno;
            self.emit.emit_comment(&format!("Line: {}", lineno));
        }
    }

    fn gen_chain(&mut self, start: Option<NodeRef>) {
        let mut cursor = start;
        while let Some(r) = cursor {
            self.gen_node(r);
            cursor = self.ast.node(r).sibling;
        }
    }

    fn gen_node(&mut self, r: NodeRef) {
        match self.ast.node(r).kind {
            NodeKind::Decl(kind) => self.gen_decl(r, kind),
            NodeKind::Stmt(kind) => self.gen_stmt(r, kind),
            NodeKind::Exp(kind) => {
                self.emit.emit_comment("EXPRESSION");
                self.gen_exp(r, kind);
            }
        }
    }

    // ----- declarations -------------------------------------------------

    fn gen_decl(&mut self, r: NodeRef, kind: DeclKind) {
        match kind {
            DeclKind::Var => self.gen_local_var(r),
            DeclKind::Func => {
                if self.ast.node(r).lineno == -1 {
                    self.gen_library_func(r);
                } else {
                    self.gen_user_func(r);
                }
            }
            // parameters occupy slots the caller already filled
            DeclKind::Param => {}
        }
    }

    /// Local declarations emit their array length and initializer; globals
    /// and statics are handled by the init block.
    fn gen_local_var(&mut self, r: NodeRef) {
        let (name, var_kind, offset, size, is_array, init) = {
            let n = self.ast.node(r);
            (n.name(), n.var_kind, n.offset, n.size, n.is_array, n.child[0])
        };
        if var_kind != VarKind::Local {
            return;
        }
        self.comment_line_num(r);
        if is_array {
            self.emit
                .emit_rm(Opcode::Ldc, AC, size - 1, AC3, &format!("load size of array {}", name));
            self.emit
                .emit_rm(Opcode::St, AC, offset + 1, FP, &format!("save size of array {}", name));
        }
        if let Some(init) = init {
            let init_kind = self.exp_kind(init);
            self.gen_exp(init, init_kind);
            self.emit
                .emit_rm(Opcode::St, AC, offset, FP, &format!("Store variable {}", name));
        }
    }

    fn record_entry(&mut self, r: NodeRef) -> i32 {
        let entry = self.emit.emit_skip(0);
        self.ast.node_mut(r).offset = entry;
        self.func_entries.insert(r, entry);

        // resolve calls that were emitted before this function's body
        let pending: Vec<(i32, NodeRef)> = self.call_fixups.iter().copied().filter(|(_, f)| *f == r).collect();
        self.call_fixups.retain(|(_, f)| *f != r);
        let name = self.ast.node(r).name();
        for (slot, _) in pending {
            debug!("patching forward call to '{}' at slot {}", name, slot);
            self.emit.patch_goto_abs(slot, entry, &format!("CALL {}", name));
        }
        entry
    }

    fn gen_library_func(&mut self, r: NodeRef) {
        let name = self.ast.node(r).name();
        self.emit.emit_comment("");
        self.emit.emit_comment("** ** ** ** ** ** ** ** ** ** ** **");
        self.emit.emit_comment(&format!("FUNCTION {}", name));

        self.record_entry(r);
        self.emit.emit_rm(Opcode::St, AC, -1, FP, "Store return address");

        match name.as_str() {
            "input" => {
                self.emit.emit_ro(Opcode::In, RT, RT, RT, "Grab int input");
            }
            "inputb" => {
                self.emit.emit_ro(Opcode::Inb, RT, RT, RT, "Grab bool input");
            }
            "inputc" => {
                self.emit.emit_ro(Opcode::Inc, RT, RT, RT, "Grab char input");
            }
            "output" => {
                self.emit.emit_rm(Opcode::Ld, AC, -2, FP, "Load parameter");
                self.emit.emit_ro(Opcode::Out, AC, AC, AC, "Output integer");
            }
            "outputb" => {
                self.emit.emit_rm(Opcode::Ld, AC, -2, FP, "Load parameter");
                self.emit.emit_ro(Opcode::Outb, AC, AC, AC, "Output bool");
            }
            "outputc" => {
                self.emit.emit_rm(Opcode::Ld, AC, -2, FP, "Load parameter");
                self.emit.emit_ro(Opcode::Outc, AC, AC, AC, "Output char");
            }
            "outnl" => {
                self.emit.emit_ro(Opcode::Outnl, AC, AC, AC, "Output a newline");
            }
            other => {
                self.emit
                    .emit_comment(&format!("ERROR(LINKER): No support for special function {}", other));
            }
        }

        self.emit.emit_rm(Opcode::Ld, AC, -1, FP, "Load return address");
        self.emit.emit_rm(Opcode::Ld, FP, 0, FP, "Adjust fp");
        self.emit.emit_goto(0, AC, "Return");
        self.emit.emit_comment(&format!("END FUNCTION {}", name));
    }

    fn gen_user_func(&mut self, r: NodeRef) {
        let (name, size, body) = {
            let n = self.ast.node(r);
            (n.name(), n.size, n.child[1])
        };
        self.emit.emit_comment("");
        self.emit.emit_comment("** ** ** ** ** ** ** ** ** ** ** **");
        self.emit.emit_comment(&format!("FUNCTION {}", name));
        self.toffset = size;
        self.emit.emit_comment(&format!("TOFF set: {}", self.toffset));

        self.record_entry(r);
        self.emit.emit_rm(Opcode::St, AC, -1, FP, "Store return address");

        self.gen_chain(body);

        self.emit.emit_comment("Add standard closing in case there is no return statement");
        self.emit.emit_rm(Opcode::Ldc, RT, 0, AC3, "Set return value to 0");
        self.emit.emit_rm(Opcode::Ld, AC, -1, FP, "Load return address");
        self.emit.emit_rm(Opcode::Ld, FP, 0, FP, "Adjust fp");
        self.emit.emit_goto(0, AC, "Return");
        self.emit.emit_comment(&format!("END FUNCTION {}", name));
    }

    // ----- statements ---------------------------------------------------

    fn gen_stmt(&mut self, r: NodeRef, kind: StmtKind) {
        match kind {
            StmtKind::If => self.gen_if(r),
            StmtKind::While => self.gen_while(r),
            StmtKind::For => self.gen_for(r),
            StmtKind::Compound => self.gen_compound(r),
            StmtKind::Return => self.gen_return(r),
            StmtKind::Break => {
                self.comment_line_num(r);
                self.emit.emit_comment("BREAK");
                let breakloc = self.breakloc;
                self.emit.emit_goto_abs(breakloc, "break");
            }
            // ranges are emitted by their for statement
            StmtKind::Range => {}
        }
    }

    fn gen_if(&mut self, r: NodeRef) {
        self.comment_line_num(r);
        self.emit.emit_comment("IF");
        let (test, then_part, else_part) = {
            let n = self.ast.node(r);
            (n.child[0], n.child[1], n.child[2])
        };

        self.gen_opt_exp(test);
        let skip_then = self.emit.emit_skip(1);
        self.emit.emit_comment("THEN");
        self.gen_opt_node(then_part);

        if else_part.is_some() {
            let skip_else = self.emit.emit_skip(1);
            self.emit
                .backpatch_branch_to_here(Opcode::Jzr, AC, skip_then, "Jump around the THEN if false [backpatch]");
            self.emit.emit_comment("ELSE");
            self.gen_opt_node(else_part);
            self.emit
                .backpatch_jump_to_here(skip_else, "Jump around the ELSE [backpatch]");
        } else {
            self.emit
                .backpatch_branch_to_here(Opcode::Jzr, AC, skip_then, "Jump around the IF [backpatch]");
        }
        self.emit.emit_comment("END IF");
    }

    fn gen_while(&mut self, r: NodeRef) {
        self.comment_line_num(r);
        self.emit.emit_comment("WHILE");
        let (test, body) = {
            let n = self.ast.node(r);
            (n.child[0], n.child[1])
        };

        let top = self.emit.emit_skip(0);
        self.gen_opt_exp(test);
        self.emit.emit_rm(Opcode::Jnz, AC, 1, PC, "Jump to while part");

        let saved_breakloc = self.breakloc;
        self.breakloc = self.emit.emit_skip(1);
        self.emit.emit_comment("DO");
        self.gen_opt_node(body);
        self.emit.emit_goto_abs(top, "go to beginning of loop");
        self.emit
            .backpatch_jump_to_here(self.breakloc, "Jump past loop [backpatch]");
        self.breakloc = saved_breakloc;
        self.emit.emit_comment("END WHILE");
    }

    fn gen_for(&mut self, r: NodeRef) {
        self.comment_line_num(r);
        self.emit.emit_comment("FOR");
        let (index_var, range, body, size) = {
            let n = self.ast.node(r);
            (n.child[0], n.child[1], n.child[2], n.size)
        };

        let saved_toffset = self.toffset;
        self.toffset = size;
        self.emit.emit_comment(&format!("TOFF set: {}", self.toffset));

        let start_off = index_var.map(|v| self.ast.node(v).offset).unwrap_or(-2);
        let stop_off = start_off - 1;
        let step_off = start_off - 2;

        let (start, stop, step) = match range {
            Some(range) => {
                let n = self.ast.node(range);
                (n.child[0], n.child[1], n.child[2])
            }
            None => (None, None, None),
        };

        self.gen_opt_exp(start);
        self.emit
            .emit_rm(Opcode::St, AC, start_off, FP, "save starting value in index variable");
        self.gen_opt_exp(stop);
        self.emit.emit_rm(Opcode::St, AC, stop_off, FP, "save stop value");
        match step {
            Some(step) => {
                let kind = self.exp_kind(step);
                self.gen_exp(step, kind);
            }
            None => {
                self.emit.emit_rm(Opcode::Ldc, AC, 1, AC3, "default increment of 1");
            }
        }
        self.emit.emit_rm(Opcode::St, AC, step_off, FP, "save step value");

        let top = self.emit.emit_skip(0);
        self.emit.emit_rm(Opcode::Ld, AC1, start_off, FP, "loop index");
        self.emit.emit_rm(Opcode::Ld, AC2, stop_off, FP, "stop value");
        self.emit.emit_rm(Opcode::Ld, AC3, step_off, FP, "step value");
        self.emit.emit_ro(Opcode::Slt, AC, AC1, AC2, "Op <=");
        self.emit.emit_rm(Opcode::Jnz, AC, 1, PC, "Jump into loop body");

        let saved_breakloc = self.breakloc;
        self.breakloc = self.emit.emit_skip(1);
        self.emit.emit_comment("DO");
        self.gen_opt_node(body);

        self.emit.emit_comment("Bottom of loop increment and jump");
        self.emit.emit_rm(Opcode::Ld, AC, start_off, FP, "load index");
        self.emit.emit_rm(Opcode::Ld, AC1, step_off, FP, "load step");
        self.emit.emit_ro(Opcode::Add, AC, AC, AC1, "increment");
        self.emit.emit_rm(Opcode::St, AC, start_off, FP, "store back to index");
        self.emit.emit_goto_abs(top, "go to beginning of loop");

        self.emit
            .backpatch_jump_to_here(self.breakloc, "Jump past loop [backpatch]");
        self.breakloc = saved_breakloc;
        self.toffset = saved_toffset;
        self.emit.emit_comment(&format!("TOFF set: {}", self.toffset));
        self.emit.emit_comment("END FOR");
    }

    fn gen_compound(&mut self, r: NodeRef) {
        let (decls, body, size) = {
            let n = self.ast.node(r);
            (n.child[0], n.child[1], n.size)
        };
        let saved_toffset = self.toffset;
        self.toffset = size;
        self.emit.emit_comment("COMPOUND");
        self.emit.emit_comment(&format!("TOFF set: {}", self.toffset));
        self.gen_chain(decls);
        self.emit.emit_comment("Compound Body");
        self.gen_chain(body);
        self.toffset = saved_toffset;
        self.emit.emit_comment(&format!("TOFF set: {}", self.toffset));
        self.emit.emit_comment("END COMPOUND");
    }

    fn gen_return(&mut self, r: NodeRef) {
        self.comment_line_num(r);
        self.emit.emit_comment("RETURN");
        let value = self.ast.node(r).child[0];
        if let Some(value) = value {
            let kind = self.exp_kind(value);
            self.gen_exp(value, kind);
            self.emit.emit_rm(Opcode::Lda, RT, 0, AC, "Copy result to return register");
        }
        self.emit.emit_rm(Opcode::Ld, AC, -1, FP, "Load return address");
        self.emit.emit_rm(Opcode::Ld, FP, 0, FP, "Adjust fp");
        self.emit.emit_goto(0, AC, "Return");
    }

    // ----- expressions --------------------------------------------------

    fn exp_kind(&self, r: NodeRef) -> ExpKind {
        match self.ast.node(r).kind {
            NodeKind::Exp(kind) => kind,
            other => {
                log::error!("expected an expression node, found {:?}", other);
                ExpKind::Constant
            }
        }
    }

    fn gen_opt_exp(&mut self, r: Option<NodeRef>) {
        if let Some(r) = r {
            let kind = self.exp_kind(r);
            self.gen_exp(r, kind);
        }
    }

    fn gen_opt_node(&mut self, r: Option<NodeRef>) {
        if let Some(r) = r {
            self.gen_node(r);
        }
    }

    /// Emit an expression; its value ends up in AC.
    fn gen_exp(&mut self, r: NodeRef, kind: ExpKind) {
        match kind {
            ExpKind::Constant => self.gen_constant(r),
            ExpKind::Id => self.gen_id(r),
            ExpKind::Op => self.gen_op(r),
            ExpKind::Assign => self.gen_assign(r),
            ExpKind::Call => self.gen_call(r),
        }
    }

    fn gen_constant(&mut self, r: NodeRef) {
        let n = self.ast.node(r);
        if n.is_array {
            // string constant in the global region
            let offset = n.offset;
            let text = n.attr.string.map(|s| s.as_str().to_string()).unwrap_or_default();
            self.emit.emit_str_lit(offset, &text);
            self.emit
                .emit_rm(Opcode::Lda, AC, offset, GP, "Load address of char array");
            return;
        }
        let (value, comment) = match n.exp_type {
            ExpType::Char => (n.attr.cvalue as i32, "Load char constant"),
            ExpType::Boolean => (n.attr.value, "Load Boolean constant"),
            _ => (n.attr.value, "Load integer constant"),
        };
        self.emit.emit_rm(Opcode::Ldc, AC, value, AC3, comment);
    }

    fn offset_register(var_kind: VarKind) -> i32 {
        match var_kind {
            VarKind::Local | VarKind::Parameter | VarKind::None => FP,
            VarKind::Global | VarKind::LocalStatic => GP,
        }
    }

    fn gen_id(&mut self, r: NodeRef) {
        let (name, offset, var_kind, is_array) = {
            let n = self.ast.node(r);
            (n.name(), n.offset, n.var_kind, n.is_array)
        };
        let base = Self::offset_register(var_kind);
        if is_array {
            if var_kind == VarKind::Parameter {
                // array parameters hold the base address
                self.emit
                    .emit_rm(Opcode::Ld, AC, offset, FP, &format!("Load address of base of array {}", name));
            } else {
                self.emit
                    .emit_rm(Opcode::Lda, AC, offset, base, &format!("Load address of base of array {}", name));
            }
        } else {
            self.emit
                .emit_rm(Opcode::Ld, AC, offset, base, &format!("Load variable {}", name));
        }
    }

    fn binary_opcode(op: TokenKind) -> Option<Opcode> {
        let opcode = match op {
            TokenKind::Plus | TokenKind::AddAss => Opcode::Add,
            TokenKind::Minus | TokenKind::SubAss => Opcode::Sub,
            TokenKind::Star | TokenKind::MulAss => Opcode::Mul,
            TokenKind::Slash | TokenKind::DivAss => Opcode::Div,
            TokenKind::Percent => Opcode::Mod,
            TokenKind::And => Opcode::And,
            TokenKind::Or => Opcode::Or,
            TokenKind::Eq => Opcode::Teq,
            TokenKind::Neq => Opcode::Tne,
            TokenKind::Lt => Opcode::Tlt,
            TokenKind::Leq => Opcode::Tle,
            TokenKind::Gt => Opcode::Tgt,
            TokenKind::Geq => Opcode::Tge,
            _ => return None,
        };
        Some(opcode)
    }

    fn gen_op(&mut self, r: NodeRef) {
        let (op, c0, c1) = {
            let n = self.ast.node(r);
            (n.attr.op, n.child[0], n.child[1])
        };
        let Some(op) = op else { return };

        match c1 {
            Some(c1) => {
                // binary: left, push, right, pop
                self.gen_opt_exp(c0);
                self.emit.emit_rm(Opcode::St, AC, self.toffset, FP, "Push left side");
                self.toffset -= 1;
                let kind = self.exp_kind(c1);
                self.gen_exp(c1, kind);
                self.toffset += 1;
                self.emit.emit_rm(Opcode::Ld, AC1, self.toffset, FP, "Pop left into ac1");

                match op {
                    TokenKind::LBracket => {
                        self.emit
                            .emit_ro(Opcode::Sub, AC, AC1, AC, "compute location from index in ac");
                        self.emit.emit_rm(Opcode::Ld, AC, 0, AC, "Load the value");
                    }
                    TokenKind::Min => {
                        self.emit.emit_ro(Opcode::Swp, AC, AC1, AC, "Op :<:");
                    }
                    TokenKind::Max => {
                        self.emit.emit_ro(Opcode::Swp, AC1, AC, AC, "Op :>:");
                    }
                    _ => match Self::binary_opcode(op) {
                        Some(opcode) => {
                            self.emit
                                .emit_ro(opcode, AC, AC1, AC, &format!("Op {}", op.text()));
                        }
                        None => log::error!("no opcode for binary operator '{}'", op.text()),
                    },
                }
            }
            None => {
                // unary
                self.gen_opt_exp(c0);
                match op {
                    TokenKind::Chsign => {
                        self.emit.emit_ro(Opcode::Neg, AC, AC, AC, "Op unary -");
                    }
                    TokenKind::Not => {
                        self.emit.emit_rm(Opcode::Ldc, AC1, 1, AC3, "Load 1");
                        self.emit.emit_ro(Opcode::Xor, AC, AC, AC1, "Op XOR to get logical not");
                    }
                    TokenKind::Question => {
                        self.emit.emit_ro(Opcode::Rnd, AC, AC, AC, "Op ?");
                    }
                    TokenKind::Sizeof => {
                        self.emit.emit_rm(Opcode::Ld, AC, 1, AC, "Load array size");
                    }
                    _ => log::error!("no opcode for unary operator '{}'", op.text()),
                }
            }
        }
    }

    fn gen_call(&mut self, r: NodeRef) {
        let (name, args) = {
            let n = self.ast.node(r);
            (n.name(), n.child[0])
        };
        self.comment_line_num(r);
        self.emit.emit_comment(&format!("CALL {}", name));

        let saved_toffset = self.toffset;
        self.emit
            .emit_rm(Opcode::St, FP, self.toffset, FP, &format!("Store fp in ghost frame for {}", name));
        // ghost frame: old fp and return address
        self.toffset -= 2;

        let mut param_num = 1;
        let mut arg = args;
        while let Some(a) = arg {
            self.emit.emit_comment(&format!("Param {}", param_num));
            let kind = self.exp_kind(a);
            self.gen_exp(a, kind);
            self.emit
                .emit_rm(Opcode::St, AC, self.toffset, FP, &format!("Push parameter {}", param_num));
            self.toffset -= 1;
            param_num += 1;
            arg = self.ast.node(a).sibling;
        }

        self.emit.emit_comment(&format!("Param end {}", name));
        self.emit
            .emit_rm(Opcode::Lda, FP, saved_toffset, FP, "Ghost frame becomes new active frame");
        self.emit.emit_rm(Opcode::Lda, AC, 1, PC, "Return address in ac");

        match self.globals.lookup(name) {
            Some(decl) => match self.func_entries.get(&decl) {
                Some(&entry) => {
                    self.emit.emit_goto_abs(entry, &format!("CALL {}", name));
                }
                None => {
                    // callee not emitted yet, patch when its entry is known
                    let slot = self.emit.emit_skip(1);
                    self.call_fixups.push((slot, decl));
                }
            },
            None => {
                self.diag
                    .linker_error(format!("Procedure {} is not defined.", name));
                self.emit.emit_skip(1);
            }
        }

        self.toffset = saved_toffset;
        self.emit.emit_comment(&format!("TOFF set: {}", self.toffset));
        self.emit.emit_rm(Opcode::Lda, AC, 0, RT, "save the result in ac");
    }

    /// Load the base address of an array into AC2 for an indexed store.
    fn load_array_base(&mut self, array: NodeRef) {
        let (name, offset, var_kind) = {
            let n = self.ast.node(array);
            (n.name(), n.offset, n.var_kind)
        };
        let base = Self::offset_register(var_kind);
        if var_kind == VarKind::Parameter {
            self.emit
                .emit_rm(Opcode::Ld, AC2, offset, FP, &format!("Load address of base of array {}", name));
        } else {
            self.emit
                .emit_rm(Opcode::Lda, AC2, offset, base, &format!("Load address of base of array {}", name));
        }
    }

    fn gen_assign(&mut self, r: NodeRef) {
        let (op, c0, c1) = {
            let n = self.ast.node(r);
            (n.attr.op, n.child[0], n.child[1])
        };
        let Some(op) = op else { return };
        let Some(c0) = c0 else { return };
        self.comment_line_num(r);

        let lhs = self.ast.node(c0);
        let indexed = lhs.kind == NodeKind::Exp(ExpKind::Op) && lhs.attr.op == Some(TokenKind::LBracket);

        if indexed {
            self.gen_indexed_assign(op, c0, c1);
        } else {
            self.gen_scalar_assign(op, c0, c1);
        }
    }

    fn gen_scalar_assign(&mut self, op: TokenKind, c0: NodeRef, rhs: Option<NodeRef>) {
        let (name, offset, var_kind) = {
            let n = self.ast.node(c0);
            (n.name(), n.offset, n.var_kind)
        };
        let base = Self::offset_register(var_kind);
        match op {
            TokenKind::Assign => {
                self.gen_opt_exp(rhs);
                self.emit
                    .emit_rm(Opcode::St, AC, offset, base, &format!("Store variable {}", name));
            }
            TokenKind::Inc | TokenKind::Dec => {
                self.emit
                    .emit_rm(Opcode::Ld, AC, offset, base, &format!("load lhs variable {}", name));
                let delta = if op == TokenKind::Inc { 1 } else { -1 };
                let verb = if op == TokenKind::Inc { "increment" } else { "decrement" };
                self.emit
                    .emit_rm(Opcode::Lda, AC, delta, AC, &format!("{} value of {}", verb, name));
                self.emit
                    .emit_rm(Opcode::St, AC, offset, base, &format!("Store variable {}", name));
            }
            _ => {
                // compound assignment
                self.gen_opt_exp(rhs);
                self.emit
                    .emit_rm(Opcode::Ld, AC1, offset, base, &format!("load lhs variable {}", name));
                match Self::binary_opcode(op) {
                    Some(opcode) => {
                        self.emit.emit_ro(opcode, AC, AC1, AC, &format!("op {}", op.text()));
                    }
                    None => log::error!("no opcode for assignment operator '{}'", op.text()),
                }
                self.emit
                    .emit_rm(Opcode::St, AC, offset, base, &format!("Store variable {}", name));
            }
        }
    }

    fn gen_indexed_assign(&mut self, op: TokenKind, lhs: NodeRef, rhs: Option<NodeRef>) {
        let (array, index) = {
            let n = self.ast.node(lhs);
            (n.child[0], n.child[1])
        };
        let Some(array) = array else { return };
        let name = self.ast.node(array).name();

        match op {
            TokenKind::Inc | TokenKind::Dec => {
                self.gen_opt_exp(index);
                self.load_array_base(array);
                self.emit
                    .emit_ro(Opcode::Sub, AC2, AC2, AC, "Compute location from index in ac");
                self.emit
                    .emit_rm(Opcode::Ld, AC, 0, AC2, &format!("load lhs variable {}", name));
                let delta = if op == TokenKind::Inc { 1 } else { -1 };
                let verb = if op == TokenKind::Inc { "increment" } else { "decrement" };
                self.emit
                    .emit_rm(Opcode::Lda, AC, delta, AC, &format!("{} value of {}", verb, name));
                self.emit
                    .emit_rm(Opcode::St, AC, 0, AC2, &format!("Store variable {}", name));
            }
            _ => {
                self.gen_opt_exp(index);
                self.emit.emit_rm(Opcode::St, AC, self.toffset, FP, "Push index");
                self.toffset -= 1;
                self.gen_opt_exp(rhs);
                self.toffset += 1;
                self.emit.emit_rm(Opcode::Ld, AC1, self.toffset, FP, "Pop index");
                self.load_array_base(array);
                self.emit
                    .emit_ro(Opcode::Sub, AC2, AC2, AC1, "Compute offset of value");
                if op == TokenKind::Assign {
                    self.emit
                        .emit_rm(Opcode::St, AC, 0, AC2, &format!("Store variable {}", name));
                } else {
                    self.emit
                        .emit_rm(Opcode::Ld, AC1, 0, AC2, &format!("load lhs variable {}", name));
                    match Self::binary_opcode(op) {
                        Some(opcode) => {
                            self.emit.emit_ro(opcode, AC, AC1, AC, &format!("op {}", op.text()));
                        }
                        None => log::error!("no opcode for assignment operator '{}'", op.text()),
                    }
                    self.emit
                        .emit_rm(Opcode::St, AC, 0, AC2, &format!("Store variable {}", name));
                }
            }
        }
    }

    // ----- init block ---------------------------------------------------

    fn gen_init(&mut self, init_jump: i32, global_offset: i32) {
        self.emit.backpatch_jump_to_here(init_jump, "Jump to init [backpatch]");
        self.emit.emit_comment("INIT");
        self.toffset = -2;
        self.emit
            .emit_rm(Opcode::Lda, FP, global_offset, GP, "set first frame at end of globals");
        self.emit.emit_rm(Opcode::St, FP, 0, FP, "store old fp (point to self)");

        self.emit.emit_comment("INIT GLOBALS AND STATICS");
        let globals: Vec<NodeRef> = self.globals.all_globals().map(|(_, r)| r).collect();
        for g in globals {
            let (name, kind, offset, size, is_array, init) = {
                let n = self.ast.node(g);
                (n.name(), n.kind, n.offset, n.size, n.is_array, n.child[0])
            };
            if kind != NodeKind::Decl(DeclKind::Var) {
                continue;
            }
            if is_array {
                self.emit
                    .emit_rm(Opcode::Ldc, AC, size - 1, AC3, &format!("load size of array {}", name));
                self.emit
                    .emit_rm(Opcode::St, AC, offset + 1, GP, &format!("save size of array {}", name));
            }
            if let Some(init) = init {
                let kind = self.exp_kind(init);
                self.gen_exp(init, kind);
                self.emit
                    .emit_rm(Opcode::St, AC, offset, GP, &format!("Store variable {}", name));
            }
        }
        self.emit.emit_comment("END INIT GLOBALS AND STATICS");

        self.emit.emit_rm(Opcode::Lda, AC, 1, PC, "Return address in ac");
        let main_entry = self
            .globals
            .lookup(Symbol::from("main"))
            .and_then(|decl| self.func_entries.get(&decl).copied());
        match main_entry {
            Some(entry) => {
                self.emit.emit_goto_abs(entry, "Jump to main");
            }
            None => {
                self.diag.linker_error("Procedure main is not defined.".to_string());
                self.emit.emit_skip(1);
            }
        }
        self.emit.emit_ro(Opcode::Halt, 0, 0, 0, "DONE!");

        // anything still unresolved here was never emitted
        let unresolved: Vec<NodeRef> = self.call_fixups.iter().map(|(_, f)| *f).collect();
        for f in unresolved {
            let name = self.ast.node(f).name();
            self.diag.linker_error(format!("Procedure {} is not defined.", name));
        }
        self.call_fixups.clear();
    }
}
