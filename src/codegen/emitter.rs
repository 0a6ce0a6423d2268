//! TVM instruction buffer and assembly rendering.
//!
//! The emitter is an append-only buffer of addressed instruction slots
//! interleaved with unaddressed comment and string-data lines. A slot is
//! either filled at emission time or reserved with [`Emitter::emit_skip`]
//! and filled later by one of the backpatch methods; those are the only two
//! ways a slot ever changes. Rendering produces the textual TVM assembly,
//! addresses starting at 0.

use std::fmt::Write as _;

// register conventions shared with the code generator
pub const GP: i32 = 0;
pub const FP: i32 = 1;
pub const RT: i32 = 2;
pub const AC: i32 = 3;
pub const AC1: i32 = 4;
pub const AC2: i32 = 5;
pub const AC3: i32 = 6;
pub const PC: i32 = 7;

/// TVM opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    // register-only format: op a,b,c
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Neg,
    /// Orders two registers: the larger value lands in the third operand,
    /// the smaller in the first (first written last).
    Swp,
    /// Random value in [0, reg).
    Rnd,
    /// Range-continue predicate: 1 when reg[b] <= reg[c].
    Slt,
    Teq,
    Tne,
    Tlt,
    Tle,
    Tgt,
    Tge,
    In,
    Inb,
    Inc,
    Out,
    Outb,
    Outc,
    Outnl,
    Halt,
    // register-memory format: op r,d(s)
    Ld,
    St,
    Lda,
    Ldc,
    Jmp,
    Jnz,
    Jzr,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Neg => "NEG",
            Opcode::Swp => "SWP",
            Opcode::Rnd => "RND",
            Opcode::Slt => "SLT",
            Opcode::Teq => "TEQ",
            Opcode::Tne => "TNE",
            Opcode::Tlt => "TLT",
            Opcode::Tle => "TLE",
            Opcode::Tgt => "TGT",
            Opcode::Tge => "TGE",
            Opcode::In => "IN",
            Opcode::Inb => "INB",
            Opcode::Inc => "INC",
            Opcode::Out => "OUT",
            Opcode::Outb => "OUTB",
            Opcode::Outc => "OUTC",
            Opcode::Outnl => "OUTNL",
            Opcode::Halt => "HALT",
            Opcode::Ld => "LD",
            Opcode::St => "ST",
            Opcode::Lda => "LDA",
            Opcode::Ldc => "LDC",
            Opcode::Jmp => "JMP",
            Opcode::Jnz => "JNZ",
            Opcode::Jzr => "JZR",
        }
    }

    pub fn is_rm(self) -> bool {
        matches!(
            self,
            Opcode::Ld | Opcode::St | Opcode::Lda | Opcode::Ldc | Opcode::Jmp | Opcode::Jnz | Opcode::Jzr
        )
    }
}

#[derive(Debug, Clone)]
enum Operands {
    Ro { a: i32, b: i32, c: i32 },
    Rm { r: i32, d: i32, s: i32 },
}

#[derive(Debug, Clone)]
struct Instruction {
    op: Opcode,
    operands: Operands,
    comment: String,
}

#[derive(Debug, Clone)]
enum Line {
    /// Addressed slot (index into `slots`).
    Instr(usize),
    Comment(String),
    StrLit { offset: i32, text: String },
}

/// Append-only instruction buffer with reserve/backpatch.
#[derive(Debug, Default)]
pub struct Emitter {
    slots: Vec<Option<Instruction>>,
    lines: Vec<Line>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address the next emitted instruction will occupy.
    pub fn current_loc(&self) -> i32 {
        self.slots.len() as i32
    }

    fn push_instr(&mut self, instr: Instruction) -> i32 {
        let addr = self.slots.len();
        self.slots.push(Some(instr));
        self.lines.push(Line::Instr(addr));
        addr as i32
    }

    /// Emit a register-only instruction `op a,b,c`.
    pub fn emit_ro(&mut self, op: Opcode, a: i32, b: i32, c: i32, comment: &str) -> i32 {
        debug_assert!(!op.is_rm(), "{} is not a register-only op", op.mnemonic());
        self.push_instr(Instruction {
            op,
            operands: Operands::Ro { a, b, c },
            comment: comment.to_string(),
        })
    }

    /// Emit a register-memory instruction `op r,d(s)`.
    pub fn emit_rm(&mut self, op: Opcode, r: i32, d: i32, s: i32, comment: &str) -> i32 {
        debug_assert!(op.is_rm(), "{} is not a register-memory op", op.mnemonic());
        self.push_instr(Instruction {
            op,
            operands: Operands::Rm { r, d, s },
            comment: comment.to_string(),
        })
    }

    /// Emit a register-memory instruction targeting an absolute address,
    /// converted to PC-relative form.
    pub fn emit_rm_abs(&mut self, op: Opcode, r: i32, abs_addr: i32, comment: &str) -> i32 {
        let d = abs_addr - (self.current_loc() + 1);
        self.emit_rm(op, r, d, PC, comment)
    }

    /// Unconditional register-relative jump.
    pub fn emit_goto(&mut self, d: i32, s: i32, comment: &str) -> i32 {
        self.emit_rm(Opcode::Jmp, PC, d, s, comment)
    }

    /// Unconditional jump to an absolute address.
    pub fn emit_goto_abs(&mut self, abs_addr: i32, comment: &str) -> i32 {
        self.emit_rm_abs(Opcode::Jmp, PC, abs_addr, comment)
    }

    /// Record string data for the TVM loader: bytes at global offsets
    /// `offset, offset-1, ...`, the length at `offset+1`.
    pub fn emit_str_lit(&mut self, offset: i32, text: &str) {
        self.lines.push(Line::StrLit {
            offset,
            text: text.to_string(),
        });
    }

    /// Emit a comment line. Carries no address.
    pub fn emit_comment(&mut self, text: &str) {
        self.lines.push(Line::Comment(text.to_string()));
    }

    /// Reserve `n` slots and return the address of the first. `n = 0`
    /// returns the current address without advancing.
    pub fn emit_skip(&mut self, n: usize) -> i32 {
        let loc = self.current_loc();
        for _ in 0..n {
            let addr = self.slots.len();
            self.slots.push(None);
            self.lines.push(Line::Instr(addr));
        }
        loc
    }

    fn patch(&mut self, loc: i32, op: Opcode, r: i32, target: i32, comment: &str) {
        let slot = &mut self.slots[loc as usize];
        debug_assert!(slot.is_none(), "slot {} already filled", loc);
        *slot = Some(Instruction {
            op,
            operands: Operands::Rm {
                r,
                d: target - (loc + 1),
                s: PC,
            },
            comment: comment.to_string(),
        });
    }

    /// Fill a reserved slot with an unconditional jump to `target`.
    pub fn patch_goto_abs(&mut self, loc: i32, target: i32, comment: &str) {
        self.patch(loc, Opcode::Jmp, PC, target, comment);
    }

    /// Fill a reserved slot with an unconditional jump to the current
    /// address.
    pub fn backpatch_jump_to_here(&mut self, loc: i32, comment: &str) {
        let here = self.current_loc();
        self.patch_goto_abs(loc, here, comment);
    }

    /// Fill a reserved slot with a conditional branch on register `r` to
    /// the current address.
    pub fn backpatch_branch_to_here(&mut self, op: Opcode, r: i32, loc: i32, comment: &str) {
        debug_assert!(matches!(op, Opcode::Jnz | Opcode::Jzr));
        let here = self.current_loc();
        self.patch(loc, op, r, here, comment);
    }

    /// Render the buffer as TVM assembly text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Comment(text) => {
                    let _ = writeln!(out, "* {}", text);
                }
                Line::StrLit { offset, text } => {
                    let _ = writeln!(out, ".SDATA  {}  \"{}\"", offset, text.escape_default());
                }
                Line::Instr(addr) => match &self.slots[*addr] {
                    Some(instr) => {
                        let _ = match instr.operands {
                            Operands::Ro { a, b, c } => writeln!(
                                out,
                                "{:3}:  {:>5}  {},{},{}\t{}",
                                addr,
                                instr.op.mnemonic(),
                                a,
                                b,
                                c,
                                instr.comment
                            ),
                            Operands::Rm { r, d, s } => writeln!(
                                out,
                                "{:3}:  {:>5}  {},{}({})\t{}",
                                addr,
                                instr.op.mnemonic(),
                                r,
                                d,
                                s,
                                instr.comment
                            ),
                        };
                    }
                    None => {
                        let _ = writeln!(out, "{:3}:  *unpatched*", addr);
                    }
                },
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_are_sequential() {
        let mut emit = Emitter::new();
        assert_eq!(emit.emit_skip(0), 0);
        emit.emit_ro(Opcode::Add, AC, AC1, AC, "");
        emit.emit_rm(Opcode::Ld, AC, -1, FP, "");
        emit.emit_comment("comments carry no address");
        emit.emit_rm(Opcode::St, AC, -2, FP, "");
        assert_eq!(emit.emit_skip(0), 3);
    }

    #[test]
    fn skip_reserves_and_backpatch_fills() {
        let mut emit = Emitter::new();
        let loc = emit.emit_skip(1);
        assert_eq!(loc, 0);
        emit.emit_ro(Opcode::Outnl, AC, AC, AC, "");
        emit.emit_ro(Opcode::Outnl, AC, AC, AC, "");
        emit.backpatch_jump_to_here(loc, "jump over");
        let text = emit.render();
        // target 3 from slot 0: pc-relative displacement 2
        assert!(text.contains("  0:    JMP  7,2(7)"), "got:\n{}", text);
    }

    #[test]
    fn conditional_backpatch_branches_on_register() {
        let mut emit = Emitter::new();
        emit.emit_ro(Opcode::Teq, AC, AC1, AC, "");
        let loc = emit.emit_skip(1);
        emit.emit_ro(Opcode::Outnl, AC, AC, AC, "");
        emit.backpatch_branch_to_here(Opcode::Jzr, AC, loc, "skip then");
        let text = emit.render();
        assert!(text.contains("  1:    JZR  3,1(7)"), "got:\n{}", text);
    }

    #[test]
    fn goto_abs_is_pc_relative() {
        let mut emit = Emitter::new();
        emit.emit_ro(Opcode::Outnl, AC, AC, AC, "");
        emit.emit_ro(Opcode::Outnl, AC, AC, AC, "");
        emit.emit_goto_abs(0, "loop");
        let text = emit.render();
        // from address 2, target 0 is displacement -3
        assert!(text.contains("  2:    JMP  7,-3(7)"), "got:\n{}", text);
    }

    #[test]
    fn renders_ro_and_rm_formats() {
        let mut emit = Emitter::new();
        emit.emit_ro(Opcode::Add, 3, 4, 3, "Op +");
        emit.emit_rm(Opcode::Ld, 3, -1, 1, "Load return address");
        emit.emit_str_lit(-3, "hi");
        let text = emit.render();
        assert!(text.contains("  0:    ADD  3,4,3\tOp +"));
        assert!(text.contains("  1:     LD  3,-1(1)\tLoad return address"));
        assert!(text.contains(".SDATA  -3  \"hi\""));
    }
}
