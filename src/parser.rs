//! Recursive-descent parser for bC.
//!
//! Builds the three-child/sibling AST consumed by the semantic analyzer.
//! There is no recovery mode: the first syntax error is reported through the
//! diagnostic engine and parsing stops.

use thiserror::Error;

use crate::ast::{Ast, DeclKind, ExpKind, ExpType, NodeKind, NodeRef, StmtKind, Symbol};
use crate::diagnostic::DiagnosticEngine;
use crate::lexer::{Token, TokenKind};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected token '{found}', expecting {expected}.")]
    UnexpectedToken {
        found: String,
        expected: String,
        lineno: i32,
    },

    #[error("unexpected end of input, expecting {expected}.")]
    UnexpectedEof { expected: String, lineno: i32 },

    #[error("{message}")]
    Invalid { message: String, lineno: i32 },
}

impl ParseError {
    fn lineno(&self) -> i32 {
        match self {
            ParseError::UnexpectedToken { lineno, .. } => *lineno,
            ParseError::UnexpectedEof { lineno, .. } => *lineno,
            ParseError::Invalid { lineno, .. } => *lineno,
        }
    }
}

/// Parse a whole program. Returns the head of the top-level declaration
/// chain, or `None` when the program is empty or a syntax error was
/// reported.
pub fn parse_program(tokens: &[Token], ast: &mut Ast, diag: &mut DiagnosticEngine) -> Option<NodeRef> {
    let mut parser = Parser { tokens, pos: 0, ast };
    match parser.program() {
        Ok(root) => root,
        Err(err) => {
            diag.syntax_error(err.lineno(), err.to_string());
            None
        }
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    ast: &'a mut Ast,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek2_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn last_lineno(&self) -> i32 {
        self.tokens.last().map(|t| t.lineno).unwrap_or(1)
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => Ok(self.bump()),
            Some(token) => Err(ParseError::UnexpectedToken {
                found: token.text.as_str().to_string(),
                expected: format!("'{}'", kind.text()),
                lineno: token.lineno,
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: format!("'{}'", kind.text()),
                lineno: self.last_lineno(),
            }),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                found: token.text.as_str().to_string(),
                expected: expected.to_string(),
                lineno: token.lineno,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
                lineno: self.last_lineno(),
            },
        }
    }

    fn type_spec(kind: TokenKind) -> Option<ExpType> {
        match kind {
            TokenKind::Bool => Some(ExpType::Boolean),
            TokenKind::Char => Some(ExpType::Char),
            TokenKind::Int => Some(ExpType::Integer),
            TokenKind::Void => Some(ExpType::Void),
            _ => None,
        }
    }

    // program → decl*
    fn program(&mut self) -> Result<Option<NodeRef>, ParseError> {
        let mut root = None;
        while self.peek().is_some() {
            let decl = self.decl()?;
            root = self.ast.add_sibling(root, Some(decl));
        }
        Ok(root)
    }

    fn decl(&mut self) -> Result<NodeRef, ParseError> {
        if self.eat(TokenKind::Static) {
            let exp_type = self
                .peek_kind()
                .and_then(Self::type_spec)
                .ok_or_else(|| self.unexpected("a type specifier"))?;
            self.bump();
            return self.var_decl_tail(exp_type, true);
        }

        if let Some(exp_type) = self.peek_kind().and_then(Self::type_spec) {
            self.bump();
            if self.peek2_kind() == Some(TokenKind::LParen) {
                let id = self.expect(TokenKind::Id)?;
                return self.fun_decl(exp_type, id);
            }
            return self.var_decl_tail(exp_type, false);
        }

        // untyped functions default to void
        if self.at(TokenKind::Id) && self.peek2_kind() == Some(TokenKind::LParen) {
            let id = self.bump();
            return self.fun_decl(ExpType::Void, id);
        }

        Err(self.unexpected("a declaration"))
    }

    // varDeclList → varDeclInit ("," varDeclInit)* ";"
    fn var_decl_tail(&mut self, exp_type: ExpType, is_static: bool) -> Result<NodeRef, ParseError> {
        let mut head = Some(self.var_decl_init()?);
        while self.eat(TokenKind::Comma) {
            let next = self.var_decl_init()?;
            head = self.ast.add_sibling(head, Some(next));
        }
        self.expect(TokenKind::Semi)?;
        self.ast.set_type(exp_type, head, is_static);
        Ok(head.expect("variable declaration chain cannot be empty"))
    }

    // varDeclInit → ID ["[" NUMCONST "]"] [":" simpleExp]
    fn var_decl_init(&mut self) -> Result<NodeRef, ParseError> {
        let id = self.expect(TokenKind::Id)?;
        let mut is_array = false;
        let mut size = 1;
        if self.eat(TokenKind::LBracket) {
            let len = self.expect(TokenKind::NumConst)?;
            self.expect(TokenKind::RBracket)?;
            is_array = true;
            size = len.ivalue + 1;
        }
        let init = if self.eat(TokenKind::Colon) {
            Some(self.simple_exp()?)
        } else {
            None
        };
        let var = self.ast.new_decl(DeclKind::Var, ExpType::Undefined, Some(&id), init, None, None);
        let node = self.ast.node_mut(var);
        node.is_array = is_array;
        node.size = size;
        Ok(var)
    }

    // funDecl → [typeSpec] ID "(" parms ")" stmt
    fn fun_decl(&mut self, exp_type: ExpType, id: Token) -> Result<NodeRef, ParseError> {
        self.expect(TokenKind::LParen)?;
        let parms = self.parms()?;
        self.expect(TokenKind::RParen)?;
        let body = self.statement()?;
        Ok(self.ast.new_decl(DeclKind::Func, exp_type, Some(&id), parms, body, None))
    }

    // parms → [parmTypeList (";" parmTypeList)*]
    fn parms(&mut self) -> Result<Option<NodeRef>, ParseError> {
        if self.at(TokenKind::RParen) {
            return Ok(None);
        }
        let mut head = self.parm_type_list()?;
        while self.eat(TokenKind::Semi) {
            let group = self.parm_type_list()?;
            head = self.ast.add_sibling(head, group);
        }
        Ok(head)
    }

    // parmTypeList → typeSpec parmId ("," parmId)*
    fn parm_type_list(&mut self) -> Result<Option<NodeRef>, ParseError> {
        let exp_type = self
            .peek_kind()
            .and_then(Self::type_spec)
            .ok_or_else(|| self.unexpected("a type specifier"))?;
        self.bump();
        let mut head = Some(self.parm_id()?);
        while self.eat(TokenKind::Comma) {
            let next = self.parm_id()?;
            head = self.ast.add_sibling(head, Some(next));
        }
        self.ast.set_type(exp_type, head, false);
        Ok(head)
    }

    // parmId → ID ["[" "]"]
    fn parm_id(&mut self) -> Result<NodeRef, ParseError> {
        let id = self.expect(TokenKind::Id)?;
        let parm = self
            .ast
            .new_decl(DeclKind::Param, ExpType::Undefined, Some(&id), None, None, None);
        if self.eat(TokenKind::LBracket) {
            self.expect(TokenKind::RBracket)?;
            self.ast.node_mut(parm).is_array = true;
        }
        Ok(parm)
    }

    fn statement(&mut self) -> Result<Option<NodeRef>, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::LBrace) => self.compound_stmt().map(Some),
            Some(TokenKind::If) => self.if_stmt().map(Some),
            Some(TokenKind::While) => self.while_stmt().map(Some),
            Some(TokenKind::For) => self.for_stmt().map(Some),
            Some(TokenKind::Return) => self.return_stmt().map(Some),
            Some(TokenKind::Break) => {
                let tok = self.bump();
                self.expect(TokenKind::Semi)?;
                Ok(Some(self.ast.new_stmt(StmtKind::Break, Some(&tok), None, None, None)))
            }
            Some(TokenKind::Semi) => {
                self.bump();
                Ok(None)
            }
            Some(_) => {
                let exp = self.exp()?;
                self.expect(TokenKind::Semi)?;
                Ok(Some(exp))
            }
            None => Err(self.unexpected("a statement")),
        }
    }

    // compoundStmt → "{" localDecls stmt* "}"
    fn compound_stmt(&mut self) -> Result<NodeRef, ParseError> {
        let brace = self.expect(TokenKind::LBrace)?;

        let mut decls = None;
        loop {
            let decl = if self.eat(TokenKind::Static) {
                let exp_type = self
                    .peek_kind()
                    .and_then(Self::type_spec)
                    .ok_or_else(|| self.unexpected("a type specifier"))?;
                self.bump();
                self.var_decl_tail(exp_type, true)?
            } else if let Some(exp_type) = self.peek_kind().and_then(Self::type_spec) {
                self.bump();
                self.var_decl_tail(exp_type, false)?
            } else {
                break;
            };
            decls = self.ast.add_sibling(decls, Some(decl));
        }

        let mut stmts = None;
        while !self.at(TokenKind::RBrace) {
            if self.peek().is_none() {
                return Err(self.unexpected("'}'"));
            }
            let stmt = self.statement()?;
            stmts = self.ast.add_sibling(stmts, stmt);
        }
        self.bump();

        Ok(self.ast.new_stmt(StmtKind::Compound, Some(&brace), decls, stmts, None))
    }

    // selectStmt → "if" simpleExp "then" stmt ["else" stmt]
    fn if_stmt(&mut self) -> Result<NodeRef, ParseError> {
        let tok = self.bump();
        let test = self.simple_exp()?;
        self.expect(TokenKind::Then)?;
        let then_part = self.statement()?;
        let else_part = if self.eat(TokenKind::Else) {
            self.statement()?
        } else {
            None
        };
        Ok(self
            .ast
            .new_stmt(StmtKind::If, Some(&tok), Some(test), then_part, else_part))
    }

    // iterStmt → "while" simpleExp "do" stmt
    fn while_stmt(&mut self) -> Result<NodeRef, ParseError> {
        let tok = self.bump();
        let test = self.simple_exp()?;
        self.expect(TokenKind::Do)?;
        let body = self.statement()?;
        Ok(self.ast.new_stmt(StmtKind::While, Some(&tok), Some(test), body, None))
    }

    // iterStmt → "for" ID "=" simpleExp "to" simpleExp ["by" simpleExp] "do" stmt
    fn for_stmt(&mut self) -> Result<NodeRef, ParseError> {
        let tok = self.bump();
        let id = self.expect(TokenKind::Id)?;
        let index_var = self
            .ast
            .new_decl(DeclKind::Var, ExpType::Integer, Some(&id), None, None, None);
        self.expect(TokenKind::Assign)?;
        let start = self.simple_exp()?;
        let to = self.expect(TokenKind::To)?;
        let stop = self.simple_exp()?;
        let step = if self.eat(TokenKind::By) {
            Some(self.simple_exp()?)
        } else {
            None
        };
        self.expect(TokenKind::Do)?;
        let body = self.statement()?;
        let range = self.ast.new_stmt(StmtKind::Range, Some(&to), Some(start), Some(stop), step);
        Ok(self
            .ast
            .new_stmt(StmtKind::For, Some(&tok), Some(index_var), Some(range), body))
    }

    // returnStmt → "return" [exp] ";"
    fn return_stmt(&mut self) -> Result<NodeRef, ParseError> {
        let tok = self.bump();
        let value = if self.at(TokenKind::Semi) {
            None
        } else {
            Some(self.exp()?)
        };
        self.expect(TokenKind::Semi)?;
        Ok(self.ast.new_stmt(StmtKind::Return, Some(&tok), value, None, None))
    }

    fn is_mutable(&self, r: NodeRef) -> bool {
        let node = self.ast.node(r);
        match node.kind {
            NodeKind::Exp(ExpKind::Id) => true,
            NodeKind::Exp(ExpKind::Op) => node.attr.op == Some(TokenKind::LBracket),
            _ => false,
        }
    }

    // exp → mutable assignop exp | mutable ("++" | "--") | simpleExp
    fn exp(&mut self) -> Result<NodeRef, ParseError> {
        let lhs = self.simple_exp()?;
        match self.peek_kind() {
            Some(
                TokenKind::Assign
                | TokenKind::AddAss
                | TokenKind::SubAss
                | TokenKind::MulAss
                | TokenKind::DivAss,
            ) => {
                let op = self.bump();
                if !self.is_mutable(lhs) {
                    return Err(ParseError::Invalid {
                        message: format!("expecting a mutable target on the left of '{}'.", op.kind.text()),
                        lineno: op.lineno,
                    });
                }
                let rhs = self.exp()?;
                Ok(self
                    .ast
                    .new_exp(ExpKind::Assign, Some(&op), Some(lhs), Some(rhs), None))
            }
            Some(TokenKind::Inc | TokenKind::Dec) => {
                let op = self.bump();
                if !self.is_mutable(lhs) {
                    return Err(ParseError::Invalid {
                        message: format!("expecting a mutable target on the left of '{}'.", op.kind.text()),
                        lineno: op.lineno,
                    });
                }
                Ok(self.ast.new_exp(ExpKind::Assign, Some(&op), Some(lhs), None, None))
            }
            _ => Ok(lhs),
        }
    }

    // simpleExp → andExp ("or" andExp)*
    fn simple_exp(&mut self) -> Result<NodeRef, ParseError> {
        let mut lhs = self.and_exp()?;
        while self.at(TokenKind::Or) {
            let op = self.bump();
            let rhs = self.and_exp()?;
            lhs = self.ast.new_exp(ExpKind::Op, Some(&op), Some(lhs), Some(rhs), None);
        }
        Ok(lhs)
    }

    // andExp → unaryRelExp ("and" unaryRelExp)*
    fn and_exp(&mut self) -> Result<NodeRef, ParseError> {
        let mut lhs = self.unary_rel_exp()?;
        while self.at(TokenKind::And) {
            let op = self.bump();
            let rhs = self.unary_rel_exp()?;
            lhs = self.ast.new_exp(ExpKind::Op, Some(&op), Some(lhs), Some(rhs), None);
        }
        Ok(lhs)
    }

    // unaryRelExp → "not" unaryRelExp | relExp
    fn unary_rel_exp(&mut self) -> Result<NodeRef, ParseError> {
        if self.at(TokenKind::Not) {
            let op = self.bump();
            let operand = self.unary_rel_exp()?;
            return Ok(self.ast.new_exp(ExpKind::Op, Some(&op), Some(operand), None, None));
        }
        self.rel_exp()
    }

    // relExp → minmaxExp [relop minmaxExp]    (non-associative)
    fn rel_exp(&mut self) -> Result<NodeRef, ParseError> {
        let lhs = self.minmax_exp()?;
        match self.peek_kind() {
            Some(
                TokenKind::Lt | TokenKind::Leq | TokenKind::Gt | TokenKind::Geq | TokenKind::Eq | TokenKind::Neq,
            ) => {
                let op = self.bump();
                let rhs = self.minmax_exp()?;
                Ok(self.ast.new_exp(ExpKind::Op, Some(&op), Some(lhs), Some(rhs), None))
            }
            _ => Ok(lhs),
        }
    }

    // minmaxExp → sumExp ((":<:" | ":>:") sumExp)*
    fn minmax_exp(&mut self) -> Result<NodeRef, ParseError> {
        let mut lhs = self.sum_exp()?;
        while matches!(self.peek_kind(), Some(TokenKind::Min | TokenKind::Max)) {
            let op = self.bump();
            let rhs = self.sum_exp()?;
            lhs = self.ast.new_exp(ExpKind::Op, Some(&op), Some(lhs), Some(rhs), None);
        }
        Ok(lhs)
    }

    // sumExp → mulExp (("+" | "-") mulExp)*
    fn sum_exp(&mut self) -> Result<NodeRef, ParseError> {
        let mut lhs = self.mul_exp()?;
        while matches!(self.peek_kind(), Some(TokenKind::Plus | TokenKind::Minus)) {
            let op = self.bump();
            let rhs = self.mul_exp()?;
            lhs = self.ast.new_exp(ExpKind::Op, Some(&op), Some(lhs), Some(rhs), None);
        }
        Ok(lhs)
    }

    // mulExp → unaryExp (("*" | "/" | "%") unaryExp)*
    fn mul_exp(&mut self) -> Result<NodeRef, ParseError> {
        let mut lhs = self.unary_exp()?;
        while matches!(
            self.peek_kind(),
            Some(TokenKind::Star | TokenKind::Slash | TokenKind::Percent)
        ) {
            let op = self.bump();
            let rhs = self.unary_exp()?;
            lhs = self.ast.new_exp(ExpKind::Op, Some(&op), Some(lhs), Some(rhs), None);
        }
        Ok(lhs)
    }

    // unaryExp → ("-" | "?" | "sizeof") unaryExp | factor
    fn unary_exp(&mut self) -> Result<NodeRef, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Minus) => {
                let op = self.bump();
                let operand = self.unary_exp()?;
                let node = self.ast.new_exp(ExpKind::Op, Some(&op), Some(operand), None, None);
                // unary minus is its own operator class
                let attr = &mut self.ast.node_mut(node).attr;
                attr.op = Some(TokenKind::Chsign);
                attr.name = Some(Symbol::from(TokenKind::Chsign.text()));
                Ok(node)
            }
            Some(TokenKind::Question | TokenKind::Sizeof) => {
                let op = self.bump();
                let operand = self.unary_exp()?;
                Ok(self.ast.new_exp(ExpKind::Op, Some(&op), Some(operand), None, None))
            }
            _ => self.factor(),
        }
    }

    fn factor(&mut self) -> Result<NodeRef, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::LParen) => {
                self.bump();
                let exp = self.exp()?;
                self.expect(TokenKind::RParen)?;
                Ok(exp)
            }
            Some(TokenKind::Id) => {
                let id = self.bump();
                if self.at(TokenKind::LParen) {
                    return self.call(id);
                }
                if self.at(TokenKind::LBracket) {
                    let bracket = self.bump();
                    let base = self.ast.new_exp(ExpKind::Id, Some(&id), None, None, None);
                    let index = self.exp()?;
                    self.expect(TokenKind::RBracket)?;
                    return Ok(self
                        .ast
                        .new_exp(ExpKind::Op, Some(&bracket), Some(base), Some(index), None));
                }
                Ok(self.ast.new_exp(ExpKind::Id, Some(&id), None, None, None))
            }
            Some(TokenKind::NumConst) => {
                let tok = self.bump();
                let node = self.ast.new_exp(ExpKind::Constant, Some(&tok), None, None, None);
                let n = self.ast.node_mut(node);
                n.exp_type = ExpType::Integer;
                n.is_const = true;
                Ok(node)
            }
            Some(TokenKind::CharConst) => {
                let tok = self.bump();
                let node = self.ast.new_exp(ExpKind::Constant, Some(&tok), None, None, None);
                let n = self.ast.node_mut(node);
                n.exp_type = ExpType::Char;
                n.is_const = true;
                Ok(node)
            }
            Some(TokenKind::StringConst) => {
                let tok = self.bump();
                let len = tok.svalue.as_ref().map(|s| s.len()).unwrap_or(0) as i32;
                let node = self.ast.new_exp(ExpKind::Constant, Some(&tok), None, None, None);
                let n = self.ast.node_mut(node);
                n.exp_type = ExpType::Char;
                n.is_array = true;
                n.is_const = true;
                n.size = len + 1;
                Ok(node)
            }
            Some(TokenKind::BoolConst) => {
                let tok = self.bump();
                let node = self.ast.new_exp(ExpKind::Constant, Some(&tok), None, None, None);
                let n = self.ast.node_mut(node);
                n.exp_type = ExpType::Boolean;
                n.is_const = true;
                Ok(node)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    // call → ID "(" [exp ("," exp)*] ")"
    fn call(&mut self, id: Token) -> Result<NodeRef, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = None;
        if !self.at(TokenKind::RParen) {
            loop {
                let arg = self.exp()?;
                args = self.ast.add_sibling(args, Some(arg));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(self.ast.new_exp(ExpKind::Call, Some(&id), args, None, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> (Ast, Option<NodeRef>, DiagnosticEngine) {
        let mut diag = DiagnosticEngine::new();
        let tokens = Lexer::new(source).scan(&mut diag);
        let mut ast = Ast::new();
        let root = parse_program(&tokens, &mut ast, &mut diag);
        (ast, root, diag)
    }

    fn parse_ok(source: &str) -> (Ast, NodeRef) {
        let (ast, root, diag) = parse(source);
        assert!(!diag.has_errors(), "unexpected errors: {:?}", diag.render());
        (ast, root.expect("expected a root node"))
    }

    #[test]
    fn parses_global_variable_list() {
        let (ast, root) = parse_ok("int x, y[10], z : 3;");
        let decls = ast.siblings(Some(root));
        assert_eq!(decls.len(), 3);
        assert_eq!(ast.node(decls[0]).exp_type, ExpType::Integer);
        assert!(ast.node(decls[1]).is_array);
        assert_eq!(ast.node(decls[1]).size, 11);
        assert!(ast.node(decls[2]).child[0].is_some());
    }

    #[test]
    fn parses_function_with_grouped_params() {
        let (ast, root) = parse_ok("int f(int a, b; bool c[]) { return a; }");
        let func = ast.node(root);
        assert_eq!(func.kind, NodeKind::Decl(DeclKind::Func));
        let parms = ast.siblings(func.child[0]);
        assert_eq!(parms.len(), 3);
        assert_eq!(ast.node(parms[1]).exp_type, ExpType::Integer);
        assert_eq!(ast.node(parms[2]).exp_type, ExpType::Boolean);
        assert!(ast.node(parms[2]).is_array);
    }

    #[test]
    fn untyped_function_defaults_to_void() {
        let (ast, root) = parse_ok("main() { }");
        assert_eq!(ast.node(root).exp_type, ExpType::Void);
    }

    #[test]
    fn parses_if_then_else() {
        let (ast, root) = parse_ok("main() { if true then x(); else y(); }");
        let body = ast.node(root).child[1].expect("body");
        let stmt = ast.node(body).child[1].expect("statement list");
        let if_node = ast.node(stmt);
        assert_eq!(if_node.kind, NodeKind::Stmt(StmtKind::If));
        assert!(if_node.child[1].is_some());
        assert!(if_node.child[2].is_some());
    }

    #[test]
    fn parses_for_with_range() {
        let (ast, root) = parse_ok("main() { for i = 1 to 10 by 2 do x(); }");
        let body = ast.node(root).child[1].expect("body");
        let for_stmt = ast.node(body).child[1].expect("for");
        let for_node = ast.node(for_stmt);
        assert_eq!(for_node.kind, NodeKind::Stmt(StmtKind::For));
        let index = ast.node(for_node.child[0].expect("index variable"));
        assert_eq!(index.kind, NodeKind::Decl(DeclKind::Var));
        assert_eq!(index.exp_type, ExpType::Integer);
        let range = ast.node(for_node.child[1].expect("range"));
        assert_eq!(range.kind, NodeKind::Stmt(StmtKind::Range));
        assert!(range.child[2].is_some());
    }

    #[test]
    fn precedence_nests_or_above_and() {
        let (ast, root) = parse_ok("main() { x = a or b and c; }");
        let body = ast.node(root).child[1].expect("body");
        let assign = ast.node(body).child[1].expect("assign");
        let rhs = ast.node(assign).child[1].expect("rhs");
        let or_node = ast.node(rhs);
        assert_eq!(or_node.attr.op, Some(TokenKind::Or));
        let and_ref = or_node.child[1].expect("and operand");
        assert_eq!(ast.node(and_ref).attr.op, Some(TokenKind::And));
    }

    #[test]
    fn unary_minus_becomes_chsign() {
        let (ast, root) = parse_ok("main() { x = -y; }");
        let body = ast.node(root).child[1].expect("body");
        let assign = ast.node(body).child[1].expect("assign");
        let rhs = ast.node(assign).child[1].expect("rhs");
        assert_eq!(ast.node(rhs).attr.op, Some(TokenKind::Chsign));
        assert_eq!(ast.node(rhs).name().as_str(), "chsign");
    }

    #[test]
    fn indexed_assignment_keeps_bracket_node() {
        let (ast, root) = parse_ok("main() { a[3] = 7; }");
        let body = ast.node(root).child[1].expect("body");
        let assign_ref = ast.node(body).child[1].expect("assign");
        let assign = ast.node(assign_ref);
        assert_eq!(assign.kind, NodeKind::Exp(ExpKind::Assign));
        let lhs = ast.node(assign.child[0].expect("lhs"));
        assert_eq!(lhs.attr.op, Some(TokenKind::LBracket));
    }

    #[test]
    fn increment_parses_as_assignment() {
        let (ast, root) = parse_ok("main() { n++; }");
        let body = ast.node(root).child[1].expect("body");
        let stmt = ast.node(body).child[1].expect("stmt");
        let node = ast.node(stmt);
        assert_eq!(node.kind, NodeKind::Exp(ExpKind::Assign));
        assert_eq!(node.attr.op, Some(TokenKind::Inc));
        assert!(node.child[1].is_none());
    }

    #[test]
    fn rejects_assignment_to_literal() {
        let (_, root, diag) = parse("main() { 3 = x; }");
        assert!(diag.has_errors());
        assert!(root.is_none());
    }

    #[test]
    fn reports_first_syntax_error_only() {
        let (_, _, diag) = parse("int x int y;");
        assert_eq!(diag.num_errors(), 1);
        assert!(diag.render()[0].starts_with("SYNTAX ERROR(1):"));
    }
}
