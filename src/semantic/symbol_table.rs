//! Symbol table management and scope handling.
//!
//! A stack of named scopes mapping identifiers to AST nodes. The bottom
//! frame is the global scope; it is never popped and its bindings can be
//! walked in insertion order, which the code generator's init block relies
//! on for deterministic output.

use hashbrown::HashMap;
use log::debug;

use crate::ast::{NodeRef, Symbol};

/// One scope frame. `order` mirrors the map keys in insertion order.
#[derive(Debug)]
struct Scope {
    name: String,
    symbols: HashMap<Symbol, NodeRef>,
    order: Vec<Symbol>,
}

impl Scope {
    fn new(name: &str) -> Self {
        Scope {
            name: name.to_string(),
            symbols: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn insert(&mut self, name: Symbol, node: NodeRef) -> bool {
        if self.symbols.contains_key(&name) {
            return false;
        }
        self.symbols.insert(name, node);
        self.order.push(name);
        true
    }
}

/// Stack of scopes with innermost-to-outermost lookup.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table holding only the global scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new("Global")],
        }
    }

    /// Push a new scope with the given label.
    pub fn enter(&mut self, name: &str) {
        debug!("symtab: enter scope '{}', depth {}", name, self.scopes.len() + 1);
        self.scopes.push(Scope::new(name));
    }

    /// Pop the current scope. The global scope is never popped.
    pub fn leave(&mut self) {
        if self.scopes.len() > 1 {
            let scope = self.scopes.pop();
            debug!(
                "symtab: leave scope '{}', depth {}",
                scope.map(|s| s.name).unwrap_or_default(),
                self.scopes.len()
            );
        } else {
            debug!("symtab: attempted to leave the global scope");
        }
    }

    /// Number of open scopes; 1 at global scope.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Insert into the current scope. Fails when the name is already bound
    /// in this scope.
    pub fn insert(&mut self, name: Symbol, node: NodeRef) -> bool {
        self.scopes
            .last_mut()
            .map(|scope| scope.insert(name, node))
            .unwrap_or(false)
    }

    /// Force an insertion into the bottom (global) frame.
    pub fn insert_global(&mut self, name: Symbol, node: NodeRef) -> bool {
        self.scopes[0].insert(name, node)
    }

    /// Search innermost to outermost for a binding.
    pub fn lookup(&self, name: Symbol) -> Option<NodeRef> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(&name).copied())
    }

    /// Search only the bottom (global) frame.
    pub fn lookup_global(&self, name: Symbol) -> Option<NodeRef> {
        self.scopes[0].symbols.get(&name).copied()
    }

    /// All global bindings in insertion order.
    pub fn all_globals(&self) -> impl Iterator<Item = (Symbol, NodeRef)> + '_ {
        let scope = &self.scopes[0];
        scope.order.iter().map(move |name| (*name, scope.symbols[name]))
    }
}
