//! Hierarchical symbol table.
//!
//! Scopes live in an arena and reference each other through integer
//! handles, so the tree has no ownership cycles: a scope owns its child
//! list and holds a non-owning handle to its parent.

use std::fmt;

use serde_json::{json, Map, Value};

use crate::token::Span;
use crate::types::Type;

// ---------------------------------------------------------------------------
// Handles & kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

pub const GLOBAL_SCOPE: ScopeId = ScopeId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Block,
    Function,
    Method,
    Class,
    LoopBody,
    SwitchCase,
    Catch,
}

impl ScopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::Block => "block",
            ScopeKind::Function => "function",
            ScopeKind::Method => "method",
            ScopeKind::Class => "class",
            ScopeKind::LoopBody => "loop_body",
            ScopeKind::SwitchCase => "switch_case",
            ScopeKind::Catch => "catch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Parameter,
    Function,
    Method,
    Class,
    Field,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Field => "field",
        }
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Concrete storage assigned by the memory annotator. `None` until the
/// annotator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageSlot {
    None,
    Global(u32),
    Stack(i32),
    Param(u32),
    Heap(u32),
}

impl fmt::Display for StorageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageSlot::None => write!(f, "none"),
            StorageSlot::Global(n) => write!(f, "global[{}]", n),
            StorageSlot::Stack(n) => {
                if *n >= 0 {
                    write!(f, "stack[+{}]", n)
                } else {
                    write!(f, "stack[{}]", n)
                }
            }
            StorageSlot::Param(n) => write!(f, "param[{}]", n),
            StorageSlot::Heap(n) => write!(f, "heap+{}", n),
        }
    }
}

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub mutable: bool,
    /// Declaration site.
    pub span: Span,
    pub storage: StorageSlot,
    /// Parameter types, for functions and methods.
    pub params: Vec<Type>,
    /// Return type, for functions and methods.
    pub ret: Option<Type>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: Type, span: Span) -> Self {
        let mutable = matches!(
            kind,
            SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Field
        );
        Self {
            name: name.into(),
            kind,
            ty,
            mutable,
            span,
            storage: StorageSlot::None,
            params: Vec::new(),
            ret: None,
        }
    }

    pub fn callable(
        name: impl Into<String>,
        kind: SymbolKind,
        params: Vec<Type>,
        ret: Type,
        span: Span,
    ) -> Self {
        let mut sym = Symbol::new(name, kind, Type::Void, span);
        sym.mutable = false;
        sym.params = params;
        sym.ret = Some(ret);
        sym
    }
}

// ---------------------------------------------------------------------------
// Scope & tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Debug name: "global", the function/class name, or the block kind.
    pub name: String,
    pub parent: Option<ScopeId>,
    /// Symbols in declaration order; layout passes depend on it.
    pub symbols: Vec<Symbol>,
    pub children: Vec<ScopeId>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.iter_mut().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                name: "global".into(),
                parent: None,
                symbols: Vec::new(),
                children: Vec::new(),
            }],
            current: GLOBAL_SCOPE,
        }
    }

    pub fn current_id(&self) -> ScopeId {
        self.current
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        false // the global scope always exists
    }

    /// Push a child of the current scope and make it current.
    pub fn enter(&mut self, kind: ScopeKind, name: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            name: name.into(),
            parent: Some(self.current),
            symbols: Vec::new(),
            children: Vec::new(),
        });
        self.scopes[self.current.0].children.push(id);
        self.current = id;
        id
    }

    /// Pop back to the parent scope. Leaving the global scope is a no-op.
    pub fn leave(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            self.current = parent;
        }
    }

    /// Define a symbol in the current scope. Names are unique per scope
    /// across all symbol kinds.
    pub fn define(&mut self, symbol: Symbol) -> Result<(), String> {
        let scope = &mut self.scopes[self.current.0];
        if scope.get(&symbol.name).is_some() {
            return Err(symbol.name);
        }
        scope.symbols.push(symbol);
        Ok(())
    }

    /// Innermost definition of `name` visible from the current scope.
    pub fn lookup(&self, name: &str) -> Option<(&Symbol, ScopeId)> {
        self.lookup_from(self.current, name)
    }

    pub fn lookup_from(&self, start: ScopeId, name: &str) -> Option<(&Symbol, ScopeId)> {
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            if let Some(sym) = self.scopes[id.0].get(name) {
                return Some((sym, id));
            }
            cursor = self.scopes[id.0].parent;
        }
        None
    }

    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes[self.current.0].get(name)
    }

    /// Serialize the tree in the wire layout:
    /// `{ name, kind, symbols: { name -> { type, kind, mutable, address } }, children: [..] }`.
    /// Symbol keys come out sorted, which keeps the output deterministic.
    pub fn to_json(&self) -> Value {
        self.scope_json(GLOBAL_SCOPE)
    }

    fn scope_json(&self, id: ScopeId) -> Value {
        let scope = self.scope(id);
        let mut symbols = Map::new();
        for sym in &scope.symbols {
            symbols.insert(
                sym.name.clone(),
                json!({
                    "type": sym.ty.to_string(),
                    "kind": sym.kind.as_str(),
                    "mutable": sym.mutable,
                    "address": sym.storage.to_string(),
                }),
            );
        }
        let children: Vec<Value> = scope.children.iter().map(|c| self.scope_json(*c)).collect();
        json!({
            "name": scope.name,
            "kind": scope.kind.as_str(),
            "symbols": Value::Object(symbols),
            "children": children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str, kind: SymbolKind, ty: Type) -> Symbol {
        Symbol::new(name, kind, ty, Span::default())
    }

    #[test]
    fn define_and_duplicate() {
        let mut tree = ScopeTree::new();
        assert!(tree
            .define(sym("x", SymbolKind::Variable, Type::Integer))
            .is_ok());
        // duplicate across kinds still clashes
        assert_eq!(
            tree.define(sym("x", SymbolKind::Function, Type::Void)),
            Err("x".to_string())
        );
    }

    #[test]
    fn shadowing_resolves_to_innermost() {
        let mut tree = ScopeTree::new();
        tree.define(sym("x", SymbolKind::Variable, Type::Integer))
            .unwrap();
        tree.enter(ScopeKind::Block, "block");
        tree.define(sym("x", SymbolKind::Variable, Type::String))
            .unwrap();
        let (found, _) = tree.lookup("x").unwrap();
        assert_eq!(found.ty, Type::String);
        tree.leave();
        let (found, scope_id) = tree.lookup("x").unwrap();
        assert_eq!(found.ty, Type::Integer);
        assert_eq!(scope_id, GLOBAL_SCOPE);
    }

    #[test]
    fn lookup_walks_to_global() {
        let mut tree = ScopeTree::new();
        tree.define(sym("g", SymbolKind::Variable, Type::Float))
            .unwrap();
        tree.enter(ScopeKind::Function, "f");
        tree.enter(ScopeKind::Block, "block");
        assert!(tree.lookup("g").is_some());
        assert!(tree.lookup_local("g").is_none());
        assert!(tree.lookup("missing").is_none());
    }

    #[test]
    fn leave_restores_parent() {
        let mut tree = ScopeTree::new();
        let f = tree.enter(ScopeKind::Function, "f");
        assert_eq!(tree.current_id(), f);
        tree.leave();
        assert_eq!(tree.current_id(), GLOBAL_SCOPE);
        // leaving the global scope stays put
        tree.leave();
        assert_eq!(tree.current_id(), GLOBAL_SCOPE);
    }

    #[test]
    fn storage_display_forms() {
        assert_eq!(StorageSlot::None.to_string(), "none");
        assert_eq!(StorageSlot::Global(8).to_string(), "global[8]");
        assert_eq!(StorageSlot::Stack(-4).to_string(), "stack[-4]");
        assert_eq!(StorageSlot::Stack(8).to_string(), "stack[+8]");
        assert_eq!(StorageSlot::Param(12).to_string(), "param[12]");
        assert_eq!(StorageSlot::Heap(4).to_string(), "heap+4");
    }

    #[test]
    fn json_layout() {
        let mut tree = ScopeTree::new();
        tree.define(sym("x", SymbolKind::Variable, Type::Integer))
            .unwrap();
        tree.enter(ScopeKind::Function, "f");
        tree.define(sym("p", SymbolKind::Parameter, Type::Float))
            .unwrap();
        tree.leave();

        let v = tree.to_json();
        assert_eq!(v["name"], "global");
        assert_eq!(v["kind"], "global");
        assert_eq!(v["symbols"]["x"]["type"], "integer");
        assert_eq!(v["symbols"]["x"]["address"], "none");
        assert_eq!(v["children"][0]["name"], "f");
        assert_eq!(v["children"][0]["symbols"]["p"]["kind"], "parameter");
    }
}
