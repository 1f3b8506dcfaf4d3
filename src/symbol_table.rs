//! Two-scope symbol table: class scope (`Static`, `Field`) and subroutine
//! scope (`Argument`, `Local`), restated in Rust from the reference
//! compiler's `SymbolTable` (`original_source/projects/compilation_engine.py`),
//! which keeps per-kind counters and a combined name map for the active
//! scopes.

use std::collections::HashMap;

use crate::error::{JackError, SourceLocation};
use crate::vm::Segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Static,
    Field,
    Argument,
    Local,
}

impl Kind {
    fn is_class_scoped(self) -> bool {
        matches!(self, Kind::Static | Kind::Field)
    }

    /// The VM memory segment this kind is stored in.
    pub fn segment(self) -> Segment {
        match self {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Argument => Segment::Argument,
            Kind::Local => Segment::Local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub declared_type: String,
    pub kind: Kind,
    pub slot_index: usize,
}

#[derive(Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, Symbol>,
    sub_scope: HashMap<String, Symbol>,
    counts: HashMap<Kind, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Reset the subroutine scope and its `Argument`/`Local` counters. If
    /// `is_method`, prepend a synthetic `this` argument at slot 0 so
    /// user-declared arguments begin at slot 1.
    pub fn start_subroutine(&mut self, is_method: bool, enclosing_class: &str) {
        self.sub_scope.clear();
        self.counts.insert(Kind::Argument, 0);
        self.counts.insert(Kind::Local, 0);
        if is_method {
            // define() would also work here, but start_subroutine can't fail,
            // and a fresh scope can never collide with a synthetic `this`.
            let slot = self.next_slot(Kind::Argument);
            self.sub_scope.insert(
                "this".to_string(),
                Symbol {
                    name: "this".to_string(),
                    declared_type: enclosing_class.to_string(),
                    kind: Kind::Argument,
                    slot_index: slot,
                },
            );
        }
    }

    fn next_slot(&mut self, kind: Kind) -> usize {
        let counter = self.counts.entry(kind).or_insert(0);
        let slot = *counter;
        *counter += 1;
        slot
    }

    /// Declare `name` in the scope implied by `kind`. Fails if `name` is
    /// already declared in that scope (shadowing a class symbol from a
    /// subroutine scope is fine and is not a collision).
    pub fn define(
        &mut self,
        name: &str,
        declared_type: &str,
        kind: Kind,
        loc: SourceLocation,
    ) -> Result<(), JackError> {
        let scope = if kind.is_class_scoped() {
            &self.class_scope
        } else {
            &self.sub_scope
        };
        if scope.contains_key(name) {
            return Err(JackError::DuplicateSymbol {
                loc,
                name: name.to_string(),
            });
        }
        let slot = self.next_slot(kind);
        let symbol = Symbol {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            kind,
            slot_index: slot,
        };
        if kind.is_class_scoped() {
            self.class_scope.insert(name.to_string(), symbol);
        } else {
            self.sub_scope.insert(name.to_string(), symbol);
        }
        Ok(())
    }

    /// Look `name` up, subroutine scope first, then class scope, without
    /// raising on a miss. Used by the compiler to disambiguate
    /// `foo.bar(...)` between an instance-method call (`foo` resolves) and
    /// a static call on a class name (`foo` does not resolve and is never
    /// treated as an error here).
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.sub_scope.get(name).or_else(|| self.class_scope.get(name))
    }

    /// Like `lookup`, but a miss is a compile error (used wherever a name
    /// is used as a value: variable references, dotless call receivers).
    pub fn resolve(&self, name: &str, loc: SourceLocation) -> Result<&Symbol, JackError> {
        self.lookup(name).ok_or(JackError::UndefinedSymbol {
            loc,
            name: name.to_string(),
        })
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn count(&self, kind: Kind) -> usize {
        *self.counts.get(&kind).unwrap_or(&0)
    }
}
