//! Memory annotator: assigns concrete storage to every symbol in the
//! final scope tree.
//!
//! Globals get flat `global[N]` slots in declaration order. Function and
//! method frames place parameters at `param[8, 12, …]` above the saved
//! return address and frame pointer, and locals at `stack[-4, -8, …]`,
//! with the local cursor threaded through nested block scopes. Class
//! fields get `heap+N` continuing the superclass's layout prefix. The
//! walk is a pure function of tree shape, so re-running it is a no-op.

use crate::symbols::{ScopeId, ScopeKind, ScopeTree, StorageSlot, SymbolKind, GLOBAL_SCOPE};
use crate::tac::{size_of, WORD_SIZE};
use crate::types::ClassRegistry;

pub fn annotate(scopes: &mut ScopeTree, classes: &ClassRegistry) {
    let mut next_global = 0;
    annotate_global_scope(scopes, GLOBAL_SCOPE, &mut next_global, classes);
}

/// Layout of every field reachable from `class`, superclass prefix first,
/// in declaration order within each class.
pub fn class_field_layout(classes: &ClassRegistry, class: &str) -> Vec<(String, u32)> {
    let mut chain = Vec::new();
    let mut current = Some(class.to_string());
    while let Some(name) = current {
        if chain.contains(&name) || chain.len() > classes.len() {
            break;
        }
        chain.push(name.clone());
        current = classes.get(&name).and_then(|m| m.superclass.clone());
    }
    chain.reverse();

    let mut layout = Vec::new();
    let mut offset = 0;
    for name in chain {
        if let Some(meta) = classes.get(&name) {
            for (field, ty) in &meta.fields {
                layout.push((field.clone(), offset));
                offset += size_of(ty);
            }
        }
    }
    layout
}

fn annotate_global_scope(
    scopes: &mut ScopeTree,
    id: ScopeId,
    next_global: &mut u32,
    classes: &ClassRegistry,
) {
    let scope = scopes.scope_mut(id);
    for sym in &mut scope.symbols {
        sym.storage = match sym.kind {
            SymbolKind::Variable | SymbolKind::Constant => {
                let offset = *next_global;
                *next_global += size_of(&sym.ty);
                StorageSlot::Global(offset)
            }
            _ => StorageSlot::None,
        };
    }

    let children = scopes.scope(id).children.clone();
    for child in children {
        match scopes.scope(child).kind {
            ScopeKind::Function | ScopeKind::Method => annotate_frame(scopes, child, classes),
            ScopeKind::Class => annotate_class_scope(scopes, child, classes),
            // blocks at the top level live in the global region too
            _ => annotate_global_scope(scopes, child, next_global, classes),
        }
    }
}

fn annotate_frame(scopes: &mut ScopeTree, id: ScopeId, classes: &ClassRegistry) {
    let mut param_cursor = 2 * WORD_SIZE;
    let mut local_cursor: i32 = 0;

    let scope = scopes.scope_mut(id);
    for sym in &mut scope.symbols {
        sym.storage = if sym.kind == SymbolKind::Parameter || sym.name == "this" {
            let slot = StorageSlot::Param(param_cursor);
            param_cursor += size_of(&sym.ty);
            slot
        } else {
            match sym.kind {
                SymbolKind::Variable | SymbolKind::Constant => {
                    local_cursor -= size_of(&sym.ty) as i32;
                    StorageSlot::Stack(local_cursor)
                }
                _ => StorageSlot::None,
            }
        };
    }

    let children = scopes.scope(id).children.clone();
    for child in children {
        annotate_frame_child(scopes, child, &mut local_cursor, classes);
    }
}

fn annotate_frame_child(
    scopes: &mut ScopeTree,
    id: ScopeId,
    local_cursor: &mut i32,
    classes: &ClassRegistry,
) {
    match scopes.scope(id).kind {
        ScopeKind::Function | ScopeKind::Method => {
            annotate_frame(scopes, id, classes);
            return;
        }
        ScopeKind::Class => {
            annotate_class_scope(scopes, id, classes);
            return;
        }
        _ => {}
    }

    let scope = scopes.scope_mut(id);
    for sym in &mut scope.symbols {
        sym.storage = match sym.kind {
            SymbolKind::Variable | SymbolKind::Constant => {
                *local_cursor -= size_of(&sym.ty) as i32;
                StorageSlot::Stack(*local_cursor)
            }
            _ => StorageSlot::None,
        };
    }

    let children = scopes.scope(id).children.clone();
    for child in children {
        annotate_frame_child(scopes, child, local_cursor, classes);
    }
}

fn annotate_class_scope(scopes: &mut ScopeTree, id: ScopeId, classes: &ClassRegistry) {
    let class_name = scopes.scope(id).name.clone();
    let layout = class_field_layout(classes, &class_name);

    let scope = scopes.scope_mut(id);
    for sym in &mut scope.symbols {
        sym.storage = match sym.kind {
            SymbolKind::Field => {
                let offset = layout
                    .iter()
                    .find(|(name, _)| *name == sym.name)
                    .map(|(_, o)| *o)
                    .unwrap_or(0);
                StorageSlot::Heap(offset)
            }
            _ => StorageSlot::None,
        };
    }

    let children = scopes.scope(id).children.clone();
    for child in children {
        match scopes.scope(child).kind {
            ScopeKind::Function | ScopeKind::Method => annotate_frame(scopes, child, classes),
            _ => {
                // class bodies only contain method scopes; anything else
                // is annotated as frame-less storage
                let scope = scopes.scope_mut(child);
                for sym in &mut scope.symbols {
                    sym.storage = StorageSlot::None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Symbol;
    use crate::token::Span;
    use crate::types::{ClassMeta, Type};

    fn sym(name: &str, kind: SymbolKind, ty: Type) -> Symbol {
        Symbol::new(name, kind, ty, Span::default())
    }

    #[test]
    fn globals_in_declaration_order() {
        let mut tree = ScopeTree::new();
        tree.define(sym("a", SymbolKind::Variable, Type::Integer))
            .unwrap();
        tree.define(sym("b", SymbolKind::Constant, Type::Float))
            .unwrap();
        tree.define(sym("f", SymbolKind::Function, Type::Void))
            .unwrap();
        let classes = ClassRegistry::new();
        annotate(&mut tree, &classes);

        let global = tree.scope(GLOBAL_SCOPE);
        assert_eq!(global.get("a").unwrap().storage, StorageSlot::Global(0));
        assert_eq!(global.get("b").unwrap().storage, StorageSlot::Global(4));
        assert_eq!(global.get("f").unwrap().storage, StorageSlot::None);
    }

    #[test]
    fn frame_params_positive_locals_negative() {
        let mut tree = ScopeTree::new();
        let f = tree.enter(ScopeKind::Function, "f");
        tree.define(sym("a", SymbolKind::Parameter, Type::Integer))
            .unwrap();
        tree.define(sym("b", SymbolKind::Parameter, Type::Float))
            .unwrap();
        let body = tree.enter(ScopeKind::Block, "block");
        tree.define(sym("x", SymbolKind::Variable, Type::Integer))
            .unwrap();
        let inner = tree.enter(ScopeKind::LoopBody, "while");
        tree.define(sym("y", SymbolKind::Variable, Type::Integer))
            .unwrap();
        tree.leave();
        tree.leave();
        tree.leave();

        let classes = ClassRegistry::new();
        annotate(&mut tree, &classes);

        assert_eq!(tree.scope(f).get("a").unwrap().storage, StorageSlot::Param(8));
        assert_eq!(
            tree.scope(f).get("b").unwrap().storage,
            StorageSlot::Param(12)
        );
        assert_eq!(
            tree.scope(body).get("x").unwrap().storage,
            StorageSlot::Stack(-4)
        );
        // the local cursor threads into nested scopes
        assert_eq!(
            tree.scope(inner).get("y").unwrap().storage,
            StorageSlot::Stack(-8)
        );
    }

    #[test]
    fn class_fields_continue_superclass_prefix() {
        let mut classes = ClassRegistry::new();
        let mut animal = ClassMeta::new("Animal");
        animal.fields.push(("name".into(), Type::String));
        classes.insert("Animal".into(), animal);
        let mut dog = ClassMeta::new("Dog");
        dog.superclass = Some("Animal".into());
        dog.fields.push(("breed".into(), Type::String));
        classes.insert("Dog".into(), dog);

        let layout = class_field_layout(&classes, "Dog");
        assert_eq!(layout, vec![("name".into(), 0), ("breed".into(), 4)]);

        let mut tree = ScopeTree::new();
        let dog_scope = tree.enter(ScopeKind::Class, "Dog");
        tree.define(sym("breed", SymbolKind::Field, Type::String))
            .unwrap();
        tree.define(sym("name", SymbolKind::Field, Type::String))
            .unwrap();
        tree.leave();
        annotate(&mut tree, &classes);
        assert_eq!(
            tree.scope(dog_scope).get("name").unwrap().storage,
            StorageSlot::Heap(0)
        );
        assert_eq!(
            tree.scope(dog_scope).get("breed").unwrap().storage,
            StorageSlot::Heap(4)
        );
    }

    #[test]
    fn method_receiver_is_the_first_param() {
        let mut tree = ScopeTree::new();
        tree.enter(ScopeKind::Class, "Dog");
        let m = tree.enter(ScopeKind::Method, "speak");
        tree.define(sym("this", SymbolKind::Constant, Type::class("Dog")))
            .unwrap();
        tree.define(sym("loud", SymbolKind::Parameter, Type::Boolean))
            .unwrap();
        tree.leave();
        tree.leave();
        let classes = ClassRegistry::new();
        annotate(&mut tree, &classes);
        assert_eq!(
            tree.scope(m).get("this").unwrap().storage,
            StorageSlot::Param(8)
        );
        assert_eq!(
            tree.scope(m).get("loud").unwrap().storage,
            StorageSlot::Param(12)
        );
    }

    #[test]
    fn annotation_is_idempotent() {
        let mut tree = ScopeTree::new();
        tree.define(sym("a", SymbolKind::Variable, Type::Integer))
            .unwrap();
        tree.enter(ScopeKind::Function, "f");
        tree.define(sym("p", SymbolKind::Parameter, Type::Integer))
            .unwrap();
        tree.define(sym("v", SymbolKind::Variable, Type::Integer))
            .unwrap();
        tree.leave();

        let classes = ClassRegistry::new();
        annotate(&mut tree, &classes);
        let first = tree.to_json();
        annotate(&mut tree, &classes);
        assert_eq!(first, tree.to_json());
    }
}
