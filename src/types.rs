//! CompilScript type system — all types used during compilation.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

// ── The Type enum ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Integer,
    Float,
    String,
    Boolean,
    Void,
    /// The `null` literal: a reference compatible with any class or array
    /// target on assignment only.
    Null,
    /// Polymorphic element type of an empty array literal, resolved by the
    /// surrounding context (declared type or parameter type).
    Any,
    Class(String),
    Array { elem: Box<Type>, rank: u32 },
}

impl Type {
    // ── Constructors (convenience) ───────────────────────────────

    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    /// Build an array type, folding a nested array element into a higher
    /// rank so `elem` is never itself an array.
    pub fn array(elem: Type, rank: u32) -> Self {
        match elem {
            Type::Array {
                elem: inner,
                rank: inner_rank,
            } => Type::Array {
                elem: inner,
                rank: rank + inner_rank,
            },
            other => Type::Array {
                elem: Box::new(other),
                rank,
            },
        }
    }

    // ── Predicates ───────────────────────────────────────────────

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Integer | Type::Float)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Type::Integer | Type::Float | Type::String | Type::Boolean | Type::Void
        )
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Type::Class(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    /// Reference types accept `null` on assignment.
    pub fn is_reference(&self) -> bool {
        self.is_class() || self.is_array()
    }

    pub fn rank(&self) -> u32 {
        match self {
            Type::Array { rank, .. } => *rank,
            _ => 0,
        }
    }

    /// The type of `a[i]` for an array `a`: one rank lower, same element.
    pub fn element_type(&self) -> Result<Type, TypeError> {
        match self {
            Type::Array { elem, rank } => {
                if *rank <= 1 {
                    Ok(elem.as_ref().clone())
                } else {
                    Ok(Type::Array {
                        elem: elem.clone(),
                        rank: rank - 1,
                    })
                }
            }
            other => Err(TypeError::NotAnArray(other.to_string())),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer => write!(f, "integer"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Boolean => write!(f, "boolean"),
            Type::Void => write!(f, "void"),
            Type::Null => write!(f, "null"),
            Type::Any => write!(f, "any"),
            Type::Class(name) => write!(f, "{}", name),
            Type::Array { elem, rank } => {
                write!(f, "{}", elem)?;
                for _ in 0..*rank {
                    write!(f, "[]")?;
                }
                Ok(())
            }
        }
    }
}

// ── Type errors ──────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("{0} is not an array")]
    NotAnArray(String),

    #[error("operands of '{op}' must be numeric, found {found}")]
    NonNumeric { op: String, found: String },

    #[error("array elements '{0}' and '{1}' have no common type")]
    HeterogeneousArray(String, String),
}

// ── Class metadata & registry ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub params: Vec<Type>,
    pub ret: Type,
}

/// One declared class. Field and method order is declaration order; the
/// memory annotator depends on it for heap layout.
#[derive(Debug, Clone, Default)]
pub struct ClassMeta {
    pub name: String,
    pub superclass: Option<String>,
    pub fields: Vec<(String, Type)>,
    pub methods: Vec<(String, MethodSig)>,
    pub has_constructor: bool,
}

impl ClassMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSig> {
        self.methods.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

pub type ClassRegistry = HashMap<String, ClassMeta>;

/// A field or method found somewhere along a class's ancestor chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Field(Type),
    Method(MethodSig),
}

/// Search `class` and its ancestors for a member. The walk is iterative and
/// bounded by the registry size, so a cyclic hierarchy cannot hang it.
pub fn lookup_member(registry: &ClassRegistry, class: &str, name: &str) -> Option<Member> {
    let mut current = Some(class.to_string());
    let mut steps = 0;
    while let Some(cls) = current {
        let meta = registry.get(&cls)?;
        if let Some(ty) = meta.field(name) {
            return Some(Member::Field(ty.clone()));
        }
        if let Some(sig) = meta.method(name) {
            return Some(Member::Method(sig.clone()));
        }
        steps += 1;
        if steps > registry.len() {
            return None;
        }
        current = meta.superclass.clone();
    }
    None
}

/// The class (possibly an ancestor) whose declaration defines `method`.
/// Used for static dispatch: `o.m()` calls `<defining class>_m`.
pub fn defining_class_of_method(
    registry: &ClassRegistry,
    class: &str,
    method: &str,
) -> Option<String> {
    let mut current = Some(class.to_string());
    let mut steps = 0;
    while let Some(cls) = current {
        let meta = registry.get(&cls)?;
        if meta.method(method).is_some() {
            return Some(cls);
        }
        steps += 1;
        if steps > registry.len() {
            return None;
        }
        current = meta.superclass.clone();
    }
    None
}

// ── Compatibility & promotion ────────────────────────────────────────

/// `child` is `ancestor` or transitively inherits from it. Iterative walk
/// bounded by the number of registered classes.
pub fn is_subclass(registry: &ClassRegistry, child: &str, ancestor: &str) -> bool {
    if child == ancestor {
        return true;
    }
    let mut current = registry.get(child).and_then(|m| m.superclass.clone());
    let mut steps = 0;
    while let Some(cls) = current {
        if cls == ancestor {
            return true;
        }
        steps += 1;
        if steps > registry.len() {
            return false;
        }
        current = registry.get(&cls).and_then(|m| m.superclass.clone());
    }
    false
}

/// "`actual` is assignable to `target`" (directional).
pub fn assignable(registry: &ClassRegistry, target: &Type, actual: &Type) -> bool {
    if target == actual {
        return true;
    }
    match (target, actual) {
        // numeric widening, never the reverse
        (Type::Float, Type::Integer) => true,
        // null goes into any reference-typed slot
        (t, Type::Null) if t.is_reference() => true,
        // empty array literal adapts to any element type of the same rank
        (Type::Array { rank: tr, .. }, Type::Array { elem, rank: ar })
            if tr == ar && **elem == Type::Any =>
        {
            true
        }
        (Type::Class(t), Type::Class(a)) => is_subclass(registry, a, t),
        (
            Type::Array {
                elem: te,
                rank: tr,
            },
            Type::Array {
                elem: ae,
                rank: ar,
            },
        ) => tr == ar && assignable(registry, te, ae),
        _ => false,
    }
}

/// Result type of an arithmetic op over two numeric operands:
/// FLOAT if either side is FLOAT, else INTEGER.
pub fn promote_numeric(op: &str, a: &Type, b: &Type) -> Result<Type, TypeError> {
    if !a.is_numeric() {
        return Err(TypeError::NonNumeric {
            op: op.to_string(),
            found: a.to_string(),
        });
    }
    if !b.is_numeric() {
        return Err(TypeError::NonNumeric {
            op: op.to_string(),
            found: b.to_string(),
        });
    }
    if *a == Type::Float || *b == Type::Float {
        Ok(Type::Float)
    } else {
        Ok(Type::Integer)
    }
}

/// Unify the element types of an array literal by successive pairwise
/// widening: the result is the least type every element is assignable to.
pub fn unify_array_elements(registry: &ClassRegistry, types: &[Type]) -> Result<Type, TypeError> {
    let mut acc: Option<Type> = None;
    for ty in types {
        // nulls are compatible with whatever reference type wins
        if *ty == Type::Null {
            continue;
        }
        acc = Some(match acc {
            None => ty.clone(),
            Some(prev) => {
                if assignable(registry, &prev, ty) {
                    prev
                } else if assignable(registry, ty, &prev) {
                    ty.clone()
                } else {
                    return Err(TypeError::HeterogeneousArray(
                        prev.to_string(),
                        ty.to_string(),
                    ));
                }
            }
        });
    }
    Ok(acc.unwrap_or(Type::Any))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_chain() -> ClassRegistry {
        // C : B : A
        let mut reg = ClassRegistry::new();
        reg.insert("A".into(), ClassMeta::new("A"));
        let mut b = ClassMeta::new("B");
        b.superclass = Some("A".into());
        reg.insert("B".into(), b);
        let mut c = ClassMeta::new("C");
        c.superclass = Some("B".into());
        reg.insert("C".into(), c);
        reg
    }

    #[test]
    fn display_formats() {
        assert_eq!(Type::Integer.to_string(), "integer");
        assert_eq!(Type::class("Dog").to_string(), "Dog");
        assert_eq!(Type::array(Type::Integer, 2).to_string(), "integer[][]");
    }

    #[test]
    fn array_constructor_folds_rank() {
        let nested = Type::array(Type::array(Type::Float, 1), 1);
        assert_eq!(
            nested,
            Type::Array {
                elem: Box::new(Type::Float),
                rank: 2
            }
        );
    }

    #[test]
    fn element_type_lowers_rank() {
        let arr = Type::array(Type::Integer, 2);
        let elem = arr.element_type().unwrap();
        assert_eq!(elem, Type::array(Type::Integer, 1));
        assert_eq!(elem.element_type().unwrap(), Type::Integer);
        assert!(matches!(
            Type::Integer.element_type(),
            Err(TypeError::NotAnArray(_))
        ));
    }

    #[test]
    fn promotion_law() {
        let cases = [
            (Type::Integer, Type::Integer, Type::Integer),
            (Type::Integer, Type::Float, Type::Float),
            (Type::Float, Type::Integer, Type::Float),
            (Type::Float, Type::Float, Type::Float),
        ];
        for (a, b, want) in cases {
            assert_eq!(promote_numeric("+", &a, &b).unwrap(), want);
        }
        assert!(promote_numeric("*", &Type::String, &Type::Integer).is_err());
    }

    #[test]
    fn subclass_reflexive_and_transitive() {
        let reg = registry_with_chain();
        assert!(is_subclass(&reg, "A", "A"));
        assert!(is_subclass(&reg, "C", "B"));
        assert!(is_subclass(&reg, "C", "A"));
        assert!(!is_subclass(&reg, "A", "C"));
    }

    #[test]
    fn subclass_survives_a_cycle() {
        let mut reg = ClassRegistry::new();
        let mut a = ClassMeta::new("A");
        a.superclass = Some("B".into());
        let mut b = ClassMeta::new("B");
        b.superclass = Some("A".into());
        reg.insert("A".into(), a);
        reg.insert("B".into(), b);
        // bounded walk terminates instead of spinning
        assert!(!is_subclass(&reg, "A", "Z"));
    }

    #[test]
    fn assignability_rules() {
        let reg = registry_with_chain();
        assert!(assignable(&reg, &Type::Float, &Type::Integer));
        assert!(!assignable(&reg, &Type::Integer, &Type::Float));
        assert!(assignable(&reg, &Type::class("A"), &Type::class("C")));
        assert!(!assignable(&reg, &Type::class("C"), &Type::class("A")));
        assert!(assignable(&reg, &Type::class("A"), &Type::Null));
        assert!(assignable(&reg, &Type::array(Type::Integer, 1), &Type::Null));
        assert!(!assignable(&reg, &Type::Integer, &Type::Null));
        // arrays: rank must match, element follows the same rules
        assert!(assignable(
            &reg,
            &Type::array(Type::Float, 1),
            &Type::array(Type::Integer, 1)
        ));
        assert!(!assignable(
            &reg,
            &Type::array(Type::Integer, 1),
            &Type::array(Type::Integer, 2)
        ));
        // empty literal adapts
        assert!(assignable(
            &reg,
            &Type::array(Type::String, 1),
            &Type::array(Type::Any, 1)
        ));
    }

    #[test]
    fn unify_elements_widen_and_fail() {
        let reg = registry_with_chain();
        assert_eq!(
            unify_array_elements(&reg, &[Type::Integer, Type::Float, Type::Integer]).unwrap(),
            Type::Float
        );
        assert_eq!(
            unify_array_elements(&reg, &[Type::class("C"), Type::class("B")]).unwrap(),
            Type::class("B")
        );
        assert_eq!(unify_array_elements(&reg, &[]).unwrap(), Type::Any);
        assert_eq!(
            unify_array_elements(&reg, &[Type::Null, Type::class("A")]).unwrap(),
            Type::class("A")
        );
        assert!(unify_array_elements(&reg, &[Type::Integer, Type::String]).is_err());
    }

    #[test]
    fn member_lookup_walks_ancestors() {
        let mut reg = registry_with_chain();
        reg.get_mut("A")
            .unwrap()
            .fields
            .push(("name".into(), Type::String));
        reg.get_mut("B").unwrap().methods.push((
            "speak".into(),
            MethodSig {
                params: vec![],
                ret: Type::String,
            },
        ));
        assert_eq!(
            lookup_member(&reg, "C", "name"),
            Some(Member::Field(Type::String))
        );
        assert!(matches!(
            lookup_member(&reg, "C", "speak"),
            Some(Member::Method(_))
        ));
        assert_eq!(lookup_member(&reg, "C", "missing"), None);
        assert_eq!(
            defining_class_of_method(&reg, "C", "speak"),
            Some("B".to_string())
        );
    }
}
