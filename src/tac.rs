//! Three-address code: instruction forms, the temporary and label
//! allocators, activation-record layout, and the post-generation
//! validation pass.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::types::Type;

/// Word size of the target model. Primitives are one word; strings,
/// arrays, and class instances are pointer-sized.
pub const WORD_SIZE: u32 = 4;

pub fn size_of(_ty: &Type) -> u32 {
    WORD_SIZE
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Comment(String),
    Label(String),
    /// `dst = lhs op rhs`
    Binary {
        dst: String,
        lhs: String,
        op: String,
        rhs: String,
    },
    /// `dst = op operand`
    Unary {
        dst: String,
        op: String,
        operand: String,
    },
    /// `dst = src`
    Copy { dst: String, src: String },
    /// `dst = array[index]`
    IndexedLoad {
        dst: String,
        array: String,
        index: String,
    },
    /// `array[index] = src`
    IndexedStore {
        array: String,
        index: String,
        src: String,
    },
    /// `dst = object.field`
    FieldLoad {
        dst: String,
        object: String,
        field: String,
    },
    /// `object.field = src`
    FieldStore {
        object: String,
        field: String,
        src: String,
    },
    Goto(String),
    If { cond: String, target: String },
    IfFalse { cond: String, target: String },
    /// Fused relational jump: `if lhs op rhs goto target`
    IfRel {
        lhs: String,
        op: String,
        rhs: String,
        target: String,
    },
    Param(String),
    /// `dst = call func, argc` (no `dst =` for void calls)
    Call {
        dst: Option<String>,
        func: String,
        argc: usize,
    },
    /// `dst = new class, argc` — allocate and run the constructor
    New {
        dst: String,
        class: String,
        argc: usize,
    },
    Return(Option<String>),
    /// `@function name(params)`; the frame size is carried for the backend
    /// but not printed.
    FunctionBegin {
        name: String,
        params: Vec<String>,
        frame_size: u32,
    },
    FunctionEnd,
    /// Marks the guarded region of a try block; delivery is the backend's
    /// concern.
    TryBegin(String),
    TryEnd,
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Comment(text) => write!(f, "# {}", text),
            Instr::Label(label) => write!(f, "{}:", label),
            Instr::Binary { dst, lhs, op, rhs } => write!(f, "{} = {} {} {}", dst, lhs, op, rhs),
            Instr::Unary { dst, op, operand } => write!(f, "{} = {} {}", dst, op, operand),
            Instr::Copy { dst, src } => write!(f, "{} = {}", dst, src),
            Instr::IndexedLoad { dst, array, index } => {
                write!(f, "{} = {}[{}]", dst, array, index)
            }
            Instr::IndexedStore { array, index, src } => {
                write!(f, "{}[{}] = {}", array, index, src)
            }
            Instr::FieldLoad { dst, object, field } => write!(f, "{} = {}.{}", dst, object, field),
            Instr::FieldStore { object, field, src } => {
                write!(f, "{}.{} = {}", object, field, src)
            }
            Instr::Goto(label) => write!(f, "goto {}", label),
            Instr::If { cond, target } => write!(f, "if {} goto {}", cond, target),
            Instr::IfFalse { cond, target } => write!(f, "ifFalse {} goto {}", cond, target),
            Instr::IfRel {
                lhs,
                op,
                rhs,
                target,
            } => write!(f, "if {} {} {} goto {}", lhs, op, rhs, target),
            Instr::Param(value) => write!(f, "param {}", value),
            Instr::Call { dst, func, argc } => match dst {
                Some(dst) => write!(f, "{} = call {}, {}", dst, func, argc),
                None => write!(f, "call {}, {}", func, argc),
            },
            Instr::New { dst, class, argc } => write!(f, "{} = new {}, {}", dst, class, argc),
            Instr::Return(value) => match value {
                Some(v) => write!(f, "return {}", v),
                None => write!(f, "return"),
            },
            Instr::FunctionBegin { name, params, .. } => {
                write!(f, "@function {}({})", name, params.join(", "))
            }
            Instr::FunctionEnd => write!(f, "endfunc"),
            Instr::TryBegin(label) => write!(f, "try_begin {}", label),
            Instr::TryEnd => write!(f, "try_end"),
        }
    }
}

// ---------------------------------------------------------------------------
// Temporary allocator
// ---------------------------------------------------------------------------

/// Hands out `t0, t1, …`. Released temporaries go onto a free list and are
/// reissued in LIFO order before any new name is minted, so the peak number
/// of live temporaries inside one expression tree equals its Ershov number.
#[derive(Debug, Default)]
pub struct TempAllocator {
    next: u32,
    free: Vec<String>,
    live: u32,
    peak: u32,
}

impl TempAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> String {
        let name = match self.free.pop() {
            Some(name) => name,
            None => {
                let name = format!("t{}", self.next);
                self.next += 1;
                name
            }
        };
        self.live += 1;
        self.peak = self.peak.max(self.live);
        name
    }

    /// Release a temporary for reuse. Non-temporary operands (variables,
    /// literals) are ignored, as are double releases.
    pub fn release(&mut self, name: &str) {
        if !is_temp(name) || self.free.iter().any(|t| t == name) {
            return;
        }
        self.free.push(name.to_string());
        self.live = self.live.saturating_sub(1);
    }

    pub fn live_count(&self) -> u32 {
        self.live
    }

    /// Total unique names minted so far. Never decremented; this is the
    /// diagnostics counter, not the live count.
    pub fn names_minted(&self) -> u32 {
        self.next
    }

    /// Peak live count since the last call, then restart the measurement.
    /// Used to size the per-function spill region.
    pub fn take_frame_peak(&mut self) -> u32 {
        let peak = self.peak;
        self.peak = self.live;
        peak
    }
}

pub fn is_temp(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('t') && {
        let rest = chars.as_str();
        !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
    }
}

// ---------------------------------------------------------------------------
// Label allocator
// ---------------------------------------------------------------------------

/// Monotonic label names. The prefix is a readability hint (`Ltrue`,
/// `Lend`, `Lloop`, …); one shared counter keeps every label unique across
/// prefixes.
#[derive(Debug, Default)]
pub struct LabelAllocator {
    counter: u32,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, prefix: &str) -> String {
        let label = format!("{}{}", prefix, self.counter);
        self.counter += 1;
        label
    }
}

// ---------------------------------------------------------------------------
// Activation records
// ---------------------------------------------------------------------------

/// Stack-frame layout for one function: slot 0 holds the saved return
/// address and slot 4 the saved frame pointer, parameters sit above them
/// at `8, 12, …`, locals grow downward at `-4, -8, …`, and a spill region
/// sized by the temporary peak follows the locals.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationRecord {
    pub name: String,
    pub params: Vec<(String, u32)>,
    pub locals: Vec<(String, i32)>,
    pub return_address_offset: u32,
    pub saved_fp_offset: u32,
    pub temp_spill_size: u32,
}

impl ActivationRecord {
    pub fn new(name: impl Into<String>, params: &[String]) -> Self {
        let params = params
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), 2 * WORD_SIZE + i as u32 * WORD_SIZE))
            .collect();
        Self {
            name: name.into(),
            params,
            locals: Vec::new(),
            return_address_offset: 0,
            saved_fp_offset: WORD_SIZE,
            temp_spill_size: 0,
        }
    }

    /// Allocate (or find) a local slot. Offsets are negative and assigned
    /// in first-seen order.
    pub fn add_local(&mut self, name: &str) -> i32 {
        if let Some((_, offset)) = self.locals.iter().find(|(n, _)| n == name) {
            return *offset;
        }
        let offset = -((self.locals.len() as i32 + 1) * WORD_SIZE as i32);
        self.locals.push((name.to_string(), offset));
        offset
    }

    pub fn param_offset(&self, name: &str) -> Option<u32> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| *o)
    }

    pub fn frame_size(&self) -> u32 {
        2 * WORD_SIZE + self.locals.len() as u32 * WORD_SIZE + self.temp_spill_size
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Post-generation checks over a finished instruction stream:
/// - every referenced label is defined exactly once in its function;
/// - every temporary is written before read within its function;
/// - `@function`/`endfunc` pairs match and each function returns;
/// - every `call f, n` is fed by `n` `param`s at the same nesting depth.
pub fn validate(instructions: &[Instr]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut region = RegionCheck::new("<global>");
    let mut in_function = false;

    for instr in instructions {
        match instr {
            Instr::FunctionBegin { name, .. } => {
                if in_function {
                    errors.push(format!(
                        "@function {} opened before the previous function ended",
                        name
                    ));
                    region.finish(&mut errors, in_function);
                }
                region = RegionCheck::new(name);
                in_function = true;
            }
            Instr::FunctionEnd => {
                if !in_function {
                    errors.push("endfunc without a matching @function".to_string());
                } else {
                    region.finish(&mut errors, true);
                    region = RegionCheck::new("<global>");
                    in_function = false;
                }
            }
            other => region.check(other, &mut errors),
        }
    }
    if in_function {
        errors.push(format!("@function {} has no endfunc", region.name));
        region.finish(&mut errors, true);
    } else {
        region.finish(&mut errors, false);
    }
    errors
}

struct RegionCheck {
    name: String,
    // ordered sets keep the error list deterministic
    defined: BTreeSet<String>,
    referenced: BTreeSet<String>,
    written: HashSet<String>,
    param_depth: usize,
    has_return: bool,
}

impl RegionCheck {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            defined: BTreeSet::new(),
            referenced: BTreeSet::new(),
            written: HashSet::new(),
            param_depth: 0,
            has_return: false,
        }
    }

    fn check(&mut self, instr: &Instr, errors: &mut Vec<String>) {
        for read in instr_reads(instr) {
            if is_temp(read) && !self.written.contains(read) {
                errors.push(format!(
                    "{}: temporary {} read before it is written",
                    self.name, read
                ));
            }
        }
        if let Some(written) = instr_writes(instr) {
            self.written.insert(written.to_string());
        }
        match instr {
            Instr::Label(label) => {
                if !self.defined.insert(label.clone()) {
                    errors.push(format!(
                        "{}: label {} defined more than once",
                        self.name, label
                    ));
                }
            }
            Instr::Goto(target)
            | Instr::If { target, .. }
            | Instr::IfFalse { target, .. }
            | Instr::IfRel { target, .. }
            | Instr::TryBegin(target) => {
                self.referenced.insert(target.clone());
            }
            Instr::Param(_) => self.param_depth += 1,
            Instr::Call { func, argc, .. } => {
                if self.param_depth < *argc {
                    errors.push(format!(
                        "{}: call {} expects {} params, only {} pushed",
                        self.name, func, argc, self.param_depth
                    ));
                    self.param_depth = 0;
                } else {
                    self.param_depth -= argc;
                }
            }
            Instr::New { class, argc, .. } => {
                if self.param_depth < *argc {
                    errors.push(format!(
                        "{}: new {} expects {} params, only {} pushed",
                        self.name, class, argc, self.param_depth
                    ));
                    self.param_depth = 0;
                } else {
                    self.param_depth -= argc;
                }
            }
            Instr::Return(_) => self.has_return = true,
            _ => {}
        }
    }

    fn finish(&mut self, errors: &mut Vec<String>, is_function: bool) {
        for label in &self.referenced {
            if !self.defined.contains(label) {
                errors.push(format!("{}: jump to undefined label {}", self.name, label));
            }
        }
        if self.param_depth != 0 {
            errors.push(format!(
                "{}: {} param(s) pushed but never consumed by a call",
                self.name, self.param_depth
            ));
        }
        if is_function && !self.has_return {
            errors.push(format!("{}: function has no reachable return", self.name));
        }
    }
}

fn instr_reads(instr: &Instr) -> Vec<&str> {
    match instr {
        Instr::Binary { lhs, rhs, .. } => vec![lhs, rhs],
        Instr::Unary { operand, .. } => vec![operand],
        Instr::Copy { src, .. } => vec![src],
        Instr::IndexedLoad { array, index, .. } => vec![array, index],
        Instr::IndexedStore { array, index, src } => vec![array, index, src],
        Instr::FieldLoad { object, .. } => vec![object],
        Instr::FieldStore { object, src, .. } => vec![object, src],
        Instr::If { cond, .. } | Instr::IfFalse { cond, .. } => vec![cond],
        Instr::IfRel { lhs, rhs, .. } => vec![lhs, rhs],
        Instr::Param(value) => vec![value],
        Instr::Return(Some(value)) => vec![value],
        _ => vec![],
    }
}

fn instr_writes(instr: &Instr) -> Option<&str> {
    match instr {
        Instr::Binary { dst, .. }
        | Instr::Unary { dst, .. }
        | Instr::Copy { dst, .. }
        | Instr::IndexedLoad { dst, .. }
        | Instr::FieldLoad { dst, .. }
        | Instr::New { dst, .. } => Some(dst),
        Instr::Call { dst, .. } => dst.as_deref(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_names_start_at_zero() {
        let mut temps = TempAllocator::new();
        assert_eq!(temps.fresh(), "t0");
        assert_eq!(temps.fresh(), "t1");
        assert_eq!(temps.names_minted(), 2);
    }

    #[test]
    fn released_temps_reissue_lifo() {
        let mut temps = TempAllocator::new();
        let t0 = temps.fresh();
        let t1 = temps.fresh();
        temps.release(&t0);
        temps.release(&t1);
        // most recently released comes back first
        assert_eq!(temps.fresh(), "t1");
        assert_eq!(temps.fresh(), "t0");
        assert_eq!(temps.names_minted(), 2);
    }

    #[test]
    fn release_ignores_variables_and_double_frees() {
        let mut temps = TempAllocator::new();
        let t0 = temps.fresh();
        temps.release("x");
        temps.release("total");
        temps.release(&t0);
        temps.release(&t0);
        assert_eq!(temps.fresh(), "t0");
        assert_eq!(temps.fresh(), "t1");
    }

    #[test]
    fn peak_tracks_simultaneously_live() {
        let mut temps = TempAllocator::new();
        let t0 = temps.fresh();
        let t1 = temps.fresh();
        temps.release(&t1);
        temps.release(&t0);
        let _ = temps.fresh();
        assert_eq!(temps.take_frame_peak(), 2);
    }

    #[test]
    fn labels_share_one_counter_across_prefixes() {
        let mut labels = LabelAllocator::new();
        assert_eq!(labels.fresh("Lloop"), "Lloop0");
        assert_eq!(labels.fresh("Lend"), "Lend1");
        assert_eq!(labels.fresh("Lloop"), "Lloop2");
    }

    #[test]
    fn record_offsets() {
        let mut record =
            ActivationRecord::new("f", &["a".to_string(), "b".to_string()]);
        assert_eq!(record.param_offset("a"), Some(8));
        assert_eq!(record.param_offset("b"), Some(12));
        assert_eq!(record.add_local("x"), -4);
        assert_eq!(record.add_local("y"), -8);
        // re-adding finds the existing slot
        assert_eq!(record.add_local("x"), -4);
        record.temp_spill_size = 2 * WORD_SIZE;
        assert_eq!(record.frame_size(), 8 + 8 + 8);
    }

    #[test]
    fn display_forms() {
        let cases: Vec<(Instr, &str)> = vec![
            (
                Instr::Binary {
                    dst: "t0".into(),
                    lhs: "x".into(),
                    op: "+".into(),
                    rhs: "5".into(),
                },
                "t0 = x + 5",
            ),
            (
                Instr::Unary {
                    dst: "t0".into(),
                    op: "-".into(),
                    operand: "x".into(),
                },
                "t0 = - x",
            ),
            (
                Instr::Copy {
                    dst: "y".into(),
                    src: "t0".into(),
                },
                "y = t0",
            ),
            (
                Instr::IndexedLoad {
                    dst: "t0".into(),
                    array: "a".into(),
                    index: "i".into(),
                },
                "t0 = a[i]",
            ),
            (
                Instr::FieldStore {
                    object: "this".into(),
                    field: "name".into(),
                    src: "n".into(),
                },
                "this.name = n",
            ),
            (Instr::Goto("L0".into()), "goto L0"),
            (
                Instr::IfFalse {
                    cond: "a".into(),
                    target: "Lfalse0".into(),
                },
                "ifFalse a goto Lfalse0",
            ),
            (
                Instr::IfRel {
                    lhs: "i".into(),
                    op: ">=".into(),
                    rhs: "n".into(),
                    target: "Lend0".into(),
                },
                "if i >= n goto Lend0",
            ),
            (Instr::Param("y".into()), "param y"),
            (
                Instr::Call {
                    dst: None,
                    func: "print".into(),
                    argc: 1,
                },
                "call print, 1",
            ),
            (
                Instr::New {
                    dst: "t0".into(),
                    class: "Dog".into(),
                    argc: 1,
                },
                "t0 = new Dog, 1",
            ),
            (Instr::Return(None), "return"),
            (
                Instr::FunctionBegin {
                    name: "Dog_speak".into(),
                    params: vec!["this".into()],
                    frame_size: 8,
                },
                "@function Dog_speak(this)",
            ),
            (Instr::FunctionEnd, "endfunc"),
            (Instr::TryBegin("Lcatch0".into()), "try_begin Lcatch0"),
            (Instr::TryEnd, "try_end"),
            (Instr::Label("Lend1".into()), "Lend1:"),
            (Instr::Comment("TAC Code Generation".into()), "# TAC Code Generation"),
        ];
        for (instr, expected) in cases {
            assert_eq!(instr.to_string(), expected);
        }
    }

    #[test]
    fn validate_accepts_wellformed_function() {
        let instrs = vec![
            Instr::FunctionBegin {
                name: "f".into(),
                params: vec!["a".into()],
                frame_size: 8,
            },
            Instr::Label("Lloop0".into()),
            Instr::Binary {
                dst: "t0".into(),
                lhs: "a".into(),
                op: "+".into(),
                rhs: "1".into(),
            },
            Instr::IfFalse {
                cond: "t0".into(),
                target: "Lend1".into(),
            },
            Instr::Goto("Lloop0".into()),
            Instr::Label("Lend1".into()),
            Instr::Return(Some("t0".into())),
            Instr::FunctionEnd,
        ];
        assert!(validate(&instrs).is_empty());
    }

    #[test]
    fn validate_catches_undefined_label() {
        let instrs = vec![Instr::Goto("Lnowhere".into())];
        let errors = validate(&instrs);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("undefined label"));
    }

    #[test]
    fn validate_catches_read_before_write() {
        let instrs = vec![Instr::Copy {
            dst: "x".into(),
            src: "t3".into(),
        }];
        let errors = validate(&instrs);
        assert!(errors.iter().any(|e| e.contains("read before")));
    }

    #[test]
    fn validate_counts_params_per_call() {
        // nested call consumes its own params first
        let ok = vec![
            Instr::Param("a".into()),
            Instr::Param("x".into()),
            Instr::Call {
                dst: Some("t0".into()),
                func: "g".into(),
                argc: 1,
            },
            Instr::Param("t0".into()),
            Instr::Call {
                dst: Some("t1".into()),
                func: "f".into(),
                argc: 2,
            },
        ];
        assert!(validate(&ok).is_empty());

        let missing = vec![Instr::Call {
            dst: None,
            func: "f".into(),
            argc: 1,
        }];
        let errors = validate(&missing);
        assert!(errors.iter().any(|e| e.contains("only 0 pushed")));
    }

    #[test]
    fn validate_requires_return_and_endfunc() {
        let no_return = vec![
            Instr::FunctionBegin {
                name: "f".into(),
                params: vec![],
                frame_size: 8,
            },
            Instr::FunctionEnd,
        ];
        assert!(validate(&no_return)
            .iter()
            .any(|e| e.contains("no reachable return")));

        let unclosed = vec![Instr::FunctionBegin {
            name: "f".into(),
            params: vec![],
            frame_size: 8,
        }];
        assert!(validate(&unclosed).iter().any(|e| e.contains("no endfunc")));
    }

    #[test]
    fn duplicate_label_is_reported() {
        let instrs = vec![Instr::Label("L0".into()), Instr::Label("L0".into())];
        let errors = validate(&instrs);
        assert!(errors.iter().any(|e| e.contains("more than once")));
    }
}
