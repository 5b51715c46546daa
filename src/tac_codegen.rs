//! TAC generator: lowers the typed AST into three-address code.
//!
//! Expressions lower to an instruction list plus a result operand,
//! left-to-right at every binary node. A pure variable reference is its own
//! operand; no temporary is minted for it. Sub-expression temporaries are
//! released the moment a producing instruction consumes them, which keeps
//! the live peak at the tree's Ershov number.

use std::collections::HashMap;

use crate::ast::{Block, Class, Expr, ExprKind, Function, Lit, Program, Stmt, StmtKind};
use crate::cst::{BinOp, UnOp};
use crate::tac::{
    validate, ActivationRecord, Instr, LabelAllocator, TempAllocator, WORD_SIZE,
};
use crate::types::{defining_class_of_method, lookup_member, ClassRegistry, Member, Type};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub name: String,
    pub params: Vec<String>,
    pub frame_size: u32,
}

#[derive(Debug, Clone)]
pub struct TacOutput {
    pub instructions: Vec<Instr>,
    pub functions: Vec<FunctionInfo>,
    pub temporaries_used: u32,
    pub validation_errors: Vec<String>,
}

impl TacOutput {
    pub fn listing(&self) -> Vec<String> {
        self.instructions.iter().map(|i| i.to_string()).collect()
    }
}

/// Lower a typed, error-free program. Top-level statements form a leading
/// global stream; function, method, and constructor bodies follow.
pub fn generate(program: &Program, classes: &ClassRegistry) -> TacOutput {
    let mut generator = TacGenerator::new(classes);
    generator.emit(Instr::Comment("TAC Code Generation".into()));

    for stmt in &program.statements {
        match &stmt.kind {
            StmtKind::FunctionDecl(_) | StmtKind::ClassDecl(_) => {}
            _ => generator.lower_stmt(stmt),
        }
    }
    for stmt in &program.statements {
        match &stmt.kind {
            StmtKind::FunctionDecl(func) => generator.lower_function(func, None),
            StmtKind::ClassDecl(class) => generator.lower_class(class),
            _ => {}
        }
    }

    let validation_errors = validate(&generator.instructions);
    TacOutput {
        temporaries_used: generator.temps.names_minted(),
        instructions: generator.instructions,
        functions: generator.functions,
        validation_errors,
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

struct LoopCtx {
    /// `None` for switch contexts, which accept `break` but not `continue`.
    continue_label: Option<String>,
    break_label: String,
}

/// Declarations found inside a function body; their code is emitted after
/// the enclosing function closes so `@function` regions never nest.
enum Deferred {
    Function(Function),
    Class(Class),
}

struct TacGenerator<'a> {
    classes: &'a ClassRegistry,
    instructions: Vec<Instr>,
    temps: TempAllocator,
    labels: LabelAllocator,
    loop_stack: Vec<LoopCtx>,
    functions: Vec<FunctionInfo>,
    /// One name map per open lexical scope. A declaration that shadows an
    /// enclosing binding gets a `_scopeN` suffix so the flat TAC namespace
    /// keeps the two apart.
    name_scopes: Vec<HashMap<String, String>>,
    in_function: bool,
    deferred: Vec<Deferred>,
}

impl<'a> TacGenerator<'a> {
    fn new(classes: &'a ClassRegistry) -> Self {
        Self {
            classes,
            instructions: Vec::new(),
            temps: TempAllocator::new(),
            labels: LabelAllocator::new(),
            loop_stack: Vec::new(),
            functions: Vec::new(),
            name_scopes: vec![HashMap::new()],
            in_function: false,
            deferred: Vec::new(),
        }
    }

    fn emit(&mut self, instr: Instr) {
        self.instructions.push(instr);
    }

    // ── Scoped names ─────────────────────────────────────────────────

    fn enter_name_scope(&mut self) {
        self.name_scopes.push(HashMap::new());
    }

    fn exit_name_scope(&mut self) {
        self.name_scopes.pop();
    }

    fn declare_name(&mut self, name: &str) -> String {
        let level = self.name_scopes.len() - 1;
        let shadows = self.name_scopes.iter().any(|m| m.contains_key(name));
        let scoped = if level > 0 && shadows {
            format!("{}_scope{}", name, level)
        } else {
            name.to_string()
        };
        self.name_scopes
            .last_mut()
            .expect("a name scope is always open")
            .insert(name.to_string(), scoped.clone());
        scoped
    }

    fn resolve_name(&self, name: &str) -> String {
        for map in self.name_scopes.iter().rev() {
            if let Some(scoped) = map.get(name) {
                return scoped.clone();
            }
        }
        name.to_string()
    }

    // ── Statements ───────────────────────────────────────────────────

    fn lower_block(&mut self, block: &Block) {
        self.enter_name_scope();
        for stmt in &block.statements {
            self.lower_stmt(stmt);
        }
        self.exit_name_scope();
    }

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block(block) => self.lower_block(block),
            StmtKind::VariableDecl { name, init, .. } => {
                let dst = self.declare_name(name);
                if let Some(init) = init {
                    let value = self.lower_expr(init);
                    self.emit(Instr::Copy {
                        dst,
                        src: value.clone(),
                    });
                    self.temps.release(&value);
                }
            }
            StmtKind::ConstDecl { name, init, .. } => {
                let dst = self.declare_name(name);
                let value = self.lower_expr(init);
                self.emit(Instr::Copy {
                    dst,
                    src: value.clone(),
                });
                self.temps.release(&value);
            }
            StmtKind::Assignment { target, value } => match &target.kind {
                ExprKind::VariableRef(name) => {
                    let dst = self.resolve_name(name);
                    let value = self.lower_expr(value);
                    self.emit(Instr::Copy {
                        dst,
                        src: value.clone(),
                    });
                    self.temps.release(&value);
                }
                ExprKind::IndexAccess { array, index } => {
                    let array = self.lower_expr(array);
                    let index = self.lower_expr(index);
                    let value = self.lower_expr(value);
                    self.emit(Instr::IndexedStore {
                        array: array.clone(),
                        index: index.clone(),
                        src: value.clone(),
                    });
                    self.temps.release(&value);
                    self.temps.release(&index);
                    self.temps.release(&array);
                }
                _ => {}
            },
            StmtKind::PropertyAssignment {
                object,
                property,
                value,
            } => {
                let object = self.lower_expr(object);
                let value = self.lower_expr(value);
                self.emit(Instr::FieldStore {
                    object: object.clone(),
                    field: property.clone(),
                    src: value.clone(),
                });
                self.temps.release(&value);
                self.temps.release(&object);
            }
            StmtKind::ExprStmt(expr) => {
                let value = self.lower_expr(expr);
                self.temps.release(&value);
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => self.lower_if(cond, then_block, else_block.as_ref()),
            StmtKind::While { cond, body } => self.lower_while(cond, body),
            StmtKind::DoWhile { body, cond } => self.lower_do_while(body, cond),
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => self.lower_for(init.as_deref(), cond.as_ref(), step.as_deref(), body),
            StmtKind::Foreach {
                var,
                iterable,
                body,
                ..
            } => self.lower_foreach(var, iterable, body),
            StmtKind::Switch {
                scrutinee,
                cases,
                default,
            } => self.lower_switch(scrutinee, cases, default.as_ref()),
            StmtKind::Break => {
                if let Some(ctx) = self.loop_stack.last() {
                    let target = ctx.break_label.clone();
                    self.emit(Instr::Goto(target));
                }
            }
            StmtKind::Continue => {
                let target = self
                    .loop_stack
                    .iter()
                    .rev()
                    .find_map(|ctx| ctx.continue_label.clone());
                if let Some(target) = target {
                    self.emit(Instr::Goto(target));
                }
            }
            StmtKind::Return(value) => match value {
                Some(value) => {
                    let result = self.lower_expr(value);
                    self.emit(Instr::Return(Some(result.clone())));
                    self.temps.release(&result);
                }
                None => self.emit(Instr::Return(None)),
            },
            StmtKind::TryCatch {
                try_block,
                exc_name,
                catch_block,
            } => {
                let catch_label = self.labels.fresh("Lcatch");
                let end_label = self.labels.fresh("Lend");
                self.emit(Instr::TryBegin(catch_label.clone()));
                self.lower_block(try_block);
                self.emit(Instr::TryEnd);
                self.emit(Instr::Goto(end_label.clone()));
                self.emit(Instr::Label(catch_label));
                self.emit(Instr::Comment(format!("catch ({})", exc_name)));
                self.enter_name_scope();
                self.declare_name(exc_name);
                self.lower_block(catch_block);
                self.exit_name_scope();
                self.emit(Instr::Label(end_label));
            }
            StmtKind::FunctionDecl(func) => {
                if self.in_function {
                    self.deferred.push(Deferred::Function(func.clone()));
                } else {
                    self.lower_function(func, None);
                }
            }
            StmtKind::ClassDecl(class) => {
                if self.in_function {
                    self.deferred.push(Deferred::Class(class.clone()));
                } else {
                    self.lower_class(class);
                }
            }
        }
    }

    fn lower_if(&mut self, cond: &Expr, then_block: &Block, else_block: Option<&Block>) {
        match else_block {
            None => {
                let end_label = self.labels.fresh("Lend");
                self.lower_condition(cond, &end_label);
                self.lower_block(then_block);
                self.emit(Instr::Label(end_label));
            }
            Some(else_block) => {
                let else_label = self.labels.fresh("Lelse");
                self.lower_condition(cond, &else_label);
                self.lower_block(then_block);
                if then_block.terminates {
                    // no fall-through to protect against
                    self.emit(Instr::Label(else_label));
                    self.lower_block(else_block);
                } else {
                    let end_label = self.labels.fresh("Lend");
                    self.emit(Instr::Goto(end_label.clone()));
                    self.emit(Instr::Label(else_label));
                    self.lower_block(else_block);
                    self.emit(Instr::Label(end_label));
                }
            }
        }
    }

    fn lower_while(&mut self, cond: &Expr, body: &Block) {
        let loop_label = self.labels.fresh("Lloop");
        let end_label = self.labels.fresh("Lend");
        self.emit(Instr::Label(loop_label.clone()));
        self.lower_condition(cond, &end_label);
        self.loop_stack.push(LoopCtx {
            continue_label: Some(loop_label.clone()),
            break_label: end_label.clone(),
        });
        self.lower_block(body);
        self.loop_stack.pop();
        self.emit(Instr::Goto(loop_label));
        self.emit(Instr::Label(end_label));
    }

    fn lower_do_while(&mut self, body: &Block, cond: &Expr) {
        let loop_label = self.labels.fresh("Lloop");
        // continue must re-test the condition, not restart the body
        let cond_label = self.labels.fresh("Lcond");
        let end_label = self.labels.fresh("Lend");
        self.emit(Instr::Label(loop_label.clone()));
        self.loop_stack.push(LoopCtx {
            continue_label: Some(cond_label.clone()),
            break_label: end_label.clone(),
        });
        self.lower_block(body);
        self.loop_stack.pop();
        self.emit(Instr::Label(cond_label));
        let cond_value = self.lower_expr(cond);
        self.emit(Instr::If {
            cond: cond_value.clone(),
            target: loop_label,
        });
        self.temps.release(&cond_value);
        self.emit(Instr::Label(end_label));
    }

    fn lower_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        step: Option<&Stmt>,
        body: &Block,
    ) {
        // induction variable lives in the header's own scope
        self.enter_name_scope();
        if let Some(init) = init {
            self.lower_stmt(init);
        }
        let loop_label = self.labels.fresh("Lloop");
        let step_label = self.labels.fresh("Lstep");
        let end_label = self.labels.fresh("Lend");
        self.emit(Instr::Label(loop_label.clone()));
        if let Some(cond) = cond {
            self.lower_condition(cond, &end_label);
        }
        self.loop_stack.push(LoopCtx {
            continue_label: Some(step_label.clone()),
            break_label: end_label.clone(),
        });
        self.lower_block(body);
        self.loop_stack.pop();
        self.emit(Instr::Label(step_label));
        if let Some(step) = step {
            self.lower_stmt(step);
        }
        self.emit(Instr::Goto(loop_label));
        self.emit(Instr::Label(end_label));
        self.exit_name_scope();
    }

    /// `foreach (v in a)` is a `for` over a fresh index from 0 to `len(a)`,
    /// with `v = a[i]` at the top of the body.
    fn lower_foreach(&mut self, var: &str, iterable: &Expr, body: &Block) {
        let array = self.lower_expr(iterable);
        self.enter_name_scope();
        let var = self.declare_name(var);
        let index = self.temps.fresh();
        self.emit(Instr::Copy {
            dst: index.clone(),
            src: "0".into(),
        });
        self.emit(Instr::Param(array.clone()));
        let length = self.temps.fresh();
        self.emit(Instr::Call {
            dst: Some(length.clone()),
            func: "len".into(),
            argc: 1,
        });

        let loop_label = self.labels.fresh("Lloop");
        let step_label = self.labels.fresh("Lstep");
        let end_label = self.labels.fresh("Lend");
        self.emit(Instr::Label(loop_label.clone()));
        self.emit(Instr::IfRel {
            lhs: index.clone(),
            op: ">=".into(),
            rhs: length.clone(),
            target: end_label.clone(),
        });
        self.emit(Instr::IndexedLoad {
            dst: var.to_string(),
            array: array.clone(),
            index: index.clone(),
        });
        self.loop_stack.push(LoopCtx {
            continue_label: Some(step_label.clone()),
            break_label: end_label.clone(),
        });
        self.lower_block(body);
        self.loop_stack.pop();
        self.emit(Instr::Label(step_label));
        self.emit(Instr::Binary {
            dst: index.clone(),
            lhs: index.clone(),
            op: "+".into(),
            rhs: "1".into(),
        });
        self.emit(Instr::Goto(loop_label));
        self.emit(Instr::Label(end_label));
        self.exit_name_scope();
        self.temps.release(&length);
        self.temps.release(&index);
        self.temps.release(&array);
    }

    /// Dispatch tests in declared order, then `goto` default (or the end).
    /// Case bodies fall through; `break` jumps to the end label.
    fn lower_switch(&mut self, scrutinee: &Expr, cases: &[(Expr, Block)], default: Option<&Block>) {
        let value = self.lower_expr(scrutinee);
        let end_label = self.labels.fresh("Lend");
        let case_labels: Vec<String> = cases
            .iter()
            .map(|_| self.labels.fresh("Lcase"))
            .collect();
        let default_label = if default.is_some() {
            self.labels.fresh("Ldefault")
        } else {
            end_label.clone()
        };

        for ((case_value, _), label) in cases.iter().zip(&case_labels) {
            let case_operand = self.lower_expr(case_value);
            self.emit(Instr::IfRel {
                lhs: value.clone(),
                op: "==".into(),
                rhs: case_operand.clone(),
                target: label.clone(),
            });
            self.temps.release(&case_operand);
        }
        self.emit(Instr::Goto(default_label.clone()));

        self.loop_stack.push(LoopCtx {
            continue_label: None,
            break_label: end_label.clone(),
        });
        for ((_, body), label) in cases.iter().zip(&case_labels) {
            self.emit(Instr::Label(label.clone()));
            self.lower_block(body);
        }
        if let Some(default) = default {
            self.emit(Instr::Label(default_label));
            self.lower_block(default);
        }
        self.loop_stack.pop();
        self.emit(Instr::Label(end_label));
        self.temps.release(&value);
    }

    // ── Functions, methods, classes ──────────────────────────────────

    fn lower_class(&mut self, class: &Class) {
        self.emit(Instr::Comment(format!("Class: {}", class.name)));
        for member in &class.members {
            if let StmtKind::FunctionDecl(method) = &member.kind {
                self.lower_function(method, Some(&class.name));
            }
        }
        let has_any_ctor = lookup_member(self.classes, &class.name, "constructor")
            .map(|m| matches!(m, Member::Method(_)))
            .unwrap_or(false);
        if !has_any_ctor {
            self.lower_default_constructor(&class.name);
        }
    }

    fn lower_function(&mut self, func: &Function, class: Option<&str>) {
        let qualified = match class {
            Some(class) => format!("{}_{}", class, func.name),
            None => func.name.clone(),
        };
        let mut params: Vec<String> = Vec::new();
        if class.is_some() {
            params.push("this".into());
        }
        params.extend(func.params.iter().map(|(name, _)| name.clone()));

        let begin_index = self.instructions.len();
        self.emit(Instr::FunctionBegin {
            name: qualified.clone(),
            params: params.clone(),
            frame_size: 0,
        });
        self.temps.take_frame_peak(); // restart the spill measurement

        // parameters keep their frame names; body locals that shadow an
        // outer binding are renamed inside this scope
        self.enter_name_scope();
        for param in &params {
            self.name_scopes
                .last_mut()
                .expect("a name scope is always open")
                .insert(param.clone(), param.clone());
        }
        let was_in_function = self.in_function;
        self.in_function = true;
        self.lower_block(&func.body);
        self.in_function = was_in_function;
        self.exit_name_scope();

        if !func.body.terminates {
            let is_constructor = class.is_some() && func.name == "constructor";
            if is_constructor {
                self.emit(Instr::Return(Some("this".into())));
            } else if func.ret == Type::Void {
                self.emit(Instr::Return(None));
            } else {
                self.emit(Instr::Return(Some(default_value(&func.ret))));
            }
        }
        self.emit(Instr::FunctionEnd);

        let frame_size = self.finish_frame(&qualified, &params, begin_index);
        self.functions.push(FunctionInfo {
            name: qualified,
            params,
            frame_size,
        });

        if !self.in_function {
            let deferred = std::mem::take(&mut self.deferred);
            for decl in deferred {
                match decl {
                    Deferred::Function(func) => self.lower_function(&func, None),
                    Deferred::Class(class) => self.lower_class(&class),
                }
            }
        }
    }

    fn lower_default_constructor(&mut self, class: &str) {
        let name = format!("{}_constructor", class);
        let params = vec!["this".to_string()];
        let begin_index = self.instructions.len();
        self.emit(Instr::Comment(format!("Default constructor: {}", class)));
        self.emit(Instr::FunctionBegin {
            name: name.clone(),
            params: params.clone(),
            frame_size: 0,
        });
        self.emit(Instr::Return(Some("this".into())));
        self.emit(Instr::FunctionEnd);
        let frame_size = self.finish_frame(&name, &params, begin_index);
        self.functions.push(FunctionInfo {
            name,
            params,
            frame_size,
        });
    }

    /// Build the activation record for the function just emitted and patch
    /// its frame size into the `@function` marker. Locals are the non-temp
    /// names the body writes that are not parameters.
    fn finish_frame(&mut self, name: &str, params: &[String], begin_index: usize) -> u32 {
        let mut record = ActivationRecord::new(name, params);
        for instr in &self.instructions[begin_index..] {
            let written = match instr {
                Instr::Copy { dst, .. }
                | Instr::Binary { dst, .. }
                | Instr::Unary { dst, .. }
                | Instr::IndexedLoad { dst, .. }
                | Instr::FieldLoad { dst, .. }
                | Instr::New { dst, .. } => Some(dst),
                Instr::Call { dst: Some(dst), .. } => Some(dst),
                _ => None,
            };
            if let Some(written) = written {
                if !crate::tac::is_temp(written)
                    && written != "this"
                    && record.param_offset(written).is_none()
                {
                    record.add_local(written);
                }
            }
        }
        record.temp_spill_size = self.temps.take_frame_peak() * WORD_SIZE;
        let frame_size = record.frame_size();
        let patch_index = if matches!(self.instructions[begin_index], Instr::Comment(_)) {
            begin_index + 1
        } else {
            begin_index
        };
        if let Instr::FunctionBegin {
            frame_size: slot, ..
        } = &mut self.instructions[patch_index]
        {
            *slot = frame_size;
        }
        frame_size
    }

    // ── Conditions (jump-threaded) ───────────────────────────────────

    /// Lower `cond` so control transfers to `false_target` when it is
    /// false and falls through when true. `&&`/`||`/`!` thread their jumps
    /// instead of materializing a boolean temporary.
    fn lower_condition(&mut self, cond: &Expr, false_target: &str) {
        match &cond.kind {
            ExprKind::BinaryOp {
                op: BinOp::And,
                left,
                right,
            } => {
                self.lower_condition(left, false_target);
                self.lower_condition(right, false_target);
            }
            ExprKind::BinaryOp {
                op: BinOp::Or,
                left,
                right,
            } => {
                let true_label = self.labels.fresh("Ltrue");
                let value = self.lower_expr(left);
                self.emit(Instr::If {
                    cond: value.clone(),
                    target: true_label.clone(),
                });
                self.temps.release(&value);
                self.lower_condition(right, false_target);
                self.emit(Instr::Label(true_label));
            }
            ExprKind::UnaryOp {
                op: UnOp::Not,
                operand,
            } => {
                let value = self.lower_expr(operand);
                self.emit(Instr::If {
                    cond: value.clone(),
                    target: false_target.to_string(),
                });
                self.temps.release(&value);
            }
            _ => {
                let value = self.lower_expr(cond);
                self.emit(Instr::IfFalse {
                    cond: value.clone(),
                    target: false_target.to_string(),
                });
                self.temps.release(&value);
            }
        }
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn lower_expr(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Literal(lit) => literal_operand(lit),
            ExprKind::VariableRef(name) => self.resolve_name(name),
            ExprKind::This => "this".into(),
            ExprKind::BinaryOp { op, left, right } => match op {
                BinOp::And | BinOp::Or => self.lower_shortcircuit(*op, left, right),
                _ => {
                    let lhs = self.lower_expr(left);
                    let rhs = self.lower_expr(right);
                    self.temps.release(&rhs);
                    self.temps.release(&lhs);
                    let dst = self.temps.fresh();
                    self.emit(Instr::Binary {
                        dst: dst.clone(),
                        lhs,
                        op: op.symbol().to_string(),
                        rhs,
                    });
                    dst
                }
            },
            ExprKind::UnaryOp { op, operand } => {
                let value = self.lower_expr(operand);
                self.temps.release(&value);
                let dst = self.temps.fresh();
                self.emit(Instr::Unary {
                    dst: dst.clone(),
                    op: op.symbol().to_string(),
                    operand: value,
                });
                dst
            }
            ExprKind::Ternary {
                cond,
                then_val,
                else_val,
            } => {
                let dst = self.temps.fresh();
                let else_label = self.labels.fresh("Lelse");
                let end_label = self.labels.fresh("Lend");
                self.lower_condition(cond, &else_label);
                let then_value = self.lower_expr(then_val);
                self.emit(Instr::Copy {
                    dst: dst.clone(),
                    src: then_value.clone(),
                });
                self.temps.release(&then_value);
                self.emit(Instr::Goto(end_label.clone()));
                self.emit(Instr::Label(else_label));
                let else_value = self.lower_expr(else_val);
                self.emit(Instr::Copy {
                    dst: dst.clone(),
                    src: else_value.clone(),
                });
                self.temps.release(&else_value);
                self.emit(Instr::Label(end_label));
                dst
            }
            ExprKind::Call { callee, args } => self.lower_call(callee, args, &expr.ty),
            ExprKind::NewExpr { class, args } => {
                for arg in args {
                    let value = self.lower_expr(arg);
                    self.emit(Instr::Param(value.clone()));
                    self.temps.release(&value);
                }
                let dst = self.temps.fresh();
                self.emit(Instr::New {
                    dst: dst.clone(),
                    class: class.clone(),
                    argc: args.len(),
                });
                dst
            }
            ExprKind::PropertyAccess { object, property } => {
                let object = self.lower_expr(object);
                self.temps.release(&object);
                let dst = self.temps.fresh();
                self.emit(Instr::FieldLoad {
                    dst: dst.clone(),
                    object,
                    field: property.clone(),
                });
                dst
            }
            ExprKind::IndexAccess { array, index } => {
                let array = self.lower_expr(array);
                let index = self.lower_expr(index);
                self.temps.release(&index);
                self.temps.release(&array);
                let dst = self.temps.fresh();
                self.emit(Instr::IndexedLoad {
                    dst: dst.clone(),
                    array,
                    index,
                });
                dst
            }
            ExprKind::ArrayLiteral(elements) => {
                let dst = self.temps.fresh();
                // pseudo-allocation; the backing store is a runtime concern
                self.emit(Instr::IndexedLoad {
                    dst: dst.clone(),
                    array: "array".into(),
                    index: elements.len().to_string(),
                });
                for (i, element) in elements.iter().enumerate() {
                    let value = self.lower_expr(element);
                    self.emit(Instr::IndexedStore {
                        array: dst.clone(),
                        index: i.to_string(),
                        src: value.clone(),
                    });
                    self.temps.release(&value);
                }
                dst
            }
        }
    }

    /// Value-context `&&`/`||`: jump threading with the result written on
    /// both paths.
    fn lower_shortcircuit(&mut self, op: BinOp, left: &Expr, right: &Expr) -> String {
        let short_label = self.labels.fresh(if op == BinOp::And {
            "Lfalse"
        } else {
            "Ltrue"
        });
        let end_label = self.labels.fresh("Lend");
        let dst = self.temps.fresh();

        let left_value = self.lower_expr(left);
        match op {
            BinOp::And => self.emit(Instr::IfFalse {
                cond: left_value.clone(),
                target: short_label.clone(),
            }),
            _ => self.emit(Instr::If {
                cond: left_value.clone(),
                target: short_label.clone(),
            }),
        }
        self.temps.release(&left_value);

        let right_value = self.lower_expr(right);
        self.emit(Instr::Copy {
            dst: dst.clone(),
            src: right_value.clone(),
        });
        self.temps.release(&right_value);
        self.emit(Instr::Goto(end_label.clone()));

        self.emit(Instr::Label(short_label));
        self.emit(Instr::Copy {
            dst: dst.clone(),
            src: if op == BinOp::And { "false" } else { "true" }.into(),
        });
        self.emit(Instr::Label(end_label));
        dst
    }

    /// Calls push arguments left-to-right, each `param` emitted as soon as
    /// its sub-expression completes. Method calls pass the receiver as the
    /// implicit first parameter and dispatch statically on the receiver's
    /// declared class.
    fn lower_call(&mut self, callee: &Expr, args: &[Expr], result_ty: &Type) -> String {
        let (func, argc) = match &callee.kind {
            ExprKind::PropertyAccess { object, property } => {
                let receiver = self.lower_expr(object);
                self.emit(Instr::Param(receiver.clone()));
                self.temps.release(&receiver);
                let class = match &object.ty {
                    Type::Class(name) => {
                        defining_class_of_method(self.classes, name, property)
                            .unwrap_or_else(|| name.clone())
                    }
                    _ => String::new(),
                };
                for arg in args {
                    let value = self.lower_expr(arg);
                    self.emit(Instr::Param(value.clone()));
                    self.temps.release(&value);
                }
                (format!("{}_{}", class, property), args.len() + 1)
            }
            ExprKind::VariableRef(name) => {
                for arg in args {
                    let value = self.lower_expr(arg);
                    self.emit(Instr::Param(value.clone()));
                    self.temps.release(&value);
                }
                (name.clone(), args.len())
            }
            _ => (String::from("<invalid>"), args.len()),
        };

        if *result_ty == Type::Void {
            self.emit(Instr::Call {
                dst: None,
                func,
                argc,
            });
            String::new()
        } else {
            let dst = self.temps.fresh();
            self.emit(Instr::Call {
                dst: Some(dst.clone()),
                func,
                argc,
            });
            dst
        }
    }
}

// ---------------------------------------------------------------------------
// Operand formatting
// ---------------------------------------------------------------------------

fn literal_operand(lit: &Lit) -> String {
    match lit {
        Lit::Int(v) => v.to_string(),
        Lit::Float(v) => format!("{:?}", v),
        Lit::Str(v) => quote_string(v),
        Lit::Bool(v) => v.to_string(),
        Lit::Null => "null".into(),
    }
}

fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn default_value(ty: &Type) -> String {
    match ty {
        Type::Integer => "0".into(),
        Type::Float => "0.0".into(),
        Type::String => "\"\"".into(),
        Type::Boolean => "false".into(),
        _ => "null".into(),
    }
}
