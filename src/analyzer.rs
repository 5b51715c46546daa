//! CompilScript semantic analyzer.
//!
//! Walks the concrete parse tree, builds the typed AST and the scope tree,
//! registers classes, and enforces every static rule. Diagnostics are
//! collected; the analyzer recovers from each error and keeps going.

use std::collections::HashSet;

use crate::ast::{self, Block, Class, Expr, ExprKind, Function, Lit, Stmt, StmtKind};
use crate::cst::{self, BinOp, TypeRef, UnOp};
use crate::diagnostics::{Diagnostic, SemanticDiag};
use crate::symbols::{ScopeKind, ScopeTree, Symbol, SymbolKind, GLOBAL_SCOPE};
use crate::token::Span;
use crate::types::{
    assignable, defining_class_of_method, lookup_member, promote_numeric, unify_array_elements,
    ClassMeta, ClassRegistry, Member, MethodSig, Type,
};

/// Names reserved in the global scope: I/O, length, and the construction
/// helpers. Redefining any of them at the top level is a `BuiltinClash`.
pub const BUILTIN_NAMES: &[&str] = &["print", "len", "str", "int", "float"];

// ---------------------------------------------------------------------------
// Analysis result
// ---------------------------------------------------------------------------

/// Everything the analyzer produces for one compilation unit.
pub struct Analysis {
    pub program: ast::Program,
    pub scopes: ScopeTree,
    pub classes: ClassRegistry,
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }
}

// ---------------------------------------------------------------------------
// Semantic analyzer
// ---------------------------------------------------------------------------

pub struct SemanticAnalyzer {
    scopes: ScopeTree,
    classes: ClassRegistry,
    diagnostics: Vec<Diagnostic>,
    /// One expected return type per entered function/method.
    return_stack: Vec<Type>,
    loop_depth: u32,
    switch_depth: u32,
    current_class: Option<String>,
    /// Top-level classes whose names and signatures were pre-registered.
    processed_classes: HashSet<String>,
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        let mut analyzer = Self {
            scopes: ScopeTree::new(),
            classes: ClassRegistry::new(),
            diagnostics: Vec::new(),
            return_stack: Vec::new(),
            loop_depth: 0,
            switch_depth: 0,
            current_class: None,
            processed_classes: HashSet::new(),
        };
        analyzer.declare_builtins();
        analyzer
    }

    /// Run the full analysis. Classes go through three passes: name
    /// registration, signature population, then body analysis interleaved
    /// with the ordinary statement walk.
    pub fn analyze(mut self, program: &cst::Program) -> Analysis {
        for stmt in &program.statements {
            if let cst::StmtKind::ClassDecl {
                name, name_span, ..
            } = &stmt.kind
            {
                self.register_class_name(name, *name_span);
            }
        }
        for stmt in &program.statements {
            if let cst::StmtKind::ClassDecl { .. } = &stmt.kind {
                self.populate_class(stmt);
            }
        }

        let statements = program
            .statements
            .iter()
            .map(|s| self.visit_stmt(s))
            .collect();

        Analysis {
            program: ast::Program { statements },
            scopes: self.scopes,
            classes: self.classes,
            diagnostics: self.diagnostics,
        }
    }

    // ── Built-ins ────────────────────────────────────────────────────

    fn declare_builtins(&mut self) {
        let any_array = Type::array(Type::Any, 1);
        let builtins: &[(&str, Vec<Type>, Type)] = &[
            ("print", vec![Type::Any], Type::Void),
            ("len", vec![any_array], Type::Integer),
            ("str", vec![Type::Any], Type::String),
            ("int", vec![Type::Any], Type::Integer),
            ("float", vec![Type::Any], Type::Float),
        ];
        for (name, params, ret) in builtins {
            let sym = Symbol::callable(
                *name,
                SymbolKind::Function,
                params.clone(),
                ret.clone(),
                Span::default(),
            );
            self.scopes.define(sym).expect("builtin registration");
        }
    }

    // ── Diagnostics helpers ──────────────────────────────────────────

    fn error(&mut self, err: SemanticDiag, span: Span) {
        self.diagnostics.push(Diagnostic::semantic(err, span));
    }

    /// Check one assignment direction, staying silent when either side is
    /// already poisoned by a previous error.
    fn check_assignable(&mut self, target: &Type, actual: &Type, span: Span) {
        if *target == Type::Any || *actual == Type::Any {
            return;
        }
        if !assignable(&self.classes, target, actual) {
            self.error(
                SemanticDiag::TypeMismatch {
                    expected: target.to_string(),
                    found: actual.to_string(),
                },
                span,
            );
        }
    }

    /// Argument check: builtin parameters typed `any` accept everything and
    /// `any[]` accepts an array of any element and rank.
    fn check_argument(&mut self, param: &Type, actual: &Expr) {
        match param {
            Type::Any => {}
            Type::Array { elem, rank } if **elem == Type::Any && *rank == 1 => {
                if !(actual.ty.is_array() || actual.ty == Type::Any) {
                    self.error(
                        SemanticDiag::TypeMismatch {
                            expected: "an array".into(),
                            found: actual.ty.to_string(),
                        },
                        actual.span,
                    );
                }
            }
            _ => self.check_assignable(param, &actual.ty, actual.span),
        }
    }

    // ── Type references ──────────────────────────────────────────────

    fn resolve_type_ref(&mut self, tr: &TypeRef) -> Type {
        let base = match tr.base.as_str() {
            "integer" => Type::Integer,
            "float" => Type::Float,
            "string" => Type::String,
            "boolean" => Type::Boolean,
            "void" => Type::Void,
            name => {
                if self.classes.contains_key(name) {
                    Type::class(name)
                } else {
                    self.error(SemanticDiag::UndeclaredName(name.to_string()), tr.span);
                    Type::Any
                }
            }
        };
        if tr.dims > 0 {
            Type::array(base, tr.dims)
        } else {
            base
        }
    }

    // ── Class pass 1: name registration ──────────────────────────────

    fn register_class_name(&mut self, name: &str, name_span: Span) {
        let sym = Symbol::new(name, SymbolKind::Class, Type::class(name), name_span);
        if self.scopes.define(sym).is_err() {
            self.report_duplicate(name, name_span);
            return;
        }
        self.classes.insert(name.to_string(), ClassMeta::new(name));
    }

    fn report_duplicate(&mut self, name: &str, span: Span) {
        let is_builtin_clash =
            self.scopes.current_id() == GLOBAL_SCOPE && BUILTIN_NAMES.contains(&name);
        if is_builtin_clash {
            self.error(SemanticDiag::BuiltinClash(name.to_string()), span);
        } else {
            self.error(SemanticDiag::DuplicateName(name.to_string()), span);
        }
    }

    // ── Class pass 2: signatures, superclass link, cycle check ───────

    fn populate_class(&mut self, stmt: &cst::Stmt) {
        let (name, name_span, superclass, members) = match &stmt.kind {
            cst::StmtKind::ClassDecl {
                name,
                name_span,
                superclass,
                members,
            } => (name.clone(), *name_span, superclass.clone(), members),
            _ => return,
        };
        if !self.classes.contains_key(&name) {
            // registration failed (duplicate); nothing to populate
            return;
        }
        self.processed_classes.insert(name.clone());

        if let Some((sup, sup_span)) = &superclass {
            if self.classes.contains_key(sup) {
                self.classes.get_mut(&name).unwrap().superclass = Some(sup.clone());
                self.check_inheritance_cycle(&name, name_span);
            } else {
                self.error(SemanticDiag::UndeclaredName(sup.clone()), *sup_span);
            }
        }

        for member in members {
            match &member.kind {
                cst::StmtKind::VarDecl {
                    name: field_name,
                    name_span: field_span,
                    ty,
                    ..
                } => {
                    let field_ty = match ty {
                        Some(tr) => self.resolve_type_ref(tr),
                        None => {
                            self.error(
                                SemanticDiag::MissingType(field_name.clone()),
                                *field_span,
                            );
                            Type::Any
                        }
                    };
                    let duplicated = self.classes[&name].field(field_name).is_some()
                        || self
                            .classes[&name]
                            .superclass
                            .clone()
                            .map(|sup| {
                                lookup_member(&self.classes, &sup, field_name).is_some()
                            })
                            .unwrap_or(false);
                    if duplicated {
                        self.error(SemanticDiag::DuplicateName(field_name.clone()), *field_span);
                    } else {
                        self.classes
                            .get_mut(&name)
                            .unwrap()
                            .fields
                            .push((field_name.clone(), field_ty));
                    }
                }
                cst::StmtKind::FuncDecl(func) => {
                    let sig = self.resolve_method_sig(func);
                    if self.classes[&name].method(&func.name).is_some() {
                        self.error(
                            SemanticDiag::DuplicateName(func.name.clone()),
                            func.name_span,
                        );
                        continue;
                    }
                    self.check_override(&name, func, &sig);
                    let meta = self.classes.get_mut(&name).unwrap();
                    if func.name == "constructor" {
                        meta.has_constructor = true;
                    }
                    meta.methods.push((func.name.clone(), sig));
                }
                _ => {}
            }
        }
    }

    fn resolve_method_sig(&mut self, func: &cst::FuncDecl) -> MethodSig {
        let params = func
            .params
            .iter()
            .map(|p| match &p.ty {
                Some(tr) => self.resolve_type_ref(tr),
                None => {
                    self.error(SemanticDiag::MissingType(p.name.clone()), p.span);
                    Type::Any
                }
            })
            .collect();
        let ret = match &func.ret {
            Some(tr) => self.resolve_type_ref(tr),
            None => Type::Void,
        };
        MethodSig { params, ret }
    }

    /// Iterative ancestor walk bounded by the number of registered classes.
    fn check_inheritance_cycle(&mut self, class: &str, span: Span) {
        let mut current = self.classes[class].superclass.clone();
        let mut steps = 0;
        while let Some(cls) = current {
            if cls == class {
                self.error(SemanticDiag::InheritanceCycle(class.to_string()), span);
                return;
            }
            steps += 1;
            if steps > self.classes.len() {
                return;
            }
            current = self.classes.get(&cls).and_then(|m| m.superclass.clone());
        }
    }

    fn check_override(&mut self, class: &str, func: &cst::FuncDecl, sig: &MethodSig) {
        let sup = match self.classes[class].superclass.clone() {
            Some(s) => s,
            None => return,
        };
        let inherited = match lookup_member(&self.classes, &sup, &func.name) {
            Some(Member::Method(m)) => m,
            _ => return,
        };
        if inherited.params.len() != sig.params.len() {
            self.error(
                SemanticDiag::OverrideIncompatible {
                    class: class.to_string(),
                    method: func.name.clone(),
                    detail: "different arity",
                },
                func.name_span,
            );
            return;
        }
        for (mine, sup_param) in sig.params.iter().zip(inherited.params.iter()) {
            let compatible = assignable(&self.classes, sup_param, mine)
                || assignable(&self.classes, mine, sup_param);
            if !compatible {
                self.error(
                    SemanticDiag::OverrideIncompatible {
                        class: class.to_string(),
                        method: func.name.clone(),
                        detail: "parameter types do not match",
                    },
                    func.name_span,
                );
                return;
            }
        }
        if sig.ret != inherited.ret {
            self.error(
                SemanticDiag::OverrideIncompatible {
                    class: class.to_string(),
                    method: func.name.clone(),
                    detail: "return type differs",
                },
                func.name_span,
            );
        }
    }

    // ── Statements ───────────────────────────────────────────────────

    fn visit_stmt(&mut self, stmt: &cst::Stmt) -> Stmt {
        let span = stmt.span;
        let kind = match &stmt.kind {
            cst::StmtKind::VarDecl { .. } => self.visit_var_decl(stmt),
            cst::StmtKind::Assign { target, value } => self.visit_assign(target, value),
            cst::StmtKind::ExprStmt(expr) => StmtKind::ExprStmt(self.visit_expr(expr)),
            cst::StmtKind::Block(stmts) => {
                StmtKind::Block(self.visit_block(stmts, ScopeKind::Block, "block"))
            }
            cst::StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                let cond = self.visit_condition(cond, "if");
                let then_block = self.visit_block(then_block, ScopeKind::Block, "then");
                let else_block = else_block
                    .as_ref()
                    .map(|b| self.visit_block(b, ScopeKind::Block, "else"));
                StmtKind::If {
                    cond,
                    then_block,
                    else_block,
                }
            }
            cst::StmtKind::While { cond, body } => {
                let cond = self.visit_condition(cond, "while");
                self.loop_depth += 1;
                let body = self.visit_block(body, ScopeKind::LoopBody, "while");
                self.loop_depth -= 1;
                StmtKind::While { cond, body }
            }
            cst::StmtKind::DoWhile { body, cond } => {
                self.loop_depth += 1;
                let body = self.visit_block(body, ScopeKind::LoopBody, "do");
                self.loop_depth -= 1;
                let cond = self.visit_condition(cond, "do-while");
                StmtKind::DoWhile { body, cond }
            }
            cst::StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                // the header gets its own scope so the induction variable
                // does not leak
                self.scopes.enter(ScopeKind::Block, "for");
                let init = init.as_ref().map(|s| Box::new(self.visit_stmt(s)));
                let cond = cond.as_ref().map(|c| self.visit_condition(c, "for"));
                let step = step.as_ref().map(|s| Box::new(self.visit_stmt(s)));
                self.loop_depth += 1;
                let body = self.visit_block(body, ScopeKind::LoopBody, "for");
                self.loop_depth -= 1;
                self.scopes.leave();
                StmtKind::For {
                    init,
                    cond,
                    step,
                    body,
                }
            }
            cst::StmtKind::Foreach {
                var,
                var_span,
                iterable,
                body,
            } => {
                let iterable = self.visit_expr(iterable);
                let elem_ty = match iterable.ty.element_type() {
                    Ok(t) => t,
                    Err(_) => {
                        if iterable.ty != Type::Any {
                            self.error(
                                SemanticDiag::NonIndexable(iterable.ty.to_string()),
                                iterable.span,
                            );
                        }
                        Type::Any
                    }
                };
                self.scopes.enter(ScopeKind::LoopBody, "foreach");
                let sym = Symbol::new(var, SymbolKind::Variable, elem_ty.clone(), *var_span);
                if self.scopes.define(sym).is_err() {
                    self.report_duplicate(var, *var_span);
                }
                self.loop_depth += 1;
                let body = self.visit_block(body, ScopeKind::Block, "block");
                self.loop_depth -= 1;
                self.scopes.leave();
                StmtKind::Foreach {
                    var: var.clone(),
                    elem_ty,
                    iterable,
                    body,
                }
            }
            cst::StmtKind::Switch {
                scrutinee,
                cases,
                default,
            } => {
                let scrutinee = self.visit_expr(scrutinee);
                self.switch_depth += 1;
                let mut out_cases = Vec::new();
                for case in cases {
                    let value = self.visit_expr(&case.value);
                    self.check_assignable(&scrutinee.ty, &value.ty, value.span);
                    let body = self.visit_block(&case.body, ScopeKind::SwitchCase, "case");
                    out_cases.push((value, body));
                }
                let default = default
                    .as_ref()
                    .map(|b| self.visit_block(b, ScopeKind::SwitchCase, "default"));
                self.switch_depth -= 1;
                StmtKind::Switch {
                    scrutinee,
                    cases: out_cases,
                    default,
                }
            }
            cst::StmtKind::Break => {
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    self.error(SemanticDiag::BreakOutsideLoop, span);
                }
                StmtKind::Break
            }
            cst::StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.error(SemanticDiag::ContinueOutsideLoop, span);
                }
                StmtKind::Continue
            }
            cst::StmtKind::Return(value) => self.visit_return(value.as_ref(), span),
            cst::StmtKind::TryCatch {
                try_block,
                exc_name,
                exc_span,
                catch_block,
            } => {
                let try_block = self.visit_block(try_block, ScopeKind::Block, "try");
                self.scopes.enter(ScopeKind::Catch, "catch");
                let sym = Symbol::new(exc_name, SymbolKind::Constant, Type::String, *exc_span);
                if self.scopes.define(sym).is_err() {
                    self.report_duplicate(exc_name, *exc_span);
                }
                let catch_block = self.visit_block(catch_block, ScopeKind::Block, "block");
                self.scopes.leave();
                StmtKind::TryCatch {
                    try_block,
                    exc_name: exc_name.clone(),
                    catch_block,
                }
            }
            cst::StmtKind::FuncDecl(func) => self.visit_function_decl(func),
            cst::StmtKind::ClassDecl { .. } => self.visit_class_decl(stmt),
        };
        Stmt { kind, span }
    }

    /// A block in its own scope, with dead-code flagging: statements after
    /// a terminating statement are reported (as warnings) but still
    /// analyzed.
    fn visit_block(&mut self, stmts: &[cst::Stmt], kind: ScopeKind, name: &str) -> Block {
        self.scopes.enter(kind, name);
        let block = self.visit_stmt_list(stmts);
        self.scopes.leave();
        block
    }

    fn visit_stmt_list(&mut self, stmts: &[cst::Stmt]) -> Block {
        let mut out = Vec::new();
        let mut terminated = false;
        for stmt in stmts {
            if terminated {
                self.error(SemanticDiag::DeadCode, stmt.span);
            }
            let node = self.visit_stmt(stmt);
            if !terminated {
                terminated = stmt_terminates(&node);
            }
            out.push(node);
        }
        Block {
            statements: out,
            terminates: terminated,
        }
    }

    fn visit_condition(&mut self, cond: &cst::Expr, construct: &'static str) -> Expr {
        let expr = self.visit_expr(cond);
        if expr.ty != Type::Boolean && expr.ty != Type::Any {
            self.error(
                SemanticDiag::InvalidCondition {
                    construct,
                    found: expr.ty.to_string(),
                },
                expr.span,
            );
        }
        expr
    }

    fn visit_var_decl(&mut self, stmt: &cst::Stmt) -> StmtKind {
        let (name, name_span, ty, init, is_const) = match &stmt.kind {
            cst::StmtKind::VarDecl {
                name,
                name_span,
                ty,
                init,
                is_const,
            } => (name, *name_span, ty, init, *is_const),
            _ => unreachable!("visit_var_decl on non-declaration"),
        };

        let declared = ty.as_ref().map(|tr| self.resolve_type_ref(tr));
        let init_expr = init
            .as_ref()
            .map(|e| self.visit_expr_expecting(e, declared.as_ref()));

        let final_ty = match (&declared, &init_expr) {
            (Some(declared), Some(init)) => {
                self.check_assignable(declared, &init.ty, init.span);
                declared.clone()
            }
            (Some(declared), None) => {
                if is_const {
                    self.error(SemanticDiag::ConstWithoutInit(name.clone()), name_span);
                }
                declared.clone()
            }
            (None, Some(init)) => {
                if init.ty == Type::Null {
                    // nothing to infer a reference type from
                    self.error(SemanticDiag::MissingType(name.clone()), name_span);
                    Type::Any
                } else {
                    init.ty.clone()
                }
            }
            (None, None) => {
                if is_const {
                    self.error(SemanticDiag::ConstWithoutInit(name.clone()), name_span);
                } else {
                    self.error(SemanticDiag::MissingType(name.clone()), name_span);
                }
                Type::Any
            }
        };

        let kind = if is_const {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        let sym = Symbol::new(name, kind, final_ty.clone(), name_span);
        if self.scopes.define(sym).is_err() {
            self.report_duplicate(name, name_span);
        }

        if is_const {
            let init = init_expr.unwrap_or_else(|| {
                Expr::new(ExprKind::Literal(Lit::Null), Type::Null, name_span)
            });
            StmtKind::ConstDecl {
                name: name.clone(),
                ty: final_ty,
                init,
            }
        } else {
            StmtKind::VariableDecl {
                name: name.clone(),
                ty: final_ty,
                init: init_expr,
            }
        }
    }

    fn visit_assign(&mut self, target: &cst::Expr, value: &cst::Expr) -> StmtKind {
        match &target.kind {
            cst::ExprKind::Var(name) => {
                let looked_up = self
                    .scopes
                    .lookup(name)
                    .map(|(sym, _)| (sym.kind, sym.ty.clone()));
                match looked_up {
                    None => {
                        self.error(SemanticDiag::UndeclaredName(name.clone()), target.span);
                        let value = self.visit_expr(value);
                        StmtKind::Assignment {
                            target: Expr::new(
                                ExprKind::VariableRef(name.clone()),
                                Type::Any,
                                target.span,
                            ),
                            value,
                        }
                    }
                    Some((SymbolKind::Constant, _)) => {
                        self.error(SemanticDiag::ConstReassigned(name.clone()), target.span);
                        let value = self.visit_expr(value);
                        StmtKind::Assignment {
                            target: Expr::new(
                                ExprKind::VariableRef(name.clone()),
                                Type::Any,
                                target.span,
                            ),
                            value,
                        }
                    }
                    Some((SymbolKind::Function, _))
                    | Some((SymbolKind::Method, _))
                    | Some((SymbolKind::Class, _)) => {
                        self.error(SemanticDiag::InvalidAssignTarget(name.clone()), target.span);
                        let value = self.visit_expr(value);
                        StmtKind::Assignment {
                            target: Expr::new(
                                ExprKind::VariableRef(name.clone()),
                                Type::Any,
                                target.span,
                            ),
                            value,
                        }
                    }
                    Some((SymbolKind::Field, field_ty)) => {
                        // bare field name inside a method body: this.field
                        let value = self.visit_expr_expecting(value, Some(&field_ty));
                        self.check_assignable(&field_ty, &value.ty, value.span);
                        let class = self.current_class.clone().unwrap_or_default();
                        StmtKind::PropertyAssignment {
                            object: Expr::new(ExprKind::This, Type::class(class), target.span),
                            property: name.clone(),
                            value,
                        }
                    }
                    Some((_, var_ty)) => {
                        let value = self.visit_expr_expecting(value, Some(&var_ty));
                        self.check_assignable(&var_ty, &value.ty, value.span);
                        StmtKind::Assignment {
                            target: Expr::new(
                                ExprKind::VariableRef(name.clone()),
                                var_ty,
                                target.span,
                            ),
                            value,
                        }
                    }
                }
            }
            cst::ExprKind::Index { .. } => {
                let target = self.visit_expr(target);
                let elem_ty = target.ty.clone();
                let value = self.visit_expr_expecting(value, Some(&elem_ty));
                self.check_assignable(&elem_ty, &value.ty, value.span);
                StmtKind::Assignment { target, value }
            }
            cst::ExprKind::Prop { object, name } => {
                let object = self.visit_expr(object);
                let field_ty = match &object.ty {
                    Type::Class(class) => {
                        match lookup_member(&self.classes, class, name) {
                            Some(Member::Field(ty)) => ty,
                            Some(Member::Method(_)) => {
                                self.error(
                                    SemanticDiag::InvalidAssignTarget(name.clone()),
                                    target.span,
                                );
                                Type::Any
                            }
                            None => {
                                self.error(
                                    SemanticDiag::MemberNotFound {
                                        class: class.clone(),
                                        member: name.clone(),
                                    },
                                    target.span,
                                );
                                Type::Any
                            }
                        }
                    }
                    Type::Any => Type::Any,
                    other => {
                        self.error(
                            SemanticDiag::PropertyOnPrimitive(other.to_string()),
                            object.span,
                        );
                        Type::Any
                    }
                };
                let value = self.visit_expr_expecting(value, Some(&field_ty));
                self.check_assignable(&field_ty, &value.ty, value.span);
                StmtKind::PropertyAssignment {
                    object,
                    property: name.clone(),
                    value,
                }
            }
            _ => {
                self.error(
                    SemanticDiag::InvalidAssignTarget("expression".into()),
                    target.span,
                );
                let value = self.visit_expr(value);
                StmtKind::ExprStmt(value)
            }
        }
    }

    fn visit_return(&mut self, value: Option<&cst::Expr>, span: Span) -> StmtKind {
        let expected = match self.return_stack.last().cloned() {
            Some(t) => t,
            None => {
                self.error(SemanticDiag::ReturnOutsideFunction, span);
                let value = value.map(|v| self.visit_expr(v));
                return StmtKind::Return(value);
            }
        };
        match value {
            None => {
                if expected != Type::Void {
                    self.error(
                        SemanticDiag::TypeMismatch {
                            expected: expected.to_string(),
                            found: "void".into(),
                        },
                        span,
                    );
                }
                StmtKind::Return(None)
            }
            Some(v) => {
                let expr = self.visit_expr_expecting(v, Some(&expected));
                if expected == Type::Void {
                    self.error(
                        SemanticDiag::TypeMismatch {
                            expected: "void".into(),
                            found: expr.ty.to_string(),
                        },
                        expr.span,
                    );
                } else {
                    self.check_assignable(&expected, &expr.ty, expr.span);
                }
                StmtKind::Return(Some(expr))
            }
        }
    }

    fn visit_function_decl(&mut self, func: &cst::FuncDecl) -> StmtKind {
        let sig = self.resolve_method_sig(func);
        let params: Vec<(String, Type)> = func
            .params
            .iter()
            .zip(sig.params.iter())
            .map(|(p, t)| (p.name.clone(), t.clone()))
            .collect();

        // register the signature before the body so recursion resolves
        let sym = Symbol::callable(
            &func.name,
            SymbolKind::Function,
            sig.params.clone(),
            sig.ret.clone(),
            func.name_span,
        );
        if self.scopes.define(sym).is_err() {
            self.report_duplicate(&func.name, func.name_span);
        }

        self.scopes.enter(ScopeKind::Function, func.name.clone());
        for (param, ty) in func.params.iter().zip(sig.params.iter()) {
            let sym = Symbol::new(&param.name, SymbolKind::Parameter, ty.clone(), param.span);
            if self.scopes.define(sym).is_err() {
                self.report_duplicate(&param.name, param.span);
            }
        }
        self.return_stack.push(sig.ret.clone());
        let body = self.visit_block(&func.body, ScopeKind::Block, "block");
        self.return_stack.pop();
        self.scopes.leave();

        StmtKind::FunctionDecl(Function {
            name: func.name.clone(),
            params,
            ret: sig.ret,
            body,
        })
    }

    // ── Class pass 3: bodies ─────────────────────────────────────────

    fn visit_class_decl(&mut self, stmt: &cst::Stmt) -> StmtKind {
        let (name, name_span, superclass, members) = match &stmt.kind {
            cst::StmtKind::ClassDecl {
                name,
                name_span,
                superclass,
                members,
            } => (name.clone(), *name_span, superclass.clone(), members),
            _ => unreachable!("visit_class_decl on non-class"),
        };

        // classes not seen by the top-level pre-pass (nested declarations)
        // register and populate here, sequentially
        if !self.processed_classes.contains(&name) {
            self.register_class_name(&name, name_span);
            self.populate_class(stmt);
        }

        self.scopes.enter(ScopeKind::Class, name.clone());
        self.bind_class_members(&name);

        let old_class = self.current_class.replace(name.clone());
        let mut out_members = Vec::new();
        for member in members {
            match &member.kind {
                cst::StmtKind::VarDecl { .. } => {
                    out_members.push(self.visit_field_decl(member, &name));
                }
                cst::StmtKind::FuncDecl(func) => {
                    out_members.push(Stmt {
                        kind: self.visit_method_decl(func, &name),
                        span: member.span,
                    });
                }
                _ => {}
            }
        }
        self.current_class = old_class;
        self.scopes.leave();

        StmtKind::ClassDecl(Class {
            name,
            superclass: superclass.map(|(s, _)| s),
            members: out_members,
        })
    }

    /// Pre-bind every declared and inherited field and method into the
    /// class scope so method bodies resolve them without `this.`.
    fn bind_class_members(&mut self, class: &str) {
        let mut seen = HashSet::new();
        let mut current = Some(class.to_string());
        let mut steps = 0;
        while let Some(cls) = current {
            let meta = match self.classes.get(&cls) {
                Some(m) => m.clone(),
                None => break,
            };
            for (field_name, field_ty) in &meta.fields {
                if seen.insert(field_name.clone()) {
                    let sym = Symbol::new(
                        field_name,
                        SymbolKind::Field,
                        field_ty.clone(),
                        Span::default(),
                    );
                    let _ = self.scopes.define(sym);
                }
            }
            for (method_name, sig) in &meta.methods {
                if seen.insert(method_name.clone()) {
                    let sym = Symbol::callable(
                        method_name,
                        SymbolKind::Method,
                        sig.params.clone(),
                        sig.ret.clone(),
                        Span::default(),
                    );
                    let _ = self.scopes.define(sym);
                }
            }
            steps += 1;
            if steps > self.classes.len() {
                break;
            }
            current = meta.superclass;
        }
    }

    fn visit_field_decl(&mut self, member: &cst::Stmt, class: &str) -> Stmt {
        let (name, init, is_const) = match &member.kind {
            cst::StmtKind::VarDecl {
                name, init, is_const, ..
            } => (name.clone(), init, *is_const),
            _ => unreachable!("field declaration expected"),
        };
        if is_const && init.is_none() {
            self.error(SemanticDiag::ConstWithoutInit(name.clone()), member.span);
        }
        let field_ty = self
            .classes
            .get(class)
            .and_then(|m| m.field(&name).cloned())
            .unwrap_or(Type::Any);
        let init_expr = init.as_ref().map(|e| {
            let expr = self.visit_expr_expecting(e, Some(&field_ty));
            self.check_assignable(&field_ty, &expr.ty, expr.span);
            expr
        });
        let kind = if is_const {
            let init = init_expr.unwrap_or_else(|| {
                Expr::new(ExprKind::Literal(Lit::Null), Type::Null, member.span)
            });
            StmtKind::ConstDecl {
                name,
                ty: field_ty,
                init,
            }
        } else {
            StmtKind::VariableDecl {
                name,
                ty: field_ty,
                init: init_expr,
            }
        };
        Stmt {
            kind,
            span: member.span,
        }
    }

    fn visit_method_decl(&mut self, func: &cst::FuncDecl, class: &str) -> StmtKind {
        let sig = self
            .classes
            .get(class)
            .and_then(|m| m.method(&func.name).cloned())
            .unwrap_or_else(|| MethodSig {
                params: vec![Type::Any; func.params.len()],
                ret: Type::Void,
            });
        let params: Vec<(String, Type)> = func
            .params
            .iter()
            .zip(sig.params.iter())
            .map(|(p, t)| (p.name.clone(), t.clone()))
            .collect();

        self.scopes.enter(ScopeKind::Method, func.name.clone());
        let this_sym = Symbol::new("this", SymbolKind::Constant, Type::class(class), func.name_span);
        let _ = self.scopes.define(this_sym);
        for (param, ty) in func.params.iter().zip(sig.params.iter()) {
            let sym = Symbol::new(&param.name, SymbolKind::Parameter, ty.clone(), param.span);
            if self.scopes.define(sym).is_err() {
                self.report_duplicate(&param.name, param.span);
            }
        }
        self.return_stack.push(sig.ret.clone());
        let body = self.visit_block(&func.body, ScopeKind::Block, "block");
        self.return_stack.pop();
        self.scopes.leave();

        StmtKind::FunctionDecl(Function {
            name: func.name.clone(),
            params,
            ret: sig.ret,
            body,
        })
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn visit_expr(&mut self, expr: &cst::Expr) -> Expr {
        self.visit_expr_expecting(expr, None)
    }

    /// `expected` is the type the context wants, used to resolve the
    /// element type of empty array literals.
    fn visit_expr_expecting(&mut self, expr: &cst::Expr, expected: Option<&Type>) -> Expr {
        let span = expr.span;
        match &expr.kind {
            cst::ExprKind::IntLit(v) => {
                Expr::new(ExprKind::Literal(Lit::Int(*v)), Type::Integer, span)
            }
            cst::ExprKind::FloatLit(v) => {
                Expr::new(ExprKind::Literal(Lit::Float(*v)), Type::Float, span)
            }
            cst::ExprKind::StringLit(v) => Expr::new(
                ExprKind::Literal(Lit::Str(v.clone())),
                Type::String,
                span,
            ),
            cst::ExprKind::BoolLit(v) => {
                Expr::new(ExprKind::Literal(Lit::Bool(*v)), Type::Boolean, span)
            }
            cst::ExprKind::NullLit => Expr::new(ExprKind::Literal(Lit::Null), Type::Null, span),
            cst::ExprKind::Var(name) => self.visit_var_ref(name, span),
            cst::ExprKind::This => match self.current_class.clone() {
                Some(class) => Expr::new(ExprKind::This, Type::class(class), span),
                None => {
                    self.error(SemanticDiag::ThisOutsideMethod, span);
                    Expr::new(ExprKind::This, Type::Any, span)
                }
            },
            cst::ExprKind::Binary { op, left, right } => self.visit_binary(*op, left, right, span),
            cst::ExprKind::Unary { op, operand } => self.visit_unary(*op, operand, span),
            cst::ExprKind::Ternary {
                cond,
                then_val,
                else_val,
            } => self.visit_ternary(cond, then_val, else_val, expected, span),
            cst::ExprKind::Call { callee, args } => self.visit_call(callee, args, span),
            cst::ExprKind::New {
                class,
                class_span,
                args,
            } => self.visit_new(class, *class_span, args, span),
            cst::ExprKind::Prop { object, name } => self.visit_prop(object, name, span),
            cst::ExprKind::Index { array, index } => self.visit_index(array, index, span),
            cst::ExprKind::ArrayLit(elements) => self.visit_array_lit(elements, expected, span),
        }
    }

    fn visit_var_ref(&mut self, name: &str, span: Span) -> Expr {
        let looked_up = self
            .scopes
            .lookup(name)
            .map(|(sym, _)| (sym.kind, sym.ty.clone()));
        match looked_up {
            None => {
                self.error(SemanticDiag::UndeclaredName(name.to_string()), span);
                Expr::new(ExprKind::VariableRef(name.to_string()), Type::Any, span)
            }
            Some((SymbolKind::Field, field_ty)) => {
                // bare field reference inside a method: normalize to
                // this.field so later stages see the receiver
                let class = self.current_class.clone().unwrap_or_default();
                let this = Expr::new(ExprKind::This, Type::class(class), span);
                Expr::new(
                    ExprKind::PropertyAccess {
                        object: Box::new(this),
                        property: name.to_string(),
                    },
                    field_ty,
                    span,
                )
            }
            Some((SymbolKind::Function, _))
            | Some((SymbolKind::Method, _))
            | Some((SymbolKind::Class, _)) => {
                // not a first-class value; only valid as a call target
                Expr::new(ExprKind::VariableRef(name.to_string()), Type::Any, span)
            }
            Some((_, ty)) => Expr::new(ExprKind::VariableRef(name.to_string()), ty, span),
        }
    }

    fn visit_binary(
        &mut self,
        op: BinOp,
        left: &cst::Expr,
        right: &cst::Expr,
        span: Span,
    ) -> Expr {
        let left = self.visit_expr(left);
        let right = self.visit_expr(right);

        let poisoned = left.ty == Type::Any || right.ty == Type::Any;
        let ty = if poisoned {
            if op.is_arithmetic() {
                Type::Any
            } else {
                Type::Boolean
            }
        } else if op == BinOp::Add && (left.ty == Type::String || right.ty == Type::String) {
            // concatenation; the non-string side is coerced
            Type::String
        } else if op == BinOp::Mod {
            if left.ty != Type::Integer || right.ty != Type::Integer {
                let found = if left.ty != Type::Integer {
                    left.ty.to_string()
                } else {
                    right.ty.to_string()
                };
                self.error(
                    SemanticDiag::TypeMismatch {
                        expected: "integer".into(),
                        found,
                    },
                    span,
                );
            }
            Type::Integer
        } else if op.is_arithmetic() {
            match promote_numeric(op.symbol(), &left.ty, &right.ty) {
                Ok(t) => t,
                Err(_) => {
                    let side = if !left.ty.is_numeric() { &left } else { &right };
                    self.error(
                        SemanticDiag::TypeMismatch {
                            expected: "integer or float".into(),
                            found: side.ty.to_string(),
                        },
                        side.span,
                    );
                    Type::Any
                }
            }
        } else if op.is_relational() {
            for side in [&left, &right] {
                if !side.ty.is_numeric() {
                    self.error(
                        SemanticDiag::TypeMismatch {
                            expected: "integer or float".into(),
                            found: side.ty.to_string(),
                        },
                        side.span,
                    );
                }
            }
            Type::Boolean
        } else if op.is_equality() {
            let comparable = assignable(&self.classes, &left.ty, &right.ty)
                || assignable(&self.classes, &right.ty, &left.ty);
            if !comparable {
                self.error(
                    SemanticDiag::TypeMismatch {
                        expected: left.ty.to_string(),
                        found: right.ty.to_string(),
                    },
                    span,
                );
            }
            Type::Boolean
        } else {
            // && and ||
            for side in [&left, &right] {
                if side.ty != Type::Boolean {
                    self.error(
                        SemanticDiag::TypeMismatch {
                            expected: "boolean".into(),
                            found: side.ty.to_string(),
                        },
                        side.span,
                    );
                }
            }
            Type::Boolean
        };

        Expr::new(
            ExprKind::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
            span,
        )
    }

    fn visit_unary(&mut self, op: UnOp, operand: &cst::Expr, span: Span) -> Expr {
        let operand = self.visit_expr(operand);
        let ty = match op {
            UnOp::Neg => {
                if operand.ty.is_numeric() || operand.ty == Type::Any {
                    operand.ty.clone()
                } else {
                    self.error(
                        SemanticDiag::TypeMismatch {
                            expected: "integer or float".into(),
                            found: operand.ty.to_string(),
                        },
                        operand.span,
                    );
                    Type::Any
                }
            }
            UnOp::Not => {
                if operand.ty != Type::Boolean && operand.ty != Type::Any {
                    self.error(
                        SemanticDiag::TypeMismatch {
                            expected: "boolean".into(),
                            found: operand.ty.to_string(),
                        },
                        operand.span,
                    );
                }
                Type::Boolean
            }
        };
        Expr::new(
            ExprKind::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            ty,
            span,
        )
    }

    fn visit_ternary(
        &mut self,
        cond: &cst::Expr,
        then_val: &cst::Expr,
        else_val: &cst::Expr,
        expected: Option<&Type>,
        span: Span,
    ) -> Expr {
        let cond = self.visit_condition(cond, "ternary");
        let then_val = self.visit_expr_expecting(then_val, expected);
        let else_val = self.visit_expr_expecting(else_val, expected);

        let ty = if then_val.ty == else_val.ty {
            then_val.ty.clone()
        } else if then_val.ty.is_numeric() && else_val.ty.is_numeric() {
            Type::Float
        } else if then_val.ty == Type::Any || else_val.ty == Type::Any {
            Type::Any
        } else if assignable(&self.classes, &then_val.ty, &else_val.ty) {
            then_val.ty.clone()
        } else if assignable(&self.classes, &else_val.ty, &then_val.ty) {
            else_val.ty.clone()
        } else {
            self.error(
                SemanticDiag::TypeMismatch {
                    expected: then_val.ty.to_string(),
                    found: else_val.ty.to_string(),
                },
                span,
            );
            Type::Any
        };

        Expr::new(
            ExprKind::Ternary {
                cond: Box::new(cond),
                then_val: Box::new(then_val),
                else_val: Box::new(else_val),
            },
            ty,
            span,
        )
    }

    fn visit_call(&mut self, callee: &cst::Expr, args: &[cst::Expr], span: Span) -> Expr {
        match &callee.kind {
            cst::ExprKind::Var(name) => {
                let looked_up = self
                    .scopes
                    .lookup(name)
                    .map(|(sym, _)| (sym.kind, sym.params.clone(), sym.ret.clone()));
                match looked_up {
                    None => {
                        self.error(SemanticDiag::UndeclaredName(name.clone()), callee.span);
                        let args = args.iter().map(|a| self.visit_expr(a)).collect();
                        self.make_call_expr(name, callee.span, args, Type::Any, span)
                    }
                    Some((SymbolKind::Function, params, ret)) => {
                        let args = self.visit_call_args(name, &params, args, span);
                        let ret = ret.unwrap_or(Type::Void);
                        self.make_call_expr(name, callee.span, args, ret, span)
                    }
                    Some((SymbolKind::Method, params, ret)) => {
                        // bare method call inside a class body: this.m(...)
                        let args = self.visit_call_args(name, &params, args, span);
                        let ret = ret.unwrap_or(Type::Void);
                        let class = self.current_class.clone().unwrap_or_default();
                        let this = Expr::new(ExprKind::This, Type::class(class), callee.span);
                        let callee_expr = Expr::new(
                            ExprKind::PropertyAccess {
                                object: Box::new(this),
                                property: name.clone(),
                            },
                            Type::Any,
                            callee.span,
                        );
                        Expr::new(
                            ExprKind::Call {
                                callee: Box::new(callee_expr),
                                args,
                            },
                            ret,
                            span,
                        )
                    }
                    Some(_) => {
                        self.error(SemanticDiag::NonCallable(name.clone()), callee.span);
                        let args = args.iter().map(|a| self.visit_expr(a)).collect();
                        self.make_call_expr(name, callee.span, args, Type::Any, span)
                    }
                }
            }
            cst::ExprKind::Prop { object, name } => {
                let object = self.visit_expr(object);
                let (ret, params) = match &object.ty {
                    Type::Class(class) => match lookup_member(&self.classes, class, name) {
                        Some(Member::Method(sig)) => (sig.ret.clone(), Some(sig.params)),
                        Some(Member::Field(_)) => {
                            self.error(SemanticDiag::NonCallable(name.clone()), callee.span);
                            (Type::Any, None)
                        }
                        None => {
                            self.error(
                                SemanticDiag::MemberNotFound {
                                    class: class.clone(),
                                    member: name.clone(),
                                },
                                callee.span,
                            );
                            (Type::Any, None)
                        }
                    },
                    Type::Any => (Type::Any, None),
                    other => {
                        self.error(
                            SemanticDiag::PropertyOnPrimitive(other.to_string()),
                            object.span,
                        );
                        (Type::Any, None)
                    }
                };
                let args = match params {
                    Some(params) => self.visit_call_args(name, &params, args, span),
                    None => args.iter().map(|a| self.visit_expr(a)).collect(),
                };
                let callee_expr = Expr::new(
                    ExprKind::PropertyAccess {
                        object: Box::new(object),
                        property: name.clone(),
                    },
                    Type::Any,
                    callee.span,
                );
                Expr::new(
                    ExprKind::Call {
                        callee: Box::new(callee_expr),
                        args,
                    },
                    ret,
                    span,
                )
            }
            _ => {
                self.error(SemanticDiag::NonCallable("expression".into()), callee.span);
                let callee_expr = self.visit_expr(callee);
                let args = args.iter().map(|a| self.visit_expr(a)).collect();
                Expr::new(
                    ExprKind::Call {
                        callee: Box::new(callee_expr),
                        args,
                    },
                    Type::Any,
                    span,
                )
            }
        }
    }

    fn visit_call_args(
        &mut self,
        callee: &str,
        params: &[Type],
        args: &[cst::Expr],
        span: Span,
    ) -> Vec<Expr> {
        if args.len() != params.len() {
            self.error(
                SemanticDiag::ArityMismatch {
                    callee: callee.to_string(),
                    expected: params.len(),
                    found: args.len(),
                },
                span,
            );
            return args.iter().map(|a| self.visit_expr(a)).collect();
        }
        args.iter()
            .zip(params.iter())
            .map(|(arg, param)| {
                let expr = self.visit_expr_expecting(arg, Some(param));
                self.check_argument(param, &expr);
                expr
            })
            .collect()
    }

    fn make_call_expr(
        &mut self,
        name: &str,
        callee_span: Span,
        args: Vec<Expr>,
        ret: Type,
        span: Span,
    ) -> Expr {
        let callee = Expr::new(ExprKind::VariableRef(name.to_string()), Type::Any, callee_span);
        Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            ret,
            span,
        )
    }

    fn visit_new(
        &mut self,
        class: &str,
        class_span: Span,
        args: &[cst::Expr],
        span: Span,
    ) -> Expr {
        if !self.classes.contains_key(class) {
            self.error(SemanticDiag::UndeclaredName(class.to_string()), class_span);
            let args = args.iter().map(|a| self.visit_expr(a)).collect();
            return Expr::new(
                ExprKind::NewExpr {
                    class: class.to_string(),
                    args,
                },
                Type::Any,
                span,
            );
        }

        let ctor = match lookup_member(&self.classes, class, "constructor") {
            Some(Member::Method(sig)) => Some(sig),
            _ => None,
        };
        let args = match ctor {
            Some(sig) => self.visit_call_args(class, &sig.params, args, span),
            None => {
                if !args.is_empty() {
                    self.error(
                        SemanticDiag::ArityMismatch {
                            callee: class.to_string(),
                            expected: 0,
                            found: args.len(),
                        },
                        span,
                    );
                }
                args.iter().map(|a| self.visit_expr(a)).collect()
            }
        };
        Expr::new(
            ExprKind::NewExpr {
                class: class.to_string(),
                args,
            },
            Type::class(class),
            span,
        )
    }

    fn visit_prop(&mut self, object: &cst::Expr, name: &str, span: Span) -> Expr {
        let object = self.visit_expr(object);
        let ty = match &object.ty {
            Type::Class(class) => match lookup_member(&self.classes, class, name) {
                Some(Member::Field(ty)) => ty,
                Some(Member::Method(_)) => {
                    // method handle: only meaningful as a call target; the
                    // defining ancestor is resolved again at lowering time
                    debug_assert!(
                        defining_class_of_method(&self.classes, class, name).is_some()
                    );
                    Type::Any
                }
                None => {
                    self.error(
                        SemanticDiag::MemberNotFound {
                            class: class.clone(),
                            member: name.to_string(),
                        },
                        span,
                    );
                    Type::Any
                }
            },
            Type::Any => Type::Any,
            other => {
                self.error(
                    SemanticDiag::PropertyOnPrimitive(other.to_string()),
                    object.span,
                );
                Type::Any
            }
        };
        Expr::new(
            ExprKind::PropertyAccess {
                object: Box::new(object),
                property: name.to_string(),
            },
            ty,
            span,
        )
    }

    fn visit_index(&mut self, array: &cst::Expr, index: &cst::Expr, span: Span) -> Expr {
        let array = self.visit_expr(array);
        let index = self.visit_expr(index);
        if index.ty != Type::Integer && index.ty != Type::Any {
            self.error(
                SemanticDiag::TypeMismatch {
                    expected: "integer".into(),
                    found: index.ty.to_string(),
                },
                index.span,
            );
        }
        let ty = match array.ty.element_type() {
            Ok(t) => t,
            Err(_) => {
                if array.ty != Type::Any {
                    self.error(SemanticDiag::NonIndexable(array.ty.to_string()), array.span);
                }
                Type::Any
            }
        };
        Expr::new(
            ExprKind::IndexAccess {
                array: Box::new(array),
                index: Box::new(index),
            },
            ty,
            span,
        )
    }

    fn visit_array_lit(
        &mut self,
        elements: &[cst::Expr],
        expected: Option<&Type>,
        span: Span,
    ) -> Expr {
        let elem_expected = expected.and_then(|t| t.element_type().ok());
        let elements: Vec<Expr> = elements
            .iter()
            .map(|e| self.visit_expr_expecting(e, elem_expected.as_ref()))
            .collect();

        let ty = if elements.is_empty() {
            match expected {
                Some(t @ Type::Array { .. }) => t.clone(),
                _ => {
                    self.error(SemanticDiag::EmptyArrayLiteral, span);
                    Type::array(Type::Any, 1)
                }
            }
        } else {
            let elem_types: Vec<Type> = elements.iter().map(|e| e.ty.clone()).collect();
            if elem_types.iter().any(|t| *t == Type::Any) {
                Type::array(Type::Any, 1)
            } else {
                match unify_array_elements(&self.classes, &elem_types) {
                    Ok(elem) => Type::array(elem, 1),
                    Err(e) => {
                        let (a, b) = match e {
                            crate::types::TypeError::HeterogeneousArray(a, b) => (a, b),
                            other => (other.to_string(), String::new()),
                        };
                        self.error(SemanticDiag::HeterogeneousArray(a, b), span);
                        Type::array(Type::Any, 1)
                    }
                }
            }
        };
        Expr::new(ExprKind::ArrayLiteral(elements), ty, span)
    }
}

// ---------------------------------------------------------------------------
// Termination
// ---------------------------------------------------------------------------

/// Whether control cannot flow past this statement.
fn stmt_terminates(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) | StmtKind::Break | StmtKind::Continue => true,
        StmtKind::Block(block) => block.terminates,
        StmtKind::If {
            then_block,
            else_block: Some(else_block),
            ..
        } => then_block.terminates && else_block.terminates,
        StmtKind::TryCatch {
            try_block,
            catch_block,
            ..
        } => try_block.terminates && catch_block.terminates,
        _ => false,
    }
}
