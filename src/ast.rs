use std::fmt::Write as _;

use crate::cst::{BinOp, UnOp};
use crate::token::Span;
use crate::types::Type;

// ---------------------------------------------------------------------------
// Typed AST
//
// Produced by the semantic analyzer. Every expression carries the semantic
// type it evaluates to; statements carry no type of their own.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    /// True when control cannot fall out of the bottom of this block
    /// (it ends in return/break/continue on every path).
    pub terminates: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<(String, Type)>,
    pub ret: Type,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub superclass: Option<String>,
    /// Field declarations followed by method declarations, in source order.
    pub members: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Block),
    VariableDecl {
        name: String,
        ty: Type,
        init: Option<Expr>,
    },
    ConstDecl {
        name: String,
        ty: Type,
        init: Expr,
    },
    Assignment {
        /// A `VariableRef` or `IndexAccess` location.
        target: Expr,
        value: Expr,
    },
    PropertyAssignment {
        object: Expr,
        property: String,
        value: Expr,
    },
    ExprStmt(Expr),
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        cond: Expr,
        body: Block,
    },
    DoWhile {
        body: Block,
        cond: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Box<Stmt>>,
        body: Block,
    },
    Foreach {
        var: String,
        elem_ty: Type,
        iterable: Expr,
        body: Block,
    },
    Switch {
        scrutinee: Expr,
        cases: Vec<(Expr, Block)>,
        default: Option<Block>,
    },
    Break,
    Continue,
    Return(Option<Expr>),
    TryCatch {
        try_block: Block,
        exc_name: String,
        catch_block: Block,
    },
    FunctionDecl(Function),
    ClassDecl(Class),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Lit),
    VariableRef(String),
    This,
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_val: Box<Expr>,
        else_val: Box<Expr>,
    },
    Call {
        /// `VariableRef` for plain calls, `PropertyAccess` for method calls.
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    NewExpr {
        class: String,
        args: Vec<Expr>,
    },
    PropertyAccess {
        object: Box<Expr>,
        property: String,
    },
    IndexAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    ArrayLiteral(Vec<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type, span: Span) -> Self {
        Self { kind, ty, span }
    }
}

// ---------------------------------------------------------------------------
// Graphviz DOT export
// ---------------------------------------------------------------------------

/// Serialize the AST as a Graphviz digraph for debugging and the IDE view.
pub fn to_dot(program: &Program) -> String {
    let mut exporter = DotExporter::default();
    exporter.lines.push("digraph AST {".into());
    exporter.lines.push("  node [shape=box];".into());
    let root = exporter.node("Program");
    for stmt in &program.statements {
        let child = exporter.stmt(stmt);
        exporter.edge(root, child);
    }
    exporter.lines.push("}".into());
    exporter.lines.join("\n")
}

#[derive(Default)]
struct DotExporter {
    lines: Vec<String>,
    next_id: usize,
}

impl DotExporter {
    fn node(&mut self, label: &str) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        let escaped = label.replace('\\', "\\\\").replace('"', "\\\"");
        self.lines.push(format!("  n{} [label=\"{}\"];", id, escaped));
        id
    }

    fn edge(&mut self, from: usize, to: usize) {
        self.lines.push(format!("  n{} -> n{};", from, to));
    }

    fn block(&mut self, block: &Block) -> usize {
        let id = self.node("Block");
        for stmt in &block.statements {
            let child = self.stmt(stmt);
            self.edge(id, child);
        }
        id
    }

    fn stmt(&mut self, stmt: &Stmt) -> usize {
        match &stmt.kind {
            StmtKind::Block(block) => self.block(block),
            StmtKind::VariableDecl { name, ty, init } => {
                let id = self.node(&format!("VariableDecl\\nname={}\\ntype={}", name, ty));
                if let Some(init) = init {
                    let child = self.expr(init);
                    self.edge(id, child);
                }
                id
            }
            StmtKind::ConstDecl { name, ty, init } => {
                let id = self.node(&format!("ConstDecl\\nname={}\\ntype={}", name, ty));
                let child = self.expr(init);
                self.edge(id, child);
                id
            }
            StmtKind::Assignment { target, value } => {
                let id = self.node("Assignment");
                let t = self.expr(target);
                let v = self.expr(value);
                self.edge(id, t);
                self.edge(id, v);
                id
            }
            StmtKind::PropertyAssignment {
                object,
                property,
                value,
            } => {
                let id = self.node(&format!("PropertyAssignment\\nproperty={}", property));
                let o = self.expr(object);
                let v = self.expr(value);
                self.edge(id, o);
                self.edge(id, v);
                id
            }
            StmtKind::ExprStmt(expr) => {
                let id = self.node("ExprStmt");
                let child = self.expr(expr);
                self.edge(id, child);
                id
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                let id = self.node("IfStmt");
                let c = self.expr(cond);
                self.edge(id, c);
                let t = self.block(then_block);
                self.edge(id, t);
                if let Some(e) = else_block {
                    let e = self.block(e);
                    self.edge(id, e);
                }
                id
            }
            StmtKind::While { cond, body } => {
                let id = self.node("WhileStmt");
                let c = self.expr(cond);
                let b = self.block(body);
                self.edge(id, c);
                self.edge(id, b);
                id
            }
            StmtKind::DoWhile { body, cond } => {
                let id = self.node("DoWhileStmt");
                let b = self.block(body);
                let c = self.expr(cond);
                self.edge(id, b);
                self.edge(id, c);
                id
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                let id = self.node("ForStmt");
                if let Some(init) = init {
                    let child = self.stmt(init);
                    self.edge(id, child);
                }
                if let Some(cond) = cond {
                    let child = self.expr(cond);
                    self.edge(id, child);
                }
                if let Some(step) = step {
                    let child = self.stmt(step);
                    self.edge(id, child);
                }
                let b = self.block(body);
                self.edge(id, b);
                id
            }
            StmtKind::Foreach {
                var,
                elem_ty,
                iterable,
                body,
            } => {
                let id = self.node(&format!("ForeachStmt\\nvar={}\\ntype={}", var, elem_ty));
                let it = self.expr(iterable);
                let b = self.block(body);
                self.edge(id, it);
                self.edge(id, b);
                id
            }
            StmtKind::Switch {
                scrutinee,
                cases,
                default,
            } => {
                let id = self.node("SwitchStmt");
                let s = self.expr(scrutinee);
                self.edge(id, s);
                for (value, body) in cases {
                    let case_id = self.node("SwitchCase");
                    let v = self.expr(value);
                    let b = self.block(body);
                    self.edge(case_id, v);
                    self.edge(case_id, b);
                    self.edge(id, case_id);
                }
                if let Some(default) = default {
                    let d = self.block(default);
                    self.edge(id, d);
                }
                id
            }
            StmtKind::Break => self.node("BreakStmt"),
            StmtKind::Continue => self.node("ContinueStmt"),
            StmtKind::Return(value) => {
                let id = self.node("ReturnStmt");
                if let Some(value) = value {
                    let v = self.expr(value);
                    self.edge(id, v);
                }
                id
            }
            StmtKind::TryCatch {
                try_block,
                exc_name,
                catch_block,
            } => {
                let id = self.node(&format!("TryCatchStmt\\nexc={}", exc_name));
                let t = self.block(try_block);
                let c = self.block(catch_block);
                self.edge(id, t);
                self.edge(id, c);
                id
            }
            StmtKind::FunctionDecl(func) => {
                let id = self.node(&format!("FunctionDecl\\nname={}\\nret={}", func.name, func.ret));
                let b = self.block(&func.body);
                self.edge(id, b);
                id
            }
            StmtKind::ClassDecl(class) => {
                let mut label = format!("ClassDecl\\nname={}", class.name);
                if let Some(sup) = &class.superclass {
                    let _ = write!(label, "\\nextends={}", sup);
                }
                let id = self.node(&label);
                for member in &class.members {
                    let m = self.stmt(member);
                    self.edge(id, m);
                }
                id
            }
        }
    }

    fn expr(&mut self, expr: &Expr) -> usize {
        match &expr.kind {
            ExprKind::Literal(lit) => {
                let text = match lit {
                    Lit::Int(v) => v.to_string(),
                    Lit::Float(v) => v.to_string(),
                    Lit::Str(v) => format!("{:?}", v),
                    Lit::Bool(v) => v.to_string(),
                    Lit::Null => "null".to_string(),
                };
                self.node(&format!("Literal\\nvalue={}\\ntype={}", text, expr.ty))
            }
            ExprKind::VariableRef(name) => {
                self.node(&format!("VariableRef\\nname={}\\ntype={}", name, expr.ty))
            }
            ExprKind::This => self.node(&format!("ThisExpr\\ntype={}", expr.ty)),
            ExprKind::BinaryOp { op, left, right } => {
                let id = self.node(&format!("BinaryOp\\nop={}\\ntype={}", op.symbol(), expr.ty));
                let l = self.expr(left);
                let r = self.expr(right);
                self.edge(id, l);
                self.edge(id, r);
                id
            }
            ExprKind::UnaryOp { op, operand } => {
                let id = self.node(&format!("UnaryOp\\nop={}\\ntype={}", op.symbol(), expr.ty));
                let o = self.expr(operand);
                self.edge(id, o);
                id
            }
            ExprKind::Ternary {
                cond,
                then_val,
                else_val,
            } => {
                let id = self.node(&format!("Ternary\\ntype={}", expr.ty));
                let c = self.expr(cond);
                let t = self.expr(then_val);
                let e = self.expr(else_val);
                self.edge(id, c);
                self.edge(id, t);
                self.edge(id, e);
                id
            }
            ExprKind::Call { callee, args } => {
                let id = self.node(&format!("Call\\ntype={}", expr.ty));
                let c = self.expr(callee);
                self.edge(id, c);
                for arg in args {
                    let a = self.expr(arg);
                    self.edge(id, a);
                }
                id
            }
            ExprKind::NewExpr { class, args } => {
                let id = self.node(&format!("NewExpr\\nclass={}", class));
                for arg in args {
                    let a = self.expr(arg);
                    self.edge(id, a);
                }
                id
            }
            ExprKind::PropertyAccess { object, property } => {
                let id = self.node(&format!(
                    "PropertyAccess\\nproperty={}\\ntype={}",
                    property, expr.ty
                ));
                let o = self.expr(object);
                self.edge(id, o);
                id
            }
            ExprKind::IndexAccess { array, index } => {
                let id = self.node(&format!("IndexAccess\\ntype={}", expr.ty));
                let a = self.expr(array);
                let i = self.expr(index);
                self.edge(id, a);
                self.edge(id, i);
                id
            }
            ExprKind::ArrayLiteral(elements) => {
                let id = self.node(&format!("ArrayLiteral\\ntype={}", expr.ty));
                for element in elements {
                    let e = self.expr(element);
                    self.edge(id, e);
                }
                id
            }
        }
    }
}
