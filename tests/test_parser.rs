/// Parser integration tests: CST shapes for the main constructs and
/// recovery behavior on malformed input.
use compilscript::cst::{BinOp, ExprKind, StmtKind};
use compilscript::lexer::tokenize;
use compilscript::parser::parse;

fn parse_ok(src: &str) -> compilscript::cst::Program {
    let (tokens, lex_diags) = tokenize(src);
    assert!(lex_diags.is_empty(), "lex errors: {:?}", lex_diags);
    let (program, parse_diags) = parse(&tokens);
    assert!(parse_diags.is_empty(), "parse errors: {:?}", parse_diags);
    program
}

#[test]
fn variable_and_const_declarations() {
    let program = parse_ok("var x: integer = 1; const y: float = 2.5; var z = true;");
    assert_eq!(program.statements.len(), 3);
    match &program.statements[0].kind {
        StmtKind::VarDecl {
            name, ty, is_const, ..
        } => {
            assert_eq!(name, "x");
            assert_eq!(ty.as_ref().unwrap().base, "integer");
            assert!(!is_const);
        }
        other => panic!("expected VarDecl, got {:?}", other),
    }
    match &program.statements[1].kind {
        StmtKind::VarDecl { is_const, .. } => assert!(is_const),
        other => panic!("expected const VarDecl, got {:?}", other),
    }
    match &program.statements[2].kind {
        StmtKind::VarDecl { ty, .. } => assert!(ty.is_none()),
        other => panic!("expected VarDecl, got {:?}", other),
    }
}

#[test]
fn array_type_annotations_count_dimensions() {
    let program = parse_ok("var m: integer[][] = null;");
    match &program.statements[0].kind {
        StmtKind::VarDecl { ty, .. } => {
            let ty = ty.as_ref().unwrap();
            assert_eq!(ty.base, "integer");
            assert_eq!(ty.dims, 2);
        }
        other => panic!("expected VarDecl, got {:?}", other),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let program = parse_ok("var x = 1 + 2 * 3;");
    match &program.statements[0].kind {
        StmtKind::VarDecl { init, .. } => match &init.as_ref().unwrap().kind {
            ExprKind::Binary { op, right, .. } => {
                assert_eq!(*op, BinOp::Add);
                assert!(matches!(
                    &right.kind,
                    ExprKind::Binary { op: BinOp::Mul, .. }
                ));
            }
            other => panic!("expected Binary, got {:?}", other),
        },
        other => panic!("expected VarDecl, got {:?}", other),
    }
}

#[test]
fn postfix_chain_call_index_member() {
    let program = parse_ok("rows[0].cells(1);");
    match &program.statements[0].kind {
        StmtKind::ExprStmt(expr) => match &expr.kind {
            ExprKind::Call { callee, args } => {
                assert_eq!(args.len(), 1);
                match &callee.kind {
                    ExprKind::Prop { object, name } => {
                        assert_eq!(name, "cells");
                        assert!(matches!(&object.kind, ExprKind::Index { .. }));
                    }
                    other => panic!("expected Prop callee, got {:?}", other),
                }
            }
            other => panic!("expected Call, got {:?}", other),
        },
        other => panic!("expected ExprStmt, got {:?}", other),
    }
}

#[test]
fn else_if_chains_nest() {
    let program = parse_ok(
        r#"
if (a) { x = 1; } else if (b) { x = 2; } else { x = 3; }
"#,
    );
    match &program.statements[0].kind {
        StmtKind::If { else_block, .. } => {
            let else_block = else_block.as_ref().unwrap();
            assert_eq!(else_block.len(), 1);
            assert!(matches!(&else_block[0].kind, StmtKind::If { .. }));
        }
        other => panic!("expected If, got {:?}", other),
    }
}

#[test]
fn for_header_variants() {
    parse_ok("for (var i: integer = 0; i < 10; i = i + 1) { }");
    parse_ok("for (; x < 3; ) { }");
    let program = parse_ok("for (;;) { }");
    match &program.statements[0].kind {
        StmtKind::For {
            init, cond, step, ..
        } => {
            assert!(init.is_none());
            assert!(cond.is_none());
            assert!(step.is_none());
        }
        other => panic!("expected For, got {:?}", other),
    }
}

#[test]
fn foreach_and_switch() {
    let program = parse_ok(
        r#"
foreach (item in list) { print(item); }
switch (x) {
  case 1: print("one");
  case 2: print("two"); break;
  default: print("other");
}
"#,
    );
    assert!(matches!(
        &program.statements[0].kind,
        StmtKind::Foreach { .. }
    ));
    match &program.statements[1].kind {
        StmtKind::Switch { cases, default, .. } => {
            assert_eq!(cases.len(), 2);
            assert_eq!(cases[1].body.len(), 2);
            assert!(default.is_some());
        }
        other => panic!("expected Switch, got {:?}", other),
    }
}

#[test]
fn class_with_superclass_and_members() {
    let program = parse_ok(
        r#"
class Dog : Animal {
  var breed: string;
  function speak(): string { return "woof"; }
}
"#,
    );
    match &program.statements[0].kind {
        StmtKind::ClassDecl {
            name,
            superclass,
            members,
            ..
        } => {
            assert_eq!(name, "Dog");
            assert_eq!(superclass.as_ref().unwrap().0, "Animal");
            assert_eq!(members.len(), 2);
        }
        other => panic!("expected ClassDecl, got {:?}", other),
    }
}

#[test]
fn new_ternary_and_array_literal() {
    let program = parse_ok("var p = flag ? new Point(1, 2) : [1, 2];");
    match &program.statements[0].kind {
        StmtKind::VarDecl { init, .. } => match &init.as_ref().unwrap().kind {
            ExprKind::Ternary {
                then_val, else_val, ..
            } => {
                assert!(matches!(&then_val.kind, ExprKind::New { .. }));
                assert!(matches!(&else_val.kind, ExprKind::ArrayLit(e) if e.len() == 2));
            }
            other => panic!("expected Ternary, got {:?}", other),
        },
        other => panic!("expected VarDecl, got {:?}", other),
    }
}

#[test]
fn try_catch_binds_exception_name() {
    let program = parse_ok("try { risky(); } catch (err) { print(err); }");
    match &program.statements[0].kind {
        StmtKind::TryCatch { exc_name, .. } => assert_eq!(exc_name, "err"),
        other => panic!("expected TryCatch, got {:?}", other),
    }
}

#[test]
fn recovery_continues_after_a_bad_statement() {
    let (tokens, _) = tokenize("var = 1; var ok: integer = 2;");
    let (program, diags) = parse(&tokens);
    assert!(!diags.is_empty(), "expected a syntax diagnostic");
    // the second declaration still parses
    assert!(program
        .statements
        .iter()
        .any(|s| matches!(&s.kind, StmtKind::VarDecl { name, .. } if name == "ok")));
}

#[test]
fn assignment_to_non_lvalue_is_rejected() {
    let (tokens, _) = tokenize("1 + 2 = 3;");
    let (_, diags) = parse(&tokens);
    assert!(diags
        .iter()
        .any(|d| d.message.contains("not assignable")));
}
