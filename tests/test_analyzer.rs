/// Integration tests for the semantic analyzer.
///
/// These exercise the full pipeline tokenize -> parse -> analyze on
/// CompilScript source strings and assert on the collected diagnostics.
use compilscript::analyzer::SemanticAnalyzer;
use compilscript::diagnostics::{Diagnostic, Severity};
use compilscript::lexer::tokenize;
use compilscript::parser::parse;

fn analyze_source(src: &str) -> Vec<Diagnostic> {
    let (tokens, lex_diags) = tokenize(src);
    assert!(lex_diags.is_empty(), "lex errors: {:?}", lex_diags);
    let (program, parse_diags) = parse(&tokens);
    assert!(parse_diags.is_empty(), "parse errors: {:?}", parse_diags);
    SemanticAnalyzer::new().analyze(&program).diagnostics
}

fn codes(diags: &[Diagnostic]) -> Vec<&'static str> {
    diags.iter().map(|d| d.code).collect()
}

fn assert_clean(src: &str) {
    let diags = analyze_source(src);
    assert!(diags.is_empty(), "expected no diagnostics, got: {:?}", diags);
}

fn assert_code(src: &str, code: &str) {
    let diags = analyze_source(src);
    assert!(
        diags.iter().any(|d| d.code == code),
        "expected {} in {:?}",
        code,
        codes(&diags)
    );
}

// ---------------------------------------------------------------------------
// Declarations & scoping
// ---------------------------------------------------------------------------

#[test]
fn valid_program_has_no_diagnostics() {
    assert_clean(
        r#"
var total: integer = 0;
const limit: integer = 10;
function add(a: integer, b: integer): integer { return a + b; }
for (var i: integer = 0; i < limit; i = i + 1) {
    total = add(total, i);
}
print(total);
"#,
    );
}

#[test]
fn undeclared_identifier_is_reported() {
    assert_code("print(missing);", "UndeclaredName");
}

#[test]
fn redeclaration_in_same_scope() {
    assert_code("var x: integer = 1; var x: float = 2.0;", "DuplicateName");
    // the clash applies across symbol kinds too
    assert_code(
        "var f: integer = 1; function f(): void { }",
        "DuplicateName",
    );
}

#[test]
fn inner_scope_shadows_without_conflict() {
    assert_clean(
        r#"
var x: integer = 1;
{
    var x: string = "shadow";
    print(x);
}
print(x);
"#,
    );
}

#[test]
fn declaration_needs_annotation_or_initializer() {
    assert_code("var x;", "MissingType");
    assert_clean("var x: integer;");
}

#[test]
fn null_initializer_cannot_drive_inference() {
    assert_code("var x = null;", "MissingType");
    assert_clean("class C { } var x: C = null;");
}

// ---------------------------------------------------------------------------
// Assignment & constants
// ---------------------------------------------------------------------------

#[test]
fn assignment_requires_compatible_types() {
    assert_code("var x: integer = 1; x = \"no\";", "TypeMismatch");
    assert_clean("var f: float = 1;"); // integer widens to float
    assert_code("var i: integer = 1.5;", "TypeMismatch"); // never the reverse
}

#[test]
fn const_rules() {
    assert_code("const k: integer;", "ConstWithoutInit");
    assert_code("class C { const k: integer; }", "ConstWithoutInit");
    assert_code("const k: integer = 1; k = 2;", "ConstReassigned");
}

#[test]
fn function_name_is_not_assignable() {
    assert_code(
        "function f(): void { } f = 1;",
        "InvalidAssignTarget",
    );
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[test]
fn arithmetic_promotes_and_rejects() {
    assert_clean("var x: float = 1 + 2.5;");
    assert_code("var x = true + 1;", "TypeMismatch");
    assert_code("var x = 1.0 % 2.0;", "TypeMismatch"); // % wants integers
    assert_clean("var x: integer = 7 % 3;");
}

#[test]
fn plus_concatenates_strings() {
    assert_clean(r#"var s: string = "n = " + 42;"#);
    assert_code(r#"var s: string = "a" - "b";"#, "TypeMismatch");
}

#[test]
fn comparisons_and_logic() {
    assert_clean("var b: boolean = 1 < 2.0;");
    assert_code(r#"var b = "a" < "b";"#, "TypeMismatch");
    assert_code("var b = 1 && true;", "TypeMismatch");
    assert_clean("var b: boolean = !(1 == 2) || false;");
    assert_code(r#"var b = 1 == "one";"#, "TypeMismatch");
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

#[test]
fn conditions_must_be_boolean() {
    assert_code("if (1) { }", "InvalidCondition");
    assert_code("while (0) { }", "InvalidCondition");
    assert_code("do { } while (1);", "InvalidCondition");
    assert_code("for (; 1; ) { }", "InvalidCondition");
    assert_code("var x = 1 ? 2 : 3;", "InvalidCondition");
    assert_clean("if (true) { } while (false) { }");
}

#[test]
fn jumps_need_an_enclosing_construct() {
    assert_code("function f(): void { break; }", "InvalidJump");
    assert_code("continue;", "InvalidJump");
    assert_code("return 1;", "InvalidJump");
    assert_clean("while (true) { break; }");
    assert_clean("while (true) { continue; }");
    // break is legal in a switch, continue is not
    assert_clean("var x: integer = 1; switch (x) { case 1: break; }");
    assert_code(
        "var x: integer = 1; switch (x) { case 1: continue; }",
        "InvalidJump",
    );
}

#[test]
fn return_type_discipline() {
    assert_code(
        "function f(): integer { return; }",
        "TypeMismatch",
    );
    assert_code("function f(): void { return 1; }", "TypeMismatch");
    assert_code(
        r#"function f(): integer { return "s"; }"#,
        "TypeMismatch",
    );
    assert_clean("function f(): float { return 1; }");
}

#[test]
fn dead_code_is_a_warning_not_an_error() {
    let diags = analyze_source(
        r#"
function f(): integer {
    return 1;
    print("never");
}
"#,
    );
    assert_eq!(codes(&diags), vec!["DeadCode"]);
    assert_eq!(diags[0].severity, Severity::Warning);
}

#[test]
fn switch_case_labels_must_match_scrutinee() {
    assert_code(
        r#"var x: integer = 1; switch (x) { case "one": print(x); }"#,
        "TypeMismatch",
    );
    assert_clean("var x: integer = 1; switch (x) { case 1: print(x); default: print(0); }");
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

#[test]
fn call_arity_and_argument_types() {
    assert_code(
        "function f(a: integer): void { } f(1, 2);",
        "ArityMismatch",
    );
    assert_code(
        r#"function f(a: integer): void { } f("x");"#,
        "TypeMismatch",
    );
    assert_clean("function f(a: float): void { } f(1);");
}

#[test]
fn only_functions_are_callable() {
    assert_code("var x: integer = 1; x();", "NonCallable");
}

#[test]
fn recursion_resolves() {
    assert_clean(
        r#"
function fact(n: integer): integer {
    if (n <= 1) { return 1; }
    return n * fact(n - 1);
}
print(fact(5));
"#,
    );
}

// ---------------------------------------------------------------------------
// Arrays
// ---------------------------------------------------------------------------

#[test]
fn index_access_rules() {
    assert_clean("var a: integer[] = [1, 2]; var x: integer = a[0];");
    assert_code("var x: integer = 1; var y = x[0];", "NonIndexable");
    assert_code(
        "var a: integer[] = [1]; var x = a[true];",
        "TypeMismatch",
    );
}

#[test]
fn index_access_lowers_rank() {
    assert_clean(
        r#"
var m: integer[][] = [[1, 2], [3, 4]];
var row: integer[] = m[0];
var cell: integer = m[1][0];
"#,
    );
}

#[test]
fn array_literal_unification() {
    assert_clean("var a: float[] = [1, 2.5, 3];");
    assert_code(r#"var m = [1, "hi", true];"#, "TypeMismatch");
}

#[test]
fn empty_array_literal_needs_context() {
    assert_clean("var a: integer[] = [];");
    assert_code("var a = [];", "TypeMismatch");
}

#[test]
fn foreach_requires_an_array() {
    assert_clean(
        r#"
var xs: integer[] = [1, 2, 3];
foreach (x in xs) { var y: integer = x; }
"#,
    );
    assert_code("var n: integer = 3; foreach (x in n) { }", "NonIndexable");
}

#[test]
fn null_goes_into_reference_slots_only() {
    assert_clean("var a: integer[] = null;");
    assert_code("var i: integer = null;", "TypeMismatch");
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

const ANIMALS: &str = r#"
class Animal {
    var name: string;
    function constructor(n: string) { this.name = n; }
    function speak(): string { return this.name; }
}
class Dog : Animal {
    function speak(): string { return this.name + " barks"; }
}
"#;

#[test]
fn inheritance_and_override_accepted() {
    let src = format!(
        "{}\nvar d: Dog = new Dog(\"Rex\");\nprint(d.speak());",
        ANIMALS
    );
    assert_clean(&src);
}

#[test]
fn subclass_assignable_to_superclass() {
    let src = format!("{}\nvar a: Animal = new Dog(\"Rex\");", ANIMALS);
    assert_clean(&src);
    let bad = format!("{}\nvar d: Dog = new Animal(\"generic\");", ANIMALS);
    assert_code(&bad, "TypeMismatch");
}

#[test]
fn member_lookup_walks_the_hierarchy() {
    let src = format!("{}\nvar d: Dog = new Dog(\"Rex\");\nprint(d.name);", ANIMALS);
    assert_clean(&src);
    let bad = format!("{}\nvar d: Dog = new Dog(\"Rex\");\nprint(d.age);", ANIMALS);
    assert_code(&bad, "MemberNotFound");
}

#[test]
fn member_access_on_primitive() {
    assert_code("var x: integer = 1; print(x.length);", "PropertyOnPrimitive");
}

#[test]
fn this_outside_a_method() {
    assert_code("var x = this;", "ThisOutsideMethod");
    assert_code("function f(): void { print(this); }", "ThisOutsideMethod");
}

#[test]
fn constructor_arity_checked() {
    let bad = format!("{}\nvar d: Dog = new Dog();", ANIMALS);
    assert_code(&bad, "ArityMismatch");
    // a class with no constructor anywhere takes no arguments
    assert_code("class Empty { } var e: Empty = new Empty(1);", "ArityMismatch");
    assert_clean("class Empty { } var e: Empty = new Empty();");
}

#[test]
fn new_of_unknown_class() {
    assert_code("var x = new Ghost();", "UndeclaredName");
}

#[test]
fn inheritance_cycle_detected() {
    let diags = analyze_source("class A : B { } class B : A { }");
    assert!(
        diags.iter().any(|d| d.code == "InheritanceCycle"),
        "expected InheritanceCycle in {:?}",
        codes(&diags)
    );
}

#[test]
fn incompatible_overrides() {
    assert_code(
        r#"
class Base { function f(a: integer): integer { return a; } }
class Sub : Base { function f(): integer { return 0; } }
"#,
        "OverrideIncompatible",
    );
    assert_code(
        r#"
class Base { function f(): integer { return 0; } }
class Sub : Base { function f(): string { return "x"; } }
"#,
        "OverrideIncompatible",
    );
}

#[test]
fn methods_see_fields_and_siblings_without_this() {
    assert_clean(
        r#"
class Counter {
    var count: integer;
    function bump(): void { count = count + 1; }
    function bump_twice(): void { bump(); bump(); }
}
"#,
    );
}

#[test]
fn field_assignment_type_checked() {
    let bad = format!(
        "{}\nvar d: Dog = new Dog(\"Rex\");\nd.name = 42;",
        ANIMALS
    );
    assert_code(&bad, "TypeMismatch");
}

#[test]
fn methods_are_not_assignable_fields() {
    let bad = format!(
        "{}\nvar d: Dog = new Dog(\"Rex\");\nd.speak = 1;",
        ANIMALS
    );
    assert_code(&bad, "InvalidAssignTarget");
}

#[test]
fn class_equality_with_null() {
    let src = format!(
        "{}\nvar d: Dog = new Dog(\"Rex\");\nvar gone: boolean = d == null;",
        ANIMALS
    );
    assert_clean(&src);
}

// ---------------------------------------------------------------------------
// Built-ins
// ---------------------------------------------------------------------------

#[test]
fn builtins_are_reserved_at_the_top_level() {
    assert_code("function print(m: string): void { }", "BuiltinClash");
    assert_code("var len: integer = 1;", "BuiltinClash");
}

#[test]
fn builtins_can_be_shadowed_in_inner_scopes() {
    assert_clean("function f(): void { var print: integer = 1; }");
}

#[test]
fn len_accepts_any_array() {
    assert_clean(
        r#"
var xs: string[] = ["a", "b"];
var n: integer = len(xs);
"#,
    );
    assert_code("var n: integer = len(42);", "TypeMismatch");
}

// ---------------------------------------------------------------------------
// Try/catch
// ---------------------------------------------------------------------------

#[test]
fn catch_binds_a_string_message() {
    assert_clean(
        r#"
var xs: integer[] = [1];
try {
    print(xs[4]);
} catch (e) {
    print("failed: " + e);
}
"#,
    );
}
