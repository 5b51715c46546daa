// CompilScript compiler driver.
//
// Orchestrates the frontend pipeline: tokenize → parse → semantic
// analysis → memory annotation → TAC generation + validation, and packs
// the results into a serializable Report for CLI and service hosts.

use serde::Serialize;
use serde_json::Value;

use crate::analyzer::SemanticAnalyzer;
use crate::annotator;
use crate::ast;
use crate::diagnostics::Diagnostic;
use crate::tac_codegen;
use crate::{lexer, parser};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options that control a single compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Include a Graphviz DOT serialization of the typed AST.
    pub return_ast_dot: bool,
    /// Run TAC generation when semantic analysis succeeded.
    pub generate_tac: bool,
    /// Run the memory annotator over the scope tree.
    pub annotate_memory: bool,
}

impl CompileOptions {
    /// Everything on: DOT, TAC, and memory annotation.
    pub fn full() -> Self {
        Self {
            return_ast_dot: true,
            generate_tac: true,
            annotate_memory: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TacReport {
    pub code: Vec<String>,
    pub instruction_count: usize,
    pub temporaries_used: u32,
    pub functions_registered: usize,
    pub validation_errors: Vec<String>,
}

/// The result of compiling one source string.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// True iff no error-severity diagnostic was produced.
    pub ok: bool,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ast_dot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tac: Option<TacReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Value>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Compile CompilScript source. Every stateful component (scope tree,
/// class registry, counters, diagnostic sink) is constructed fresh per
/// call, so two identical inputs produce byte-identical reports even
/// under concurrent hosting.
pub fn compile(source: &str, options: &CompileOptions) -> Report {
    let (tokens, mut diagnostics) = lexer::tokenize(source);
    let (parse_tree, parse_diagnostics) = parser::parse(&tokens);
    diagnostics.extend(parse_diagnostics);

    if diagnostics.iter().any(|d| d.is_error()) {
        return Report {
            ok: false,
            diagnostics,
            ast_dot: None,
            tac: None,
            scopes: None,
        };
    }

    let mut analysis = SemanticAnalyzer::new().analyze(&parse_tree);
    diagnostics.append(&mut analysis.diagnostics);
    let analysis_ok = !diagnostics.iter().any(|d| d.is_error());

    let ast_dot = if options.return_ast_dot && analysis_ok {
        Some(ast::to_dot(&analysis.program))
    } else {
        None
    };

    let mut scopes = None;
    let mut tac = None;
    if analysis_ok {
        if options.annotate_memory {
            annotator::annotate(&mut analysis.scopes, &analysis.classes);
        }
        scopes = Some(analysis.scopes.to_json());

        if options.generate_tac {
            let output = tac_codegen::generate(&analysis.program, &analysis.classes);
            for error in &output.validation_errors {
                diagnostics.push(Diagnostic::tac(error.clone()));
            }
            tac = Some(TacReport {
                code: output.listing(),
                instruction_count: output.instructions.len(),
                temporaries_used: output.temporaries_used,
                functions_registered: output.functions.len(),
                validation_errors: output.validation_errors,
            });
        }
    }

    let ok = !diagnostics.iter().any(|d| d.is_error());
    Report {
        ok,
        diagnostics,
        ast_dot,
        tac,
        scopes,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_run_analysis_only() {
        let report = compile("var x: integer = 1;", &CompileOptions::default());
        assert!(report.ok);
        assert!(report.tac.is_none());
        assert!(report.ast_dot.is_none());
        assert!(report.scopes.is_some());
    }

    #[test]
    fn syntax_errors_stop_before_analysis() {
        let report = compile("var x: = ;", &CompileOptions::full());
        assert!(!report.ok);
        assert!(report.tac.is_none());
        assert!(report.scopes.is_none());
        assert!(report.diagnostics.iter().any(|d| d.code == "Syntax"));
    }

    #[test]
    fn tac_listing_starts_with_header() {
        let report = compile("var x: integer = 1;", &CompileOptions::full());
        assert!(report.ok, "diagnostics: {:?}", report.diagnostics);
        let tac = report.tac.unwrap();
        assert_eq!(tac.code[0], "# TAC Code Generation");
        assert!(tac.validation_errors.is_empty());
        assert_eq!(tac.instruction_count, tac.code.len());
    }

    #[test]
    fn dot_output_present_when_requested() {
        let report = compile(
            "var x: integer = 1;",
            &CompileOptions {
                return_ast_dot: true,
                ..Default::default()
            },
        );
        let dot = report.ast_dot.unwrap();
        assert!(dot.starts_with("digraph AST {"));
        assert!(dot.contains("VariableDecl"));
    }

    #[test]
    fn report_serializes_for_service_hosts() {
        let report = compile("var x: integer = true;", &CompileOptions::default());
        assert!(!report.ok);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["diagnostics"][0]["kind"], "semantic");
        assert!(json["diagnostics"][0]["length"].is_number());
    }
}
