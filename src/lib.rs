//! `amyc`: a whole-program compiler for Amy, a small statically-typed
//! functional language, targeting WebAssembly text.
//!
//! Ties the pipeline stages together: [`lexer`] -> [`parser`] ->
//! [`nameanalysis`] -> [`typechecker`] -> [`codegen`], with
//! [`interpreter`] as the tree-walking evaluator backing the CLI's
//! `interpret` mode. Re-exports each pipeline stage as its own top-level
//! module, the way `why_lib`'s `lib.rs` does.

pub mod cli;
pub mod codegen;
pub mod diagnostics;
pub mod interpreter;
pub mod lexer;
pub mod nameanalysis;
pub mod parser;
pub mod typechecker;

use diagnostics::Reporter;
use nameanalysis::symbol_table::SymbolTable;
use nameanalysis::symbolic_ast;
use parser::ast;

/// Everything a successful run through name analysis and type checking
/// produces.
pub struct CompileOutput {
    pub symbolic: symbolic_ast::Program,
    pub table: SymbolTable,
}

/// Lexes and parses each `(file name, source text)` pair and concatenates
/// their modules into one nominal [`ast::Program`], compiling the given
/// source files together as a single program.
pub fn parse_sources(
    sources: &[(String, String)],
) -> Result<ast::Program, Box<dyn std::error::Error>> {
    let mut modules = Vec::new();
    for (file, text) in sources {
        let tokens = lexer::Lexer::new(text, file.clone()).lex()?;
        let program = parser::Parser::new(tokens)?.parse_program()?;
        modules.extend(program.modules);
    }
    Ok(ast::Program { modules })
}

/// Runs name analysis then type checking over an already-parsed program.
/// Returns `None` if either stage reported an error; diagnostics land on
/// `reporter` either way.
pub fn check_program(program: &ast::Program, reporter: &mut Reporter) -> Option<CompileOutput> {
    let (symbolic, table) = nameanalysis::NameAnalyzer::new().analyze(program, reporter)?;
    if !typechecker::TypeChecker::new().check(&symbolic, &table, reporter) {
        return None;
    }
    Some(CompileOutput { symbolic, table })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sources_concatenates_modules_from_multiple_files() {
        let sources = vec![
            ("a.amy".to_string(), "object A { 1 }".to_string()),
            ("b.amy".to_string(), "object B { 2 }".to_string()),
        ];
        let program = parse_sources(&sources).unwrap();
        assert_eq!(program.modules.len(), 2);
    }

    #[test]
    fn check_program_succeeds_on_well_typed_input() {
        let sources = vec![(
            "t.amy".to_string(),
            "object H { def f(x: Int): Int = { x + 1 } f(41) }".to_string(),
        )];
        let program = parse_sources(&sources).unwrap();
        let mut reporter = Reporter::new();
        assert!(check_program(&program, &mut reporter).is_some());
    }

    #[test]
    fn check_program_fails_on_type_mismatch() {
        let sources = vec![(
            "t.amy".to_string(),
            "object H { if (1) { 1 } else { 2 } }".to_string(),
        )];
        let program = parse_sources(&sources).unwrap();
        let mut reporter = Reporter::new();
        assert!(check_program(&program, &mut reporter).is_none());
        assert!(reporter.has_errors());
    }
}
