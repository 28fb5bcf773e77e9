//! Constraint-based type checking: generate a flat constraint list per
//! function body / module initializer, then solve it with a single-pass
//! destructive-substitution unifier.
//!
//! Grounded on `why_lib::typechecker::types::Type`'s shape (a small sum of
//! primitive + constructed variants) and the general two-phase
//! (register-then-check) structure of `why_lib::typechecker::TypeChecker`.
//! The solver itself, an explicit constraint list plus a standalone
//! `solve` pass, departs from `why_lib`, which checks bidirectionally
//! into `Rc<RefCell<Option<Type>>>` slots as it walks the tree; here a
//! batch unifier runs once per function body instead.

mod solver;

use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, Reporter, Span};
use crate::nameanalysis::symbol_table::SymbolTable;
use crate::nameanalysis::symbolic_ast::{Expr, Identifier, Literal, MatchCase, Pattern, Program, Type};
use crate::parser::ast::{BinOp, UnOp};

pub use solver::{solve, Constraint, TypeOrVar};

/// Issues fresh type variables. Reset per [`TypeChecker::new`] call,
/// mirroring [`crate::nameanalysis::IdentifierFactory`]'s reasoning for
/// not using a `static` counter.
#[derive(Debug, Default)]
pub struct TypeVarFactory {
    next: u32,
}

impl TypeVarFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> TypeOrVar {
        let id = self.next;
        self.next += 1;
        TypeOrVar::Var(id)
    }
}

type Env = HashMap<Identifier, TypeOrVar>;

pub struct TypeChecker {
    vars: TypeVarFactory,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            vars: TypeVarFactory::new(),
        }
    }

    /// Runs the solver once per function body and once per module
    /// initializer. Returns `true` iff no type errors were reported.
    pub fn check(&mut self, program: &Program, table: &SymbolTable, reporter: &mut Reporter) -> bool {
        for module in &program.modules {
            for fun in &module.funcs {
                self.check_fun(fun, table, reporter);
            }
            if let Some(expr) = &module.top_level_expr {
                let mut env = Env::new();
                let expected = self.vars.fresh();
                let mut constraints = Vec::new();
                self.gen_expr(expr, expected, &mut env, table, &mut constraints, reporter);
                solve(constraints, reporter);
            }
        }
        !reporter.has_errors()
    }

    fn check_fun(&mut self, fun: &crate::nameanalysis::symbolic_ast::FunDef, table: &SymbolTable, reporter: &mut Reporter) {
        let mut env = Env::new();
        for &id in &fun.params {
            if let Some(ty) = table.local_types.get(&id) {
                env.insert(id, TypeOrVar::Concrete(ty.clone()));
            }
        }
        // The function's own declared return type lives in `table.functions`,
        // keyed by its identifier (`fun.id`).
        let expected = table
            .functions
            .get(&fun.id)
            .map(|sig| TypeOrVar::Concrete(sig.ret.clone()))
            .unwrap_or_else(|| self.vars.fresh());

        let mut constraints = Vec::new();
        self.gen_expr(&fun.body, expected, &mut env, table, &mut constraints, reporter);
        solve(constraints, reporter);
    }

    fn literal_type(lit: &Literal) -> Type {
        match lit {
            Literal::Int(_) => Type::IntType,
            Literal::Bool(_) => Type::BooleanType,
            Literal::Str(_) => Type::StringType,
            Literal::Unit => Type::UnitType,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn gen_expr(
        &mut self,
        expr: &Expr,
        expected: TypeOrVar,
        env: &mut Env,
        table: &SymbolTable,
        constraints: &mut Vec<Constraint>,
        reporter: &mut Reporter,
    ) {
        match expr {
            Expr::Variable(id, span) => {
                let found = env
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| TypeOrVar::Concrete(Type::UnitType));
                constraints.push(Constraint {
                    found,
                    expected,
                    span: span.clone(),
                });
            }
            Expr::Literal(lit, span) => {
                constraints.push(Constraint {
                    found: TypeOrVar::Concrete(Self::literal_type(lit)),
                    expected,
                    span: span.clone(),
                });
            }
            Expr::Binary(op, lhs, rhs, span) => {
                self.gen_binary(op, lhs, rhs, expected, span, env, table, constraints, reporter)
            }
            Expr::Unary(op, inner, span) => {
                let (found, operand) = match op {
                    UnOp::Neg => (Type::IntType, TypeOrVar::Concrete(Type::IntType)),
                    UnOp::Not => (Type::BooleanType, TypeOrVar::Concrete(Type::BooleanType)),
                };
                constraints.push(Constraint {
                    found: TypeOrVar::Concrete(found),
                    expected,
                    span: span.clone(),
                });
                self.gen_expr(inner, operand, env, table, constraints, reporter);
            }
            Expr::Call(id, args, span) => {
                self.gen_call(*id, args, expected, span, env, table, constraints, reporter)
            }
            Expr::Sequence(a, b, _) => {
                let ignored = self.vars.fresh();
                self.gen_expr(a, ignored, env, table, constraints, reporter);
                self.gen_expr(b, expected, env, table, constraints, reporter);
            }
            Expr::Let(id, value, body, _) => {
                let declared = table
                    .local_types
                    .get(id)
                    .map(|ty| TypeOrVar::Concrete(ty.clone()))
                    .unwrap_or_else(|| self.vars.fresh());
                self.gen_expr(value, declared.clone(), env, table, constraints, reporter);
                env.insert(*id, declared);
                self.gen_expr(body, expected, env, table, constraints, reporter);
            }
            Expr::Ite(c, t, e, span) => {
                constraints.push(Constraint {
                    found: TypeOrVar::Concrete(Type::BooleanType),
                    expected: TypeOrVar::Concrete(Type::BooleanType),
                    span: span.clone(),
                });
                self.gen_expr(
                    c,
                    TypeOrVar::Concrete(Type::BooleanType),
                    env,
                    table,
                    constraints,
                    reporter,
                );
                self.gen_expr(t, expected.clone(), env, table, constraints, reporter);
                self.gen_expr(e, expected, env, table, constraints, reporter);
            }
            Expr::Match(scrutinee, cases, _) => {
                let sigma = self.vars.fresh();
                self.gen_expr(scrutinee, sigma.clone(), env, table, constraints, reporter);
                for case in cases {
                    self.gen_case(case, sigma.clone(), expected.clone(), env, table, constraints, reporter);
                }
            }
            Expr::Error(msg, _) => {
                self.gen_expr(
                    msg,
                    TypeOrVar::Concrete(Type::StringType),
                    env,
                    table,
                    constraints,
                    reporter,
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn gen_binary(
        &mut self,
        op: &BinOp,
        lhs: &Expr,
        rhs: &Expr,
        expected: TypeOrVar,
        span: &Span,
        env: &mut Env,
        table: &SymbolTable,
        constraints: &mut Vec<Constraint>,
        reporter: &mut Reporter,
    ) {
        let (found, lhs_expected, rhs_expected) = match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => (
                Type::IntType,
                TypeOrVar::Concrete(Type::IntType),
                TypeOrVar::Concrete(Type::IntType),
            ),
            BinOp::Lt | BinOp::Le => (
                Type::BooleanType,
                TypeOrVar::Concrete(Type::IntType),
                TypeOrVar::Concrete(Type::IntType),
            ),
            BinOp::And | BinOp::Or => (
                Type::BooleanType,
                TypeOrVar::Concrete(Type::BooleanType),
                TypeOrVar::Concrete(Type::BooleanType),
            ),
            BinOp::Eq => {
                let alpha = self.vars.fresh();
                constraints.push(Constraint {
                    found: TypeOrVar::Concrete(Type::BooleanType),
                    expected,
                    span: span.clone(),
                });
                self.gen_expr(lhs, alpha.clone(), env, table, constraints, reporter);
                self.gen_expr(rhs, alpha, env, table, constraints, reporter);
                return;
            }
            BinOp::Concat => (
                Type::StringType,
                TypeOrVar::Concrete(Type::StringType),
                TypeOrVar::Concrete(Type::StringType),
            ),
        };
        constraints.push(Constraint {
            found: TypeOrVar::Concrete(found),
            expected,
            span: span.clone(),
        });
        self.gen_expr(lhs, lhs_expected, env, table, constraints, reporter);
        self.gen_expr(rhs, rhs_expected, env, table, constraints, reporter);
    }

    #[allow(clippy::too_many_arguments)]
    fn gen_call(
        &mut self,
        id: Identifier,
        args: &[Expr],
        expected: TypeOrVar,
        span: &Span,
        env: &mut Env,
        table: &SymbolTable,
        constraints: &mut Vec<Constraint>,
        reporter: &mut Reporter,
    ) {
        let (arg_types, ret) = if let Some(sig) = table.functions.get(&id) {
            (sig.arg_types.clone(), sig.ret.clone())
        } else if let Some(sig) = table.constructors.get(&id) {
            (sig.arg_types.clone(), Type::ClassType(sig.parent))
        } else {
            reporter.push(Diagnostic::error(
                "call to an unresolved function or constructor".to_string(),
                Some(span.clone()),
            ));
            return;
        };

        if arg_types.len() != args.len() {
            reporter.push(Diagnostic::error(
                format!(
                    "expected {} argument(s), found {}",
                    arg_types.len(),
                    args.len()
                ),
                Some(span.clone()),
            ));
            return;
        }

        constraints.push(Constraint {
            found: TypeOrVar::Concrete(ret),
            expected,
            span: span.clone(),
        });
        for (arg, ty) in args.iter().zip(arg_types) {
            self.gen_expr(arg, TypeOrVar::Concrete(ty), env, table, constraints, reporter);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn gen_case(
        &mut self,
        case: &MatchCase,
        scrutinee: TypeOrVar,
        expected: TypeOrVar,
        env: &Env,
        table: &SymbolTable,
        constraints: &mut Vec<Constraint>,
        reporter: &mut Reporter,
    ) {
        let mut case_env = env.clone();
        self.gen_pattern(&case.pattern, scrutinee, &mut case_env, table, constraints, reporter);
        self.gen_expr(&case.body, expected, &mut case_env, table, constraints, reporter);
    }

    fn gen_pattern(
        &mut self,
        pattern: &Pattern,
        expected: TypeOrVar,
        env: &mut Env,
        table: &SymbolTable,
        constraints: &mut Vec<Constraint>,
        reporter: &mut Reporter,
    ) {
        match pattern {
            Pattern::Wildcard(_) => {}
            Pattern::Id(id, _) => {
                env.insert(*id, expected);
            }
            Pattern::Literal(lit, span) => {
                constraints.push(Constraint {
                    found: TypeOrVar::Concrete(Self::literal_type(lit)),
                    expected,
                    span: span.clone(),
                });
            }
            Pattern::CaseClass(id, subpatterns, span) => {
                let Some(sig) = table.constructors.get(id) else {
                    reporter.push(Diagnostic::error(
                        "pattern refers to an unresolved constructor".to_string(),
                        Some(span.clone()),
                    ));
                    return;
                };
                constraints.push(Constraint {
                    found: TypeOrVar::Concrete(Type::ClassType(sig.parent)),
                    expected,
                    span: span.clone(),
                });
                let arg_types = sig.arg_types.clone();
                for (sub, ty) in subpatterns.iter().zip(arg_types) {
                    self.gen_pattern(sub, TypeOrVar::Concrete(ty), env, table, constraints, reporter);
                }
            }
        }
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Reporter;
    use crate::lexer::Lexer;
    use crate::nameanalysis::NameAnalyzer;
    use crate::parser::Parser;

    fn check(src: &str) -> (bool, Reporter) {
        let tokens = Lexer::new(src, "test.amy").lex().unwrap();
        let program = Parser::new(tokens).unwrap().parse_program().unwrap();
        let mut reporter = Reporter::new();
        let (symbolic, table) = NameAnalyzer::new().analyze(&program, &mut reporter).unwrap();
        let ok = TypeChecker::new().check(&symbolic, &table, &mut reporter);
        (ok, reporter)
    }

    #[test]
    fn well_typed_function_passes() {
        let (_, reporter) = check("object H { def f(x: Int): Int = { x + 1 } f(41) }");
        assert!(!reporter.has_errors());
    }

    #[test]
    fn if_branch_type_mismatch_is_reported() {
        let (_, reporter) = check(r#"object H { if (true) { 1 } else { "x" } }"#);
        assert!(reporter.has_errors());
    }

    #[test]
    fn val_initializer_type_mismatch_is_reported() {
        let (_, reporter) = check(r#"object H { val x: Int = "oops"; x }"#);
        assert!(reporter.has_errors());
    }

    #[test]
    fn well_typed_val_binding_is_accepted() {
        let (_, reporter) = check("object H { val x: Int = 5; x }");
        assert!(!reporter.has_errors());
    }

    #[test]
    fn val_binder_type_is_visible_in_body() {
        let (_, reporter) = check("object H { val x: Int = 5; x + 1 }");
        assert!(!reporter.has_errors());
    }

    #[test]
    fn match_over_case_class_checks_field_types() {
        let (_, reporter) = check(
            "object M { abstract class L; case class N() extends L; case class C(h: Int, t: L) extends L; def len(l: L): Int = { l match { case N() => 0 case C(h, t) => h } } 0 }",
        );
        assert!(!reporter.has_errors());
    }

    #[test]
    fn string_concat_requires_string_operands() {
        let (_, reporter) = check(r#"object H { "a" ++ 1 }"#);
        assert!(reporter.has_errors());
    }
}
