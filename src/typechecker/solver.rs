//! The unification solver: a single pass over a flat constraint list,
//! substituting type variables destructively as they're resolved.

use crate::diagnostics::{Diagnostic, Reporter, Span};
use crate::nameanalysis::symbolic_ast::Type;

/// Either a concrete [`Type`] or a fresh type variable, identified by a
/// small integer. Kept as a tagged enum rather than an `Rc<RefCell<..>>`
/// slot: the solver consumes its constraint vector and is done, so type
/// variables never leak into the post-check AST and nothing downstream
/// ever inspects a `TypeOrVar`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeOrVar {
    Concrete(Type),
    Var(u32),
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub found: TypeOrVar,
    pub expected: TypeOrVar,
    pub span: Span,
}

fn substitute(constraints: &mut [Constraint], var: u32, replacement: &TypeOrVar) {
    for c in constraints.iter_mut() {
        if c.found == TypeOrVar::Var(var) {
            c.found = replacement.clone();
        }
        if c.expected == TypeOrVar::Var(var) {
            c.expected = replacement.clone();
        }
    }
}

/// Process constraints head-first: a variable on either side is eliminated
/// by substitution through the rest of the list; two identical concrete
/// types are discarded; anything else is a type error at that
/// constraint's position. Occurs-check is unnecessary since Amy's types
/// are first-order and non-recursive.
pub fn solve(mut constraints: Vec<Constraint>, reporter: &mut Reporter) {
    let mut i = 0;
    while i < constraints.len() {
        let current = constraints[i].clone();
        match (&current.found, &current.expected) {
            (TypeOrVar::Var(a), TypeOrVar::Var(b)) if a == b => {}
            (TypeOrVar::Var(a), other) => {
                let a = *a;
                substitute(&mut constraints[i + 1..], a, other);
            }
            (other, TypeOrVar::Var(b)) => {
                let b = *b;
                substitute(&mut constraints[i + 1..], b, other);
            }
            (TypeOrVar::Concrete(t1), TypeOrVar::Concrete(t2)) => {
                if t1 != t2 {
                    reporter.push(Diagnostic::error(
                        format!("expected {t2}, found {t1}"),
                        Some(current.span.clone()),
                    ));
                }
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Position;

    fn dummy_span() -> Span {
        Span::new(Position::new(1, 1), Position::new(1, 2), "t.amy")
    }

    #[test]
    fn identical_concrete_types_are_discarded_without_error() {
        let mut reporter = Reporter::new();
        solve(
            vec![Constraint {
                found: TypeOrVar::Concrete(Type::IntType),
                expected: TypeOrVar::Concrete(Type::IntType),
                span: dummy_span(),
            }],
            &mut reporter,
        );
        assert!(!reporter.has_errors());
    }

    #[test]
    fn mismatched_concrete_types_are_an_error() {
        let mut reporter = Reporter::new();
        solve(
            vec![Constraint {
                found: TypeOrVar::Concrete(Type::StringType),
                expected: TypeOrVar::Concrete(Type::IntType),
                span: dummy_span(),
            }],
            &mut reporter,
        );
        assert!(reporter.has_errors());
    }

    #[test]
    fn variable_is_substituted_through_remaining_constraints() {
        let mut reporter = Reporter::new();
        solve(
            vec![
                Constraint {
                    found: TypeOrVar::Var(0),
                    expected: TypeOrVar::Concrete(Type::BooleanType),
                    span: dummy_span(),
                },
                Constraint {
                    found: TypeOrVar::Var(0),
                    expected: TypeOrVar::Concrete(Type::BooleanType),
                    span: dummy_span(),
                },
            ],
            &mut reporter,
        );
        assert!(!reporter.has_errors());
    }

    #[test]
    fn variable_unified_with_conflicting_concretes_errors_on_second_use() {
        let mut reporter = Reporter::new();
        solve(
            vec![
                Constraint {
                    found: TypeOrVar::Var(0),
                    expected: TypeOrVar::Concrete(Type::IntType),
                    span: dummy_span(),
                },
                Constraint {
                    found: TypeOrVar::Var(0),
                    expected: TypeOrVar::Concrete(Type::StringType),
                    span: dummy_span(),
                },
            ],
            &mut reporter,
        );
        assert!(reporter.has_errors());
    }
}
