//! Name analysis: a three-pass algorithm rewriting the nominal AST into
//! the symbolic AST while building the frozen [`SymbolTable`].
//!
//! The local-name environment used in pass 3 is threaded functionally (a
//! plain `HashMap` cloned on every `Let`/`Match`-branch extension) rather
//! than the mutable push/pop frame stack `why_lib::typechecker::scope`
//! uses, so each extension is visible only to its own body/branch, with
//! sibling branches fully independent.

pub mod symbol_table;
pub mod symbolic_ast;

use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, Reporter, Span};
use crate::parser::ast as nominal;

use symbol_table::{ConstrSig, FunSig, SymbolTable};
use symbolic_ast::{Identifier, Type};

/// Issues globally-unique identifiers. Reset for every [`NameAnalyzer::new`]
/// call (i.e. once per compilation), never as a `static` counter, so that
/// repeated in-process compiles stay deterministic.
#[derive(Debug, Default)]
pub struct IdentifierFactory {
    next: u32,
}

impl IdentifierFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> Identifier {
        let id = Identifier(self.next);
        self.next += 1;
        id
    }
}

/// Name and signature of one of the six predeclared `Std` functions.
struct Builtin {
    name: &'static str,
    args: &'static [Type],
    ret: Type,
}

fn builtins() -> Vec<Builtin> {
    vec![
        Builtin {
            name: "printInt",
            args: &[Type::IntType],
            ret: Type::UnitType,
        },
        Builtin {
            name: "printString",
            args: &[Type::StringType],
            ret: Type::UnitType,
        },
        Builtin {
            name: "readInt",
            args: &[],
            ret: Type::IntType,
        },
        Builtin {
            name: "readString",
            args: &[],
            ret: Type::StringType,
        },
        Builtin {
            name: "intToString",
            args: &[Type::IntType],
            ret: Type::StringType,
        },
        Builtin {
            name: "digitToString",
            args: &[Type::IntType],
            ret: Type::StringType,
        },
    ]
}

type Env = HashMap<String, Identifier>;

pub struct NameAnalyzer {
    factory: IdentifierFactory,
    table: SymbolTable,
}

impl NameAnalyzer {
    pub fn new() -> Self {
        let mut factory = IdentifierFactory::new();
        let mut table = SymbolTable::new();

        let std_id = factory.fresh();
        table.register_module(std_id, "Std");
        for b in builtins() {
            let id = factory.fresh();
            table.register_function(
                id,
                std_id,
                b.name,
                FunSig {
                    arg_types: b.args.to_vec(),
                    ret: b.ret,
                    owner: std_id,
                },
            );
        }

        Self { factory, table }
    }

    pub fn analyze(
        mut self,
        program: &nominal::Program,
        reporter: &mut Reporter,
    ) -> Option<(symbolic_ast::Program, SymbolTable)> {
        // Pass 1: module registration.
        let mut module_ids = Vec::with_capacity(program.modules.len());
        for module in &program.modules {
            if self.table.module_by_name(&module.name).is_some() {
                reporter.push(Diagnostic::error(
                    format!("duplicate module name '{}'", module.name),
                    Some(module.span.clone()),
                ));
                continue;
            }
            let id = self.factory.fresh();
            self.table.register_module(id, &module.name);
            module_ids.push(id);
        }

        // Pass 2: type / constructor / function signatures, in source order.
        for (module, &module_id) in program.modules.iter().zip(&module_ids) {
            self.register_abstracts(module, module_id, reporter);
            self.register_cases_and_funs(module, module_id, reporter);
        }

        if reporter.has_errors() {
            return None;
        }

        // Pass 3: expression rewriting.
        let mut modules = Vec::with_capacity(program.modules.len());
        for (module, &module_id) in program.modules.iter().zip(&module_ids) {
            modules.push(self.rewrite_module(module, module_id, reporter));
        }

        if reporter.has_errors() {
            return None;
        }

        self.table.freeze();
        Some((symbolic_ast::Program { modules }, self.table))
    }

    fn register_abstracts(
        &mut self,
        module: &nominal::ModuleDef,
        module_id: Identifier,
        reporter: &mut Reporter,
    ) {
        for def in &module.defs {
            if let nominal::Def::Abstract(a) = def {
                if self.table.type_in_module(module_id, &a.name).is_some() {
                    reporter.push(Diagnostic::error(
                        format!("duplicate type name '{}' in module '{}'", a.name, module.name),
                        Some(a.span.clone()),
                    ));
                    continue;
                }
                let id = self.factory.fresh();
                self.table.register_abstract(id, module_id, &a.name);
            }
        }
    }

    fn register_cases_and_funs(
        &mut self,
        module: &nominal::ModuleDef,
        module_id: Identifier,
        reporter: &mut Reporter,
    ) {
        for def in &module.defs {
            match def {
                nominal::Def::Abstract(_) => {}
                nominal::Def::Case(c) => self.register_case_class(c, module, module_id, reporter),
                nominal::Def::Fun(f) => self.register_fun(f, module, module_id, reporter),
            }
        }
    }

    fn register_case_class(
        &mut self,
        c: &nominal::CaseClassDef,
        module: &nominal::ModuleDef,
        module_id: Identifier,
        reporter: &mut Reporter,
    ) {
        if self.table.type_in_module(module_id, &c.name).is_some() {
            reporter.push(Diagnostic::error(
                format!("duplicate type name '{}' in module '{}'", c.name, module.name),
                Some(c.span.clone()),
            ));
            return;
        }
        let Some(parent_id) = self.table.type_in_module(module_id, &c.parent) else {
            reporter.push(Diagnostic::error(
                format!(
                    "case class '{}' extends unresolved type '{}'",
                    c.name, c.parent
                ),
                Some(c.span.clone()),
            ));
            return;
        };
        if !self.table.is_abstract(parent_id) {
            reporter.push(Diagnostic::error(
                format!("'{}' extends '{}', which is not an abstract class", c.name, c.parent),
                Some(c.span.clone()),
            ));
            return;
        }

        let mut arg_types = Vec::with_capacity(c.fields.len());
        for field in &c.fields {
            arg_types.push(self.resolve_type_name(&field.type_name, module_id, &field.span, reporter));
        }

        let index = self.table.children_of.get(&parent_id).map_or(0, Vec::len);
        let id = self.factory.fresh();
        self.table.register_case_class(
            id,
            module_id,
            &c.name,
            ConstrSig {
                arg_types,
                parent: parent_id,
                index,
            },
        );
    }

    fn register_fun(
        &mut self,
        f: &nominal::FunDef,
        module: &nominal::ModuleDef,
        module_id: Identifier,
        reporter: &mut Reporter,
    ) {
        if self.table.function_in_module(module_id, &f.name).is_some() {
            reporter.push(Diagnostic::error(
                format!("duplicate function name '{}' in module '{}'", f.name, module.name),
                Some(f.span.clone()),
            ));
            return;
        }

        let mut seen_params = std::collections::HashSet::new();
        for param in &f.params {
            if !seen_params.insert(param.name.clone()) {
                reporter.push(Diagnostic::error(
                    format!(
                        "duplicate parameter name '{}' in function '{}'",
                        param.name, f.name
                    ),
                    Some(param.span.clone()),
                ));
            }
        }

        let arg_types = f
            .params
            .iter()
            .map(|p| self.resolve_type_name(&p.type_name, module_id, &p.span, reporter))
            .collect();
        let ret = self.resolve_type_name(&f.return_type, module_id, &f.span, reporter);

        let id = self.factory.fresh();
        self.table.register_function(
            id,
            module_id,
            &f.name,
            FunSig {
                arg_types,
                ret,
                owner: module_id,
            },
        );
    }

    fn resolve_type_name(
        &self,
        type_name: &nominal::TypeName,
        current_module: Identifier,
        span: &Span,
        reporter: &mut Reporter,
    ) -> Type {
        match type_name {
            nominal::TypeName::Int => Type::IntType,
            nominal::TypeName::Boolean => Type::BooleanType,
            nominal::TypeName::String => Type::StringType,
            nominal::TypeName::Unit => Type::UnitType,
            nominal::TypeName::Class(qname) => {
                let owner = match &qname.module {
                    Some(m) => match self.table.module_by_name(m) {
                        Some(id) => id,
                        None => {
                            reporter.push(Diagnostic::error(
                                format!("unresolved module '{m}'"),
                                Some(span.clone()),
                            ));
                            return Type::UnitType;
                        }
                    },
                    None => current_module,
                };
                match self.table.type_in_module(owner, &qname.name) {
                    Some(id) => Type::ClassType(id),
                    None => {
                        reporter.push(Diagnostic::error(
                            format!("unresolved type '{}'", qname.name),
                            Some(span.clone()),
                        ));
                        Type::UnitType
                    }
                }
            }
        }
    }

    fn rewrite_module(
        &mut self,
        module: &nominal::ModuleDef,
        module_id: Identifier,
        reporter: &mut Reporter,
    ) -> symbolic_ast::ModuleDef {
        let mut funcs = Vec::new();
        for def in &module.defs {
            if let nominal::Def::Fun(f) = def {
                funcs.push(self.rewrite_fun(f, module_id, reporter));
            }
        }
        let top_level_expr = module
            .top_level_expr
            .as_ref()
            .map(|e| self.rewrite_expr(e, &Env::new(), module_id, reporter));

        symbolic_ast::ModuleDef {
            id: module_id,
            funcs,
            top_level_expr,
            span: module.span.clone(),
        }
    }

    fn rewrite_fun(
        &mut self,
        f: &nominal::FunDef,
        module_id: Identifier,
        reporter: &mut Reporter,
    ) -> symbolic_ast::FunDef {
        let sig = self
            .table
            .function_in_module(module_id, &f.name)
            .and_then(|id| self.table.functions.get(&id).cloned())
            .unwrap_or(FunSig {
                arg_types: vec![],
                ret: Type::UnitType,
                owner: module_id,
            });

        let mut env = Env::new();
        let mut param_ids = Vec::with_capacity(f.params.len());
        for (param, ty) in f.params.iter().zip(sig.arg_types.into_iter()) {
            let id = self.factory.fresh();
            self.table.bind_local_type(id, ty);
            env.insert(param.name.clone(), id);
            param_ids.push(id);
        }

        let body = self.rewrite_expr(&f.body, &env, module_id, reporter);

        symbolic_ast::FunDef {
            id: self
                .table
                .function_in_module(module_id, &f.name)
                .unwrap_or(Identifier(u32::MAX)),
            params: param_ids,
            body,
            span: f.span.clone(),
        }
    }

    /// Resolve a bare name: a local binding first, else an unqualified call
    /// to a module-level function/constructor, else an unresolved-identifier
    /// error.
    fn resolve_bare_name(
        &mut self,
        name: &str,
        span: &Span,
        env: &Env,
        module_id: Identifier,
        reporter: &mut Reporter,
    ) -> symbolic_ast::Expr {
        if let Some(&id) = env.get(name) {
            return symbolic_ast::Expr::Variable(id, span.clone());
        }
        if let Some(id) = self.table.resolve_callable(module_id, name) {
            return symbolic_ast::Expr::Call(id, vec![], span.clone());
        }
        reporter.push(Diagnostic::error(
            format!("unresolved identifier '{name}'"),
            Some(span.clone()),
        ));
        symbolic_ast::Expr::Call(Identifier(u32::MAX), vec![], span.clone())
    }

    fn resolve_callable_qname(
        &mut self,
        qname: &nominal::QualifiedName,
        span: &Span,
        module_id: Identifier,
        reporter: &mut Reporter,
    ) -> Identifier {
        let owner = match &qname.module {
            Some(m) => match self.table.module_by_name(m) {
                Some(id) => id,
                None => {
                    reporter.push(Diagnostic::error(
                        format!("unresolved module '{m}'"),
                        Some(span.clone()),
                    ));
                    return Identifier(u32::MAX);
                }
            },
            None => module_id,
        };
        match self.table.resolve_callable(owner, &qname.name) {
            Some(id) => id,
            None => {
                reporter.push(Diagnostic::error(
                    format!("unresolved function or constructor '{}'", qname.name),
                    Some(span.clone()),
                ));
                Identifier(u32::MAX)
            }
        }
    }

    fn rewrite_expr(
        &mut self,
        expr: &nominal::Expr,
        env: &Env,
        module_id: Identifier,
        reporter: &mut Reporter,
    ) -> symbolic_ast::Expr {
        use nominal::Expr as N;
        use symbolic_ast::Expr as S;
        match expr {
            N::Variable(name, span) => self.resolve_bare_name(name, span, env, module_id, reporter),
            N::Literal(lit, span) => S::Literal(lit.clone(), span.clone()),
            N::Binary(op, l, r, span) => S::Binary(
                op.clone(),
                Box::new(self.rewrite_expr(l, env, module_id, reporter)),
                Box::new(self.rewrite_expr(r, env, module_id, reporter)),
                span.clone(),
            ),
            N::Unary(op, e, span) => S::Unary(
                op.clone(),
                Box::new(self.rewrite_expr(e, env, module_id, reporter)),
                span.clone(),
            ),
            N::Call(qname, args, span) => {
                let id = self.resolve_callable_qname(qname, span, module_id, reporter);
                let args = args
                    .iter()
                    .map(|a| self.rewrite_expr(a, env, module_id, reporter))
                    .collect();
                S::Call(id, args, span.clone())
            }
            N::Sequence(a, b, span) => S::Sequence(
                Box::new(self.rewrite_expr(a, env, module_id, reporter)),
                Box::new(self.rewrite_expr(b, env, module_id, reporter)),
                span.clone(),
            ),
            N::Let(param, value, body, span) => {
                let value_expr = self.rewrite_expr(value, env, module_id, reporter);
                let ty = self.resolve_type_name(&param.type_name, module_id, &param.span, reporter);
                let id = self.factory.fresh();
                self.table.bind_local_type(id, ty);
                let mut inner_env = env.clone();
                inner_env.insert(param.name.clone(), id);
                let body_expr = self.rewrite_expr(body, &inner_env, module_id, reporter);
                S::Let(id, Box::new(value_expr), Box::new(body_expr), span.clone())
            }
            N::Ite(c, t, e, span) => S::Ite(
                Box::new(self.rewrite_expr(c, env, module_id, reporter)),
                Box::new(self.rewrite_expr(t, env, module_id, reporter)),
                Box::new(self.rewrite_expr(e, env, module_id, reporter)),
                span.clone(),
            ),
            N::Match(scrutinee, cases, span) => {
                let scrutinee_expr = self.rewrite_expr(scrutinee, env, module_id, reporter);
                let cases = cases
                    .iter()
                    .map(|case| {
                        let mut bindings = Vec::new();
                        let pattern =
                            self.rewrite_pattern(&case.pattern, module_id, &mut bindings, reporter);
                        let mut case_env = env.clone();
                        for (name, id) in bindings {
                            case_env.insert(name, id);
                        }
                        let body = self.rewrite_expr(&case.body, &case_env, module_id, reporter);
                        symbolic_ast::MatchCase {
                            pattern,
                            body,
                            span: case.span.clone(),
                        }
                    })
                    .collect();
                S::Match(Box::new(scrutinee_expr), cases, span.clone())
            }
            N::Error(msg, span) => S::Error(
                Box::new(self.rewrite_expr(msg, env, module_id, reporter)),
                span.clone(),
            ),
        }
    }

    fn rewrite_pattern(
        &mut self,
        pattern: &nominal::Pattern,
        module_id: Identifier,
        bindings: &mut Vec<(String, Identifier)>,
        reporter: &mut Reporter,
    ) -> symbolic_ast::Pattern {
        use nominal::Pattern as N;
        use symbolic_ast::Pattern as S;
        match pattern {
            N::Wildcard(span) => S::Wildcard(span.clone()),
            N::Literal(lit, span) => S::Literal(lit.clone(), span.clone()),
            N::Id(name, span) => {
                if bindings.iter().any(|(n, _)| n == name) {
                    reporter.push(Diagnostic::error(
                        format!("duplicate binder '{name}' in pattern"),
                        Some(span.clone()),
                    ));
                }
                let id = self.factory.fresh();
                bindings.push((name.clone(), id));
                S::Id(id, span.clone())
            }
            N::CaseClass(qname, subpatterns, span) => {
                let owner = match &qname.module {
                    Some(m) => self.table.module_by_name(m).unwrap_or(module_id),
                    None => module_id,
                };
                let id = match self.table.constructor_in_module(owner, &qname.name) {
                    Some(id) => id,
                    None => {
                        reporter.push(Diagnostic::error(
                            format!("unresolved constructor '{}'", qname.name),
                            Some(span.clone()),
                        ));
                        Identifier(u32::MAX)
                    }
                };
                if let Some(sig) = self.table.constructors.get(&id) {
                    if sig.arg_types.len() != subpatterns.len() {
                        reporter.push(Diagnostic::error(
                            format!(
                                "constructor '{}' expects {} argument(s), pattern has {}",
                                qname.name,
                                sig.arg_types.len(),
                                subpatterns.len()
                            ),
                            Some(span.clone()),
                        ));
                    }
                }
                let subpatterns = subpatterns
                    .iter()
                    .map(|p| self.rewrite_pattern(p, module_id, bindings, reporter))
                    .collect();
                S::CaseClass(id, subpatterns, span.clone())
            }
        }
    }
}

impl Default for NameAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn analyze(src: &str) -> Option<(symbolic_ast::Program, SymbolTable)> {
        let tokens = Lexer::new(src, "test.amy").lex().unwrap();
        let program = Parser::new(tokens).unwrap().parse_program().unwrap();
        let mut reporter = Reporter::new();
        NameAnalyzer::new().analyze(&program, &mut reporter)
    }

    #[test]
    fn std_builtins_are_preregistered() {
        let analyzer = NameAnalyzer::new();
        let std_id = analyzer.table.module_by_name("Std").unwrap();
        assert!(analyzer.table.function_in_module(std_id, "printInt").is_some());
        assert!(analyzer.table.function_in_module(std_id, "readString").is_some());
    }

    #[test]
    fn resolves_call_to_own_function() {
        let (_, table) = analyze("object H { def f(x: Int): Int = { x + 1 } f(41) }").unwrap();
        let module = table.module_by_name("H").unwrap();
        assert!(table.function_in_module(module, "f").is_some());
    }

    #[test]
    fn duplicate_module_name_is_reported() {
        let result = analyze("object H { 1 } object H { 2 }");
        assert!(result.is_none());
    }

    #[test]
    fn constructor_sibling_index_matches_declaration_order() {
        let (_, table) = analyze(
            "object M { abstract class L; case class N() extends L; case class C(h: Int, t: L) extends L; 0 }",
        )
        .unwrap();
        let module = table.module_by_name("M").unwrap();
        let n = table.constructor_in_module(module, "N").unwrap();
        let c = table.constructor_in_module(module, "C").unwrap();
        assert_eq!(table.constructors[&n].index, 0);
        assert_eq!(table.constructors[&c].index, 1);
    }

    #[test]
    fn unresolved_identifier_is_reported() {
        let result = analyze("object H { unknownThing }");
        assert!(result.is_none());
    }

    #[test]
    fn duplicate_pattern_binder_is_reported() {
        let result = analyze(
            "object M { abstract class L; case class C(h: Int, t: Int) extends L; def f(c: L): Int = { c match { case C(x, x) => x } } 0 }",
        );
        assert!(result.is_none());
    }

    #[test]
    fn let_shadowing_is_scoped_to_body_only() {
        let (program, _) =
            analyze("object H { val x: Int = 1; x } ").unwrap();
        let module = &program.modules[0];
        assert!(matches!(module.top_level_expr, Some(symbolic_ast::Expr::Let(..))));
    }
}
