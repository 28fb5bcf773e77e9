//! Lowers the typed symbolic AST to WebAssembly text.
//!
//! Grounded on the "accumulate then write out" shape of
//! `y-lang`'s legacy `compiler::Compiler` (a scope object gathering
//! per-function instruction streams, then a writer walking them out one
//! function at a time) generalized from x86-64 NASM lines to WAT
//! s-expression text, and targeting a stack-machine text form (flat,
//! unfolded instructions) rather than deeply nested folded expressions,
//! which is both valid WAT and far easier to emit correctly by hand.

use std::collections::HashMap;

use crate::nameanalysis::symbol_table::SymbolTable;
use crate::nameanalysis::symbolic_ast::{
    Expr, FunDef, Identifier, Literal, MatchCase, ModuleDef, Pattern, Program,
};
use crate::parser::ast::{BinOp, UnOp};

fn local_name(id: Identifier) -> String {
    format!("$id{}", id.index())
}

/// How to fetch the i32 value a pattern is being tested against: either a
/// named local (the match scrutinee) or a field load off another place.
/// Recomputing a `FieldOf` chain on every use is cheap and side-effect
/// free, so there is no need to cache loads in scratch locals.
#[derive(Debug, Clone)]
enum Place {
    Local(String),
    FieldOf(Box<Place>, usize),
}

fn emit_place(place: &Place) -> Vec<String> {
    match place {
        Place::Local(name) => vec![format!("local.get {name}")],
        Place::FieldOf(parent, index) => {
            let mut lines = emit_place(parent);
            lines.push(format!("i32.const {}", 4 * (index + 1)));
            lines.push("i32.add".to_string());
            lines.push("i32.load".to_string());
            lines
        }
    }
}

fn and_chain(tests: Vec<Vec<String>>) -> Vec<String> {
    let mut iter = tests.into_iter();
    let Some(mut acc) = iter.next() else {
        return vec!["i32.const 1".to_string()];
    };
    for next in iter {
        let mut combined = acc;
        combined.push("if (result i32)".to_string());
        combined.extend(next);
        combined.push("else".to_string());
        combined.push("i32.const 0".to_string());
        combined.push("end".to_string());
        acc = combined;
    }
    acc
}

fn literal_i32(lit: &Literal) -> i32 {
    match lit {
        Literal::Int(v) => *v,
        Literal::Bool(b) => *b as i32,
        Literal::Str(_) => panic!("string literals are never compared by literal_i32"),
        Literal::Unit => 0,
    }
}

/// Per-function emission state: the instruction buffer plus the set of
/// additional (non-parameter) locals that must be declared at the
/// function head.
struct FuncCtx {
    lines: Vec<String>,
    locals: Vec<String>,
    scratch_counter: u32,
}

impl FuncCtx {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            locals: Vec::new(),
            scratch_counter: 0,
        }
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn emit_many(&mut self, lines: Vec<String>) {
        self.lines.extend(lines);
    }

    fn declare_local(&mut self, name: String) {
        if !self.locals.contains(&name) {
            self.locals.push(name);
        }
    }

    /// A uniquely-named scratch local for one allocation site (string
    /// materialization or record construction). Using a fresh name per
    /// call site, rather than one shared name, keeps nested allocations
    /// (e.g. `C(1, C(2, N()))`) from clobbering an outer base pointer
    /// while an inner one is still being built.
    fn fresh_scratch(&mut self) -> String {
        let name = format!("$scratch{}", self.scratch_counter);
        self.scratch_counter += 1;
        self.declare_local(name.clone());
        name
    }
}

pub struct CodeGen<'a> {
    table: &'a SymbolTable,
    builtins: HashMap<Identifier, &'static str>,
}

impl<'a> CodeGen<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        let mut builtins = HashMap::new();
        if let Some(std_id) = table.module_by_name("Std") {
            let direct = [
                ("printInt", "$printInt"),
                ("printString", "$printString"),
                ("readInt", "$readInt"),
            ];
            for (amy_name, wat_name) in direct {
                if let Some(id) = table.function_in_module(std_id, amy_name) {
                    builtins.insert(id, wat_name);
                }
            }
            let runtime = [
                ("readString", "$Std_readString"),
                ("intToString", "$Std_intToString"),
                ("digitToString", "$Std_digitToString"),
            ];
            for (amy_name, wat_name) in runtime {
                if let Some(id) = table.function_in_module(std_id, amy_name) {
                    builtins.insert(id, wat_name);
                }
            }
        }
        Self { table, builtins }
    }

    pub fn generate(&self, program: &Program) -> String {
        let mut out = String::new();
        out.push_str("(module\n");
        out.push_str("  (import \"system\" \"mem\" (memory 100))\n");
        out.push_str("  (import \"system\" \"printInt\" (func $printInt (param i32) (result i32)))\n");
        out.push_str("  (import \"system\" \"printString\" (func $printString (param i32) (result i32)))\n");
        out.push_str("  (import \"system\" \"readInt\" (func $readInt (result i32)))\n");
        out.push_str("  (import \"system\" \"readString0\" (func $readString0 (param i32) (result i32)))\n");
        out.push_str("  (global $heap (mut i32) (i32.const 0))\n\n");
        out.push_str(RUNTIME_HELPERS);
        out.push('\n');

        for module in &program.modules {
            for fun in &module.funcs {
                out.push_str(&self.generate_fun(fun));
                out.push('\n');
            }
        }
        for module in &program.modules {
            if module.top_level_expr.is_some() {
                out.push_str(&self.generate_module_main(module));
                out.push('\n');
            }
        }

        out.push_str(")\n");
        out
    }

    fn generate_fun(&self, fun: &FunDef) -> String {
        let label = self.table.function_label(fun.id);
        let mut ctx = FuncCtx::new();
        self.gen_expr(&mut ctx, &fun.body);

        let params = fun
            .params
            .iter()
            .map(|id| format!("(param {} i32)", local_name(*id)))
            .collect::<Vec<_>>()
            .join(" ");

        render_func(&format!("${label}"), &params, &ctx, None)
    }

    fn generate_module_main(&self, module: &ModuleDef) -> String {
        let name = self.table.module_names.get(&module.id).cloned().unwrap_or_default();
        let label = format!("{name}_main");
        let mut ctx = FuncCtx::new();
        self.gen_expr(&mut ctx, module.top_level_expr.as_ref().unwrap());
        render_func(&format!("${label}"), "", &ctx, Some(&label))
    }

    fn gen_expr(&self, ctx: &mut FuncCtx, expr: &Expr) {
        match expr {
            Expr::Variable(id, _) => ctx.emit(format!("local.get {}", local_name(*id))),
            Expr::Literal(lit, _) => self.gen_literal(ctx, lit),
            Expr::Binary(op, lhs, rhs, _) => self.gen_binary(ctx, op, lhs, rhs),
            Expr::Unary(op, inner, _) => {
                match op {
                    UnOp::Neg => {
                        ctx.emit("i32.const 0");
                        self.gen_expr(ctx, inner);
                        ctx.emit("i32.sub");
                    }
                    UnOp::Not => {
                        self.gen_expr(ctx, inner);
                        ctx.emit("i32.const 1");
                        ctx.emit("i32.xor");
                    }
                }
            }
            Expr::Call(id, args, _) => self.gen_call(ctx, *id, args),
            Expr::Sequence(a, b, _) => {
                self.gen_expr(ctx, a);
                ctx.emit("drop");
                self.gen_expr(ctx, b);
            }
            Expr::Let(id, value, body, _) => {
                self.gen_expr(ctx, value);
                ctx.declare_local(local_name(*id));
                ctx.emit(format!("local.set {}", local_name(*id)));
                self.gen_expr(ctx, body);
            }
            Expr::Ite(c, t, e, _) => {
                self.gen_expr(ctx, c);
                ctx.emit("if (result i32)");
                self.gen_expr(ctx, t);
                ctx.emit("else");
                self.gen_expr(ctx, e);
                ctx.emit("end");
            }
            Expr::Match(scrutinee, cases, _) => self.gen_match(ctx, scrutinee, cases),
            Expr::Error(msg, _) => {
                self.gen_expr(ctx, msg);
                ctx.emit("call $printString");
                ctx.emit("drop");
                ctx.emit("unreachable");
            }
        }
    }

    fn gen_literal(&self, ctx: &mut FuncCtx, lit: &Literal) {
        match lit {
            Literal::Int(v) => ctx.emit(format!("i32.const {v}")),
            Literal::Bool(b) => ctx.emit(format!("i32.const {}", *b as i32)),
            Literal::Unit => ctx.emit("i32.const 0"),
            Literal::Str(s) => self.gen_string_literal(ctx, s),
        }
    }

    /// Materializes a NUL-terminated, 4-byte-padded ASCII string at the
    /// current heap pointer, advances the heap global past it, and leaves
    /// the string's base pointer on the stack.
    fn gen_string_literal(&self, ctx: &mut FuncCtx, s: &str) {
        let base = ctx.fresh_scratch();
        let bytes = s.as_bytes();
        let total = bytes.len() + 1;
        let padded = total.div_ceil(4) * 4;

        ctx.emit("global.get $heap");
        ctx.emit(format!("local.set {base}"));

        for (offset, byte) in bytes.iter().enumerate() {
            ctx.emit(format!("local.get {base}"));
            ctx.emit(format!("i32.const {offset}"));
            ctx.emit("i32.add");
            ctx.emit(format!("i32.const {byte}"));
            ctx.emit("i32.store8");
        }
        for offset in bytes.len()..padded {
            ctx.emit(format!("local.get {base}"));
            ctx.emit(format!("i32.const {offset}"));
            ctx.emit("i32.add");
            ctx.emit("i32.const 0");
            ctx.emit("i32.store8");
        }

        ctx.emit(format!("local.get {base}"));
        ctx.emit(format!("i32.const {padded}"));
        ctx.emit("i32.add");
        ctx.emit("global.set $heap");
        ctx.emit(format!("local.get {base}"));
    }

    fn gen_binary(&self, ctx: &mut FuncCtx, op: &BinOp, lhs: &Expr, rhs: &Expr) {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::Lt | BinOp::Le => {
                self.gen_expr(ctx, lhs);
                self.gen_expr(ctx, rhs);
                ctx.emit(match op {
                    BinOp::Add => "i32.add",
                    BinOp::Sub => "i32.sub",
                    BinOp::Mul => "i32.mul",
                    BinOp::Div => "i32.div_s",
                    BinOp::Mod => "i32.rem_s",
                    BinOp::Lt => "i32.lt_s",
                    BinOp::Le => "i32.le_s",
                    _ => unreachable!(),
                });
            }
            BinOp::Eq => {
                self.gen_expr(ctx, lhs);
                self.gen_expr(ctx, rhs);
                ctx.emit("i32.eq");
            }
            BinOp::Concat => {
                self.gen_expr(ctx, lhs);
                self.gen_expr(ctx, rhs);
                ctx.emit("call $String_concat");
            }
            BinOp::And => {
                self.gen_expr(ctx, lhs);
                ctx.emit("if (result i32)");
                self.gen_expr(ctx, rhs);
                ctx.emit("else");
                ctx.emit("i32.const 0");
                ctx.emit("end");
            }
            BinOp::Or => {
                self.gen_expr(ctx, lhs);
                ctx.emit("if (result i32)");
                ctx.emit("i32.const 1");
                ctx.emit("else");
                self.gen_expr(ctx, rhs);
                ctx.emit("end");
            }
        }
    }

    fn gen_call(&self, ctx: &mut FuncCtx, id: Identifier, args: &[Expr]) {
        if let Some(&wat_name) = self.builtins.get(&id) {
            for arg in args {
                self.gen_expr(ctx, arg);
            }
            ctx.emit(format!("call {wat_name}"));
            if wat_name == "$printInt" || wat_name == "$printString" {
                ctx.emit("drop");
                ctx.emit("i32.const 0");
            }
            return;
        }

        if let Some(sig) = self.table.constructors.get(&id) {
            self.gen_constructor_call(ctx, sig.index, args);
            return;
        }

        for arg in args {
            self.gen_expr(ctx, arg);
        }
        ctx.emit(format!("call ${}", self.table.function_label(id)));
    }

    fn gen_constructor_call(&self, ctx: &mut FuncCtx, tag: usize, args: &[Expr]) {
        let base = ctx.fresh_scratch();
        ctx.emit("global.get $heap");
        ctx.emit(format!("local.set {base}"));

        ctx.emit(format!("local.get {base}"));
        ctx.emit("i32.const 0");
        ctx.emit("i32.add");
        ctx.emit(format!("i32.const {tag}"));
        ctx.emit("i32.store");

        for (index, arg) in args.iter().enumerate() {
            ctx.emit(format!("local.get {base}"));
            ctx.emit(format!("i32.const {}", 4 * (index + 1)));
            ctx.emit("i32.add");
            self.gen_expr(ctx, arg);
            ctx.emit("i32.store");
        }

        let size = 4 * (1 + args.len());
        ctx.emit(format!("local.get {base}"));
        ctx.emit(format!("i32.const {size}"));
        ctx.emit("i32.add");
        ctx.emit("global.set $heap");
        ctx.emit(format!("local.get {base}"));
    }

    fn gen_match(&self, ctx: &mut FuncCtx, scrutinee: &Expr, cases: &[MatchCase]) {
        self.gen_expr(ctx, scrutinee);
        let scrutinee_local = ctx.fresh_scratch();
        ctx.emit(format!("local.set {scrutinee_local}"));
        self.gen_case_chain(ctx, cases, 0, &Place::Local(scrutinee_local));
    }

    fn gen_case_chain(&self, ctx: &mut FuncCtx, cases: &[MatchCase], index: usize, place: &Place) {
        let Some(case) = cases.get(index) else {
            self.gen_string_literal(ctx, "match failed: no case matched the scrutinee");
            ctx.emit("call $printString");
            ctx.emit("drop");
            ctx.emit("unreachable");
            return;
        };

        let mut bindings = Vec::new();
        let test = self.gen_pattern_test(ctx, &case.pattern, place, &mut bindings);
        ctx.emit_many(test);
        ctx.emit("if (result i32)");
        for (name, binding_place) in &bindings {
            ctx.emit_many(emit_place(binding_place));
            ctx.declare_local(name.clone());
            ctx.emit(format!("local.set {name}"));
        }
        self.gen_expr(ctx, &case.body);
        ctx.emit("else");
        self.gen_case_chain(ctx, cases, index + 1, place);
        ctx.emit("end");
    }

    /// Returns the instruction lines that leave a 0/1 boolean for whether
    /// `pattern` matches the value at `place`, and appends any bindings
    /// the pattern introduces (bound eagerly once the branch is taken).
    fn gen_pattern_test(
        &self,
        ctx: &mut FuncCtx,
        pattern: &Pattern,
        place: &Place,
        bindings: &mut Vec<(String, Place)>,
    ) -> Vec<String> {
        match pattern {
            Pattern::Wildcard(_) => vec!["i32.const 1".to_string()],
            Pattern::Id(id, _) => {
                bindings.push((local_name(*id), place.clone()));
                vec!["i32.const 1".to_string()]
            }
            Pattern::Literal(Literal::Str(s), _) => {
                // Strings compare by pointer, so the literal has to be
                // materialized onto the heap before it can be compared
                // against.
                let scratch = ctx.fresh_scratch();
                self.gen_string_literal(ctx, s);
                ctx.emit(format!("local.set {scratch}"));
                let mut lines = emit_place(place);
                lines.push(format!("local.get {scratch}"));
                lines.push("i32.eq".to_string());
                lines
            }
            Pattern::Literal(lit, _) => {
                let mut lines = emit_place(place);
                lines.push(format!("i32.const {}", literal_i32(lit)));
                lines.push("i32.eq".to_string());
                lines
            }
            Pattern::CaseClass(constr_id, subpatterns, _) => {
                let Some(sig) = self.table.constructors.get(constr_id) else {
                    return vec!["i32.const 0".to_string()];
                };
                let index = sig.index;
                let mut tag_test = emit_place(place);
                tag_test.push("i32.load".to_string());
                tag_test.push(format!("i32.const {index}"));
                tag_test.push("i32.eq".to_string());

                let mut tests = vec![tag_test];
                for (field_index, sub) in subpatterns.iter().enumerate() {
                    let field_place = Place::FieldOf(Box::new(place.clone()), field_index);
                    tests.push(self.gen_pattern_test(ctx, sub, &field_place, bindings));
                }
                and_chain(tests)
            }
        }
    }
}

fn render_func(name: &str, params: &str, ctx: &FuncCtx, export_as: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!("  (func {name}"));
    if !params.is_empty() {
        out.push(' ');
        out.push_str(params);
    }
    if let Some(export_name) = export_as {
        out.push_str(&format!(" (export \"{export_name}\")"));
    }
    out.push_str(" (result i32)\n");
    for local in &ctx.locals {
        out.push_str(&format!("    (local {local} i32)\n"));
    }
    for line in &ctx.lines {
        out.push_str("    ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("  )\n");
    out
}

/// Runtime helpers with no Amy-level counterpart: the string-concat
/// helper the `++` operator lowers to, plus the three `Std` functions
/// that aren't themselves host imports (`readString` wraps `readString0`;
/// `intToString`/`digitToString` are computed in WAT, not imported).
const RUNTIME_HELPERS: &str = r#"  (func $String_concat (param $a i32) (param $b i32) (result i32)
    (local $base i32)
    (local $write i32)
    (local $i i32)
    (local $byte i32)
    global.get $heap
    local.set $base
    local.get $base
    local.set $write
    i32.const 0
    local.set $i
    (block $done_a
      (loop $loop_a
        local.get $a
        local.get $i
        i32.add
        i32.load8_u
        local.set $byte
        local.get $byte
        i32.eqz
        (br_if $done_a)
        local.get $write
        local.get $byte
        i32.store8
        local.get $write
        i32.const 1
        i32.add
        local.set $write
        local.get $i
        i32.const 1
        i32.add
        local.set $i
        (br $loop_a)
      )
    )
    i32.const 0
    local.set $i
    (block $done_b
      (loop $loop_b
        local.get $b
        local.get $i
        i32.add
        i32.load8_u
        local.set $byte
        local.get $byte
        i32.eqz
        (br_if $done_b)
        local.get $write
        local.get $byte
        i32.store8
        local.get $write
        i32.const 1
        i32.add
        local.set $write
        local.get $i
        i32.const 1
        i32.add
        local.set $i
        (br $loop_b)
      )
    )
    local.get $write
    i32.const 0
    i32.store8
    local.get $write
    i32.const 1
    i32.add
    local.set $write
    (block $pad_done
      (loop $pad
        local.get $write
        local.get $base
        i32.sub
        i32.const 4
        i32.rem_u
        i32.eqz
        (br_if $pad_done)
        local.get $write
        i32.const 0
        i32.store8
        local.get $write
        i32.const 1
        i32.add
        local.set $write
        (br $pad)
      )
    )
    local.get $write
    global.set $heap
    local.get $base
  )

  (func $Std_digitToString (param $n i32) (result i32)
    (local $base i32)
    global.get $heap
    local.set $base
    local.get $base
    local.get $n
    i32.const 48
    i32.add
    i32.store8
    local.get $base
    i32.const 1
    i32.add
    i32.const 0
    i32.store8
    local.get $base
    i32.const 2
    i32.add
    i32.const 0
    i32.store8
    local.get $base
    i32.const 3
    i32.add
    i32.const 0
    i32.store8
    local.get $base
    i32.const 4
    i32.add
    global.set $heap
    local.get $base
  )

  (func $Std_intToString (param $n i32) (result i32)
    (local $buf i32)
    (local $pos i32)
    (local $value i32)
    (local $negative i32)
    (local $digit i32)
    (local $base i32)
    (local $write i32)
    (local $i i32)
    global.get $heap
    local.set $buf
    local.get $buf
    i32.const 64
    i32.add
    global.set $heap
    i32.const 12
    local.set $pos
    local.get $n
    local.set $value
    i32.const 0
    local.set $negative
    (if (i32.lt_s (local.get $value) (i32.const 0))
      (then
        i32.const 1
        local.set $negative
        i32.const 0
        local.get $value
        i32.sub
        local.set $value
      )
    )
    (block $nonzero_done
      (if (i32.eqz (local.get $value))
        (then
          local.get $pos
          i32.const 1
          i32.sub
          local.set $pos
          local.get $buf
          local.get $pos
          i32.add
          i32.const 48
          i32.store8
          (br $nonzero_done)
        )
      )
      (loop $digits
        (if (i32.eqz (local.get $value))
          (then (br $nonzero_done))
        )
        local.get $value
        i32.const 10
        i32.rem_s
        local.set $digit
        local.get $pos
        i32.const 1
        i32.sub
        local.set $pos
        local.get $buf
        local.get $pos
        i32.add
        local.get $digit
        i32.const 48
        i32.add
        i32.store8
        local.get $value
        i32.const 10
        i32.div_s
        local.set $value
        (br $digits)
      )
    )
    (if (local.get $negative)
      (then
        local.get $pos
        i32.const 1
        i32.sub
        local.set $pos
        local.get $buf
        local.get $pos
        i32.add
        i32.const 45
        i32.store8
      )
    )
    global.get $heap
    local.set $base
    local.get $base
    local.set $write
    local.get $pos
    local.set $i
    (block $copy_done
      (loop $copy
        local.get $i
        i32.const 12
        i32.ge_s
        (br_if $copy_done)
        local.get $write
        local.get $buf
        local.get $i
        i32.add
        i32.load8_u
        i32.store8
        local.get $write
        i32.const 1
        i32.add
        local.set $write
        local.get $i
        i32.const 1
        i32.add
        local.set $i
        (br $copy)
      )
    )
    local.get $write
    i32.const 0
    i32.store8
    local.get $write
    i32.const 1
    i32.add
    local.set $write
    (block $pad_done
      (loop $pad
        local.get $write
        local.get $base
        i32.sub
        i32.const 4
        i32.rem_u
        i32.eqz
        (br_if $pad_done)
        local.get $write
        i32.const 0
        i32.store8
        local.get $write
        i32.const 1
        i32.add
        local.set $write
        (br $pad)
      )
    )
    local.get $write
    global.set $heap
    local.get $base
  )

  (func $Std_readString (result i32)
    (local $base i32)
    global.get $heap
    local.set $base
    local.get $base
    call $readString0
    global.set $heap
    local.get $base
  )
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Reporter;
    use crate::lexer::Lexer;
    use crate::nameanalysis::NameAnalyzer;
    use crate::parser::Parser;
    use crate::typechecker::TypeChecker;

    fn compile(src: &str) -> String {
        let tokens = Lexer::new(src, "test.amy").lex().unwrap();
        let program = Parser::new(tokens).unwrap().parse_program().unwrap();
        let mut reporter = Reporter::new();
        let (symbolic, table) = NameAnalyzer::new().analyze(&program, &mut reporter).unwrap();
        assert!(TypeChecker::new().check(&symbolic, &table, &mut reporter));
        CodeGen::new(&table).generate(&symbolic)
    }

    #[test]
    fn emits_imports_and_heap_global() {
        let wat = compile("object H { 42 }");
        assert!(wat.contains(r#"(import "system" "mem" (memory 100))"#));
        assert!(wat.contains("(global $heap (mut i32) (i32.const 0))"));
    }

    #[test]
    fn emits_module_main_export() {
        let wat = compile("object H { def f(x: Int): Int = { x + 1 } f(41) }");
        assert!(wat.contains(r#"(export "H_main")"#));
        assert!(wat.contains("call $H_f"));
    }

    #[test]
    fn constructor_tags_match_declaration_order() {
        let wat = compile(
            "object M { abstract class L; case class N() extends L; case class C(h: Int, t: L) extends L; C(1, C(2, N())) }",
        );
        assert!(wat.contains("i32.const 1\n    i32.store"));
        assert!(wat.contains("i32.const 0\n    i32.store"));
    }

    #[test]
    fn string_concat_call_is_emitted() {
        let wat = compile(r#"object H { "ab" ++ "cd" }"#);
        assert!(wat.contains("call $String_concat"));
    }

    #[test]
    fn match_lowers_to_nested_if_with_trailing_unreachable() {
        let wat = compile(
            "object M { abstract class L; case class N() extends L; case class C(h: Int, t: L) extends L; def len(l: L): Int = { l match { case N() => 0 case C(h, t) => 1 } } 0 }",
        );
        assert!(wat.contains("unreachable"));
    }

    #[test]
    fn heap_only_grows() {
        let wat = compile(r#"object H { "hi" }"#);
        assert!(!wat.contains("global.get $heap\n    i32.const"));
        assert!(wat.contains("global.set $heap"));
    }

    #[test]
    fn string_literal_pattern_compares_by_pointer() {
        let wat = compile(
            r#"object H { def f(s: String): Int = { s match { case "yes" => 1 case _ => 0 } } 0 }"#,
        );
        assert!(wat.contains("i32.eq"));
        assert!(!wat.contains("panicked"));
    }
}
