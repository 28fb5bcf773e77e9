//! Recursive-descent parser over the Amy grammar, producing the nominal
//! AST.
//!
//! Every production corresponds to one parsing function and picks its
//! alternative by peeking exactly one token ahead, which is why
//! [`ll1::AMY_GRAMMAR`] and [`ll1::Grammar::validate_ll1`] are run once at
//! [`Parser::new`] before any token is consumed: if the grammar were not
//! LL(1), this style of parser would silently pick the wrong alternative
//! instead of failing loudly.

pub mod ast;
pub mod ll1;
mod parse_state;

use ast::*;
use parse_state::ParseState;

use crate::diagnostics::Span;
use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    fn unexpected(found: &Token, expected: &[&str]) -> Self {
        if matches!(found.kind, TokenKind::Eof) {
            return Self::eof();
        }
        Self {
            message: format!(
                "unexpected token {:?}, expected one of {:?}",
                found.kind, expected
            ),
            span: Some(found.span.clone()),
        }
    }

    fn eof() -> Self {
        Self {
            message: "unexpected end of file".to_string(),
            span: None,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.span {
            Some(span) => write!(f, "{}", span.render(&self.message)),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    state: ParseState,
}

impl Parser {
    /// Validates the grammar's LL(1)-ness before accepting any tokens.
    /// Returns the conflict as a `ParseError` so the caller can report it
    /// as a fatal diagnostic rather than risk silently picking the wrong
    /// alternative later.
    pub fn new(tokens: Vec<Token>) -> ParseResult<Self> {
        ll1::AMY_GRAMMAR.validate_ll1().map_err(|conflict| ParseError {
            message: conflict.to_string(),
            span: None,
        })?;
        Ok(Self {
            state: ParseState::new(tokens),
        })
    }

    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut modules = Vec::new();
        while !self.state.is_eof() {
            modules.push(self.parse_module()?);
        }
        Ok(Program { modules })
    }

    fn peek(&self) -> &Token {
        self.state.peek()
    }

    fn expect_keyword(&mut self, kw: &'static str) -> ParseResult<Span> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Keyword(k) if k == kw => {
                self.state.advance();
                Ok(token.span)
            }
            _ => Err(ParseError::unexpected(&token, &[kw])),
        }
    }

    fn expect_delim(&mut self, d: &'static str) -> ParseResult<Span> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Delimiter(s) if s == d => {
                self.state.advance();
                Ok(token.span)
            }
            _ => Err(ParseError::unexpected(&token, &[d])),
        }
    }

    fn expect_operator(&mut self, op: &'static str) -> ParseResult<Span> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Operator(s) if s == op => {
                self.state.advance();
                Ok(token.span)
            }
            _ => Err(ParseError::unexpected(&token, &[op])),
        }
    }

    fn try_delim(&mut self, d: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Delimiter(s) if s == d).then(|| {
            self.state.advance();
        }).is_some()
    }

    fn try_keyword(&mut self, kw: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Keyword(k) if k == kw).then(|| {
            self.state.advance();
        }).is_some()
    }

    fn expect_identifier(&mut self) -> ParseResult<(String, Span)> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.state.advance();
                Ok((name, token.span))
            }
            _ => Err(ParseError::unexpected(&token, &["identifier"])),
        }
    }

    fn parse_qualified_name(&mut self) -> ParseResult<(QualifiedName, Span)> {
        let (first, span) = self.expect_identifier()?;
        if self.try_delim(".") {
            let (second, span2) = self.expect_identifier()?;
            Ok((
                QualifiedName {
                    module: Some(first),
                    name: second,
                },
                Span::new(span.start, span2.end, span.file),
            ))
        } else {
            Ok((QualifiedName::unqualified(first), span))
        }
    }

    // Module ::= 'object' Id '{' Def* Expr? '}'
    fn parse_module(&mut self) -> ParseResult<ModuleDef> {
        let start = self.expect_keyword("object")?;
        let (name, _) = self.expect_identifier()?;
        self.expect_delim("{")?;

        let mut defs = Vec::new();
        while self.starts_def() {
            defs.push(self.parse_def()?);
            self.try_delim(";");
        }

        let top_level_expr = if self.try_delim("}") {
            None
        } else {
            let expr = self.parse_expr()?;
            self.expect_delim("}")?;
            Some(expr)
        };

        Ok(ModuleDef {
            name,
            defs,
            top_level_expr,
            span: start,
        })
    }

    fn starts_def(&self) -> bool {
        matches!(&self.peek().kind, TokenKind::Keyword(k) if k == "def" || k == "abstract" || k == "case")
    }

    fn parse_def(&mut self) -> ParseResult<Def> {
        match &self.peek().kind {
            TokenKind::Keyword(k) if k == "def" => Ok(Def::Fun(self.parse_fun_def()?)),
            TokenKind::Keyword(k) if k == "abstract" => {
                Ok(Def::Abstract(self.parse_abstract_def()?))
            }
            TokenKind::Keyword(k) if k == "case" => Ok(Def::Case(self.parse_case_def()?)),
            _ => Err(ParseError::unexpected(self.peek(), &["def", "abstract", "case"])),
        }
    }

    // FunDef ::= 'def' Id '(' Params ')' ':' Type '=' '{' Expr '}'
    fn parse_fun_def(&mut self) -> ParseResult<FunDef> {
        let start = self.expect_keyword("def")?;
        let (name, _) = self.expect_identifier()?;
        self.expect_delim("(")?;
        let params = self.parse_params()?;
        self.expect_delim(")")?;
        self.expect_delim(":")?;
        let return_type = self.parse_type()?;
        self.expect_delim("=")?;
        self.expect_delim("{")?;
        let body = self.parse_expr()?;
        self.expect_delim("}")?;
        Ok(FunDef {
            name,
            params,
            return_type,
            body,
            span: start,
        })
    }

    // AbstractDef ::= 'abstract' 'class' Id
    fn parse_abstract_def(&mut self) -> ParseResult<AbstractClassDef> {
        let start = self.expect_keyword("abstract")?;
        self.expect_keyword("class")?;
        let (name, _) = self.expect_identifier()?;
        Ok(AbstractClassDef { name, span: start })
    }

    // CaseDef ::= 'case' 'class' Id '(' Params ')' 'extends' Id
    fn parse_case_def(&mut self) -> ParseResult<CaseClassDef> {
        let start = self.expect_keyword("case")?;
        self.expect_keyword("class")?;
        let (name, _) = self.expect_identifier()?;
        self.expect_delim("(")?;
        let fields = self.parse_params()?;
        self.expect_delim(")")?;
        self.expect_keyword("extends")?;
        let (parent, _) = self.expect_identifier()?;
        Ok(CaseClassDef {
            name,
            fields,
            parent,
            span: start,
        })
    }

    // Params ::= (Param (',' Param)*)?
    fn parse_params(&mut self) -> ParseResult<Vec<ParamDef>> {
        if matches!(&self.peek().kind, TokenKind::Delimiter(d) if d == ")") {
            return Ok(Vec::new());
        }
        let mut params = vec![self.parse_param()?];
        while self.try_delim(",") {
            params.push(self.parse_param()?);
        }
        Ok(params)
    }

    // Param ::= Id ':' Type
    fn parse_param(&mut self) -> ParseResult<ParamDef> {
        let (name, span) = self.expect_identifier()?;
        self.expect_delim(":")?;
        let type_name = self.parse_type()?;
        Ok(ParamDef {
            name,
            type_name,
            span,
        })
    }

    // Type ::= Primitive | Id ('.' Id)?
    fn parse_type(&mut self) -> ParseResult<TypeName> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::PrimitiveType(name) => {
                self.state.advance();
                Ok(match name.as_str() {
                    "Int" => TypeName::Int,
                    "String" => TypeName::String,
                    "Boolean" => TypeName::Boolean,
                    "Unit" => TypeName::Unit,
                    _ => unreachable!("lexer only produces the four primitive type names"),
                })
            }
            TokenKind::Identifier(_) => {
                let (qname, _) = self.parse_qualified_name()?;
                Ok(TypeName::Class(qname))
            }
            _ => Err(ParseError::unexpected(&token, &["type name"])),
        }
    }

    // Expr ::= LetExpr | SeqExpr
    fn parse_expr(&mut self) -> ParseResult<Expr> {
        if matches!(&self.peek().kind, TokenKind::Keyword(k) if k == "val") {
            self.parse_let_expr()
        } else {
            self.parse_seq_expr()
        }
    }

    // LetExpr ::= 'val' Param '=' Lv2Expr ';' Expr
    fn parse_let_expr(&mut self) -> ParseResult<Expr> {
        let start = self.expect_keyword("val")?;
        let param = self.parse_param()?;
        self.expect_delim("=")?;
        let value = self.parse_lv2_expr()?;
        self.expect_delim(";")?;
        let body = self.parse_expr()?;
        Ok(Expr::Let(param, Box::new(value), Box::new(body), start))
    }

    // SeqExpr ::= Lv2Expr (';' Expr)?
    fn parse_seq_expr(&mut self) -> ParseResult<Expr> {
        let first = self.parse_lv2_expr()?;
        if self.try_delim(";") {
            let rest = self.parse_expr()?;
            let span = first.span().clone();
            Ok(Expr::Sequence(Box::new(first), Box::new(rest), span))
        } else {
            Ok(first)
        }
    }

    // Lv2Expr ::= (IteExpr | OpExpr) ('match' '{' Case+ '}')*
    fn parse_lv2_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = if matches!(&self.peek().kind, TokenKind::Keyword(k) if k == "if") {
            self.parse_ite_expr()?
        } else {
            self.parse_op_expr(0)?
        };
        while self.try_keyword("match") {
            let span = expr.span().clone();
            self.expect_delim("{")?;
            let mut cases = vec![self.parse_case()?];
            while matches!(&self.peek().kind, TokenKind::Keyword(k) if k == "case") {
                cases.push(self.parse_case()?);
            }
            self.expect_delim("}")?;
            expr = Expr::Match(Box::new(expr), cases, span);
        }
        Ok(expr)
    }

    // IteExpr ::= 'if' '(' Expr ')' '{' Expr '}' 'else' '{' Expr '}'
    fn parse_ite_expr(&mut self) -> ParseResult<Expr> {
        let start = self.expect_keyword("if")?;
        self.expect_delim("(")?;
        let cond = self.parse_expr()?;
        self.expect_delim(")")?;
        self.expect_delim("{")?;
        let then_branch = self.parse_expr()?;
        self.expect_delim("}")?;
        self.expect_keyword("else")?;
        self.expect_delim("{")?;
        let else_branch = self.parse_expr()?;
        self.expect_delim("}")?;
        Ok(Expr::Ite(
            Box::new(cond),
            Box::new(then_branch),
            Box::new(else_branch),
            start,
        ))
    }

    // Precedence climbing, lowest to highest: || ; && ; == ; < <= ; + - ++ ; * / %
    const PRECEDENCE: &'static [&'static [&'static str]] = &[
        &["||"],
        &["&&"],
        &["=="],
        &["<", "<="],
        &["+", "-", "++"],
        &["*", "/", "%"],
    ];

    fn parse_op_expr(&mut self, level: usize) -> ParseResult<Expr> {
        if level >= Self::PRECEDENCE.len() {
            return self.parse_unary_expr();
        }
        let mut lhs = self.parse_op_expr(level + 1)?;
        loop {
            let op_str = match &self.peek().kind {
                TokenKind::Operator(op) if Self::PRECEDENCE[level].contains(&op.as_str()) => {
                    op.clone()
                }
                _ => break,
            };
            self.state.advance();
            let rhs = self.parse_op_expr(level + 1)?;
            let span = lhs.span().clone();
            let op = match op_str.as_str() {
                "||" => BinOp::Or,
                "&&" => BinOp::And,
                "==" => BinOp::Eq,
                "<" => BinOp::Lt,
                "<=" => BinOp::Le,
                "+" => BinOp::Add,
                "-" => BinOp::Sub,
                "++" => BinOp::Concat,
                "*" => BinOp::Mul,
                "/" => BinOp::Div,
                "%" => BinOp::Mod,
                _ => unreachable!("operator table exhaustive above"),
            };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), span);
        }
        Ok(lhs)
    }

    // UnaryExpr ::= '-' Simple | '!' Simple | Simple
    fn parse_unary_expr(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Operator(op) if op == "-" => {
                self.state.advance();
                let inner = self.parse_simple()?;
                Ok(Expr::Unary(UnOp::Neg, Box::new(inner), token.span))
            }
            TokenKind::Operator(op) if op == "!" => {
                self.state.advance();
                let inner = self.parse_simple()?;
                Ok(Expr::Unary(UnOp::Not, Box::new(inner), token.span))
            }
            _ => self.parse_simple(),
        }
    }

    // Simple ::= Literal | VarOrCall | '(' Expr? ')' | 'error' '(' Expr ')'
    fn parse_simple(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::IntLiteral(v) => {
                self.state.advance();
                Ok(Expr::Literal(Literal::Int(v), token.span))
            }
            TokenKind::BoolLiteral(v) => {
                self.state.advance();
                Ok(Expr::Literal(Literal::Bool(v), token.span))
            }
            TokenKind::StringLiteral(v) => {
                self.state.advance();
                Ok(Expr::Literal(Literal::Str(v), token.span))
            }
            TokenKind::Identifier(_) => self.parse_var_or_call(),
            TokenKind::Delimiter(ref d) if d == "(" => {
                self.state.advance();
                if self.try_delim(")") {
                    Ok(Expr::Literal(Literal::Unit, token.span))
                } else {
                    let inner = self.parse_expr()?;
                    self.expect_delim(")")?;
                    Ok(inner)
                }
            }
            TokenKind::Keyword(ref k) if k == "error" => {
                self.state.advance();
                self.expect_delim("(")?;
                let inner = self.parse_expr()?;
                self.expect_delim(")")?;
                Ok(Expr::Error(Box::new(inner), token.span))
            }
            _ => Err(ParseError::unexpected(
                &token,
                &["literal", "identifier", "(", "error"],
            )),
        }
    }

    // VarOrCall ::= Id ('.' Id)? ('(' Args ')')?
    fn parse_var_or_call(&mut self) -> ParseResult<Expr> {
        let (qname, span) = self.parse_qualified_name()?;
        if self.try_delim("(") {
            let args = self.parse_args()?;
            self.expect_delim(")")?;
            Ok(Expr::Call(qname, args, span))
        } else if qname.module.is_some() {
            Err(ParseError {
                message: format!(
                    "qualified name '{}.{}' used as a variable, but only calls may be qualified",
                    qname.module.unwrap(),
                    qname.name
                ),
                span: Some(span),
            })
        } else {
            Ok(Expr::Variable(qname.name, span))
        }
    }

    // Args ::= (Expr (',' Expr)*)?
    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        if matches!(&self.peek().kind, TokenKind::Delimiter(d) if d == ")") {
            return Ok(Vec::new());
        }
        let mut args = vec![self.parse_expr()?];
        while self.try_delim(",") {
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }

    // Case ::= 'case' Pattern '=>' Expr
    fn parse_case(&mut self) -> ParseResult<MatchCase> {
        let start = self.expect_keyword("case")?;
        let pattern = self.parse_pattern()?;
        self.expect_delim("=>")?;
        let body = self.parse_expr()?;
        Ok(MatchCase {
            pattern,
            body,
            span: start,
        })
    }

    // Pattern ::= Literal | '(' ')' | '_' | Id ('.' Id)? ('(' Patterns ')')?
    fn parse_pattern(&mut self) -> ParseResult<Pattern> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::IntLiteral(v) => {
                self.state.advance();
                Ok(Pattern::Literal(Literal::Int(v), token.span))
            }
            TokenKind::BoolLiteral(v) => {
                self.state.advance();
                Ok(Pattern::Literal(Literal::Bool(v), token.span))
            }
            TokenKind::StringLiteral(v) => {
                self.state.advance();
                Ok(Pattern::Literal(Literal::Str(v), token.span))
            }
            TokenKind::Delimiter(ref d) if d == "(" => {
                self.state.advance();
                self.expect_delim(")")?;
                Ok(Pattern::Literal(Literal::Unit, token.span))
            }
            TokenKind::Underscore => {
                self.state.advance();
                Ok(Pattern::Wildcard(token.span))
            }
            TokenKind::Identifier(_) => {
                let (qname, span) = self.parse_qualified_name()?;
                if self.try_delim("(") {
                    let sub = self.parse_patterns()?;
                    self.expect_delim(")")?;
                    Ok(Pattern::CaseClass(qname, sub, span))
                } else if qname.module.is_none() {
                    Ok(Pattern::Id(qname.name, span))
                } else {
                    Err(ParseError {
                        message: "qualified name in binder position requires a constructor argument list".to_string(),
                        span: Some(span),
                    })
                }
            }
            _ => Err(ParseError::unexpected(
                &token,
                &["literal", "(", "_", "identifier"],
            )),
        }
    }

    fn parse_patterns(&mut self) -> ParseResult<Vec<Pattern>> {
        if matches!(&self.peek().kind, TokenKind::Delimiter(d) if d == ")") {
            return Ok(Vec::new());
        }
        let mut patterns = vec![self.parse_pattern()?];
        while self.try_delim(",") {
            patterns.push(self.parse_pattern()?);
        }
        Ok(patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> ParseResult<Program> {
        let tokens = Lexer::new(src, "test.amy").lex().unwrap();
        Parser::new(tokens)?.parse_program()
    }

    #[test]
    fn parses_minimal_module_with_top_level_int() {
        let program = parse("object H { 42 }").unwrap();
        assert_eq!(program.modules.len(), 1);
        assert_eq!(program.modules[0].name, "H");
        assert!(matches!(
            program.modules[0].top_level_expr,
            Some(Expr::Literal(Literal::Int(42), _))
        ));
    }

    #[test]
    fn parses_function_with_call() {
        let program = parse("object H { def f(x: Int): Int = { x + 1 }; f(41) }").unwrap();
        let module = &program.modules[0];
        assert_eq!(module.defs.len(), 1);
        match &module.defs[0] {
            Def::Fun(f) => {
                assert_eq!(f.name, "f");
                assert_eq!(f.params.len(), 1);
            }
            _ => panic!("expected a function definition"),
        }
    }

    #[test]
    fn parses_case_class_hierarchy() {
        let program = parse(
            "object M { abstract class L; case class N() extends L; case class C(h: Int, t: L) extends L; C(1, C(2, N())) }",
        )
        .unwrap();
        let module = &program.modules[0];
        assert_eq!(module.defs.len(), 3);
    }

    #[test]
    fn parses_match_with_case_class_pattern() {
        let program = parse(
            "object M { abstract class L; case class N() extends L; case class C(h: Int, t: L) extends L; def len(l: L): Int = { l match { case N() => 0 case C(h, t) => 1 } } 0 }",
        )
        .unwrap();
        assert_eq!(program.modules[0].defs.len(), 4);
    }

    #[test]
    fn reports_expected_tokens_on_unexpected_token() {
        let err = parse("object H { def }").unwrap_err();
        assert!(err.message.contains("expected"));
    }

    #[test]
    fn reports_eof_specially() {
        let err = parse("object H {").unwrap_err();
        assert_eq!(err.message, "unexpected end of file");
    }

    #[test]
    fn unit_literal_vs_grouping() {
        let program = parse("object H { (1) }").unwrap();
        assert!(matches!(
            program.modules[0].top_level_expr,
            Some(Expr::Literal(Literal::Int(1), _))
        ));
        let program = parse("object H { () }").unwrap();
        assert!(matches!(
            program.modules[0].top_level_expr,
            Some(Expr::Literal(Literal::Unit, _))
        ));
    }

    #[test]
    fn match_chains_left_fold() {
        let program = parse(
            "object H { def f(x: Int): Int = { x match { case _ => 1 } match { case _ => 2 } } 0 }",
        )
        .unwrap();
        match &program.modules[0].defs[0] {
            Def::Fun(f) => assert!(matches!(f.body, Expr::Match(_, _, _))),
            _ => panic!(),
        }
    }
}
