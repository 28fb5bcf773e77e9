//! The symbolic AST: structurally identical to the nominal AST, but every
//! name has been resolved to a globally unique [`Identifier`] and every
//! type annotation has been resolved to a concrete [`Type`].

use crate::diagnostics::Span;
use serde::Serialize;
use crate::parser::ast::{BinOp, Literal, UnOp};
use std::fmt;

/// An opaque, process-wide unique id carrying a human-readable debug name.
/// Two `Identifier`s are equal iff they were issued by the same
/// [`super::IdentifierFactory`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Identifier(pub u32);

impl Identifier {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    IntType,
    BooleanType,
    StringType,
    UnitType,
    ClassType(Identifier),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::IntType => write!(f, "Int"),
            Type::BooleanType => write!(f, "Boolean"),
            Type::StringType => write!(f, "String"),
            Type::UnitType => write!(f, "Unit"),
            Type::ClassType(id) => write!(f, "class{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Pattern {
    Wildcard(Span),
    Id(Identifier, Span),
    Literal(Literal, Span),
    CaseClass(Identifier, Vec<Pattern>, Span),
}

impl Pattern {
    pub fn span(&self) -> &Span {
        match self {
            Pattern::Wildcard(s) => s,
            Pattern::Id(_, s) => s,
            Pattern::Literal(_, s) => s,
            Pattern::CaseClass(_, _, s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Variable(Identifier, Span),
    Literal(Literal, Span),
    Binary(BinOp, Box<Expr>, Box<Expr>, Span),
    Unary(UnOp, Box<Expr>, Span),
    Call(Identifier, Vec<Expr>, Span),
    Sequence(Box<Expr>, Box<Expr>, Span),
    Let(Identifier, Box<Expr>, Box<Expr>, Span),
    Ite(Box<Expr>, Box<Expr>, Box<Expr>, Span),
    Match(Box<Expr>, Vec<MatchCase>, Span),
    Error(Box<Expr>, Span),
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Variable(_, s)
            | Expr::Literal(_, s)
            | Expr::Binary(_, _, _, s)
            | Expr::Unary(_, _, s)
            | Expr::Call(_, _, s)
            | Expr::Sequence(_, _, s)
            | Expr::Let(_, _, _, s)
            | Expr::Ite(_, _, _, s)
            | Expr::Match(_, _, s)
            | Expr::Error(_, s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunDef {
    pub id: Identifier,
    pub params: Vec<Identifier>,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleDef {
    pub id: Identifier,
    pub funcs: Vec<FunDef>,
    pub top_level_expr: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub modules: Vec<ModuleDef>,
}
