use super::types::Type;
use crate::ast::{ExpId, Identifier};
use std::fmt;

pub type Result<T> = std::result::Result<T, SemanticError>;

/// Invariant violations raised by the analysis and code generation passes.
///
/// The tree is validated upstream, so each of these means a pass was handed
/// something it cannot translate; the current compilation unit is abandoned.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SemanticError {
    #[error("unresolved {kind} `{name}`")]
    UnresolvedName { kind: NameKind, name: Identifier },
    #[error("expected a {expected} scope, but the current scope is a {found} scope")]
    ScopeMismatch {
        expected: ScopeLevel,
        found: ScopeLevel,
    },
    #[error("type {0} has no load/store/return instruction family")]
    UnsupportedType(Type),
    #[error("expression {0:?} has no type annotation")]
    MissingAnnotation(ExpId),
    #[error("malformed descriptor `{0}`")]
    MalformedDescriptor(String),
    #[error("variable `{name}` at offset {offset} has no local variable slot")]
    SlotOutOfRange { name: Identifier, offset: i32 },
}

impl SemanticError {
    pub(crate) fn unresolved(kind: NameKind, name: &str) -> Self {
        Self::UnresolvedName {
            kind,
            name: name.to_owned(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NameKind {
    Variable,
    Class,
    Method,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScopeLevel {
    Program,
    Class,
    Method,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Variable => write!(f, "variable"),
            Self::Class => write!(f, "class"),
            Self::Method => write!(f, "method"),
        }
    }
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Program => write!(f, "program"),
            Self::Class => write!(f, "class"),
            Self::Method => write!(f, "method"),
        }
    }
}
