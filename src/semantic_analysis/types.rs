use crate::ast::{Identifier, TypeName};
use std::fmt;

/// Resolved type of a declaration or expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Boolean,
    IntArray,
    Class(Identifier),
    /// Parameter of the main method.
    StringArray,
    Void,
}

impl Type {
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl From<&TypeName> for Type {
    fn from(value: &TypeName) -> Self {
        match value {
            TypeName::Int => Self::Int,
            TypeName::Boolean => Self::Boolean,
            TypeName::IntArray => Self::IntArray,
            TypeName::Class(name) => Self::Class(name.clone()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Int => write!(f, "IntegerType"),
            Self::Boolean => write!(f, "BooleanType"),
            Self::IntArray => write!(f, "IntArrayType"),
            Self::Class(name) => write!(f, "{name}"),
            Self::StringArray => write!(f, "StringArrayType"),
            Self::Void => write!(f, "VoidType"),
        }
    }
}
