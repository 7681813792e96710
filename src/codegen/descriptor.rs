//! JVM type and method descriptors.

use super::jasmin_ast::STRING_CLASS;
use crate::semantic_analysis::{Result, SemanticError, Type};

pub fn type_descriptor(ty: &Type) -> String {
    match ty {
        Type::Int => "I".into(),
        Type::Boolean => "Z".into(),
        Type::IntArray => "[I".into(),
        Type::StringArray => format!("[L{STRING_CLASS};"),
        Type::Class(name) => format!("L{name};"),
        Type::Void => "V".into(),
    }
}

/// `(` formal encodings in call order `)` result encoding.
pub fn method_descriptor(formals: &[Type], result: &Type) -> String {
    let formals: String = formals.iter().map(type_descriptor).collect();
    format!("({formals}){}", type_descriptor(result))
}

fn parse_type(input: &str) -> Option<(Type, &str)> {
    let mut chars = input.chars();
    let ty = match chars.next()? {
        'I' => Type::Int,
        'Z' => Type::Boolean,
        'V' => Type::Void,
        '[' => {
            return match parse_type(chars.as_str())? {
                (Type::Int, rest) => Some((Type::IntArray, rest)),
                (Type::Class(name), rest) if name == STRING_CLASS => Some((Type::StringArray, rest)),
                _ => None,
            };
        }
        'L' => {
            let rest = chars.as_str();
            let end = rest.find(';').filter(|&end| end > 0)?;
            return Some((Type::Class(rest[..end].to_owned()), &rest[end + 1..]));
        }
        _ => return None,
    };
    Some((ty, chars.as_str()))
}

/// Inverse of [`method_descriptor`].
pub fn parse_method_descriptor(descriptor: &str) -> Result<(Vec<Type>, Type)> {
    let malformed = || SemanticError::MalformedDescriptor(descriptor.to_owned());

    let mut rest = descriptor.strip_prefix('(').ok_or_else(malformed)?;
    let mut formals = Vec::new();
    while !rest.starts_with(')') {
        let (ty, tail) = parse_type(rest)
            .filter(|(ty, _)| *ty != Type::Void)
            .ok_or_else(malformed)?;
        formals.push(ty);
        rest = tail;
    }
    let (result, tail) = parse_type(&rest[1..]).ok_or_else(malformed)?;
    if !tail.is_empty() {
        return Err(malformed());
    }
    Ok((formals, result))
}
