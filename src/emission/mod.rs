//! Jasmin text emission using [Display]
//!
//! Implements [Display] for the listing built by [codegen](crate::codegen), so a class renders
//! with [to_string] or as a formatting arg. Directives start at column 1, instructions are
//! indented four spaces and labels two.
//!
//! [Display]: https://doc.rust-lang.org/std/fmt/trait.Display.html
//! [to_string]: https://doc.rust-lang.org/std/string/trait.ToString.html#tymethod.to_string


use crate::codegen::*;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Extension understood by the Jasmin assembler.
pub const JASMIN_EXTENSION: &str = "j";

fn write_slot_op(f: &mut fmt::Formatter, prefix: char, op: &str, slot: u16) -> fmt::Result {
    if slot <= 3 {
        write!(f, "{prefix}{op}_{slot}")
    } else {
        write!(f, "{prefix}{op} {slot}")
    }
}

fn write_int_const(f: &mut fmt::Formatter, value: i32) -> fmt::Result {
    match value {
        -1 => write!(f, "iconst_m1"),
        0..=5 => write!(f, "iconst_{value}"),
        v if i8::try_from(v).is_ok() => write!(f, "bipush {v}"),
        v if i16::try_from(v).is_ok() => write!(f, "sipush {v}"),
        v => write!(f, "ldc {v}"),
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.class, self.name)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Load(family, slot) => write_slot_op(f, family.prefix(), "load", *slot),
            Self::Store(family, slot) => write_slot_op(f, family.prefix(), "store", *slot),
            Self::IntConst(value) => write_int_const(f, *value),
            Self::ArrayLoad(family) => write!(f, "{}aload", family.prefix()),
            Self::ArrayStore(family) => write!(f, "{}astore", family.prefix()),
            Self::ArrayLength => write!(f, "arraylength"),
            Self::NewIntArray => write!(f, "newarray int"),
            Self::New(class) => write!(f, "new {class}"),
            Self::Dup => write!(f, "dup"),
            Self::IAdd => write!(f, "iadd"),
            Self::ISub => write!(f, "isub"),
            Self::IMul => write!(f, "imul"),
            Self::GetField(field) => write!(f, "getfield {field} {}", field.descriptor),
            Self::PutField(field) => write!(f, "putfield {field} {}", field.descriptor),
            Self::GetStatic(field) => write!(f, "getstatic {field} {}", field.descriptor),
            Self::InvokeVirtual(method) => write!(f, "invokevirtual {method}{}", method.descriptor),
            Self::InvokeSpecial(method) => write!(f, "invokespecial {method}{}", method.descriptor),
            Self::Goto(label) => write!(f, "goto {label}"),
            Self::IfEq(label) => write!(f, "ifeq {label}"),
            Self::IfNe(label) => write!(f, "ifne {label}"),
            Self::IfICmpLt(label) => write!(f, "if_icmplt {label}"),
            Self::IfICmpGe(label) => write!(f, "if_icmpge {label}"),
            Self::Label(label) => write!(f, "{label}:"),
            Self::Return(Some(family)) => write!(f, "{}return", family.prefix()),
            Self::Return(None) => write!(f, "return"),
        }
    }
}

impl fmt::Display for JasminField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, ".field public {} {}", self.name, self.descriptor)
    }
}

impl fmt::Display for JasminMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let modifiers = if self.is_static { "public static" } else { "public" };
        writeln!(f, ".method {modifiers} {}{}", self.name, self.descriptor)?;
        if let Some(FrameLimits { stack, locals }) = self.limits {
            writeln!(f, ".limit stack {stack}")?;
            writeln!(f, ".limit locals {locals}")?;
        }
        for instruction in &self.body {
            if instruction.is_label() {
                writeln!(f, "  {instruction}")?;
            } else {
                writeln!(f, "    {instruction}")?;
            }
        }
        writeln!(f, ".end method")
    }
}

impl fmt::Display for JasminClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, ".class public {}", self.name)?;
        writeln!(f, ".super {}", self.superclass)?;
        for field in &self.fields {
            writeln!(f, "{field}")?;
        }
        for method in &self.methods {
            writeln!(f)?;
            write!(f, "{method}")?;
        }
        Ok(())
    }
}

/// `<ClassName>.j`
pub fn class_file_name(class: &JasminClass) -> String {
    format!("{}.{JASMIN_EXTENSION}", class.name)
}

/// Writes one file per class into `dir`. Each file is rendered completely
/// before it is written. Returns the written paths in class order.
pub fn write_class_files(dir: &Path, classes: &[JasminClass]) -> io::Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(classes.len());
    for class in classes {
        let path = dir.join(class_file_name(class));
        fs::write(&path, class.to_string())?;
        info!(path = %path.display(), "wrote class file");
        written.push(path);
    }
    Ok(written)
}
