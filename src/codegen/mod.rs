#[cfg(test)]
mod codegen_tests;

mod descriptor;
mod gen;
pub mod jasmin_ast;
mod labels;
mod stack;

use crate::ast::Ast;
use crate::semantic_analysis::{Analysis, Result};

pub use descriptor::{method_descriptor, parse_method_descriptor, type_descriptor};
pub use jasmin_ast::*;
pub use labels::{Label, LabelGenerator, LabelKind};
pub use stack::max_stack_depth;

use gen::Generator;
use tracing::info;

/// Translates an analysed program into one Jasmin listing per class, main
/// class first. Labels are unique across the whole result.
pub fn codegen(ast: &Ast, analysis: &Analysis) -> Result<Vec<JasminClass>> {
    let mut generator = Generator::new(ast, analysis);
    let mut classes = vec![generator.gen_main_class(&ast.main_class)?];
    for class in &ast.classes {
        classes.push(generator.gen_class(class)?);
    }
    info!(classes = classes.len(), "generated jasmin listings");
    Ok(classes)
}
