
mod scope_table;
mod semanalysis_error;
mod symbol_resolution;
mod type_resolution;
mod types;

use crate::ast::Ast;

pub use scope_table::{
    Bindings, ClassScope, MethodScope, ScopeId, ScopeKind, ScopeTable, Variable, OFFSET_FIELD,
    OFFSET_THIS,
};
pub use semanalysis_error::{NameKind, Result, ScopeLevel, SemanticError};
pub use symbol_resolution::{resolve_symbols, MAIN_METHOD};
pub use type_resolution::{resolve_types, TypeTable};
pub use types::Type;

/// Results of the two analysis passes, read-only from here on.
#[derive(Debug)]
pub struct Analysis {
    pub scopes: ScopeTable,
    pub types: TypeTable,
}

// The order must be: resolve_symbols > resolve_types
pub fn analyze(ast: &Ast) -> Result<Analysis> {
    let scopes = resolve_symbols(ast)?;
    let types = resolve_types(ast, &scopes)?;
    Ok(Analysis { scopes, types })
}
