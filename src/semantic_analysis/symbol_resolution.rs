use super::scope_table::{ScopeId, ScopeTable, OFFSET_FIELD, OFFSET_THIS};
use super::semanalysis_error::{Result, ScopeLevel, SemanticError};
use super::types::Type;
use crate::ast::*;

use tracing::{debug, trace};

/// Name of the synthetic method holding the main class's statement.
pub const MAIN_METHOD: &str = "main";

struct SymbolResolver {
    table: ScopeTable,
    current: ScopeId,
    // Slot handed to the next formal or local of the current method.
    offset: i32,
}

impl SymbolResolver {
    fn new() -> Self {
        Self {
            table: ScopeTable::new(),
            current: ScopeId::PROGRAM,
            offset: OFFSET_FIELD,
        }
    }

    fn enter_class_scope(&mut self, name: &str) {
        debug!(class = name, "entering class scope");
        self.current = self.table.enter_class(name);
        self.offset = OFFSET_FIELD;
    }

    fn enter_method_scope(&mut self, name: &str, result: Type) -> Result<()> {
        debug!(method = name, "entering method scope");
        self.current = self.table.enter_method(self.current, name, result)?;
        self.offset = OFFSET_THIS + 1;
        Ok(())
    }

    fn leave_scope(&mut self) {
        self.current = self.table.parent(self.current).unwrap_or(ScopeId::PROGRAM);
        self.offset = OFFSET_FIELD;
    }

    fn put_variable(&mut self, name: &str, ty: Type) -> Result<()> {
        match self.table.level(self.current) {
            ScopeLevel::Class => self.table.declare_field(self.current, name, ty),
            ScopeLevel::Method => {
                trace!(local = name, slot = self.offset, "assigning slot");
                self.table.declare_local(self.current, name, ty, self.offset)?;
                self.offset += 1;
                Ok(())
            }
            ScopeLevel::Program => Err(SemanticError::ScopeMismatch {
                expected: ScopeLevel::Class,
                found: ScopeLevel::Program,
            }),
        }
    }

    fn put_formal(&mut self, name: &str, ty: Type) -> Result<()> {
        trace!(formal = name, slot = self.offset, "assigning slot");
        self.table.declare_formal(self.current, name, ty, self.offset)?;
        self.offset += 1;
        Ok(())
    }

    fn resolve_main_class(&mut self, main: &MainClass) -> Result<()> {
        self.enter_class_scope(&main.name);
        self.enter_method_scope(MAIN_METHOD, Type::Void)?;
        self.put_formal(&main.args_name, Type::StringArray)?;
        self.leave_scope();
        self.leave_scope();
        Ok(())
    }

    fn resolve_class(&mut self, class: &ClassDecl) -> Result<()> {
        self.enter_class_scope(&class.name);
        if let Some(superclass) = &class.superclass {
            self.table.set_superclass(self.current, superclass)?;
        }
        for field in &class.fields {
            self.put_variable(&field.name, Type::from(&field.ty))?;
        }
        for method in &class.methods {
            self.resolve_method(method)?;
        }
        self.leave_scope();
        Ok(())
    }

    fn resolve_method(&mut self, method: &MethodDecl) -> Result<()> {
        self.enter_method_scope(&method.name, Type::from(&method.result))?;
        for formal in &method.formals {
            self.put_formal(&formal.name, Type::from(&formal.ty))?;
        }
        for local in &method.locals {
            self.put_variable(&local.name, Type::from(&local.ty))?;
        }
        self.leave_scope();
        Ok(())
    }
}

/// First pass: builds the scope table of the whole program.
pub fn resolve_symbols(ast: &Ast) -> Result<ScopeTable> {
    let mut resolver = SymbolResolver::new();
    resolver.resolve_main_class(&ast.main_class)?;
    for class in &ast.classes {
        resolver.resolve_class(class)?;
    }
    Ok(resolver.table)
}
