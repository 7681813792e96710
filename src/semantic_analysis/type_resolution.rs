use super::scope_table::{ScopeId, ScopeTable};
use super::semanalysis_error::{NameKind, Result, SemanticError};
use super::symbol_resolution::MAIN_METHOD;
use super::types::Type;
use crate::ast::*;

use std::collections::HashMap;
use tracing::{debug, trace};

/// Types derived for expressions and declarations, keyed by node id.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TypeTable {
    exps: HashMap<ExpId, Type>,
    decls: HashMap<DeclId, Type>,
}

impl TypeTable {
    pub fn exp_type(&self, id: ExpId) -> Option<&Type> {
        self.exps.get(&id)
    }

    pub fn decl_type(&self, id: DeclId) -> Option<&Type> {
        self.decls.get(&id)
    }

    /// Type of `id`, failing loudly when the expression was never annotated.
    pub fn typed(&self, id: ExpId) -> Result<&Type> {
        self.exp_type(id).ok_or(SemanticError::MissingAnnotation(id))
    }

    pub fn annotated_exps(&self) -> usize {
        self.exps.len()
    }

    pub fn annotated_decls(&self) -> usize {
        self.decls.len()
    }
}

struct TypeResolver<'a> {
    ast: &'a Ast,
    scopes: &'a ScopeTable,
    current: ScopeId,
    types: TypeTable,
}

impl<'a> TypeResolver<'a> {
    fn new(ast: &'a Ast, scopes: &'a ScopeTable) -> Self {
        Self {
            ast,
            scopes,
            current: ScopeId::PROGRAM,
            types: TypeTable::default(),
        }
    }

    fn enter_class_scope(&mut self, name: &str) -> Result<()> {
        debug!(class = name, "typing class");
        self.current = self.scopes.class_id(name)?;
        Ok(())
    }

    fn enter_method_scope(&mut self, name: &str) -> Result<()> {
        let scopes = self.scopes;
        let class = &scopes.class(self.current)?.name;
        self.current = scopes.method_id(class, name)?;
        Ok(())
    }

    fn leave_scope(&mut self) {
        self.current = self.scopes.parent(self.current).unwrap_or(ScopeId::PROGRAM);
    }

    fn set_type(&mut self, id: ExpId, ty: Type) -> Type {
        trace!(exp = ?id, %ty, "typed");
        self.types.exps.insert(id, ty.clone());
        ty
    }

    fn resolve_main_class(&mut self, main: &MainClass) -> Result<()> {
        self.enter_class_scope(&main.name)?;
        self.enter_method_scope(MAIN_METHOD)?;
        self.resolve_statement(main.body)?;
        self.leave_scope();
        self.leave_scope();
        Ok(())
    }

    fn resolve_class(&mut self, class: &ClassDecl) -> Result<()> {
        self.enter_class_scope(&class.name)?;
        for field in &class.fields {
            let ty = self.scopes.lookup_variable(self.current, &field.name)?.ty.clone();
            self.types.decls.insert(field.id, ty);
        }
        for method in &class.methods {
            self.resolve_method(method)?;
        }
        self.leave_scope();
        Ok(())
    }

    fn resolve_method(&mut self, method: &MethodDecl) -> Result<()> {
        self.enter_method_scope(&method.name)?;
        let scopes = self.scopes;
        let scope = scopes.method(self.current)?;
        for formal in &method.formals {
            let ty = scope
                .formals
                .get(&formal.name)
                .map(|var| var.ty.clone())
                .ok_or_else(|| SemanticError::unresolved(NameKind::Variable, &formal.name))?;
            self.types.decls.insert(formal.id, ty);
        }
        for local in &method.locals {
            let ty = scope
                .locals
                .get(&local.name)
                .map(|var| var.ty.clone())
                .ok_or_else(|| SemanticError::unresolved(NameKind::Variable, &local.name))?;
            self.types.decls.insert(local.id, ty);
        }
        for &statement in &method.body {
            self.resolve_statement(statement)?;
        }
        self.resolve_exp(method.ret)?;
        self.leave_scope();
        Ok(())
    }

    fn resolve_statement(&mut self, id: StmtId) -> Result<()> {
        let ast = self.ast;
        match ast.stmt(id) {
            Statement::Block(statements) => {
                for &statement in statements {
                    self.resolve_statement(statement)?;
                }
            }
            Statement::If {
                condition,
                then,
                els,
            } => {
                self.resolve_exp(*condition)?;
                self.resolve_statement(*then)?;
                self.resolve_statement(*els)?;
            }
            Statement::While { condition, body } => {
                self.resolve_exp(*condition)?;
                self.resolve_statement(*body)?;
            }
            Statement::Print(exp) | Statement::Assign { value: exp, .. } => {
                self.resolve_exp(*exp)?;
            }
            Statement::ArrayAssign { index, value, .. } => {
                self.resolve_exp(*index)?;
                self.resolve_exp(*value)?;
            }
        }
        Ok(())
    }

    fn resolve_exp(&mut self, id: ExpId) -> Result<Type> {
        let ast = self.ast;
        let ty = match ast.exp(id) {
            Exp::Binary(op, lhs, rhs) => {
                self.resolve_exp(*lhs)?;
                self.resolve_exp(*rhs)?;
                if op.is_arithmetic() {
                    Type::Int
                } else {
                    Type::Boolean
                }
            }
            Exp::ArrayLookup { array, index } => {
                self.resolve_exp(*array)?;
                self.resolve_exp(*index)?;
                Type::Int
            }
            Exp::ArrayLength(array) => {
                self.resolve_exp(*array)?;
                Type::Int
            }
            Exp::Call {
                receiver,
                method,
                args,
            } => {
                let receiver_ty = self.resolve_exp(*receiver)?;
                for &arg in args {
                    self.resolve_exp(arg)?;
                }
                let class = receiver_ty.class_name().ok_or_else(|| {
                    SemanticError::unresolved(NameKind::Method, &format!("{receiver_ty}.{method}"))
                })?;
                self.scopes.lookup_method(class, method)?.result.clone()
            }
            Exp::IntLiteral(_) => Type::Int,
            Exp::True | Exp::False => Type::Boolean,
            Exp::Identifier(name) => self.scopes.lookup_variable(self.current, name)?.ty.clone(),
            Exp::This => {
                let class = self.scopes.class_of(self.current)?;
                Type::Class(self.scopes.class(class)?.name.clone())
            }
            Exp::NewArray(size) => {
                self.resolve_exp(*size)?;
                Type::IntArray
            }
            Exp::NewObject(class) => Type::Class(class.clone()),
            Exp::Not(exp) => {
                self.resolve_exp(*exp)?;
                Type::Boolean
            }
        };
        Ok(self.set_type(id, ty))
    }
}

/// Second pass: annotates every expression and declaration with its type.
pub fn resolve_types(ast: &Ast, scopes: &ScopeTable) -> Result<TypeTable> {
    let mut resolver = TypeResolver::new(ast, scopes);
    resolver.resolve_main_class(&ast.main_class)?;
    for class in &ast.classes {
        resolver.resolve_class(class)?;
    }
    Ok(resolver.types)
}
