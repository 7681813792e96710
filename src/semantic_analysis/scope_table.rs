//! Program, class and method scopes.
//!
//! Scopes live in one arena owned by [`ScopeTable`]. Each scope remembers the
//! id of its parent, so passes move between levels by switching ids and
//! nothing is freed before the whole table is dropped.

use super::semanalysis_error::{NameKind, Result, ScopeLevel, SemanticError};
use super::types::Type;
use crate::ast::Identifier;

use std::collections::HashMap;
use std::fmt;

/// Offset recorded for fields. Fields are accessed by name, never by slot.
pub const OFFSET_FIELD: i32 = -1;

/// Slot of the receiver in every method frame.
pub const OFFSET_THIS: i32 = 0;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const PROGRAM: Self = Self(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: Identifier,
    pub ty: Type,
    pub offset: i32,
}

impl Variable {
    pub fn is_field(&self) -> bool {
        self.offset == OFFSET_FIELD
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{} ({})", self.name, self.ty, self.offset)
    }
}

/// Name to variable mapping that remembers declaration order.
#[derive(Debug, Default, Clone)]
pub struct Bindings {
    entries: Vec<Variable>,
    index: HashMap<Identifier, usize>,
}

impl Bindings {
    fn insert(&mut self, var: Variable) {
        if let Some(&pos) = self.index.get(&var.name) {
            self.entries[pos] = var;
        } else {
            self.index.insert(var.name.clone(), self.entries.len());
            self.entries.push(var);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&pos| &self.entries[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ProgramScope {
    classes: HashMap<Identifier, ScopeId>,
    order: Vec<ScopeId>,
}

#[derive(Debug)]
pub struct ClassScope {
    pub name: Identifier,
    pub superclass: Option<Identifier>,
    pub fields: Bindings,
    methods: HashMap<Identifier, ScopeId>,
    method_order: Vec<ScopeId>,
}

#[derive(Debug)]
pub struct MethodScope {
    pub name: Identifier,
    /// Formal types in call order, the input of descriptor construction.
    pub formal_types: Vec<Type>,
    pub formals: Bindings,
    pub locals: Bindings,
    pub result: Type,
}

impl MethodScope {
    /// Frame size: receiver, formals and locals.
    pub fn frame_size(&self) -> usize {
        self.formals.len() + self.locals.len() + 1
    }
}

#[derive(Debug)]
pub enum ScopeKind {
    Program(ProgramScope),
    Class(ClassScope),
    Method(MethodScope),
}

impl ScopeKind {
    pub fn level(&self) -> ScopeLevel {
        match self {
            Self::Program(_) => ScopeLevel::Program,
            Self::Class(_) => ScopeLevel::Class,
            Self::Method(_) => ScopeLevel::Method,
        }
    }
}

#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
}

#[derive(Debug)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

fn mismatch(expected: ScopeLevel, found: ScopeLevel) -> SemanticError {
    SemanticError::ScopeMismatch { expected, found }
}

impl ScopeTable {
    pub fn new() -> Self {
        let program = Scope {
            parent: None,
            kind: ScopeKind::Program(ProgramScope::default()),
        };
        Self {
            scopes: vec![program],
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn alloc(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(parent),
            kind,
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn level(&self, id: ScopeId) -> ScopeLevel {
        self.scope(id).kind.level()
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scope(id).parent
    }

    fn program(&self) -> &ProgramScope {
        match &self.scopes[0].kind {
            ScopeKind::Program(program) => program,
            _ => unreachable!("scope 0 is always the program scope"),
        }
    }

    fn program_mut(&mut self) -> &mut ProgramScope {
        match &mut self.scopes[0].kind {
            ScopeKind::Program(program) => program,
            _ => unreachable!("scope 0 is always the program scope"),
        }
    }

    pub fn class(&self, id: ScopeId) -> Result<&ClassScope> {
        match &self.scope(id).kind {
            ScopeKind::Class(class) => Ok(class),
            other => Err(mismatch(ScopeLevel::Class, other.level())),
        }
    }

    fn class_mut(&mut self, id: ScopeId) -> Result<&mut ClassScope> {
        match &mut self.scopes[id.index()].kind {
            ScopeKind::Class(class) => Ok(class),
            other => Err(mismatch(ScopeLevel::Class, other.level())),
        }
    }

    pub fn method(&self, id: ScopeId) -> Result<&MethodScope> {
        match &self.scope(id).kind {
            ScopeKind::Method(method) => Ok(method),
            other => Err(mismatch(ScopeLevel::Method, other.level())),
        }
    }

    fn method_mut(&mut self, id: ScopeId) -> Result<&mut MethodScope> {
        match &mut self.scopes[id.index()].kind {
            ScopeKind::Method(method) => Ok(method),
            other => Err(mismatch(ScopeLevel::Method, other.level())),
        }
    }

    /// Returns the scope of class `name`, creating it on first entry.
    pub fn enter_class(&mut self, name: &str) -> ScopeId {
        if let Some(&id) = self.program().classes.get(name) {
            return id;
        }
        let class = ClassScope {
            name: name.to_owned(),
            superclass: None,
            fields: Bindings::default(),
            methods: HashMap::new(),
            method_order: Vec::new(),
        };
        let id = self.alloc(ScopeId::PROGRAM, ScopeKind::Class(class));
        let program = self.program_mut();
        program.classes.insert(name.to_owned(), id);
        program.order.push(id);
        id
    }

    pub fn set_superclass(&mut self, class: ScopeId, superclass: &str) -> Result<()> {
        self.class_mut(class)?.superclass = Some(superclass.to_owned());
        Ok(())
    }

    pub fn enter_method(&mut self, class: ScopeId, name: &str, result: Type) -> Result<ScopeId> {
        if let Some(&id) = self.class(class)?.methods.get(name) {
            return Ok(id);
        }
        let method = MethodScope {
            name: name.to_owned(),
            formal_types: Vec::new(),
            formals: Bindings::default(),
            locals: Bindings::default(),
            result,
        };
        let id = self.alloc(class, ScopeKind::Method(method));
        let class = self.class_mut(class)?;
        class.methods.insert(name.to_owned(), id);
        class.method_order.push(id);
        Ok(id)
    }

    pub fn declare_field(&mut self, class: ScopeId, name: &str, ty: Type) -> Result<()> {
        let var = Variable {
            name: name.to_owned(),
            ty,
            offset: OFFSET_FIELD,
        };
        self.class_mut(class)?.fields.insert(var);
        Ok(())
    }

    pub fn declare_formal(&mut self, method: ScopeId, name: &str, ty: Type, offset: i32) -> Result<()> {
        let method = self.method_mut(method)?;
        method.formal_types.push(ty.clone());
        method.formals.insert(Variable {
            name: name.to_owned(),
            ty,
            offset,
        });
        Ok(())
    }

    pub fn declare_local(&mut self, method: ScopeId, name: &str, ty: Type, offset: i32) -> Result<()> {
        self.method_mut(method)?.locals.insert(Variable {
            name: name.to_owned(),
            ty,
            offset,
        });
        Ok(())
    }

    pub fn class_id(&self, name: &str) -> Result<ScopeId> {
        self.program()
            .classes
            .get(name)
            .copied()
            .ok_or_else(|| SemanticError::unresolved(NameKind::Class, name))
    }

    pub fn lookup_class(&self, name: &str) -> Result<&ClassScope> {
        self.class_id(name).and_then(|id| self.class(id))
    }

    /// Classes in the order they were entered.
    pub fn classes(&self) -> impl Iterator<Item = &ClassScope> {
        self.program()
            .order
            .iter()
            .filter_map(|&id| self.class(id).ok())
    }

    pub fn methods<'a>(&'a self, class: &'a ClassScope) -> impl Iterator<Item = &'a MethodScope> {
        class
            .method_order
            .iter()
            .filter_map(|&id| self.method(id).ok())
    }

    /// Innermost class scope enclosing `scope`, which may be the class itself.
    pub fn class_of(&self, scope: ScopeId) -> Result<ScopeId> {
        let mut current = scope;
        loop {
            match self.level(current) {
                ScopeLevel::Class => return Ok(current),
                ScopeLevel::Method => {
                    current = self
                        .parent(current)
                        .ok_or(mismatch(ScopeLevel::Class, ScopeLevel::Method))?;
                }
                ScopeLevel::Program => return Err(mismatch(ScopeLevel::Class, ScopeLevel::Program)),
            }
        }
    }

    /// Walks `class` and its superclasses. The walk is bounded by the number
    /// of classes, so a cyclic chain ends up unresolved instead of looping.
    fn find_in_hierarchy<'a, T>(
        &'a self,
        class: ScopeId,
        kind: NameKind,
        name: &str,
        find: impl Fn(&'a ClassScope) -> Option<T>,
    ) -> Result<T> {
        let mut current = class;
        for _ in 0..=self.program().order.len() {
            let class = self.class(current)?;
            if let Some(found) = find(class) {
                return Ok(found);
            }
            match &class.superclass {
                Some(superclass) => current = self.class_id(superclass)?,
                None => break,
            }
        }
        Err(SemanticError::unresolved(kind, name))
    }

    fn lookup_field(&self, class: ScopeId, name: &str) -> Result<&Variable> {
        self.find_in_hierarchy(class, NameKind::Variable, name, |class| class.fields.get(name))
    }

    /// Resolves `name` as seen from `scope`: locals, formals, fields of the
    /// enclosing class, then fields of its superclasses. First match wins.
    pub fn lookup_variable(&self, scope: ScopeId, name: &str) -> Result<&Variable> {
        match &self.scope(scope).kind {
            ScopeKind::Method(method) => {
                if let Some(var) = method.locals.get(name).or_else(|| method.formals.get(name)) {
                    return Ok(var);
                }
                let class = self.class_of(scope)?;
                self.lookup_field(class, name)
            }
            ScopeKind::Class(_) => self.lookup_field(scope, name),
            ScopeKind::Program(_) => Err(mismatch(ScopeLevel::Class, ScopeLevel::Program)),
        }
    }

    pub fn method_id(&self, class: &str, name: &str) -> Result<ScopeId> {
        let class = self.class_id(class)?;
        self.find_in_hierarchy(class, NameKind::Method, name, |class| {
            class.methods.get(name).copied()
        })
    }

    /// Method `name` of `class`, inherited methods included.
    pub fn lookup_method(&self, class: &str, name: &str) -> Result<&MethodScope> {
        self.method_id(class, name).and_then(|id| self.method(id))
    }
}

impl fmt::Display for ScopeTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for class in self.classes() {
            writeln!(f, "{}", class.name)?;
            if let Some(superclass) = &class.superclass {
                writeln!(f, " - extends {superclass}")?;
            }
            writeln!(f, " - Global variables")?;
            for field in class.fields.iter() {
                writeln!(f, "      {field}")?;
            }
            writeln!(f, " - Methods")?;
            for method in self.methods(class) {
                let formals = method
                    .formal_types
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(f, "      {} {}({formals});", method.result, method.name)?;
                writeln!(f, "        Formal Parameters")?;
                for formal in method.formals.iter() {
                    writeln!(f, "          {formal}")?;
                }
                writeln!(f, "        Local Variables")?;
                for local in method.locals.iter() {
                    writeln!(f, "          {local}")?;
                }
            }
        }
        Ok(())
    }
}
