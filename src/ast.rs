//! Abstract syntax tree handed over by the parser.
//!
//! Expressions and statements are stored in two arenas owned by [`Ast`] and
//! refer to their children by id. Later passes key their side tables on these
//! ids instead of writing annotations into the tree.

pub mod builder;


use serde::{Deserialize, Serialize};
use std::fmt;

pub use builder::AstBuilder;

pub type Identifier = String;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Position of the node in its arena.
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_id!(ExpId);
define_id!(StmtId);
define_id!(DeclId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ast {
    pub main_class: MainClass,
    pub classes: Vec<ClassDecl>,
    pub exps: Vec<Exp>,
    pub stmts: Vec<Statement>,
}

impl Ast {
    /// # Panics
    /// If `id` was not allocated for this tree.
    pub fn exp(&self, id: ExpId) -> &Exp {
        &self.exps[id.index()]
    }

    /// # Panics
    /// If `id` was not allocated for this tree.
    pub fn stmt(&self, id: StmtId) -> &Statement {
        &self.stmts[id.index()]
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn exp_ids(&self) -> impl Iterator<Item = ExpId> {
        (0..self.exps.len() as u32).map(ExpId::from_raw)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn stmt_ids(&self) -> impl Iterator<Item = StmtId> {
        (0..self.stmts.len() as u32).map(StmtId::from_raw)
    }

    fn check_exp(&self, id: ExpId) -> Result<(), AstError> {
        if id.index() < self.exps.len() {
            Ok(())
        } else {
            Err(AstError::DanglingExp(id))
        }
    }

    fn check_stmt(&self, id: StmtId) -> Result<(), AstError> {
        if id.index() < self.stmts.len() {
            Ok(())
        } else {
            Err(AstError::DanglingStmt(id))
        }
    }

    /// Checks that every id refers to an allocated node and that children
    /// precede their parents in each arena, the order [`AstBuilder`]
    /// produces. A tree that passes is finite and acyclic, so the passes can
    /// index it without panicking.
    pub fn validate(&self) -> Result<(), AstError> {
        for parent in self.exp_ids() {
            for child in self.exp(parent).children() {
                if child >= parent {
                    return Err(AstError::ExpOrder { parent, child });
                }
            }
        }
        for parent in self.stmt_ids() {
            let statement = self.stmt(parent);
            for child in statement.child_stmts() {
                if child >= parent {
                    return Err(AstError::StmtOrder { parent, child });
                }
            }
            for exp in statement.exps() {
                self.check_exp(exp)?;
            }
        }

        self.check_stmt(self.main_class.body)?;
        for method in self.classes.iter().flat_map(|class| &class.methods) {
            for &statement in &method.body {
                self.check_stmt(statement)?;
            }
            self.check_exp(method.ret)?;
        }
        Ok(())
    }

    /// Every declaration node of the tree: fields, formals and locals.
    pub fn decl_ids(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.classes.iter().flat_map(|class| {
            let fields = class.fields.iter().map(|f| f.id);
            let members = class.methods.iter().flat_map(|m| {
                m.formals
                    .iter()
                    .map(|f| f.id)
                    .chain(m.locals.iter().map(|l| l.id))
            });
            fields.chain(members)
        })
    }
}

/// The class holding `public static void main(String[] args)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainClass {
    pub name: Identifier,
    pub args_name: Identifier,
    pub body: StmtId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: Identifier,
    pub superclass: Option<Identifier>,
    pub fields: Vec<VarDecl>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDecl {
    pub id: DeclId,
    pub ty: TypeName,
    pub name: Identifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formal {
    pub id: DeclId,
    pub ty: TypeName,
    pub name: Identifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: Identifier,
    pub result: TypeName,
    pub formals: Vec<Formal>,
    pub locals: Vec<VarDecl>,
    pub body: Vec<StmtId>,
    pub ret: ExpId,
}

/// Type as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeName {
    Int,
    Boolean,
    IntArray,
    Class(Identifier),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    Block(Vec<StmtId>),
    If {
        condition: ExpId,
        then: StmtId,
        els: StmtId,
    },
    While {
        condition: ExpId,
        body: StmtId,
    },
    Print(ExpId),
    Assign {
        name: Identifier,
        value: ExpId,
    },
    ArrayAssign {
        name: Identifier,
        index: ExpId,
        value: ExpId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exp {
    Binary(BinaryOp, ExpId, ExpId),
    ArrayLookup {
        array: ExpId,
        index: ExpId,
    },
    ArrayLength(ExpId),
    Call {
        receiver: ExpId,
        method: Identifier,
        args: Vec<ExpId>,
    },
    IntLiteral(i32),
    True,
    False,
    Identifier(Identifier),
    This,
    NewArray(ExpId),
    NewObject(Identifier),
    Not(ExpId),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum BinaryOp {
    And,
    LessThan,
    Plus,
    Minus,
    Times,
}

impl Statement {
    fn child_stmts(&self) -> Vec<StmtId> {
        match self {
            Self::Block(statements) => statements.clone(),
            Self::If { then, els, .. } => vec![*then, *els],
            Self::While { body, .. } => vec![*body],
            Self::Print(_) | Self::Assign { .. } | Self::ArrayAssign { .. } => Vec::new(),
        }
    }

    fn exps(&self) -> Vec<ExpId> {
        match self {
            Self::Block(_) => Vec::new(),
            Self::If { condition, .. } | Self::While { condition, .. } => vec![*condition],
            Self::Print(exp) | Self::Assign { value: exp, .. } => vec![*exp],
            Self::ArrayAssign { index, value, .. } => vec![*index, *value],
        }
    }
}

impl Exp {
    fn children(&self) -> Vec<ExpId> {
        match self {
            Self::Binary(_, lhs, rhs) => vec![*lhs, *rhs],
            Self::ArrayLookup { array, index } => vec![*array, *index],
            Self::ArrayLength(exp) | Self::NewArray(exp) | Self::Not(exp) => vec![*exp],
            Self::Call { receiver, args, .. } => {
                let mut children = vec![*receiver];
                children.extend(args);
                children
            }
            Self::IntLiteral(_)
            | Self::True
            | Self::False
            | Self::Identifier(_)
            | Self::This
            | Self::NewObject(_) => Vec::new(),
        }
    }
}

/// Structural defects of a deserialised tree.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum AstError {
    #[error("expression {0:?} does not exist")]
    DanglingExp(ExpId),
    #[error("statement {0:?} does not exist")]
    DanglingStmt(StmtId),
    #[error("expression {parent:?} refers to {child:?}, which does not precede it")]
    ExpOrder { parent: ExpId, child: ExpId },
    #[error("statement {parent:?} refers to {child:?}, which does not precede it")]
    StmtOrder { parent: StmtId, child: StmtId },
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(self, Self::Plus | Self::Minus | Self::Times)
    }
}
