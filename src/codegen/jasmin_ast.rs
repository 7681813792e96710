use super::labels::Label;
use crate::ast::Identifier;
use crate::semantic_analysis::{Result, SemanticError, Type};

pub const OBJECT_CLASS: &str = "java/lang/Object";
pub const STRING_CLASS: &str = "java/lang/String";
pub const CONSTRUCTOR: &str = "<init>";

pub type Instructions = Vec<Instruction>;

/// One assembler unit: everything emitted for a single source class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JasminClass {
    pub name: Identifier,
    pub superclass: Identifier,
    pub fields: Vec<JasminField>,
    pub methods: Vec<JasminMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JasminField {
    pub name: Identifier,
    pub descriptor: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JasminMethod {
    pub name: Identifier,
    pub descriptor: String,
    pub is_static: bool,
    /// `None` leaves both limits to the assembler defaults.
    pub limits: Option<FrameLimits>,
    pub body: Instructions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    pub stack: usize,
    pub locals: usize,
}

/// Opcode family of load, store and return instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Integer,
    Reference,
}

impl Family {
    pub fn of(ty: &Type) -> Result<Self> {
        match ty {
            Type::Int | Type::Boolean => Ok(Self::Integer),
            Type::IntArray | Type::StringArray | Type::Class(_) => Ok(Self::Reference),
            Type::Void => Err(SemanticError::UnsupportedType(ty.clone())),
        }
    }

    pub fn prefix(self) -> char {
        match self {
            Self::Integer => 'i',
            Self::Reference => 'a',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub class: Identifier,
    pub name: Identifier,
    pub descriptor: String,
}

impl MemberRef {
    pub fn new(class: &str, name: &str, descriptor: String) -> Self {
        Self {
            class: class.to_owned(),
            name: name.to_owned(),
            descriptor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Load(Family, u16),
    Store(Family, u16),
    IntConst(i32),
    ArrayLoad(Family),
    ArrayStore(Family),
    ArrayLength,
    NewIntArray,
    New(Identifier),
    Dup,
    IAdd,
    ISub,
    IMul,
    GetField(MemberRef),
    PutField(MemberRef),
    GetStatic(MemberRef),
    InvokeVirtual(MemberRef),
    InvokeSpecial(MemberRef),
    Goto(Label),
    IfEq(Label),
    IfNe(Label),
    IfICmpLt(Label),
    IfICmpGe(Label),
    Label(Label),
    Return(Option<Family>),
}

impl Instruction {
    pub fn is_label(&self) -> bool {
        matches!(self, Self::Label(_))
    }

    /// Target of a conditional or unconditional jump.
    pub fn jump_target(&self) -> Option<Label> {
        match self {
            Self::Goto(label)
            | Self::IfEq(label)
            | Self::IfNe(label)
            | Self::IfICmpLt(label)
            | Self::IfICmpGe(label) => Some(*label),
            _ => None,
        }
    }

    /// Control never falls through to the next instruction.
    pub fn ends_flow(&self) -> bool {
        matches!(self, Self::Goto(_) | Self::Return(_))
    }
}
