//! Arena-aware construction of [`Ast`] values.

use super::*;

/// Allocates expression and statement nodes and hands out their ids.
#[derive(Debug, Default)]
pub struct AstBuilder {
    exps: Vec<Exp>,
    stmts: Vec<Statement>,
    next_decl: u32,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn exp(&mut self, exp: Exp) -> ExpId {
        let id = ExpId::from_raw(self.exps.len() as u32);
        self.exps.push(exp);
        id
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn stmt(&mut self, statement: Statement) -> StmtId {
        let id = StmtId::from_raw(self.stmts.len() as u32);
        self.stmts.push(statement);
        id
    }

    pub fn decl_id(&mut self) -> DeclId {
        let id = DeclId::from_raw(self.next_decl);
        self.next_decl += 1;
        id
    }

    pub fn var(&mut self, name: &str, ty: TypeName) -> VarDecl {
        VarDecl {
            id: self.decl_id(),
            ty,
            name: name.to_owned(),
        }
    }

    pub fn formal(&mut self, name: &str, ty: TypeName) -> Formal {
        Formal {
            id: self.decl_id(),
            ty,
            name: name.to_owned(),
        }
    }

    pub fn int(&mut self, value: i32) -> ExpId {
        self.exp(Exp::IntLiteral(value))
    }

    pub fn boolean(&mut self, value: bool) -> ExpId {
        self.exp(if value { Exp::True } else { Exp::False })
    }

    pub fn ident(&mut self, name: &str) -> ExpId {
        self.exp(Exp::Identifier(name.to_owned()))
    }

    pub fn this(&mut self) -> ExpId {
        self.exp(Exp::This)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExpId, rhs: ExpId) -> ExpId {
        self.exp(Exp::Binary(op, lhs, rhs))
    }

    pub fn not(&mut self, exp: ExpId) -> ExpId {
        self.exp(Exp::Not(exp))
    }

    pub fn call(&mut self, receiver: ExpId, method: &str, args: Vec<ExpId>) -> ExpId {
        self.exp(Exp::Call {
            receiver,
            method: method.to_owned(),
            args,
        })
    }

    pub fn new_object(&mut self, class: &str) -> ExpId {
        self.exp(Exp::NewObject(class.to_owned()))
    }

    pub fn new_array(&mut self, size: ExpId) -> ExpId {
        self.exp(Exp::NewArray(size))
    }

    pub fn array_lookup(&mut self, array: ExpId, index: ExpId) -> ExpId {
        self.exp(Exp::ArrayLookup { array, index })
    }

    pub fn array_length(&mut self, array: ExpId) -> ExpId {
        self.exp(Exp::ArrayLength(array))
    }

    pub fn block(&mut self, statements: Vec<StmtId>) -> StmtId {
        self.stmt(Statement::Block(statements))
    }

    pub fn if_st(&mut self, condition: ExpId, then: StmtId, els: StmtId) -> StmtId {
        self.stmt(Statement::If {
            condition,
            then,
            els,
        })
    }

    pub fn while_st(&mut self, condition: ExpId, body: StmtId) -> StmtId {
        self.stmt(Statement::While { condition, body })
    }

    pub fn print(&mut self, exp: ExpId) -> StmtId {
        self.stmt(Statement::Print(exp))
    }

    pub fn assign(&mut self, name: &str, value: ExpId) -> StmtId {
        self.stmt(Statement::Assign {
            name: name.to_owned(),
            value,
        })
    }

    pub fn array_assign(&mut self, name: &str, index: ExpId, value: ExpId) -> StmtId {
        self.stmt(Statement::ArrayAssign {
            name: name.to_owned(),
            index,
            value,
        })
    }

    pub fn finish(self, main_class: MainClass, classes: Vec<ClassDecl>) -> Ast {
        Ast {
            main_class,
            classes,
            exps: self.exps,
            stmts: self.stmts,
        }
    }
}
