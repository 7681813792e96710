use super::descriptor::{method_descriptor, type_descriptor};
use super::jasmin_ast::*;
use super::labels::{Label, LabelGenerator, LabelKind};
use super::stack::max_stack_depth;
use crate::ast::*;
use crate::semantic_analysis::{
    Analysis, NameKind, Result, ScopeId, ScopeTable, SemanticError, Type, TypeTable, Variable,
    MAIN_METHOD,
};

use tracing::debug;

const SYSTEM_OUT: &str = "java/lang/System";
const PRINT_STREAM: &str = "java/io/PrintStream";

fn constructor(superclass: &str) -> JasminMethod {
    let body = vec![
        Instruction::Load(Family::Reference, 0),
        Instruction::InvokeSpecial(MemberRef::new(superclass, CONSTRUCTOR, "()V".into())),
        Instruction::Return(None),
    ];
    JasminMethod {
        name: CONSTRUCTOR.to_owned(),
        descriptor: "()V".to_owned(),
        is_static: false,
        limits: None,
        body,
    }
}

fn print_descriptor(ty: &Type) -> Result<String> {
    let arg = match ty {
        Type::Int | Type::Boolean => type_descriptor(ty),
        Type::Void => return Err(SemanticError::UnsupportedType(ty.clone())),
        _ => format!("L{OBJECT_CLASS};"),
    };
    Ok(format!("({arg})V"))
}

/// Frame slot of a formal or local. Fields and offsets past the JVM's
/// 16-bit local index have no slot.
pub(super) fn slot(var: &Variable) -> Result<u16> {
    u16::try_from(var.offset).map_err(|_| SemanticError::SlotOutOfRange {
        name: var.name.clone(),
        offset: var.offset,
    })
}

pub(super) struct Generator<'a> {
    ast: &'a Ast,
    scopes: &'a ScopeTable,
    types: &'a TypeTable,
    labels: LabelGenerator,
    current: ScopeId,
    body: Instructions,
}

impl<'a> Generator<'a> {
    pub(super) fn new(ast: &'a Ast, analysis: &'a Analysis) -> Self {
        Self {
            ast,
            scopes: &analysis.scopes,
            types: &analysis.types,
            labels: LabelGenerator::new(),
            current: ScopeId::PROGRAM,
            body: Instructions::new(),
        }
    }

    fn emit(&mut self, inst: Instruction) {
        self.body.push(inst);
    }

    fn new_label(&mut self, kind: LabelKind) -> Label {
        self.labels.new_label(kind)
    }

    fn finish_method(
        &mut self,
        name: &str,
        descriptor: String,
        is_static: bool,
        locals: usize,
    ) -> Result<JasminMethod> {
        let body = std::mem::take(&mut self.body);
        let stack = max_stack_depth(&body)?;
        Ok(JasminMethod {
            name: name.to_owned(),
            descriptor,
            is_static,
            limits: Some(FrameLimits { stack, locals }),
            body,
        })
    }

    pub(super) fn gen_main_class(&mut self, main: &MainClass) -> Result<JasminClass> {
        debug!(class = %main.name, "generating main class");
        let scopes = self.scopes;
        self.current = scopes.method_id(&main.name, MAIN_METHOD)?;
        let scope = scopes.method(self.current)?;

        self.gen_statement(main.body)?;
        self.emit(Instruction::Return(None));
        let descriptor = method_descriptor(&scope.formal_types, &scope.result);
        let main_method = self.finish_method(MAIN_METHOD, descriptor, true, scope.frame_size())?;

        Ok(JasminClass {
            name: main.name.clone(),
            superclass: OBJECT_CLASS.to_owned(),
            fields: Vec::new(),
            methods: vec![constructor(OBJECT_CLASS), main_method],
        })
    }

    pub(super) fn gen_class(&mut self, class: &ClassDecl) -> Result<JasminClass> {
        debug!(class = %class.name, "generating class");
        let superclass = class
            .superclass
            .clone()
            .unwrap_or_else(|| OBJECT_CLASS.to_owned());

        let fields = class
            .fields
            .iter()
            .map(|field| {
                let ty = self
                    .types
                    .decl_type(field.id)
                    .ok_or_else(|| SemanticError::unresolved(NameKind::Variable, &field.name))?;
                Ok(JasminField {
                    name: field.name.clone(),
                    descriptor: type_descriptor(ty),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut methods = vec![constructor(&superclass)];
        for method in &class.methods {
            methods.push(self.gen_method(&class.name, method)?);
        }

        Ok(JasminClass {
            name: class.name.clone(),
            superclass,
            fields,
            methods,
        })
    }

    fn gen_method(&mut self, class: &str, method: &MethodDecl) -> Result<JasminMethod> {
        debug!(class, method = %method.name, "generating method");
        let scopes = self.scopes;
        self.current = scopes.method_id(class, &method.name)?;
        let scope = scopes.method(self.current)?;

        // Formals and locals already own their slots; only their types are checked.
        for var in scope.formals.iter().chain(scope.locals.iter()) {
            Family::of(&var.ty)?;
        }
        for &statement in &method.body {
            self.gen_statement(statement)?;
        }
        self.gen_exp(method.ret)?;
        self.emit(Instruction::Return(Some(Family::of(&scope.result)?)));

        let descriptor = method_descriptor(&scope.formal_types, &scope.result);
        self.finish_method(&method.name, descriptor, false, scope.frame_size())
    }

    fn field_ref(&self, var: &Variable) -> Result<MemberRef> {
        let class = self.scopes.class_of(self.current)?;
        let class = &self.scopes.class(class)?.name;
        Ok(MemberRef::new(class, &var.name, type_descriptor(&var.ty)))
    }

    fn gen_load(&mut self, name: &str) -> Result<()> {
        let scopes = self.scopes;
        let var = scopes.lookup_variable(self.current, name)?;
        if var.is_field() {
            let field = self.field_ref(var)?;
            self.emit(Instruction::Load(Family::Reference, 0));
            self.emit(Instruction::GetField(field));
        } else {
            let family = Family::of(&var.ty)?;
            self.emit(Instruction::Load(family, slot(var)?));
        }
        Ok(())
    }

    fn gen_statement(&mut self, id: StmtId) -> Result<()> {
        let ast = self.ast;
        match ast.stmt(id) {
            Statement::Block(statements) => {
                for &statement in statements {
                    self.gen_statement(statement)?;
                }
            }
            Statement::If {
                condition,
                then,
                els,
            } => {
                let false_label = self.new_label(LabelKind::False);
                let next_label = self.new_label(LabelKind::Next);
                self.gen_branch(*condition, false, false_label)?;
                self.gen_statement(*then)?;
                self.emit(Instruction::Goto(next_label));
                self.emit(Instruction::Label(false_label));
                self.gen_statement(*els)?;
                self.emit(Instruction::Label(next_label));
            }
            Statement::While { condition, body } => {
                let begin_label = self.new_label(LabelKind::Begin);
                let next_label = self.new_label(LabelKind::Next);
                self.emit(Instruction::Label(begin_label));
                self.gen_branch(*condition, false, next_label)?;
                self.gen_statement(*body)?;
                self.emit(Instruction::Goto(begin_label));
                self.emit(Instruction::Label(next_label));
            }
            Statement::Print(exp) => {
                let types = self.types;
                let descriptor = print_descriptor(types.typed(*exp)?)?;
                let out = MemberRef::new(SYSTEM_OUT, "out", format!("L{PRINT_STREAM};"));
                self.emit(Instruction::GetStatic(out));
                self.gen_exp(*exp)?;
                let println = MemberRef::new(PRINT_STREAM, "println", descriptor);
                self.emit(Instruction::InvokeVirtual(println));
            }
            Statement::Assign { name, value } => {
                let scopes = self.scopes;
                let var = scopes.lookup_variable(self.current, name)?;
                if var.is_field() {
                    let field = self.field_ref(var)?;
                    self.emit(Instruction::Load(Family::Reference, 0));
                    self.gen_exp(*value)?;
                    self.emit(Instruction::PutField(field));
                } else {
                    let family = Family::of(&var.ty)?;
                    let index = slot(var)?;
                    self.gen_exp(*value)?;
                    self.emit(Instruction::Store(family, index));
                }
            }
            Statement::ArrayAssign { name, index, value } => {
                self.gen_load(name)?;
                self.gen_exp(*index)?;
                self.gen_exp(*value)?;
                self.emit(Instruction::ArrayStore(Family::Integer));
            }
        }
        Ok(())
    }

    /// Leaves the value of `id` on top of the operand stack.
    fn gen_exp(&mut self, id: ExpId) -> Result<()> {
        let ast = self.ast;
        match ast.exp(id) {
            Exp::Binary(op, lhs, rhs) if op.is_arithmetic() => {
                self.gen_exp(*lhs)?;
                self.gen_exp(*rhs)?;
                self.emit(match op {
                    BinaryOp::Plus => Instruction::IAdd,
                    BinaryOp::Minus => Instruction::ISub,
                    _ => Instruction::IMul,
                });
            }
            Exp::Binary(..) | Exp::Not(_) => self.gen_boolean_value(id)?,
            Exp::ArrayLookup { array, index } => {
                self.gen_exp(*array)?;
                self.gen_exp(*index)?;
                self.emit(Instruction::ArrayLoad(Family::Integer));
            }
            Exp::ArrayLength(array) => {
                self.gen_exp(*array)?;
                self.emit(Instruction::ArrayLength);
            }
            Exp::Call {
                receiver,
                method,
                args,
            } => {
                self.gen_exp(*receiver)?;
                for &arg in args {
                    self.gen_exp(arg)?;
                }
                let (scopes, types) = (self.scopes, self.types);
                let receiver_ty = types.typed(*receiver)?;
                let class = receiver_ty.class_name().ok_or_else(|| {
                    SemanticError::unresolved(NameKind::Method, &format!("{receiver_ty}.{method}"))
                })?;
                let scope = scopes.lookup_method(class, method)?;
                let descriptor = method_descriptor(&scope.formal_types, &scope.result);
                self.emit(Instruction::InvokeVirtual(MemberRef::new(class, method, descriptor)));
            }
            Exp::IntLiteral(value) => self.emit(Instruction::IntConst(*value)),
            Exp::True => self.emit(Instruction::IntConst(1)),
            Exp::False => self.emit(Instruction::IntConst(0)),
            Exp::Identifier(name) => self.gen_load(name)?,
            Exp::This => self.emit(Instruction::Load(Family::Reference, 0)),
            Exp::NewArray(size) => {
                self.gen_exp(*size)?;
                self.emit(Instruction::NewIntArray);
            }
            Exp::NewObject(class) => {
                let init = MemberRef::new(class, CONSTRUCTOR, "()V".into());
                self.emit(Instruction::New(class.clone()));
                self.emit(Instruction::Dup);
                self.emit(Instruction::InvokeSpecial(init));
            }
        }
        Ok(())
    }

    /// Materialises a condition as `1` or `0`.
    fn gen_boolean_value(&mut self, id: ExpId) -> Result<()> {
        let false_label = self.new_label(LabelKind::False);
        let next_label = self.new_label(LabelKind::Next);
        self.gen_branch(id, false, false_label)?;
        self.emit(Instruction::IntConst(1));
        self.emit(Instruction::Goto(next_label));
        self.emit(Instruction::Label(false_label));
        self.emit(Instruction::IntConst(0));
        self.emit(Instruction::Label(next_label));
        Ok(())
    }

    /// Jumps to `target` when `id` evaluates to `jump_if`, falls through
    /// otherwise. The operand stack is left as it was.
    fn gen_branch(&mut self, id: ExpId, jump_if: bool, target: Label) -> Result<()> {
        let ast = self.ast;
        match ast.exp(id) {
            Exp::Binary(BinaryOp::LessThan, lhs, rhs) => {
                self.gen_exp(*lhs)?;
                self.gen_exp(*rhs)?;
                self.emit(if jump_if {
                    Instruction::IfICmpLt(target)
                } else {
                    Instruction::IfICmpGe(target)
                });
            }
            Exp::Binary(BinaryOp::And, lhs, rhs) => {
                if jump_if {
                    let skip = self.new_label(LabelKind::False);
                    self.gen_branch(*lhs, false, skip)?;
                    self.gen_branch(*rhs, true, target)?;
                    self.emit(Instruction::Label(skip));
                } else {
                    self.gen_branch(*lhs, false, target)?;
                    self.gen_branch(*rhs, false, target)?;
                }
            }
            Exp::Not(exp) => self.gen_branch(*exp, !jump_if, target)?,
            Exp::True if jump_if => self.emit(Instruction::Goto(target)),
            Exp::False if !jump_if => self.emit(Instruction::Goto(target)),
            Exp::True | Exp::False => {}
            _ => {
                self.gen_exp(id)?;
                self.emit(if jump_if {
                    Instruction::IfNe(target)
                } else {
                    Instruction::IfEq(target)
                });
            }
        }
        Ok(())
    }
}
