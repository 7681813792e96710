use super::*;
use crate::ast::*;
use crate::semantic_analysis::{analyze, SemanticError, Type, Variable};
use std::collections::HashSet;

use super::jasmin_ast::Family::{Integer, Reference};

fn compile(ast: &Ast) -> Vec<JasminClass> {
    let analysis = analyze(ast).expect("program should analyse");
    codegen(ast, &analysis).expect("program should compile")
}

fn print_zero(b: &mut AstBuilder) -> MainClass {
    let zero = b.int(0);
    let body = b.print(zero);
    MainClass {
        name: "Main".into(),
        args_name: "args".into(),
        body,
    }
}

fn method(
    name: &str,
    result: TypeName,
    formals: Vec<Formal>,
    locals: Vec<VarDecl>,
    body: Vec<StmtId>,
    ret: ExpId,
) -> MethodDecl {
    MethodDecl {
        name: name.into(),
        result,
        formals,
        locals,
        body,
        ret,
    }
}

fn class(name: &str, superclass: Option<&str>, fields: Vec<VarDecl>, methods: Vec<MethodDecl>) -> ClassDecl {
    ClassDecl {
        name: name.into(),
        superclass: superclass.map(Into::into),
        fields,
        methods,
    }
}

fn find_method<'a>(classes: &'a [JasminClass], class: &str, method: &str) -> &'a JasminMethod {
    classes
        .iter()
        .find(|c| c.name == class)
        .and_then(|c| c.methods.iter().find(|m| m.name == method))
        .expect("method should be generated")
}

fn member(class: &str, name: &str, descriptor: &str) -> MemberRef {
    MemberRef::new(class, name, descriptor.into())
}

// class Point { int x; int get() { return x; } }
fn point() -> Ast {
    let mut b = AstBuilder::new();
    let main = print_zero(&mut b);
    let x = b.var("x", TypeName::Int);
    let ret = b.ident("x");
    let get = method("get", TypeName::Int, vec![], vec![], vec![], ret);
    b.finish(main, vec![class("Point", None, vec![x], vec![get])])
}

#[test]
fn test_field_read_method() {
    let classes = compile(&point());
    let point = &classes[1];

    assert_eq!("java/lang/Object", point.superclass);
    assert_eq!(
        vec![JasminField {
            name: "x".into(),
            descriptor: "I".into()
        }],
        point.fields
    );

    let get = find_method(&classes, "Point", "get");
    let expected = vec![
        Instruction::Load(Reference, 0),
        Instruction::GetField(member("Point", "x", "I")),
        Instruction::Return(Some(Integer)),
    ];
    assert_eq!("()I", get.descriptor);
    assert_eq!(Some(FrameLimits { stack: 1, locals: 1 }), get.limits);
    assert_eq!(expected, get.body);
}

#[test]
fn test_main_class() {
    let classes = compile(&point());
    let main = &classes[0];
    assert_eq!("Main", main.name);
    assert_eq!(OBJECT_CLASS, main.superclass);
    assert!(main.fields.is_empty());

    let ctor = &main.methods[0];
    assert_eq!(CONSTRUCTOR, ctor.name);
    assert_eq!(None, ctor.limits);
    assert_eq!(
        vec![
            Instruction::Load(Reference, 0),
            Instruction::InvokeSpecial(member(OBJECT_CLASS, CONSTRUCTOR, "()V")),
            Instruction::Return(None),
        ],
        ctor.body
    );

    let entry = &main.methods[1];
    assert!(entry.is_static);
    assert_eq!("main", entry.name);
    assert_eq!("([Ljava/lang/String;)V", entry.descriptor);
    assert_eq!(Some(FrameLimits { stack: 2, locals: 2 }), entry.limits);
    assert_eq!(
        vec![
            Instruction::GetStatic(member("java/lang/System", "out", "Ljava/io/PrintStream;")),
            Instruction::IntConst(0),
            Instruction::InvokeVirtual(member("java/io/PrintStream", "println", "(I)V")),
            Instruction::Return(None),
        ],
        entry.body
    );
}

// int count() { int i; i = 0; while (i < 10) { i = i + 1; } return i; }
#[test]
fn test_while_loop_layout() {
    let mut b = AstBuilder::new();
    let main = print_zero(&mut b);
    let i = b.var("i", TypeName::Int);
    let zero = b.int(0);
    let init = b.assign("i", zero);
    let i_ref = b.ident("i");
    let ten = b.int(10);
    let condition = b.binary(BinaryOp::LessThan, i_ref, ten);
    let i_ref = b.ident("i");
    let one = b.int(1);
    let sum = b.binary(BinaryOp::Plus, i_ref, one);
    let step = b.assign("i", sum);
    let body = b.block(vec![step]);
    let lp = b.while_st(condition, body);
    let ret = b.ident("i");
    let count = method("count", TypeName::Int, vec![], vec![i], vec![init, lp], ret);
    let ast = b.finish(main, vec![class("Counter", None, vec![], vec![count])]);

    let classes = compile(&ast);
    let count = find_method(&classes, "Counter", "count");

    let mut labels = LabelGenerator::new();
    let begin = labels.new_label(LabelKind::Begin);
    let next = labels.new_label(LabelKind::Next);
    let expected = vec![
        Instruction::IntConst(0),
        Instruction::Store(Integer, 1),
        Instruction::Label(begin),
        Instruction::Load(Integer, 1),
        Instruction::IntConst(10),
        Instruction::IfICmpGe(next),
        Instruction::Load(Integer, 1),
        Instruction::IntConst(1),
        Instruction::IAdd,
        Instruction::Store(Integer, 1),
        Instruction::Goto(begin),
        Instruction::Label(next),
        Instruction::Load(Integer, 1),
        Instruction::Return(Some(Integer)),
    ];
    assert_eq!(expected, count.body);
    assert_eq!(Some(FrameLimits { stack: 2, locals: 2 }), count.limits);
}

// class C { int m(int a, int b) { return a; } }
// class D extends C { int m(int a, int b) { return b; } }
// class User { int run() { C obj; obj = new D(); return obj.m(1, 2); } }
#[test]
fn test_call_binds_to_static_receiver_class() {
    let mut b = AstBuilder::new();
    let main = print_zero(&mut b);

    let two_ints = |b: &mut AstBuilder| vec![b.formal("a", TypeName::Int), b.formal("b", TypeName::Int)];
    let formals = two_ints(&mut b);
    let ret = b.ident("a");
    let c = class("C", None, vec![], vec![method("m", TypeName::Int, formals, vec![], vec![], ret)]);
    let formals = two_ints(&mut b);
    let ret = b.ident("b");
    let d = class("D", Some("C"), vec![], vec![method("m", TypeName::Int, formals, vec![], vec![], ret)]);

    let obj = b.var("obj", TypeName::Class("C".into()));
    let new_d = b.new_object("D");
    let init = b.assign("obj", new_d);
    let obj_ref = b.ident("obj");
    let one = b.int(1);
    let two = b.int(2);
    let call = b.call(obj_ref, "m", vec![one, two]);
    let run = method("run", TypeName::Int, vec![], vec![obj], vec![init], call);
    let user = class("User", None, vec![], vec![run]);
    let ast = b.finish(main, vec![c, d, user]);

    let classes = compile(&ast);
    assert_eq!("C", classes[2].superclass);
    assert_eq!(
        vec![
            Instruction::Load(Reference, 0),
            Instruction::InvokeSpecial(member("C", CONSTRUCTOR, "()V")),
            Instruction::Return(None),
        ],
        classes[2].methods[0].body
    );

    let run = find_method(&classes, "User", "run");
    let expected = vec![
        Instruction::New("D".into()),
        Instruction::Dup,
        Instruction::InvokeSpecial(member("D", CONSTRUCTOR, "()V")),
        Instruction::Store(Reference, 1),
        Instruction::Load(Reference, 1),
        Instruction::IntConst(1),
        Instruction::IntConst(2),
        Instruction::InvokeVirtual(member("C", "m", "(II)I")),
        Instruction::Return(Some(Integer)),
    ];
    assert_eq!(expected, run.body);
    assert_eq!(Some(FrameLimits { stack: 3, locals: 2 }), run.limits);
}

// class Base { int base() { return 1; } }
// class Derived extends Base { int probe() { return new Derived().base(); } }
#[test]
fn test_inherited_method_call() {
    let mut b = AstBuilder::new();
    let main = print_zero(&mut b);
    let one = b.int(1);
    let base = class("Base", None, vec![], vec![method("base", TypeName::Int, vec![], vec![], vec![], one)]);
    let obj = b.new_object("Derived");
    let call = b.call(obj, "base", vec![]);
    let probe = method("probe", TypeName::Int, vec![], vec![], vec![], call);
    let derived = class("Derived", Some("Base"), vec![], vec![probe]);
    let ast = b.finish(main, vec![base, derived]);

    let classes = compile(&ast);
    let probe = find_method(&classes, "Derived", "probe");
    assert_eq!(
        Some(&Instruction::InvokeVirtual(member("Derived", "base", "()I"))),
        probe.body.iter().find(|inst| matches!(inst, Instruction::InvokeVirtual(_)))
    );
}

// boolean both(boolean a, boolean b) { return a && b; }
#[test]
fn test_conjunction_short_circuits() {
    let mut b = AstBuilder::new();
    let main = print_zero(&mut b);
    let a = b.formal("a", TypeName::Boolean);
    let bb = b.formal("b", TypeName::Boolean);
    let a_ref = b.ident("a");
    let b_ref = b.ident("b");
    let both = b.binary(BinaryOp::And, a_ref, b_ref);
    let m = method("both", TypeName::Boolean, vec![a, bb], vec![], vec![], both);
    let ast = b.finish(main, vec![class("Logic", None, vec![], vec![m])]);

    let classes = compile(&ast);
    let both = find_method(&classes, "Logic", "both");

    let mut labels = LabelGenerator::new();
    let f = labels.new_label(LabelKind::False);
    let next = labels.new_label(LabelKind::Next);
    let expected = vec![
        Instruction::Load(Integer, 1),
        Instruction::IfEq(f),
        Instruction::Load(Integer, 2),
        Instruction::IfEq(f),
        Instruction::IntConst(1),
        Instruction::Goto(next),
        Instruction::Label(f),
        Instruction::IntConst(0),
        Instruction::Label(next),
        Instruction::Return(Some(Integer)),
    ];
    assert_eq!(expected, both.body);
    assert_eq!("(ZZ)Z", both.descriptor);
    assert_eq!(Some(FrameLimits { stack: 1, locals: 3 }), both.limits);
}

// int pick(int a) { int r; if (!(a < 3)) r = 1; else r = 2; return r; }
#[test]
fn test_if_else_with_negated_comparison() {
    let mut b = AstBuilder::new();
    let main = print_zero(&mut b);
    let a = b.formal("a", TypeName::Int);
    let r = b.var("r", TypeName::Int);
    let a_ref = b.ident("a");
    let three = b.int(3);
    let less = b.binary(BinaryOp::LessThan, a_ref, three);
    let condition = b.not(less);
    let one = b.int(1);
    let then = b.assign("r", one);
    let two = b.int(2);
    let els = b.assign("r", two);
    let choice = b.if_st(condition, then, els);
    let ret = b.ident("r");
    let m = method("pick", TypeName::Int, vec![a], vec![r], vec![choice], ret);
    let ast = b.finish(main, vec![class("Chooser", None, vec![], vec![m])]);

    let classes = compile(&ast);
    let pick = find_method(&classes, "Chooser", "pick");

    let mut labels = LabelGenerator::new();
    let f = labels.new_label(LabelKind::False);
    let next = labels.new_label(LabelKind::Next);
    let expected = vec![
        Instruction::Load(Integer, 1),
        Instruction::IntConst(3),
        Instruction::IfICmpLt(f),
        Instruction::IntConst(1),
        Instruction::Store(Integer, 2),
        Instruction::Goto(next),
        Instruction::Label(f),
        Instruction::IntConst(2),
        Instruction::Store(Integer, 2),
        Instruction::Label(next),
        Instruction::Load(Integer, 2),
        Instruction::Return(Some(Integer)),
    ];
    assert_eq!(expected, pick.body);
}

// class Box { int v; int set(int n) { v = n; return v; } }
#[test]
fn test_field_assignment() {
    let mut b = AstBuilder::new();
    let main = print_zero(&mut b);
    let v = b.var("v", TypeName::Int);
    let n = b.formal("n", TypeName::Int);
    let n_ref = b.ident("n");
    let store = b.assign("v", n_ref);
    let ret = b.ident("v");
    let set = method("set", TypeName::Int, vec![n], vec![], vec![store], ret);
    let ast = b.finish(main, vec![class("Box", None, vec![v], vec![set])]);

    let classes = compile(&ast);
    let set = find_method(&classes, "Box", "set");
    let field = member("Box", "v", "I");
    let expected = vec![
        Instruction::Load(Reference, 0),
        Instruction::Load(Integer, 1),
        Instruction::PutField(field.clone()),
        Instruction::Load(Reference, 0),
        Instruction::GetField(field),
        Instruction::Return(Some(Integer)),
    ];
    assert_eq!(expected, set.body);
    assert_eq!(Some(FrameLimits { stack: 2, locals: 2 }), set.limits);
}

// int fill(int n) { int[] a; a = new int[n]; a[0] = 7; return a[0] + a.length; }
#[test]
fn test_array_operations() {
    let mut b = AstBuilder::new();
    let main = print_zero(&mut b);
    let n = b.formal("n", TypeName::Int);
    let a = b.var("a", TypeName::IntArray);
    let n_ref = b.ident("n");
    let alloc = b.new_array(n_ref);
    let init = b.assign("a", alloc);
    let zero = b.int(0);
    let seven = b.int(7);
    let store = b.array_assign("a", zero, seven);
    let a_ref = b.ident("a");
    let zero = b.int(0);
    let lookup = b.array_lookup(a_ref, zero);
    let a_ref = b.ident("a");
    let length = b.array_length(a_ref);
    let sum = b.binary(BinaryOp::Plus, lookup, length);
    let fill = method("fill", TypeName::Int, vec![n], vec![a], vec![init, store], sum);
    let ast = b.finish(main, vec![class("Arrays", None, vec![], vec![fill])]);

    let classes = compile(&ast);
    let fill = find_method(&classes, "Arrays", "fill");
    let expected = vec![
        Instruction::Load(Integer, 1),
        Instruction::NewIntArray,
        Instruction::Store(Reference, 2),
        Instruction::Load(Reference, 2),
        Instruction::IntConst(0),
        Instruction::IntConst(7),
        Instruction::ArrayStore(Integer),
        Instruction::Load(Reference, 2),
        Instruction::IntConst(0),
        Instruction::ArrayLoad(Integer),
        Instruction::Load(Reference, 2),
        Instruction::ArrayLength,
        Instruction::IAdd,
        Instruction::Return(Some(Integer)),
    ];
    assert_eq!(expected, fill.body);
    assert_eq!(Some(FrameLimits { stack: 3, locals: 3 }), fill.limits);
}

// class Factory { Factory make() { return this; } boolean flag() { return false; } }
#[test]
fn test_reference_return_and_print_descriptors() {
    let mut b = AstBuilder::new();
    let obj = b.new_object("Factory");
    let flag = b.call(obj, "flag", vec![]);
    let print_flag = b.print(flag);
    let obj = b.new_object("Factory");
    let made = b.call(obj, "make", vec![]);
    let print_obj = b.print(made);
    let body = b.block(vec![print_flag, print_obj]);
    let main = MainClass {
        name: "Main".into(),
        args_name: "args".into(),
        body,
    };
    let this = b.this();
    let make = method("make", TypeName::Class("Factory".into()), vec![], vec![], vec![], this);
    let no = b.boolean(false);
    let flag = method("flag", TypeName::Boolean, vec![], vec![], vec![], no);
    let ast = b.finish(main, vec![class("Factory", None, vec![], vec![make, flag])]);

    let classes = compile(&ast);
    let make = find_method(&classes, "Factory", "make");
    assert_eq!("()LFactory;", make.descriptor);
    assert_eq!(
        vec![Instruction::Load(Reference, 0), Instruction::Return(Some(Reference))],
        make.body
    );

    let printed: Vec<_> = find_method(&classes, "Main", "main")
        .body
        .iter()
        .filter_map(|inst| match inst {
            Instruction::InvokeVirtual(method) if method.name == "println" => Some(method.descriptor.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(vec!["(Z)V", "(Ljava/lang/Object;)V"], printed);
}

#[test]
fn test_labels_unique_across_classes() {
    let mut b = AstBuilder::new();
    let main = print_zero(&mut b);
    let mut classes = Vec::new();
    for name in ["First", "Second"] {
        let t = b.boolean(true);
        let f = b.boolean(false);
        let both = b.binary(BinaryOp::And, t, f);
        let empty = b.block(vec![]);
        let empty2 = b.block(vec![]);
        let choice = b.if_st(both, empty, empty2);
        let t = b.boolean(true);
        let f = b.boolean(false);
        let ret = b.binary(BinaryOp::And, t, f);
        let m = method("run", TypeName::Boolean, vec![], vec![], vec![choice], ret);
        classes.push(class(name, None, vec![], vec![m]));
    }
    let ast = b.finish(main, classes);

    let classes = compile(&ast);
    let labels: Vec<String> = classes
        .iter()
        .flat_map(|class| &class.methods)
        .flat_map(|method| &method.body)
        .filter_map(|inst| match inst {
            Instruction::Label(label) => Some(label.to_string()),
            _ => None,
        })
        .collect();
    let unique: HashSet<_> = labels.iter().collect();

    assert_eq!(8, labels.len());
    assert_eq!(labels.len(), unique.len());
    assert!(labels.contains(&"L1_FALSE".to_string()));
}

#[test]
fn test_label_names() {
    let mut labels = LabelGenerator::new();
    let names: Vec<String> = [LabelKind::Begin, LabelKind::Next, LabelKind::True, LabelKind::False]
        .into_iter()
        .map(|kind| labels.new_label(kind).to_string())
        .collect();
    assert_eq!(vec!["L1_BEGIN", "L2_NEXT", "L3_TRUE", "L4_FALSE"], names);
    assert_eq!(4, labels.issued());
}

#[test]
fn test_family_selection() {
    assert_eq!(Ok(Integer), Family::of(&Type::Int));
    assert_eq!(Ok(Integer), Family::of(&Type::Boolean));
    assert_eq!(Ok(Reference), Family::of(&Type::IntArray));
    assert_eq!(Ok(Reference), Family::of(&Type::StringArray));
    assert_eq!(Ok(Reference), Family::of(&Type::Class("Point".into())));
    assert_eq!(
        Err(SemanticError::UnsupportedType(Type::Void)),
        Family::of(&Type::Void)
    );
}

#[test]
fn test_stack_depth_merges_branches() {
    let mut labels = LabelGenerator::new();
    let skip = labels.new_label(LabelKind::Next);
    let body = vec![
        Instruction::IntConst(1),
        Instruction::IfEq(skip),
        Instruction::IntConst(2),
        Instruction::IntConst(3),
        Instruction::IAdd,
        Instruction::Store(Integer, 1),
        Instruction::Label(skip),
        Instruction::Return(None),
    ];
    assert_eq!(Ok(2), max_stack_depth(&body));
}

#[test]
fn test_stack_depth_after_unconditional_jump() {
    let mut labels = LabelGenerator::new();
    let f = labels.new_label(LabelKind::False);
    let next = labels.new_label(LabelKind::Next);
    let body = vec![
        Instruction::Load(Integer, 1),
        Instruction::IfEq(f),
        Instruction::IntConst(1),
        Instruction::Goto(next),
        Instruction::Label(f),
        Instruction::IntConst(0),
        Instruction::Label(next),
        Instruction::Return(Some(Integer)),
    ];
    assert_eq!(Ok(1), max_stack_depth(&body));
}

#[test]
fn test_stack_depth_rejects_malformed_descriptor() {
    let body = vec![Instruction::InvokeVirtual(member("C", "m", "(Q)I"))];
    assert_eq!(
        Err(SemanticError::MalformedDescriptor("(Q)I".into())),
        max_stack_depth(&body)
    );
}

#[test]
fn test_slot_range() {
    let var = |offset| Variable {
        name: "v".into(),
        ty: Type::Int,
        offset,
    };
    assert_eq!(Ok(3), super::gen::slot(&var(3)));
    assert_eq!(Ok(u16::MAX), super::gen::slot(&var(i32::from(u16::MAX))));
    assert_eq!(
        Err(SemanticError::SlotOutOfRange {
            name: "v".into(),
            offset: 65_536
        }),
        super::gen::slot(&var(65_536))
    );
    assert_eq!(
        Err(SemanticError::SlotOutOfRange {
            name: "v".into(),
            offset: -1
        }),
        super::gen::slot(&var(-1))
    );
}
