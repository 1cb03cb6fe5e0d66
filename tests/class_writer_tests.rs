mod common;

use classstub::codegen::class_writer::ClassFileWriter;
use classstub::codegen::constpool::{Constant, ConstantPool};
use classstub::codegen::flag::access_flags::*;
use classstub::codegen::insn::ConstantValue;
use classstub::codegen::method::MethodInfo;
use classstub::visitor::{FieldDecl, RecordComponentDecl};
use classstub::{erase_to_bytes, ClassModel, FieldValueEraser, StubConfig};
use common::*;

fn utf8(pool: &ConstantPool, index: u16) -> &str {
    match pool.get(index) {
        Some(Constant::Utf8(value)) => value,
        other => panic!("expected utf8 at {index}, found {other:?}"),
    }
}

fn class_name(pool: &ConstantPool, index: u16) -> &str {
    match pool.get(index) {
        Some(Constant::Class(name_index)) => utf8(pool, *name_index),
        other => panic!("expected class at {index}, found {other:?}"),
    }
}

fn erase_with_writer(model: &ClassModel) -> ClassFileWriter {
    let mut eraser = FieldValueEraser::new(ClassFileWriter::new(), StubConfig::default());
    model.accept(&mut eraser).unwrap();
    eraser.into_inner()
}

fn find_method<'a>(pool: &ConstantPool, methods: &'a [MethodInfo], name: &str, descriptor: &str) -> &'a MethodInfo {
    methods
        .iter()
        .find(|m| utf8(pool, m.name_index) == name && utf8(pool, m.descriptor_index) == descriptor)
        .unwrap_or_else(|| panic!("missing method {name}{descriptor}"))
}

/// (max_stack, max_locals, code) of a method's Code attribute
fn code_of(pool: &ConstantPool, method: &MethodInfo) -> (u16, u16, Vec<u8>) {
    let attr = method.attributes.iter().find(|a| utf8(pool, a.name_index) == "Code").expect("Code attribute");
    let info = &attr.info;
    let max_stack = u16::from_be_bytes([info[0], info[1]]);
    let max_locals = u16::from_be_bytes([info[2], info[3]]);
    let len = u32::from_be_bytes([info[4], info[5], info[6], info[7]]) as usize;
    (max_stack, max_locals, info[8..8 + len].to_vec())
}

fn operand(code: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([code[at], code[at + 1]])
}

#[test]
fn stub_constructor_assembles_to_expected_bytecode() {
    init_logger();
    let mut model = class("p/A", OBJECT);
    model.fields.push(FieldDecl::new(ACC_PRIVATE, "x", "I"));
    model.fields.push(FieldDecl::new(ACC_PRIVATE, "s", "Ljava/lang/String;"));
    model.methods.push(constructor("()V", OBJECT, "()V"));

    let writer = erase_with_writer(&model);
    let class_file = writer.class_file();
    let pool = &class_file.constant_pool;
    let (max_stack, max_locals, code) = code_of(pool, find_method(pool, &class_file.methods, "<init>", "()V"));

    assert_eq!((max_stack, max_locals), (2, 1));
    assert_eq!(code.len(), 22);
    let opcodes = [code[0], code[1], code[4], code[5], code[6], code[9], code[10], code[11], code[14], code[17], code[18], code[21]];
    assert_eq!(opcodes, [0x2a, 0xb7, 0x2a, 0x03, 0xb5, 0x2a, 0x01, 0xb5, 0xbb, 0x59, 0xb7, 0xbf]);
    assert_eq!(class_name(pool, operand(&code, 15)), AME);

    match pool.get(operand(&code, 2)) {
        Some(Constant::MethodRef(class_index, _)) => assert_eq!(class_name(pool, *class_index), OBJECT),
        other => panic!("expected a method ref, found {other:?}"),
    }
}

#[test]
fn canonical_record_constructor_uses_short_loads() {
    let mut model = class("p/Point", "java/lang/Record");
    model.record_components.push(RecordComponentDecl::new("id", "I"));
    model.record_components.push(RecordComponentDecl::new("name", "Ljava/lang/String;"));
    model.fields.push(FieldDecl::new(ACC_FINAL, "id", "I"));
    model.fields.push(FieldDecl::new(ACC_FINAL, "name", "Ljava/lang/String;"));
    model.methods.push(constructor("(ILjava/lang/String;)V", "java/lang/Record", "()V"));

    let writer = erase_with_writer(&model);
    let class_file = writer.class_file();
    let pool = &class_file.constant_pool;
    let (max_stack, max_locals, code) =
        code_of(pool, find_method(pool, &class_file.methods, "<init>", "(ILjava/lang/String;)V"));

    assert_eq!((max_stack, max_locals), (2, 3));
    assert_eq!(code.len(), 15);
    // aload_0 invokespecial aload_0 iload_1 putfield aload_0 aload_2 putfield return
    let opcodes = [code[0], code[1], code[4], code[5], code[6], code[9], code[10], code[11], code[14]];
    assert_eq!(opcodes, [0x2a, 0xb7, 0x2a, 0x1b, 0xb5, 0x2a, 0x2c, 0xb5, 0xb1]);

    for field in &class_file.fields {
        assert_eq!(field.access_flags, ACC_PRIVATE | ACC_FINAL);
    }
    let record = class_file.attributes.iter().find(|a| utf8(pool, a.name_index) == "Record");
    assert_eq!(record.map(|a| operand(&a.info, 0)), Some(2));
}

#[test]
fn static_initializer_comes_before_constructors() {
    let mut model = class("p/A", OBJECT);
    model.fields.push(FieldDecl::new(ACC_STATIC, "ratio", "D"));
    model.fields.push(FieldDecl::new(ACC_STATIC | ACC_FINAL, "MAX", "J").with_value(ConstantValue::Long(1 << 40)));
    model.methods.push(constructor("()V", OBJECT, "()V"));

    let writer = erase_with_writer(&model);
    let class_file = writer.class_file();
    let pool = &class_file.constant_pool;
    let names: Vec<&str> = class_file.methods.iter().map(|m| utf8(pool, m.name_index)).collect();
    assert_eq!(names, vec!["<clinit>", "<init>"]);
    assert_eq!(class_file.methods[0].access_flags, ACC_STATIC);

    let (max_stack, max_locals, code) = code_of(pool, &class_file.methods[0]);
    // dconst_0 putstatic return
    assert_eq!((max_stack, max_locals), (2, 0));
    assert_eq!(code.len(), 5);
    assert_eq!([code[0], code[1], code[4]], [0x0e, 0xb3, 0xb1]);

    let max = class_file.fields.iter().find(|f| utf8(pool, f.name_index) == "MAX").unwrap();
    let value = max.attributes.iter().find(|a| utf8(pool, a.name_index) == "ConstantValue").unwrap();
    assert_eq!(pool.get(operand(&value.info, 0)), Some(&Constant::Long(1 << 40)));
}

#[test]
fn stub_bytes_start_with_class_file_header() {
    let mut model = class("p/A", OBJECT);
    model.methods.push(constructor("()V", OBJECT, "()V"));
    let bytes = erase_to_bytes(&model, &StubConfig::default()).unwrap();
    assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
    assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), 61);
}

#[test]
fn written_file_matches_serialized_bytes() {
    let mut model = class("p/A", OBJECT);
    model.methods.push(constructor("()V", OBJECT, "()V"));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("A.class");

    let writer = erase_with_writer(&model);
    writer.write_to_path(&path).unwrap();
    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk, writer.to_bytes().unwrap());
    assert_eq!(on_disk, erase_to_bytes(&model, &StubConfig::default()).unwrap());
}
