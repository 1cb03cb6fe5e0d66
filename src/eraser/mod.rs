//! Field value eraser: turns a streamed class into a stub class
//!
//! The eraser sits in a visitor chain in front of a downstream visitor. While
//! the class streams through it classifies fields, remembers constructors and
//! the delegation call each one starts with, and drops the original static
//! initializer. At the end of the class it synthesizes a fresh `<clinit>` and a
//! replacement body for every constructor, then hands them downstream.
//!
//! Every method other than `<clinit>` and `<init>` passes through untouched.

pub mod clinit;
pub mod init;
pub mod state;

pub use clinit::synthesize_static_initializer;
pub use init::{synthesize_constructor, ConstructorShape, SynthesizedConstructor};
pub use state::{ClassContext, ConstructorRecord, DelegationCall, FieldBucket, TransformState};

use crate::codegen::error::DescriptorError;
use crate::codegen::flag::make_private;
use crate::codegen::insn::Insn;
use crate::codegen::opcodes::INVOKESPECIAL;
use crate::config::StubConfig;
use crate::error::{Error, Result};
use crate::verify::{verify_body, BodyContext};
use crate::visitor::{
    emit_method, BodyHandling, ClassHeader, ClassVisitor, FieldDecl, MethodDecl, MethodModel, RecordComponentDecl,
};

/// Input that makes stub synthesis impossible
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StubError {
    #[error("Constructor {descriptor} has no delegation call")]
    MissingDelegationCall { descriptor: String },
    #[error("Enum constant {field} needs a constructor but the class declares none")]
    MissingEnumConstructor { field: String },
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// Where the instructions of the method currently streaming go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenBody {
    /// Passed through to the downstream visitor
    Forwarding,
    /// Offered to the capture list of the last registered constructor
    Capturing,
    /// Dropped
    Suppressed,
}

pub struct FieldValueEraser<D: ClassVisitor> {
    downstream: D,
    config: StubConfig,
    state: Option<TransformState>,
    open: Option<OpenBody>,
}

impl<D: ClassVisitor> FieldValueEraser<D> {
    pub fn new(downstream: D, config: StubConfig) -> Self {
        Self { downstream, config, state: None, open: None }
    }

    pub fn config(&self) -> &StubConfig {
        &self.config
    }

    pub fn downstream(&self) -> &D {
        &self.downstream
    }

    pub fn into_inner(self) -> D {
        self.downstream
    }

    fn state_mut(&mut self) -> Result<&mut TransformState> {
        self.state.as_mut().ok_or_else(|| Error::protocol("declaration visited before the class header"))
    }

    /// Build and, if enabled, verify every replacement body. Nothing reaches the
    /// downstream visitor until all of them succeed.
    fn synthesize(&self, state: &TransformState) -> Result<Vec<MethodModel>> {
        let mut methods = Vec::with_capacity(state.constructors.len() + 1);
        methods.push(synthesize_static_initializer(state)?);
        for ctor in &state.constructors {
            let synthesized = synthesize_constructor(state, ctor, &self.config.not_implemented_class)?;
            methods.push(synthesized.method);
        }

        if self.config.verify_output {
            for method in &methods {
                let ctx = BodyContext {
                    class_name: &state.context.name,
                    super_name: state.context.super_name.as_deref(),
                    method: &method.decl,
                    instance_fields: &state.instance_fields,
                };
                verify_body(ctx, &method.insns)
                    .map_err(|err| Error::verify(format!("{}{}", method.decl.name, method.decl.descriptor), err))?;
            }
        }
        Ok(methods)
    }
}

impl<D: ClassVisitor> ClassVisitor for FieldValueEraser<D> {
    fn visit_header(&mut self, header: &ClassHeader) -> Result<()> {
        log::debug!("erasing {} (record: {})", header.name, header.is_record());
        self.state = Some(TransformState::new(header));
        self.open = None;
        self.downstream.visit_header(header)
    }

    fn visit_record_component(&mut self, component: &RecordComponentDecl) -> Result<()> {
        self.state_mut()?.add_record_component(component);
        self.downstream.visit_record_component(component)
    }

    fn visit_field(&mut self, field: &FieldDecl) -> Result<()> {
        let privatize = self.config.privatize_record_fields;
        let state = self.state_mut()?;
        let bucket = state.classify_field(field);
        log::trace!("{}.{} -> {:?}", state.context.name, field.name, bucket);

        if bucket == FieldBucket::Instance && state.context.is_record && privatize {
            let mut field = field.clone();
            field.access_flags = make_private(field.access_flags);
            return self.downstream.visit_field(&field);
        }
        self.downstream.visit_field(field)
    }

    fn visit_method(&mut self, method: &MethodDecl) -> Result<BodyHandling> {
        if self.open.is_some() {
            return Err(Error::protocol(format!("method {}{} opened inside another method", method.name, method.descriptor)));
        }
        let state = self.state_mut()?;
        if method.is_static_initializer() {
            self.open = Some(OpenBody::Suppressed);
            return Ok(BodyHandling::Skip);
        }
        if method.is_constructor() {
            state.add_constructor(method);
            self.open = Some(OpenBody::Capturing);
            return Ok(BodyHandling::Intercept(INVOKESPECIAL));
        }
        let handling = self.downstream.visit_method(method)?;
        self.open = Some(OpenBody::Forwarding);
        Ok(handling)
    }

    fn visit_insn(&mut self, insn: &Insn) -> Result<()> {
        match self.open {
            Some(OpenBody::Forwarding) => self.downstream.visit_insn(insn),
            Some(OpenBody::Capturing) => {
                if let Some(ctor) = self.state_mut()?.constructors.last_mut() {
                    ctor.invoke_specials.offer(insn);
                }
                Ok(())
            }
            Some(OpenBody::Suppressed) => Ok(()),
            None => Err(Error::protocol("instruction outside of a method body")),
        }
    }

    fn visit_method_end(&mut self) -> Result<()> {
        match self.open.take() {
            Some(OpenBody::Forwarding) => self.downstream.visit_method_end(),
            Some(_) => Ok(()),
            None => Err(Error::protocol("visit_method_end without an open method")),
        }
    }

    fn visit_end(&mut self) -> Result<()> {
        if self.open.is_some() {
            return Err(Error::protocol("class ended inside a method body"));
        }
        let state = self.state.take().ok_or_else(|| Error::protocol("class ended before its header"))?;
        let methods = self.synthesize(&state)?;
        log::debug!(
            "{}: {} static defaults, {} enum constants, {} constructors",
            state.context.name,
            state.no_value_statics.len(),
            state.enum_constants.len(),
            state.constructors.len()
        );
        for method in &methods {
            emit_method(&mut self.downstream, &method.decl, &method.insns)?;
        }
        self.downstream.visit_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::flag::access_flags::*;
    use crate::codegen::opcodes::*;
    use crate::visitor::{ClassModel, ClassRecorder};

    fn run(model: &ClassModel, config: StubConfig) -> Result<ClassModel> {
        let mut eraser = FieldValueEraser::new(ClassRecorder::new(), config);
        model.accept(&mut eraser)?;
        eraser.into_inner().finish()
    }

    fn object_init() -> Insn {
        Insn::method(INVOKESPECIAL, "java/lang/Object", "<init>", "()V", false)
    }

    #[test]
    fn regular_methods_pass_through() {
        let mut model = ClassModel::new(ClassHeader::new(ACC_PUBLIC, "p/A", "java/lang/Object"));
        let body = vec![Insn::Simple(ICONST_1), Insn::Simple(IRETURN)];
        model.methods.push(MethodModel::new(MethodDecl::new(ACC_PUBLIC, "one", "()I"), body.clone()));
        let out = run(&model, StubConfig::default()).unwrap();
        assert_eq!(out.method("one", "()I").unwrap().insns, body);
        // the synthesized initializer is always added
        assert!(out.method("<clinit>", "()V").is_some());
    }

    #[test]
    fn original_static_initializer_is_replaced() {
        let mut model = ClassModel::new(ClassHeader::new(ACC_PUBLIC, "p/A", "java/lang/Object"));
        model.fields.push(FieldDecl::new(ACC_STATIC, "n", "I"));
        model.methods.push(MethodModel::new(
            MethodDecl::new(ACC_STATIC, "<clinit>", "()V"),
            vec![Insn::Int { op: BIPUSH, operand: 42 }, Insn::field(PUTSTATIC, "p/A", "n", "I"), Insn::Simple(RETURN)],
        ));
        let out = run(&model, StubConfig::default()).unwrap();
        let clinits: Vec<_> = out.methods.iter().filter(|m| m.decl.is_static_initializer()).collect();
        assert_eq!(clinits.len(), 1);
        assert_eq!(clinits[0].insns[0], Insn::Simple(ICONST_0));
    }

    #[test]
    fn record_fields_become_private() {
        let mut model = ClassModel::new(ClassHeader::new(ACC_FINAL, "p/R", "java/lang/Record"));
        model.fields.push(FieldDecl::new(ACC_PUBLIC | ACC_FINAL, "id", "I"));
        model.fields.push(FieldDecl::new(ACC_PUBLIC | ACC_STATIC, "COUNT", "I"));
        let out = run(&model, StubConfig::default()).unwrap();
        assert_eq!(out.field("id").unwrap().access_flags, ACC_PRIVATE | ACC_FINAL);
        assert_eq!(out.field("COUNT").unwrap().access_flags, ACC_PUBLIC | ACC_STATIC);

        let out = run(&model, StubConfig::default().with_privatize_record_fields(false)).unwrap();
        assert_eq!(out.field("id").unwrap().access_flags, ACC_PUBLIC | ACC_FINAL);
    }

    #[test]
    fn missing_delegation_aborts_before_any_end_of_class_output() {
        let mut model = ClassModel::new(ClassHeader::new(ACC_PUBLIC, "p/A", "java/lang/Object"));
        model.methods.push(MethodModel::new(MethodDecl::constructor(ACC_PUBLIC, "()V"), vec![Insn::Simple(RETURN)]));
        let mut recorder = ClassRecorder::new();
        let mut eraser = FieldValueEraser::new(&mut recorder, StubConfig::default());
        let err = model.accept(&mut eraser).unwrap_err();
        assert!(matches!(err, Error::Stub(StubError::MissingDelegationCall { .. })));
        assert!(recorder.finish().is_err());
    }

    #[test]
    fn verifier_rejects_an_unrelated_delegation_target() {
        let mut model = ClassModel::new(ClassHeader::new(ACC_PUBLIC, "p/A", "java/lang/Object"));
        model.methods.push(MethodModel::new(
            MethodDecl::constructor(ACC_PUBLIC, "()V"),
            vec![Insn::method(INVOKESPECIAL, "java/util/ArrayList", "<init>", "()V", false)],
        ));
        let err = run(&model, StubConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Verify { ref method, .. } if method == "<init>()V"));
        assert!(run(&model, StubConfig::default().with_verify_output(false)).is_ok());
    }

    #[test]
    fn constructors_keep_their_declarations() {
        let mut model = ClassModel::new(ClassHeader::new(ACC_PUBLIC, "p/A", "java/lang/Object"));
        let mut decl = MethodDecl::constructor(ACC_PROTECTED, "()V");
        decl.exceptions.push("java/io/IOException".into());
        model.methods.push(MethodModel::new(decl.clone(), vec![Insn::Var { op: ALOAD, slot: 0 }, object_init(), Insn::Simple(RETURN)]));
        let out = run(&model, StubConfig::default()).unwrap();
        assert_eq!(out.constructors().next().unwrap().decl, decl);
    }

    #[test]
    fn insn_before_header_is_a_protocol_error() {
        let mut eraser = FieldValueEraser::new(ClassRecorder::new(), StubConfig::default());
        assert!(matches!(eraser.visit_field(&FieldDecl::new(0, "x", "I")), Err(Error::Protocol { .. })));
        assert!(matches!(eraser.visit_insn(&Insn::Simple(RETURN)), Err(Error::Protocol { .. })));
    }
}
