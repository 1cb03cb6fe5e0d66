//! In-memory class model: records visitor events and replays them

use super::{BodyHandling, ClassHeader, ClassVisitor, FieldDecl, MethodDecl, RecordComponentDecl};
use crate::codegen::insn::Insn;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct MethodModel {
    pub decl: MethodDecl,
    pub insns: Vec<Insn>,
}

impl MethodModel {
    pub fn new(decl: MethodDecl, insns: Vec<Insn>) -> Self {
        Self { decl, insns }
    }
}

/// A whole class held in memory, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct ClassModel {
    pub header: ClassHeader,
    pub record_components: Vec<RecordComponentDecl>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodModel>,
}

impl ClassModel {
    pub fn new(header: ClassHeader) -> Self {
        Self { header, record_components: Vec::new(), fields: Vec::new(), methods: Vec::new() }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodModel> {
        self.methods.iter().find(|m| m.decl.name == name && m.decl.descriptor == descriptor)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodModel> {
        self.methods.iter().filter(|m| m.decl.is_constructor())
    }

    /// Replay the class as visitor events
    pub fn accept(&self, visitor: &mut dyn ClassVisitor) -> Result<()> {
        visitor.visit_header(&self.header)?;
        for component in &self.record_components {
            visitor.visit_record_component(component)?;
        }
        for field in &self.fields {
            visitor.visit_field(field)?;
        }
        for method in &self.methods {
            super::emit_method(visitor, &method.decl, &method.insns)?;
        }
        visitor.visit_end()
    }
}

/// Visitor that builds a [`ClassModel`] from the events it receives
#[derive(Debug, Default)]
pub struct ClassRecorder {
    model: Option<ClassModel>,
    open: Option<MethodModel>,
    ended: bool,
}

impl ClassRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded class; fails unless a complete class was visited
    pub fn finish(self) -> Result<ClassModel> {
        if !self.ended {
            return Err(Error::protocol("class recording finished before visit_end"));
        }
        self.model.ok_or_else(|| Error::protocol("no class header recorded"))
    }

    fn model_mut(&mut self) -> Result<&mut ClassModel> {
        self.model.as_mut().ok_or_else(|| Error::protocol("declaration visited before the class header"))
    }
}

impl ClassVisitor for ClassRecorder {
    fn visit_header(&mut self, header: &ClassHeader) -> Result<()> {
        self.model = Some(ClassModel::new(header.clone()));
        self.open = None;
        self.ended = false;
        Ok(())
    }

    fn visit_record_component(&mut self, component: &RecordComponentDecl) -> Result<()> {
        self.model_mut()?.record_components.push(component.clone());
        Ok(())
    }

    fn visit_field(&mut self, field: &FieldDecl) -> Result<()> {
        self.model_mut()?.fields.push(field.clone());
        Ok(())
    }

    fn visit_method(&mut self, method: &MethodDecl) -> Result<BodyHandling> {
        self.model_mut()?;
        if let Some(open) = &self.open {
            return Err(Error::protocol(format!("method {}{} was not ended", open.decl.name, open.decl.descriptor)));
        }
        self.open = Some(MethodModel::new(method.clone(), Vec::new()));
        Ok(BodyHandling::Forward)
    }

    fn visit_insn(&mut self, insn: &Insn) -> Result<()> {
        match self.open.as_mut() {
            Some(open) => {
                open.insns.push(insn.clone());
                Ok(())
            }
            None => Err(Error::protocol("instruction outside of a method body")),
        }
    }

    fn visit_method_end(&mut self) -> Result<()> {
        let method = self.open.take().ok_or_else(|| Error::protocol("visit_method_end without an open method"))?;
        self.model_mut()?.methods.push(method);
        Ok(())
    }

    fn visit_end(&mut self) -> Result<()> {
        if self.open.is_some() {
            return Err(Error::protocol("class ended inside a method body"));
        }
        self.model_mut()?;
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::flag::access_flags::*;
    use crate::codegen::opcodes::*;

    fn sample() -> ClassModel {
        let mut model = ClassModel::new(ClassHeader::new(ACC_PUBLIC, "p/A", "java/lang/Object"));
        model.fields.push(FieldDecl::new(ACC_PRIVATE, "x", "I"));
        model.methods.push(MethodModel::new(
            MethodDecl::constructor(ACC_PUBLIC, "()V"),
            vec![
                Insn::Var { op: ALOAD, slot: 0 },
                Insn::method(INVOKESPECIAL, "java/lang/Object", "<init>", "()V", false),
                Insn::Simple(RETURN),
            ],
        ));
        model
    }

    #[test]
    fn replay_into_recorder_reproduces_the_model() {
        let model = sample();
        let mut recorder = ClassRecorder::new();
        model.accept(&mut recorder).unwrap();
        assert_eq!(recorder.finish().unwrap(), model);
    }

    #[test]
    fn unfinished_recording_is_an_error() {
        let mut recorder = ClassRecorder::new();
        recorder.visit_header(&sample().header).unwrap();
        assert!(recorder.finish().is_err());
    }

    #[test]
    fn instructions_need_an_open_method() {
        let mut recorder = ClassRecorder::new();
        recorder.visit_header(&sample().header).unwrap();
        assert!(recorder.visit_insn(&Insn::Simple(RETURN)).is_err());
    }
}
