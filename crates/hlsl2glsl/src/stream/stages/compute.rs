//! Compute-stage lowering.
//!
//! `[numthreads(x,y,z)]` is required and becomes the `local_size` layout;
//! inputs are restricted to the compute builtin semantics and outputs (or a
//! non-void return) are rejected outright.

use crate::stream::{ParamStorage, Rewriter, ShaderParam};
use crate::stubs::IoDirection;
use crate::{ConvertError, ShaderStage};

use super::{EntryLowering, GlslWriter};

impl Rewriter<'_> {
    pub(crate) fn lower_compute(
        &mut self,
        f: usize,
        params: &[ShaderParam],
        ret: Option<&ShaderParam>,
    ) -> Result<(), ConvertError> {
        let attrs = self.entry_attributes(f);

        let numthreads = attrs
            .iter()
            .find(|a| a.name == "numthreads")
            .filter(|a| a.args.len() == 3)
            .ok_or(ConvertError::MissingAttribute { name: "numthreads" })?;
        let (x, y, z) = (
            numthreads.args[0].clone(),
            numthreads.args[1].clone(),
            numthreads.args[2].clone(),
        );
        if [&x, &y, &z]
            .iter()
            .any(|v| v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(ConvertError::MissingAttribute { name: "numthreads" });
        }

        if ret.is_some() {
            return Err(ConvertError::InvalidSemantic {
                semantic: ret
                    .and_then(|r| r.semantic.clone())
                    .unwrap_or_else(|| "<return value>".to_string()),
                direction: "output",
                stage: ShaderStage::Compute,
            });
        }

        let mut globals = GlslWriter::new();
        globals.line(&format!(
            "layout(local_size_x = {x}, local_size_y = {y}, local_size_z = {z}) in;"
        ));
        globals.line("");

        let mut prologue = GlslWriter::new();
        prologue.indent();
        for p in params {
            if !matches!(p.storage, ParamStorage::In) {
                return Err(ConvertError::InvalidSemantic {
                    semantic: p.semantic.clone().unwrap_or_else(|| p.name.clone()),
                    direction: "output",
                    stage: ShaderStage::Compute,
                });
            }
            prologue.line(&format!("{} {}{};", p.type_text, p.name, p.array_suffix()));
            for (path, leaf) in p.leaves(&p.name) {
                let sem = self.require_semantic(leaf, &path)?;
                let mac = self
                    .tables
                    .semantic_macro(ShaderStage::Compute, IoDirection::In, &sem)
                    .ok_or_else(|| ConvertError::InvalidSemantic {
                        semantic: sem.clone(),
                        direction: "input",
                        stage: ShaderStage::Compute,
                    })?;
                prologue.line(&format!("{path} = {};", mac.name));
            }
        }

        self.delete_attributes(&attrs);
        self.finish_entry(
            f,
            EntryLowering {
                globals: globals.finish(),
                prologue: prologue.finish(),
                ret_macro: None,
                append_return: false,
            },
        )
    }
}
