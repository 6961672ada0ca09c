//! Vertex-stage lowering.
//!
//! Inputs become `layout(location = N) in` attributes (explicit `ATTRIBn`
//! semantics pin the location, everything else auto-increments, collisions
//! are hard errors) or builtin reads; outputs become varyings written by
//! the `_RETURN_` macro, with `SV_Position` routed through
//! `_SET_GL_POSITION`.

use crate::stream::{ParamStorage, Rewriter, ShaderParam};
use crate::stubs::IoDirection;
use crate::{ConvertError, ShaderStage};

use super::{attrib_var, interface_var, EntryLowering, GlslWriter, LocationAllocator};

impl Rewriter<'_> {
    pub(crate) fn lower_vertex(
        &mut self,
        f: usize,
        params: &[ShaderParam],
        ret: Option<&ShaderParam>,
    ) -> Result<(), ConvertError> {
        let attrs = self.entry_attributes(f);
        let mut globals = GlslWriter::new();
        let mut prologue = GlslWriter::new();
        prologue.indent();
        let mut ret_lines: Vec<String> = Vec::new();
        let mut in_locations = LocationAllocator::new();
        let mut out_location = 0u32;

        for p in params {
            prologue.line(&format!("{} {}{};", p.type_text, p.name, p.array_suffix()));
            if matches!(p.storage, ParamStorage::In | ParamStorage::InOut) {
                for (path, leaf) in p.leaves(&p.name) {
                    let sem = self.require_semantic(leaf, &path)?;
                    if let Some(mac) =
                        self.tables
                            .semantic_macro(ShaderStage::Vertex, IoDirection::In, &sem)
                    {
                        prologue.line(&format!("{path} = {};", mac.name));
                    } else {
                        let location = in_locations.assign(&sem)?;
                        let var = attrib_var(&sem);
                        globals.line(&format!(
                            "layout(location = {location}) in {} {var};",
                            leaf.type_text
                        ));
                        prologue.line(&format!("{path} = {var};"));
                    }
                }
            }
            if matches!(p.storage, ParamStorage::Out | ParamStorage::InOut) {
                self.lower_varying_outputs(p, &p.name, &mut globals, &mut ret_lines, &mut out_location)?;
            }
        }
        if let Some(r) = ret {
            self.lower_varying_outputs(r, &r.name, &mut globals, &mut ret_lines, &mut out_location)?;
        }

        let header = if ret.is_some() {
            "_RETURN_(_RET_VAL_)"
        } else {
            "_RETURN_()"
        };
        let mut body = ret_lines;
        body.push("return;".to_string());
        globals.line("");
        globals.macro_def(header, &body);

        self.delete_attributes(&attrs);
        self.finish_entry(
            f,
            EntryLowering {
                globals: globals.finish(),
                prologue: prologue.finish(),
                ret_macro: Some(ret.is_some()),
                append_return: ret.is_none(),
            },
        )
    }

    /// Output lowering shared by the vertex and domain stages: builtin
    /// semantics route through their `_SET_GL_*` macro, everything else
    /// becomes an `out` varying assigned by the `_RETURN_` macro.
    pub(crate) fn lower_varying_outputs(
        &self,
        param: &ShaderParam,
        root: &str,
        globals: &mut GlslWriter,
        ret_lines: &mut Vec<String>,
        out_location: &mut u32,
    ) -> Result<(), ConvertError> {
        let stage = self.attribs.stage;
        for (path, leaf) in param.leaves(root) {
            let sem = self.require_semantic(leaf, &path)?;
            if let Some(mac) = self.tables.semantic_macro(stage, IoDirection::Out, &sem) {
                ret_lines.push(format!("{}({path});", mac.name));
            } else {
                let var = interface_var(&sem);
                let qualifier = leaf
                    .interpolation
                    .map(|i| i.glsl_qualifier())
                    .unwrap_or("");
                let location = if self.attribs.use_inout_location_qualifiers {
                    let l = format!("layout(location = {}) ", out_location);
                    *out_location += 1;
                    l
                } else {
                    String::new()
                };
                globals.line(&format!("{location}{qualifier}out {} {var};", leaf.type_text));
                ret_lines.push(format!("{var} = {path};"));
            }
        }
        Ok(())
    }

    pub(crate) fn require_semantic(
        &self,
        leaf: &ShaderParam,
        path: &str,
    ) -> Result<String, ConvertError> {
        leaf.semantic
            .clone()
            .ok_or_else(|| ConvertError::MissingSemantic {
                parameter: path.to_string(),
                stage: self.attribs.stage,
            })
    }
}
