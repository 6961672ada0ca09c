//! Pixel-stage lowering.
//!
//! Inputs are varyings or the `SV_Position`/`SV_IsFrontFace` builtins;
//! outputs must be `SV_Target[0..7]` (→ `layout(location = n) out`) or
//! `SV_Depth` (→ `_SET_GL_FRAG_DEPTH`), anything else is a hard error.

use std::collections::HashSet;

use crate::stream::{ParamStorage, Rewriter, ShaderParam};
use crate::stubs::IoDirection;
use crate::{ConvertError, ShaderStage};

use super::{interface_var, EntryLowering, GlslWriter};

impl Rewriter<'_> {
    pub(crate) fn lower_pixel(
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
        let mut in_location = 0u32;
        let mut used_targets: HashSet<u32> = HashSet::new();

        for p in params {
            prologue.line(&format!("{} {}{};", p.type_text, p.name, p.array_suffix()));
            if matches!(p.storage, ParamStorage::In | ParamStorage::InOut) {
                for (path, leaf) in p.leaves(&p.name) {
                    let sem = self.require_semantic(leaf, &path)?;
                    if let Some(mac) =
                        self.tables
                            .semantic_macro(ShaderStage::Pixel, IoDirection::In, &sem)
                    {
                        prologue.line(&format!("{path} = {};", mac.name));
                    } else {
                        let var = interface_var(&sem);
                        let qualifier = leaf
                            .interpolation
                            .map(|i| i.glsl_qualifier())
                            .unwrap_or("");
                        let location = if self.attribs.use_inout_location_qualifiers {
                            let l = format!("layout(location = {in_location}) ");
                            in_location += 1;
                            l
                        } else {
                            String::new()
                        };
                        globals.line(&format!("{location}{qualifier}in {} {var};", leaf.type_text));
                        prologue.line(&format!("{path} = {var};"));
                    }
                }
            }
            if matches!(p.storage, ParamStorage::Out | ParamStorage::InOut) {
                self.lower_pixel_outputs(p, &p.name, &mut globals, &mut ret_lines, &mut used_targets)?;
            }
        }
        if let Some(r) = ret {
            self.lower_pixel_outputs(r, &r.name, &mut globals, &mut ret_lines, &mut used_targets)?;
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

    fn lower_pixel_outputs(
        &self,
        param: &ShaderParam,
        root: &str,
        globals: &mut GlslWriter,
        ret_lines: &mut Vec<String>,
        used_targets: &mut HashSet<u32>,
    ) -> Result<(), ConvertError> {
        for (path, leaf) in param.leaves(root) {
            let sem = self.require_semantic(leaf, &path)?;
            if let Some(mac) =
                self.tables
                    .semantic_macro(ShaderStage::Pixel, IoDirection::Out, &sem)
            {
                ret_lines.push(format!("{}({path});", mac.name));
                continue;
            }
            let index = parse_target_index(&sem).ok_or_else(|| ConvertError::InvalidSemantic {
                semantic: sem.clone(),
                direction: "output",
                stage: ShaderStage::Pixel,
            })?;
            if !used_targets.insert(index) {
                return Err(ConvertError::LocationConflict {
                    location: index,
                    semantic: sem.clone(),
                });
            }
            let var = interface_var(&sem);
            globals.line(&format!(
                "layout(location = {index}) out {} {var};",
                leaf.type_text
            ));
            ret_lines.push(format!("{var} = {path};"));
        }
        Ok(())
    }
}

/// `sv_target` → 0, `sv_target5` → 5; anything else (or an index outside
/// 0..=7) is rejected.
fn parse_target_index(semantic: &str) -> Option<u32> {
    let rest = semantic.strip_prefix("sv_target")?;
    let index = if rest.is_empty() { 0 } else { rest.parse().ok()? };
    (index <= 7).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::parse_target_index;

    #[test]
    fn target_index_parsing() {
        assert_eq!(parse_target_index("sv_target"), Some(0));
        assert_eq!(parse_target_index("sv_target0"), Some(0));
        assert_eq!(parse_target_index("sv_target7"), Some(7));
        assert_eq!(parse_target_index("sv_target8"), None);
        assert_eq!(parse_target_index("sv_depth"), None);
        assert_eq!(parse_target_index("color"), None);
    }
}
