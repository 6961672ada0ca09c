//! Hull (tessellation control) and domain (tessellation evaluation)
//! lowering.
//!
//! Hull: control-point outputs are written through `gl_InvocationID`
//! indexing; the input patch is filled from `gl_PatchVerticesIn` (the
//! runtime patch size, which may be smaller than the compile-time
//! `InputPatch` size); the patch-constant function is invoked once per
//! patch from an invocation-0 guard inside the `_RETURN_` macro, so every
//! control-point invocation computes the same per-patch values exactly
//! once.
//!
//! Domain: the hull attributes (domain/partitioning/outputtopology) must be
//! recoverable on the domain entry, either as `[attr(..)]` groups or as
//! `/* key = value */` comments preceding the function.

use hlsl_lex::{find_matching_bracket, Keyword, Token, TokenType};

use crate::stream::{ParamStorage, Rewriter, ShaderParam};
use crate::stubs::IoDirection;
use crate::{ConvertError, ShaderStage};

use super::{
    control_point_var, interface_var, patch_constant_var, EntryAttribute, EntryLowering,
    GlslWriter,
};

impl Rewriter<'_> {
    pub(crate) fn lower_hull(
        &mut self,
        f: usize,
        params: &[ShaderParam],
        ret: Option<&ShaderParam>,
    ) -> Result<(), ConvertError> {
        let attrs = self.entry_attributes(f);
        let control_points = attrs
            .iter()
            .find(|a| a.name == "outputcontrolpoints")
            .and_then(|a| a.arg(0))
            .map(str::to_string)
            .ok_or(ConvertError::MissingAttribute {
                name: "outputcontrolpoints",
            })?;
        let pcf_name = attrs
            .iter()
            .find(|a| a.name == "patchconstantfunc")
            .and_then(|a| a.arg(0))
            .map(str::to_string)
            .ok_or(ConvertError::MissingAttribute {
                name: "patchconstantfunc",
            })?;

        let mut globals = GlslWriter::new();
        globals.line(&format!("layout(vertices = {control_points}) out;"));
        globals.line("");
        let mut prologue = GlslWriter::new();
        prologue.indent();
        let mut ret_lines: Vec<String> = Vec::new();
        let mut patch_local: Option<String> = None;

        for p in params {
            if let Some(patch) = &p.patch {
                patch_local = Some(p.name.clone());
                self.fill_patch_array(
                    ShaderStage::Hull,
                    p,
                    &patch.size,
                    &mut globals,
                    &mut prologue,
                )?;
            } else if matches!(p.storage, ParamStorage::In) {
                prologue.line(&format!("{} {}{};", p.type_text, p.name, p.array_suffix()));
                for (path, leaf) in p.leaves(&p.name) {
                    let sem = self.require_semantic(leaf, &path)?;
                    let mac = self
                        .tables
                        .semantic_macro(ShaderStage::Hull, IoDirection::In, &sem)
                        .ok_or_else(|| ConvertError::InvalidSemantic {
                            semantic: sem.clone(),
                            direction: "input",
                            stage: ShaderStage::Hull,
                        })?;
                    prologue.line(&format!("{path} = {};", mac.name));
                }
            } else {
                return Err(ConvertError::InvalidSemantic {
                    semantic: p.semantic.clone().unwrap_or_else(|| p.name.clone()),
                    direction: "output",
                    stage: ShaderStage::Hull,
                });
            }
        }

        // Control-point outputs: per-vertex arrays written through
        // gl_InvocationID.
        if let Some(r) = ret {
            for (path, leaf) in r.leaves(&r.name) {
                let sem = self.require_semantic(leaf, &path)?;
                match self
                    .tables
                    .semantic_macro(ShaderStage::Hull, IoDirection::Out, &sem)
                {
                    Some(mac) if !mac.indexed => ret_lines.push(format!("{}({path});", mac.name)),
                    _ => {
                        let var = control_point_var(&sem);
                        globals.line(&format!("out {} {var}[];", leaf.type_text));
                        ret_lines.push(format!("{var}[gl_InvocationID] = {path};"));
                    }
                }
            }
        }

        // Patch-constant function: located by name anywhere in global
        // scope, lowered, and invoked once per patch.
        let pcf = self
            .functions
            .iter()
            .position(|func| func.name == pcf_name && func.body_open.is_some())
            .ok_or_else(|| ConvertError::PatchConstantFuncNotFound(pcf_name.clone()))?;
        let pcf_params = self.parse_entry_params(pcf)?;
        let pcf_ret = self.parse_return_param(pcf)?;
        self.rewrite_patch_param_types(pcf)?;

        let mut call_args: Vec<String> = Vec::new();
        for pp in &pcf_params {
            if pp.patch.is_some() {
                let local = patch_local.as_ref().ok_or_else(|| {
                    self.malformed(
                        self.functions[pcf].name_id,
                        "patch constant function takes a patch argument but the entry point has no InputPatch parameter",
                    )
                })?;
                call_args.push(local.clone());
            } else {
                let sem = pp.semantic.clone().unwrap_or_default();
                let mac = self
                    .tables
                    .semantic_macro(ShaderStage::Hull, IoDirection::In, &sem)
                    .ok_or_else(|| ConvertError::InvalidSemantic {
                        semantic: sem.clone(),
                        direction: "input",
                        stage: ShaderStage::Hull,
                    })?;
                call_args.push(mac.name.to_string());
            }
        }

        ret_lines.push("if (gl_InvocationID == 0)".to_string());
        ret_lines.push("{".to_string());
        match &pcf_ret {
            Some(r) => {
                ret_lines.push(format!(
                    "    {} _patch_constants = {pcf_name}({});",
                    r.type_text,
                    call_args.join(", ")
                ));
                for (path, leaf) in r.leaves("_patch_constants") {
                    let sem = self.require_semantic(leaf, &path)?;
                    self.lower_patch_constant_output(&sem, &path, leaf, &mut globals, &mut ret_lines)?;
                }
            }
            None => ret_lines.push(format!("    {pcf_name}({});", call_args.join(", "))),
        }
        ret_lines.push("}".to_string());

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

    pub(crate) fn lower_domain(
        &mut self,
        f: usize,
        params: &[ShaderParam],
        ret: Option<&ShaderParam>,
    ) -> Result<(), ConvertError> {
        let attrs = self.entry_attributes(f);
        let comment_attrs = self.comment_attributes(f, &attrs);

        let domain = required_tess_attr(&attrs, &comment_attrs, "domain")?;
        let partitioning = required_tess_attr(&attrs, &comment_attrs, "partitioning")?;
        let topology = required_tess_attr(&attrs, &comment_attrs, "outputtopology")?;

        let glsl_domain = match domain.as_str() {
            "tri" => "triangles",
            "quad" => "quads",
            "isoline" => "isolines",
            _ => return Err(ConvertError::MissingAttribute { name: "domain" }),
        };
        let glsl_spacing = match partitioning.as_str() {
            "integer" | "pow2" => "equal_spacing",
            "fractional_even" => "fractional_even_spacing",
            "fractional_odd" => "fractional_odd_spacing",
            _ => return Err(ConvertError::MissingAttribute { name: "partitioning" }),
        };
        let glsl_order = match topology.as_str() {
            "triangle_cw" => Some("cw"),
            "triangle_ccw" => Some("ccw"),
            "point" => Some("point_mode"),
            "line" => None,
            _ => return Err(ConvertError::MissingAttribute { name: "outputtopology" }),
        };

        let mut globals = GlslWriter::new();
        let order = glsl_order.map(|o| format!(", {o}")).unwrap_or_default();
        globals.line(&format!("layout({glsl_domain}, {glsl_spacing}{order}) in;"));
        globals.line("");
        let mut prologue = GlslWriter::new();
        prologue.indent();
        let mut ret_lines: Vec<String> = Vec::new();
        let mut out_location = 0u32;

        for p in params {
            if let Some(patch) = &p.patch {
                self.fill_patch_array(
                    ShaderStage::Domain,
                    p,
                    &patch.size,
                    &mut globals,
                    &mut prologue,
                )?;
            } else if matches!(p.storage, ParamStorage::In) {
                prologue.line(&format!("{} {}{};", p.type_text, p.name, p.array_suffix()));
                for (path, leaf) in p.leaves(&p.name) {
                    let sem = self.require_semantic(leaf, &path)?;
                    self.lower_domain_input(&sem, &path, leaf, &mut globals, &mut prologue)?;
                }
            } else if matches!(p.storage, ParamStorage::Out | ParamStorage::InOut) {
                prologue.line(&format!("{} {}{};", p.type_text, p.name, p.array_suffix()));
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

    /// Materializes an `InputPatch`/`OutputPatch` parameter as a local
    /// array filled in a runtime loop over `gl_PatchVerticesIn` (the actual
    /// patch size may be smaller than the compile-time one).
    fn fill_patch_array(
        &self,
        stage: ShaderStage,
        p: &ShaderParam,
        size: &str,
        globals: &mut GlslWriter,
        prologue: &mut GlslWriter,
    ) -> Result<(), ConvertError> {
        prologue.line(&format!("{} {}[{size}];", p.type_text, p.name));
        prologue.line("for (int _i = 0; _i < gl_PatchVerticesIn; ++_i)");
        prologue.line("{");
        prologue.indent();
        for (path, leaf) in p.leaves(&format!("{}[_i]", p.name)) {
            let sem = self.require_semantic(leaf, &path)?;
            match self.tables.semantic_macro(stage, IoDirection::In, &sem) {
                Some(mac) if mac.indexed => prologue.line(&format!("{path} = {}(_i);", mac.name)),
                Some(mac) => prologue.line(&format!("{path} = {};", mac.name)),
                None => {
                    // Hull reads the previous stage's plain varyings; the
                    // domain stage reads the hull's per-control-point
                    // outputs.
                    let var = if stage == ShaderStage::Domain {
                        control_point_var(&sem)
                    } else {
                        interface_var(&sem)
                    };
                    globals.line(&format!("in {} {var}[];", leaf.type_text));
                    prologue.line(&format!("{path} = {var}[_i];"));
                }
            }
        }
        prologue.dedent();
        prologue.line("}");
        Ok(())
    }

    /// Tess-factor semantics read the tessellation levels (unrolled over
    /// the declared array size); other builtins map directly; user
    /// semantics read `patch in` variables written by the hull stage.
    fn lower_domain_input(
        &self,
        sem: &str,
        path: &str,
        leaf: &ShaderParam,
        globals: &mut GlslWriter,
        prologue: &mut GlslWriter,
    ) -> Result<(), ConvertError> {
        match sem {
            "sv_tessfactor" | "sv_insidetessfactor" => {
                let mac = if sem == "sv_tessfactor" {
                    "_GET_GL_TESS_LEVEL_OUTER"
                } else {
                    "_GET_GL_TESS_LEVEL_INNER"
                };
                match tess_factor_count(leaf)? {
                    Some(n) => {
                        for i in 0..n {
                            prologue.line(&format!("{path}[{i}] = {mac}({i});"));
                        }
                    }
                    None => prologue.line(&format!("{path} = {mac}(0);")),
                }
            }
            _ => match self
                .tables
                .semantic_macro(ShaderStage::Domain, IoDirection::In, sem)
            {
                Some(mac) if mac.indexed => {
                    return Err(ConvertError::InvalidSemantic {
                        semantic: sem.to_string(),
                        direction: "input",
                        stage: ShaderStage::Domain,
                    })
                }
                Some(mac) => prologue.line(&format!("{path} = {};", mac.name)),
                None => {
                    let var = patch_constant_var(sem);
                    globals.line(&format!("patch in {} {var};", leaf.type_text));
                    prologue.line(&format!("{path} = {var};"));
                }
            },
        }
        Ok(())
    }

    fn lower_patch_constant_output(
        &self,
        sem: &str,
        path: &str,
        leaf: &ShaderParam,
        globals: &mut GlslWriter,
        lines: &mut Vec<String>,
    ) -> Result<(), ConvertError> {
        match sem {
            "sv_tessfactor" | "sv_insidetessfactor" => {
                let mac = if sem == "sv_tessfactor" {
                    "_SET_GL_TESS_LEVEL_OUTER"
                } else {
                    "_SET_GL_TESS_LEVEL_INNER"
                };
                match tess_factor_count(leaf)? {
                    Some(n) => {
                        for i in 0..n {
                            lines.push(format!("    {mac}({i}, {path}[{i}]);"));
                        }
                    }
                    None => lines.push(format!("    {mac}(0, {path});")),
                }
            }
            _ => {
                let var = patch_constant_var(sem);
                globals.line(&format!("patch out {} {var};", leaf.type_text));
                lines.push(format!("    {var} = {path};"));
            }
        }
        Ok(())
    }

    /// Rewrites `InputPatch<T, N>`/`OutputPatch<T, N>` parameters of the
    /// patch-constant function into `T name[N]` so the function survives as
    /// a plain GLSL function.
    fn rewrite_patch_param_types(&mut self, f: usize) -> Result<(), ConvertError> {
        let args_open = self.functions[f].args_open;
        let args_close = self.functions[f].args_close;
        let mut cur = self.list.next(args_open);
        while let Some(id) = cur {
            if id == args_close {
                break;
            }
            if !matches!(
                self.list[id].keyword(),
                Some(Keyword::InputPatch | Keyword::OutputPatch)
            ) {
                cur = self.list.next(id);
                continue;
            }
            let open = self
                .list
                .next(id)
                .filter(|&o| self.list[o].ty == TokenType::OpenAngle)
                .ok_or_else(|| self.malformed(id, "\"<\" expected after patch type"))?;
            let close = find_matching_bracket(self.list, open)
                .ok_or_else(|| self.malformed(open, "no matching \">\""))?;

            let mut elem = String::new();
            let mut size = String::new();
            let mut past_comma = false;
            for tid in self.list.ids_range(self.list.next(open), Some(close)) {
                match self.list[tid].ty {
                    TokenType::Comma => past_comma = true,
                    _ if past_comma => size.push_str(&self.list[tid].literal),
                    _ => elem.push_str(&self.list[tid].literal),
                }
            }
            if elem.is_empty() || size.is_empty() {
                return Err(self.malformed(open, "patch type arguments expected"));
            }

            let after_close = self.list.next(close);
            self.list.erase_range(open, after_close);
            {
                let t = &mut self.list[id];
                t.ty = TokenType::Identifier;
                t.literal = elem;
            }
            let name_id = after_close
                .filter(|&n| self.list[n].ty == TokenType::Identifier)
                .ok_or_else(|| self.malformed(id, "patch parameter name expected"))?;
            self.list.insert_after(
                name_id,
                Token::new(TokenType::TextBlock, format!("[{size}]")),
            );
            cur = self.list.next(name_id);
        }
        Ok(())
    }
}

fn required_tess_attr(
    attrs: &[EntryAttribute],
    comments: &[(String, String)],
    name: &'static str,
) -> Result<String, ConvertError> {
    if let Some(v) = attrs
        .iter()
        .find(|a| a.name == name)
        .and_then(|a| a.arg(0))
    {
        return Ok(v.to_ascii_lowercase());
    }
    comments
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.to_ascii_lowercase())
        .ok_or(ConvertError::MissingAttribute { name })
}

fn tess_factor_count(leaf: &ShaderParam) -> Result<Option<usize>, ConvertError> {
    match &leaf.array_size {
        None => Ok(None),
        Some(text) => text
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ConvertError::MalformedInput {
                message: format!(
                    "tessellation factor array size {text:?} must be an integer literal"
                ),
                context: String::new(),
            }),
    }
}
