//! Entry-point parameter parsing.
//!
//! Builds [`ShaderParam`] descriptors from the token stream, recursively
//! flattening struct-typed parameters through the struct index (GLSL
//! interface variables are a flat list, so stage lowering works on leaves).
//! The descriptors are consumed entirely by stage lowering and discarded
//! after code generation.

use hlsl_lex::{find_matching_bracket, Keyword, TokenId, TokenType};

use crate::ConvertError;

use super::Rewriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamStorage {
    In,
    Out,
    InOut,
    /// The function return value modeled as a synthetic output parameter.
    Ret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interpolation {
    Smooth,
    Flat,
    NoPerspective,
    Centroid,
    Sample,
}

impl Interpolation {
    pub fn glsl_qualifier(self) -> &'static str {
        match self {
            Interpolation::Smooth => "smooth ",
            Interpolation::Flat => "flat ",
            Interpolation::NoPerspective => "noperspective ",
            Interpolation::Centroid => "centroid ",
            Interpolation::Sample => "sample ",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PatchInfo {
    /// `OutputPatch` (domain-shader input) as opposed to `InputPatch`.
    pub output: bool,
    /// Control-point count expression text from the template argument.
    pub size: String,
}

/// One formal parameter, flattened struct member, or synthetic return
/// value.
#[derive(Debug, Clone)]
pub(crate) struct ShaderParam {
    pub name: String,
    pub type_text: String,
    pub storage: ParamStorage,
    pub interpolation: Option<Interpolation>,
    /// Lower-cased for case-insensitive matching.
    pub semantic: Option<String>,
    pub array_size: Option<String>,
    /// Non-empty only for struct-typed parameters.
    pub members: Vec<ShaderParam>,
    pub gs_primitive: Option<Keyword>,
    pub gs_stream: Option<Keyword>,
    pub patch: Option<PatchInfo>,
}

impl ShaderParam {
    fn new() -> ShaderParam {
        ShaderParam {
            name: String::new(),
            type_text: String::new(),
            storage: ParamStorage::In,
            interpolation: None,
            semantic: None,
            array_size: None,
            members: Vec::new(),
            gs_primitive: None,
            gs_stream: None,
            patch: None,
        }
    }

    /// Leaf descriptors paired with their member-access path rooted at
    /// `root` (`"In"` → `"In.Pos"`, nested structs recurse).
    pub fn leaves<'s>(&'s self, root: &str) -> Vec<(String, &'s ShaderParam)> {
        let mut out = Vec::new();
        self.collect_leaves(root, &mut out);
        out
    }

    fn collect_leaves<'s>(&'s self, path: &str, out: &mut Vec<(String, &'s ShaderParam)>) {
        if self.members.is_empty() {
            out.push((path.to_string(), self));
        } else {
            for m in &self.members {
                m.collect_leaves(&format!("{path}.{}", m.name), out);
            }
        }
    }

    pub fn array_suffix(&self) -> String {
        match &self.array_size {
            Some(n) => format!("[{n}]"),
            None => String::new(),
        }
    }
}

impl Rewriter<'_> {
    /// Parses the entry point's parameter list into descriptors. Does not
    /// modify the token stream (the whole list is stripped later by entry
    /// lowering).
    pub(crate) fn parse_entry_params(&self, f: usize) -> Result<Vec<ShaderParam>, ConvertError> {
        let open = self.functions[f].args_open;
        let close = self.functions[f].args_close;

        let mut groups: Vec<Vec<TokenId>> = Vec::new();
        let mut current: Vec<TokenId> = Vec::new();
        let mut depth = 0i32;
        for id in self.list.ids_range(self.list.next(open), Some(close)) {
            let ty = self.list[id].ty;
            if ty.is_open_bracket() {
                depth += 1;
            } else if ty.is_closing_bracket() {
                depth -= 1;
            } else if ty == TokenType::Comma && depth == 0 {
                groups.push(std::mem::take(&mut current));
                continue;
            }
            current.push(id);
        }
        if !current.is_empty() {
            groups.push(current);
        }

        groups
            .into_iter()
            .map(|g| self.parse_param(&g))
            .collect()
    }

    fn parse_param(&self, tokens: &[TokenId]) -> Result<ShaderParam, ConvertError> {
        let mut p = ShaderParam::new();
        let mut i = 0usize;
        let mut saw_in = false;

        // Qualifier run: storage, interpolation, GS primitive/stream and
        // patch markers all precede the type.
        while i < tokens.len() {
            let id = tokens[i];
            let Some(kw) = self.list[id].keyword() else { break };
            match kw {
                Keyword::In => {
                    saw_in = true;
                    p.storage = if p.storage == ParamStorage::Out {
                        ParamStorage::InOut
                    } else {
                        ParamStorage::In
                    };
                }
                Keyword::Out => {
                    // `in out` spelled separately means `inout`.
                    p.storage = if saw_in {
                        ParamStorage::InOut
                    } else {
                        ParamStorage::Out
                    };
                }
                Keyword::InOut => p.storage = ParamStorage::InOut,
                Keyword::Const | Keyword::Unorm => {}
                Keyword::Linear => p.interpolation = Some(Interpolation::Smooth),
                Keyword::NoInterpolation => p.interpolation = Some(Interpolation::Flat),
                Keyword::NoPerspective => p.interpolation = Some(Interpolation::NoPerspective),
                Keyword::Centroid => p.interpolation = Some(Interpolation::Centroid),
                Keyword::Sample => p.interpolation = Some(Interpolation::Sample),
                kw if kw.is_gs_primitive() => p.gs_primitive = Some(kw),
                kw if kw.is_gs_stream() => {
                    p.gs_stream = Some(kw);
                    i += 1;
                    i = self.parse_template_type(tokens, i, &mut p, false)?;
                    continue;
                }
                Keyword::InputPatch | Keyword::OutputPatch => {
                    let output = kw == Keyword::OutputPatch;
                    i += 1;
                    i = self.parse_template_type(tokens, i, &mut p, true)?;
                    if let Some(patch) = &mut p.patch {
                        patch.output = output;
                    }
                    continue;
                }
                _ => break,
            }
            i += 1;
        }

        // Type, unless a template form already provided it.
        if p.type_text.is_empty() {
            let id = *tokens.get(i).ok_or_else(|| {
                self.malformed(
                    *tokens.last().expect("non-empty parameter"),
                    "parameter type expected",
                )
            })?;
            if self.list[id].ty != TokenType::Identifier {
                return Err(self.malformed(id, "parameter type expected"));
            }
            p.type_text = self.list[id].literal.clone();
            i += 1;
        }

        // Name.
        let name_id = *tokens
            .get(i)
            .ok_or_else(|| self.malformed(tokens[i - 1], "parameter name expected"))?;
        if self.list[name_id].ty != TokenType::Identifier {
            return Err(self.malformed(name_id, "parameter name expected"));
        }
        p.name = self.list[name_id].literal.clone();
        i += 1;

        // Optional array size.
        if tokens.get(i).map(|&id| self.list[id].ty) == Some(TokenType::OpenSquare) {
            let mut size = String::new();
            i += 1;
            let mut depth = 1;
            while i < tokens.len() {
                let id = tokens[i];
                match self.list[id].ty {
                    TokenType::OpenSquare => depth += 1,
                    TokenType::ClosingSquare => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                size.push_str(&self.list[id].literal);
                i += 1;
            }
            i += 1;
            p.array_size = Some(size);
        }

        // Optional `: SEMANTIC`.
        if tokens.get(i).map(|&id| self.list[id].ty) == Some(TokenType::Colon) {
            let sem_id = *tokens
                .get(i + 1)
                .ok_or_else(|| self.malformed(tokens[i], "semantic expected after \":\""))?;
            if self.list[sem_id].ty != TokenType::Identifier {
                return Err(self.malformed(sem_id, "semantic expected after \":\""));
            }
            p.semantic = Some(self.list[sem_id].literal.to_ascii_lowercase());
        }

        self.resolve_struct_members(&mut p)?;
        Ok(p)
    }

    /// Parses `<Type[, Size]>` after a stream/patch keyword. `with_size`
    /// captures the second template argument into [`PatchInfo`].
    fn parse_template_type(
        &self,
        tokens: &[TokenId],
        mut i: usize,
        p: &mut ShaderParam,
        with_size: bool,
    ) -> Result<usize, ConvertError> {
        let open = *tokens
            .get(i)
            .ok_or_else(|| self.malformed(tokens[i - 1], "\"<\" expected"))?;
        if self.list[open].ty != TokenType::OpenAngle {
            return Err(self.malformed(open, "\"<\" expected"));
        }
        i += 1;

        let ty_id = *tokens
            .get(i)
            .ok_or_else(|| self.malformed(open, "template type argument expected"))?;
        if self.list[ty_id].ty != TokenType::Identifier {
            return Err(self.malformed(ty_id, "template type argument expected"));
        }
        p.type_text = self.list[ty_id].literal.clone();
        i += 1;

        let mut size = String::new();
        while i < tokens.len() && self.list[tokens[i]].ty != TokenType::ClosingAngle {
            let t = &self.list[tokens[i]];
            if t.ty != TokenType::Comma {
                size.push_str(&t.literal);
            }
            i += 1;
        }
        if i >= tokens.len() {
            return Err(self.malformed(open, "no matching \">\""));
        }
        i += 1;

        if with_size {
            if size.is_empty() {
                return Err(self.malformed(open, "patch size expected"));
            }
            p.patch = Some(PatchInfo {
                output: false,
                size,
            });
        }
        Ok(i)
    }

    /// If the parameter's type names a registered struct, parse its members
    /// (recursively for nested structs).
    fn resolve_struct_members(&self, p: &mut ShaderParam) -> Result<(), ConvertError> {
        let Some(&struct_id) = self.structs.get(&p.type_text) else {
            return Ok(());
        };
        p.members = self.parse_struct_members(struct_id)?;
        Ok(())
    }

    pub(crate) fn parse_struct_members(
        &self,
        struct_id: TokenId,
    ) -> Result<Vec<ShaderParam>, ConvertError> {
        // struct Name { ... }
        let open = self
            .list
            .next(struct_id)
            .and_then(|name| self.list.next(name))
            .filter(|&o| self.list[o].ty == TokenType::OpenBrace)
            .ok_or_else(|| self.malformed(struct_id, "\"{\" expected after struct name"))?;
        let close = find_matching_bracket(self.list, open)
            .ok_or_else(|| self.malformed(open, "no matching \"}\" for struct"))?;

        let mut members = Vec::new();
        let mut current: Vec<TokenId> = Vec::new();
        for id in self.list.ids_range(self.list.next(open), Some(close)) {
            if self.list[id].ty == TokenType::Semicolon {
                if !current.is_empty() {
                    members.push(self.parse_param(&current)?);
                    current.clear();
                }
            } else {
                current.push(id);
            }
        }
        if !current.is_empty() {
            return Err(self.malformed(close, "\";\" expected after struct member"));
        }
        Ok(members)
    }

    /// Folds the return type + trailing semantic into a synthetic output
    /// parameter; `None` for `void`.
    pub(crate) fn parse_return_param(
        &self,
        f: usize,
    ) -> Result<Option<ShaderParam>, ConvertError> {
        let func = &self.functions[f];
        let ret_ty = self
            .list
            .prev(func.name_id)
            .ok_or_else(|| self.malformed(func.name_id, "return type expected"))?;
        if self.list[ret_ty].keyword() == Some(Keyword::Void) {
            return Ok(None);
        }
        if self.list[ret_ty].ty != TokenType::Identifier {
            return Err(self.malformed(ret_ty, "return type expected"));
        }

        let mut p = ShaderParam::new();
        p.name = "_RET_VAL_".to_string();
        p.storage = ParamStorage::Ret;
        p.type_text = self.list[ret_ty].literal.clone();

        // `) : SEMANTIC` before the body brace.
        if let Some(colon) = self
            .list
            .next(func.args_close)
            .filter(|&c| self.list[c].ty == TokenType::Colon)
        {
            if let Some(sem) = self
                .list
                .next(colon)
                .filter(|&s| self.list[s].ty == TokenType::Identifier)
            {
                p.semantic = Some(self.list[sem].literal.to_ascii_lowercase());
            }
        }

        self.resolve_struct_members(&mut p)?;
        Ok(Some(p))
    }
}
