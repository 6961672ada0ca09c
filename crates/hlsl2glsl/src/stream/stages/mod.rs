//! Per-stage entry-point lowering.
//!
//! Stage modules share the same shape: read the entry's attributes and
//! parameter descriptors, generate three text blocks (global interface
//! declarations + the `_RETURN_` macro, a prologue assigning inputs into
//! the user's parameter locals, and the per-`return` output assignments),
//! then hand everything to [`Rewriter::finish_entry`] which performs the
//! token surgery: attribute deletion, parameter-list stripping, `main`
//! rename, block insertion and `return` macro-ification.

use std::collections::HashSet;

use hlsl_lex::{find_matching_bracket, Keyword, Token, TokenId, TokenType};
use tracing::debug;

use crate::{ConvertError, ShaderStage};

use super::Rewriter;

mod compute;
mod geometry;
mod pixel;
mod tess;
mod vertex;

/// Small indenting writer for generated GLSL text blocks.
pub(crate) struct GlslWriter {
    out: String,
    indent: usize,
}

impl GlslWriter {
    pub fn new() -> GlslWriter {
        GlslWriter {
            out: String::new(),
            indent: 0,
        }
    }

    pub fn indent(&mut self) {
        self.indent += 4;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(4);
    }

    pub fn line(&mut self, s: &str) {
        if !s.is_empty() {
            for _ in 0..self.indent {
                self.out.push(' ');
            }
            self.out.push_str(s);
        }
        self.out.push('\n');
    }

    /// `#define header {\ ... \}` with backslash-continued body lines.
    pub fn macro_def(&mut self, header: &str, body: &[String]) {
        self.line(&format!("#define {header} {{\\"));
        for l in body {
            self.line(&format!("    {l}\\"));
        }
        self.line("}");
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Interface-variable name for a plain stage varying, derived from the
/// (lower-cased) semantic. Varyings use the same name on both sides of a
/// stage boundary so programs link by name when explicit locations are
/// disabled; boundaries where one shader carries both directions of the
/// same semantic get their own prefix instead ([`attrib_var`],
/// [`control_point_var`], [`patch_constant_var`], [`gs_out_var`]).
pub(crate) fn interface_var(semantic: &str) -> String {
    format!("_{semantic}")
}

/// Vertex-attribute input variable (bound by explicit location).
pub(crate) fn attrib_var(semantic: &str) -> String {
    format!("_in_{semantic}")
}

/// Hull per-control-point output / domain per-vertex input.
pub(crate) fn control_point_var(semantic: &str) -> String {
    format!("_pcp_{semantic}")
}

/// Hull patch-constant output / domain patch-constant input.
pub(crate) fn patch_constant_var(semantic: &str) -> String {
    format!("_patch_{semantic}")
}

/// Geometry-stage output varying. A pass-through geometry shader reads and
/// writes the same semantics, so its outputs cannot share the input names;
/// geometry pipelines link by explicit location qualifiers.
pub(crate) fn gs_out_var(semantic: &str) -> String {
    format!("_gsout_{semantic}")
}

/// Vertex-attribute location assignment: explicit `ATTRIBn` wins, the auto
/// counter continues from the highest location seen, and any collision is a
/// hard error.
pub(crate) struct LocationAllocator {
    used: HashSet<u32>,
    next: u32,
}

impl LocationAllocator {
    pub fn new() -> LocationAllocator {
        LocationAllocator {
            used: HashSet::new(),
            next: 0,
        }
    }

    pub fn assign(&mut self, semantic: &str) -> Result<u32, ConvertError> {
        let explicit = semantic
            .strip_prefix("attrib")
            .and_then(|s| s.parse::<u32>().ok());
        let location = explicit.unwrap_or(self.next);
        if !self.used.insert(location) {
            return Err(ConvertError::LocationConflict {
                location,
                semantic: semantic.to_string(),
            });
        }
        self.next = self.next.max(location + 1);
        Ok(location)
    }
}

/// One `[name(args...)]` attribute group preceding an entry point.
#[derive(Debug)]
pub(crate) struct EntryAttribute {
    pub name: String,
    pub args: Vec<String>,
    open: TokenId,
    close: TokenId,
}

impl EntryAttribute {
    pub fn arg(&self, i: usize) -> Option<&str> {
        self.args.get(i).map(|s| s.as_str())
    }
}

/// Everything `finish_entry` needs besides the token positions.
pub(crate) struct EntryLowering {
    pub globals: String,
    pub prologue: String,
    /// `Some(takes_value)` turns `return`s into `_RETURN_` invocations.
    pub ret_macro: Option<bool>,
    /// Append a trailing `_RETURN_();` before the closing brace (void
    /// entries with output parameters may fall off the end).
    pub append_return: bool,
}

impl Rewriter<'_> {
    pub(crate) fn lower_entry_point(&mut self) -> Result<(), ConvertError> {
        let f = self.entry_function()?;
        debug!(
            shader = self.source_name,
            entry = %self.attribs.entry_point,
            stage = ?self.attribs.stage,
            "lowering entry point"
        );
        let params = self.parse_entry_params(f)?;
        let ret = self.parse_return_param(f)?;
        match self.attribs.stage {
            ShaderStage::Vertex => self.lower_vertex(f, &params, ret.as_ref()),
            ShaderStage::Pixel => self.lower_pixel(f, &params, ret.as_ref()),
            ShaderStage::Geometry => self.lower_geometry(f, &params, ret.as_ref()),
            ShaderStage::Hull => self.lower_hull(f, &params, ret.as_ref()),
            ShaderStage::Domain => self.lower_domain(f, &params, ret.as_ref()),
            ShaderStage::Compute => self.lower_compute(f, &params, ret.as_ref()),
        }
    }

    /// The `[attr(..)]` groups immediately preceding the entry's return
    /// type, in source order.
    pub(crate) fn entry_attributes(&self, f: usize) -> Vec<EntryAttribute> {
        let mut attrs = Vec::new();
        let Some(ret_ty) = self.list.prev(self.functions[f].name_id) else {
            return attrs;
        };
        let mut cur = self.list.prev(ret_ty);
        while let Some(close) = cur {
            if self.list[close].ty != TokenType::ClosingSquare {
                break;
            }
            let Some(open) = find_matching_bracket(self.list, close) else {
                break;
            };
            let Some(name_id) = self.list.next(open) else {
                break;
            };
            let name = self.list[name_id].literal.to_ascii_lowercase();

            let mut args = Vec::new();
            if let Some(paren) = self
                .list
                .next(name_id)
                .filter(|&p| self.list[p].ty == TokenType::OpenParen)
            {
                if let Some(paren_close) = find_matching_bracket(self.list, paren) {
                    let mut current = String::new();
                    let mut depth = 0i32;
                    for id in self.list.ids_range(self.list.next(paren), Some(paren_close)) {
                        let t = &self.list[id];
                        match t.ty {
                            TokenType::Comma if depth == 0 => {
                                args.push(std::mem::take(&mut current));
                            }
                            _ => {
                                if t.ty.is_open_bracket() {
                                    depth += 1;
                                } else if t.ty.is_closing_bracket() {
                                    depth -= 1;
                                }
                                if t.ty == TokenType::StringConstant {
                                    current.push_str(t.literal.trim_matches('"'));
                                } else {
                                    current.push_str(&t.literal);
                                }
                            }
                        }
                    }
                    if !current.is_empty() {
                        args.push(current);
                    }
                }
            }

            attrs.push(EntryAttribute {
                name,
                args,
                open,
                close,
            });
            cur = self.list.prev(open);
        }
        attrs.reverse();
        attrs
    }

    /// `key = value` pairs mined from comments directly preceding the
    /// entry point (the domain-stage fallback for hull attributes).
    pub(crate) fn comment_attributes(&self, f: usize, attrs: &[EntryAttribute]) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(ret_ty) = self.list.prev(self.functions[f].name_id) {
            parse_comment_pairs(&self.list[ret_ty].delimiter, &mut pairs);
        }
        for a in attrs {
            parse_comment_pairs(&self.list[a.open].delimiter, &mut pairs);
        }
        pairs
    }

    pub(crate) fn delete_attributes(&mut self, attrs: &[EntryAttribute]) {
        for a in attrs {
            let after = self.list.next(a.close);
            self.list.erase_range(a.open, after);
        }
    }

    /// Token surgery shared by every stage.
    pub(crate) fn finish_entry(
        &mut self,
        f: usize,
        lowering: EntryLowering,
    ) -> Result<(), ConvertError> {
        let name_id = self.functions[f].name_id;
        let args_open = self.functions[f].args_open;
        let args_close = self.functions[f].args_close;
        let body_open = self.functions[f].body_open.expect("entry is defined");
        let body_close = self.functions[f].body_close.expect("entry is defined");

        // GLSL entry points take no arguments: strip the parameter list.
        if self.list.next(args_open) != Some(args_close) {
            self.list
                .erase_range(self.list.next(args_open).unwrap(), Some(args_close));
        }

        // `) : SEMANTIC` on the signature.
        if let Some(colon) = self
            .list
            .next(args_close)
            .filter(|&c| self.list[c].ty == TokenType::Colon)
        {
            let sem = self.list.next(colon);
            self.list.erase(colon);
            if let Some(sem) = sem.filter(|&s| self.list[s].ty == TokenType::Identifier) {
                self.list.erase(sem);
            }
        }

        // Fold the return type away and rename the entry point.
        let ret_ty = self
            .list
            .prev(name_id)
            .ok_or_else(|| self.malformed(name_id, "return type expected"))?;
        self.list[ret_ty].literal = "void".to_string();
        self.list[ret_ty].ty = TokenType::Keyword(Keyword::Void);
        self.list[name_id].literal = "main".to_string();

        // Generated global declarations go right before the function.
        if !lowering.globals.is_empty() {
            let delim = std::mem::take(&mut self.list[ret_ty].delimiter);
            self.list.insert_before(
                Some(ret_ty),
                Token::new(TokenType::TextBlock, lowering.globals).with_delimiter(delim),
            );
            self.list[ret_ty].delimiter = "\n".to_string();
        }

        if !lowering.prologue.is_empty() {
            self.list.insert_after(
                body_open,
                Token::new(TokenType::TextBlock, format!("\n{}", lowering.prologue)),
            );
        }

        if let Some(takes_value) = lowering.ret_macro {
            self.rewrite_returns(body_open, body_close, takes_value);
        }
        if lowering.append_return {
            self.list.insert_before(
                Some(body_close),
                Token::new(TokenType::TextBlock, "_RETURN_();").with_delimiter("\n    "),
            );
        }
        Ok(())
    }

    fn rewrite_returns(&mut self, body_open: TokenId, body_close: TokenId, takes_value: bool) {
        let mut cur = self.list.next(body_open);
        while let Some(id) = cur {
            if id == body_close {
                break;
            }
            if self.list[id].ty != TokenType::Keyword(Keyword::Return) {
                cur = self.list.next(id);
                continue;
            }
            let bare = self
                .list
                .next(id)
                .map_or(true, |n| self.list[n].ty == TokenType::Semicolon);
            if !takes_value || bare {
                let t = &mut self.list[id];
                t.ty = TokenType::TextBlock;
                t.literal = "_RETURN_()".to_string();
                cur = self.list.next(id);
                continue;
            }

            // `return expr;` → `_RETURN_(expr);`
            {
                let t = &mut self.list[id];
                t.ty = TokenType::TextBlock;
                t.literal = "_RETURN_(".to_string();
            }
            let mut depth = 0i32;
            let mut s = self.list.next(id);
            while let Some(sid) = s {
                let ty = self.list[sid].ty;
                if ty.is_open_bracket() && ty != TokenType::OpenAngle {
                    depth += 1;
                } else if ty.is_closing_bracket() && ty != TokenType::ClosingAngle {
                    depth -= 1;
                } else if ty == TokenType::Semicolon && depth == 0 {
                    self.list
                        .insert_before(Some(sid), Token::new(TokenType::TextBlock, ")"));
                    break;
                }
                s = self.list.next(sid);
            }
            cur = s;
        }
    }
}

fn parse_comment_pairs(text: &str, out: &mut Vec<(String, String)>) {
    let bytes = text.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i].is_ascii_alphabetic() || bytes[i] == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let key = &text[start..i];
            let mut j = i;
            while j < bytes.len() && matches!(bytes[j], b' ' | b'\t') {
                j += 1;
            }
            if bytes.get(j) == Some(&b'=') {
                j += 1;
                while j < bytes.len() && matches!(bytes[j], b' ' | b'\t') {
                    j += 1;
                }
                let vstart = j;
                while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                    j += 1;
                }
                if j > vstart {
                    out.push((key.to_string(), text[vstart..j].to_string()));
                    i = j;
                    continue;
                }
            }
        } else {
            i += 1;
        }
    }
}
