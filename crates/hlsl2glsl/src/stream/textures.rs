//! Texture/image/buffer declaration lowering.
//!
//! Runs after the scope scan so shadow-sampler inference sees every sampler
//! declaration in a scope regardless of declaration order. Any
//! texture-dimension keyword triggers lowering wherever it appears: at
//! global scope declarations become `uniform sampler*`/`layout(..) uniform
//! image*` variables, inside function parameter lists only the type text is
//! rewritten. Each lowered declarator registers an [`super::ObjectInfo`]
//! into its scope for the call-rewriting pass.

use hlsl_lex::{find_matching_bracket, Keyword, Token, TokenId, TokenType};
use tracing::debug;

use crate::ConvertError;

use super::{ObjectInfo, Rewriter};

struct Declarator {
    name: String,
    array_dim: u32,
    /// Token that ended this declarator: `,`, `;`, `)` or `=`.
    separator: TokenId,
}

impl Rewriter<'_> {
    pub(crate) fn lower_object_declarations(&mut self) -> Result<(), ConvertError> {
        debug!(shader = self.source_name, "lowering texture declarations");
        let mut fn_idx = 0usize;
        let mut scope: Option<usize> = None;
        let mut scope_end: Option<TokenId> = None;
        let mut in_args = false;

        let mut cur = self.list.first();
        while let Some(id) = cur {
            if scope.is_none()
                && fn_idx < self.functions.len()
                && self.functions[fn_idx].args_open == id
            {
                scope = Some(fn_idx);
                scope_end = Some(
                    self.functions[fn_idx]
                        .body_close
                        .unwrap_or(self.functions[fn_idx].args_close),
                );
                in_args = true;
                fn_idx += 1;
            }
            if let Some(s) = scope {
                if self.functions[s].args_close == id {
                    in_args = false;
                }
            }
            if scope_end == Some(id) {
                scope = None;
                scope_end = None;
                in_args = false;
                cur = self.list.next(id);
                continue;
            }

            if let Some(kw) = self.list[id].keyword() {
                if kw.is_texture() {
                    cur = self.lower_texture_declaration(id, kw, scope, in_args)?;
                    continue;
                }
            }
            cur = self.list.next(id);
        }
        Ok(())
    }

    fn lower_texture_declaration(
        &mut self,
        id: TokenId,
        kw: Keyword,
        scope: Option<usize>,
        in_args: bool,
    ) -> Result<Option<TokenId>, ConvertError> {
        // Template argument: element type, optional MS sample count, and
        // (for images) an optional `/* format = X */` comment attached to
        // the element type or the closing `>`.
        let mut prefix = "";
        let mut component_count = 4u32;
        let mut format: Option<String> = None;
        let mut template: Option<(TokenId, TokenId)> = None;

        let first = self
            .list
            .next(id)
            .ok_or_else(|| self.malformed(id, "unexpected end of texture declaration"))?;
        let mut cur = first;
        if self.list[first].ty == TokenType::OpenAngle {
            let close = find_matching_bracket(self.list, first)
                .ok_or_else(|| self.malformed(first, "no matching \">\""))?;
            let mut saw_type = false;
            for tid in self.list.ids_range(self.list.next(first), Some(close)) {
                let t = &self.list[tid];
                if format.is_none() {
                    format = parse_format_comment(&t.delimiter);
                }
                match t.ty {
                    TokenType::Keyword(Keyword::Unorm) => {}
                    TokenType::Identifier if !saw_type => {
                        let (p, c) = parse_component_type(&t.literal)
                            .ok_or_else(|| self.malformed(tid, "unsupported texture element type"))?;
                        prefix = p;
                        component_count = c;
                        saw_type = true;
                    }
                    // The MS sample-count argument is ignored.
                    TokenType::Comma | TokenType::NumericConstant => {}
                    _ => {}
                }
            }
            if format.is_none() {
                format = parse_format_comment(&self.list[close].delimiter);
            }
            template = Some((first, close));
            cur = self
                .list
                .next(close)
                .ok_or_else(|| self.malformed(close, "texture name expected"))?;
        }

        // Declarators: at global scope a statement may declare several
        // comma-separated names, each resolving independently (shadow
        // inference and register clauses per name).
        let is_rw = kw.is_rw_texture();
        let dim = dimension_suffix(kw);
        let mut decls: Vec<Declarator> = Vec::new();
        loop {
            if self.list[cur].ty != TokenType::Identifier {
                return Err(self.malformed(cur, "identifier expected in texture declaration"));
            }
            let name = self.list[cur].literal.clone();

            let mut array_dim = 0u32;
            let mut c = self.list.next(cur);
            while c.map(|x| self.list[x].ty) == Some(TokenType::OpenSquare) {
                let close = find_matching_bracket(self.list, c.unwrap())
                    .ok_or_else(|| self.malformed(c.unwrap(), "no matching \"]\""))?;
                array_dim += 1;
                c = self.list.next(close);
            }
            c = self.strip_register_clause(c);

            let sep =
                c.ok_or_else(|| self.malformed(cur, "\";\" expected after texture declaration"))?;
            decls.push(Declarator {
                name,
                array_dim,
                separator: sep,
            });
            match self.list[sep].ty {
                TokenType::Comma if !in_args => {
                    cur = self
                        .list
                        .next(sep)
                        .ok_or_else(|| self.malformed(sep, "declarator expected after \",\""))?;
                }
                TokenType::Comma | TokenType::ClosingParen if in_args => break,
                TokenType::Semicolon => break,
                TokenType::Assignment => break,
                _ => return Err(self.malformed(sep, "unexpected token in texture declaration")),
            }
        }

        // Resolved GLSL type per declarator.
        let glsl_types: Vec<(String, String)> = decls
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let base = if is_rw {
                    format!("{prefix}image{dim}")
                } else {
                    let paired = format!("{}{}", d.name, self.attribs.sampler_suffix);
                    let shadow = self.lookup_sampler(scope, &paired) == Some(true);
                    format!(
                        "{prefix}sampler{dim}{}",
                        if shadow { "Shadow" } else { "" }
                    )
                };
                let decl_text = if scope.is_some() {
                    base.clone()
                } else if is_rw {
                    let binding = self.image_binding + i as u32;
                    let fmt = format
                        .as_ref()
                        .map(|f| format!("{f}, "))
                        .unwrap_or_default();
                    format!("layout({fmt}binding = {binding}) uniform {base}")
                } else {
                    format!("uniform {base}")
                };
                (base, decl_text)
            })
            .collect();
        // Binding indices are consumed per RW declarator at global scope;
        // a distinct counter from structured buffers.
        if is_rw && scope.is_none() {
            self.image_binding += decls.len() as u32;
        }

        for (d, (base, _)) in decls.iter().zip(&glsl_types) {
            let objects = match scope {
                Some(f) => &mut self.functions[f].objects,
                None => &mut self.global_objects,
            };
            objects.insert(
                d.name.clone(),
                ObjectInfo {
                    glsl_type: base.clone(),
                    component_count,
                    array_dim: d.array_dim,
                    is_image: is_rw,
                },
            );
            debug!(object = %d.name, glsl_type = %base, array_dim = d.array_dim, "registered object");
        }

        // Token rewriting: the keyword token carries the first declarator's
        // type; later declarators get their statement split off.
        if let Some((open, close)) = template {
            let after = self.list.next(close);
            self.list.erase_range(open, after);
        }
        {
            let t = &mut self.list[id];
            t.ty = TokenType::TextBlock;
            t.literal = glsl_types[0].1.clone();
        }
        for i in 1..decls.len() {
            let sep = decls[i - 1].separator;
            let t = &mut self.list[sep];
            t.ty = TokenType::Semicolon;
            t.literal = ";".to_string();
            self.list.insert_after(
                sep,
                Token::new(TokenType::TextBlock, glsl_types[i].1.clone()).with_delimiter("\n"),
            );
        }

        let last_sep = decls.last().expect("at least one declarator").separator;
        Ok(match self.list[last_sep].ty {
            TokenType::Semicolon => self.list.next(last_sep),
            _ => Some(last_sep),
        })
    }
}

/// `float3`/`int`/`uint2`/`half4` → (GLSL type prefix, component count).
fn parse_component_type(name: &str) -> Option<(&'static str, u32)> {
    let (base, count) = match name.as_bytes().last() {
        Some(c @ b'1'..=b'9') => (&name[..name.len() - 1], (c - b'0') as u32),
        _ => (name, 1),
    };
    let prefix = match base {
        "float" | "half" => "",
        "int" => "i",
        "uint" => "u",
        _ => return None,
    };
    if !(1..=4).contains(&count) {
        return None;
    }
    Some((prefix, count))
}

fn dimension_suffix(kw: Keyword) -> &'static str {
    use Keyword::*;
    match kw {
        Texture1D | RWTexture1D => "1D",
        Texture1DArray | RWTexture1DArray => "1DArray",
        Texture2D | RWTexture2D => "2D",
        Texture2DArray | RWTexture2DArray => "2DArray",
        Texture2DMS => "2DMS",
        Texture2DMSArray => "2DMSArray",
        Texture3D | RWTexture3D => "3D",
        TextureCube => "Cube",
        TextureCubeArray => "CubeArray",
        Buffer | RWBuffer => "Buffer",
        _ => unreachable!("not a texture keyword"),
    }
}

/// Mines an image format from a `/* format = X */` comment in delimiter
/// text.
fn parse_format_comment(delimiter: &str) -> Option<String> {
    let at = delimiter.find("format")?;
    let rest = delimiter[at + "format".len()..].trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_type_parsing() {
        assert_eq!(parse_component_type("float4"), Some(("", 4)));
        assert_eq!(parse_component_type("float"), Some(("", 1)));
        assert_eq!(parse_component_type("int2"), Some(("i", 2)));
        assert_eq!(parse_component_type("uint"), Some(("u", 1)));
        assert_eq!(parse_component_type("half3"), Some(("", 3)));
        assert_eq!(parse_component_type("float8"), None);
        assert_eq!(parse_component_type("double2"), None);
        assert_eq!(parse_component_type("MyStruct"), None);
    }

    #[test]
    fn format_comment_mining() {
        assert_eq!(
            parse_format_comment(" /* format = rgba32f */ "),
            Some("rgba32f".to_string())
        );
        assert_eq!(
            parse_format_comment("/*format=r32ui*/"),
            Some("r32ui".to_string())
        );
        assert_eq!(parse_format_comment(" /* fmt = x */ "), None);
        assert_eq!(parse_format_comment("   "), None);
    }
}
