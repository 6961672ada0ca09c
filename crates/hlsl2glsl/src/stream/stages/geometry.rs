//! Geometry-stage lowering.
//!
//! The primitive-typed input parameter is materialized as a local
//! fixed-size array filled from per-vertex interface arrays; the
//! `inout *Stream<T>` parameter becomes the output layout plus
//! `Name_Append`/`Name_RestartStrip` macros wrapping per-field output
//! assignment and `EmitVertex()`/`EndPrimitive()`.

use hlsl_lex::{Keyword, TokenType};

use crate::stream::{ParamStorage, Rewriter, ShaderParam};
use crate::stubs::IoDirection;
use crate::{ConvertError, ShaderStage};

use super::{gs_out_var, interface_var, EntryLowering, GlslWriter};

fn input_primitive(kw: Keyword) -> (&'static str, u32) {
    match kw {
        Keyword::Point => ("points", 1),
        Keyword::Line => ("lines", 2),
        Keyword::Triangle => ("triangles", 3),
        Keyword::LineAdj => ("lines_adjacency", 4),
        Keyword::TriangleAdj => ("triangles_adjacency", 6),
        _ => unreachable!("not a GS primitive keyword"),
    }
}

fn output_topology(kw: Keyword) -> &'static str {
    match kw {
        Keyword::PointStream => "points",
        Keyword::LineStream => "line_strip",
        Keyword::TriangleStream => "triangle_strip",
        _ => unreachable!("not a GS stream keyword"),
    }
}

impl Rewriter<'_> {
    pub(crate) fn lower_geometry(
        &mut self,
        f: usize,
        params: &[ShaderParam],
        ret: Option<&ShaderParam>,
    ) -> Result<(), ConvertError> {
        let attrs = self.entry_attributes(f);
        let max_vertices = attrs
            .iter()
            .find(|a| a.name == "maxvertexcount")
            .and_then(|a| a.arg(0))
            .map(str::to_string)
            .ok_or(ConvertError::MissingAttribute {
                name: "maxvertexcount",
            })?;

        if let Some(r) = ret {
            return Err(ConvertError::InvalidSemantic {
                semantic: r.semantic.clone().unwrap_or_else(|| "<return value>".into()),
                direction: "output",
                stage: ShaderStage::Geometry,
            });
        }

        let mut globals = GlslWriter::new();
        let mut prologue = GlslWriter::new();
        prologue.indent();
        let mut stream_names: Vec<String> = Vec::new();

        for p in params {
            if let Some(prim) = p.gs_primitive {
                let (glsl_prim, vertex_count) = input_primitive(prim);
                globals.line(&format!("layout({glsl_prim}) in;"));

                let count = p
                    .array_size
                    .clone()
                    .unwrap_or_else(|| vertex_count.to_string());
                prologue.line(&format!("{} {}[{count}];", p.type_text, p.name));
                prologue.line(&format!("for (int _i = 0; _i < {count}; ++_i)"));
                prologue.line("{");
                prologue.indent();
                for (path, leaf) in p.leaves(&format!("{}[_i]", p.name)) {
                    let sem = self.require_semantic(leaf, &path)?;
                    match self
                        .tables
                        .semantic_macro(ShaderStage::Geometry, IoDirection::In, &sem)
                    {
                        Some(mac) if mac.indexed => {
                            prologue.line(&format!("{path} = {}(_i);", mac.name))
                        }
                        Some(mac) => prologue.line(&format!("{path} = {};", mac.name)),
                        None => {
                            let var = interface_var(&sem);
                            globals.line(&format!("in {} {var}[];", leaf.type_text));
                            prologue.line(&format!("{path} = {var}[_i];"));
                        }
                    }
                }
                prologue.dedent();
                prologue.line("}");
            } else if let Some(stream) = p.gs_stream {
                globals.line(&format!(
                    "layout({}, max_vertices = {max_vertices}) out;",
                    output_topology(stream)
                ));

                let mut append_lines: Vec<String> = Vec::new();
                for (path, leaf) in p.leaves("(_VERTEX_)") {
                    let sem = self.require_semantic(leaf, &path)?;
                    match self
                        .tables
                        .semantic_macro(ShaderStage::Geometry, IoDirection::Out, &sem)
                    {
                        Some(mac) => append_lines.push(format!("{}({path});", mac.name)),
                        None => {
                            let var = gs_out_var(&sem);
                            let qualifier = leaf
                                .interpolation
                                .map(|i| i.glsl_qualifier())
                                .unwrap_or("");
                            globals.line(&format!("{qualifier}out {} {var};", leaf.type_text));
                            append_lines.push(format!("{var} = {path};"));
                        }
                    }
                }
                append_lines.push("EmitVertex();".to_string());
                globals.line("");
                globals.macro_def(&format!("{}_Append(_VERTEX_)", p.name), &append_lines);
                globals.line(&format!("#define {}_RestartStrip() EndPrimitive()", p.name));
                stream_names.push(p.name.clone());
            } else if matches!(p.storage, ParamStorage::In) {
                prologue.line(&format!("{} {}{};", p.type_text, p.name, p.array_suffix()));
                for (path, leaf) in p.leaves(&p.name) {
                    let sem = self.require_semantic(leaf, &path)?;
                    let mac = self
                        .tables
                        .semantic_macro(ShaderStage::Geometry, IoDirection::In, &sem)
                        .ok_or_else(|| ConvertError::InvalidSemantic {
                            semantic: sem.clone(),
                            direction: "input",
                            stage: ShaderStage::Geometry,
                        })?;
                    prologue.line(&format!("{path} = {};", mac.name));
                }
            } else {
                return Err(ConvertError::InvalidSemantic {
                    semantic: p.semantic.clone().unwrap_or_else(|| p.name.clone()),
                    direction: "output",
                    stage: ShaderStage::Geometry,
                });
            }
        }

        for stream in &stream_names {
            self.rewrite_stream_calls(f, stream);
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

    /// `Out.Append(v)` → `Out_Append(v)`, `Out.RestartStrip()` →
    /// `Out_RestartStrip()`.
    fn rewrite_stream_calls(&mut self, f: usize, stream: &str) {
        let (Some(open), Some(close)) = (self.functions[f].body_open, self.functions[f].body_close)
        else {
            return;
        };
        let mut cur = self.list.next(open);
        while let Some(id) = cur {
            if id == close {
                break;
            }
            cur = self.list.next(id);
            if !self.list[id].is_ident(stream) {
                continue;
            }
            let Some(dot) = self
                .list
                .next(id)
                .filter(|&d| self.list[d].ty == TokenType::Dot)
            else {
                continue;
            };
            let Some(method) = self
                .list
                .next(dot)
                .filter(|&m| matches!(self.list[m].literal.as_str(), "Append" | "RestartStrip"))
            else {
                continue;
            };
            let method_name = self.list[method].literal.clone();
            self.list[id].literal = format!("{stream}_{method_name}");
            self.list.erase(dot);
            self.list.erase(method);
            cur = self.list.next(id);
        }
    }
}
