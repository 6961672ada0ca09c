//! The conversion stream: owns the token list for one translation unit and
//! runs the rewrite pipeline over it.
//!
//! Pass order is fixed and later passes assume earlier rewrites already
//! happened:
//!
//! 1. include inlining + tokenization (at construction);
//! 2. global declaration sweep (`globals`): cbuffers, structured buffers,
//!    struct registration, numeric suffixes, sampler registers,
//!    flow-control attributes;
//! 3. scope scan (`scope`): function spans, sampler tables, entry-point
//!    candidates;
//! 4. texture/image declaration lowering (`textures`);
//! 5. per-function-body call rewriting (`calls`): object methods, atomics,
//!    RW-texture subscripts;
//! 6. entry-point lowering (`stages`), then the cleanup passes and final
//!    reassembly below.

use std::collections::HashMap;
use std::sync::Arc;

use hlsl_lex::{render_source_context, render_token_context, tokenize, TokenId, TokenList, TokenType};
use tracing::debug;

use crate::stubs::StubTables;
use crate::{ConversionAttribs, ConvertError, SourceResolver};

mod calls;
mod globals;
mod includes;
mod params;
mod scope;
mod stages;
mod textures;

pub(crate) use params::{ParamStorage, ShaderParam};

/// A texture/buffer object visible in some lexical scope, as registered by
/// declaration lowering and consulted by the call rewriters.
#[derive(Debug, Clone)]
pub(crate) struct ObjectInfo {
    /// Resolved GLSL sampler/image type (`sampler2DShadow`, `uimage3D`, …).
    pub glsl_type: String,
    /// Element component count in [1, 4]; drives `_SWIZZLEn` correction.
    pub component_count: u32,
    /// Number of trailing `[..]` groups on the declarator (0 = scalar).
    pub array_dim: u32,
    pub is_image: bool,
}

/// One `Identifier (` found at global scope: an entry-point candidate, and
/// (when defined) a function whose body the call rewriters process.
#[derive(Debug)]
pub(crate) struct FunctionInfo {
    pub name: String,
    pub name_id: TokenId,
    pub args_open: TokenId,
    pub args_close: TokenId,
    pub body_open: Option<TokenId>,
    pub body_close: Option<TokenId>,
    /// Sampler-state variables declared in this function's parameter list
    /// (name → is comparison sampler).
    pub samplers: HashMap<String, bool>,
    /// Texture/buffer objects declared in this function's parameters/body.
    pub objects: HashMap<String, ObjectInfo>,
}

/// Converts one HLSL translation unit; reusable across entry points when
/// `preserve_tokens` is set (the post-include token snapshot is restored
/// after every `convert`, successful or not).
///
/// Not reentrant: a stream owns a single mutable token list, so concurrent
/// `convert` calls on one stream are inherently serialized by `&mut self`.
pub struct ConversionStream {
    name: String,
    tables: Arc<StubTables>,
    tokens: TokenList,
    preserve_tokens: bool,
}

impl ConversionStream {
    /// Inlines `#include`s through `resolver` and tokenizes the result.
    pub fn new(
        name: impl Into<String>,
        source: &str,
        resolver: &dyn SourceResolver,
        tables: Arc<StubTables>,
        preserve_tokens: bool,
    ) -> Result<ConversionStream, ConvertError> {
        let name = name.into();
        let inlined = includes::inline_includes(source, resolver)?;
        let tokens = tokenize(&inlined).map_err(|e| ConvertError::Tokenize {
            context: render_source_context(&inlined, e.at, 2),
            source_error: e,
        })?;
        debug!(shader = %name, tokens = tokens.len(), "tokenized");
        Ok(ConversionStream {
            name,
            tables,
            tokens,
            preserve_tokens,
        })
    }

    /// Converts one entry point. Callable repeatedly when the stream was
    /// created with `preserve_tokens`.
    pub fn convert(&mut self, attribs: &ConversionAttribs) -> Result<String, ConvertError> {
        let snapshot = self.preserve_tokens.then(|| self.tokens.clone());
        let result = Rewriter::new(&mut self.tokens, &self.tables, attribs, &self.name).run();
        if let Some(snapshot) = snapshot {
            self.tokens = snapshot;
        }
        if let Err(e) = &result {
            tracing::error!(shader = %self.name, error = %e, "HLSL to GLSL conversion failed");
        }
        result
    }
}

/// Per-`convert` rewrite state over the stream's token list.
pub(crate) struct Rewriter<'a> {
    pub list: &'a mut TokenList,
    pub tables: &'a StubTables,
    pub attribs: &'a ConversionAttribs,
    pub source_name: &'a str,
    /// Struct name → position of its `struct` keyword.
    pub structs: HashMap<String, TokenId>,
    pub global_samplers: HashMap<String, bool>,
    pub global_objects: HashMap<String, ObjectInfo>,
    pub functions: Vec<FunctionInfo>,
    /// Auto-incremented binding index for RW structured buffers.
    pub buffer_binding: u32,
    /// Auto-incremented binding index for RW images; distinct counter from
    /// structured buffers.
    pub image_binding: u32,
}

impl<'a> Rewriter<'a> {
    fn new(
        list: &'a mut TokenList,
        tables: &'a StubTables,
        attribs: &'a ConversionAttribs,
        source_name: &'a str,
    ) -> Rewriter<'a> {
        Rewriter {
            list,
            tables,
            attribs,
            source_name,
            structs: HashMap::new(),
            global_samplers: HashMap::new(),
            global_objects: HashMap::new(),
            functions: Vec::new(),
            buffer_binding: 0,
            image_binding: 0,
        }
    }

    fn run(&mut self) -> Result<String, ConvertError> {
        debug!(
            shader = self.source_name,
            entry = %self.attribs.entry_point,
            stage = ?self.attribs.stage,
            "converting entry point"
        );
        self.process_global_declarations()?;
        self.scan_scopes()?;
        self.lower_object_declarations()?;
        self.rewrite_function_bodies()?;
        self.lower_entry_point()?;
        self.remove_semantics();
        self.remove_special_attributes();
        debug!(shader = self.source_name, "reassembling GLSL source");
        Ok(self.build_source())
    }

    /// A malformed-input error with a rendered context window around `at`.
    pub(crate) fn malformed(&self, at: TokenId, message: impl Into<String>) -> ConvertError {
        ConvertError::MalformedInput {
            message: message.into(),
            context: render_token_context(self.list, at, 6),
        }
    }

    /// Innermost-first object lookup: the function scope (when given), then
    /// global scope.
    pub(crate) fn lookup_object(&self, scope: Option<usize>, name: &str) -> Option<&ObjectInfo> {
        if let Some(f) = scope {
            if let Some(info) = self.functions[f].objects.get(name) {
                return Some(info);
            }
        }
        self.global_objects.get(name)
    }

    /// Innermost-first sampler lookup (name → is comparison sampler).
    pub(crate) fn lookup_sampler(&self, scope: Option<usize>, name: &str) -> Option<bool> {
        if let Some(f) = scope {
            if let Some(&cmp) = self.functions[f].samplers.get(name) {
                return Some(cmp);
            }
        }
        self.global_samplers.get(name).copied()
    }

    pub(crate) fn entry_function(&self) -> Result<usize, ConvertError> {
        self.functions
            .iter()
            .position(|f| f.name == self.attribs.entry_point && f.body_open.is_some())
            .ok_or_else(|| ConvertError::EntryPointNotFound(self.attribs.entry_point.clone()))
    }

    /// Strips trailing `: SEMANTIC` annotations outside function bodies
    /// (struct members, remaining function signatures). Runs after all
    /// semantic information has been consumed by stage lowering.
    fn remove_semantics(&mut self) {
        let bodies: Vec<(TokenId, TokenId)> = self
            .functions
            .iter()
            .filter_map(|f| f.body_open.zip(f.body_close))
            .collect();

        let mut question_pending = false;
        let mut cur = self.list.first();
        while let Some(id) = cur {
            if let Some(&(_, close)) = bodies.iter().find(|&&(open, _)| open == id) {
                cur = self.list.next(close);
                continue;
            }
            match self.list[id].ty {
                TokenType::QuestionMark => question_pending = true,
                TokenType::Semicolon
                | TokenType::Comma
                | TokenType::OpenBrace
                | TokenType::ClosingBrace => question_pending = false,
                TokenType::Colon => {
                    if question_pending {
                        // The matching arm of a ternary, not a semantic.
                        question_pending = false;
                    } else if let Some(sem) = self.list.next(id) {
                        let is_semantic = self.list[sem].ty == TokenType::Identifier
                            && self.list.next(sem).map_or(true, |after| {
                                matches!(
                                    self.list[after].ty,
                                    TokenType::Semicolon
                                        | TokenType::Comma
                                        | TokenType::ClosingParen
                                        | TokenType::OpenBrace
                                )
                            });
                        if is_semantic {
                            let after = self.list.next(sem);
                            self.list.erase(id);
                            self.list.erase(sem);
                            cur = after;
                            continue;
                        }
                    }
                }
                _ => {}
            }
            cur = self.list.next(id);
        }
    }

    /// Deletes `[numthreads(..)]`-style attribute groups that survived
    /// lowering (attributes attached to entry points that were not
    /// selected; they would be invalid GLSL at global scope).
    fn remove_special_attributes(&mut self) {
        const SPECIAL: [&str; 7] = [
            "numthreads",
            "maxvertexcount",
            "domain",
            "partitioning",
            "outputtopology",
            "outputcontrolpoints",
            "patchconstantfunc",
        ];

        let bodies: Vec<(TokenId, TokenId)> = self
            .functions
            .iter()
            .filter_map(|f| f.body_open.zip(f.body_close))
            .collect();

        let mut cur = self.list.first();
        while let Some(id) = cur {
            if let Some(&(_, close)) = bodies.iter().find(|&&(open, _)| open == id) {
                cur = self.list.next(close);
                continue;
            }
            if self.list[id].ty == TokenType::OpenSquare {
                let name_matches = self
                    .list
                    .next(id)
                    .map_or(false, |n| SPECIAL.contains(&self.list[n].literal.as_str()));
                if name_matches {
                    if let Some(close) = hlsl_lex::find_matching_bracket(self.list, id) {
                        let after = self.list.next(close);
                        self.list.erase_range(id, after);
                        cur = after;
                        continue;
                    }
                }
            }
            cur = self.list.next(id);
        }
    }

    /// Final linearization: `delimiter + literal` over the whole list.
    /// Interpolation-qualifier keywords that survived (e.g. in signatures
    /// of functions other than the converted entry point) are dropped, but
    /// their delimiters are kept so spacing stays intact.
    fn build_source(&self) -> String {
        let mut out = String::new();
        if self.attribs.include_definitions {
            out.push_str(crate::GLSL_DEFINITIONS);
            out.push('\n');
        }
        for (_, t) in self.list.iter() {
            if let TokenType::Keyword(kw) = t.ty {
                if kw.is_interpolation_qualifier() {
                    out.push_str(&t.delimiter);
                    continue;
                }
            }
            out.push_str(&t.delimiter);
            out.push_str(&t.literal);
        }
        out
    }
}
