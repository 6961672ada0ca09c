//! Linear global sweep: the first rewriting pass after tokenization.
//!
//! One pass over the whole list handles everything that does not need scope
//! information: `cbuffer` → uniform block, structured buffers → buffer
//! blocks + alias define, struct registration, numeric suffix stripping,
//! sampler-state register stripping, and flow-control attribute deletion.

use hlsl_lex::{find_matching_bracket, Keyword, Token, TokenId, TokenType};
use tracing::debug;

use crate::ConvertError;

use super::Rewriter;

/// Attribute names that decorate flow-control statements and have no GLSL
/// counterpart.
const FLOW_ATTRIBUTES: [&str; 7] = [
    "branch",
    "flatten",
    "loop",
    "unroll",
    "fastopt",
    "call",
    "allow_uav_condition",
];

impl Rewriter<'_> {
    pub(crate) fn process_global_declarations(&mut self) -> Result<(), ConvertError> {
        debug!(shader = self.source_name, "global declaration sweep");
        let mut cur = self.list.first();
        while let Some(id) = cur {
            cur = match self.list[id].ty {
                TokenType::Keyword(Keyword::Cbuffer) => self.lower_cbuffer(id)?,
                TokenType::Keyword(Keyword::StructuredBuffer) => {
                    self.lower_structured_buffer(id, false)?
                }
                TokenType::Keyword(Keyword::RWStructuredBuffer) => {
                    self.lower_structured_buffer(id, true)?
                }
                TokenType::Keyword(Keyword::Struct) => self.register_struct(id),
                TokenType::Keyword(Keyword::SamplerState)
                | TokenType::Keyword(Keyword::SamplerComparisonState) => {
                    self.strip_sampler_registers(id)
                }
                TokenType::NumericConstant => {
                    // Downstream GLSL compilers warn on float suffixes.
                    let lit = &mut self.list[id].literal;
                    if lit.ends_with('f') || lit.ends_with('F') {
                        lit.pop();
                    }
                    self.list.next(id)
                }
                TokenType::OpenSquare => self.try_remove_flow_attribute(id),
                _ => self.list.next(id),
            };
        }
        Ok(())
    }

    /// `cbuffer Name [: register(b0)] { ... }[;]` → `uniform Name { ... };`
    ///
    /// The returned cursor points into the block body so the sweep still
    /// visits member declarations.
    fn lower_cbuffer(&mut self, id: TokenId) -> Result<Option<TokenId>, ConvertError> {
        let name_id = self
            .list
            .next(id)
            .filter(|&n| self.list[n].ty == TokenType::Identifier)
            .ok_or_else(|| self.malformed(id, "identifier expected after \"cbuffer\""))?;

        let t = &mut self.list[id];
        t.ty = TokenType::Identifier;
        t.literal = "uniform".to_string();

        let mut after_name = self.list.next(name_id);
        after_name = self.strip_register_clause(after_name);

        let open = after_name
            .filter(|&o| self.list[o].ty == TokenType::OpenBrace)
            .ok_or_else(|| self.malformed(name_id, "\"{\" expected after cbuffer name"))?;
        let close = find_matching_bracket(self.list, open)
            .ok_or_else(|| self.malformed(open, "no matching closing brace for cbuffer"))?;

        // Idempotent semicolon insertion: a block already followed by `;`
        // must not gain a second one.
        let needs_semicolon = self
            .list
            .next(close)
            .map_or(true, |n| self.list[n].ty != TokenType::Semicolon);
        if needs_semicolon {
            self.list
                .insert_after(close, Token::new(TokenType::Semicolon, ";"));
        }

        Ok(self.list.next(open))
    }

    /// `[RW]StructuredBuffer<T> Name [: register(..)];` →
    /// `layout(std140[, binding = N]) [readonly] buffer Name { T Name_data[]; };`
    /// plus a `#define Name Name_data` so later references pick up the
    /// interior array name transparently.
    fn lower_structured_buffer(
        &mut self,
        id: TokenId,
        rw: bool,
    ) -> Result<Option<TokenId>, ConvertError> {
        let open_angle = self
            .list
            .next(id)
            .filter(|&n| self.list[n].ty == TokenType::OpenAngle)
            .ok_or_else(|| self.malformed(id, "\"<\" expected after structured buffer keyword"))?;
        let close_angle = find_matching_bracket(self.list, open_angle)
            .ok_or_else(|| self.malformed(open_angle, "no matching \">\""))?;

        let mut elem_type = String::new();
        for tid in self.list.ids_range(self.list.next(open_angle), Some(close_angle)) {
            elem_type.push_str(&self.list[tid].delimiter);
            elem_type.push_str(&self.list[tid].literal);
        }
        let elem_type = elem_type.trim().to_string();

        let name_id = self
            .list
            .next(close_angle)
            .filter(|&n| self.list[n].ty == TokenType::Identifier)
            .ok_or_else(|| self.malformed(close_angle, "buffer name expected after \">\""))?;
        let name = self.list[name_id].literal.clone();

        // Everything through the terminating semicolon is replaced
        // wholesale (including any register clause).
        let mut semi = self.list.next(name_id);
        while let Some(s) = semi {
            if self.list[s].ty == TokenType::Semicolon {
                break;
            }
            semi = self.list.next(s);
        }
        let semi = semi.ok_or_else(|| self.malformed(name_id, "\";\" expected after buffer declaration"))?;
        let after = self.list.next(semi);

        let layout = if rw {
            let binding = self.buffer_binding;
            self.buffer_binding += 1;
            format!("layout(std140, binding = {binding}) buffer")
        } else {
            "layout(std140) readonly buffer".to_string()
        };
        let block = format!("{layout} {name}\n{{\n    {elem_type} {name}_data[];\n}};");
        let delimiter = self.list[id].delimiter.clone();

        self.list.erase_range(id, after);
        let block_id = self
            .list
            .insert_before(after, Token::new(TokenType::TextBlock, block).with_delimiter(delimiter));
        self.list.insert_after(
            block_id,
            Token::new(
                TokenType::PreprocessorDirective,
                format!("#define {name} {name}_data"),
            )
            .with_delimiter("\n"),
        );

        debug!(buffer = %name, rw, "lowered structured buffer");
        Ok(after)
    }

    /// Records `struct Name` in the struct index; the body is left alone
    /// (semantics inside it are consumed by parameter flattening and
    /// stripped by the cleanup pass).
    fn register_struct(&mut self, id: TokenId) -> Option<TokenId> {
        let name_id = self.list.next(id)?;
        if self.list[name_id].ty == TokenType::Identifier {
            let name = self.list[name_id].literal.clone();
            self.structs.insert(name, id);
        }
        self.list.next(name_id)
    }

    /// Sampler-state declarations keep their shape (the definitions header
    /// turns the type into a harmless typed variable); only `: register(..)`
    /// clauses are stripped, for every declarator in the statement.
    fn strip_sampler_registers(&mut self, id: TokenId) -> Option<TokenId> {
        let mut cur = self.list.next(id);
        while let Some(c) = cur {
            match self.list[c].ty {
                TokenType::Semicolon | TokenType::ClosingParen | TokenType::OpenBrace => {
                    return Some(c)
                }
                TokenType::Colon => cur = self.strip_register_clause(Some(c)),
                _ => cur = self.list.next(c),
            }
        }
        cur
    }

    /// If `at` starts a `: register(...)` clause, erases it and returns the
    /// position after; otherwise returns `at` unchanged.
    pub(crate) fn strip_register_clause(&mut self, at: Option<TokenId>) -> Option<TokenId> {
        let colon = at?;
        if self.list[colon].ty != TokenType::Colon {
            return at;
        }
        let reg = self.list.next(colon)?;
        if !self.list[reg].is_ident("register") {
            return at;
        }
        let open = self.list.next(reg)?;
        if self.list[open].ty != TokenType::OpenParen {
            return at;
        }
        let close = find_matching_bracket(self.list, open)?;
        let after = self.list.next(close);
        self.list.erase_range(colon, after);
        after
    }

    /// Deletes `[branch]`/`[loop]`/`[unroll(4)]`-style groups immediately
    /// preceding a flow-control keyword.
    fn try_remove_flow_attribute(&mut self, id: TokenId) -> Option<TokenId> {
        let name_id = self.list.next(id)?;
        if self.list[name_id].ty != TokenType::Identifier
            || !FLOW_ATTRIBUTES.contains(&self.list[name_id].literal.as_str())
        {
            return self.list.next(id);
        }
        let close = find_matching_bracket(self.list, id)?;

        // Allow several stacked attribute groups before the statement.
        let mut after = self.list.next(close);
        while let Some(a) = after {
            if self.list[a].ty != TokenType::OpenSquare {
                break;
            }
            after = find_matching_bracket(self.list, a).and_then(|c| self.list.next(c));
        }
        let precedes_flow = after.map_or(false, |a| {
            self.list[a]
                .keyword()
                .map_or(false, |kw| kw.is_flow_control())
        });
        if !precedes_flow {
            return self.list.next(id);
        }

        let resume = self.list.next(close);
        self.list.erase_range(id, resume);
        resume
    }
}
