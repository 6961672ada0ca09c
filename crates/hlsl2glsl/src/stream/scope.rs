//! Scope scan: records every global-scope `Identifier (` as an entry-point
//! candidate / function span, and registers sampler-state variables into
//! the right scope table (global, or the function whose parameter list
//! declares them).
//!
//! This pass never rewrites tokens. It deliberately completes over the
//! whole translation unit even after the requested entry point has been
//! seen: later passes rely on the sampler/object registration side effects
//! for *every* function, and "entry point not found" is only reportable
//! after a full scan.

use std::collections::HashMap;

use hlsl_lex::{find_matching_bracket, Keyword, TokenId, TokenType};
use tracing::debug;

use crate::ConvertError;

use super::{FunctionInfo, Rewriter};

impl Rewriter<'_> {
    pub(crate) fn scan_scopes(&mut self) -> Result<(), ConvertError> {
        debug!(shader = self.source_name, "scanning scopes");
        let mut cur = self.list.first();
        while let Some(id) = cur {
            match self.list[id].ty {
                TokenType::Keyword(kw @ (Keyword::SamplerState | Keyword::SamplerComparisonState)) => {
                    cur = self.register_global_samplers(id, kw == Keyword::SamplerComparisonState);
                }
                TokenType::Identifier => {
                    let next = self.list.next(id);
                    if next.map_or(false, |n| self.list[n].ty == TokenType::OpenParen) {
                        cur = self.record_function(id)?;
                    } else {
                        cur = next;
                    }
                }
                TokenType::OpenBrace => {
                    // A brace at global scope outside any function is a
                    // cbuffer/struct body; nothing to record inside.
                    cur = find_matching_bracket(self.list, id)
                        .map_or(None, |close| self.list.next(close));
                }
                _ => cur = self.list.next(id),
            }
        }
        if self.functions.is_empty() {
            debug!(shader = self.source_name, "no functions found at global scope");
        }
        Ok(())
    }

    /// `SamplerState a, b; SamplerComparisonState c;` at global scope.
    fn register_global_samplers(&mut self, id: TokenId, comparison: bool) -> Option<TokenId> {
        let mut cur = self.list.next(id);
        while let Some(c) = cur {
            match self.list[c].ty {
                TokenType::Identifier => {
                    self.global_samplers
                        .insert(self.list[c].literal.clone(), comparison);
                    cur = self.list.next(c);
                }
                TokenType::Comma => cur = self.list.next(c),
                _ => return Some(c),
            }
        }
        cur
    }

    /// Records one `Identifier (` candidate. For a defined function the
    /// argument list is re-entered to harvest sampler parameters into a
    /// fresh scope level that lives for the function body.
    fn record_function(&mut self, name_id: TokenId) -> Result<Option<TokenId>, ConvertError> {
        let args_open = self.list.next(name_id).expect("checked by caller");
        let args_close = find_matching_bracket(self.list, args_open)
            .ok_or_else(|| self.malformed(args_open, "unmatched \"(\" in function declaration"))?;

        let mut samplers = HashMap::new();
        let mut arg = self.list.next(args_open);
        while let Some(a) = arg {
            if a == args_close {
                break;
            }
            if let Some(kw @ (Keyword::SamplerState | Keyword::SamplerComparisonState)) =
                self.list[a].keyword()
            {
                if let Some(n) = self.list.next(a) {
                    if self.list[n].ty == TokenType::Identifier {
                        samplers.insert(
                            self.list[n].literal.clone(),
                            kw == Keyword::SamplerComparisonState,
                        );
                    }
                }
            }
            arg = self.list.next(a);
        }

        // A following `{` makes it a definition; a prototype is recorded as
        // a candidate only.
        let (body_open, body_close) = match self.list.next(args_close) {
            Some(b) if self.list[b].ty == TokenType::OpenBrace => {
                let close = find_matching_bracket(self.list, b)
                    .ok_or_else(|| self.malformed(b, "unmatched \"{\" in function body"))?;
                (Some(b), Some(close))
            }
            Some(b) if self.list[b].ty == TokenType::Colon => {
                // Return-value semantic: `float4 Main(..) : SV_Target {`.
                let brace = self
                    .list
                    .next(b)
                    .and_then(|sem| self.list.next(sem))
                    .filter(|&o| self.list[o].ty == TokenType::OpenBrace);
                match brace {
                    Some(o) => {
                        let close = find_matching_bracket(self.list, o)
                            .ok_or_else(|| self.malformed(o, "unmatched \"{\" in function body"))?;
                        (Some(o), Some(close))
                    }
                    None => (None, None),
                }
            }
            _ => (None, None),
        };

        let name = self.list[name_id].literal.clone();
        debug!(function = %name, defined = body_open.is_some(), "recorded function");
        let resume = body_close.map_or_else(|| self.list.next(args_close), |c| self.list.next(c));
        self.functions.push(FunctionInfo {
            name,
            name_id,
            args_open,
            args_close,
            body_open,
            body_close,
            samplers,
            objects: HashMap::new(),
        });
        Ok(resume)
    }
}
