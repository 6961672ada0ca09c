//! Function-body call rewriting: object method calls, atomic operations,
//! and RW-texture subscript load/store shapes.
//!
//! One forward walk per function body. The walk is re-entrant by cursor
//! placement: after rewriting a call the cursor resumes inside its argument
//! list, so nested calls (`Tex.Sample(..)` inside another call's
//! arguments) are processed independently.

use hlsl_lex::{find_matching_bracket, Token, TokenId, TokenType};
use tracing::debug;

use crate::stubs::SwizzlePolicy;
use crate::ConvertError;

use super::Rewriter;

impl Rewriter<'_> {
    pub(crate) fn rewrite_function_bodies(&mut self) -> Result<(), ConvertError> {
        for f in 0..self.functions.len() {
            let (Some(open), Some(close)) =
                (self.functions[f].body_open, self.functions[f].body_close)
            else {
                continue;
            };
            self.rewrite_body(f, open, close)?;
        }
        Ok(())
    }

    fn rewrite_body(
        &mut self,
        f: usize,
        open: TokenId,
        close: TokenId,
    ) -> Result<(), ConvertError> {
        let mut cur = self.list.next(open);
        while let Some(id) = cur {
            if id == close {
                break;
            }
            match self.list[id].ty {
                TokenType::Dot => {
                    if let Some(resume) = self.rewrite_object_method(f, id)? {
                        cur = Some(resume);
                        continue;
                    }
                }
                TokenType::Identifier => {
                    if self.tables.is_atomic(&self.list[id].literal) {
                        if let Some(resume) = self.rewrite_atomic(f, id)? {
                            cur = Some(resume);
                            continue;
                        }
                    } else {
                        let image = self
                            .lookup_object(Some(f), &self.list[id].literal)
                            .filter(|o| o.is_image)
                            .map(|o| o.array_dim);
                        if let Some(array_dim) = image {
                            if let Some(resume) = self.rewrite_rw_access(id, array_dim)? {
                                cur = Some(resume);
                                continue;
                            }
                        }
                    }
                }
                _ => {}
            }
            cur = self.list.next(id);
        }
        Ok(())
    }

    /// `Obj.Method(args...)` → `Method_N(Obj, args...)[_SWIZZLEn]`.
    ///
    /// A `.` whose base identifier is not a registered object is left alone
    /// (struct member access). A registered object with no matching stub is
    /// a hard error.
    fn rewrite_object_method(
        &mut self,
        f: usize,
        dot: TokenId,
    ) -> Result<Option<TokenId>, ConvertError> {
        // Walk backward over matched closing brackets to the owning
        // identifier (`Arr[i].Sample`, `Tex2DArr[j][k].Load`, ...).
        let Some(mut p) = self.list.prev(dot) else {
            return Ok(None);
        };
        let base = loop {
            match self.list[p].ty {
                TokenType::ClosingSquare | TokenType::ClosingParen | TokenType::ClosingAngle => {
                    let Some(open) = find_matching_bracket(self.list, p) else {
                        return Ok(None);
                    };
                    let Some(before) = self.list.prev(open) else {
                        return Ok(None);
                    };
                    p = before;
                }
                TokenType::Identifier => break p,
                _ => return Ok(None),
            }
        };

        let base_name = self.list[base].literal.clone();
        let Some((glsl_type, component_count)) = self
            .lookup_object(Some(f), &base_name)
            .map(|o| (o.glsl_type.clone(), o.component_count))
        else {
            return Ok(None);
        };

        let Some(method_id) = self
            .list
            .next(dot)
            .filter(|&m| self.list[m].ty == TokenType::Identifier)
        else {
            return Ok(None);
        };
        let Some(args_open) = self
            .list
            .next(method_id)
            .filter(|&o| self.list[o].ty == TokenType::OpenParen)
        else {
            return Ok(None);
        };
        let args_close = find_matching_bracket(self.list, args_open)
            .ok_or_else(|| self.malformed(args_open, "unmatched \"(\" in method call"))?;
        let arity = self.count_call_args(args_open, args_close);

        let method = self.list[method_id].literal.clone();
        let Some(stub) = self.tables.stub(&glsl_type, &method, arity) else {
            return Err(ConvertError::MissingStub {
                call: self.render_call(base, args_close),
                object_type: glsl_type,
                method,
                arity,
            });
        };
        let stub_name = stub.name.clone();
        let swizzle = stub.swizzle;
        debug!(object = %base_name, method = %self.list[method_id].literal, arity, stub = %stub_name, "rewriting object method");

        // `Obj ... .Method (` becomes `Stub ( Obj ... ,`.
        let base_delim = std::mem::take(&mut self.list[base].delimiter);
        let stub_id = self.list.insert_before(
            Some(base),
            Token::new(TokenType::Identifier, stub_name).with_delimiter(base_delim),
        );
        self.list
            .insert_after(stub_id, Token::new(TokenType::OpenParen, "("));
        self.list.erase(dot);
        self.list.erase(method_id);

        let resume = self.list.next(args_open);
        if arity == 0 {
            self.list.erase(args_open);
        } else {
            let t = &mut self.list[args_open];
            t.ty = TokenType::Comma;
            t.literal = ",".to_string();
            if let Some(first_arg) = resume {
                if self.list[first_arg].delimiter.is_empty() {
                    self.list[first_arg].delimiter = " ".to_string();
                }
            }
        }

        if swizzle == SwizzlePolicy::ComponentCount {
            self.list.insert_after(
                args_close,
                Token::new(TokenType::TextBlock, format!("_SWIZZLE{component_count}")),
            );
        }
        Ok(Some(resume.unwrap_or(args_close)))
    }

    /// `InterlockedXxx(dest, ...)`: routes to the image stub family when
    /// the destination resolves to an image object (rewriting the final
    /// `[coord]` subscript into a plain argument), else to the
    /// shared-variable family.
    fn rewrite_atomic(&mut self, f: usize, id: TokenId) -> Result<Option<TokenId>, ConvertError> {
        let Some(args_open) = self
            .list
            .next(id)
            .filter(|&o| self.list[o].ty == TokenType::OpenParen)
        else {
            return Ok(None);
        };
        let args_close = find_matching_bracket(self.list, args_open)
            .ok_or_else(|| self.malformed(args_open, "unmatched \"(\" in atomic call"))?;
        let arity = self.count_call_args(args_open, args_close);
        let name = self.list[id].literal.clone();

        let first_arg = self.list.next(args_open).filter(|&a| a != args_close);
        let dest_image = first_arg
            .filter(|&a| self.list[a].ty == TokenType::Identifier)
            .and_then(|a| {
                self.lookup_object(Some(f), &self.list[a].literal)
                    .filter(|o| o.is_image)
                    .map(|o| (a, o.array_dim))
            });

        match dest_image {
            Some((obj, array_dim)) => {
                let Some(stub) = self.tables.atomic_stub("image", &name, arity) else {
                    return Err(ConvertError::MissingStub {
                        call: self.render_call(id, args_close),
                        object_type: "image".to_string(),
                        method: name,
                        arity,
                    });
                };
                self.list[id].literal = stub.to_string();

                // The destination must carry ArrayDim leading subscripts
                // plus the coordinate subscript.
                let mut c = self.list.next(obj);
                let mut last_group = None;
                for _ in 0..=array_dim {
                    let open = c
                        .filter(|&o| self.list[o].ty == TokenType::OpenSquare)
                        .ok_or_else(|| {
                            self.malformed(obj, "\"[\" subscript expected on image atomic destination")
                        })?;
                    let close = find_matching_bracket(self.list, open)
                        .ok_or_else(|| self.malformed(open, "no matching \"]\""))?;
                    last_group = Some((open, close));
                    c = self.list.next(close);
                }
                let (coord_open, coord_close) = last_group.expect("at least one subscript");
                let t = &mut self.list[coord_open];
                t.ty = TokenType::TextBlock;
                t.literal = ", _ToIvec(".to_string();
                let t = &mut self.list[coord_close];
                t.ty = TokenType::TextBlock;
                t.literal = ")".to_string();
                Ok(Some(self.list.next(coord_open).unwrap_or(coord_close)))
            }
            None => {
                let Some(stub) = self.tables.atomic_stub("shared", &name, arity) else {
                    return Err(ConvertError::MissingStub {
                        call: self.render_call(id, args_close),
                        object_type: "shared variable".to_string(),
                        method: name,
                        arity,
                    });
                };
                self.list[id].literal = stub.to_string();
                Ok(self.list.next(args_open))
            }
        }
    }

    /// Store/load shapes on an image object:
    /// `Obj[..][Loc] = Expr;` → `imageStore(Obj[..], _ToIvec(Loc), _ExpandVector(Expr));`
    /// `Obj[..][Loc]`        → `imageLoad(Obj[..], _ToIvec(Loc))`
    ///
    /// A reference matching neither shape (bare argument, compound
    /// assignment, partial subscript chain) is left untouched; later passes
    /// or the downstream GLSL compiler deal with it.
    fn rewrite_rw_access(
        &mut self,
        id: TokenId,
        array_dim: u32,
    ) -> Result<Option<TokenId>, ConvertError> {
        let mut c = self.list.next(id);
        let mut groups = Vec::new();
        for _ in 0..=array_dim {
            let Some(open) = c.filter(|&o| self.list[o].ty == TokenType::OpenSquare) else {
                if !groups.is_empty() {
                    debug!(
                        object = %self.list[id].literal,
                        "image reference with partial subscript chain left untouched"
                    );
                }
                return Ok(None);
            };
            let close = find_matching_bracket(self.list, open)
                .ok_or_else(|| self.malformed(open, "no matching \"]\""))?;
            groups.push((open, close));
            c = self.list.next(close);
        }
        let (coord_open, coord_close) = *groups.last().expect("at least one subscript");

        let is_store = c.map_or(false, |a| {
            self.list[a].ty == TokenType::Assignment && self.list[a].literal == "="
        });
        if !is_store
            && c.map_or(false, |a| self.list[a].ty == TokenType::Assignment)
        {
            // Compound assignment (`+=` etc.) has no image equivalent here.
            debug!(
                object = %self.list[id].literal,
                "compound assignment to image subscript left untouched"
            );
            return Ok(None);
        }

        let delim = std::mem::take(&mut self.list[id].delimiter);
        let call = if is_store { "imageStore(" } else { "imageLoad(" };
        self.list.insert_before(
            Some(id),
            Token::new(TokenType::TextBlock, call).with_delimiter(delim),
        );
        let t = &mut self.list[coord_open];
        t.ty = TokenType::TextBlock;
        t.literal = ", _ToIvec(".to_string();

        if is_store {
            let assign = c.expect("store shape checked");
            let t = &mut self.list[coord_close];
            t.ty = TokenType::TextBlock;
            t.literal = ")".to_string();
            let t = &mut self.list[assign];
            t.ty = TokenType::TextBlock;
            t.literal = ", _ExpandVector(".to_string();

            // Close both calls at the end of the statement.
            let mut depth = 0i32;
            let mut s = self.list.next(assign);
            let semi = loop {
                let Some(sid) = s else {
                    return Err(self.malformed(assign, "\";\" expected after image store"));
                };
                let ty = self.list[sid].ty;
                if ty.is_open_bracket() && ty != TokenType::OpenAngle {
                    depth += 1;
                } else if ty.is_closing_bracket() && ty != TokenType::ClosingAngle {
                    depth -= 1;
                } else if ty == TokenType::Semicolon && depth == 0 {
                    break sid;
                }
                s = self.list.next(sid);
            };
            self.list
                .insert_before(Some(semi), Token::new(TokenType::TextBlock, "))"));
            // Resume inside the coordinate so nested loads there (and in
            // the stored expression) still get rewritten.
            Ok(self.list.next(coord_open))
        } else {
            let t = &mut self.list[coord_close];
            t.ty = TokenType::TextBlock;
            t.literal = "))".to_string();
            Ok(self.list.next(coord_open))
        }
    }

    /// Comma count at depth 1 relative to the call's own parentheses;
    /// nested call commas do not count.
    fn count_call_args(&self, open: TokenId, close: TokenId) -> usize {
        let mut args = 0usize;
        let mut depth = 0i32;
        for id in self.list.ids_range(self.list.next(open), Some(close)) {
            let ty = self.list[id].ty;
            if ty.is_open_bracket() && ty != TokenType::OpenAngle {
                depth += 1;
            } else if ty.is_closing_bracket() && ty != TokenType::ClosingAngle {
                depth -= 1;
            } else if ty == TokenType::Comma && depth == 0 {
                args += 1;
            }
            if args == 0 {
                // Any non-delimiter token inside the parens means at least
                // one argument.
                args = 1;
            }
        }
        args
    }

    /// Textual form of a call for error messages.
    fn render_call(&self, from: TokenId, to: TokenId) -> String {
        let mut out = String::new();
        for id in self.list.ids_range(Some(from), self.list.next(to)) {
            if !out.is_empty() && !self.list[id].delimiter.is_empty() {
                out.push(' ');
            }
            out.push_str(&self.list[id].literal);
        }
        out
    }
}
