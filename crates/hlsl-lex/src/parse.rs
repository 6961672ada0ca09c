//! Structural helpers over a token list: bracket matching, scoped walks,
//! and depth-0 function-call lookup.

use crate::list::{TokenId, TokenList};
use crate::token::TokenType;

/// Finds the token matching the bracket at `at`.
///
/// Scans forward for an open bracket and backward for a closing one,
/// counting nesting within the same bracket family only (a `(` inside a
/// `[...]` scan does not affect the counter). Returns `None` when `at` is
/// not a bracket or the bracket is unmatched.
pub fn find_matching_bracket(list: &TokenList, at: TokenId) -> Option<TokenId> {
    let open_ty = list[at].ty;
    let close_ty = open_ty.matching_bracket()?;
    let forward = open_ty.is_open_bracket();

    let mut depth = 0i32;
    let mut cur = Some(at);
    while let Some(id) = cur {
        let ty = list[id].ty;
        if ty == open_ty {
            depth += 1;
        } else if ty == close_ty {
            depth -= 1;
            if depth == 0 {
                return Some(id);
            }
        }
        cur = if forward { list.next(id) } else { list.prev(id) };
    }
    None
}

/// Walks a scope delimited by `open`/`close` token types.
///
/// The handler is called for every visited token with the current nesting
/// depth and must return the next position to visit (it owns iteration, so
/// it can consume several tokens per call). The depth starts at 1 when the
/// walk begins on an `open` token, 0 otherwise; the walk stops at `end` or
/// at the close matching the initial open, whichever comes first, and
/// returns the position it stopped at (`Ok(Some(close))` / `Ok(end)`).
pub fn process_scope<E>(
    list: &TokenList,
    start: Option<TokenId>,
    end: Option<TokenId>,
    open: TokenType,
    close: TokenType,
    handler: &mut dyn FnMut(TokenId, i32) -> Result<Option<TokenId>, E>,
) -> Result<Option<TokenId>, E> {
    let started_on_open = start.map_or(false, |id| list[id].ty == open);
    let mut depth = 0i32;
    let mut cur = start;
    while let Some(id) = cur {
        if cur == end {
            break;
        }
        let ty = list[id].ty;
        if ty == open {
            depth += 1;
        } else if ty == close {
            depth -= 1;
            if started_on_open && depth == 0 {
                return Ok(Some(id));
            }
        }
        cur = handler(id, depth)?;
    }
    Ok(cur)
}

/// Finds a call `name (` in `[start, end)` at bracket nesting depth 0
/// (relative to `start`, over parens, braces and square brackets).
pub fn find_function_call(
    list: &TokenList,
    name: &str,
    start: Option<TokenId>,
    end: Option<TokenId>,
) -> Option<TokenId> {
    let mut depth = 0i32;
    let mut cur = start;
    while let Some(id) = cur {
        if cur == end {
            break;
        }
        let ty = list[id].ty;
        if ty.is_open_bracket() && ty != TokenType::OpenAngle {
            depth += 1;
        } else if ty.is_closing_bracket() && ty != TokenType::ClosingAngle {
            depth -= 1;
        } else if depth == 0 && list[id].is_ident(name) {
            if let Some(next) = list.next(id) {
                if list[next].ty == TokenType::OpenParen {
                    return Some(id);
                }
            }
        }
        cur = list.next(id);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn ids_of(list: &TokenList, lit: &str) -> Vec<TokenId> {
        list.iter()
            .filter(|(_, t)| t.literal == lit)
            .map(|(id, _)| id)
            .collect()
    }

    #[test]
    fn bracket_matching_is_symmetric() {
        let list = tokenize("f(a[b(c)], (d))[e]").unwrap();
        for (id, t) in list.iter() {
            if t.ty.is_open_bracket() {
                let close = find_matching_bracket(&list, id).expect("matched");
                let back = find_matching_bracket(&list, close).expect("matched back");
                assert_eq!(back, id, "backward scan must return to the open token");
            }
        }
    }

    #[test]
    fn bracket_families_do_not_interfere() {
        // The `[` is unmatched, but the paren scan only counts parens.
        let list = tokenize("f(a[b)").unwrap();
        let open = ids_of(&list, "(")[0];
        let close = find_matching_bracket(&list, open).expect("paren matched");
        assert_eq!(list[close].literal, ")");
    }

    #[test]
    fn unmatched_bracket_returns_none() {
        let list = tokenize("f(a[b)").unwrap();
        let open_sq = ids_of(&list, "[")[0];
        assert_eq!(find_matching_bracket(&list, open_sq), None);
    }

    #[test]
    fn function_call_found_only_at_depth_zero() {
        let list = tokenize("void g() { PCF(1); } float4 PCF(float x) { return x; }").unwrap();
        // The PCF *call* is inside braces; only the depth-0 definition-style
        // occurrence is returned when scanning the whole list.
        let hit = find_function_call(&list, "PCF", list.first(), None).expect("found");
        let after: Vec<_> = list.ids_range(list.next(hit), None).take(2).collect();
        assert_eq!(list[after[0]].literal, "(");
        assert_eq!(list[after[1]].literal, "float");
    }

    #[test]
    fn scope_walk_counts_depth() {
        let list = tokenize("{ a { b } c } d").unwrap();
        let mut seen = Vec::new();
        let stopped = process_scope::<()>(
            &list,
            list.first(),
            None,
            TokenType::OpenBrace,
            TokenType::ClosingBrace,
            &mut |id, depth| {
                seen.push((list[id].literal.clone(), depth));
                Ok(list.next(id))
            },
        )
        .unwrap();
        let stop = stopped.expect("stops on the matching close");
        assert_eq!(list[stop].literal, "}");
        assert_eq!(list.next(stop).map(|id| list[id].literal.clone()), Some("d".into()));
        assert_eq!(seen[0], ("{".to_string(), 1));
        assert!(seen.contains(&("b".to_string(), 2)));
        assert!(!seen.iter().any(|(l, _)| l == "d"));
    }
}
