//! Arena-backed doubly-linked token list.
//!
//! The conversion pipeline mutates the token stream heavily: tokens are
//! retyped, rewritten, inserted and erased at arbitrary positions while the
//! rewriter holds ids into unrelated parts of the list (including positions
//! it scans backward from). A `Vec<Token>` would invalidate those positions
//! on every structural edit, so the list stores nodes in an arena and links
//! them through stable ids; an id stays valid until the token it names is
//! erased.

use core::ops::{Index, IndexMut};

use crate::token::Token;

/// Stable handle to one token in a [`TokenList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(u32);

#[derive(Debug, Clone)]
struct Node {
    token: Token,
    prev: Option<TokenId>,
    next: Option<TokenId>,
}

#[derive(Debug, Clone, Default)]
pub struct TokenList {
    nodes: Vec<Option<Node>>,
    free: Vec<u32>,
    head: Option<TokenId>,
    tail: Option<TokenId>,
    len: usize,
}

impl TokenList {
    pub fn new() -> TokenList {
        TokenList::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first(&self) -> Option<TokenId> {
        self.head
    }

    pub fn last(&self) -> Option<TokenId> {
        self.tail
    }

    pub fn next(&self, id: TokenId) -> Option<TokenId> {
        self.node(id).next
    }

    pub fn prev(&self, id: TokenId) -> Option<TokenId> {
        self.node(id).prev
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.nodes
            .get(id.0 as usize)
            .and_then(|slot| slot.as_ref())
            .map(|n| &n.token)
    }

    fn node(&self, id: TokenId) -> &Node {
        self.nodes[id.0 as usize]
            .as_ref()
            .expect("stale TokenId: token was erased")
    }

    fn node_mut(&mut self, id: TokenId) -> &mut Node {
        self.nodes[id.0 as usize]
            .as_mut()
            .expect("stale TokenId: token was erased")
    }

    fn alloc(&mut self, token: Token) -> TokenId {
        let node = Node {
            token,
            prev: None,
            next: None,
        };
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = Some(node);
                TokenId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                TokenId((self.nodes.len() - 1) as u32)
            }
        };
        self.len += 1;
        id
    }

    pub fn push_back(&mut self, token: Token) -> TokenId {
        let id = self.alloc(token);
        match self.tail {
            Some(tail) => {
                self.node_mut(tail).next = Some(id);
                self.node_mut(id).prev = Some(tail);
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Inserts before `at`; `None` inserts at the end of the list.
    pub fn insert_before(&mut self, at: Option<TokenId>, token: Token) -> TokenId {
        match at {
            None => self.push_back(token),
            Some(at) => {
                let id = self.alloc(token);
                let prev = self.node(at).prev;
                self.node_mut(id).prev = prev;
                self.node_mut(id).next = Some(at);
                self.node_mut(at).prev = Some(id);
                match prev {
                    Some(prev) => self.node_mut(prev).next = Some(id),
                    None => self.head = Some(id),
                }
                id
            }
        }
    }

    pub fn insert_after(&mut self, at: TokenId, token: Token) -> TokenId {
        let next = self.node(at).next;
        match next {
            Some(next) => self.insert_before(Some(next), token),
            None => self.push_back(token),
        }
    }

    /// Unlinks and returns the token; `id` (and only `id`) becomes invalid.
    pub fn erase(&mut self, id: TokenId) -> Token {
        let node = self.nodes[id.0 as usize]
            .take()
            .expect("stale TokenId: token was already erased");
        match node.prev {
            Some(prev) => self.node_mut(prev).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.node_mut(next).prev = node.prev,
            None => self.tail = node.prev,
        }
        self.free.push(id.0);
        self.len -= 1;
        node.token
    }

    /// Erases the half-open id range `[from, to)`.
    pub fn erase_range(&mut self, from: TokenId, to: Option<TokenId>) {
        let mut cur = Some(from);
        while cur != to {
            let id = cur.expect("erase_range: `to` is not ahead of `from`");
            cur = self.next(id);
            self.erase(id);
        }
    }

    /// Ids in list order.
    pub fn ids(&self) -> Ids<'_> {
        Ids {
            list: self,
            cur: self.head,
        }
    }

    /// Ids in list order over the half-open range `[from, to)`.
    pub fn ids_range(&self, from: Option<TokenId>, to: Option<TokenId>) -> BoundedIds<'_> {
        Ids { list: self, cur: from }.bounded(to)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &Token)> + '_ {
        self.ids().map(move |id| (id, &self[id]))
    }
}

impl Index<TokenId> for TokenList {
    type Output = Token;

    fn index(&self, id: TokenId) -> &Token {
        &self.node(id).token
    }
}

impl IndexMut<TokenId> for TokenList {
    fn index_mut(&mut self, id: TokenId) -> &mut Token {
        &mut self.node_mut(id).token
    }
}

pub struct Ids<'a> {
    list: &'a TokenList,
    cur: Option<TokenId>,
}

impl<'a> Ids<'a> {
    fn bounded(self, end: Option<TokenId>) -> BoundedIds<'a> {
        BoundedIds { inner: self, end }
    }
}

impl Iterator for Ids<'_> {
    type Item = TokenId;

    fn next(&mut self) -> Option<TokenId> {
        let id = self.cur?;
        self.cur = self.list.next(id);
        Some(id)
    }
}

pub struct BoundedIds<'a> {
    inner: Ids<'a>,
    end: Option<TokenId>,
}

impl Iterator for BoundedIds<'_> {
    type Item = TokenId;

    fn next(&mut self) -> Option<TokenId> {
        if self.inner.cur == self.end {
            return None;
        }
        self.inner.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn tok(lit: &str) -> Token {
        Token::new(TokenType::Identifier, lit)
    }

    fn literals(list: &TokenList) -> Vec<String> {
        list.iter().map(|(_, t)| t.literal.clone()).collect()
    }

    #[test]
    fn insert_and_erase_keep_unrelated_ids_valid() {
        let mut list = TokenList::new();
        let a = list.push_back(tok("a"));
        let b = list.push_back(tok("b"));
        let c = list.push_back(tok("c"));

        // Erase the middle; a and c must stay addressable.
        list.erase(b);
        assert_eq!(list[a].literal, "a");
        assert_eq!(list[c].literal, "c");
        assert_eq!(list.next(a), Some(c));
        assert_eq!(list.prev(c), Some(a));

        // Slot reuse must not resurrect b's identity semantics.
        let d = list.insert_before(Some(c), tok("d"));
        assert_eq!(literals(&list), ["a", "d", "c"]);
        assert_eq!(list.prev(d), Some(a));

        let e = list.insert_after(c, tok("e"));
        assert_eq!(list.last(), Some(e));
        assert_eq!(literals(&list), ["a", "d", "c", "e"]);
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn erase_range_half_open() {
        let mut list = TokenList::new();
        let _a = list.push_back(tok("a"));
        let b = list.push_back(tok("b"));
        let c = list.push_back(tok("c"));
        let d = list.push_back(tok("d"));
        list.erase_range(b, Some(d));
        assert_eq!(literals(&list), ["a", "d"]);
        assert!(list.get(c).is_none());
    }

    #[test]
    fn bounded_iteration() {
        let mut list = TokenList::new();
        let a = list.push_back(tok("a"));
        let b = list.push_back(tok("b"));
        let _c = list.push_back(tok("c"));
        let ids: Vec<_> = list.ids_range(Some(a), list.next(b)).collect();
        assert_eq!(ids, [a, b]);
    }
}
