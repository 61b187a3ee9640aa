//! Typed sequence of nodes with head/tail access
//!
//! `List` carries a `TokenType` tag describing what the sequence is
//! (`Program`, `Formals`, `Packages`, ...) alongside its items. Its length
//! is the length of the backing storage, so it cannot disagree with the
//! items reachable from `head` to `tail`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::parser::ast::{Node, TokenType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List<T = Node> {
    token_type: TokenType,
    items: VecDeque<T>,
}

impl<T> List<T> {
    pub fn new(token_type: TokenType) -> Self {
        List {
            token_type,
            items: VecDeque::new(),
        }
    }

    pub fn from_vec(token_type: TokenType, items: Vec<T>) -> Self {
        List {
            token_type,
            items: items.into(),
        }
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn head(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn tail(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn push_back(&mut self, item: T) {
        self.items.push_back(item);
    }

    pub fn push_front(&mut self, item: T) {
        self.items.push_front(item);
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn pop_back(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    /// Moves every item of `other` onto the end of `self`, leaving `other` empty
    pub fn append(&mut self, other: &mut List<T>) {
        self.items.append(&mut other.items);
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::collections::vec_deque::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

impl<T> Extend<T> for List<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = std::collections::vec_deque::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
