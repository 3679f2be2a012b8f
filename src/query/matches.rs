//! Owning ordered container for a shard's running match set.
//!
//! The query engine walks the matches with a [`CursorMut`], dropping documents that a
//! later term does not contain. The cursor holds the only mutable borrow of the list,
//! so at most one live cursor exists per list.

use std::collections::VecDeque;

/// An ordered sequence of owned values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchList<T> {
    items: VecDeque<T>,
}

impl<T> Default for MatchList<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }
}

impl<T> MatchList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, value: T) {
        self.items.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// A cursor positioned at the first element (or past the end if empty).
    pub fn cursor_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut {
            list: self,
            index: 0,
        }
    }
}

impl<T> FromIterator<T> for MatchList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for MatchList<T> {
    type Item = T;
    type IntoIter = std::collections::vec_deque::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// A position within a [`MatchList`] that can inspect, edit and remove elements.
pub struct CursorMut<'a, T> {
    list: &'a mut MatchList<T>,
    index: usize,
}

impl<T> CursorMut<'_, T> {
    /// The element under the cursor, `None` once the cursor has run off the end.
    pub fn current(&self) -> Option<&T> {
        self.list.items.get(self.index)
    }

    pub fn current_mut(&mut self) -> Option<&mut T> {
        self.list.items.get_mut(self.index)
    }

    /// Step to the next element. Returns `false` when there is none.
    pub fn move_next(&mut self) -> bool {
        if self.index < self.list.items.len() {
            self.index += 1;
        }
        self.index < self.list.items.len()
    }

    /// Remove the element under the cursor.
    ///
    /// The cursor ends up on the element that followed the removed one. Returns the
    /// removed value together with whether the list is now empty.
    pub fn remove_current(&mut self) -> Option<(T, bool)> {
        let removed = self.list.items.remove(self.index)?;
        Some((removed, self.list.items.is_empty()))
    }
}
