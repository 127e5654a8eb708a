//! Access-Order List Module
//!
//! Arena-backed doubly linked list ordering entries from most to least
//! recently used.

use crate::cache::{Entry, NodeHandle};

// == Access-Order List ==
/// Doubly linked list of entries addressed by stable handles.
///
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Nodes live in a slot vector; freed slots are recycled through a free list.
#[derive(Debug)]
pub struct AccessOrderList<K, V> {
    /// Node storage, `None` for free slots
    slots: Vec<Option<Entry<K, V>>>,
    /// Indices of free slots
    free: Vec<usize>,
    head: Option<NodeHandle>,
    tail: Option<NodeHandle>,
    len: usize,
}

impl<K, V> Default for AccessOrderList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> AccessOrderList<K, V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts a new entry at the head and returns its handle.
    pub fn push_front(&mut self, key: K, value: V) -> NodeHandle {
        let entry = Entry::new(key, value);
        let handle = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(entry);
                NodeHandle::new(index)
            }
            None => {
                self.slots.push(Some(entry));
                NodeHandle::new(self.slots.len() - 1)
            }
        };

        self.link_front(handle);
        self.len += 1;
        handle
    }

    // == Move To Front ==
    /// Promotes a node to most recently used.
    ///
    /// Returns false if the handle does not address a live node.
    pub fn move_to_front(&mut self, handle: NodeHandle) -> bool {
        if self.get(handle).is_none() {
            return false;
        }
        if self.head == Some(handle) {
            return true;
        }

        self.unlink(handle);
        self.link_front(handle);
        true
    }

    // == Remove ==
    /// Unlinks a node and frees its slot, returning the entry.
    pub fn remove(&mut self, handle: NodeHandle) -> Option<Entry<K, V>> {
        self.get(handle)?;
        self.unlink(handle);

        let mut entry = self.slots[handle.index()].take()?;
        entry.prev = None;
        entry.next = None;
        self.free.push(handle.index());
        self.len -= 1;
        Some(entry)
    }

    // == Pop Back ==
    /// Removes and returns the least recently used entry.
    pub fn pop_back(&mut self) -> Option<Entry<K, V>> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Peek Back ==
    /// Returns the least recently used entry without removing it.
    pub fn peek_back(&self) -> Option<&Entry<K, V>> {
        self.tail.and_then(|handle| self.get(handle))
    }

    /// Returns the most recently used entry.
    pub fn peek_front(&self) -> Option<&Entry<K, V>> {
        self.head.and_then(|handle| self.get(handle))
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&Entry<K, V>> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut Entry<K, V>> {
        self.slots.get_mut(handle.index()).and_then(Option::as_mut)
    }

    // == Length ==
    /// Returns the number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Iterate ==
    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    /// Attaches an unlinked node at the head.
    fn link_front(&mut self, handle: NodeHandle) {
        let old_head = self.head;

        if let Some(entry) = self.get_mut(handle) {
            entry.prev = None;
            entry.next = old_head;
        }

        match old_head {
            Some(head) => {
                if let Some(head_entry) = self.get_mut(head) {
                    head_entry.prev = Some(handle);
                }
            }
            None => self.tail = Some(handle),
        }

        self.head = Some(handle);
    }

    /// Detaches a node from its neighbours, fixing head and tail.
    fn unlink(&mut self, handle: NodeHandle) {
        let (prev, next) = match self.get(handle) {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };

        match prev {
            Some(prev_handle) => {
                if let Some(prev_entry) = self.get_mut(prev_handle) {
                    prev_entry.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_handle) => {
                if let Some(next_entry) = self.get_mut(next_handle) {
                    next_entry.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(entry) = self.get_mut(handle) {
            entry.prev = None;
            entry.next = None;
        }
    }
}

// == Iterator ==
/// Iterator over list entries, head to tail.
pub struct Iter<'a, K, V> {
    list: &'a AccessOrderList<K, V>,
    cursor: Option<NodeHandle>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.list.get(self.cursor?)?;
        self.cursor = entry.next;
        Some(entry)
    }
}
