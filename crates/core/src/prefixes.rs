//! Longest-prefix matching over a byte trie.

use std::collections::BTreeMap;

/// A set of `prefix -> value` rules answering "which registered prefix is the
/// longest prefix of this input".
///
/// Matching is byte-exact and case-sensitive. Inserting costs
/// O(len(prefix)); a lookup costs O(len(input)).
///
/// The matcher has no interior mutability. Shared readers hold it behind an
/// `Arc` and a reload builds a fresh matcher (see [`crate::denylist::DenyListHandle`]).
#[derive(Debug, Clone)]
pub struct PrefixMatcher<T> {
    root: Node<T>,
    len: usize,
}

#[derive(Debug, Clone)]
struct Node<T> {
    value: Option<T>,
    children: BTreeMap<u8, Node<T>>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            value: None,
            children: BTreeMap::new(),
        }
    }
}

impl<T> Default for PrefixMatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PrefixMatcher<T> {
    pub fn new() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }

    /// Number of registered prefixes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a rule, replacing and returning any value already registered
    /// under the same prefix.
    ///
    /// An empty prefix never matches anything and is ignored.
    pub fn put(&mut self, prefix: &str, value: T) -> Option<T> {
        if prefix.is_empty() {
            return None;
        }

        let mut node = &mut self.root;
        for byte in prefix.bytes() {
            node = node.children.entry(byte).or_default();
        }

        let previous = node.value.replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Find the longest registered prefix of `input`.
    ///
    /// Returns the matched slice of `input` and the rule's value.
    pub fn find_longest_prefix<'a>(&self, input: &'a str) -> Option<(&'a str, &T)> {
        let mut node = &self.root;
        let mut best: Option<(usize, &T)> = None;

        for (i, byte) in input.bytes().enumerate() {
            match node.children.get(&byte) {
                Some(child) => node = child,
                None => break,
            }
            if let Some(value) = &node.value {
                best = Some((i + 1, value));
            }
        }

        // Every stored prefix is valid UTF-8, so a match always ends on a
        // char boundary of `input`.
        best.map(|(len, value)| (&input[..len], value))
    }

    /// Whether any registered prefix is a prefix of `input`.
    pub fn matches(&self, input: &str) -> bool {
        self.find_longest_prefix(input).is_some()
    }
}

impl<'p, T> FromIterator<(&'p str, T)> for PrefixMatcher<T> {
    fn from_iter<I: IntoIterator<Item = (&'p str, T)>>(iter: I) -> Self {
        let mut matcher = Self::new();
        for (prefix, value) in iter {
            matcher.put(prefix, value);
        }
        matcher
    }
}
