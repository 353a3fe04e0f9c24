//! Hash-chunk trie of past routing decisions.
//!
//! A prompt is cut into fixed-size byte chunks and each chunk is reduced to a
//! 64-bit xxh3 hash. A node stands for the chunk-hash path consumed so far and
//! remembers which endpoints were picked for prompts sharing that path. The
//! root holds every endpoint ever recorded (the empty prefix).
//!
//! The whole trie sits behind one reader/writer lock: lookups share it, inserts
//! and evictions take it exclusively.

use std::{
    cmp::Reverse,
    collections::{hash_map::Entry, BinaryHeap, HashMap, HashSet},
};

use parking_lot::RwLock;
use xxhash_rust::xxh3::xxh3_64;

/// Default chunk size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// Split `text` into `chunk_size`-byte chunks (the last may be shorter) and hash each.
///
/// Chunking is by bytes, so a chunk boundary may fall inside a multi-byte
/// character. `chunk_size` of zero is treated as one.
pub fn chunk_and_hash(text: &str, chunk_size: usize) -> Vec<u64> {
    text.as_bytes()
        .chunks(chunk_size.max(1))
        .map(xxh3_64)
        .collect()
}

#[derive(Debug, Default)]
struct Node {
    children: HashMap<u64, Node>,
    endpoints: HashSet<String>,
    /// Logical time of the last insert that passed through this node
    last_access: u64,
}

impl Node {
    fn descend_mut(&mut self, path: &[u64]) -> Option<&mut Node> {
        let mut node = self;
        for hash in path {
            node = node.children.get_mut(hash)?;
        }
        Some(node)
    }

    /// Endpoints of this node that are in `available`
    fn intersect<'a>(&self, available: &HashSet<&'a str>) -> HashSet<&'a str> {
        self.endpoints
            .iter()
            .filter_map(|ep| available.get(ep.as_str()).copied())
            .collect()
    }
}

#[derive(Debug, Default)]
struct Inner {
    root: Node,
    /// Number of nodes below the root
    node_count: usize,
    clock: u64,
}

#[derive(Debug)]
pub struct HashTrie {
    chunk_size: usize,
    inner: RwLock<Inner>,
}

impl Default for HashTrie {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl HashTrie {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of nodes below the root
    pub fn node_count(&self) -> usize {
        self.inner.read().node_count
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.inner.read();
        inner.node_count == 0 && inner.root.endpoints.is_empty()
    }

    /// Record `endpoint` on every node along the chunk path of `key`, root included.
    pub fn insert(&self, key: &str, endpoint: &str) {
        let hashes = chunk_and_hash(key, self.chunk_size);

        let mut guard = self.inner.write();
        let Inner {
            root,
            node_count,
            clock,
        } = &mut *guard;
        *clock += 1;
        let now = *clock;

        let mut node = root;
        record(node, endpoint, now);
        for hash in hashes {
            node = match node.children.entry(hash) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    *node_count += 1;
                    e.insert(Node::default())
                }
            };
            record(node, endpoint, now);
        }
    }

    /// Endpoints recorded for the longest prefix of `key` whose endpoint set
    /// still intersects `available`.
    ///
    /// Starts from the root's intersection and descends while the next chunk's
    /// node exists and its intersection is non-empty. An empty result means no
    /// recorded endpoint is available.
    pub fn longest_prefix_match<'a>(
        &self,
        key: &str,
        available: &HashSet<&'a str>,
    ) -> HashSet<&'a str> {
        let hashes = chunk_and_hash(key, self.chunk_size);

        let inner = self.inner.read();
        let mut node = &inner.root;
        let mut matched = node.intersect(available);

        for hash in hashes {
            let Some(child) = node.children.get(&hash) else {
                break;
            };
            let candidate = child.intersect(available);
            if candidate.is_empty() {
                break;
            }
            node = child;
            matched = candidate;
        }
        matched
    }

    /// Evict least recently inserted leaves until at most `max_nodes` nodes
    /// remain below the root. Returns the number of nodes removed.
    ///
    /// Leaves are collected under the read lock; the write lock is held only
    /// while removing them.
    pub fn evict_to(&self, max_nodes: usize) -> usize {
        match self.eviction_candidates(max_nodes) {
            Some(leaves) => self.evict_leaves(leaves, max_nodes),
            None => 0,
        }
    }

    /// Every leaf as `(last_access, path)` on a min-heap, or `None` when under the cap
    fn eviction_candidates(&self, max_nodes: usize) -> Option<LeafHeap> {
        let inner = self.inner.read();
        if inner.node_count <= max_nodes {
            return None;
        }
        let mut leaves = BinaryHeap::new();
        collect_leaves(&inner.root, &mut leaves);
        Some(leaves)
    }

    /// Remove collected leaves oldest first. A leaf that gained children or was
    /// written since it was collected is kept.
    fn evict_leaves(&self, mut leaves: LeafHeap, max_nodes: usize) -> usize {
        let mut guard = self.inner.write();
        let Inner {
            root, node_count, ..
        } = &mut *guard;

        let mut evicted = 0;
        while *node_count > max_nodes {
            let Some(Reverse((last_access, path))) = leaves.pop() else {
                break;
            };
            let Some((last, parent_path)) = path.split_last() else {
                continue;
            };
            let Some(parent) = root.descend_mut(parent_path) else {
                continue;
            };
            let unchanged = parent
                .children
                .get(last)
                .is_some_and(|leaf| leaf.children.is_empty() && leaf.last_access == last_access);
            if !unchanged {
                continue;
            }
            parent.children.remove(last);
            *node_count -= 1;
            evicted += 1;

            if !parent_path.is_empty() && parent.children.is_empty() {
                leaves.push(Reverse((parent.last_access, parent_path.to_vec())));
            }
        }
        evicted
    }

    pub fn clear(&self) {
        *self.inner.write() = Inner::default();
    }
}

#[inline]
fn record(node: &mut Node, endpoint: &str, now: u64) {
    if !node.endpoints.contains(endpoint) {
        node.endpoints.insert(endpoint.to_string());
    }
    node.last_access = now;
}

type LeafHeap = BinaryHeap<Reverse<(u64, Vec<u64>)>>;

/// Push every leaf below `root` as `(last_access, path)` onto a min-heap
fn collect_leaves(root: &Node, leaves: &mut LeafHeap) {
    let mut stack: Vec<(&Node, Vec<u64>)> = vec![(root, Vec::new())];
    while let Some((node, path)) = stack.pop() {
        for (hash, child) in &node.children {
            let mut child_path = path.clone();
            child_path.push(*hash);
            if child.children.is_empty() {
                leaves.push(Reverse((child.last_access, child_path)));
            } else {
                stack.push((child, child_path));
            }
        }
    }
}
