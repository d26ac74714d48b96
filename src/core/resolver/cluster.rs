//! Single-link clustering of perceptual codes.
//!
//! Items are visited in index order; each one is compared against every
//! earlier item and united with all of those within the threshold. A record
//! close to members of two existing clusters therefore merges them, so the
//! result does not depend on visiting order.

use crate::core::hasher::PerceptualCode;

/// Disjoint sets over `0..n`
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Find root with path halving
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Clusters of two or more indices into `codes`. Members are ascending and
/// clusters are ordered by their smallest member.
pub fn single_link_clusters(codes: &[&PerceptualCode], threshold: u32) -> Vec<Vec<usize>> {
    let mut sets = UnionFind::new(codes.len());
    for i in 0..codes.len() {
        for j in 0..i {
            if codes[i].is_similar(codes[j], threshold) {
                sets.union(i, j);
            }
        }
    }

    let mut by_root: Vec<Vec<usize>> = vec![Vec::new(); codes.len()];
    for i in 0..codes.len() {
        let root = sets.find(i);
        by_root[root].push(i);
    }

    let mut clusters: Vec<Vec<usize>> = by_root.into_iter().filter(|c| c.len() > 1).collect();
    clusters.sort_by_key(|c| c[0]);
    clusters
}
