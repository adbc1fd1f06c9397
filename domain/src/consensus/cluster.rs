//! Agreement clustering

use super::claims::ClaimSet;

/// Disjoint-set forest over response indices
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
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

/// Group claim sets whose pairwise agreement exceeds `match_ratio`
///
/// Agreement is made transitive: if A agrees with B and B with C, all
/// three share a group. Groups come back ordered by their lowest member
/// index and each group's members are ascending, so callers that pass
/// responses in receipt order get a deterministic result.
pub fn cluster_claim_sets(sets: &[ClaimSet], match_ratio: f64) -> Vec<Vec<usize>> {
    let mut uf = UnionFind::new(sets.len());
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            if sets[i].agrees_with(&sets[j], match_ratio) {
                uf.union(i, j);
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut root_to_group: Vec<Option<usize>> = vec![None; sets.len()];
    for i in 0..sets.len() {
        let root = uf.find(i);
        match root_to_group[root] {
            Some(g) => groups[g].push(i),
            None => {
                root_to_group[root] = Some(groups.len());
                groups.push(vec![i]);
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets(claims: &[&[&str]]) -> Vec<ClaimSet> {
        claims
            .iter()
            .map(|c| ClaimSet::from_claims(c.iter().copied()))
            .collect()
    }

    #[test]
    fn test_majority_group_and_singleton() {
        let s = sets(&[&["A", "B"], &["A", "B"], &["A", "C"], &["a.", "b"]]);
        let groups = cluster_claim_sets(&s, 0.5);
        assert_eq!(groups, vec![vec![0, 1, 3], vec![2]]);
    }

    #[test]
    fn test_no_agreement_gives_singletons() {
        let s = sets(&[&["A"], &["B"], &["C"]]);
        let groups = cluster_claim_sets(&s, 0.5);
        assert_eq!(groups, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_agreement_is_transitive() {
        // 0~1 and 1~2 agree, 0 and 2 do not directly
        let s = sets(&[&["A", "B"], &["A", "B", "C"], &["B", "C"]]);
        assert!(!s[0].agrees_with(&s[2], 0.5));
        let groups = cluster_claim_sets(&s, 0.5);
        assert_eq!(groups, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_empty_input() {
        assert!(cluster_claim_sets(&[], 0.5).is_empty());
    }
}
