use std::collections::{HashMap, HashSet, VecDeque};

/// Directed graph of schema versions.
///
/// Neighbors keep registration order so that equal-length paths resolve
/// deterministically.
#[derive(Debug, Clone, Default)]
pub struct VersionGraph {
    /// Forward edges: from -> [to, ...]
    edges: HashMap<String, Vec<String>>,
}

impl VersionGraph {
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let targets = self.edges.entry(from.to_string()).or_default();
        if !targets.iter().any(|t| t == to) {
            targets.push(to.to_string());
        }
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges
            .get(from)
            .is_some_and(|targets| targets.iter().any(|t| t == to))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Shortest chain of hops from `from` to `to`, by hop count.
    ///
    /// Returns `Some(vec![])` when `from == to` and `None` when unreachable.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<(String, String)>> {
        if from == to {
            return Some(Vec::new());
        }

        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::from([from]);
        let mut queue: VecDeque<&str> = VecDeque::from([from]);

        while let Some(node) = queue.pop_front() {
            let Some(targets) = self.edges.get(node) else {
                continue;
            };
            for next in targets {
                if !visited.insert(next.as_str()) {
                    continue;
                }
                parent.insert(next.as_str(), node);
                if next == to {
                    return Some(unwind(&parent, from, to));
                }
                queue.push_back(next.as_str());
            }
        }
        None
    }
}

fn unwind(parent: &HashMap<&str, &str>, from: &str, to: &str) -> Vec<(String, String)> {
    let mut hops = Vec::new();
    let mut cursor = to;
    while cursor != from {
        let Some(prev) = parent.get(cursor).copied() else {
            break;
        };
        hops.push((prev.to_string(), cursor.to_string()));
        cursor = prev;
    }
    hops.reverse();
    hops
}
