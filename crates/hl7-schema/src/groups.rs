//! Group reference tracking for schema resolution

use std::collections::HashSet;

/// Tracks which definition references which group, to detect cycles
#[derive(Debug, Default)]
pub struct GroupGraph {
    edges: Vec<(String, String)>, // (referrer, group)
}

impl GroupGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, referrer: impl Into<String>, group: impl Into<String>) {
        self.edges.push((referrer.into(), group.into()));
    }

    /// Detect if letting `referrer` include `group` would close a cycle
    #[must_use]
    pub fn would_create_cycle(&self, referrer: &str, group: &str) -> bool {
        if referrer == group {
            return true;
        }

        // Check if the group reaches the referrer (directly or transitively)
        let mut to_visit = vec![group];
        let mut visited = HashSet::new();

        while let Some(current) = to_visit.pop() {
            if current == referrer {
                return true;
            }
            if visited.insert(current) {
                for (from, to) in &self.edges {
                    if from == current {
                        to_visit.push(to);
                    }
                }
            }
        }

        false
    }
}
