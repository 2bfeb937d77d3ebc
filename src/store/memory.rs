//! In-memory terminology graph.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::OnceLock;

use crate::types::{CharacteristicView, Concept, SctId, ROOT_CONCEPT};
use super::TerminologyGraph;

/// Parent/child adjacency for one characteristic view.
#[derive(Debug, Clone, Default)]
struct ViewIndex {
    /// Child -> Parents mapping.
    parents: BTreeMap<SctId, BTreeSet<SctId>>,
    /// Parent -> Children mapping.
    children: BTreeMap<SctId, BTreeSet<SctId>>,
}

impl ViewIndex {
    fn link(&mut self, child: SctId, parent: SctId) {
        self.parents.entry(child).or_default().insert(parent);
        self.children.entry(parent).or_default().insert(child);
    }

    fn unlink_child(&mut self, child: SctId) {
        if let Some(parents) = self.parents.remove(&child) {
            for parent in parents {
                if let Some(children) = self.children.get_mut(&parent) {
                    children.remove(&child);
                }
            }
        }
    }
}

/// In-memory concept graph computing closures from active IS-A relationships.
///
/// Uses BTreeMap/BTreeSet for deterministic iteration order. Depths are
/// computed lazily on first use and invalidated by any mutation.
#[derive(Debug, Default)]
pub struct InMemoryTerminologyGraph {
    /// Concepts by ID.
    concepts: BTreeMap<SctId, Concept>,
    inferred: ViewIndex,
    stated: ViewIndex,
    /// Shortest inferred distance from the root.
    depths: OnceLock<BTreeMap<SctId, u32>>,
    root: Option<SctId>,
}

impl InMemoryTerminologyGraph {
    /// Create a new empty graph rooted at the SNOMED CT root concept.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty graph rooted at a custom concept.
    pub fn with_root(root: SctId) -> Self {
        Self {
            root: Some(root),
            ..Self::default()
        }
    }

    /// Add or replace a concept, indexing its active IS-A relationships.
    pub fn add_concept(&mut self, concept: Concept) {
        let id = concept.id;
        self.inferred.unlink_child(id);
        self.stated.unlink_child(id);

        for parent in concept.parents(CharacteristicView::Inferred) {
            self.inferred.link(id, parent);
        }
        for parent in concept.parents(CharacteristicView::Stated) {
            self.stated.link(id, parent);
        }

        self.concepts.insert(id, concept);
        self.depths = OnceLock::new();
    }

    /// Remove a concept from the graph, returning it if present.
    pub fn remove_concept(&mut self, id: SctId) -> Option<Concept> {
        self.inferred.unlink_child(id);
        self.stated.unlink_child(id);
        self.depths = OnceLock::new();
        self.concepts.remove(&id)
    }

    /// Get number of concepts.
    pub fn num_concepts(&self) -> usize {
        self.concepts.len()
    }

    fn view(&self, view: CharacteristicView) -> &ViewIndex {
        match view {
            CharacteristicView::Inferred => &self.inferred,
            CharacteristicView::Stated => &self.stated,
        }
    }

    fn depths(&self) -> &BTreeMap<SctId, u32> {
        self.depths.get_or_init(|| {
            let root = self.root();
            let mut depths = BTreeMap::new();
            if !self.concepts.contains_key(&root) {
                return depths;
            }

            // Breadth first from the root so the first visit is the shortest path.
            let mut queue = VecDeque::from([(root, 0u32)]);
            depths.insert(root, 0);
            while let Some((id, depth)) = queue.pop_front() {
                let Some(children) = self.inferred.children.get(&id) else {
                    continue;
                };
                for child in children {
                    let active = self.concepts.get(child).map_or(false, |c| c.active);
                    if active && !depths.contains_key(child) {
                        depths.insert(*child, depth + 1);
                        queue.push_back((*child, depth + 1));
                    }
                }
            }
            depths
        })
    }

    fn closure(edges: &BTreeMap<SctId, BTreeSet<SctId>>, start: SctId) -> BTreeSet<SctId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<SctId> = edges
            .get(&start)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        while let Some(next) = stack.pop() {
            if next != start && seen.insert(next) {
                if let Some(more) = edges.get(&next) {
                    stack.extend(more.iter().copied());
                }
            }
        }
        seen
    }
}

impl TerminologyGraph for InMemoryTerminologyGraph {
    fn concept(&self, id: SctId) -> Option<&Concept> {
        self.concepts.get(&id)
    }

    fn all_concepts(&self) -> Vec<&Concept> {
        self.concepts.values().collect()
    }

    fn ancestors_of(&self, id: SctId, view: CharacteristicView) -> BTreeSet<SctId> {
        Self::closure(&self.view(view).parents, id)
    }

    fn descendants_of(&self, id: SctId, view: CharacteristicView) -> BTreeSet<SctId> {
        Self::closure(&self.view(view).children, id)
    }

    fn depth_of(&self, id: SctId) -> Option<u32> {
        self.depths().get(&id).copied()
    }

    fn root(&self) -> SctId {
        self.root.unwrap_or(ROOT_CONCEPT)
    }
}

impl FromIterator<Concept> for InMemoryTerminologyGraph {
    fn from_iter<I: IntoIterator<Item = Concept>>(iter: I) -> Self {
        let mut graph = Self::new();
        for concept in iter {
            graph.add_concept(concept);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Component, ComponentId};

    const MODULE: SctId = SctId::new(900000000000207008);

    fn concept(id: u64, parents: &[u64]) -> Concept {
        let mut c = Concept::new(SctId::new(id), format!("Concept {id}"), MODULE);
        for (i, p) in parents.iter().enumerate() {
            c = c.with_component(Component::is_a(
                ComponentId::new(format!("{id}-{i}")).unwrap(),
                SctId::new(id),
                MODULE,
                SctId::new(*p),
                CharacteristicView::Inferred,
            ));
        }
        c
    }

    //      root
    //     /    \
    //    1      2
    //    |     /
    //    3 ---+
    //    |
    //    4
    fn diamond() -> InMemoryTerminologyGraph {
        let root = ROOT_CONCEPT.value();
        [
            concept(root, &[]),
            concept(1, &[root]),
            concept(2, &[root]),
            concept(3, &[1, 2]),
            concept(4, &[3]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_depths() {
        let graph = diamond();
        assert_eq!(graph.depth_of(ROOT_CONCEPT), Some(0));
        assert_eq!(graph.depth_of(SctId::new(1)), Some(1));
        assert_eq!(graph.depth_of(SctId::new(3)), Some(2));
        assert_eq!(graph.depth_of(SctId::new(4)), Some(3));
        assert_eq!(graph.depth_of(SctId::new(99)), None);
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let graph = diamond();
        let ancestors = graph.ancestors_of(SctId::new(4), CharacteristicView::Inferred);
        assert_eq!(
            ancestors,
            [1, 2, 3, ROOT_CONCEPT.value()].into_iter().map(SctId::new).collect()
        );

        let descendants = graph.descendants_of(SctId::new(1), CharacteristicView::Inferred);
        assert_eq!(descendants, [3, 4].into_iter().map(SctId::new).collect());

        assert!(graph.ancestors_of(SctId::new(4), CharacteristicView::Stated).is_empty());
    }

    #[test]
    fn test_replacing_concept_relinks_and_resets_depths() {
        let mut graph = diamond();
        assert_eq!(graph.depth_of(SctId::new(4)), Some(3));

        graph.add_concept(concept(4, &[ROOT_CONCEPT.value()]));
        assert_eq!(graph.depth_of(SctId::new(4)), Some(1));
        assert!(!graph
            .descendants_of(SctId::new(3), CharacteristicView::Inferred)
            .contains(&SctId::new(4)));
    }

    #[test]
    fn test_inactive_concepts_have_no_depth() {
        let mut graph = diamond();
        graph.add_concept(concept(5, &[1]).with_active(false));
        assert_eq!(graph.depth_of(SctId::new(5)), None);
    }

    #[test]
    fn test_remove_concept() {
        let mut graph = diamond();
        assert!(graph.remove_concept(SctId::new(4)).is_some());
        assert_eq!(graph.num_concepts(), 4);
        assert!(graph.descendants_of(SctId::new(3), CharacteristicView::Inferred).is_empty());
    }
}
