use bitvec::bitvec;
use bitvec::order::Lsb0;
use bitvec::vec::BitVec;
use log::trace;

use crate::Annotation;
use crate::AnnotationSet;
use crate::DeterminizeError;
use crate::DnaTree;
use crate::NodeIndex;
use crate::Nsa;
use crate::Priority;
use crate::ROOT;
use crate::StateSet;
use crate::SymbolIndex;
use crate::first_available;
use crate::next_available;

/// A node of the working tree.
#[derive(Clone, Debug)]
struct Slot {
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,

    /// All states owned by this node or one of its descendants.
    states: StateSet,

    /// The annotations whose red sets are removed by the transition function.
    excluded: AnnotationSet,

    annotation: Annotation,
}

/// The mutable form of a [DnaTree] in which a single transition is computed.
///
/// Nodes live in a fixed arena of `3n'` slots. A node in slot `i` spawns its
/// main child into slot `i + n'` and its templar child into slot `i + 2n'`,
/// so slot positions are determined by the tree and never reused within a
/// transition. The stages must be applied in the order [WorkingTree::spawn],
/// [WorkingTree::fix_seniority], [WorkingTree::fix_uniqueness] and finally
/// [WorkingTree::pack].
pub(crate) struct WorkingTree<'a> {
    nsa: &'a Nsa,
    source: &'a DnaTree,
    symbol: SymbolIndex,
    symbol_name: &'a str,

    slots: Vec<Option<Slot>>,

    /// The owner of every state after seniority has been fixed.
    owner: Vec<Option<NodeIndex>>,

    /// Nodes that own at least one state, directly or through a descendant.
    nonempty: BitVec<usize, Lsb0>,
}

impl<'a> WorkingTree<'a> {
    /// Rebuilds the working form of the given tree, in which every node holds
    /// the states owned by its subtree.
    pub fn new(nsa: &'a Nsa, source: &'a DnaTree, symbol: SymbolIndex) -> Result<Self, DeterminizeError> {
        let symbol_name = nsa.symbol_name(symbol)?;
        let capacity = nsa.capacity();

        let mut working = WorkingTree {
            nsa,
            source,
            symbol,
            symbol_name,
            slots: vec![None; capacity],
            owner: vec![None; nsa.num_of_states()],
            nonempty: bitvec![usize, Lsb0; 0; capacity],
        };

        for node in source.iter_nodes() {
            let parent = source.parent(node);

            // A node excludes everything its parent excludes, and the color of
            // its grandparent when the parent is a templar.
            let excluded = match parent {
                None => nsa.empty_annotations(),
                Some(parent) => {
                    let parent_slot = working.slot(parent);
                    let mut excluded = parent_slot.excluded.clone();
                    if parent_slot.annotation.is_templar() {
                        if let Some(color) = parent_slot
                            .parent
                            .and_then(|grandparent| working.slot(grandparent).annotation.color())
                        {
                            excluded.set(*color, true);
                        }
                    }
                    excluded
                }
            };

            working.insert(node, parent, nsa.empty_states(), excluded, source.annotation(node))?;
        }

        for (state, owner) in source.iter_owners() {
            let mut current = Some(owner);
            while let Some(node) = current {
                let slot = working.slot_mut(node);
                slot.states.set(*state, true);
                current = slot.parent;
            }
        }

        Ok(working)
    }

    /// Applies the transition function to every node in the subtree of `node`
    /// and spawns the new children, children are processed before their parent.
    pub fn spawn(&mut self, node: NodeIndex) -> Result<(), DeterminizeError> {
        let children = self.slot(node).children.clone();
        for child in children {
            self.spawn(child)?;
        }

        let n_prime = self.nsa.n_prime();
        let slot = self.slot(node);
        let states = self.nsa.transition_function(&slot.states, &slot.excluded, self.symbol)?;
        let has_children = !slot.children.is_empty();
        let excluded = slot.excluded.clone();
        let annotation = slot.annotation;
        let parent = slot.parent;

        self.slot_mut(node).states = states.clone();

        match annotation {
            Annotation::Templar => {
                // The child proposes a color that is not excluded and differs from
                // the color of the templar's parent, which it excludes from now on.
                let forbidden = parent.and_then(|parent| self.slot(parent).annotation.color());
                let child_annotation = first_available(&excluded, forbidden).map_or(Annotation::Phi, Annotation::Colored);

                let mut child_excluded = excluded;
                if let Some(color) = forbidden {
                    child_excluded.set(*color, true);
                }

                self.insert(
                    NodeIndex::new(*node + n_prime),
                    Some(node),
                    states,
                    child_excluded,
                    child_annotation,
                )?;
            }
            Annotation::Colored(color) => {
                if !has_children {
                    self.insert(
                        NodeIndex::new(*node + 2 * n_prime),
                        Some(node),
                        states.clone(),
                        excluded.clone(),
                        Annotation::Templar,
                    )?;
                }

                let mut green = states;
                self.nsa.retain_green(&mut green, color);
                let child_annotation = next_available(annotation, &excluded).map_or(Annotation::Phi, Annotation::Colored);

                self.insert(
                    NodeIndex::new(*node + n_prime),
                    Some(node),
                    green,
                    excluded,
                    child_annotation,
                )?;
            }
            Annotation::Phi => {}
        }

        Ok(())
    }

    /// Assigns every state to the deepest node reached by repeatedly descending
    /// into the most senior child that contains it. Colored children are more
    /// senior than templar children, and lower slots are more senior than higher ones.
    pub fn fix_seniority(&mut self) {
        let annotations: Vec<Option<Annotation>> = self
            .slots
            .iter()
            .map(|slot| slot.as_ref().map(|slot| slot.annotation))
            .collect();

        for slot in self.slots.iter_mut().flatten() {
            slot.children.sort_by_key(|child| {
                (
                    annotations[**child].is_some_and(|annotation| annotation.is_templar()),
                    *child,
                )
            });
        }

        for state in 0..self.owner.len() {
            if !self.slot(ROOT).states[state] {
                self.owner[state] = None;
                continue;
            }

            let mut node = ROOT;
            while let Some(child) = self
                .slot(node)
                .children
                .iter()
                .find(|child| self.slot(**child).states[state])
            {
                node = *child;
            }

            self.owner[state] = Some(node);
        }
    }

    /// Removes the children of colored nodes that lost unique ownership, and
    /// prunes empty nodes. Returns the priority of the transition: `2i` for the
    /// first slot `i` that is empty, or `2i + 1` when it is a stale or phi node.
    pub fn fix_uniqueness(&mut self) -> Option<Priority> {
        let capacity = self.slots.len();

        let mut has_unique = bitvec![usize, Lsb0; 0; capacity];
        for node in self.owner.iter().flatten() {
            has_unique.set(**node, true);
        }

        let nonempty = self.nonempty_from(&has_unique);

        let mut has_templar_child = bitvec![usize, Lsb0; 0; capacity];
        for (index, slot) in self.iter_slots() {
            if let Some(parent) = slot.parent {
                if slot.annotation.is_templar() && nonempty[index] {
                    has_templar_child.set(*parent, true);
                }
            }
        }

        // A colored node without unique ownership and without a live templar
        // child is stale, it takes the next available color and loses its subtree.
        let mut stale = bitvec![usize, Lsb0; 0; capacity];
        for index in 0..capacity {
            if let Some(slot) = &mut self.slots[index] {
                if slot.annotation.color().is_some() && !has_unique[index] && !has_templar_child[index] {
                    stale.set(index, true);
                    slot.annotation = next_available(slot.annotation, &slot.excluded)
                        .map_or(Annotation::Phi, Annotation::Colored);
                    trace!("Node {index} is stale, it becomes {}", slot.annotation);
                }
            }
        }

        // The parents of dead nodes are moved up to the first node that
        // survives, which takes over the states they owned.
        let mut dead = bitvec![usize, Lsb0; 0; capacity];
        for index in 0..capacity {
            let Some(parent) = self.slots[index].as_ref().and_then(|slot| slot.parent) else {
                continue;
            };

            if dead[*parent] {
                dead.set(index, true);
                let grandparent = self.slot(parent).parent;
                self.slot_mut(NodeIndex::new(index)).parent = grandparent;
            } else if stale[*parent] {
                dead.set(index, true);
            }
        }

        for state in 0..self.owner.len() {
            if let Some(node) = self.owner[state] {
                if dead[*node] {
                    self.owner[state] = self.slot(node).parent;
                }
            }
        }

        let mut owned = bitvec![usize, Lsb0; 0; capacity];
        for node in self.owner.iter().flatten() {
            owned.set(**node, true);
        }
        self.nonempty = self.nonempty_from(&owned);

        for index in 1..capacity {
            if !self.nonempty[index] {
                self.slots[index] = None;
            }
        }

        for (index, slot) in self.slots.iter().enumerate() {
            match slot {
                Some(slot) if self.nonempty[index] => {
                    if stale[index] || slot.annotation.is_phi() {
                        return Some(Priority::new(2 * index + 1));
                    }
                }
                _ => return Some(Priority::new(2 * index)),
            }
        }

        None
    }

    /// Renumbers the surviving nodes densely in ascending slot order.
    pub fn pack(self) -> DnaTree {
        let mut renumber = vec![None; self.slots.len()];
        let mut parent = Vec::new();
        let mut annotation = Vec::new();

        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(slot) = slot {
                renumber[index] = Some(NodeIndex::new(annotation.len()));
                parent.push(slot.parent.and_then(|parent| renumber[*parent]).unwrap_or(ROOT));
                annotation.push(slot.annotation);
            }
        }

        let owner = self
            .owner
            .iter()
            .map(|owner| owner.and_then(|node| renumber[*node]))
            .collect();

        DnaTree::from_parts(parent, annotation, owner, self.nsa.n_prime())
    }

    /// Marks every node that is in the given set, or that has a descendant in it.
    fn nonempty_from(&self, marked: &BitVec<usize, Lsb0>) -> BitVec<usize, Lsb0> {
        let mut nonempty = marked.clone();

        // Parents always occupy lower slots than their children.
        for index in (1..self.slots.len()).rev() {
            if nonempty[index] {
                if let Some(parent) = self.slots[index].as_ref().and_then(|slot| slot.parent) {
                    nonempty.set(*parent, true);
                }
            }
        }

        nonempty
    }

    /// Places a new node into the given slot and registers it with its parent.
    fn insert(
        &mut self,
        node: NodeIndex,
        parent: Option<NodeIndex>,
        states: StateSet,
        excluded: AnnotationSet,
        annotation: Annotation,
    ) -> Result<(), DeterminizeError> {
        match self.slots.get(*node) {
            Some(None) => {}
            _ => {
                return Err(DeterminizeError::CapacityExceeded {
                    tree: self.source.to_string(),
                    symbol: self.symbol_name.to_string(),
                    slot: *node,
                    capacity: self.slots.len(),
                });
            }
        }

        self.slots[*node] = Some(Slot {
            parent,
            children: Vec::new(),
            states,
            excluded,
            annotation,
        });

        if let Some(parent) = parent {
            self.slot_mut(parent).children.push(node);
        }

        Ok(())
    }

    fn iter_slots(&self) -> impl Iterator<Item = (usize, &Slot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|slot| (index, slot)))
    }

    fn slot(&self, node: NodeIndex) -> &Slot {
        self.slots[*node].as_ref().expect("Node must occupy a slot")
    }

    fn slot_mut(&mut self, node: NodeIndex) -> &mut Slot {
        self.slots[*node].as_mut().expect("Node must occupy a slot")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::AnnotationIndex;
    use crate::NsaBuilder;
    use crate::SetColor;

    #[test]
    fn test_spawn_slots() {
        let mut builder = NsaBuilder::new();
        let s0 = builder.add_state(true);
        let s1 = builder.add_state(false);
        builder.add_transition(s0, "a", s1);
        builder.add_set(SetColor::Green, vec![s1]);
        let nsa = builder.finish().unwrap();

        let initial = DnaTree::initial(&nsa);
        let symbol = nsa.symbol_index("a").unwrap();

        let mut working = WorkingTree::new(&nsa, &initial, symbol).unwrap();
        working.spawn(ROOT).unwrap();

        // The main child lands at offset n' and the templar at offset 2n'.
        let main = working.slot(NodeIndex::new(4));
        assert_eq!(main.annotation, Annotation::Colored(AnnotationIndex::new(0)));
        assert_eq!(main.states.iter_ones().collect::<Vec<_>>(), vec![1]);

        let templar = working.slot(NodeIndex::new(8));
        assert_eq!(templar.annotation, Annotation::Templar);
        assert_eq!(templar.states.iter_ones().collect::<Vec<_>>(), vec![1]);

        assert_eq!(
            working.slot(ROOT).children,
            vec![NodeIndex::new(8), NodeIndex::new(4)]
        );
        working.fix_seniority();
        assert_eq!(
            working.slot(ROOT).children,
            vec![NodeIndex::new(4), NodeIndex::new(8)]
        );
        assert_eq!(working.owner, vec![None, Some(NodeIndex::new(4))]);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut builder = NsaBuilder::new();
        let s0 = builder.add_state(true);
        builder.add_transition(s0, "a", s0);
        builder.add_set(SetColor::Green, vec![s0]);
        let nsa = builder.finish().unwrap();

        // A chain of three nodes does not fit in a tree with n' = 2, the leaf
        // would spawn its templar child into slot 6.
        let color = Annotation::Colored(AnnotationIndex::new(0));
        let tree = DnaTree::from_parts(
            vec![ROOT, ROOT, NodeIndex::new(1)],
            vec![color, color, color],
            vec![Some(NodeIndex::new(2))],
            nsa.n_prime(),
        );

        let symbol = nsa.symbol_index("a").unwrap();
        let mut working = WorkingTree::new(&nsa, &tree, symbol).unwrap();
        let result = working.spawn(ROOT);

        assert!(matches!(
            result,
            Err(DeterminizeError::CapacityExceeded { slot: 6, capacity: 6, .. })
        ));
    }
}
