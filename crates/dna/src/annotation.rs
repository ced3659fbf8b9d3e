use std::fmt;

use crate::AnnotationIndex;
use crate::AnnotationSet;

/// The annotation of a tree node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Annotation {
    /// A numbered node, that only keeps accepting progress for its annotation.
    Colored(AnnotationIndex),

    /// A speculative node that proposes the promotion of its parent's states
    /// to an annotation that is not yet used along its path.
    Templar,

    /// A templar that found no available annotation, it never spawns.
    Phi,
}

impl Annotation {
    /// Returns the annotation index of a colored node.
    pub fn color(&self) -> Option<AnnotationIndex> {
        match self {
            Annotation::Colored(color) => Some(*color),
            _ => None,
        }
    }

    /// Returns true iff this is a templar node.
    pub fn is_templar(&self) -> bool {
        *self == Annotation::Templar
    }

    /// Returns true iff this is a phi node.
    pub fn is_phi(&self) -> bool {
        *self == Annotation::Phi
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Colored(color) => write!(f, "{color}"),
            Annotation::Templar => write!(f, "+"),
            Annotation::Phi => write!(f, "f"),
        }
    }
}

/// Returns the smallest annotation that is not excluded and differs from `forbidden`.
pub fn first_available(excluded: &AnnotationSet, forbidden: Option<AnnotationIndex>) -> Option<AnnotationIndex> {
    (0..excluded.len())
        .map(AnnotationIndex::new)
        .find(|annotation| !excluded[**annotation] && Some(*annotation) != forbidden)
}

/// Returns the annotation that a node with the `current` annotation takes when
/// it has to become colored again. The annotations are scanned cyclically,
/// starting after the current color and ending with the current color itself,
/// skipping the excluded ones. Templar and phi nodes scan from zero.
pub fn next_available(current: Annotation, excluded: &AnnotationSet) -> Option<AnnotationIndex> {
    let count = excluded.len();
    let start = match current {
        Annotation::Colored(color) => *color + 1,
        _ => 0,
    };

    (0..count)
        .map(|offset| AnnotationIndex::new((start + offset) % count))
        .find(|annotation| !excluded[**annotation])
}

#[cfg(test)]
mod tests {
    use bitvec::bitvec;
    use bitvec::order::Lsb0;

    use super::*;

    #[test]
    fn test_next_available_wraps_around() {
        let excluded = bitvec![usize, Lsb0; 0, 1, 0];

        let color = |index| Annotation::Colored(AnnotationIndex::new(index));
        assert_eq!(next_available(color(0), &excluded), Some(AnnotationIndex::new(2)));
        assert_eq!(next_available(color(2), &excluded), Some(AnnotationIndex::new(0)));
        assert_eq!(next_available(Annotation::Templar, &excluded), Some(AnnotationIndex::new(0)));

        // A single available annotation is found again by the node that has it.
        let excluded = bitvec![usize, Lsb0; 1, 0];
        assert_eq!(next_available(color(1), &excluded), Some(AnnotationIndex::new(1)));

        let excluded = bitvec![usize, Lsb0; 1, 1];
        assert_eq!(next_available(color(0), &excluded), None);
    }

    #[test]
    fn test_first_available() {
        let excluded = bitvec![usize, Lsb0; 1, 0, 0];

        assert_eq!(first_available(&excluded, None), Some(AnnotationIndex::new(1)));
        assert_eq!(
            first_available(&excluded, Some(AnnotationIndex::new(1))),
            Some(AnnotationIndex::new(2))
        );

        let excluded = bitvec![usize, Lsb0; 0];
        assert_eq!(first_available(&excluded, Some(AnnotationIndex::new(0))), None);
    }

    #[test]
    fn test_annotation_display() {
        assert_eq!(Annotation::Colored(AnnotationIndex::new(3)).to_string(), "3");
        assert_eq!(Annotation::Templar.to_string(), "+");
        assert_eq!(Annotation::Phi.to_string(), "f");
    }
}
