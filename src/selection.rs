//! Selection tracking over verse units.

use crate::conventions::MarkupConventions;
use crate::dom::ArenaDom;
use crate::verse::{VerseId, VerseIndex, VerseUnit};

/// Insertion-ordered set of selected verses.
///
/// Selecting a verse marks every one of its owner nodes with the selected
/// class, so a poetry verse lights up on all of its lines at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    members: Vec<VerseId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `id` if it is not selected, deselect it otherwise.
    ///
    /// Ids unknown to `index` are ignored. Returns the new selection size.
    pub fn toggle(
        &mut self,
        dom: &mut ArenaDom,
        index: &VerseIndex,
        id: VerseId,
        conventions: &MarkupConventions,
    ) -> usize {
        let Some(unit) = index.get(&id) else {
            log::debug!("ignoring toggle of unknown verse {id}");
            return self.count();
        };

        if let Some(pos) = self.members.iter().position(|m| *m == id) {
            self.members.remove(pos);
            for &owner in &unit.owners {
                dom.remove_class(owner, &conventions.selected_class);
            }
        } else {
            self.members.push(id);
            for &owner in &unit.owners {
                dom.add_class(owner, &conventions.selected_class);
            }
        }

        self.count()
    }

    /// Deselect everything. Safe on an empty selection.
    pub fn clear(&mut self, dom: &mut ArenaDom, index: &VerseIndex, conventions: &MarkupConventions) {
        for id in self.members.drain(..) {
            for &owner in index.owners(&id) {
                dom.remove_class(owner, &conventions.selected_class);
            }
        }
    }

    /// Forget the selection without touching the tree, for when the tree
    /// it referred to has been replaced.
    pub(crate) fn reset(&mut self) {
        self.members.clear();
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &VerseId) -> bool {
        self.members.contains(id)
    }

    /// Selected ids in the order they were selected.
    pub fn iter(&self) -> std::slice::Iter<'_, VerseId> {
        self.members.iter()
    }

    /// Resolve the selection against an index, in selection order.
    pub fn units<'a>(&self, index: &'a VerseIndex) -> Vec<&'a VerseUnit> {
        self.members.iter().filter_map(|id| index.get(id)).collect()
    }
}
