#![allow(dead_code)]

//! Drag-and-drop tracking for the drop zone.
//!
//! Browsers fire enter/leave for every nested child the pointer crosses.
//! Only a leave whose target is the zone's root ends the drag; leaves from
//! children are ignored so the highlight does not flicker.

use serde::Serialize;
use tracing::debug;

use crate::models::file::CandidateFile;

/// Identifies an element inside (or as) the drop zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ElementId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DropZoneState {
    #[default]
    Idle,
    DraggingOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    Enter { target: ElementId },
    Over { target: ElementId },
    Leave { target: ElementId },
    Drop { target: ElementId },
}

#[derive(Debug, Clone)]
pub struct DropZone {
    root: ElementId,
    state: DropZoneState,
}

impl DropZone {
    pub fn new(root: ElementId) -> Self {
        Self {
            root,
            state: DropZoneState::Idle,
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn state(&self) -> DropZoneState {
        self.state
    }

    pub fn is_dragging_over(&self) -> bool {
        self.state == DropZoneState::DraggingOver
    }

    /// Feeds one drag event through the tracker and returns the new state.
    /// Every event is consumed: the host suppresses the browser default.
    pub fn handle(&mut self, event: DragEvent) -> DropZoneState {
        let next = match event {
            DragEvent::Enter { .. } => DropZoneState::DraggingOver,
            DragEvent::Over { .. } => self.state,
            DragEvent::Leave { target } if target == self.root => DropZoneState::Idle,
            DragEvent::Leave { .. } => self.state,
            DragEvent::Drop { .. } => DropZoneState::Idle,
        };
        if next != self.state {
            debug!(?event, from = ?self.state, to = ?next, "drop zone transition");
        }
        self.state = next;
        next
    }

    /// Ends the drag and hands the dropped files on for validation.
    /// Returns `None` when the drop carried nothing.
    pub fn drop_files(
        &mut self,
        target: ElementId,
        files: Vec<CandidateFile>,
    ) -> Option<Vec<CandidateFile>> {
        self.handle(DragEvent::Drop { target });
        (!files.is_empty()).then_some(files)
    }

    pub fn clear(&mut self) {
        self.state = DropZoneState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: ElementId = ElementId(1);
    const CHILD: ElementId = ElementId(2);

    #[test]
    fn test_nested_enter_leave_does_not_flicker() {
        let mut zone = DropZone::new(ROOT);
        assert_eq!(zone.handle(DragEvent::Enter { target: ROOT }), DropZoneState::DraggingOver);
        assert_eq!(zone.handle(DragEvent::Enter { target: CHILD }), DropZoneState::DraggingOver);
        assert_eq!(zone.handle(DragEvent::Leave { target: CHILD }), DropZoneState::DraggingOver);
        assert_eq!(zone.handle(DragEvent::Leave { target: ROOT }), DropZoneState::Idle);
    }

    #[test]
    fn test_over_never_changes_state() {
        let mut zone = DropZone::new(ROOT);
        assert_eq!(zone.handle(DragEvent::Over { target: ROOT }), DropZoneState::Idle);
        zone.handle(DragEvent::Enter { target: ROOT });
        assert_eq!(zone.handle(DragEvent::Over { target: CHILD }), DropZoneState::DraggingOver);
    }

    #[test]
    fn test_drop_resets_from_child() {
        let mut zone = DropZone::new(ROOT);
        zone.handle(DragEvent::Enter { target: ROOT });
        zone.handle(DragEvent::Enter { target: CHILD });
        assert_eq!(zone.handle(DragEvent::Drop { target: CHILD }), DropZoneState::Idle);
    }

    #[test]
    fn test_drop_files_gates_empty_drops() {
        let mut zone = DropZone::new(ROOT);
        zone.handle(DragEvent::Enter { target: ROOT });
        assert!(zone.drop_files(ROOT, vec![]).is_none());
        assert!(!zone.is_dragging_over());

        zone.handle(DragEvent::Enter { target: ROOT });
        let files = vec![CandidateFile::new("a.pdf", 1, "application/pdf")];
        assert_eq!(zone.drop_files(ROOT, files.clone()), Some(files));
        assert_eq!(zone.state(), DropZoneState::Idle);
    }

    #[test]
    fn test_clear_and_reuse() {
        let mut zone = DropZone::new(ROOT);
        zone.handle(DragEvent::Enter { target: ROOT });
        zone.clear();
        assert_eq!(zone.state(), DropZoneState::Idle);
        zone.handle(DragEvent::Enter { target: ROOT });
        assert!(zone.is_dragging_over());
    }
}
