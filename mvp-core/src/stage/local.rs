/// Local space: every object at the origin of its own coordinate system
use nalgebra::Point3;

use super::{
    draw_axis_names, draw_marker_labels, draw_markers, draw_objects, draw_overlay, draw_reference, lock_hint,
    FrameContext, Stage, StageKind,
};
use crate::observer::{ObserverCamera, ObserverView};
use crate::renderer::{Color, Renderer};
use crate::state::VisualizationState;

pub struct LocalStage {
    observer: ObserverCamera,
}

impl LocalStage {
    pub fn new() -> Self {
        Self {
            observer: ObserverCamera::new(Point3::new(1.5, 2.0, 2.5), Point3::origin()).orbiting(),
        }
    }
}

impl Default for LocalStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for LocalStage {
    fn kind(&self) -> StageKind {
        StageKind::Local
    }

    fn update(&mut self, state: &mut VisualizationState, frame: &FrameContext, target: &mut dyn Renderer) {
        let focused = state.is_focused(StageKind::Local);
        self.observer.update(frame.dt, frame.input, focused);
        let observer = *self.observer.view();

        target.clear(Color::WHITE);
        target.begin_3d(&observer);
        draw_reference(state, &observer, target);
        draw_objects(StageKind::Local, state, target);
        draw_markers(StageKind::Local, state, target);
        target.end_3d();

        draw_axis_names(&observer, target);
        draw_marker_labels(StageKind::Local, state, &observer, target);
        let hints = [lock_hint(self.observer.is_locked())];
        draw_overlay(StageKind::Local, frame, &hints, target);
    }

    fn observer(&self, _state: &VisualizationState) -> ObserverView {
        *self.observer.view()
    }

    fn toggle_lock(&mut self) -> Option<bool> {
        Some(self.observer.toggle_lock())
    }

    fn is_locked(&self) -> bool {
        self.observer.is_locked()
    }
}
