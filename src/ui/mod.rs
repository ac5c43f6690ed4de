//! egui widgets for the layer engine
//!
//! The sidebar and inspector only read engine snapshots and report what the
//! user asked for; the caller applies it (e.g. `engine.toggle(&id)`). The
//! canvas is the exception: it drives pointer input and panning into the
//! in-memory surface.

pub mod canvas;
pub mod inspector;
pub mod sidebar;

pub use canvas::{map_canvas, zoom_by, CanvasOptions};
pub use inspector::{display_value, inspector_panel};
pub use sidebar::{layer_sidebar, loading_screen, recenter_button};

use crate::engine::SidebarRow;
use crate::interaction::hover::Inspection;
use crate::readiness::ReadinessGate;

/// Convenience methods on [`egui::Ui`]
pub trait UiLayersExt {
    /// Toggle list; returns the id of a layer whose checkbox was clicked
    fn layer_sidebar(&mut self, rows: &[SidebarRow]) -> Option<String>;

    fn inspector(&mut self, inspection: Option<&Inspection>);

    fn recenter_button(&mut self) -> bool;

    fn loading_screen(&mut self, gate: &ReadinessGate);
}

impl UiLayersExt for egui::Ui {
    fn layer_sidebar(&mut self, rows: &[SidebarRow]) -> Option<String> {
        sidebar::layer_sidebar(self, rows)
    }

    fn inspector(&mut self, inspection: Option<&Inspection>) {
        inspector::inspector_panel(self, inspection)
    }

    fn recenter_button(&mut self) -> bool {
        sidebar::recenter_button(self)
    }

    fn loading_screen(&mut self, gate: &ReadinessGate) {
        sidebar::loading_screen(self, gate)
    }
}
