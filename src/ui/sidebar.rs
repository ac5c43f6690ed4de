use crate::engine::SidebarRow;
use crate::readiness::ReadinessGate;
use egui::{Color32, RichText, Ui};

/// Renders the layer toggle list grouped by source.
///
/// Checkboxes are bound to copies of the row state, so the registry stays the
/// only writer of visibility. Returns the layer id the user clicked, if any.
pub fn layer_sidebar(ui: &mut Ui, rows: &[SidebarRow]) -> Option<String> {
    let mut toggled = None;

    ui.heading("Layers Control");
    ui.separator();

    if rows.is_empty() {
        ui.weak("No layers loaded");
        return None;
    }

    let mut current_source: Option<&str> = None;
    for row in rows {
        if current_source != Some(row.source_name.as_str()) {
            ui.add_space(4.0);
            ui.strong(&row.source_name);
            current_source = Some(row.source_name.as_str());
        }

        ui.horizontal(|ui| {
            let mut visible = row.visible;
            if ui.checkbox(&mut visible, "").changed() {
                toggled = Some(row.layer_id.clone());
            }
            ui.colored_label(Color32::from(row.color), RichText::new("■").size(16.0));
            ui.label(&row.kind_label);
        });
    }

    toggled
}

pub fn recenter_button(ui: &mut Ui) -> bool {
    ui.button("⟲ Recenter").on_hover_text("Reset to the initial view").clicked()
}

/// Placeholder shown until the readiness gate opens
pub fn loading_screen(ui: &mut Ui, gate: &ReadinessGate) {
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() / 3.0);
        ui.spinner();
        ui.heading("Loading map layers…");

        let pending = gate.pending_sources();
        if !pending.is_empty() {
            ui.weak(format!("waiting for {}", pending.join(", ")));
        }
    });
}
