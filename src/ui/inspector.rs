use crate::interaction::hover::Inspection;
use egui::{Grid, ScrollArea, Ui};
use serde_json::Value;

/// Shows the properties of the hovered feature, or a hint when nothing is
/// hovered.
pub fn inspector_panel(ui: &mut Ui, inspection: Option<&Inspection>) {
    ui.heading("Feature");
    ui.separator();

    let Some(inspection) = inspection else {
        ui.weak("Hover a feature to see its properties");
        return;
    };

    ui.label(format!("{} #{}", inspection.layer_id, inspection.feature_id));

    ScrollArea::vertical().show(ui, |ui| {
        Grid::new("feature_properties")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for (key, value) in &inspection.properties {
                    ui.strong(key);
                    ui.label(display_value(value));
                    ui.end_row();
                }
            });
    });
}

/// Property value as shown in the inspector: strings unquoted, null empty
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
