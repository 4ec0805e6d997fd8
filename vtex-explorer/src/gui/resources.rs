//! Resource dictionary listing for 7.3+ textures.

use vtex::vtf::header::resource_name;

use crate::docs::Document;

pub struct ResourcePanel;

impl ResourcePanel {
    pub fn ui(ui: &mut egui::Ui, doc: Option<&Document>) {
        let Some(doc) = doc else {
            ui.weak("No texture loaded.");
            return;
        };

        let resources = doc.vtf.resources();
        if resources.is_empty() {
            ui.weak("This texture has no resource dictionary.");
            return;
        }

        egui::Grid::new("resources").num_columns(3).striped(true).show(ui, |ui| {
            ui.strong("Resource");
            ui.strong("Tag");
            ui.strong("Offset");
            ui.end_row();

            for entry in resources {
                ui.label(resource_name(entry.tag));
                ui.label(format!("{:02x} {:02x} {:02x}", entry.tag[0], entry.tag[1], entry.tag[2]));
                ui.label(format!("0x{:08x}", entry.offset));
                ui.end_row();
            }
        });
    }
}
