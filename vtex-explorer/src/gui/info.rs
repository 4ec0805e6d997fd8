//! Read-only header facts for the active texture.

use crate::docs::Document;

pub struct InfoPanel;

impl InfoPanel {
    pub fn ui(ui: &mut egui::Ui, doc: Option<&Document>) {
        let Some(doc) = doc else {
            ui.weak("No texture loaded.");
            return;
        };
        let vtf = &doc.vtf;

        let (major, minor) = vtf.version();
        let [rx, ry, rz] = vtf.reflectivity();

        egui::Grid::new("texture_info").num_columns(2).show(ui, |ui| {
            ui.label("Version:");
            ui.label(format!("{major}.{minor}"));
            ui.end_row();

            ui.label("Size:");
            ui.label(format!("{}x{}", vtf.width(), vtf.height()));
            ui.end_row();

            ui.label("Format:");
            ui.label(format!("{:?}", vtf.format()));
            ui.end_row();

            ui.label("Mipmaps:");
            ui.label(vtf.mipmap_count().to_string());
            ui.end_row();

            ui.label("Frames:");
            ui.label(vtf.frame_count().to_string());
            ui.end_row();

            ui.label("Faces:");
            ui.label(vtf.face_count().to_string());
            ui.end_row();

            ui.label("Depth:");
            ui.label(vtf.depth().to_string());
            ui.end_row();

            ui.label("Reflectivity:");
            ui.label(format!("{rx:.3}, {ry:.3}, {rz:.3}"));
            ui.end_row();

            ui.label("Bumpmap scale:");
            ui.label(format!("{:.2}", vtf.bumpmap_scale()));
            ui.end_row();

            ui.label("Thumbnail:");
            match vtf.decode_low_res() {
                Ok((w, h, _)) => ui.label(format!("{w}x{h} {:?}", vtf.low_res_format())),
                Err(_) => ui.label("none"),
            };
            ui.end_row();

            ui.label("Image data:");
            ui.label(format!("{:.1} KiB", vtf.data_size() as f64 / 1024.0));
            ui.end_row();
        });

        ui.separator();
        ui.strong("Flags");
        let flags = vtf.flags();
        if flags.is_empty() {
            ui.weak("none");
        }
        for flag in flags {
            ui.label(format!("{flag:?}"));
        }
    }
}
