//! Per-texture settings: frame/mip/face selection, animation playback and
//! the texture flag list.

use vtex::vtf::consts::all_texture_flags;

use crate::{docs::Document, gui::viewer::ImageView};

pub struct SettingsPanel;

impl SettingsPanel {
    pub fn ui(ui: &mut egui::Ui, viewer: &mut ImageView, doc: Option<&mut Document>) {
        let Some(doc) = doc else {
            ui.weak("No texture loaded.");
            return;
        };

        let frames = doc.vtf.frame_count();
        let faces = doc.vtf.face_count();
        let mips = doc.vtf.mipmap_count();

        ui.group(|ui| {
            ui.strong("General");
            egui::Grid::new("general_settings").num_columns(2).show(ui, |ui| {
                ui.label("Frame:");
                ui.add(
                    egui::DragValue::new(&mut viewer.frame).clamp_range(0..=frames.saturating_sub(1)),
                );
                ui.end_row();

                ui.label("Mip:");
                ui.add(egui::DragValue::new(&mut viewer.mip).clamp_range(0..=mips.saturating_sub(1)));
                ui.end_row();

                ui.label("Face:");
                ui.add(
                    egui::DragValue::new(&mut viewer.face).clamp_range(0..=faces.saturating_sub(1)),
                );
                ui.end_row();

                ui.label("Start Frame:");
                let mut start = doc.vtf.start_frame();
                if ui
                    .add(egui::DragValue::new(&mut start).clamp_range(0..=frames.saturating_sub(1)))
                    .changed()
                {
                    doc.vtf.set_start_frame(start);
                    doc.modified = true;
                }
                ui.end_row();

                ui.label("Animation FPS:");
                ui.add(egui::DragValue::new(&mut viewer.fps).clamp_range(1.0..=144.0));
                ui.end_row();
            });

            // no point animating a single frame
            let can_animate = frames > 1;
            let label = if viewer.is_animating() { "Stop" } else { "Animate" };
            if ui.add_enabled(can_animate, egui::Button::new(label)).clicked() {
                if viewer.is_animating() {
                    viewer.stop_animation();
                } else {
                    viewer.start_animation();
                }
            }
        });

        ui.group(|ui| {
            ui.strong("Flags");
            egui::ScrollArea::vertical().show(ui, |ui| {
                let flags = doc.vtf.flags();
                for flag in all_texture_flags() {
                    let mut on = flags.contains(flag);
                    if ui.checkbox(&mut on, format!("{flag:?}")).changed() {
                        doc.vtf.set_flag(flag, on);
                        doc.modified = true;
                    }
                }
            });
        });
    }
}
