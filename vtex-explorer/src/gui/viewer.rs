//! The central image view: a zoomable, pannable textured quad with
//! per-channel masking and frame animation.

use std::{sync::Arc, time::Instant};

use ahash::AHashMap;
use common::prelude::{StateInstance, VTexture};

use crate::{
    docs::{DocId, Document},
    render::quad::{QuadPaint, QuadPipeline, QuadUniform, MASK_ALPHA, MASK_BLUE, MASK_GREEN, MASK_RED},
};

pub struct ImageView {
    zoom: f32,
    offset: egui::Vec2,

    pub red: bool,
    pub green: bool,
    pub blue: bool,
    pub alpha: bool,

    pub frame: u32,
    pub face: u32,
    pub mip: u32,

    animating: bool,
    pub fps: f32,
    frame_clock: f32,
    last_tick: Option<Instant>,

    cache: AHashMap<(DocId, u32, u32, u32), Option<Arc<wgpu::BindGroup>>>,
}

impl ImageView {
    pub fn new() -> Self {
        Self {
            zoom: 1.0,
            offset: egui::Vec2::ZERO,
            red: true,
            green: true,
            blue: true,
            alpha: true,
            frame: 0,
            face: 0,
            mip: 0,
            animating: false,
            fps: 24.0,
            frame_clock: 0.0,
            last_tick: None,
            cache: AHashMap::new(),
        }
    }

    /// Bind the view to a freshly activated document.
    pub fn reset_for(&mut self, doc: Option<&Document>) {
        self.zoom = 1.0;
        self.offset = egui::Vec2::ZERO;
        self.frame = doc.map(|d| d.vtf.start_frame()).unwrap_or(0);
        self.face = 0;
        self.mip = 0;
        self.stop_animation();
    }

    pub fn zoom_by(&mut self, amount: f32) {
        self.zoom = (self.zoom + amount).max(0.01);
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn start_animation(&mut self) {
        self.animating = true;
        self.frame_clock = 0.0;
        self.last_tick = None;
    }

    pub fn stop_animation(&mut self) {
        self.animating = false;
        self.last_tick = None;
    }

    /// Drop cached GPU textures for a closed or edited document.
    pub fn invalidate(&mut self, id: DocId) {
        self.cache.retain(|(doc, _, _, _), _| *doc != id);
    }

    fn channel_mask(&self) -> u32 {
        let mut mask = 0;
        if self.red {
            mask |= MASK_RED;
        }
        if self.green {
            mask |= MASK_GREEN;
        }
        if self.blue {
            mask |= MASK_BLUE;
        }
        if self.alpha {
            mask |= MASK_ALPHA;
        }
        mask
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        active: Option<(DocId, &Document)>,
        instance: &StateInstance,
        quad: &Arc<QuadPipeline>,
    ) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

        let Some((id, doc)) = active else {
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Open a VTF to view it here",
                egui::FontId::proportional(16.0),
                ui.visuals().weak_text_color(),
            );
            return;
        };

        // ctrl + wheel zooms, dragging pans
        if response.hovered() {
            let (ctrl, scroll) = ui.input(|i| (i.modifiers.ctrl, i.raw_scroll_delta.y));
            if ctrl && scroll != 0.0 {
                self.zoom_by(0.1 * scroll.signum());
            }
        }
        if response.dragged() {
            let delta = response.drag_delta();
            self.offset.x += 2.0 * delta.x / rect.width();
            self.offset.y -= 2.0 * delta.y / rect.height();
        }

        let frames = doc.vtf.frame_count();
        if self.animating && frames > 1 {
            let now = Instant::now();
            if let Some(last) = self.last_tick {
                self.frame_clock += (now - last).as_secs_f32();
                let step = 1.0 / self.fps.max(1.0);
                while self.frame_clock >= step {
                    self.frame_clock -= step;
                    self.frame = (self.frame + 1) % frames;
                }
            }
            self.last_tick = Some(now);
            ui.ctx().request_repaint();
        }

        let frame = self.frame.min(frames - 1);
        let face = self.face.min(doc.vtf.face_count() - 1);
        let mip = self.mip.min(doc.vtf.mipmap_count().saturating_sub(1));

        let key = (id, frame, face, mip);
        if !self.cache.contains_key(&key) {
            let bind_group = match doc.vtf.decode_rgba8(frame, face, mip) {
                Ok((w, h, pixels)) => {
                    let texture = VTexture::from_rgba8(
                        &instance.device,
                        &instance.queue,
                        w,
                        h,
                        &pixels,
                        "vtf image",
                    );
                    Some(Arc::new(quad.texture_bind_group(&instance.device, &texture)))
                }
                Err(e) => {
                    log::warn!("could not decode image: {e}");
                    None
                }
            };
            self.cache.insert(key, bind_group);
        }

        match self.cache.get(&key).and_then(|b| b.clone()) {
            Some(bind_group) => {
                let image_aspect = doc.vtf.width() as f32 / doc.vtf.height() as f32;
                let rect_aspect = rect.width() / rect.height();
                let (fit_w, fit_h) = if image_aspect >= rect_aspect {
                    (1.0, rect_aspect / image_aspect)
                } else {
                    (image_aspect / rect_aspect, 1.0)
                };

                let uniform = QuadUniform {
                    scale: [2.0 * fit_w * self.zoom, 2.0 * fit_h * self.zoom],
                    offset: [self.offset.x, self.offset.y],
                    channel_mask: self.channel_mask(),
                    _pad: [0; 3],
                };

                ui.painter().add(egui_wgpu::Callback::new_paint_callback(
                    rect,
                    QuadPaint {
                        uniform,
                        bind_group,
                    },
                ));
            }
            None => {
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Could not decode this image",
                    egui::FontId::proportional(16.0),
                    ui.visuals().error_fg_color,
                );
            }
        }
    }
}
