//! Window + GPU + egui glue around [`App`].

use std::sync::Arc;

use common::prelude::StateInstance;
use egui_wgpu::ScreenDescriptor;
use winit::{dpi::PhysicalSize, event::WindowEvent, window::Window};

use crate::{app::App, options::Options};

pub struct StateApp {
    window: Arc<Window>,
    instance: StateInstance,
    size: PhysicalSize<u32>,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    app: App,
}

impl StateApp {
    pub async fn new(window: Arc<Window>, options: Options) -> Self {
        let size = window.inner_size();

        let wgpu_instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let surface = wgpu_instance.create_surface(window.clone()).unwrap();
        let adapter = wgpu_instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .unwrap();

        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(capabilities.formats[0]);

        let instance = StateInstance {
            surface,
            device,
            queue,
            format,
        };
        instance.configure_surface(size.width, size.height);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window.as_ref(),
            None,
            None,
        );
        let mut egui_renderer = egui_wgpu::Renderer::new(&instance.device, instance.format, None, 1);

        let app = App::new(&instance, options);
        // the viewer's paint callbacks look the pipeline up by type
        egui_renderer.callback_resources.insert(app.quad());

        Self {
            window,
            instance,
            size,
            egui_ctx,
            egui_state,
            egui_renderer,
            app,
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.instance.configure_surface(new_size.width, new_size.height);
        }
    }

    pub fn reconfigure(&mut self) {
        self.instance.configure_surface(self.size.width, self.size.height);
    }

    /// Feed an event to egui first; true means egui consumed it.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        self.egui_state.on_window_event(&self.window, event).consumed
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.instance.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.instance
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("ui encoder"),
                });

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let full_output = {
            let Self {
                egui_ctx,
                app,
                instance,
                ..
            } = self;
            egui_ctx.run(raw_input, |ctx| app.ui(ctx, instance))
        };

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [self.size.width, self.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(
                &self.instance.device,
                &self.instance.queue,
                *id,
                image_delta,
            );
        }
        let command_buffers = self.egui_renderer.update_buffers(
            &self.instance.device,
            &self.instance.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut rpass, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.instance
            .queue
            .submit(command_buffers.into_iter().chain([encoder.finish()]));
        output.present();
        Ok(())
    }
}
