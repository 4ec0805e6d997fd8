/// Data that will be read only for the course of the program, containing
/// everything needed to create pipelines and upload textures.
pub struct StateInstance {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
}

impl StateInstance {
    pub fn configure_surface(&self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("not configuring a {width}x{height} surface");
            return;
        }
        self.surface.configure(
            &self.device,
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format: self.format,
                width,
                height,
                present_mode: wgpu::PresentMode::AutoVsync,
                desired_maximum_frame_latency: 2,
                alpha_mode: wgpu::CompositeAlphaMode::Auto,
                view_formats: vec![],
            },
        );
    }
}
