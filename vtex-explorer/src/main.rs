mod app;
mod browse;
mod docs;
mod gui;
mod ops;
mod options;
mod render;
mod state;

use std::{env, path::Path, path::PathBuf, sync::Arc};

use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use crate::{options::Options, state::StateApp};

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("VTF Explorer")
            .with_inner_size(LogicalSize::new(1280.0, 800.0))
            .build(&event_loop)
            .unwrap(),
    );

    let options = Options::load(PathBuf::from("vtex-explorer.ini"));
    if options.start_maximized {
        window.set_maximized(true);
    }

    let mut state = pollster::block_on(StateApp::new(window.clone(), options));

    // open any textures handed over on the command line
    for arg in env::args().skip(1) {
        if arg.ends_with(".vtf") {
            state.app_mut().open_vtf_path(Path::new(&arg));
        }
    }

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                let consumed = state.on_window_event(&event);

                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    } if !consumed => {
                        elwt.exit();
                    }
                    WindowEvent::Resized(physical_size) => {
                        state.resize(physical_size);
                    }
                    WindowEvent::RedrawRequested => match state.render() {
                        Ok(_) => {}
                        // Reconfigure the surface if lost
                        Err(wgpu::SurfaceError::Lost) => state.reconfigure(),
                        // The system is out of memory, we should probably quit
                        Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                        // All other errors (Outdated, Timeout) should be resolved by the next frame
                        Err(e) => log::error!("{:?}", e),
                    },
                    _ => {}
                }
            }
            Event::AboutToWait => {
                // RedrawRequested will only trigger once, unless we manually
                // request it.
                state.window().request_redraw();
            }
            _ => {}
        })
        .unwrap();
}
