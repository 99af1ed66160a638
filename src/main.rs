// main.rs - skybox viewer: panorama -> vertical cross -> cube faces -> wgpu cube texture

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod camera;
mod config;
mod renderer;

use camera::SkyboxCamera;
use config::ViewerConfig;
use renderer::Renderer;

use skybox_cubemap::{
    equirect_to_vertical_cross, load_panorama, save_diagnostic, vertical_cross_to_cube_faces,
    CubeFaces, CubemapError, PixelBuffer,
};
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, WindowBuilder},
};

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const PANORAMA_EXTENSIONS: [&str; 5] = ["hdr", "jpg", "jpeg", "png", "bmp"];

/// A converted panorama, ready for upload.
struct LoadedSky {
    path: PathBuf,
    cross: PixelBuffer,
    faces: CubeFaces,
}

type LoadResult = Result<LoadedSky, (PathBuf, CubemapError)>;

fn main() {
    env_logger::init();

    let config = ViewerConfig::load();

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title("Skybox Viewer")
        .with_inner_size(LogicalSize::new(1024, 768))
        .build(&event_loop)
    {
        Ok(w) => Arc::new(w),
        Err(e) => {
            log::error!("cannot create window: {}", e);
            std::process::exit(1);
        }
    };

    let mut renderer = match pollster::block_on(Renderer::new(window.clone(), config.vsync)) {
        Ok(r) => r,
        Err(e) => {
            log::error!("cannot initialise renderer: {}", e);
            std::process::exit(1);
        }
    };
    let mut camera = SkyboxCamera::new(config.fov, config.exposure);

    // the panorama named at startup must load, later ones may fail
    let initial = match convert_panorama(&config.panorama, config.cross_out.as_deref()) {
        Ok(sky) => sky,
        Err(e) => {
            log::error!("cannot load {:?}: {}", config.panorama, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = renderer.load_cube_faces(&initial.faces) {
        log::error!("cannot upload {:?}: {}", initial.path, e);
        std::process::exit(1);
    }
    let mut current_name = display_name(&initial.path);
    let mut current_cross = Some(initial.cross);

    // interaction
    let mut mouse_pressed = false;
    let mut last_mouse_pos: Option<PhysicalPosition<f64>> = None;

    // fps
    let mut last_frame_time = Instant::now();
    let mut frame_count = 0;
    let mut fps = 0.0;
    let mut show_fps = false;

    let mut vsync_enabled = config.vsync;
    let mut is_loading = false;

    let (tx, rx): (Sender<LoadResult>, Receiver<LoadResult>) = channel();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Ok(result) = rx.try_recv() {
            is_loading = false;
            match result {
                Ok(sky) => match renderer.load_cube_faces(&sky.faces) {
                    Ok(()) => {
                        current_name = display_name(&sky.path);
                        current_cross = Some(sky.cross);
                    }
                    Err(e) => log::error!("cannot upload {:?}: {}", sky.path, e),
                },
                Err((path, e)) => log::error!("cannot load {:?}: {}", path, e),
            }
        }

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::Escape) => {
                                    *control_flow = ControlFlow::Exit;
                                }
                                Some(VirtualKeyCode::O) => {
                                    if let Some(path) = pick_panorama() {
                                        is_loading = true;
                                        start_load_panorama(path, tx.clone());
                                    }
                                }
                                Some(VirtualKeyCode::F11) => {
                                    camera.is_fullscreen = !camera.is_fullscreen;
                                    set_fullscreen(&window, camera.is_fullscreen);
                                }
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            mouse_pressed = state == ElementState::Pressed;
                            if !mouse_pressed {
                                last_mouse_pos = None;
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        if mouse_pressed {
                            if let Some(last_pos) = last_mouse_pos {
                                camera.drag(
                                    (position.x - last_pos.x) as f32,
                                    (position.y - last_pos.y) as f32,
                                    renderer.size.width as f32,
                                    renderer.size.height as f32,
                                );
                            }
                            last_mouse_pos = Some(position);
                        }
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                        };
                        camera.zoom(scroll);
                    }

                    WindowEvent::DroppedFile(path) => {
                        is_loading = true;
                        start_load_panorama(path, tx.clone());
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                frame_count += 1;
                let now = Instant::now();
                if now.duration_since(last_frame_time).as_secs_f32() >= 1.0 {
                    fps = frame_count as f32 / now.duration_since(last_frame_time).as_secs_f32();
                    frame_count = 0;
                    last_frame_time = now;
                }

                renderer.update_camera(&camera);

                let mut action = UiAction::None;
                let face_size = renderer.face_size();
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    action = draw_ui(
                        ctx,
                        &mut camera,
                        &mut show_fps,
                        &mut vsync_enabled,
                        StatusLine {
                            name: &current_name,
                            face_size,
                            fps,
                            is_loading,
                        },
                    );
                });

                match action {
                    UiAction::None => {}
                    UiAction::Open(path) => {
                        is_loading = true;
                        start_load_panorama(path, tx.clone());
                    }
                    UiAction::ExportCross(path) => match &current_cross {
                        Some(cross) => {
                            if let Err(e) = save_diagnostic(&path, cross) {
                                log::error!("cannot export cross to {:?}: {}", path, e);
                            }
                        }
                        None => log::warn!("no cross image to export"),
                    },
                    UiAction::SetVsync(on) => renderer.set_vsync(on),
                    UiAction::ToggleFullscreen => {
                        camera.is_fullscreen = !camera.is_fullscreen;
                        set_fullscreen(&window, camera.is_fullscreen);
                    }
                    UiAction::Exit => *control_flow = ControlFlow::Exit,
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::warn!("render error: {:?}", e),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    });
}

/// Decode, project, slice; optionally dump the cross for inspection.
fn convert_panorama(path: &Path, cross_out: Option<&Path>) -> Result<LoadedSky, CubemapError> {
    let started = Instant::now();
    let panorama = load_panorama(path)?;
    let cross = equirect_to_vertical_cross(&panorama)?;
    if let Some(out) = cross_out {
        // a failed dump is not worth losing the sky over
        if let Err(e) = save_diagnostic(out, &cross) {
            log::warn!("cannot write cross to {:?}: {}", out, e);
        }
    }
    let faces = vertical_cross_to_cube_faces(&cross)?;
    log::info!(
        "converted {:?} into {}px faces in {:.1?}",
        path,
        faces.face_size(),
        started.elapsed()
    );
    Ok(LoadedSky {
        path: path.to_path_buf(),
        cross,
        faces,
    })
}

fn start_load_panorama(path: PathBuf, tx: Sender<LoadResult>) {
    thread::spawn(move || {
        log::info!("loading {:?} in background", path);
        let result = convert_panorama(&path, None).map_err(|e| (path, e));
        if tx.send(result).is_err() {
            log::error!("viewer closed before the panorama was ready");
        }
    });
}

fn pick_panorama() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Panoramas", &PANORAMA_EXTENSIONS)
        .pick_file()
}

fn set_fullscreen(window: &winit::window::Window, on: bool) {
    if on {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        window.set_fullscreen(None);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

enum UiAction {
    None,
    Open(PathBuf),
    ExportCross(PathBuf),
    SetVsync(bool),
    ToggleFullscreen,
    Exit,
}

struct StatusLine<'a> {
    name: &'a str,
    face_size: u32,
    fps: f32,
    is_loading: bool,
}

fn draw_ui(
    ctx: &egui::Context,
    camera: &mut SkyboxCamera,
    show_fps: &mut bool,
    vsync_enabled: &mut bool,
    status: StatusLine<'_>,
) -> UiAction {
    let mut action = UiAction::None;

    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open panorama…").clicked() {
                    ui.close_menu();
                    if let Some(path) = pick_panorama() {
                        action = UiAction::Open(path);
                    }
                }
                if ui.button("Export vertical cross…").clicked() {
                    ui.close_menu();
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Radiance HDR", &["hdr"])
                        .add_filter("PNG", &["png"])
                        .set_file_name("cross.hdr")
                        .save_file()
                    {
                        action = UiAction::ExportCross(path);
                    }
                }
                if ui.button("Exit").clicked() {
                    action = UiAction::Exit;
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Reset view").clicked() {
                    camera.reset();
                    ui.close_menu();
                }
                let fullscreen_label = if camera.is_fullscreen {
                    "Exit fullscreen"
                } else {
                    "Fullscreen"
                };
                if ui.button(fullscreen_label).clicked() {
                    action = UiAction::ToggleFullscreen;
                    ui.close_menu();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut camera.exposure, 0.05..=8.0).text("Exposure"));
                ui.add(
                    egui::Slider::new(&mut camera.sensitivity_scale, 0.1..=5.0)
                        .text("Drag sensitivity"),
                );

                ui.separator();
                if ui.checkbox(show_fps, "Show FPS").clicked() {
                    ui.close_menu();
                }
                if ui.checkbox(vsync_enabled, "VSync").clicked() {
                    action = UiAction::SetVsync(*vsync_enabled);
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if status.is_loading {
                ui.label(egui::RichText::new("Loading…").color(egui::Color32::YELLOW));
                ui.label("|");
            }

            ui.label(status.name);
            ui.label("|");
            ui.label(format!("Face: {}px", status.face_size));
            ui.label("|");
            ui.label(format!("FOV: {:.1}°", camera.fov));
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", camera.yaw));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", camera.pitch));

            if *show_fps {
                ui.label("|");
                ui.label(
                    egui::RichText::new(format!("FPS: {:.1}", status.fps))
                        .color(egui::Color32::GREEN),
                );
            }
        });
    });

    action
}
