//! Aerocity - arcade flight over a procedurally generated city.

use bevy::{log::LogPlugin, prelude::*};

use aerocity::{AerocityPlugin, Settings};

fn main() -> AppExit {
    let settings = Settings::default();
    if let Err(err) = settings.validate() {
        eprintln!("aerocity: invalid configuration: {err}");
        return AppExit::error();
    }

    // Force Vulkan backend on Windows (DX12 causes crashes on some systems)
    #[cfg(target_os = "windows")]
    std::env::set_var("WGPU_BACKEND", "vulkan");

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Aerocity".into(),
                    resolution: (1280., 720.).into(),
                    ..default()
                }),
                ..default()
            })
            .set(LogPlugin {
                filter: "info,wgpu=error,naga=warn".into(),
                ..default()
            }),
    );
    settings.insert_into(&mut app);
    app.add_plugins(AerocityPlugin);

    info!("Aerocity starting");
    app.run()
}
