/// Pyramid Terminal Demo - layered pyramid diagram
///
/// Usage: pyramid-terminal [config.toml]
///
/// Controls:
///   - Arrow Keys: Orbit the camera
///   - +/-: Zoom
///   - WASD: Pan
///   - R: Replay the entrance animation
///   - Q/ESC: Quit

use std::io;
use pyramid_core::{Theme, ViewerConfig};
use pyramid_terminal::TerminalApp;

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("loading config from {path}");
            ViewerConfig::load(&path).map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidData, format!("{path}: {e}"))
            })?
        }
        None => ViewerConfig::default(),
    };
    let theme = Theme::resolve(|name| config.theme_value(name));

    let mut app = TerminalApp::new(&theme, &config)?;
    app.run()
}
