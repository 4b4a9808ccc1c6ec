/// Terminal front end for the pyramid diagram
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use pyramid_core::{ApproxMeasure, Theme, Viewer, ViewerConfig};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::CellRenderer;

/// Character cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 2.0;

/// Orbit step per arrow key press, in radians
const KEY_ROTATE: f32 = 0.12;
/// Pan step per key press, in cells
const KEY_PAN: f32 = 3.0;
const KEY_ZOOM: f32 = 0.9;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    viewer: Viewer,
    renderer: CellRenderer,
    clock: Instant,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(theme: &Theme, config: &ViewerConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let viewer = Viewer::new(theme, config, &ApproxMeasure, width as u32, height as u32)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut app = Self {
            viewer,
            renderer: CellRenderer::new(width as usize, height as usize),
            clock: Instant::now(),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        };
        app.resize(width, height);
        Ok(app)
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            self.viewer.tick(self.clock.elapsed().as_secs_f64());
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.renderer.resize(width as usize, height as usize);
        if width > 0 && height > 0 {
            self.viewer
                .camera
                .set_aspect(width as f32 / (height as f32 * CELL_ASPECT));
        }
        log::debug!("viewport resized to {width}x{height} cells");
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                self.handle_key(code)
            }
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        let (_, rows) = self.renderer.size();
        let rows = rows as f32;
        let controls = &mut self.viewer.controls;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Left => controls.rotate_left(-KEY_ROTATE),
            KeyCode::Right => controls.rotate_left(KEY_ROTATE),
            KeyCode::Up => controls.rotate_up(-KEY_ROTATE),
            KeyCode::Down => controls.rotate_up(KEY_ROTATE),
            KeyCode::Char('+') | KeyCode::Char('=') => controls.dolly_in(KEY_ZOOM),
            KeyCode::Char('-') => controls.dolly_out(KEY_ZOOM),
            KeyCode::Char('a') => controls.pan(-KEY_PAN, 0.0, rows, &self.viewer.camera),
            KeyCode::Char('d') => controls.pan(KEY_PAN, 0.0, rows, &self.viewer.camera),
            KeyCode::Char('w') => controls.pan(0.0, -KEY_PAN, rows, &self.viewer.camera),
            KeyCode::Char('s') => controls.pan(0.0, KEY_PAN, rows, &self.viewer.camera),
            KeyCode::Char('r') => self.viewer.replay(),
            _ => {}
        }
    }

    fn render(&mut self) -> io::Result<()> {
        self.renderer
            .render_scene(&self.viewer.scene, &self.viewer.camera);

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "FPS: {:.1} | Arrows=Orbit +/-=Zoom WASD=Pan R=Replay Q=Quit",
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
