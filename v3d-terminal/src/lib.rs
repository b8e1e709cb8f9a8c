/// Terminal render host for View3D input files
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use log::{error, info};
use nalgebra::Point3;
use std::io::{self, stdout, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use v3d_core::{parse_file, InputModel, ModelError, ParseError, Scene, SceneBuilder};

pub mod camera;
pub mod config;
pub mod frame;
pub mod renderer;

pub use camera::{Camera, Orbit};
pub use config::{ConfigError, ViewerConfig};
pub use frame::{Frame, FrameLoop, ResizeFlag, StopHandle};
pub use renderer::{AsciiRenderer, Layers};

/// Everything that can stop the viewer
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Parse a file and check that every surface can be resolved
pub fn load_model(path: &Path) -> Result<InputModel, ViewerError> {
    let model = parse_file(path)?;
    model.validate()?;
    info!(
        "loaded {}: {:?} geometry, {} vertices, {} surfaces",
        path.display(),
        model.geometry_format(),
        model.vertex_count(),
        model.surfaces().len()
    );
    Ok(model)
}

/// How long a status message stays on screen
const STATUS_SECONDS: u32 = 3;

/// Transient message shown under the header for a fixed number of frames
#[derive(Debug, Default)]
pub struct StatusLine {
    message: Option<String>,
    frames_left: u32,
}

impl StatusLine {
    pub fn set(&mut self, message: impl Into<String>, frames: u32) {
        self.message = Some(message.into());
        self.frames_left = frames.max(1);
    }

    /// Count one drawn frame; the message disappears once its frames run out.
    pub fn tick(&mut self) {
        if self.message.is_some() {
            self.frames_left = self.frames_left.saturating_sub(1);
            if self.frames_left == 0 {
                self.message = None;
            }
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Interactive viewer: owns the scene and draws it every frame
pub struct TerminalApp {
    path: PathBuf,
    model: InputModel,
    scene: Scene,
    builder: SceneBuilder,
    orbit: Orbit,
    camera: Camera,
    renderer: AsciiRenderer,
    config: ViewerConfig,
    status: StatusLine,
}

impl TerminalApp {
    pub fn new(path: PathBuf, model: InputModel, config: ViewerConfig) -> Result<Self, ViewerError> {
        let (width, height) = terminal::size()?;

        let mut app = Self {
            path,
            model: InputModel::default(),
            scene: Scene::new(),
            builder: SceneBuilder::new(),
            orbit: Orbit::default(),
            camera: Camera::new(width, height),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            config,
            status: StatusLine::default(),
        };
        app.show(model)?;
        Ok(app)
    }

    /// Replace the displayed model. The old primitives are released together
    /// before the new ones are added.
    fn show(&mut self, model: InputModel) -> Result<(), ModelError> {
        model.validate()?;
        self.builder.clear(&mut self.scene);
        self.builder.add_model(&mut self.scene, &model)?;

        if let Some((min, max)) = model.bounds() {
            self.camera.frame_bounds(min, max);
            self.orbit = Orbit::new(nalgebra::center(&min, &max).cast::<f32>());
        } else {
            self.orbit = Orbit::new(Point3::origin());
        }
        self.model = model;
        Ok(())
    }

    fn reload(&mut self) {
        let result = load_model(&self.path).and_then(|model| self.show(model).map_err(ViewerError::from));
        let message = match result {
            Ok(()) => format!("reloaded {}", self.path.display()),
            Err(e) => {
                error!("reload failed: {}", e);
                format!("reload failed: {}", e)
            }
        };
        self.status.set(message, self.config.fps * STATUS_SECONDS);
    }

    pub fn run(&mut self) -> Result<(), ViewerError> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let mut frames = FrameLoop::new(self.config.fps);
        let stop = frames.stop_handle();
        let resize = frames.resize_flag();
        let result = frames.run(|frame| self.frame(frame, &stop, &resize));

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result?;
        Ok(())
    }

    fn frame(&mut self, frame: Frame, stop: &StopHandle, resize: &ResizeFlag) -> io::Result<()> {
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) => self.handle_key(key, stop),
                Event::Resize(_, _) => resize.set(),
                _ => {}
            }
        }
        if stop.is_stopped() {
            return Ok(());
        }

        if frame.resized {
            let (width, height) = terminal::size()?;
            self.camera.resize(width, height);
            self.renderer.resize(width as usize, height as usize);
            queue!(stdout(), Clear(ClearType::All))?;
        }

        self.orbit.rotate(self.config.spin_speed * frame.delta.as_secs_f32(), 0.0);
        self.render()
    }

    fn handle_key(&mut self, key: KeyEvent, stop: &StopHandle) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let step = self.config.rotate_step;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => stop.stop(),
            KeyCode::Char('a') | KeyCode::Left => self.orbit.rotate(-step, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.orbit.rotate(step, 0.0),
            KeyCode::Char('w') | KeyCode::Up => self.orbit.rotate(0.0, step),
            KeyCode::Char('s') | KeyCode::Down => self.orbit.rotate(0.0, -step),
            KeyCode::Char('f') => self.config.show_faces = !self.config.show_faces,
            KeyCode::Char('e') => self.config.show_edges = !self.config.show_edges,
            KeyCode::Char(' ') => {
                self.config.spin_speed = if self.config.spin_speed == 0.0 {
                    ViewerConfig::default().spin_speed
                } else {
                    0.0
                };
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let model = self.orbit.model_matrix();
        let layers = Layers {
            faces: self.config.show_faces,
            edges: self.config.show_edges,
        };

        self.renderer.clear();
        self.renderer
            .render(self.scene.primitives(), &model, &self.camera, layers);

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        let title = self.model.title().unwrap_or("untitled");
        let header = format!(
            "{} | {} surfaces | WASD/Arrows=Rotate F=Faces E=Edges Space=Spin R=Reload Q=Quit",
            title,
            self.model.surfaces().len()
        );
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(header),
            ResetColor
        )?;
        if let Some(status) = self.status.message() {
            queue!(
                stdout,
                cursor::MoveTo(0, 1),
                SetForegroundColor(Color::Yellow),
                Print(status),
                ResetColor
            )?;
        }
        self.status.tick();

        stdout.flush()?;
        Ok(())
    }
}

/// One-line-per-surface text report of a model and its primitives
pub fn summary(model: &InputModel) -> Result<String, ModelError> {
    let primitives = v3d_core::build_primitives(model)?;
    let faces: Vec<_> = primitives.iter().filter_map(|p| p.as_face()).collect();
    let outlines = primitives.iter().filter_map(|p| p.as_outline()).count();
    let triangles: usize = faces.iter().map(|f| f.triangles.len()).sum();

    let mut out = String::new();
    out.push_str(&format!("title:    {}\n", model.title().unwrap_or("-")));
    out.push_str(&format!(
        "format:   {} ({:?})\n",
        model.format().unwrap_or("-"),
        model.geometry_format()
    ));
    if let Some(control) = model.control() {
        let words: Vec<String> = control.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        out.push_str(&format!("control:  {}\n", words.join(" ")));
    }
    out.push_str(&format!("vertices: {}\n", model.vertex_count()));
    out.push_str(&format!(
        "surfaces: {} ({} triangles, {} outlines)\n",
        model.surfaces().len(),
        triangles,
        outlines
    ));
    for (surface, face) in model.surfaces().iter().zip(&faces) {
        out.push_str(&format!(
            "  {} {:>4} {:<12} corners={} emit={:.3} area={:.4}\n",
            surface.kind.code(),
            surface.key,
            surface.name,
            face.positions.len(),
            surface.emissivity,
            face.area()
        ));
    }
    Ok(out)
}
