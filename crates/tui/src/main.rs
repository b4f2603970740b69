mod host;
mod renderer;

use std::cell::RefCell;
use std::fs::File;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        MouseButton, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use danmaku_core::{AnchoredComment, Callbacks, Engine, EngineConfig, PlaybackSync, svg};
use danmaku_protocol::{
    CardAction, ItemId, RenderCommand, Viewport, WidgetEvent, WidgetHandle, WidgetSpec,
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Style},
    widgets::Block,
};
use tracing::{info, warn};

use crate::host::{COL_PX, ROW_PX, TerminalHost};

const FRAME: Duration = Duration::from_millis(16);
const SEEK_STEP_S: f64 = 5.0;

fn init_logging() -> Result<()> {
    // The terminal is taken over by the UI, so logs only go to a file.
    let Ok(path) = std::env::var("DANMAKU_LOG") else {
        return Ok(());
    };
    let file = File::create(&path).with_context(|| format!("creating log file {path}"))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: danmaku-tui <comments.json> [config.json]");
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let data = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut comments: Vec<AnchoredComment> =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    comments.sort_by(|a, b| a.time.total_cmp(&b.time));

    let config = match args.get(2) {
        Some(cfg) => {
            let json = std::fs::read_to_string(cfg).with_context(|| format!("reading {cfg}"))?;
            EngineConfig::from_json(&json)?
        }
        None => EngineConfig::default(),
    };
    info!(comments = comments.len(), "loaded comment track");

    run(config, &comments)
}

/// Media clock driven by the wall clock while playing.
struct Playback {
    time_s: f64,
    playing: bool,
    duration_s: f64,
}

struct App {
    engine: Engine<TerminalHost>,
    sync: PlaybackSync,
    playback: Playback,
    /// Card the pointer is currently over, for enter/leave events.
    over_card: Option<WidgetHandle>,
    last_frame: Vec<RenderCommand>,
    status: Option<String>,
    /// Likes raised by the card, applied after the event returns.
    liked: Rc<RefCell<Vec<ItemId>>>,
}

impl App {
    fn new(config: EngineConfig, comments: &[AnchoredComment]) -> Self {
        let sync = PlaybackSync::new(config.sync.clone());
        let duration_s = comments.last().map_or(0.0, |c| c.time) + 10.0;
        let liked: Rc<RefCell<Vec<ItemId>>> = Rc::default();
        let mut engine = Engine::new(config, TerminalHost::default());
        let queue = liked.clone();
        engine.set_callbacks(
            Callbacks::new()
                .on_like(move |id| queue.borrow_mut().push(id.clone()))
                .on_report(|id| info!(%id, "comment reported"))
                .on_delete(|id| info!(%id, "comment deleted")),
        );
        Self {
            engine,
            sync,
            playback: Playback {
                time_s: 0.0,
                playing: true,
                duration_s,
            },
            over_card: None,
            last_frame: Vec::new(),
            status: None,
            liked,
        }
    }

    fn resize(&mut self, area: Rect) {
        self.engine.init(Viewport::new(
            f64::from(area.width) * COL_PX,
            f64::from(area.height) * ROW_PX,
        ));
    }

    fn toggle_playing(&mut self) {
        self.playback.playing = !self.playback.playing;
        self.sync.set_playing(&mut self.engine, self.playback.playing);
    }

    fn seek(&mut self, delta_s: f64) {
        let to = (self.playback.time_s + delta_s).clamp(0.0, self.playback.duration_s);
        self.playback.time_s = to;
        self.sync.seek(&mut self.engine, to);
        self.over_card = None;
    }

    fn card_action(&mut self, action: CardAction) {
        if let Some(card) = self.engine.card_handle() {
            self.engine.widget_event(card, WidgetEvent::Action(action));
        }
        let liked: Vec<ItemId> = self.liked.borrow_mut().drain(..).collect();
        for id in liked {
            // No backend here: flip the like locally.
            let current = self
                .engine
                .items()
                .iter()
                .find(|i| i.id.as_ref() == Some(&id))
                .map(|i| (i.popularity, i.liked));
            if let Some((count, was_liked)) = current {
                let count = if was_liked {
                    count.saturating_sub(1)
                } else {
                    count + 1
                };
                self.engine.update_popularity(&id, count, Some(!was_liked));
                info!(%id, count, "comment like toggled");
            }
        }
        if let Some(text) = self.engine.host().clipboard.as_deref()
            && action == CardAction::Copy
        {
            self.status = Some(format!(" copied: {text} "));
        }
    }

    fn pointer(&mut self, area: Rect, column: u16, row: u16) {
        let over = renderer::widget_at(area, self.engine.host(), column, row);
        let card = over.as_ref().and_then(|(h, spec)| {
            matches!(spec, WidgetSpec::ActionCard(_)).then_some(*h)
        });
        if card != self.over_card {
            if let Some(old) = self.over_card {
                self.engine.widget_event(old, WidgetEvent::PointerLeave);
            }
            if let Some(new) = card {
                self.engine.widget_event(new, WidgetEvent::PointerEnter);
            }
            self.over_card = card;
        }
        match renderer::cell_to_point(area, column, row) {
            Some(p) => self.engine.pointer_move(p),
            None => self.engine.pointer_leave(),
        }
    }

    fn click(&mut self, area: Rect, column: u16, row: u16) {
        if let Some((handle, WidgetSpec::VoiceButton { .. })) =
            renderer::widget_at(area, self.engine.host(), column, row)
        {
            self.engine.widget_event(handle, WidgetEvent::Click);
        }
    }

    fn write_snapshot(&self, dir: &Path) -> Result<PathBuf> {
        let vp = self.engine.viewport();
        let doc = svg::render_svg(&self.last_frame, vp.width, vp.height, None);
        let path = dir.join(format!("danmaku-{:.0}s.svg", self.playback.time_s));
        std::fs::write(&path, doc).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// Save the last frame as SVG into `dir`. Failures only reach the
    /// status line; playback goes on.
    fn snapshot(&mut self, dir: &Path) {
        match self.write_snapshot(dir) {
            Ok(path) => {
                info!(path = %path.display(), "saved frame snapshot");
                self.status = Some(format!(" saved {} ", path.display()));
            }
            Err(err) => {
                warn!(%err, "frame snapshot failed");
                self.status = Some(format!(" snapshot failed: {err:#} "));
            }
        }
    }

    fn step(&mut self, now_ms: f64, dt: Duration, comments: &[AnchoredComment]) {
        if self.playback.playing {
            self.playback.time_s =
                (self.playback.time_s + dt.as_secs_f64()).min(self.playback.duration_s);
            self.sync
                .advance(&mut self.engine, self.playback.time_s, comments);
        }
        let host = self.engine.host_mut();
        host.clock_ms = now_ms;
        for clip in host.finished_clips() {
            self.engine.audio_ended(clip);
        }
        if let Some(frame) = self.engine.tick(now_ms) {
            self.last_frame = frame;
        }
    }
}

fn run(config: EngineConfig, comments: &[AnchoredComment]) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, config, comments);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    config: EngineConfig,
    comments: &[AnchoredComment],
) -> Result<()> {
    let mut app = App::new(config, comments);
    let mut stage = Rect::default();
    let started = Instant::now();
    let mut last = started;
    app.engine.start();

    loop {
        let size = terminal.size()?;
        let area = Rect::new(0, 1, size.width, size.height.saturating_sub(1));
        if area != stage {
            stage = area;
            app.resize(stage);
        }

        let now = Instant::now();
        app.step(
            now.duration_since(started).as_secs_f64() * 1000.0,
            now.duration_since(last),
            comments,
        );
        last = now;

        terminal.draw(|frame| {
            let full = frame.area();
            let state = if app.playback.playing { "▶" } else { "⏸" };
            let title = app.status.clone().unwrap_or_else(|| {
                format!(
                    " {state} {:.1}s / {:.0}s | {} live | space pause | ←→ seek | s snapshot | q quit ",
                    app.playback.time_s,
                    app.playback.duration_s,
                    app.engine.items().len(),
                )
            });
            frame.render_widget(
                Block::default()
                    .title(title)
                    .style(Style::default().fg(Color::White).bg(Color::DarkGray)),
                Rect::new(0, 0, full.width, 1),
            );
            frame.render_widget(
                Block::default().style(Style::default().bg(Color::Black)),
                stage,
            );
            renderer::draw_commands(frame.buffer_mut(), stage, &app.last_frame);
            renderer::draw_widgets(frame, stage, app.engine.host());
        })?;

        if !event::poll(FRAME)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                app.status = None;
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char(' ') => app.toggle_playing(),
                    KeyCode::Left => app.seek(-SEEK_STEP_S),
                    KeyCode::Right => app.seek(SEEK_STEP_S),
                    KeyCode::Char('l') => app.card_action(CardAction::Like),
                    KeyCode::Char('c') => app.card_action(CardAction::Copy),
                    KeyCode::Char('r') => app.card_action(CardAction::Report),
                    KeyCode::Char('d') => app.card_action(CardAction::Delete),
                    KeyCode::Char('s') => app.snapshot(Path::new(".")),
                    _ => {}
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    app.pointer(stage, mouse.column, mouse.row);
                }
                MouseEventKind::Down(MouseButton::Left) => {
                    app.click(stage, mouse.column, mouse.row);
                }
                _ => {}
            },
            Event::FocusLost => app.engine.pointer_leave(),
            _ => {}
        }
    }

    app.engine.stop();
    app.engine.clear();
    Ok(())
}
