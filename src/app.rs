use crate::blessing::BlessingClient;
use crate::config::Config;
use crate::input::{collect_input_nonblocking, map_event_to_action, Action};
use crate::mode::{Mode, ModeController};
use crate::render::PixelCanvas;
use crate::sim::{Simulation, Surface};
use crate::text::split_blessing;
use crate::ui;
use anyhow::{Context, Result};
use crossterm::{
    cursor, execute,
    terminal::{
        self, BeginSynchronizedUpdate, DisableLineWrap, EnableLineWrap, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::{self, Stdout},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::mpsc, task::JoinHandle};

pub(crate) const MAX_NAME_CHARS: usize = 24;

type Term = Terminal<CrosstermBackend<Stdout>>;

/// A blessing request leaving the session.
#[derive(Clone, Debug)]
pub(crate) struct Request {
    pub(crate) generation: u64,
    pub(crate) name: String,
}

/// The finished text, tagged with the session that asked for it.
#[derive(Clone, Debug)]
pub(crate) struct Reply {
    pub(crate) generation: u64,
    pub(crate) text: String,
}

/// Everything the screens show, minus the particles. No I/O in here.
#[derive(Debug)]
pub(crate) struct Greeting {
    controller: ModeController,
    name: String,
    blessing: String,
    generation: u64,
}

impl Greeting {
    pub(crate) fn new() -> Self {
        Self {
            controller: ModeController::new(),
            name: String::new(),
            blessing: String::new(),
            generation: 0,
        }
    }

    pub(crate) fn mode(&self) -> Mode {
        self.controller.mode()
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        if self.mode() != Mode::Input || self.is_loading() || ch.is_control() {
            return;
        }
        if self.name.chars().count() < MAX_NAME_CHARS {
            self.name.push(ch);
        }
    }

    pub(crate) fn backspace(&mut self) {
        if self.mode() == Mode::Input && !self.is_loading() {
            self.name.pop();
        }
    }

    /// None when the name is blank or a request is already out.
    pub(crate) fn submit(&mut self) -> Option<Request> {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            return None;
        }
        let name = trimmed.to_string();
        if !self.controller.begin_loading() {
            return None;
        }
        self.name = name.clone();
        Some(Request {
            generation: self.generation,
            name,
        })
    }

    /// Takes the reply if it belongs to this session and starts the assembly.
    pub(crate) fn accept(&mut self, reply: Reply, now: Instant) -> bool {
        if reply.generation != self.generation {
            log::debug!(
                "dropping blessing from session {} (now {})",
                reply.generation,
                self.generation
            );
            return false;
        }
        self.blessing = reply.text;
        self.controller.begin_transition(now);
        true
    }

    pub(crate) fn poll(&mut self, now: Instant) -> Mode {
        self.controller.poll(now)
    }

    pub(crate) fn restart(&mut self) {
        self.generation += 1;
        self.controller.reset();
        self.name.clear();
        self.blessing.clear();
    }

    pub(crate) fn halves(&self) -> (&str, &str) {
        split_blessing(&self.blessing)
    }
}

struct App {
    cfg: Config,
    client: Arc<BlessingClient>,
    sim: Simulation,
    canvas: PixelCanvas,
    greeting: Greeting,
    tx: mpsc::Sender<Reply>,
    rx: mpsc::Receiver<Reply>,
    pending: Option<JoinHandle<()>>,
    started: Instant,
    should_quit: bool,
}

impl App {
    fn init(cfg: Config, cols: u16, rows: u16) -> Result<Self> {
        let client = Arc::new(BlessingClient::new(&cfg.service)?);
        let canvas = PixelCanvas::for_cells(cols, rows);
        let sim = Simulation::new(cfg.particles, canvas.size(), cfg.seed, cfg.spin);
        let (tx, rx) = mpsc::channel(4);
        Ok(Self {
            cfg,
            client,
            sim,
            canvas,
            greeting: Greeting::new(),
            tx,
            rx,
            pending: None,
            started: Instant::now(),
            should_quit: false,
        })
    }

    async fn run(&mut self, term: &mut Term) -> Result<()> {
        let mut last = Instant::now();

        while !self.should_quit {
            let frame_start = Instant::now();

            let size = term.size().context("reading terminal size")?;
            if self.canvas.fit_cells(size.width, size.height) {
                log::debug!("terminal resized to {}x{}", size.width, size.height);
            }

            for ev in collect_input_nonblocking(self.cfg.frame_dt)? {
                if let Some(action) = map_event_to_action(self.greeting.mode(), &ev) {
                    self.apply(action);
                }
            }

            while let Ok(reply) = self.rx.try_recv() {
                if self.greeting.accept(reply, Instant::now()) {
                    self.pending = None;
                }
            }

            let now = Instant::now();
            let mode = self.greeting.poll(now);
            let dt = now.duration_since(last).as_secs_f32();
            last = now;
            let time = now.duration_since(self.started).as_secs_f32();

            self.sim.step(mode, time, dt, &mut self.canvas);

            let (canvas, greeting, mono) = (&self.canvas, &self.greeting, self.cfg.mono);
            term.draw(|f| ui::draw(f, canvas, greeting, mono, time))
                .context("drawing frame")?;

            pace(frame_start, self.cfg.frame_dt).await;
        }

        if let Some(task) = self.pending.take() {
            task.abort();
        }
        log::info!(
            "leaving after {} frames of {} particles",
            self.sim.frames(),
            self.sim.particles().len()
        );
        Ok(())
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Type(ch) => self.greeting.push_char(ch),
            Action::Erase => self.greeting.backspace(),
            Action::Submit => {
                if let Some(req) = self.greeting.submit() {
                    log::info!("requesting blessing (session {})", req.generation);
                    self.pending = Some(self.spawn_blessing(req));
                }
            }
            Action::Restart => {
                if let Some(task) = self.pending.take() {
                    task.abort();
                }
                self.greeting.restart();
                self.sim.restart(self.canvas.size());
                self.started = Instant::now();
            }
        }
    }

    fn spawn_blessing(&self, req: Request) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let text = client.bless(&req.name).await;
            // the receiver is gone only when the app is shutting down
            let _ = tx
                .send(Reply {
                    generation: req.generation,
                    text,
                })
                .await;
        })
    }
}

pub(crate) async fn run(cfg: Config) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = match terminal.size() {
        Ok(size) => match App::init(cfg, size.width, size.height) {
            Ok(mut app) => app.run(&mut terminal).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e).context("reading terminal size"),
    };
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Term> {
    terminal::enable_raw_mode()?;
    let mut out = io::stdout();
    execute!(out, EnterAlternateScreen, DisableLineWrap, cursor::Hide)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(term: &mut Term) -> Result<()> {
    let mut out = io::stdout();
    execute!(
        out,
        BeginSynchronizedUpdate,
        cursor::Show,
        EnableLineWrap,
        LeaveAlternateScreen,
        EndSynchronizedUpdate
    )?;
    terminal::disable_raw_mode()?;
    term.show_cursor()?;
    Ok(())
}

async fn pace(frame_start: Instant, frame_dt: Duration) {
    let spent = frame_start.elapsed();
    if spent < frame_dt {
        tokio::time::sleep(frame_dt - spent).await;
    }
}
