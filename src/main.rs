mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keyrace::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, Mode},
    generator::GenerateError,
    miner::mine_mistakes,
    persist::{PersistHandle, PersistRequest},
    runtime::{crossterm_events, RaceEvent, Runner},
    session::{is_valid_byte, Keystroke, Progress, Session, SessionRecord},
    storage::{AggregateStats, SessionDb},
    word_bank::WordBank,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

/// How long a storage failure stays on screen.
const ERROR_BANNER_SECS: u64 = 5;

/// Every third completed session triggers a fresh mining pass.
const SESSIONS_PER_MINE: u32 = 3;

/// How much history the miner and the history screen look back over.
const HISTORY_DEPTH: usize = 100;

/// terminal typing racer with a windowed prompt and adaptive practice lists
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// word list to draw the test from
    #[clap(short = 'l', long = "list")]
    list: Option<String>,

    /// how the test ends: a countdown or the whole target
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// countdown length for time mode
    #[clap(short = 's', long = "seconds")]
    seconds: Option<u64>,

    /// number of words drawn for words mode
    #[clap(short = 'w', long = "words")]
    words: Option<usize>,

    /// allow backspace to undo the last keystroke
    #[clap(long)]
    backspace: bool,

    /// show viewport internals under the prompt
    #[clap(long)]
    debug: bool,

    /// print the available word lists and exit
    #[clap(long)]
    lists: bool,
}

impl Cli {
    /// Overlays the flags that were given onto the stored config.
    fn apply(&self, config: &mut Config) {
        if let Some(list) = &self.list {
            config.word_list = list.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(seconds) = self.seconds {
            config.duration_secs = seconds;
        }
        if let Some(words) = self.words {
            config.words_test_size = words;
        }
        if self.backspace {
            config.allow_backspace = true;
        }
        if self.debug {
            config.debug = true;
        }
    }
}

#[derive(Debug)]
pub struct ErrorBanner {
    pub message: String,
    pub shown_at: Instant,
}

#[derive(Debug)]
pub enum Screen {
    Typing,
    Results {
        record: SessionRecord,
    },
    History {
        rows: Vec<SessionRecord>,
        resume: Box<SessionRecord>,
    },
}

#[derive(Debug)]
pub struct App {
    pub config: Config,
    pub bank: WordBank,
    pub session: Session,
    pub screen: Screen,
    pub stats: AggregateStats,
    pub error_banner: Option<ErrorBanner>,
    pub completed_since_mine: u32,
}

impl App {
    pub fn new(config: Config, bank: WordBank) -> Result<Self, GenerateError> {
        let session = build_session(&config, &bank)?;
        Ok(Self {
            config,
            bank,
            session,
            screen: Screen::Typing,
            stats: AggregateStats::default(),
            error_banner: None,
            completed_since_mine: 0,
        })
    }

    /// Fresh target, back to the typing screen. Config and lifetime stats
    /// carry over.
    pub fn new_session(&mut self) -> Result<(), GenerateError> {
        self.session = build_session(&self.config, &self.bank)?;
        self.screen = Screen::Typing;
        Ok(())
    }

    fn show_error(&mut self, message: String) {
        self.error_banner = Some(ErrorBanner {
            message,
            shown_at: Instant::now(),
        });
    }

    fn expire_banner(&mut self) {
        if let Some(banner) = &self.error_banner {
            if banner.shown_at.elapsed() >= Duration::from_secs(ERROR_BANNER_SECS) {
                self.error_banner = None;
            }
        }
    }
}

fn build_session(config: &Config, bank: &WordBank) -> Result<Session, GenerateError> {
    let words = bank
        .get(&config.word_list)
        .map(|list| list.words.clone())
        .unwrap_or_default();
    let mut rng = rand::thread_rng();
    Session::new(config, &words, &mut rng)
}

/// What the event loop needs besides the app itself: the read connection
/// and the write queue for the same database, and where mined lists land.
struct LoopCtx<'a> {
    read_db: &'a SessionDb,
    persist: &'a PersistHandle,
    words_dir: Option<&'a Path>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);

    let words_dir: Option<PathBuf> = AppDirs::word_lists_dir();
    let bank = match &words_dir {
        Some(dir) => WordBank::load(dir)?,
        None => WordBank::embedded()?,
    };

    if cli.lists {
        for name in bank.names() {
            println!("{name}");
        }
        return Ok(());
    }

    if !bank.contains(&config.word_list) {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::InvalidValue,
            format!(
                "unknown word list '{}' (try --lists)",
                config.word_list
            ),
        )
        .exit();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let db_path = AppDirs::db_path().ok_or("could not resolve a database path")?;
    let read_db = SessionDb::open(&db_path)?;
    let mut persist = PersistHandle::spawn(SessionDb::open(&db_path)?);

    let mut app = App::new(config, bank)?;
    app.stats = read_db.aggregate_stats()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let ctx = LoopCtx {
        read_db: &read_db,
        persist: &persist,
        words_dir: words_dir.as_deref(),
    };
    let result = run_app(&mut terminal, &mut app, &ctx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // drains anything still queued before exiting
    persist.shutdown();

    result
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    ctx: &LoopCtx,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(crossterm_events());

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            RaceEvent::Tick => {
                if let Some(err) = ctx.persist.poll_error() {
                    app.show_error(err.to_string());
                }
                app.expire_banner();

                if matches!(app.screen, Screen::Typing)
                    && app.session.has_started()
                    && !app.session.has_finished()
                    && app.session.on_tick() == Progress::Completed
                {
                    complete_session(app, ctx);
                }
            }
            RaceEvent::Resize => {}
            RaceEvent::Key(key) => {
                if handle_key(app, key, ctx) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Dispatches one key event against the current screen. Returns true when
/// the app should quit.
fn handle_key(app: &mut App, key: KeyEvent, ctx: &LoopCtx) -> bool {
    if key.code == KeyCode::Esc {
        return true;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }
    if key.code == KeyCode::Tab {
        restart(app);
        return false;
    }

    match &app.screen {
        Screen::Typing => match key.code {
            KeyCode::Backspace => {
                if !app.session.has_finished() {
                    app.session.handle_keystroke(Keystroke::Backspace);
                }
            }
            KeyCode::Char(c) => {
                if c.is_ascii() && is_valid_byte(c as u8) && !app.session.has_finished() {
                    if !app.session.has_started() {
                        start_session(app, ctx);
                    }
                    if app.session.handle_keystroke(Keystroke::Byte(c as u8))
                        == Progress::Completed
                    {
                        complete_session(app, ctx);
                    }
                }
            }
            _ => {}
        },
        Screen::Results { record } => match key.code {
            KeyCode::Char('r') => restart(app),
            KeyCode::Char('h') => {
                let resume = Box::new(record.clone());
                match ctx.read_db.recent_sessions(HISTORY_DEPTH) {
                    Ok(rows) => app.screen = Screen::History { rows, resume },
                    Err(err) => app.show_error(err.to_string()),
                }
            }
            _ => {}
        },
        Screen::History { resume, .. } => match key.code {
            KeyCode::Char('r') => restart(app),
            KeyCode::Char('b') | KeyCode::Backspace => {
                let record = (**resume).clone();
                app.screen = Screen::Results { record };
            }
            _ => {}
        },
    }

    false
}

fn restart(app: &mut App) {
    if let Err(err) = app.new_session() {
        app.show_error(err.to_string());
    }
}

/// First keystroke of a session: mark it started and bump the attempt
/// counters durably.
fn start_session(app: &mut App, ctx: &LoopCtx) {
    app.session.start();
    app.stats.total += 1;
    app.stats.total_attempted += 1;
    ctx.persist
        .enqueue(PersistRequest::UpdateStats(app.stats));
}

/// Completion: snapshot the record, commit stats and session atomically,
/// and every few sessions rebuild the mined practice list.
fn complete_session(app: &mut App, ctx: &LoopCtx) {
    let record = app.session.finalize();

    app.stats.total_completed += 1;
    app.stats.last_test_id += 1;
    ctx.persist.enqueue(PersistRequest::StatsAndSession(
        app.stats,
        record.clone(),
    ));

    app.completed_since_mine += 1;
    if app.completed_since_mine % SESSIONS_PER_MINE == 0 {
        mine_practice_list(app, ctx);
    }

    app.screen = Screen::Results { record };
}

/// Rebuilds the `frequent` list from recent history, saves it next to the
/// user word lists, and makes it selectable right away.
fn mine_practice_list(app: &mut App, ctx: &LoopCtx) {
    let history = match ctx.read_db.recent_sessions(HISTORY_DEPTH) {
        Ok(rows) => rows,
        Err(err) => {
            app.show_error(err.to_string());
            return;
        }
    };

    let list = mine_mistakes(&history);
    if list.words.is_empty() {
        return;
    }

    if let Some(dir) = ctx.words_dir {
        if let Err(err) = list.save_to(dir) {
            app.show_error(err.to_string());
        }
    }
    app.bank.merge(list);
}
