use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};

use typewise::{
    app::{App, ExitType},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    language::SupportedLanguage,
    logging,
    runtime::{AppEvent, CrosstermEventSource, EventSource, Runner},
    state::{ErrorMode, NewlineMode},
    store::{BlobStore, SessionLog, SqliteBlobStore, StatsRepository},
};

const TICK_RATE_MS: u64 = 100;

/// typing trainer with error-mode aware judging and spaced-repetition practice of weak keys
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing trainer TUI. Choose how mistakes are handled, get per-key and per-word analytics after every session, and let weak keys come back more often until they stick."
)]
pub struct Cli {
    /// number of words to use in test
    #[clap(short = 'w', long)]
    number_of_words: Option<usize>,

    /// custom prompt to use
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// language to pull words from
    #[clap(short = 'l', long, value_enum)]
    language: Option<SupportedLanguage>,

    /// how mistakes are handled while typing
    #[clap(short = 'e', long, value_enum)]
    error_mode: Option<ErrorMode>,

    /// how line breaks in the prompt are typed
    #[clap(long, value_enum)]
    newline_mode: Option<NewlineMode>,

    /// draw words uniformly instead of favouring weak keys
    #[clap(long)]
    no_adaptive: bool,

    /// how strongly weak keys bias word selection (0.0 - 1.0)
    #[clap(long)]
    weak_key_intensity: Option<f64>,

    /// pauses longer than this many milliseconds count only up to the cap
    #[clap(long)]
    idle_timeout_ms: Option<i64>,

    /// write the resulting settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Settings from the config file with command line flags on top
    fn apply(&self, mut config: Config) -> Config {
        if let Some(n) = self.number_of_words {
            config.number_of_words = n.max(1);
        }
        if let Some(language) = self.language {
            config.language = language;
        }
        if let Some(mode) = self.error_mode {
            config.error_mode = mode;
        }
        if let Some(mode) = self.newline_mode {
            config.newline_mode = mode;
        }
        if self.no_adaptive {
            config.adaptive = false;
        }
        if let Some(intensity) = self.weak_key_intensity {
            config.weak_key_intensity = intensity.clamp(0.0, 1.0);
        }
        if let Some(ms) = self.idle_timeout_ms {
            config.idle_timeout_ms = ms.max(0);
        }
        config
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(dir) = AppDirs::log_dir() {
        logging::init(&dir);
    }

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
    }
    let language = config.language.load()?;

    let mut repository = StatsRepository::new(SqliteBlobStore::open_default()?);
    let stats = repository.load_stats().unwrap_or_else(|err| {
        tracing::warn!(%err, "starting from empty stats");
        Default::default()
    });
    let session_log = SessionLog::open_default();

    let mut rng = rand::thread_rng();
    let mut app = App::new(config, language, stats, cli.prompt.clone(), &mut rng);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );
    let outcome = start_tui(
        &mut terminal,
        &mut app,
        &runner,
        &mut repository,
        session_log.as_ref(),
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    logging::shutdown();

    outcome
}

fn start_tui<B: Backend, E: EventSource, S: BlobStore>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E>,
    repository: &mut StatsRepository<S>,
    session_log: Option<&SessionLog>,
) -> Result<(), Box<dyn Error>> {
    let mut rng = rand::thread_rng();

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let exit = match runner.step() {
            AppEvent::Tick => {
                app.on_tick(now_ms());
                None
            }
            AppEvent::Resize => None,
            AppEvent::Key(key) => app.on_key(key, now_ms()),
        };

        if let Some(result) = app.take_completed() {
            match repository.record(&result) {
                Ok(stats) => app.stats = stats,
                Err(err) => tracing::error!(%err, "failed to save stats"),
            }
            if let Some(log) = session_log {
                if let Err(err) = log.append(&result) {
                    tracing::error!(%err, path = %log.path().display(), "failed to append session log");
                }
            }
        }

        match exit {
            Some(ExitType::Quit) => break,
            Some(exit) => app.reset(exit, &mut rng),
            None => {}
        }
    }

    Ok(())
}
