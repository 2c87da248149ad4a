use std::error::Error;
use std::io::{self, stdin, Write};

use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use time_humanize::HumanTime;
use tracing::warn;

use typometer::{
    config::{ConfigError, Difficulty, FileSettingsStore, Mode, Settings, SettingsStore},
    logging,
    metrics::CharClass,
    results::{HistoryLog, MultiSink, ResultSink},
    runtime::{FixedTicker, Runner, SessionEvent, TerminalEventSource},
    session::{Phase, Session},
    store::ResultStore,
};

/// terminal typing practice with difficulty tiers and local history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing trainer. Words come from cumulative difficulty tiers, \
                  tests run against a countdown or a word quota, and every finished test \
                  lands in a local history you can list with --history."
)]
pub struct Cli {
    /// seconds on the countdown (switches to a timed test)
    #[clap(short = 's', long, value_parser = clap::value_parser!(u64).range(10..=600))]
    seconds: Option<u64>,

    /// words to type before the test ends (switches to a word-quota test)
    #[clap(
        short = 'w',
        long,
        conflicts_with = "seconds",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(10..=500)
    )]
    words: Option<usize>,

    /// word pool to draw from; harder pools still contain the easier words
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// mix punctuation marks into the text
    #[clap(long)]
    punctuation: bool,

    /// mix 1-3 digit numbers into the text
    #[clap(long)]
    numbers: bool,

    /// print the most recent results instead of running a test
    #[clap(long, value_name = "COUNT", num_args = 0..=1, default_missing_value = "10")]
    history: Option<usize>,

    /// do not record this test
    #[clap(long)]
    no_save: bool,
}

impl Cli {
    /// Fold the flags over the saved settings. Flags apply to this run
    /// only; durable changes go in the settings file.
    fn apply(&self, saved: &Settings) -> Settings {
        let mut settings = saved.clone();
        if let Some(secs) = self.seconds {
            settings.mode = Mode::Time;
            settings.number_of_secs = secs;
        }
        if let Some(words) = self.words {
            settings.mode = Mode::Words;
            settings.number_of_words = words;
        }
        if let Some(difficulty) = self.difficulty {
            settings.difficulty = difficulty;
        }
        if self.punctuation {
            settings.punctuation = true;
        }
        if self.numbers {
            settings.numbers = true;
        }
        settings
    }
}

pub struct App {
    settings: Settings,
    no_save: bool,
    session: Session,
}

impl App {
    pub fn new(settings: Settings, no_save: bool) -> Result<Self, ConfigError> {
        let session = build_session(&settings, no_save, None)?;
        Ok(Self {
            settings,
            no_save,
            session,
        })
    }

    /// Start over. `keep_text` reuses the current text; otherwise a fresh
    /// one is generated.
    pub fn reset(&mut self, keep_text: bool) -> Result<(), ConfigError> {
        let reference = keep_text.then(|| self.session.reference().to_string());
        self.session = build_session(&self.settings, self.no_save, reference)?;
        Ok(())
    }
}

fn build_session(
    settings: &Settings,
    no_save: bool,
    reference: Option<String>,
) -> Result<Session, ConfigError> {
    let config = settings.to_test_config();
    let session = match reference {
        Some(text) => Session::with_reference(config, text)?,
        None => Session::new(config)?,
    };
    Ok(match build_sink(no_save) {
        Some(sink) => session.with_sink(sink),
        None => session,
    })
}

fn build_sink(no_save: bool) -> Option<Box<dyn ResultSink>> {
    if no_save {
        return None;
    }
    let mut sink = MultiSink::new();
    sink.push(Box::new(HistoryLog::new()));
    match ResultStore::open_default() {
        Ok(store) => sink.push(Box::new(store)),
        Err(err) => warn!(error = %err, "results database unavailable"),
    }
    Some(Box::new(sink))
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();
    let cli = Cli::parse();

    if let Some(limit) = cli.history {
        return print_history(limit);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let settings_store = FileSettingsStore::new();
    let saved = settings_store.load();
    // A first run writes the defaults out so there is a file to edit.
    if let Err(err) = settings_store.save(&saved) {
        warn!(error = %err, "could not write settings file");
    }

    let mut app = match App::new(cli.apply(&saved), cli.no_save) {
        Ok(app) => app,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, err).exit();
        }
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let run = run_app(&mut stdout, &mut app);

    disable_raw_mode()?;
    execute!(io::stdout(), Show, LeaveAlternateScreen)?;

    run
}

#[derive(Debug, PartialEq)]
enum ExitType {
    Restart,
    New,
    Quit,
}

fn run_app(stdout: &mut io::Stdout, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(TerminalEventSource::new(), FixedTicker::default());

    loop {
        draw(stdout, app)?;

        let exit_type = loop {
            match runner.step() {
                SessionEvent::Tick => app.session.tick(),
                SessionEvent::Key(key) => {
                    if let Some(exit) = handle_key(&mut app.session, key) {
                        break exit;
                    }
                }
            }
            draw(stdout, app)?;
        };

        match exit_type {
            ExitType::Restart => app.reset(true)?,
            ExitType::New => app.reset(false)?,
            ExitType::Quit => return Ok(()),
        }
    }
}

/// Apply one keypress to the session; `Some` leaves the run loop.
fn handle_key(session: &mut Session, key: KeyEvent) -> Option<ExitType> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(ExitType::Quit);
    }

    if session.phase() == Phase::Completed {
        return match key.code {
            KeyCode::Esc => Some(ExitType::Quit),
            KeyCode::Char('r') => Some(ExitType::Restart),
            KeyCode::Char('n') => Some(ExitType::New),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => Some(ExitType::Quit),
        KeyCode::Left => Some(ExitType::Restart),
        KeyCode::Right => Some(ExitType::New),
        KeyCode::Tab => {
            session.toggle_pause();
            None
        }
        KeyCode::Backspace => {
            let mut next = session.typed().to_string();
            next.pop();
            session.update_input(&next);
            None
        }
        KeyCode::Char(c) => {
            let mut next = session.typed().to_string();
            next.push(c);
            session.update_input(&next);
            None
        }
        _ => None,
    }
}

fn draw(stdout: &mut io::Stdout, app: &App) -> io::Result<()> {
    match app.session.phase() {
        Phase::Completed => draw_results(stdout, app),
        _ => draw_test(stdout, app),
    }
}

fn draw_test(stdout: &mut io::Stdout, app: &App) -> io::Result<()> {
    let session = &app.session;
    let (width, _) = terminal::size().unwrap_or((80, 24));
    let width = width.max(20) as usize;

    let progress = match session.config().mode {
        Mode::Time => {
            let left = session.seconds_remaining().unwrap_or(0.0).ceil() as u64;
            format!("{left}s left")
        }
        Mode::Words => {
            let limit = session.config().word_limit.unwrap_or(0);
            format!("{}/{} words", session.words_typed().min(limit), limit)
        }
    };
    let status = match session.phase() {
        Phase::Paused => "paused".to_string(),
        _ => {
            let stats = session.live_stats();
            format!("{} wpm  {}% acc", stats.wpm, stats.accuracy)
        }
    };

    queue!(
        stdout,
        Clear(ClearType::All),
        MoveTo(0, 0),
        SetForegroundColor(Color::DarkGrey),
        Print(format!(
            "typometer  {}  {}  {}",
            session.config().difficulty,
            progress,
            status
        )),
        ResetColor
    )?;

    // Greedy wrap on word boundaries; every character is printed so the
    // indexes stay aligned with the render classes.
    let chars: Vec<char> = session.reference().chars().collect();
    let classes = session.char_classes();
    let mut row: u16 = 2;
    let mut col = 0usize;
    queue!(stdout, MoveTo(0, row))?;

    let mut index = 0;
    while index < chars.len() {
        let word_len = chars[index..].iter().take_while(|ch| **ch != ' ').count();
        if col > 0 && col + word_len > width {
            row += 1;
            col = 0;
            queue!(stdout, MoveTo(0, row))?;
        }

        // The word plus the space behind it.
        let end = (index + word_len + 1).min(chars.len());
        for i in index..end {
            print_char(stdout, chars[i], classes[i])?;
        }
        col += end - index;
        index = end;
    }

    queue!(
        stdout,
        MoveTo(0, row + 2),
        SetForegroundColor(Color::DarkGrey),
        Print(match session.phase() {
            Phase::Paused => "(tab)resume (esc)ape",
            _ => "(tab)pause (esc)ape",
        }),
        ResetColor
    )?;
    stdout.flush()
}

fn print_char(stdout: &mut io::Stdout, ch: char, class: CharClass) -> io::Result<()> {
    match class {
        CharClass::Correct => queue!(
            stdout,
            SetForegroundColor(Color::Green),
            Print(ch),
            ResetColor
        ),
        CharClass::Incorrect => queue!(
            stdout,
            SetForegroundColor(Color::Red),
            SetAttribute(Attribute::Underlined),
            Print(ch),
            SetAttribute(Attribute::NoUnderline),
            ResetColor
        ),
        CharClass::Cursor => queue!(
            stdout,
            SetAttribute(Attribute::Reverse),
            Print(ch),
            SetAttribute(Attribute::NoReverse)
        ),
        CharClass::Untyped => queue!(
            stdout,
            SetForegroundColor(Color::DarkGrey),
            Print(ch),
            ResetColor
        ),
    }
}

fn draw_results(stdout: &mut io::Stdout, app: &App) -> io::Result<()> {
    let Some(result) = app.session.result() else {
        return Ok(());
    };
    let stats = &result.stats;

    let secs = result.time_spent_secs.round() as u64;
    let goal = app.settings.goal_wpm;
    let (goal_note, goal_color) = if stats.wpm >= goal {
        ("reached", Color::Green)
    } else {
        ("missed", Color::DarkGrey)
    };

    queue!(
        stdout,
        Clear(ClearType::All),
        MoveTo(0, 0),
        SetForegroundColor(Color::DarkGrey),
        Print(format!(
            "{} {} test",
            result.config.difficulty, result.config.mode
        )),
        ResetColor,
        MoveTo(0, 2),
        Print("wpm       "),
        SetForegroundColor(wpm_color(stats.wpm)),
        Print(stats.wpm),
        ResetColor,
        MoveTo(0, 3),
        Print("accuracy  "),
        SetForegroundColor(accuracy_color(stats.accuracy)),
        Print(format!("{}%", stats.accuracy)),
        ResetColor,
        MoveTo(0, 4),
        Print(format!("time      {}:{:02}", secs / 60, secs % 60)),
        MoveTo(0, 5),
        Print(format!(
            "chars     {} typed, {} correct, {} wrong",
            stats.total_chars, stats.correct_chars, stats.incorrect_chars
        )),
        MoveTo(0, 6),
        Print(format!("goal      {goal} wpm ")),
        SetForegroundColor(goal_color),
        Print(goal_note),
        ResetColor,
        MoveTo(0, 8),
        SetForegroundColor(Color::DarkGrey),
        Print("(r)etry (n)ew (esc)ape"),
        ResetColor
    )?;
    stdout.flush()
}

fn wpm_color(wpm: u32) -> Color {
    match wpm {
        60.. => Color::Green,
        40..=59 => Color::Blue,
        25..=39 => Color::Yellow,
        _ => Color::Red,
    }
}

fn accuracy_color(accuracy: u32) -> Color {
    match accuracy {
        95.. => Color::Green,
        85..=94 => Color::Blue,
        75..=84 => Color::Yellow,
        _ => Color::Red,
    }
}

fn print_history(limit: usize) -> Result<(), Box<dyn Error>> {
    let store = ResultStore::open_default()?;
    let results = store.recent(limit)?;
    if results.is_empty() {
        println!("no results yet");
        return Ok(());
    }

    for result in results {
        // time-humanize reads negative seconds as past tense.
        let age_secs = Local::now()
            .signed_duration_since(result.completed_at)
            .num_seconds();
        let secs = result.time_spent_secs.round() as u64;
        println!(
            "{when:>20}  {difficulty:<6}  {wpm:>3} wpm  {accuracy:>3}%  {secs:>4}s  {mode}",
            when = HumanTime::from(-age_secs).to_string(),
            difficulty = result.config.difficulty.to_string(),
            wpm = result.stats.wpm,
            accuracy = result.stats.accuracy,
            mode = result.config.mode,
        );
    }
    Ok(())
}
