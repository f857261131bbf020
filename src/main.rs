// component-playground: live TSX component preview in the terminal

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

use component_playground::ui::App;
use component_playground::{
    render_html, render_with_options, EditorConfig, Playground, RenderOptions, SourceBuffer,
    DEFAULT_COMPONENT_SOURCE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "component-playground")]
#[command(about = "Edit a TSX component and watch it render")]
#[command(version)]
struct Cli {
    /// Render once and print the preview HTML instead of starting the editor
    #[arg(long)]
    print: bool,

    /// With --print, render the built-in sample instead of reading stdin
    #[arg(long, requires = "print")]
    sample: bool,

    /// Component file to open (defaults to the built-in sample)
    file: Option<PathBuf>,

    /// Write tracing output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level for --log-file
    #[arg(long, value_enum, default_value = "debug")]
    log_level: LogLevel,

    /// Evaluation step budget per render cycle
    #[arg(long)]
    max_steps: Option<u64>,

    /// Maximum nested call depth
    #[arg(long)]
    max_call_depth: Option<usize>,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        let file = File::create(path)?;
        tracing_subscriber::fmt()
            .with_max_level(LevelFilter::from(cli.log_level))
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }

    let mut options = RenderOptions::default();
    if let Some(steps) = cli.max_steps {
        options.max_steps = steps;
    }
    if let Some(depth) = cli.max_call_depth {
        options.max_call_depth = depth;
    }

    if cli.print {
        let source = if cli.sample {
            DEFAULT_COMPONENT_SOURCE.to_string()
        } else if let Some(path) = &cli.file {
            std::fs::read_to_string(path)?
        } else {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        };
        let result = render_with_options(&source, options);
        println!("{}", render_html(&result));
        if !result.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let buffer = match &cli.file {
        Some(path) => SourceBuffer::new(std::fs::read_to_string(path)?),
        None => SourceBuffer::default(),
    };

    run_tui(buffer, options)
}

fn run_tui(buffer: SourceBuffer, options: RenderOptions) -> io::Result<()> {
    let playground = Playground::with_source(buffer, options, EditorConfig::default());
    info!(ok = playground.result().is_success(), "initial render");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(playground);
    let res = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}
