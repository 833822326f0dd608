use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::EnableMouseCapture,
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use net_text::app::{self, App, guard::{self, TerminalGuard}};
use net_text::session::DeviceConnector;
use net_text::settings::Settings;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    let settings = Settings::from_env().context("invalid NET_TEXT_* setting")?;

    // Log to a file so output never lands on the TUI.
    let log_file = std::fs::File::create(&settings.log_file)
        .with_context(|| format!("failed to create log file at {:?}", settings.log_file))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .format_timestamp_secs()
        .init();

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        log::error!("PANIC: {:?}", panic_info);

        // Worker panics surface in the editor; the screen stays up.
        if std::thread::current().name() == Some("main") {
            guard::restore_terminal();
            default_hook(panic_info);
        }
    }));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("net-text-worker")
        .build()
        .context("failed to start async runtime")?;

    let connector: Arc<dyn DeviceConnector> = Arc::new(settings.connector());
    let mut app = App::new(connector, settings.credentials.clone(), runtime.handle().clone());

    enable_raw_mode()?;
    let terminal_guard = TerminalGuard::new();
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    log::info!(
        "net-text v{} started (port {}, security {:?}, timeout {:?})",
        VERSION,
        settings.port,
        settings.security,
        settings.command_timeout
    );

    let result = app::run(&mut app, &mut terminal);
    drop(terminal_guard);

    // Workers still connecting are abandoned.
    runtime.shutdown_timeout(Duration::from_secs(1));
    log::info!("net-text exiting");

    result.context("terminal I/O failed")
}
