//! Terminal state guard for RAII cleanup.

use crossterm::{
    event::DisableMouseCapture,
    execute,
    terminal::{LeaveAlternateScreen, disable_raw_mode},
};

/// Restores the terminal when dropped, including during unwinding.
///
/// ```ignore
/// let mut terminal = ratatui::init();
/// let _guard = TerminalGuard::new();
/// app::run(&mut app, &mut terminal)?;
/// ```
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Leaves raw mode and the alternate screen, ignoring errors.
///
/// Also called from the panic hook, before the panic message is printed.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(std::io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
    let _ = execute!(std::io::stdout(), crossterm::cursor::Show);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_guard_creation() {
        let _guard = TerminalGuard::new();
        let _guard2 = TerminalGuard::default();
    }
}
