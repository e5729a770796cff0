use crate::catalog::Catalog;
use crate::config;
use crate::controller::PlaybackController;
use crate::media::{MediaElement, NullMediaElement, RodioMediaElement};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::time::{Duration, Instant};

const CLOCK_TICK: Duration = Duration::from_secs(1);

pub fn run() -> Result<()> {
    let mut settings = config::load_settings()?;
    let catalog = Catalog::from_folders(&settings.folders);

    let media: Box<dyn MediaElement> = match RodioMediaElement::new() {
        Ok(engine) => Box::new(engine),
        Err(_) => Box::new(NullMediaElement::new()),
    };
    let mut controller = PlaybackController::new(catalog, media, settings.saved_volume);

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut last_clock = Instant::now();

    let result: Result<()> = loop {
        controller.pump_media();
        controller.tick();

        // Fixed 1 s cadence keeps the wall clock fresh; drift under event
        // contention is accepted.
        if controller.take_dirty() || last_clock.elapsed() >= CLOCK_TICK {
            terminal.draw(|frame| crate::ui::draw(frame, &controller))?;
            last_clock = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };

        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break Ok(()),
            KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
            KeyCode::Up => controller.volume_up(),
            KeyCode::Down => controller.volume_down(),
            KeyCode::Left => controller.skip_prev(),
            KeyCode::Right => controller.skip_next(),
            KeyCode::Enter | KeyCode::Char(' ') => controller.toggle_master(),
            _ => {}
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    settings.saved_volume = controller.volume();
    let save_result = config::save_settings(&settings);
    result?;
    save_result?;
    Ok(())
}
