//! Interactive player: grid with playback on the left, statement and results
//! on the right, key-driven Run / Test / New Problem.

use std::fs;
use std::io::stdout;
use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use pathgrid_engine::animator::Phase;
use pathgrid_engine::evaluator::LuaEvaluator;
use pathgrid_engine::problem::ProblemSource;
use pathgrid_engine::render::{self, CellShade};
use pathgrid_engine::session::Session;
use pathgrid_generator::GenerationError;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};

use crate::util;

/// Longest wait between redraws when nothing is animating.
const IDLE_POLL: Duration = Duration::from_millis(250);

pub type BoxedSource = Box<dyn ProblemSource<Error = GenerationError>>;

pub struct PlayOptions {
    pub solution_path: PathBuf,
    /// Configured editor command; falls back to $VISUAL, $EDITOR, vi
    pub editor: Option<String>,
}

/// Work that needs a frame drawn first, or the terminal released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    NewProblem,
    Edit,
}

struct TuiApp {
    session: Session<LuaEvaluator>,
    source: BoxedSource,
    options: PlayOptions,
    pending: Option<Pending>,
    /// Player-side notice (file writes, editor failures), shown when the
    /// session has no status of its own
    notice: Option<String>,
    should_quit: bool,
    show_help: bool,
}

impl TuiApp {
    fn new(session: Session<LuaEvaluator>, source: BoxedSource, options: PlayOptions) -> Self {
        Self {
            session,
            source,
            options,
            // first frame shows "Loading..." while the first problem arrives
            pending: Some(Pending::NewProblem),
            notice: Some("Loading...".to_string()),
            should_quit: false,
            show_help: false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.show_help {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return;
        }
        // ignore input while a fetch is queued
        if self.pending.is_some() {
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('r') => self.run(Instant::now()),
            KeyCode::Char('t') => self.test(Instant::now()),
            KeyCode::Char('n') => {
                self.notice = Some("Loading...".to_string());
                self.pending = Some(Pending::NewProblem);
            }
            KeyCode::Char('e') => self.pending = Some(Pending::Edit),
            KeyCode::Char('b') => self.reset_to_boilerplate(),
            KeyCode::Char('s') => self.session.skip_animation(),
            _ => {}
        }
    }

    /// Pull the solution file into the session. False if it cannot be read.
    fn reload_solution(&mut self) -> bool {
        match fs::read_to_string(&self.options.solution_path) {
            Ok(text) => {
                self.session.set_source(text);
                true
            }
            Err(e) => {
                self.notice = Some(format!(
                    "Cannot read {}: {}",
                    self.options.solution_path.display(),
                    e
                ));
                false
            }
        }
    }

    fn run(&mut self, now: Instant) {
        if self.reload_solution() {
            self.notice = None;
            self.session.run(now);
        }
    }

    fn test(&mut self, now: Instant) {
        if self.reload_solution() {
            self.notice = None;
            self.session.test(now);
        }
    }

    fn new_problem(&mut self) {
        self.notice = None;
        if !self.session.new_problem(self.source.as_ref()) {
            return;
        }
        // existing work is never overwritten here; `b` does that on request
        if self.options.solution_path.exists() {
            self.notice = Some(format!(
                "Keeping {} (press b to reset to boilerplate)",
                self.options.solution_path.display()
            ));
        } else {
            self.write_boilerplate();
        }
    }

    fn reset_to_boilerplate(&mut self) {
        if self.session.problem().is_none() {
            self.notice = Some("No problem loaded".to_string());
            return;
        }
        self.session.reset_source();
        self.write_boilerplate();
    }

    fn write_boilerplate(&mut self) {
        let path = &self.options.solution_path;
        self.notice = Some(match fs::write(path, self.session.source()) {
            Ok(()) => format!("Wrote boilerplate to {}", path.display()),
            Err(e) => format!("Cannot write {}: {}", path.display(), e),
        });
    }

    fn status_text(&self) -> String {
        if let Some(status) = self.session.status() {
            return status.to_string();
        }
        if let Some(notice) = &self.notice {
            return notice.clone();
        }
        match self.session.animator().phase() {
            Phase::Idle => String::new(),
            Phase::RevealingVisited => "Exploring...".to_string(),
            Phase::RevealingPath => "Tracing path...".to_string(),
        }
    }

    // ------------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------------

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

        self.draw_title(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_status(frame, chunks[2]);

        if self.show_help {
            self.draw_help(frame, area);
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let size = match self.session.problem() {
            Some(p) => format!("{}x{} | {} test cases", p.grid.rows(), p.grid.cols(), p.test_cases.len()),
            None => "no problem".to_string(),
        };
        let title = format!(" pathgrid: {} | {} ", self.source.describe(), size);
        let para = Paragraph::new(Line::from(vec![Span::styled(
            util::truncate_display(&title, area.width as usize),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]))
        .style(Style::default().bg(Color::Cyan));
        frame.render_widget(para, area);
    }

    fn draw_body(&self, frame: &mut Frame, area: Rect) {
        let grid_width = self
            .session
            .problem()
            .map(|p| grid_panel_width(p.grid.cols(), area.width))
            .unwrap_or(0);
        let chunks = Layout::horizontal([Constraint::Length(grid_width), Constraint::Min(10)]).split(area);

        self.draw_grid(frame, chunks[0]);
        self.draw_panel(frame, chunks[1]);
    }

    fn draw_grid(&self, frame: &mut Frame, area: Rect) {
        let Some(problem) = self.session.problem() else {
            return;
        };
        let state = self.session.animator().state();
        let shades = render::shade_grid(&problem.grid, problem.start, problem.end, &state.visited, &state.path);

        let lines: Vec<Line> = shades
            .into_iter()
            .map(|row| {
                Line::from(
                    row.into_iter()
                        .map(|shade| Span::styled(format!("{} ", shade.glyph()), shade_style(shade)))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        let block = Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_panel(&self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(2) as usize;
        let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let mut lines: Vec<Line> = Vec::new();

        if let Some(problem) = self.session.problem() {
            lines.push(Line::from(Span::styled("Problem", heading)));
            for text in util::wrap_display(&problem.statement, width) {
                lines.push(Line::from(text));
            }
            lines.push(Line::from(""));
        }

        if !self.session.messages().is_empty() {
            lines.push(Line::from(Span::styled("Results", heading)));
            for message in self.session.messages() {
                let style = if message.contains('✅') {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::LightRed)
                };
                for text in util::wrap_display(message, width) {
                    lines.push(Line::from(Span::styled(text, style)));
                }
            }
            lines.push(Line::from(""));
        }

        if !self.session.output().is_empty() {
            lines.push(Line::from(Span::styled("Output", heading)));
            for text in self.session.output() {
                lines.push(Line::from(Span::styled(
                    util::truncate_display(text, width),
                    Style::default().fg(Color::Gray),
                )));
            }
        }

        let title = format!(" {} ", self.options.solution_path.display());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(util::truncate_display(&title, width));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let left = format!(" {}", self.status_text());
        let right = "r run  t test  n new  e edit  ?: help ";
        let status = util::spread(&left, right, area.width as usize);

        let para = Paragraph::new(Line::from(vec![Span::styled(
            status,
            Style::default().fg(Color::Black).bg(Color::DarkGray),
        )]))
        .style(Style::default().bg(Color::DarkGray));
        frame.render_widget(para, area);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let help_lines = [
            "",
            "  Solve",
            "  -----",
            "  r                 Run on this puzzle",
            "  t                 Run all test cases",
            "  s                 Skip the animation",
            "",
            "  Code",
            "  ----",
            "  e                 Edit the solution file",
            "  b                 Reset to boilerplate",
            "",
            "  General",
            "  -------",
            "  n                 New problem",
            "  q / Esc           Quit",
            "  ?                 Toggle this help",
            "",
        ];
        let help_width: u16 = 44;
        let help_height: u16 = help_lines.len() as u16 + 2;

        let x = area.width.saturating_sub(help_width) / 2;
        let y = area.height.saturating_sub(help_height) / 2;
        let popup = Rect::new(
            area.x + x,
            area.y + y,
            help_width.min(area.width),
            help_height.min(area.height),
        );

        let lines: Vec<Line> = help_lines
            .iter()
            .map(|s| Line::from(Span::styled(*s, Style::default().fg(Color::White))))
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Keybindings ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black));

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

/// Two columns per cell plus borders, capped at half the screen.
fn grid_panel_width(cols: usize, available: u16) -> u16 {
    let wanted = cols.saturating_mul(2).saturating_add(2);
    let cap = available / 2;
    u16::try_from(wanted).map_or(cap, |w| w.min(cap))
}

fn shade_style(shade: CellShade) -> Style {
    let on = |bg: Color| Style::default().fg(Color::Black).bg(bg);
    match shade {
        CellShade::Start => on(Color::Green).add_modifier(Modifier::BOLD),
        CellShade::End => on(Color::Red).add_modifier(Modifier::BOLD),
        CellShade::Path => on(Color::Yellow),
        CellShade::Visited => on(Color::LightBlue),
        CellShade::Wall => Style::default().fg(Color::DarkGray).bg(Color::DarkGray),
        CellShade::Special => on(Color::Magenta),
        CellShade::Weighted => on(Color::LightRed),
        CellShade::Open => Style::default().fg(Color::White),
    }
}

/// Editor command line: configured command, then $VISUAL, then $EDITOR, then vi.
fn editor_command(configured: Option<&str>, visual: Option<String>, editor: Option<String>) -> Vec<String> {
    let chosen = configured
        .map(str::to_string)
        .into_iter()
        .chain(visual)
        .chain(editor)
        .find(|c| !c.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string());
    chosen.split_whitespace().map(str::to_string).collect()
}

fn launch_editor(options: &PlayOptions) -> Result<(), String> {
    let argv = editor_command(
        options.editor.as_deref(),
        std::env::var("VISUAL").ok(),
        std::env::var("EDITOR").ok(),
    );
    let Some((program, args)) = argv.split_first() else {
        return Err("no editor configured".to_string());
    };
    log::debug!("launching editor {:?} on {}", argv, options.solution_path.display());
    let status = Command::new(program)
        .args(args)
        .arg(&options.solution_path)
        .status()
        .map_err(|e| format!("failed to launch {}: {}", program, e))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("{} exited with {}", program, status))
    }
}

fn enter_terminal() -> Result<(), String> {
    terminal::enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {}", e))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {}", e))?;
    Ok(())
}

fn leave_terminal() {
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
}

/// Run the interactive player until the user quits.
pub fn run(session: Session<LuaEvaluator>, source: BoxedSource, options: PlayOptions) -> Result<(), String> {
    let app = TuiApp::new(session, source, options);
    run_app(app)
}

fn run_app(mut app: TuiApp) -> Result<(), String> {
    enter_terminal()?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            leave_terminal();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create terminal: {}", e))?;

    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| format!("draw error: {}", e))?;

        match app.pending.take() {
            Some(Pending::NewProblem) => {
                app.new_problem();
                continue;
            }
            Some(Pending::Edit) => {
                leave_terminal();
                let result = launch_editor(&app.options);
                enter_terminal()?;
                terminal.clear().map_err(|e| format!("draw error: {}", e))?;
                app.notice = Some(match result {
                    Ok(()) => "Saved; press r to run or t to test".to_string(),
                    Err(e) => e,
                });
                continue;
            }
            None => {}
        }

        let timeout = app
            .session
            .animator()
            .next_deadline()
            .map(|due| due.saturating_duration_since(Instant::now()).min(IDLE_POLL))
            .unwrap_or(IDLE_POLL);

        if event::poll(timeout).map_err(|e| format!("event poll error: {}", e))? {
            if let Event::Key(key) = event::read().map_err(|e| format!("event read error: {}", e))? {
                app.handle_key(key);
            }
        }
        app.session.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathgrid_engine::animator::AnimationTiming;
    use pathgrid_generator::FileProblemSource;

    const PROBLEM: &str = r#"{
        "grid": [[0, 0], [1, 0]],
        "start": [0, 0],
        "end": [1, 1],
        "statement": "Go around the wall.",
        "boilerplate": "function findPath(grid, sr, sc, er, ec, visit)\n  return nil\nend\n",
        "testCases": [
            {"input": {"grid": [[0, 0], [1, 0]], "startRow": 0, "startCol": 0, "endRow": 1, "endCol": 1},
             "output": [[0, 0], [0, 1], [1, 1]]}
        ]
    }"#;

    const SOLVED: &str = "function findPath(grid, sr, sc, er, ec, visit)\n  visit(0, 0)\n  visit(0, 1)\n  return {{0, 0}, {0, 1}, {1, 1}}\nend\n";

    fn app(dir: &tempfile::TempDir) -> TuiApp {
        let problem = dir.path().join("problem.json");
        fs::write(&problem, PROBLEM).unwrap();
        let session = Session::new(LuaEvaluator::new(), AnimationTiming::default());
        let options = PlayOptions { solution_path: dir.path().join("solution.lua"), editor: None };
        TuiApp::new(session, Box::new(FileProblemSource::new(problem)), options)
    }

    fn press(app: &mut TuiApp, ch: char) {
        app.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
    }

    #[test]
    fn first_problem_writes_missing_solution_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        assert_eq!(app.status_text(), "Loading...");
        assert_eq!(app.pending.take(), Some(Pending::NewProblem));

        app.new_problem();

        let written = fs::read_to_string(dir.path().join("solution.lua")).unwrap();
        assert!(written.contains("return nil"));
        assert!(app.status_text().starts_with("Wrote boilerplate"));
    }

    #[test]
    fn existing_solution_is_kept_until_reset() {
        let dir = tempfile::tempdir().unwrap();
        let solution = dir.path().join("solution.lua");
        fs::write(&solution, SOLVED).unwrap();
        let mut app = app(&dir);
        app.pending = None;

        app.new_problem();
        assert_eq!(fs::read_to_string(&solution).unwrap(), SOLVED);
        assert!(app.status_text().contains("press b"));

        press(&mut app, 'b');
        assert!(fs::read_to_string(&solution).unwrap().contains("return nil"));
    }

    #[test]
    fn test_key_rereads_solution_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.pending = None;
        app.new_problem();

        press(&mut app, 't');
        assert_eq!(app.session.messages(), ["Test Case 1: ❌ Fail"]);

        fs::write(dir.path().join("solution.lua"), SOLVED).unwrap();
        press(&mut app, 't');
        assert_eq!(app.session.messages(), ["Test Case 1: ✅ Pass"]);
        assert_eq!(app.status_text(), "1/1 passed");
    }

    #[test]
    fn run_then_skip_reveals_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("solution.lua"), SOLVED).unwrap();
        let mut app = app(&dir);
        app.pending = None;
        app.new_problem();

        press(&mut app, 'r');
        assert_eq!(app.status_text(), "Exploring...");
        press(&mut app, 's');
        assert_eq!(app.session.animator().state().path.len(), 3);
        assert_eq!(app.status_text(), "");
    }

    #[test]
    fn missing_solution_file_blocks_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.pending = None;

        press(&mut app, 'r');
        assert!(app.status_text().starts_with("Cannot read"));
        assert!(app.session.messages().is_empty());
    }

    #[test]
    fn help_swallows_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.pending = None;

        press(&mut app, '?');
        press(&mut app, 'q');
        assert!(!app.show_help);
        assert!(!app.should_quit);
        press(&mut app, 'q');
        assert!(app.should_quit);
    }

    #[test]
    fn grid_panel_width_is_clamped() {
        assert_eq!(grid_panel_width(3, 80), 8);
        assert_eq!(grid_panel_width(3, 10), 5);
        assert_eq!(grid_panel_width(32_767, 200), 100);
        assert_eq!(grid_panel_width(usize::MAX, u16::MAX), u16::MAX / 2);
    }

    #[test]
    fn editor_fallback_order() {
        assert_eq!(editor_command(Some("code --wait"), Some("nano".into()), None), ["code", "--wait"]);
        assert_eq!(editor_command(None, Some("nano".into()), Some("emacs".into())), ["nano"]);
        assert_eq!(editor_command(None, Some(" ".into()), Some("emacs".into())), ["emacs"]);
        assert_eq!(editor_command(None, None, None), ["vi"]);
    }
}
