use crate::driver::AnimationDriver;
use crate::error::Result;
use crate::graphics::{draw_shaft, Canvas, BACKGROUND};
use crate::inputs::{MassField, MassInputs, MASS_COUNT_RANGE};
use crate::math::Verdict;
use crate::scheduler::Scheduler;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use std::io::Write;
use std::time::Instant;

/// Rows used by everything except the canvas: title, four input rows, the
/// results panel with its blank line, and the blank line plus status line
const RESERVED_ROWS: usize = 15;
/// Characters shown per input field
const FIELD_WIDTH: usize = 6;

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Puts the terminal in raw mode on the alternate screen and restores it
/// when dropped
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn new(out: &mut impl Write) -> Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = std::io::stdout();
        let _ = execute!(out, ResetColor, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Current terminal size as (columns, rows)
pub fn terminal_size() -> (u16, u16) {
    termsize::get()
        .map(|size| (size.cols, size.rows))
        .unwrap_or((80, 24))
}

/// Device raster size for a canvas shown in `cols` x `rows` terminal cells,
/// two pixels per cell vertically, keeping the logical aspect ratio
pub fn canvas_geometry(
    cols: u16,
    rows: u16,
    logical_width: f64,
    logical_height: f64,
) -> (usize, usize) {
    let canvas_rows = (rows as usize).saturating_sub(RESERVED_ROWS).max(2);
    let max_width = (cols as usize).max(1) as f64;
    let max_height = (canvas_rows * 2) as f64;
    let aspect = logical_width / logical_height;
    let width = max_width.min(max_height * aspect).floor().max(1.0);
    let height = (width / aspect).round().clamp(1.0, max_height);
    (width as usize, height as usize)
}

/// Interactive balancing widget
pub struct BalanceWidget {
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
    /// Show the debug overlay
    debug: bool,
    /// Focused input field, counted across all groups
    focus: usize,
    /// Terminal width; text lines are cut to it
    cols: u16,
    driver: AnimationDriver,
    inputs: MassInputs,
    canvas: Canvas,
}

impl BalanceWidget {
    pub fn new(driver: AnimationDriver, inputs: MassInputs, cols: u16, rows: u16) -> Self {
        let config = driver.config();
        let (width, height) = canvas_geometry(cols, rows, config.canvas_width, config.canvas_height);
        let mut canvas = Canvas::new(config.canvas_width, config.canvas_height, width, height);
        draw_shaft(&mut canvas, driver.layout());
        BalanceWidget {
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
            debug: false,
            focus: 0,
            cols,
            driver,
            inputs,
            canvas,
        }
    }

    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    pub fn inputs(&self) -> &MassInputs {
        &self.inputs
    }

    pub fn focused_field(&self) -> (usize, MassField) {
        (self.focus / 4, MassField::ALL[self.focus % 4])
    }

    /// Fits the canvas to a new terminal size and redraws the current frame
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let (logical_width, logical_height) = self.canvas.logical_size();
        let (width, height) = canvas_geometry(cols, rows, logical_width, logical_height);
        self.canvas.resize(width, height);
        self.cols = cols;
        crate::graphics::render(
            &mut self.canvas,
            self.driver.layout(),
            self.driver.masses(),
            self.driver.phase(),
        );
    }

    /// Handle a key press
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        let field_count = self.inputs.len() * 4;
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char(' ') => self.driver.toggle(&self.inputs, &mut self.canvas),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.driver.reset(&mut self.inputs, &mut self.canvas);
                self.focus = 0;
            }
            KeyCode::Char('d') | KeyCode::Char('D') => self.debug = !self.debug,
            KeyCode::Char('[') => self.change_mass_count(-1),
            KeyCode::Char(']') => self.change_mass_count(1),
            KeyCode::Tab | KeyCode::Right if field_count > 0 => {
                self.focus = (self.focus + 1) % field_count;
            }
            KeyCode::BackTab | KeyCode::Left if field_count > 0 => {
                self.focus = (self.focus + field_count - 1) % field_count;
            }
            KeyCode::Up => self.step_focused(1),
            KeyCode::Down => self.step_focused(-1),
            KeyCode::Backspace => {
                let (index, field) = self.focused_field();
                if let Some(text) = self.inputs.field_mut(index, field) {
                    text.pop();
                }
            }
            KeyCode::Delete => {
                let (index, field) = self.focused_field();
                self.inputs.set_field(index, field, "");
            }
            KeyCode::Char(c) if c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E') => {
                let (index, field) = self.focused_field();
                if let Some(text) = self.inputs.field_mut(index, field) {
                    text.push(c);
                }
            }
            _ => {}
        }
        Action::Continue
    }

    fn step_focused(&mut self, direction: i32) {
        let (index, field) = self.focused_field();
        self.inputs.step_field(index, field, direction);
    }

    fn change_mass_count(&mut self, delta: isize) {
        let count = self.driver.mass_count().saturating_add_signed(delta);
        if count == self.driver.mass_count() || !MASS_COUNT_RANGE.contains(&count) {
            return;
        }
        self.driver.set_mass_count(count, &mut self.inputs);
        self.focus = self.focus.min(self.inputs.len() * 4 - 1);
    }

    /// Runs the event loop until the user quits
    pub fn run(&mut self, out: &mut impl Write, scheduler: &mut impl Scheduler) -> Result<()> {
        self.paint(out)?;
        loop {
            if event::poll(scheduler.until_next_frame())? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if self.handle_key(key) == Action::Quit {
                            return Ok(());
                        }
                    }
                    Event::Resize(cols, rows) => {
                        queue!(out, Clear(ClearType::All))?;
                        self.resize(cols, rows);
                    }
                    _ => {}
                }
                self.paint(out)?;
                continue;
            }

            scheduler.wait_next_frame();
            if self.driver.tick(&self.inputs, &mut self.canvas) {
                self.paint(out)?;
            }
        }
    }

    /// Paint the widget
    pub fn paint(&mut self, out: &mut impl Write) -> Result<()> {
        // Update FPS calculation
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let duration = now.duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }

        let mut row: u16 = 0;
        queue!(
            out,
            MoveTo(0, row),
            SetAttribute(Attribute::Bold),
            Print("Static and Dynamic Balancing"),
            SetAttribute(Attribute::Reset),
            Clear(ClearType::UntilNewLine)
        )?;
        row += 1;

        let canvas_top = row;
        row += self.paint_canvas(out, row)?;
        if self.debug {
            self.paint_debug(out, canvas_top)?;
        }

        row = self.paint_inputs(out, row)?;
        row = self.paint_results(out, row + 1)?;

        queue!(
            out,
            MoveTo(0, row + 1),
            Print(self.status_line()),
            Clear(ClearType::FromCursorDown)
        )?;
        out.flush()?;
        Ok(())
    }

    /// Key help with the button label and mass count, cut to the terminal width
    pub fn status_line(&self) -> String {
        let line = format!(
            "Space:{} r:Reset [/]:Masses({}) Tab:Field Up/Dn:Step d:Debug q:Quit",
            self.driver.button_label(),
            self.driver.mass_count()
        );
        line.chars().take(self.cols as usize).collect()
    }

    /// Text segments of one input row, each flagged when it holds the focused
    /// field, cut to the terminal width
    pub fn input_row(&self, index: usize) -> Vec<(String, bool)> {
        let (focus_index, focus_field) = self.focused_field();
        let mut segments = vec![(format!("Mass {}", index + 1), false)];
        for field in MassField::ALL {
            let text = self.inputs.field(index, field).unwrap_or_default();
            // Long entries show their tail, where typing happens
            let skip = text.chars().count().saturating_sub(FIELD_WIDTH);
            let shown: String = text.chars().skip(skip).collect();
            segments.push((format!(" {} ", field.label()), false));
            segments.push((
                format!("[{:<width$}]", shown, width = FIELD_WIDTH),
                index == focus_index && field == focus_field,
            ));
        }

        let mut room = self.cols as usize;
        segments
            .into_iter()
            .map_while(|(text, focused)| {
                if room == 0 {
                    return None;
                }
                let cut: String = text.chars().take(room).collect();
                room -= cut.chars().count();
                Some((cut, focused))
            })
            .collect()
    }

    fn paint_canvas(&self, out: &mut impl Write, top: u16) -> Result<u16> {
        let (width, height) = self.canvas.size();
        let rows = height.div_ceil(2);
        for cell_row in 0..rows {
            queue!(out, MoveTo(0, top + cell_row as u16))?;
            for x in 0..width {
                let upper = self.canvas.pixel(x, cell_row * 2).unwrap_or(BACKGROUND);
                let lower = self.canvas.pixel(x, cell_row * 2 + 1).unwrap_or(BACKGROUND);
                queue!(
                    out,
                    SetForegroundColor(upper.into()),
                    SetBackgroundColor(lower.into()),
                    Print('▀')
                )?;
            }
            queue!(out, ResetColor, Clear(ClearType::UntilNewLine))?;
        }
        Ok(rows as u16)
    }

    fn paint_debug(&self, out: &mut impl Write, top: u16) -> Result<()> {
        let mut lines = vec![
            format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            format!("Phase: {:.2}°", self.driver.phase()),
            format!("Frames: {}", self.driver.state().frames),
            format!("FPS: {:.2}", self.fps),
        ];
        if let Some(result) = self.driver.result() {
            lines.push(format!("Resultant force: {:.3} N", result.resultant_force()));
            lines.push(format!("Resultant moment: {:.3} Nm", result.resultant_moment()));
        }
        for (offset, line) in lines.iter().enumerate() {
            queue!(
                out,
                MoveTo(1, top + offset as u16),
                SetForegroundColor(Color::Black),
                SetBackgroundColor(BACKGROUND.into()),
                Print(line),
                ResetColor
            )?;
        }
        Ok(())
    }

    fn paint_inputs(&self, out: &mut impl Write, mut row: u16) -> Result<u16> {
        for index in 0..self.inputs.len() {
            queue!(out, MoveTo(0, row))?;
            for (text, focused) in self.input_row(index) {
                if focused {
                    queue!(out, SetAttribute(Attribute::Reverse))?;
                }
                queue!(out, Print(text), SetAttribute(Attribute::Reset))?;
            }
            queue!(out, Clear(ClearType::UntilNewLine))?;
            row += 1;
        }
        Ok(row)
    }

    fn paint_results(&self, out: &mut impl Write, mut row: u16) -> Result<u16> {
        let Some(result) = self.driver.result() else {
            queue!(out, MoveTo(0, row), Clear(ClearType::UntilNewLine))?;
            return Ok(row);
        };

        queue!(
            out,
            MoveTo(0, row),
            SetAttribute(Attribute::Bold),
            Print("Results:"),
            SetAttribute(Attribute::Reset),
            Clear(ClearType::UntilNewLine)
        )?;
        row += 1;

        let lines = result.report_lines();
        for line in &lines[..4] {
            queue!(out, MoveTo(0, row), Print(line), Clear(ClearType::UntilNewLine))?;
            row += 1;
        }
        for (label, verdict) in [
            ("Static Balance: ", result.static_verdict()),
            ("Dynamic Balance: ", result.dynamic_verdict()),
        ] {
            queue!(
                out,
                MoveTo(0, row),
                Print(label),
                SetForegroundColor(verdict_color(verdict)),
                Print(verdict.label()),
                ResetColor,
                Clear(ClearType::UntilNewLine)
            )?;
            row += 1;
        }
        Ok(row)
    }
}

/// Terminal colour for a verdict's style tag
pub fn verdict_color(verdict: Verdict) -> Color {
    match verdict.style_tag() {
        "result-balanced" => Color::Green,
        _ => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crossterm::event::KeyModifiers;

    fn widget(count: usize) -> BalanceWidget {
        let driver = AnimationDriver::new(SimConfig::default(), count);
        BalanceWidget::new(driver, MassInputs::new(count), 80, 40)
    }

    fn press(widget: &mut BalanceWidget, code: KeyCode) -> Action {
        widget.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn geometry_keeps_aspect_ratio() {
        assert_eq!(canvas_geometry(200, 35, 800.0, 400.0), (80, 40));
        assert_eq!(canvas_geometry(60, 40, 800.0, 400.0), (60, 30));
        let (width, height) = canvas_geometry(10, 2, 800.0, 400.0);
        assert!(width >= 1 && height >= 1);
    }

    #[test]
    fn space_toggles_rotation() {
        let mut w = widget(4);
        press(&mut w, KeyCode::Char(' '));
        assert!(w.driver().is_running());
        press(&mut w, KeyCode::Char(' '));
        assert!(!w.driver().is_running());
    }

    #[test]
    fn editing_focused_field() {
        let mut w = widget(2);
        press(&mut w, KeyCode::Tab);
        assert_eq!(w.focused_field(), (0, MassField::Radius));
        press(&mut w, KeyCode::Backspace);
        press(&mut w, KeyCode::Char('5'));
        assert_eq!(w.inputs().field(0, MassField::Radius), Some("0.5"));
        press(&mut w, KeyCode::Up);
        assert_eq!(w.inputs().field(0, MassField::Radius), Some("0.6"));
    }

    #[test]
    fn focus_wraps_backwards() {
        let mut w = widget(2);
        press(&mut w, KeyCode::BackTab);
        assert_eq!(w.focused_field(), (1, MassField::Position));
    }

    #[test]
    fn mass_count_keys_regenerate() {
        let mut w = widget(4);
        for _ in 0..7 {
            press(&mut w, KeyCode::BackTab);
        }
        press(&mut w, KeyCode::Char('['));
        assert_eq!(w.driver().mass_count(), 3);
        assert_eq!(w.inputs().len(), 3);
        press(&mut w, KeyCode::Char(']'));
        press(&mut w, KeyCode::Char(']'));
        assert_eq!(w.driver().mass_count(), 4);
        for _ in 0..5 {
            press(&mut w, KeyCode::Char('['));
        }
        assert_eq!(w.driver().mass_count(), 1);
        assert!(w.focused_field().0 == 0);
    }

    #[test]
    fn reset_and_quit_keys() {
        let mut w = widget(4);
        press(&mut w, KeyCode::Char(' '));
        press(&mut w, KeyCode::Char('r'));
        assert!(!w.driver().is_running());
        assert!(w.driver().result().is_none());
        assert_eq!(press(&mut w, KeyCode::Char('q')), Action::Quit);
    }

    #[test]
    fn paint_writes_results_panel() {
        let mut w = widget(4);
        press(&mut w, KeyCode::Char(' '));
        let mut buffer = Vec::new();
        w.paint(&mut buffer).unwrap();
        let text = String::from_utf8_lossy(&buffer);
        assert!(text.contains("Sum of Forces in X-direction"));
        assert!(text.contains("Dynamic Balance: "));
        assert!(text.contains("Space:Stop"));
    }

    fn row_width(segments: &[(String, bool)]) -> usize {
        segments.iter().map(|(text, _)| text.chars().count()).sum()
    }

    #[test]
    fn text_lines_fit_eighty_columns() {
        let mut w = widget(4);
        w.inputs.set_field(3, MassField::Angle, "123.456789");
        for index in 0..4 {
            assert!(row_width(&w.input_row(index)) <= 80, "row {index}");
        }
        assert!(w.status_line().chars().count() <= 80);
        assert_eq!(
            w.status_line(),
            "Space:Rotate r:Reset [/]:Masses(4) Tab:Field Up/Dn:Step d:Debug q:Quit"
        );
    }

    #[test]
    fn long_field_shows_its_tail() {
        let mut w = widget(1);
        w.inputs.set_field(0, MassField::Value, "123.456789");
        let row = w.input_row(0);
        assert_eq!(row[0].0, "Mass 1");
        assert_eq!(row[1].0, " m(kg) ");
        assert_eq!(row[2], ("[456789]".to_string(), true));
    }

    #[test]
    fn narrow_terminal_cuts_lines() {
        let mut w = widget(2);
        w.resize(30, 40);
        let row = w.input_row(1);
        assert_eq!(row_width(&row), 30);
        assert!(row.iter().all(|(text, _)| !text.is_empty()));
        assert_eq!(w.status_line().chars().count(), 30);
    }

    #[test]
    fn verdict_colours() {
        assert_eq!(verdict_color(Verdict::Balanced), Color::Green);
        assert_eq!(verdict_color(Verdict::Unbalanced), Color::Red);
    }
}
