use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{
        Block, BorderType, Borders, Cell, Clear, LineGauge, Paragraph, Row, Table, TableState,
    },
    Frame, Terminal,
};

use crate::{
    config::Config,
    filter::{FilterMode, FilterState},
    helpers::{
        clock, cpu_cell_color, cpu_gauge_color, mem_cell_color, mem_gauge_color, nice_size,
        nice_size_g, nice_time, truncate,
    },
    input::{map_key, map_mouse, Command, HitMap},
    kill::Terminator,
    manager::{Snapshot, SnapshotSource},
    viewmodel::{RefreshOutcome, StatusLevel, StatusMessage, Ticker, ViewModel},
};

///upper bound on one poll so expired status messages disappear
const MAX_POLL: Duration = Duration::from_millis(250);

struct UiState {
    searching: bool,
    input: String,
    help: bool,
    show_cores: bool,
}

/// Everything the event loop owns. No globals.
struct App<S, T> {
    vm: ViewModel,
    ui: UiState,
    source: S,
    terminator: T,
    ticker: Ticker,
    table: TableState,
    hits: HitMap,
    done: bool,
}

pub fn run<S: SnapshotSource, T: Terminator>(
    config: &Config,
    source: S,
    terminator: T,
) -> Result<(), io::Error> {
    let mut app = App::new(config, source, terminator, Instant::now());
    app.vm.refresh(&mut app.source);

    install_panic_hook();
    let mut guard = TerminalGuard::new()?;

    while !app.done {
        guard.terminal.draw(|f| app.draw(f, Instant::now()))?;

        let timeout = app.ticker.until_next(Instant::now()).min(MAX_POLL);
        if event::poll(timeout)? {
            let ev = event::read()?;
            app.on_event(ev, Instant::now());
        }

        if app.ticker.due(Instant::now()) {
            app.vm.refresh(&mut app.source);
        }
    }
    tracing::info!("quit requested");
    Ok(())
}

impl<S: SnapshotSource, T: Terminator> App<S, T> {
    fn new(config: &Config, source: S, terminator: T, now: Instant) -> Self {
        Self {
            vm: ViewModel::new(config.limit, config.status_ttl()),
            ui: UiState {
                searching: false,
                input: String::new(),
                help: false,
                show_cores: config.show_cpu_per_core,
            },
            source,
            terminator,
            ticker: Ticker::new(config.refresh_interval(), now),
            table: TableState::default(),
            hits: HitMap::default(),
            done: false,
        }
    }

    fn on_event(&mut self, ev: Event, now: Instant) {
        let cmd = match ev {
            Event::Key(key) => map_key(key, self.ui.searching),
            //the help popup covers the toolbar and table
            Event::Mouse(_) if self.ui.help => None,
            Event::Mouse(mouse) => map_mouse(mouse, &self.hits),
            _ => None,
        };
        if let Some(cmd) = cmd {
            self.handle(cmd, now);
        }
    }

    fn handle(&mut self, cmd: Command, now: Instant) {
        match cmd {
            Command::Quit => self.done = true,
            Command::Refresh => {
                if self.vm.refresh(&mut self.source) == RefreshOutcome::Refreshed {
                    self.ticker.reset(now);
                    self.vm.info("Refreshed", now);
                }
            }
            Command::Kill => self.vm.kill_selected(&mut self.terminator, now),
            Command::BeginSearch => {
                self.ui.searching = true;
                self.ui.input = self.vm.filter().query().to_string();
            }
            Command::SearchInput(c) => self.ui.input.push(c),
            Command::SearchBackspace => {
                let _ = self.ui.input.pop();
            }
            Command::SearchSubmit => {
                self.ui.searching = false;
                let query = std::mem::take(&mut self.ui.input);
                self.vm.set_query(&query, now);
            }
            Command::SearchCancel => {
                self.ui.searching = false;
                self.ui.input.clear();
            }
            Command::ClearFilter => {
                self.ui.searching = false;
                self.ui.input.clear();
                self.vm.clear_filter(now);
            }
            Command::ClearSelection => self.vm.clear_selection(),
            Command::ToggleHelp => self.ui.help = !self.ui.help,
            Command::ToggleCores => self.ui.show_cores = !self.ui.show_cores,
            Command::Move(delta) => self.vm.move_selection(delta),
            Command::First => self.vm.select_first(),
            Command::Last => self.vm.select_last(),
            Command::SelectRow(index) => {
                if let Some(pid) = self.vm.rows().get(index).map(|r| r.pid) {
                    self.vm.select(pid);
                }
            }
            Command::Scroll(delta) => {
                //ratatui keeps a selected row in view, so scroll the selection itself
                if self.vm.selected_pid().is_some() {
                    self.vm.move_selection(delta);
                } else {
                    let last = self.vm.rows().len().saturating_sub(1);
                    let offset = self.table.offset().saturating_add_signed(delta).min(last);
                    *self.table.offset_mut() = offset;
                }
            }
        }
    }

    fn draw(&mut self, f: &mut Frame, now: Instant) {
        let snapshot = self.vm.snapshot();
        let core_lines = if self.ui.show_cores {
            snapshot.per_core.len().div_ceil(4) as u16
        } else {
            0
        };
        let show_prompt = self.ui.searching || !self.vm.filter().is_empty();

        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(core_lines + 4),
            Constraint::Length(show_prompt as u16),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

        let buttons = draw_toolbar(f, chunks[0], self.vm.status(now));
        draw_stats(f, chunks[1], snapshot, self.ui.show_cores, self.vm.rows().len());
        if show_prompt {
            draw_prompt(f, chunks[2], &self.ui, self.vm.filter());
        }

        self.table.select(self.vm.selected_index());
        let table_body = draw_table(f, chunks[3], &self.vm, &mut self.table);
        draw_keys(f, chunks[4]);

        if self.ui.help {
            draw_help(f);
        }

        self.hits = HitMap {
            buttons,
            table_body,
            table_offset: self.table.offset(),
            row_count: self.vm.rows().len(),
        };
    }
}

fn toolbar_buttons() -> [(&'static str, Command, Color); 5] {
    [
        ("Search", Command::BeginSearch, Color::Blue),
        ("Clear", Command::ClearFilter, Color::DarkGray),
        ("KILL", Command::Kill, Color::Red),
        ("Refresh", Command::Refresh, Color::DarkGray),
        ("Quit", Command::Quit, Color::DarkGray),
    ]
}

fn draw_toolbar(
    f: &mut Frame,
    area: Rect,
    status: Option<&StatusMessage>,
) -> Vec<(Rect, Command)> {
    let mut rects = vec![];
    let mut x = area.x;
    for (label, cmd, bg) in toolbar_buttons() {
        let width = label.len() as u16 + 2;
        if x + width > area.right() {
            break;
        }
        let rect = Rect::new(x, area.y, width, 1);
        let p = Paragraph::new(format!(" {label} "))
            .style(Style::default().bg(bg).fg(Color::White).add_modifier(Modifier::BOLD));
        f.render_widget(p, rect);
        rects.push((rect, cmd));
        x += width + 1;
    }

    if let Some(status) = status {
        let color = match status.level {
            StatusLevel::Info => Color::Green,
            StatusLevel::Error => Color::Red,
        };
        let x = x + 1;
        if x < area.right() {
            let p = Paragraph::new(format!("→ {}", status.text))
                .style(Style::default().fg(color));
            f.render_widget(p, Rect::new(x, area.y, area.right() - x, 1));
        }
    }
    rects
}

fn draw_stats(f: &mut Frame, area: Rect, snapshot: &Snapshot, show_cores: bool, shown: usize) {
    let mut y = area.y;
    let gauge_width = area.width.min(60);

    if show_cores {
        let width = area.width / 4;
        for (i, cpu) in snapshot.per_core.iter().enumerate() {
            let x = area.x + (i % 4) as u16 * width;
            let row = area.y + (i / 4) as u16;
            if row >= area.bottom() {
                break;
            }
            draw_gauge(
                f,
                Rect::new(x, row, width, 1),
                *cpu as f64 / 100.,
                format!("{:>3} {cpu:>5.1}%", i + 1),
                cpu_gauge_color(*cpu),
            );
        }
        y += snapshot.per_core.len().div_ceil(4) as u16;
    }

    let lines = [
        (
            snapshot.cpu_total as f64 / 100.,
            format!(
                "Cpu: {:.1}%  Cores: {} physical, {} logical",
                snapshot.cpu_total,
                snapshot
                    .physical_cores
                    .map_or_else(|| "-".to_string(), |n| n.to_string()),
                snapshot.per_core.len()
            ),
            cpu_gauge_color(snapshot.cpu_total),
        ),
        (
            snapshot.memory_ratio(),
            format!(
                "Mem: {}/{} avail {}",
                nice_size_g(snapshot.memory_used),
                nice_size_g(snapshot.memory_total),
                nice_size_g(snapshot.memory_available)
            ),
            mem_gauge_color((snapshot.memory_ratio() * 100.) as f32),
        ),
        (
            snapshot.swap_ratio(),
            format!(
                "Swap: {}/{}",
                nice_size_g(snapshot.swap_used),
                nice_size_g(snapshot.swap_total)
            ),
            Color::Blue,
        ),
    ];
    for (ratio, label, color) in lines {
        if y >= area.bottom() {
            return;
        }
        draw_gauge(f, Rect::new(area.x, y, gauge_width, 1), ratio, label, color);
        y += 1;
    }

    if y < area.bottom() {
        let age = snapshot.timestamp.elapsed().map(|d| d.as_secs()).unwrap_or(0);
        let info = format!(
            "Uptime: {}   Processes: {}/{}   Updated {} ({}s ago)",
            nice_time(snapshot.uptime),
            shown,
            snapshot.rows.len(),
            clock(snapshot.timestamp),
            age
        );
        f.render_widget(Paragraph::new(info), Rect::new(area.x, y, area.width, 1));
    }
}

fn draw_gauge(f: &mut Frame, rect: Rect, ratio: f64, label: String, color: Color) {
    //LineGauge panics outside 0..=1
    let ratio = if ratio.is_finite() { ratio.clamp(0., 1.) } else { 0. };
    let gauge = LineGauge::default()
        .label(label)
        .filled_style(Style::default().fg(color))
        .unfilled_style(Style::default().fg(Color::DarkGray))
        .ratio(ratio);
    f.render_widget(gauge, rect);
}

fn draw_prompt(f: &mut Frame, area: Rect, ui: &UiState, filter: &FilterState) {
    let p = if ui.searching {
        Paragraph::new(format!("Search: {}█", ui.input))
            .style(Style::default().bg(Color::Green).fg(Color::Black))
    } else {
        let mode = match filter.mode() {
            FilterMode::Name => "name",
            FilterMode::Pid => "pid",
        };
        Paragraph::new(format!("Filter: {} ({mode})", filter.query()))
            .style(Style::default().fg(Color::Cyan))
    };
    f.render_widget(p, area);
}

/// Returns the screen area of the data rows, for click hit-testing.
fn draw_table(f: &mut Frame, area: Rect, vm: &ViewModel, table: &mut TableState) -> Rect {
    let header = Row::new(
        ["PID", "Name", "CPU %", "Mem %", "Memory", "Status"]
            .into_iter()
            .map(|h| Cell::from(h).style(Style::default().fg(Color::Black).bg(Color::LightBlue))),
    )
    .style(Style::default().bg(Color::LightBlue));

    let rows: Vec<Row> = vm
        .rows()
        .iter()
        .map(|p| {
            let (mem_percent, mem_bytes, mem_color) = match p.memory {
                Some(m) => (
                    format!("{:>6.1}", m.percent),
                    nice_size(m.bytes),
                    mem_cell_color(m.percent),
                ),
                None => (format!("{:>6}", "-"), "-".to_string(), Color::Reset),
            };
            Row::new(vec![
                Cell::from(format!("{:>7}", p.pid)),
                Cell::from(truncate(&p.name, 30)),
                Cell::from(format!("{:>6.1}", p.cpu_percent))
                    .style(Style::default().fg(cpu_cell_color(p.cpu_percent))),
                Cell::from(mem_percent).style(Style::default().fg(mem_color)),
                Cell::from(format!("{mem_bytes:>10}")),
                Cell::from(p.status.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(11),
        Constraint::Length(10),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Processes ({}) ", vm.rows().len()));
    let inner = block.inner(area);

    let t = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::LightYellow).fg(Color::Black));
    f.render_stateful_widget(t, area, table);

    Rect::new(
        inner.x,
        inner.y.saturating_add(1),
        inner.width,
        inner.height.saturating_sub(1),
    )
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let keys = "q quit  / search  c clear  k kill  r refresh  esc deselect  p cores  ? help";
    let p = Paragraph::new(keys).style(Style::default().fg(Color::DarkGray));
    f.render_widget(p, area);
}

fn draw_help(f: &mut Frame) {
    let help = r#"?/h        Help menu
Click      Select process
Up/Down    Move selection
PgUp/PgDn  Move selection by page
Home/End   First/last row
Wheel      Scroll
s or /     Search name or pid
Enter      Apply search
c          Clear search
k/Del      Kill selected (SIGKILL)
r/F5       Refresh now
Esc        Deselect
p          Show/hide cpu cores
q/Ctrl-c   Exit"#;

    let p = Paragraph::new(help)
        .style(Style::default().bg(Color::Yellow).fg(Color::Black))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .border_type(BorderType::Rounded),
        );
    let area = f.area();
    let h = (help.lines().count() as u16 + 2).min(area.height);
    let w = 44.min(area.width);
    let x = area.width.saturating_sub(w) / 2;
    let y = area.height.saturating_sub(h) / 3;
    let rect = Rect::new(x, y, w, h);
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Holds the terminal in raw mode; restores it when dropped, on every exit path.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self, io::Error> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
            let _ = restore();
            return Err(err);
        }
        match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(err) => {
                let _ = restore();
                Err(err)
            }
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore();
        let _ = self.terminal.show_cursor();
    }
}

fn restore() -> Result<(), io::Error> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

/// Leave the alternate screen before the panic message prints.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
