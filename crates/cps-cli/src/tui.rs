//! Interactive TUI for the color profile switcher.
//!
//! A box-drawing terminal menu: a device list, and per device the
//! installed profiles plus a disable entry. The inventory is re-read
//! before every redraw so the screen always reflects colord's state.

use crate::menu::{self, describe_outcome, Dispatch, Menu, MenuCommand, MenuItem, Submenu};
use chrono::{DateTime, Local};
use cps_core::Result as ApplyResult;
use cps_exec::{CommandRunner, Tools};
use cps_profile::{ApplyOutcome, ApplyTicket, ApplyWorker};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::{Color, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

// ── Layout constants ─────────────────────────────────────────────────────

pub(crate) const W: usize = 76;
pub(crate) const INNER: usize = W - 4; // Content width between "║ " and " ║"
pub(crate) const BAR: usize = W - 2; // Fill width between ╔/╗, ╟/╢, ╚/╝
pub(crate) const TITLE: &str = "Color Profile Switcher";
pub(crate) const SUBTITLE: &str = "colord + ArgyllCMS dispwin";

/// Selection keys in display order; B, D and Q are reserved.
const ITEM_KEYS: &str = "123456789acefghijklmnoprstuvwxyz";

// ── Types ────────────────────────────────────────────────────────────────

/// Most recent apply, shown in the header.
pub(crate) struct LastAction {
    pub(crate) at: DateTime<Local>,
    pub(crate) ok: bool,
    pub(crate) text: String,
}

/// State kept across redraws.
pub(crate) struct Session {
    pub(crate) config_path: PathBuf,
    pub(crate) dry_run: bool,
    pub(crate) last_action: Option<LastAction>,
}

impl Session {
    pub(crate) fn new(config_path: PathBuf, dry_run: bool) -> Self {
        Self {
            config_path,
            dry_run,
            last_action: None,
        }
    }

    fn record(&mut self, ok: bool, text: String) {
        self.last_action = Some(LastAction {
            at: Local::now(),
            ok,
            text,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Page {
    Devices,
    /// Keyed by object path so the page survives a re-read.
    Device(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    Goto(Page),
    Select(MenuItem),
    Ignore,
}

// ── Entry point ──────────────────────────────────────────────────────────

pub fn run(
    runner: &dyn CommandRunner,
    tools: &Tools,
    worker: &ApplyWorker,
    session: &mut Session,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = io::stdout();
    let mut page = Page::Devices;

    loop {
        let menu = menu::load_menu(runner, tools);

        // The device may have been removed since the last key press.
        if matches!(&page, Page::Device(path) if find_submenu(&menu, path).is_none()) {
            page = Page::Devices;
        }

        match &page {
            Page::Devices => draw_devices(&mut out, &menu, session)?,
            Page::Device(path) => match find_submenu(&menu, path) {
                Some(submenu) => draw_device(&mut out, &menu, submenu, session)?,
                None => draw_devices(&mut out, &menu, session)?,
            },
        }
        out.flush()?;

        let ch = read_key()?;

        match handle_key(&page, &menu, ch) {
            Input::Goto(next) => page = next,
            Input::Select(item) => {
                if !run_selection(&mut out, worker, &item, session)? {
                    break;
                }
            }
            Input::Ignore => {}
        }
    }

    draw_goodbye(&mut out)?;
    Ok(())
}

/// Map a key press on `page` to what the loop should do next.
pub(crate) fn handle_key(page: &Page, menu: &Menu, ch: char) -> Input {
    match (page, ch) {
        (_, 'q') => Input::Select(menu.exit.clone()),
        (Page::Device(_), 'b') => Input::Goto(Page::Devices),
        (Page::Devices, c) => key_index(c)
            .and_then(|i| menu.submenus.get(i))
            .map(|s| Input::Goto(Page::Device(s.device_path.clone())))
            .unwrap_or(Input::Ignore),
        (Page::Device(path), 'd') => find_submenu(menu, path)
            .and_then(disable_item)
            .map(|item| Input::Select(item.clone()))
            .unwrap_or(Input::Ignore),
        (Page::Device(path), c) => find_submenu(menu, path)
            .zip(key_index(c))
            .and_then(|(s, i)| profile_items(s).nth(i))
            .map(|item| Input::Select(item.clone()))
            .unwrap_or(Input::Ignore),
    }
}

fn key_index(ch: char) -> Option<usize> {
    ITEM_KEYS.find(ch)
}

fn item_key(index: usize) -> String {
    ITEM_KEYS
        .chars()
        .nth(index)
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_else(|| " ".to_string())
}

fn find_submenu<'a>(menu: &'a Menu, path: &str) -> Option<&'a Submenu> {
    menu.submenus.iter().find(|s| s.device_path == path)
}

fn profile_items(submenu: &Submenu) -> impl Iterator<Item = &MenuItem> {
    submenu
        .items
        .iter()
        .filter(|i| matches!(i.command, MenuCommand::ApplyProfile { .. }))
}

fn disable_item(submenu: &Submenu) -> Option<&MenuItem> {
    submenu
        .items
        .iter()
        .find(|i| matches!(i.command, MenuCommand::Disable { .. }))
}

// ── Key reading (brief raw mode) ─────────────────────────────────────────

fn read_key() -> io::Result<char> {
    terminal::enable_raw_mode()?;
    let ch = loop {
        match event::read()? {
            // Only react to Press events; some terminals also report
            // Release and Repeat.
            Event::Key(KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                kind: KeyEventKind::Press,
                ..
            }) => break 'q',
            Event::Key(KeyEvent {
                code: KeyCode::Char(c),
                kind: KeyEventKind::Press,
                ..
            }) => break c.to_ascii_lowercase(),
            Event::Key(KeyEvent {
                code: KeyCode::Esc,
                kind: KeyEventKind::Press,
                ..
            }) => break 'q',
            _ => continue,
        }
    };
    terminal::disable_raw_mode()?;
    Ok(ch)
}

// ============================================================================
// Drawing: pages
// ============================================================================

pub(crate) fn draw_header(out: &mut impl Write, menu: &Menu, session: &Session) -> io::Result<()> {
    draw_top(out, TITLE)?;

    let version_line = format!(
        "Version {}  \u{2502}  {}",
        env!("CARGO_PKG_VERSION"),
        SUBTITLE
    );
    draw_line_center(out, &version_line, Color::DarkGrey)?;

    draw_sep(out, "")?;
    draw_empty(out)?;

    let status_label = "\u{2500} CURRENT STATUS ";
    let status_dashes = INNER - 2 - status_label.chars().count();
    let status_top = format!(
        "\u{250C}{}{}\u{2510}",
        status_label,
        "\u{2500}".repeat(status_dashes)
    );
    draw_line(out, &status_top, Color::DarkCyan)?;

    let (device_text, device_color) = match &menu.status {
        Some(_) => ("\u{25CB} Unavailable".to_string(), Color::Red),
        None if menu.submenus.is_empty() => ("\u{25CB} None found".to_string(), Color::DarkGrey),
        None => (
            format!("\u{25CF} {} display(s)", menu.submenus.len()),
            Color::Green,
        ),
    };
    draw_status(out, "Devices:    ", &device_text, device_color)?;

    let (mode_text, mode_color) = if session.dry_run {
        ("\u{25CB} Dry run (no changes)", Color::Yellow)
    } else {
        ("\u{25CF} Live", Color::Green)
    };
    draw_status(out, "Mode:       ", mode_text, mode_color)?;

    let config_text = session.config_path.display().to_string();
    draw_status(out, "Config:     ", &config_text, Color::Grey)?;

    let (last_text, last_color) = match &session.last_action {
        Some(action) => (
            format!("{}  {}", action.at.format("%H:%M:%S"), action.text),
            if action.ok { Color::Green } else { Color::Red },
        ),
        None => ("none".to_string(), Color::DarkGrey),
    };
    draw_status(out, "Last action:", &last_text, last_color)?;

    let status_bottom = format!("\u{2514}{}\u{2518}", "\u{2500}".repeat(INNER - 2));
    draw_line(out, &status_bottom, Color::DarkCyan)?;

    draw_empty(out)?;
    Ok(())
}

pub(crate) fn draw_devices(out: &mut impl Write, menu: &Menu, session: &Session) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), cursor::MoveTo(0, 0))?;

    draw_header(out, menu, session)?;
    draw_sep(out, " DEVICES ")?;
    draw_empty(out)?;

    if let Some(status) = &menu.status {
        draw_line(out, &format!("  {}", status), Color::Red)?;
    } else if menu.submenus.is_empty() {
        draw_line(out, "  No color-managed displays found", Color::DarkGrey)?;
    } else {
        for (i, submenu) in menu.submenus.iter().enumerate() {
            let output = if submenu.output_name.is_empty() {
                "no output"
            } else {
                submenu.output_name.as_str()
            };
            let label = format!("{}  ({})", submenu.label, output);
            if submenu.color_managed {
                draw_item_colored(out, &item_key(i), &label, Color::Green)?;
            } else {
                draw_item(out, &item_key(i), &label)?;
            }
        }
    }

    draw_empty(out)?;
    draw_item_quit(out, &menu.exit.label)?;
    draw_empty(out)?;
    draw_bottom(out)?;

    draw_prompt(out, "Select device: ")
}

pub(crate) fn draw_device(
    out: &mut impl Write,
    menu: &Menu,
    submenu: &Submenu,
    session: &Session,
) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), cursor::MoveTo(0, 0))?;

    draw_header(out, menu, session)?;
    draw_sep(out, &format!(" {} ", submenu.label))?;
    draw_empty(out)?;

    draw_status(out, "Object path:", &submenu.device_path, Color::Grey)?;
    let output = if submenu.output_name.is_empty() {
        "(unknown)"
    } else {
        submenu.output_name.as_str()
    };
    draw_status(out, "Output:     ", output, Color::Grey)?;
    let (state_text, state_color) = if submenu.color_managed {
        ("\u{25CF} Enabled", Color::Green)
    } else {
        ("\u{25CB} Disabled", Color::DarkGrey)
    };
    draw_status(out, "Color mgmt: ", state_text, state_color)?;
    draw_empty(out)?;

    draw_section(out, "PROFILES")?;
    let mut any = false;
    for (i, item) in profile_items(submenu).enumerate() {
        any = true;
        if item.enabled {
            draw_item(out, &item_key(i), &item.label)?;
        } else {
            draw_item_colored(out, &item_key(i), &item.label, Color::DarkGrey)?;
        }
    }
    if !any {
        draw_line(out, "    (no profiles installed)", Color::DarkGrey)?;
    }
    draw_empty(out)?;

    draw_section(out, "ACTIONS")?;
    if let Some(item) = disable_item(submenu) {
        let label = format!("{} color management", item.label);
        if item.enabled {
            draw_item(out, "D", &label)?;
        } else {
            draw_item_colored(out, "D", &label, Color::DarkGrey)?;
        }
    }
    draw_item(out, "B", "Back to device list")?;
    draw_item_quit(out, &menu.exit.label)?;
    draw_empty(out)?;
    draw_bottom(out)?;

    draw_prompt(out, "Select option: ")
}

pub(crate) fn draw_goodbye(out: &mut impl Write) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
    writeln!(out)?;
    draw_top(out, "")?;
    draw_empty(out)?;
    draw_line_center(out, "Goodbye from Color Profile Switcher", Color::White)?;
    draw_empty(out)?;
    draw_bottom(out)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn draw_prompt(out: &mut impl Write, prompt: &str) -> io::Result<()> {
    writeln!(out)?;
    queue!(out, SetForegroundColor(Color::White))?;
    write!(out, "  {}", prompt)?;
    queue!(out, ResetColor)?;
    Ok(())
}

// ============================================================================
// Box drawing primitives
// ============================================================================

fn draw_top(out: &mut impl Write, title: &str) -> io::Result<()> {
    queue!(out, SetForegroundColor(Color::Cyan))?;
    if title.is_empty() {
        writeln!(out, "\u{2554}{}\u{2557}", "\u{2550}".repeat(BAR))?;
    } else {
        let label = format!(" {} ", title);
        let pad = BAR.saturating_sub(label.chars().count());
        let left = pad / 2;
        let right = pad - left;
        writeln!(
            out,
            "\u{2554}{}{}{}\u{2557}",
            "\u{2550}".repeat(left),
            label,
            "\u{2550}".repeat(right)
        )?;
    }
    queue!(out, ResetColor)?;
    Ok(())
}

fn draw_bottom(out: &mut impl Write) -> io::Result<()> {
    queue!(out, SetForegroundColor(Color::Cyan))?;
    writeln!(out, "\u{255A}{}\u{255D}", "\u{2550}".repeat(BAR))?;
    queue!(out, ResetColor)?;
    Ok(())
}

fn draw_sep(out: &mut impl Write, title: &str) -> io::Result<()> {
    queue!(out, SetForegroundColor(Color::DarkCyan))?;
    if title.is_empty() {
        writeln!(out, "\u{255F}{}\u{2562}", "\u{2500}".repeat(BAR))?;
    } else {
        let pad = BAR.saturating_sub(title.chars().count());
        let left = pad / 2;
        let right = pad - left;
        writeln!(
            out,
            "\u{255F}{}{}{}\u{2562}",
            "\u{2500}".repeat(left),
            title,
            "\u{2500}".repeat(right)
        )?;
    }
    queue!(out, ResetColor)?;
    Ok(())
}

/// Cut `text` to `width` characters so long paths keep the frame intact.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('\u{2026}');
    cut
}

fn draw_line(out: &mut impl Write, text: &str, color: Color) -> io::Result<()> {
    queue!(out, SetForegroundColor(Color::Cyan))?;
    write!(out, "\u{2551} ")?;
    queue!(out, SetForegroundColor(color))?;
    write!(out, "{:<width$}", fit(text, INNER), width = INNER)?;
    queue!(out, SetForegroundColor(Color::Cyan))?;
    writeln!(out, " \u{2551}")?;
    queue!(out, ResetColor)?;
    Ok(())
}

fn draw_line_center(out: &mut impl Write, text: &str, color: Color) -> io::Result<()> {
    queue!(out, SetForegroundColor(Color::Cyan))?;
    write!(out, "\u{2551} ")?;
    queue!(out, SetForegroundColor(color))?;
    write!(out, "{:^width$}", fit(text, INNER), width = INNER)?;
    queue!(out, SetForegroundColor(Color::Cyan))?;
    writeln!(out, " \u{2551}")?;
    queue!(out, ResetColor)?;
    Ok(())
}

fn draw_empty(out: &mut impl Write) -> io::Result<()> {
    draw_line(out, "", Color::White)
}

fn draw_section(out: &mut impl Write, title: &str) -> io::Result<()> {
    let text = format!("  {}", title);
    draw_line(out, &text, Color::Cyan)
}

fn draw_item(out: &mut impl Write, key: &str, text: &str) -> io::Result<()> {
    draw_item_colored(out, key, text, Color::White)
}

fn draw_item_colored(
    out: &mut impl Write,
    key: &str,
    text: &str,
    text_color: Color,
) -> io::Result<()> {
    let key_display = format!("[{}]", key);
    let prefix_len = 2 + key_display.len() + 1; // indent + key + space
    let text_width = INNER.saturating_sub(prefix_len);

    queue!(out, SetForegroundColor(Color::Cyan))?;
    write!(out, "\u{2551} ")?;
    write!(out, "  ")?;
    queue!(out, SetForegroundColor(Color::Yellow))?;
    write!(out, "{}", key_display)?;
    queue!(out, SetForegroundColor(text_color))?;
    write!(out, " {:<width$}", fit(text, text_width), width = text_width)?;
    queue!(out, SetForegroundColor(Color::Cyan))?;
    writeln!(out, " \u{2551}")?;
    queue!(out, ResetColor)?;
    Ok(())
}

fn draw_item_quit(out: &mut impl Write, text: &str) -> io::Result<()> {
    let key_display = "[Q]";
    let prefix_len = 2 + key_display.len() + 1;
    let text_width = INNER.saturating_sub(prefix_len);

    queue!(out, SetForegroundColor(Color::Cyan))?;
    write!(out, "\u{2551} ")?;
    write!(out, "  ")?;
    queue!(out, SetForegroundColor(Color::Red))?;
    write!(out, "{}", key_display)?;
    queue!(out, SetForegroundColor(Color::DarkGrey))?;
    write!(out, " {:<width$}", text, width = text_width)?;
    queue!(out, SetForegroundColor(Color::Cyan))?;
    writeln!(out, " \u{2551}")?;
    queue!(out, ResetColor)?;
    Ok(())
}

fn draw_status(out: &mut impl Write, label: &str, value: &str, color: Color) -> io::Result<()> {
    let prefix = format!("  {} ", label);
    let value_width = INNER.saturating_sub(prefix.chars().count());

    queue!(out, SetForegroundColor(Color::Cyan))?;
    write!(out, "\u{2551} ")?;
    queue!(out, SetForegroundColor(Color::Grey))?;
    write!(out, "{}", prefix)?;
    queue!(out, SetForegroundColor(color))?;
    write!(out, "{:<width$}", fit(value, value_width), width = value_width)?;
    queue!(out, SetForegroundColor(Color::Cyan))?;
    writeln!(out, " \u{2551}")?;
    queue!(out, ResetColor)?;
    Ok(())
}

// ============================================================================
// Colored log tags
// ============================================================================

/// Write `  [TAG] message` with a colored tag.
fn write_tag(out: &mut impl Write, tag: &str, color: Color, msg: &str) -> io::Result<()> {
    queue!(out, SetForegroundColor(color))?;
    write!(out, "  {}", tag)?;
    queue!(out, ResetColor)?;
    writeln!(out, " {}", msg)?;
    Ok(())
}

// ============================================================================
// Selection runner: processing screen around one queued apply
// ============================================================================

fn selection_banner(item: &MenuItem) -> String {
    match &item.command {
        MenuCommand::ApplyProfile {
            output_name,
            profile_path,
            ..
        } => format!(
            "Applying {} to {}...",
            profile_path.rsplit('/').next().unwrap_or(profile_path),
            output_name
        ),
        MenuCommand::Disable { output_name, .. } => {
            format!("Disabling color management on {}...", output_name)
        }
        MenuCommand::Exit => String::new(),
    }
}

/// Run one selected entry; `false` once the entry asks to leave the menu.
fn run_selection(
    out: &mut impl Write,
    worker: &ApplyWorker,
    item: &MenuItem,
    session: &mut Session,
) -> io::Result<bool> {
    let ticket = match menu::dispatch(item, worker) {
        Dispatch::Queued(ticket) => ticket,
        Dispatch::Ignored => return Ok(true),
        Dispatch::Exit => return Ok(false),
    };

    queue!(out, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
    draw_top(out, " PROCESSING ")?;
    draw_empty(out)?;
    draw_line(out, &selection_banner(item), Color::Yellow)?;
    draw_empty(out)?;
    draw_bottom(out)?;
    writeln!(out)?;
    out.flush()?;

    let result = wait_with_progress(out, &ticket)?;
    report_result(out, &result, session)?;

    writeln!(out)?;
    queue!(out, SetForegroundColor(Color::DarkGrey))?;
    write!(out, "  Press any key to continue...")?;
    queue!(out, ResetColor)?;
    out.flush()?;
    let _ = read_key();
    Ok(true)
}

/// Wait on the worker, printing a dot per tick so a slow tool is visible.
fn wait_with_progress(
    out: &mut impl Write,
    ticket: &ApplyTicket,
) -> io::Result<ApplyResult<ApplyOutcome>> {
    write!(out, "  ")?;
    loop {
        if let Some(result) = ticket.wait_timeout(Duration::from_millis(250)) {
            writeln!(out)?;
            return Ok(result);
        }
        write!(out, ".")?;
        out.flush()?;
    }
}

pub(crate) fn report_result(
    out: &mut impl Write,
    result: &ApplyResult<ApplyOutcome>,
    session: &mut Session,
) -> io::Result<()> {
    match result {
        Ok(outcome) => {
            let (summary, warning) = describe_outcome(outcome);
            if let Some(warning) = &warning {
                write_tag(out, "[WARN]", Color::Yellow, warning)?;
            }
            write_tag(out, "[ OK ]", Color::Green, &summary)?;
            session.record(true, summary);
        }
        Err(e) => {
            write_tag(out, "[ERR ]", Color::Red, &e.to_string())?;
            session.record(false, e.to_string());
        }
    }
    Ok(())
}
