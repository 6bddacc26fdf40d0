//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::drum::{Address, SECTORS_PER_TRACK};
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(7),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: drum track and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(5),
        ])
        .split(chunks[1]);

    draw_track(frame, right_chunks[0], app);
    draw_help(frame, right_chunks[1]);
}

fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{}: {}", prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let cpu = &app.cpu;
    let acc = cpu.accumulator();

    let content = vec![
        Line::from(vec![
            Span::raw("A: "),
            Span::styled(format!("{}", acc), Style::default().fg(Color::White)),
            Span::raw(format!(" = {}", acc.value())),
        ]),
        Line::from(vec![
            Span::raw("C: "),
            Span::styled(format!("{}", cpu.instruction_counter()), Style::default().fg(Color::Yellow)),
            Span::raw("   Head: "),
            Span::styled(format!("{:02}", cpu.drum().head()), Style::default().fg(Color::Magenta)),
            Span::raw(format!("   Set: {:?}", cpu.instruction_set())),
        ]),
        Line::from(vec![
            Span::raw("Word-times: "),
            Span::styled(format!("{}", cpu.total_ticks()), Style::default().fg(Color::Cyan)),
            Span::raw(format!("   Orders: {}", cpu.steps())),
        ]),
        Line::from(vec![
            Span::raw("State: "),
            Span::styled(format!("{:?}", cpu.state()),
                if cpu.is_running() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                }),
            Span::raw(format!("   Diagnostics: {}", app.diagnostic_count)),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw one drum track, marking the sector under the head.
fn draw_track(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let track = app.visible_track();
    let head = app.cpu.drum().head();
    let pc = app.cpu.instruction_counter();
    let visible_rows = (area.height as usize).saturating_sub(2);

    // Keep the head in view
    let first = (head as usize).saturating_sub(visible_rows / 2)
        .min(SECTORS_PER_TRACK.saturating_sub(visible_rows));

    let items: Vec<ListItem> = (first..(first + visible_rows).min(SECTORS_PER_TRACK))
        .filter_map(|sector| Address::from_parts(track, sector as u8).ok())
        .map(|addr| {
            let value = app.cpu.drum().peek(addr);
            let marker = if addr.sector() == head { "◀ head" } else { "" };
            let text = format!("{}: {} {:>12} {}", addr, value, value.value(), marker);

            let style = if addr == pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if addr.sector() == head {
                Style::default().fg(Color::Magenta)
            } else if !value.is_zero() {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let title = match app.pinned_track {
        Some(_) => format!(" Drum track {:02} (pinned) ", track),
        None => format!(" Drum track {:02} ", track),
    };
    let list = List::new(items)
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓: Track  f: Follow  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
