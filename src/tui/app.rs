//! Debugger application state and logic.

use crate::asm::disasm::disassemble_instruction;
use crate::cpu::drum::{Address, Drum, TRACKS};
use crate::{Cpu, CpuConfig, DrumImage};
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Program image, reloaded on reset.
    pub image: DrumImage,
    /// Configuration the CPU was built with.
    pub config: CpuConfig,
    /// Breakpoints (by drum address).
    pub breakpoints: HashSet<Address>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Track shown in the drum view. `None` follows the counter.
    pub pinned_track: Option<u8>,
    /// Diagnostics raised since the last reset.
    pub diagnostic_count: u64,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(image: DrumImage, config: CpuConfig) -> Self {
        Self {
            cpu: Self::build_cpu(&image, config),
            image,
            config,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            pinned_track: None,
            diagnostic_count: 0,
        }
    }

    fn build_cpu(image: &DrumImage, config: CpuConfig) -> Cpu {
        let mut drum = Drum::new();
        image.load_into(&mut drum);
        Cpu::with_drum(drum, config)
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        match self.cpu.step() {
            Some(report) => {
                // The report carries the diagnostic; keep the CPU queue empty
                self.diagnostic_count += self.cpu.take_diagnostics().len() as u64;
                let disasm = disassemble_instruction(self.cpu.drum().peek(report.location));
                self.status = match report.diagnostic {
                    Some(diag) => format!("{}: {}  ({})", report.location, disasm, diag),
                    None => format!(
                        "{}: {}  +{} word-times",
                        report.location, disasm, report.ticks()
                    ),
                };
            }
            None => {
                self.status = format!("CPU halted: {:?}", self.cpu.state());
                self.running = false;
            }
        }
    }

    /// Run until halt or breakpoint.
    ///
    /// When resuming from a breakpoint, the order under it executes first.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
        if self.breakpoints.contains(&self.cpu.instruction_counter()) {
            self.step();
        }
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.cpu.is_running() {
            self.running = false;
            self.status = format!(
                "Halted after {} orders, {} word-times",
                self.cpu.steps(),
                self.cpu.total_ticks()
            );
            return;
        }

        let pc = self.cpu.instruction_counter();
        if self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at {}", pc);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at the current counter.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.instruction_counter();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at {}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at {}", pc);
        }
    }

    /// Reset the machine and reload the program.
    pub fn reset(&mut self) {
        self.cpu = Self::build_cpu(&self.image, self.config);
        self.running = false;
        self.diagnostic_count = 0;
        self.status = "Reset. Ready.".into();
    }

    /// Track shown in the drum view.
    pub fn visible_track(&self) -> u8 {
        self.pinned_track
            .unwrap_or_else(|| self.cpu.instruction_counter().track())
    }

    /// Move the drum view by `delta` tracks, pinning it.
    pub fn scroll_track(&mut self, delta: i32) {
        let track = (self.visible_track() as i32 + delta).rem_euclid(TRACKS as i32);
        self.pinned_track = Some(track as u8);
    }

    /// Get disassembly around the current counter.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(Address, String, bool)> {
        let pc = self.cpu.instruction_counter().value();
        let start = pc.saturating_sub(lines as u16 / 2);

        (0..lines as u16)
            .filter_map(|i| Address::new(start + i).ok())
            .map(|addr| {
                let disasm = disassemble_instruction(self.cpu.drum().peek(addr));
                (addr, disasm, addr.value() == pc)
            })
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(image: DrumImage, config: CpuConfig) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(image, config);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Char('f') => app.pinned_track = None,
                        KeyCode::Up => app.scroll_track(-1),
                        KeyCode::Down => app.scroll_track(1),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    #[test]
    fn test_breakpoint_stops_run() {
        let image = assemble("B 1.0\nH 1.1\nZ").unwrap();
        let mut app = DebuggerApp::new(image, CpuConfig::default());
        app.cpu.step();
        app.toggle_breakpoint();
        app.cpu.reset();

        app.run();
        for _ in 0..10 {
            app.tick();
        }

        assert!(!app.running);
        assert_eq!(app.cpu.instruction_counter().value(), 1);
        assert!(app.status.contains("Breakpoint"));
    }

    #[test]
    fn test_run_resumes_past_breakpoint() {
        let image = assemble("B 1.0\nH 1.1\nZ").unwrap();
        let mut app = DebuggerApp::new(image, CpuConfig::default());
        app.cpu.step();
        app.toggle_breakpoint();
        app.cpu.reset();

        app.run();
        for _ in 0..10 {
            app.tick();
        }
        assert_eq!(app.cpu.instruction_counter().value(), 1);

        app.run();
        for _ in 0..10 {
            app.tick();
        }
        assert!(!app.running);
        assert!(app.cpu.is_halted());
    }

    #[test]
    fn test_step_drains_cpu_diagnostics() {
        // Zero drum: every order is an unimplemented core order
        let mut app = DebuggerApp::new(DrumImage::new(), CpuConfig::default());

        app.run();
        for _ in 0..1000 {
            app.tick();
        }

        assert_eq!(app.diagnostic_count, 1000);
        assert!(app.cpu.take_diagnostics().is_empty());
        assert!(app.status.contains("not implemented"));

        app.reset();
        assert_eq!(app.diagnostic_count, 0);
    }

    #[test]
    fn test_reset_reloads_program() {
        let image = assemble("H 0.0\nZ").unwrap();
        let mut app = DebuggerApp::new(image, CpuConfig::default());
        app.step();
        assert_eq!(app.cpu.drum().peek(Address::ZERO).value(), 0);

        app.reset();
        assert_ne!(app.cpu.drum().peek(Address::ZERO).value(), 0);
        assert_eq!(app.cpu.total_ticks(), 0);
    }

    #[test]
    fn test_track_scroll_wraps() {
        let mut app = DebuggerApp::new(DrumImage::new(), CpuConfig::default());
        assert_eq!(app.visible_track(), 0);
        app.scroll_track(-1);
        assert_eq!(app.visible_track(), 63);
    }
}
