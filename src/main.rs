//! LGP-30 Emulator - CLI Entry Point
//!
//! Commands:
//! - `lgp30-emu run <program>` - Run a drum image or ASM file
//! - `lgp30-emu debug <program>` - Interactive debugger
//! - `lgp30-emu asm <source>` - Assemble to a drum image
//! - `lgp30-emu disasm <image>` - Disassemble a drum image

use clap::{Args, Parser, Subcommand};
use lgp30::{CpuConfig, DrumImage, InstructionSet};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lgp30-emu")]
#[command(version = "0.1.0")]
#[command(about = "A timing-accurate emulator of the LGP-30 drum memory computer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Machine options shared by `run` and `debug`.
#[derive(Args)]
struct MachineArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,
    /// Execute the full arithmetic/transfer order set
    #[arg(short, long)]
    extended: bool,
    /// Initial instruction counter (0-4095)
    #[arg(short, long)]
    start: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it stops
    Run {
        /// Path to the drum image or ASM file to execute
        program: String,
        /// Maximum number of orders to run
        #[arg(short, long, default_value = "100000")]
        max_steps: u64,
        /// Print every order with its timing
        #[arg(short, long)]
        trace: bool,
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// Interactive debugger
    Debug {
        /// Path to the drum image or ASM file to debug
        program: String,
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// Assemble source to a drum image
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a drum image to readable text
    Disasm {
        /// Path to the drum image
        image: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    if let Some(directive) = log_directive(&cli.command) {
        init_logging(directive);
    }

    match cli.command {
        Some(Commands::Run { program, max_steps, trace, machine }) => {
            run_program(&program, max_steps, trace, &machine);
        }
        Some(Commands::Debug { program, machine }) => {
            debug_program(&program, &machine);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(&image);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("LGP-30 Emulator v0.1.0");
            println!("A drum memory computer emulator");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Default log filter for a command, or `None` to stay silent.
///
/// The debugger owns the terminal; its status line shows diagnostics.
/// `run --trace` prints its own listing, so it keeps the quiet default.
fn log_directive(command: &Option<Commands>) -> Option<&'static str> {
    match command {
        Some(Commands::Debug { .. }) => None,
        _ => Some("warn"),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `directive`).
fn init_logging(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

/// Build the machine configuration: file first, then flags on top.
fn machine_config(args: &MachineArgs) -> CpuConfig {
    let mut config = match &args.config {
        Some(path) => CpuConfig::load(path)
            .unwrap_or_else(|e| fail(format!("Failed to load config: {}", e))),
        None => CpuConfig::default(),
    };
    if args.extended {
        config.instruction_set = InstructionSet::Extended;
    }
    if let Some(start) = args.start {
        config.start = lgp30::Address::new(start)
            .unwrap_or_else(|e| fail(format!("Invalid start address: {}", e)));
    }
    config
}

/// Load a program (either drum image or ASM).
fn load_program(path: &str) -> DrumImage {
    use lgp30::{assemble, load_image};

    let image = if path.ends_with(".asm") {
        let source = std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("Failed to read file: {}", e)));
        let image = assemble(&source).unwrap_or_else(|e| fail(format!("Assembly error: {}", e)));
        println!("📝 Assembled {} words", image.len());
        image
    } else {
        let image = load_image(path)
            .unwrap_or_else(|e| fail(format!("Failed to load drum image: {}", e)));
        println!("📂 Loaded {} words", image.len());
        image
    };

    if image.is_empty() {
        fail("No words to execute");
    }
    image
}

fn run_program(path: &str, max_steps: u64, trace: bool, machine: &MachineArgs) {
    use lgp30::asm::disasm::disassemble_instruction;
    use lgp30::{Cpu, Drum};

    println!("🔧 Running: {}", path);
    let image = load_program(path);
    let config = machine_config(machine);

    let mut drum = Drum::new();
    image.load_into(&mut drum);
    let mut cpu = Cpu::with_drum(drum, config);

    println!();
    println!("━━━ Execution ━━━");

    let mut steps = 0u64;
    let mut diagnostics = 0u64;
    while steps < max_steps {
        let Some(report) = cpu.step() else { break };
        steps += 1;
        if report.diagnostic.is_some() {
            diagnostics += 1;
        }
        if trace {
            let disasm = disassemble_instruction(cpu.drum().peek(report.location));
            println!(
                "{}: {:<8}  A={} (+{}+{} wt, head {:02})",
                report.location,
                disasm,
                cpu.accumulator(),
                report.fetch_ticks,
                report.execute_ticks,
                cpu.drum().head()
            );
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Orders:       {}", steps);
    println!("Word-times:   {}", cpu.total_ticks());
    println!("State:        {:?}", cpu.state());
    println!("A:            {} ({})", cpu.accumulator(), cpu.accumulator().value());
    println!("C:            {}", cpu.instruction_counter());
    println!("Diagnostics:  {}", diagnostics);

    if steps >= max_steps && cpu.is_running() {
        println!();
        println!("⚠️  Reached max steps limit ({}). Use --max-steps to increase.", max_steps);
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, machine: &MachineArgs) {
    use lgp30::tui::run_debugger;

    println!("🔍 Loading: {}", path);
    let image = load_program(path);
    let config = machine_config(machine);

    println!("🚀 Launching debugger...");
    println!();

    if let Err(e) = run_debugger(image, config) {
        fail(format!("Debugger error: {}", e));
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str, _machine: &MachineArgs) {
    fail("This build has no debugger; rebuild with the `tui` feature");
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use lgp30::{assemble, save_image};

    let out_path = output.unwrap_or_else(|| source_path.replace(".asm", ".drum"));

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let source = std::fs::read_to_string(source_path)
        .unwrap_or_else(|e| fail(format!("Failed to read file: {}", e)));
    let image = assemble(&source).unwrap_or_else(|e| fail(format!("Assembly error: {}", e)));

    println!("✓ Assembled {} words", image.len());

    if let Err(e) = save_image(&out_path, &image) {
        fail(format!("Failed to save drum image: {}", e));
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(image_path: &str) {
    use lgp30::{disassemble, load_image};

    println!("📖 Disassembling: {}", image_path);
    println!();

    let image = load_image(image_path)
        .unwrap_or_else(|e| fail(format!("Failed to load drum image: {}", e)));

    println!("{}", disassemble(&image));
}

fn run_self_test() {
    use lgp30::cpu::drum::rotational_latency;
    use lgp30::{assemble, Cpu, Diagnostic, Drum, Word};

    println!("━━━ LGP-30 Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;
    let mut check = |name: &str, ok: bool| {
        if ok {
            println!("{}... ✓", name);
            passed += 1;
        } else {
            println!("{}... ✗", name);
            failed += 1;
        }
    };

    check(
        "Latency wraps around the drum",
        rotational_latency(0, 63) == 63 && rotational_latency(63, 0) == 1,
    );

    let mut drum = Drum::new();
    let head = drum.head();
    for _ in 0..64 {
        drum.tick();
    }
    check("64 ticks close one revolution", drum.head() == head);

    let mut cpu = Cpu::new();
    cpu.poke(3, 5, Word::new(0xABCD));
    cpu.poke(0, 0, Word::instruction(0x1, 197));
    cpu.step();
    check(
        "Bring loads the accumulator",
        cpu.accumulator() == Word::new(0xABCD) && cpu.instruction_counter().value() == 1,
    );

    let mut cpu = Cpu::new();
    cpu.poke(0, 0, Word::instruction(0x5, 0));
    let report = cpu.step();
    check(
        "Unimplemented order is a reported no-op",
        matches!(
            report.and_then(|r| r.diagnostic),
            Some(Diagnostic::UnimplementedInstruction { .. })
        ),
    );

    let ok = match assemble("B 3.5\nH 1.0\nZ") {
        Ok(image) => {
            let mut drum = Drum::new();
            image.load_into(&mut drum);
            let mut cpu = Cpu::with_drum(drum, CpuConfig::default());
            cpu.run(10);
            cpu.is_halted()
        }
        Err(_) => false,
    };
    check("Assembled program stops", ok);

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive_for(args: &[&str]) -> Option<&'static str> {
        let cli = Cli::try_parse_from(args).unwrap();
        log_directive(&cli.command)
    }

    #[test]
    fn test_debugger_installs_no_logger() {
        assert_eq!(directive_for(&["lgp30-emu", "debug", "prog.drum"]), None);
    }

    #[test]
    fn test_trace_keeps_default_filter() {
        assert_eq!(directive_for(&["lgp30-emu", "run", "--trace", "prog.drum"]), Some("warn"));
        assert_eq!(directive_for(&["lgp30-emu", "run", "prog.drum"]), Some("warn"));
        assert_eq!(directive_for(&["lgp30-emu"]), Some("warn"));
    }
}
