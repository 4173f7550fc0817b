//! LS-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `ls8-emu run <image>` - Run a program image until it halts
//! - `ls8-emu disasm <image>` - Disassemble a program image

use clap::{Parser, Subcommand};
use log::{debug, info, warn, LevelFilter};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ls8-emu")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of the LS-8 8-bit computer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the .ls8 image to execute
        program: String,
        /// Stop after this many instructions
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Log a trace line for every instruction (to stderr)
        #[arg(short, long)]
        trace: bool,
        /// Print the final machine state as JSON (to stderr)
        #[arg(short, long)]
        dump_state: bool,
    },
    /// Disassemble a program image to readable text
    Disasm {
        /// Path to the .ls8 image
        program: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Some(Commands::Run { trace: true, .. }));
    init_logging(trace);

    match cli.command {
        Some(Commands::Run { program, max_cycles, trace: _, dump_state }) => {
            run_program(&program, max_cycles, dump_state);
        }
        Some(Commands::Disasm { program }) => {
            disassemble_file(&program);
        }
        None => {
            println!("LS-8 Emulator v0.1.0");
            println!("An 8-bit computer emulator");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Logs go to stderr; `RUST_LOG` sets the filter, `--trace` overrides it
/// for this crate.
fn init_logging(trace: bool) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    );
    if trace {
        builder.filter_module("ls8", LevelFilter::Trace);
    }
    builder.init();
}

fn run_program(path: &str, max_cycles: Option<u64>, dump_state: bool) {
    use ls8::{load_image, Cpu};

    let image = match load_image(path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    };
    info!("loaded {} bytes from {}", image.len(), path);

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(&image.bytes) {
        eprintln!("Failed to load program: {}", e);
        std::process::exit(1);
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let handler_flag = interrupted.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    }) {
        warn!("could not install Ctrl-C handler: {}", e);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = cpu.run_until(&mut out, &interrupted, max_cycles);
    if let Err(e) = out.flush() {
        eprintln!("Failed to flush program output: {}", e);
        std::process::exit(1);
    }

    if dump_state {
        match serde_json::to_string_pretty(&cpu) {
            Ok(json) => eprintln!("{}", json),
            Err(e) => eprintln!("Failed to serialize machine state: {}", e),
        }
    }

    match result {
        Ok(cycles) => {
            info!("executed {} instructions", cycles);
            if cpu.is_running() {
                if interrupted.load(Ordering::Relaxed) {
                    eprintln!("Interrupted at PC={:#04x}", cpu.regs.pc);
                } else {
                    warn!("reached max cycles limit ({:?}) without halting", max_cycles);
                }
            }
        }
        Err(e) => {
            let pc = cpu.regs.pc;
            match image.line_of(pc) {
                Some(line) => eprintln!("CPU error at PC={:#04x} ({}:{}): {}", pc, path, line, e),
                None => eprintln!("CPU error at PC={:#04x}: {}", pc, e),
            }
            if let Some(instr) = cpu.last_instruction() {
                eprintln!("Last executed instruction: {}", instr);
            }
            for (addr, value) in cpu.mem.dump(pc, 3) {
                debug!("{:#04x}: {:08b}", addr, value);
            }
            std::process::exit(1);
        }
    }
}

fn disassemble_file(path: &str) {
    use ls8::{disassemble, load_image};

    let image = match load_image(path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    };

    print!("{}", disassemble(&image.bytes));
}
