//! Telnet Canvas Headless Runner
//!
//! Replays a captured client byte stream through a terminal and prints the
//! resulting state. Useful for checking how a real client's negotiation and
//! key traffic decode, including across segment boundaries.

use std::io::{self, Read};
use std::process::ExitCode;

use telnet_canvas::{Config, Snapshot, Terminal};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = Config::load_or_default();
    let mut chunk = 0usize;
    let mut input_file: Option<String> = None;
    let mut output_format = OutputFormat::Summary;
    let mut show_help = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--cols" => {
                i += 1;
                if i < args.len() {
                    config.canvas.columns = args[i].parse().unwrap_or(config.canvas.columns);
                }
            },
            "-r" | "--rows" => {
                i += 1;
                if i < args.len() {
                    config.canvas.rows = args[i].parse().unwrap_or(config.canvas.rows);
                }
            },
            "-n" | "--chunk" => {
                i += 1;
                if i < args.len() {
                    chunk = args[i].parse().unwrap_or(0);
                }
            },
            "-f" | "--file" => {
                i += 1;
                if i < args.len() {
                    input_file = Some(args[i].clone());
                }
            },
            "-j" | "--json" => {
                output_format = OutputFormat::Json;
            },
            "-t" | "--text" => {
                output_format = OutputFormat::Text;
            },
            "-h" | "--help" => {
                show_help = true;
            },
            _ => {
                if input_file.is_none() && !args[i].starts_with('-') {
                    input_file = Some(args[i].clone());
                }
            },
        }
        i += 1;
    }

    if show_help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let input_data = match &input_file {
        Some(path) => match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path, e);
                return ExitCode::FAILURE;
            },
        },
        None => {
            let mut data = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut data) {
                eprintln!("Error reading stdin: {}", e);
                return ExitCode::FAILURE;
            }
            data
        },
    };

    let mut terminal = Terminal::from_config(&config, None);
    let chunk = if chunk == 0 { input_data.len().max(1) } else { chunk };
    for segment in input_data.chunks(chunk) {
        terminal.parse(segment);
    }

    match output_format {
        OutputFormat::Summary => print_summary(&terminal),
        OutputFormat::Text => {
            print!("{}", Snapshot::from_canvas(terminal.canvas()).to_text());
        },
        OutputFormat::Json => match Snapshot::from_canvas(terminal.canvas()).to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing snapshot: {}", e);
                return ExitCode::FAILURE;
            },
        },
    }

    ExitCode::SUCCESS
}

#[derive(Clone, Copy)]
enum OutputFormat {
    Summary,
    Text,
    Json,
}

fn print_summary(terminal: &Terminal) {
    let canvas = terminal.canvas();
    let keyboard = terminal.keyboard();
    println!("Canvas: {}x{}", canvas.width(), canvas.height());
    println!("NAWS: {}", if terminal.will_naws() { "yes" } else { "no" });

    let letters: String = ('a'..='z').filter(|&c| keyboard.letter(c)).collect();
    let digits: String = (0..10u8)
        .filter(|&d| keyboard.digit(d))
        .map(|d| char::from(b'0' + d))
        .collect();
    println!("Letters: {}", letters);
    println!("Digits: {}", digits);
    println!("Keys: {:?}", keyboard.flags());
    println!("Directional: {:?}", terminal.directional_input(true));
}

fn print_help() {
    println!("Telnet Canvas Headless Runner");
    println!();
    println!("Usage: telnet-canvas-headless [OPTIONS] [INPUT_FILE]");
    println!();
    println!("Options:");
    println!("  -c, --cols <N>     Initial canvas width (default: 80)");
    println!("  -r, --rows <N>     Initial canvas height (default: 25)");
    println!("  -n, --chunk <N>    Feed the input in reads of N bytes (default: all at once)");
    println!("  -f, --file <PATH>  Read input from file");
    println!("  -j, --json         Print the canvas snapshot as JSON");
    println!("  -t, --text         Print the canvas glyphs as text");
    println!("  -h, --help         Show this help message");
    println!();
    println!("Without -j or -t, prints the canvas size and keyboard state.");
    println!("If no input file is specified, reads from stdin.");
    println!();
    println!("Examples:");
    println!("  printf '\\xff\\xfa\\x1f\\x00\\x78\\x00\\x28\\xff\\xf0wasd' | telnet-canvas-headless");
    println!("  telnet-canvas-headless --chunk 1 capture.bin");
}
