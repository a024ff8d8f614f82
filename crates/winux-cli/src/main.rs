use anyhow::{bail, Context, Result};
use log::debug;
use std::env;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process;
use winux_core::commands::{self, CommandIo, COMMANDS};

fn print_usage() {
    println!("Usage: winux COMMAND [ARGS]...");
    println!("       COMMAND [ARGS]...   (when installed under the command's name)");
    println!();
    println!("Commands: {}", COMMANDS.join(", "));
}

/// Command name from the executable name, without directories or `.exe`.
fn invoked_as(argv0: &str) -> String {
    let name = Path::new(argv0)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => name,
    }
}

/// Splits argv into the command to run and that command's own argv.
fn resolve(args: Vec<String>) -> Result<Option<(String, Vec<String>)>> {
    let argv0 = args.first().map(|a| invoked_as(a)).unwrap_or_default();
    if COMMANDS.contains(&argv0.as_str()) {
        return Ok(Some((argv0, args)));
    }

    let rest: Vec<String> = args.into_iter().skip(1).collect();
    match rest.first().map(String::as_str) {
        None | Some("-h") | Some("--help") => Ok(None),
        Some(name) if COMMANDS.contains(&name) => Ok(Some((name.to_string(), rest))),
        Some(name) => bail!("unknown command '{}'", name),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let (name, argv) = match resolve(args) {
        Ok(Some(found)) => found,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("winux: {}", e);
            print_usage();
            process::exit(2);
        }
    };
    debug!("running {} with {} argument(s)", name, argv.len() - 1);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut input = stdin.lock();
    let mut output = BufWriter::new(stdout.lock());
    let mut errors = stderr.lock();

    let code = {
        let mut cmd_io = CommandIo::new(&mut input, &mut output, &mut errors)
            .with_tty(atty::is(atty::Stream::Stdout));
        commands::run(&name, argv, &mut cmd_io).unwrap_or(2)
    };
    output.flush().context("failed to flush stdout")?;
    process::exit(code);
}
