//! The command drivers. Each one parses its own arguments, does its work
//! against a [`CommandIo`] and returns the process exit status.

pub mod diff;
pub mod find;
pub mod grep;

use clap::Parser;
use std::fmt::Display;
use std::io::{Read, Write};

pub const COMMANDS: &[&str] = &["diff", "find", "grep"];

/// Standard streams handed to a command.
pub struct CommandIo<'a> {
    pub stdin: &'a mut dyn Read,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
    /// Whether stdout is an interactive terminal.
    pub stdout_is_tty: bool,
}

impl<'a> CommandIo<'a> {
    pub fn new(
        stdin: &'a mut dyn Read,
        stdout: &'a mut dyn Write,
        stderr: &'a mut dyn Write,
    ) -> Self {
        Self {
            stdin,
            stdout,
            stderr,
            stdout_is_tty: false,
        }
    }

    pub fn with_tty(mut self, stdout_is_tty: bool) -> Self {
        self.stdout_is_tty = stdout_is_tty;
        self
    }

    /// Writes `command: message` to stderr. Failures to write are ignored,
    /// there is nowhere left to report them.
    pub fn report(&mut self, command: &str, message: impl Display) {
        let _ = writeln!(self.stderr, "{}: {}", command, message);
    }
}

/// Runs `name` with `argv` (program name first). Returns `None` when no
/// command has that name.
pub fn run(name: &str, argv: Vec<String>, io: &mut CommandIo<'_>) -> Option<i32> {
    let code = match name {
        "grep" => match parse_args::<grep::GrepArgs>(&argv, io) {
            Ok(args) => grep::run(args, io),
            Err(code) => code,
        },
        "diff" => match parse_args::<diff::DiffArgs>(&argv, io) {
            Ok(args) => diff::run(args, io),
            Err(code) => code,
        },
        "find" => match find::FindArgs::parse_from(argv.into_iter().skip(1)) {
            Ok(args) => find::run(args, io),
            Err(e) => {
                io.report("find", &e);
                e.exit_code()
            }
        },
        _ => return None,
    };
    let _ = io.stdout.flush();
    Some(code)
}

/// Parses `argv` with clap. Help output goes to stdout with status 0, usage
/// errors to stderr with status 2.
fn parse_args<P: Parser>(argv: &[String], io: &mut CommandIo<'_>) -> Result<P, i32> {
    P::try_parse_from(argv).map_err(|e| {
        let target: &mut dyn Write = if e.use_stderr() {
            &mut *io.stderr
        } else {
            &mut *io.stdout
        };
        let _ = write!(target, "{}", e);
        e.exit_code()
    })
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_unknown_command() {
        let mut input: &[u8] = b"";
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut io = CommandIo::new(&mut input, &mut out, &mut err);
        assert_eq!(run("ls", vec!["ls".into()], &mut io), None);
    }

    #[test]
    fn test_help_goes_to_stdout() {
        let result = run_cmd("diff", &["--help"]);
        assert_eq!(result.code, 0);
        assert!(result.stdout.contains("Usage"));
        assert!(result.stderr.is_empty());
    }

    #[test]
    fn test_bad_option_is_usage_error() {
        let result = run_cmd("diff", &["--bogus", "a", "b"]);
        assert_eq!(result.code, 2);
        assert!(result.stdout.is_empty());
        assert!(!result.stderr.is_empty());
    }
}
