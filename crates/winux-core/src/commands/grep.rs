//! `grep`: print records that match patterns.

use super::CommandIo;
use crate::error::{Error, Result};
use crate::matcher::LineMatcher;
use crate::records::{self, Record, RecordReader};
use crate::types::{MatchOptions, MatchSpan, PatternMode};
use clap::{ArgAction, Parser, ValueEnum};
use log::{debug, info, trace};
use std::fs::File;
use std::io::{self, Read, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const STDIN_NAME: &str = "(standard input)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DirectoryAction {
    #[default]
    Read,
    Recurse,
    Skip,
}

#[derive(Debug, Parser)]
#[command(
    name = "grep",
    about = "Search for PATTERNS in each FILE.",
    override_usage = "grep [OPTION]... PATTERNS [FILE]...",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct GrepArgs {
    /// PATTERNS are extended regular expressions
    #[arg(short = 'E', long = "extended-regexp")]
    pub extended_regexp: bool,

    /// PATTERNS are strings
    #[arg(short = 'F', long = "fixed-strings")]
    pub fixed_strings: bool,

    /// PATTERNS are basic regular expressions
    #[arg(short = 'G', long = "basic-regexp")]
    pub basic_regexp: bool,

    #[arg(short = 'P', long = "perl-regexp", hide = true)]
    pub perl_regexp: bool,

    /// use PATTERNS for matching
    #[arg(short = 'e', long = "regexp", value_name = "PATTERNS")]
    pub regexp: Vec<String>,

    /// take PATTERNS from FILE
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Vec<PathBuf>,

    /// ignore case distinctions in patterns and data
    #[arg(short = 'i', long = "ignore-case")]
    pub ignore_case: bool,

    /// do not ignore case distinctions (default)
    #[arg(long = "no-ignore-case")]
    pub no_ignore_case: bool,

    /// match only whole words
    #[arg(short = 'w', long = "word-regexp")]
    pub word_regexp: bool,

    /// match only whole lines
    #[arg(short = 'x', long = "line-regexp")]
    pub line_regexp: bool,

    /// a data line ends in 0 byte, not newline
    #[arg(short = 'z', long = "null-data")]
    pub null_data: bool,

    /// suppress error messages
    #[arg(short = 's', long = "no-messages")]
    pub no_messages: bool,

    /// select non-matching lines
    #[arg(short = 'v', long = "invert-match")]
    pub invert_match: bool,

    /// stop after NUM selected lines
    #[arg(short = 'm', long = "max-count", value_name = "NUM")]
    pub max_count: Option<usize>,

    /// print the byte offset with output lines
    #[arg(short = 'b', long = "byte-offset")]
    pub byte_offset: bool,

    /// print line number with output lines
    #[arg(short = 'n', long = "line-number")]
    pub line_number: bool,

    /// flush output on every line
    #[arg(long = "line-buffered")]
    pub line_buffered: bool,

    /// print file name with output lines
    #[arg(short = 'H', long = "with-filename")]
    pub with_filename: bool,

    /// suppress the file name prefix on output
    #[arg(short = 'h', long = "no-filename")]
    pub no_filename: bool,

    /// use LABEL as the standard input file name prefix
    #[arg(long = "label", value_name = "LABEL")]
    pub label: Option<String>,

    /// show only nonempty parts of lines that match
    #[arg(short = 'o', long = "only-matching")]
    pub only_matching: bool,

    /// suppress all normal output
    #[arg(short = 'q', long = "quiet", alias = "silent")]
    pub quiet: bool,

    /// how to handle directories
    #[arg(short = 'd', long = "directories", value_name = "ACTION", value_enum)]
    pub directories: Option<DirectoryAction>,

    /// like --directories=recurse
    #[arg(short = 'r', long = "recursive")]
    pub recursive: bool,

    /// print only names of FILEs with no selected lines
    #[arg(short = 'L', long = "files-without-match")]
    pub files_without_match: bool,

    /// print only names of FILEs with selected lines
    #[arg(short = 'l', long = "files-with-matches")]
    pub files_with_matches: bool,

    /// print only a count of selected lines per FILE
    #[arg(short = 'c', long = "count")]
    pub count: bool,

    /// print 0 byte after FILE name
    #[arg(short = 'Z', long = "null")]
    pub null: bool,

    #[arg(long = "binary-files", value_name = "TYPE", hide = true)]
    pub binary_files: Option<String>,

    #[arg(short = 'a', long = "text", hide = true)]
    pub text: bool,

    #[arg(short = 'I', hide = true)]
    pub ignore_binary: bool,

    #[arg(short = 'D', long = "devices", value_name = "ACTION", hide = true)]
    pub devices: Option<String>,

    #[arg(short = 'R', long = "dereference-recursive", hide = true)]
    pub dereference_recursive: bool,

    #[arg(long = "include", value_name = "GLOB", hide = true)]
    pub include: Vec<String>,

    #[arg(long = "exclude", value_name = "GLOB", hide = true)]
    pub exclude: Vec<String>,

    #[arg(long = "exclude-from", value_name = "FILE", hide = true)]
    pub exclude_from: Vec<String>,

    #[arg(long = "exclude-dir", value_name = "GLOB", hide = true)]
    pub exclude_dir: Vec<String>,

    #[arg(short = 'T', long = "initial-tab", hide = true)]
    pub initial_tab: bool,

    #[arg(short = 'B', long = "before-context", value_name = "NUM", hide = true)]
    pub before_context: Option<usize>,

    #[arg(short = 'A', long = "after-context", value_name = "NUM", hide = true)]
    pub after_context: Option<usize>,

    #[arg(short = 'C', long = "context", value_name = "NUM", hide = true)]
    pub context: Option<usize>,

    #[arg(long = "group-separator", value_name = "SEP", hide = true)]
    pub group_separator: Option<String>,

    #[arg(long = "no-group-separator", hide = true)]
    pub no_group_separator: bool,

    #[arg(
        long = "color",
        alias = "colour",
        value_name = "WHEN",
        num_args = 0..=1,
        default_missing_value = "auto",
        hide = true
    )]
    pub color: Option<String>,

    #[arg(short = 'U', long = "binary", hide = true)]
    pub binary: bool,

    /// display this help text and exit
    #[arg(long = "help", action = ArgAction::Help)]
    pub help: Option<bool>,

    /// PATTERNS (unless given with -e or -f) followed by FILEs
    #[arg(value_name = "PATTERNS [FILE]")]
    pub operands: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Lines,
    Count,
    FilesWithMatches,
    FilesWithoutMatch,
}

/// Everything a search needs once the arguments are validated.
#[derive(Debug)]
pub struct Config {
    pub matcher: LineMatcher,
    pub invert: bool,
    pub null_data: bool,
    pub no_messages: bool,
    pub max_count: Option<usize>,
    pub byte_offset: bool,
    pub line_number: bool,
    pub line_buffered: bool,
    pub with_filename: Option<bool>,
    pub label: Option<String>,
    pub only_matching: bool,
    pub quiet: bool,
    pub directories: DirectoryAction,
    pub output: OutputMode,
    pub null_after_name: bool,
    pub files: Vec<String>,
}

impl Config {
    fn delimiter(&self) -> u8 {
        if self.null_data {
            b'\0'
        } else {
            b'\n'
        }
    }
}

impl GrepArgs {
    /// The first option given that this grep recognises but does not
    /// implement.
    pub fn unsupported(&self) -> Option<&'static str> {
        let checks: [(bool, &'static str); 18] = [
            (self.perl_regexp, "-P"),
            (self.binary_files.is_some(), "--binary-files"),
            (self.text, "-a"),
            (self.ignore_binary, "-I"),
            (self.devices.is_some(), "-D"),
            (self.dereference_recursive, "-R"),
            (!self.include.is_empty(), "--include"),
            (!self.exclude.is_empty(), "--exclude"),
            (!self.exclude_from.is_empty(), "--exclude-from"),
            (!self.exclude_dir.is_empty(), "--exclude-dir"),
            (self.initial_tab, "-T"),
            (self.before_context.is_some(), "-B"),
            (self.after_context.is_some(), "-A"),
            (self.context.is_some(), "-C"),
            (self.group_separator.is_some(), "--group-separator"),
            (self.no_group_separator, "--no-group-separator"),
            (self.color.is_some(), "--color"),
            (self.binary, "-U"),
        ];
        checks
            .into_iter()
            .find_map(|(given, name)| given.then_some(name))
    }

    fn mode(&self) -> PatternMode {
        if self.basic_regexp {
            PatternMode::BasicRegex
        } else if self.extended_regexp {
            PatternMode::ExtendedRegex
        } else if self.fixed_strings {
            PatternMode::Fixed
        } else {
            PatternMode::BasicRegex
        }
    }

    fn output_mode(&self) -> OutputMode {
        if self.files_with_matches {
            OutputMode::FilesWithMatches
        } else if self.files_without_match {
            OutputMode::FilesWithoutMatch
        } else if self.count {
            OutputMode::Count
        } else {
            OutputMode::Lines
        }
    }

    /// Validates the arguments and compiles the patterns. `stdin` serves
    /// `-f -`.
    pub fn into_config(self, stdin: &mut dyn Read) -> Result<Config> {
        if let Some(option) = self.unsupported() {
            return Err(Error::Unsupported(option.to_string()));
        }

        let mut operands = self.operands.clone().into_iter();
        let mut patterns: Vec<String> = Vec::new();
        for given in &self.regexp {
            patterns.extend(given.split('\n').map(str::to_string));
        }
        for path in &self.file {
            let data = if path.as_os_str() == "-" {
                let mut data = Vec::new();
                stdin
                    .read_to_end(&mut data)
                    .map_err(|e| Error::io(path, e))?;
                data
            } else {
                records::read_file(path)?
            };
            patterns.extend(
                records::split(&data, b'\n')
                    .into_iter()
                    .map(|p| String::from_utf8_lossy(p).into_owned()),
            );
        }
        if self.regexp.is_empty() && self.file.is_empty() {
            let first = operands
                .next()
                .ok_or_else(|| Error::MissingOperand(String::new()))?;
            patterns.extend(first.split('\n').map(str::to_string));
        }

        let options = MatchOptions {
            mode: self.mode(),
            ignore_case: self.ignore_case && !self.no_ignore_case,
            word_regexp: self.word_regexp,
            line_regexp: self.line_regexp,
        };
        debug!("{} pattern(s), {:?}", patterns.len(), options);
        let matcher = LineMatcher::new(&patterns, options)?;

        let directories = if self.recursive {
            DirectoryAction::Recurse
        } else {
            self.directories.unwrap_or_default()
        };
        let mut files: Vec<String> = operands.collect();
        if files.is_empty() {
            files.push(if directories == DirectoryAction::Recurse {
                ".".to_string()
            } else {
                "-".to_string()
            });
        }

        let with_filename = if self.with_filename {
            Some(true)
        } else if self.no_filename {
            Some(false)
        } else {
            None
        };

        Ok(Config {
            matcher,
            invert: self.invert_match,
            null_data: self.null_data,
            no_messages: self.no_messages,
            max_count: self.max_count,
            byte_offset: self.byte_offset,
            line_number: self.line_number,
            line_buffered: self.line_buffered,
            with_filename,
            label: self.label.clone(),
            only_matching: self.only_matching,
            quiet: self.quiet,
            directories,
            output: self.output_mode(),
            null_after_name: self.null,
            files,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Stdin,
    Path(PathBuf),
}

impl Input {
    fn display_name(&self, label: Option<&str>) -> String {
        match self {
            Input::Stdin => label.unwrap_or(STDIN_NAME).to_string(),
            Input::Path(path) => path.display().to_string(),
        }
    }
}

struct Search<'c, 'io, 'a> {
    config: &'c Config,
    io: &'io mut CommandIo<'a>,
    had_error: bool,
    any_selected: bool,
}

impl<'c, 'io, 'a> Search<'c, 'io, 'a> {
    fn report(&mut self, error: &Error) {
        self.had_error = true;
        if !self.config.no_messages {
            self.io.report("grep", error);
        }
    }

    /// Expands the operands into the inputs to scan, in order.
    fn collect_inputs(&mut self) -> Vec<Input> {
        let mut inputs = Vec::new();
        for name in &self.config.files {
            if name == "-" {
                inputs.push(Input::Stdin);
                continue;
            }
            let path = Path::new(name);
            if !path.is_dir() {
                inputs.push(Input::Path(path.to_path_buf()));
                continue;
            }
            match self.config.directories {
                DirectoryAction::Read => inputs.push(Input::Path(path.to_path_buf())),
                DirectoryAction::Skip => debug!("skipping directory {:?}", path),
                DirectoryAction::Recurse => {
                    for entry in WalkDir::new(path).sort_by_file_name() {
                        match entry {
                            Ok(entry) if entry.file_type().is_file() => {
                                inputs.push(Input::Path(entry.into_path()))
                            }
                            Ok(_) => {}
                            Err(e) => {
                                let at = e.path().unwrap_or(path).to_path_buf();
                                self.report(&Error::io(at, io::Error::from(e)));
                            }
                        }
                    }
                }
            }
        }
        inputs
    }

    fn run(&mut self) -> io::Result<()> {
        let inputs = self.collect_inputs();
        let show_name = self.config.with_filename.unwrap_or(
            inputs.len() > 1 || self.config.directories == DirectoryAction::Recurse,
        );
        info!("searching {} input(s)", inputs.len());

        for input in &inputs {
            let name = input.display_name(self.config.label.as_deref());
            let selected = match input {
                Input::Stdin => scan(
                    self.config,
                    &mut *self.io.stdin,
                    &mut *self.io.stdout,
                    show_name.then_some(name.as_str()),
                    self.config.line_buffered || self.io.stdout_is_tty,
                ),
                Input::Path(path) => {
                    if path.is_dir() {
                        self.report(&Error::IsDirectory { path: path.clone() });
                        continue;
                    }
                    let mut file = match File::open(path) {
                        Ok(file) => file,
                        Err(e) => {
                            self.report(&Error::io(path, e));
                            continue;
                        }
                    };
                    scan(
                        self.config,
                        &mut file,
                        &mut *self.io.stdout,
                        show_name.then_some(name.as_str()),
                        self.config.line_buffered || self.io.stdout_is_tty,
                    )
                }
            };
            let selected = match selected {
                Ok(n) => n,
                Err(ScanError::Read(e)) => {
                    self.report(&Error::io(&name, e));
                    continue;
                }
                Err(ScanError::Write(e)) => return Err(e),
            };
            trace!("{}: {} selected", name, selected);
            self.any_selected |= selected > 0;

            if self.config.quiet {
                if self.any_selected {
                    break;
                }
                continue;
            }
            self.write_summary(&name, show_name, selected)?;
        }
        Ok(())
    }

    fn write_summary(&mut self, name: &str, show_name: bool, selected: usize) -> io::Result<()> {
        let out = &mut *self.io.stdout;
        let name_end: &[u8] = if self.config.null_after_name {
            b"\0"
        } else {
            b"\n"
        };
        match self.config.output {
            OutputMode::Lines => {}
            OutputMode::Count => {
                if show_name {
                    write!(out, "{}:", name)?;
                }
                writeln!(out, "{}", selected)?;
            }
            OutputMode::FilesWithMatches if selected > 0 => {
                out.write_all(name.as_bytes())?;
                out.write_all(name_end)?;
            }
            OutputMode::FilesWithoutMatch if selected == 0 => {
                out.write_all(name.as_bytes())?;
                out.write_all(name_end)?;
            }
            OutputMode::FilesWithMatches | OutputMode::FilesWithoutMatch => {}
        }
        Ok(())
    }
}

#[derive(Debug)]
enum ScanError {
    Read(io::Error),
    Write(io::Error),
}

/// Scans one input, printing selected records when the output mode asks for
/// them. Returns the number of selected records.
fn scan(
    config: &Config,
    reader: &mut dyn Read,
    out: &mut dyn Write,
    name: Option<&str>,
    flush_each: bool,
) -> std::result::Result<usize, ScanError> {
    if config.max_count == Some(0) {
        return Ok(0);
    }
    let mut selected = 0usize;
    let mut write_error: Option<io::Error> = None;

    RecordReader::new(reader, config.delimiter())
        .for_each_record(|record| {
            let spans = config.matcher.find_matches(record.bytes);
            if spans.is_empty() != config.invert {
                return ControlFlow::Continue(());
            }
            selected += 1;
            match config.output {
                _ if config.quiet => return ControlFlow::Break(()),
                OutputMode::FilesWithMatches | OutputMode::FilesWithoutMatch => {
                    return ControlFlow::Break(())
                }
                OutputMode::Lines => {
                    let written = emit(config, out, name, &record, &spans).and_then(|()| {
                        if flush_each {
                            out.flush()
                        } else {
                            Ok(())
                        }
                    });
                    if let Err(e) = written {
                        write_error = Some(e);
                        return ControlFlow::Break(());
                    }
                }
                OutputMode::Count => {}
            }
            if config.max_count.is_some_and(|max| selected >= max) {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        })
        .map_err(ScanError::Read)?;

    match write_error {
        Some(e) => Err(ScanError::Write(e)),
        None => Ok(selected),
    }
}

fn write_prefix(
    config: &Config,
    out: &mut dyn Write,
    name: Option<&str>,
    line_no: usize,
    offset: u64,
) -> io::Result<()> {
    if let Some(name) = name {
        write!(out, "{}:", name)?;
    }
    if config.line_number {
        write!(out, "{}:", line_no)?;
    }
    if config.byte_offset {
        write!(out, "{}:", offset)?;
    }
    Ok(())
}

fn emit(
    config: &Config,
    out: &mut dyn Write,
    name: Option<&str>,
    record: &Record<'_>,
    spans: &[MatchSpan],
) -> io::Result<()> {
    let end = [config.delimiter()];
    if config.only_matching && !config.invert {
        for span in spans.iter().filter(|span| !span.is_empty()) {
            write_prefix(
                config,
                out,
                name,
                record.line_no,
                record.offset + span.begin as u64,
            )?;
            out.write_all(&record.bytes[span.begin..span.end])?;
            out.write_all(&end)?;
        }
        return Ok(());
    }
    write_prefix(config, out, name, record.line_no, record.offset)?;
    out.write_all(record.bytes)?;
    out.write_all(&end)
}

pub fn run(args: GrepArgs, io: &mut CommandIo<'_>) -> i32 {
    let config = match args.into_config(&mut *io.stdin) {
        Ok(config) => config,
        Err(e) => {
            io.report("grep", &e);
            return 2;
        }
    };

    let mut search = Search {
        config: &config,
        io,
        had_error: false,
        any_selected: false,
    };
    if let Err(e) = search.run() {
        search.io.report("grep", format!("write error: {}", e));
        return 2;
    }
    let _ = search.io.stdout.flush();

    if search.had_error && !(config.quiet && search.any_selected) {
        2
    } else if search.any_selected {
        0
    } else {
        1
    }
}
