//! `diff`: compare two files line by line.

use super::CommandIo;
use crate::diff::{hunks, lcs, normal};
use crate::error::{Error, Result};
use crate::records;
use clap::Parser;
use log::debug;
use std::io::Write;
use std::path::PathBuf;

const DEFAULT_CONTEXT: usize = 3;

#[derive(Debug, Parser)]
#[command(
    name = "diff",
    about = "Compare FILES line by line.",
    override_usage = "diff [OPTION]... FILE1 FILE2",
    disable_version_flag = true
)]
pub struct DiffArgs {
    /// report only when files differ
    #[arg(short = 'q', long = "brief")]
    pub brief: bool,

    /// output 3 lines of unified context
    #[arg(short = 'u')]
    pub unified: bool,

    /// output NUM lines of unified context
    #[arg(short = 'U', value_name = "NUM")]
    pub context: Option<usize>,

    /// output NUM (default 3) lines of unified context
    #[arg(
        long = "unified",
        value_name = "NUM",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "3"
    )]
    pub unified_context: Option<usize>,

    #[arg(short = 'y', long = "side-by-side", hide = true)]
    pub side_by_side: bool,

    #[arg(short = 'w', long = "ignore-all-space", hide = true)]
    pub ignore_all_space: bool,

    #[arg(short = 'B', long = "ignore-blank-lines", hide = true)]
    pub ignore_blank_lines: bool,

    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

impl DiffArgs {
    pub fn unsupported(&self) -> Option<&'static str> {
        if self.side_by_side {
            Some("-y")
        } else if self.ignore_all_space {
            Some("-w")
        } else if self.ignore_blank_lines {
            Some("-B")
        } else {
            None
        }
    }

    /// Context width when unified output was asked for.
    pub fn unified_width(&self) -> Option<usize> {
        match (self.context, self.unified_context) {
            (Some(n), _) | (None, Some(n)) => Some(n),
            (None, None) if self.unified => Some(DEFAULT_CONTEXT),
            (None, None) => None,
        }
    }

    fn operands(&self) -> Result<(&PathBuf, &PathBuf)> {
        match self.files.as_slice() {
            [a, b] => Ok((a, b)),
            [] => Err(Error::MissingOperand(" after 'diff'".to_string())),
            [a] => Err(Error::MissingOperand(format!(
                " after '{}'",
                a.display()
            ))),
            [_, _, extra, ..] => Err(Error::InvalidArgument(format!(
                "extra operand '{}'",
                extra.display()
            ))),
        }
    }
}

/// Compares the two files and writes the report. Returns whether they
/// differ.
fn compare(args: &DiffArgs, out: &mut dyn Write) -> anyhow::Result<bool> {
    let (path1, path2) = args.operands()?;
    let lines1 = records::read_lines(path1)?;
    let lines2 = records::read_lines(path2)?;
    debug!(
        "comparing {} lines against {} lines",
        lines1.len(),
        lines2.len()
    );

    if args.brief {
        if lcs::identical(&lines1, &lines2) {
            return Ok(false);
        }
        writeln!(
            out,
            "Files {} and {} differ",
            path1.display(),
            path2.display()
        )?;
        return Ok(true);
    }

    let edits = lcs::diff(&lines1, &lines2);
    if !edits.iter().any(|e| e.is_change()) {
        return Ok(false);
    }
    let text = match args.unified_width() {
        Some(context) => hunks::unified(
            &path1.display().to_string(),
            &path2.display().to_string(),
            &edits,
            &lines1,
            &lines2,
            context,
        ),
        None => normal::render(&edits, &lines1, &lines2),
    };
    out.write_all(&text)?;
    Ok(true)
}

pub fn run(args: DiffArgs, io: &mut CommandIo<'_>) -> i32 {
    if let Some(option) = args.unsupported() {
        io.report("diff", Error::Unsupported(option.to_string()));
        return 2;
    }
    match compare(&args, &mut *io.stdout) {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            io.report("diff", format!("{:#}", e));
            2
        }
    }
}
