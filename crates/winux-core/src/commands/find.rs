//! `find`: walk directory trees and print matching entries.
//!
//! Expressions use single-dash long predicates, so they are read by hand
//! rather than through clap.

use super::CommandIo;
use crate::error::{Error, Result};
use crate::matcher::wildcard;
use log::{debug, trace};
use std::io::{self, Write};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

const USAGE: &str = "Usage: find [path...] [expression]\n\
\n\
Tests: -name PATTERN  -iname PATTERN  -type [fdl]\n\
Options: -mindepth N  -maxdepth N  -P\n\
Actions: -print  -print0  -quit\n";

const UNSUPPORTED: &[&str] = &["-L", "-H", "-delete", "-exec", "-ok", "-printf", "-prune"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    File,
    Directory,
    Symlink,
}

impl EntryType {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "f" => Ok(EntryType::File),
            "d" => Ok(EntryType::Directory),
            "l" => Ok(EntryType::Symlink),
            other => Err(Error::InvalidArgument(format!(
                "unknown argument to -type: {}",
                other
            ))),
        }
    }

    fn matches(self, entry: &DirEntry) -> bool {
        let file_type = entry.file_type();
        match self {
            EntryType::File => file_type.is_file(),
            EntryType::Directory => file_type.is_dir(),
            EntryType::Symlink => file_type.is_symlink(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindArgs {
    pub roots: Vec<String>,
    pub name: Option<String>,
    pub iname: Option<String>,
    pub entry_type: Option<EntryType>,
    pub min_depth: usize,
    pub max_depth: usize,
    pub print0: bool,
    pub quit: bool,
    pub help: bool,
}

impl Default for FindArgs {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            name: None,
            iname: None,
            entry_type: None,
            min_depth: 0,
            max_depth: usize::MAX,
            print0: false,
            quit: false,
            help: false,
        }
    }
}

fn value_for(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| Error::InvalidArgument(format!("missing argument to `{}'", flag)))
}

fn depth_for(flag: &str, value: Option<String>) -> Result<usize> {
    let value = value_for(flag, value)?;
    value.parse().map_err(|_| {
        Error::InvalidArgument(format!(
            "Expected a positive decimal integer argument to {}, but got `{}'",
            flag, value
        ))
    })
}

impl FindArgs {
    /// Parses the arguments that follow the program name.
    pub fn parse_from<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = FindArgs::default();
        let mut args = args.into_iter().peekable();

        while let Some(arg) = args.next_if(|a| a == "-P" || a == "--") {
            trace!("ignoring {}", arg);
        }
        while let Some(root) = args.next_if(|a| !a.starts_with('-') || a == "-") {
            parsed.roots.push(root);
        }

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-name" => parsed.name = Some(value_for(&arg, args.next())?),
                "-iname" => parsed.iname = Some(value_for(&arg, args.next())?),
                "-type" => {
                    let value = value_for(&arg, args.next())?;
                    parsed.entry_type = Some(EntryType::parse(&value)?);
                }
                "-mindepth" => parsed.min_depth = depth_for(&arg, args.next())?,
                "-maxdepth" => parsed.max_depth = depth_for(&arg, args.next())?,
                "-print" => {}
                "-print0" => parsed.print0 = true,
                "-quit" => parsed.quit = true,
                "-P" => {}
                "-help" | "--help" => parsed.help = true,
                flag if UNSUPPORTED.contains(&flag) => {
                    return Err(Error::Unsupported(flag.to_string()))
                }
                flag if flag.starts_with('-') => {
                    return Err(Error::InvalidArgument(format!("unknown predicate `{}'", flag)))
                }
                path => {
                    return Err(Error::InvalidArgument(format!(
                        "paths must precede expression: `{}'",
                        path
                    )))
                }
            }
        }

        if parsed.min_depth > parsed.max_depth {
            return Err(Error::InvalidArgument(format!(
                "-mindepth {} is greater than -maxdepth {}",
                parsed.min_depth, parsed.max_depth
            )));
        }
        if parsed.roots.is_empty() {
            parsed.roots.push(".".to_string());
        }
        Ok(parsed)
    }

    fn selects(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        if let Some(pattern) = &self.name {
            if !wildcard::matches(pattern, &name, false) {
                return false;
            }
        }
        if let Some(pattern) = &self.iname {
            if !wildcard::matches(pattern, &name, true) {
                return false;
            }
        }
        self.entry_type.map_or(true, |t| t.matches(entry))
    }
}

fn print_entry(out: &mut dyn Write, path: &Path, print0: bool) -> io::Result<()> {
    write!(out, "{}", path.display())?;
    out.write_all(if print0 { b"\0" } else { b"\n" })
}

/// Walks every root. Returns whether any root or entry could not be read.
fn walk(args: &FindArgs, io: &mut CommandIo<'_>) -> io::Result<bool> {
    let mut had_error = false;

    'roots: for root in &args.roots {
        let root_path = Path::new(root);
        if root_path.symlink_metadata().is_err() {
            io.report("find", format!("'{}': No such file or directory", root));
            had_error = true;
            continue;
        }
        debug!(
            "walking {:?}, depth {}..={}",
            root_path, args.min_depth, args.max_depth
        );

        let walker = WalkDir::new(root_path)
            .min_depth(args.min_depth)
            .max_depth(args.max_depth)
            .sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let at = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| root.clone());
                    io.report("find", format!("'{}': {}", at, io::Error::from(e)));
                    had_error = true;
                    continue;
                }
            };
            if !args.selects(&entry) {
                continue;
            }
            print_entry(&mut *io.stdout, entry.path(), args.print0)?;
            if args.quit {
                break 'roots;
            }
        }
    }
    Ok(had_error)
}

pub fn run(args: FindArgs, io: &mut CommandIo<'_>) -> i32 {
    if args.help {
        let _ = io.stdout.write_all(USAGE.as_bytes());
        return 0;
    }
    match walk(&args, io) {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            io.report("find", format!("write error: {}", e));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::run_cmd;
    use std::fs;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Result<FindArgs> {
        FindArgs::parse_from(args.iter().map(|s| s.to_string()))
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("main.cpp"), "").unwrap();
        fs::write(dir.path().join("README.md"), "").unwrap();
        fs::write(dir.path().join("src/lib.CPP"), "").unwrap();
        fs::write(dir.path().join("src/nested/deep.cpp"), "").unwrap();
        dir
    }

    fn lines(root: &Path, out: &str) -> Vec<String> {
        let prefix = format!("{}", root.display());
        out.lines()
            .map(|l| l.strip_prefix(&prefix).unwrap_or(l).to_string())
            .collect()
    }

    #[test]
    fn test_parse_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.roots, vec!["."]);
        assert_eq!(args.max_depth, usize::MAX);

        let args = parse(&["-P", "a", "b", "-name", "*.rs", "-type", "f"]).unwrap();
        assert_eq!(args.roots, vec!["a", "b"]);
        assert_eq!(args.name.as_deref(), Some("*.rs"));
        assert_eq!(args.entry_type, Some(EntryType::File));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&[".", "-exec", "rm", "{}", ";"]).unwrap_err().is_unsupported());
        assert!(parse(&["-L", "."]).unwrap_err().is_unsupported());
        assert!(parse(&["-type", "x"]).is_err());
        assert!(parse(&["-maxdepth"]).is_err());
        assert!(parse(&["-maxdepth", "-1"]).is_err());
        assert!(parse(&["-bogus"]).is_err());
        assert!(parse(&["-mindepth", "3", "-maxdepth", "1"]).is_err());
        assert!(parse(&["-name", "x", "late"]).is_err());
    }

    #[test]
    fn test_name_and_iname() {
        let dir = tree();
        let root = dir.path().to_str().unwrap();

        let result = run_cmd("find", &[root, "-name", "*.cpp"]);
        assert_eq!(result.code, 0);
        assert_eq!(
            lines(dir.path(), &result.stdout),
            vec!["/main.cpp", "/src/nested/deep.cpp"]
        );

        let result = run_cmd("find", &[root, "-iname", "*.cpp"]);
        assert_eq!(
            lines(dir.path(), &result.stdout),
            vec!["/main.cpp", "/src/lib.CPP", "/src/nested/deep.cpp"]
        );
    }

    #[test]
    fn test_type_and_depth() {
        let dir = tree();
        let root = dir.path().to_str().unwrap();

        let result = run_cmd("find", &[root, "-type", "d"]);
        assert_eq!(lines(dir.path(), &result.stdout), vec!["", "/src", "/src/nested"]);

        let result = run_cmd("find", &[root, "-mindepth", "1", "-maxdepth", "1"]);
        assert_eq!(
            lines(dir.path(), &result.stdout),
            vec!["/README.md", "/main.cpp", "/src"]
        );
    }

    #[test]
    fn test_print0_and_quit() {
        let dir = tree();
        let root = dir.path().to_str().unwrap();

        let result = run_cmd("find", &[root, "-name", "*.cpp", "-print0"]);
        assert_eq!(result.stdout.matches('\0').count(), 2);
        assert!(!result.stdout.contains('\n'));

        let result = run_cmd("find", &[root, "-name", "*.cpp", "-quit"]);
        assert_eq!(lines(dir.path(), &result.stdout), vec!["/main.cpp"]);
    }

    #[test]
    fn test_missing_root_continues() {
        let dir = tree();
        let root = dir.path().to_str().unwrap();
        let missing = dir.path().join("missing");
        let missing = missing.to_str().unwrap();

        let result = run_cmd("find", &[missing, root, "-name", "main.cpp"]);
        assert_eq!(result.code, 1);
        assert!(result.stderr.contains("No such file or directory"));
        assert_eq!(lines(dir.path(), &result.stdout), vec!["/main.cpp"]);
    }

    #[test]
    fn test_invalid_expression_exits_2() {
        let result = run_cmd("find", &[".", "-delete"]);
        assert_eq!(result.code, 2);
        assert!(result.stdout.is_empty());
        assert!(result.stderr.contains("-delete is not supported"));
    }
}
