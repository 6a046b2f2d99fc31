// SPDX-License-Identifier: MIT
//
// n-vi: a scriptable host for the n-engine modal editing engine.
//
// There is no screen. Keys arrive on stdin in Vim notation, one script per
// line, and every step's narration is printed to stdout:
//
//   stdin line → parse_notation → Session::process_key (per key) → stdout
//
// Logging goes to stderr through tracing-subscriber, filtered by N_VI_LOG
// (default `warn`), so it never mixes with the narration.
//
// Usage:
//
//   n-vi [--root DIR] [--shell PROGRAM] [--set OPTION]... [FILE]...
//
//   $ printf ':%%s/foo/bar/g<CR>\n:wq<CR>\n' | n-vi notes.txt

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use n_engine::{Host, Options, Session, parse_notation};

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Command-line configuration.
#[derive(Debug)]
struct Args {
    root: PathBuf,
    shell: String,
    /// `:set` directives applied before any input.
    set: Vec<String>,
    files: Vec<PathBuf>,
}

const USAGE: &str = "usage: n-vi [--root DIR] [--shell PROGRAM] [--set OPTION]... [FILE]...";

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut parsed = Self {
            root: env::current_dir().context("cannot read the current directory")?,
            shell: "sh".to_string(),
            set: Vec::new(),
            files: Vec::new(),
        };
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .with_context(|| format!("{flag} needs a value\n{USAGE}"))
            };
            match arg.as_str() {
                "--root" => parsed.root = PathBuf::from(value("--root")?),
                "--shell" => parsed.shell = value("--shell")?,
                "--set" => parsed.set.push(value("--set")?),
                "-h" | "--help" => {
                    println!("{USAGE}");
                    process::exit(0);
                }
                flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
                _ => parsed.files.push(PathBuf::from(arg)),
            }
        }
        Ok(parsed)
    }
}

// ---------------------------------------------------------------------------
// Session setup
// ---------------------------------------------------------------------------

fn init_logging() {
    let filter = EnvFilter::try_from_env("N_VI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn build_session(args: &Args) -> Result<Session> {
    let mut options = Options::default();
    for directive in &args.set {
        options
            .apply_set(directive)
            .with_context(|| format!("--set {directive}"))?;
    }

    let host = || Host::system(&args.root, &args.shell);
    let Some((first, rest)) = args.files.split_first() else {
        return Ok(Session::new(host(), options));
    };

    let mut session = Session::open(first, host(), options)
        .with_context(|| format!("cannot open {}", first.display()))?;
    for path in rest {
        session
            .editor_mut()
            .open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
    }
    // Later files are loaded as hidden buffers; editing starts in the first.
    session.editor_mut().buffers.switch("1")?;
    info!(files = args.files.len(), root = %args.root.display(), "session ready");
    Ok(session)
}

// ---------------------------------------------------------------------------
// Main loop
// ---------------------------------------------------------------------------

/// Feed stdin to the session until it quits or input ends.
fn run(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("cannot read stdin")?;
        debug!(script = %line, "input");
        for key in parse_notation(&line) {
            let step = session
                .process_key(key)
                .with_context(|| format!("fatal error on key {key}"))?;
            if !step.output.is_empty() {
                writeln!(stdout, "{}", step.output)?;
            }
            if step.quit {
                return Ok(());
            }
        }
    }
    let state = session.state();
    info!(mode = %state.mode, line = state.cursor.line + 1, "input ended");
    Ok(())
}

fn main() {
    init_logging();

    let result = Args::parse(env::args().skip(1))
        .and_then(|args| build_session(&args))
        .and_then(|mut session| run(&mut session));

    if let Err(e) = result {
        eprintln!("n-vi: {e:#}");
        process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        Args::parse(list.iter().map(ToString::to_string))
    }

    #[test]
    fn parses_flags_and_files() {
        let parsed = args(&[
            "--root", "/tmp", "--set", "ic", "--set", "sts=4", "a.txt", "b.txt",
        ])
        .unwrap();
        assert_eq!(parsed.root, PathBuf::from("/tmp"));
        assert_eq!(parsed.shell, "sh");
        assert_eq!(parsed.set, ["ic", "sts=4"]);
        assert_eq!(parsed.files, [PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
    }

    #[test]
    fn rejects_bad_flags() {
        assert!(args(&["--root"]).is_err());
        assert!(args(&["--frob"]).is_err());
    }

    #[test]
    fn bad_set_directive_fails_setup() {
        let parsed = args(&["--root", "/tmp", "--set", "bogus"]).unwrap();
        assert!(build_session(&parsed).is_err());
    }

    #[test]
    fn opens_several_files_and_starts_in_the_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "beta\n").unwrap();
        let root = dir.path().to_str().unwrap();
        let parsed = args(&["--root", root, "a.txt", "b.txt"]).unwrap();
        let session = build_session(&parsed).unwrap();
        assert_eq!(session.buffer_list().len(), 2);
        assert_eq!(session.buffer().line(0), Some("alpha"));
    }
}
