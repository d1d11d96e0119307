use std::ffi::OsString;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::process::{ChildStdin, Command, Stdio};
use std::thread;

use log::debug;

use crate::{FilterError, Matcher};

/// fzf exits with this status when nothing matched.
const NO_MATCH_STATUS: i32 = 1;

/// Runs `fzf --filter` as a child process, one process per call.
#[derive(Clone, Debug)]
pub struct FzfMatcher {
    program: OsString,
    args: Vec<OsString>,
}

impl Default for FzfMatcher {
    fn default() -> Self {
        Self::new("fzf")
    }
}

impl FzfMatcher {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra arguments placed before `--exact` and `--filter`.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl Matcher for FzfMatcher {
    fn filter(&self, query: &str, candidates: &[&str], exact: bool) -> Result<Vec<String>, FilterError> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);

        if exact {
            command.arg("--exact");
        }

        // the user's interactive defaults may change the mode or the line format,
        // extra options go through `with_args` instead
        command
            .arg("--filter")
            .arg(query)
            .env_remove("FZF_DEFAULT_OPTS")
            .env_remove("FZF_DEFAULT_OPTS_FILE")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        debug!("running {command:?} on {} candidates", candidates.len());

        let mut child = command.spawn().map_err(|source| FilterError::Launch {
            program: self.program_name(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(ErrorKind::BrokenPipe, "matcher stdin is not piped"))?;

        // feed stdin while collecting stdout, a large candidate list would otherwise
        // fill both pipes and block the child and us on each other
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(|| write_candidates(stdin, candidates));
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        match written {
            Ok(Ok(())) => {}
            // the matcher may exit before reading everything, its status tells the story
            Ok(Err(err)) if err.kind() == ErrorKind::BrokenPipe => {}
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => return Err(io::Error::other("matcher stdin writer panicked").into()),
        }

        let output = output?;

        if output.status.success() {
            let stdout = String::from_utf8(output.stdout)?;
            return Ok(parse_lines(&stdout));
        }

        if output.status.code() == Some(NO_MATCH_STATUS) {
            debug!("no matches for {query:?}");
            return Ok(Vec::new());
        }

        Err(FilterError::MatcherExit {
            program: self.program_name(),
            code: output.status.code(),
        })
    }
}

fn write_candidates(stdin: ChildStdin, candidates: &[&str]) -> io::Result<()> {
    let mut writer = BufWriter::new(stdin);

    for candidate in candidates {
        writer.write_all(candidate.as_bytes())?;
        writer.write_all(b"\n")?;
    }

    writer.flush()
}

/// Newline terminated lines; an unterminated tail is not a line.
fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .split_inclusive('\n')
        .filter_map(|line| line.strip_suffix('\n'))
        .map(str::to_owned)
        .collect()
}
