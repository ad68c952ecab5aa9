//! Configuration replay
//!
//! A configuration file holds one command per line. Blank lines and lines
//! starting with `!` or `#` are skipped, so a saved `write file` dump replays
//! as is. Failing lines are counted and logged; replay carries on.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::CliError;
use crate::resolver::execute_line;
use crate::session::Session;

#[derive(Debug)]
pub struct ReplayFailure {
    /// 1-based line number in the file
    pub line_no: usize,
    pub text: String,
    pub error: CliError,
}

#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Lines that were executed (comments and blanks excluded)
    pub commands: usize,
    pub failures: Vec<ReplayFailure>,
}

impl ReplayReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with('!') || line.starts_with('#')
}

/// Replay configuration text through `session`
pub fn replay_str(session: &mut Session, text: &str) -> ReplayReport {
    let mut report = ReplayReport::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || is_comment(line) {
            continue;
        }

        report.commands += 1;
        if let Err(error) = execute_line(session, line) {
            let line_no = idx + 1;
            warn!("Config error at line {}: {} ({})", line_no, line, error);
            report.failures.push(ReplayFailure {
                line_no,
                text: line.to_string(),
                error,
            });
        }
    }
    report
}

/// Replay a configuration file
pub fn load_config(session: &mut Session, path: impl AsRef<Path>) -> Result<ReplayReport, CliError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| CliError::file_io(path, e))?;
    let report = replay_str(session, &text);
    info!(
        "Replayed {}: {} command(s), {} failed",
        path.display(),
        report.commands,
        report.failed()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::cli::{CliBuilder, Command};
    use crate::config::CliConfig;
    use crate::types;

    fn session(log: Arc<Mutex<Vec<String>>>) -> Session {
        let cli = CliBuilder::new(CliConfig::default())
            .ignore_grammar_env()
            .command(
                Command::new("set_name", "set name <value>", move |_, result| {
                    let value = result.arg("value").unwrap_or_default().to_string();
                    log.lock().unwrap().push(value);
                    Ok(())
                })
                .arg(types::name("value", "name")),
            )
            .context_group("interface")
            .build()
            .unwrap();
        Session::local(Arc::new(cli))
    }

    #[test]
    fn test_comments_blanks_and_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut session = session(log.clone());

        let report = replay_str(
            &mut session,
            "! greeting configuration\n\
             \n\
             # comment\n\
             set name Alice\n\
             bogus command\n\
             \tse na Bob  \n\
             end\n\
             interface\n",
        );

        assert_eq!(report.commands, 5);
        assert_eq!(report.failed(), 3);
        let failed: Vec<(usize, &str)> = report
            .failures
            .iter()
            .map(|f| (f.line_no, f.text.as_str()))
            .collect();
        assert_eq!(failed, vec![(5, "bogus command"), (7, "end"), (8, "interface")]);
        assert_eq!(*log.lock().unwrap(), vec!["Alice", "Bob"]);
        assert_eq!(session.context().depth(), 0);
        assert_eq!(session.take_output(), "");
    }

    #[test]
    fn test_missing_file() {
        let mut session = session(Arc::new(Mutex::new(Vec::new())));
        let err = load_config(&mut session, "/nonexistent/startup.cfg").unwrap_err();
        assert!(matches!(err, CliError::FileIo { .. }));
    }
}
