//! Blocking stdin/stdout loop

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing::debug;

use crate::cli::Cli;
use crate::resolver::process_line;
use crate::session::Session;
use crate::transport::decode_line;

/// Run an interactive session on the process's stdin/stdout
pub fn run_local(cli: Arc<Cli>) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with(cli, stdin.lock(), stdout.lock())
}

/// Run a fresh local session over any line source and writer
pub fn run_with<R: BufRead, W: Write>(cli: Arc<Cli>, input: R, output: W) -> io::Result<()> {
    let mut session = Session::local(cli);
    run_session(&mut session, input, output)
}

/// Print the banner and prompt, then process lines until EOF or until the
/// run flag is cleared.
pub fn run_session<R: BufRead, W: Write>(
    session: &mut Session,
    mut input: R,
    mut output: W,
) -> io::Result<()> {
    if let Some(banner) = session.cli().banner_line() {
        writeln!(output, "{banner}")?;
    }
    writeln!(output, "Type 'help' for commands.")?;
    session.write_prompt();
    output.write_all(session.take_output().as_bytes())?;
    output.flush()?;

    let cli = session.cli_handle();
    let mut raw = Vec::new();
    while cli.is_running() {
        raw.clear();
        if input.read_until(b'\n', &mut raw)? == 0 {
            debug!(session = %session.id(), "Input closed");
            break;
        }
        process_line(session, &decode_line(&raw));
        output.write_all(session.take_output().as_bytes())?;
        output.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CliBuilder, Command};
    use crate::config::CliConfig;

    fn cli() -> Arc<Cli> {
        let cli = CliBuilder::new(CliConfig::default().with_banner("Demo"))
            .ignore_grammar_env()
            .command(Command::new("hello", "hello", |session, _| {
                session.output("Hello, world!\n");
                Ok(())
            }))
            .context_group("interface")
            .build()
            .unwrap();
        Arc::new(cli)
    }

    #[test]
    fn test_scripted_session() {
        let input = b"hello\ninterface\nend\nquit\nhello\n" as &[u8];
        let mut output = Vec::new();
        run_with(cli(), input, &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "Demo v1.0.0\n\
             Type 'help' for commands.\n\
             cli> Hello, world!\n\
             cli> cli(interface)> cli> Goodbye!\n"
        );
    }

    #[test]
    fn test_invalid_utf8_line_does_not_end_session() {
        let mut output = Vec::new();
        run_with(cli(), b"caf\xe9\r\nhello\n" as &[u8], &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.ends_with(
            "cli> Error: Unknown command: caf\u{FFFD}\ncli> Hello, world!\ncli> "
        ));
    }

    #[test]
    fn test_eof_ends_loop() {
        let cli = cli();
        let mut output = Vec::new();
        run_with(cli.clone(), b"frob\n" as &[u8], &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.ends_with("cli> Error: Unknown command: frob\ncli> "));
        assert!(cli.is_running());
    }
}
