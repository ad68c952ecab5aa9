//! Built-in commands registered ahead of the application's own

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::anyhow;

use crate::cli::Command;
use crate::doc::{CommandDoc, DocFormat};
use crate::error::CliError;
use crate::grammar::{yaml, ArgSpec, MatchResult};
use crate::output::WriterSink;
use crate::session::Session;
use crate::types;

fn help(session: &mut Session, _: &MatchResult<'_>) -> anyhow::Result<()> {
    let text = session.cli().help_text();
    session.output(&text);
    Ok(())
}

fn quit(session: &mut Session, _: &MatchResult<'_>) -> anyhow::Result<()> {
    session.output("Goodbye!\n");
    session.request_exit();
    Ok(())
}

fn show_running_config(session: &mut Session, _: &MatchResult<'_>) -> anyhow::Result<()> {
    let cli = session.cli_handle();
    cli.dump_running_config(session)?;
    Ok(())
}

fn required_arg<'a>(result: &'a MatchResult<'_>, id: &str) -> anyhow::Result<&'a str> {
    result
        .arg(id)
        .ok_or_else(|| anyhow!("missing argument <{id}>"))
}

fn write_file(session: &mut Session, result: &MatchResult<'_>) -> anyhow::Result<()> {
    let filename = required_arg(result, "filename")?;
    let file = match File::create(filename) {
        Ok(file) => file,
        Err(e) => {
            let err = CliError::file_io(filename, e);
            session.error(&err);
            return Err(err.into());
        }
    };

    let cli = session.cli_handle();
    let mut sink = WriterSink::new(BufWriter::new(file));
    if let Err(e) = cli
        .dump_running_config(&mut sink)
        .and_then(|_| sink.into_inner().flush())
    {
        let err = CliError::FileWrite {
            path: filename.into(),
            source: e,
        };
        session.error(&err);
        return Err(err.into());
    }

    session.output(&format!("Configuration saved to {filename}\n"));
    Ok(())
}

fn write_yaml(session: &mut Session, result: &MatchResult<'_>) -> anyhow::Result<()> {
    let filename = required_arg(result, "filename")?;
    let cli = session.cli_handle();
    let config = cli.config();
    if let Err(e) = yaml::export_to_file(
        cli.grammar().root(),
        &config.app_name,
        &config.grammar_env,
        Path::new(filename),
    ) {
        session.error(&e);
        return Err(e.into());
    }
    session.output(&format!("CLI grammar exported to {filename}\n"));
    Ok(())
}

fn show_version(session: &mut Session, _: &MatchResult<'_>) -> anyhow::Result<()> {
    let cli = session.cli_handle();
    let config = cli.config();
    session.output(&format!("{} version {}\n", config.app_name, config.version));
    session.output(&format!("opshell {}\n", env!("CARGO_PKG_VERSION")));
    Ok(())
}

fn show_doc(session: &mut Session, result: &MatchResult<'_>) -> anyhow::Result<()> {
    let name = required_arg(result, "cmd_name")?;
    let cli = session.cli_handle();
    let doc = CommandDoc::lookup(cli.grammar().root(), cli.docs(), name);

    let Some(filename) = result.arg("doc_filename") else {
        session.output(&doc.render_terminal());
        return Ok(());
    };

    let format = match result.arg("doc_format") {
        Some(format) => format.parse::<DocFormat>().map_err(|e| anyhow!(e))?,
        None => DocFormat::Markdown,
    };
    if let Err(e) = doc.write_file(Path::new(filename), format) {
        session.error(&e);
        return Err(e.into());
    }
    session.output(&format!(
        "Documentation written to '{}' ({})\n",
        filename,
        format.label()
    ));
    Ok(())
}

pub(crate) fn commands() -> Vec<Command> {
    vec![
        Command::new("help", "help", help).help("show available commands"),
        Command::new("help_alias", "?", help).help("show available commands (alias for help)"),
        Command::new("quit", "quit", quit).help("exit the application"),
        Command::new("exit", "exit", quit).help("exit the application (alias for quit)"),
        Command::new("show_running_config", "show running-config", show_running_config)
            .help("display running configuration"),
        Command::new("show_run", "show run", show_running_config)
            .help("display running configuration"),
        Command::new("show_version", "show version", show_version)
            .help("display version information"),
        Command::new(
            "show_doc",
            "show doc <cmd_name> [file <doc_filename> [format <doc_format>]]",
            show_doc,
        )
        .help("display or export command documentation")
        .arg(ArgSpec::pattern("cmd_name", "[a-zA-Z_][a-zA-Z0-9_]*").with_help("command name"))
        .arg(types::filename("doc_filename", "output filename"))
        .arg(ArgSpec::pattern("doc_format", "md|rst|txt").with_help("format (md, rst, txt)")),
        Command::new("write_terminal", "write terminal", show_running_config)
            .help("display config to terminal"),
        Command::new("write_file", "write file <filename>", write_file)
            .help("save config to file")
            .arg(types::filename("filename", "output filename")),
        Command::new("write_yaml", "write yaml <filename>", write_yaml)
            .help("export CLI grammar to YAML")
            .arg(types::filename("filename", "output filename")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cli::CliBuilder;
    use crate::config::CliConfig;
    use crate::doc::{DocEntry, DocTable};
    use crate::resolver::process_line;

    fn session() -> Session {
        let cli = CliBuilder::new(CliConfig::default().with_version("3.2.1"))
            .ignore_grammar_env()
            .docs(DocTable::new().with("quit", DocEntry::new("Leaves the CLI.")))
            .build()
            .unwrap();
        Session::local(Arc::new(cli))
    }

    fn run(session: &mut Session, line: &str) -> String {
        process_line(session, line);
        session.take_output()
    }

    #[test]
    fn test_help_and_alias() {
        let mut session = session();
        let out = run(&mut session, "help");
        assert!(out.contains("  quit - exit the application\n"));
        assert_eq!(run(&mut session, "?"), out);
    }

    #[test]
    fn test_quit_stops_the_loop() {
        let mut session = session();
        assert_eq!(run(&mut session, "quit"), "Goodbye!\n");
        assert!(!session.cli().is_running());
    }

    #[test]
    fn test_exit_at_top_level_quits() {
        let mut session = session();
        assert_eq!(run(&mut session, "exit"), "Goodbye!\n");
        assert!(!session.cli().is_running());
    }

    #[test]
    fn test_show_version() {
        let mut session = session();
        let out = run(&mut session, "show version");
        assert!(out.starts_with("CLI version 3.2.1\n"));
    }

    #[test]
    fn test_write_file_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session();

        let cfg = dir.path().join("running.cfg");
        let out = run(&mut session, &format!("write file {}", cfg.display()));
        assert!(out.starts_with(&format!("Configuration saved to {}\n", cfg.display())));
        assert_eq!(std::fs::read_to_string(&cfg).unwrap(), "! end\n");

        let grammar = dir.path().join("grammar.yaml");
        let out = run(&mut session, &format!("write yaml {}", grammar.display()));
        assert!(out.starts_with("CLI grammar exported to "));
        assert!(std::fs::read_to_string(&grammar)
            .unwrap()
            .contains("callback: write_yaml"));
    }

    #[test]
    fn test_write_file_error_is_reported() {
        let mut session = session();
        let out = run(&mut session, "write file /nonexistent-dir/x.cfg");
        assert!(out.starts_with("Error: Cannot open file: /nonexistent-dir/x.cfg: "));
        assert!(out.contains("Error: Command failed\n"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_file_failure_after_open_is_reported() {
        let mut session = session();
        let out = run(&mut session, "write file /dev/full");
        assert!(out.starts_with("Error: Cannot write file: /dev/full: "));
        assert!(out.contains("Error: Command failed\n"));
        assert!(!out.contains("Configuration saved"));
    }

    #[test]
    fn test_show_doc_terminal_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session();

        let out = run(&mut session, "show doc quit");
        assert!(out.contains("Syntax:\n    quit\n"));
        assert!(out.contains("Description:\n    Leaves the CLI.\n"));

        let path = dir.path().join("quit.rst");
        let out = run(
            &mut session,
            &format!("show doc quit file {} format rst", path.display()),
        );
        assert!(out.contains("(reStructuredText)"));
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("quit\n====\n"));
    }
}
