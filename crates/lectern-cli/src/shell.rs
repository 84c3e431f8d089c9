//! Interactive shell. Idle between actions; every action runs to completion
//! before the next line is read.

use std::path::PathBuf;

use lectern_core::Pipeline;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::commands;

const HELP: &str = "\
Commands:
  :process <PATH>...   rebuild the index from PDF files or directories
  :help                show this help
  :quit                leave the shell
Anything else is asked as a question.";

#[derive(Debug, PartialEq)]
enum Action {
    Process(Vec<PathBuf>),
    Ask(String),
    Help,
    Quit,
    Invalid(String),
}

fn parse(line: &str) -> Action {
    let line = line.trim();
    let Some(rest) = line.strip_prefix(':') else {
        return Action::Ask(line.to_string());
    };
    let mut words = rest.split_whitespace();
    match words.next() {
        Some("process") | Some("p") => {
            let paths: Vec<PathBuf> = words.map(PathBuf::from).collect();
            if paths.is_empty() {
                Action::Invalid("usage: :process <PATH>...".to_string())
            } else {
                Action::Process(paths)
            }
        }
        Some("help") | Some("h") => Action::Help,
        Some("quit") | Some("q") | Some("exit") => Action::Quit,
        Some(other) => Action::Invalid(format!("unknown command :{other} (try :help)")),
        None => Action::Invalid("empty command (try :help)".to_string()),
    }
}

pub async fn run(pipeline: &Pipeline) -> Result<(), ReadlineError> {
    let mut rl = DefaultEditor::new()?;
    println!("{HELP}");

    loop {
        match rl.readline("lectern> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                let result = match parse(input) {
                    Action::Quit => break,
                    Action::Help => {
                        println!("{HELP}");
                        Ok(())
                    }
                    Action::Invalid(msg) => {
                        eprintln!("{msg}");
                        Ok(())
                    }
                    Action::Process(paths) => commands::process(pipeline, &paths).await.map(|_| ()),
                    Action::Ask(question) => commands::ask(pipeline, &question, false).await.map(|_| ()),
                };
                if let Err(e) = result {
                    eprintln!("Error: {e}");
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(parse("  What is this? "), Action::Ask("What is this?".to_string()));
    }

    #[test]
    fn process_takes_paths() {
        assert_eq!(
            parse(":process a.pdf docs/"),
            Action::Process(vec![PathBuf::from("a.pdf"), PathBuf::from("docs/")])
        );
        assert!(matches!(parse(":process"), Action::Invalid(_)));
    }

    #[test]
    fn control_commands() {
        assert_eq!(parse(":q"), Action::Quit);
        assert_eq!(parse(":help"), Action::Help);
        assert!(matches!(parse(":bogus"), Action::Invalid(_)));
    }
}
