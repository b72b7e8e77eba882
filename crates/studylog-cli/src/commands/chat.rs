use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use studylog_application::{ConversationUseCase, TurnOutcome};
use studylog_core::session::DialogueSession;

use super::AppContext;

const COMMANDS: [&str; 4] = ["/status", "/abandon", "/help", "/quit"];

/// rustyline helper completing and highlighting slash commands.
#[derive(Clone)]
struct ChatHelper;

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ChatHelper {}

/// Runs the chat REPL for one user until `/quit` or EOF.
pub async fn run(ctx: &AppContext, user_id: &str, block_id: Option<&str>) -> Result<()> {
    let usecase = ctx.conversation()?;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ChatHelper));

    println!("{}", "=== studylog ===".bright_magenta().bold());
    println!(
        "{}",
        "Tell me what you studied. '/status' shows the open log, '/quit' exits.".bright_black()
    );
    println!();

    match block_id {
        Some(block_id) => {
            let outcome = usecase.start_block_check_in(user_id, block_id).await?;
            print_assistant(&outcome.assistant_message);
        }
        None => match usecase.current(user_id).await? {
            Some(session) => {
                println!("{}", "Resuming your unfinished log.".yellow());
                print_status(&session);
            }
            None => print_assistant("What did you work on?"),
        },
    }

    loop {
        match rl.readline(&format!("{}> ", user_id)) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if trimmed.starts_with('/') {
                    if !handle_command(&usecase, user_id, trimmed).await? {
                        break;
                    }
                    continue;
                }

                match usecase.respond(user_id, trimmed).await {
                    Ok(outcome) => print_outcome(&outcome),
                    Err(e) => {
                        tracing::error!(error = %e, "Turn failed");
                        eprintln!("{}", format!("Error: {}", e).red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}

/// Returns `false` when the REPL should stop.
async fn handle_command(usecase: &ConversationUseCase, user_id: &str, command: &str) -> Result<bool> {
    match command {
        "/quit" | "/exit" => {
            println!("{}", "Goodbye! Your unfinished log is kept for next time.".bright_green());
            return Ok(false);
        }
        "/status" => match usecase.current(user_id).await? {
            Some(session) => print_status(&session),
            None => println!("{}", "No open log.".bright_black()),
        },
        "/abandon" => {
            usecase.abandon(user_id).await?;
            println!("{}", "Dropped the open log. Nothing was saved.".yellow());
        }
        "/help" => {
            println!("{}", "  /status   show what I know so far".bright_black());
            println!("{}", "  /abandon  drop the open log without saving".bright_black());
            println!("{}", "  /quit     leave (the open log is kept)".bright_black());
        }
        other => println!("{}", format!("Unknown command: {}", other).bright_black()),
    }
    Ok(true)
}

fn print_assistant(message: &str) {
    for line in message.lines() {
        println!("{}", line.bright_blue());
    }
}

fn print_outcome(outcome: &TurnOutcome) {
    print_assistant(&outcome.assistant_message);
    if outcome.done {
        let marker = if outcome.success {
            "-- saved --".green()
        } else {
            "-- nothing saved --".yellow()
        };
        println!("{}", marker);
        println!();
    }
}

fn print_status(session: &DialogueSession) {
    let facts = &session.known_facts;
    let unknown = || "?".to_string();

    println!("{}", format!("[{}] turn {}", session.phase(), session.turn_count).bright_magenta());
    println!(
        "  assignment: {}",
        session.assignment_label().map(str::to_string).unwrap_or_else(unknown)
    );
    println!(
        "  duration:   {}",
        facts.minutes.map(|m| format!("{} min", m)).unwrap_or_else(unknown)
    );
    println!(
        "  focus:      {}",
        facts.focus.map(|r| format!("{}/5", r)).unwrap_or_else(unknown)
    );
    println!(
        "  quality:    {}",
        facts.quality.map(|r| format!("{}/5", r)).unwrap_or_else(unknown)
    );
    if !session.missing_fields.is_empty() {
        let missing: Vec<String> = session.missing_fields.iter().map(|f| f.to_string()).collect();
        println!("  missing:    {}", missing.join(", ").yellow());
    }
}
