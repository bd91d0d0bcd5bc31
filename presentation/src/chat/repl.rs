//! REPL (Read-Eval-Print Loop) for a terminal interview

use crate::output::console::ConsoleFormatter;
use colored::Colorize;
use lattia_application::{IntakeAgent, NoPiiDetector, PiiDetector, RunTurnError};
use lattia_domain::{InterviewState, Message};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::sync::Arc;
use tracing::warn;

const HISTORY_CAPACITY: usize = 1000;

#[derive(Debug, PartialEq, Eq)]
enum CommandResult {
    Continue,
    Exit,
}

/// Terminal interview over an in-memory session
pub struct ChatRepl {
    agent: IntakeAgent,
    name: String,
    pii_detector: Arc<dyn PiiDetector>,
    state: InterviewState,
    history: Vec<Message>,
}

impl ChatRepl {
    pub fn new(agent: IntakeAgent, name: impl Into<String>) -> Self {
        Self {
            agent,
            name: name.into(),
            pii_detector: Arc::new(NoPiiDetector),
            state: InterviewState::new(),
            history: Vec::new(),
        }
    }

    pub fn with_pii_detector(mut self, detector: Arc<dyn PiiDetector>) -> Self {
        self.pii_detector = detector;
        self
    }

    pub fn state(&self) -> &InterviewState {
        &self.state
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Greet the user and record the greeting.
    pub fn open(&mut self) -> String {
        let greeting = self.agent.open(&self.name);
        self.history.push(Message::assistant(greeting.clone()));
        greeting
    }

    /// Run one turn. On failure the session is left as it was.
    pub async fn respond(&mut self, text: &str) -> Result<String, RunTurnError> {
        let redacted = self.pii_detector.redact(text.trim());
        let reply = self
            .agent
            .reply(&redacted, &self.history, &self.state)
            .await?;

        self.history.push(Message::user(redacted));
        self.history.push(Message::assistant(reply.followup.clone()));
        self.state = reply.state;
        Ok(reply.followup)
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut line_editor = Reedline::create();

        let history_path = dirs::data_dir().map(|p| p.join("lattia").join("chat_history.txt"));
        if let Some(path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match FileBackedHistory::with_file(HISTORY_CAPACITY, path) {
                Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
                Err(e) => warn!("Chat history disabled: {}", e),
            }
        }

        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("you".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();
        let greeting = self.open();
        println!("{}\n", ConsoleFormatter::assistant(&greeting));

        loop {
            match line_editor.read_line(&prompt) {
                Ok(Signal::Success(buffer)) => {
                    let line = buffer.trim();

                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        match self.handle_command(line) {
                            CommandResult::Exit => break,
                            CommandResult::Continue => continue,
                        }
                    }

                    self.process_message(line).await;
                }
                Ok(Signal::CtrlC) => {
                    println!("^C");
                    continue;
                }
                Ok(_) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "╭─────────────────────────────────────────────╮".cyan());
        println!("{}", "│           Lattia - Health Intake            │".cyan());
        println!("{}", "╰─────────────────────────────────────────────╯".cyan());
        println!();
        println!("Commands:");
        println!("  /progress - Show turn budget per domain");
        println!("  /data     - Show collected answers");
        println!("  /quit     - Exit chat");
        println!();
    }

    /// Handle slash commands.
    fn handle_command(&self, cmd: &str) -> CommandResult {
        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                CommandResult::Exit
            }
            "/help" | "/h" | "/?" => {
                self.print_welcome();
                CommandResult::Continue
            }
            "/progress" | "/p" => {
                println!("{}", ConsoleFormatter::progress(&self.state));
                CommandResult::Continue
            }
            "/data" | "/d" => {
                println!(
                    "{}",
                    ConsoleFormatter::health_data(&self.state.to_health_data())
                );
                CommandResult::Continue
            }
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
                CommandResult::Continue
            }
        }
    }

    async fn process_message(&mut self, line: &str) {
        let was_done = self.state.is_done();
        match self.respond(line).await {
            Ok(followup) => {
                println!("{}\n", ConsoleFormatter::assistant(&followup));
                if self.state.is_done() && !was_done {
                    println!(
                        "{}\n",
                        "Interview complete. Type /data to review your answers.".green()
                    );
                }
            }
            Err(e) => {
                eprintln!("{} {}\n", "Error:".red().bold(), e);
            }
        }
    }
}
