use anyhow::Result;
use cliclack::{input, spinner};
use console::style;
use std::path::PathBuf;
use tracing::warn;

use orderdesk::agent::Agent;
use orderdesk::models::message::Message;
use orderdesk::turn::TurnExecutor;

use crate::output;
use crate::session_file::{load_messages, persist_messages};

pub struct Session {
    executor: TurnExecutor,
    agent: Agent,
    session_file: PathBuf,
    messages: Vec<Message>,
}

impl Session {
    pub fn new(executor: TurnExecutor, agent: Agent, session_file: PathBuf) -> Self {
        Session {
            executor,
            agent,
            session_file,
            messages: Vec::new(),
        }
    }

    /// Reload the transcript recorded for this session name.
    pub fn resume(&mut self) -> Result<()> {
        self.messages = load_messages(&self.session_file)?;
        Ok(())
    }

    pub async fn start(&mut self) -> Result<()> {
        println!(
            "Hello, how may I assist you today with your orders? {}",
            style("(type \"exit\" to end the session)").dim()
        );
        println!(
            "Recording to {}",
            style(self.session_file.display()).dim()
        );

        loop {
            let message_text: String = input("Message:").placeholder("").interact()?;
            if message_text.trim().eq_ignore_ascii_case("exit") {
                break;
            }
            if message_text.trim().is_empty() {
                continue;
            }

            self.messages.push(Message::user().with_text(&message_text));
            persist_messages(&self.session_file, &self.messages)?;

            let spin = spinner();
            spin.start(format!("{} is thinking...", self.agent.name));

            match self.executor.run(&self.agent, &self.messages).await {
                Ok(result) => {
                    spin.stop("");
                    for message in &result.messages {
                        output::render(message);
                    }
                    self.messages.extend(result.messages);
                    self.agent = result.agent;
                    persist_messages(&self.session_file, &self.messages)?;
                }
                Err(e) => {
                    // the transcript accumulated so far is kept
                    spin.stop("");
                    warn!("turn failed: {:#}", e);
                    println!(
                        "{}",
                        style("Something went wrong handling that request. Your conversation is preserved; please try again.")
                            .red()
                    );
                }
            }
        }

        println!(
            "Closing session. Recorded to {}",
            style(self.session_file.display()).dim()
        );
        Ok(())
    }
}
