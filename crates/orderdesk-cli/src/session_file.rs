use anyhow::Result;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use orderdesk::models::message::Message;

pub fn ensure_session_dir() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let config_dir = home_dir.join(".config").join("orderdesk").join("sessions");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Rewrite the session file with the full transcript, one JSON message
/// per line.
pub fn persist_messages(session_file: &PathBuf, messages: &[Message]) -> Result<()> {
    let file = fs::File::create(session_file)?;
    let mut writer = std::io::BufWriter::new(file);

    for message in messages {
        serde_json::to_writer(&mut writer, &message)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Load a previously recorded transcript. A missing file is an empty
/// transcript.
pub fn load_messages(session_file: &PathBuf) -> Result<Vec<Message>> {
    if !session_file.exists() {
        return Ok(Vec::new());
    }

    let file = fs::File::open(session_file)?;
    let reader = BufReader::new(file);
    let mut messages = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        messages.push(serde_json::from_str(&line)?);
    }
    Ok(messages)
}
