//! Notification surface that renders to the terminal.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use client_core::{NotificationIcon, NotificationSpec, NotificationSurface, ProgressBar};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader, Lines, Stdin},
    sync::Mutex,
};

/// Prompt answers are read from one long-lived reader so input typed ahead
/// of a prompt is kept for the next one.
pub struct TerminalSurface<R = Stdin> {
    answers: Mutex<Lines<BufReader<R>>>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::from_reader(tokio::io::stdin())
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncRead + Unpin> TerminalSurface<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            answers: Mutex::new(BufReader::new(reader).lines()),
        }
    }
}

fn render(spec: &NotificationSpec) -> String {
    let marker = match spec.icon {
        NotificationIcon::Info => "[i]",
        NotificationIcon::Error => "[!]",
        NotificationIcon::Success => "[ok]",
    };
    let mut out = format!("{marker} {}\n    {}", spec.title, spec.body.replace('\n', "\n    "));
    match spec.progress {
        Some(ProgressBar::Determinate(pct)) => {
            let filled = (usize::from(pct) / 5).min(20);
            out.push_str(&format!(
                "\n    [{}{}]",
                "#".repeat(filled),
                "-".repeat(20 - filled)
            ));
        }
        Some(ProgressBar::Indeterminate) => out.push_str("\n    [ ... ]"),
        None => {}
    }
    if let Some(after) = spec.auto_dismiss {
        out.push_str(&format!("\n    (closes in {}s)", after.as_secs()));
    }
    out
}

#[async_trait]
impl<R> NotificationSurface for TerminalSurface<R>
where
    R: AsyncRead + Unpin + Send,
{
    fn show(&self, spec: &NotificationSpec) {
        println!("{}", render(spec));
    }

    async fn choose(&self, spec: &NotificationSpec) -> Result<String> {
        println!("{}", render(spec));
        for (idx, choice) in spec.choices.iter().enumerate() {
            println!("    {}) {choice}", idx + 1);
        }

        let mut answers = self.answers.lock().await;
        loop {
            let line = answers
                .next_line()
                .await?
                .ok_or_else(|| anyhow!("stdin closed before a choice was made"))?;
            let answer = line.trim();
            let picked = answer
                .parse::<usize>()
                .ok()
                .and_then(|idx| idx.checked_sub(1))
                .and_then(|idx| spec.choices.get(idx))
                .or_else(|| {
                    spec.choices
                        .iter()
                        .find(|choice| choice.eq_ignore_ascii_case(answer))
                });
            match picked {
                Some(choice) => return Ok(choice.clone()),
                None => println!("    choose 1-{}", spec.choices.len()),
            }
        }
    }

    fn hide(&self) {}
}
