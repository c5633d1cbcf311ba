use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "lexbrief", about = "Terminal client for the legal document summarizer")]
pub struct Cli {
    /// Summarizer backend URL
    #[arg(long, env = "LEXBRIEF_SERVER_URL", default_value = "http://127.0.0.1:5000")]
    pub server_url: String,

    /// Target summary length in words. Non-numeric values fall back to 500.
    #[arg(long, env = "LEXBRIEF_WORD_COUNT")]
    pub word_count: Option<String>,

    /// Where the TUI writes its logs (stderr is used in headless mode).
    #[arg(long, env = "LEXBRIEF_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// How long to wait for the backend health check at startup (seconds).
    #[arg(long, env = "LEXBRIEF_CONNECT_TIMEOUT", default_value = "10")]
    pub connect_timeout: u64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Summarize once and print the result to stdout
    Summarize {
        /// PDF, DOCX or TXT file to upload
        #[arg(long)]
        file: Option<PathBuf>,

        /// Document text or instructions; `-` reads stdin
        #[arg(long)]
        text: Option<String>,
    },
}

impl Cli {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("lexbrief.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["lexbrief"]).unwrap();
        assert_eq!(cli.server_url, "http://127.0.0.1:5000");
        assert_eq!(cli.connect_timeout(), Duration::from_secs(10));
        assert!(cli.command.is_none());
        assert!(cli.log_path().ends_with("lexbrief.log"));
    }

    #[test]
    fn summarize_subcommand() {
        let cli = Cli::try_parse_from([
            "lexbrief",
            "--server-url",
            "http://legal.internal:8080",
            "--word-count",
            "300",
            "summarize",
            "--file",
            "order.pdf",
        ])
        .unwrap();
        assert_eq!(cli.word_count.as_deref(), Some("300"));
        match cli.command {
            Some(Command::Summarize { file, text }) => {
                assert_eq!(file, Some(PathBuf::from("order.pdf")));
                assert!(text.is_none());
            }
            None => panic!("expected summarize"),
        }
    }
}
