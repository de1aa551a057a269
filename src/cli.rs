use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ytgram")]
#[command(author, version, about = "Telegram bot for downloading media via yt-dlp", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (default when no subcommand is given)
    Run,

    /// Update the yt-dlp binary and exit
    UpdateYtdlp {
        /// Only print the installed version, do not update
        #[arg(long)]
        check: bool,
    },

    /// Probe a URL and print its media info
    Probe {
        /// The URL to inspect
        url: String,

        /// Print the raw quality table as JSON-ish debug output
        #[arg(long)]
        verbose: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
