use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rss-bot")]
#[command(about = "Post new RSS feed entries to chat channels")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Subscribe a channel to a feed URL
    Subscribe {
        /// Channel that receives new entries
        channel: String,
        /// Feed URL, e.g. https://example.com/index.xml
        url: String,
    },

    /// List subscriptions
    List {
        /// Only show subscriptions of this channel
        #[arg(short, long)]
        channel: Option<String>,
    },

    /// Remove a subscription by id
    Unsubscribe {
        /// Subscription id as shown by `list`
        id: i64,
        /// Only remove the subscription if it belongs to this channel
        #[arg(short, long)]
        channel: Option<String>,
    },

    /// Fetch a feed once and show its latest entry
    Check {
        /// Feed URL to probe
        url: String,
        /// Also post the entry to this channel
        #[arg(short, long)]
        channel: Option<String>,
    },

    /// Poll all subscriptions and post new entries until interrupted
    Run {
        /// Print notifications instead of sending them (entries are still recorded)
        #[arg(long)]
        dry_run: bool,

        /// Run a single polling pass and exit
        #[arg(long)]
        once: bool,
    },
}
