//! Command-line interface definition.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "taskshell", about = "Offline-first goal-to-checklist client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mirror the shell assets for offline use and sweep stale generations
    Install,
    /// Break a goal into a short checklist of tasks
    Plan {
        /// The goal to decompose
        goal: String,
    },
    /// Fetch one resource through the offline worker
    Open {
        /// Origin-relative path, e.g. /index.html
        path: String,
        /// Treat the request as a top-level page navigation
        #[arg(long)]
        navigate: bool,
    },
}
