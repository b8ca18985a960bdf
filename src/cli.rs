use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kasmctl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative management of Kasm Workspaces objects", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Kasm deployment URL
    #[arg(long, env = "KASM_URL", global = true)]
    pub url: Option<String>,

    /// API key
    #[arg(long, env = "KASM_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// API key secret
    #[arg(long, env = "KASM_API_SECRET", global = true, hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Give up on the whole run after this many seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// State file (defaults to the state directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the object kinds and data sources kasmctl manages
    Kinds,

    /// Show what applying a manifest would change (reads state only)
    Plan {
        /// Manifest file
        manifest: PathBuf,
    },

    /// Create, update and delete objects to match a manifest
    Apply {
        /// Manifest file
        manifest: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Number of parallel jobs
        #[arg(short, long, default_value = "4")]
        jobs: usize,
    },

    /// Re-read every recorded object from the server
    Refresh {
        /// Number of parallel jobs
        #[arg(short, long, default_value = "4")]
        jobs: usize,
    },

    /// Start managing an existing object
    Import {
        /// Address to record it under
        address: String,

        /// Object kind (see `kasmctl kinds`)
        kind: String,

        /// Server ObjectID
        id: String,
    },

    /// Delete recorded objects (all of them if no address is given)
    Destroy {
        /// Addresses to delete
        addresses: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Number of parallel jobs
        #[arg(short, long, default_value = "4")]
        jobs: usize,
    },

    /// Show recorded state
    Show {
        /// Address to show (lists every record if omitted)
        address: Option<String>,
    },

    /// Query a read-only data source
    #[command(subcommand)]
    Lookup(LookupCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Lookup Commands
// ============================================================================

#[derive(Subcommand)]
pub enum LookupCommand {
    /// Connection details of a running session
    ConnectionInfo {
        /// Session (kasm) ID
        #[arg(long)]
        kasm_id: String,

        /// Owner's user ID
        #[arg(long)]
        user_id: String,

        /// Don't ask the agent whether the session is reachable
        #[arg(long)]
        skip_agent_check: bool,

        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },
}
