mod commands;

use clap::Parser;

use cli::Args;

/// Command-line arguments.
mod cli {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};

    #[derive(Parser, Debug)]
    #[command(name = "drivium", version, about = "Command-line client for a Drivium drive")]
    pub struct Args {
        /// Backend base URL (overrides DRIVIUM_API_URL)
        #[arg(long, global = true)]
        pub api_url: Option<String>,

        /// Token store: file, keyring or memory (overrides DRIVIUM_TOKEN_STORE)
        #[arg(long, global = true)]
        pub token_store: Option<String>,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Subcommand, Debug)]
    pub enum Command {
        /// Log in and store the access token
        Login {
            username: String,
            /// Password (prompted on stdin when omitted)
            #[arg(long, env = "DRIVIUM_PASSWORD", hide_env_values = true)]
            password: Option<String>,
        },
        /// Forget the stored access token
        Logout,
        /// Create a new account
        Register {
            username: String,
            email: String,
            #[arg(long, env = "DRIVIUM_PASSWORD", hide_env_values = true)]
            password: Option<String>,
        },
        /// Show the logged-in user
        Me,
        /// Show configuration and stored token details
        Status,
        /// List a folder (root when no id is given)
        Ls { folder_id: Option<i64> },
        /// Create a folder
        Mkdir {
            name: String,
            #[arg(long)]
            parent: Option<i64>,
        },
        /// Delete a folder
        Rmdir { folder_id: i64 },
        /// Rename and/or move a folder
        Mvdir {
            folder_id: i64,
            #[arg(long)]
            name: Option<String>,
            #[arg(long, conflicts_with = "to_root")]
            parent: Option<i64>,
            /// Move the folder to the root
            #[arg(long)]
            to_root: bool,
        },
        /// Upload a local file
        Upload {
            path: PathBuf,
            /// Destination folder (root when omitted)
            #[arg(long)]
            folder: Option<i64>,
            /// Name to store the file under (defaults to the local file name)
            #[arg(long)]
            name: Option<String>,
            #[arg(long, default_value = "application/octet-stream")]
            mime: String,
        },
        /// Download a file
        Download {
            file_id: i64,
            /// Output path (`-` for stdout)
            #[arg(long, short)]
            out: Option<PathBuf>,
        },
        /// Delete a file
        Rm { file_id: i64 },
        /// Rename and/or move a file
        Mv {
            file_id: i64,
            #[arg(long)]
            name: Option<String>,
            #[arg(long, conflicts_with = "to_root")]
            folder: Option<i64>,
            /// Move the file to the root
            #[arg(long)]
            to_root: bool,
        },
    }
}

#[tokio::main]
async fn main() {
    // Load .env so the CLI shares VITE_API_URL with the web app
    let _ = dotenvy::dotenv();

    env_logger::init();

    let args = Args::parse();
    if let Err(e) = commands::run(args).await {
        log::debug!("Command failed: {:?}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
