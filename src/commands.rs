//! CLI command handlers.
//!
//! Each subcommand resolves configuration, builds an `ApiClient` over the
//! selected token store, calls one service wrapper and prints the typed
//! response as pretty JSON.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use drivium_client::api::tokens;
use drivium_client::api::types::{
    FileEditRequest, FolderCreateRequest, FolderEditRequest, LoginRequest, RegisterRequest,
};
use drivium_client::api::{auth, drive, users, ApiClient, ApiError, TokenStoreError};
use drivium_client::config::{Config, ConfigError};

use crate::cli::{Args, Command};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to format output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

pub async fn run(args: Args) -> Result<(), CommandError> {
    let mut config = Config::from_env()?;
    if let Some(url) = args.api_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(ref kind) = args.token_store {
        config.token_store = kind.parse()?;
    }

    let store = config.open_token_store()?;
    let client = ApiClient::from_config(&config, store);
    log::debug!("Using API at {}", client.base_url());

    match args.command {
        Command::Login { username, password } => {
            let password = password_or_prompt(password)?;
            let resp = auth::login(&client, &LoginRequest { username, password }).await?;
            if resp.token().is_some() {
                println!("Logged in.");
            } else {
                println!("Login accepted but no access token was returned.");
            }
        }
        Command::Logout => {
            auth::logout(&client)?;
            println!("Logged out.");
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let user = users::register_user(
                &client,
                &RegisterRequest {
                    username,
                    email,
                    password,
                },
            )
            .await?;
            print_json(&user)?;
        }
        Command::Me => print_json(&users::get_current_user(&client).await?)?,
        Command::Status => status(&config, &client)?,
        Command::Ls { folder_id } => {
            let listing = match folder_id {
                Some(id) => drive::list_folder_contents(&client, id).await?,
                None => drive::list_root_folder_contents(&client).await?,
            };
            print_json(&listing)?;
        }
        Command::Mkdir { name, parent } => {
            let folder = drive::create_folder(
                &client,
                &FolderCreateRequest {
                    name,
                    parent_folder_id: parent,
                },
            )
            .await?;
            print_json(&folder)?;
        }
        Command::Rmdir { folder_id } => {
            print_json(&drive::delete_folder(&client, folder_id).await?)?
        }
        Command::Mvdir {
            folder_id,
            name,
            parent,
            to_root,
        } => {
            let edit = FolderEditRequest {
                new_name: name,
                new_parent_folder_id: move_target(parent, to_root),
            };
            ensure_edit(edit.new_name.is_some() || edit.new_parent_folder_id.is_some())?;
            print_json(&drive::edit_folder(&client, folder_id, &edit).await?)?;
        }
        Command::Upload {
            path,
            folder,
            name,
            mime,
        } => {
            let name = match name {
                Some(n) => n,
                None => file_name_of(&path)?,
            };
            let data = tokio::fs::read(&path).await?;
            let target = drive::upload_file(
                &client,
                drive::UploadFile {
                    name,
                    data,
                    mime_type: mime,
                    folder_id: folder,
                },
            )
            .await?;
            println!("Uploaded as file {}.", target.file_id);
        }
        Command::Download { file_id, out } => {
            let link = drive::request_file_download_url(&client, file_id).await?;
            let data = drive::download_from_presigned_url(&client, &link.url).await?;
            let out = out.unwrap_or_else(|| PathBuf::from(format!("file-{}", file_id)));
            if out.as_os_str() == "-" {
                io::stdout().write_all(&data)?;
            } else {
                tokio::fs::write(&out, &data).await?;
                eprintln!("Wrote {} bytes to {}", data.len(), out.display());
            }
        }
        Command::Rm { file_id } => print_json(&drive::delete_file(&client, file_id).await?)?,
        Command::Mv {
            file_id,
            name,
            folder,
            to_root,
        } => {
            let edit = FileEditRequest {
                new_name: name,
                new_folder_id: move_target(folder, to_root),
            };
            ensure_edit(edit.new_name.is_some() || edit.new_folder_id.is_some())?;
            print_json(&drive::edit_file(&client, file_id, &edit).await?)?;
        }
    }

    Ok(())
}

fn status(config: &Config, client: &ApiClient) -> Result<(), CommandError> {
    println!("API:         {}", client.base_url());
    println!("Token store: {:?}", config.token_store);

    match client.access_token()? {
        None => println!("Session:     not logged in"),
        Some(token) => match tokens::decode_claims(&token) {
            Ok(claims) => {
                println!(
                    "Session:     {}",
                    claims.username.as_deref().unwrap_or("(unknown user)")
                );
                if let Some(exp) = claims.exp {
                    println!("Expires:     {} (unix time)", exp);
                }
            }
            Err(e) => {
                log::debug!("Stored token is not a readable JWT: {}", e);
                println!("Session:     token stored (opaque)");
            }
        },
    }
    Ok(())
}

/// `Some(Some(id))` to move into a folder, `Some(None)` to move to the root.
fn move_target(target: Option<i64>, to_root: bool) -> Option<Option<i64>> {
    if to_root {
        Some(None)
    } else {
        target.map(Some)
    }
}

fn ensure_edit(has_change: bool) -> Result<(), CommandError> {
    if has_change {
        Ok(())
    } else {
        Err(CommandError::Usage(
            "nothing to change: pass --name and/or a destination".to_string(),
        ))
    }
}

fn file_name_of(path: &Path) -> Result<String, CommandError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| CommandError::Usage(format!("cannot derive a file name from {}", path.display())))
}

fn password_or_prompt(password: Option<String>) -> Result<String, CommandError> {
    if let Some(p) = password {
        return Ok(p);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
