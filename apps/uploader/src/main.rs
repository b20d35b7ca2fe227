mod config;
mod errors;
mod files_client;
mod models;
mod upload;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::files_client::{AgentUploader, FilesClient};
use crate::models::file::CandidateFile;
use crate::upload::drop_zone::ElementId;
use crate::upload::format::format_file_size;
use crate::upload::selection::apply_validation;
use crate::upload::validator::{classify, validate};
use crate::upload::{NotificationSink, PolicyPreset, TracingSink, UploadController};

#[derive(Debug, Parser)]
#[command(name = "uploader", version, about = "Validate and upload agent attachments")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify files against a policy without uploading anything
    Check {
        #[arg(long, value_enum, default_value_t = PolicyPreset::General)]
        preset: PolicyPreset,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Validate, then upload the accepted files one by one
    Upload {
        #[arg(long)]
        agent_id: Uuid,
        #[arg(long, value_enum, default_value_t = PolicyPreset::General)]
        preset: PolicyPreset,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the files stored for an agent
    List {
        #[arg(long)]
        agent_id: Uuid,
    },
    /// Print a signed download URL for a file
    Url { file_id: Uuid },
    /// Delete a stored file
    Delete { file_id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting uploader v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Check { preset, files } => check(preset, &files).await?,
        Command::Upload {
            agent_id,
            preset,
            files,
        } => upload(&config, agent_id, preset, &files).await?,
        Command::List { agent_id } => list(&config, agent_id).await?,
        Command::Url { file_id } => {
            let session = config.session()?;
            let url = client(&config)?
                .get_file_url(file_id, session.user_id)
                .await
                .map_err(AppError::from)?;
            println!("{}\t{}", url.filename, url.signed_url);
        }
        Command::Delete { file_id } => {
            let session = config.session()?;
            client(&config)?
                .delete_file(file_id, session.user_id)
                .await
                .map_err(AppError::from)?;
            println!("Deleted {file_id}");
        }
    }

    Ok(())
}

fn client(config: &Config) -> Result<FilesClient, AppError> {
    Ok(FilesClient::new(&config.backend_url, config.upload_timeout)?)
}

async fn load_candidates(paths: &[PathBuf]) -> Result<Vec<CandidateFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = CandidateFile::from_path(path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

async fn check(preset: PolicyPreset, paths: &[PathBuf]) -> Result<()> {
    let policy = preset.policy();
    let files = load_candidates(paths).await?;

    for file in &files {
        println!(
            "{:<40} {:>10}  {:<28} {:?}",
            file.name,
            format_file_size(file.byte_size),
            file.mime_type,
            classify(file, &policy)
        );
    }

    let (selection, notifications) = apply_validation(validate(files, &policy), Default::default());
    TracingSink.notify_all(&notifications);
    if let Some(error) = &selection.last_error {
        warn!("{error}");
    }
    println!("{}", selection.file_list_label());
    Ok(())
}

async fn upload(
    config: &Config,
    agent_id: Uuid,
    preset: PolicyPreset,
    paths: &[PathBuf],
) -> Result<()> {
    let session = config.session()?;
    info!("Uploading as {}", session.display_name());

    let mut controller =
        UploadController::new(preset.policy(), ElementId(0), Arc::new(TracingSink));
    controller.select_files(load_candidates(paths).await?);
    if controller.selection().is_empty() {
        return Err(AppError::Validation("No files passed validation".to_string()).into());
    }
    info!(
        "{} ({})",
        controller.selection().file_list_label(),
        format_file_size(controller.selection().total_bytes())
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling remaining uploads");
            interrupt.cancel();
        }
    });

    let mut progress = controller.subscribe();
    tokio::spawn(async move {
        let mut last = None;
        while progress.changed().await.is_ok() {
            let snapshot = progress.borrow_and_update().clone();
            if snapshot.uploading && last != Some(snapshot.overall_percentage) {
                info!("Upload progress: {}%", snapshot.overall_percentage);
                last = Some(snapshot.overall_percentage);
            }
        }
    });

    let uploader = AgentUploader::new(client(config)?, agent_id, &session);
    let records = controller.upload_selected(&uploader, &cancel).await;
    for record in &records {
        println!(
            "{}\t{}\t{}",
            record.id,
            record.filename,
            format_file_size(record.file_size)
        );
    }
    Ok(())
}

async fn list(config: &Config, agent_id: Uuid) -> Result<()> {
    let session = config.session()?;
    let files = client(config)?
        .list_agent_files(agent_id, session.user_id)
        .await
        .map_err(AppError::from)?;

    for file in &files {
        println!(
            "{}\t{:<40}\t{:>10}\t{}",
            file.id,
            file.filename,
            format_file_size(file.file_size),
            file.uploaded_at.format("%Y-%m-%d %H:%M")
        );
    }
    info!("{} file(s) for agent {agent_id}", files.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_upload() {
        let agent = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "uploader",
            "upload",
            "--agent-id",
            &agent.to_string(),
            "--preset",
            "resume",
            "cv.pdf",
        ])
        .unwrap();
        match cli.command {
            Command::Upload {
                agent_id,
                preset,
                files,
            } => {
                assert_eq!(agent_id, agent);
                assert_eq!(preset, PolicyPreset::Resume);
                assert_eq!(files, vec![PathBuf::from("cv.pdf")]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_check_requires_files() {
        assert!(Cli::try_parse_from(["uploader", "check"]).is_err());
    }

    #[tokio::test]
    async fn test_load_candidates_reports_missing_path() {
        let err = load_candidates(&[PathBuf::from("/definitely/not/here.pdf")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }
}
