use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use client_core::{HttpIntakeClient, InboxFilter};
use shared::{
    domain::{ItemType, TypeFilter},
    protocol::{AsrScope, AsrTestOptions, DEFAULT_TAG_WINDOW_SEC},
};
use tracing_subscriber::EnvFilter;

mod config;
mod controller;
mod render;

use config::load_settings;
use controller::{
    events::{StatusArea, Tab},
    orchestration::DashboardController,
};

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Review dashboard for the audio intake backend")]
struct Args {
    /// Base URL of the intake backend.
    #[arg(long, global = true)]
    server_url: Option<String>,
    /// tracing filter directive, e.g. `info` or `client_core=debug`.
    #[arg(long, global = true)]
    log_filter: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load mappings, then list the inbox, library and source files.
    Startup,
    /// List inbox items.
    Inbox {
        #[arg(long)]
        only_review: bool,
        #[arg(long = "type", default_value = "ALL")]
        item_type: TypeFilter,
        #[arg(long)]
        index: Option<u32>,
    },
    /// Upload audio files into the inbox.
    Upload { files: Vec<PathBuf> },
    /// Ask the backend to process files waiting in the inbox folder.
    Scan,
    /// Correct the tag of one inbox item and archive it.
    Relabel {
        id: String,
        #[arg(long = "type")]
        item_type: Option<ItemType>,
        #[arg(long)]
        index: Option<u32>,
        #[arg(long)]
        title_zh: Option<String>,
        #[arg(long)]
        title_en: Option<String>,
        /// Show the resolved form and discard it instead of submitting.
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the archived library summary.
    Library {
        #[arg(long = "type")]
        item_type: Option<TypeFilter>,
    },
    /// List the takes archived for one (type, index).
    Takes { item_type: ItemType, index: u32 },
    /// Download an inbox clip or library take.
    Fetch {
        path: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Parse a teacher instruction into requested items.
    Parse { text: String },
    /// Build the daily bundle for a teacher instruction.
    Daily {
        text: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Open the bundle folder on the backend host afterwards.
        #[arg(long)]
        open: bool,
    },
    /// Apply a seed mapping file and reload mappings.
    Seed {
        #[arg(long)]
        seed_file: Option<String>,
    },
    /// Show backend health and ASR engine settings.
    Health,
    /// Transcribe one clip without storing it.
    Asr {
        file: PathBuf,
        #[arg(long, default_value_t = AsrScope::Full)]
        scope: AsrScope,
        /// Seconds from the start of the clip used for tagging.
        #[arg(long, default_value_t = DEFAULT_TAG_WINDOW_SEC)]
        tag_window_sec: u32,
    },
    /// Browse structured source files.
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },
}

impl Command {
    fn tab(&self) -> Tab {
        match self {
            Command::Startup
            | Command::Inbox { .. }
            | Command::Upload { .. }
            | Command::Scan
            | Command::Relabel { .. } => Tab::Inbox,
            Command::Library { .. } | Command::Takes { .. } | Command::Fetch { .. } => {
                Tab::Library
            }
            Command::Parse { .. } | Command::Daily { .. } => Tab::Daily,
            Command::Health | Command::Asr { .. } => Tab::Asr,
            Command::Seed { .. } | Command::Source { .. } => Tab::Source,
        }
    }
}

#[derive(Subcommand, Debug)]
enum SourceAction {
    List,
    Read { name: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings();
    if let Some(v) = args.server_url.clone() {
        settings.server_url = v;
    }
    if let Some(v) = args.log_filter.clone() {
        settings.log_filter = v;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let server_url = settings.server_url()?;
    let client = HttpIntakeClient::new(server_url.as_str())?;
    tracing::info!(server_url = %client.base_url(), "dashboard starting");
    let mut controller = DashboardController::new(Arc::new(client), settings.default_library_type);

    run(&mut controller, args.command).await
}

async fn run(controller: &mut DashboardController, command: Command) -> Result<()> {
    controller.select_tab(command.tab());
    match command {
        Command::Startup => {
            controller.startup().await?;
            print_area(controller, StatusArea::InboxLog);
            print!(
                "{}",
                render::inbox_table(&controller.visible_inbox(), controller.inbox_stats())
            );
            print!("{}", render::library_table(&controller.library_rows()));
            for name in controller.source_files() {
                println!("{name}");
            }
        }
        Command::Inbox {
            only_review,
            item_type,
            index,
        } => {
            controller.refresh_inbox().await?;
            let stats = controller.inbox_stats();
            let visible = controller.set_inbox_filter(InboxFilter {
                only_review,
                item_type,
                index,
            });
            print!("{}", render::inbox_table(&visible, stats));
        }
        Command::Upload { files } => {
            controller.upload_paths(&files).await?;
            print_area(controller, StatusArea::InboxLog);
        }
        Command::Scan => {
            controller.scan().await?;
            print_area(controller, StatusArea::InboxLog);
        }
        Command::Relabel {
            id,
            item_type,
            index,
            title_zh,
            title_en,
            dry_run,
        } => {
            if controller.load_mappings().await.is_err() {
                print_area(controller, StatusArea::InboxLog);
            }
            controller.refresh_inbox().await?;
            controller.pick_for_relabel(&id)?;
            if let Some(item_type) = item_type {
                controller.relabel_change_type(item_type);
            }
            if let Some(index) = index {
                controller.relabel_change_index(index)?;
            }
            if title_zh.is_some() || title_en.is_some() {
                let current = controller.relabel().titles();
                controller.relabel_set_titles(
                    title_zh.as_deref().unwrap_or(&current.zh),
                    title_en.as_deref().unwrap_or(&current.en),
                );
            }
            print!("{}", render::relabel_form(controller.relabel()));
            if dry_run {
                controller.relabel_clear();
            } else {
                controller.relabel_submit().await?;
            }
            print_area(controller, StatusArea::InboxLog);
        }
        Command::Library { item_type } => {
            let filter = item_type.unwrap_or(controller.library_filter());
            controller.set_library_filter(filter).await?;
            print!("{}", render::library_table(&controller.library_rows()));
        }
        Command::Takes { item_type, index } => {
            let takes = controller.show_takes(item_type, index).await?;
            print!("{}", render::take_list(&takes));
        }
        Command::Fetch { path, out } => {
            let bytes = controller.fetch_audio(&path).await?;
            tokio::fs::write(&out, &bytes)
                .await
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("saved {} bytes to {}", bytes.len(), out.display());
        }
        Command::Parse { text } => {
            controller.parse_teacher_command(&text).await?;
            print_area(controller, StatusArea::DailyNeeds);
        }
        Command::Daily { text, date, open } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            controller.build_daily(date, &text).await?;
            if open {
                controller.open_daily_folder().await?;
            }
            for (_, text) in controller.statuses_for(Tab::Daily) {
                println!("{text}\n");
            }
        }
        Command::Seed { seed_file } => {
            controller.apply_seed(seed_file.as_deref()).await?;
            print_area(controller, StatusArea::SourceLog);
        }
        Command::Health => {
            controller.check_health().await?;
            print_area(controller, StatusArea::HealthResult);
        }
        Command::Asr {
            file,
            scope,
            tag_window_sec,
        } => {
            let options = AsrTestOptions {
                scope,
                tag_window_sec,
            };
            controller.asr_test_path(Some(&file), options).await?;
            print_area(controller, StatusArea::AsrResult);
        }
        Command::Source { action } => match action {
            SourceAction::List => {
                for name in controller.refresh_source_files().await? {
                    println!("{name}");
                }
            }
            SourceAction::Read { name } => {
                controller.read_source_file(&name).await?;
                print_area(controller, StatusArea::SourceContent);
            }
        },
    }
    Ok(())
}

fn print_area(controller: &DashboardController, area: StatusArea) {
    if let Some(text) = controller.status(area) {
        println!("{text}");
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
