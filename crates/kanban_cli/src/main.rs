//! `kanban` command-line shell.
//!
//! Every command opens the board database, makes sure the board is seeded,
//! runs one engine operation and prints a JSON envelope on stdout. Failures
//! exit with status 1.

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kanban_core::{
    init_logging, normalize_level, open_db, BoardConfig, BoardService, BoardServiceError, CardPatch,
    ColumnId, ColumnKey, CreateCardRequest, SqliteBoardStore,
};
use log::info;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;

use output::{card_json, checklist_json, column_label, failure, success};

const GLOBAL_HELP: &str = "\
Columns: todo, doing, done

Environment:
  KANBAN_DB_PATH     Database file (default .kanban/app.db)
  KANBAN_LOG_LEVEL   trace|debug|info|warn|error
  KANBAN_LOG_DIR     Enables file logging in this directory";

#[derive(Parser)]
#[command(name = "kanban")]
#[command(version)]
#[command(about = "Kanban board automation with JSON output")]
#[command(after_help = GLOBAL_HELP)]
struct Cli {
    /// Database file, overrides KANBAN_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log directory, overrides KANBAN_LOG_DIR
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level, overrides KANBAN_LOG_LEVEL
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a card at the end of a column
    Add {
        title: String,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, short, default_value = "todo")]
        column: String,
        /// Due date, YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]
        #[arg(long)]
        due: Option<String>,
        /// Parent card id; the child lands in the parent's column
        #[arg(long)]
        parent: Option<i64>,
    },

    /// List top-level cards, optionally for one column
    List { column: Option<String> },

    /// Move a card to a column (at the end unless --position is given)
    Move {
        card_id: i64,
        column: String,
        #[arg(long, allow_negative_numbers = true)]
        position: Option<i64>,
    },

    /// Update title, notes or due date; an empty --due clears it
    Update {
        card_id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },

    /// Remove a card with its children and checklist
    Remove { card_id: i64 },

    /// Add a checklist item to a card
    Checklist { card_id: i64, text: String },

    /// Toggle a checklist item
    Toggle { item_id: i64 },

    /// Remove a checklist item
    ChecklistRemove { item_id: i64 },

    /// Card counts per column
    Status,

    /// Print the whole board
    Show,

    /// Delete every card and reseed the board
    Reset {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(fields) => {
            println!("{}", success(fields));
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("{}", failure(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Value> {
    let config = resolve_config(&cli)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir)
            .map_err(anyhow::Error::msg)
            .context("logging init failed")?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("cannot open database `{}`", config.db_path.display()))?;
    let store = SqliteBoardStore::try_new(&conn)?;
    let service = BoardService::new(store);
    service.ensure_seed()?;

    let command_name = command_name(&cli.command);
    let fields = dispatch(&service, cli.command)?;
    info!("event=cli_command module=cli status=ok command={command_name}");
    Ok(fields)
}

fn resolve_config(cli: &Cli) -> Result<BoardConfig> {
    let mut config = BoardConfig::from_env()?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = normalize_level(level).map_err(anyhow::Error::msg)?;
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if let Some(dir) = config.log_dir.take() {
        let absolute = if dir.is_absolute() {
            dir
        } else {
            std::env::current_dir()?.join(dir)
        };
        config.log_dir = Some(absolute);
    }
    Ok(config)
}

fn dispatch(service: &BoardService<SqliteBoardStore<'_>>, command: Commands) -> Result<Value> {
    let fields = match command {
        Commands::Add {
            title,
            notes,
            column,
            due,
            parent,
        } => {
            // A missing parent falls through so the engine reports the bad reference.
            let column_id = match parent.map(|parent_id| service.get_card(parent_id)) {
                Some(Ok(parent)) => parent.column_id,
                Some(Err(err)) if !err.is_not_found() => return Err(err.into()),
                _ => parse_column(&column)?,
            };
            let card = service.create_card(&CreateCardRequest {
                column_id,
                parent_id: parent,
                title,
                notes,
                due_at: due,
            })?;
            json!({
                "card_id": card.id,
                "title": card.title,
                "column": column_label(card.column_id),
                "position": card.position,
            })
        }

        Commands::List { column } => {
            let column_id = column.as_deref().map(parse_column).transpose()?;
            let cards: Vec<Value> = service
                .list_cards(column_id)?
                .iter()
                .map(|summary| {
                    let mut card = card_json(&summary.card);
                    card["child_count"] = json!(summary.child_count);
                    card["checklist_count"] = json!(summary.checklist_count);
                    card["checklist_done"] = json!(summary.checklist_done);
                    card
                })
                .collect();
            json!({ "count": cards.len(), "cards": cards })
        }

        Commands::Move {
            card_id,
            column,
            position,
        } => {
            let column_id = parse_column(&column)?;
            let moved = match position {
                Some(position) => service.move_card(card_id, column_id, position)?,
                None => service.move_card_to_end(card_id, column_id)?,
            };
            json!({
                "card_id": moved.card_id,
                "moved_from": column_label(moved.from_column_id),
                "moved_to": column_label(moved.to_column_id),
                "position": moved.position,
            })
        }

        Commands::Update {
            card_id,
            title,
            notes,
            due,
        } => {
            let card = service.update_card(
                card_id,
                &CardPatch {
                    title,
                    notes,
                    due_at: due,
                },
            )?;
            json!({ "card": card_json(&card) })
        }

        Commands::Remove { card_id } => {
            let deletion = service.delete_card(card_id)?;
            json!({
                "card_id": deletion.card_id,
                "removed_children": deletion.removed_children,
                "removed_checklist_items": deletion.removed_checklist_items,
                "message": "Card deleted successfully",
            })
        }

        Commands::Checklist { card_id, text } => {
            checklist_json(&service.add_checklist_item(card_id, &text)?)
        }

        Commands::Toggle { item_id } => checklist_json(&service.toggle_checklist_item(item_id)?),

        Commands::ChecklistRemove { item_id } => {
            let removed = service.delete_checklist_item(item_id)?;
            json!({ "item_id": removed.id, "card_id": removed.card_id })
        }

        Commands::Status => {
            let status = service.get_status()?;
            let mut counts = serde_json::Map::new();
            for entry in &status.columns {
                let key = ColumnKey::from_id(entry.column_id)
                    .map(|key| key.label().to_string())
                    .unwrap_or_else(|| entry.name.to_lowercase());
                counts.insert(key, json!(entry.count));
            }
            counts.insert("total".to_string(), json!(status.total));
            json!({ "status": counts })
        }

        Commands::Show => json!({ "board": serde_json::to_value(service.board_snapshot()?)? }),

        Commands::Reset { yes } => {
            if !yes {
                return Err(BoardServiceError::InvalidInput(
                    "reset deletes every card; pass --yes to confirm".to_string(),
                )
                .into());
            }
            let (removed, board) = service.reset_board()?;
            json!({ "removed": removed, "board": board })
        }
    };
    Ok(fields)
}

fn parse_column(value: &str) -> Result<ColumnId> {
    let key = value
        .parse::<ColumnKey>()
        .map_err(BoardServiceError::InvalidInput)?;
    Ok(key.id())
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Add { .. } => "add",
        Commands::List { .. } => "list",
        Commands::Move { .. } => "move",
        Commands::Update { .. } => "update",
        Commands::Remove { .. } => "remove",
        Commands::Checklist { .. } => "checklist",
        Commands::Toggle { .. } => "toggle",
        Commands::ChecklistRemove { .. } => "checklist-remove",
        Commands::Status => "status",
        Commands::Show => "show",
        Commands::Reset { .. } => "reset",
    }
}
