mod display;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use ppu_core::fields::{check_date, check_digits, check_time};
use ppu_core::{CaseSnapshot, DeadlineKind, EditSession, FormField, Meridiem, SiNo};
use ppu_sync::search::debounced;
use ppu_sync::submit::SAVED_MESSAGE;
use ppu_sync::{PdfAttachment, SearchQuery, SearchSession, SubmitSession, SyncClient, SyncError};
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_API_URL: &str = "http://localhost:5001";

/// How long a finished submit waits for its history refresh before exiting.
const HISTORY_REFRESH_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "ppu", version)]
#[command(about = "registro PPU: e_situacional labels, deadlines and case updates")]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "PPU_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview the e_situacional label for a notification
    Label {
        #[command(flatten)]
        notification: NotificationArgs,
    },
    /// Mask and validate a date (dd-mm-aaaa)
    Date { raw: String },
    /// Mask and validate a time (hh:mm)
    Time { raw: String },
    /// Strip a value to digits
    Digits { raw: String },
    /// Print the update records a submit would send
    Assemble {
        #[command(flatten)]
        case: CaseArgs,
        #[command(flatten)]
        notification: NotificationArgs,
        #[command(flatten)]
        deadline: DeadlineArgs,
        /// Print grouped cards instead of JSON
        #[arg(long)]
        cards: bool,
    },
    /// Assemble and send the update to the backend
    Submit {
        #[command(flatten)]
        case: CaseArgs,
        #[command(flatten)]
        notification: NotificationArgs,
        #[command(flatten)]
        deadline: DeadlineArgs,
        /// PDF to attach to the update
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Search stored cases
    Search {
        /// Free-text query
        #[arg(default_value = "")]
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Lawyer filter, either `NAME` or `CODE; NAME`
        #[arg(long)]
        lawyer: Option<String>,
        /// Include archived cases
        #[arg(long)]
        archived: bool,
        /// Read queries from stdin, one per line; each line replaces the
        /// pending search
        #[arg(long)]
        interactive: bool,
    },
}

/// The stored case the form is opened on.
#[derive(Args)]
struct CaseArgs {
    /// Registro PPU of the case
    #[arg(long)]
    case_id: Option<String>,
    /// Current e_situacional, prefilled as free text
    #[arg(long)]
    current_label: Option<String>,
}

#[derive(Args)]
struct NotificationArgs {
    /// Notification type, e.g. DISPOSICIÓN or CÉDULA
    #[arg(long = "type", default_value = "")]
    notification_type: String,
    #[arg(long)]
    number: Option<String>,
    /// Use S/N as the number
    #[arg(long, conflicts_with = "number")]
    without_number: bool,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    notebook: Option<String>,
    #[arg(long)]
    place: Option<String>,
    /// ACTA subtype
    #[arg(long)]
    subtype: Option<String>,
    /// ACTA has a notebook
    #[arg(long)]
    has_notebook: bool,
    /// DISPOSICIÓN issued by the superior office
    #[arg(long)]
    superior: bool,
    /// Free text after the prefix
    #[arg(long)]
    text: Option<String>,
}

#[derive(Args)]
struct DeadlineArgs {
    /// AUDIENCIA, REQUERIMIENTO or AMBOS
    #[arg(long)]
    kind: Option<DeadlineKind>,
    #[arg(long)]
    defendant: Option<String>,
    #[arg(long)]
    notification_date: Option<String>,
    /// Mark the update as rescheduled
    #[arg(long)]
    rescheduled: bool,
    /// AM or PM
    #[arg(long)]
    meridiem: Option<Meridiem>,
    #[arg(long)]
    hearing_action: Option<String>,
    #[arg(long)]
    hearing_time: Option<String>,
    #[arg(long)]
    hearing_date: Option<String>,
    #[arg(long)]
    requirement_action: Option<String>,
    #[arg(long)]
    term_days: Option<String>,
    #[arg(long)]
    requirement_date: Option<String>,
}

impl NotificationArgs {
    fn apply(&self, session: &mut EditSession) {
        let draft = &mut session.notification;
        draft.notification_type = self.notification_type.clone();
        if self.without_number {
            draft.toggle_without_number();
        } else if let Some(number) = &self.number {
            draft.number = number.clone();
        }
        draft.year = self.year.clone().unwrap_or_default();
        draft.notebook = self.notebook.clone().unwrap_or_default();
        draft.place = self.place.clone().unwrap_or_default();
        draft.acta_subtype = self.subtype.clone().unwrap_or_default();
        draft.has_notebook = SiNo::from(self.has_notebook);
        draft.superior = self.superior;
        if let Some(text) = &self.text {
            draft.free_text = text.clone();
        }
    }
}

impl DeadlineArgs {
    /// Replay the arguments as form edits, kind first, so masks and the
    /// AMBOS date sync behave as they do interactively.
    fn apply(&self, session: &mut EditSession) {
        if let Some(kind) = self.kind
            && session.deadline.kind != Some(kind)
        {
            session.toggle_kind(kind);
        }
        if self.rescheduled {
            session.deadline.rescheduled = SiNo::Si;
        }
        if self.meridiem.is_some() {
            session.deadline.meridiem = self.meridiem;
        }

        let edits = [
            (FormField::Defendant, &self.defendant),
            (FormField::NotificationDate, &self.notification_date),
            (FormField::HearingAction, &self.hearing_action),
            (FormField::HearingTime, &self.hearing_time),
            (FormField::HearingDate, &self.hearing_date),
            (FormField::RequirementAction, &self.requirement_action),
            (FormField::TermDays, &self.term_days),
            (FormField::RequirementDate, &self.requirement_date),
        ];
        for (field, value) in edits {
            if let Some(raw) = value {
                session.edit(field, raw);
            }
        }
    }
}

fn open_session(
    case: &CaseArgs,
    notification: &NotificationArgs,
    deadline: &DeadlineArgs,
) -> EditSession {
    let snapshot = CaseSnapshot {
        registro_ppu: case.case_id.clone(),
        e_situacional: case.current_label.clone(),
        ..Default::default()
    };
    let mut session = EditSession::open(&snapshot);
    notification.apply(&mut session);
    deadline.apply(&mut session);
    session
}

fn user_error(e: SyncError) -> anyhow::Error {
    anyhow!(e.user_message())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(api_url = %cli.api_url, "ppu v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Label { notification } => {
            let mut session = EditSession::default();
            notification.apply(&mut session);
            display::print_label(&session.preview_label());
        }
        Commands::Date { raw } => return Ok(check(check_date(&raw), "date")),
        Commands::Time { raw } => return Ok(check(check_time(&raw), "time")),
        Commands::Digits { raw } => return Ok(check(check_digits(&raw), "digits")),
        Commands::Assemble {
            case,
            notification,
            deadline,
            cards,
        } => {
            let session = open_session(&case, &notification, &deadline);
            let records = session.records_now()?;
            if cards {
                display::print_records(&records)?;
            } else {
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
        }
        Commands::Submit {
            case,
            notification,
            deadline,
            pdf,
        } => {
            let session = open_session(&case, &notification, &deadline);
            let attachment = match pdf {
                Some(path) => Some(PdfAttachment::from_path(&path).await.map_err(user_error)?),
                None => None,
            };

            let client = SyncClient::new(cli.api_url);
            let submitter = SubmitSession::new(Arc::new(client));
            let outcome = submitter
                .submit(&session, attachment.as_ref())
                .await
                .map_err(user_error)?;

            println!(
                "{}",
                outcome.reply.message.as_deref().unwrap_or(SAVED_MESSAGE)
            );
            if let Some(refresh) = outcome.history_refresh
                && tokio::time::timeout(HISTORY_REFRESH_GRACE, refresh)
                    .await
                    .is_err()
            {
                tracing::debug!("history refresh still running at exit");
            }
        }
        Commands::Search {
            query,
            page,
            lawyer,
            archived,
            interactive,
        } => {
            let client = SyncClient::new(cli.api_url);
            let query = SearchQuery {
                page,
                query,
                lawyer,
                show_archived: archived,
            };
            if interactive {
                return search_interactive(client, query).await;
            }

            let mut searches = SearchSession::default();
            let handle = searches.begin();

            let on_interrupt = handle.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            let result = client
                .search_cases(&query, &handle)
                .await
                .map_err(user_error)
                .context("search failed")?;
            display::print_search_page(&result);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Type-ahead search: every stdin line starts a debounced search and cancels
/// the one still pending.
async fn search_interactive(client: SyncClient, base: SearchQuery) -> anyhow::Result<ExitCode> {
    let client = Arc::new(client);
    let mut searches = SearchSession::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = None;

    while let Some(line) = lines.next_line().await? {
        let handle = searches.begin();
        let debounce = searches.debounce();
        let client = Arc::clone(&client);
        let query = SearchQuery {
            query: line.trim().to_string(),
            ..base.clone()
        };
        last = Some(tokio::spawn(async move {
            match debounced(&handle, debounce, client.search_cases(&query, &handle)).await {
                Ok(page) => display::print_search_page(&page),
                Err(SyncError::Cancelled) => {
                    tracing::debug!(query = %query.query, "search superseded");
                }
                Err(e) => eprintln!("{}", e.user_message()),
            }
        }));
    }

    if let Some(task) = last {
        task.await?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Print a masked value and report whether it is valid.
fn check((value, error): (String, Option<ppu_core::FieldError>), name: &str) -> ExitCode {
    let failed = error.is_some();
    display::print_field(name, &value, error.map(|e| e.to_string()));
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
