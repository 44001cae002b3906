use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use referral_core::{
    CoreConfig, FileStore, ListFilter, Principal, Priority, ReferralDraft, ReferralService,
    ReferralView, Role, Status, TrafficKind, DEFAULT_DATA_DIR,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "referral")]
#[command(about = "Inter-department referral system CLI")]
struct Cli {
    /// Acting principal identifier
    #[arg(long, default_value = "cli")]
    actor: String,
    /// Acting role (ADMIN, DEPARTMENT_HEAD or PHYSICIAN)
    #[arg(long, default_value = "ADMIN")]
    role: String,
    /// Acting department UUID (required for non-admin roles)
    #[arg(long)]
    department: Option<String>,
    /// Data directory (defaults to REFERRAL_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List referrals
    List {
        /// Filter by status (PENDING, IN_PROGRESS, COMPLETED, CANCELLED)
        #[arg(long)]
        status: Option<String>,
        /// Filter by priority (LOW, MEDIUM, HIGH, URGENT)
        #[arg(long)]
        priority: Option<String>,
        /// Traffic direction relative to the acting department (sent or received)
        #[arg(long)]
        kind: Option<String>,
        /// Triage view: active high/urgent referrals, oldest first
        #[arg(long)]
        urgent: bool,
        /// Pending queue of the acting department, oldest first
        #[arg(long)]
        pending: bool,
    },
    /// Show one referral with its derived fields
    Get {
        /// Referral UUID
        id: String,
    },
    /// Create a referral from a JSON draft file
    Create {
        /// Path to the draft JSON document
        draft_file: PathBuf,
    },
    /// Update the status of a referral
    SetStatus {
        /// Referral UUID
        id: String,
        /// New status (PENDING, IN_PROGRESS, COMPLETED, CANCELLED)
        status: String,
    },
    /// Add a clinical note to a referral
    AddNote {
        /// Referral UUID
        id: String,
        /// Note content
        content: String,
        /// Note author
        author: String,
        /// Department to annotate as (admins only)
        #[arg(long)]
        note_department: Option<String>,
    },
    /// Mark every notification on a referral as read
    MarkRead {
        /// Referral UUID
        id: String,
    },
    /// Search referrals by patient history number
    SearchHistory {
        /// Patient history number
        history_number: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let role: Role = cli.role.parse()?;
    let department = match &cli.department {
        Some(raw) => Some(Uuid::parse_str(raw)?),
        None => None,
    };
    if role != Role::Admin && department.is_none() {
        return Err("--department is required for non-admin roles".into());
    }
    let principal = Principal {
        id: cli.actor.clone(),
        role,
        department,
    };

    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var("REFERRAL_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let cfg = CoreConfig::new(data_dir)?;
    let service = ReferralService::new(Arc::new(FileStore::open(&cfg)?));

    match cli.command {
        Some(Commands::List {
            status,
            priority,
            kind,
            urgent,
            pending,
        }) => {
            let filter = ListFilter {
                status: status.as_deref().map(str::parse::<Status>).transpose()?,
                priority: priority
                    .as_deref()
                    .map(str::parse::<Priority>)
                    .transpose()?,
                kind: kind.as_deref().map(parse_kind).transpose()?,
                urgent,
                pending,
                ..ListFilter::default()
            };
            match service.list(&principal, &filter) {
                Ok(views) => print_listing(&views),
                Err(e) => eprintln!("Error listing referrals: {}", e),
            }
        }
        Some(Commands::Get { id }) => {
            let id = Uuid::parse_str(&id)?;
            match service.get(&principal, id) {
                Ok(view) => println!("{}", serde_json::to_string_pretty(&view)?),
                Err(e) => eprintln!("Error fetching referral: {}", e),
            }
        }
        Some(Commands::Create { draft_file }) => {
            let contents = std::fs::read_to_string(&draft_file)?;
            let draft: ReferralDraft = serde_json::from_str(&contents)?;
            match service.create(&principal, draft) {
                Ok(view) => println!("Created referral with UUID: {}", view.referral.id),
                Err(e) => eprintln!("Error creating referral: {}", e),
            }
        }
        Some(Commands::SetStatus { id, status }) => {
            let id = Uuid::parse_str(&id)?;
            let status: Status = status.parse()?;
            match service.update_status(&principal, id, status) {
                Ok(view) => println!("Referral {} is now {}", view.referral.id, status),
                Err(e) => eprintln!("Error updating status: {}", e),
            }
        }
        Some(Commands::AddNote {
            id,
            content,
            author,
            note_department,
        }) => {
            let id = Uuid::parse_str(&id)?;
            let note_department = match &note_department {
                Some(raw) => Some(Uuid::parse_str(raw)?),
                None => None,
            };
            match service.add_note(&principal, id, &content, &author, note_department) {
                Ok(view) => println!(
                    "Added note to {} ({} pending notifications)",
                    view.referral.id, view.pending_notifications
                ),
                Err(e) => eprintln!("Error adding note: {}", e),
            }
        }
        Some(Commands::MarkRead { id }) => {
            let id = Uuid::parse_str(&id)?;
            match service.mark_notifications_read(&principal, id) {
                Ok(view) => println!("Marked notifications read on {}", view.referral.id),
                Err(e) => eprintln!("Error marking notifications: {}", e),
            }
        }
        Some(Commands::SearchHistory { history_number }) => {
            match service.search_by_history(&principal, &history_number) {
                Ok(views) => print_listing(&views),
                Err(e) => eprintln!("Error searching referrals: {}", e),
            }
        }
        None => {
            println!("Use 'referral --help' for commands");
        }
    }

    Ok(())
}

fn parse_kind(input: &str) -> Result<TrafficKind, String> {
    match input {
        "sent" => Ok(TrafficKind::Sent),
        "received" => Ok(TrafficKind::Received),
        other => Err(format!("unknown traffic kind {other:?} (sent or received)")),
    }
}

fn print_listing(views: &[ReferralView]) {
    if views.is_empty() {
        println!("No referrals found.");
        return;
    }
    for view in views {
        println!(
            "ID: {}, Patient: {} ({}), Status: {}, Priority: {}, Pending notifications: {}",
            view.referral.id,
            view.referral.patient.name,
            view.referral.patient.history_number,
            view.referral.status(),
            view.referral.priority,
            view.pending_notifications
        );
    }
}
