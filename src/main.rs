use std::path::PathBuf;
use std::sync::Arc;

use academy_client::actions::{
    CreateBatch, CreateContent, CreateNotification, CreateSession, CreateUser, CreateYoyoTest, DeleteBatch,
    DeleteContent, DeleteUser, GetAnalyticsOverview, GetCoachStats, GetCoaches, GetSettings, GetStudentStats, GetUser,
    ListAttendance, ListBatches, ListContent, ListNotifications, ListSessions, ListUsers, ListYoyoTests,
    MarkAttendance, MarkNotificationRead, UpdateContent, UpdateSettings, UpdateUser,
};
use academy_client::config::ConfigError;
use academy_client::models::NotificationKind;
use academy_client::storage::FileStore;
use academy_client::transport::TransportError;
use academy_client::{ApiClient, ClientConfig, Envelope, SessionStore};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("client setup failed: {0}")]
    Client(#[from] TransportError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Failed(String),
}

#[derive(Parser, Debug)]
#[command(name = "academy", about = "Cricket academy backend CLI")]
struct Cli {
    #[arg(long, env = "ACADEMY_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "ACADEMY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "ACADEMY_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session.
    Login {
        phone: String,
        #[arg(long, env = "ACADEMY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Print the persisted session user.
    Whoami,
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long, help = "Defaults to --new")]
        confirm: Option<String>,
    },
    Api(ApiCommand),
}

#[derive(Args, Debug)]
struct ApiCommand {
    #[command(subcommand)]
    command: ApiSubcommand,
}

#[derive(Subcommand, Debug)]
enum ApiSubcommand {
    #[command(subcommand)]
    Users(UsersSubcommand),
    /// List coaches.
    Coaches,
    #[command(subcommand)]
    Batches(BatchesSubcommand),
    #[command(subcommand)]
    Content(ContentSubcommand),
    #[command(subcommand)]
    Sessions(SessionsSubcommand),
    #[command(subcommand)]
    Attendance(AttendanceSubcommand),
    #[command(subcommand)]
    Notifications(NotificationsSubcommand),
    #[command(subcommand)]
    Yoyo(YoyoSubcommand),
    #[command(subcommand)]
    Stats(StatsSubcommand),
    #[command(subcommand)]
    Settings(SettingsSubcommand),
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List,
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum BatchesSubcommand {
    List,
    Create {
        #[arg(long)]
        data: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ContentSubcommand {
    List,
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum SessionsSubcommand {
    List {
        #[arg(long, help = "YYYY-MM-DD")]
        date: Option<String>,
    },
    Today,
    Create {
        #[arg(long)]
        data: String,
    },
}

#[derive(Subcommand, Debug)]
enum AttendanceSubcommand {
    List {
        user_id: String,
    },
    CheckIn {
        user_id: String,
        session_id: String,
    },
    CheckOut {
        record_id: String,
    },
    Mark {
        student_id: String,
        session_id: String,
        #[arg(long, default_value = "present")]
        status: String,
        #[arg(long)]
        marked_by: String,
    },
}

#[derive(Subcommand, Debug)]
enum NotificationsSubcommand {
    List {
        user_id: String,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Read {
        id: String,
    },
    /// Send the same notification to several users.
    Broadcast {
        #[arg(long)]
        title: String,
        #[arg(long)]
        message: String,
        #[arg(long, default_value = "announcement")]
        kind: String,
        #[arg(required = true)]
        user_ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum YoyoSubcommand {
    List {
        #[arg(long)]
        student_id: Option<String>,
    },
    Create {
        #[arg(long)]
        data: String,
    },
}

#[derive(Subcommand, Debug)]
enum StatsSubcommand {
    Student { user_id: String },
    Coach { user_id: String },
    Overview,
}

#[derive(Subcommand, Debug)]
enum SettingsSubcommand {
    Get,
    Update {
        #[arg(long)]
        data: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let client = ApiClient::from_config(&config)?;
    tracing::debug!(base_url = %config.base_url, storage_dir = %config.storage_dir.display(), "academy cli");

    let session = || SessionStore::new(client.clone(), Arc::new(FileStore::new(&config.storage_dir)));
    match cli.command {
        Command::Login { phone, password } => {
            let session = session();
            if let Err(e) = session.rehydrate().await {
                tracing::debug!(error = %e, "continuing without a stored session");
            }
            print_envelope(&Envelope::from_result(session.login(&phone, &password).await))
        }
        Command::Logout => print_envelope(&Envelope::from_result(session().logout().await.map(|()| true))),
        Command::Whoami => {
            let envelope = match session().rehydrate().await {
                Ok(Some(user)) => Envelope::ok(user),
                Ok(None) => Envelope::fail("not signed in"),
                Err(e) => Envelope::fail(e.to_string()),
            };
            print_envelope(&envelope)
        }
        Command::ChangePassword { current, new, confirm } => {
            let session = session();
            if let Err(e) = session.rehydrate().await {
                tracing::debug!(error = %e, "continuing without a stored session");
            }
            let confirm = confirm.unwrap_or_else(|| new.clone());
            print_envelope(&Envelope::from_result(session.change_password(&current, &new, &confirm).await))
        }
        Command::Api(api) => run_api(&client, api).await,
    }
}

/// Flags win over environment variables; unset flags fall back to them.
fn resolve_config(cli: &Cli) -> Result<ClientConfig, ConfigError> {
    ClientConfig::from_lookup(|key| match key {
        "ACADEMY_BASE_URL" => cli.base_url.clone(),
        "ACADEMY_API_KEY" => cli.api_key.clone(),
        "ACADEMY_STORAGE_DIR" => cli.storage_dir.as_ref().map(|dir| dir.display().to_string()),
        other => std::env::var(other).ok(),
    })
}

async fn run_api(client: &ApiClient, api: ApiCommand) -> Result<(), CliError> {
    match api.command {
        ApiSubcommand::Users(users) => run_api_users(client, users).await,
        ApiSubcommand::Coaches => print_envelope(&client.request(&GetCoaches).await),
        ApiSubcommand::Batches(batches) => run_api_batches(client, batches).await,
        ApiSubcommand::Content(content) => run_api_content(client, content).await,
        ApiSubcommand::Sessions(sessions) => run_api_sessions(client, sessions).await,
        ApiSubcommand::Attendance(attendance) => run_api_attendance(client, attendance).await,
        ApiSubcommand::Notifications(notifications) => run_api_notifications(client, notifications).await,
        ApiSubcommand::Yoyo(yoyo) => run_api_yoyo(client, yoyo).await,
        ApiSubcommand::Stats(stats) => run_api_stats(client, stats).await,
        ApiSubcommand::Settings(settings) => run_api_settings(client, settings).await,
    }
}

async fn run_api_users(client: &ApiClient, users: UsersSubcommand) -> Result<(), CliError> {
    match users {
        UsersSubcommand::List => print_envelope(&client.request(&ListUsers).await),
        UsersSubcommand::Get { id } => print_envelope(&client.request(&GetUser { id }).await),
        UsersSubcommand::Create { data } => {
            let user = parse_data(&data)?;
            print_envelope(&client.request(&CreateUser { user }).await)
        }
        UsersSubcommand::Update { id, data } => {
            let patch = parse_data(&data)?;
            print_envelope(&client.request(&UpdateUser { id, patch }).await)
        }
        UsersSubcommand::Delete { id } => print_envelope(&client.request(&DeleteUser { id }).await),
    }
}

async fn run_api_batches(client: &ApiClient, batches: BatchesSubcommand) -> Result<(), CliError> {
    match batches {
        BatchesSubcommand::List => print_envelope(&client.request(&ListBatches).await),
        BatchesSubcommand::Create { data } => {
            let batch = parse_data(&data)?;
            print_envelope(&client.request(&CreateBatch { batch }).await)
        }
        BatchesSubcommand::Delete { id } => print_envelope(&client.request(&DeleteBatch { id }).await),
    }
}

async fn run_api_content(client: &ApiClient, content: ContentSubcommand) -> Result<(), CliError> {
    match content {
        ContentSubcommand::List => print_envelope(&client.request(&ListContent).await),
        ContentSubcommand::Create { data } => {
            let content = parse_data(&data)?;
            print_envelope(&client.request(&CreateContent { content }).await)
        }
        ContentSubcommand::Update { id, data } => {
            let fields = parse_data(&data)?;
            print_envelope(&client.request(&UpdateContent { id, fields }).await)
        }
        ContentSubcommand::Delete { id } => print_envelope(&client.request(&DeleteContent { id }).await),
    }
}

async fn run_api_sessions(client: &ApiClient, sessions: SessionsSubcommand) -> Result<(), CliError> {
    match sessions {
        SessionsSubcommand::List { date } => print_envelope(&client.request(&ListSessions { date }).await),
        SessionsSubcommand::Today => print_envelope(&client.todays_sessions().await),
        SessionsSubcommand::Create { data } => {
            let session = parse_data(&data)?;
            print_envelope(&client.request(&CreateSession { session }).await)
        }
    }
}

async fn run_api_attendance(client: &ApiClient, attendance: AttendanceSubcommand) -> Result<(), CliError> {
    match attendance {
        AttendanceSubcommand::List { user_id } => print_envelope(&client.request(&ListAttendance { user_id }).await),
        AttendanceSubcommand::CheckIn { user_id, session_id } => {
            print_envelope(&client.check_in(&user_id, &session_id).await)
        }
        AttendanceSubcommand::CheckOut { record_id } => print_envelope(&client.check_out(&record_id).await),
        AttendanceSubcommand::Mark { student_id, session_id, status, marked_by } => {
            let status = parse_enum(&status)?;
            print_envelope(&client.request(&MarkAttendance { student_id, session_id, status, marked_by }).await)
        }
    }
}

async fn run_api_notifications(client: &ApiClient, notifications: NotificationsSubcommand) -> Result<(), CliError> {
    match notifications {
        NotificationsSubcommand::List { user_id } => {
            print_envelope(&client.request(&ListNotifications { user_id }).await)
        }
        NotificationsSubcommand::Create { data } => {
            let notification = parse_data(&data)?;
            print_envelope(&client.request(&CreateNotification { notification }).await)
        }
        NotificationsSubcommand::Read { id } => print_envelope(&client.request(&MarkNotificationRead { id }).await),
        NotificationsSubcommand::Broadcast { title, message, kind, user_ids } => {
            let kind: NotificationKind = parse_enum(&kind)?;
            print_envelope(&client.send_bulk_notifications(&title, &message, &user_ids, kind).await)
        }
    }
}

async fn run_api_yoyo(client: &ApiClient, yoyo: YoyoSubcommand) -> Result<(), CliError> {
    match yoyo {
        YoyoSubcommand::List { student_id } => print_envelope(&client.request(&ListYoyoTests { student_id }).await),
        YoyoSubcommand::Create { data } => {
            let result = parse_data(&data)?;
            print_envelope(&client.request(&CreateYoyoTest { result }).await)
        }
    }
}

async fn run_api_stats(client: &ApiClient, stats: StatsSubcommand) -> Result<(), CliError> {
    match stats {
        StatsSubcommand::Student { user_id } => print_envelope(&client.request(&GetStudentStats { user_id }).await),
        StatsSubcommand::Coach { user_id } => print_envelope(&client.request(&GetCoachStats { user_id }).await),
        StatsSubcommand::Overview => print_envelope(&client.request(&GetAnalyticsOverview).await),
    }
}

async fn run_api_settings(client: &ApiClient, settings: SettingsSubcommand) -> Result<(), CliError> {
    match settings {
        SettingsSubcommand::Get => print_envelope(&client.request(&GetSettings).await),
        SettingsSubcommand::Update { data } => {
            let settings = parse_data(&data)?;
            print_envelope(&client.request(&UpdateSettings { settings }).await)
        }
    }
}

/// Print the envelope to stdout; a failed envelope also fails the process.
fn print_envelope<T: Serialize>(envelope: &Envelope<T>) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(envelope)?;
    println!("{rendered}");
    match envelope.message() {
        Some(message) if !envelope.is_success() => Err(CliError::Failed(message.to_owned())),
        _ => Ok(()),
    }
}

fn parse_data<T: DeserializeOwned>(data: &str) -> Result<T, CliError> {
    Ok(serde_json::from_str(data)?)
}

/// Parse a lowercase wire name such as `present` or `announcement`.
fn parse_enum<T: DeserializeOwned>(name: &str) -> Result<T, CliError> {
    Ok(serde_json::from_value(Value::String(name.to_ascii_lowercase()))?)
}
