mod command;
mod view;

use std::fmt;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use services::{
    ApiConfig, AuthorizedTransport, Clock, ControllerError, GenerateOutcome, HttpQuizBackend,
    QuizPhase, QuizSessionController,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::command::{Command, HELP};

const DEFAULT_DB: &str = "sqlite://quiz-session.sqlite3";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidApiUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--api <base_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz-session.sqlite3");
    eprintln!("  --api http://localhost:8000");
    eprintln!();
    eprintln!("Environment (a .env file is read if present):");
    eprintln!("  QUIZ_DB_URL, QUIZ_API_BASE_URL, QUIZ_HTTP_TIMEOUT_SECS, RUST_LOG");
}

/// Where the session token is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DbTarget {
    Memory,
    File(PathBuf),
}

impl DbTarget {
    /// Accepts `sqlite::memory:`, `sqlite://<path>`, `sqlite:<path>` or a bare
    /// path. Relative paths are resolved against the working directory.
    fn parse(raw: &str) -> Result<Self, ArgsError> {
        let trimmed = raw.trim();
        if matches!(trimmed, "sqlite::memory:" | ":memory:") {
            return Ok(Self::Memory);
        }

        let path = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);
        let path = path.split('?').next().unwrap_or_default();
        if path.is_empty() {
            return Err(ArgsError::InvalidDbUrl {
                raw: raw.to_string(),
            });
        }

        let path = PathBuf::from(path);
        if path.is_absolute() {
            return Ok(Self::File(path));
        }
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Ok(Self::File(cwd.join(path)))
    }

    /// Connection URL; file databases are created on first open.
    fn url(&self) -> String {
        match self {
            Self::Memory => "sqlite::memory:".to_string(),
            Self::File(path) => format!("sqlite://{}?mode=rwc", path.display()),
        }
    }

    fn prepare(&self) -> std::io::Result<()> {
        if let Self::File(path) = self {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for DbTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("in-memory"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

struct Args {
    db: DbTarget,
    api_url: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db = match std::env::var("QUIZ_DB_URL") {
            Ok(raw) => DbTarget::parse(&raw)?,
            Err(_) => DbTarget::parse(DEFAULT_DB)?,
        };
        let mut api_url = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db = DbTarget::parse(&require_value(args, "--db")?)?,
                "--api" => {
                    let value = require_value(args, "--api")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidApiUrl { raw: value });
                    }
                    api_url = Some(value);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db, api_url })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn report(err: &ControllerError) {
    match err {
        ControllerError::SessionExpired => println!("your session expired; please sign in again"),
        ControllerError::NotAuthenticated => println!("sign in first (`login`, `signup` or `google`)"),
        ControllerError::QuestionOutOfRange { index, len } => {
            println!("there is no question {} (the quiz has {len})", index + 1);
        }
        ControllerError::OptionOutOfRange {
            question,
            option,
            options,
        } => println!(
            "question {} has no option {} (it has {options})",
            question + 1,
            option + 1
        ),
        other => println!("error: {other}"),
    }
}

/// Run one parsed command. Returns `false` when the user asked to quit.
async fn dispatch(controller: &mut QuizSessionController, command: Command) -> bool {
    let outcome: Result<(), ControllerError> = match command {
        Command::Quit => return false,
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Login { email, password } => controller
            .login(&email, &password)
            .await
            .map(|user| println!("welcome back, {}", user.display_name())),
        Command::Signup {
            email,
            password,
            name,
        } => controller
            .signup(&name, &email, &password)
            .await
            .map(|user| println!("welcome, {}", user.display_name())),
        Command::Google { credential } => controller
            .google_login(&credential)
            .await
            .map(|user| println!("welcome, {}", user.display_name())),
        Command::Logout => controller.logout().await.map(|()| println!("signed out")),
        Command::Generate(level) => match controller.generate(level).await {
            Ok(GenerateOutcome::Ready) => {
                if let (Some(quiz), Some(ledger)) = (controller.quiz(), controller.ledger()) {
                    print!("{}", view::quiz(quiz, ledger));
                }
                Ok(())
            }
            Ok(GenerateOutcome::Throttled { remaining_secs }) => {
                println!("please wait {remaining_secs}s before generating another quiz");
                Ok(())
            }
            Err(err) => Err(err),
        },
        Command::Show => {
            match (controller.quiz(), controller.ledger()) {
                (Some(quiz), Some(ledger)) => print!("{}", view::quiz(quiz, ledger)),
                _ => println!("no quiz in progress (phase {:?})", controller.phase()),
            }
            Ok(())
        }
        Command::Answer { question, option } => controller
            .record_answer(question, option)
            .map(|()| {
                if let Some(progress) = controller.progress() {
                    println!("{} of {} answered", progress.answered, progress.total);
                }
            }),
        Command::Submit => controller
            .submit()
            .await
            .map(|review| print!("{}", view::review(&review))),
        Command::Review => {
            match controller.review() {
                Some(review) => print!("{}", view::review(review)),
                None => println!("nothing to review (phase {:?})", controller.phase()),
            }
            Ok(())
        }
        Command::Ask { question, text } => controller
            .ask_assistant(question, &text)
            .await
            .map(|answer| println!("{answer}")),
        Command::Ack => controller.acknowledge_failure().map(|phase| match phase {
            QuizPhase::Ready => println!("answers kept; `submit` to try again"),
            _ => println!("ok"),
        }),
        Command::Done => controller.finish_review().map(|()| println!("ok")),
        Command::Status => {
            let countdown = *controller.countdown().borrow();
            println!("{}", view::status(controller, countdown));
            Ok(())
        }
    };

    if let Err(err) = outcome {
        report(&err);
    }
    true
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    if !cfg!(test) {
        dotenvy::dotenv().ok();
    }
    init_tracing();

    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut api = ApiConfig::from_env()?;
    if let Some(raw) = &args.api_url {
        api = ApiConfig::new(raw)
            .map_err(|_| ArgsError::InvalidApiUrl { raw: raw.clone() })?
            .with_timeout(api.timeout());
    }

    tracing::info!(db = %args.db, api = %api.base_url(), "starting quiz client");

    // Open + migrate SQLite at startup so a stored session survives restarts.
    args.db.prepare()?;
    let storage = Storage::sqlite(&args.db.url()).await?;

    let transport = AuthorizedTransport::new(&api, Arc::clone(&storage.tokens))?;
    let backend = Arc::new(HttpQuizBackend::new(transport));
    let mut controller = QuizSessionController::new(Clock::system(), storage.tokens, backend);

    match controller.bootstrap().await? {
        Some(user) => println!("signed in as {}", user.display_name()),
        None => println!("not signed in; type `help` for commands"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(command) => {
                if !dispatch(&mut controller, command).await {
                    break;
                }
            }
            Err(command::CommandError::Empty) => {}
            Err(err) => println!("{err}"),
        }
        prompt();
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
