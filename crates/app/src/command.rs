use std::fmt;

use quiz_core::model::{Level, LevelError};

/// One line typed at the prompt.
///
/// Question and option numbers are typed 1-based and stored 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Signup { email: String, password: String, name: String },
    Google { credential: String },
    Generate(Level),
    Show,
    Answer { question: usize, option: usize },
    Submit,
    Review,
    Ask { question: usize, text: String },
    Ack,
    Done,
    Status,
    Logout,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    Usage(&'static str),
    BadPosition(String),
    Level(LevelError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "type a command (or `help`)"),
            CommandError::Unknown(word) => write!(f, "unknown command: {word}"),
            CommandError::Usage(usage) => write!(f, "usage: {usage}"),
            CommandError::BadPosition(raw) => write!(f, "expected a number from 1, got {raw:?}"),
            CommandError::Level(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CommandError {}

pub const HELP: &str = "\
commands:
  login <email> <password>          sign in
  signup <email> <password> <name>  create an account and sign in
  google <credential>               sign in with a Google credential
  generate <easy|medium|hard>       request a new quiz
  show                              print the current quiz
  answer <question> <option>        pick an option (numbers start at 1)
  submit                            send your answers for scoring
  review                            print the scored quiz
  ask <question> <text>             ask the assistant about a reviewed question
  ack                               dismiss a failed request
  done                              leave the review
  status                            show session, phase and cooldown
  logout                            sign out
  help                              show this list
  quit                              exit";

/// Split off the first whitespace-delimited word.
fn next_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(at) => (&input[..at], input[at..].trim_start()),
        None => (input, ""),
    }
}

fn position(raw: &str) -> Result<usize, CommandError> {
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::BadPosition(raw.to_string())),
    }
}

fn required<'a>(word: &'a str, usage: &'static str) -> Result<&'a str, CommandError> {
    if word.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(word)
    }
}

impl Command {
    /// Parse one input line.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` for blank lines, unknown commands and missing
    /// or malformed arguments.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let (word, rest) = next_word(line);
        let command = match word.to_ascii_lowercase().as_str() {
            "" => return Err(CommandError::Empty),
            "login" => {
                const USAGE: &str = "login <email> <password>";
                let (email, rest) = next_word(rest);
                let (password, _) = next_word(rest);
                Command::Login {
                    email: required(email, USAGE)?.to_string(),
                    password: required(password, USAGE)?.to_string(),
                }
            }
            "signup" => {
                const USAGE: &str = "signup <email> <password> <name>";
                let (email, rest) = next_word(rest);
                let (password, name) = next_word(rest);
                Command::Signup {
                    email: required(email, USAGE)?.to_string(),
                    password: required(password, USAGE)?.to_string(),
                    name: required(name.trim_end(), USAGE)?.to_string(),
                }
            }
            "google" => {
                let (credential, _) = next_word(rest);
                Command::Google {
                    credential: required(credential, "google <credential>")?.to_string(),
                }
            }
            "generate" => {
                let (level, _) = next_word(rest);
                let level = required(level, "generate <easy|medium|hard>")?;
                Command::Generate(level.parse().map_err(CommandError::Level)?)
            }
            "answer" => {
                const USAGE: &str = "answer <question> <option>";
                let (question, rest) = next_word(rest);
                let (option, _) = next_word(rest);
                Command::Answer {
                    question: position(required(question, USAGE)?)?,
                    option: position(required(option, USAGE)?)?,
                }
            }
            "ask" => {
                const USAGE: &str = "ask <question> <text>";
                let (question, text) = next_word(rest);
                let question = position(required(question, USAGE)?)?;
                Command::Ask {
                    question,
                    text: required(text.trim_end(), USAGE)?.to_string(),
                }
            }
            "show" => Command::Show,
            "submit" => Command::Submit,
            "review" => Command::Review,
            "ack" => Command::Ack,
            "done" => Command::Done,
            "status" => Command::Status,
            "logout" => Command::Logout,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(word.to_string())),
        };
        Ok(command)
    }
}
