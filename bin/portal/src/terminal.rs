//! Line-oriented terminal surface.
//!
//! Lines starting with `:` are commands; any other line is sent to the chat
//! when it is open. Reply text is printed as plain text with control
//! characters removed.

use crate::app::Portal;
use crate::dashboard;
use crate::view::{ChatSurface, PortalView};
use campus_desk_conversation::{ConversationState, Rejection, SendOutcome};
use campus_desk_platform_access::{AuthView, SignUpRequest};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

const HELP: &str = "\
commands:
  :signin <email> <password>
  :signup                              show the sign-up form
  :signup <email> <password> <student id> <full name>
  :verify <code>
  :resend
  :signout
  :chat                                open or close the chat
  :suggest <n>                         send suggestion n
  :cards                               list portal services
  :help
  :quit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignIn { email: String, password: String },
    ShowSignUp,
    SignUp(SignUpRequest),
    Verify { code: String },
    Resend,
    SignOut,
    ToggleChat,
    Suggest { number: usize },
    Cards,
    Help,
    Quit,
    Say(String),
    Invalid(String),
}

impl Command {
    /// Parses one input line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(':') else {
            return Self::Say(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match (name, args.as_slice()) {
            ("signin", [email, password]) => Self::SignIn {
                email: (*email).to_string(),
                password: (*password).to_string(),
            },
            ("signup", []) => Self::ShowSignUp,
            ("signup", [email, password, student_id, name @ ..]) if !name.is_empty() => {
                Self::SignUp(SignUpRequest {
                    name: name.join(" "),
                    student_id: (*student_id).to_string(),
                    email: (*email).to_string(),
                    password: (*password).to_string(),
                })
            }
            ("verify", [code]) => Self::Verify {
                code: (*code).to_string(),
            },
            ("resend", []) => Self::Resend,
            ("signout", []) => Self::SignOut,
            ("chat", []) => Self::ToggleChat,
            ("suggest", [number]) => match number.parse() {
                Ok(number) if number > 0 => Self::Suggest { number },
                _ => Self::Invalid(line.to_string()),
            },
            ("cards", []) => Self::Cards,
            ("help", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            _ => Self::Invalid(line.to_string()),
        }
    }
}

/// Removes control characters other than newlines.
#[must_use]
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .collect()
}

/// Runs the terminal surface until `:quit` or end of input.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails.
pub async fn run<R, W>(portal: &mut Portal, input: R, mut output: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    write_login(&mut output, portal).await?;

    while let Some(line) = lines.next_line().await? {
        let command = Command::parse(&line);
        debug!(?command, "terminal command");
        if command == Command::Quit {
            break;
        }
        handle(portal, command, &mut output).await?;
        output.flush().await?;
    }

    output.flush().await
}

async fn handle<W>(portal: &mut Portal, command: Command, out: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match command {
        Command::Say(text) if text.is_empty() => Ok(()),
        Command::Say(text) => {
            if portal.view().chat_surface() == ChatSurface::Closed {
                return write_line(out, "(open the chat with :chat first)").await;
            }
            write_line(out, "assistant is typing...").await?;
            match portal.say(&text).await {
                Ok(outcome) => write_outcome(out, outcome).await,
                Err(report) => write_line(out, &report.current_context().to_string()).await,
            }
        }
        Command::Suggest { number } => match portal.suggest(number - 1).await {
            Ok(outcome) => write_outcome(out, outcome).await,
            Err(report) => write_line(out, &report.current_context().to_string()).await,
        },
        Command::ToggleChat => match portal.toggle_chat().await {
            Ok(Some(state)) => write_conversation(out, &state, portal).await,
            Ok(None) => write_line(out, "(chat closed)").await,
            Err(report) => write_line(out, &report.current_context().to_string()).await,
        },
        Command::Cards => write_dashboard(out, portal).await,
        Command::Help => write_line(out, HELP).await,
        Command::Invalid(line) => write_line(out, &format!("unrecognized command: {line}")).await,
        Command::Quit => Ok(()),
        login_command => {
            let result = match login_command {
                Command::SignIn { email, password } => {
                    portal.sign_in(&email, &password).await.map(|_| ())
                }
                Command::ShowSignUp => portal.show_sign_up(),
                Command::SignUp(request) => portal.sign_up(&request).await,
                Command::Verify { code } => portal.verify(&code).await,
                Command::Resend => portal.resend_code().await,
                Command::SignOut => portal.sign_out().await,
                _ => Ok(()),
            };
            if let Err(report) = result {
                write_line(out, &report.current_context().to_string()).await?;
            }
            match portal.view() {
                PortalView::SignedIn { .. } => write_dashboard(out, portal).await,
                PortalView::SignedOut(_) => write_login(out, portal).await,
            }
        }
    }
}

async fn write_line<W>(out: &mut W, text: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await
}

async fn write_outcome<W>(out: &mut W, outcome: SendOutcome) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match outcome {
        SendOutcome::Replied(message) => {
            write_line(out, &format!("assistant: {}", sanitize(message.text()))).await
        }
        SendOutcome::Rejected(Rejection::EmptyInput) => Ok(()),
        SendOutcome::Rejected(Rejection::AwaitingReply) => {
            write_line(out, "(still waiting for the last reply)").await
        }
        SendOutcome::Rejected(Rejection::SurfaceClosed) => {
            write_line(out, "(open the chat with :chat first)").await
        }
        SendOutcome::Rejected(Rejection::UnknownSuggestion) => {
            write_line(out, "(no such suggestion)").await
        }
        SendOutcome::Rejected(Rejection::SuggestionsHidden) => {
            write_line(out, "(suggestions are only offered before the first message)").await
        }
        SendOutcome::Discarded => write_line(out, "(reply dropped, chat was closed)").await,
    }
}

async fn write_conversation<W>(
    out: &mut W,
    state: &ConversationState,
    portal: &Portal,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for message in state.history() {
        write_line(out, &format!("assistant: {}", sanitize(message.text()))).await?;
    }
    let Some(chat) = portal.chat().filter(|_| state.suggestions_visible()) else {
        return Ok(());
    };
    for (i, suggestion) in chat.settings().suggestions.iter().enumerate() {
        write_line(out, &format!("  :suggest {} -> {suggestion}", i + 1)).await?;
    }
    Ok(())
}

async fn write_dashboard<W>(out: &mut W, portal: &Portal) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let Some(identity) = portal.view().identity() else {
        return write_login(out, portal).await;
    };

    write_line(out, dashboard::HEADING).await?;
    write_line(out, &dashboard::welcome_line(identity)).await?;
    write_line(out, dashboard::TAGLINE).await?;
    for card in &dashboard::SERVICES {
        write_line(out, &format!("  * {}: {}", card.title, card.description)).await?;
    }
    write_line(out, dashboard::ASSISTANT_HINT).await
}

async fn write_login<W>(out: &mut W, portal: &Portal) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let Some(flow) = portal.view().login() else {
        return Ok(());
    };

    let prompt = match flow.view() {
        AuthView::SignIn => "Sign in with :signin <email> <password> (or :signup to register)".to_string(),
        AuthView::SignUp => {
            "Register with :signup <email> <password> <student id> <full name>".to_string()
        }
        AuthView::Verify { email } => {
            format!("Enter the code sent to {email} with :verify <code> (or :resend)")
        }
    };
    if let Some(notice) = flow.notice() {
        write_line(out, notice).await?;
    }
    if let Some(error) = flow.error() {
        write_line(out, &format!("error: {error}")).await?;
    }
    write_line(out, &prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_desk_conversation::{ChatSettings, ResponseResolver};
    use campus_desk_platform_access::OfflineIdentityProvider;
    use std::sync::Arc;

    fn portal() -> Portal {
        Portal::new(
            Arc::new(OfflineIdentityProvider::default()),
            Arc::new(ResponseResolver::default()),
            None,
            ChatSettings::default(),
        )
    }

    async fn transcript(script: &str) -> String {
        let mut portal = portal();
        let mut output = Vec::new();
        run(&mut portal, script.as_bytes(), &mut output)
            .await
            .expect("run");
        String::from_utf8(output).expect("utf-8")
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            Command::parse(":signin a@b.edu pw"),
            Command::SignIn {
                email: "a@b.edu".to_string(),
                password: "pw".to_string()
            }
        );
        assert_eq!(Command::parse(":signup"), Command::ShowSignUp);
        assert_eq!(Command::parse(" :chat "), Command::ToggleChat);
        assert_eq!(Command::parse(":suggest 2"), Command::Suggest { number: 2 });
        assert_eq!(Command::parse(":exit"), Command::Quit);
        assert_eq!(
            Command::parse("library hours?"),
            Command::Say("library hours?".to_string())
        );
    }

    #[test]
    fn parses_sign_up_with_multi_word_name() {
        let Command::SignUp(request) =
            Command::parse(":signup a@b.edu Str0ng!pass S1001 Alice Smith")
        else {
            panic!("expected sign-up");
        };
        assert_eq!(request.name, "Alice Smith");
        assert_eq!(request.student_id, "S1001");
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(matches!(Command::parse(":suggest 0"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":suggest x"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":signin only-email"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":signup a b c"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":bogus"), Command::Invalid(_)));
    }

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize("ok\u{1b}[31m red\r\nnext\u{7}"), "ok[31m red\nnext");
    }

    #[tokio::test]
    async fn chat_session_over_terminal() {
        let output = transcript(
            ":signin alice@example.edu pw\n:chat\n:suggest 1\nthanks\n:chat\n:quit\nnever read\n",
        )
        .await;

        assert!(output.contains("Student Portal Dashboard"));
        assert!(output.contains("Hi! I'm your AI student services assistant."));
        assert!(output.contains(":suggest 1 -> Library hours"));
        assert!(output.contains("assistant: The library is open"));
        assert!(output.contains("assistant: You're welcome!"));
        assert!(output.contains("(chat closed)"));
    }

    #[tokio::test]
    async fn text_before_sign_in_is_not_sent() {
        let output = transcript("hello\n:chat\n").await;

        assert!(output.contains("(open the chat with :chat first)"));
        assert!(output.contains("not signed in"));
    }

    #[tokio::test]
    async fn incomplete_sign_in_is_unrecognized() {
        let output = transcript(":signin a@b.edu\n:signup\n").await;
        assert!(output.contains("unrecognized command: :signin a@b.edu"));
        assert!(output.contains("Register with :signup"));
    }
}
