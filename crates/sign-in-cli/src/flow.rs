//! Line-oriented sign-in form.
//!
//! Renders the controller's state as prompts and feeds each answered line back
//! in as the matching event. Requests are awaited inline, so the controller
//! never sits in a submitting phase between prompts.

use anyhow::{bail, Context, Result};
use credential_sign_in::{AuthClient, Phase, Session, SignInController};
use std::fmt::Display;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// Prompt/answer pair over any line reader and writer.
pub struct Terminal<R, W> {
    lines: Lines<R>,
    out: W,
    /// Read secrets from the TTY without echo instead of from `lines`.
    hide_secrets: bool,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
            hide_secrets: false,
        }
    }

    pub fn with_hidden_secrets(mut self) -> Self {
        self.hide_secrets = true;
        self
    }

    pub async fn prompt(&mut self, label: &str) -> Result<String> {
        write!(self.out, "{label}: ")?;
        self.out.flush()?;

        match self.lines.next_line().await.context("Failed to read input")? {
            Some(line) => Ok(line.trim_end_matches(['\r', '\n']).to_string()),
            None => bail!("Input closed before sign-in finished"),
        }
    }

    /// Prompt for a value that must not be echoed.
    pub async fn prompt_secret(&mut self, label: &str) -> Result<String> {
        if !self.hide_secrets {
            return self.prompt(label).await;
        }

        let prompt = format!("{label}: ");
        tokio::task::spawn_blocking(move || rpassword::prompt_password(prompt))
            .await
            .context("Password prompt task failed")?
            .context("Failed to read password")
    }

    pub fn say(&mut self, line: impl Display) -> Result<()> {
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Credentials given on the command line, used for the first submission only.
#[derive(Default)]
pub struct Prefill {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Run the form until sign-in succeeds or a fatal error occurs.
pub async fn run_sign_in<C, R, W>(
    controller: &mut SignInController<C>,
    terminal: &mut Terminal<R, W>,
    mut prefill: Prefill,
) -> Result<Session>
where
    C: AuthClient,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut email = String::new();
    let mut submitted = false;

    loop {
        match controller.phase() {
            Phase::Idle => {
                if submitted {
                    show_field_error(controller, terminal)?;
                    let messages = controller.messages();
                    terminal.say(format!(
                        "{} {}",
                        messages.forgot_password,
                        controller.forgot_password_url()
                    ))?;
                }

                email = match prefill.email.take() {
                    Some(email) => email,
                    None => {
                        let label = if email.is_empty() {
                            "Email".to_string()
                        } else {
                            format!("Email [{email}]")
                        };
                        let answer = terminal.prompt(&label).await?;
                        if answer.trim().is_empty() {
                            email
                        } else {
                            answer
                        }
                    }
                };
                let password = match prefill.password.take() {
                    Some(password) => password,
                    None => terminal.prompt_secret("Password").await?,
                };

                submitted = true;
                if let Some(session) = controller.submit_credential(&email, &password).await? {
                    return Ok(session);
                }
            }
            Phase::AwaitingSecondFactor => {
                show_field_error(controller, terminal)?;

                let messages = controller.messages();
                let cancel = messages.cancel.clone();
                let label = format!(
                    "{} ({} digits, '{}' to go back)",
                    messages.otp_prompt,
                    controller.view().otp_length,
                    cancel.to_lowercase()
                );
                let answer = terminal.prompt(&label).await?;
                let answer = answer.trim();

                if answer.eq_ignore_ascii_case(&cancel) {
                    controller.cancel_second_factor()?;
                    continue;
                }

                if let Some(session) = controller.otp_digits_changed(answer).await? {
                    return Ok(session);
                }

                if controller.phase() == Phase::AwaitingSecondFactor
                    && controller.field_error().is_none()
                {
                    if controller.otp_buffer() != answer {
                        terminal.say("The code contains digits only")?;
                    } else {
                        terminal.say(format!(
                            "Enter all {} digits",
                            controller.view().otp_length
                        ))?;
                    }
                }
            }
            Phase::Succeeded => bail!("Sign-in already completed"),
            phase @ (Phase::SubmittingCredential | Phase::SubmittingSecondFactor) => {
                bail!("Sign-in stuck in {phase}")
            }
        }
    }
}

fn show_field_error<C, R, W>(
    controller: &SignInController<C>,
    terminal: &mut Terminal<R, W>,
) -> Result<()>
where
    C: AuthClient,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if let Some(error) = controller.field_error() {
        terminal.say(format!("error: {}", error.message))?;
    }
    Ok(())
}
