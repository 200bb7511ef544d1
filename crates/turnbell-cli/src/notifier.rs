//! Desktop notification dispatch.
//!
//! Text is always passed to the notifier as separate process arguments,
//! never spliced into a shell or script string.

use anyhow::{Context, bail};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use turnbell::sanitize_notification_text;

use crate::config::NotificationSettings;
use crate::error::{CliError, Result};

const TITLE_PLACEHOLDER: &str = "{title}";
const BODY_PLACEHOLDER: &str = "{body}";

/// Sanitized notification text, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    /// Sanitizes the configured title and body.
    #[must_use]
    pub fn from_settings(settings: &NotificationSettings) -> Self {
        Self {
            title: sanitize_notification_text(
                &settings.title,
                &settings.title_fallback,
                settings.title_max_length,
            ),
            body: sanitize_notification_text(
                &settings.message,
                &settings.message_fallback,
                settings.message_max_length,
            ),
        }
    }
}

/// Displays a notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Shows `notification` to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be displayed.
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Runs an external program to display the notification.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
    /// Spawn the program without waiting for it to exit
    detach: bool,
}

impl CommandNotifier {
    /// Builds a notifier from a `[program, args...]` template.
    ///
    /// `{title}` and `{body}` inside any argument are replaced at dispatch time.
    ///
    /// # Errors
    ///
    /// Returns an error if the template has no program.
    pub fn from_template(template: &[String]) -> Result<Self> {
        let (program, args) = template
            .split_first()
            .filter(|(program, _)| !program.trim().is_empty())
            .ok_or_else(|| {
                CliError::Config("Notification command must start with a program".to_string())
            })?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            detach: false,
        })
    }

    /// Returns a notifier that spawns the program and does not wait for it.
    ///
    /// Only spawn failures are reported; the exit status is ignored.
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.detach = true;
        self
    }

    /// The stock notifier for the current platform.
    ///
    /// On Windows this is a tray balloon tip, which stays on screen for a few
    /// seconds, so the process is detached instead of awaited.
    #[must_use]
    pub fn platform_default() -> Self {
        let (program, args): (&str, &[&str]) = if cfg!(target_os = "macos") {
            (
                "osascript",
                &[
                    "-e",
                    "on run argv",
                    "-e",
                    "display notification (item 2 of argv) with title (item 1 of argv)",
                    "-e",
                    "end run",
                    TITLE_PLACEHOLDER,
                    BODY_PLACEHOLDER,
                ],
            )
        } else if cfg!(windows) {
            (
                "powershell",
                &[
                    "-NoProfile",
                    "-Command",
                    "Add-Type -AssemblyName System.Windows.Forms; \
                     $icon = New-Object System.Windows.Forms.NotifyIcon; \
                     $icon.Icon = [System.Drawing.SystemIcons]::Information; \
                     $icon.Visible = $true; \
                     $icon.ShowBalloonTip(5000, $args[0], $args[1], 'Info'); \
                     Start-Sleep -Seconds 6; \
                     $icon.Dispose()",
                    TITLE_PLACEHOLDER,
                    BODY_PLACEHOLDER,
                ],
            )
        } else {
            ("notify-send", &[TITLE_PLACEHOLDER, BODY_PLACEHOLDER])
        };

        Self {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            detach: cfg!(windows),
        }
    }

    fn render_args(&self, notification: &Notification) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace(TITLE_PLACEHOLDER, &notification.title)
                    .replace(BODY_PLACEHOLDER, &notification.body)
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        let args = self.render_args(notification);
        debug!(program = %self.program, detach = self.detach, "Dispatching notification");

        let mut command = Command::new(&self.program);
        command.args(&args);

        if self.detach {
            command
                .spawn()
                .with_context(|| format!("Failed to run notifier `{}`", self.program))?;
            return Ok(());
        }

        let status = command
            .status()
            .await
            .with_context(|| format!("Failed to run notifier `{}`", self.program))?;

        if !status.success() {
            bail!("Notifier `{}` exited with {status}", self.program);
        }

        Ok(())
    }
}

/// Prints notifications to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        println!("{}: {}", notification.title, notification.body);
        Ok(())
    }
}
