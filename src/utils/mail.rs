use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use tracing::{error, info};

use crate::models::role::Role;

/// Fire-and-forget notifier. Every send is spawned and best-effort: a failed
/// delivery is logged and never propagates into the operation that caused it.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
    pub client_url: String,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("enabled", &self.transport.is_some())
            .field("from", &self.from)
            .finish()
    }
}

impl Mailer {
    pub fn from_env() -> Self {
        let client_url =
            std::env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let from = std::env::var("MAIL_FROM")
            .unwrap_or_else(|_| "Taskcamp <no-reply@taskcamp.local>".to_string());

        let transport = match std::env::var("SMTP_HOST") {
            Ok(host) => {
                let mut builder =
                    match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host) {
                        Ok(b) => b,
                        Err(e) => {
                            error!("SMTP relay setup failed: {e:#?}");
                            return Self {
                                transport: None,
                                from,
                                client_url,
                            };
                        }
                    };
                if let (Ok(user), Ok(pass)) =
                    (std::env::var("SMTP_USER"), std::env::var("SMTP_PASS"))
                {
                    builder = builder.credentials(Credentials::new(user, pass));
                }
                Some(builder.build())
            }
            Err(_) => None,
        };

        Self {
            transport,
            from,
            client_url,
        }
    }

    pub fn disabled() -> Self {
        Self {
            transport: None,
            from: "Taskcamp <no-reply@taskcamp.local>".to_string(),
            client_url: "http://localhost:5173".to_string(),
        }
    }

    pub fn send(&self, to: &str, subject: String, body: String) {
        let Some(transport) = self.transport.clone() else {
            info!("mail disabled, skipping `{subject}` to {to}");
            return;
        };
        let message = Message::builder()
            .from(match self.from.parse() {
                Ok(m) => m,
                Err(e) => {
                    error!("bad MAIL_FROM address: {e:#?}");
                    return;
                }
            })
            .to(match to.parse() {
                Ok(m) => m,
                Err(e) => {
                    error!("bad recipient address {to}: {e:#?}");
                    return;
                }
            })
            .subject(subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(body);
        let message = match message {
            Ok(m) => m,
            Err(e) => {
                error!("failed to build mail `{subject}`: {e:#?}");
                return;
            }
        };
        tokio::spawn(async move {
            if let Err(e) = transport.send(message).await {
                error!("failed to send `{subject}`: {e:#?}");
            }
        });
    }
}

pub fn verification_email(username: &str, verify_url: &str) -> (String, String) {
    (
        "Please verify your email".to_string(),
        format!(
            "Hi {username},\n\nWelcome to Taskcamp! Please verify your email:\n{verify_url}\n\n\
             If you did not create an account, you can safely ignore this email.\n"
        ),
    )
}

pub fn invitation_email(
    inviter: &str,
    project_name: &str,
    role: Role,
    invite_url: &str,
) -> (String, String) {
    (
        format!("Invitation to join project: {project_name}"),
        format!(
            "You've been invited by {inviter} to join the project \"{project_name}\" as a {role}.\n\n\
             To accept this invitation, open the link below:\n{invite_url}\n\n\
             You'll need to register first if you don't have an account.\n"
        ),
    )
}

pub fn welcome_email(username: &str, project_name: &str, role: Role) -> (String, String) {
    (
        format!("Welcome to project: {project_name}"),
        format!(
            "Hi {username},\n\nYou have successfully joined the project \"{project_name}\" as a {role}.\n"
        ),
    )
}

pub fn role_change_email(
    username: &str,
    project_name: &str,
    old_role: Role,
    new_role: Role,
) -> (String, String) {
    (
        format!("Your role has been updated in project: {project_name}"),
        format!(
            "Hi {username},\n\nYour role in project \"{project_name}\" has been changed \
             from {old_role} to {new_role}.\n"
        ),
    )
}
