use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mailer_core::domain::{ComposedMessage, MessageKind, Recipient};
use mailer_core::email::SmtpEmailProvider;
use mailer_core::i18n::TranslationCatalog;
use mailer_core::{telemetry, Config, MailRequest, Mailer};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "mailer-core")]
#[command(version)]
#[command(about = "Compose and send localized transactional emails")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a composed email without sending it
    Preview {
        #[command(flatten)]
        mail: MailArgs,

        /// Print the whole message as JSON
        #[arg(long, conflicts_with = "html")]
        json: bool,

        /// Print only the HTML body
        #[arg(long)]
        html: bool,
    },

    /// Compose and send an email over SMTP
    Send {
        #[command(flatten)]
        mail: MailArgs,
    },

    /// Check the SMTP connection
    Check,

    /// List supported locales
    Locales,
}

#[derive(Args)]
struct MailArgs {
    /// Kind of email
    #[arg(value_enum)]
    kind: KindArg,

    /// Recipient address
    #[arg(long)]
    to: String,

    /// Recipient display name
    #[arg(long)]
    name: Option<String>,

    /// Action link placed in the email
    #[arg(long)]
    link: String,

    /// Locale code; unsupported codes use the default locale
    #[arg(short, long)]
    locale: Option<String>,

    /// Item name (invitation, export-ready, published)
    #[arg(long)]
    item: Option<String>,

    /// Inviting user (invitation)
    #[arg(long)]
    creator: Option<String>,

    /// Days the download stays valid (export-ready)
    #[arg(long)]
    days: Option<u32>,

    /// The address already has an account (login)
    #[arg(long)]
    re_registration: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum KindArg {
    Login,
    Register,
    Invitation,
    ExportReady,
    Published,
}

impl From<KindArg> for MessageKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Login => MessageKind::Login,
            KindArg::Register => MessageKind::Register,
            KindArg::Invitation => MessageKind::Invitation,
            KindArg::ExportReady => MessageKind::ExportReady,
            KindArg::Published => MessageKind::Published,
        }
    }
}

impl MailArgs {
    /// Missing parameters are left out so composition reports them
    fn into_request(self, default_days: u32) -> MailRequest {
        let kind = MessageKind::from(self.kind);
        let recipient = match self.name {
            Some(name) => Recipient::with_name(self.to, name),
            None => Recipient::new(self.to),
        };

        let mut request =
            MailRequest::new(kind, recipient, self.link).in_locale(self.locale.as_deref());
        request.re_registration_attempt = self.re_registration;

        if let Some(item) = self.item {
            request.params.insert("item_name", item);
        }
        if let Some(creator) = self.creator {
            request.params.insert("creator_name", creator);
        }
        if kind == MessageKind::ExportReady {
            request
                .params
                .insert("days", self.days.unwrap_or(default_days));
        }
        request
    }
}

fn print_message(message: &ComposedMessage, json: bool, html: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(message)?);
    } else if html {
        println!("{}", message.html_body);
    } else {
        println!("To: {}", message.recipient.to_mailbox_string());
        println!("Subject: {}", message.subject);
        println!();
        println!("{}", message.text_body);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    telemetry::init(&config.telemetry);

    let catalog = Arc::new(
        TranslationCatalog::embedded(&config.default_locale)
            .context("Failed to load translations")?,
    );
    let provider = Arc::new(
        SmtpEmailProvider::from_config(&config.smtp).context("Failed to configure SMTP")?,
    );
    let mailer = Mailer::new(catalog, provider, &config.mailer);
    let default_days = config.mailer.export_expiration_days;

    match cli.command {
        Commands::Preview { mail, json, html } => {
            let message = mailer.preview(&mail.into_request(default_days)).await?;
            print_message(&message, json, html)?;
        }
        Commands::Send { mail } => {
            let request = mail.into_request(default_days);
            let kind = request.kind;
            info!("Sending {} email via {}", kind, config.smtp_addr());
            mailer.send(request).await?;
            info!("Sent {} email", kind);
        }
        Commands::Check => {
            mailer.test_connection().await?;
            info!("SMTP connection to {} OK", config.smtp_addr());
        }
        Commands::Locales => {
            let catalog = mailer.catalog();
            for code in catalog.supported_locales() {
                if code == catalog.default_code() {
                    println!("{} (default)", code);
                } else {
                    println!("{}", code);
                }
            }
        }
    }

    Ok(())
}
