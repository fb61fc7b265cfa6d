//! Moox Events admin command line.
//!
//! Each subcommand plays one dashboard screen: it loads the list, performs the
//! action, prints the result and the notification the screen would show.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moox_admin::auth::{AuthOutcome, AuthState, Destination, SignupForm};
use moox_admin::config::Config;
use moox_admin::errors::AppError;
use moox_admin::ingest::ImageFile;
use moox_admin::models::{
    Achievement, Blog, CareerPosting, Client, ContactQuery, Enquiry, Event, GalleryPhoto,
    Resource, Service, TeamMember,
};
use moox_admin::notify::{Level, Notifier};
use moox_admin::public::{ApplicationSubmission, ContactSubmission, EnquirySubmission};
use moox_admin::resource::{PendingForm, ResourceKind, ResourceListManager};
use moox_admin::AdminContext;

#[derive(Parser)]
#[command(name = "moox-admin", version, about = "Moox Events admin client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in with email and password
    Login {
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        captcha: Option<String>,
    },
    /// Verify the OTP mailed to the pending account
    VerifyOtp {
        otp: String,
        #[arg(long)]
        captcha: Option<String>,
    },
    /// Create an admin account
    Signup(SignupArgs),
    /// Clear the stored session
    Logout,
    /// Show the stored session
    Whoami,
    /// Show or set the dashboard section
    Section { name: Option<String> },
    /// List items of one kind
    List {
        kind: ResourceKind,
        /// Split into open and resolved
        #[arg(long)]
        grouped: bool,
    },
    /// Add an item
    Add {
        kind: ResourceKind,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Edit an item (services only)
    Edit {
        kind: ResourceKind,
        id: String,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Flip an item's active status
    Toggle { kind: ResourceKind, id: String },
    /// Resolve an open enquiry or contact query
    Resolve { kind: ResourceKind, id: String },
    /// Delete an item (services only)
    Delete { kind: ResourceKind, id: String },
    /// Applications received for a career posting
    Applications { position_id: String },
    /// Public site feeds and forms
    Public {
        #[command(subcommand)]
        action: PublicCommand,
    },
}

#[derive(Args)]
struct SignupArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    mobile: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    dob: String,
    #[arg(long)]
    gender: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    captcha: Option<String>,
}

#[derive(Args)]
struct FormArgs {
    /// Text field as name=value
    #[arg(long = "field", value_parser = parse_pair)]
    fields: Vec<(String, String)>,
    /// Image field as slot=path
    #[arg(long = "image", value_parser = parse_pair)]
    images: Vec<(String, String)>,
}

#[derive(Args)]
struct ContactArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    mobile: String,
}

#[derive(Subcommand)]
enum PublicCommand {
    Services,
    Purposes,
    Clients,
    Gallery,
    Blogs,
    Team,
    Achievements {
        /// Only the home page highlights
        #[arg(long)]
        home: bool,
    },
    Jobs,
    /// Send a service enquiry
    Enquiry {
        #[command(flatten)]
        contact: ContactArgs,
        #[arg(long)]
        purpose_id: String,
        #[arg(long)]
        purpose_name: String,
        #[arg(long)]
        message: String,
    },
    /// Send a Contact Us message
    Contact {
        #[command(flatten)]
        contact: ContactArgs,
        #[arg(long)]
        purpose: String,
    },
    /// Apply for a position
    Apply {
        #[command(flatten)]
        contact: ContactArgs,
        #[arg(long)]
        position_id: String,
    },
}

/// What to do with one screen's list.
enum Action {
    List { grouped: bool },
    Add(FormArgs),
    Edit(String, FormArgs),
    Toggle(String),
    Resolve(String),
    Delete(String),
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // Logs go to stderr; stdout carries command output.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    let cli = Cli::parse();
    tracing::debug!("API endpoint: {}", config.endpoint(""));
    tracing::debug!("Session database: {:?}", config.session_db_path);

    let ctx = AdminContext::open(config).await?;
    run(&ctx, cli.command).await?;
    Ok(())
}

async fn run(ctx: &AdminContext, command: Command) -> Result<(), AppError> {
    match command {
        Command::Login {
            email,
            password,
            captcha,
        } => {
            let auth = ctx.auth();
            let outcome = auth.login(&email, &password, captcha.as_deref()).await;
            navigate(auth.notifier(), outcome)
        }
        Command::VerifyOtp { otp, captcha } => {
            let auth = ctx.auth();
            let outcome = auth.verify_otp(&otp, captcha.as_deref()).await;
            navigate(auth.notifier(), outcome)
        }
        Command::Signup(args) => {
            let auth = ctx.auth();
            let form = SignupForm {
                name: args.name,
                mobile_no: args.mobile,
                email: args.email,
                date_of_birth: args.dob,
                gender: args.gender,
                password: args.password,
                recaptcha_token: args.captcha,
            };
            let outcome = auth.signup(&form).await;
            navigate(auth.notifier(), outcome)
        }
        Command::Logout => {
            let auth = ctx.auth();
            let outcome = auth.logout().await;
            navigate(auth.notifier(), outcome)
        }
        Command::Whoami => {
            match ctx.auth().restore().await? {
                AuthState::Authenticated(session) => print_json(&session)?,
                AuthState::AwaitingOtp { email } => println!("Awaiting OTP for {}", email),
                _ => println!("Not logged in"),
            }
            Ok(())
        }
        Command::Section { name } => {
            match name {
                Some(name) => {
                    if ResourceKind::from_section(&name).is_none() {
                        return Err(AppError::Validation(format!("Unknown section '{}'", name)));
                    }
                    ctx.session.set_active_section(&name).await?;
                    println!("{}", name);
                }
                None => println!("{}", ctx.session.active_section().await?),
            }
            Ok(())
        }
        Command::List { kind, grouped } => dispatch(ctx, kind, Action::List { grouped }).await,
        Command::Add { kind, form } => dispatch(ctx, kind, Action::Add(form)).await,
        Command::Edit { kind, id, form } => dispatch(ctx, kind, Action::Edit(id, form)).await,
        Command::Toggle { kind, id } => dispatch(ctx, kind, Action::Toggle(id)).await,
        Command::Resolve { kind, id } => dispatch(ctx, kind, Action::Resolve(id)).await,
        Command::Delete { kind, id } => dispatch(ctx, kind, Action::Delete(id)).await,
        Command::Applications { position_id } => {
            guard(ctx).await?;
            let manager = ctx.manager::<CareerPosting>();
            let applications = manager.applications(&position_id).await;
            let applications = finish(manager.notifier(), applications)?;
            print_json(&applications)
        }
        Command::Public { action } => run_public(ctx, action).await,
    }
}

/// Dashboard screens need a signed-in session; without one the user is sent to login.
async fn guard(ctx: &AdminContext) -> Result<(), AppError> {
    match ctx.session.require().await {
        Ok(session) => {
            tracing::debug!(user_id = %session.user_id, "Session present");
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.message());
            tracing::info!(destination = Destination::Login.path(), "Next page");
            Err(err)
        }
    }
}

async fn dispatch(ctx: &AdminContext, kind: ResourceKind, action: Action) -> Result<(), AppError> {
    guard(ctx).await?;
    ctx.session.set_active_section(kind.endpoints().section).await?;
    match kind {
        ResourceKind::Service => run_screen(ctx.manager::<Service>(), action).await,
        ResourceKind::Client => run_screen(ctx.manager::<Client>(), action).await,
        ResourceKind::Gallery => run_screen(ctx.manager::<GalleryPhoto>(), action).await,
        ResourceKind::Blog => run_screen(ctx.manager::<Blog>(), action).await,
        ResourceKind::TeamMember => run_screen(ctx.manager::<TeamMember>(), action).await,
        ResourceKind::Achievement => run_screen(ctx.manager::<Achievement>(), action).await,
        ResourceKind::Career => run_screen(ctx.manager::<CareerPosting>(), action).await,
        ResourceKind::Enquiry => run_screen(ctx.manager::<Enquiry>(), action).await,
        ResourceKind::ContactQuery => run_screen(ctx.manager::<ContactQuery>(), action).await,
        ResourceKind::Event => run_screen(ctx.manager::<Event>(), action).await,
    }
}

async fn run_screen<T: Resource>(
    manager: ResourceListManager<T>,
    action: Action,
) -> Result<(), AppError> {
    let loaded = manager.fetch_list().await;
    finish(manager.notifier(), loaded)?;

    let result = match action {
        Action::List { grouped: false } => return print_json(&manager.items().await),
        Action::List { grouped: true } => {
            let groups = manager.grouped().await;
            return print_json(&serde_json::json!({
                "open": groups.open,
                "resolved": groups.resolved,
            }));
        }
        Action::Add(args) => {
            let mut form = PendingForm::new();
            fill_form(&manager, &mut form, args).await?;
            manager.create(&mut form).await.map(|_| ())
        }
        Action::Edit(id, args) => {
            let mut form = manager.begin_edit(&id).await?;
            fill_form(&manager, &mut form, args).await?;
            manager.edit(&id, &mut form).await.map(|_| ())
        }
        Action::Toggle(id) => match manager.item(&id).await {
            Some(item) => manager.toggle_active(&id, item.is_active()).await.map(|_| ()),
            None => Err(AppError::Validation(format!("No {} with id {}", T::KIND, id))),
        },
        Action::Resolve(id) => manager.resolve(&id).await,
        Action::Delete(id) => manager.delete(&id).await,
    };

    manager.settle().await;
    finish(manager.notifier(), result)
}

async fn fill_form<T: Resource>(
    manager: &ResourceListManager<T>,
    form: &mut PendingForm,
    args: FormArgs,
) -> Result<(), AppError> {
    for (name, value) in args.fields {
        form.set_field(name, value);
    }
    for (slot, path) in args.images {
        let file = ImageFile::from_path(&PathBuf::from(path)).await;
        let file = finish(manager.notifier(), file)?;
        let attached = manager.attach_image(form, &slot, file).await;
        finish(manager.notifier(), attached)?;
    }
    Ok(())
}

async fn run_public(ctx: &AdminContext, action: PublicCommand) -> Result<(), AppError> {
    let site = ctx.public_site();
    let notifier = site.notifier().clone();
    match action {
        PublicCommand::Services => print_json(&finish(&notifier, site.services().await)?),
        PublicCommand::Purposes => {
            for purpose in finish(&notifier, site.purposes().await)? {
                println!("{}\t{}", purpose.purpose_id, purpose.purpose_name);
            }
            Ok(())
        }
        PublicCommand::Clients => print_json(&finish(&notifier, site.clients().await)?),
        PublicCommand::Gallery => print_json(&finish(&notifier, site.gallery().await)?),
        PublicCommand::Blogs => print_json(&finish(&notifier, site.blogs().await)?),
        PublicCommand::Team => print_json(&finish(&notifier, site.team().await)?),
        PublicCommand::Achievements { home: true } => {
            print_json(&finish(&notifier, site.achievement_highlights().await)?)
        }
        PublicCommand::Achievements { home: false } => {
            print_json(&finish(&notifier, site.achievements().await)?)
        }
        PublicCommand::Jobs => print_json(&finish(&notifier, site.jobs().await)?),
        PublicCommand::Enquiry {
            contact,
            purpose_id,
            purpose_name,
            message,
        } => {
            let enquiry = EnquirySubmission {
                name: contact.name,
                mobileno: contact.mobile,
                email: contact.email,
                purpose_id,
                purpose_name,
                message,
            };
            finish(&notifier, site.submit_enquiry(&enquiry).await).map(|_| ())
        }
        PublicCommand::Contact { contact, purpose } => {
            let submission = ContactSubmission {
                name: contact.name,
                email: contact.email,
                mobileno: contact.mobile,
                purpose,
            };
            finish(&notifier, site.submit_contact(&submission).await).map(|_| ())
        }
        PublicCommand::Apply {
            contact,
            position_id,
        } => {
            let application = ApplicationSubmission {
                name: contact.name,
                email: contact.email,
                mobileno: contact.mobile,
                position_id,
            };
            finish(&notifier, site.apply(&application).await).map(|_| ())
        }
    }
}

/// Print the screen's notification, then pass the result through.
fn finish<R>(notifier: &Notifier, result: Result<R, AppError>) -> Result<R, AppError> {
    if let Some(notification) = notifier.current() {
        match notification.level {
            Level::Info => println!("{}", notification.message),
            Level::Error => eprintln!("{}", notification.message),
        }
        notifier.dismiss();
    }
    result
}

/// Print the notification and the page the browser would move to.
fn navigate(notifier: &Notifier, outcome: Result<AuthOutcome, AppError>) -> Result<(), AppError> {
    let outcome = finish(notifier, outcome)?;
    tracing::info!(destination = outcome.destination().path(), "Next page");
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
