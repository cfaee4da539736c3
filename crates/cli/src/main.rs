use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use fhir::ResourceId;
use medview_client::subscription::subscribe;
use medview_core::{
    AppState, Language, NotificationWatcher, PatientDetail, PatientList, Renderer, Route,
    Theme, ViewerConfig,
};
use std::io::{BufRead, IsTerminal, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "medview")]
#[command(about = "FHIR patient record viewer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server is up
    Health,
    /// Sign in with email and password
    Login {
        /// Account email
        email: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// List one page of patients
    Patients {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Name filter
        #[arg(long)]
        name: Option<String>,
    },
    /// Show a patient with their diagnostic reports
    Patient {
        /// Patient resource id
        id: String,
    },
    /// Show settings
    Settings,
    /// Set the UI language (en or ar)
    SetLanguage { language: String },
    /// Set the colour theme (dark, light or system)
    SetTheme { theme: String },
    /// Show the welcome screen and finish onboarding
    Onboard,
    /// Watch notifications for a subscription criteria, e.g. Patient?name=Mary
    Watch { criteria: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medview=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'medview --help' for commands");
        return Ok(());
    };

    let app = AppState::open(ViewerConfig::from_env()?)?;
    let renderer = app.renderer(std::io::stdout().is_terminal())?;

    match command {
        Commands::Health => {
            let health = app.client().healthcheck().await?;
            println!(
                "ok: {}, version: {}",
                health.ok,
                health.version.as_deref().unwrap_or("unknown")
            );
        }
        Commands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ")?,
            };
            match app.sign_in(&email, &password).await {
                Ok(state) => println!(
                    "Logged in as {}",
                    state.profile.as_deref().unwrap_or(email.as_str())
                ),
                Err(failure) => bail!("{:?} error: {}", failure.field, failure.message),
            }
        }
        Commands::Logout => {
            app.sign_out().await?;
            println!("Signed out");
        }
        Commands::Patients { page, name } => {
            require_session(&app)?;
            let mut list = PatientList::new(app.config().page_size());
            if let Some(name) = name {
                list.commit_filter(&name);
            }
            list.set_page(page);
            list.load(app.resources()).await;
            println!("{}", renderer.patient_list(&list));
        }
        Commands::Patient { id } => {
            require_session(&app)?;
            let id = ResourceId::parse(&id).context("invalid patient id")?;
            let mut detail = PatientDetail::new(id);
            detail.load(app.resources()).await;
            println!("{}", renderer.patient_detail(&detail));
        }
        Commands::Settings => {
            println!("{}", renderer.settings());
        }
        Commands::SetLanguage { language } => {
            let language: Language = language.parse()?;
            app.set_language(language)?;
            println!("Language set to {language}");
        }
        Commands::SetTheme { theme } => {
            let theme: Theme = theme.parse()?;
            app.set_theme(theme)?;
            println!("Theme set to {theme}");
        }
        Commands::Onboard => {
            println!("{}", renderer.onboarding());
            if app.complete_onboarding()? == Route::Login {
                println!("Next: medview login <email>");
            }
        }
        Commands::Watch { criteria } => {
            require_session(&app)?;
            watch(&app, &renderer, &criteria).await?;
        }
    }

    Ok(())
}

fn require_session(app: &AppState) -> anyhow::Result<()> {
    match app.current_route()? {
        Route::Onboarding => bail!("run 'medview onboard' first"),
        Route::Login => bail!("not signed in; run 'medview login <email>'"),
        Route::Tabs(_) | Route::PatientDetail(_) => Ok(()),
    }
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

async fn watch(app: &AppState, renderer: &Renderer, criteria: &str) -> anyhow::Result<()> {
    let mut handle = subscribe(app.client(), criteria).await?;
    tracing::info!(subscription = handle.subscription_id(), "watching; Ctrl-C to stop");
    let mut watcher = NotificationWatcher::new();
    println!("{}", renderer.notifications(&watcher));

    loop {
        tokio::select! {
            event = handle.next() => {
                let Some(event) = event else { break };
                let counted = watcher.apply(event);
                println!("{}", renderer.notifications(&watcher));
                if let Some(last) = watcher.last().filter(|_| counted) {
                    for focus in &last.focus {
                        println!("  {focus}");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
