use std::io::{BufRead, IsTerminal, Write};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fhir::ResourceId;
use medview_core::constants::SEARCH_DEBOUNCE;
use medview_core::i18n::Label;
use medview_core::{
    run_debouncer, AppState, Language, PatientDetail, PatientList, Renderer, Route, Tab, Theme,
    ViewerConfig,
};

/// Screen currently shown once signed in.
enum Screen {
    Patients,
    Detail(PatientDetail),
    Settings,
}

/// What the command loop should do after a command.
enum Flow {
    Continue,
    SignedOut,
    Quit,
}

/// Interactive medview viewer
///
/// Routes through onboarding and login as needed, then reads commands from stdin:
/// `search <text>`, `next`, `prev`, `open <id>`, `back`, `patients`, `settings`,
/// `language <en|ar>`, `theme <dark|light|system>`, `logout`, `quit`.
///
/// # Environment Variables
/// - `MEDPLUM_BASE_URL`: server root (default: "http://localhost:8103/")
/// - `MEDPLUM_CLIENT_ID`: OAuth client id used for login
/// - `MEDVIEW_STORAGE_PATH`: preference and session file (default: "medview.yaml")
/// - `MEDVIEW_PAGE_SIZE`: patients per page (default: 10)
/// - `MEDVIEW_REQUEST_TIMEOUT_SECS`: request timeout (default: 30)
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

    let config = ViewerConfig::from_env()?;
    tracing::info!("++ Starting medview against {}", config.base_url());
    let app = AppState::open(config)?;
    let mut lines = spawn_stdin_reader();

    loop {
        match app.current_route()? {
            Route::Onboarding => {
                let renderer = app.renderer(colour())?;
                println!("{}", renderer.onboarding());
                if ask(&mut lines, "").await.is_none() {
                    return Ok(());
                }
                app.complete_onboarding()?;
            }
            Route::Login => {
                if !login(&app, &mut lines).await? {
                    return Ok(());
                }
            }
            Route::Tabs(_) | Route::PatientDetail(_) => match browse(&app, &mut lines).await? {
                Flow::SignedOut | Flow::Continue => continue,
                Flow::Quit => return Ok(()),
            },
        }
    }
}

fn colour() -> bool {
    std::io::stdout().is_terminal()
}

/// Forward stdin lines into a channel so they can be awaited alongside timers.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn ask(lines: &mut mpsc::Receiver<String>, label: &str) -> Option<String> {
    print!("{label}");
    std::io::stdout().flush().ok()?;
    lines.recv().await
}

/// Prompt until sign-in succeeds. Returns false when input ends.
async fn login(app: &AppState, lines: &mut mpsc::Receiver<String>) -> anyhow::Result<bool> {
    let renderer = app.renderer(colour())?;
    let email_label = format!("{}: ", renderer.text(Label::Email));
    let password_label = format!("{}: ", renderer.text(Label::Password));
    println!("{}", renderer.text(Label::SignIn));
    loop {
        let Some(email) = ask(lines, &email_label).await else {
            return Ok(false);
        };
        let Some(password) = ask(lines, &password_label).await else {
            return Ok(false);
        };
        match app.sign_in(&email, &password).await {
            Ok(state) => {
                println!(
                    "{} {}",
                    renderer.text(Label::LoggedInAs),
                    state.profile.as_deref().unwrap_or(email.trim())
                );
                return Ok(true);
            }
            Err(failure) => eprintln!("{:?}: {}", failure.field, failure.message),
        }
    }
}

/// The signed-in tabs: patient list, patient detail and settings.
async fn browse(app: &AppState, lines: &mut mpsc::Receiver<String>) -> anyhow::Result<Flow> {
    let (search_tx, search_rx) = mpsc::channel(16);
    let (commit_tx, mut commits) = mpsc::channel(4);
    let debouncer = tokio::spawn(run_debouncer(search_rx, commit_tx, SEARCH_DEBOUNCE));

    let mut renderer = app.renderer(colour())?;
    let mut list = PatientList::new(app.config().page_size());
    let mut screen = Screen::Patients;
    list.load(app.resources()).await;
    show(&renderer, &screen, &list);

    let flow = loop {
        tokio::select! {
            committed = commits.recv() => {
                let Some(text) = committed else { break Flow::Continue };
                if list.commit_filter(&text) {
                    list.load(app.resources()).await;
                }
                if matches!(screen, Screen::Patients) {
                    show(&renderer, &screen, &list);
                }
            }
            line = lines.recv() => {
                let Some(line) = line else { break Flow::Quit };
                let (command, argument) = match line.trim().split_once(' ') {
                    Some((command, argument)) => (command.to_owned(), argument.trim().to_owned()),
                    None => (line.trim().to_owned(), String::new()),
                };
                match command.as_str() {
                    "" => {}
                    "search" => {
                        screen = Screen::Patients;
                        if search_tx.send(argument).await.is_err() {
                            tracing::warn!("search debouncer stopped");
                        }
                        continue;
                    }
                    "next" => {
                        if list.next_page() {
                            list.load(app.resources()).await;
                        }
                        screen = Screen::Patients;
                    }
                    "prev" => {
                        if list.prev_page() {
                            list.load(app.resources()).await;
                        }
                        screen = Screen::Patients;
                    }
                    "open" => match ResourceId::parse(&argument) {
                        Ok(id) => {
                            let mut detail = PatientDetail::new(id);
                            detail.load(app.resources()).await;
                            screen = Screen::Detail(detail);
                        }
                        Err(e) => {
                            eprintln!("{e}");
                            continue;
                        }
                    },
                    "back" | "patients" => screen = Screen::Patients,
                    "settings" => screen = Screen::Settings,
                    "language" => match argument.parse::<Language>() {
                        Ok(language) => {
                            app.set_language(language)?;
                            renderer = app.renderer(colour())?;
                        }
                        Err(e) => eprintln!("{e}"),
                    },
                    "theme" => match argument.parse::<Theme>() {
                        Ok(theme) => {
                            app.set_theme(theme)?;
                            renderer = app.renderer(colour())?;
                        }
                        Err(e) => eprintln!("{e}"),
                    },
                    "logout" => {
                        app.sign_out().await?;
                        break Flow::SignedOut;
                    }
                    "quit" | "exit" => break Flow::Quit,
                    other => {
                        eprintln!("unknown command {other:?}");
                        continue;
                    }
                }
                show(&renderer, &screen, &list);
            }
        }
    };

    debouncer.abort();
    Ok(flow)
}

fn show(renderer: &Renderer, screen: &Screen, list: &PatientList) {
    let tab = match screen {
        Screen::Settings => Tab::Settings,
        Screen::Patients | Screen::Detail(_) => Tab::Patients,
    };
    let text = match screen {
        Screen::Patients => renderer.patient_list(list),
        Screen::Detail(detail) => renderer.patient_detail(detail),
        Screen::Settings => renderer.settings(),
    };
    println!("{text}");
    println!("{}", tab_bar(renderer, tab));
}

fn tab_bar(renderer: &Renderer, current: Tab) -> String {
    let tab = |tab: Tab, label: Label| {
        if tab == current {
            format!("[{}]", renderer.text(label))
        } else {
            format!(" {} ", renderer.text(label))
        }
    };
    format!(
        "{} | {}",
        tab(Tab::Patients, Label::PatientsTab),
        tab(Tab::Settings, Label::SettingsTab)
    )
}
