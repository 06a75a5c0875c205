// Pomodoro preferences - command-line access to the user-preferences store
// Entry point and logging setup

use pomodoro_prefs::{app, commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize logging on stderr so command output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pomodoro_prefs=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = match commands::Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, commands::USAGE);
            std::process::exit(2);
        }
    };

    tracing::info!("Starting pomodoro-prefs");

    let state = app::setup();
    commands::execute(&command, &state, &mut std::io::stdout().lock())?;

    Ok(())
}
