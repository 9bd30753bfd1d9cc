use counter_client::handlers::{Command, CommandError, handle, parse_command};
use counter_client::{App, Config, build, ui};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{self, LocalSet};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    info!(
        "records at {}, auth at {}, session in {}",
        config.api_base,
        config.auth_base,
        config.session_path.display()
    );
    let view = build(&config);

    // one logical thread of control; overlapping requests interleave at their awaits
    LocalSet::new().run_until(run(view)).await
}

async fn run(view: Arc<App>) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", ui::render(&view));
    view.boot().await;
    print!("{}", ui::render(&view));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        if command.is_background() {
            let task_view = Arc::clone(&view);
            task::spawn_local(async move {
                report(handle(task_view, command).await);
            });
            // let the task apply its local change before drawing
            task::yield_now().await;
        } else {
            report(handle(Arc::clone(&view), command).await);
        }
        print!("{}", ui::render(&view));
    }

    info!("bye");
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()
}

fn report(result: Result<Option<String>, CommandError>) {
    match result {
        Ok(Some(message)) => println!("{message}"),
        Ok(None) => {}
        Err(err) => println!("{err}"),
    }
}
