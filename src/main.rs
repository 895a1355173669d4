use std::io::{self, BufRead, Write};
use std::time::Duration;

use color_eyre::Result;
use profile_chat::config::{load_dotenv, Config, Credentials};
use profile_chat::openai::Turn;
use profile_chat::ProfileChatService;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const ENV_CANDIDATES: [&str; 2] = ["../../.env", ".env"];
const NOTIFY_DRAIN: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // ログ: 標準出力は会話に使うため、ファイルへのみ出力する
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    load_dotenv(&ENV_CANDIDATES);
    let config = Config::from_env()?;
    let credentials = Credentials::from_env()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("ask") => {
            let prompt = args[1..].join(" ");
            if prompt.trim().is_empty() {
                color_eyre::eyre::bail!("usage: profile_chat ask <prompt>");
            }
            let service = ProfileChatService::from_config(config, &credentials)?;
            println!("{}", service.ask(&prompt).await?);
        }
        None | Some("chat") => {
            let service = ProfileChatService::from_config(config, &credentials)?;
            run_repl(&service).await?;
            service.drain_notifications(NOTIFY_DRAIN).await;
        }
        Some(other) => color_eyre::eyre::bail!("unknown command '{other}' (expected 'chat' or 'ask')"),
    }
    Ok(())
}

/// Line-oriented chat on stdin/stdout. The history lives here, not in the
/// service.
async fn run_repl(service: &ProfileChatService) -> Result<()> {
    let name = service.config().profile_name.clone();
    println!("Chat with {name}'s AI representative. Empty line or Ctrl-D to quit.");

    let mut history: Vec<Turn> = Vec::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let message = line?;
        if message.trim().is_empty() {
            break;
        }

        match service.chat(&message, &history).await {
            Ok(answer) => {
                println!("{answer}\n");
                history.push(Turn::user(message));
                history.push(Turn::assistant(answer));
            }
            Err(e) => {
                tracing::error!(target: "chat", error = %e, "chat failed");
                eprintln!("error: {e}");
            }
        }
    }
    Ok(())
}
