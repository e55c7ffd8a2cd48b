use anyhow::Context;
use clap::Parser;
use coffee_protocol::app::terminal::{SessionOutcome, Terminal};
use coffee_protocol::config::ClientSettings;
use coffee_protocol::core::SubmissionGateway;
use coffee_protocol::utils::{error::ErrorKind, logger, validation::Validate};
use coffee_protocol::{
    CliConfig, HandlerEnv, HttpSubmissionGateway, InProcessGateway, LocalCounterStore, NotionClient,
    Questionnaire, SubmissionHandler,
};
use std::io;

fn build_gateway(settings: &ClientSettings) -> anyhow::Result<Box<dyn SubmissionGateway>> {
    match &settings.endpoint {
        Some(endpoint) => {
            tracing::info!("🌐 Submitting to remote handler: {}", endpoint);
            Ok(Box::new(HttpSubmissionGateway::new(endpoint.clone(), settings.timeout())?))
        }
        None => {
            let env = HandlerEnv::from_env();
            env.validate().context("invalid handler environment")?;
            tracing::info!("🔧 Running submission handler in-process: {:?}", env);
            let client = NotionClient::from_env(&env)?;
            Ok(Box::new(InProcessGateway::new(SubmissionHandler::new(client, env))))
        }
    }
}

async fn run(settings: ClientSettings) -> anyhow::Result<()> {
    let gateway = build_gateway(&settings)?;
    let counter = LocalCounterStore::new(&settings.counter_path);

    let mut terminal = Terminal::new(io::stdin().lock(), io::stdout());
    let mut questionnaire = Questionnaire::new();

    println!("☕ Coffee System Generator");

    loop {
        let outcome = terminal
            .run_session(&mut questionnaire, &settings, gateway.as_ref(), &counter)
            .await
            .context("questionnaire session failed")?;

        match outcome {
            SessionOutcome::Quit => break,
            SessionOutcome::Submitted(_) if settings.auto_submit => break,
            SessionOutcome::Submitted(_) => {
                if !terminal.confirm("\nGenerate another system? [y/N]: ")? {
                    break;
                }
                questionnaire.reset();
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting coffee-protocol CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(settings).await {
        tracing::error!("❌ {:#}", e);
        eprintln!("❌ {:#}", e);

        let exit_code = match e.downcast_ref::<coffee_protocol::ProtocolError>().map(|e| e.kind()) {
            Some(ErrorKind::Misconfigured) => 1,
            Some(ErrorKind::NetworkFailure) | Some(ErrorKind::UpstreamFailure) => 2,
            _ => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}
