use clap::Parser;
use cusched::utils::error::{ErrorSeverity, PlannerError};
use cusched::utils::{logger, validation::Validate};
use cusched::{
    CatalogPipeline, CliConfig, LlmClient, LocalStorage, PlannerOutcome, SchedulePlanner,
    TimetableClient, TomlConfig,
};
use std::sync::Arc;

/// Logs the error with its category and exits with a severity-based code.
fn exit_with(e: PlannerError) -> ! {
    tracing::error!(
        "❌ Planner failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn load_config(cli: &CliConfig) -> cusched::Result<TomlConfig> {
    cli.validate()?;
    let config = cli.load_config()?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting cusched CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = load_config(&cli).unwrap_or_else(|e| exit_with(e));
    tracing::info!(
        "✅ Configuration loaded (term {}, {} concurrent request(s))",
        config.timetable.term_code,
        config.concurrent_requests()
    );

    let allowed_codes = config
        .load_allowed_codes()
        .await
        .unwrap_or_else(|e| exit_with(e));
    let api_key = config.require_api_key().unwrap_or_else(|e| exit_with(e));

    let llm = Arc::new(LlmClient::from_config(&config.llm, api_key).unwrap_or_else(|e| exit_with(e)));
    let timetable =
        Arc::new(TimetableClient::from_config(&config.timetable).unwrap_or_else(|e| exit_with(e)));

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 創建存儲和管道
    let storage = LocalStorage::new(config.output_path());
    let limits = config.generation_limits();
    let pipeline = CatalogPipeline::new(timetable, storage, config);

    let planner = SchedulePlanner::new(pipeline, llm.clone(), llm.clone(), allowed_codes)
        .with_transcriber(llm)
        .with_limits(limits)
        .with_monitoring(monitor_enabled);

    let input = cli.planner_input().await.unwrap_or_else(|e| exit_with(e));
    let outcome = planner.plan(input).await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    match &outcome {
        PlannerOutcome::Failure(failure) => {
            eprintln!("❌ {}: {}", failure.error, failure.details);
            std::process::exit(1);
        }
        PlannerOutcome::Schedules(response) if !response.is_success() => {
            eprintln!("⚠️ Schedules could not be generated; the request is echoed above");
            std::process::exit(2);
        }
        PlannerOutcome::Schedules(response) => {
            tracing::info!(
                "✅ Planning completed with {} schedule(s)",
                response.schedules.len()
            );
        }
    }

    Ok(())
}
