use clap::Parser;
use cusched::config::toml_config::TomlConfig;
use cusched::core::code_index::{refresh_code_index, render_code_list};
use cusched::core::markup::subject_codes;
use cusched::utils::{logger, validation::Validate};
use cusched::TimetableClient;

#[derive(Parser)]
#[command(name = "update-codes")]
#[command(about = "Rebuild the allowed course code list from the timetable")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Saved search page (or just its subject dropdown) listing departments
    #[arg(long, conflicts_with = "departments")]
    subjects_html: Option<String>,

    /// Departments to scan instead of a subject dropdown
    #[arg(long, value_delimiter = ',')]
    departments: Vec<String>,

    /// Override timetable.term_code
    #[arg(long)]
    term_code: Option<String>,

    /// Where to write the list (defaults to courses.allowed_codes_file)
    #[arg(short, long)]
    output: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let mut config = match &args.config {
        Some(path) => TomlConfig::from_file(path)?,
        None => TomlConfig::default(),
    };
    if let Some(term_code) = &args.term_code {
        config.timetable.term_code = term_code.clone();
    }
    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let departments = match &args.subjects_html {
        Some(path) => subject_codes(&tokio::fs::read_to_string(path).await?)?,
        None => args.departments.clone(),
    };
    if departments.is_empty() {
        anyhow::bail!("no departments given; pass --subjects-html or --departments");
    }

    let output = args
        .output
        .clone()
        .or_else(|| config.courses.allowed_codes_file.clone())
        .unwrap_or_else(|| "allowed_codes.txt".to_string());

    tracing::info!(
        "🚀 Refreshing course codes for {} department(s), term {}",
        departments.len(),
        config.timetable.term_code
    );

    let client = TimetableClient::from_config(&config.timetable)?;
    let codes = refresh_code_index(&client, &departments, &config.timetable.term_code).await;

    tokio::fs::write(&output, render_code_list(&codes)).await?;

    tracing::info!("✅ {} course code(s) written to {}", codes.len(), output);
    println!("✅ {} course code(s) written to {}", codes.len(), output);
    Ok(())
}
