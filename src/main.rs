//! selfintro-analyzer: Korean self-introduction essay analyzer

use clap::Parser;
use log::{error, info, warn};
use selfintro_analyzer::cli::{self, Cli, Commands, ConfigAction};
use selfintro_analyzer::config::{CalibrationMode, Config, MatchingMode};
use selfintro_analyzer::input::manager::InputManager;
use selfintro_analyzer::output::{save_report_to_file, EssayReport, ReportGenerator};
use selfintro_analyzer::processing::embeddings::embedder_from_config;
use selfintro_analyzer::{AnalyzerError, EssayAnalyzer, ProfileStore, Result};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, cli.config) {
        error!("Command failed: {}", e);
        process::exit(if e.is_not_found() { 2 } else { 1 });
    }
}

fn run_command(command: Commands, mut config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Analyze {
            essay,
            text,
            job,
            company,
            embedding,
            lexical,
            linear,
            detailed,
            output,
            save,
            no_color,
        } => {
            let output_format = match output {
                Some(format) => cli::parse_output_format(&format).map_err(AnalyzerError::InvalidInput)?,
                None => config.output.format,
            };

            if let Some(name) = embedding {
                let repo_id = config
                    .get_model_by_name(&name)
                    .map(|model| model.repo_id.clone())
                    .ok_or_else(|| AnalyzerError::Configuration(format!("Unknown embedding model: {}", name)))?;
                config.models.default_embedding_model = repo_id;
            }
            if lexical {
                config.keywords.mode = MatchingMode::Lexical;
            }
            if linear {
                config.scoring.calibration = CalibrationMode::Linear;
            }

            let essay_text = match (essay.as_ref(), text) {
                (_, Some(text)) => text,
                (Some(path), None) => {
                    cli::validate_file_extension(path, &["txt", "md"])
                        .map_err(|e| AnalyzerError::InvalidInput(format!("Essay file: {}", e)))?;
                    InputManager::new().extract_text(path)?
                }
                (None, None) => {
                    return Err(AnalyzerError::InvalidInput(
                        "Provide an essay with --essay <path> or --text <text>".to_string(),
                    ))
                }
            };

            info!("Loading job and company profiles");
            let profiles = Arc::new(ProfileStore::load(&config.data)?);
            let embedder = embedder_from_config(&config);
            let analyzer = EssayAnalyzer::new(&config, embedder, profiles)?;

            let analysis = analyzer.analyze(&essay_text, job, &company)?;
            if analysis.is_empty() {
                warn!("Essay produced no sentences");
            }
            let report = EssayReport::from_analysis(analysis);

            let use_colors = config.output.color_output && !no_color && save.is_none();
            let generator = ReportGenerator::with_options(
                use_colors,
                detailed || config.output.detailed,
                true,
                true,
            )
            .with_recommendations(config.output.include_recommendations);
            let rendered = generator.generate_report(&report, output_format)?;

            match save {
                Some(path) => {
                    save_report_to_file(&rendered, &path)?;
                    info!("Report saved to {}", path.display());
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Jobs { top } => {
            let profiles = ProfileStore::load(&config.data)?;
            let taxonomy = profiles.job_taxonomy();
            if let Some(top) = &top {
                if !taxonomy.contains_key(top) {
                    warn!("No jobs under field '{}'", top);
                }
            }

            for (top_nm, aptitudes) in taxonomy
                .iter()
                .filter(|(name, _)| top.as_ref().map_or(true, |t| t == *name))
            {
                println!("{}", top_nm);
                for (aptit_name, jobs) in aptitudes {
                    println!("  {}", aptit_name);
                    for job in jobs {
                        println!("    [{}] {}", job.job_cd, job.job_nm);
                    }
                }
            }
        }

        Commands::Companies => {
            let profiles = ProfileStore::load(&config.data)?;
            for company in profiles.companies() {
                if company.industry.is_empty() {
                    println!("{}  {}", company.company_id, company.company_name);
                } else {
                    println!("{}  {} ({})", company.company_id, company.company_name, company.industry);
                }
            }
        }

        Commands::Models => {
            println!("Embedding backend: {:?}", config.models.backend);
            println!("Default model: {}\n", config.models.default_embedding_model);
            for model in &config.models.available_models {
                let marker = if model.repo_id == config.models.default_embedding_model {
                    "*"
                } else {
                    " "
                };
                println!("{} {} ({}) - {} MB", marker, model.name, model.repo_id, model.size_mb);
                println!("    {}", model.description);
            }
        }

        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Config::config_path);
            match action {
                Some(ConfigAction::Show) | None => {
                    let content = toml::to_string_pretty(&config).map_err(|e| {
                        AnalyzerError::Configuration(format!("Failed to serialize config: {}", e))
                    })?;
                    println!("# {}\n{}", path.display(), content);
                }

                Some(ConfigAction::Reset) => {
                    Config::default().save_to(&path)?;
                    info!("Configuration reset: {}", path.display());
                }

                Some(ConfigAction::Path) => println!("{}", path.display()),
            }
        }
    }

    Ok(())
}
