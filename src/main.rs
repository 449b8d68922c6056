use clap::Parser;
use sheet_fixer::config::{Command, LogFormat};
use sheet_fixer::core::{ConfigProvider, CorrectionService};
use sheet_fixer::utils::error::ErrorSeverity;
use sheet_fixer::utils::{logger, validation::Validate};
use sheet_fixer::{
    AnalyzePipeline, CliConfig, ExportOptions, FixEngine, FixError, HttpCorrectionService,
    InputSource, LocalPipeline, LocalStorage, Settings, UploadPipeline,
};
use std::time::Duration;

async fn run(cli: CliConfig, settings: Settings) -> Result<String, FixError> {
    let storage = LocalStorage::new(settings.output_path().to_string());
    let options = ExportOptions::from_config(&settings);
    let service = || {
        HttpCorrectionService::new(
            settings.api_base(),
            Duration::from_secs(settings.timeout_seconds()),
        )
    };

    match cli.command {
        Command::Analyze {
            file,
            text,
            review_only,
            push,
        } => {
            let source = match (file, text) {
                (Some(path), _) => InputSource::File(path),
                (None, Some(text)) => InputSource::Text(text),
                (None, None) => {
                    return Err(FixError::EmptyInput {
                        message: "Please select a file or paste data".to_string(),
                    })
                }
            };
            let pipeline = AnalyzePipeline::new(storage, service()?, source, options)
                .review_only(review_only)
                .push_to_server(push);
            FixEngine::new(pipeline).run().await
        }
        Command::Upload { file } => {
            let pipeline = UploadPipeline::new(storage, service()?, file);
            FixEngine::new(pipeline).run().await
        }
        Command::Local { file, issues } => {
            let pipeline = LocalPipeline::new(storage, file, issues, options);
            FixEngine::new(pipeline).run().await
        }
        Command::Health => {
            let status = service()?.health().await?;
            if !status.is_ok() {
                return Err(FixError::ServerError {
                    message: format!("health status is '{}'", status.status),
                });
            }
            Ok(format!("{} is up", settings.api_base()))
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }
    tracing::info!("Starting sheet-fixer");
    tracing::debug!("CLI config: {:?}", cli);

    // 驗證配置
    let settings = match Settings::resolve(&cli).and_then(|settings| {
        cli.validate()?;
        settings.validate()?;
        Ok(settings)
    }) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    tracing::debug!("Resolved settings: {:?}", settings);

    match run(cli, settings).await {
        Ok(output) => {
            tracing::info!("✅ Done: {}", output);
            println!("✅ {}", output);
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}
