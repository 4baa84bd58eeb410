use clap::Parser;
use pytta_defaults::config::toml_config::LogFormat;
use pytta_defaults::utils::{logger, validation::Validate};
use pytta_defaults::{app, install_defaults, CliConfig, FactoryConfig, PropsError};

fn main() {
    let config = CliConfig::parse();

    let factory = match &config.config {
        Some(path) => match FactoryConfig::from_file(path) {
            Ok(factory) => factory,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path.display(), e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => FactoryConfig::default(),
    };

    // 初始化日誌
    if config.json_logs || factory.log_format() == LogFormat::Json {
        logger::init_json_logger(config.verbose, factory.log_level());
    } else {
        logger::init_cli_logger(config.verbose, factory.log_level());
    }
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&config, &factory) {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = e.severity().exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

fn run(config: &CliConfig, factory: &FactoryConfig) -> Result<(), PropsError> {
    let defaults = install_defaults(factory.build_store()?)?;
    app::run(config, defaults, factory, &mut std::io::stdout().lock())
}
