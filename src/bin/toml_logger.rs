use clap::Parser;
use rig_logger::config::toml_config::TomlConfig;
use rig_logger::domain::ports::ConfigProvider;
use rig_logger::utils::{logger, validation::Validate};
use rig_logger::{ConsoleReporter, CsvSinkFactory, LoggerEngine, SerialConnector, Session};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "toml-logger")]
#[command(about = "Serial rig logger driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "rig-logger.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the output file from config
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show the resolved settings without opening the port
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置（日誌格式也寫在設定檔裡，所以先讀設定）
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if config.log_format() == Some("json") {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(output) = args.output {
        tracing::info!("🔧 Output file overridden to: {}", output.display());
        config.set_output_file(output);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, args.dry_run);
    if args.dry_run {
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let session = Session::new(
        config,
        SerialConnector,
        CsvSinkFactory,
        ConsoleReporter::new(),
    );
    let engine = LoggerEngine::new_with_monitoring(session, monitor_enabled);
    let outcome = engine.run().await?;
    tracing::debug!("Session outcome: {:?}", outcome);

    Ok(())
}

fn display_config_summary(config: &TomlConfig, dry_run: bool) {
    println!("📋 Configuration Summary:");
    println!("  Port: {} @ {} baud", config.port(), config.baud_rate());
    println!("  Read timeout: {:?}", config.read_timeout());
    println!("  Settle delay: {:?}", config.settle_delay());
    println!("  Output: {}", config.output_file().display());
    println!("  Delimiter: {:?}", config.delimiter());
    println!("  Sync to disk: {}", config.sync_to_disk());

    if dry_run {
        println!("  🔍 DRY RUN MODE - port not opened");
    }

    println!();
}
