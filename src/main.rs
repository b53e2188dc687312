use clap::Parser;
use rig_logger::adapters::serial;
use rig_logger::utils::{logger, validation::Validate};
use rig_logger::{
    CliConfig, ConsoleReporter, CsvSinkFactory, LoggerEngine, SerialConnector, Session,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting rig-logger");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if config.list_ports {
        match serial::list_ports() {
            Ok(ports) if ports.is_empty() => println!("No serial ports found"),
            Ok(ports) => ports.iter().for_each(|p| println!("{}", p)),
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
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

    // 連線失敗、手動中斷、寫檔錯誤都已由 ConsoleReporter 回報，一律正常結束
    let outcome = engine.run().await?;
    tracing::debug!("Session outcome: {:?}", outcome);

    Ok(())
}
