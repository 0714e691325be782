//! # Host Sim
//!
//! 用场景脚本驱动 map-bridge 的命令行工具。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p host-sim -- run host-sim/scenarios/basic.json
//! cargo run -p host-sim -- run host-sim/scenarios/basic.json --pretty --log-level debug
//! cargo run -p host-sim -- --config sim.json run host-sim/scenarios/basic.json
//! cargo run -p host-sim -- check host-sim/scenarios/basic.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use host_sim::{Scenario, ScenarioRunner, SimConfig};
use tracing::{Level, warn};

#[derive(Parser)]
#[command(name = "host-sim")]
#[command(about = "无界面宿主模拟器 - 回放场景并输出地图事件")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（JSON）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 日志级别，覆盖配置文件
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 回放场景，把结果以 JSON 输出到 stdout
    Run {
        /// 场景文件
        scenario: PathBuf,

        /// 格式化输出
        #[arg(long)]
        pretty: bool,
    },

    /// 检查场景能否解析和回放
    Check {
        /// 场景文件
        scenario: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 先读配置，日志级别可能来自配置文件
    let loaded = cli.config.as_ref().map(SimConfig::try_load);
    let config = match &loaded {
        Some(Ok(config)) => config.clone(),
        _ => SimConfig::default(),
    };

    let level = match &cli.log_level {
        Some(level) => level
            .parse::<Level>()
            .with_context(|| format!("未知的日志级别 '{level}'"))?,
        None => config.log.max_level().unwrap_or(Level::INFO),
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let (Some(path), Some(Err(e))) = (&cli.config, &loaded) {
        warn!(path = %path.display(), error = %e, "配置文件不可用，使用默认配置");
    }

    match cli.command {
        Commands::Run { scenario, pretty } => run(&scenario, &config, pretty),
        Commands::Check { scenario } => check(&scenario, &config),
    }
}

fn run(path: &Path, config: &SimConfig, pretty: bool) -> Result<()> {
    let outcome = host_sim::run_scenario_file(path, config)
        .with_context(|| format!("回放场景失败: {}", path.display()))?;

    let json = if pretty {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string(&outcome)?
    };
    println!("{json}");
    Ok(())
}

fn check(path: &Path, config: &SimConfig) -> Result<()> {
    let scenario =
        Scenario::load(path).with_context(|| format!("场景无效: {}", path.display()))?;

    for note in scenario.lint() {
        println!("  提示: {note}");
    }

    let outcome = ScenarioRunner::new(config).run(&scenario);
    println!(
        "{}: {} 步, {} 个事件, 剩余覆盖物 {}, 状态 {}",
        outcome.name,
        outcome.steps,
        outcome.events.len(),
        outcome.feature_count,
        outcome.readiness
    );

    if outcome.count("onInitialized") > 1 {
        bail!("onInitialized 发出了 {} 次", outcome.count("onInitialized"));
    }
    Ok(())
}
