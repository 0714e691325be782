//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-bridge`: 运行 map-bridge 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `scenario-check`: 解析并回放场景文件

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use host_sim::{Scenario, ScenarioOutcome, ScenarioRunner, SimConfig};
use walkdir::WalkDir;

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    match cmd.status() {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "cov-bridge" => {
            ensure_cargo_llvm_cov_available()?;

            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "-p", "map-bridge", "--all-features", "--html"]);
            run(
                "cargo llvm-cov -p map-bridge --all-features --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available()?;

            // 排除 xtask，避免稀释信号
            let mut cov = Command::new("cargo");
            cov.args([
                "llvm-cov",
                "--workspace",
                "--exclude",
                "xtask",
                "--all-features",
                "--html",
            ]);
            run(
                "cargo llvm-cov --workspace --exclude xtask --all-features --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "scenario-check" => {
            let path = args.next();
            scenario_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-bridge      运行 map-bridge 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  scenario-check  检查场景文件

SCENARIO-CHECK:
  cargo xtask scenario-check [path]

  不带参数：检查 host-sim/scenarios/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - 场景 JSON 能否解析
    - 回放后 onInitialized 最多发出一次
    - teardown 之后不再有覆盖物残留

ALIASES (in .cargo/config.toml):
  cargo check-all      -> cargo xtask check-all
  cargo cov-bridge     -> cargo xtask cov-bridge
  cargo cov-workspace  -> cargo xtask cov-workspace
  cargo scenario-check -> cargo xtask scenario-check
"#
    );
}

//=============================================================================
// scenario-check 命令实现
//=============================================================================

/// 默认场景目录（相对于 workspace root）
const DEFAULT_SCENARIO_DIR: &str = "host-sim/scenarios";

/// 场景检查结果
#[derive(Default)]
struct ScenarioCheckResult {
    checked: usize,
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// 执行场景检查
fn scenario_check(path: Option<&str>) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_scenario_files(&path)
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(DEFAULT_SCENARIO_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认场景目录不存在: {}\n请在 workspace 根目录运行，或指定场景路径",
                    dir.display()
                );
            }
            collect_scenario_files(dir)
        }
    };

    if files.is_empty() {
        eprintln!("未找到场景文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个场景文件...\n", files.len());

    let config = SimConfig::default();
    let mut result = ScenarioCheckResult::default();
    for file in &files {
        check_scenario_file(file, &config, &mut result);
    }

    print_check_result(&result);

    if !result.errors.is_empty() {
        anyhow::bail!("场景检查发现错误");
    }
    Ok(())
}

/// 收集目录下的所有场景文件
fn collect_scenario_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// 检查单个场景文件
fn check_scenario_file(file: &Path, config: &SimConfig, result: &mut ScenarioCheckResult) {
    let id = file.display().to_string();
    result.checked += 1;

    let scenario = match Scenario::load(file) {
        Ok(s) => s,
        Err(e) => {
            result.errors.push(format!("{id}: {e}"));
            return;
        }
    };

    for note in scenario.lint() {
        result.warnings.push(format!("{id}: {note}"));
    }

    let outcome = ScenarioRunner::new(config).run(&scenario);
    for problem in outcome_problems(&outcome) {
        result.errors.push(format!("{id}: {problem}"));
    }

    eprintln!(
        "[OK] {}: {} 步, {} 个事件",
        outcome.name,
        outcome.steps,
        outcome.events.len()
    );
}

/// 回放结果中违反桥接约定的地方
fn outcome_problems(outcome: &ScenarioOutcome) -> Vec<String> {
    let mut problems = Vec::new();

    let initialized = outcome.count("onInitialized");
    if initialized > 1 {
        problems.push(format!("onInitialized 发出了 {initialized} 次"));
    }

    if outcome.teardown.is_some() && outcome.feature_count != 0 {
        problems.push(format!(
            "teardown 之后仍有 {} 个覆盖物",
            outcome.feature_count
        ));
    }

    for overlay in &outcome.overlays {
        if overlay.detach_count > overlay.attach_count {
            problems.push(format!(
                "覆盖物 {} 摘下 {} 次但只挂载 {} 次",
                overlay.label, overlay.detach_count, overlay.attach_count
            ));
        }
    }

    problems
}

/// 输出检查结果
fn print_check_result(result: &ScenarioCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个场景", result.checked);
    eprintln!();

    for error in &result.errors {
        eprintln!("[ERROR] {error}");
    }
    for warning in &result.warnings {
        eprintln!("[WARN] {warning}");
    }

    eprintln!();
    if !result.errors.is_empty() {
        eprintln!(
            "❌ {} 个错误, {} 个警告",
            result.errors.len(),
            result.warnings.len()
        );
    } else if !result.warnings.is_empty() {
        eprintln!("⚠️  0 个错误, {} 个警告", result.warnings.len());
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
