use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use inquire::MultiSelect;
use specpost::config::{ConfigLoader, ConfigOverrides};
use specpost::suite::{Suite, SuiteLoader};
use specpost::{ConsoleReporter, JsonFileReporter, Reporter, SuiteRunner, TestSummary};

pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// 未指定文件时交互选择的目录
const SUITES_DIR: &str = "suites";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 执行 suite 文件
    Run {
        /// suite 文件（TOML）；留空时从 ./suites 中选择
        files: Vec<PathBuf>,

        /// 使用配置文件中的环境
        #[arg(short, long)]
        env: Option<String>,

        /// 覆盖 base_url
        #[arg(long)]
        base_url: Option<String>,

        /// 覆盖默认超时（毫秒）
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// 输出 JSON 报告
        #[arg(long)]
        report: Option<PathBuf>,

        /// 打印每条断言
        #[arg(short, long)]
        verbose: bool,

        /// 并发执行 suite
        #[arg(short, long)]
        parallel: bool,

        /// 指定配置文件（默认自动查找 specpost.toml）
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// 只解析 suite 文件，不发送请求
    Check {
        files: Vec<PathBuf>,
    },
}

/// run 子命令的参数
pub struct RunArgs {
    pub files: Vec<PathBuf>,
    pub env: Option<String>,
    pub overrides: ConfigOverrides,
    pub verbose: bool,
    pub parallel: bool,
    pub config: Option<PathBuf>,
}

/// 执行 suite，返回是否全部通过
pub async fn run(args: RunArgs) -> Result<bool> {
    let config = match &args.config {
        Some(path) => ConfigLoader::load_from_path(path)?,
        None => ConfigLoader::find_and_load()?.unwrap_or_default(),
    };
    let run_config = ConfigLoader::build(&config, args.env.as_deref(), &args.overrides)?;

    let suites = load_suites(&args.files)?;
    if suites.is_empty() {
        println!("{}", "No suites selected".yellow());
        return Ok(true);
    }

    let reporter = Reporter::shared();
    reporter.add(ConsoleReporter::new(args.verbose))?;
    if let Some(path) = &run_config.report {
        reporter.add(JsonFileReporter::new(path.clone()))?;
    }

    let runner = SuiteRunner::from_config(&run_config, reporter.clone());
    let outcome = runner.run_all(suites, args.parallel).await;

    // 无论执行是否出错都要结束 reporter，写出已收集的结果
    let ended = reporter.end();
    let results = outcome?;
    ended?;

    Ok(TestSummary::from_results(&results).is_success())
}

/// 解析 suite 文件并打印用例列表
pub fn check(files: &[PathBuf]) -> Result<()> {
    let suites = load_suites(files)?;

    for suite in &suites {
        let source = suite
            .source_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!("\n{} {}", suite.name.bold(), format!("({})", source).dimmed());

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "Case", "Request", "Expectations", "Stores"]);

        for (index, case) in suite.cases.iter().enumerate() {
            let expectations = case
                .spec
                .expectations()
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n");
            let stores = case
                .spec
                .captures()
                .iter()
                .map(|c| c.describe())
                .collect::<Vec<_>>()
                .join("\n");
            let name = if case.skip {
                format!("{} (skip)", case.name)
            } else {
                case.name.clone()
            };

            table.add_row(vec![
                (index + 1).to_string(),
                name,
                case.spec.to_string(),
                expectations,
                stores,
            ]);
        }

        println!("{table}");
    }

    println!("\n{} {} suite(s) OK", "✓".green(), suites.len());
    Ok(())
}

fn load_suites(files: &[PathBuf]) -> Result<Vec<Suite>> {
    let files = if files.is_empty() {
        select_suites(Path::new(SUITES_DIR))?
    } else {
        files.to_vec()
    };

    files
        .iter()
        .map(|path| SuiteLoader::parse_file(path).map_err(anyhow::Error::from))
        .collect()
}

/// 交互式选择 suite 文件
fn select_suites(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut options: Vec<String> = fs::read_dir(dir)
        .map_err(|e| {
            anyhow::anyhow!("No suite files given and {} unreadable: {}", dir.display(), e)
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .map(|path| path.display().to_string())
        .collect();
    options.sort();

    if options.is_empty() {
        return Ok(Vec::new());
    }

    let selected = MultiSelect::new("Select suites to run:", options)
        .with_page_size(15)
        .with_help_message("Space to select, Enter to finish, type to filter")
        .prompt()
        .map_err(|e| anyhow::anyhow!("Interaction canceled or failed: {}", e))?;

    Ok(selected.into_iter().map(PathBuf::from).collect())
}
