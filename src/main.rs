use anyhow::Context;
use clap::Parser;
use clean_sample::bootstrap::Bootstrapper;
use clean_sample::config::{ConfigLoader, Environment};
use clean_sample::logging::{init_logging, LoggingConfig};
use clean_sample::sample::{Feature2DetailsActivity, SampleActivity, SampleDeployment};
use std::path::PathBuf;
use std::sync::Arc;

/// 运行示例部署的启动流程，并向两个示例界面注入依赖
#[derive(Parser, Debug)]
#[command(name = "clean-sample", version, about)]
struct Args {
    /// 配置文件路径（默认 <config_dir>/clean-sample/config.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 覆盖运行环境（development / testing / production）
    #[arg(long)]
    env: Option<Environment>,

    /// 以 JSON 输出启动报告
    #[arg(long)]
    json: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,

    /// 详情页展示的条目
    #[arg(long, default_value_t = 1)]
    item: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_file(path.clone()),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load_config().context("failed to load configuration")?;
    if let Some(environment) = args.env {
        config.environment = environment;
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }

    init_logging(&LoggingConfig::from_bootstrap_config(&config))?;

    let bootstrapper = Bootstrapper::new(SampleDeployment::new(), config);
    let context = Arc::new(bootstrapper.start().context("bootstrap failed")?);

    // 启动完成后组件只读，可以在任意任务中注入
    let home = {
        let context = context.clone();
        tokio::spawn(async move {
            let mut activity = SampleActivity::new();
            context.inject(&mut activity).map(|_| activity)
        })
    };
    let details = {
        let context = context.clone();
        let item = args.item;
        tokio::spawn(async move {
            let mut activity = Feature2DetailsActivity::new(item);
            context.inject(&mut activity).map(|_| activity)
        })
    };
    let home = home.await??;
    let details = details.await??;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&context.report())?);
        return Ok(());
    }

    println!("{}", home.title());
    for record in context.journal().records() {
        println!("  {:<36} {:>8}us", record.phase, record.duration_us);
    }
    println!("{}", details.render());
    Ok(())
}
