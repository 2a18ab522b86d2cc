use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(name = "nasdaq-backend", version, about = "Nasdaq 价格与内部人交易服务")]
pub struct Cli {
    /// 配置文件路径，默认依次查找 config.json 和 config/config.json
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 启动 HTTP 服务
    Serve,
    /// 抓取股票列表中的价格和内部人交易
    Parse {
        /// 并发数，覆盖配置中的 parser.threads
        #[clap(long)]
        threads: Option<usize>,
        /// 股票代码列表文件，覆盖配置中的 parser.tickers_path
        #[clap(long)]
        tickers: Option<PathBuf>,
    },
}
