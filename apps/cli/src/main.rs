//! # CTC CLI
//!
//! 计算力矩控制器的命令行工具。
//!
//! ```bash
//! # 校验控制器配置（可选地对照一个连杆模型）
//! ctc-cli check configs/planar3.toml --model configs/planar3_chain.toml
//!
//! # 在平面连杆仿真上运行闭环
//! ctc-cli simulate --config configs/planar3.toml --mode task-pose --cycles 3000
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod scenario;

use commands::{CheckCommand, SimulateCommand};

/// CTC CLI - 计算力矩控制器命令行工具
#[derive(Parser, Debug)]
#[command(name = "ctc-cli")]
#[command(about = "Check controller configs and run closed-loop simulations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 校验控制器配置
    Check {
        #[command(flatten)]
        args: CheckCommand,
    },

    /// 在参考模型上运行闭环仿真
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },
}

fn main() -> Result<()> {
    ctc_sdk::init_logger()?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Check { args } => args.execute(),
        Commands::Simulate { args } => args.execute(),
    }
}
