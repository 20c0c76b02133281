//! Profile Position 演示 - 完整的单轴定位流程
//!
//! 1. 枚举设备、协议栈、接口和端口
//! 2. 打开连接、配置协议栈、清除故障
//! 3. 使能并切换到 Profile Position 模式
//! 4. 设置运动参数并移动到目标角度
//! 5. 读取当前位置
//! 6. 无论成功与否都去使能并关闭
//!
//! # 运行
//!
//! ```bash
//! RUST_LOG=epos=debug cargo run -p epos-sdk --example profile_position_demo -- --port USB0
//!
//! # 使用配置文件
//! cargo run -p epos-sdk --example profile_position_demo -- --config epos.toml
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use epos_sdk::prelude::*;
use epos_sdk::{EposConfig, init_logging};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "profile_position_demo")]
#[command(about = "Profile Position 演示 - 移动到指定角度")]
struct Args {
    /// TOML 配置文件（指定时忽略设备相关参数）
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "EPOS4")]
    device: String,

    #[arg(long, default_value = "MAXON SERIAL V2")]
    protocol: String,

    #[arg(long, default_value = "USB")]
    interface: String,

    /// 端口名（缺省时取第一个候选端口）
    #[arg(long)]
    port: Option<String>,

    #[arg(long, default_value = "1")]
    node: u16,

    /// libEposCmd 路径（缺省时由动态链接器搜索）
    #[arg(long)]
    library: Option<PathBuf>,

    /// 目标角度（度）
    #[arg(long, default_value = "90", allow_negative_numbers = true)]
    degrees: f64,
}

fn builder(args: &Args) -> anyhow::Result<(EposBuilder, ProfileParameters)> {
    let default_profile = ProfileParameters::new(800, 10000, 10000);

    let (builder, profile) = match &args.config {
        Some(path) => {
            let config = EposConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?;
            let profile = config.profile_parameters().unwrap_or(default_profile);
            (config.builder(), profile)
        },
        None => {
            let builder = EposBuilder::new()
                .device(args.device.clone())
                .protocol(args.protocol.clone())
                .interface(args.interface.clone())
                .node_id(args.node);
            let builder = match &args.port {
                Some(port) => builder.port(port.clone()),
                None => builder,
            };
            (builder, default_profile)
        },
    };

    let builder = match &args.library {
        Some(path) => builder.library_path(path.clone()),
        None => builder,
    };
    Ok((builder, profile))
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    println!("EPOS SDK - Profile Position 演示");
    println!("================================\n");

    let (builder, profile) = builder(&args)?;
    let mut controller = builder.build().context("loading libEposCmd")?;

    // ==================== 步骤 1: 枚举 ====================
    let report = controller.discover()?;
    println!("设备:   {:?}", report.devices);
    println!("协议栈: {:?}", report.protocols);
    println!("接口:   {:?}", report.interfaces);
    println!("端口:   {:?}\n", report.ports);

    let target = Rad::from_degrees(args.degrees);
    let geometry = controller.geometry();
    println!(
        "目标: {:.1}° = {} counts（每圈 {} counts）\n",
        args.degrees,
        geometry.angle_to_encoder(target),
        geometry.counts_per_revolution()
    );

    // ==================== 步骤 2-5: 定位 ====================
    let (outcome, position) = with_teardown(&mut controller, |c| {
        c.initialize()?;
        c.enable()?;
        c.set_operation_mode(OperationMode::ProfilePosition)?;
        c.set_profile_parameters(profile)?;
        let outcome = c.move_to_angle(target, MoveOptions::default())?;
        let position = c.get_encoder_position()?;
        Ok((outcome, position))
    })?;

    // ==================== 结果 ====================
    match outcome {
        MoveOutcome::Reached => println!("已到位"),
        MoveOutcome::Accepted => println!("指令已接受"),
        MoveOutcome::TargetReachedTimeout(report) => println!("警告: 未确认到位 ({})", report),
    }
    println!(
        "当前位置: {} counts ({:.2}°)",
        position,
        geometry.encoder_to_angle(i64::from(position)).to_degrees()
    );

    Ok(())
}
