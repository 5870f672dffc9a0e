// ==========================================
// 外勤医师排班系统 - CLI 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统 (管理员保留最终控制权)
// 用法: clinic-duty-aps <year> <month> [plan_name] [seed]
// ==========================================

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clinic_duty_aps::api::ScheduleApi;
use clinic_duty_aps::{db, logging};

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 CLINIC_DUTY_APS_DB_PATH 优先
/// - 其次: 用户数据目录/clinic-duty-aps/clinic_duty_aps.db
/// - 回退: ./clinic_duty_aps.db
fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("CLINIC_DUTY_APS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./clinic_duty_aps.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("clinic-duty-aps");
        // 确保目录存在（失败时回退当前目录）
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("clinic_duty_aps.db");
        }
    }
    path.to_string_lossy().to_string()
}

fn print_usage() {
    eprintln!("用法: clinic-duty-aps <year> <month> [plan_name] [seed]");
    eprintln!("例:   clinic-duty-aps 2026 8 案A 0");
}

fn main() -> ExitCode {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 决策支持系统", clinic_duty_aps::APP_NAME);
    tracing::info!("系统版本: {}", clinic_duty_aps::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }

    let year: i32 = match args[0].parse() {
        Ok(y) => y,
        Err(_) => {
            print_usage();
            return ExitCode::FAILURE;
        }
    };
    let month: u32 = match args[1].parse() {
        Ok(m) if (1..=12).contains(&m) => m,
        _ => {
            print_usage();
            return ExitCode::FAILURE;
        }
    };
    let plan_name = args.get(2).cloned().unwrap_or_else(|| "案A".to_string());
    let seed: u64 = match args.get(3) {
        Some(raw) => match raw.parse() {
            Ok(s) => s,
            Err(_) => {
                print_usage();
                return ExitCode::FAILURE;
            }
        },
        None => 0,
    };

    // 打开数据库并初始化 Schema
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let conn = match db::open_sqlite_connection(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("数据库打开失败: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = db::init_schema(&conn) {
        tracing::error!("Schema 初始化失败: {}", e);
        return ExitCode::FAILURE;
    }

    let api = ScheduleApi::new(Arc::new(Mutex::new(conn)));

    // 方案生成
    match api.generate_plan(year, month, &plan_name, seed) {
        Ok(plan) => {
            tracing::info!(
                "方案 [{}] 生成完成: 分配 {} 人次, 满足度 {:.1}, 方差 {:.1}",
                plan.plan_name,
                plan.assignment_count(),
                plan.satisfaction_score,
                plan.total_variance
            );
            for short in plan.short_slots() {
                tracing::warn!(
                    "人员缺口: clinic_id={} date={} 分配 {}/{} 人",
                    short.clinic_id,
                    short.date,
                    short.doctor_ids.len(),
                    short.required
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("方案生成失败: {}", e);
            ExitCode::FAILURE
        }
    }
}
