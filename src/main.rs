// ==========================================
// 门店货架空间规划 - 命令行入口
// ==========================================
// 用法:
//   store-space-planner [db_path] <aisle_id> <mode>
//
// 运行一次货架段规划，向 stdout 输出 JSON 格式的 PlanResult
// ==========================================

use std::process::ExitCode;

use store_space_planner::app::{get_default_db_path, AppState};
use store_space_planner::domain::{PlanRequest, PlanResult};
use store_space_planner::logging;

const USAGE: &str = "用法: store-space-planner [db_path] <aisle_id> <mode>";

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (db_path, aisle_arg, mode) = match args.as_slice() {
        [aisle_id, mode] => (get_default_db_path(), aisle_id.clone(), mode.clone()),
        [db_path, aisle_id, mode] => (db_path.clone(), aisle_id.clone(), mode.clone()),
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    let result = match aisle_arg.trim().parse::<i64>() {
        Ok(aisle_id) => run(db_path, aisle_id, &mode),
        Err(_) => PlanResult::failure(format!("无效的 aisle_id: {}", aisle_arg)),
    };

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("结果序列化失败: {}", e),
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(db_path: String, aisle_id: i64, mode: &str) -> PlanResult {
    tracing::info!("==================================================");
    tracing::info!("{} v{}", store_space_planner::APP_NAME, store_space_planner::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    match AppState::new(db_path) {
        Ok(state) => state
            .plan_api
            .plan_aisle(aisle_id, &PlanRequest::for_mode(mode)),
        Err(e) => {
            tracing::error!("AppState初始化失败: {}", e);
            PlanResult::failure(e)
        }
    }
}
