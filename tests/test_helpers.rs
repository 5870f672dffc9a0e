// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的临时数据库初始化、主数据登记等功能
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use clinic_duty_aps::db;
use clinic_duty_aps::domain::types::{ClinicId, DoctorId, RecurrencePattern};
use clinic_duty_aps::repository::{ClinicRepository, DoctorRepository};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - Arc<Mutex<Connection>>: 已应用统一 PRAGMA 的连接
pub fn create_test_db() -> (NamedTempFile, Arc<Mutex<Connection>>) {
    let temp_file = NamedTempFile::new().expect("临时文件创建失败");
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path).expect("数据库打开失败");
    db::init_schema(&conn).expect("Schema 初始化失败");

    (temp_file, Arc::new(Mutex::new(conn)))
}

/// 登记测试用医师
pub fn add_doctor(conn: &Arc<Mutex<Connection>>, name: &str, max_assignments: u32) -> DoctorId {
    let repo = DoctorRepository::new(conn.clone());
    let id = repo.create(name, "").expect("医师登记失败");
    if max_assignments > 0 {
        repo.update(id, None, Some(max_assignments)).expect("医师更新失败");
    }
    id
}

/// 登记测试用外勤先
pub fn add_clinic(
    conn: &Arc<Mutex<Connection>>,
    name: &str,
    fee: i64,
    recurrence: RecurrencePattern,
) -> ClinicId {
    let repo = ClinicRepository::new(conn.clone());
    repo.create(name, fee, recurrence).expect("外勤先登记失败")
}
