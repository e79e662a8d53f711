use serde_json::json;
use tempfile::tempdir;

use glysearch::audit::AuditLog;

#[test]
fn test_audit_log_persists_across_reopen() {
    let dir = tempdir().expect("temp dir");
    let db_path = dir.path().join("audit.db");

    {
        let log = AuditLog::open(&db_path).expect("open");
        log.record("ai_search", &json!({"query": "n-linked glycans"}), 0.8, 200)
            .expect("record");
        assert_eq!(log.count().expect("count"), 1);
    }

    let reopened = AuditLog::open(&db_path).expect("reopen");
    assert_eq!(reopened.count().expect("count"), 1);

    reopened
        .record("ai_search", &json!({"query": "hgf protein"}), 2.3, 429)
        .expect("record");
    assert_eq!(reopened.count().expect("count"), 2);
}
