//! 可观测性模块集成测试
//!
//! 测试 metrics 与 middleware 模块在未初始化 recorder 时的行为。

mod metrics_tests {
    use engagement_shared::observability::metrics::{
        record_accrual, record_http_request, record_operation_duration,
        record_quiz_submission, record_redemption, record_storage_conflict,
    };

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/v1/balance", 200, 0.05);
        record_http_request("POST", "/api/v1/scans", 200, 0.12);
        record_http_request("POST", "/api/v1/rewards/{reward_id}/redemption", 409, 0.08);
        record_http_request("GET", "/api/not-found", 404, 0.01);
        record_http_request("POST", "/api/error", 500, 0.25);
    }

    #[test]
    fn test_record_ledger_outcomes() {
        record_accrual("VENUE_SCAN", "accepted");
        record_accrual("VENUE_SCAN", "duplicate_scan");
        record_accrual("QUIZ_CORRECT", "accepted");
        record_redemption("redeemed");
        record_redemption("already_redeemed");
        record_redemption("insufficient_balance");
        record_quiz_submission("single", "correct");
        record_quiz_submission("batch", "rejected");
    }

    #[test]
    fn test_record_operation_metrics() {
        record_operation_duration("scan", 0.01);
        record_operation_duration("redeem", 0.03);
        record_storage_conflict("redeem");
    }
}

mod middleware_tests {
    use engagement_shared::observability::middleware::RequestId;

    #[test]
    fn test_request_id_accessor() {
        let id = RequestId("abc-123".to_string());
        assert_eq!(id.as_str(), "abc-123");
    }
}
