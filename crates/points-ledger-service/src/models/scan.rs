//! 扫码内容解码
//!
//! 二维码内容是一段 JSON，例如：
//!
//! ```json
//! {"visit": "gurudwara_visit", "id": 5, "code": "GW-5", "timestamp": 1767225600000}
//! ```
//!
//! 先按类型标识（`visit`，兼容 `type`）分派，再解析场馆字段；
//! 任何一步不符合预期都直接拒绝，不依赖字段"碰巧存在"。

use serde::Deserialize;
use serde_json::Value;

use crate::error::{LedgerError, Result};

/// 二维码内容长度上限（字节）
pub const MAX_PAYLOAD_BYTES: usize = 2048;

/// 解码后的场馆打卡二维码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitScan {
    pub venue_id: i64,
    pub code: Option<String>,
    /// 二维码生成时间（毫秒时间戳），仅记录不校验
    pub issued_at_ms: Option<i64>,
}

#[derive(Deserialize)]
struct ScanEnvelope {
    #[serde(alias = "type")]
    visit: String,
}

#[derive(Deserialize)]
struct VisitBody {
    id: VenueRef,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
}

/// 生成端可能输出数字或数字字符串
#[derive(Deserialize)]
#[serde(untagged)]
enum VenueRef {
    Number(i64),
    Text(String),
}

impl VenueRef {
    fn resolve(self) -> Result<i64> {
        let id = match self {
            Self::Number(id) => id,
            Self::Text(text) => text.trim().parse::<i64>().map_err(|_| {
                LedgerError::InvalidScanFormat(format!("场馆 ID 不是数字: {}", text))
            })?,
        };

        if id <= 0 {
            return Err(LedgerError::InvalidScanFormat(format!("场馆 ID 非法: {}", id)));
        }
        Ok(id)
    }
}

/// 解码场馆打卡二维码
///
/// - 非 JSON 对象、缺少类型标识、缺少或非法场馆 ID：`InvalidScanFormat`
/// - 类型标识与 `expected_tag` 不一致：`WrongScanType`
pub fn decode_visit_scan(raw: &str, expected_tag: &str) -> Result<VisitScan> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(LedgerError::InvalidScanFormat("二维码内容为空".to_string()));
    }
    if raw.len() > MAX_PAYLOAD_BYTES {
        return Err(LedgerError::InvalidScanFormat(format!(
            "二维码内容过长: {} 字节",
            raw.len()
        )));
    }

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| LedgerError::InvalidScanFormat(format!("不是合法的 JSON: {}", e)))?;

    if !value.is_object() {
        return Err(LedgerError::InvalidScanFormat(
            "二维码内容不是 JSON 对象".to_string(),
        ));
    }

    let envelope = ScanEnvelope::deserialize(&value)
        .map_err(|e| LedgerError::InvalidScanFormat(format!("缺少类型标识: {}", e)))?;

    if envelope.visit != expected_tag {
        return Err(LedgerError::WrongScanType {
            expected: expected_tag.to_string(),
            actual: envelope.visit,
        });
    }

    let body = VisitBody::deserialize(&value)
        .map_err(|e| LedgerError::InvalidScanFormat(format!("场馆信息缺失: {}", e)))?;

    Ok(VisitScan {
        venue_id: body.id.resolve()?,
        code: body.code,
        issued_at_ms: body.timestamp.as_ref().and_then(Value::as_i64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &str = "gurudwara_visit";

    #[test]
    fn test_decode_generated_payload() {
        let raw = r#"{"visit":"gurudwara_visit","id":5,"code":"GW-5","timestamp":1767225600000}"#;
        let scan = decode_visit_scan(raw, TAG).unwrap();
        assert_eq!(scan.venue_id, 5);
        assert_eq!(scan.code.as_deref(), Some("GW-5"));
        assert_eq!(scan.issued_at_ms, Some(1_767_225_600_000));
    }

    #[test]
    fn test_decode_accepts_string_id_and_type_alias() {
        let scan = decode_visit_scan(r#"{"type":"gurudwara_visit","id":" 12 "}"#, TAG).unwrap();
        assert_eq!(scan.venue_id, 12);
        assert!(scan.code.is_none());
    }

    #[test]
    fn test_wrong_kind_is_rejected_before_body() {
        // 其他用途的二维码即使没有 id 也应报类型不匹配
        let err = decode_visit_scan(r#"{"visit":"reward_claim"}"#, TAG).unwrap_err();
        match err {
            LedgerError::WrongScanType { expected, actual } => {
                assert_eq!(expected, TAG);
                assert_eq!(actual, "reward_claim");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_payloads() {
        let cases = [
            "",
            "   ",
            "not json",
            "[1,2,3]",
            "42",
            r#"{"id":5}"#,
            r#"{"visit":5,"id":5}"#,
            r#"{"visit":"gurudwara_visit"}"#,
            r#"{"visit":"gurudwara_visit","id":"abc"}"#,
            r#"{"visit":"gurudwara_visit","id":0}"#,
            r#"{"visit":"gurudwara_visit","id":-3}"#,
            r#"{"visit":"gurudwara_visit","type":"gurudwara_visit","id":5}"#,
        ];

        for raw in cases {
            let result = decode_visit_scan(raw, TAG);
            assert!(
                matches!(result, Err(LedgerError::InvalidScanFormat(_))),
                "payload {raw:?} should be InvalidScanFormat, got {result:?}"
            );
        }
    }

    #[test]
    fn test_oversized_payload() {
        let raw = format!(
            r#"{{"visit":"gurudwara_visit","id":5,"code":"{}"}}"#,
            "x".repeat(MAX_PAYLOAD_BYTES)
        );
        assert!(matches!(
            decode_visit_scan(&raw, TAG),
            Err(LedgerError::InvalidScanFormat(_))
        ));
    }
}
