//! Disaster alert payload, in the national disaster-text API's field naming.

use serde::{Deserialize, Serialize};

/// One disaster notice consumed by the simulation pipeline.
///
/// Request-scoped: never persisted, echoed back in the simulate response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisasterAlert {
    /// Serial number.
    #[serde(rename = "SN")]
    pub serial: String,
    /// Creation timestamp, kept as the upstream string.
    #[serde(rename = "CRT_DT")]
    pub created_at: String,
    /// Message body.
    #[serde(rename = "MSG_CN")]
    pub message: String,
    /// Reception region name, e.g. "서울특별시 강남구".
    #[serde(rename = "RCPTN_RGN_NM")]
    pub region: String,
    /// Emergency step name, e.g. "안전안내".
    #[serde(rename = "EMRG_STEP_NM", default)]
    pub emergency_step: Option<String>,
    /// Hazard type name, e.g. "호우".
    #[serde(rename = "DST_SE_NM")]
    pub hazard_type: String,
    #[serde(rename = "REG_YMD", default)]
    pub registered_on: Option<String>,
    #[serde(rename = "MDFCN_YMD", default)]
    pub modified_on: Option<String>,
}

impl DisasterAlert {
    /// The one-line alert every recipient receives before the guidance text.
    pub fn base_message(&self) -> String {
        format!(
            "[긴급] {region} {hazard} 발생 ({step}). 내용: {message}",
            region = self.region,
            hazard = self.hazard_type,
            step = self.emergency_step.as_deref().unwrap_or("None"),
            message = self.message,
        )
    }

    /// Retrieval query used for the guidance lookup.
    pub fn guidance_query(&self) -> String {
        format!(
            "{hazard} 발생 시 ({region} 상황), 주요 대응 지침과 주의사항은?",
            hazard = self.hazard_type,
            region = self.region,
        )
    }
}

#[cfg(test)]
pub(crate) fn sample_alert(region: &str) -> DisasterAlert {
    DisasterAlert {
        serial: "12345".into(),
        created_at: "2025/07/16 10:00:00".into(),
        message: "하천 범람 우려, 저지대 주민은 대피 바랍니다.".into(),
        region: region.into(),
        emergency_step: Some("긴급재난".into()),
        hazard_type: "호우".into(),
        registered_on: None,
        modified_on: None,
    }
}
