//! Messages exchanged with the browser extension.
//!
//! Outbound messages feed the on-page dashboard. Inbound messages carry the
//! browser-side events (tab switches, cookie contents, intercepted requests)
//! that the extension forwards. Both are JSON objects tagged by `kind`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identifiers::IdentifierKind;
use crate::models::{clip_evidence, CookieValues, HttpHeader, RequestBody, TrackingSnapshot};

/// Evidence sent to the extension is cut to this many bytes per destination.
/// The in-memory records keep the full text.
pub const MAX_WIRE_EVIDENCE: usize = 2048;

/// Push update rendered by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardUpdate {
    /// Tab the update is addressed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<u64>,
    pub identifier_a_value: String,
    pub identifier_b_value: String,
    pub identifier_a_domains: Vec<(String, String)>,
    pub identifier_b_domains: Vec<(String, String)>,
}

impl DashboardUpdate {
    pub fn new(tab_id: Option<u64>, cookies: &CookieValues, snapshot: &TrackingSnapshot) -> Self {
        Self {
            tab_id,
            identifier_a_value: cookies.display_value(IdentifierKind::Facebook),
            identifier_b_value: cookies.display_value(IdentifierKind::GoogleAnalytics),
            identifier_a_domains: snapshot
                .records(IdentifierKind::Facebook)
                .to_pairs(MAX_WIRE_EVIDENCE),
            identifier_b_domains: snapshot
                .records(IdentifierKind::GoogleAnalytics)
                .to_pairs(MAX_WIRE_EVIDENCE),
        }
    }
}

/// Domain maps returned for a `getTrackingData` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingData {
    pub identifier_a_domains: Vec<(String, String)>,
    pub identifier_b_domains: Vec<(String, String)>,
}

impl From<&TrackingSnapshot> for TrackingData {
    fn from(snapshot: &TrackingSnapshot) -> Self {
        Self {
            identifier_a_domains: snapshot
                .records(IdentifierKind::Facebook)
                .to_pairs(MAX_WIRE_EVIDENCE),
            identifier_b_domains: snapshot
                .records(IdentifierKind::GoogleAnalytics)
                .to_pairs(MAX_WIRE_EVIDENCE),
        }
    }
}

/// Messages sent from leakwatch to the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutboundMessage {
    UpdateDashboard(DashboardUpdate),
    #[serde(rename_all = "camelCase")]
    TrackingData { tracking_data: TrackingData },
}

impl OutboundMessage {
    /// Cut every evidence string in the message to `max_bytes`.
    pub fn clip_evidence(&mut self, max_bytes: usize) {
        let (a, b) = match self {
            Self::UpdateDashboard(update) => (
                &mut update.identifier_a_domains,
                &mut update.identifier_b_domains,
            ),
            Self::TrackingData { tracking_data } => (
                &mut tracking_data.identifier_a_domains,
                &mut tracking_data.identifier_b_domains,
            ),
        };
        for (_, evidence) in a.iter_mut().chain(b.iter_mut()) {
            if evidence.len() > max_bytes {
                *evidence = clip_evidence(evidence, max_bytes);
            }
        }
    }
}

/// Messages received from the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InboundMessage {
    /// The active tab of the current window changed or navigated.
    #[serde(rename_all = "camelCase")]
    TabActivated {
        #[serde(default)]
        tab_id: Option<u64>,
        #[serde(default)]
        url: Option<String>,
    },
    /// No tab is active any more.
    TabClosed,
    /// Cookie store contents visible to `url`.
    Cookies {
        url: String,
        #[serde(default)]
        values: BTreeMap<String, String>,
    },
    /// `webRequest.onBeforeSendHeaders`.
    #[serde(rename_all = "camelCase")]
    BeforeSendHeaders {
        url: String,
        #[serde(default)]
        request_headers: Vec<HttpHeader>,
    },
    /// `webRequest.onBeforeRequest`.
    #[serde(rename_all = "camelCase")]
    BeforeRequest {
        url: String,
        #[serde(default)]
        request_body: Option<RequestBody>,
    },
    GetTrackingData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{derive_fingerprint, Fingerprints};

    fn sample_snapshot() -> TrackingSnapshot {
        let mut snapshot = TrackingSnapshot::new(Fingerprints {
            facebook: derive_fingerprint(Some("abc.123.xyz987")),
            google_analytics: None,
        });
        snapshot
            .records_mut(IdentifierKind::Facebook)
            .upsert("tracker.example.net", "X-Data: 123.xyz987");
        snapshot
    }

    #[test]
    fn dashboard_update_wire_shape() {
        let cookies = CookieValues {
            facebook: Some("abc.123.xyz987".to_string()),
            google_analytics: None,
        };
        let message = OutboundMessage::UpdateDashboard(DashboardUpdate::new(
            Some(7),
            &cookies,
            &sample_snapshot(),
        ));

        let json = serde_json::to_value(&message).expect("serialize update");
        assert_eq!(json["kind"], "updateDashboard");
        assert_eq!(json["tabId"], 7);
        assert_eq!(json["identifierAValue"], "abc.123.xyz987");
        assert_eq!(json["identifierBValue"], "Not found");
        assert_eq!(
            json["identifierADomains"],
            serde_json::json!([["tracker.example.net", "X-Data: 123.xyz987"]])
        );
        assert_eq!(json["identifierBDomains"], serde_json::json!([]));
    }

    #[test]
    fn tracking_data_response_shape() {
        let message = OutboundMessage::TrackingData {
            tracking_data: TrackingData::from(&sample_snapshot()),
        };
        let json = serde_json::to_value(&message).expect("serialize tracking data");
        assert_eq!(json["kind"], "trackingData");
        assert_eq!(
            json["trackingData"]["identifierADomains"][0][0],
            "tracker.example.net"
        );
        assert_eq!(json["trackingData"]["identifierBDomains"], serde_json::json!([]));
    }

    #[test]
    fn inbound_messages_parse() {
        let msg: InboundMessage = serde_json::from_str(
            r#"{"kind":"tabActivated","tabId":3,"url":"https://shop.example.com/"}"#,
        )
        .expect("tabActivated");
        assert_eq!(
            msg,
            InboundMessage::TabActivated {
                tab_id: Some(3),
                url: Some("https://shop.example.com/".to_string()),
            }
        );

        let msg: InboundMessage = serde_json::from_str(
            r#"{"kind":"beforeSendHeaders","url":"https://t.example.net/","requestHeaders":[{"name":"X-Data","value":"1"}]}"#,
        )
        .expect("beforeSendHeaders");
        match msg {
            InboundMessage::BeforeSendHeaders { request_headers, .. } => {
                assert_eq!(request_headers, vec![HttpHeader::new("X-Data", "1")]);
            }
            other => panic!("unexpected message: {other:?}"),
        }

        let msg: InboundMessage =
            serde_json::from_str(r#"{"kind":"getTrackingData"}"#).expect("getTrackingData");
        assert_eq!(msg, InboundMessage::GetTrackingData);
    }

    #[test]
    fn wire_evidence_is_bounded() {
        let mut snapshot = TrackingSnapshot::default();
        let header = format!("X-Data: {}123.xyz987", "a".repeat(MAX_WIRE_EVIDENCE * 4));
        snapshot
            .records_mut(IdentifierKind::Facebook)
            .upsert("tracker.example.net", &header);

        let data = TrackingData::from(&snapshot);
        let (host, evidence) = &data.identifier_a_domains[0];
        assert_eq!(host, "tracker.example.net");
        assert!(evidence.len() <= MAX_WIRE_EVIDENCE + '…'.len_utf8());
    }

    #[test]
    fn clip_evidence_keeps_hostnames() {
        let mut message = OutboundMessage::UpdateDashboard(DashboardUpdate::new(
            Some(1),
            &CookieValues::default(),
            &sample_snapshot(),
        ));
        message.clip_evidence(0);

        match message {
            OutboundMessage::UpdateDashboard(update) => assert_eq!(
                update.identifier_a_domains,
                vec![("tracker.example.net".to_string(), String::new())]
            ),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let result: Result<InboundMessage, _> = serde_json::from_str(r#"{"kind":"bogus"}"#);
        assert!(result.is_err());
    }
}
