//! Socket framing for the bridge.
//!
//! Each WebSocket text frame carries one envelope. The `id` pairs a
//! response with its request and belongs to the transport alone; it is
//! not an application-level identity.

use serde::{Deserialize, Serialize};

use crate::ops::{BridgeRequest, BridgeResponse};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub id: u64,
    pub request: BridgeRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: u64,
    pub response: BridgeResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::ResponseBody;

    #[test]
    fn envelope_round_trip() {
        let env = RequestEnvelope {
            id: 7,
            request: BridgeRequest::ReadFile {
                file_path: "/a.txt".into(),
            },
        };
        let json = serde_json::to_string(&env).unwrap();
        let back: RequestEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(env, back);

        let env = ResponseEnvelope {
            id: 7,
            response: BridgeResponse::ok(ResponseBody::ReadFile {
                content: "hi".into(),
            }),
        };
        let json = serde_json::to_string(&env).unwrap();
        let back: ResponseEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(env, back);
    }
}
