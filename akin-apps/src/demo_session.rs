//! N-party confirmation sessions
//!
//! A session is opened with a `create` transaction naming its participants
//! and the signers whose confirmation is required. Each `sign` transaction
//! marks its signers as collected; once every required signer has signed the
//! session completes.
//!
//! # Payloads
//!
//! ```json
//! {"action": "create", "service_id": "SESSION-1",
//!  "participants": ["AKIN:USER:1"], "required_signers": ["AKIN:USER:1"]}
//! {"action": "sign", "service_id": "SESSION-1"}
//! ```
//!
//! `service_id` must be a string and both lists must hold only strings;
//! anything else is rejected at intake with the field's usual reason.

use akin_ledger::{App, Payload, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Registry name of the app
pub const APP_NAME: &str = "demo_session";

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Waiting for required signers
    Pending,
    /// Every required signer has signed
    Completed,
}

/// One confirmation session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session key
    pub service_id: String,
    /// Parties to the session
    pub participants: Vec<String>,
    /// Signers whose confirmation is required
    pub required_signers: Vec<String>,
    /// Per required signer: signed yet?
    pub signatures_collected: BTreeMap<String, bool>,
    /// Lifecycle status
    pub status: SessionStatus,
}

impl Session {
    fn new(service_id: String, participants: Vec<String>, required_signers: Vec<String>) -> Self {
        let signatures_collected = required_signers
            .iter()
            .map(|signer| (signer.clone(), false))
            .collect();

        Self {
            service_id,
            participants,
            required_signers,
            signatures_collected,
            status: SessionStatus::Pending,
        }
    }

    /// Has every required signer signed
    pub fn is_fully_signed(&self) -> bool {
        self.signatures_collected.values().all(|signed| *signed)
    }
}

/// State of the `demo_session` app
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoSessionState {
    /// Sessions keyed by service ID
    pub sessions: BTreeMap<String, Session>,
}

impl DemoSessionState {
    /// Look up a session
    pub fn session(&self, service_id: &str) -> Option<&Session> {
        self.sessions.get(service_id)
    }
}

/// Generic N-party confirmation app
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoSession;

impl DemoSession {
    /// Create the app
    pub fn new() -> Self {
        Self
    }
}

impl App for DemoSession {
    type State = DemoSessionState;

    fn name(&self) -> &str {
        APP_NAME
    }

    fn validate(&self, tx: &Transaction, _state: &DemoSessionState) -> Result<(), String> {
        let payload = tx.payload();

        match payload.get("action") {
            Some(Value::String(action)) if action == "create" => {
                require_service_id(tx)?;
                if string_list(payload, "participants").is_none() {
                    return Err("participants list required".to_string());
                }
                if string_list(payload, "required_signers").is_none() {
                    return Err("required_signers list required".to_string());
                }
                Ok(())
            }
            Some(Value::String(action)) if action == "sign" => {
                require_service_id(tx)?;
                if tx.signatures().is_empty() {
                    return Err("signature required".to_string());
                }
                Ok(())
            }
            Some(Value::String(other)) => Err(format!("unknown action {}", other)),
            None | Some(Value::Null) => Err("unknown action None".to_string()),
            Some(other) => Err(format!("unknown action {}", other)),
        }
    }

    fn apply(&self, tx: &Transaction, state: &mut DemoSessionState) {
        let (Some(action), Some(service_id)) =
            (tx.payload_str("action"), tx.payload_str("service_id"))
        else {
            return;
        };

        match action {
            "create" => {
                let participants = string_list(tx.payload(), "participants").unwrap_or_default();
                let required = string_list(tx.payload(), "required_signers").unwrap_or_default();

                debug!(service_id, required = required.len(), "Session created");
                state.sessions.insert(
                    service_id.to_string(),
                    Session::new(service_id.to_string(), participants, required),
                );
            }
            "sign" => {
                let Some(session) = state.sessions.get_mut(service_id) else {
                    return;
                };

                for signature in tx.signatures() {
                    if let Some(signed) = session.signatures_collected.get_mut(signature.signer()) {
                        *signed = true;
                    }
                }

                if session.is_fully_signed() {
                    session.status = SessionStatus::Completed;
                    debug!(service_id, "Session completed");
                }
            }
            _ => {}
        }
    }
}

fn require_service_id(tx: &Transaction) -> Result<(), String> {
    match tx.payload_str("service_id") {
        Some(_) => Ok(()),
        None => Err("service_id required".to_string()),
    }
}

/// `payload[key]` as a list of strings
fn string_list(payload: &Payload, key: &str) -> Option<Vec<String>> {
    payload
        .get(key)?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}
