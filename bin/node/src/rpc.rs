//! JSON-RPC surface over the rollup

use std::sync::Arc;

use axum::{
    extract::State as AxumState,
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use rollup_core::{
    decimal, parse_bytes32, to_hex, AccountId, Amount, Clock, ErrorKind, Hash, InMemoryVault,
    Rollup, RollupError, StateRecord, TransactionRequest,
};

/// Upper bound on events returned by one `rollup_getEvents` call
const MAX_EVENTS_PER_CALL: usize = 1_000;

/// Rollup shared by all request handlers; the mutex serializes every call
pub(crate) type SharedRollup = Arc<Mutex<Rollup>>;

/// JSON-RPC request
#[derive(Debug, Deserialize)]
pub(crate) struct RpcRequest {
    method: String,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    id: Value,
}

/// JSON-RPC response
#[derive(Debug, Serialize)]
pub(crate) struct RpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
    id: Value,
}

impl RpcResponse {
    fn new(id: Value, outcome: Result<Value, RpcError>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(err) => (None, Some(err)),
        };
        Self {
            jsonrpc: "2.0".to_string(),
            result,
            error,
            id,
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    const METHOD_NOT_FOUND: i64 = -32601;
    const INVALID_PARAMS: i64 = -32602;
    const INTERNAL_ERROR: i64 = -32603;

    fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: format!("unknown method {method}"),
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_PARAMS,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            code: Self::INTERNAL_ERROR,
            message: message.into(),
        }
    }
}

impl From<RollupError> for RpcError {
    fn from(err: RollupError) -> Self {
        let code = match err.kind() {
            ErrorKind::Validation => -32001,
            ErrorKind::Proof => -32002,
            ErrorKind::State => -32003,
            ErrorKind::Conservation => -32004,
            ErrorKind::External => -32005,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct SubmitStateInput {
    root: String,
}

#[derive(Deserialize)]
struct IndexInput {
    index: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessTransactionInput {
    index: usize,
    payload: String,
    #[serde(default)]
    sender_proof: Vec<String>,
    #[serde(default)]
    recipient_proof: Vec<String>,
    #[serde(with = "decimal")]
    sender_balance: Amount,
    #[serde(with = "decimal")]
    recipient_balance: Amount,
}

#[derive(Deserialize)]
struct ChallengeInput {
    caller: String,
    index: usize,
}

#[derive(Deserialize)]
struct ResolveInput {
    caller: String,
    index: usize,
    #[serde(default)]
    proof: Vec<String>,
    leaf: String,
    fraud: bool,
}

#[derive(Deserialize)]
struct AmountInput {
    caller: String,
    #[serde(with = "decimal")]
    amount: Amount,
}

#[derive(Deserialize)]
struct AccountInput {
    account: String,
}

#[derive(Default, Deserialize)]
struct EventsInput {
    #[serde(default)]
    from: u64,
    #[serde(default)]
    limit: Option<usize>,
}

/// Build the HTTP router
pub(crate) fn router(state: SharedRollup) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(health).post(rpc_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health() -> &'static str {
    "ok"
}

/// RPC handler
async fn rpc_handler(
    AxumState(state): AxumState<SharedRollup>,
    Json(req): Json<RpcRequest>,
) -> Json<RpcResponse> {
    let outcome = {
        let mut rollup = state.lock().await;
        dispatch(&mut *rollup, &req.method, req.params)
    };
    Json(RpcResponse::new(req.id, outcome))
}

/// Execute one RPC method against the rollup
pub(crate) fn dispatch<C: Clock>(
    rollup: &mut Rollup<C, InMemoryVault>,
    method: &str,
    params: Option<Value>,
) -> Result<Value, RpcError> {
    match method {
        "rollup_submitState" => {
            let input: SubmitStateInput = first_param(params)?;
            let index = rollup.submit_state(parse_hash(&input.root)?);
            Ok(json!(index))
        }
        "rollup_getState" => {
            let input: IndexInput = first_param(params)?;
            let record = rollup.get_state(input.index)?;
            Ok(record_json(input.index, record))
        }
        "rollup_stateCount" => Ok(json!(rollup.ledger().len())),
        "rollup_processTransaction" => {
            let input: ProcessTransactionInput = first_param(params)?;
            let request = TransactionRequest {
                payload: parse_bytes(&input.payload)?,
                proof_sender: parse_proof(&input.sender_proof)?,
                proof_recipient: parse_proof(&input.recipient_proof)?,
                sender_balance_before: input.sender_balance,
                recipient_balance_before: input.recipient_balance,
            };
            let transition = rollup.process_transaction(input.index, &request)?;
            Ok(json!({
                "index": input.index,
                "previousRoot": to_hex(&transition.previous_root),
                "newRoot": to_hex(&transition.new_root),
                "txHash": to_hex(&transition.transaction.hash()),
                "senderBalance": transition.sender_balance_after.to_string(),
                "recipientBalance": transition.recipient_balance_after.to_string(),
            }))
        }
        "rollup_challengeState" => {
            let input: ChallengeInput = first_param(params)?;
            rollup.challenge_state(&parse_account(&input.caller)?, input.index)?;
            Ok(json!(true))
        }
        "rollup_resolveChallenge" => {
            let input: ResolveInput = first_param(params)?;
            let resolution = rollup.resolve_challenge(
                &parse_account(&input.caller)?,
                input.index,
                &parse_proof(&input.proof)?,
                &parse_hash(&input.leaf)?,
                input.fraud,
            )?;
            Ok(json!({
                "index": input.index,
                "fraudulent": resolution == rollup_core::Resolution::Invalidated,
            }))
        }
        "rollup_deposit" => {
            let input: AmountInput = first_param(params)?;
            let balance =
                rollup.deposit(&parse_account(&input.caller)?, input.amount)?;
            Ok(json!(balance.to_string()))
        }
        "rollup_withdraw" => {
            let input: AmountInput = first_param(params)?;
            let balance =
                rollup.withdraw(&parse_account(&input.caller)?, input.amount)?;
            Ok(json!(balance.to_string()))
        }
        "rollup_getBalance" => {
            let input: AccountInput = first_param(params)?;
            Ok(json!(rollup.balance_of(&parse_account(&input.account)?).to_string()))
        }
        "rollup_getWalletBalance" => {
            let input: AccountInput = first_param(params)?;
            let account = parse_account(&input.account)?;
            Ok(json!(rollup.vault().wallet_balance(&account).to_string()))
        }
        "rollup_getReserve" => Ok(json!(rollup.reserve().to_string())),
        "rollup_challengeWindow" => Ok(json!(rollup.challenge_window())),
        "rollup_isFinalized" => {
            let input: IndexInput = first_param(params)?;
            Ok(json!(rollup.is_finalized(input.index)?))
        }
        "rollup_getEvents" => {
            let input: EventsInput = match params {
                None => EventsInput::default(),
                params => first_param(params)?,
            };
            let limit = input.limit.unwrap_or(MAX_EVENTS_PER_CALL).min(MAX_EVENTS_PER_CALL);
            let from = input
                .from
                .clamp(rollup.first_event_seq(), rollup.next_event_seq());
            let events = rollup
                .events_since(from)
                .take(limit)
                .map(|(_, event)| serde_json::to_value(event))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| RpcError::internal(e.to_string()))?;
            Ok(json!({
                "from": from,
                "next": from + events.len() as u64,
                "events": events,
            }))
        }
        _ => Err(RpcError::method_not_found(method)),
    }
}

/// Deserialize `params[0]`, or `params` itself when it is an object
fn first_param<T: DeserializeOwned>(params: Option<Value>) -> Result<T, RpcError> {
    let value = match params {
        Some(Value::Array(mut items)) if !items.is_empty() => items.swap_remove(0),
        Some(value @ Value::Object(_)) => value,
        _ => return Err(RpcError::invalid_params("missing params")),
    };
    serde_json::from_value(value).map_err(|e| RpcError::invalid_params(e.to_string()))
}

fn parse_bytes(s: &str) -> Result<Vec<u8>, RpcError> {
    hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| RpcError::invalid_params(format!("bad hex: {e}")))
}

/// Hashes must be exactly 32 bytes
fn parse_hash(s: &str) -> Result<Hash, RpcError> {
    parse_bytes(s)?
        .try_into()
        .map_err(|_| RpcError::invalid_params(format!("expected 32-byte hash: {s}")))
}

fn parse_proof(items: &[String]) -> Result<Vec<Hash>, RpcError> {
    items.iter().map(|s| parse_hash(s)).collect()
}

fn parse_account(s: &str) -> Result<AccountId, RpcError> {
    parse_bytes32(s).ok_or_else(|| RpcError::invalid_params(format!("bad account: {s}")))
}

fn record_json(index: usize, record: &StateRecord) -> Value {
    json!({
        "index": index,
        "root": to_hex(&record.root),
        "timestamp": record.timestamp,
        "challenged": record.challenged,
        "valid": record.valid,
        "status": record.status(),
    })
}
