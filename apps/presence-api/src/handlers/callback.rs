//! 回调入口 handler
//!
//! `POST /callback`，请求体 `{"object_ids":[int,…]}`。
//! 解码失败返回 400 与 `invalid request`；成功即返回 200，
//! 标识的实际入队在后台任务完成：200 只代表"已接受处理"，
//! 不代表每个标识都已被处理。

use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::CallbackBatch;
use presence_telemetry::{record_callback_received, record_callback_rejected, record_id_enqueued};
use tracing::{debug, error};

pub async fn callback(State(state): State<AppState>, body: Bytes) -> Response {
    let batch: CallbackBatch = match serde_json::from_slice(&body) {
        Ok(batch) => batch,
        Err(err) => {
            record_callback_rejected();
            error!(target: "presence.callback", error = %err, "callback_decode_failed");
            return (StatusCode::BAD_REQUEST, "invalid request").into_response();
        }
    };

    record_callback_received();
    debug!(
        target: "presence.callback",
        ids = batch.object_ids.len(),
        "callback_accepted"
    );

    // 慢消费者不阻塞 HTTP 应答：入队放到后台任务。
    let input = state.callback_tx.clone();
    tokio::spawn(async move {
        for id in batch.object_ids {
            if input.send(id).await.is_err() {
                break;
            }
            record_id_enqueued();
        }
    });

    StatusCode::OK.into_response()
}
