//! Payment API Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State, multipart::Field},
    response::IntoResponse,
};
use http::{StatusCode, header};
use shared::models::{Payment, PaymentSummary, PaymentVerify};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::error::CommerceError;
use crate::payments::{ProofFile, ProofSubmission};
use crate::utils::validation::parse_amount;
use crate::utils::{AppError, AppResult};

/// Upload payment proof
///
/// 字段：`orderId` (或 `order_id`)、`amount`、`file` (或 `paymentProof`)、可选 `method`。
pub async fn confirm(
    State(state): State<ServerState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<PaymentSummary>> {
    let max = state.config.max_proof_size;

    let mut order_id: Option<String> = None;
    let mut amount: Option<String> = None;
    let mut method: Option<String> = None;
    let mut file: Option<ProofFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "orderId" | "order_id" => order_id = Some(read_text(field, max).await?),
            "amount" => amount = Some(read_text(field, max).await?),
            "method" => method = Some(read_text(field, max).await?),
            "file" | "paymentProof" => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = read_limited(field, max).await?;
                file = Some(ProofFile {
                    bytes,
                    content_type,
                    file_name,
                });
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let order_id = order_id
        .filter(|s| !s.trim().is_empty())
        .ok_or(CommerceError::MissingField("orderId"))?;
    let order_id: i64 = order_id.trim().parse().map_err(|_| {
        CommerceError::InvalidArgument(format!("orderId is not a valid id: {order_id}"))
    })?;
    let amount = amount
        .filter(|s| !s.trim().is_empty())
        .ok_or(CommerceError::MissingField("amount"))?;
    let amount = parse_amount(&amount)?;
    let file = file.ok_or(CommerceError::MissingField("file"))?;

    let summary = state
        .payments
        .submit_proof(
            &user,
            ProofSubmission {
                order_id,
                amount,
                method,
                file,
            },
        )
        .await?;
    Ok(Json(summary))
}

pub async fn verify(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentVerify>,
) -> AppResult<Json<Payment>> {
    let payment = state.payments.verify(&user, id, payload).await?;
    Ok(Json(payment))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Payment>> {
    let payment = state.payments.get(&user, id).await?;
    Ok(Json(payment))
}

/// Serve a stored proof to staff or the owning customer
pub async fn serve_proof(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(key): Path<String>,
) -> AppResult<impl IntoResponse> {
    let (content, content_type) = state.payments.open_proof(&user, &key).await?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        Bytes::from(content),
    ))
}

/// 逐块读取，超过上限立即中止
async fn read_limited(mut field: Field<'_>, max: usize) -> AppResult<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, max))? {
        if buf.len() + chunk.len() > max {
            return Err(CommerceError::PayloadTooLarge { max }.into());
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn read_text(field: Field<'_>, max: usize) -> AppResult<String> {
    let bytes = read_limited(field, max).await?;
    String::from_utf8(bytes)
        .map_err(|_| CommerceError::InvalidArgument("Form field is not valid UTF-8".into()).into())
}

fn multipart_error(err: axum::extract::multipart::MultipartError, max: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return CommerceError::PayloadTooLarge { max }.into();
    }
    AppError::validation(format!("Invalid multipart request: {}", err.body_text()))
}
