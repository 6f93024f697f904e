use crate::api::middleware::RequestErrors;
use crate::api::AppState;
use crate::core::bounded::read_bounded;
use crate::core::encode_request::{parse_encode_request, EncodeQuery};
use crate::core::scan::{encode_spec, scan_image_bytes};
use crate::domain::model::DecodeResult;
use crate::utils::error::QrError;
use axum::body::Body;
use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

/// `GET /encode`
pub async fn encode(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let query = EncodeQuery::from_query_str(query.as_deref().unwrap_or_default());

    let spec = match parse_encode_request(&query, &state.config) {
        Ok(spec) => spec,
        Err(e) => return failure((StatusCode::BAD_REQUEST, e.to_string()), e),
    };

    match encode_spec(state.encoder.clone(), spec).await {
        Ok(encoded) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoded.output.content_type())],
            encoded.bytes,
        )
            .into_response(),
        Err(e) => failure((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()), e),
    }
}

/// `POST /decode`
///
/// Anything past the size checks answers 200 and reports failure inside the
/// body, so clients can tell a broken server from an unreadable image.
pub async fn decode(State(state): State<AppState>, headers: HeaderMap, body: Body) -> Response {
    let limit = state.config.max_decode_bytes();

    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len >= limit as u64) {
        return failure(
            (StatusCode::PAYLOAD_TOO_LARGE, Json(DecodeResult::too_large())),
            QrError::validation("request is too large (content-length)"),
        );
    }

    let bytes = match read_bounded(body.into_data_stream(), limit).await {
        Ok(bytes) => bytes,
        Err(e @ QrError::TooLarge { .. }) => {
            return failure(
                (StatusCode::PAYLOAD_TOO_LARGE, Json(DecodeResult::too_large())),
                e,
            )
        }
        Err(e) => return failure(Json(DecodeResult::failed(e.to_string())), e),
    };

    match scan_image_bytes(state.decoder.clone(), bytes).await {
        Ok(content) => Json(DecodeResult::found(content)).into_response(),
        Err(e) => failure(Json(DecodeResult::failed(e.to_string())), e),
    }
}

/// Builds the response and records `err` for the request log.
fn failure(response: impl IntoResponse, err: QrError) -> Response {
    let mut response = response.into_response();
    response
        .extensions_mut()
        .insert(RequestErrors(vec![err.to_string()]));
    response
}
