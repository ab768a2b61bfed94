//! The render API: decode the UI's request, drive the renderer client, and map
//! every outcome onto the wire envelope.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::domain::{
    diagram::{DiagramFormat, SyntaxError},
    error::RenderError,
};

use super::{AppState, ErrorReport};

#[derive(Debug, Deserialize)]
pub struct RenderDiagramRequest {
    pub data: String,
    pub format: String,
}

/// Failure envelope returned with HTTP 500; successful renders are raw bytes.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error_code: i64,
    pub error_data: Option<SyntaxErrorData>,
}

#[derive(Debug, Serialize)]
pub struct SyntaxErrorData {
    pub syntax_error_line: u32,
    pub line_with_error: String,
    pub raw: String,
}

impl From<SyntaxError> for SyntaxErrorData {
    fn from(detail: SyntaxError) -> Self {
        Self {
            syntax_error_line: detail.line_number,
            line_with_error: detail.line_with_error,
            raw: detail.raw,
        }
    }
}

/// Closed set of wire error codes; the integers exist only at serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    MalformedRequest,
    DiagramSyntax,
    RenderFailed,
}

impl ErrorCode {
    pub fn as_wire(self) -> i64 {
        match self {
            ErrorCode::MalformedRequest => 2,
            ErrorCode::DiagramSyntax => 3,
            ErrorCode::RenderFailed => 4,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ErrorCode::MalformedRequest => "malformed_request",
            ErrorCode::DiagramSyntax => "diagram_syntax",
            ErrorCode::RenderFailed => "render_failed",
        }
    }
}

#[derive(Debug)]
struct ApiFailure {
    code: ErrorCode,
    data: Option<SyntaxErrorData>,
    detail: String,
}

impl ApiFailure {
    fn malformed(detail: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::MalformedRequest,
            data: None,
            detail: detail.into(),
        }
    }

    fn syntax(detail: Option<SyntaxError>) -> Self {
        let summary = match &detail {
            Some(detail) => format!("syntax error at line {}", detail.line_number),
            None => "renderer rejected the description without a recognizable diagnostic"
                .to_string(),
        };
        Self {
            code: ErrorCode::DiagramSyntax,
            data: detail.map(SyntaxErrorData::from),
            detail: summary,
        }
    }

    fn failed(detail: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::RenderFailed,
            data: None,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            ok: false,
            error_code: self.code.as_wire(),
            error_data: self.data,
        };
        let mut response = (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::api::render_diagram",
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}: {}", self.code.label(), self.detail),
        )
        .attach(&mut response);
        response
    }
}

/// `POST /api/render-diagram`
pub async fn render_diagram(
    State(state): State<AppState>,
    payload: Result<Json<RenderDiagramRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            counter!("plantbridge_render_failures_total").increment(1);
            return ApiFailure::malformed(rejection.to_string()).into_response();
        }
    };

    // Unknown format strings are rejected here; the client never sees them.
    let format = match request.format.parse::<DiagramFormat>() {
        Ok(format) => format,
        Err(err) => {
            counter!("plantbridge_render_failures_total").increment(1);
            return ApiFailure::failed(err.to_string()).into_response();
        }
    };

    counter!(
        "plantbridge_render_requests_total",
        "format" => format.as_path_segment()
    )
    .increment(1);

    match state.renderer.render(&request.data, format).await {
        Ok(artifact) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, format.content_type())],
            artifact,
        )
            .into_response(),
        Err(RenderError::Syntax { detail }) => {
            counter!("plantbridge_render_syntax_errors_total").increment(1);
            ApiFailure::syntax(detail).into_response()
        }
        Err(err) => {
            counter!("plantbridge_render_failures_total").increment(1);
            ApiFailure::failed(err.to_string()).into_response()
        }
    }
}
