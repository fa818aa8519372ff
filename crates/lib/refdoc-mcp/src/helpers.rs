use std::borrow::Cow;

use refdoc_core::control::ControlError;
use refdoc_core::session::SessionError;
use rmcp::ErrorData;
use rmcp::model::ErrorCode;

pub(crate) fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

pub(crate) fn map_control_err(err: ControlError) -> ErrorData {
    let code = match &err {
        ControlError::Session(SessionError::InvalidCandidateCount(_)) => ErrorCode::INVALID_PARAMS,
        ControlError::Transport(_) | ControlError::Session(_) => ErrorCode::INTERNAL_ERROR,
    };
    mcp_err(code, err.to_string())
}

pub(crate) fn invalid_params(message: impl Into<Cow<'static, str>>) -> ErrorData {
    mcp_err(ErrorCode::INVALID_PARAMS, message)
}
