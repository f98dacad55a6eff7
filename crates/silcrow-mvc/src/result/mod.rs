// File: src/result/mod.rs
// Purpose: The action result model: one enum variant per result kind

mod auth;
mod content;
mod file;
mod object;
mod redirect;
mod status;

pub use auth::{ChallengeResult, ForbidResult, SignInResult, SignOutResult};
pub use content::ContentResult;
pub use file::{FileResult, FileSource, SeekableStream};
pub use object::{Location, ObjectResult, Payload};
pub use redirect::{
    LocalRedirectResult, RedirectMode, RedirectResult, RedirectToActionResult,
    RedirectToRouteResult,
};
pub use status::StatusCodeResult;

use axum::http::StatusCode;

use crate::error::{MvcError, Result};

/// Description of the response an action wants; realized by an executor.
#[derive(Debug)]
pub enum ActionResult {
    Status(StatusCodeResult),
    Object(ObjectResult),
    Content(ContentResult),
    Redirect(RedirectResult),
    LocalRedirect(LocalRedirectResult),
    RedirectToRoute(RedirectToRouteResult),
    RedirectToAction(RedirectToActionResult),
    File(FileResult),
    Challenge(ChallengeResult),
    Forbid(ForbidResult),
    SignIn(SignInResult),
    SignOut(SignOutResult),
}

/// Discriminant of [`ActionResult`], used as the executor registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Status,
    Object,
    Content,
    Redirect,
    LocalRedirect,
    RedirectToRoute,
    RedirectToAction,
    File,
    Challenge,
    Forbid,
    SignIn,
    SignOut,
}

impl ActionResult {
    pub fn kind(&self) -> ResultKind {
        match self {
            ActionResult::Status(_) => ResultKind::Status,
            ActionResult::Object(_) => ResultKind::Object,
            ActionResult::Content(_) => ResultKind::Content,
            ActionResult::Redirect(_) => ResultKind::Redirect,
            ActionResult::LocalRedirect(_) => ResultKind::LocalRedirect,
            ActionResult::RedirectToRoute(_) => ResultKind::RedirectToRoute,
            ActionResult::RedirectToAction(_) => ResultKind::RedirectToAction,
            ActionResult::File(_) => ResultKind::File,
            ActionResult::Challenge(_) => ResultKind::Challenge,
            ActionResult::Forbid(_) => ResultKind::Forbid,
            ActionResult::SignIn(_) => ResultKind::SignIn,
            ActionResult::SignOut(_) => ResultKind::SignOut,
        }
    }
}

/// Validate a numeric status. Only 100..=599 is accepted.
pub(crate) fn status_code(code: u16) -> Result<StatusCode> {
    if !(100..=599).contains(&code) {
        return Err(MvcError::InvalidStatusCode(code));
    }
    StatusCode::from_u16(code).map_err(|_| MvcError::InvalidStatusCode(code))
}

macro_rules! impl_from_result {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ActionResult {
                fn from(result: $ty) -> Self {
                    ActionResult::$variant(result)
                }
            }
        )*
    };
}

impl_from_result! {
    StatusCodeResult => Status,
    ObjectResult => Object,
    ContentResult => Content,
    RedirectResult => Redirect,
    LocalRedirectResult => LocalRedirect,
    RedirectToRouteResult => RedirectToRoute,
    RedirectToActionResult => RedirectToAction,
    FileResult => File,
    ChallengeResult => Challenge,
    ForbidResult => Forbid,
    SignInResult => SignIn,
    SignOutResult => SignOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_range() {
        assert_eq!(status_code(100).unwrap(), StatusCode::CONTINUE);
        assert_eq!(status_code(599).unwrap().as_u16(), 599);
        assert!(matches!(status_code(99), Err(MvcError::InvalidStatusCode(99))));
        assert!(matches!(status_code(600), Err(MvcError::InvalidStatusCode(600))));
    }

    #[test]
    fn test_kind_follows_variant() {
        let result: ActionResult = StatusCodeResult::not_found().into();
        assert_eq!(result.kind(), ResultKind::Status);

        let result: ActionResult = RedirectResult::new("/home").unwrap().into();
        assert_eq!(result.kind(), ResultKind::Redirect);
    }
}
