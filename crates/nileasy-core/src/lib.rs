// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for NilEasy.
//!
//! Provides the adapter traits, the error type, the conversation state enum
//! and the user aggregate shared by every other crate in the workspace.

pub mod clock;
pub mod error;
pub mod phone;
pub mod state;
pub mod traits;
pub mod types;
pub mod user;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock};
pub use error::{ExternalErrorKind, ExternalService, NilEasyError};
pub use state::{ConversationState, StateMetadata};
pub use types::{AdapterType, HealthStatus, MessageId};

// Re-export all adapter traits at crate root.
pub use traits::{
    ChannelAdapter, LinkShortener, PluginAdapter, SessionStore, StorageAdapter, TaxPortalAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct() {
        let _config = NilEasyError::Config("test".into());
        let _validation = NilEasyError::validation("bad gstin");
        let _storage = NilEasyError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _channel = NilEasyError::Channel {
            message: "test".into(),
            source: None,
        };
        let _external = NilEasyError::external(
            ExternalService::TaxPortal,
            ExternalErrorKind::BadCaptcha,
            "wrong captcha",
        );
        let _missing = NilEasyError::not_found("captcha session", "abc");
        let _conflict = NilEasyError::Conflict {
            resource: "user".into(),
            id: "+91".into(),
        };
        let _limited = NilEasyError::RateLimited {
            message: "slow down".into(),
        };
        let _unauth = NilEasyError::Unauthorized("no token".into());
        let _health = NilEasyError::HealthCheckFailed {
            name: "test".into(),
            source: Box::new(std::io::Error::other("test")),
        };
        let _timeout = NilEasyError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = NilEasyError::Internal("test".into());
    }

    #[test]
    fn error_codes_follow_taxonomy() {
        assert_eq!(NilEasyError::validation("x").code(), "VALIDATION_ERROR");
        assert_eq!(NilEasyError::not_found("user", "1").code(), "NOT_FOUND");
        assert_eq!(
            NilEasyError::external(
                ExternalService::LinkShortener,
                ExternalErrorKind::Unavailable,
                "down"
            )
            .code(),
            "EXTERNAL_SERVICE_ERROR"
        );
        assert_eq!(NilEasyError::Internal("x".into()).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn retryability() {
        let bad_captcha = NilEasyError::external(
            ExternalService::TaxPortal,
            ExternalErrorKind::BadCaptcha,
            "wrong",
        );
        let not_found = NilEasyError::external(
            ExternalService::TaxPortal,
            ExternalErrorKind::GstinNotFound,
            "none",
        );
        assert!(bad_captcha.is_retryable());
        assert!(!not_found.is_retryable());
        assert_eq!(not_found.external_kind(), Some(ExternalErrorKind::GstinNotFound));
        assert!(!NilEasyError::validation("x").is_retryable());
    }

    #[test]
    fn gst_errors_become_validation_errors() {
        let err: NilEasyError = nileasy_gst::GstError::InvalidGstin("X".into()).into();
        assert!(matches!(err, NilEasyError::Validation { .. }));
    }

    #[test]
    fn external_error_display_names_service() {
        let err = NilEasyError::external(
            ExternalService::TaxPortal,
            ExternalErrorKind::SessionExpired,
            "cookie gone",
        );
        assert_eq!(
            err.to_string(),
            "tax_portal error (session_expired): cookie gone"
        );
    }

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;
        for variant in [
            AdapterType::Channel,
            AdapterType::Storage,
            AdapterType::TaxPortal,
            AdapterType::LinkShortener,
        ] {
            let s = variant.to_string();
            assert_eq!(AdapterType::from_str(&s).unwrap(), variant);
        }
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_session_store<T: SessionStore>() {}
        fn _assert_portal<T: TaxPortalAdapter>() {}
        fn _assert_shortener<T: LinkShortener>() {}
    }
}
