// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError variants, Display formatting, From impls
// ═══════════════════════════════════════════════════════════════════

use mindstock_core::errors::CoreError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn invalid_format() {
        let err = CoreError::InvalidFormat("no version tag".into());
        assert_eq!(err.to_string(), "Invalid document format: no version tag");
    }

    #[test]
    fn unsupported_version() {
        let err = CoreError::UnsupportedVersion("3.0".into());
        assert_eq!(err.to_string(), "Unsupported document version: 3.0");
    }

    #[test]
    fn csv_import() {
        let err = CoreError::CsvImport("Missing required columns: 현재가".into());
        assert_eq!(
            err.to_string(),
            "CSV import failed: Missing required columns: 현재가"
        );
    }

    #[test]
    fn api_error_includes_provider() {
        let err = CoreError::Api {
            provider: "KIS".into(),
            message: "token expired".into(),
        };
        assert_eq!(err.to_string(), "API error (KIS): token expired");
    }

    #[test]
    fn no_provider() {
        let err = CoreError::NoProvider("KRX".into());
        assert_eq!(err.to_string(), "No provider available for market: KRX");
    }

    #[test]
    fn rate_out_of_range() {
        let err = CoreError::RateOutOfRange(500.0);
        assert_eq!(
            err.to_string(),
            "Exchange rate 500 outside the accepted 800..=2000 KRW band"
        );
    }

    #[test]
    fn duplicate_holding() {
        let err = CoreError::DuplicateHolding("005930".into());
        assert_eq!(err.to_string(), "Holding already exists: 005930");
    }

    #[test]
    fn holding_not_found() {
        let err = CoreError::HoldingNotFound("AAPL".into());
        assert_eq!(err.to_string(), "Holding not found: AAPL");
    }

    #[test]
    fn auth_errors() {
        assert_eq!(
            CoreError::DuplicateEmail("a@b.com".into()).to_string(),
            "Email already registered: a@b.com"
        );
        assert_eq!(
            CoreError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
        assert_eq!(
            CoreError::InvalidToken.to_string(),
            "Invalid or expired token"
        );
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod conversions {
    use super::*;

    #[test]
    fn io_error_becomes_file_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::FileIO(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn serde_error_becomes_deserialization() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: CoreError = parse_err.into();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn errors_are_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&CoreError::InvalidCredentials);
    }
}
