pub mod error;
pub mod i18n;
pub mod jwt;

pub use error::{ApiError, ApiResult};
pub use i18n::{FALLBACK_LOCALE, get_locale, negotiate_from_header, with_locale};
pub use jwt::JwtUtil;
