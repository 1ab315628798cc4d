pub mod carrier;
pub mod locale;
pub mod request;
pub mod session;

pub use carrier::{CookieAttributes, Disposition, ResponseCarrier, ResponseCookie, SameSite};
pub use locale::{HealthResponse, LocaleDetailResponse, LocaleListResponse, ResolvedLocale};
pub use request::{InboundRequest, parse_cookie_header};
pub use session::{SessionClaims, SessionTokens, SessionUser};
