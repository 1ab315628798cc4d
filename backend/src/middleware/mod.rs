pub mod edge;
pub mod locale;
pub mod route_matcher;

pub use edge::edge_middleware;
pub use locale::locale_middleware;
pub use route_matcher::RouteMatcher;
