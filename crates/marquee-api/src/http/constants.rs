//! Shared HTTP constants (headers, problem URIs, route paths).

pub(crate) const HEADER_ADMIN_TOKEN: &str = "x-marquee-admin-token";

pub(crate) const PROBLEM_INTERNAL: &str = "https://marquee.dev/problems/internal";
pub(crate) const PROBLEM_UNAUTHORIZED: &str = "https://marquee.dev/problems/unauthorized";
pub(crate) const PROBLEM_FORBIDDEN: &str = "https://marquee.dev/problems/forbidden";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://marquee.dev/problems/bad-request";
pub(crate) const PROBLEM_NOT_FOUND: &str = "https://marquee.dev/problems/not-found";
pub(crate) const PROBLEM_CONFLICT: &str = "https://marquee.dev/problems/conflict";
pub(crate) const PROBLEM_PAYLOAD_TOO_LARGE: &str = "https://marquee.dev/problems/payload-too-large";
pub(crate) const PROBLEM_SERVICE_UNAVAILABLE: &str =
    "https://marquee.dev/problems/service-unavailable";
pub(crate) const PROBLEM_GATEWAY_TIMEOUT: &str = "https://marquee.dev/problems/batch-timeout";

/// Detail shared by every authorization denial so callers cannot tell why.
pub(crate) const FORBIDDEN_DETAIL: &str = "access to this resource is not permitted";

pub(crate) const WATCH_PAGES_PATH: &str = "/admin/watch-pages";
pub(crate) const UPLOAD_FIELD: &str = "watchPage";
