//! Request helper extensions.

use salvo::Request;
use sitebind_app::domain::registration::data::RequestContext;

/// Helpers for reading registration facts off an inbound request.
pub(crate) trait RequestExt {
    /// Host the request was addressed to: the `Host` header, falling back to
    /// the URI authority for absolute-form requests.
    fn request_host(&self) -> String;

    fn registration_context(&self) -> RequestContext;
}

impl RequestExt for Request {
    fn request_host(&self) -> String {
        self.header::<String>("host")
            .filter(|host| !host.trim().is_empty())
            .or_else(|| self.uri().authority().map(|authority| authority.as_str().to_owned()))
            .unwrap_or_default()
    }

    fn registration_context(&self) -> RequestContext {
        let remote_addr = self.remote_addr().to_string();

        RequestContext::new(
            self.request_host(),
            (!remote_addr.is_empty()).then_some(remote_addr),
        )
    }
}
