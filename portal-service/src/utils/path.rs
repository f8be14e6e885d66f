/// Normalize a request path for rate-limit rules and counters.
///
/// Strips leading/trailing slashes and replaces internal slashes with
/// underscores so that rules and counters key consistently regardless
/// of trailing slashes.
pub fn sanitize_path(path: &str) -> String {
    path.trim_matches('/').replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/api/v1/posts"), "api_v1_posts");
        assert_eq!(sanitize_path("/api/v1/posts/"), "api_v1_posts");
        assert_eq!(sanitize_path("api/v1/posts"), "api_v1_posts");
        assert_eq!(sanitize_path("/"), "");
        assert_eq!(sanitize_path(""), "");
    }

    #[test]
    fn test_sanitize_path_keys_consistently() {
        assert_eq!(sanitize_path("/posts"), sanitize_path("posts/"));
    }
}
