//! Redirect-target validation.
//!
//! Values arriving in `redirectTo` are attacker-controlled. Only same-origin
//! absolute paths are honored; anything else falls back to a fixed default.

/// Where a successful login or signup lands when no usable target was given.
pub const DEFAULT_REDIRECT: &str = "/todos";

/// Return `to` when it is a same-origin absolute path, `default` otherwise.
///
/// Rejected: empty values, relative paths and URLs with a scheme (none start
/// with `/`), scheme-relative `//host`, the `/\host` variant browsers
/// normalize to `//host`, and control characters, which cannot go into a
/// `Location` header.
pub fn safe_redirect<'a>(to: Option<&'a str>, default: &'a str) -> &'a str {
    match to {
        Some(path) if is_local_path(path) => path,
        _ => default,
    }
}

pub fn is_local_path(path: &str) -> bool {
    if !path.starts_with('/') || path.starts_with("//") || path.starts_with("/\\") {
        return false;
    }
    !path.chars().any(char::is_control)
}
